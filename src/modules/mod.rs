//! Front-end modules shared by the CLI
//!
//! - address: balance overview and ERC-20 transfer history
//! - toolkit: selector, unit and timestamp helpers
//! - export: JSON/CSV export of decoded reports

pub mod address;
pub mod export;
pub mod toolkit;
