//! abiscope: ABI-driven decoding of EVM call data and event logs
//!
//! - `domain`: the synchronous codec (selectors, ABI parsing, decoding)
//! - `infrastructure`: alloy-backed full decoder, ABI files, RPC provider
//! - `store`: SQLite persistence for ABIs, labels and settings
//! - `modules`: CLI helpers (toolkit, export)

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod logging;
pub mod modules;
pub mod store;
