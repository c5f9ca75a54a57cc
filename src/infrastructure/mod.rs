//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Alloy-based Ethereum provider implementation
//! - Full ABI decoding using alloy-dyn-abi

pub mod abi;
pub mod ethereum;

pub use abi::{codec_for, AlloyAbiDecoder};
pub use ethereum::{AlloyProvider, ChainProvider};
