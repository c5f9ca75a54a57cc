//! Ethereum infrastructure - Alloy provider implementation

mod provider;

pub use provider::{
    AlloyProvider, ChainProvider, LogFilter, RawBlock, RawLog, RawReceipt, RawTransaction,
};
