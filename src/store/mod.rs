//! SQLite persistence for saved ABIs, labels and settings

mod abi_store;
mod labels;

pub use abi_store::{AbiStore, StoredAbi};
pub use labels::LabelStore;
