//! ABI infrastructure - alloy-backed full decoding and ABI files

mod artifact;
mod decoder;

pub use artifact::{load_abi_file, parse_abi_file, AbiFile};
pub use decoder::{codec_for, AlloyAbiDecoder};
