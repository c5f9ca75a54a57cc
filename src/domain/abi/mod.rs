//! ABI codec: selector derivation, schema parsing, matching and decoding
//!
//! Everything here is synchronous and pure; the only input beyond raw hex
//! and ABI JSON is an optional [`AbiLookup`] for cross-contract logs.

mod codec;
mod decoder;
mod error;
mod events;
mod matcher;
mod param_type;
mod parser;
mod registry;
mod selector;
mod types;

pub use codec::{decode_call, decode_return_data, AbiCodec, CallDecoding, DecodeMode, LogDecoding};
pub use decoder::{
    decode_parameters, decode_slot, slot_at, ParamNaming, ParameterDecoder, SlotDecoder,
    SLOT_HEX_LEN,
};
pub use error::AbiError;
pub use events::{decode_log, decode_log_with, resolve_log_abi, LogAbi};
pub use matcher::{find_matching_event, find_matching_function};
pub use param_type::{is_dynamic, SlotKind};
pub use parser::{format_abi_for_display, parse_abi};
pub use registry::{AbiLookup, AbiRegistry, ChainedLookup};
pub use selector::{
    canonical_signature, canonical_type, derive_event_topic, derive_selector,
    extract_function_selector, normalize_signature, SELECTOR_HEX_LEN,
};
pub use types::{
    AbiDescriptor, AbiParameter, DecodedCall, DecodedEvent, DecodedParameter, DescriptorKind,
    EventLog, FunctionSelector, StateMutability,
};
