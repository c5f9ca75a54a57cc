//! Parameter decoder trait and the fixed-slot implementation
//!
//! The slot decoder consumes the argument blob in 32-byte (64 hex char)
//! slots, one per parameter, in declaration order. That is only correct for
//! lists of static types: dynamic types are returned as their raw head slot.
//! A blob shorter than expected yields shorter or empty slots, never an error.

use alloy_primitives::U256;
use tracing::trace;

use super::param_type::{is_dynamic, SlotKind};
use super::types::{AbiParameter, DecodedParameter};

/// Hex characters per 32-byte slot
pub const SLOT_HEX_LEN: usize = 64;

/// How unnamed parameters are labelled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamNaming {
    /// `param{i}` for inputs
    Param,
    /// `return{i}` for outputs
    Return,
}

impl ParamNaming {
    pub fn name_for(self, param: &AbiParameter, index: usize) -> String {
        if !param.name.trim().is_empty() {
            return param.name.clone();
        }
        match self {
            Self::Param => format!("param{}", index),
            Self::Return => format!("return{}", index),
        }
    }
}

/// Trait for parameter decoding implementations
///
/// Implementations never fail: undecodable input degrades to partial or raw
/// values so callers can always render something.
pub trait ParameterDecoder: Send + Sync {
    /// Decode an argument blob (hex, with or without `0x`)
    ///
    /// # Arguments
    /// * `blob` - ABI-encoded parameters, without the call selector
    /// * `params` - Parameter list, in declaration order
    /// * `naming` - Label style for unnamed parameters
    fn decode(
        &self,
        blob: &str,
        params: &[AbiParameter],
        naming: ParamNaming,
    ) -> Vec<DecodedParameter>;
}

/// Baseline decoder: one 32-byte slot per parameter
#[derive(Debug, Default, Clone, Copy)]
pub struct SlotDecoder;

impl ParameterDecoder for SlotDecoder {
    fn decode(
        &self,
        blob: &str,
        params: &[AbiParameter],
        naming: ParamNaming,
    ) -> Vec<DecodedParameter> {
        let blob = strip_hex_prefix(blob);

        params
            .iter()
            .enumerate()
            .map(|(idx, param)| {
                if is_dynamic(&param.kind) {
                    trace!(kind = %param.kind, index = idx, "dynamic type decoded as raw slot");
                }
                DecodedParameter {
                    name: naming.name_for(param, idx),
                    kind: param.kind.clone(),
                    value: decode_slot(slot_at(blob, idx), &param.kind),
                    indexed: param.indexed,
                }
            })
            .collect()
    }
}

/// Decode an argument blob with the slot algorithm, labelling unnamed params `param{i}`
pub fn decode_parameters(blob: &str, params: &[AbiParameter]) -> Vec<DecodedParameter> {
    SlotDecoder.decode(blob, params, ParamNaming::Param)
}

/// Render one slot according to its type's rule
pub fn decode_slot(slot: &str, kind: &str) -> String {
    match SlotKind::classify(kind) {
        SlotKind::Address => format!("0x{}", slot.get(24..).unwrap_or("").to_ascii_lowercase()),
        SlotKind::Uint | SlotKind::Int => match parse_slot_uint(slot) {
            Some(value) => value.to_string(),
            None => raw_slot(slot),
        },
        SlotKind::Bool => {
            if parse_slot_uint(slot) == Some(U256::from(1u8)) {
                "true".to_string()
            } else {
                "false".to_string()
            }
        }
        SlotKind::Raw => raw_slot(slot),
    }
}

/// The `index`-th slot of a blob, clamped to what is actually there
pub fn slot_at(blob: &str, index: usize) -> &str {
    let len = blob.len();
    let start = index.saturating_mul(SLOT_HEX_LEN).min(len);
    let end = start.saturating_add(SLOT_HEX_LEN).min(len);
    blob.get(start..end).unwrap_or("")
}

pub(crate) fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn raw_slot(slot: &str) -> String {
    format!("0x{}", slot)
}

fn parse_slot_uint(slot: &str) -> Option<U256> {
    if slot.is_empty() || slot.len() > SLOT_HEX_LEN {
        return None;
    }
    U256::from_str_radix(slot, 16).ok()
}
