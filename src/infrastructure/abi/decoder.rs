//! Full ABI decoder implementation using alloy-dyn-abi

use alloy_dyn_abi::{DynSolType, DynSolValue};
use anyhow::{Context, Result};
use tracing::debug;

use crate::domain::abi::{
    canonical_type, AbiCodec, AbiParameter, DecodeMode, DecodedParameter, ParamNaming,
    ParameterDecoder, SlotDecoder,
};

/// Head/tail ABI decoder
///
/// Follows offsets for `string`, `bytes`, arrays and tuples. When the blob
/// cannot be decoded this way (truncated data, type alloy cannot parse) it
/// falls back to the slot decoder so callers still get best-effort values.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlloyAbiDecoder;

impl AlloyAbiDecoder {
    pub fn new() -> Self {
        Self
    }

    fn try_decode(&self, blob: &str, params: &[AbiParameter]) -> Result<Vec<DynSolValue>> {
        if params.is_empty() {
            return Ok(Vec::new());
        }

        // Parse types from parameter specs
        let types: Vec<DynSolType> = params
            .iter()
            .map(|param| {
                let ty = canonical_type(param);
                DynSolType::parse(&ty).with_context(|| {
                    format!("Failed to parse type '{}' for param '{}'", ty, param.name)
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let payload = blob
            .strip_prefix("0x")
            .or_else(|| blob.strip_prefix("0X"))
            .unwrap_or(blob);
        let data = hex::decode(payload).context("Invalid hex in parameter data")?;

        let decoded = DynSolType::Tuple(types)
            .abi_decode_params(&data)
            .context("Failed to decode parameters")?;

        // Extract individual values from the tuple
        match decoded {
            DynSolValue::Tuple(values) => Ok(values),
            other => Ok(vec![other]),
        }
    }
}

impl ParameterDecoder for AlloyAbiDecoder {
    fn decode(
        &self,
        blob: &str,
        params: &[AbiParameter],
        naming: ParamNaming,
    ) -> Vec<DecodedParameter> {
        match self.try_decode(blob, params) {
            Ok(values) if values.len() == params.len() => params
                .iter()
                .zip(values.iter())
                .enumerate()
                .map(|(idx, (param, value))| DecodedParameter {
                    name: naming.name_for(param, idx),
                    kind: param.kind.clone(),
                    value: format_dyn_sol_value(value),
                    indexed: param.indexed,
                })
                .collect(),
            Ok(values) => {
                debug!(
                    expected = params.len(),
                    got = values.len(),
                    "full decode arity mismatch, falling back to slots"
                );
                SlotDecoder.decode(blob, params, naming)
            }
            Err(err) => {
                debug!(error = %format!("{err:#}"), "full decode failed, falling back to slots");
                SlotDecoder.decode(blob, params, naming)
            }
        }
    }
}

/// Build the codec for a decode mode
pub fn codec_for(mode: DecodeMode) -> AbiCodec {
    match mode {
        DecodeMode::Slots => AbiCodec::slots(),
        DecodeMode::Full => AbiCodec::with_decoder(AlloyAbiDecoder::new()),
    }
}

/// Format a DynSolValue for display
///
/// Integers are decimal, addresses lowercase hex, strings quoted; nothing is
/// truncated.
fn format_dyn_sol_value(value: &DynSolValue) -> String {
    match value {
        DynSolValue::Bool(b) => b.to_string(),
        DynSolValue::Int(i, _) => i.to_string(),
        DynSolValue::Uint(u, _) => u.to_string(),
        DynSolValue::FixedBytes(word, size) => {
            let bytes = &word.as_slice()[..(*size).min(32)];
            format!("0x{}", hex::encode(bytes))
        }
        DynSolValue::Address(addr) => format!("0x{}", hex::encode(addr.as_slice())),
        DynSolValue::Function(func) => format!("0x{}", hex::encode(func.as_slice())),
        DynSolValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DynSolValue::String(s) => format!("\"{}\"", s),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) => {
            let items: Vec<String> = items.iter().map(format_dyn_sol_value).collect();
            format!("[{}]", items.join(", "))
        }
        DynSolValue::Tuple(fields) => {
            let items: Vec<String> = fields.iter().map(format_dyn_sol_value).collect();
            format!("({})", items.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::abi::{decode_call, AbiDescriptor};

    fn word(value: u64) -> String {
        format!("{:064x}", value)
    }

    #[test]
    fn test_decode_static_params_like_slots() {
        let params = vec![AbiParameter::new("to", "address"), AbiParameter::new("amount", "uint256")];
        let blob = format!(
            "000000000000000000000000742d35cc6634c0532925a3b844bc9e7595f0beb0{}",
            word(1_000_000)
        );

        let full = AlloyAbiDecoder.decode(&blob, &params, ParamNaming::Param);
        let slots = SlotDecoder.decode(&blob, &params, ParamNaming::Param);
        assert_eq!(full, slots);
    }

    #[test]
    fn test_decode_string_param() {
        // (uint256 id, string note) with note = "hello"
        let blob = format!(
            "{}{}{}{}",
            word(7),
            word(64),
            word(5),
            format!("{:0<64}", hex::encode("hello"))
        );
        let params = vec![AbiParameter::new("id", "uint256"), AbiParameter::new("note", "string")];

        let decoded = AlloyAbiDecoder.decode(&blob, &params, ParamNaming::Param);
        assert_eq!(decoded[0].value, "7");
        assert_eq!(decoded[1].value, "\"hello\"");
    }

    #[test]
    fn test_decode_dynamic_array() {
        let blob = format!("{}{}{}{}", word(32), word(2), word(10), word(20));
        let params = vec![AbiParameter::new("ids", "uint256[]")];

        let decoded = AlloyAbiDecoder.decode(&blob, &params, ParamNaming::Param);
        assert_eq!(decoded[0].value, "[10, 20]");
    }

    #[test]
    fn test_signed_integers() {
        let blob = "f".repeat(64);
        let params = vec![AbiParameter::new("delta", "int256")];
        let decoded = AlloyAbiDecoder.decode(&blob, &params, ParamNaming::Param);
        assert_eq!(decoded[0].value, "-1");
    }

    #[test]
    fn test_truncated_blob_falls_back_to_slots() {
        let params = vec![AbiParameter::new("a", "uint256"), AbiParameter::new("b", "uint256")];
        let blob = word(3);
        let decoded = AlloyAbiDecoder.decode(&blob, &params, ParamNaming::Param);
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].value, "3");
        assert_eq!(decoded[1].value, "0x");
    }

    #[test]
    fn test_full_codec_decodes_call() {
        let abi = vec![AbiDescriptor::function(
            "setName",
            vec![AbiParameter::new("name", "string")],
        )];
        let selector = crate::domain::abi::derive_selector("setName(string)");
        let input = format!(
            "{}{}{}{}",
            selector,
            word(32),
            word(3),
            format!("{:0<64}", hex::encode("abc"))
        );

        let full = codec_for(DecodeMode::Full).decode_call(&input, &abi);
        assert_eq!(full.decoded().unwrap().params[0].value, "\"abc\"");

        let slots = decode_call(&input, &abi);
        assert_eq!(slots.decoded().unwrap().params[0].value, format!("0x{}", word(32)));
    }
}
