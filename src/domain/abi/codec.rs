//! Call and receipt decoding on top of a pluggable parameter decoder

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decoder::{strip_hex_prefix, ParamNaming, ParameterDecoder, SlotDecoder};
use super::events::{decode_log_with, resolve_log_abi, LogAbi};
use super::matcher::find_matching_function;
use super::registry::AbiLookup;
use super::selector::{extract_function_selector, SELECTOR_HEX_LEN};
use super::types::{
    AbiDescriptor, DecodedCall, DecodedEvent, DecodedParameter, EventLog, FunctionSelector,
};

/// Which parameter decoder a codec uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecodeMode {
    /// One 32-byte slot per parameter; dynamic types come back as raw slots
    #[default]
    Slots,
    /// Head/tail ABI decoding, falling back to slots on failure
    Full,
}

impl fmt::Display for DecodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Slots => f.write_str("slots"),
            Self::Full => f.write_str("full"),
        }
    }
}

/// Outcome of decoding transaction input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CallDecoding {
    /// Input too short to carry a selector (`""`, `"0x"`): a plain value transfer
    PlainTransfer,
    /// The selector is not in the supplied ABI, or the input head is not hex
    Unrecognized { selector: Option<FunctionSelector> },
    Decoded(DecodedCall),
}

impl CallDecoding {
    pub fn decoded(&self) -> Option<&DecodedCall> {
        match self {
            Self::Decoded(call) => Some(call),
            _ => None,
        }
    }
}

/// Outcome of decoding one receipt log
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LogDecoding {
    Decoded {
        address: String,
        event: DecodedEvent,
    },
    /// No ABI is known for the emitting contract
    NeedAbi { address: String },
    /// An ABI exists but no event in it matches topic 0
    Unrecognized {
        address: String,
        topic: Option<String>,
    },
}

/// Codec bound to one parameter decoder
///
/// Cheap to clone and safe to share across threads; it holds no state
/// besides the decoder.
#[derive(Clone)]
pub struct AbiCodec {
    decoder: Arc<dyn ParameterDecoder>,
}

impl Default for AbiCodec {
    fn default() -> Self {
        Self::slots()
    }
}

impl fmt::Debug for AbiCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AbiCodec").finish_non_exhaustive()
    }
}

impl AbiCodec {
    /// Codec using the baseline slot decoder
    pub fn slots() -> Self {
        Self::with_decoder(SlotDecoder)
    }

    pub fn with_decoder(decoder: impl ParameterDecoder + 'static) -> Self {
        Self {
            decoder: Arc::new(decoder),
        }
    }

    pub fn decoder(&self) -> &dyn ParameterDecoder {
        self.decoder.as_ref()
    }

    /// Match the input's selector against `abi` and decode its arguments
    pub fn decode_call(&self, input: &str, abi: &[AbiDescriptor]) -> CallDecoding {
        let input = input.trim();
        if input.len() < SELECTOR_HEX_LEN {
            return CallDecoding::PlainTransfer;
        }
        let Some(selector) = extract_function_selector(input) else {
            debug!(input = %input.get(..SELECTOR_HEX_LEN).unwrap_or(input), "call input is not hex");
            return CallDecoding::Unrecognized { selector: None };
        };

        let Some(function) = find_matching_function(abi, &selector) else {
            debug!(%selector, "selector not in ABI");
            return CallDecoding::Unrecognized {
                selector: Some(selector),
            };
        };

        let blob = input.get(SELECTOR_HEX_LEN..).unwrap_or("");
        let params = self
            .decoder
            .decode(blob, &function.inputs, ParamNaming::Param);

        CallDecoding::Decoded(DecodedCall {
            selector,
            signature: function.signature(),
            descriptor: function.clone(),
            params,
        })
    }

    /// Decode `eth_call` return data against a function's outputs
    pub fn decode_return_data(&self, data: &str, function: &AbiDescriptor) -> Vec<DecodedParameter> {
        self.decoder
            .decode(strip_hex_prefix(data.trim()), &function.outputs, ParamNaming::Return)
    }

    pub fn decode_log(&self, log: &EventLog, abi: &[AbiDescriptor]) -> Option<DecodedEvent> {
        decode_log_with(log, abi, self.decoder.as_ref())
    }

    /// Decode every log of a receipt, resolving ABIs per emitting contract
    pub fn decode_receipt_logs(
        &self,
        logs: &[EventLog],
        primary: Option<(&str, &[AbiDescriptor])>,
        lookup: &dyn AbiLookup,
    ) -> Vec<LogDecoding> {
        logs.iter()
            .map(|log| {
                let address = crate::domain::address::normalize_address(&log.address);
                match resolve_log_abi(log, primary, lookup) {
                    LogAbi::Missing { address } => LogDecoding::NeedAbi { address },
                    resolved => match resolved
                        .descriptors()
                        .and_then(|abi| self.decode_log(log, abi))
                    {
                        Some(event) => LogDecoding::Decoded { address, event },
                        None => LogDecoding::Unrecognized {
                            address,
                            topic: log.topics.first().cloned(),
                        },
                    },
                }
            })
            .collect()
    }
}

/// Decode call input with the slot decoder
pub fn decode_call(input: &str, abi: &[AbiDescriptor]) -> CallDecoding {
    AbiCodec::slots().decode_call(input, abi)
}

/// Decode return data with the slot decoder, labelling unnamed outputs `return{i}`
pub fn decode_return_data(data: &str, function: &AbiDescriptor) -> Vec<DecodedParameter> {
    AbiCodec::slots().decode_return_data(data, function)
}
