//! Event log decoding
//!
//! Topic 0 selects the event; indexed parameters are read from `topics[1..]`
//! and non-indexed parameters from the data blob, each with its own cursor.

use tracing::debug;

use crate::domain::address::{addresses_match, normalize_address};

use super::decoder::{decode_slot, strip_hex_prefix, ParamNaming, ParameterDecoder, SlotDecoder};
use super::error::DecodeFailure;
use super::matcher::find_matching_event;
use super::param_type::SlotKind;
use super::registry::AbiLookup;
use super::types::{AbiDescriptor, AbiParameter, DecodedEvent, DecodedParameter, EventLog};

/// Decode a log with the slot decoder
///
/// Returns `None` when no event matches or the log is malformed.
pub fn decode_log(log: &EventLog, abi: &[AbiDescriptor]) -> Option<DecodedEvent> {
    decode_log_with(log, abi, &SlotDecoder)
}

/// Decode a log, reading the data blob with the given decoder
pub fn decode_log_with(
    log: &EventLog,
    abi: &[AbiDescriptor],
    decoder: &dyn ParameterDecoder,
) -> Option<DecodedEvent> {
    match try_decode_log(log, abi, decoder) {
        Ok(decoded) => decoded,
        Err(err) => {
            debug!(address = %log.address, error = %err, "log decode failed");
            None
        }
    }
}

fn try_decode_log(
    log: &EventLog,
    abi: &[AbiDescriptor],
    decoder: &dyn ParameterDecoder,
) -> Result<Option<DecodedEvent>, DecodeFailure> {
    let topic0 = log.topics.first().ok_or(DecodeFailure::NoTopics)?;
    let Some(event) = find_matching_event(abi, topic0) else {
        return Ok(None);
    };

    let data = strip_hex_prefix(log.data.trim());
    if !data.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeFailure::InvalidHex {
            field: "data",
            value: log.data.clone(),
        });
    }

    // Non-indexed parameters are decoded together so full decoders can follow
    // head/tail offsets; names are fixed first so they reflect the position
    // in the event, not in the data blob.
    let data_params: Vec<AbiParameter> = event
        .inputs
        .iter()
        .enumerate()
        .filter(|(_, input)| !input.indexed)
        .map(|(idx, input)| AbiParameter {
            name: ParamNaming::Param.name_for(input, idx),
            ..input.clone()
        })
        .collect();
    let mut data_values = decoder.decode(data, &data_params, ParamNaming::Param).into_iter();

    let mut topic_cursor = 1;
    let mut params = Vec::with_capacity(event.inputs.len());
    for (idx, input) in event.inputs.iter().enumerate() {
        if input.indexed {
            let topic = log.topics.get(topic_cursor).ok_or_else(|| DecodeFailure::MissingTopic {
                index: topic_cursor,
                param: input.name.clone(),
            })?;
            topic_cursor += 1;
            params.push(DecodedParameter {
                name: ParamNaming::Param.name_for(input, idx),
                kind: input.kind.clone(),
                value: decode_topic(topic, &input.kind)?,
                indexed: true,
            });
        } else if let Some(value) = data_values.next() {
            params.push(value);
        }
    }

    Ok(Some(DecodedEvent {
        name: event.name.clone(),
        signature: event.signature(),
        params,
    }))
}

/// Decode one indexed value from its 32-byte topic
///
/// Reference types (string, bytes, arrays, tuples) are stored as their hash,
/// which the raw rule passes through unchanged.
fn decode_topic(topic: &str, kind: &str) -> Result<String, DecodeFailure> {
    let word = strip_hex_prefix(topic.trim());
    if word.len() != 64 || !word.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(DecodeFailure::InvalidHex {
            field: "topic",
            value: topic.to_string(),
        });
    }
    Ok(match SlotKind::classify(kind) {
        SlotKind::Address => format!("0x{}", word[24..].to_ascii_lowercase()),
        _ => decode_slot(word, kind),
    })
}

/// Which ABI applies to a log
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogAbi {
    /// The log was emitted by the primary contract
    Primary(Vec<AbiDescriptor>),
    /// The log came from another contract with a saved ABI
    Fetched(Vec<AbiDescriptor>),
    /// Undecodable until an ABI for `address` is supplied
    Missing { address: String },
}

impl LogAbi {
    pub fn descriptors(&self) -> Option<&[AbiDescriptor]> {
        match self {
            Self::Primary(abi) | Self::Fetched(abi) => Some(abi),
            Self::Missing { .. } => None,
        }
    }
}

/// Pick the ABI for a log
///
/// `primary` is the contract the caller is looking at (usually the
/// transaction recipient) together with its ABI. Logs from any other address
/// are resolved through `lookup`.
pub fn resolve_log_abi(
    log: &EventLog,
    primary: Option<(&str, &[AbiDescriptor])>,
    lookup: &dyn AbiLookup,
) -> LogAbi {
    if let Some((address, abi)) = primary {
        if addresses_match(address, &log.address) && !abi.is_empty() {
            return LogAbi::Primary(abi.to_vec());
        }
    }
    match lookup.get(&log.address) {
        Some(abi) if !abi.is_empty() => LogAbi::Fetched(abi),
        _ => LogAbi::Missing {
            address: normalize_address(&log.address),
        },
    }
}
