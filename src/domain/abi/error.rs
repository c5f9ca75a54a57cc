//! Codec error types

use thiserror::Error;

/// Errors surfaced when an ABI is entered
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbiError {
    #[error("Invalid ABI format: {reason}")]
    MalformedAbi { reason: String },
}

impl AbiError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAbi {
            reason: reason.into(),
        }
    }
}

/// Failure raised mid-decode
///
/// Never leaves the codec: every public decode entry point turns it into a
/// "not recognized" outcome.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum DecodeFailure {
    #[error("invalid hex in {field}: {value}")]
    InvalidHex { field: &'static str, value: String },

    #[error("missing topic {index} for indexed parameter '{param}'")]
    MissingTopic { index: usize, param: String },

    #[error("log has no topics")]
    NoTopics,
}
