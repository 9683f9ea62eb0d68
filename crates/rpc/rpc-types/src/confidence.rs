use lumos_primitives::BlockNumber;
use serde::{Deserialize, Serialize};

/// A block number as received from a caller.
///
/// Integers, decimal strings and `0x`-prefixed hex strings are accepted. Anything else is kept as
/// is so the handler can answer with an `error` field instead of rejecting the request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockNumberArg {
    Number(BlockNumber),
    Text(String),
    Invalid(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid block number: {0}")]
pub struct InvalidBlockNumber(pub String);

impl BlockNumberArg {
    pub fn block_number(&self) -> Result<BlockNumber, InvalidBlockNumber> {
        match self {
            Self::Number(number) => Ok(*number),
            Self::Text(text) => serde_utils::parse_u64(text.trim())
                .map_err(|_| InvalidBlockNumber(text.clone())),
            Self::Invalid(value) => Err(InvalidBlockNumber(value.to_string())),
        }
    }
}

impl From<BlockNumber> for BlockNumberArg {
    fn from(value: BlockNumber) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for BlockNumberArg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Response of `light_getBlockConfidence`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceResponse {
    /// The resolved block number, or the caller's input as received when it could not be parsed.
    pub number: BlockNumberArg,
    /// Confidence in percent.
    pub confidence: f64,
    /// Block number and confidence packed into one integer, rendered in decimal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serialised_confidence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConfidenceResponse {
    pub fn new(number: BlockNumber, confidence: f64, serialised: u128) -> Self {
        Self {
            number: BlockNumberArg::Number(number),
            confidence,
            serialised_confidence: Some(serialised.to_string()),
            error: None,
        }
    }

    pub fn error(number: BlockNumberArg, error: impl ToString) -> Self {
        Self {
            number,
            confidence: 0.0,
            serialised_confidence: None,
            error: Some(error.to_string()),
        }
    }
}
