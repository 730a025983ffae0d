use serde_json::Value;
use thiserror::Error;

use crate::domain::outcome::{Failure, FailureKind, NormalizedResult};
use crate::normalize::{preview_text, NOTE_UNDECODABLE};
use crate::validate::ValidationError;

/// Errors raised by the gateway itself, before or after a backend call.
///
/// Backend statuses and transport failures never pass through here; they reach
/// [`NormalizedResult`] directly through `normalize`. Every variant converts
/// into a [`NormalizedResult`] and none of them escape an operation as a Rust error.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    #[error("backend reply could not be decoded: {0}")]
    Decode(String),
    #[error("Unknown operation `{name}`. Known operations: {known}")]
    UnknownOperation { name: String, known: String },
}

impl GatewayError {
    pub fn unknown_operation<'a>(name: &str, known: impl IntoIterator<Item = &'a str>) -> Self {
        Self::UnknownOperation {
            name: name.to_string(),
            known: known.into_iter().collect::<Vec<_>>().join(", "),
        }
    }

    pub fn into_result(self) -> NormalizedResult {
        let message = self.to_string();
        match self {
            Self::Decode(detail) => NormalizedResult::Warning {
                payload: Value::String(preview_text(&detail)),
                note: NOTE_UNDECODABLE.to_string(),
            },
            Self::Configuration(_) => {
                NormalizedResult::Failure(Failure::local(FailureKind::Configuration, message))
            }
            Self::Validation(_) => {
                NormalizedResult::Failure(Failure::local(FailureKind::Validation, message))
            }
            Self::UnknownOperation { .. } => {
                NormalizedResult::Failure(Failure::local(FailureKind::UnknownOperation, message))
            }
        }
    }
}
