//! Classification of raw backend outcomes into the closed result contract.
//!
//! Every gateway operation funnels its bridge outcome through [`normalize`], so
//! backend-library quirks (error-status objects, pre-decoded payloads, clients
//! that raise on 204) are absorbed here and nowhere else.

use serde_json::Value;

use crate::domain::outcome::{
    ErrorClass, ExpectedShape, Failure, FailureKind, NormalizedResult, RawOutcome, ThrownError,
    EMPTY_SUCCESS_CODE,
};

/// Maximum number of characters of a raw body carried into results and messages.
pub const PREVIEW_CHARS: usize = 500;

pub const NOTE_UNEXPECTED_SHAPE: &str = "unexpected payload shape";
pub const NOTE_UNDECODABLE: &str = "undecodable body";

pub fn normalize(raw: RawOutcome, expected: ExpectedShape) -> NormalizedResult {
    match raw {
        RawOutcome::EmptySuccess => NormalizedResult::empty_success(),
        RawOutcome::StructuredPayload(payload) => {
            classify_payload(payload, ExpectedShape::ObjectOrList)
        }
        RawOutcome::StatusBody { code, .. } if code == EMPTY_SUCCESS_CODE => {
            NormalizedResult::empty_success()
        }
        RawOutcome::StatusBody { code, body } if (200..300).contains(&code) => {
            classify_success_body(&body, expected)
        }
        RawOutcome::StatusBody { code, body } => NormalizedResult::Failure(Failure {
            kind: FailureKind::BackendStatus,
            code: Some(code),
            reason: None,
            body: preview(&body),
        }),
        RawOutcome::Thrown(thrown) => classify_thrown(thrown),
    }
}

/// Pre-decoded payloads are trusted as mapping or list; only scalars fall outside.
fn classify_payload(payload: Value, expected: ExpectedShape) -> NormalizedResult {
    if expected.accepts(&payload) {
        NormalizedResult::Success { payload }
    } else {
        NormalizedResult::Warning { payload, note: NOTE_UNEXPECTED_SHAPE.to_string() }
    }
}

fn classify_success_body(body: &[u8], expected: ExpectedShape) -> NormalizedResult {
    match serde_json::from_slice::<Value>(body) {
        Ok(payload) => classify_payload(payload, expected),
        Err(_) => NormalizedResult::Warning {
            payload: Value::String(preview(body)),
            note: NOTE_UNDECODABLE.to_string(),
        },
    }
}

fn classify_thrown(thrown: ThrownError) -> NormalizedResult {
    if thrown.code == Some(EMPTY_SUCCESS_CODE) {
        return NormalizedResult::empty_success();
    }

    let body = thrown.body.as_deref().map(preview).unwrap_or_default();
    let kind = match thrown.class {
        ErrorClass::Decode => {
            let payload = if body.is_empty() {
                Value::String(thrown.reason.unwrap_or_default())
            } else {
                Value::String(body)
            };
            return NormalizedResult::Warning { payload, note: NOTE_UNDECODABLE.to_string() };
        }
        ErrorClass::Status => FailureKind::BackendStatus,
        ErrorClass::Timeout => FailureKind::Timeout,
        ErrorClass::Transport => FailureKind::Transport,
        ErrorClass::Panic => FailureKind::Internal,
    };

    NormalizedResult::Failure(Failure { kind, code: thrown.code, reason: thrown.reason, body })
}

/// Lossy, single-line, char-boundary-safe preview of a raw body.
pub fn preview(body: &[u8]) -> String {
    preview_text(&String::from_utf8_lossy(body))
}

pub fn preview_text(text: &str) -> String {
    let single_line: String =
        text.chars().map(|ch| if ch == '\n' || ch == '\r' { ' ' } else { ch }).collect();
    let trimmed = single_line.trim();

    match trimmed.char_indices().nth(PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
