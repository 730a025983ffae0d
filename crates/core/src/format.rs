//! Single-line tagged renderings of normalized results.
//!
//! The sentinel (`<SERVICE>_TOOL_FAILED:` and friends) is always the first
//! whitespace-delimited token so text-based callers can branch on it without
//! parsing the rest of the line.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::outcome::Failure;
use crate::normalize::preview_text;

const PLACEHOLDER: &str = "N/A";
const EMPTY_BODY: &str = "<empty>";

/// Backend family an operation belongs to; fixes its sentinel prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Service {
    Conversations,
    Pricing,
    Catalog,
    Gateway,
}

impl Service {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Conversations => "CONVERSATIONS",
            Self::Pricing => "PRICING",
            Self::Catalog => "CATALOG",
            Self::Gateway => "GATEWAY",
        }
    }

    pub fn failure_sentinel(self) -> String {
        format!("{}_TOOL_FAILED:", self.prefix())
    }

    pub fn warning_sentinel(self) -> String {
        format!("{}_TOOL_WARNING:", self.prefix())
    }

    pub fn success_sentinel(self) -> String {
        format!("{}_TOOL_SUCCESS:", self.prefix())
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

pub fn render_failure(service: Service, context: &str, failure: &Failure) -> String {
    let head = with_context(&service.failure_sentinel(), context);

    if failure.kind.is_local() {
        let message = failure.reason.as_deref().unwrap_or(failure.kind.as_str());
        return format!("{head} {}", terminated(&preview_text(message)));
    }

    let code = failure.code.map(|code| code.to_string()).unwrap_or_else(|| PLACEHOLDER.into());
    let reason = failure
        .reason
        .as_deref()
        .map(preview_text)
        .filter(|reason| !reason.is_empty())
        .unwrap_or_else(|| PLACEHOLDER.to_string());
    let body = if failure.body.is_empty() { EMPTY_BODY } else { failure.body.as_str() };

    format!("{head} Status {code}. Reason: {reason}. Body: {body}.")
}

pub fn render_warning(service: Service, context: &str, note: &str, payload: &Value) -> String {
    let head = with_context(&service.warning_sentinel(), context);
    let payload = match payload {
        Value::String(text) => preview_text(text),
        other => preview_text(&other.to_string()),
    };
    format!("{head} {}. Payload: {payload}", capitalize(note))
}

pub fn render_success(service: Service, message: &str) -> String {
    format!("{} {}", service.success_sentinel(), terminated(&preview_text(message)))
}

/// Context lines carry caller-supplied ids; they are collapsed to one line like bodies.
fn with_context(sentinel: &str, context: &str) -> String {
    let context = preview_text(context);
    if context.is_empty() {
        sentinel.to_string()
    } else {
        format!("{sentinel} {}", terminated(&context))
    }
}

fn terminated(text: &str) -> String {
    let text = text.trim();
    if text.ends_with(['.', '!', '?']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
