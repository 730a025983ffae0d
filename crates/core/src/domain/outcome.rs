use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status code some backend clients raise as an error to signal an empty-body success.
pub const EMPTY_SUCCESS_CODE: u16 = 204;

/// Unclassified result captured right after a backend call returns or fails.
#[derive(Clone, Debug, PartialEq)]
pub enum RawOutcome {
    StatusBody { code: u16, body: Vec<u8> },
    StructuredPayload(Value),
    Thrown(ThrownError),
    EmptySuccess,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    /// The backend answered with an error status.
    Status,
    Timeout,
    /// Connection, TLS or request-building failure; no status available.
    Transport,
    /// The backend accepted the request but the reply could not be decoded.
    Decode,
    /// The blocking worker panicked.
    Panic,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThrownError {
    pub class: ErrorClass,
    pub code: Option<u16>,
    pub reason: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl ThrownError {
    pub fn new(class: ErrorClass) -> Self {
        Self { class, code: None, reason: None, body: None }
    }

    pub fn status(code: u16, reason: Option<String>, body: Option<Vec<u8>>) -> Self {
        Self { class: ErrorClass::Status, code: Some(code), reason, body }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Payload shape an operation expects from a successful decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpectedShape {
    #[default]
    Object,
    List,
    /// Either a mapping or a list; scalars and `null` still fall outside the contract.
    ObjectOrList,
}

impl ExpectedShape {
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::List => value.is_array(),
            Self::ObjectOrList => value.is_object() || value.is_array(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    Validation,
    UnknownOperation,
    BackendStatus,
    Timeout,
    Transport,
    Internal,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Validation => "validation",
            Self::UnknownOperation => "unknown_operation",
            Self::BackendStatus => "backend_status",
            Self::Timeout => "timeout",
            Self::Transport => "transport",
            Self::Internal => "internal",
        }
    }

    /// Failures that never carry a backend status and render as a plain message.
    pub fn is_local(self) -> bool {
        matches!(self, Self::Configuration | Self::Validation | Self::UnknownOperation)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub code: Option<u16>,
    pub reason: Option<String>,
    pub body: String,
}

impl Failure {
    pub fn local(kind: FailureKind, message: impl Into<String>) -> Self {
        Self { kind, code: None, reason: Some(message.into()), body: String::new() }
    }

    pub fn status(&self) -> Option<u16> {
        self.code
    }
}

/// The closed contract every gateway operation returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NormalizedResult {
    Success { payload: Value },
    Warning { payload: Value, note: String },
    Failure(Failure),
}

impl NormalizedResult {
    pub fn empty_success() -> Self {
        Self::Success { payload: Value::Object(serde_json::Map::new()) }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Self::Failure(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload } | Self::Warning { payload, .. } => Some(payload),
            Self::Failure(_) => None,
        }
    }
}
