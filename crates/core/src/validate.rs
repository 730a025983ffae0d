//! Operation descriptors and the pure parameter validator.
//!
//! Descriptors are `const` tables defined once per operation. Validation runs
//! before any backend dispatch and never has side effects.

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamKind {
    /// Non-empty string.
    Text,
    /// Non-empty string or integer identifier.
    Id,
    Bool,
    /// Integer >= 1, as a JSON number or numeric string.
    Count,
    /// Finite number > 0, as a JSON number or numeric string.
    PositiveNumber,
    /// Non-empty array of identifiers.
    IdList,
}

impl ParamKind {
    fn expectation(self) -> &'static str {
        match self {
            Self::Text => "a non-empty string",
            Self::Id => "a non-empty string or integer id",
            Self::Bool => "a boolean",
            Self::Count => "a positive integer",
            Self::PositiveNumber => "a positive number",
            Self::IdList => "a non-empty list of ids",
        }
    }

    fn accepts(self, value: &Value) -> bool {
        match self {
            Self::Text => value.as_str().is_some_and(|text| !text.trim().is_empty()),
            Self::Id => is_id(value),
            Self::Bool => value.is_boolean(),
            Self::Count => as_integer(value).is_some_and(|count| count >= 1),
            Self::PositiveNumber => {
                as_number(value).is_some_and(|number| number.is_finite() && number > 0.0)
            }
            Self::IdList => value
                .as_array()
                .is_some_and(|items| !items.is_empty() && items.iter().all(is_id)),
        }
    }
}

/// Process-wide settings an argument may default to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    DefaultChannelId,
    DefaultChannelAccountId,
    DefaultSenderId,
    DefaultCountry,
    DefaultCurrency,
}

pub trait SettingSource {
    fn setting(&self, setting: Setting) -> Option<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefaultValue {
    Integer(i64),
    Bool(bool),
    Text(&'static str),
    Setting(Setting),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<DefaultValue>,
}

impl ParamSpec {
    pub const fn new(name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        Self { name, kind, description, default: None }
    }

    pub const fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Present,
    EqualsBool(bool),
}

/// `trigger` (when it matches) makes `requires` mandatory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Conditional {
    pub trigger: &'static str,
    pub when: Trigger,
    pub requires: &'static str,
}

#[derive(Clone, Copy, Debug, Serialize)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub required: &'static [ParamSpec],
    pub optional: &'static [ParamSpec],
    pub exclusive: &'static [&'static [&'static str]],
    pub at_least_one: &'static [&'static [&'static str]],
    pub conditional: &'static [Conditional],
}

impl OperationDescriptor {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: &[],
            optional: &[],
            exclusive: &[],
            at_least_one: &[],
            conditional: &[],
        }
    }

    pub fn params(&self) -> impl Iterator<Item = &ParamSpec> {
        self.required.iter().chain(self.optional.iter())
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("arguments must be a JSON object")]
    NotAnObject,
    #[error("`{first}` and `{second}` are mutually exclusive; provide only one")]
    MutuallyExclusive { first: &'static str, second: &'static str },
    #[error("`{requires}` is required when `{trigger}` {condition}")]
    MissingDependency { trigger: &'static str, condition: String, requires: &'static str },
    #[error("missing required parameter `{0}`")]
    Missing(&'static str),
    #[error("missing required parameter `{0}` (not supplied and no default is configured)")]
    MissingWithoutDefault(&'static str),
    #[error("at least one of {} must be provided", quoted(.0))]
    NoneOf(Vec<&'static str>),
    #[error("parameter `{name}` must be {expected}")]
    WrongType { name: &'static str, expected: &'static str },
}

fn quoted(names: &[&'static str]) -> String {
    names.iter().map(|name| format!("`{name}`")).collect::<Vec<_>>().join(", ")
}

/// Caller-supplied arguments for one invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Args(Map<String, Value>);

impl Args {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn from_value(value: Value) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            Value::Null => Ok(Self::default()),
            _ => Err(ValidationError::NotAnObject),
        }
    }

    pub fn is_present(&self, name: &str) -> bool {
        self.0.get(name).is_some_and(|value| !value.is_null())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name).filter(|value| !value.is_null())
    }

    pub fn insert(&mut self, name: &str, value: Value) {
        self.0.insert(name.to_string(), value);
    }

    /// String or numeric argument rendered as text.
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).and_then(id_text)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(Value::as_bool)
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(as_integer)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(as_number)
    }

    pub fn id_list(&self, name: &str) -> Vec<String> {
        self.get(name)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(id_text).collect())
            .unwrap_or_default()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

/// Fill absent parameters from literal defaults or configured settings.
pub fn apply_defaults(
    descriptor: &OperationDescriptor,
    mut args: Args,
    source: &dyn SettingSource,
) -> Args {
    for spec in descriptor.params() {
        if args.is_present(spec.name) {
            continue;
        }
        let value = match spec.default {
            Some(DefaultValue::Integer(value)) => Some(Value::from(value)),
            Some(DefaultValue::Bool(value)) => Some(Value::Bool(value)),
            Some(DefaultValue::Text(value)) => Some(Value::String(value.to_string())),
            Some(DefaultValue::Setting(setting)) => source
                .setting(setting)
                .filter(|value| !value.trim().is_empty())
                .map(Value::String),
            None => None,
        };
        if let Some(value) = value {
            args.insert(spec.name, value);
        }
    }
    args
}

pub fn validate(descriptor: &OperationDescriptor, args: &Args) -> Result<(), ValidationError> {
    for group in descriptor.exclusive {
        let mut present = group.iter().copied().filter(|name| args.is_present(name));
        if let (Some(first), Some(second)) = (present.next(), present.next()) {
            return Err(ValidationError::MutuallyExclusive { first, second });
        }
    }

    for rule in descriptor.conditional {
        let triggered = match rule.when {
            Trigger::Present => args.is_present(rule.trigger),
            Trigger::EqualsBool(expected) => args.bool(rule.trigger) == Some(expected),
        };
        if triggered && !args.is_present(rule.requires) {
            let condition = match rule.when {
                Trigger::Present => "is provided".to_string(),
                Trigger::EqualsBool(expected) => format!("is {expected}"),
            };
            return Err(ValidationError::MissingDependency {
                trigger: rule.trigger,
                condition,
                requires: rule.requires,
            });
        }
    }

    for spec in descriptor.required {
        let Some(value) = args.get(spec.name) else {
            return Err(match spec.default {
                Some(DefaultValue::Setting(_)) => ValidationError::MissingWithoutDefault(spec.name),
                _ => ValidationError::Missing(spec.name),
            });
        };
        check_kind(spec, value)?;
    }

    for group in descriptor.at_least_one {
        if !group.iter().any(|name| args.is_present(name)) {
            return Err(ValidationError::NoneOf(group.to_vec()));
        }
    }

    for spec in descriptor.optional {
        if let Some(value) = args.get(spec.name) {
            check_kind(spec, value)?;
        }
    }

    Ok(())
}

fn check_kind(spec: &ParamSpec, value: &Value) -> Result<(), ValidationError> {
    if spec.kind.accepts(value) {
        Ok(())
    } else {
        Err(ValidationError::WrongType { name: spec.name, expected: spec.kind.expectation() })
    }
}

fn is_id(value: &Value) -> bool {
    match value {
        Value::String(text) => !text.trim().is_empty(),
        Value::Number(number) => number.is_i64() || number.is_u64(),
        _ => false,
    }
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
