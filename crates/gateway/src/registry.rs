use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use toolgate_core::format::{render_failure, render_warning};
use toolgate_core::{
    apply_defaults, validate, Args, GatewayError, NormalizedResult, OperationDescriptor, Service,
    SettingSource,
};

/// What a caller receives from one invocation: the closed result plus its wire text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolReply {
    pub result: NormalizedResult,
    pub text: String,
}

impl ToolReply {
    /// Default rendering: success payloads verbatim, warnings and failures as sentinel lines.
    pub fn render(service: Service, context: &str, result: NormalizedResult) -> Self {
        let text = match &result {
            NormalizedResult::Success { payload } => payload.to_string(),
            NormalizedResult::Warning { payload, note } => {
                render_warning(service, context, note, payload)
            }
            NormalizedResult::Failure(failure) => render_failure(service, context, failure),
        };
        Self { result, text }
    }

    pub fn from_error(service: Service, context: &str, error: GatewayError) -> Self {
        Self::render(service, context, error.into_result())
    }

    pub fn outcome(&self) -> &'static str {
        match self.result {
            NormalizedResult::Success { .. } => "success",
            NormalizedResult::Warning { .. } => "warning",
            NormalizedResult::Failure(_) => "failure",
        }
    }
}

#[async_trait]
pub trait Operation: Send + Sync {
    fn descriptor(&self) -> &'static OperationDescriptor;

    fn service(&self) -> Service;

    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    async fn invoke(&self, arguments: Value) -> ToolReply;
}

#[derive(Default)]
pub struct OperationRegistry {
    operations: BTreeMap<&'static str, Box<dyn Operation>>,
}

impl OperationRegistry {
    pub fn register<T>(&mut self, operation: T)
    where
        T: Operation + 'static,
    {
        self.operations.insert(operation.name(), Box::new(operation));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Operation> {
        match self.operations.get(name) {
            Some(operation) => Some(operation.as_ref()),
            None => None,
        }
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.operations.keys().copied()
    }

    pub fn descriptors(&self) -> Vec<&'static OperationDescriptor> {
        self.operations.values().map(|operation| operation.descriptor()).collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

/// Parse, default and validate raw arguments for `descriptor`.
pub(crate) fn prepare(
    descriptor: &OperationDescriptor,
    arguments: Value,
    settings: &dyn SettingSource,
) -> Result<Args, GatewayError> {
    let args = Args::from_value(arguments)?;
    let args = apply_defaults(descriptor, args, settings);
    validate(descriptor, &args)?;
    Ok(args)
}
