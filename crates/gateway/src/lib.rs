//! Async tool gateway over the conversation platform, the pricing platform and
//! the local product catalog.
//!
//! Every operation answers with a [`ToolReply`]: a closed
//! [`NormalizedResult`](toolgate_core::NormalizedResult) plus the single-line
//! wire text callers branch on.

pub mod bridge;
mod catalog;
mod conversations;
pub mod descriptors;
pub mod pricing;
pub mod registry;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use toolgate_backends::{
    ApiClient, ConversationsApi, HttpConversationsClient, HttpPricingClient, PricingApi,
};
use toolgate_core::config::AppConfig;
use toolgate_core::{Catalog, GatewayError, OperationDescriptor, Service};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

pub use bridge::{Bridge, IntoRawOutcome, IntoThrownError};
pub use registry::{Operation, OperationRegistry, ToolReply};

use crate::catalog::FindProductOperation;
use crate::conversations::{ConversationOperation, SPECS};
use crate::pricing::ProductPriceOperation;

/// State every operation reads; immutable after startup.
#[derive(Clone)]
pub(crate) struct Shared {
    pub(crate) config: Arc<AppConfig>,
    pub(crate) bridge: Arc<Bridge>,
}

pub struct Gateway {
    registry: OperationRegistry,
    bridge: Arc<Bridge>,
    catalog: Arc<Catalog>,
}

impl Gateway {
    /// Wire HTTP clients for every configured backend.
    ///
    /// A backend without a base URL or API key stays registered; its
    /// operations answer with a configuration failure.
    pub fn from_config(config: &AppConfig) -> Result<Self, GatewayError> {
        let timeout = Duration::from_secs(config.bridge.timeout_secs);
        let mut builder = Self::builder(config.clone());

        if let Ok(endpoint) = config.conversations.endpoint() {
            builder = builder.conversations(Arc::new(HttpConversationsClient::new(ApiClient::new(
                endpoint, timeout,
            ))));
        }
        if let Ok(endpoint) = config.pricing.endpoint() {
            builder = builder
                .pricing(Arc::new(HttpPricingClient::new(ApiClient::new(endpoint, timeout))));
        }
        if let Some(path) = &config.catalog.path {
            let catalog = Catalog::load(path)
                .map_err(|error| GatewayError::Configuration(error.to_string()))?;
            builder = builder.catalog(catalog);
        }

        Ok(builder.build())
    }

    pub fn builder(config: AppConfig) -> GatewayBuilder {
        GatewayBuilder {
            bridge: Bridge::new(&config.bridge),
            config,
            conversations: None,
            pricing: None,
            catalog: None,
        }
    }

    pub async fn invoke(&self, name: &str, arguments: Value) -> ToolReply {
        let invocation_id = Uuid::new_v4();
        let span = info_span!("invocation", invocation_id = %invocation_id, operation = name);
        self.dispatch(name, arguments).instrument(span).await
    }

    async fn dispatch(&self, name: &str, arguments: Value) -> ToolReply {
        let Some(operation) = self.registry.get(name) else {
            warn!(event_name = "gateway.invocation.unknown", "unknown operation requested");
            let error = GatewayError::unknown_operation(name, self.registry.names());
            return ToolReply::from_error(Service::Gateway, "", error);
        };

        let started = Instant::now();
        let reply = operation.invoke(arguments).await;
        info!(
            event_name = "gateway.invocation.completed",
            service = %operation.service(),
            outcome = reply.outcome(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "invocation completed"
        );
        reply
    }

    pub fn tool_descriptions(&self) -> Vec<&'static OperationDescriptor> {
        self.registry.descriptors()
    }

    pub fn operation_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub fn bridge(&self) -> &Bridge {
        &self.bridge
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}

pub struct GatewayBuilder {
    config: AppConfig,
    bridge: Bridge,
    conversations: Option<Arc<dyn ConversationsApi>>,
    pricing: Option<Arc<dyn PricingApi>>,
    catalog: Option<Catalog>,
}

impl GatewayBuilder {
    pub fn conversations(mut self, api: Arc<dyn ConversationsApi>) -> Self {
        self.conversations = Some(api);
        self
    }

    pub fn pricing(mut self, api: Arc<dyn PricingApi>) -> Self {
        self.pricing = Some(api);
        self
    }

    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn bridge(mut self, bridge: Bridge) -> Self {
        self.bridge = bridge;
        self
    }

    pub fn build(self) -> Gateway {
        let conversations = self.conversations.ok_or_else(|| {
            unconfigured(self.config.conversations.endpoint().err(), "conversations")
        });
        let pricing = self
            .pricing
            .ok_or_else(|| unconfigured(self.config.pricing.endpoint().err(), "pricing"));
        let catalog = Arc::new(self.catalog.unwrap_or_else(Catalog::builtin));
        let bridge = Arc::new(self.bridge);
        let shared = Shared { config: Arc::new(self.config), bridge: Arc::clone(&bridge) };

        let mut registry = OperationRegistry::default();
        for spec in SPECS {
            registry.register(ConversationOperation::new(
                spec,
                conversations.clone(),
                shared.clone(),
            ));
        }
        registry.register(ProductPriceOperation::new(pricing, shared.clone()));
        registry.register(FindProductOperation::new(Arc::clone(&catalog), shared));

        info!(
            event_name = "gateway.ready",
            operations = registry.len(),
            catalog_entries = catalog.len(),
            "tool gateway ready"
        );
        Gateway { registry, bridge, catalog }
    }
}

fn unconfigured(error: Option<toolgate_core::config::ConfigError>, family: &str) -> String {
    match error {
        Some(error) => error.to_string(),
        None => format!("{family} backend is not configured"),
    }
}
