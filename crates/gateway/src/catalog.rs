use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use toolgate_core::{Catalog, NormalizedResult, OperationDescriptor, Service};
use tracing::debug;

use crate::descriptors;
use crate::registry::{prepare, Operation, ToolReply};
use crate::Shared;

/// Local catalog lookup; never dispatches through the bridge.
pub(crate) struct FindProductOperation {
    catalog: Arc<Catalog>,
    shared: Shared,
}

impl FindProductOperation {
    pub(crate) fn new(catalog: Arc<Catalog>, shared: Shared) -> Self {
        Self { catalog, shared }
    }
}

#[async_trait]
impl Operation for FindProductOperation {
    fn descriptor(&self) -> &'static OperationDescriptor {
        &descriptors::FIND_PRODUCT_ID
    }

    fn service(&self) -> Service {
        Service::Catalog
    }

    async fn invoke(&self, arguments: Value) -> ToolReply {
        let args = match prepare(self.descriptor(), arguments, self.shared.config.as_ref()) {
            Ok(args) => args,
            Err(error) => return ToolReply::from_error(self.service(), "", error),
        };
        let query = args.text("query").unwrap_or_default();
        let product_id = self.catalog.resolve(&query);
        debug!(
            event_name = "gateway.catalog.resolved",
            query = %query,
            product_id = ?product_id,
            "catalog query resolved"
        );

        let payload = json!({ "query": query, "product_id": product_id });
        ToolReply::render(self.service(), "", NormalizedResult::Success { payload })
    }
}
