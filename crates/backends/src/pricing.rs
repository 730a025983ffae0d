use serde::Serialize;

use crate::http::{ApiClient, ClientError, HttpReply};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceRequest {
    pub width: f64,
    pub height: f64,
    pub quantity: u64,
    pub country_code: String,
    pub currency_code: String,
}

/// Blocking access to the pricing platform.
pub trait PricingApi: Send + Sync {
    fn quote(&self, product_id: &str, request: &PriceRequest) -> Result<HttpReply, ClientError>;
}

pub struct HttpPricingClient {
    client: ApiClient,
}

impl HttpPricingClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl PricingApi for HttpPricingClient {
    fn quote(&self, product_id: &str, request: &PriceRequest) -> Result<HttpReply, ClientError> {
        self.client.post(&["products", product_id, "price"], request)
    }
}
