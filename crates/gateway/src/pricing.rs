//! Product pricing: the operation and the narratives it answers with.
//!
//! Unlike the conversation operations, pricing replies are prose written for
//! the agent to relay. Every failure a customer could hit (unknown product,
//! rejected request, unreachable service) becomes a `HANDOFF:` narrative so
//! the agent escalates to a human instead of improvising a price.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Value;
use toolgate_backends::{PriceRequest, PricingApi};
use toolgate_core::normalize::{preview_text, NOTE_UNEXPECTED_SHAPE};
use toolgate_core::{
    normalize, Args, ExpectedShape, Failure, FailureKind, GatewayError, NormalizedResult,
    OperationDescriptor, Service,
};
use tracing::{debug, info};

use crate::descriptors;
use crate::registry::{prepare, Operation, ToolReply};
use crate::Shared;

pub const HANDOFF: &str = "HANDOFF:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShippingOption {
    pub name: String,
    pub price: Option<Decimal>,
    pub delivery_estimate: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub price: Decimal,
    pub currency: String,
    pub unit: Option<String>,
    pub price_per_unit: Option<Decimal>,
    pub shipping: Vec<ShippingOption>,
}

impl Quote {
    /// Read the `pricing` object of a price reply.
    pub fn from_payload(payload: &Value) -> Result<Self, GatewayError> {
        let pricing = payload
            .get("pricing")
            .filter(|pricing| pricing.is_object())
            .ok_or_else(|| GatewayError::Decode("reply has no `pricing` object".to_string()))?;
        let price = pricing
            .get("price")
            .and_then(decimal)
            .ok_or_else(|| {
                GatewayError::Decode("`pricing.price` is missing or not a number".to_string())
            })?;
        let currency = non_empty_text(pricing.get("currency"))
            .ok_or_else(|| GatewayError::Decode("`pricing.currency` is missing".to_string()))?;

        let shipping = pricing
            .get("shipping_methods")
            .and_then(Value::as_array)
            .map(|methods| methods.iter().filter_map(shipping_option).collect())
            .unwrap_or_default();

        Ok(Self {
            price,
            currency,
            unit: non_empty_text(pricing.get("unit")),
            price_per_unit: pricing.get("price_per_unit").and_then(decimal),
            shipping,
        })
    }
}

fn shipping_option(method: &Value) -> Option<ShippingOption> {
    let name = non_empty_text(method.get("name"))?;
    Some(ShippingOption {
        name,
        price: method.get("price").and_then(decimal),
        delivery_estimate: non_empty_text(method.get("delivery_estimate")),
    })
}

/// Backend text lands in single-line narratives, so newlines are collapsed here.
fn non_empty_text(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(preview_text).filter(|text| !text.is_empty())
}

/// Prices arrive as JSON numbers or numeric strings.
fn decimal(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    text.parse::<Decimal>().ok().or_else(|| Decimal::from_scientific(&text).ok())
}

/// The customer-facing facts a narrative restates.
///
/// `product_id` is the single-line display form; the backend receives the raw argument.
#[derive(Clone, Debug, PartialEq)]
pub struct PriceInquiry {
    pub product_id: String,
    pub width: f64,
    pub height: f64,
    pub quantity: u64,
}

impl PriceInquiry {
    fn from_args(args: &Args) -> Self {
        Self {
            product_id: preview_text(&args.text("product_id").unwrap_or_default()),
            width: args.number("width").unwrap_or_default(),
            height: args.number("height").unwrap_or_default(),
            quantity: args
                .integer("quantity")
                .and_then(|quantity| u64::try_from(quantity).ok())
                .unwrap_or_default(),
        }
    }

    fn size(&self) -> String {
        format!("{} x {}", self.width, self.height)
    }
}

pub fn quote_narrative(inquiry: &PriceInquiry, quote: &Quote) -> String {
    let mut text = format!(
        "Price for {} of product {} at {}: {:.2} {}",
        inquiry.quantity,
        inquiry.product_id,
        inquiry.size(),
        quote.price,
        quote.currency
    );
    if let Some(unit) = &quote.unit {
        let _ = write!(text, " (unit: {unit})");
    }
    text.push('.');
    if let Some(per_unit) = quote.price_per_unit {
        let per_unit = per_unit.round_dp(4).normalize();
        let _ = write!(text, " That is {per_unit} {} per item.", quote.currency);
    }
    if !quote.shipping.is_empty() {
        let options = quote
            .shipping
            .iter()
            .map(|option| {
                let mut line = option.name.clone();
                if let Some(price) = option.price {
                    let _ = write!(line, " {price:.2} {}", quote.currency);
                }
                if let Some(estimate) = &option.delivery_estimate {
                    let _ = write!(line, " ({estimate})");
                }
                line
            })
            .collect::<Vec<_>>()
            .join("; ");
        let _ = write!(text, " Shipping options: {options}.");
    }
    text
}

pub fn failure_narrative(inquiry: &PriceInquiry, failure: &Failure) -> String {
    match (failure.kind, failure.code) {
        (FailureKind::BackendStatus, Some(404)) => format!(
            "{HANDOFF} I couldn't find that product (product id {}) in the pricing system. \
             Confirm the product with the customer or pass this to a human teammate.",
            inquiry.product_id
        ),
        (FailureKind::BackendStatus, Some(401)) => format!(
            "{HANDOFF} The pricing system rejected our credentials, so I can't quote product {} \
             right now. A human teammate needs to prepare this quote.",
            inquiry.product_id
        ),
        (FailureKind::BackendStatus, Some(400)) => {
            let details =
                if failure.body.is_empty() { "none given" } else { failure.body.as_str() };
            format!(
                "{HANDOFF} The pricing system rejected the request for {} of product {} at {}. \
                 Details: {details}. Check the size and quantity with the customer or pass this \
                 to a human teammate.",
                inquiry.quantity,
                inquiry.product_id,
                inquiry.size()
            )
        }
        (FailureKind::Timeout, _) => format!(
            "{HANDOFF} The pricing system took too long to answer for product {}. \
             A human teammate should follow up with a quote.",
            inquiry.product_id
        ),
        (FailureKind::Transport, _) => format!(
            "{HANDOFF} I couldn't reach the pricing system to quote product {}. \
             A human teammate should follow up with a quote.",
            inquiry.product_id
        ),
        (_, Some(code)) => format!(
            "{HANDOFF} The pricing system answered with status {code} for product {}. \
             A human teammate should follow up with a quote.",
            inquiry.product_id
        ),
        (_, None) => format!(
            "{HANDOFF} Pricing product {} failed unexpectedly ({}). \
             A human teammate should follow up with a quote.",
            inquiry.product_id,
            preview_text(failure.reason.as_deref().unwrap_or("no details"))
        ),
    }
}

pub fn undecodable_narrative(inquiry: &PriceInquiry) -> String {
    format!(
        "{HANDOFF} The pricing system answered for product {} but I couldn't read the price. \
         A human teammate should confirm the quote.",
        inquiry.product_id
    )
}

pub(crate) struct ProductPriceOperation {
    api: Result<Arc<dyn PricingApi>, String>,
    shared: Shared,
}

impl ProductPriceOperation {
    pub(crate) fn new(api: Result<Arc<dyn PricingApi>, String>, shared: Shared) -> Self {
        Self { api, shared }
    }

    fn narrate(&self, inquiry: &PriceInquiry, result: NormalizedResult) -> ToolReply {
        match result {
            NormalizedResult::Success { payload } => match Quote::from_payload(&payload) {
                Ok(quote) => ToolReply {
                    text: quote_narrative(inquiry, &quote),
                    result: NormalizedResult::Success { payload },
                },
                Err(error) => {
                    debug!(
                        event_name = "gateway.pricing.undecodable",
                        error = %error,
                        "price reply unreadable"
                    );
                    ToolReply {
                        text: undecodable_narrative(inquiry),
                        result: NormalizedResult::Warning {
                            payload,
                            note: NOTE_UNEXPECTED_SHAPE.to_string(),
                        },
                    }
                }
            },
            result @ NormalizedResult::Warning { .. } => {
                ToolReply { text: undecodable_narrative(inquiry), result }
            }
            NormalizedResult::Failure(failure) => ToolReply {
                text: failure_narrative(inquiry, &failure),
                result: NormalizedResult::Failure(failure),
            },
        }
    }
}

#[async_trait]
impl Operation for ProductPriceOperation {
    fn descriptor(&self) -> &'static OperationDescriptor {
        &descriptors::GET_PRODUCT_PRICE
    }

    fn service(&self) -> Service {
        Service::Pricing
    }

    async fn invoke(&self, arguments: Value) -> ToolReply {
        let service = self.service();
        let api = match &self.api {
            Ok(api) => Arc::clone(api),
            Err(message) => {
                let error = GatewayError::Configuration(message.clone());
                return ToolReply::from_error(service, "", error);
            }
        };
        let args = match prepare(self.descriptor(), arguments, self.shared.config.as_ref()) {
            Ok(args) => args,
            Err(error) => return ToolReply::from_error(service, "", error),
        };

        let inquiry = PriceInquiry::from_args(&args);
        let request = PriceRequest {
            width: inquiry.width,
            height: inquiry.height,
            quantity: inquiry.quantity,
            country_code: args.text("country_code").unwrap_or_default().to_ascii_uppercase(),
            currency_code: args.text("currency_code").unwrap_or_default().to_ascii_uppercase(),
        };
        let product_id = args.text("product_id").unwrap_or_default();

        let raw = self.shared.bridge.run(move || api.quote(&product_id, &request)).await;
        let reply = self.narrate(&inquiry, normalize(raw, ExpectedShape::Object));
        info!(
            event_name = "gateway.pricing.quoted",
            product_id = %inquiry.product_id,
            outcome = reply.outcome(),
            "price lookup finished"
        );
        reply
    }
}
