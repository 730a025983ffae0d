//! Blocking REST clients for the conversation and pricing platforms.
//!
//! Both clients sit behind traits so the gateway can be exercised against
//! in-process fakes. All calls block; callers dispatch them through the
//! gateway's bridge.

pub mod conversations;
pub mod http;
pub mod pricing;

pub use conversations::{
    ConversationsApi, HttpConversationsClient, MessageKind, OutgoingMessage, ThreadFilter,
    ThreadUpdate,
};
pub use http::{ApiClient, ClientError, HttpReply, Page};
pub use pricing::{HttpPricingClient, PriceRequest, PricingApi};
