//! Conversation-platform operations: validate, bridge, normalize, format.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use toolgate_backends::{
    ClientError, ConversationsApi, HttpReply, MessageKind, OutgoingMessage, Page, ThreadFilter,
    ThreadUpdate,
};
use toolgate_core::format::render_success;
use toolgate_core::{
    normalize, Args, ExpectedShape, GatewayError, NormalizedResult, OperationDescriptor, Service,
};
use tracing::debug;

use crate::descriptors;
use crate::registry::{prepare, Operation, ToolReply};
use crate::Shared;

type Call = fn(&dyn ConversationsApi, &Request) -> Result<HttpReply, ClientError>;

/// Validated arguments plus the settings a call needs once it is off the scheduler.
pub(crate) struct Request {
    args: Args,
    comment_markers: Vec<String>,
}

impl Request {
    fn text(&self, name: &str) -> String {
        self.args.text(name).unwrap_or_default()
    }

    fn page(&self) -> Page {
        Page {
            limit: self.args.integer("limit").and_then(|limit| u32::try_from(limit).ok()),
            cursor: self.args.text("cursor"),
        }
    }
}

pub(crate) struct ConversationSpec {
    descriptor: &'static OperationDescriptor,
    shape: ExpectedShape,
    /// Failure context line; `{name}` expands to the argument's value.
    context: &'static str,
    call: Call,
    /// Replaces the payload echo on success.
    confirmation: Option<&'static str>,
}

pub(crate) static SPECS: &[ConversationSpec] = &[
    ConversationSpec {
        descriptor: &descriptors::LIST_THREADS,
        shape: ExpectedShape::ObjectOrList,
        context: "Error listing threads",
        call: list_threads,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::GET_THREAD,
        shape: ExpectedShape::Object,
        context: "Error getting thread {thread_id}",
        call: get_thread,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::UPDATE_THREAD,
        shape: ExpectedShape::Object,
        context: "Error updating thread {thread_id}",
        call: update_thread,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::ARCHIVE_THREAD,
        shape: ExpectedShape::Object,
        context: "Error archiving thread {thread_id}",
        call: archive_thread,
        confirmation: Some("Thread {thread_id} archived"),
    },
    ConversationSpec {
        descriptor: &descriptors::LIST_MESSAGES,
        shape: ExpectedShape::ObjectOrList,
        context: "Error listing messages of thread {thread_id}",
        call: list_messages,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::GET_MESSAGE,
        shape: ExpectedShape::Object,
        context: "Error getting message {message_id} of thread {thread_id}",
        call: get_message,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::GET_ORIGINAL_MESSAGE,
        shape: ExpectedShape::ObjectOrList,
        context: "Error getting original message {message_id}",
        call: get_original_message,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::SEND_MESSAGE,
        shape: ExpectedShape::Object,
        context: "Error sending message to thread {thread_id}",
        call: send_message,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::GET_ACTOR,
        shape: ExpectedShape::Object,
        context: "Error getting actor {actor_id}",
        call: get_actor,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::LIST_ACTORS,
        shape: ExpectedShape::ObjectOrList,
        context: "Error listing actors",
        call: list_actors,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::BATCH_GET_ACTORS,
        shape: ExpectedShape::ObjectOrList,
        context: "Error getting actors in batch",
        call: batch_get_actors,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::GET_INBOX,
        shape: ExpectedShape::Object,
        context: "Error getting inbox {inbox_id}",
        call: get_inbox,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::LIST_INBOXES,
        shape: ExpectedShape::ObjectOrList,
        context: "Error listing inboxes",
        call: list_inboxes,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::GET_CHANNEL,
        shape: ExpectedShape::Object,
        context: "Error getting channel {channel_id}",
        call: get_channel,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::LIST_CHANNELS,
        shape: ExpectedShape::ObjectOrList,
        context: "Error listing channels",
        call: list_channels,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::GET_CHANNEL_ACCOUNT,
        shape: ExpectedShape::Object,
        context: "Error getting channel account {channel_account_id}",
        call: get_channel_account,
        confirmation: None,
    },
    ConversationSpec {
        descriptor: &descriptors::LIST_CHANNEL_ACCOUNTS,
        shape: ExpectedShape::ObjectOrList,
        context: "Error listing channel accounts",
        call: list_channel_accounts,
        confirmation: None,
    },
];

/// Expand `{name}` placeholders from validated arguments.
fn expand(template: &str, args: &Args) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        expanded.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let name = &after[..close];
                expanded.push_str(&args.text(name).unwrap_or_else(|| "?".to_string()));
                rest = &after[close + 1..];
            }
            None => {
                expanded.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    expanded.push_str(rest);
    expanded
}

fn list_threads(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    let filter = ThreadFilter {
        status: request.args.text("status"),
        inbox_id: request.args.text("inbox_id"),
        contact_id: request.args.text("contact_id"),
        page: request.page(),
    };
    api.list_threads(&filter)
}

fn get_thread(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.get_thread(&request.text("thread_id"))
}

fn update_thread(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    let update = ThreadUpdate {
        status: request.args.text("status"),
        archived: request.args.bool("archived"),
    };
    api.update_thread(&request.text("thread_id"), &update)
}

fn archive_thread(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.archive_thread(&request.text("thread_id"))
}

fn list_messages(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.list_messages(&request.text("thread_id"), &request.page())
}

fn get_message(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.get_message(&request.text("thread_id"), &request.text("message_id"))
}

fn get_original_message(
    api: &dyn ConversationsApi,
    request: &Request,
) -> Result<HttpReply, ClientError> {
    api.get_original_message(&request.text("message_id"))
}

fn send_message(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    let text = request.text("text");
    let message = OutgoingMessage {
        kind: MessageKind::classify(&text, &request.comment_markers),
        text,
        channel_id: request.text("channel_id"),
        channel_account_id: request.text("channel_account_id"),
        sender_id: request.text("sender_id"),
    };
    api.send_message(&request.text("thread_id"), &message)
}

fn get_actor(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.get_actor(&request.text("actor_id"))
}

fn list_actors(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.list_actors(&request.page())
}

fn batch_get_actors(
    api: &dyn ConversationsApi,
    request: &Request,
) -> Result<HttpReply, ClientError> {
    api.batch_get_actors(&request.args.id_list("actor_ids"))
}

fn get_inbox(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.get_inbox(&request.text("inbox_id"))
}

fn list_inboxes(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.list_inboxes(&request.page())
}

fn get_channel(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.get_channel(&request.text("channel_id"))
}

fn list_channels(api: &dyn ConversationsApi, request: &Request) -> Result<HttpReply, ClientError> {
    api.list_channels(&request.page())
}

fn get_channel_account(
    api: &dyn ConversationsApi,
    request: &Request,
) -> Result<HttpReply, ClientError> {
    api.get_channel_account(&request.text("channel_account_id"))
}

fn list_channel_accounts(
    api: &dyn ConversationsApi,
    request: &Request,
) -> Result<HttpReply, ClientError> {
    let channel_id = request.args.text("channel_id");
    api.list_channel_accounts(channel_id.as_deref(), &request.page())
}

pub(crate) struct ConversationOperation {
    spec: &'static ConversationSpec,
    api: Result<Arc<dyn ConversationsApi>, String>,
    shared: Shared,
}

impl ConversationOperation {
    pub(crate) fn new(
        spec: &'static ConversationSpec,
        api: Result<Arc<dyn ConversationsApi>, String>,
        shared: Shared,
    ) -> Self {
        Self { spec, api, shared }
    }
}

#[async_trait]
impl Operation for ConversationOperation {
    fn descriptor(&self) -> &'static OperationDescriptor {
        self.spec.descriptor
    }

    fn service(&self) -> Service {
        Service::Conversations
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
        let args = match prepare(self.spec.descriptor, arguments, self.shared.config.as_ref()) {
            Ok(args) => args,
            Err(error) => return ToolReply::from_error(service, "", error),
        };

        let context = expand(self.spec.context, &args);
        let confirmation = self.spec.confirmation.map(|template| expand(template, &args));
        let comment_markers = self.shared.config.conversations.comment_markers.clone();
        let request = Request { args, comment_markers };
        let call = self.spec.call;

        let raw = self.shared.bridge.run(move || call(api.as_ref(), &request)).await;
        let result = normalize(raw, self.spec.shape);
        debug!(
            event_name = "gateway.conversations.classified",
            operation = self.spec.descriptor.name,
            success = result.is_success(),
            "conversation call classified"
        );

        match (result, confirmation) {
            (result @ NormalizedResult::Success { .. }, Some(message)) => {
                ToolReply { text: render_success(service, &message), result }
            }
            (result, _) => ToolReply::render(service, &context, result),
        }
    }
}
