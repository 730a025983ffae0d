//! Descriptor table for every operation the gateway exposes.

use toolgate_core::{
    Conditional, DefaultValue, OperationDescriptor, ParamKind, ParamSpec, Setting, Trigger,
};

const LIMIT: ParamSpec =
    ParamSpec::new("limit", ParamKind::Count, "Maximum number of items to return")
        .with_default(DefaultValue::Integer(20));
const CURSOR: ParamSpec =
    ParamSpec::new("cursor", ParamKind::Text, "Pagination cursor returned by a previous page");
const PAGE: &[ParamSpec] = &[LIMIT, CURSOR];

const THREAD_ID: ParamSpec = ParamSpec::new("thread_id", ParamKind::Id, "Conversation thread id");
const MESSAGE_ID: ParamSpec = ParamSpec::new("message_id", ParamKind::Id, "Message id");

pub const LIST_THREADS: OperationDescriptor = OperationDescriptor {
    optional: &[
        ParamSpec::new("status", ParamKind::Text, "Only threads in this status (open, closed)"),
        ParamSpec::new("inbox_id", ParamKind::Id, "Only threads in this inbox"),
        ParamSpec::new("contact_id", ParamKind::Id, "Only threads with this contact"),
        LIMIT,
        CURSOR,
    ],
    exclusive: &[&["inbox_id", "contact_id"]],
    conditional: &[Conditional {
        trigger: "contact_id",
        when: Trigger::Present,
        requires: "status",
    }],
    ..OperationDescriptor::new("list_threads", "List conversation threads, optionally filtered")
};

pub const GET_THREAD: OperationDescriptor = OperationDescriptor {
    required: &[THREAD_ID],
    ..OperationDescriptor::new("get_thread", "Fetch a single conversation thread")
};

pub const UPDATE_THREAD: OperationDescriptor = OperationDescriptor {
    required: &[THREAD_ID],
    optional: &[
        ParamSpec::new("status", ParamKind::Text, "New thread status"),
        ParamSpec::new("archived", ParamKind::Bool, "Archive (true) or restore (false) the thread"),
        ParamSpec::new(
            "is_currently_archived",
            ParamKind::Bool,
            "Whether the thread is archived right now; required to restore it",
        ),
    ],
    at_least_one: &[&["status", "archived"]],
    conditional: &[Conditional {
        trigger: "archived",
        when: Trigger::EqualsBool(false),
        requires: "is_currently_archived",
    }],
    ..OperationDescriptor::new("update_thread", "Change a thread's status or archive flag")
};

pub const ARCHIVE_THREAD: OperationDescriptor = OperationDescriptor {
    required: &[THREAD_ID],
    ..OperationDescriptor::new("archive_thread", "Archive a conversation thread")
};

pub const LIST_MESSAGES: OperationDescriptor = OperationDescriptor {
    required: &[THREAD_ID],
    optional: PAGE,
    ..OperationDescriptor::new("list_messages", "List the messages of a thread")
};

pub const GET_MESSAGE: OperationDescriptor = OperationDescriptor {
    required: &[THREAD_ID, MESSAGE_ID],
    ..OperationDescriptor::new("get_message", "Fetch a single message of a thread")
};

pub const GET_ORIGINAL_MESSAGE: OperationDescriptor = OperationDescriptor {
    required: &[MESSAGE_ID],
    ..OperationDescriptor::new(
        "get_original_message",
        "Fetch the original, unprocessed content of a message",
    )
};

pub const SEND_MESSAGE: OperationDescriptor = OperationDescriptor {
    required: &[
        THREAD_ID,
        ParamSpec::new(
            "text",
            ParamKind::Text,
            "Message text; text containing a comment marker is posted as an internal comment",
        ),
        ParamSpec::new("channel_id", ParamKind::Id, "Channel to send through")
            .with_default(DefaultValue::Setting(Setting::DefaultChannelId)),
        ParamSpec::new("channel_account_id", ParamKind::Id, "Channel account to send as")
            .with_default(DefaultValue::Setting(Setting::DefaultChannelAccountId)),
        ParamSpec::new("sender_id", ParamKind::Id, "Actor recorded as the sender")
            .with_default(DefaultValue::Setting(Setting::DefaultSenderId)),
    ],
    ..OperationDescriptor::new("send_message", "Send a message or internal comment to a thread")
};

pub const GET_ACTOR: OperationDescriptor = OperationDescriptor {
    required: &[ParamSpec::new("actor_id", ParamKind::Id, "Actor id")],
    ..OperationDescriptor::new("get_actor", "Fetch an actor (contact or teammate)")
};

pub const LIST_ACTORS: OperationDescriptor = OperationDescriptor {
    optional: PAGE,
    ..OperationDescriptor::new("list_actors", "List actors")
};

pub const BATCH_GET_ACTORS: OperationDescriptor = OperationDescriptor {
    required: &[ParamSpec::new("actor_ids", ParamKind::IdList, "Actor ids to fetch")],
    ..OperationDescriptor::new("batch_get_actors", "Fetch several actors in one call")
};

pub const GET_INBOX: OperationDescriptor = OperationDescriptor {
    required: &[ParamSpec::new("inbox_id", ParamKind::Id, "Inbox id")],
    ..OperationDescriptor::new("get_inbox", "Fetch an inbox")
};

pub const LIST_INBOXES: OperationDescriptor = OperationDescriptor {
    optional: PAGE,
    ..OperationDescriptor::new("list_inboxes", "List inboxes")
};

pub const GET_CHANNEL: OperationDescriptor = OperationDescriptor {
    required: &[ParamSpec::new("channel_id", ParamKind::Id, "Channel id")],
    ..OperationDescriptor::new("get_channel", "Fetch a channel")
};

pub const LIST_CHANNELS: OperationDescriptor = OperationDescriptor {
    optional: PAGE,
    ..OperationDescriptor::new("list_channels", "List channels")
};

pub const GET_CHANNEL_ACCOUNT: OperationDescriptor = OperationDescriptor {
    required: &[ParamSpec::new("channel_account_id", ParamKind::Id, "Channel account id")],
    ..OperationDescriptor::new("get_channel_account", "Fetch a channel account")
};

pub const LIST_CHANNEL_ACCOUNTS: OperationDescriptor = OperationDescriptor {
    optional: &[
        ParamSpec::new("channel_id", ParamKind::Id, "Only accounts of this channel"),
        LIMIT,
        CURSOR,
    ],
    ..OperationDescriptor::new("list_channel_accounts", "List channel accounts")
};

pub const GET_PRODUCT_PRICE: OperationDescriptor = OperationDescriptor {
    required: &[
        ParamSpec::new("product_id", ParamKind::Id, "Catalog product id (see find_product_id)"),
        ParamSpec::new("width", ParamKind::PositiveNumber, "Width in the product's unit"),
        ParamSpec::new("height", ParamKind::PositiveNumber, "Height in the product's unit"),
        ParamSpec::new("quantity", ParamKind::Count, "Number of items"),
    ],
    optional: &[
        ParamSpec::new("country_code", ParamKind::Text, "ISO 3166 two-letter country code")
            .with_default(DefaultValue::Setting(Setting::DefaultCountry)),
        ParamSpec::new("currency_code", ParamKind::Text, "ISO 4217 three-letter currency code")
            .with_default(DefaultValue::Setting(Setting::DefaultCurrency)),
    ],
    ..OperationDescriptor::new(
        "get_product_price",
        "Quote a price for a product, size and quantity",
    )
};

pub const FIND_PRODUCT_ID: OperationDescriptor = OperationDescriptor {
    required: &[ParamSpec::new(
        "query",
        ParamKind::Text,
        "Free-text product description, e.g. \"glossy vinyl stickers\"",
    )],
    ..OperationDescriptor::new("find_product_id", "Resolve a product description to a catalog id")
};
