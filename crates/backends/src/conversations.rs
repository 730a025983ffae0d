use serde::Serialize;

use crate::http::{ApiClient, ClientError, HttpReply, Page};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ThreadFilter {
    pub status: Option<String>,
    pub inbox_id: Option<String>,
    pub contact_id: Option<String>,
    pub page: Page,
}

impl ThreadFilter {
    fn query(&self) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(status) = &self.status {
            query.push(("status", status.clone()));
        }
        if let Some(inbox_id) = &self.inbox_id {
            query.push(("inbox_id", inbox_id.clone()));
        }
        if let Some(contact_id) = &self.contact_id {
            query.push(("contact_id", contact_id.clone()));
        }
        query.extend(self.page.query());
        query
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ThreadUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archived: Option<bool>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Message,
    /// Internal note visible to operators only.
    Comment,
}

impl MessageKind {
    /// Text carrying any marker (case-insensitive) is posted as a comment.
    pub fn classify(text: &str, markers: &[String]) -> Self {
        let lowered = text.to_lowercase();
        let is_comment = markers
            .iter()
            .map(|marker| marker.trim().to_lowercase())
            .any(|marker| !marker.is_empty() && lowered.contains(&marker));
        if is_comment {
            Self::Comment
        } else {
            Self::Message
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OutgoingMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub text: String,
    pub channel_id: String,
    pub channel_account_id: String,
    pub sender_id: String,
}

#[derive(Serialize)]
struct ActorBatch<'a> {
    ids: &'a [String],
}

/// Blocking access to the conversation platform.
pub trait ConversationsApi: Send + Sync {
    fn list_threads(&self, filter: &ThreadFilter) -> Result<HttpReply, ClientError>;
    fn get_thread(&self, thread_id: &str) -> Result<HttpReply, ClientError>;
    fn update_thread(&self, thread_id: &str, update: &ThreadUpdate)
        -> Result<HttpReply, ClientError>;
    fn archive_thread(&self, thread_id: &str) -> Result<HttpReply, ClientError>;
    fn list_messages(&self, thread_id: &str, page: &Page) -> Result<HttpReply, ClientError>;
    fn get_message(&self, thread_id: &str, message_id: &str) -> Result<HttpReply, ClientError>;
    fn get_original_message(&self, message_id: &str) -> Result<HttpReply, ClientError>;
    fn send_message(
        &self,
        thread_id: &str,
        message: &OutgoingMessage,
    ) -> Result<HttpReply, ClientError>;
    fn get_actor(&self, actor_id: &str) -> Result<HttpReply, ClientError>;
    fn list_actors(&self, page: &Page) -> Result<HttpReply, ClientError>;
    fn batch_get_actors(&self, actor_ids: &[String]) -> Result<HttpReply, ClientError>;
    fn get_inbox(&self, inbox_id: &str) -> Result<HttpReply, ClientError>;
    fn list_inboxes(&self, page: &Page) -> Result<HttpReply, ClientError>;
    fn get_channel(&self, channel_id: &str) -> Result<HttpReply, ClientError>;
    fn list_channels(&self, page: &Page) -> Result<HttpReply, ClientError>;
    fn get_channel_account(&self, channel_account_id: &str) -> Result<HttpReply, ClientError>;
    fn list_channel_accounts(
        &self,
        channel_id: Option<&str>,
        page: &Page,
    ) -> Result<HttpReply, ClientError>;
}

pub struct HttpConversationsClient {
    client: ApiClient,
}

impl HttpConversationsClient {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }
}

impl ConversationsApi for HttpConversationsClient {
    fn list_threads(&self, filter: &ThreadFilter) -> Result<HttpReply, ClientError> {
        self.client.get(&["threads"], &filter.query())
    }

    fn get_thread(&self, thread_id: &str) -> Result<HttpReply, ClientError> {
        self.client.get(&["threads", thread_id], &[])
    }

    fn update_thread(
        &self,
        thread_id: &str,
        update: &ThreadUpdate,
    ) -> Result<HttpReply, ClientError> {
        self.client.patch(&["threads", thread_id], update)
    }

    fn archive_thread(&self, thread_id: &str) -> Result<HttpReply, ClientError> {
        self.client.delete(&["threads", thread_id])
    }

    fn list_messages(&self, thread_id: &str, page: &Page) -> Result<HttpReply, ClientError> {
        self.client.get(&["threads", thread_id, "messages"], &page.query())
    }

    fn get_message(&self, thread_id: &str, message_id: &str) -> Result<HttpReply, ClientError> {
        self.client.get(&["threads", thread_id, "messages", message_id], &[])
    }

    fn get_original_message(&self, message_id: &str) -> Result<HttpReply, ClientError> {
        self.client.get(&["messages", message_id, "original"], &[])
    }

    fn send_message(
        &self,
        thread_id: &str,
        message: &OutgoingMessage,
    ) -> Result<HttpReply, ClientError> {
        self.client.post(&["threads", thread_id, "messages"], message)
    }

    fn get_actor(&self, actor_id: &str) -> Result<HttpReply, ClientError> {
        self.client.get(&["actors", actor_id], &[])
    }

    fn list_actors(&self, page: &Page) -> Result<HttpReply, ClientError> {
        self.client.get(&["actors"], &page.query())
    }

    fn batch_get_actors(&self, actor_ids: &[String]) -> Result<HttpReply, ClientError> {
        self.client.post(&["actors", "batch"], &ActorBatch { ids: actor_ids })
    }

    fn get_inbox(&self, inbox_id: &str) -> Result<HttpReply, ClientError> {
        self.client.get(&["inboxes", inbox_id], &[])
    }

    fn list_inboxes(&self, page: &Page) -> Result<HttpReply, ClientError> {
        self.client.get(&["inboxes"], &page.query())
    }

    fn get_channel(&self, channel_id: &str) -> Result<HttpReply, ClientError> {
        self.client.get(&["channels", channel_id], &[])
    }

    fn list_channels(&self, page: &Page) -> Result<HttpReply, ClientError> {
        self.client.get(&["channels"], &page.query())
    }

    fn get_channel_account(&self, channel_account_id: &str) -> Result<HttpReply, ClientError> {
        self.client.get(&["channel_accounts", channel_account_id], &[])
    }

    fn list_channel_accounts(
        &self,
        channel_id: Option<&str>,
        page: &Page,
    ) -> Result<HttpReply, ClientError> {
        let mut query = page.query();
        if let Some(channel_id) = channel_id {
            query.push(("channel_id", channel_id.to_string()));
        }
        self.client.get(&["channel_accounts"], &query)
    }
}
