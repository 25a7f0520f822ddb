mod message;
mod user;
pub(crate) mod wire;

pub use message::*;
pub use user::*;

use serde::Serialize;

/// A two-party thread. `id` is unknown until the server reports one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: Option<String>,
    pub participants: Vec<Participant>,
}

/// Canonical result of a message fetch, whatever shape the server replied with.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchResult {
    pub conversation: Option<Conversation>,
    pub messages: Vec<Message>,
}

impl FetchResult {
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            conversation: None,
            messages,
        }
    }
}

/// One row of the inbox list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    pub id: String,
    pub other_user: Option<Participant>,
    pub last_message: Option<Message>,
    pub unread_count: u32,
}
