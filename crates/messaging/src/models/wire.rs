//! Raw server payloads. Every field is optional so that one odd record does
//! not fail a whole batch; conversion into domain types drops what is unusable.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::{Conversation, ConversationSummary, Delivery, Message, Participant};

/// Ids arrive as strings from most endpoints and as numbers from a few.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireId {
    Text(String),
    Number(i64),
}

impl WireId {
    fn into_string(self) -> Option<String> {
        match self {
            WireId::Text(s) if !s.trim().is_empty() => Some(s),
            WireId::Text(_) => None,
            WireId::Number(n) => Some(n.to_string()),
        }
    }
}

/// A field of the wrong shape is treated as absent.
pub(crate) fn lenient<T: DeserializeOwned>(value: Option<Value>) -> Option<T> {
    value.and_then(|v| serde_json::from_value(v).ok())
}

/// Keeps the entries of a `participants` array that name a user.
pub(crate) fn participants_from(raw: Value) -> Vec<Participant> {
    let Value::Array(list) = raw else {
        return Vec::new();
    };
    list.into_iter()
        .filter_map(|v| lenient::<WireUserRef>(Some(v)))
        .filter_map(WireUserRef::into_participant)
        .collect()
}

/// RFC 3339 text or epoch milliseconds.
fn parse_timestamp(raw: Value) -> Option<DateTime<Utc>> {
    match raw {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

pub(crate) fn pick_id(id: Option<WireId>, mongo_id: Option<WireId>) -> Option<String> {
    id.and_then(WireId::into_string)
        .or_else(|| mongo_id.and_then(WireId::into_string))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireUser {
    id: Option<WireId>,
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    username: Option<String>,
    avatar: Option<String>,
    profile_picture: Option<String>,
    avatar_url: Option<String>,
}

/// A user is either embedded as an object or referenced by bare id.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum WireUserRef {
    Id(WireId),
    User(WireUser),
}

impl WireUserRef {
    pub(crate) fn into_participant(self) -> Option<Participant> {
        match self {
            WireUserRef::Id(id) => id.into_string().map(Participant::new),
            WireUserRef::User(user) => {
                let id = pick_id(user.id, user.mongo_id)?;
                Some(Participant {
                    id,
                    username: user.username,
                    avatar_url: user.avatar_url.or(user.avatar).or(user.profile_picture),
                })
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireMessage {
    id: Option<WireId>,
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    content: Option<String>,
    sender: Option<Value>,
    recipient: Option<Value>,
    created_at: Option<Value>,
    is_read: Option<bool>,
    read: Option<bool>,
}

impl WireMessage {
    /// `None` when the record has no id or no content.
    pub(crate) fn into_message(self, received_at: DateTime<Utc>) -> Option<Message> {
        let id = pick_id(self.id, self.mongo_id)?;
        let content = self.content.filter(|c| !c.trim().is_empty())?;
        let created_at = self
            .created_at
            .and_then(parse_timestamp)
            .unwrap_or(received_at);

        Some(Message {
            id,
            content,
            sender: lenient::<WireUserRef>(self.sender).and_then(WireUserRef::into_participant),
            recipient: lenient::<WireUserRef>(self.recipient)
                .and_then(WireUserRef::into_participant),
            created_at,
            is_read: self.is_read.or(self.read).unwrap_or(false),
            is_temporary: false,
            delivery: Delivery::Sent,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct WireConversation {
    id: Option<WireId>,
    #[serde(rename = "_id")]
    mongo_id: Option<WireId>,
    participants: Option<Value>,
    other_user: Option<Value>,
    last_message: Option<Value>,
    unread_count: Option<u32>,
}

impl WireConversation {
    pub(crate) fn has_participants(&self) -> bool {
        matches!(self.participants, Some(Value::Array(_)))
    }

    pub(crate) fn into_conversation(self) -> Conversation {
        Conversation {
            id: pick_id(self.id, self.mongo_id),
            participants: self.participants.map(participants_from).unwrap_or_default(),
        }
    }

    pub(crate) fn into_summary(
        self,
        current_user_id: &str,
        received_at: DateTime<Utc>,
    ) -> Option<ConversationSummary> {
        let id = pick_id(self.id, self.mongo_id)?;
        let participants = self.participants.map(participants_from).unwrap_or_default();
        let other_user = lenient::<WireUserRef>(self.other_user)
            .and_then(WireUserRef::into_participant)
            .or_else(|| crate::resolver::other_participant(&participants, current_user_id).cloned());

        Some(ConversationSummary {
            id,
            other_user,
            last_message: lenient::<WireMessage>(self.last_message)
                .and_then(|m| m.into_message(received_at)),
            unread_count: self.unread_count.unwrap_or(0),
        })
    }
}
