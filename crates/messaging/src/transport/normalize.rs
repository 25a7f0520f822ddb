//! The message endpoints answer in several envelope shapes. They are all
//! folded into [`FetchResult`] here and nowhere else.

use chrono::Utc;
use serde::Deserialize;
use serde_json::Value;

use crate::error::TransportError;
use crate::models::wire::{
    lenient, participants_from, pick_id, WireConversation, WireId, WireMessage, WireUserRef,
};
use crate::models::{Conversation, ConversationSummary, FetchResult, Message, Participant};

/// Every response shape accepted from the message fetch endpoint.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BatchShape {
    /// `[msg, ..]`
    Bare(Vec<Value>),
    /// `{ data: .. }` or `{ messages: [..] }`, optionally with `conversation`.
    Envelope(Envelope),
}

#[derive(Debug, Deserialize)]
struct Envelope {
    data: Option<Payload>,
    messages: Option<Vec<Value>>,
    conversation: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Payload {
    /// `{ data: [msg, ..] }`
    List(Vec<Value>),
    /// `{ data: { data: [..] } }`, `{ data: { messages: [..] } }`, or the
    /// conversation object itself with its messages inline.
    Nested(Nested),
}

#[derive(Debug, Deserialize)]
struct Nested {
    data: Option<Vec<Value>>,
    messages: Option<Vec<Value>>,
    conversation: Option<Value>,
    participants: Option<Value>,
    id: Option<Value>,
    #[serde(rename = "_id")]
    mongo_id: Option<Value>,
}

impl Nested {
    /// The payload is itself a conversation when it carries `participants`.
    fn take_conversation(&mut self) -> Option<Conversation> {
        if let Some(conversation) = embedded_conversation(self.conversation.take()) {
            return Some(conversation);
        }
        let participants @ Value::Array(_) = self.participants.take()? else {
            return None;
        };
        Some(Conversation {
            id: pick_id(
                lenient::<WireId>(self.id.take()),
                lenient::<WireId>(self.mongo_id.take()),
            ),
            participants: participants_from(participants),
        })
    }
}

/// A `conversation` field counts only when it is an object with participants.
fn embedded_conversation(raw: Option<Value>) -> Option<Conversation> {
    lenient::<WireConversation>(raw)
        .filter(WireConversation::has_participants)
        .map(WireConversation::into_conversation)
}

/// Normalizes a raw message fetch response.
///
/// Fails with [`TransportError::Malformed`] only when the body matches none
/// of the known shapes; individual unusable messages are skipped.
pub fn normalize_batch(body: Value) -> Result<FetchResult, TransportError> {
    let shape: BatchShape = serde_json::from_value(body)?;

    let (raw_messages, conversation) = match shape {
        BatchShape::Bare(list) => (list, None),
        BatchShape::Envelope(envelope) => {
            let outer = embedded_conversation(envelope.conversation);
            match (envelope.data, envelope.messages) {
                (Some(Payload::List(list)), _) => (list, outer),
                (Some(Payload::Nested(mut nested)), _) => {
                    let conversation = nested.take_conversation().or(outer);
                    let messages = match (nested.data, nested.messages) {
                        (Some(list), _) | (None, Some(list)) => list,
                        (None, None) if conversation.is_some() => Vec::new(),
                        (None, None) => {
                            return Err(TransportError::Malformed(
                                "data object has neither data nor messages".into(),
                            ))
                        }
                    };
                    (messages, conversation)
                }
                (None, Some(list)) => (list, outer),
                (None, None) => {
                    return Err(TransportError::Malformed(
                        "response has neither data nor messages".into(),
                    ))
                }
            }
        }
    };

    Ok(FetchResult {
        conversation,
        messages: parse_messages(raw_messages),
    })
}

/// Normalizes the conversation list, either a bare array or `{ data: [..] }`.
pub fn normalize_conversations(
    body: Value,
    current_user_id: &str,
) -> Result<Vec<ConversationSummary>, TransportError> {
    let list = match body {
        Value::Array(list) => list,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("conversations")) {
            Some(Value::Array(list)) => list,
            _ => {
                return Err(TransportError::Malformed(
                    "conversation list is not an array".into(),
                ))
            }
        },
        _ => {
            return Err(TransportError::Malformed(
                "conversation list is not an array".into(),
            ))
        }
    };

    let received_at = Utc::now();
    Ok(list
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<WireConversation>(raw).ok())
        .filter_map(|wire| wire.into_summary(current_user_id, received_at))
        .collect())
}

/// Normalizes user search results: a bare array, `{ data: [..] }` or `{ users: [..] }`.
pub fn normalize_users(body: Value) -> Result<Vec<Participant>, TransportError> {
    let list = match body {
        Value::Array(list) => list,
        Value::Object(mut map) => match map.remove("data").or_else(|| map.remove("users")) {
            Some(Value::Array(list)) => list,
            _ => return Err(TransportError::Malformed("user list is not an array".into())),
        },
        _ => return Err(TransportError::Malformed("user list is not an array".into())),
    };

    Ok(list
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<WireUserRef>(raw).ok())
        .filter_map(WireUserRef::into_participant)
        .collect())
}

fn parse_messages(raw: Vec<Value>) -> Vec<Message> {
    let received_at = Utc::now();
    let total = raw.len();
    let messages: Vec<Message> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value::<WireMessage>(value).ok())
        .filter_map(|wire| wire.into_message(received_at))
        .collect();

    if messages.len() < total {
        tracing::warn!(
            "Skipped {} unusable message(s) out of {}",
            total - messages.len(),
            total
        );
    }
    messages
}
