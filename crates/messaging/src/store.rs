//! Render-ready message list for one open conversation, mixing confirmed
//! server messages with locally injected temporary ones.

use bazaar_shared::constants::TEMP_MESSAGE_ID_PREFIX;
use chrono::Utc;

use crate::models::{Delivery, Message, Participant};

/// Collision-free ids for temporary messages: a per-store random namespace
/// plus a monotonic counter.
#[derive(Debug, Clone)]
pub struct TempIdGenerator {
    namespace: String,
    counter: u64,
}

impl TempIdGenerator {
    pub fn new() -> Self {
        Self {
            namespace: nanoid::nanoid!(10),
            counter: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        self.counter += 1;
        format!("{}{}-{}", TEMP_MESSAGE_ID_PREFIX, self.namespace, self.counter)
    }
}

impl Default for TempIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Empty server list while messages are on screen; nothing was touched.
    Skipped,
    Unchanged,
    /// `new_messages` counts confirmed ids that were not on screen before.
    Replaced { new_messages: usize },
}

#[derive(Debug, Default)]
pub struct MessageStore {
    messages: Vec<Message>,
    temp_ids: TempIdGenerator,
}

impl MessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Swaps in the server's list.
    ///
    /// An empty list never erases visible messages. Temporary messages that
    /// are still pending or have failed are kept at the tail; temporaries the
    /// server has acknowledged are superseded by the new list.
    pub fn replace(&mut self, server_messages: Vec<Message>) -> ReplaceOutcome {
        if server_messages.is_empty() && !self.messages.is_empty() {
            return ReplaceOutcome::Skipped;
        }

        let new_messages = server_messages
            .iter()
            .filter(|incoming| !self.messages.iter().any(|m| !m.is_temporary && m.id == incoming.id))
            .count();

        let carried: Vec<Message> = self
            .messages
            .iter()
            .filter(|m| m.is_temporary && m.delivery != Delivery::Sent)
            .cloned()
            .collect();

        let mut next = server_messages;
        next.extend(carried);

        if next == self.messages {
            return ReplaceOutcome::Unchanged;
        }
        self.messages = next;
        ReplaceOutcome::Replaced { new_messages }
    }

    /// Appends a pending temporary message at the tail and returns a copy of it.
    pub fn append_temporary(
        &mut self,
        content: impl Into<String>,
        sender: Participant,
        recipient: Option<Participant>,
    ) -> Message {
        let message = Message {
            id: self.temp_ids.next_id(),
            content: content.into(),
            sender: Some(sender),
            recipient,
            created_at: Utc::now(),
            is_read: false,
            is_temporary: true,
            delivery: Delivery::Pending,
        };
        self.messages.push(message.clone());
        message
    }

    pub fn mark_sent(&mut self, id: &str) -> bool {
        self.set_delivery(id, Delivery::Sent)
    }

    pub fn mark_failed(&mut self, id: &str) -> bool {
        self.set_delivery(id, Delivery::Failed)
    }

    pub fn mark_pending(&mut self, id: &str) -> bool {
        self.set_delivery(id, Delivery::Pending)
    }

    /// Removes a temporary message. Confirmed messages cannot be discarded.
    pub fn discard(&mut self, id: &str) -> Option<Message> {
        let index = self
            .messages
            .iter()
            .position(|m| m.id == id && m.is_temporary)?;
        Some(self.messages.remove(index))
    }

    fn set_delivery(&mut self, id: &str, delivery: Delivery) -> bool {
        match self
            .messages
            .iter_mut()
            .find(|m| m.id == id && m.is_temporary)
        {
            Some(message) => {
                message.delivery = delivery;
                true
            }
            None => false,
        }
    }
}
