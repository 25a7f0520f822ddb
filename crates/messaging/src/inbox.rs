use std::sync::Arc;

use crate::error::TransportError;
use crate::models::ConversationSummary;
use crate::transport::MessageTransport;

/// The user's conversation list.
pub struct Inbox {
    transport: Arc<dyn MessageTransport>,
    conversations: Vec<ConversationSummary>,
}

impl Inbox {
    pub fn new(transport: Arc<dyn MessageTransport>) -> Self {
        Self {
            transport,
            conversations: Vec::new(),
        }
    }

    /// Reloads the list, newest activity first. On failure the previous list is kept.
    pub async fn refresh(&mut self) -> Result<&[ConversationSummary], TransportError> {
        let mut conversations = match self.transport.list_conversations().await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("Failed to load conversations: {}", e);
                return Err(e);
            }
        };
        conversations.sort_by(|a, b| {
            let a_at = a.last_message.as_ref().map(|m| m.created_at);
            let b_at = b.last_message.as_ref().map(|m| m.created_at);
            b_at.cmp(&a_at)
        });
        self.conversations = conversations;
        Ok(&self.conversations)
    }

    pub fn conversations(&self) -> &[ConversationSummary] {
        &self.conversations
    }

    pub fn total_unread(&self) -> u32 {
        self.conversations.iter().map(|c| c.unread_count).sum()
    }

    pub fn find_with_user(&self, user_id: &str) -> Option<&ConversationSummary> {
        self.conversations
            .iter()
            .find(|c| c.other_user.as_ref().is_some_and(|u| u.id == user_id))
    }
}
