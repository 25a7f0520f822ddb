use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Participant;

/// Client-side delivery state. Confirmed server messages are always `Sent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Pending,
    Sent,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub content: String,
    pub sender: Option<Participant>,
    pub recipient: Option<Participant>,
    pub created_at: DateTime<Utc>,
    pub is_read: bool,
    pub is_temporary: bool,
    pub delivery: Delivery,
}

impl Message {
    pub fn sender_id(&self) -> Option<&str> {
        self.sender.as_ref().map(|s| s.id.as_str())
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient.as_ref().map(|r| r.id.as_str())
    }

    pub fn is_from(&self, user_id: &str) -> bool {
        self.sender_id() == Some(user_id)
    }

    pub fn is_failed(&self) -> bool {
        self.delivery == Delivery::Failed
    }
}
