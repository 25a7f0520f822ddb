mod http;
pub mod normalize;

pub use http::HttpTransport;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::models::{ConversationSummary, FetchResult, Participant};

/// Who a fetch or send is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Addressee {
    Conversation(String),
    User(String),
}

impl Addressee {
    pub fn id(&self) -> &str {
        match self {
            Addressee::Conversation(id) | Addressee::User(id) => id,
        }
    }
}

/// Network boundary for the messaging core. Implementations hold no
/// conversation state; everything they return is already normalized.
#[async_trait]
pub trait MessageTransport: Send + Sync {
    async fn fetch_messages(&self, addressee: &Addressee) -> Result<FetchResult, TransportError>;

    async fn send_message(&self, addressee: &Addressee, content: &str) -> Result<(), TransportError>;

    /// Best effort; callers ignore the error.
    async fn mark_as_read(&self, message_id: &str) -> Result<(), TransportError>;

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, TransportError>;

    async fn search_users(&self, query: &str) -> Result<Vec<Participant>, TransportError>;
}
