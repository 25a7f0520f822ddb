pub mod config;
pub mod error;
pub mod inbox;
pub mod models;
pub mod resolver;
pub mod scroll;
pub mod search;
pub mod session;
pub mod store;
pub mod sync;
pub mod transport;

pub use config::{Config, SyncConfig};
pub use error::{SendError, TransportError};
pub use inbox::Inbox;
pub use models::{Conversation, ConversationSummary, Delivery, FetchResult, Message, Participant};
pub use search::{RecipientSearch, SearchError};
pub use session::Session;
pub use sync::{
    ConversationEvent, ConversationSnapshot, ConversationSync, ConversationTarget, FetchOutcome,
    SendReceipt, SyncPhase,
};
pub use transport::{Addressee, HttpTransport, MessageTransport};
