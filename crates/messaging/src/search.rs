use std::sync::Arc;

use bazaar_shared::validation::validate_search_query;

use crate::error::TransportError;
use crate::models::Participant;
use crate::session::Session;
use crate::transport::MessageTransport;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("{0}")]
    InvalidQuery(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Recipient lookup for the new-message composer.
pub struct RecipientSearch {
    transport: Arc<dyn MessageTransport>,
    session: Session,
}

impl RecipientSearch {
    pub fn new(transport: Arc<dyn MessageTransport>, session: Session) -> Self {
        Self { transport, session }
    }

    /// Matching users, never including the current user.
    pub async fn search(&self, query: &str) -> Result<Vec<Participant>, SearchError> {
        let query = validate_search_query(query).map_err(SearchError::InvalidQuery)?;
        let users = self.transport.search_users(query).await?;
        Ok(users
            .into_iter()
            .filter(|u| u.id != self.session.user_id())
            .collect())
    }
}
