use thiserror::Error;

/// Failures surfaced by a [`crate::transport::MessageTransport`] call.
///
/// Every variant is non-fatal to the open conversation: already rendered
/// messages stay visible and the user can keep composing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("conversation not found")]
    NotFound,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("session is no longer valid")]
    Unauthenticated,

    #[error("device is offline")]
    Offline,

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    /// Maps a non-success HTTP status (and the server's error text, if any).
    pub fn classify_status(status: u16, message: Option<String>) -> Self {
        match status {
            401 => TransportError::Unauthenticated,
            403 => TransportError::Forbidden(
                message.unwrap_or_else(|| "You cannot message this user".into()),
            ),
            404 => TransportError::NotFound,
            408 | 504 => TransportError::Timeout,
            _ => TransportError::Server {
                status,
                message: message.unwrap_or_default(),
            },
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout
                | TransportError::Offline
                | TransportError::Network(_)
                | TransportError::Server { .. }
        )
    }

    /// Text suitable for a toast or inline banner.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::Timeout => "The server took too long to respond. Retrying…".into(),
            TransportError::NotFound => "No messages yet.".into(),
            TransportError::Forbidden(message) => message.clone(),
            TransportError::Unauthenticated => "Your session has expired. Please log in again.".into(),
            TransportError::Offline => "You are offline. Messages will refresh when you reconnect.".into(),
            TransportError::Malformed(_) => "Received an unexpected response from the server.".into(),
            TransportError::Server { .. } | TransportError::Network(_) => {
                "Could not reach the server. Please try again.".into()
            }
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() {
            TransportError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            TransportError::classify_status(status.as_u16(), None)
        } else {
            TransportError::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(e: serde_json::Error) -> Self {
        TransportError::Malformed(e.to_string())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SendError {
    #[error("{0}")]
    InvalidContent(String),

    #[error("cannot identify recipient")]
    CannotIdentifyRecipient,

    #[error("conversation is no longer open")]
    Unmounted,

    #[error("no failed message with id {0}")]
    UnknownMessage(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl SendError {
    pub fn user_message(&self) -> String {
        match self {
            SendError::InvalidContent(reason) => reason.clone(),
            SendError::CannotIdentifyRecipient => {
                "Cannot identify the recipient of this conversation.".into()
            }
            SendError::Unmounted => "This conversation is closed.".into(),
            SendError::UnknownMessage(_) => "That message can no longer be resent.".into(),
            SendError::Transport(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_statuses() {
        assert_eq!(TransportError::classify_status(401, None), TransportError::Unauthenticated);
        assert_eq!(TransportError::classify_status(404, None), TransportError::NotFound);
        assert_eq!(TransportError::classify_status(504, None), TransportError::Timeout);
        assert_eq!(
            TransportError::classify_status(403, Some("Blocked".into())),
            TransportError::Forbidden("Blocked".into())
        );
        assert_eq!(
            TransportError::classify_status(500, Some("boom".into())),
            TransportError::Server { status: 500, message: "boom".into() }
        );
    }

    #[test]
    fn forbidden_is_surfaced_verbatim() {
        let e = TransportError::Forbidden("You were blocked by this seller".into());
        assert_eq!(e.user_message(), "You were blocked by this seller");
        assert!(!e.is_retryable());
    }

    #[test]
    fn timeout_and_offline_are_retryable() {
        assert!(TransportError::Timeout.is_retryable());
        assert!(TransportError::Offline.is_retryable());
        assert!(!TransportError::Unauthenticated.is_retryable());
    }
}
