use crate::error::TransportError;
use crate::models::Participant;
use crate::scroll::ScrollDirective;

/// `Idle → Fetching → (Success | Failure) → Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Fetching,
    Success,
    Failure,
}

/// Pushed to the presentation layer whenever it should re-render.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    Phase(SyncPhase),
    MessagesChanged,
    OtherUserChanged(Participant),
    Scroll(ScrollDirective),
    Error(TransportError),
    /// The session was rejected; session management takes over from here.
    Unauthenticated,
}

/// Result of a single fetch as seen by the caller that issued it.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Applied {
        changed: bool,
        scroll: ScrollDirective,
    },
    Failed(TransportError),
    /// A newer fetch had already been applied.
    Stale,
    /// The conversation was closed before the response arrived.
    Unmounted,
}

impl FetchOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, FetchOutcome::Applied { .. })
    }
}
