use std::collections::HashSet;

use crate::error::TransportError;
use crate::models::{FetchResult, Message, Participant};
use crate::resolver::ParticipantResolver;
use crate::scroll::{ScrollDirective, ScrollTracker};
use crate::store::{MessageStore, ReplaceOutcome};
use crate::transport::Addressee;

use super::events::{ConversationEvent, FetchOutcome};

/// Everything one open conversation holds in memory. Only mutated from the
/// sync loop's completion handlers and the send path.
pub(crate) struct ConversationState {
    pub(crate) store: MessageStore,
    pub(crate) resolver: ParticipantResolver,
    pub(crate) scroll: ScrollTracker,
    pub(crate) conversation_id: Option<String>,
    fallback: Addressee,
    pub(crate) last_applied_seq: u64,
    pub(crate) in_flight: usize,
    pub(crate) last_error: Option<TransportError>,
    /// Ids a read receipt has been sent (or is being sent) for.
    pub(crate) receipts: HashSet<String>,
}

/// What a successful completion handler produced.
pub(crate) struct Applied {
    pub(crate) outcome: FetchOutcome,
    pub(crate) events: Vec<ConversationEvent>,
    pub(crate) receipts: Vec<String>,
}

impl ConversationState {
    pub(crate) fn new(
        resolver: ParticipantResolver,
        conversation_id: Option<String>,
        fallback: Addressee,
        scroll: ScrollTracker,
    ) -> Self {
        Self {
            store: MessageStore::new(),
            resolver,
            scroll,
            conversation_id,
            fallback,
            last_applied_seq: 0,
            in_flight: 0,
            last_error: None,
            receipts: HashSet::new(),
        }
    }

    pub(crate) fn fetch_addressee(&self) -> Addressee {
        if let Some(id) = &self.conversation_id {
            return Addressee::Conversation(id.clone());
        }
        match self.resolver.other_user() {
            Some(other) => Addressee::User(other.id.clone()),
            None => self.fallback.clone(),
        }
    }

    /// The other user when known, else the conversation id.
    pub(crate) fn send_addressee(&self) -> Option<Addressee> {
        if let Some(other) = self.resolver.other_user() {
            return Some(Addressee::User(other.id.clone()));
        }
        self.conversation_id
            .as_ref()
            .map(|id| Addressee::Conversation(id.clone()))
    }

    /// Merges a fetched batch: store, other user, scroll, read receipts.
    pub(crate) fn apply(
        &mut self,
        seq: u64,
        batch: FetchResult,
        current_user_id: &str,
        error: Option<TransportError>,
    ) -> Applied {
        self.last_applied_seq = seq;

        let receipts: Vec<String> = unread_from_others(&batch.messages, current_user_id)
            .filter(|id| self.receipts.insert(id.clone()))
            .collect();

        if let Some(id) = batch.conversation.as_ref().and_then(|c| c.id.clone()) {
            self.conversation_id = Some(id);
        }

        let mut events = Vec::new();
        if self.resolver.observe(&batch) {
            if let Some(other) = self.resolver.other_user() {
                events.push(ConversationEvent::OtherUserChanged(other.clone()));
            }
        }

        let (changed, scroll) = match self.store.replace(batch.messages) {
            ReplaceOutcome::Replaced { new_messages } => (true, self.scroll.on_merge(new_messages)),
            ReplaceOutcome::Skipped | ReplaceOutcome::Unchanged => (false, ScrollDirective::None),
        };
        if changed {
            events.push(ConversationEvent::MessagesChanged);
        }
        if scroll != ScrollDirective::None {
            events.push(ConversationEvent::Scroll(scroll));
        }
        if let Some(e) = &error {
            events.push(ConversationEvent::Error(e.clone()));
        }
        self.last_error = error;

        Applied {
            outcome: FetchOutcome::Applied { changed, scroll },
            events,
            receipts,
        }
    }

    pub(crate) fn other_user(&self) -> Option<&Participant> {
        self.resolver.other_user()
    }
}

/// Confirmed, unread messages not sent by the current user.
fn unread_from_others<'a>(
    messages: &'a [Message],
    current_user_id: &'a str,
) -> impl Iterator<Item = String> + 'a {
    messages
        .iter()
        .filter(move |m| !m.is_temporary && !m.is_read && !m.is_from(current_user_id))
        .map(|m| m.id.clone())
}
