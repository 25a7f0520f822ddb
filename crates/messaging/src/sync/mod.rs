mod events;
mod poller;
mod state;

pub use events::{ConversationEvent, FetchOutcome, SyncPhase};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bazaar_shared::validation::validate_message_content;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::error::{SendError, TransportError};
use crate::models::{Delivery, FetchResult, Message, Participant};
use crate::resolver::ParticipantResolver;
use crate::scroll::{ScrollDirective, ScrollTracker};
use crate::session::Session;
use crate::transport::{Addressee, MessageTransport};
use state::ConversationState;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// What the conversation view was opened for.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationTarget {
    /// An existing thread.
    Conversation(String),
    /// A thread with this user, possibly not created yet.
    Recipient(Participant),
}

/// Render-ready copy of a conversation's state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSnapshot {
    pub conversation_id: Option<String>,
    pub other_user: Option<Participant>,
    pub messages: Vec<Message>,
    pub phase: SyncPhase,
    pub last_error: Option<TransportError>,
    pub following: bool,
    pub unseen: usize,
}

/// A successful send. `refresh` is the follow-up fetch; if it failed the
/// temporary message simply stays on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct SendReceipt {
    pub message: Message,
    pub refresh: FetchOutcome,
}

pub(crate) struct Shared {
    transport: Arc<dyn MessageTransport>,
    session: Session,
    state: RwLock<ConversationState>,
    next_seq: AtomicU64,
    cancel: CancellationToken,
    events: broadcast::Sender<ConversationEvent>,
}

/// Handle to one open conversation. Cheap to clone; all clones share state.
#[derive(Clone)]
pub struct ConversationSync {
    shared: Arc<Shared>,
}

impl ConversationSync {
    /// Opens a conversation and starts polling. Must be called inside a tokio runtime.
    pub fn mount(
        transport: Arc<dyn MessageTransport>,
        session: Session,
        target: ConversationTarget,
        config: SyncConfig,
    ) -> Self {
        tracing::info!("Mounting conversation {:?}", target);
        let sync = Self::detached(transport, session, target, &config);

        tokio::spawn(poller::run(
            Arc::downgrade(&sync.shared),
            sync.shared.cancel.clone(),
            config.poll_interval,
        ));
        sync
    }

    /// Same as [`ConversationSync::mount`] without the polling timer; fetches
    /// only happen through [`ConversationSync::refresh`] and sends.
    pub fn detached(
        transport: Arc<dyn MessageTransport>,
        session: Session,
        target: ConversationTarget,
        config: &SyncConfig,
    ) -> Self {
        let user_id = session.user_id().to_string();
        let (resolver, conversation_id, fallback) = match target {
            ConversationTarget::Conversation(id) => (
                ParticipantResolver::new(user_id),
                Some(id.clone()),
                Addressee::Conversation(id),
            ),
            ConversationTarget::Recipient(user) => {
                let fallback = Addressee::User(user.id.clone());
                (ParticipantResolver::seeded(user_id, user), None, fallback)
            }
        };
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            shared: Arc::new(Shared {
                transport,
                session,
                state: RwLock::new(ConversationState::new(
                    resolver,
                    conversation_id,
                    fallback,
                    ScrollTracker::new(config.scroll_threshold_px),
                )),
                next_seq: AtomicU64::new(0),
                cancel: CancellationToken::new(),
                events,
            }),
        }
    }

    /// Stops the timer; responses still in flight are dropped on arrival.
    pub fn unmount(&self) {
        if !self.shared.cancel.is_cancelled() {
            tracing::info!("Unmounted conversation");
        }
        self.shared.cancel.cancel();
    }

    pub fn is_mounted(&self) -> bool {
        !self.shared.cancel.is_cancelled()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ConversationEvent> {
        self.shared.events.subscribe()
    }

    /// Fetches now, outside the timer.
    pub async fn refresh(&self) -> FetchOutcome {
        Shared::refresh(&self.shared).await
    }

    /// Optimistically appends `content` and sends it to the other user.
    pub async fn send(&self, content: &str) -> Result<SendReceipt, SendError> {
        validate_message_content(content).map_err(SendError::InvalidContent)?;
        if !self.is_mounted() {
            return Err(SendError::Unmounted);
        }

        let (temp, addressee) = {
            let mut state = self.shared.state.write().await;
            let addressee = state
                .send_addressee()
                .ok_or(SendError::CannotIdentifyRecipient)?;
            let recipient = state.other_user().cloned();
            let temp = state
                .store
                .append_temporary(content, self.shared.session.user().clone(), recipient);
            let scroll = state.scroll.on_local_append();
            drop(state);

            self.shared.emit(ConversationEvent::MessagesChanged);
            self.shared.emit(ConversationEvent::Scroll(scroll));
            (temp, addressee)
        };

        Shared::deliver(&self.shared, temp, addressee).await
    }

    /// Resends a message whose earlier send failed.
    pub async fn retry(&self, temp_id: &str) -> Result<SendReceipt, SendError> {
        if !self.is_mounted() {
            return Err(SendError::Unmounted);
        }

        let (temp, addressee) = {
            let mut state = self.shared.state.write().await;
            let temp = match state.store.get(temp_id) {
                Some(m) if m.delivery == Delivery::Failed => m.clone(),
                _ => return Err(SendError::UnknownMessage(temp_id.to_string())),
            };
            let addressee = state
                .send_addressee()
                .ok_or(SendError::CannotIdentifyRecipient)?;
            state.store.mark_pending(temp_id);
            (temp, addressee)
        };
        self.shared.emit(ConversationEvent::MessagesChanged);

        Shared::deliver(&self.shared, temp, addressee).await
    }

    /// Removes a temporary message at the user's request.
    pub async fn discard(&self, temp_id: &str) -> Option<Message> {
        let removed = self.shared.state.write().await.store.discard(temp_id);
        if removed.is_some() {
            self.shared.emit(ConversationEvent::MessagesChanged);
        }
        removed
    }

    /// Reports how far (in px) the viewport currently is from the newest message.
    pub async fn record_viewport(&self, distance_from_bottom_px: f32) {
        self.shared
            .state
            .write()
            .await
            .scroll
            .record_viewport(distance_from_bottom_px);
    }

    pub async fn jump_to_latest(&self) -> ScrollDirective {
        let directive = self.shared.state.write().await.scroll.jump_to_latest();
        self.shared.emit(ConversationEvent::Scroll(directive));
        directive
    }

    pub async fn messages(&self) -> Vec<Message> {
        self.shared.state.read().await.store.messages().to_vec()
    }

    pub async fn other_user(&self) -> Option<Participant> {
        self.shared.state.read().await.other_user().cloned()
    }

    pub async fn last_error(&self) -> Option<TransportError> {
        self.shared.state.read().await.last_error.clone()
    }

    pub async fn snapshot(&self) -> ConversationSnapshot {
        let state = self.shared.state.read().await;
        ConversationSnapshot {
            conversation_id: state.conversation_id.clone(),
            other_user: state.other_user().cloned(),
            messages: state.store.messages().to_vec(),
            phase: if state.in_flight > 0 {
                SyncPhase::Fetching
            } else {
                SyncPhase::Idle
            },
            last_error: state.last_error.clone(),
            following: state.scroll.is_following(),
            unseen: state.scroll.unseen(),
        }
    }
}

impl Shared {
    fn emit(&self, event: ConversationEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn refresh(self: &Arc<Self>) -> FetchOutcome {
        if self.cancel.is_cancelled() {
            return FetchOutcome::Unmounted;
        }

        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let addressee = {
            let mut state = self.state.write().await;
            state.in_flight += 1;
            state.fetch_addressee()
        };
        self.emit(ConversationEvent::Phase(SyncPhase::Fetching));

        let result = self.transport.fetch_messages(&addressee).await;
        self.complete(seq, result).await
    }

    /// Completion handler for fetch `seq`.
    async fn complete(
        self: &Arc<Self>,
        seq: u64,
        result: Result<FetchResult, TransportError>,
    ) -> FetchOutcome {
        let mut state = self.state.write().await;
        state.in_flight = state.in_flight.saturating_sub(1);

        if self.cancel.is_cancelled() {
            tracing::debug!("Dropping fetch #{} completed after unmount", seq);
            return FetchOutcome::Unmounted;
        }
        if seq <= state.last_applied_seq {
            tracing::debug!(
                "Discarding stale fetch #{} (already applied #{})",
                seq,
                state.last_applied_seq
            );
            return FetchOutcome::Stale;
        }

        let user_id = self.session.user_id();
        let applied = match result {
            Ok(batch) => state.apply(seq, batch, user_id, None),
            // No history yet; sending is still allowed.
            Err(TransportError::NotFound) => state.apply(seq, FetchResult::default(), user_id, None),
            Err(TransportError::Malformed(reason)) => {
                tracing::warn!("Malformed message payload: {}", reason);
                state.apply(
                    seq,
                    FetchResult::default(),
                    user_id,
                    Some(TransportError::Malformed(reason)),
                )
            }
            Err(e) => {
                tracing::warn!("Fetch #{} failed: {}", seq, e);
                state.last_error = Some(e.clone());
                let idle = state.in_flight == 0;
                drop(state);

                self.emit(ConversationEvent::Phase(SyncPhase::Failure));
                self.emit(ConversationEvent::Error(e.clone()));
                if e == TransportError::Unauthenticated {
                    self.emit(ConversationEvent::Unauthenticated);
                }
                if idle {
                    self.emit(ConversationEvent::Phase(SyncPhase::Idle));
                }
                return FetchOutcome::Failed(e);
            }
        };
        let idle = state.in_flight == 0;
        drop(state);

        self.emit(ConversationEvent::Phase(SyncPhase::Success));
        for event in applied.events {
            self.emit(event);
        }
        if idle {
            self.emit(ConversationEvent::Phase(SyncPhase::Idle));
        }
        self.send_read_receipts(applied.receipts);

        applied.outcome
    }

    /// Fire-and-forget; a failed receipt is retried on a later fetch.
    fn send_read_receipts(self: &Arc<Self>, ids: Vec<String>) {
        for id in ids {
            let shared = Arc::clone(self);
            tokio::spawn(async move {
                if let Err(e) = shared.transport.mark_as_read(&id).await {
                    tracing::debug!("Failed to mark message {} as read: {}", id, e);
                    shared.state.write().await.receipts.remove(&id);
                }
            });
        }
    }

    async fn deliver(
        self: &Arc<Self>,
        mut temp: Message,
        addressee: Addressee,
    ) -> Result<SendReceipt, SendError> {
        match self.transport.send_message(&addressee, &temp.content).await {
            Ok(()) => {
                if self.cancel.is_cancelled() {
                    return Ok(SendReceipt {
                        message: temp,
                        refresh: FetchOutcome::Unmounted,
                    });
                }
                if self.state.write().await.store.mark_sent(&temp.id) {
                    self.emit(ConversationEvent::MessagesChanged);
                }
                temp.delivery = Delivery::Sent;
                tracing::info!("Sent message to {:?}", addressee);

                let refresh = self.refresh().await;
                if let FetchOutcome::Failed(e) = &refresh {
                    tracing::debug!("Refresh after send failed, keeping temporary message: {}", e);
                }
                Ok(SendReceipt {
                    message: temp,
                    refresh,
                })
            }
            Err(e) => {
                tracing::warn!("Failed to send message: {}", e);
                if !self.cancel.is_cancelled() {
                    let mut state = self.state.write().await;
                    state.store.mark_failed(&temp.id);
                    state.last_error = Some(e.clone());
                    drop(state);
                    self.emit(ConversationEvent::MessagesChanged);
                    self.emit(ConversationEvent::Error(e.clone()));
                }
                if e == TransportError::Unauthenticated {
                    self.emit(ConversationEvent::Unauthenticated);
                }
                Err(SendError::Transport(e))
            }
        }
    }
}
