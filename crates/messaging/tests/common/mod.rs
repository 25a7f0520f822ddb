#![allow(dead_code)]

use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bazaar_messaging::{
    Addressee, ConversationSummary, Delivery, FetchResult, Message, MessageTransport, Participant,
    Session, TransportError,
};
use chrono::{TimeZone, Utc};
use tokio::sync::oneshot;

/// Install a test subscriber once; honours RUST_LOG.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar_messaging=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

pub fn user(id: &str) -> Participant {
    Participant::new(id).with_username(format!("user-{}", id))
}

pub fn session(user_id: &str) -> Session {
    Session::new(format!("token-{}", user_id), user(user_id))
}

/// A confirmed server message; `minute` orders messages by creation time.
pub fn message(id: &str, sender: &str, recipient: &str, minute: u32) -> Message {
    Message {
        id: id.into(),
        content: format!("body of {}", id),
        sender: Some(user(sender)),
        recipient: Some(user(recipient)),
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).unwrap(),
        is_read: false,
        is_temporary: false,
        delivery: Delivery::Sent,
    }
}

pub fn ids(messages: &[Message]) -> Vec<&str> {
    messages.iter().map(|m| m.id.as_str()).collect()
}

/// Polls `condition` until it holds, failing the test after a second.
pub async fn eventually<F, Fut>(mut condition: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition().await {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not met in time");
}

struct ScriptedFetch {
    result: Result<FetchResult, TransportError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// In-memory transport answering from queued responses. Once the fetch queue
/// is empty every fetch returns an empty batch; sends succeed by default.
#[derive(Default)]
pub struct ScriptedTransport {
    fetches: Mutex<VecDeque<ScriptedFetch>>,
    send_results: Mutex<VecDeque<Result<(), TransportError>>>,
    read_results: Mutex<VecDeque<Result<(), TransportError>>>,
    conversations: Mutex<Option<Result<Vec<ConversationSummary>, TransportError>>>,
    users: Mutex<Vec<Participant>>,
    fetch_calls: AtomicUsize,
    fetched: Mutex<Vec<Addressee>>,
    sent: Mutex<Vec<(Addressee, String)>>,
    read: Mutex<Vec<String>>,
    searches: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_fetch(&self, result: Result<FetchResult, TransportError>) {
        self.fetches
            .lock()
            .unwrap()
            .push_back(ScriptedFetch { result, gate: None });
    }

    pub fn push_messages(&self, messages: Vec<Message>) {
        self.push_fetch(Ok(FetchResult::messages(messages)));
    }

    /// Queues a fetch that only completes once the returned sender fires.
    pub fn push_gated_fetch(
        &self,
        result: Result<FetchResult, TransportError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.fetches.lock().unwrap().push_back(ScriptedFetch {
            result,
            gate: Some(rx),
        });
        tx
    }

    pub fn push_send(&self, result: Result<(), TransportError>) {
        self.send_results.lock().unwrap().push_back(result);
    }

    pub fn push_read(&self, result: Result<(), TransportError>) {
        self.read_results.lock().unwrap().push_back(result);
    }

    pub fn set_conversations(&self, result: Result<Vec<ConversationSummary>, TransportError>) {
        *self.conversations.lock().unwrap() = Some(result);
    }

    pub fn set_users(&self, users: Vec<Participant>) {
        *self.users.lock().unwrap() = users;
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn fetched(&self) -> Vec<Addressee> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(Addressee, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn read(&self) -> Vec<String> {
        self.read.lock().unwrap().clone()
    }

    pub fn searches(&self) -> Vec<String> {
        self.searches.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageTransport for ScriptedTransport {
    async fn fetch_messages(&self, addressee: &Addressee) -> Result<FetchResult, TransportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.fetched.lock().unwrap().push(addressee.clone());
        let next = self.fetches.lock().unwrap().pop_front();
        match next {
            Some(ScriptedFetch { result, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Ok(FetchResult::default()),
        }
    }

    async fn send_message(&self, addressee: &Addressee, content: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap()
            .push((addressee.clone(), content.to_string()));
        self.send_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn mark_as_read(&self, message_id: &str) -> Result<(), TransportError> {
        self.read.lock().unwrap().push(message_id.to_string());
        self.read_results.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, TransportError> {
        self.conversations
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn search_users(&self, query: &str) -> Result<Vec<Participant>, TransportError> {
        self.searches.lock().unwrap().push(query.to_string());
        Ok(self.users.lock().unwrap().clone())
    }
}

/// Serve `app` on a random local port and return its `/api` base URL.
pub async fn start_mock_api(app: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://127.0.0.1:{}/api", addr.port())
}
