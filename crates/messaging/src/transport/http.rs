use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{json, Value};
use std::time::Duration;
use url::Url;

use super::normalize::{normalize_batch, normalize_conversations, normalize_users};
use super::{Addressee, MessageTransport};
use crate::config::Config;
use crate::error::TransportError;
use crate::models::{ConversationSummary, FetchResult, Participant};
use crate::session::Session;

/// REST implementation of [`MessageTransport`].
pub struct HttpTransport {
    client: Client,
    base_url: String,
    timeout: Duration,
    session: Session,
}

impl HttpTransport {
    pub fn new(config: &Config, session: Session) -> Result<Self, url::ParseError> {
        let parsed = Url::parse(&config.api_base_url)?;
        Ok(Self {
            client: Client::new(),
            base_url: parsed.as_str().trim_end_matches('/').to_string(),
            timeout: config.request_timeout(),
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<Response, TransportError> {
        if !self.session.is_online() {
            return Err(TransportError::Offline);
        }
        if self.session.is_invalidated() {
            return Err(TransportError::Unauthenticated);
        }

        let res = request
            .bearer_auth(self.session.token())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }

        let body = res.text().await.unwrap_or_default();
        let message = error_message(&body);
        if status.as_u16() == 401 {
            self.session.invalidate();
        }
        tracing::warn!("Request failed ({}): {}", status, message.as_deref().unwrap_or(""));
        Err(TransportError::classify_status(status.as_u16(), message))
    }

    async fn get_json(&self, url: String) -> Result<Value, TransportError> {
        let res = self.execute(self.client.get(url)).await?;
        Ok(res.json::<Value>().await?)
    }
}

/// Pulls `error` or `message` out of a JSON error body.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key).and_then(Value::as_str))
        .map(str::to_string)
}

#[async_trait]
impl MessageTransport for HttpTransport {
    async fn fetch_messages(&self, addressee: &Addressee) -> Result<FetchResult, TransportError> {
        let path = match addressee {
            Addressee::Conversation(id) => {
                format!("/messages/conversations/{}", urlencoding::encode(id))
            }
            Addressee::User(id) => format!("/messages/users/{}", urlencoding::encode(id)),
        };
        let body = self.get_json(self.url(&path)).await?;
        normalize_batch(body)
    }

    async fn send_message(&self, addressee: &Addressee, content: &str) -> Result<(), TransportError> {
        let body = match addressee {
            Addressee::User(id) => json!({ "recipientId": id, "content": content }),
            Addressee::Conversation(id) => json!({ "conversationId": id, "content": content }),
        };
        self.execute(self.client.post(self.url("/messages")).json(&body))
            .await?;
        Ok(())
    }

    async fn mark_as_read(&self, message_id: &str) -> Result<(), TransportError> {
        let path = format!("/messages/{}/read", urlencoding::encode(message_id));
        self.execute(self.client.put(self.url(&path))).await?;
        Ok(())
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, TransportError> {
        let body = self.get_json(self.url("/messages/conversations")).await?;
        normalize_conversations(body, self.session.user_id())
    }

    async fn search_users(&self, query: &str) -> Result<Vec<Participant>, TransportError> {
        let path = format!("/users/search?query={}", urlencoding::encode(query));
        let body = self.get_json(self.url(&path)).await?;
        normalize_users(body)
    }
}
