use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

use crate::models::Participant;

/// The authenticated user, their bearer token and the connectivity signal,
/// handed explicitly to every transport.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: String,
    user: Participant,
    online: AtomicBool,
    invalidated: watch::Sender<bool>,
}

impl Session {
    pub fn new(token: impl Into<String>, user: Participant) -> Self {
        let (invalidated, _) = watch::channel(false);
        Self {
            inner: Arc::new(SessionInner {
                token: token.into(),
                user,
                online: AtomicBool::new(true),
                invalidated,
            }),
        }
    }

    pub fn token(&self) -> &str {
        &self.inner.token
    }

    pub fn user(&self) -> &Participant {
        &self.inner.user
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user.id
    }

    pub fn is_online(&self) -> bool {
        self.inner.online.load(Ordering::Relaxed)
    }

    /// Fed from the host's connectivity events.
    pub fn set_online(&self, online: bool) {
        self.inner.online.store(online, Ordering::Relaxed);
    }

    /// Marks the session dead after a 401. Session management reacts via
    /// [`Session::watch_invalidated`].
    pub fn invalidate(&self) {
        let was_invalid = self.inner.invalidated.send_replace(true);
        if !was_invalid {
            tracing::error!("Session for user {} rejected by server", self.inner.user.id);
        }
    }

    pub fn is_invalidated(&self) -> bool {
        *self.inner.invalidated.borrow()
    }

    pub fn watch_invalidated(&self) -> watch::Receiver<bool> {
        self.inner.invalidated.subscribe()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.inner.user)
            .field("online", &self.is_online())
            .field("invalidated", &self.is_invalidated())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalidation_is_observable() {
        let session = Session::new("token", Participant::new("u1"));
        let mut rx = session.watch_invalidated();
        assert!(!session.is_invalidated());

        session.clone().invalidate();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(session.is_invalidated());
    }

    #[test]
    fn connectivity_is_shared_between_clones() {
        let session = Session::new("token", Participant::new("u1"));
        let clone = session.clone();
        clone.set_online(false);
        assert!(!session.is_online());
    }

    #[test]
    fn debug_hides_token() {
        let session = Session::new("secret-token", Participant::new("u1"));
        assert!(!format!("{:?}", session).contains("secret-token"));
    }
}
