//! Signed-in session, held as explicit shared state.
//!
//! A [`SessionStore`] is created once at startup and handed to everything that
//! needs to know who is signed in. Consumers either read [`SessionStore::current`]
//! or follow changes through [`SessionStore::subscribe`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::watch;

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id (UUID)
    pub id: String,
    /// Email, when the account has one
    #[serde(default)]
    pub email: Option<String>,
}

/// Tokens for a signed-in user, as returned by the auth service.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Bearer token for data and storage requests
    pub access_token: String,
    /// Token used to obtain a new access token
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Expiry as a unix timestamp in seconds
    #[serde(default)]
    pub expires_at: Option<i64>,
    /// Who the tokens belong to
    pub user: User,
}

impl Session {
    /// Whether the access token has expired at `now` (unix seconds).
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }

    /// Whether the access token has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user)
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

struct Shared {
    tx: Mutex<Option<watch::Sender<Option<Session>>>>,
    rx: watch::Receiver<Option<Session>>,
}

/// Current session plus a change stream.
///
/// Cloning is cheap and every clone sees the same session. After
/// [`close`](Self::close) further writes are ignored and subscribers observe
/// the channel closing.
#[derive(Clone)]
pub struct SessionStore {
    shared: Arc<Shared>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("signed_in", &self.is_signed_in())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Store with nobody signed in.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                tx: Mutex::new(Some(tx)),
                rx,
            }),
        }
    }

    /// Snapshot of the current session.
    pub fn current(&self) -> Option<Session> {
        self.shared.rx.borrow().clone()
    }

    /// Current user, if signed in.
    pub fn user(&self) -> Option<User> {
        self.shared.rx.borrow().as_ref().map(|s| s.user.clone())
    }

    /// Whether somebody is signed in.
    pub fn is_signed_in(&self) -> bool {
        self.shared.rx.borrow().is_some()
    }

    /// Follow session changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.shared.rx.clone()
    }

    fn publish(&self, next: Option<Session>) -> bool {
        let tx = self.shared.tx.lock().unwrap_or_else(PoisonError::into_inner);
        match tx.as_ref() {
            Some(tx) => {
                tx.send_replace(next);
                true
            }
            None => false,
        }
    }

    /// Replace the session. Returns `false` once the store is closed.
    pub fn set(&self, session: Session) -> bool {
        tracing::debug!(user_id = %session.user.id, "Session changed");
        self.publish(Some(session))
    }

    /// Sign out locally. Returns `false` once the store is closed.
    pub fn clear(&self) -> bool {
        tracing::debug!("Session cleared");
        self.publish(None)
    }

    /// Tear down; subscribers see the channel close.
    pub fn close(&self) {
        let mut tx = self.shared.tx.lock().unwrap_or_else(PoisonError::into_inner);
        tx.take();
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.shared.tx.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}
