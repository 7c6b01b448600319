//! Session and identity context.
//!
//! The identity provider is passed around explicitly -- every operation
//! that needs the signed-in user takes a [`Session`] argument -- which also
//! makes testing with fake identities trivial.  Sign-in state changes fan
//! out over a `tokio::sync::watch` channel.

use tokio::sync::watch;

use trouvaille_shared::UserId;

use crate::error::ClientError;

/// A signed-in user: stable id (email) plus optional display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub email: UserId,
    pub display_name: Option<String>,
}

impl Session {
    pub fn new(email: impl AsRef<str>, display_name: Option<&str>) -> Self {
        Self {
            email: UserId::new(email),
            display_name: display_name.map(str::to_string),
        }
    }
}

/// Identity provider: holds the current session and notifies subscribers
/// on sign-in / sign-out.
pub struct Identity {
    tx: watch::Sender<Option<Session>>,
}

impl Identity {
    /// A signed-out provider.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    pub fn sign_in(&self, session: Session) {
        tracing::info!(user = %session.email, "signed in");
        self.tx.send_replace(Some(session));
    }

    pub fn sign_out(&self) {
        if let Some(session) = self.tx.send_replace(None) {
            tracing::info!(user = %session.email, "signed out");
        }
    }

    /// The current session, if any.
    pub fn current(&self) -> Option<Session> {
        self.tx.borrow().clone()
    }

    /// The current session, or [`ClientError::AuthRequired`].
    pub fn require(&self) -> Result<Session, ClientError> {
        self.current().ok_or(ClientError::AuthRequired)
    }

    /// Subscribe to sign-in state changes.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.tx.subscribe()
    }
}

impl Default for Identity {
    fn default() -> Self {
        Self::new()
    }
}
