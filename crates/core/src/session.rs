//! Authentication session store.
//!
//! [`SessionStore`] owns the current token and the identity decoded from it.
//! It is seeded once from durable storage at construction; afterwards the
//! in-memory copy is the single source of truth and every write to storage
//! is mirrored into memory immediately, so reads never touch storage again.
//!
//! The store is constructed explicitly and shared as `Arc<SessionStore>`.

use tokio::sync::watch;

use crate::roles::User;
use crate::storage::{MemoryStorage, SessionStorage};

/// Storage slot holding the raw token string.
pub const TOKEN_SLOT: &str = "token";
/// Storage slot holding the JSON-serialized [`User`].
pub const USER_SLOT: &str = "user";

/// Values some front ends write instead of removing a slot.
const ABSENT_MARKERS: [&str; 2] = ["undefined", "null"];

/// The authenticated identity and credential of the running client.
///
/// Either both the token and the user are present, or neither is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credentials: Option<(String, User)>,
}

impl Session {
    pub fn new(token: String, user: User) -> Self {
        Self {
            credentials: Some((token, user)),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|(token, _)| token.as_str())
    }

    pub fn user(&self) -> Option<&User> {
        self.credentials.as_ref().map(|(_, user)| user)
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }
}

/// Owner of the current [`Session`].
pub struct SessionStore {
    storage: Box<dyn SessionStorage>,
    state: watch::Sender<Session>,
}

impl SessionStore {
    /// Seed the store from `storage`.
    ///
    /// Missing, blank, `"undefined"` or `"null"` slots are absent. A user
    /// slot that is not valid JSON is absent. A token without a user (or a
    /// user without a token) resolves to no session. Never fails.
    pub fn load(storage: impl SessionStorage + 'static) -> Self {
        let session = read_session(&storage);
        tracing::debug!(
            authenticated = session.is_authenticated(),
            "Session store initialized"
        );
        let (state, _) = watch::channel(session);
        Self {
            storage: Box::new(storage),
            state,
        }
    }

    /// A store that persists nothing.
    pub fn in_memory() -> Self {
        Self::load(MemoryStorage::new())
    }

    /// Persist and activate a session.
    ///
    /// Storage failures are logged and swallowed; the in-memory session is
    /// updated regardless, so the running client stays logged in even if
    /// the next start will not be.
    pub fn login(&self, token: String, user: User) {
        match serde_json::to_string(&user) {
            Ok(user_json) => {
                if let Err(e) = self.storage.write(TOKEN_SLOT, &token) {
                    tracing::warn!(error = %e, "Failed to persist session token");
                }
                if let Err(e) = self.storage.write(USER_SLOT, &user_json) {
                    tracing::warn!(error = %e, "Failed to persist session user");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize session user");
            }
        }

        tracing::info!(user_id = user.id, role = %user.role, "Logged in");
        self.state.send_replace(Session::new(token, user));
    }

    /// Clear the session from storage and memory. Always succeeds.
    pub fn logout(&self) {
        for slot in [TOKEN_SLOT, USER_SLOT] {
            if let Err(e) = self.storage.remove(slot) {
                tracing::warn!(slot, error = %e, "Failed to clear session slot");
            }
        }
        self.state.send_replace(Session::anonymous());
        tracing::info!("Logged out");
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user().cloned()
    }

    pub fn token(&self) -> Option<String> {
        self.state.borrow().token().map(str::to_string)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// A copy of the current session.
    pub fn session(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Watch for login/logout transitions.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }
}

fn read_slot(storage: &dyn SessionStorage, slot: &str) -> Option<String> {
    match storage.read(slot) {
        Ok(Some(value)) => {
            let trimmed = value.trim();
            if trimmed.is_empty() || ABSENT_MARKERS.contains(&trimmed) {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(slot, error = %e, "Failed to read session slot");
            None
        }
    }
}

fn read_session(storage: &dyn SessionStorage) -> Session {
    let token = read_slot(storage, TOKEN_SLOT);
    let user = read_slot(storage, USER_SLOT).and_then(|json| {
        serde_json::from_str::<User>(&json)
            .map_err(|e| tracing::warn!(error = %e, "Stored session user is corrupt"))
            .ok()
    });

    match (token, user) {
        (Some(token), Some(user)) => Session::new(token, user),
        (None, None) => Session::anonymous(),
        (token, user) => {
            tracing::warn!(
                has_token = token.is_some(),
                has_user = user.is_some(),
                "Incomplete stored session, starting anonymous"
            );
            Session::anonymous()
        }
    }
}
