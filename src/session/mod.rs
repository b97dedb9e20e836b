//! Session and identity holder
//!
//! Owns the bearer credential and the authenticated identity as one unit:
//! both are set and cleared together, never separately. The session is an
//! explicitly owned object handed to whoever needs it; there is no ambient
//! global. State survives console restarts through a JSON file in the user
//! data directory until an explicit logout or a rejected-credential event.

#[cfg(test)]
mod tests;

use crate::policy::Role;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::watch;

/// Authenticated identity as returned by the backend at login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionState {
    credential: String,
    identity: Identity,
}

/// Single-writer holder for the credential/identity pair.
///
/// `clear` is idempotent: concurrent 401 handling may call it any number
/// of times, but observers see exactly one authenticated -> unauthenticated
/// transition.
pub struct Session {
    inner: Mutex<Option<SessionState>>,
    store_path: Option<PathBuf>,
    auth_tx: watch::Sender<bool>,
    // Keep one receiver alive so the watch channel never closes; without it
    // `auth_tx.send` is a silent no-op whenever no one is currently subscribed
    // (e.g. a `set` before the first `subscribe`).
    _auth_keepalive: watch::Receiver<bool>,
}

impl Session {
    /// Create a session backed by `store_path`, restoring any persisted
    /// state. Pass `None` for an in-memory session (tests).
    pub fn new(store_path: Option<PathBuf>) -> Self {
        let state = store_path.as_deref().and_then(Self::load_from);
        let (auth_tx, auth_rx) = watch::channel(state.is_some());
        Self {
            inner: Mutex::new(state),
            store_path,
            auth_tx,
            _auth_keepalive: auth_rx,
        }
    }

    /// Default on-disk location: `<data dir>/tpops/session.json`.
    pub fn default_store_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("tpops").join("session.json"))
    }

    /// Current credential and identity, or `None` when unauthenticated.
    pub fn get(&self) -> Option<(String, Identity)> {
        self.lock()
            .as_ref()
            .map(|s| (s.credential.clone(), s.identity.clone()))
    }

    /// Current bearer credential, if any.
    pub fn credential(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.credential.clone())
    }

    /// Current identity, if any.
    pub fn identity(&self) -> Option<Identity> {
        self.lock().as_ref().map(|s| s.identity.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().is_some()
    }

    /// Store a credential/identity pair, replacing any previous one.
    pub fn set(&self, credential: String, identity: Identity) {
        let state = SessionState {
            credential,
            identity,
        };
        {
            let mut guard = self.lock();
            *guard = Some(state.clone());
        }
        self.persist(Some(&state));
        let _ = self.auth_tx.send(true);
        tracing::info!(username = %state.identity.username, role = %state.identity.role, "session established");
    }

    /// Drop the credential/identity pair. Clearing an already-cleared
    /// session is a no-op and notifies nobody.
    pub fn clear(&self) {
        let was_authenticated = {
            let mut guard = self.lock();
            guard.take().is_some()
        };
        if was_authenticated {
            self.persist(None);
            let _ = self.auth_tx.send(false);
            tracing::info!("session cleared");
        }
    }

    /// Watch channel carrying the authenticated flag. The receiver sees
    /// the current value immediately and every transition afterwards.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.auth_tx.subscribe()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SessionState>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn load_from(path: &std::path::Path) -> Option<SessionState> {
        let content = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&content) {
            Ok(state) => Some(state),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "discarding unreadable session file");
                None
            }
        }
    }

    fn persist(&self, state: Option<&SessionState>) {
        let Some(path) = &self.store_path else {
            return;
        };
        let result = match state {
            Some(state) => {
                let write = || -> std::io::Result<()> {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    let json = serde_json::to_string(state)
                        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
                    std::fs::write(path, json)
                };
                write()
            }
            None => match std::fs::remove_file(path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        };
        if let Err(e) = result {
            tracing::warn!(path = %path.display(), error = %e, "failed to persist session state");
        }
    }
}
