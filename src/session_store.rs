use crate::errors::SessionError;
use crate::models::Session;
use crate::traits::SessionStorage;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// Single source of truth for the current session.
///
/// Process state lives in a `watch` channel so observers can subscribe to
/// changes; persistent state lives in the injected [`SessionStorage`].
/// `set_session` is the only path that writes to storage.
pub struct SessionStore {
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<Option<Session>>,
    write_lock: Mutex<()>,
}

impl SessionStore {
    /// Creates an empty (logged out) store. Call [`SessionStore::initialize`]
    /// to load a persisted session.
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        let (state, _) = watch::channel(None);
        SessionStore {
            storage,
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads the persisted session into process state.
    ///
    /// Absent, unreadable or malformed records leave the state untouched.
    /// Observers are notified only when the state actually changes. Returns
    /// whether a session was loaded.
    pub fn initialize(&self) -> bool {
        let Some(session) = self.load_persisted() else {
            tracing::debug!("No persisted session found");
            return false;
        };

        tracing::info!("Loaded persisted session for {}", session.identity);
        self.state.send_if_modified(|current| {
            if current.as_ref() == Some(&session) {
                false
            } else {
                *current = Some(session);
                true
            }
        });
        true
    }

    /// Drops the in-memory session without touching persistent storage
    pub fn teardown(&self) {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.state.send_replace(None);
        tracing::debug!("Session store torn down");
    }

    /// Re-reads the persisted record. Errors are logged and reported as
    /// absent.
    pub fn load_persisted(&self) -> Option<Session> {
        let raw = match self.storage.read() {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read persisted session: {}", e);
                return None;
            }
        };

        match Session::parse(&raw) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::warn!("Ignoring malformed persisted session: {}", e);
                None
            }
        }
    }

    /// Current session in process state
    pub fn session(&self) -> Option<Session> {
        self.state.borrow().clone()
    }

    pub fn identity(&self) -> Option<String> {
        self.state.borrow().as_ref().map(|s| s.identity.clone())
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(Utc::now())
    }

    /// True iff a session is present and expires strictly after `now`
    pub fn is_authenticated_at(&self, now: DateTime<Utc>) -> bool {
        self.state
            .borrow()
            .as_ref()
            .is_some_and(|s| !s.is_expired_at(now))
    }

    /// Replaces the session, or clears it with `None`.
    ///
    /// A new session is validated and persisted before process state
    /// changes. Clearing always empties process state; a failure to remove
    /// the persisted record is still returned.
    pub fn set_session(&self, session: Option<Session>) -> Result<(), SessionError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        match session {
            Some(session) => {
                session.validate()?;
                self.storage.write(&session.to_json()?)?;
                tracing::info!(
                    "Session set for {} (expires at {})",
                    session.identity,
                    session.expires_at.to_rfc3339()
                );
                self.state.send_replace(Some(session));
                Ok(())
            }
            None => {
                self.state.send_replace(None);
                let result = self.storage.remove();
                match &result {
                    Ok(()) => tracing::info!("Session cleared"),
                    Err(e) => tracing::error!("Session cleared but storage removal failed: {}", e),
                }
                result
            }
        }
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.set_session(None)
    }

    pub fn check_expiry(&self) -> Result<bool, SessionError> {
        self.check_expiry_at(Utc::now())
    }

    /// Logs out when a session is present but no longer valid at `now`.
    /// Returns whether the session was ended.
    pub fn check_expiry_at(&self, now: DateTime<Utc>) -> Result<bool, SessionError> {
        if self.is_authenticated_at(now) || self.state.borrow().is_none() {
            return Ok(false);
        }

        tracing::info!("Session expired, logging out");
        self.logout()?;
        Ok(true)
    }

    /// Change notifications; the receiver sees the current value immediately
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.state.subscribe()
    }

    /// Header text shown by the dashboard layout
    pub fn status_line(&self) -> String {
        match self.identity() {
            Some(identity) if self.is_authenticated() => format!("{} | Log Out", identity),
            _ => "Log in".to_string(),
        }
    }
}
