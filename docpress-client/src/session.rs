//! Client-held authentication state.
//!
//! [`SessionStore`] owns the only mutable copy of the [`Session`]. Consumers get
//! owned snapshots or a `watch` receiver; neither can write back.

use shared::models::{LoginRequest, LoginResponse, RegisterRequest, User, UserRole};
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    api::{ApiError, AuthApi},
    storage::{TOKEN_KEY, TokenStorage},
};

/// Why a session operation did not take effect.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The backend refused the call or could not be reached.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A logout or another login completed while this call was in flight.
    #[error("session changed while the request was in flight")]
    Superseded,
}

/// Read-only view of the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
    pending: usize,
    generation: u64,
}

impl Session {
    /// Bearer token, present from login (or a persisted token) until logout.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Profile of the signed-in account.
    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// True while a login, register, or refresh call is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.pending > 0
    }

    /// Identity tag bumped whenever the session is replaced or cleared.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// A token alone does not count; the profile must have resolved too.
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    /// An absent user reads as not admin.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user
            .as_ref()
            .is_some_and(|user| user.role == UserRole::Admin)
    }

    #[cfg(test)]
    pub(crate) fn signed_in(token: &str, user: User) -> Self {
        Self {
            token: Some(token.to_string()),
            user: Some(user),
            ..Self::default()
        }
    }

    #[cfg(test)]
    pub(crate) fn token_only(token: &str) -> Self {
        Self {
            token: Some(token.to_string()),
            ..Self::default()
        }
    }
}

/// Marks the session as loading for as long as it is alive.
struct LoadingGuard {
    state: Arc<watch::Sender<Session>>,
}

impl LoadingGuard {
    fn begin(state: &Arc<watch::Sender<Session>>) -> Self {
        state.send_modify(|session| session.pending += 1);
        Self {
            state: Arc::clone(state),
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.state
            .send_modify(|session| session.pending = session.pending.saturating_sub(1));
    }
}

/// Owner of the session state and its mutations.
#[derive(Clone)]
pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn TokenStorage>,
    state: Arc<watch::Sender<Session>>,
    /// Held across a state change and its storage write so the disk follows
    /// the same order as memory. Never held across an `.await`.
    persist: Arc<Mutex<()>>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.state.borrow())
            .field("storage", &self.storage)
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Builds a store seeded with any persisted token. The user stays unset
    /// until [`SessionStore::refresh_current_user`] resolves it.
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn TokenStorage>) -> Self {
        let session = Session {
            token: storage.get(TOKEN_KEY),
            ..Session::default()
        };
        let (state, _) = watch::channel(session);
        Self {
            api,
            storage,
            state: Arc::new(state),
            persist: Arc::new(Mutex::new(())),
        }
    }

    /// Builds a store and, when a token was persisted, starts verifying it in
    /// the background. Must be called from within a tokio runtime.
    pub fn open(api: Arc<dyn AuthApi>, storage: Arc<dyn TokenStorage>) -> Self {
        let store = Self::new(api, storage);
        store.hydrate();
        store
    }

    /// Spawns a profile refresh if a token is present.
    pub fn hydrate(&self) -> Option<JoinHandle<()>> {
        if self.state.borrow().token.is_none() {
            return None;
        }
        debug!("persisted token found; verifying session");
        let store = self.clone();
        Some(tokio::spawn(async move {
            store.refresh_current_user().await;
        }))
    }

    /// Owned copy of the current session.
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver that observes every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    /// See [`Session::is_authenticated`].
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// See [`Session::is_admin`].
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.state.borrow().is_admin()
    }

    fn generation(&self) -> u64 {
        self.state.borrow().generation
    }

    fn persist_lock(&self) -> MutexGuard<'_, ()> {
        self.persist.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mirrors `token` into storage. Failures only cost persistence across restarts.
    fn write_token(&self, token: Option<&str>) {
        let result = match token {
            Some(token) => self.storage.set(TOKEN_KEY, token),
            None => self.storage.remove(TOKEN_KEY),
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to update persisted token");
        }
    }

    /// Exchanges credentials for a session.
    ///
    /// On failure the previous session is left untouched.
    ///
    /// # Errors
    /// Returns the API failure, or [`SessionError::Superseded`] if the session
    /// changed before the response arrived.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<User, SessionError> {
        let issued = self.generation();
        let _loading = LoadingGuard::begin(&self.state);

        let LoginResponse {
            access_token, user, ..
        } = self.api.login(credentials).await.map_err(|err| {
            warn!(username = %credentials.username, error = %err, "login failed");
            err
        })?;

        let applied = {
            let _persist = self.persist_lock();
            let applied = self.state.send_if_modified(|session| {
                if session.generation != issued {
                    return false;
                }
                session.token = Some(access_token.clone());
                session.user = Some(user.clone());
                session.generation += 1;
                true
            });
            if applied {
                self.write_token(Some(&access_token));
            }
            applied
        };

        if !applied {
            debug!(issued, "discarding stale login result");
            return Err(SessionError::Superseded);
        }
        info!(username = %user.username, role = %user.role, "login succeeded");
        Ok(user)
    }

    /// Creates an account. Never changes the session.
    ///
    /// # Errors
    /// Returns the API failure unchanged.
    pub async fn register(&self, details: &RegisterRequest) -> Result<(), SessionError> {
        let _loading = LoadingGuard::begin(&self.state);
        self.api.register(details).await.map_err(|err| {
            warn!(username = %details.username, error = %err, "registration failed");
            err
        })?;
        info!(username = %details.username, "registration succeeded; proceed to login");
        Ok(())
    }

    /// Clears the session and the persisted token. Safe to call repeatedly.
    ///
    /// Any login or refresh still in flight will have its result discarded.
    pub fn logout(&self) {
        let _persist = self.persist_lock();
        let was_signed_in = self.state.send_if_modified(|session| {
            let had_state = session.token.is_some() || session.user.is_some();
            session.token = None;
            session.user = None;
            session.generation += 1;
            had_state
        });
        self.write_token(None);
        if was_signed_in {
            info!("logged out");
        }
    }

    /// Re-reads the profile for the current token; any failure logs out.
    ///
    /// Does nothing when no token is present.
    pub async fn refresh_current_user(&self) {
        let issued = {
            let session = self.state.borrow();
            if session.token.is_none() {
                return;
            }
            session.generation
        };
        let _loading = LoadingGuard::begin(&self.state);

        match self.api.current_user().await {
            Ok(user) => {
                let applied = self.state.send_if_modified(|session| {
                    if session.generation != issued {
                        return false;
                    }
                    session.user = Some(user.clone());
                    true
                });
                if applied {
                    debug!(username = %user.username, "session verified");
                } else {
                    debug!(issued, "discarding stale profile refresh");
                }
            }
            Err(err) => {
                if self.generation() == issued {
                    warn!(error = %err, "session check failed; clearing session");
                    self.purge(issued);
                } else {
                    debug!(issued, error = %err, "ignoring failure for a replaced session");
                }
            }
        }
    }

    /// Logs out only if the session is still the one `issued` refers to.
    fn purge(&self, issued: u64) {
        let _persist = self.persist_lock();
        let purged = self.state.send_if_modified(|session| {
            if session.generation != issued {
                return false;
            }
            session.token = None;
            session.user = None;
            session.generation += 1;
            true
        });
        if purged {
            self.write_token(None);
        }
    }
}
