//! Application shell wiring storage, API client, session, and navigation.

use shared::config::ClientConfig;
use std::sync::Arc;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{
    api::{ApiClient, ApiError, ApiEvent},
    navigator::Navigator,
    routes::{RouteName, RouteTable},
    session::SessionStore,
    storage::{FileStorage, TokenStorage},
};

/// Background work spawned by [`App::start`].
#[derive(Debug)]
pub struct Started {
    /// Verification of a persisted token, if one was found.
    pub hydration: Option<JoinHandle<()>>,
    /// Listener reacting to 401 responses.
    pub listener: JoinHandle<()>,
}

/// The client as one unit: API access, session, and navigation sharing one token store.
#[derive(Debug, Clone)]
pub struct App {
    api: ApiClient,
    store: SessionStore,
    navigator: Navigator,
}

impl App {
    /// Builds the app from configuration, persisting the token under
    /// [`ClientConfig::storage_dir`].
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let storage: Arc<dyn TokenStorage> = Arc::new(FileStorage::new(config.storage_dir()));
        let api = ApiClient::new(config, Arc::clone(&storage))?;
        let store = SessionStore::new(Arc::new(api.clone()), storage);
        Ok(Self::with_parts(api, store, Navigator::new(RouteTable::default())))
    }

    /// Assembles an app from existing parts, which should share one storage.
    #[must_use]
    pub const fn with_parts(api: ApiClient, store: SessionStore, navigator: Navigator) -> Self {
        Self {
            api,
            store,
            navigator,
        }
    }

    /// HTTP client.
    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Session store.
    #[must_use]
    pub const fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Navigator holding the current location.
    #[must_use]
    pub const fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Verifies any persisted token and starts reacting to 401 responses.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn start(&self) -> Started {
        let mut events = self.api.subscribe();
        let store = self.store.clone();
        let navigator = self.navigator.clone();
        let login = navigator
            .routes()
            .path_for(RouteName::Login)
            .unwrap_or("/login");

        let listener = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(ApiEvent::Unauthorized) => {}
                    // Every event is a 401, so missing some changes nothing.
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "unauthorized events lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
                warn!("session rejected by the API; signing out");
                store.logout();
                let _ = navigator.force(login);
            }
            debug!("API event channel closed");
        });

        info!(api = %self.api.base_url(), "client started");
        Started {
            hydration: self.store.hydrate(),
            listener,
        }
    }
}
