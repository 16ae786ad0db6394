//! Scripted collaborators shared by the crate's unit tests.

use async_trait::async_trait;
use axum::Router;
use chrono::{TimeZone, Utc};
use shared::config::ClientConfig;
use shared::models::{LoginRequest, LoginResponse, RegisterRequest, User, UserRole};
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};
use tokio::{net::TcpListener, sync::Notify};
use url::Url;

use crate::api::{ApiClient, ApiError, AuthApi};
use crate::storage::TokenStorage;

/// Serves `router` under `/api/v1` on an ephemeral port and returns its base URL.
pub(crate) async fn serve(router: Router) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().nest("/api/v1", router);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Url::parse(&format!("http://{addr}/api/v1/")).unwrap()
}

pub(crate) fn client_for(base_url: Url, storage: Arc<dyn TokenStorage>) -> ApiClient {
    let config = ClientConfig {
        api_base_url: base_url,
        request_timeout_secs: 5,
        ..ClientConfig::with_defaults()
    };
    ApiClient::new(&config, storage).unwrap()
}

pub(crate) fn sample_user(id: i64, username: &str, role: UserRole) -> User {
    User {
        id,
        username: username.to_string(),
        role,
        is_active: true,
        created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap(),
    }
}

pub(crate) fn login_ok(token: &str, user: User) -> Result<LoginResponse, ApiError> {
    Ok(LoginResponse {
        access_token: token.to_string(),
        token_type: "bearer".to_string(),
        expires_in: 3600,
        user,
    })
}

pub(crate) fn rejected(code: i64, message: &str) -> ApiError {
    ApiError::Rejected {
        code,
        message: message.to_string(),
    }
}

/// [`AuthApi`] that replays queued responses and records each call.
///
/// When a gate is installed, every call waits for one `notify_one` before
/// answering, which keeps it in flight for as long as a test needs.
#[derive(Default)]
pub(crate) struct ScriptedAuthApi {
    logins: Mutex<VecDeque<Result<LoginResponse, ApiError>>>,
    registers: Mutex<VecDeque<Result<(), ApiError>>>,
    profiles: Mutex<VecDeque<Result<User, ApiError>>>,
    calls: Mutex<Vec<&'static str>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedAuthApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    pub(crate) fn push_login(self, result: Result<LoginResponse, ApiError>) -> Self {
        self.logins.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn push_register(self, result: Result<(), ApiError>) -> Self {
        self.registers.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn push_profile(self, result: Result<User, ApiError>) -> Self {
        self.profiles.lock().unwrap().push_back(result);
        self
    }

    pub(crate) fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    async fn enter(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
    }

    fn next<T>(queue: &Mutex<VecDeque<Result<T, ApiError>>>) -> Result<T, ApiError> {
        queue
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(rejected(-1, "unscripted call")))
    }
}

#[async_trait]
impl AuthApi for ScriptedAuthApi {
    async fn login(&self, _credentials: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.enter("login").await;
        Self::next(&self.logins)
    }

    async fn register(&self, _details: &RegisterRequest) -> Result<(), ApiError> {
        self.enter("register").await;
        Self::next(&self.registers)
    }

    async fn current_user(&self) -> Result<User, ApiError> {
        self.enter("current_user").await;
        Self::next(&self.profiles)
    }
}
