//! Tests for the session store
//!
//! Covers the authenticated invariant, login/register/logout contracts,
//! profile refresh, and discarding of results that arrive after the session
//! has been replaced.

#[cfg(test)]
mod tests {
    use std::{
        sync::{Arc, Mutex, OnceLock},
        time::Duration,
    };

    use shared::models::{LoginRequest, RegisterRequest, User, UserRole};
    use tokio::{
        sync::{Notify, watch},
        task::{self, JoinHandle},
        time::timeout,
    };

    use crate::api::ApiError;
    use crate::session::{Session, SessionError, SessionStore};
    use crate::storage::{MemoryStorage, StorageError, TOKEN_KEY, TokenStorage};
    use crate::test_support::{ScriptedAuthApi, login_ok, rejected, sample_user};

    fn credentials() -> LoginRequest {
        LoginRequest {
            username: "u".to_string(),
            password: "p".to_string(),
        }
    }

    fn store_with(
        api: ScriptedAuthApi,
        storage: MemoryStorage,
    ) -> (SessionStore, Arc<ScriptedAuthApi>, Arc<MemoryStorage>) {
        let api = Arc::new(api);
        let storage = Arc::new(storage);
        let store = SessionStore::new(api.clone(), storage.clone());
        (store, api, storage)
    }

    /// Storage that records the session visible to readers at each write.
    #[derive(Debug, Default)]
    struct ObservingStorage {
        inner: MemoryStorage,
        session: OnceLock<watch::Receiver<Session>>,
        seen: Mutex<Vec<Option<String>>>,
    }

    impl ObservingStorage {
        fn observe(&self) {
            if let Some(session) = self.session.get() {
                let token = session.borrow().token().map(str::to_string);
                self.seen.lock().unwrap().push(token);
            }
        }
    }

    impl TokenStorage for ObservingStorage {
        fn get(&self, key: &str) -> Option<String> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.observe();
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.observe();
            self.inner.remove(key)
        }
    }

    /// Spawns a login on `store` with the standard credentials.
    fn spawn_login(store: &SessionStore) -> JoinHandle<Result<User, SessionError>> {
        let store = store.clone();
        tokio::spawn(async move { store.login(&credentials()).await })
    }

    /// Yields until the scripted API has seen `count` calls.
    async fn wait_for_calls(api: &ScriptedAuthApi, count: usize) {
        while api.calls().len() < count {
            task::yield_now().await;
        }
    }

    #[test]
    fn test_empty_store_is_not_authenticated() {
        let (store, _, _) = store_with(ScriptedAuthApi::new(), MemoryStorage::new());
        let session = store.snapshot();

        assert!(!session.is_authenticated());
        assert!(!session.is_admin());
        assert!(!session.is_loading());
        assert_eq!(session.token(), None);
        assert_eq!(session.user(), None);
    }

    #[test]
    fn test_persisted_token_alone_is_not_authenticated() {
        let (store, api, _) = store_with(ScriptedAuthApi::new(), MemoryStorage::with_token("T"));

        assert_eq!(store.snapshot().token(), Some("T"));
        assert!(!store.is_authenticated());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_login_success_sets_token_and_user() {
        let user = sample_user(1, "u", UserRole::User);
        let api = ScriptedAuthApi::new().push_login(login_ok("T", user.clone()));
        let (store, _, storage) = store_with(api, MemoryStorage::new());

        let logged_in = store.login(&credentials()).await.unwrap();

        assert_eq!(logged_in, user);
        let session = store.snapshot();
        assert!(session.is_authenticated());
        assert!(!session.is_admin());
        assert!(!session.is_loading());
        assert_eq!(session.token(), Some("T"));
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_login_as_admin_sets_admin_flag() {
        let admin = sample_user(2, "root", UserRole::Admin);
        let api = ScriptedAuthApi::new().push_login(login_ok("A", admin));
        let (store, _, _) = store_with(api, MemoryStorage::new());

        store.login(&credentials()).await.unwrap();

        assert!(store.is_admin());
    }

    #[tokio::test]
    async fn test_rejected_login_leaves_session_unchanged() {
        let user = sample_user(1, "u", UserRole::User);
        let api = ScriptedAuthApi::new()
            .push_login(login_ok("T", user))
            .push_login(Err(rejected(1, "bad credentials")));
        let (store, _, storage) = store_with(api, MemoryStorage::new());
        store.login(&credentials()).await.unwrap();
        let before = store.snapshot();

        let err = store.login(&credentials()).await.unwrap_err();

        assert!(matches!(
            err,
            SessionError::Api(ApiError::Rejected { code: 1, ref message }) if message == "bad credentials"
        ));
        assert_eq!(err.to_string(), "bad credentials");
        assert_eq!(store.snapshot(), before);
        assert!(!store.snapshot().is_loading());
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_failed_login_from_empty_session_stays_empty() {
        let api = ScriptedAuthApi::new().push_login(Err(ApiError::MissingData));
        let (store, _, storage) = store_with(api, MemoryStorage::new());

        assert!(store.login(&credentials()).await.is_err());

        assert!(!store.is_authenticated());
        assert!(!store.snapshot().is_loading());
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_register_never_touches_session() {
        let api = ScriptedAuthApi::new()
            .push_register(Ok(()))
            .push_register(Err(rejected(1001, "username taken")));
        let (store, _, _) = store_with(api, MemoryStorage::new());
        let details = RegisterRequest {
            username: "new".to_string(),
            password: "secret".to_string(),
        };

        store.register(&details).await.unwrap();
        assert!(!store.is_authenticated());

        let err = store.register(&details).await.unwrap_err();
        assert_eq!(err.to_string(), "username taken");
        assert!(!store.is_authenticated());
        assert!(!store.snapshot().is_loading());
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_is_idempotent() {
        let user = sample_user(1, "u", UserRole::User);
        let api = ScriptedAuthApi::new().push_login(login_ok("T", user));
        let (store, _, storage) = store_with(api, MemoryStorage::new());
        store.login(&credentials()).await.unwrap();

        store.logout();
        assert!(!store.is_authenticated());
        assert_eq!(store.snapshot().token(), None);
        assert_eq!(store.snapshot().user(), None);
        assert_eq!(storage.get(TOKEN_KEY), None);

        store.logout();
        assert!(!store.is_authenticated());
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_refresh_without_token_is_noop() {
        let (store, api, _) = store_with(ScriptedAuthApi::new(), MemoryStorage::new());
        let before = store.snapshot();

        store.refresh_current_user().await;

        assert!(api.calls().is_empty());
        assert_eq!(store.snapshot(), before);
    }

    #[tokio::test]
    async fn test_refresh_resolves_user_for_persisted_token() {
        let user = sample_user(3, "kept", UserRole::User);
        let api = ScriptedAuthApi::new().push_profile(Ok(user));
        let (store, api, _) = store_with(api, MemoryStorage::with_token("T"));

        store.refresh_current_user().await;

        assert_eq!(api.calls(), vec!["current_user"]);
        assert!(store.is_authenticated());
        assert_eq!(store.snapshot().user().unwrap().username, "kept");
    }

    #[tokio::test]
    async fn test_refresh_failure_logs_out() {
        let api = ScriptedAuthApi::new().push_profile(Err(rejected(401, "invalid session")));
        let (store, _, storage) = store_with(api, MemoryStorage::with_token("stale"));

        store.refresh_current_user().await;

        let session = store.snapshot();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
        assert!(!session.is_loading());
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_refresh_transport_style_failure_logs_out() {
        let api = ScriptedAuthApi::new().push_profile(Err(ApiError::Unauthorized));
        let (store, _, storage) = store_with(api, MemoryStorage::with_token("stale"));

        store.refresh_current_user().await;

        assert_eq!(store.snapshot().token(), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
    }

    #[tokio::test]
    async fn test_hydrate_spawns_refresh() {
        let user = sample_user(1, "u", UserRole::Admin);
        let api = ScriptedAuthApi::new().push_profile(Ok(user));
        let (store, _, _) = store_with(api, MemoryStorage::with_token("T"));

        let handle = store.hydrate().expect("token present");
        handle.await.unwrap();

        assert!(store.is_authenticated());
        assert!(store.is_admin());
    }

    #[tokio::test]
    async fn test_hydrate_without_token_does_nothing() {
        let (store, api, _) = store_with(ScriptedAuthApi::new(), MemoryStorage::new());
        assert!(store.hydrate().is_none());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_loading_flag_tracks_in_flight_login() {
        let gate = Arc::new(Notify::new());
        let api = ScriptedAuthApi::gated(gate.clone())
            .push_login(login_ok("T", sample_user(1, "u", UserRole::User)));
        let (store, _, _) = store_with(api, MemoryStorage::new());
        let mut updates = store.subscribe();

        let task = tokio::spawn({
            let store = store.clone();
            async move { store.login(&credentials()).await }
        });
        updates.wait_for(|session| session.is_loading()).await.unwrap();
        assert!(!store.is_authenticated());

        gate.notify_one();
        task.await.unwrap().unwrap();

        assert!(!store.snapshot().is_loading());
        assert!(store.is_authenticated());
    }

    #[tokio::test]
    async fn test_logout_discards_in_flight_login() {
        let gate = Arc::new(Notify::new());
        let api = ScriptedAuthApi::gated(gate.clone())
            .push_login(login_ok("late", sample_user(1, "u", UserRole::User)));
        let (store, _, storage) = store_with(api, MemoryStorage::new());
        let mut updates = store.subscribe();

        let task = tokio::spawn({
            let store = store.clone();
            async move { store.login(&credentials()).await }
        });
        updates.wait_for(|session| session.is_loading()).await.unwrap();

        store.logout();
        gate.notify_one();
        let result = task.await.unwrap();

        assert!(matches!(result, Err(SessionError::Superseded)));
        assert!(!store.is_authenticated());
        assert_eq!(store.snapshot().token(), None);
        assert_eq!(storage.get(TOKEN_KEY), None);
        assert!(!store.snapshot().is_loading());
    }

    #[tokio::test]
    async fn test_logout_discards_in_flight_refresh() {
        let gate = Arc::new(Notify::new());
        let api = ScriptedAuthApi::gated(gate.clone())
            .push_profile(Ok(sample_user(1, "u", UserRole::User)));
        let (store, _, _) = store_with(api, MemoryStorage::with_token("T"));
        let mut updates = store.subscribe();

        let handle = store.hydrate().expect("token present");
        updates.wait_for(|session| session.is_loading()).await.unwrap();

        store.logout();
        gate.notify_one();
        handle.await.unwrap();

        assert_eq!(store.snapshot().user(), None);
        assert!(!store.is_authenticated());
    }

    #[tokio::test]
    async fn test_late_refresh_failure_is_ignored_after_logout() {
        let refresh_gate = Arc::new(Notify::new());
        let refresh_api =
            ScriptedAuthApi::gated(refresh_gate.clone()).push_profile(Err(rejected(401, "expired")));
        let (store, _, _) = store_with(refresh_api, MemoryStorage::with_token("old"));
        let mut updates = store.subscribe();

        let handle = store.hydrate().expect("token present");
        updates.wait_for(|session| session.is_loading()).await.unwrap();

        store.logout();
        let generation_after_logout = store.snapshot().generation();
        refresh_gate.notify_one();
        handle.await.unwrap();

        assert_eq!(store.snapshot().generation(), generation_after_logout);
    }

    /// Tests that of two overlapping logins the first to resolve wins
    #[tokio::test]
    async fn test_overlapping_logins_first_resolved_wins() {
        let gate = Arc::new(Notify::new());
        let api = ScriptedAuthApi::gated(gate.clone())
            .push_login(login_ok("A", sample_user(1, "first", UserRole::User)))
            .push_login(login_ok("B", sample_user(2, "second", UserRole::Admin)));
        let (store, api, storage) = store_with(api, MemoryStorage::new());
        let mut updates = store.subscribe();

        let first = spawn_login(&store);
        wait_for_calls(&api, 1).await;
        let second = spawn_login(&store);
        wait_for_calls(&api, 2).await;

        gate.notify_one();
        updates
            .wait_for(|session| session.is_authenticated())
            .await
            .unwrap();
        let generation = store.snapshot().generation();
        gate.notify_one();

        let first = first.await.unwrap();
        let second = second.await.unwrap();

        assert_eq!(first.unwrap().username, "first");
        assert!(matches!(second, Err(SessionError::Superseded)));
        let session = store.snapshot();
        assert_eq!(session.token(), Some("A"));
        assert_eq!(session.user().unwrap().username, "first");
        assert!(!session.is_admin());
        assert_eq!(session.generation(), generation);
        assert!(!session.is_loading());
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("A"));
    }

    /// Tests that a refresh finishing after a newer login keeps the login's profile
    #[tokio::test]
    async fn test_refresh_after_newer_login_is_discarded() {
        let gate = Arc::new(Notify::new());
        let api = ScriptedAuthApi::gated(gate.clone())
            .push_login(login_ok("new", sample_user(2, "fresh", UserRole::User)))
            .push_profile(Ok(sample_user(1, "stale", UserRole::Admin)));
        let (store, api, storage) = store_with(api, MemoryStorage::with_token("old"));
        let mut updates = store.subscribe();

        let login = spawn_login(&store);
        wait_for_calls(&api, 1).await;
        let refresh = store.hydrate().expect("token present");
        wait_for_calls(&api, 2).await;

        gate.notify_one();
        updates
            .wait_for(|session| session.is_authenticated())
            .await
            .unwrap();
        let generation = store.snapshot().generation();
        gate.notify_one();

        login.await.unwrap().unwrap();
        refresh.await.unwrap();

        let session = store.snapshot();
        assert_eq!(session.token(), Some("new"));
        assert_eq!(session.user().unwrap().username, "fresh");
        assert!(!session.is_admin());
        assert_eq!(session.generation(), generation);
        assert!(!session.is_loading());
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("new"));
    }

    /// Tests that storage writes happen once readers can see the new session
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_token_is_persisted_outside_the_state_lock() {
        let storage = Arc::new(ObservingStorage::default());
        let api = Arc::new(
            ScriptedAuthApi::new().push_login(login_ok("T", sample_user(1, "u", UserRole::User))),
        );
        let store = SessionStore::new(api, storage.clone());
        storage.session.set(store.subscribe()).unwrap();

        let login = spawn_login(&store);
        timeout(Duration::from_secs(5), login)
            .await
            .expect("login stalled while persisting")
            .unwrap()
            .unwrap();

        let logout = task::spawn_blocking({
            let store = store.clone();
            move || store.logout()
        });
        timeout(Duration::from_secs(5), logout)
            .await
            .expect("logout stalled while persisting")
            .unwrap();

        assert_eq!(
            *storage.seen.lock().unwrap(),
            vec![Some("T".to_string()), None]
        );
        assert_eq!(storage.get(TOKEN_KEY), None);
    }
}
