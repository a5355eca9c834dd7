//! Session store races, page-local cancellation, and persistence.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use clinicshop_core::{Credentials, Identity, SessionState, SessionStatus};
use clinicshop_integration_tests::{
    admin_credentials, app, app_with, seeded_authenticator, test_config,
};
use clinicshop_storefront::pages::PageId;
use clinicshop_storefront::session::{
    AuthError, Authenticator, FilePersistence, MemoryPersistence, PersistenceError,
    SessionPersistence, SessionStore,
};

/// Approves any credentials once released.
struct GatedAuthenticator {
    gate: Arc<Notify>,
}

#[async_trait]
impl Authenticator for GatedAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        self.gate.notified().await;
        Ok(Identity::issue(credentials.email().clone()))
    }
}

/// File persistence whose saves wait until released.
struct GatedSave {
    file: FilePersistence,
    gate: Arc<Notify>,
}

#[async_trait]
impl SessionPersistence for GatedSave {
    async fn load(&self) -> Result<Option<SessionState>, PersistenceError> {
        self.file.load().await
    }

    async fn save(&self, state: &SessionState) -> Result<(), PersistenceError> {
        self.gate.notified().await;
        self.file.save(state).await
    }

    async fn clear(&self) -> Result<(), PersistenceError> {
        self.file.clear().await
    }
}

fn store_over(persistence: Arc<dyn SessionPersistence>) -> SessionStore {
    SessionStore::new(seeded_authenticator(), persistence, Duration::from_secs(3))
}

fn gated_store() -> (SessionStore, Arc<Notify>) {
    let gate = Arc::new(Notify::new());
    let store = SessionStore::new(
        Arc::new(GatedAuthenticator { gate: gate.clone() }),
        Arc::new(MemoryPersistence::new()),
        Duration::from_secs(3),
    );
    (store, gate)
}

#[tokio::test]
async fn test_logout_twice_equals_logout_once() {
    let mut app = app();
    app.start().await;
    app.session().login(&admin_credentials()).await.unwrap();
    let mut rx = app.session().subscribe();
    rx.borrow_and_update();

    app.session().logout().await;
    let once = app.session().status();
    let once_frame = app.navigate("/admin/dashboard");
    rx.borrow_and_update();

    app.session().logout().await;
    assert_eq!(app.session().status(), once);
    assert!(!rx.has_changed().unwrap());
    assert_eq!(app.render(), once_frame);
    assert_eq!(once, SessionStatus::Resolved(SessionState::guest()));
}

#[tokio::test]
async fn test_logout_during_login_wins() {
    let (store, gate) = gated_store();
    store.restore().await;

    let attempt = store.begin_login(admin_credentials());
    tokio::task::yield_now().await;
    store.logout().await;
    gate.notify_one();

    assert!(matches!(attempt.finish().await, Err(AuthError::Superseded)));
    assert!(!store.current().is_admin());
}

#[tokio::test]
async fn test_dropped_attempt_still_commits() {
    let (store, gate) = gated_store();
    store.restore().await;
    let mut rx = store.subscribe();
    rx.borrow_and_update();

    let attempt = store.begin_login(admin_credentials());
    drop(attempt);
    gate.notify_one();

    rx.changed().await.unwrap();
    assert!(store.current().is_admin());
}

#[tokio::test]
async fn test_leaving_login_page_keeps_committed_session() {
    let mut app = app();
    app.start().await;
    app.navigate("/admin");
    let mut rx = app.session().subscribe();
    rx.borrow_and_update();

    app.submit_login(admin_credentials());
    // navigating away unmounts the login page and drops its attempt
    let frame = app.navigate("/products");
    assert_eq!(frame.page, Some(PageId::Products));

    rx.changed().await.unwrap();
    assert!(app.session().current().is_admin());
    assert_eq!(app.navigate("/admin/dashboard").page, Some(PageId::AdminDashboard));
}

#[tokio::test]
async fn test_file_persistence_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut first = app_with(test_config(), Arc::new(FilePersistence::new(&path)));
    first.start().await;
    first.session().login(&admin_credentials()).await.unwrap();
    let state = first.session().current();
    drop(first);

    let mut second = app_with(test_config(), Arc::new(FilePersistence::new(&path)));
    assert!(second.session().status().is_pending());
    second.start().await;
    assert_eq!(second.session().current(), state);
    assert_eq!(
        second.navigate("/admin/dashboard").page,
        Some(PageId::AdminDashboard)
    );

    second.logout().await;
    assert!(!path.exists());
}

#[tokio::test]
async fn test_logout_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let mut first = app_with(test_config(), Arc::new(FilePersistence::new(&path)));
    first.start().await;
    first.session().login(&admin_credentials()).await.unwrap();
    first.logout().await;
    drop(first);

    let mut second = app_with(test_config(), Arc::new(FilePersistence::new(&path)));
    second.start().await;
    assert_eq!(
        second.session().status(),
        SessionStatus::Resolved(SessionState::guest())
    );
    assert_eq!(second.navigate("/admin/dashboard").page, Some(PageId::AdminLogin));
}

#[tokio::test]
async fn test_logout_during_session_save_survives_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    let gate = Arc::new(Notify::new());
    let store = store_over(Arc::new(GatedSave {
        file: FilePersistence::new(&path),
        gate: gate.clone(),
    }));
    store.restore().await;
    let mut rx = store.subscribe();
    rx.borrow_and_update();

    let attempt = store.begin_login(admin_credentials());
    // committed and published; the save is now waiting on the gate
    rx.changed().await.unwrap();
    assert!(store.current().is_admin());

    tokio::join!(store.logout(), async { gate.notify_one() });
    assert!(attempt.finish().await.is_ok());
    assert!(!store.current().is_admin());
    assert!(!path.exists());

    let reloaded = store_over(Arc::new(FilePersistence::new(&path)));
    assert_eq!(
        reloaded.restore().await,
        SessionStatus::Resolved(SessionState::guest())
    );
}

#[tokio::test]
async fn test_corrupt_persisted_session_fails_closed() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{\"is_authenticated\": true").unwrap();

    let mut app = app_with(test_config(), Arc::new(FilePersistence::new(&path)));
    app.start().await;

    assert_eq!(
        app.session().status(),
        SessionStatus::Resolved(SessionState::guest())
    );
    assert_eq!(app.navigate("/admin/dashboard").page, Some(PageId::AdminLogin));
}

#[tokio::test]
async fn test_config_seed_builds_working_login() {
    let hash = clinicshop_storefront::session::hash_password("seeded-password-123").unwrap();
    let config = clinicshop_storefront::ShellConfig::from_lookup(|key| match key {
        "STOREFRONT_ADMIN_EMAIL" => Some("seed@clinic.test".to_string()),
        "STOREFRONT_ADMIN_PASSWORD_HASH" => Some(hash.clone()),
        _ => None,
    })
    .unwrap();

    let mut app = clinicshop_storefront::App::from_config(config).unwrap();
    app.start().await;
    let creds = Credentials::new("seed@clinic.test", "seeded-password-123").unwrap();
    app.session().login(&creds).await.unwrap();
    assert_eq!(app.navigate("/admin/dashboard").page, Some(PageId::AdminDashboard));

    // the seeded account closes setup
    assert!(matches!(
        app.submit_setup("other@clinic.test", "another-long-password"),
        Err(AuthError::AlreadyProvisioned)
    ));
}
