//! Process-wide session store.
//!
//! The store is the single writer of [`SessionStatus`]. Consumers read it with
//! [`SessionStore::current`] / [`SessionStore::status`] or watch it through
//! [`SessionStore::subscribe`], and change it only through `login` / `logout`.
//!
//! # Generations
//!
//! Every committed login and every logout advances a generation counter. A
//! login or restore that started under an older generation is discarded when
//! it finishes, so a slow credential check can never bring back a session the
//! user has since logged out of.
//!
//! Writes to persisted storage are serialized, and a login only saves its
//! session if no logout or later login committed in the meantime. A reload
//! therefore restores whatever the live store last published.

mod auth;
mod login;
mod persistence;

pub use auth::{AuthError, Authenticator, MIN_PASSWORD_LENGTH, PasswordAuthenticator, hash_password};
pub use login::LoginAttempt;
pub use persistence::{FilePersistence, MemoryPersistence, PersistenceError, SessionPersistence};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, oneshot, watch};
use tracing::{debug, info, instrument, warn};

use clinicshop_core::{Credentials, SessionState, SessionStatus};

use crate::error::{clear_sentry_user, set_sentry_user};

/// Cheaply cloneable handle to the session store.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionStoreInner>,
}

struct SessionStoreInner {
    status: watch::Sender<SessionStatus>,
    generation: AtomicU64,
    authenticator: Arc<dyn Authenticator>,
    persistence: Arc<dyn SessionPersistence>,
    /// Held across every save and clear.
    writes: Mutex<()>,
    restore_timeout: Duration,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("status", &*self.inner.status.borrow())
            .field("generation", &self.inner.generation.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Create a store in the `Pending` state. Call [`SessionStore::restore`]
    /// to resolve it.
    #[must_use]
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        persistence: Arc<dyn SessionPersistence>,
        restore_timeout: Duration,
    ) -> Self {
        let (status, _) = watch::channel(SessionStatus::Pending);
        Self {
            inner: Arc::new(SessionStoreInner {
                status,
                generation: AtomicU64::new(0),
                authenticator,
                persistence,
                writes: Mutex::new(()),
                restore_timeout,
            }),
        }
    }

    /// The session state pages see. Reads as guest while pending.
    #[must_use]
    pub fn current(&self) -> SessionState {
        self.inner.status.borrow().state()
    }

    /// Pending/resolved status, for the admin guard.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.status.borrow().clone()
    }

    /// Watch for status changes. The receiver starts at the current status.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.inner.status.subscribe()
    }

    /// Resolve the session from persisted storage.
    ///
    /// Loading is bounded by the restore timeout. A failed, corrupt, or slow
    /// load resolves to guest. If a login or logout commits while the load
    /// is in flight, the loaded value is discarded.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> SessionStatus {
        self.inner.status.send_if_modified(|status| {
            let changed = !status.is_pending();
            *status = SessionStatus::Pending;
            changed
        });
        let generation = self.generation();

        let state = match tokio::time::timeout(
            self.inner.restore_timeout,
            self.inner.persistence.load(),
        )
        .await
        {
            Ok(Ok(Some(state))) => state,
            Ok(Ok(None)) => SessionState::guest(),
            Ok(Err(e)) => {
                warn!(error = %e, "could not load persisted session, starting as guest");
                SessionState::guest()
            }
            Err(_) => {
                warn!("persisted session did not load in time, starting as guest");
                SessionState::guest()
            }
        };

        if self.commit(generation, SessionStatus::Resolved(state), false) {
            debug!(role = %self.current().role(), "session restored");
        } else {
            debug!("session changed during restore, keeping newer state");
        }
        self.status()
    }

    /// Log in with `credentials`.
    ///
    /// On success the admin state is published to subscribers before this
    /// returns. On failure the session is left untouched.
    ///
    /// # Errors
    ///
    /// Returns the authenticator's `AuthError`, or `AuthError::Superseded`
    /// if a logout or another login committed while this one was in flight.
    #[instrument(skip(self, credentials), fields(email = %credentials.email()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<SessionState, AuthError> {
        let generation = self.generation();

        let identity = match self.inner.authenticator.authenticate(credentials).await {
            Ok(identity) => identity,
            Err(e) => {
                info!(error = %e, "login rejected");
                return Err(e);
            }
        };

        let state = SessionState::admin(identity);
        if !self.commit(generation, SessionStatus::Resolved(state.clone()), true) {
            info!("login superseded before it could commit");
            return Err(AuthError::Superseded);
        }

        info!("admin logged in");
        set_sentry_user(credentials.email());
        self.persist(generation + 1, &state).await;
        Ok(state)
    }

    /// Start a login on a background task and return a handle to its result.
    ///
    /// Dropping the handle abandons the caller's interest in the result but
    /// does not cancel the login itself.
    #[must_use]
    pub fn begin_login(&self, credentials: Credentials) -> LoginAttempt {
        let (tx, rx) = oneshot::channel();
        let store = self.clone();
        tokio::spawn(async move {
            let result = store.login(&credentials).await;
            // the page may be gone, which is fine
            let _ = tx.send(result);
        });
        LoginAttempt::new(rx)
    }

    /// Reset to the guest state.
    ///
    /// Idempotent: a second call leaves the state unchanged and does not
    /// notify subscribers again. Any login still in flight is invalidated.
    #[instrument(skip(self))]
    pub async fn logout(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        let changed = self.inner.status.send_if_modified(|status| {
            let guest = SessionStatus::Resolved(SessionState::guest());
            if *status == guest {
                false
            } else {
                *status = guest;
                true
            }
        });

        if changed {
            info!("admin logged out");
            clear_sentry_user();
        }
        let _writes = self.inner.writes.lock().await;
        if let Err(e) = self.inner.persistence.clear().await {
            warn!(error = %e, "could not clear persisted session");
        }
    }

    /// Save `state` unless the session moved past `generation` first.
    async fn persist(&self, generation: u64, state: &SessionState) {
        let _writes = self.inner.writes.lock().await;
        if self.generation() != generation {
            debug!("session changed before it was saved, skipping");
            return;
        }
        if let Err(e) = self.inner.persistence.save(state).await {
            warn!(error = %e, "could not persist session");
        }
    }

    fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    /// Publish `next` if the generation is still `expected`.
    ///
    /// The check and the write happen under the channel's write lock.
    fn commit(&self, expected: u64, next: SessionStatus, advance: bool) -> bool {
        let mut committed = false;
        self.inner.status.send_if_modified(|status| {
            if self.inner.generation.load(Ordering::SeqCst) != expected {
                return false;
            }
            if advance {
                self.inner.generation.fetch_add(1, Ordering::SeqCst);
            }
            committed = true;
            if *status == next {
                false
            } else {
                *status = next;
                true
            }
        });
        committed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use async_trait::async_trait;
    use secrecy::SecretString;
    use tokio::sync::Notify;

    use clinicshop_core::{Email, Identity, Role};

    use super::*;

    const PASSWORD: &str = "correct-horse-battery";

    fn authenticator() -> Arc<PasswordAuthenticator> {
        let hash = hash_password(PASSWORD).unwrap();
        Arc::new(PasswordAuthenticator::new().with_account(
            Email::parse("admin@clinic.test").unwrap(),
            SecretString::from(hash),
        ))
    }

    fn creds(password: &str) -> Credentials {
        Credentials::new("admin@clinic.test", password).unwrap()
    }

    async fn resolved_store() -> SessionStore {
        let store = SessionStore::new(
            authenticator(),
            Arc::new(MemoryPersistence::new()),
            Duration::from_secs(1),
        );
        store.restore().await;
        store
    }

    /// Authenticator that waits for a signal before approving.
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

    /// Persistence whose load never finishes.
    struct StuckPersistence;

    #[async_trait]
    impl SessionPersistence for StuckPersistence {
        async fn load(&self) -> Result<Option<SessionState>, PersistenceError> {
            std::future::pending().await
        }
        async fn save(&self, _: &SessionState) -> Result<(), PersistenceError> {
            Ok(())
        }
        async fn clear(&self) -> Result<(), PersistenceError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_starts_pending_then_resolves_to_guest() {
        let store = SessionStore::new(
            authenticator(),
            Arc::new(MemoryPersistence::new()),
            Duration::from_secs(1),
        );
        assert!(store.status().is_pending());
        assert_eq!(store.current(), SessionState::guest());

        let status = store.restore().await;
        assert_eq!(status, SessionStatus::Resolved(SessionState::guest()));
    }

    #[tokio::test]
    async fn test_login_success_is_visible_on_return() {
        let store = resolved_store().await;
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        let state = store.login(&creds(PASSWORD)).await.unwrap();
        assert!(state.is_admin());
        assert_eq!(store.current(), state);
        assert!(rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_login_failure_leaves_state() {
        let store = resolved_store().await;
        let err = store.login(&creds("wrong-password!!")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
        assert_eq!(store.current(), SessionState::guest());
    }

    #[tokio::test]
    async fn test_second_login_replaces_identity() {
        let store = resolved_store().await;
        let first = store.login(&creds(PASSWORD)).await.unwrap();
        let second = store.login(&creds(PASSWORD)).await.unwrap();

        assert_ne!(first.identity(), second.identity());
        assert_eq!(store.current(), second);
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let store = resolved_store().await;
        store.login(&creds(PASSWORD)).await.unwrap();
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        store.logout().await;
        let once = store.status();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.logout().await;
        assert_eq!(store.status(), once);
        assert!(!rx.has_changed().unwrap());
        assert_eq!(store.current().role(), Role::Guest);
    }

    #[tokio::test]
    async fn test_logout_from_pending_resolves_guest() {
        let store = SessionStore::new(
            authenticator(),
            Arc::new(MemoryPersistence::new()),
            Duration::from_secs(1),
        );
        store.logout().await;
        assert_eq!(store.status(), SessionStatus::Resolved(SessionState::guest()));
    }

    #[tokio::test]
    async fn test_logout_supersedes_in_flight_login() {
        let gate = Arc::new(Notify::new());
        let store = SessionStore::new(
            Arc::new(GatedAuthenticator { gate: gate.clone() }),
            Arc::new(MemoryPersistence::new()),
            Duration::from_secs(1),
        );
        store.restore().await;

        let attempt = store.begin_login(creds(PASSWORD));
        tokio::task::yield_now().await;
        store.logout().await;
        gate.notify_one();

        let result = attempt.finish().await;
        assert!(matches!(result, Err(AuthError::Superseded)));
        assert_eq!(store.current(), SessionState::guest());
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_session() {
        let persistence = Arc::new(MemoryPersistence::new());
        let first = SessionStore::new(authenticator(), persistence.clone(), Duration::from_secs(1));
        first.restore().await;
        let state = first.login(&creds(PASSWORD)).await.unwrap();

        // a "reload": new store over the same storage
        let second = SessionStore::new(authenticator(), persistence, Duration::from_secs(1));
        assert!(second.status().is_pending());
        assert_eq!(second.restore().await, SessionStatus::Resolved(state));
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_timeout_fails_closed() {
        let store = SessionStore::new(
            authenticator(),
            Arc::new(StuckPersistence),
            Duration::from_millis(200),
        );
        let status = store.restore().await;
        assert_eq!(status, SessionStatus::Resolved(SessionState::guest()));
    }

    /// Memory persistence that counts saves.
    #[derive(Default)]
    struct CountingPersistence {
        inner: MemoryPersistence,
        saves: AtomicU64,
    }

    #[async_trait]
    impl SessionPersistence for CountingPersistence {
        async fn load(&self) -> Result<Option<SessionState>, PersistenceError> {
            self.inner.load().await
        }
        async fn save(&self, state: &SessionState) -> Result<(), PersistenceError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            self.inner.save(state).await
        }
        async fn clear(&self) -> Result<(), PersistenceError> {
            self.inner.clear().await
        }
    }

    #[tokio::test]
    async fn test_logout_before_save_skips_save() {
        let persistence = Arc::new(CountingPersistence::default());
        let store = SessionStore::new(authenticator(), persistence.clone(), Duration::from_secs(1));
        store.restore().await;
        let mut rx = store.subscribe();
        rx.borrow_and_update();

        // hold the write lock so the login commits but cannot save yet
        let writes = store.inner.writes.lock().await;
        let attempt = store.begin_login(creds(PASSWORD));
        rx.changed().await.unwrap();
        assert!(store.current().is_admin());

        tokio::join!(store.logout(), async move { drop(writes) });

        assert!(attempt.finish().await.unwrap().is_admin());
        assert_eq!(persistence.saves.load(Ordering::SeqCst), 0);
        assert_eq!(persistence.load().await.unwrap(), None);
        assert_eq!(store.current(), SessionState::guest());
    }

    #[tokio::test]
    async fn test_login_during_restore_wins() {
        let persistence = Arc::new(MemoryPersistence::new());
        let store = SessionStore::new(authenticator(), persistence, Duration::from_secs(1));

        // login commits while still pending, then a late restore must not undo it
        let state = store.login(&creds(PASSWORD)).await.unwrap();
        let generation = store.generation();
        assert!(!store.commit(
            generation - 1,
            SessionStatus::Resolved(SessionState::guest()),
            false
        ));
        assert_eq!(store.current(), state);
    }
}
