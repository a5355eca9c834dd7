//! Integration tests for the clinic storefront shell.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p clinicshop-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `navigation` - route resolution, 404, history, chrome
//! - `access_control` - admin guard, login and logout through the shell
//! - `session` - store races, page-local cancellation, persistence
//! - `notifications` - fan-out, no replay, expiry
//!
//! This crate also holds the fixtures those tests share.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use secrecy::SecretString;

use clinicshop_core::{Credentials, Email};
use clinicshop_storefront::pages::{Page, PageContext, PageId};
use clinicshop_storefront::session::{
    MemoryPersistence, PasswordAuthenticator, SessionPersistence, hash_password,
};
use clinicshop_storefront::view::{PageView, View};
use clinicshop_storefront::{App, ShellConfig};

/// Seed admin email.
pub const ADMIN_EMAIL: &str = "admin@clinic.test";

/// Seed admin password.
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Marker only the dashboard spy writes into its output.
pub const DASHBOARD_SECRET: &str = "quarterly-revenue-figures";

/// Configuration with expiry off so toasts stay put for assertions.
#[must_use]
pub fn test_config() -> ShellConfig {
    ShellConfig {
        notification_ttl: Duration::ZERO,
        ..ShellConfig::default()
    }
}

/// An authenticator holding the seed admin account.
///
/// # Panics
///
/// Panics if hashing fails.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn seeded_authenticator() -> Arc<PasswordAuthenticator> {
    let hash = hash_password(ADMIN_PASSWORD).unwrap();
    Arc::new(PasswordAuthenticator::new().with_account(
        Email::parse(ADMIN_EMAIL).unwrap(),
        SecretString::from(hash),
    ))
}

/// Seed admin credentials.
///
/// # Panics
///
/// Panics if the constants stop being valid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn admin_credentials() -> Credentials {
    Credentials::new(ADMIN_EMAIL, ADMIN_PASSWORD).unwrap()
}

/// A shell with the seed admin and the given persistence.
///
/// # Panics
///
/// Panics if the route table is invalid.
#[must_use]
#[allow(clippy::unwrap_used)]
pub fn app_with(config: ShellConfig, persistence: Arc<dyn SessionPersistence>) -> App {
    App::new(config, seeded_authenticator(), persistence).unwrap()
}

/// A shell with the seed admin and in-memory persistence.
#[must_use]
pub fn app() -> App {
    app_with(test_config(), Arc::new(MemoryPersistence::new()))
}

/// Dashboard stand-in that counts how often it is touched.
#[derive(Debug, Default)]
pub struct SpyDashboard {
    mounts: AtomicUsize,
    unmounts: AtomicUsize,
    renders: AtomicUsize,
}

impl SpyDashboard {
    #[must_use]
    pub fn mounts(&self) -> usize {
        self.mounts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn unmounts(&self) -> usize {
        self.unmounts.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }

    /// Whether any part of the dashboard was ever built.
    #[must_use]
    pub fn touched(&self) -> bool {
        self.mounts() + self.renders() > 0
    }
}

impl Page for SpyDashboard {
    fn id(&self) -> PageId {
        PageId::AdminDashboard
    }

    fn mount(&self, _ctx: &PageContext<'_>) {
        self.mounts.fetch_add(1, Ordering::SeqCst);
    }

    fn unmount(&self) {
        self.unmounts.fetch_add(1, Ordering::SeqCst);
    }

    fn render(&self, _ctx: &PageContext<'_>) -> Result<View, askama::Error> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        Ok(View::Page(PageView::new(
            PageId::AdminDashboard,
            format!("<p>{DASHBOARD_SECRET}</p>"),
        )))
    }
}

/// A shell whose dashboard is a [`SpyDashboard`].
#[must_use]
pub fn app_with_spy() -> (App, Arc<SpyDashboard>) {
    let mut app = app();
    let spy = Arc::new(SpyDashboard::default());
    app.register_page(spy.clone());
    (app, spy)
}
