//! Admin pages: login, dashboard, and first-run setup.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use askama::Template;
use tracing::debug;

use clinicshop_core::{Credentials, Email};

use crate::routes::paths;
use crate::session::{AuthError, LoginAttempt, MIN_PASSWORD_LENGTH, PasswordAuthenticator};
use crate::view::{Link, LinkItem, PageView, View};

use super::{Page, PageContext, PageId};

/// The admin login form.
///
/// A submitted login runs in the background; until it finishes the form
/// shows a pending state. The pending attempt belongs to the page and is
/// dropped on unmount.
#[derive(Debug, Default)]
pub struct AdminLoginPage {
    attempt: Mutex<Option<LoginAttempt>>,
}

impl AdminLoginPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a login. Replaces any attempt still pending on this page.
    pub fn submit(&self, ctx: &PageContext<'_>, credentials: Credentials) {
        debug!(email = %credentials.email(), "login submitted");
        *self.attempt() = Some(ctx.session.begin_login(credentials));
    }

    /// Whether a submitted login has not reported back yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.attempt().is_some()
    }

    fn attempt(&self) -> MutexGuard<'_, Option<LoginAttempt>> {
        self.attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Collect the result of a finished attempt, if any.
    fn settle(&self) -> Option<Result<(), AuthError>> {
        let mut slot = self.attempt();
        let outcome = slot.as_mut().and_then(LoginAttempt::try_result)?;
        *slot = None;
        Some(outcome.map(|_| ()))
    }
}

impl Page for AdminLoginPage {
    fn id(&self) -> PageId {
        PageId::AdminLogin
    }

    fn unmount(&self) {
        if self.attempt().take().is_some() {
            debug!("login page left with an attempt pending");
        }
    }

    fn render(&self, ctx: &PageContext<'_>) -> Result<View, askama::Error> {
        match self.settle() {
            Some(Ok(())) => {
                ctx.notifications.success("Signed in");
            }
            // a logout won the race; nothing to tell the user
            Some(Err(AuthError::Superseded)) | None => {}
            Some(Err(e)) => {
                ctx.notifications.error(e.user_message());
            }
        }

        if ctx.session.current().is_admin() {
            return Ok(View::Redirect {
                to: paths::ADMIN_DASHBOARD.to_string(),
            });
        }

        let body = AdminLoginTemplate {
            action: Link::new(paths::ADMIN_LOGIN, "").href(),
            pending: self.is_pending(),
            setup: LinkItem::from(&Link::new(paths::ADMIN_SETUP, "Set up an administrator")),
        }
        .render()?;
        Ok(View::Page(PageView::new(PageId::AdminLogin, body)))
    }
}

/// The guarded admin dashboard.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdminDashboardPage;

impl Page for AdminDashboardPage {
    fn id(&self) -> PageId {
        PageId::AdminDashboard
    }

    fn render(&self, ctx: &PageContext<'_>) -> Result<View, askama::Error> {
        let session = ctx.session.current();
        let subject = session
            .identity()
            .map_or_else(String::new, |identity| identity.subject.to_string());

        let links = [
            Link::new(paths::HOME, "View storefront"),
            Link::new(paths::PRODUCTS, "Products"),
        ];
        let body = AdminDashboardTemplate {
            subject,
            links: links.iter().map(LinkItem::from).collect(),
        }
        .render()?;
        Ok(View::Page(PageView::new(PageId::AdminDashboard, body)))
    }
}

/// First-run setup: creates the initial administrator.
///
/// Reachable without a session. Once any administrator exists the page only
/// points back to the login form and further submissions are refused.
pub struct AdminSetupPage {
    authenticator: Arc<PasswordAuthenticator>,
}

impl std::fmt::Debug for AdminSetupPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSetupPage")
            .field("provisioned", &self.authenticator.has_admin())
            .finish()
    }
}

impl AdminSetupPage {
    #[must_use]
    pub const fn new(authenticator: Arc<PasswordAuthenticator>) -> Self {
        Self { authenticator }
    }

    /// Create the first administrator and report the outcome as a notification.
    ///
    /// # Errors
    ///
    /// Returns the provisioning `AuthError`, most notably
    /// `AuthError::AlreadyProvisioned`.
    pub fn submit(
        &self,
        ctx: &PageContext<'_>,
        email: &str,
        password: &str,
    ) -> Result<Email, AuthError> {
        match self.authenticator.provision(email, password) {
            Ok(email) => {
                ctx.notifications
                    .success("Administrator created. You can now sign in.");
                Ok(email)
            }
            Err(e) => {
                ctx.notifications.error(e.user_message());
                Err(e)
            }
        }
    }
}

impl Page for AdminSetupPage {
    fn id(&self) -> PageId {
        PageId::AdminSetup
    }

    fn render(&self, _ctx: &PageContext<'_>) -> Result<View, askama::Error> {
        let body = AdminSetupTemplate {
            provisioned: self.authenticator.has_admin(),
            action: Link::new(paths::ADMIN_SETUP, "").href(),
            min_password_length: MIN_PASSWORD_LENGTH,
            login: LinkItem::from(&Link::new(paths::ADMIN_LOGIN, "Go to login")),
        }
        .render()?;
        Ok(View::Page(PageView::new(PageId::AdminSetup, body)))
    }
}

#[derive(Template)]
#[template(path = "pages/admin_login.html")]
struct AdminLoginTemplate {
    action: String,
    pending: bool,
    setup: LinkItem,
}

#[derive(Template)]
#[template(path = "pages/admin_dashboard.html")]
struct AdminDashboardTemplate {
    subject: String,
    links: Vec<LinkItem>,
}

#[derive(Template)]
#[template(path = "pages/admin_setup.html")]
struct AdminSetupTemplate {
    provisioned: bool,
    action: String,
    min_password_length: usize,
    login: LinkItem,
}
