//! Composition root.
//!
//! [`App`] wires the router, layout composer, admin guard, and the two
//! providers together and produces one [`Frame`] per render pass:
//!
//! ```text
//! router.current_match()
//!   → page (guarded pages go through AdminGuard first)
//!   → redirect? router.replace(target) and render again
//!   → layout::compose(path, view)
//!   → Frame { location, page, view, notifications }
//! ```

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, info};

use clinicshop_core::{Credentials, Email, Location, Notification, Params};

use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use crate::guard::AdminGuard;
use crate::layout;
use crate::notify::NotificationService;
use crate::pages::{AdminLoginPage, AdminSetupPage, Page, PageContext, PageId, PageRegistry};
use crate::router::Router;
use crate::routes::routes;
use crate::session::{
    AuthError, FilePersistence, MemoryPersistence, PasswordAuthenticator, SessionPersistence,
    SessionStore,
};
use crate::view::{View, render_document};

/// How many redirects one render pass may follow.
const MAX_REDIRECTS: usize = 4;

/// Output of one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Where the router ended up, redirects included.
    pub location: Location,
    /// The page that produced the content, if one did.
    pub page: Option<PageId>,
    pub view: View,
    /// Toasts visible in this frame.
    pub notifications: Vec<Notification>,
}

impl Frame {
    /// Render the frame to an HTML document fragment.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::Render` if a template fails.
    pub fn to_html(&self) -> Result<String> {
        Ok(render_document(
            self.location.path(),
            &self.view,
            &self.notifications,
        )?)
    }
}

/// The storefront shell.
pub struct App {
    config: ShellConfig,
    router: Router,
    session: SessionStore,
    notifications: NotificationService,
    pages: PageRegistry,
    login: Arc<AdminLoginPage>,
    setup: Arc<AdminSetupPage>,
    guard: AdminGuard,
    mounted: Option<PageId>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("location", self.router.location())
            .field("mounted", &self.mounted)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build the shell from configuration.
    ///
    /// The admin seed (if any) becomes the authenticator's first account and
    /// `session_file` selects file persistence over in-memory.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::Route` if the route table is invalid.
    pub fn from_config(config: ShellConfig) -> Result<Self> {
        let mut authenticator = PasswordAuthenticator::new();
        if let Some(seed) = &config.admin_seed {
            authenticator =
                authenticator.with_account(seed.email.clone(), seed.password_hash.clone());
        }

        let persistence: Arc<dyn SessionPersistence> = match &config.session_file {
            Some(path) => Arc::new(FilePersistence::new(path.clone())),
            None => Arc::new(MemoryPersistence::new()),
        };

        Self::new(config, Arc::new(authenticator), persistence)
    }

    /// Build the shell from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns `ShellError::Route` if the route table is invalid.
    pub fn new(
        config: ShellConfig,
        authenticator: Arc<PasswordAuthenticator>,
        persistence: Arc<dyn SessionPersistence>,
    ) -> Result<Self> {
        let router = Router::new(routes()?);
        let session = SessionStore::new(authenticator.clone(), persistence, config.guard_timeout);
        let notifications =
            NotificationService::new(config.notification_ttl, config.notification_capacity);

        let login = Arc::new(AdminLoginPage::new());
        let setup = Arc::new(AdminSetupPage::new(authenticator));
        let mut pages = PageRegistry::new();
        pages.register(login.clone());
        pages.register(setup.clone());

        Ok(Self {
            guard: AdminGuard::new(config.guard_timeout),
            config,
            router,
            session,
            notifications,
            pages,
            login,
            setup,
            mounted: None,
        })
    }

    /// Restore the persisted session, then render.
    pub async fn start(&mut self) -> Frame {
        self.session.restore().await;
        self.render()
    }

    #[must_use]
    pub const fn config(&self) -> &ShellConfig {
        &self.config
    }

    #[must_use]
    pub const fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub const fn session(&self) -> &SessionStore {
        &self.session
    }

    #[must_use]
    pub const fn notifications(&self) -> &NotificationService {
        &self.notifications
    }

    /// The page currently mounted, if any.
    #[must_use]
    pub const fn mounted(&self) -> Option<PageId> {
        self.mounted
    }

    /// Install a page component, replacing the default for its id.
    pub fn register_page(&mut self, page: Arc<dyn Page>) {
        let id = page.id();
        if let Some(previous) = self.pages.register(page)
            && self.mounted == Some(id)
        {
            previous.unmount();
            self.mounted = None;
        }
    }

    /// Navigate to `path` and render.
    pub fn navigate(&mut self, path: &str) -> Frame {
        self.router.navigate(path);
        self.render()
    }

    /// Go back one history entry and render.
    pub fn back(&mut self) -> Frame {
        self.router.back();
        self.render()
    }

    /// Go forward one history entry and render.
    pub fn forward(&mut self) -> Frame {
        self.router.forward();
        self.render()
    }

    /// Submit the admin login form and render the pending state.
    pub fn submit_login(&mut self, credentials: Credentials) -> Frame {
        let params = Params::new();
        self.login.submit(&self.context(&params), credentials);
        self.render()
    }

    /// Submit the first-run setup form.
    ///
    /// # Errors
    ///
    /// Returns the provisioning `AuthError`.
    pub fn submit_setup(
        &self,
        email: &str,
        password: &str,
    ) -> std::result::Result<Email, AuthError> {
        let params = Params::new();
        self.setup.submit(&self.context(&params), email, password)
    }

    /// Log out and render.
    pub async fn logout(&mut self) -> Frame {
        let was_admin = self.session.current().is_admin();
        self.session.logout().await;
        if was_admin {
            info!("signed out from the shell");
            self.notifications.info("Signed out");
        }
        self.render()
    }

    /// Render the current location.
    ///
    /// Failures never escape: they are reported, surfaced as an error
    /// notification where the user can act on them, and the frame is empty.
    pub fn render(&mut self) -> Frame {
        match self.try_render() {
            Ok(frame) => frame,
            Err(e) => {
                e.report();
                if !matches!(e, ShellError::NavigationMiss { .. }) {
                    self.notifications.error(e.user_message());
                }
                self.unmount_current();
                Frame {
                    location: self.router.location().clone(),
                    page: None,
                    view: View::Empty,
                    notifications: self.notifications.active(),
                }
            }
        }
    }

    fn try_render(&mut self) -> Result<Frame> {
        for _ in 0..=MAX_REDIRECTS {
            let Some(matched) = self.router.current_match() else {
                return Err(ShellError::NavigationMiss {
                    path: self.router.location().path().to_string(),
                });
            };
            let page_id = matched.page();
            let location = matched.location;

            let view = self.render_page(page_id, location.params())?;
            if let View::Redirect { to } = &view {
                debug!(from = %location.path(), %to, "redirect");
                self.router.replace(to);
                continue;
            }

            let page = matches!(view, View::Page(_) | View::NotFound { .. }).then_some(page_id);
            let view = layout::compose(location.path(), view);
            return Ok(Frame {
                location,
                page,
                view,
                notifications: self.notifications.active(),
            });
        }
        Err(ShellError::RedirectLoop(
            self.router.location().path().to_string(),
        ))
    }

    fn render_page(&mut self, id: PageId, params: &Params) -> Result<View> {
        let Some(page) = self.pages.get(id).cloned() else {
            return Err(ShellError::NavigationMiss {
                path: self.router.location().path().to_string(),
            });
        };

        let Self {
            session,
            notifications,
            pages,
            guard,
            mounted,
            ..
        } = &mut *self;
        let ctx = PageContext {
            params,
            session,
            notifications,
        };

        if !id.is_guarded() {
            guard.reset();
            mount(mounted, pages, &page, &ctx);
            return Ok(page.render(&ctx)?);
        }

        let mut admitted = None;
        let view = guard.guard(&session.status(), Instant::now(), || {
            mount(mounted, pages, &page, &ctx);
            admitted = Some(page.render(&ctx));
            View::Empty
        });
        match admitted {
            Some(rendered) => Ok(rendered?),
            None => {
                self.unmount_current();
                Ok(view)
            }
        }
    }

    fn unmount_current(&mut self) {
        if let Some(id) = self.mounted.take()
            && let Some(page) = self.pages.get(id)
        {
            debug!(page = %id, "unmount");
            page.unmount();
        }
    }

    fn context<'a>(&'a self, params: &'a Params) -> PageContext<'a> {
        PageContext {
            params,
            session: &self.session,
            notifications: &self.notifications,
        }
    }
}

/// Make `page` the mounted page, unmounting whatever was there.
fn mount(
    mounted: &mut Option<PageId>,
    pages: &PageRegistry,
    page: &Arc<dyn Page>,
    ctx: &PageContext<'_>,
) {
    let id = page.id();
    if *mounted == Some(id) {
        return;
    }
    if let Some(previous) = mounted.take()
        && let Some(previous) = pages.get(previous)
    {
        debug!(page = %previous.id(), "unmount");
        previous.unmount();
    }
    debug!(page = %id, "mount");
    page.mount(ctx);
    *mounted = Some(id);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use super::*;

    const PASSWORD: &str = "correct-horse-battery";

    fn app() -> App {
        let hash = crate::session::hash_password(PASSWORD).unwrap();
        let authenticator = PasswordAuthenticator::new().with_account(
            Email::parse("admin@clinic.test").unwrap(),
            SecretString::from(hash),
        );
        let config = ShellConfig {
            notification_ttl: Duration::ZERO,
            ..ShellConfig::default()
        };
        App::new(
            config,
            Arc::new(authenticator),
            Arc::new(MemoryPersistence::new()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_start_renders_home_with_chrome() {
        let mut app = app();
        let frame = app.start().await;
        assert_eq!(frame.page, Some(PageId::Home));
        assert!(frame.view.has_public_chrome());
        assert_eq!(app.mounted(), Some(PageId::Home));
    }

    #[tokio::test]
    async fn test_dashboard_redirect_replaces_history_entry() {
        let mut app = app();
        app.start().await;
        app.navigate("/about");
        let frame = app.navigate("/admin/dashboard");

        assert_eq!(frame.location.path(), "/admin");
        assert_eq!(frame.page, Some(PageId::AdminLogin));
        assert!(!frame.view.has_public_chrome());

        let frame = app.back();
        assert_eq!(frame.location.path(), "/about");
    }

    #[tokio::test]
    async fn test_product_param_reaches_frame() {
        let mut app = app();
        app.start().await;
        let frame = app.navigate("/products/serum-30ml");
        assert_eq!(frame.page, Some(PageId::ProductDetail));
        assert_eq!(frame.location.params().get("productId"), Some("serum-30ml"));
        assert!(frame.to_html().unwrap().contains("Product serum-30ml"));
    }

    #[tokio::test]
    async fn test_logout_notifies_once() {
        let mut app = app();
        app.start().await;
        app.session()
            .login(&Credentials::new("admin@clinic.test", PASSWORD).unwrap())
            .await
            .unwrap();
        app.navigate("/admin/dashboard");

        let frame = app.logout().await;
        assert_eq!(frame.page, Some(PageId::AdminLogin));
        let frame = app.logout().await;
        assert_eq!(frame.notifications.len(), 1);
    }

    #[tokio::test]
    async fn test_setup_then_login_page_still_renders() {
        let mut app = App::new(
            ShellConfig::default(),
            Arc::new(PasswordAuthenticator::new()),
            Arc::new(MemoryPersistence::new()),
        )
        .unwrap();
        app.start().await;
        app.navigate("/admin/setup");
        app.submit_setup("owner@clinic.test", PASSWORD).unwrap();

        let frame = app.render();
        assert!(frame.to_html().unwrap().contains("already been completed"));
    }
}
