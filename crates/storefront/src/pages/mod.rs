//! Page contracts and the pages the shell ships with.
//!
//! Pages are mounted by the [`App`](crate::app::App) when they first render
//! and unmounted when something else replaces them. They see only the
//! matched route parameters plus the ambient session and notification
//! providers, through [`PageContext`].
//!
//! # Pages
//!
//! ```text
//! Home .. MyBookings    StubPage            (content lives outside the shell)
//! ProductDetail         ProductDetailPage   reads :productId
//! AdminLogin            AdminLoginPage      login form, pending state
//! AdminDashboard        AdminDashboardPage  guarded
//! AdminSetup            AdminSetupPage      first-admin provisioning
//! NotFound              NotFoundPage        404 view
//! ```

mod admin;
mod public;

pub use admin::{AdminDashboardPage, AdminLoginPage, AdminSetupPage};
pub use public::{NotFoundPage, ProductDetailPage, StubPage};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use clinicshop_core::Params;

use crate::notify::NotificationService;
use crate::session::SessionStore;
use crate::view::View;

/// Identifies a page component in the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PageId {
    Home,
    About,
    Services,
    Blog,
    Contact,
    Products,
    ProductDetail,
    Cart,
    BookAppointment,
    MyOrders,
    MyBookings,
    AdminLogin,
    AdminDashboard,
    AdminSetup,
    NotFound,
}

impl PageId {
    /// Every page, in route table order.
    pub const ALL: [Self; 15] = [
        Self::Home,
        Self::About,
        Self::Services,
        Self::Blog,
        Self::Contact,
        Self::Products,
        Self::ProductDetail,
        Self::Cart,
        Self::BookAppointment,
        Self::MyOrders,
        Self::MyBookings,
        Self::AdminLogin,
        Self::AdminDashboard,
        Self::AdminSetup,
        Self::NotFound,
    ];

    /// Stable identifier used in markup.
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::About => "about",
            Self::Services => "services",
            Self::Blog => "blog",
            Self::Contact => "contact",
            Self::Products => "products",
            Self::ProductDetail => "product-detail",
            Self::Cart => "cart",
            Self::BookAppointment => "book-appointment",
            Self::MyOrders => "my-orders",
            Self::MyBookings => "my-bookings",
            Self::AdminLogin => "admin-login",
            Self::AdminDashboard => "admin-dashboard",
            Self::AdminSetup => "admin-setup",
            Self::NotFound => "not-found",
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Home => "Home",
            Self::About => "About Us",
            Self::Services => "Services",
            Self::Blog => "Blog",
            Self::Contact => "Contact",
            Self::Products => "Products",
            Self::ProductDetail => "Product Details",
            Self::Cart => "Cart",
            Self::BookAppointment => "Book an Appointment",
            Self::MyOrders => "My Orders",
            Self::MyBookings => "My Bookings",
            Self::AdminLogin => "Admin Login",
            Self::AdminDashboard => "Admin Dashboard",
            Self::AdminSetup => "Admin Setup",
            Self::NotFound => "Page Not Found",
        }
    }

    /// Whether the page sits behind the admin guard.
    #[must_use]
    pub const fn is_guarded(self) -> bool {
        matches!(self, Self::AdminDashboard)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// What a page can see while mounted or rendering.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    /// Parameters extracted by the router for this navigation.
    pub params: &'a Params,
    pub session: &'a SessionStore,
    pub notifications: &'a NotificationService,
}

/// A page component.
pub trait Page: Send + Sync {
    /// The route table entry this page serves.
    fn id(&self) -> PageId;

    /// Called once when the page becomes the rendered page.
    fn mount(&self, _ctx: &PageContext<'_>) {}

    /// Called when another view replaces the page. Page-local pending state
    /// should be dropped here.
    fn unmount(&self) {}

    /// Produce the page's view.
    ///
    /// # Errors
    ///
    /// Returns `askama::Error` if the page's template fails to render.
    fn render(&self, ctx: &PageContext<'_>) -> Result<View, askama::Error>;
}

/// Page components keyed by [`PageId`].
pub struct PageRegistry {
    pages: HashMap<PageId, Arc<dyn Page>>,
}

impl fmt::Debug for PageRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<_> = self.pages.keys().collect();
        ids.sort();
        f.debug_struct("PageRegistry").field("pages", &ids).finish()
    }
}

impl Default for PageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PageRegistry {
    /// A registry with a page for every [`PageId`].
    ///
    /// `AdminSetup` starts as a stub; the app replaces it with an
    /// [`AdminSetupPage`] bound to its authenticator.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            pages: HashMap::new(),
        };
        for id in PageId::ALL {
            let page: Arc<dyn Page> = match id {
                PageId::ProductDetail => Arc::new(ProductDetailPage),
                PageId::AdminLogin => Arc::new(AdminLoginPage::new()),
                PageId::AdminDashboard => Arc::new(AdminDashboardPage),
                PageId::NotFound => Arc::new(NotFoundPage),
                other => Arc::new(StubPage::new(other)),
            };
            registry.register(page);
        }
        registry
    }

    /// Install `page` under its id, returning the page it replaced.
    pub fn register(&mut self, page: Arc<dyn Page>) -> Option<Arc<dyn Page>> {
        self.pages.insert(page.id(), page)
    }

    #[must_use]
    pub fn get(&self, id: PageId) -> Option<&Arc<dyn Page>> {
        self.pages.get(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}
