//! Render tree produced by pages, the guard, and the layout composer.
//!
//! A [`View`] is plain data so the shell's decisions can be asserted on
//! directly. [`View::render_html`] turns it into markup through the askama
//! templates under `templates/`.

use askama::Template;
use chrono::{Datelike, Utc};

use clinicshop_core::Notification;

use crate::pages::PageId;

/// Brand shown in the public footer.
pub const BRAND: &str = "Clinic Storefront";

/// An in-app link. The target is a router path; the href is hash-routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub to: String,
    pub label: String,
}

impl Link {
    #[must_use]
    pub fn new(to: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            label: label.into(),
        }
    }

    /// Hash-router href for this link (`/cart` → `#/cart`).
    #[must_use]
    pub fn href(&self) -> String {
        format!("#{}", self.to)
    }
}

/// Output of a page's render hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub page: PageId,
    pub title: String,
    /// Markup supplied by the page. Trusted.
    pub body: String,
}

impl PageView {
    #[must_use]
    pub fn new(page: PageId, body: impl Into<String>) -> Self {
        Self {
            page,
            title: page.title().to_string(),
            body: body.into(),
        }
    }
}

/// Public header/footer wrapped around page content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicChrome {
    pub nav: Vec<Link>,
    pub footer: Vec<Link>,
    /// Reserve space under the fixed-position header.
    pub reserve_header_space: bool,
    pub content: View,
}

/// A node in the render tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// Nothing rendered.
    #[default]
    Empty,
    /// Neutral placeholder while the admin guard waits on the session.
    Placeholder,
    /// Navigate elsewhere instead of rendering.
    Redirect { to: String },
    /// The 404 view.
    NotFound { home: Link },
    /// A page's own output.
    Page(PageView),
    /// Content inside the public chrome.
    Public(Box<PublicChrome>),
}

impl View {
    /// The standard 404 view with its link back to `/`.
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound {
            home: Link::new("/", "Back to Home"),
        }
    }

    /// Whether any part of this tree was produced by `page`.
    #[must_use]
    pub fn contains_page(&self, page: PageId) -> bool {
        match self {
            Self::Page(view) => view.page == page,
            Self::Public(chrome) => chrome.content.contains_page(page),
            Self::NotFound { .. } => page == PageId::NotFound,
            Self::Empty | Self::Placeholder | Self::Redirect { .. } => false,
        }
    }

    /// Whether this tree is wrapped in public header/footer.
    #[must_use]
    pub const fn has_public_chrome(&self) -> bool {
        matches!(self, Self::Public(_))
    }

    /// The content inside any chrome.
    #[must_use]
    pub fn content(&self) -> &Self {
        match self {
            Self::Public(chrome) => chrome.content.content(),
            other => other,
        }
    }

    /// Render this tree to HTML.
    ///
    /// # Errors
    ///
    /// Returns `askama::Error` if a template fails to render.
    pub fn render_html(&self) -> Result<String, askama::Error> {
        match self {
            Self::Empty => Ok(String::new()),
            Self::Placeholder => PlaceholderTemplate.render(),
            Self::Redirect { to } => RedirectTemplate {
                href: Link::new(to.clone(), String::new()).href(),
            }
            .render(),
            Self::NotFound { home } => NotFoundTemplate {
                home: LinkItem::from(home),
            }
            .render(),
            Self::Page(view) => PageTemplate {
                slug: view.page.slug(),
                title: &view.title,
                body: &view.body,
            }
            .render(),
            Self::Public(chrome) => PublicTemplate {
                nav: chrome.nav.iter().map(LinkItem::from).collect(),
                footer: chrome.footer.iter().map(LinkItem::from).collect(),
                main_class: if chrome.reserve_header_space {
                    "flex-grow pt-20"
                } else {
                    "flex-grow"
                },
                content: chrome.content.render_html()?,
                year: Utc::now().year(),
                brand: BRAND,
            }
            .render(),
        }
    }
}

/// Render a full frame: the view plus the toast region.
///
/// # Errors
///
/// Returns `askama::Error` if a template fails to render.
pub fn render_document(
    path: &str,
    view: &View,
    notifications: &[Notification],
) -> Result<String, askama::Error> {
    DocumentTemplate {
        path,
        body: view.render_html()?,
        toasts: notifications.iter().map(ToastItem::from).collect(),
    }
    .render()
}

// =============================================================================
// Templates
// =============================================================================

/// A [`Link`] flattened for templates.
pub(crate) struct LinkItem {
    pub(crate) href: String,
    pub(crate) label: String,
}

impl From<&Link> for LinkItem {
    fn from(link: &Link) -> Self {
        Self {
            href: link.href(),
            label: link.label.clone(),
        }
    }
}

struct ToastItem {
    id: String,
    class: &'static str,
    text: String,
}

impl From<&Notification> for ToastItem {
    fn from(notification: &Notification) -> Self {
        Self {
            id: notification.id.to_string(),
            class: notification.kind.css_class(),
            text: notification.text.clone(),
        }
    }
}

#[derive(Template)]
#[template(path = "shell/document.html")]
struct DocumentTemplate<'a> {
    path: &'a str,
    body: String,
    toasts: Vec<ToastItem>,
}

#[derive(Template)]
#[template(path = "shell/public.html")]
struct PublicTemplate {
    nav: Vec<LinkItem>,
    footer: Vec<LinkItem>,
    main_class: &'static str,
    content: String,
    year: i32,
    brand: &'static str,
}

#[derive(Template)]
#[template(path = "shell/placeholder.html")]
struct PlaceholderTemplate;

#[derive(Template)]
#[template(source = r#"<div class="redirect" data-redirect="{{ href }}"></div>"#, ext = "html")]
struct RedirectTemplate {
    href: String,
}

#[derive(Template)]
#[template(path = "pages/not_found.html")]
struct NotFoundTemplate {
    home: LinkItem,
}

#[derive(Template)]
#[template(path = "pages/page.html")]
struct PageTemplate<'a> {
    slug: &'static str,
    title: &'a str,
    body: &'a str,
}
