//! Layout composer: public chrome vs. bare admin content.
//!
//! The decision is a pure function of the path. Session state is never
//! consulted; admin pages draw their own header and sidebar.

use crate::routes::paths;
use crate::view::{Link, PublicChrome, View};

/// Whether `path` gets the public header and footer.
///
/// The prefix compares ASCII case-insensitively, like route literals, so a
/// path that routes to an admin page is never wrapped.
#[must_use]
pub fn uses_public_chrome(path: &str) -> bool {
    let prefix = paths::ADMIN_PREFIX;
    !path
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

/// Wrap `content` in the chrome `path` calls for.
#[must_use]
pub fn compose(path: &str, content: View) -> View {
    if !uses_public_chrome(path) {
        return content;
    }

    View::Public(Box::new(PublicChrome {
        nav: nav_links(),
        footer: footer_links(),
        reserve_header_space: true,
        content,
    }))
}

/// Links in the fixed public header.
#[must_use]
pub fn nav_links() -> Vec<Link> {
    vec![
        Link::new(paths::HOME, "Home"),
        Link::new(paths::ABOUT, "About"),
        Link::new(paths::SERVICES, "Services"),
        Link::new(paths::PRODUCTS, "Shop"),
        Link::new(paths::BOOK_APPOINTMENT, "Book Appointment"),
        Link::new(paths::BLOG, "Blog"),
        Link::new(paths::CONTACT, "Contact"),
        Link::new(paths::CART, "Cart"),
    ]
}

/// Links in the public footer.
#[must_use]
pub fn footer_links() -> Vec<Link> {
    vec![
        Link::new(paths::MY_ORDERS, "My Orders"),
        Link::new(paths::MY_BOOKINGS, "My Bookings"),
        Link::new(paths::CONTACT, "Contact"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pages::PageId;
    use crate::view::PageView;

    #[test]
    fn test_chrome_decision_table() {
        let cases = [
            ("/", true),
            ("/contact", true),
            ("/products/42", true),
            ("/my-bookings", true),
            ("/unknown/xyz", true),
            ("/admin", false),
            ("/admin/dashboard", false),
            ("/admin/setup", false),
            // plain prefix match
            ("/administration", false),
            ("/Admin/dashboard", false),
            ("/ADMIN", false),
            ("/adm", true),
        ];
        for (path, expected) in cases {
            assert_eq!(uses_public_chrome(path), expected, "{path}");
        }
    }

    #[test]
    fn test_compose_wraps_public_paths() {
        let view = compose("/contact", View::Page(PageView::new(PageId::Contact, "")));
        let View::Public(chrome) = &view else {
            panic!("expected public chrome, got {view:?}");
        };
        assert!(chrome.reserve_header_space);
        assert!(!chrome.nav.is_empty());
        assert!(!chrome.footer.is_empty());
        assert!(view.contains_page(PageId::Contact));
    }

    #[test]
    fn test_compose_leaves_admin_bare() {
        let content = View::Page(PageView::new(PageId::AdminDashboard, ""));
        assert_eq!(compose("/admin/dashboard", content.clone()), content);
        assert_eq!(compose("/Admin/Dashboard", content.clone()), content);
    }

    #[test]
    fn test_public_html_reserves_header_space() {
        let html = compose("/", View::Empty).render_html().unwrap_or_default();
        assert!(html.contains("pt-20"));
        assert!(html.contains(r##"href="#/contact""##));
    }
}
