//! Route table for the storefront shell.
//!
//! # Route Structure
//!
//! ```text
//! /                        - Home
//! /about                   - About
//! /services                - Services
//! /blog                    - Blog
//! /contact                 - Contact
//!
//! # Shop
//! /products                - Product listing
//! /products/:productId     - Product detail
//! /cart                    - Cart
//! /my-orders               - Order history
//!
//! # Clinic
//! /book-appointment        - Doctor booking
//! /my-bookings             - Booking history
//!
//! # Admin (own chrome)
//! /admin                   - Admin login
//! /admin/dashboard         - Dashboard (guarded)
//! /admin/setup             - Initial setup (not guarded)
//!
//! *                        - 404 - Page Not Found
//! ```

pub mod pattern;
pub mod table;

pub use pattern::{RoutePattern, Specificity};
pub use table::{RouteEntry, RouteMatch, RouteTable, RouteTableBuilder};

use thiserror::Error;

use crate::pages::PageId;

/// Well-known paths.
pub mod paths {
    pub const HOME: &str = "/";
    pub const ABOUT: &str = "/about";
    pub const SERVICES: &str = "/services";
    pub const BLOG: &str = "/blog";
    pub const CONTACT: &str = "/contact";
    pub const PRODUCTS: &str = "/products";
    pub const PRODUCT_DETAIL: &str = "/products/:productId";
    pub const CART: &str = "/cart";
    pub const BOOK_APPOINTMENT: &str = "/book-appointment";
    pub const MY_ORDERS: &str = "/my-orders";
    pub const MY_BOOKINGS: &str = "/my-bookings";
    pub const ADMIN_LOGIN: &str = "/admin";
    pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
    pub const ADMIN_SETUP: &str = "/admin/setup";

    /// Prefix of every path that renders admin chrome.
    pub const ADMIN_PREFIX: &str = "/admin";
}

/// Errors building a route table. These are programmer errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("invalid route pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("route pattern {0:?} has more than one parameter")]
    MultipleParams(String),

    #[error("route pattern {0:?} duplicates an earlier pattern")]
    Duplicate(String),

    #[error("route table has no catch-all entry")]
    MissingCatchAll,
}

/// Build the storefront's route table.
///
/// # Errors
///
/// Only fails if the static table above is edited into an invalid state.
pub fn routes() -> Result<RouteTable, RouteError> {
    RouteTable::builder()
        // Public pages
        .route(paths::HOME, PageId::Home)
        .route(paths::ABOUT, PageId::About)
        .route(paths::SERVICES, PageId::Services)
        .route(paths::BLOG, PageId::Blog)
        .route(paths::CONTACT, PageId::Contact)
        // Shop
        .route(paths::PRODUCTS, PageId::Products)
        .route(paths::PRODUCT_DETAIL, PageId::ProductDetail)
        .route(paths::CART, PageId::Cart)
        .route(paths::BOOK_APPOINTMENT, PageId::BookAppointment)
        .route(paths::MY_ORDERS, PageId::MyOrders)
        .route(paths::MY_BOOKINGS, PageId::MyBookings)
        // Admin
        .route(paths::ADMIN_LOGIN, PageId::AdminLogin)
        .route(paths::ADMIN_DASHBOARD, PageId::AdminDashboard)
        .route(paths::ADMIN_SETUP, PageId::AdminSetup)
        // 404
        .catch_all(PageId::NotFound)
        .build()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clinicshop_core::Location;

    use super::*;

    #[test]
    fn test_route_table_is_exact() {
        let table = routes().unwrap();
        let patterns: Vec<&str> = table.entries().iter().map(|e| e.pattern().as_str()).collect();
        assert_eq!(
            patterns,
            [
                "/",
                "/about",
                "/services",
                "/blog",
                "/contact",
                "/products",
                "/products/:productId",
                "/cart",
                "/book-appointment",
                "/my-orders",
                "/my-bookings",
                "/admin",
                "/admin/dashboard",
                "/admin/setup",
                "*",
            ]
        );
    }

    #[test]
    fn test_catch_all_is_last() {
        let table = routes().unwrap();
        assert!(table.entries().last().unwrap().pattern().is_catch_all());
    }

    #[test]
    fn test_every_literal_path_resolves_to_its_own_page() {
        let table = routes().unwrap();
        for entry in table.entries() {
            if entry.pattern().specificity() != Specificity::Exact {
                continue;
            }
            let matched = table.resolve(&Location::new(entry.pattern().as_str())).unwrap();
            assert_eq!(matched.page(), entry.page(), "{}", entry.pattern());
        }
    }

    #[test]
    fn test_only_dashboard_is_guarded() {
        let table = routes().unwrap();
        let guarded: Vec<PageId> = table
            .entries()
            .iter()
            .map(RouteEntry::page)
            .filter(|p| p.is_guarded())
            .collect();
        assert_eq!(guarded, [PageId::AdminDashboard]);
    }
}
