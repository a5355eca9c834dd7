//! Unified error handling with Sentry integration.
//!
//! Expected conditions (unknown paths, rejected credentials, unresolved
//! sessions) are values, not errors: the catch-all route, `AuthError` returned
//! to the login page, and the guard's pending state. Persistence failures are
//! logged by the session store and never surface. `ShellError` collects what
//! does escape, and every variant points at a bug or a broken environment.

use thiserror::Error;

use crate::routes::RouteError;

/// Application-level error type for the storefront shell.
#[derive(Debug, Error)]
pub enum ShellError {
    /// No route matched and the table has no catch-all.
    #[error("No route matches {path}")]
    NavigationMiss { path: String },

    /// Route table construction failed.
    #[error("Route table error: {0}")]
    Route(#[from] RouteError),

    /// Template rendering failed.
    #[error("Render error: {0}")]
    Render(#[from] askama::Error),

    /// A redirect chain did not settle.
    #[error("Redirect loop at {0}")]
    RedirectLoop(String),
}

impl ShellError {
    /// Message safe to show in a notification.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::NavigationMiss { .. } => "Page not found",
            _ => "Something went wrong",
        }
    }

    /// Log the error and capture it to Sentry.
    pub fn report(&self) {
        let event_id = sentry::capture_error(self);
        tracing::error!(
            error = %self,
            sentry_event_id = %event_id,
            "Shell error"
        );
    }
}

/// Result type alias for `ShellError`.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Set the Sentry user context after a successful admin login.
pub fn set_sentry_user(subject: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(subject.to_string()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on logout.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("navigation", "/products/42", Some(&[("page", "product_detail")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
