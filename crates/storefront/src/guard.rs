//! Admin route guard.
//!
//! Three states, evaluated on every render of a guarded route:
//!
//! ```text
//! Pending ──(resolved, admin)──────▶ Admit    → render child
//!    │    ──(resolved, not admin)──▶ Deny     → redirect to /admin
//!    └────(pending ≥ timeout)──────▶ Deny     (fail closed)
//! ```
//!
//! The protected child is passed as a closure and only invoked on `Admit`,
//! so no part of it can be built for a visitor who is not an admin.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use clinicshop_core::SessionStatus;

use crate::routes::paths;
use crate::view::View;

/// Outcome of one guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    /// Session not resolved yet; show a neutral placeholder.
    Pending,
    /// Resolved as admin.
    Admit,
    /// Resolved as not admin, or pending past the deadline.
    Deny,
}

/// Guard for admin-only routes.
#[derive(Debug, Clone)]
pub struct AdminGuard {
    timeout: Duration,
    pending_since: Option<Instant>,
}

impl AdminGuard {
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            pending_since: None,
        }
    }

    /// Decide what a guarded route shows for `status` at `now`.
    ///
    /// The pending deadline starts at the first pending evaluation and is
    /// cleared once the session resolves or [`AdminGuard::reset`] is called.
    pub fn evaluate(&mut self, status: &SessionStatus, now: Instant) -> GuardState {
        match status {
            SessionStatus::Pending => {
                let since = *self.pending_since.get_or_insert(now);
                let waited = now.saturating_duration_since(since);
                if waited >= self.timeout {
                    warn!(
                        waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
                        "session still pending at guard deadline, denying"
                    );
                    GuardState::Deny
                } else {
                    GuardState::Pending
                }
            }
            SessionStatus::Resolved(state) => {
                self.pending_since = None;
                if state.is_admin() {
                    GuardState::Admit
                } else {
                    debug!(role = %state.role(), "guard denied");
                    GuardState::Deny
                }
            }
        }
    }

    /// Render `child` only if the session is admin.
    pub fn guard(
        &mut self,
        status: &SessionStatus,
        now: Instant,
        child: impl FnOnce() -> View,
    ) -> View {
        match self.evaluate(status, now) {
            GuardState::Pending => View::Placeholder,
            GuardState::Admit => child(),
            GuardState::Deny => View::Redirect {
                to: paths::ADMIN_LOGIN.to_string(),
            },
        }
    }

    /// Forget any pending deadline, e.g. after leaving the guarded route.
    pub const fn reset(&mut self) {
        self.pending_since = None;
    }
}
