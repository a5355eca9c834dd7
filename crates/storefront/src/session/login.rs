//! Page-local handle on an in-flight login.

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use clinicshop_core::SessionState;

use super::AuthError;

/// Pending-UI state of a login started with
/// [`SessionStore::begin_login`](super::SessionStore::begin_login).
///
/// The login page owns this while its spinner is showing. Dropping it on
/// unmount discards the page's interest in the result; the store still
/// commits a successful login.
#[derive(Debug)]
pub struct LoginAttempt {
    result: oneshot::Receiver<Result<SessionState, AuthError>>,
}

impl LoginAttempt {
    pub(super) const fn new(result: oneshot::Receiver<Result<SessionState, AuthError>>) -> Self {
        Self { result }
    }

    /// Poll without waiting. `None` while the login is still running.
    pub fn try_result(&mut self) -> Option<Result<SessionState, AuthError>> {
        match self.result.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(AuthError::Unavailable(
                "login task ended without a result".to_string(),
            ))),
        }
    }

    /// Wait for the login to finish.
    ///
    /// # Errors
    ///
    /// Returns the login's `AuthError`, or `AuthError::Unavailable` if the
    /// login task ended without reporting.
    pub async fn finish(self) -> Result<SessionState, AuthError> {
        self.result.await.unwrap_or_else(|_| {
            Err(AuthError::Unavailable(
                "login task ended without a result".to_string(),
            ))
        })
    }
}
