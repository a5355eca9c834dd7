//! Session state types.
//!
//! [`SessionState`] is the record pages read. [`SessionStatus`] wraps it with
//! the `Pending` phase that only the admin route guard cares about.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Email, Role};

/// Opaque identity of an authenticated administrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Opaque session token issued at login.
    pub token: String,
    /// Login email of the administrator.
    pub subject: Email,
    /// When the identity was issued.
    pub issued_at: DateTime<Utc>,
}

impl Identity {
    /// Issue a fresh identity for `subject` with a random token.
    #[must_use]
    pub fn issue(subject: Email) -> Self {
        Self {
            token: Uuid::new_v4().to_string(),
            subject,
            issued_at: Utc::now(),
        }
    }
}

/// Process-wide authentication record.
///
/// Only two shapes are valid: the guest state (no identity) and the admin
/// state (with identity). The constructors are the only way to build one, so
/// `is_authenticated` and `role` can never disagree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    is_authenticated: bool,
    role: Role,
    identity: Option<Identity>,
}

impl SessionState {
    /// The initial, unauthenticated state.
    #[must_use]
    pub const fn guest() -> Self {
        Self {
            is_authenticated: false,
            role: Role::Guest,
            identity: None,
        }
    }

    /// An authenticated administrator session.
    #[must_use]
    pub const fn admin(identity: Identity) -> Self {
        Self {
            is_authenticated: true,
            role: Role::Admin,
            identity: Some(identity),
        }
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub const fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    /// Whether this session may see guarded admin pages.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.is_authenticated && self.role.is_admin()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::guest()
    }
}

/// Whether the session store has finished resolving its initial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// Persisted credentials are still loading.
    Pending,
    /// The session state is known.
    Resolved(SessionState),
}

impl SessionStatus {
    /// The session state pages should see. Pending reads as guest.
    #[must_use]
    pub fn state(&self) -> SessionState {
        match self {
            Self::Pending => SessionState::guest(),
            Self::Resolved(state) => state.clone(),
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_is_default() {
        let state = SessionState::default();
        assert_eq!(state, SessionState::guest());
        assert!(!state.is_authenticated());
        assert_eq!(state.role(), Role::Guest);
        assert!(state.identity().is_none());
        assert!(!state.is_admin());
    }

    #[test]
    fn test_admin_state_carries_identity() {
        let identity = Identity::issue(Email::parse("admin@clinic.test").unwrap());
        let state = SessionState::admin(identity.clone());
        assert!(state.is_admin());
        assert_eq!(state.identity(), Some(&identity));
    }

    #[test]
    fn test_issued_tokens_are_unique() {
        let email = Email::parse("admin@clinic.test").unwrap();
        assert_ne!(
            Identity::issue(email.clone()).token,
            Identity::issue(email).token
        );
    }

    #[test]
    fn test_pending_reads_as_guest() {
        assert!(SessionStatus::Pending.is_pending());
        assert_eq!(SessionStatus::Pending.state(), SessionState::guest());
    }

    #[test]
    fn test_state_serde_round_trip() {
        let identity = Identity::issue(Email::parse("admin@clinic.test").unwrap());
        let state = SessionState::admin(identity);
        let json = serde_json::to_string(&state).unwrap();
        let back: SessionState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
