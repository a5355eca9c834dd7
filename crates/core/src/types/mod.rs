//! Core types for the storefront shell.
//!
//! This module provides type-safe wrappers for the state shared between the
//! router, the guard, and the two process-wide providers.

pub mod credentials;
pub mod location;
pub mod notification;
pub mod role;
pub mod session;

pub use credentials::{Credentials, Email, EmailError};
pub use location::{Location, Params};
pub use notification::{Notification, NotificationEvent, NotificationId, NotificationKind};
pub use role::Role;
pub use session::{Identity, SessionState, SessionStatus};
