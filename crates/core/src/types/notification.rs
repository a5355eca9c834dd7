//! Transient user-facing notifications.

use core::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

impl NotificationKind {
    /// CSS modifier used by the toast region.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Error => "toast-error",
            Self::Info => "toast-info",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// Unique identifier of a published notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Generate a new random ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for NotificationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A notification in the active set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub kind: NotificationKind,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a notification with a fresh ID.
    #[must_use]
    pub fn new(kind: NotificationKind, text: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(),
            kind,
            text: text.into(),
            created_at: Utc::now(),
        }
    }
}

/// Change to the active set, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationEvent {
    /// A new message was published.
    Published(Notification),
    /// A message was removed by an explicit dismissal.
    Dismissed(NotificationId),
    /// A message reached the end of its display duration.
    Expired(NotificationId),
}

impl NotificationEvent {
    /// The ID of the message this event concerns.
    #[must_use]
    pub const fn id(&self) -> NotificationId {
        match self {
            Self::Published(notification) => notification.id,
            Self::Dismissed(id) | Self::Expired(id) => *id,
        }
    }
}
