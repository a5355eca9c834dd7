//! Transient user-facing notifications ("toasts").
//!
//! Messages fan out to every subscriber attached at publication time. There
//! is no replay: a subscriber attached later sees only later events. The
//! service also keeps the set of still-visible messages so a freshly mounted
//! toast region can draw what is on screen now.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tracing::{debug, warn};

use clinicshop_core::{Notification, NotificationEvent, NotificationId, NotificationKind};

/// Publish/subscribe hub for notifications.
#[derive(Clone)]
pub struct NotificationService {
    inner: Arc<NotificationInner>,
}

struct NotificationInner {
    events: broadcast::Sender<NotificationEvent>,
    active: Mutex<Vec<Notification>>,
    ttl: Duration,
}

impl std::fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationService")
            .field("ttl", &self.inner.ttl)
            .field("active", &self.active().len())
            .finish_non_exhaustive()
    }
}

impl NotificationService {
    /// Create a service whose messages expire after `ttl`.
    ///
    /// A zero `ttl` disables expiry. `capacity` bounds how far a slow
    /// subscriber may fall behind before it skips events; it must be
    /// non-zero.
    #[must_use]
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(NotificationInner {
                events,
                active: Mutex::new(Vec::new()),
                ttl,
            }),
        }
    }

    /// Publish a message to current subscribers.
    ///
    /// Succeeds with no subscribers; the message is simply not delivered.
    /// When called inside a tokio runtime the message is scheduled to expire.
    pub fn publish(&self, kind: NotificationKind, text: impl Into<String>) -> NotificationId {
        let notification = Notification::new(kind, text);
        let id = notification.id;
        debug!(%id, %kind, "notification published");

        self.active_lock().push(notification.clone());
        self.send(NotificationEvent::Published(notification));
        self.schedule_expiry(id);
        id
    }

    pub fn success(&self, text: impl Into<String>) -> NotificationId {
        self.publish(NotificationKind::Success, text)
    }

    pub fn error(&self, text: impl Into<String>) -> NotificationId {
        self.publish(NotificationKind::Error, text)
    }

    pub fn info(&self, text: impl Into<String>) -> NotificationId {
        self.publish(NotificationKind::Info, text)
    }

    /// Remove a message before it expires.
    ///
    /// Returns `false` if it was already dismissed or expired.
    pub fn dismiss(&self, id: NotificationId) -> bool {
        if self.take(id) {
            debug!(%id, "notification dismissed");
            self.send(NotificationEvent::Dismissed(id));
            true
        } else {
            false
        }
    }

    /// Messages currently visible, oldest first.
    #[must_use]
    pub fn active(&self) -> Vec<Notification> {
        self.active_lock().clone()
    }

    /// Attach a subscriber. It receives events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> NotificationSubscription {
        NotificationSubscription {
            events: self.inner.events.subscribe(),
        }
    }

    /// Number of attached subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.events.receiver_count()
    }

    fn expire(&self, id: NotificationId) {
        if self.take(id) {
            debug!(%id, "notification expired");
            self.send(NotificationEvent::Expired(id));
        }
    }

    fn schedule_expiry(&self, id: NotificationId) {
        let ttl = self.inner.ttl;
        if ttl.is_zero() {
            return;
        }
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let weak: Weak<NotificationInner> = Arc::downgrade(&self.inner);
        handle.spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                NotificationService { inner }.expire(id);
            }
        });
    }

    fn take(&self, id: NotificationId) -> bool {
        let mut active = self.active_lock();
        let before = active.len();
        active.retain(|n| n.id != id);
        active.len() != before
    }

    fn send(&self, event: NotificationEvent) {
        // no receivers is not an error
        let _ = self.inner.events.send(event);
    }

    fn active_lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.inner
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

/// A subscriber's view of the event stream.
#[derive(Debug)]
pub struct NotificationSubscription {
    events: broadcast::Receiver<NotificationEvent>,
}

impl NotificationSubscription {
    /// Wait for the next event. `None` once the service is gone.
    ///
    /// A subscriber that fell behind skips the events it missed.
    pub async fn recv(&mut self) -> Option<NotificationEvent> {
        loop {
            match self.events.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Take the next event if one is ready.
    pub fn try_recv(&mut self) -> Option<NotificationEvent> {
        loop {
            match self.events.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "notification subscriber lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Drain every ready event.
    pub fn drain(&mut self) -> Vec<NotificationEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service() -> NotificationService {
        NotificationService::new(Duration::ZERO, 16)
    }

    #[test]
    fn test_publish_without_subscribers() {
        let notify = service();
        let id = notify.success("saved");
        assert_eq!(notify.active().len(), 1);
        assert_eq!(notify.active().first().unwrap().id, id);
    }

    #[test]
    fn test_every_subscriber_receives() {
        let notify = service();
        let mut a = notify.subscribe();
        let mut b = notify.subscribe();

        let id = notify.error("payment failed");

        for sub in [&mut a, &mut b] {
            match sub.try_recv().unwrap() {
                NotificationEvent::Published(n) => {
                    assert_eq!(n.id, id);
                    assert_eq!(n.kind, NotificationKind::Error);
                    assert_eq!(n.text, "payment failed");
                }
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    #[test]
    fn test_late_subscriber_gets_no_replay() {
        let notify = service();
        notify.info("before");
        let mut late = notify.subscribe();
        assert!(late.try_recv().is_none());

        notify.info("after");
        let events = late.drain();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_events_arrive_in_order() {
        let notify = service();
        let mut sub = notify.subscribe();
        let first = notify.info("one");
        let second = notify.info("two");
        notify.dismiss(first);

        let ids: Vec<_> = sub.drain().iter().map(NotificationEvent::id).collect();
        assert_eq!(ids, vec![first, second, first]);
    }

    #[test]
    fn test_dismiss_once() {
        let notify = service();
        let mut sub = notify.subscribe();
        let id = notify.success("done");
        sub.drain();

        assert!(notify.dismiss(id));
        assert!(!notify.dismiss(id));
        assert!(notify.active().is_empty());
        assert_eq!(sub.drain(), vec![NotificationEvent::Dismissed(id)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expires_after_ttl() {
        let notify = NotificationService::new(Duration::from_secs(5), 16);
        let mut sub = notify.subscribe();
        let id = notify.success("saved");
        assert!(matches!(sub.recv().await, Some(NotificationEvent::Published(_))));

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(notify.active().len(), 1);

        assert_eq!(sub.recv().await, Some(NotificationEvent::Expired(id)));
        assert!(notify.active().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dismissed_message_does_not_expire_again() {
        let notify = NotificationService::new(Duration::from_secs(5), 16);
        let mut sub = notify.subscribe();
        let id = notify.info("hello");
        notify.dismiss(id);

        tokio::time::sleep(Duration::from_secs(6)).await;
        let events = sub.drain();
        assert_eq!(events.len(), 2);
        assert_eq!(events.last(), Some(&NotificationEvent::Dismissed(id)));
    }
}
