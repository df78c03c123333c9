//! User-facing notices and the session-expired signal.
//!
//! Every failure path in the HTTP access layer results in exactly one
//! [`Notice`]. Where the notice ends up is the embedding application's
//! business: the default [`TracingNotifier`] logs it, and a UI shell can use
//! [`BufferedNotifier`] to drain notices into a toast/message component.
//!
//! Session invalidation is NOT a notice: it is an explicit [`SessionWatch`]
//! signal consumed by the navigation controller, so the HTTP layer never
//! touches navigation state directly.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError};

/// A human-readable, user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// The message to surface to the user.
    pub message: String,
}

impl Notice {
    /// Create a notice from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Sink for user-facing notices.
pub trait Notifier: Send + Sync {
    /// Surface a notice to the user.
    fn notify(&self, notice: Notice);
}

/// Notifier that logs notices through `tracing`.
///
/// The default sink for headless use (CLI, tests without assertions on
/// notices).
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        tracing::error!(message = %notice.message, "user notice");
    }
}

/// Notifier that buffers notices until they are drained.
///
/// Embedding UIs hold one of these and drain it on every render tick to
/// display pending messages.
#[derive(Debug, Default)]
pub struct BufferedNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl BufferedNotifier {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Take all pending notices, leaving the buffer empty.
    pub fn drain(&self) -> Vec<Notice> {
        let mut guard = self
            .notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *guard)
    }
}

impl Notifier for BufferedNotifier {
    fn notify(&self, notice: Notice) {
        let mut guard = self
            .notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        guard.push(notice);
    }
}

/// One-shot signal raised when the server rejects the session (401).
///
/// The HTTP access layer raises it; the navigation controller consumes it
/// with [`SessionWatch::take`] and performs the redirect to the login route.
/// Cloning shares the underlying flag.
#[derive(Debug, Clone, Default)]
pub struct SessionWatch {
    expired: Arc<AtomicBool>,
}

impl SessionWatch {
    /// Create a new, unraised signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the session as rejected by the server.
    pub fn raise(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    /// Consume the signal, returning whether it was raised.
    pub fn take(&self) -> bool {
        self.expired.swap(false, Ordering::SeqCst)
    }

    /// Peek at the signal without consuming it.
    #[must_use]
    pub fn is_raised(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_notifier_drains_in_order() {
        let notifier = BufferedNotifier::new();
        notifier.notify(Notice::new("first"));
        notifier.notify(Notice::new("second"));

        let notices = notifier.drain();
        assert_eq!(notices.len(), 2);
        assert_eq!(notices.first().map(|n| n.message.as_str()), Some("first"));
        assert!(notifier.drain().is_empty());
    }

    #[test]
    fn test_session_watch_take_consumes() {
        let watch = SessionWatch::new();
        assert!(!watch.is_raised());

        watch.raise();
        assert!(watch.is_raised());
        assert!(watch.take());

        // Consumed: a second take sees nothing
        assert!(!watch.take());
        assert!(!watch.is_raised());
    }

    #[test]
    fn test_session_watch_clones_share_state() {
        let watch = SessionWatch::new();
        let clone = watch.clone();

        clone.raise();
        assert!(watch.take());
    }
}
