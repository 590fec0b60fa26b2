//! Notification Sink
//!
//! User-facing status messages emitted by the gateway. Delivery is
//! fire-and-forget: the gateway never waits on or inspects the sink.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::constants::notify as notify_constants;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl std::fmt::Display for NotifyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Success => write!(f, "success"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl NotifyLevel {
    /// How long a UI should keep the message on screen
    pub fn display_duration(&self) -> Duration {
        match self {
            Self::Info | Self::Success => Duration::from_millis(notify_constants::SHORT_DISPLAY_MS),
            Self::Warning | Self::Error => Duration::from_millis(notify_constants::LONG_DISPLAY_MS),
        }
    }
}

/// Receiver of user-facing status messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: NotifyLevel);
}

pub type SharedNotifier = Arc<dyn Notifier>;

/// A recorded notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotifyLevel,
    pub message: String,
}

/// In-memory sink that keeps every notification in arrival order.
///
/// Useful for embedding the gateway in a UI that polls for messages.
#[derive(Debug, Default)]
pub struct NotificationLog {
    entries: Mutex<Vec<Notification>>,
}

impl NotificationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all notifications so far
    pub fn entries(&self) -> Vec<Notification> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Levels only, in arrival order
    pub fn levels(&self) -> Vec<NotifyLevel> {
        self.entries().into_iter().map(|n| n.level).collect()
    }

    pub fn count(&self, level: NotifyLevel) -> usize {
        self.entries().iter().filter(|n| n.level == level).count()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(
            &mut *self
                .entries
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        )
    }
}

impl Notifier for NotificationLog {
    fn notify(&self, message: &str, level: NotifyLevel) {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(Notification {
                level,
                message: message.to_string(),
            });
    }
}

/// Sink that forwards notifications to `tracing` only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Info | NotifyLevel::Success => tracing::info!(%level, "{}", message),
            NotifyLevel::Warning => tracing::warn!(%level, "{}", message),
            NotifyLevel::Error => tracing::error!(%level, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_and_error_shown_longer() {
        assert!(NotifyLevel::Error.display_duration() > NotifyLevel::Info.display_duration());
        assert!(NotifyLevel::Warning.display_duration() > NotifyLevel::Success.display_duration());
    }

    #[test]
    fn test_log_records_in_order() {
        let log = NotificationLog::new();
        log.notify("first", NotifyLevel::Info);
        log.notify("second", NotifyLevel::Error);

        assert_eq!(log.levels(), vec![NotifyLevel::Info, NotifyLevel::Error]);
        assert_eq!(log.count(NotifyLevel::Error), 1);

        let drained = log.drain();
        assert_eq!(drained[0].message, "first");
        assert!(log.entries().is_empty());
    }
}
