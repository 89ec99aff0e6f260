//! Notifier implementations

use std::sync::Mutex;

use tracing::{error, info};

use crate::domain::invocation::{Notification, NotificationKind, Notifier};

/// Writes notifications to the tracing log
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.kind {
            NotificationKind::Success => info!(message = %notification.message, "Operator notified"),
            NotificationKind::Failure => error!(message = %notification.message, "Operator notified"),
        }
    }
}

/// Keeps every notification in memory, for callers that render them later
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications
            .lock()
            .map(|n| n.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<Notification> {
        self.notifications
            .lock()
            .ok()
            .and_then(|n| n.last().cloned())
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        if let Ok(mut notifications) = self.notifications.lock() {
            notifications.push(notification);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();

        notifier.notify(Notification::success("API request successful"));
        notifier.notify(Notification::failure("Rate limit exceeded."));

        let all = notifier.notifications();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].kind, NotificationKind::Success);
        assert_eq!(notifier.last().unwrap().message, "Rate limit exceeded.");
    }

    #[test]
    fn test_tracing_notifier_accepts_both_kinds() {
        let notifier = TracingNotifier;
        notifier.notify(Notification::success("ok"));
        notifier.notify(Notification::failure("boom"));
    }
}
