use std::sync::Mutex;
use trekdesk_shared::{Notification, NotifyLevel};

/// Non-blocking user notification ("toast") capability.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, level: NotifyLevel);

    fn success(&self, message: &str) {
        self.notify(message, NotifyLevel::Success);
    }

    fn error(&self, message: &str) {
        self.notify(message, NotifyLevel::Error);
    }
}

/// Sends notifications to the log only
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        match level {
            NotifyLevel::Error => tracing::error!(notification = message),
            NotifyLevel::Warning => tracing::warn!(notification = message),
            NotifyLevel::Success | NotifyLevel::Info => tracing::info!(notification = message),
        }
    }
}

/// Collects notifications so they can be handed back with a response
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain everything recorded so far
    pub fn take(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(mut entries) => std::mem::take(&mut *entries),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }

    pub fn snapshot(&self) -> Vec<Notification> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, level: NotifyLevel) {
        TracingNotifier.notify(message, level);
        let entry = Notification::new(level, message);
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry),
            Err(poisoned) => poisoned.into_inner().push(entry),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_drains() {
        let notifier = RecordingNotifier::new();
        notifier.success("Batch updated");
        notifier.error("Backend unavailable");

        let recorded = notifier.take();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].level, NotifyLevel::Success);
        assert_eq!(recorded[1].message, "Backend unavailable");
        assert!(notifier.snapshot().is_empty());
    }
}
