use serde::Serialize;
use trekdesk_core::RecordingNotifier;
use trekdesk_shared::Notification;

/// Result of an admin action together with the notifications it raised
#[derive(Debug, Serialize)]
pub struct ActionResponse<T> {
    pub data: T,
    pub notifications: Vec<Notification>,
}

impl<T> ActionResponse<T> {
    pub fn new(data: T, notifier: &RecordingNotifier) -> Self {
        Self {
            data,
            notifications: notifier.take(),
        }
    }
}
