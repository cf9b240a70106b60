use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::notifications::{Notification, NotificationSink};

/// [`NotificationSink`] that records published notifications.
#[derive(Clone)]
pub struct RecordingSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
    count_tx: Arc<watch::Sender<usize>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        let (count_tx, _) = watch::channel(0);

        Self {
            notifications: Arc::new(Mutex::new(Vec::new())),
            count_tx: Arc::new(count_tx),
        }
    }

    /// Returns all notifications published so far.
    pub fn notifications(&self) -> Vec<Notification> {
        let notifications = self
            .notifications
            .lock()
            .expect("recording sink lock poisoned");
        notifications.clone()
    }

    /// Waits until at least `count` notifications have been published.
    pub async fn wait_for_notifications(&self, count: usize) {
        let mut rx = self.count_tx.subscribe();
        rx.wait_for(|published| *published >= count)
            .await
            .expect("recording sink sender dropped");
    }
}

impl Default for RecordingSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for RecordingSink {
    fn publish(&self, notification: Notification) {
        let mut notifications = self
            .notifications
            .lock()
            .expect("recording sink lock poisoned");
        notifications.push(notification);

        self.count_tx.send_replace(notifications.len());
    }
}
