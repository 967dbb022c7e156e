//! Recording mock notifier for tests.

use super::{DeliveryError, Notification, Notifier};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Mock [`Notifier`] that records every delivery attempt.
///
/// Can be configured to fail every attempt, which still records the
/// attempt: the dispatcher contract is that no message is dropped without
/// one observable delivery attempt.
#[derive(Default)]
pub struct MockNotifier {
    attempts: Arc<RwLock<Vec<Notification>>>,
    fail: bool,
}

impl MockNotifier {
    /// Creates a mock that accepts every delivery.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that fails every delivery.
    pub fn failing() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(Vec::new())),
            fail: true,
        }
    }

    /// All delivery attempts observed so far, in order.
    pub async fn deliveries(&self) -> Vec<Notification> {
        self.attempts.read().await.clone()
    }

    /// Number of delivery attempts observed so far.
    pub async fn attempts(&self) -> usize {
        self.attempts.read().await.len()
    }

    /// Waits until at least `n` attempts were observed or the timeout
    /// elapses. Returns whether the count was reached.
    pub async fn wait_for(&self, n: usize, timeout: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        while tokio::time::Instant::now() < deadline {
            if self.attempts().await >= n {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.attempts().await >= n
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn deliver(&self, notification: &Notification) -> Result<(), DeliveryError> {
        self.attempts.write().await.push(notification.clone());
        if self.fail {
            Err(DeliveryError::Transport("mock failure".to_string()))
        } else {
            Ok(())
        }
    }
}
