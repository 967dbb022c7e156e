//! Asynchronous notification dispatcher.
//!
//! A process-wide FIFO queue with a single background consumer. Producers
//! enqueue without blocking; the consumer blocks on the channel, so there is
//! no poll interval between deliveries. The queue is unbounded and there is
//! no retry, dead-letter queue, or backpressure signal: a failed delivery is
//! logged at warn level and dropped.

use super::{Notification, Notifier};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// FIFO notification queue with a single background consumer.
///
/// Constructed once at startup and passed explicitly to every component
/// that notifies; there is no hidden global. [`start`](Self::start) must be
/// called once to spawn the consumer; until then messages accumulate on the
/// queue. The consumer runs for the lifetime of the process and is not
/// drained on shutdown.
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
    rx: Mutex<Option<mpsc::UnboundedReceiver<Notification>>>,
    depth: Arc<AtomicUsize>,
    notifier: Arc<dyn Notifier>,
}

impl NotificationDispatcher {
    /// Creates a dispatcher delivering through the given notifier.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(Some(rx)),
            depth: Arc::new(AtomicUsize::new(0)),
            notifier,
        }
    }

    /// Queues a message for delivery and returns immediately.
    ///
    /// If the channel is closed (the consumer task is gone), falls back to
    /// delivering inline, blocking the caller for the duration of the
    /// attempt. That path exists only as a startup/shutdown ordering guard;
    /// in a well-formed deployment it is unreachable.
    pub async fn enqueue(&self, notification: Notification) {
        debug!(
            recipient = %notification.recipient,
            subject = %notification.subject,
            "Queueing notification"
        );

        // Counted before the send so the consumer's decrement can never
        // observe a depth of zero while a message is in flight.
        self.depth.fetch_add(1, Ordering::SeqCst);
        match self.tx.send(notification) {
            Ok(()) => {}
            Err(mpsc::error::SendError(notification)) => {
                self.depth.fetch_sub(1, Ordering::SeqCst);
                warn!("Notification queue closed; delivering inline");
                if let Err(e) = self.notifier.deliver(&notification).await {
                    warn!(
                        recipient = %notification.recipient,
                        error = %e,
                        "Inline notification delivery failed"
                    );
                }
            }
        }
    }

    /// Number of messages currently queued.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::SeqCst)
    }

    /// Spawns the background consumer task.
    ///
    /// Returns `None` if the consumer was already started. The task blocks
    /// on the queue, attempts each delivery exactly once, and logs failures.
    pub async fn start(&self) -> Option<JoinHandle<()>> {
        let mut rx = match self.rx.lock().await.take() {
            Some(rx) => rx,
            None => {
                warn!("Notification consumer already started");
                return None;
            }
        };

        let depth = Arc::clone(&self.depth);
        let notifier = Arc::clone(&self.notifier);

        info!("Notification consumer started");
        Some(tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                depth.fetch_sub(1, Ordering::SeqCst);
                match notifier.deliver(&notification).await {
                    Ok(()) => {
                        debug!(
                            recipient = %notification.recipient,
                            subject = %notification.subject,
                            "Notification delivered"
                        );
                    }
                    Err(e) => {
                        warn!(
                            recipient = %notification.recipient,
                            subject = %notification.subject,
                            error = %e,
                            "Notification delivery failed; message dropped"
                        );
                    }
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MockNotifier;
    use std::time::Duration;

    #[tokio::test]
    async fn test_enqueue_accumulates_without_consumer() {
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = NotificationDispatcher::new(notifier.clone());

        for i in 0..3 {
            dispatcher
                .enqueue(Notification::new(
                    format!("subject {i}"),
                    "body",
                    "ops@example.com",
                ))
                .await;
        }

        assert_eq!(dispatcher.depth(), 3);
        assert!(notifier.deliveries().await.is_empty());
    }

    #[tokio::test]
    async fn test_consumer_drains_queue_in_order() {
        let notifier = Arc::new(MockNotifier::new());
        let dispatcher = NotificationDispatcher::new(notifier.clone());

        for i in 0..3 {
            dispatcher
                .enqueue(Notification::new(
                    format!("subject {i}"),
                    "body",
                    "ops@example.com",
                ))
                .await;
        }

        dispatcher.start().await.expect("consumer should start");

        notifier.wait_for(3, Duration::from_secs(2)).await;
        let delivered = notifier.deliveries().await;
        assert_eq!(delivered.len(), 3);
        assert_eq!(delivered[0].subject, "subject 0");
        assert_eq!(delivered[2].subject, "subject 2");
        assert_eq!(dispatcher.depth(), 0);
    }

    #[tokio::test]
    async fn test_failed_delivery_is_attempted_and_dropped() {
        let notifier = Arc::new(MockNotifier::failing());
        let dispatcher = NotificationDispatcher::new(notifier.clone());

        dispatcher
            .enqueue(Notification::new("subject", "body", "ops@example.com"))
            .await;
        dispatcher.start().await.expect("consumer should start");

        notifier.wait_for(1, Duration::from_secs(2)).await;
        // The attempt was observed even though delivery failed; nothing is
        // requeued.
        assert_eq!(notifier.attempts().await, 1);
        assert_eq!(dispatcher.depth(), 0);
    }

    #[tokio::test]
    async fn test_start_twice_returns_none() {
        let dispatcher = NotificationDispatcher::new(Arc::new(MockNotifier::new()));
        assert!(dispatcher.start().await.is_some());
        assert!(dispatcher.start().await.is_none());
    }
}
