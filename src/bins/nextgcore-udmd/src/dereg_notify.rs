//! Deregistration Notification
//!
//! Delivery of `DeregistrationData` to an AMF that has been superseded.
//! Procedures hand a notification to a [`DeregDispatch`] and move on; the
//! outcome is only logged.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use crate::error::UdmResult;
use crate::models::DeregistrationData;

/// A notification addressed to an AMF callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeregNotification {
    pub ue_id: String,
    pub callback_uri: String,
    pub data: DeregistrationData,
}

/// Fire-and-forget hand-off. Must not block.
pub trait DeregDispatch: Send + Sync {
    fn dispatch(&self, notification: DeregNotification);
}

/// Outbound POST of `DeregistrationData` to a callback URI
#[async_trait]
pub trait CallbackClient: Send + Sync {
    async fn send_dereg_notification(
        &self,
        callback_uri: &str,
        data: &DeregistrationData,
    ) -> UdmResult<()>;
}

/// Bounded queue drained by a fixed pool of worker tasks
pub struct DeregNotifier {
    tx: Mutex<Option<mpsc::Sender<DeregNotification>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    dropped: AtomicU64,
}

impl DeregNotifier {
    /// Spawn `workers` tasks on the current Tokio runtime
    pub fn new(callback: Arc<dyn CallbackClient>, workers: usize, queue_depth: usize) -> Self {
        let (tx, rx) = mpsc::channel::<DeregNotification>(queue_depth.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|id| {
                let rx = rx.clone();
                let callback = callback.clone();
                tokio::spawn(async move {
                    loop {
                        let next = rx.lock().await.recv().await;
                        let Some(notification) = next else {
                            break;
                        };
                        deliver(id, callback.as_ref(), notification).await;
                    }
                    log::debug!("Deregistration notifier worker {id} stopped");
                })
            })
            .collect();

        Self {
            tx: Mutex::new(Some(tx)),
            workers: Mutex::new(handles),
            dropped: AtomicU64::new(0),
        }
    }

    /// Notifications discarded because the queue was full or closed
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close the queue and wait for queued notifications to be delivered
    pub async fn shutdown(&self) {
        self.tx.lock().unwrap_or_else(PoisonError::into_inner).take();

        let handles: Vec<_> = self
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            if let Err(e) = handle.await {
                log::error!("Deregistration notifier worker failed: {e}");
            }
        }
    }
}

impl DeregDispatch for DeregNotifier {
    fn dispatch(&self, notification: DeregNotification) {
        let guard = self.tx.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = guard.as_ref() else {
            log::warn!(
                "[{}] notifier closed, dropping deregistration notification",
                notification.ue_id
            );
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };

        match tx.try_send(notification) {
            Ok(()) => {}
            Err(TrySendError::Full(n)) => {
                log::warn!("[{}] notification queue full, dropping {}", n.ue_id, n.callback_uri);
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            Err(TrySendError::Closed(n)) => {
                log::warn!("[{}] notification queue closed, dropping {}", n.ue_id, n.callback_uri);
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

async fn deliver(worker: usize, callback: &dyn CallbackClient, notification: DeregNotification) {
    log::info!(
        "[{}] Deregistration notification to {} ({:?}, worker {worker})",
        notification.ue_id,
        notification.callback_uri,
        notification.data.dereg_reason
    );
    match callback
        .send_dereg_notification(&notification.callback_uri, &notification.data)
        .await
    {
        Ok(()) => log::debug!("[{}] Deregistration notification delivered", notification.ue_id),
        Err(e) => log::error!(
            "[{}] Deregistration notification to {} failed: {e}",
            notification.ue_id,
            notification.callback_uri
        ),
    }
}
