//! Background delivery of rejection notices.
//!
//! The engine hands a committed notice to a [`QueueSink`] and moves on; a
//! single worker task drains the queue and drives the blocking dispatcher
//! on the blocking thread pool. A dropped notice is logged, never
//! propagated back into the request that committed the rejection.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use ccr_core::{NotificationDispatcher, NotificationSink, RejectionNotice};

/// Engine-facing sink that enqueues notices for the worker task.
#[derive(Debug, Clone)]
pub struct QueueSink {
    tx: mpsc::UnboundedSender<RejectionNotice>,
}

impl NotificationSink for QueueSink {
    fn dispatch(&self, notice: RejectionNotice) {
        let case_id = notice.case_id;
        if self.tx.send(notice).is_err() {
            tracing::error!(
                "notification worker is gone; dropping notice for case {}",
                case_id
            );
        }
    }
}

/// Creates the sink/receiver pair wiring the engine to the worker.
pub fn notification_channel() -> (Arc<QueueSink>, mpsc::UnboundedReceiver<RejectionNotice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (Arc::new(QueueSink { tx }), rx)
}

/// Spawns the worker task that drains `rx` until every sink is dropped.
///
/// Each notice runs through the dispatcher's own retry loop on the
/// blocking pool, so a slow or failing transport never stalls the
/// async runtime.
pub fn spawn_notification_worker(
    mut rx: mpsc::UnboundedReceiver<RejectionNotice>,
    dispatcher: Arc<NotificationDispatcher>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notice) = rx.recv().await {
            let dispatcher = Arc::clone(&dispatcher);
            let result =
                tokio::task::spawn_blocking(move || dispatcher.deliver(&notice)).await;
            match result {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!("rejection notice was not delivered: {}", err);
                }
                Err(err) => {
                    tracing::error!("notification delivery task panicked: {}", err);
                }
            }
        }
        tracing::info!("notification queue closed; worker exiting");
    })
}
