//! Shutdown coordination.

use crate::error::Result;
use crate::types::Event;
use std::sync::atomic::Ordering;
use std::time::Duration;

use super::ParaphraseWorker;

/// How long shutdown waits for in-flight batches before closing the database
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

impl ParaphraseWorker {
    /// Gracefully shut down the worker
    ///
    /// Stops accepting documents, waits (bounded) for batches in flight,
    /// emits [`Event::Shutdown`] and closes the database pool. Documents
    /// submitted afterwards fail with [`Error::ShuttingDown`](crate::Error::ShuttingDown).
    pub async fn shutdown(&self) -> Result<()> {
        tracing::info!("Initiating graceful shutdown");

        self.accepting_new.store(false, Ordering::SeqCst);

        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.wait_for_active_batches()).await {
            Ok(()) => tracing::info!("All active batches completed"),
            Err(_) => tracing::warn!(
                active = self.active_batches.load(Ordering::SeqCst),
                "Timeout waiting for batches to complete, proceeding with shutdown"
            ),
        }

        self.notifier.emit(Event::Shutdown);
        self.db.pool().close().await;

        tracing::info!("Shutdown complete");
        Ok(())
    }

    async fn wait_for_active_batches(&self) {
        loop {
            let active = self.active_batches.load(Ordering::SeqCst);
            if active == 0 {
                return;
            }
            tracing::debug!(active, "Waiting for active batches to complete");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
