//! # paraphrase-worker
//!
//! Message-driven worker that paraphrases every row of an uploaded spreadsheet.
//!
//! A requester registers, uploads an Excel workbook with a `text_column`
//! column, and receives the workbook back with a `unique_texts` column holding
//! one paraphrase per row. Rows are submitted to an asynchronous text service
//! (submit, then poll until ready) concurrently, and results keep row order.
//! Per-row failures never abort a batch.
//!
//! Two transports share one [`ParaphraseWorker`]: a Telegram bot
//! ([`telegram::TelegramBot`]) and a REST API ([`api::create_router`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use paraphrase_worker::{Config, Coordinator, ParaphraseWorker};
//! use paraphrase_worker::service::NoopFailureSink;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.apply_env(|k| std::env::var(k).ok())?;
//!     config.validate()?;
//!
//!     let coordinator = Coordinator::new(Arc::new(config.service.clone()), Arc::new(NoopFailureSink));
//!     let results = coordinator.run_texts(["first text", "second text"]).await;
//!     for result in results.iter() {
//!         println!("{}: {:?}", result.item_index, result.outcome);
//!     }
//!
//!     let worker = ParaphraseWorker::new(config).await?;
//!     let mut events = worker.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Batch fan-out over the paraphrasing service
pub mod coordinator;
/// Database persistence layer
pub mod db;
/// Error types
pub mod error;
/// Event bus and webhooks
pub mod notifications;
/// Submit/poll client for the paraphrasing service
pub mod service;
/// Spreadsheet reading and writing
pub mod table;
/// Telegram bot transport
pub mod telegram;
/// Core types and events
pub mod types;
/// Document-processing worker
pub mod worker;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, FailedRowPolicy, ServiceConfig};
pub use coordinator::Coordinator;
pub use db::Database;
pub use error::{ApiError, DatabaseError, Error, ErrorDetail, Result, TableError, ToHttpStatus};
pub use types::{
    BatchSummary, Event, Requester, ResultSet, TaskErrorKind, TaskResult, TextItem, TextPair,
};
pub use worker::{ParaphraseWorker, ProcessedDocument, UploadedDocument};

/// Resolve once the process receives a termination signal
///
/// Listens for SIGTERM and SIGINT, falling back to whichever one can be
/// registered, then to `ctrl_c`.
#[cfg(unix)]
pub async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolve once the process receives Ctrl+C
#[cfg(not(unix))]
pub async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
