//! Fan-out Coordinator: run a whole batch through the Task Client.
//!
//! Every item of a batch is processed concurrently over one connection pool
//! that lives exactly as long as [`Coordinator::run`]. Failures stay
//! isolated to their item; the returned [`ResultSet`] is ordered by source
//! index no matter which items finish first.

use crate::config::ServiceConfig;
use crate::service::{FailureSink, TaskClient, build_http_client};
use crate::types::{ResultSet, TaskErrorKind, TaskResult, TextItem};
use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs batches of text items against the paraphrasing service
#[derive(Clone)]
pub struct Coordinator {
    config: Arc<ServiceConfig>,
    sink: Arc<dyn FailureSink>,
}

impl Coordinator {
    /// Create a coordinator over process-wide service settings
    pub fn new(config: Arc<ServiceConfig>, sink: Arc<dyn FailureSink>) -> Self {
        Self { config, sink }
    }

    /// Process every item and return one result per item, in index order
    ///
    /// All items are in flight at once unless `max_concurrent_tasks` is set.
    /// There is no cancellation: the call returns once every item has settled.
    ///
    /// Items must be numbered `0..n` with no duplicates, as
    /// [`TextItem::from_texts`] does.
    pub async fn run(&self, items: Vec<TextItem>) -> ResultSet {
        if items.is_empty() {
            return ResultSet::default();
        }

        let total = items.len();
        let http = match build_http_client(&self.config) {
            Ok(http) => http,
            Err(e) => {
                tracing::error!(error = %e, items = total, "failed to build HTTP client for batch");
                let message = format!("HTTP client unavailable: {}", e);
                let results = items
                    .into_iter()
                    .map(|item| {
                        self.sink.report_failure(
                            item.index,
                            TaskErrorKind::SubmissionFailed,
                            &message,
                        );
                        TaskResult::failure(item.index, TaskErrorKind::SubmissionFailed)
                    })
                    .collect();
                return ResultSet::from_results(results);
            }
        };

        let limiter = self
            .config
            .max_concurrent_tasks
            .map(|limit| Semaphore::new(limit.clamp(1, Semaphore::MAX_PERMITS)));
        tracing::info!(
            items = total,
            max_in_flight = self.config.max_concurrent_tasks.unwrap_or(total),
            "starting batch"
        );

        let results = {
            let client = TaskClient::new(&http, &self.config, self.sink.as_ref());
            let client = &client;
            let limiter = limiter.as_ref();

            join_all(items.into_iter().map(|item| async move {
                let _permit = match limiter {
                    Some(semaphore) => semaphore.acquire().await.ok(),
                    None => None,
                };
                client.process(item).await
            }))
            .await
        };

        // Closes every pooled connection of this batch
        drop(http);

        let set = ResultSet::from_results(results);
        let summary = set.summary();
        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "batch settled"
        );
        set
    }

    /// Convenience wrapper numbering `texts` in order
    pub async fn run_texts<I, S>(&self, texts: I) -> ResultSet
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.run(TextItem::from_texts(texts)).await
    }
}
