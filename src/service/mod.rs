//! Task Client for the external paraphrasing service.
//!
//! [`TaskClient::process`] drives one [`TextItem`] through submit, then poll until ready
//! and always returns a terminal [`TaskResult`]. Failures are logged, reported to a
//! [`FailureSink`], and folded into the result; nothing is retried.

pub mod protocol;

use crate::config::ServiceConfig;
use crate::types::{TaskErrorKind, TaskHandle, TaskResult, TaskState, TextItem};
use protocol::{CheckResponse, SubmitRequest, SubmitResponse};
use std::time::Duration;
use thiserror::Error;

/// Receives every per-item failure
///
/// Implementations must return immediately; anything slow (HTTP, disk) belongs
/// in a spawned task.
pub trait FailureSink: Send + Sync {
    /// Record that `item_index` failed with `kind`
    fn report_failure(&self, item_index: usize, kind: TaskErrorKind, message: &str);
}

/// Sink that discards failures (they are still logged by the client)
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFailureSink;

impl FailureSink for NoopFailureSink {
    fn report_failure(&self, _item_index: usize, _kind: TaskErrorKind, _message: &str) {}
}

/// Why a protocol step failed
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The service answered with a non-success status
    #[error("service returned status {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (possibly empty)
        body: String,
    },

    /// Transport failure
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The body did not have the expected shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The task was still pending when the poll deadline passed
    #[error("task not ready after {0:?}")]
    TimedOut(Duration),
}

/// Build the connection pool shared by one batch
pub fn build_http_client(config: &ServiceConfig) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
}

/// Drives single items through the service's two-phase protocol
///
/// Borrows the batch's connection pool and the process-wide service config;
/// holds no state between calls.
pub struct TaskClient<'a> {
    http: &'a reqwest::Client,
    config: &'a ServiceConfig,
    sink: &'a dyn FailureSink,
}

impl<'a> TaskClient<'a> {
    /// Create a client over a shared connection pool
    pub fn new(
        http: &'a reqwest::Client,
        config: &'a ServiceConfig,
        sink: &'a dyn FailureSink,
    ) -> Self {
        Self { http, config, sink }
    }

    /// Submit `item`, poll until ready, and return its terminal result
    pub async fn process(&self, item: TextItem) -> TaskResult {
        let mut handle = match self.submit(&item).await {
            Ok(handle) => handle,
            Err(e) => return self.fail(item.index, TaskErrorKind::SubmissionFailed, &e),
        };

        tracing::debug!(
            item_index = item.index,
            task_id = %handle.remote_task_id,
            "task submitted"
        );

        match self.poll(&mut handle).await {
            Ok(text) => {
                tracing::debug!(
                    item_index = item.index,
                    task_id = %handle.remote_task_id,
                    "task ready"
                );
                TaskResult::success(item.index, text)
            }
            Err(e) => {
                handle.state = TaskState::Failed;
                self.fail(item.index, TaskErrorKind::PollFailed, &e)
            }
        }
    }

    /// Submit phase: create the remote task
    async fn submit(&self, item: &TextItem) -> Result<TaskHandle, ProtocolError> {
        let request = SubmitRequest {
            method: &self.config.method,
            api_token: &self.config.api_token,
            text: &item.original,
        };

        let response = self
            .http
            .post(&self.config.process_url)
            .json(&request)
            .send()
            .await?;
        let body = read_success_body(response).await?;

        let parsed: SubmitResponse = serde_json::from_slice(&body)
            .map_err(|e| ProtocolError::Malformed(format!("submit response: {}", e)))?;
        let task_id = parsed.data.task_id.into_string();
        if task_id.is_empty() {
            return Err(ProtocolError::Malformed("empty taskId".to_string()));
        }

        Ok(TaskHandle::pending(item.index, task_id))
    }

    /// Poll phase: check status at a fixed interval until ready
    async fn poll(&self, handle: &mut TaskHandle) -> Result<String, ProtocolError> {
        let started = tokio::time::Instant::now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let response = self
                .http
                .get(&self.config.check_url)
                .query(&[("taskId", handle.remote_task_id.as_str())])
                .send()
                .await?;
            let body = read_success_body(response).await?;

            let parsed: CheckResponse = serde_json::from_slice(&body)
                .map_err(|e| ProtocolError::Malformed(format!("check response: {}", e)))?;

            if parsed.data.ready {
                let text = parsed.data.result.ok_or_else(|| {
                    ProtocolError::Malformed("ready task without result".to_string())
                })?;
                handle.state = TaskState::Ready;
                tracing::trace!(task_id = %handle.remote_task_id, attempts, "poll finished");
                return Ok(text);
            }

            if let Some(timeout) = self.config.poll_timeout
                && started.elapsed() >= timeout
            {
                return Err(ProtocolError::TimedOut(timeout));
            }

            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn fail(&self, item_index: usize, kind: TaskErrorKind, error: &ProtocolError) -> TaskResult {
        let message = error.to_string();
        tracing::warn!(item_index, kind = %kind, error = %message, "paraphrase task failed");
        self.sink.report_failure(item_index, kind, &message);
        TaskResult::failure(item_index, kind)
    }
}

/// Return the body of a 2xx response, or a status error carrying the body
async fn read_success_body(response: reqwest::Response) -> Result<Vec<u8>, ProtocolError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProtocolError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.bytes().await?.to_vec())
}
