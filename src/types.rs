//! Core types for paraphrase-worker

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One row's source text, tagged with its 0-based position in the input table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TextItem {
    /// Position of the row in source order
    pub index: usize,
    /// Text to submit to the paraphrasing service
    pub original: String,
}

impl TextItem {
    /// Create a new text item
    pub fn new(index: usize, original: impl Into<String>) -> Self {
        Self {
            index,
            original: original.into(),
        }
    }

    /// Build an ordered item sequence from plain strings
    pub fn from_texts<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Self::new(index, text))
            .collect()
    }
}

/// Remote task lifecycle as observed by the poll loop
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Submitted, result not ready yet
    Pending,
    /// Result available
    Ready,
    /// Polling failed
    Failed,
}

/// A submitted task owned by a single Task Client invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskHandle {
    /// Index of the item this task was created for
    pub item_index: usize,
    /// Opaque identifier returned by the service
    pub remote_task_id: String,
    /// Last observed state
    pub state: TaskState,
}

impl TaskHandle {
    /// Handle for a freshly submitted task
    pub fn pending(item_index: usize, remote_task_id: impl Into<String>) -> Self {
        Self {
            item_index,
            remote_task_id: remote_task_id.into(),
            state: TaskState::Pending,
        }
    }
}

/// Why a single item produced no text
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskErrorKind {
    /// Bad status, malformed body or network error while submitting
    SubmissionFailed,
    /// Bad status, malformed body, network error or timeout while polling
    PollFailed,
}

impl TaskErrorKind {
    /// Stable string form used in logs, events and webhooks
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskErrorKind::SubmissionFailed => "submission_failed",
            TaskErrorKind::PollFailed => "poll_failed",
        }
    }
}

impl std::fmt::Display for TaskErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal outcome of one Task Client invocation
///
/// Exactly one of text or error is present; `outcome` makes that
/// unrepresentable otherwise.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskResult {
    /// Index of the item this result belongs to
    pub item_index: usize,
    /// Final text, or the reason there is none
    pub outcome: std::result::Result<String, TaskErrorKind>,
}

impl TaskResult {
    /// Successful result
    pub fn success(item_index: usize, text: impl Into<String>) -> Self {
        Self {
            item_index,
            outcome: Ok(text.into()),
        }
    }

    /// Failed result
    pub fn failure(item_index: usize, kind: TaskErrorKind) -> Self {
        Self {
            item_index,
            outcome: Err(kind),
        }
    }

    /// Final text, if the item succeeded
    pub fn text(&self) -> Option<&str> {
        self.outcome.as_deref().ok()
    }

    /// Failure kind, if the item failed
    pub fn error(&self) -> Option<TaskErrorKind> {
        self.outcome.as_ref().err().copied()
    }

    /// Whether the item produced text
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Ordered, index-aligned outcomes of one batch
///
/// Always sorted by `item_index`; indices cover `0..len` exactly once when
/// built by the coordinator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResultSet {
    results: Vec<TaskResult>,
}

impl ResultSet {
    /// Build a result set, reordering by item index
    ///
    /// `results` must hold indices `0..len` exactly once.
    pub fn from_results(mut results: Vec<TaskResult>) -> Self {
        results.sort_by_key(|r| r.item_index);
        debug_assert!(
            results.iter().enumerate().all(|(pos, r)| r.item_index == pos),
            "result indices must cover 0..len exactly once"
        );
        Self { results }
    }

    /// Number of results
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the set is empty
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Results in index order
    pub fn iter(&self) -> std::slice::Iter<'_, TaskResult> {
        self.results.iter()
    }

    /// Result for a given item index
    pub fn get(&self, item_index: usize) -> Option<&TaskResult> {
        self.results
            .binary_search_by_key(&item_index, |r| r.item_index)
            .ok()
            .map(|pos| &self.results[pos])
    }

    /// Results as a slice
    pub fn as_slice(&self) -> &[TaskResult] {
        &self.results
    }

    /// Success/failure counts
    pub fn summary(&self) -> BatchSummary {
        let succeeded = self.results.iter().filter(|r| r.is_success()).count();
        BatchSummary {
            total: self.results.len(),
            succeeded,
            failed: self.results.len() - succeeded,
        }
    }
}

impl IntoIterator for ResultSet {
    type Item = TaskResult;
    type IntoIter = std::vec::IntoIter<TaskResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a TaskResult;
    type IntoIter = std::slice::Iter<'a, TaskResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

/// Success/failure counts for a batch
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BatchSummary {
    /// Number of items in the batch
    pub total: usize,
    /// Items that produced text
    pub succeeded: usize,
    /// Items that failed
    pub failed: usize,
}

/// Identity of whoever uploaded a document
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Requester {
    /// Platform user ID
    pub user_id: i64,
    /// Platform username, if known
    #[serde(default)]
    pub username: Option<String>,
    /// Chat to reply in (Telegram only)
    #[serde(default)]
    pub chat_id: Option<i64>,
}

impl Requester {
    /// Requester without a chat (REST uploads)
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            username: None,
            chat_id: None,
        }
    }
}

/// A stored `(original, result)` pair
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TextPair {
    /// Source text
    pub original: String,
    /// Paraphrased text (None when the item failed)
    pub result: Option<String>,
}

/// Event emitted by the worker
///
/// Consumers subscribe via [`ParaphraseWorker::subscribe()`](crate::ParaphraseWorker::subscribe).
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A batch was handed to the coordinator
    BatchStarted {
        /// Uploading user
        user_id: i64,
        /// Number of items in the batch
        items: usize,
    },

    /// One item failed
    TaskFailed {
        /// Index of the failed item
        item_index: usize,
        /// Failure classification
        kind: TaskErrorKind,
        /// Human-readable cause
        message: String,
    },

    /// A batch finished and its output document was produced
    BatchComplete {
        /// Uploading user
        user_id: i64,
        /// Outcome counts
        summary: BatchSummary,
    },

    /// Webhook delivery failed
    WebhookFailed {
        /// Webhook URL
        url: String,
        /// Error message
        error: String,
    },

    /// Worker is shutting down
    Shutdown,
}

/// Payload POSTed to webhooks
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookPayload {
    /// Event type ("batch_complete", "task_failed")
    pub event: String,
    /// Uploading user, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    /// Outcome counts (batch_complete)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<BatchSummary>,
    /// Failed item index (task_failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_index: Option<usize>,
    /// Error message (task_failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Unix timestamp
    pub timestamp: i64,
}
