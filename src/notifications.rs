//! Observer notifications: the event bus and webhook delivery.
//!
//! Everything here is fire-and-forget. Broadcasting never waits for
//! subscribers and webhooks run on spawned tasks, so a slow or dead observer
//! never holds up a batch.

use crate::config::{WebhookConfig, WebhookEvent};
use crate::service::FailureSink;
use crate::types::{BatchSummary, Event, TaskErrorKind, WebhookPayload};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Publishes worker events to subscribers and configured webhooks
#[derive(Clone)]
pub struct Notifier {
    event_tx: broadcast::Sender<Event>,
    webhooks: Arc<Vec<WebhookConfig>>,
}

impl Notifier {
    /// Create a notifier publishing on `event_tx`
    pub fn new(event_tx: broadcast::Sender<Event>, webhooks: Vec<WebhookConfig>) -> Self {
        Self {
            event_tx,
            webhooks: Arc::new(webhooks),
        }
    }

    /// Broadcast `event`; having no subscribers is not an error
    pub fn emit(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Announce a finished batch on the bus and to `OnBatchComplete` webhooks
    pub fn batch_complete(&self, user_id: i64, summary: BatchSummary) {
        self.emit(Event::BatchComplete { user_id, summary });
        self.trigger_webhooks(
            WebhookEvent::OnBatchComplete,
            WebhookPayload {
                event: "batch_complete".to_string(),
                user_id: Some(user_id),
                summary: Some(summary),
                item_index: None,
                error: None,
                timestamp: chrono::Utc::now().timestamp(),
            },
        );
    }

    /// Failure sink for items uploaded by `user_id`
    pub fn for_batch(&self, user_id: i64) -> BatchFailureSink {
        BatchFailureSink {
            notifier: self.clone(),
            user_id: Some(user_id),
        }
    }

    /// Send `payload` to every webhook subscribed to `event_type`
    ///
    /// Requests run on a spawned task; failures are logged and reported as
    /// [`Event::WebhookFailed`].
    pub(crate) fn trigger_webhooks(&self, event_type: WebhookEvent, payload: WebhookPayload) {
        let matching_webhooks: Vec<_> = self
            .webhooks
            .iter()
            .filter(|w| w.events.contains(&event_type))
            .cloned()
            .collect();

        if matching_webhooks.is_empty() {
            return;
        }

        let event_tx = self.event_tx.clone();

        tokio::spawn(async move {
            let payload = Arc::new(payload);
            let client = reqwest::Client::new();

            for webhook in matching_webhooks {
                let mut request = client
                    .post(&webhook.url)
                    .json(payload.as_ref())
                    .timeout(webhook.timeout);

                if let Some(auth) = &webhook.auth_header {
                    request = request.header("Authorization", auth);
                }

                let url = webhook.url;
                let timeout = webhook.timeout;
                let error_msg = match tokio::time::timeout(timeout, request.send()).await {
                    Ok(Ok(response)) if response.status().is_success() => {
                        tracing::debug!(url = %url, event = %payload.event, "webhook sent");
                        continue;
                    }
                    Ok(Ok(response)) => format!(
                        "Webhook returned status {}: {}",
                        response.status(),
                        response.text().await.unwrap_or_default()
                    ),
                    Ok(Err(e)) => format!("Failed to send webhook: {}", e),
                    Err(_) => format!("Webhook timed out after {:?}", timeout),
                };

                tracing::warn!(url = %url, error = %error_msg, "webhook failed");
                event_tx
                    .send(Event::WebhookFailed {
                        url,
                        error: error_msg,
                    })
                    .ok();
            }
        });
    }

    fn task_failed(
        &self,
        user_id: Option<i64>,
        item_index: usize,
        kind: TaskErrorKind,
        message: &str,
    ) {
        self.emit(Event::TaskFailed {
            item_index,
            kind,
            message: message.to_string(),
        });
        self.trigger_webhooks(
            WebhookEvent::OnTaskFailed,
            WebhookPayload {
                event: "task_failed".to_string(),
                user_id,
                summary: None,
                item_index: Some(item_index),
                error: Some(format!("{}: {}", kind, message)),
                timestamp: chrono::Utc::now().timestamp(),
            },
        );
    }
}

impl FailureSink for Notifier {
    fn report_failure(&self, item_index: usize, kind: TaskErrorKind, message: &str) {
        self.task_failed(None, item_index, kind, message);
    }
}

/// [`Notifier`] bound to the uploader of one batch
pub struct BatchFailureSink {
    notifier: Notifier,
    user_id: Option<i64>,
}

impl FailureSink for BatchFailureSink {
    fn report_failure(&self, item_index: usize, kind: TaskErrorKind, message: &str) {
        self.notifier
            .task_failed(self.user_id, item_index, kind, message);
    }
}
