//! Telegram transport: long-polls the Bot API and feeds documents to the worker.
//!
//! `/start` registers the sender. Any document is downloaded, processed by
//! [`ParaphraseWorker::process_document`] and the annotated workbook is sent
//! back to the chat, plus a copy to the admin chat when one is configured.
//! Rejections and failures turn into a short text reply.

pub mod api;
pub mod types;

use crate::error::{Error, Result, TelegramError};
use crate::types::Requester;
use crate::worker::{ParaphraseWorker, UploadedDocument};
use api::TelegramApi;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use types::{Document, Message, Update};

/// Reply to `/start`
pub const WELCOME_MESSAGE: &str = "Hello! Upload an Excel file to make its texts unique.";
/// Reply to documents from senders who never sent `/start`
pub const NOT_REGISTERED_MESSAGE: &str = "Please send /start before uploading a file.";
/// Reply while the worker is shutting down
pub const SHUTTING_DOWN_MESSAGE: &str = "The bot is restarting. Please try again in a minute.";
/// Reply for every other failure
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while processing your file. Please try again later.";

/// Pause after a failed `getUpdates` before polling again
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Long-polling Telegram bot
pub struct TelegramBot {
    api: TelegramApi,
    worker: ParaphraseWorker,
    admin_chat_id: Option<i64>,
    long_poll_timeout: Duration,
    skip_pending_updates: bool,
}

impl TelegramBot {
    /// Create a bot from the worker's `telegram` configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no bot token is configured.
    pub fn new(worker: ParaphraseWorker) -> Result<Self> {
        let config = worker.config().telegram.clone();
        let token = config.bot_token.as_deref().ok_or_else(|| Error::Config {
            message: "Telegram bot token is not set".to_string(),
            key: Some("telegram.bot_token".to_string()),
        })?;
        let api = TelegramApi::new(&config.api_base_url, token, config.long_poll_timeout)?;

        Ok(Self {
            api,
            worker,
            admin_chat_id: config.admin_chat_id,
            long_poll_timeout: config.long_poll_timeout,
            skip_pending_updates: config.skip_pending_updates,
        })
    }

    /// Poll for updates until `cancel` fires
    ///
    /// Each update is handled on its own task so a long batch never stalls
    /// the polling loop.
    pub async fn run(self, cancel: CancellationToken) {
        let bot = Arc::new(self);
        let mut offset = if bot.skip_pending_updates {
            bot.skip_pending().await
        } else {
            None
        };

        tracing::info!(offset = ?offset, "Telegram bot started");

        loop {
            let updates = tokio::select! {
                _ = cancel.cancelled() => break,
                result = bot.api.get_updates(offset, bot.long_poll_timeout) => result,
            };

            match updates {
                Ok(updates) => {
                    for update in updates {
                        offset = Some(update.update_id + 1);
                        let bot = bot.clone();
                        tokio::spawn(async move { bot.handle_update(update).await });
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "getUpdates failed");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(POLL_ERROR_BACKOFF) => {}
                    }
                }
            }
        }

        tracing::info!("Telegram bot stopped");
    }

    /// Offset just past the newest queued update, if any
    async fn skip_pending(&self) -> Option<i64> {
        match self.api.get_updates(Some(-1), Duration::ZERO).await {
            Ok(updates) => {
                let last = updates.last().map(|u| u.update_id + 1);
                if last.is_some() {
                    tracing::info!("Skipped pending updates");
                }
                last
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to skip pending updates");
                None
            }
        }
    }

    async fn handle_update(&self, update: Update) {
        let Some(message) = update.message else {
            return;
        };

        let requester = requester_of(&message);

        if let Some(document) = &message.document {
            self.handle_document(&requester, message.chat.id, document).await;
        } else if message
            .text
            .as_deref()
            .is_some_and(|text| is_command(text, "start"))
        {
            self.handle_start(&requester, message.chat.id).await;
        }
    }

    async fn handle_start(&self, requester: &Requester, chat_id: i64) {
        if let Err(e) = self
            .worker
            .register_user(requester.user_id, requester.username.as_deref())
            .await
        {
            tracing::error!(user_id = requester.user_id, error = %e, "registration failed");
            self.reply(chat_id, GENERIC_FAILURE_MESSAGE).await;
            return;
        }
        self.reply(chat_id, WELCOME_MESSAGE).await;
    }

    async fn handle_document(&self, requester: &Requester, chat_id: i64, document: &Document) {
        let processed = match self.download(document).await {
            Ok(upload) => self.worker.process_document(requester, upload).await,
            Err(e) => Err(e),
        };

        let processed = match processed {
            Ok(processed) => processed,
            Err(e) => {
                tracing::warn!(user_id = requester.user_id, error = %e, "document rejected");
                self.reply(chat_id, &reply_for_error(&e)).await;
                return;
            }
        };

        if let Err(e) = self
            .api
            .send_document(chat_id, &processed.file_name, processed.bytes.clone(), None)
            .await
        {
            tracing::error!(chat_id, error = %e, "failed to deliver document");
        }

        if let Some(admin_chat_id) = self.admin_chat_id
            && admin_chat_id != chat_id
        {
            let caption = admin_caption(requester, &processed.summary);
            if let Err(e) = self
                .api
                .send_document(
                    admin_chat_id,
                    &processed.file_name,
                    processed.bytes,
                    Some(&caption),
                )
                .await
            {
                tracing::error!(admin_chat_id, error = %e, "failed to send copy to admin chat");
            }
        }
    }

    async fn download(&self, document: &Document) -> Result<UploadedDocument> {
        let file = self.api.get_file(&document.file_id).await?;
        let file_path = file.file_path.ok_or_else(|| TelegramError::MissingResult {
            method: "getFile".to_string(),
        })?;
        let bytes = self.api.download_file(&file_path).await?;

        tracing::debug!(
            file_id = %document.file_id,
            size = bytes.len(),
            "document downloaded"
        );

        Ok(UploadedDocument {
            file_name: document.file_name.clone(),
            mime_type: document.mime_type.clone(),
            bytes,
        })
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.api.send_message(chat_id, text).await {
            tracing::warn!(chat_id, error = %e, "sendMessage failed");
        }
    }
}

fn requester_of(message: &Message) -> Requester {
    match &message.from {
        Some(user) => Requester {
            user_id: user.id,
            username: user.username.clone(),
            chat_id: Some(message.chat.id),
        },
        None => Requester {
            user_id: message.chat.id,
            username: None,
            chat_id: Some(message.chat.id),
        },
    }
}

/// Matches `/name` and `/name@botname`, with or without arguments
fn is_command(text: &str, name: &str) -> bool {
    let Some(first) = text.split_whitespace().next() else {
        return false;
    };
    let Some(command) = first.strip_prefix('/') else {
        return false;
    };
    command.split('@').next() == Some(name)
}

fn reply_for_error(error: &Error) -> String {
    match error {
        Error::Table(e) => e.user_message(),
        Error::NotRegistered { .. } => NOT_REGISTERED_MESSAGE.to_string(),
        Error::ShuttingDown => SHUTTING_DOWN_MESSAGE.to_string(),
        _ => GENERIC_FAILURE_MESSAGE.to_string(),
    }
}

fn admin_caption(requester: &Requester, summary: &crate::types::BatchSummary) -> String {
    let who = match &requester.username {
        Some(name) => format!("@{} ({})", name, requester.user_id),
        None => requester.user_id.to_string(),
    };
    format!(
        "From {}: {}/{} rows paraphrased",
        who, summary.succeeded, summary.total
    )
}
