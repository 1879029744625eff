//! Minimal Bot API client over reqwest.

use super::types::{ApiResponse, File, Message, Update};
use crate::error::{Error, Result, TelegramError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Extra time the HTTP client allows on top of the long-poll timeout
const LONG_POLL_GRACE: Duration = Duration::from_secs(10);

/// Bot API client bound to one bot token
#[derive(Clone)]
pub struct TelegramApi {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl TelegramApi {
    /// Create a client; `long_poll_timeout` bounds how long `getUpdates` may hang
    pub fn new(base_url: &str, token: &str, long_poll_timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(long_poll_timeout + LONG_POLL_GRACE)
            .user_agent(concat!("paraphrase-worker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Call `method` with a JSON body and unwrap the response envelope
    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await?;
        unwrap_response(method, response).await
    }

    /// Fetch updates after `offset`, waiting up to `timeout` for new ones
    pub async fn get_updates(&self, offset: Option<i64>, timeout: Duration) -> Result<Vec<Update>> {
        let params = serde_json::json!({
            "offset": offset,
            "timeout": timeout.as_secs(),
            "allowed_updates": ["message"],
        });
        self.call("getUpdates", &params).await
    }

    /// Resolve `file_id` to a downloadable path
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        self.call("getFile", &serde_json::json!({ "file_id": file_id }))
            .await
    }

    /// Download a file previously resolved with [`get_file`](Self::get_file)
    pub async fn download_file(&self, file_path: &str) -> Result<Vec<u8>> {
        let url = format!(
            "{}/file/bot{}/{}",
            self.base_url,
            self.token,
            file_path.trim_start_matches('/')
        );
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(TelegramError::Download {
                status: status.as_u16(),
            }
            .into());
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Send a plain text message
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<Message> {
        self.call(
            "sendMessage",
            &serde_json::json!({ "chat_id": chat_id, "text": text }),
        )
        .await
    }

    /// Upload `bytes` as a document named `file_name`
    pub async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<Message> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(crate::table::XLSX_MIME)?;
        let mut form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = self
            .http
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;
        unwrap_response("sendDocument", response).await
    }
}

/// Decode the envelope regardless of HTTP status; Telegram reports errors in the body
async fn unwrap_response<T: DeserializeOwned>(method: &str, response: reqwest::Response) -> Result<T> {
    let envelope: ApiResponse<T> = response.json().await?;

    if !envelope.ok {
        return Err(TelegramError::Api {
            method: method.to_string(),
            description: envelope
                .description
                .unwrap_or_else(|| "no description".to_string()),
        }
        .into());
    }

    envelope.result.ok_or_else(|| {
        TelegramError::MissingResult {
            method: method.to_string(),
        }
        .into()
    })
}
