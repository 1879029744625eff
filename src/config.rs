//! Configuration types for paraphrase-worker
//!
//! Configuration is read from an optional JSON file and then overridden by
//! environment variables (see [`Config::apply_env`]). Endpoints and the
//! service credential are process-wide and read-only once the worker starts.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::Path, path::PathBuf, time::Duration};
use tokio::sync::Semaphore;
use utoipa::ToSchema;

/// Main configuration for [`ParaphraseWorker`](crate::ParaphraseWorker)
///
/// Fields are organized into logical sub-configs:
/// - [`service`](ServiceConfig) - paraphrasing service endpoints and polling
/// - [`table`](TableConfig) - spreadsheet column names and failed-row policy
/// - [`persistence`](PersistenceConfig) - SQLite location
/// - [`telegram`](TelegramConfig) - bot transport
/// - [`api`](ApiConfig) - REST transport
/// - [`notifications`](NotificationConfig) - webhooks
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Paraphrasing service settings
    #[serde(default)]
    pub service: ServiceConfig,

    /// Spreadsheet adapter settings
    #[serde(default)]
    pub table: TableConfig,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Telegram bot transport
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// REST API transport
    #[serde(default)]
    pub api: ApiConfig,

    /// Observer notifications
    #[serde(default)]
    pub notifications: NotificationConfig,
}

/// External paraphrasing service configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceConfig {
    /// Task submission endpoint (POST)
    #[serde(default)]
    pub process_url: String,

    /// Task status endpoint (GET, `?taskId=`)
    #[serde(default)]
    pub check_url: String,

    /// Pre-shared API credential sent as `api_token`
    #[serde(default)]
    pub api_token: String,

    /// Method identifier sent with every submission (default: "paraphrase")
    #[serde(default = "default_method")]
    pub method: String,

    /// Delay between status checks in milliseconds (default: 1000)
    #[serde(default = "default_poll_interval", with = "millis_serde")]
    pub poll_interval: Duration,

    /// Give up polling a task after this many seconds (default: poll forever)
    #[serde(default, with = "optional_duration_serde")]
    pub poll_timeout: Option<Duration>,

    /// Per-request HTTP timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Maximum items in flight per batch (default: unbounded)
    #[serde(default)]
    pub max_concurrent_tasks: Option<usize>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            process_url: String::new(),
            check_url: String::new(),
            api_token: String::new(),
            method: default_method(),
            poll_interval: default_poll_interval(),
            poll_timeout: None,
            request_timeout: default_request_timeout(),
            max_concurrent_tasks: None,
        }
    }
}

/// What happens to the result column for rows whose task failed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum FailedRowPolicy {
    /// Failed rows get an empty cell, keeping every result on its source row
    #[default]
    Blank,
    /// Failed results are removed and the rest packed from the top
    ///
    /// Results after the first failure no longer line up with their source rows.
    Drop,
}

/// Spreadsheet adapter configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TableConfig {
    /// Header of the column holding source texts (default: "text_column")
    #[serde(default = "default_input_column")]
    pub input_column: String,

    /// Header of the appended result column (default: "unique_texts")
    #[serde(default = "default_output_column")]
    pub output_column: String,

    /// File name of the returned document (default: "unique_texts.xlsx")
    #[serde(default = "default_output_file_name")]
    pub output_file_name: String,

    /// Result column handling for failed rows (default: blank)
    #[serde(default)]
    pub failed_row_policy: FailedRowPolicy,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            input_column: default_input_column(),
            output_column: default_output_column(),
            output_file_name: default_output_file_name(),
            failed_row_policy: FailedRowPolicy::default(),
        }
    }
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PersistenceConfig {
    /// Database path (default: "./paraphrase-worker.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Telegram bot configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct TelegramConfig {
    /// Bot token (bot disabled when absent)
    #[serde(default)]
    pub bot_token: Option<String>,

    /// Bot API base URL (default: "https://api.telegram.org")
    #[serde(default = "default_telegram_api_url")]
    pub api_base_url: String,

    /// Chat that receives a copy of every output document
    #[serde(default)]
    pub admin_chat_id: Option<i64>,

    /// `getUpdates` long-poll timeout in seconds (default: 30)
    #[serde(default = "default_long_poll_timeout", with = "duration_serde")]
    pub long_poll_timeout: Duration,

    /// Reject documents from users who have not sent /start (default: true)
    #[serde(default = "default_true")]
    pub require_registration: bool,

    /// Drop updates that queued up while the bot was offline (default: true)
    #[serde(default = "default_true")]
    pub skip_pending_updates: bool,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            api_base_url: default_telegram_api_url(),
            admin_chat_id: None,
            long_poll_timeout: default_long_poll_timeout(),
            require_registration: true,
            skip_pending_updates: true,
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Serve the REST API (default: true)
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Optional API key for authentication
    #[serde(default)]
    pub api_key: Option<String>,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: default_bind_address(),
            api_key: None,
            cors_enabled: true,
            cors_origins: default_cors_origins(),
        }
    }
}

/// Notification configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct NotificationConfig {
    /// Webhook configurations
    #[serde(default)]
    pub webhooks: Vec<WebhookConfig>,
}

/// Webhook configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct WebhookConfig {
    /// URL to POST to
    pub url: String,

    /// Events that trigger this webhook
    pub events: Vec<WebhookEvent>,

    /// Optional authentication header value
    #[serde(default)]
    pub auth_header: Option<String>,

    /// Timeout for webhook requests (default: 30 seconds)
    #[serde(default = "default_webhook_timeout", with = "duration_serde")]
    pub timeout: Duration,
}

/// Webhook trigger event
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum WebhookEvent {
    /// Triggered when a batch has been processed and delivered
    OnBatchComplete,
    /// Triggered for every failed item (error-tracking sink)
    OnTaskFailed,
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| Error::Config {
            message: format!("failed to read {}: {}", path.display(), e),
            key: None,
        })?;
        serde_json::from_str(&raw).map_err(|e| Error::Config {
            message: format!("failed to parse {}: {}", path.display(), e),
            key: None,
        })
    }

    /// Override settings from environment-style variables
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`. Recognized keys:
    /// `NEURAL_API_TOKEN`, `API_URL_PROCESS`, `API_URL_CHECK`, `BOT_TOKEN`,
    /// `ADMIN_CHAT_ID`, `DATABASE_PATH`, `API_BIND_ADDRESS`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("NEURAL_API_TOKEN") {
            self.service.api_token = token;
        }
        if let Some(url) = lookup("API_URL_PROCESS") {
            self.service.process_url = url;
        }
        if let Some(url) = lookup("API_URL_CHECK") {
            self.service.check_url = url;
        }
        if let Some(token) = lookup("BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(raw) = lookup("ADMIN_CHAT_ID") {
            let chat_id = raw.trim().parse::<i64>().map_err(|e| Error::Config {
                message: format!("ADMIN_CHAT_ID must be an integer: {}", e),
                key: Some("telegram.admin_chat_id".to_string()),
            })?;
            self.telegram.admin_chat_id = Some(chat_id);
        }
        if let Some(path) = lookup("DATABASE_PATH") {
            self.persistence.database_path = PathBuf::from(path);
        }
        if let Some(raw) = lookup("API_BIND_ADDRESS") {
            self.api.bind_address = raw.trim().parse().map_err(|e| Error::Config {
                message: format!("API_BIND_ADDRESS is not a socket address: {}", e),
                key: Some("api.bind_address".to_string()),
            })?;
        }
        Ok(())
    }

    /// Check that the paraphrasing service is fully configured
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("service.process_url", &self.service.process_url),
            ("service.check_url", &self.service.check_url),
            ("service.api_token", &self.service.api_token),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config {
                    message: format!("{} must be set", key),
                    key: Some(key.to_string()),
                });
            }
        }

        for (key, value) in [
            ("service.process_url", &self.service.process_url),
            ("service.check_url", &self.service.check_url),
        ] {
            url::Url::parse(value).map_err(|e| Error::Config {
                message: format!("{} is not a valid URL: {}", key, e),
                key: Some(key.to_string()),
            })?;
        }

        if self.service.poll_interval.is_zero() {
            return Err(Error::Config {
                message: "service.poll_interval must be greater than zero".to_string(),
                key: Some("service.poll_interval".to_string()),
            });
        }

        if let Some(limit) = self.service.max_concurrent_tasks
            && (limit == 0 || limit > Semaphore::MAX_PERMITS)
        {
            return Err(Error::Config {
                message: format!(
                    "service.max_concurrent_tasks must be between 1 and {}",
                    Semaphore::MAX_PERMITS
                ),
                key: Some("service.max_concurrent_tasks".to_string()),
            });
        }

        Ok(())
    }
}

fn default_method() -> String {
    "paraphrase".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_input_column() -> String {
    "text_column".to_string()
}

fn default_output_column() -> String {
    "unique_texts".to_string()
}

fn default_output_file_name() -> String {
    "unique_texts.xlsx".to_string()
}

fn default_database_path() -> PathBuf {
    PathBuf::from("./paraphrase-worker.db")
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_long_poll_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_true() -> bool {
    true
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_webhook_timeout() -> Duration {
    Duration::from_secs(30)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Millisecond Duration serialization helper
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}
