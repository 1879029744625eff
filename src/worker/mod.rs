//! The worker context shared by every transport.
//!
//! [`ParaphraseWorker`] owns the process-wide state that used to live in
//! globals: configuration, the database, the event bus and the notifier. It is
//! created once at startup, cloned into the Telegram bot and the REST API, and
//! torn down with [`ParaphraseWorker::shutdown`].

mod documents;
mod lifecycle;

pub use documents::{ProcessedDocument, UploadedDocument};

use crate::config::{Config, ServiceConfig};
use crate::db::Database;
use crate::error::Result;
use crate::notifications::Notifier;
use crate::types::{Event, TextPair};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::broadcast;

/// Capacity of the event bus; slow subscribers lag instead of blocking
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Document-processing worker
#[derive(Clone)]
pub struct ParaphraseWorker {
    /// Database instance for persistence
    pub(crate) db: Arc<Database>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    /// Configuration
    pub(crate) config: Arc<Config>,
    /// Service settings shared by every batch's coordinator
    pub(crate) service_config: Arc<ServiceConfig>,
    /// Event bus and webhook publisher
    pub(crate) notifier: Notifier,
    /// Cleared by shutdown; new documents are refused afterwards
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Batches currently between parse and delivery
    pub(crate) active_batches: Arc<AtomicUsize>,
}

impl ParaphraseWorker {
    /// Open the database and wire up the event bus
    pub async fn new(config: Config) -> Result<Self> {
        let db = Database::new(&config.persistence.database_path).await?;
        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let notifier = Notifier::new(event_tx.clone(), config.notifications.webhooks.clone());

        tracing::info!(
            database = %config.persistence.database_path.display(),
            webhooks = config.notifications.webhooks.len(),
            "paraphrase worker initialized"
        );

        Ok(Self {
            db: Arc::new(db),
            event_tx,
            service_config: Arc::new(config.service.clone()),
            config: Arc::new(config),
            notifier,
            accepting_new: Arc::new(AtomicBool::new(true)),
            active_batches: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Subscribe to worker events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Current configuration
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Whether new documents are still accepted
    pub fn is_accepting(&self) -> bool {
        self.accepting_new.load(Ordering::SeqCst)
    }

    /// Register a requester; returns true when they were not registered before
    pub async fn register_user(&self, user_id: i64, username: Option<&str>) -> Result<bool> {
        let inserted = self.db.register_user(user_id, username).await?;
        if inserted {
            tracing::info!(user_id, username = ?username, "user registered");
        }
        Ok(inserted)
    }

    /// Whether `user_id` has registered
    pub async fn is_user_registered(&self, user_id: i64) -> Result<bool> {
        self.db.is_user_registered(user_id).await
    }

    /// Every pair stored for `user_id`, oldest first
    pub async fn get_texts(&self, user_id: i64) -> Result<Vec<TextPair>> {
        self.db.get_texts(user_id).await
    }
}
