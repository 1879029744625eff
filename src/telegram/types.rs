//! The subset of Bot API objects the bot reads.

use serde::Deserialize;

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the call succeeded
    pub ok: bool,
    /// Payload when `ok` is true
    pub result: Option<T>,
    /// Error description when `ok` is false
    #[serde(default)]
    pub description: Option<String>,
}

/// An incoming update
#[derive(Clone, Debug, Deserialize)]
pub struct Update {
    /// Monotonic update identifier
    pub update_id: i64,
    /// New incoming message, if this update carries one
    #[serde(default)]
    pub message: Option<Message>,
}

/// A chat message
#[derive(Clone, Debug, Deserialize)]
pub struct Message {
    /// Message identifier inside the chat
    pub message_id: i64,
    /// Chat the message belongs to
    pub chat: Chat,
    /// Sender (absent for channel posts)
    #[serde(default)]
    pub from: Option<User>,
    /// Text of a text message
    #[serde(default)]
    pub text: Option<String>,
    /// Attached general file
    #[serde(default)]
    pub document: Option<Document>,
}

/// A chat
#[derive(Clone, Debug, Deserialize)]
pub struct Chat {
    /// Chat identifier
    pub id: i64,
}

/// A Telegram user
#[derive(Clone, Debug, Deserialize)]
pub struct User {
    /// User identifier
    pub id: i64,
    /// Username without the leading '@'
    #[serde(default)]
    pub username: Option<String>,
}

/// A general file attached to a message
#[derive(Clone, Debug, Deserialize)]
pub struct Document {
    /// Identifier for `getFile`
    pub file_id: String,
    /// Original file name
    #[serde(default)]
    pub file_name: Option<String>,
    /// MIME type as reported by the sender's client
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Size in bytes
    #[serde(default)]
    pub file_size: Option<u64>,
}

/// A file ready to be downloaded
#[derive(Clone, Debug, Deserialize)]
pub struct File {
    /// Identifier of the file
    pub file_id: String,
    /// Path for `/file/bot<token>/<file_path>`
    #[serde(default)]
    pub file_path: Option<String>,
}
