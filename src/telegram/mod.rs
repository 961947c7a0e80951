//! Telegram Bot API access.
//!
//! The bot talks to chats only through [`ChatGateway`], so request handling
//! can be exercised against an in-memory gateway in tests.

mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::{Chat, Message, Update, User};

use anyhow::Result;
use async_trait::async_trait;
use std::path::PathBuf;

/// An audio file to upload, with the metadata shown by Telegram clients.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioUpload {
    pub path: PathBuf,
    pub thumbnail: Option<PathBuf>,
    pub caption: String,
    pub title: String,
    pub performer: String,
    /// Playback length in whole seconds.
    pub duration: Option<u64>,
}

/// The chat operations request handling needs.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send a text message, optionally as a reply, and return it.
    async fn send_text(&self, chat_id: i64, reply_to: Option<i64>, text: &str) -> Result<Message>;

    /// Replace the text of a message the bot sent earlier.
    async fn edit_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;

    /// Upload an audio file, optionally as a reply.
    async fn send_audio(&self, chat_id: i64, reply_to: Option<i64>, audio: &AudioUpload)
        -> Result<()>;
}
