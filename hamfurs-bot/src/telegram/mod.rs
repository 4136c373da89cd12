//! Chat transport.
//!
//! [`ChatApi`] is the seam between command handling and the Bot API so the
//! handlers can be exercised against an in-memory double.

pub mod client;
pub mod types;

pub use client::TelegramClient;
pub use types::*;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{method} rejected: {description}")]
    Api { method: String, description: String },
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Send a text message, returning the new message id.
    async fn send_text(&self, chat_id: i64, message: &TextMessage) -> Result<i64, TelegramError>;

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        message: &TextMessage,
    ) -> Result<(), TelegramError>;

    async fn send_media(
        &self,
        chat_id: i64,
        media: &Media,
        reply_to: Option<i64>,
    ) -> Result<i64, TelegramError>;

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), TelegramError>;

    async fn get_chat(&self, chat_id: i64) -> Result<Chat, TelegramError>;

    async fn administrator_ids(&self, chat_id: i64) -> Result<Vec<i64>, TelegramError>;
}
