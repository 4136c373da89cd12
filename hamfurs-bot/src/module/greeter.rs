//! Join greetings.
//!
//! Each chat may store a Markdown template. `{user}` expands to the
//! Oxford-joined handles of the members who joined and `{pinned_message}`
//! to a link to the chat's pinned message.

use crate::store::{Collection, StoreError};
use crate::telegram::{Chat, ChatApi, User};
use hamfurs_common::markdown::oxford_join;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSettings {
    pub chat_id: i64,
    pub greeter_text: String,
    pub greeter_enabled: bool,
}

/// Public link to a message.
///
/// Chats without a username get the `t.me/c/` form, which only works for
/// members.
pub fn message_url(chat: &Chat, message_id: i64) -> String {
    match &chat.username {
        Some(username) => format!("https://t.me/{}/{}", username, message_id),
        None => {
            let id = chat.id.to_string();
            let internal = id.strip_prefix("-100").unwrap_or(id.trim_start_matches('-'));
            format!("https://t.me/c/{}/{}", internal, message_id)
        }
    }
}

pub fn format_greeting(template: &str, members: &[User], pinned_url: Option<&str>) -> String {
    let mentions: Vec<String> = members.iter().map(User::mention).collect();
    template
        .replace("{user}", &oxford_join(&mentions))
        .replace("{pinned_message}", pinned_url.unwrap_or_default())
}

pub struct Greeter {
    chats: Collection<ChatSettings>,
}

impl Greeter {
    pub fn new(chats: Collection<ChatSettings>) -> Self {
        Self { chats }
    }

    pub async fn settings(&self, chat_id: i64) -> Option<ChatSettings> {
        self.chats.get(&chat_id.to_string()).await
    }

    /// Store a new template. Setting a template also enables the greeter.
    pub async fn set_template(&self, chat_id: i64, text: &str) -> Result<(), StoreError> {
        let settings = ChatSettings {
            chat_id,
            greeter_text: text.to_string(),
            greeter_enabled: true,
        };
        self.chats.upsert(chat_id.to_string(), settings).await?;
        tracing::info!("Join message for chat {} updated", chat_id);
        Ok(())
    }

    /// Toggle the greeter. Returns `false` when the chat has no template yet.
    pub async fn set_enabled(&self, chat_id: i64, enabled: bool) -> Result<bool, StoreError> {
        let key = chat_id.to_string();
        self.chats
            .update(|docs| match docs.get_mut(&key) {
                Some(settings) => {
                    settings.greeter_enabled = enabled;
                    true
                }
                None => false,
            })
            .await
    }

    /// Enabled template for a chat.
    pub async fn template_for(&self, chat_id: i64) -> Option<String> {
        self.settings(chat_id)
            .await
            .filter(|s| s.greeter_enabled)
            .map(|s| s.greeter_text)
    }

    /// Greeting for `members` joining `chat_id`, or `None` when disabled.
    pub async fn greeting(&self, api: &dyn ChatApi, chat_id: i64, members: &[User]) -> Option<String> {
        let template = self.template_for(chat_id).await?;
        let pinned_url = match api.get_chat(chat_id).await {
            Ok(chat) => chat
                .pinned_message
                .as_ref()
                .map(|pinned| message_url(&chat, pinned.message_id)),
            Err(e) => {
                tracing::warn!("Could not fetch chat {} for greeting: {}", chat_id, e);
                None
            }
        };
        Some(format_greeting(&template, members, pinned_url.as_deref()))
    }
}
