//! Bot API payload types, limited to the fields the bot reads.

use hamfurs_common::markdown::escape_markdown;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub edited_message: Option<Message>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
    pub new_chat_members: Option<Vec<User>>,
    pub sticker: Option<FileRef>,
    pub document: Option<FileRef>,
    pub photo: Option<Vec<FileRef>>,
    pub audio: Option<FileRef>,
    pub voice: Option<FileRef>,
    pub video: Option<FileRef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    pub username: Option<String>,
    pub pinned_message: Option<Box<Message>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    pub file_id: String,
}

impl Chat {
    /// Private chats have positive ids, groups negative ones.
    pub fn is_private(&self) -> bool {
        self.id > 0
    }
}

impl User {
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) if !last.is_empty() => format!("{} {}", self.first_name, last),
            _ => self.first_name.clone(),
        }
    }

    /// "@handle (First Last)" or just the name, Markdown-escaped.
    pub fn describe(&self) -> String {
        match &self.username {
            Some(username) => escape_markdown(&format!("@{} ({})", username, self.full_name())),
            None => escape_markdown(&self.full_name()),
        }
    }

    /// "@handle" when available, otherwise the full name, Markdown-escaped.
    pub fn mention(&self) -> String {
        match &self.username {
            Some(username) => escape_markdown(&format!("@{}", username)),
            None => escape_markdown(&self.full_name()),
        }
    }
}

impl Message {
    /// File id of any attached media, with a label for logging.
    pub fn media_file_id(&self) -> Option<(&'static str, &str)> {
        if let Some(f) = &self.document {
            return Some(("document", &f.file_id));
        }
        if let Some(f) = self.photo.as_ref().and_then(|sizes| sizes.last()) {
            return Some(("photo", &f.file_id));
        }
        if let Some(f) = &self.sticker {
            return Some(("sticker", &f.file_id));
        }
        if let Some(f) = &self.audio {
            return Some(("audio", &f.file_id));
        }
        if let Some(f) = &self.voice {
            return Some(("voice", &f.file_id));
        }
        self.video.as_ref().map(|f| ("video", f.file_id.as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
    UploadPhoto,
}

impl ChatAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatAction::Typing => "typing",
            ChatAction::UploadPhoto => "upload_photo",
        }
    }
}

/// Outbound text message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMessage {
    pub text: String,
    pub markdown: bool,
    pub disable_preview: bool,
    pub reply_to: Option<i64>,
    pub force_reply: bool,
}

impl TextMessage {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: false,
            disable_preview: false,
            reply_to: None,
            force_reply: false,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            markdown: true,
            ..Self::plain(text)
        }
    }

    pub fn without_preview(mut self) -> Self {
        self.disable_preview = true;
        self
    }

    pub fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to = Some(message_id);
        self
    }

    pub fn force_reply(mut self) -> Self {
        self.force_reply = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Sticker,
    Photo,
    Document,
    Voice,
}

impl MediaKind {
    /// Bot API method and the parameter carrying the file.
    pub fn method(&self) -> (&'static str, &'static str) {
        match self {
            MediaKind::Sticker => ("sendSticker", "sticker"),
            MediaKind::Photo => ("sendPhoto", "photo"),
            MediaKind::Document => ("sendDocument", "document"),
            MediaKind::Voice => ("sendVoice", "voice"),
        }
    }
}

/// Media sent by file id or URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    pub file: String,
}

impl Media {
    pub fn new(kind: MediaKind, file: impl Into<String>) -> Self {
        Self {
            kind,
            file: file.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_deserializes_edit() {
        let update: Update = serde_json::from_str(
            r#"{
                "update_id": 42,
                "edited_message": {
                    "message_id": 7,
                    "chat": {"id": -100, "type": "supergroup"},
                    "from": {"id": 5, "is_bot": false, "first_name": "Terry", "username": "kf3rry"},
                    "text": "/lookup kf3rry"
                }
            }"#,
        )
        .unwrap();

        assert!(update.message.is_none());
        let msg = update.edited_message.unwrap();
        assert_eq!(msg.chat.kind, "supergroup");
        assert!(!msg.chat.is_private());
        assert_eq!(msg.from.unwrap().username.as_deref(), Some("kf3rry"));
    }

    #[test]
    fn test_user_describe_escapes() {
        let user = User {
            id: 1,
            first_name: "Terry".into(),
            last_name: Some("Ham".into()),
            username: Some("kf3_rry".into()),
            ..Default::default()
        };
        assert_eq!(user.describe(), "@kf3\\_rry (Terry Ham)");
        assert_eq!(user.mention(), "@kf3\\_rry");

        let anonymous = User {
            id: 2,
            first_name: "Sam".into(),
            ..Default::default()
        };
        assert_eq!(anonymous.describe(), "Sam");
        assert_eq!(anonymous.mention(), "Sam");
    }

    #[test]
    fn test_media_file_id_prefers_largest_photo() {
        let msg: Message = serde_json::from_str(
            r#"{
                "message_id": 1,
                "chat": {"id": 1, "type": "private"},
                "photo": [{"file_id": "small"}, {"file_id": "large"}]
            }"#,
        )
        .unwrap();
        assert_eq!(msg.media_file_id(), Some(("photo", "large")));
    }
}
