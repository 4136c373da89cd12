//! In-memory doubles shared by the unit tests.

use crate::module::callbook::{CallbookRecord, CallbookSource, LookupError, Source};
use crate::telegram::{ChatAction, ChatApi, Chat, Media, Message, TelegramError, TextMessage, User};
use async_trait::async_trait;
use hamfurs_common::Callsign;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};

#[derive(Debug, Clone)]
pub enum Call {
    Text(i64, TextMessage),
    Edit(i64, i64, TextMessage),
    Media(i64, Media, Option<i64>),
    Action(i64, ChatAction),
}

/// `ChatApi` that records every call and hands out increasing message ids.
pub struct RecordingChat {
    next_id: AtomicI64,
    fail_edits: AtomicBool,
    calls: Mutex<Vec<Call>>,
    admins: Mutex<Vec<i64>>,
    chat_username: Mutex<Option<String>>,
    pinned: Mutex<Option<i64>>,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1000),
            fail_edits: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            admins: Mutex::new(Vec::new()),
            chat_username: Mutex::new(None),
            pinned: Mutex::new(None),
        }
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn set_admins(&self, ids: Vec<i64>) {
        *self.admins.lock().unwrap() = ids;
    }

    pub fn set_pinned(&self, username: Option<&str>, message_id: i64) {
        *self.chat_username.lock().unwrap() = username.map(str::to_string);
        *self.pinned.lock().unwrap() = Some(message_id);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<(i64, TextMessage)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Text(chat, msg) => Some((chat, msg)),
                _ => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.sent_texts().last().map(|(_, msg)| msg.text.clone())
    }

    pub fn edits(&self) -> Vec<(i64, i64, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Edit(chat, id, msg) => Some((chat, id, msg.text)),
                _ => None,
            })
            .collect()
    }

    pub fn media(&self) -> Vec<(i64, Media, Option<i64>)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Media(chat, media, reply_to) => Some((chat, media, reply_to)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn send_text(&self, chat_id: i64, message: &TextMessage) -> Result<i64, TelegramError> {
        self.record(Call::Text(chat_id, message.clone()));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn edit_text(&self, chat_id: i64, message_id: i64, message: &TextMessage) -> Result<(), TelegramError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(TelegramError::Api {
                method: "editMessageText".into(),
                description: "message to edit not found".into(),
            });
        }
        self.record(Call::Edit(chat_id, message_id, message.clone()));
        Ok(())
    }

    async fn send_media(&self, chat_id: i64, media: &Media, reply_to: Option<i64>) -> Result<i64, TelegramError> {
        self.record(Call::Media(chat_id, media.clone(), reply_to));
        Ok(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), TelegramError> {
        self.record(Call::Action(chat_id, action));
        Ok(())
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Chat, TelegramError> {
        let pinned = self.pinned.lock().unwrap().map(|message_id| {
            Box::new(Message {
                message_id,
                ..Default::default()
            })
        });
        Ok(Chat {
            id: chat_id,
            kind: "supergroup".into(),
            username: self.chat_username.lock().unwrap().clone(),
            pinned_message: pinned,
        })
    }

    async fn administrator_ids(&self, _chat_id: i64) -> Result<Vec<i64>, TelegramError> {
        Ok(self.admins.lock().unwrap().clone())
    }
}

pub fn user(id: i64, first: &str, username: Option<&str>) -> User {
    User {
        id,
        first_name: first.to_string(),
        username: username.map(str::to_string),
        ..Default::default()
    }
}

/// Inbound text message from `from` in `chat_id`.
pub fn text_message(chat_id: i64, message_id: i64, from: &User, text: &str) -> Message {
    Message {
        message_id,
        chat: Chat {
            id: chat_id,
            kind: if chat_id > 0 { "private".into() } else { "supergroup".into() },
            ..Default::default()
        },
        from: Some(from.clone()),
        text: Some(text.to_string()),
        ..Default::default()
    }
}

/// Callbook double answering from a fixed map.
pub struct StaticSource {
    source: Source,
    records: Mutex<HashMap<String, CallbookRecord>>,
    failure: Mutex<Option<LookupError>>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            records: Mutex::new(HashMap::new()),
            failure: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn insert(&self, callsign: &str, record: CallbookRecord) {
        self.records.lock().unwrap().insert(callsign.to_string(), record);
    }

    pub fn fail_with(&self, error: LookupError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CallbookSource for StaticSource {
    fn source(&self) -> Source {
        self.source
    }

    async fn lookup(&self, callsign: &Callsign) -> Result<Option<CallbookRecord>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.failure.lock().unwrap().clone() {
            return Err(error);
        }
        Ok(self.records.lock().unwrap().get(callsign.as_str()).cloned())
    }
}
