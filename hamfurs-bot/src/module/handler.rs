///! Routes inbound chat messages to the command implementations.
use crate::module::alias::AliasStore;
use crate::module::callbook::pipeline::is_ignored;
use crate::module::callbook::renderer::{render, render_error};
use crate::module::callbook::{CallbookPipeline, Resolution};
use crate::module::glossary::{self, Glossary, parse_definition};
use crate::module::greeter::Greeter;
use crate::module::media::{self, Canned};
use crate::module::rf_exposure;
use crate::reply::ReplyTracker;
use crate::telegram::{ChatAction, ChatApi, Message, TextMessage, Update, User};
use hamfurs_common::Callsign;
use regex::Regex;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, LazyLock};
use tokio::sync::Mutex;

static COMMAND_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*/([A-Za-z0-9_]+)(?:@\S+)?\s*(.*)$").expect("command regex is valid")
});

const LOOKUP_PROMPT: &str = "Please specify a valid callsign";
const REGISTER_PROMPT: &str = "OK, please specify a callsign to alias";
const DEFINE_PROMPT: &str = "Please enter a term to lookup";
const NO_TEMPLATE: &str = "Use /set_join_message to enable greeter functionality";

/// Commands that are re-run when the command message is edited.
const EDITABLE: &[&str] = &["lookup", "callsign", "define", "conditions", "band_conditions"];

/// Prompts remembered for replies, oldest evicted first.
const MAX_PROMPTS: usize = 256;

/// Split "/command@bot args" into the lowercase command and its arguments.
fn parse_command(content: &str) -> Option<(String, String)> {
    let caps = COMMAND_REGEX.captures(content)?;
    let command = caps.get(1).map_or("", |m| m.as_str()).to_lowercase();
    let args = caps.get(2).map_or("", |m| m.as_str()).to_string();
    Some((command, args))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    Lookup,
    Register,
    Define,
}

/// Force-reply prompts the bot has sent, keyed by (chat, prompt message).
#[derive(Default)]
struct PromptBook {
    pending: HashMap<(i64, i64), Prompt>,
    order: VecDeque<(i64, i64)>,
}

impl PromptBook {
    fn remember(&mut self, chat_id: i64, message_id: i64, prompt: Prompt) {
        let key = (chat_id, message_id);
        if self.pending.insert(key, prompt).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > MAX_PROMPTS {
            if let Some(oldest) = self.order.pop_front() {
                self.pending.remove(&oldest);
            }
        }
    }

    fn get(&self, chat_id: i64, message_id: i64) -> Option<Prompt> {
        self.pending.get(&(chat_id, message_id)).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct HandlerSettings {
    /// Chat addressed by greeter commands sent in private
    pub home_chat_id: Option<i64>,
    /// Handle treated as an administrator everywhere
    pub owner_username: Option<String>,
}

pub struct MessageHandler {
    api: Arc<dyn ChatApi>,
    pipeline: Arc<CallbookPipeline>,
    aliases: Arc<AliasStore>,
    glossary: Arc<Glossary>,
    greeter: Arc<Greeter>,
    replies: Arc<ReplyTracker>,
    settings: HandlerSettings,
    prompts: Mutex<PromptBook>,
}

impl MessageHandler {
    pub fn new(
        api: Arc<dyn ChatApi>,
        pipeline: Arc<CallbookPipeline>,
        aliases: Arc<AliasStore>,
        glossary: Arc<Glossary>,
        greeter: Arc<Greeter>,
        replies: Arc<ReplyTracker>,
        settings: HandlerSettings,
    ) -> Self {
        Self {
            api,
            pipeline,
            aliases,
            glossary,
            greeter,
            replies,
            settings,
            prompts: Mutex::new(PromptBook::default()),
        }
    }

    /// Handle one update. Failures are logged, never returned.
    pub async fn handle_update(&self, update: Update) {
        if let Some(msg) = update.message {
            self.handle_message(&msg, false).await;
        } else if let Some(msg) = update.edited_message {
            self.handle_message(&msg, true).await;
        }
    }

    async fn handle_message(&self, msg: &Message, edited: bool) {
        if let Some((kind, file_id)) = msg.media_file_id() {
            tracing::debug!("Got {} file ID: {} (message {})", kind, file_id, msg.message_id);
        }

        if !edited {
            if let Some(members) = msg.new_chat_members.as_deref().filter(|m| !m.is_empty()) {
                self.greet(msg.chat.id, members).await;
                return;
            }
        }

        let Some(text) = msg.text.as_deref() else {
            return;
        };

        if let Some(replied) = &msg.reply_to_message {
            let prompt = self.prompts.lock().await.get(msg.chat.id, replied.message_id);
            if let Some(prompt) = prompt {
                self.answer_prompt(prompt, msg, text, edited).await;
                return;
            }
        }

        if let Some((command, args)) = parse_command(text) {
            if edited && !EDITABLE.contains(&command.as_str()) {
                return;
            }
            self.router(msg, &command, args.trim()).await;
        }
    }

    /// Route commands to appropriate handlers
    async fn router(&self, msg: &Message, command: &str, args: &str) {
        let chat_id = msg.chat.id;
        match command {
            "lookup" | "callsign" => match args.split_whitespace().last() {
                Some(query) => self.process_lookup(chat_id, msg.message_id, query).await,
                None => self.prompt(msg, Prompt::Lookup, LOOKUP_PROMPT).await,
            },
            "register" => match args.split_whitespace().next() {
                Some(callsign) => self.register(msg, callsign).await,
                None => self.prompt(msg, Prompt::Register, REGISTER_PROMPT).await,
            },
            "define" => {
                if args.is_empty() {
                    self.prompt(msg, Prompt::Define, DEFINE_PROMPT).await;
                } else {
                    self.process_define(chat_id, msg.message_id, args).await;
                }
            }
            "add_definition" => self.add_definition(msg, args).await,
            "mpe" | "power_density" => self.power_density(chat_id, args).await,
            "conditions" | "band_conditions" => self.band_conditions(chat_id).await,
            "pinned_message" => self.pinned_message(chat_id).await,
            "set_join_message" => self.set_join_message(msg, args).await,
            "enable_join_message" => self.toggle_join_message(msg, true).await,
            "disable_join_message" => self.toggle_join_message(msg, false).await,
            "test_join_message" => self.test_join_message(msg).await,
            _ if media::is_media_command(command) => self.canned(msg, command, args).await,
            _ => tracing::debug!("Ignoring unknown command /{}", command),
        }
    }

    async fn answer_prompt(&self, prompt: Prompt, msg: &Message, text: &str, edited: bool) {
        let answer = text.trim();
        match prompt {
            Prompt::Lookup => self.process_lookup(msg.chat.id, msg.message_id, answer).await,
            Prompt::Define => self.process_define(msg.chat.id, msg.message_id, answer).await,
            Prompt::Register if !edited => self.register(msg, answer).await,
            Prompt::Register => {}
        }
    }

    async fn send(&self, chat_id: i64, message: TextMessage) {
        if let Err(e) = self.api.send_text(chat_id, &message).await {
            tracing::error!("Failed to send message to chat {}: {}", chat_id, e);
        }
    }

    async fn prompt(&self, msg: &Message, prompt: Prompt, text: &str) {
        let message = TextMessage::plain(text).reply_to(msg.message_id).force_reply();
        match self.api.send_text(msg.chat.id, &message).await {
            Ok(prompt_id) => self.prompts.lock().await.remember(msg.chat.id, prompt_id, prompt),
            Err(e) => tracing::error!("Failed to prompt in chat {}: {}", msg.chat.id, e),
        }
    }

    async fn process_lookup(&self, chat_id: i64, inbound_id: i64, query: &str) {
        if is_ignored(query) {
            return;
        }
        tracing::info!("Lookup: {}", query);

        if let Err(e) = self.api.send_chat_action(chat_id, ChatAction::Typing).await {
            tracing::error!("Chat action failed, stopping lookup: {}", e);
            return;
        }

        let reply = match self.pipeline.resolve(query).await {
            Resolution::Ignored => return,
            Resolution::Found(resolved) => render(&resolved),
            Resolution::Failed(e) => render_error(&e),
        };
        self.replies.deliver(self.api.as_ref(), chat_id, inbound_id, &reply).await;
    }

    async fn register(&self, msg: &Message, raw: &str) {
        let Some(from) = &msg.from else {
            return;
        };
        let callsign = match Callsign::parse(raw) {
            Ok(callsign) => callsign,
            Err(e) => {
                tracing::debug!("Rejected alias '{}': {}", raw, e);
                self.send(msg.chat.id, TextMessage::plain(LOOKUP_PROMPT)).await;
                return;
            }
        };

        let now = chrono::Utc::now().timestamp();
        match self.aliases.register(from, &callsign, now).await {
            Ok(registration) => {
                let text = format!("{} callsign alias for {}", registration.verb(), from.full_name());
                self.send(msg.chat.id, TextMessage::plain(text)).await;
            }
            Err(e) => tracing::error!("Failed to store alias for user {}: {}", from.id, e),
        }
    }

    async fn process_define(&self, chat_id: i64, inbound_id: i64, term: &str) {
        let reply = match self.glossary.lookup(term).await {
            Some(definition) => TextMessage::markdown(definition.render()).without_preview(),
            None => TextMessage::markdown(glossary::NOT_FOUND),
        };
        self.replies.deliver(self.api.as_ref(), chat_id, inbound_id, &reply).await;
    }

    async fn add_definition(&self, msg: &Message, entry: &str) {
        let Some(from) = &msg.from else {
            return;
        };
        let chat_id = msg.chat.id;
        let last_edit = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        let definition = match parse_definition(entry, &from.describe(), &last_edit) {
            Ok(definition) => definition,
            Err(e) => {
                self.send(chat_id, TextMessage::markdown(e.user_message())).await;
                return;
            }
        };

        // The entry is sent once as-is so broken Markdown is rejected by the API.
        let preview = TextMessage::markdown(definition.render()).without_preview();
        if let Err(e) = self.api.send_text(chat_id, &preview).await {
            tracing::info!("Rejected definition for '{}': {}", definition.term, e);
            self.send(chat_id, TextMessage::plain(glossary::BAD_MARKDOWN)).await;
            return;
        }

        match self.glossary.save(definition).await {
            Ok(_) => self.send(chat_id, TextMessage::plain("Added definition successfully")).await,
            Err(e) => tracing::error!("Failed to store definition: {}", e),
        }
    }

    async fn power_density(&self, chat_id: i64, args: &str) {
        let text = match rf_exposure::parse_args(args) {
            Ok(input) => match rf_exposure::calculate(&input, true) {
                Ok(estimate) => rf_exposure::render(&input, &estimate),
                Err(e) => format!("Error: {}", e),
            },
            Err(e) => e.to_string(),
        };
        self.send(chat_id, TextMessage::markdown(text)).await;
    }

    async fn band_conditions(&self, chat_id: i64) {
        if let Err(e) = self.api.send_chat_action(chat_id, ChatAction::UploadPhoto).await {
            tracing::warn!("Chat action failed: {}", e);
        }
        let photo = media::conditions_photo(chrono::Utc::now().timestamp());
        if let Err(e) = self.api.send_media(chat_id, &photo, None).await {
            tracing::warn!("Band conditions banner failed: {}", e);
            self.send(chat_id, TextMessage::plain(media::CONDITIONS_ERROR)).await;
        }
    }

    async fn pinned_message(&self, chat_id: i64) {
        let pinned = match self.api.get_chat(chat_id).await {
            Ok(chat) => chat.pinned_message,
            Err(e) => {
                tracing::error!("Failed to fetch chat {}: {}", chat_id, e);
                return;
            }
        };
        let reply = match pinned {
            Some(pinned) => {
                TextMessage::plain("Click to see the pinned message").reply_to(pinned.message_id)
            }
            None => TextMessage::plain("No pinned message has been set"),
        };
        self.send(chat_id, reply).await;
    }

    /// Chat configured by greeter commands: private chats address the home chat.
    fn greeter_chat(&self, msg: &Message) -> i64 {
        match self.settings.home_chat_id {
            Some(home) if msg.chat.is_private() => home,
            _ => msg.chat.id,
        }
    }

    async fn is_administrator(&self, user: &User, chat_id: i64) -> bool {
        let is_owner = match (&self.settings.owner_username, &user.username) {
            (Some(owner), Some(username)) => owner.eq_ignore_ascii_case(username),
            _ => false,
        };
        if is_owner {
            return true;
        }
        match self.api.administrator_ids(chat_id).await {
            Ok(ids) => ids.contains(&user.id),
            Err(e) => {
                tracing::warn!("Could not list administrators of {}: {}", chat_id, e);
                false
            }
        }
    }

    /// Greeter target chat when the sender administers it.
    async fn administered_chat(&self, msg: &Message) -> Option<i64> {
        let from = msg.from.as_ref()?;
        let target = self.greeter_chat(msg);
        if self.is_administrator(from, target).await {
            Some(target)
        } else {
            tracing::debug!("User {} is not an administrator of {}", from.id, target);
            None
        }
    }

    async fn set_join_message(&self, msg: &Message, text: &str) {
        let Some(target) = self.administered_chat(msg).await else {
            return;
        };
        if text.is_empty() {
            self.send(msg.chat.id, TextMessage::plain("Usage: /set_join_message <text>")).await;
            return;
        }
        match self.greeter.set_template(target, text).await {
            Ok(()) => self.send(msg.chat.id, TextMessage::plain("OK")).await,
            Err(e) => tracing::error!("Failed to store join message: {}", e),
        }
    }

    async fn toggle_join_message(&self, msg: &Message, enabled: bool) {
        let Some(target) = self.administered_chat(msg).await else {
            return;
        };
        let reply = match self.greeter.set_enabled(target, enabled).await {
            Ok(true) => "OK",
            Ok(false) if enabled => NO_TEMPLATE,
            Ok(false) => "OK",
            Err(e) => {
                tracing::error!("Failed to update greeter for {}: {}", target, e);
                return;
            }
        };
        self.send(msg.chat.id, TextMessage::plain(reply)).await;
    }

    async fn test_join_message(&self, msg: &Message) {
        let Some(from) = &msg.from else {
            return;
        };
        let target = self.greeter_chat(msg);
        let members = std::slice::from_ref(from);
        if let Some(text) = self.greeter.greeting(self.api.as_ref(), target, members).await {
            self.send(msg.chat.id, TextMessage::markdown(text).without_preview()).await;
        }
    }

    async fn greet(&self, chat_id: i64, members: &[User]) {
        if let Some(text) = self.greeter.greeting(self.api.as_ref(), chat_id, members).await {
            self.send(chat_id, TextMessage::markdown(text).without_preview()).await;
        }
    }

    async fn canned(&self, msg: &Message, command: &str, args: &str) {
        let chat_id = msg.chat.id;
        match media::for_command(command, args) {
            Some(Canned::Text { text, reply }) => {
                let mut message = TextMessage::plain(text);
                if reply {
                    message = message.reply_to(msg.message_id);
                }
                self.send(chat_id, message).await;
            }
            Some(Canned::Media { media, reply }) => {
                let reply_to = reply.then_some(msg.message_id);
                if let Err(e) = self.api.send_media(chat_id, &media, reply_to).await {
                    tracing::error!("Failed to send /{} media: {}", command, e);
                }
            }
            None => tracing::debug!("No canned reply for /{} {}", command, args),
        }
    }
}
