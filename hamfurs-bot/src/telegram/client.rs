use super::{ChatAction, ChatApi, Chat, Media, TelegramError, TextMessage, Update, User};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::json;
use std::time::Duration;

/// Extra time on top of the long-poll timeout before the HTTP call gives up.
const POLL_GRACE: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct ApiResponse<R> {
    ok: bool,
    result: Option<R>,
    description: Option<String>,
}

#[derive(Serialize, Debug)]
struct ForceReply {
    force_reply: bool,
    selective: bool,
}

#[derive(Serialize, Debug)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<ForceReply>,
}

#[derive(Serialize, Debug)]
struct EditMessageTextRequest<'a> {
    chat_id: i64,
    message_id: i64,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    parse_mode: Option<&'static str>,
    disable_web_page_preview: bool,
}

#[derive(Deserialize, Debug)]
struct SentMessage {
    message_id: i64,
}

#[derive(Deserialize, Debug)]
struct ChatMember {
    user: User,
}

pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self, TelegramError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    async fn call<P, R>(&self, method: &str, params: &P, timeout: Option<Duration>) -> Result<R, TelegramError>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, method);
        let mut request = self.client.post(&url).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // Errors come back as 4xx with an `ok: false` body, so parse regardless of status
        let response: ApiResponse<R> = request.send().await?.json().await?;
        if !response.ok {
            return Err(TelegramError::Api {
                method: method.to_string(),
                description: response.description.unwrap_or_default(),
            });
        }
        response.result.ok_or_else(|| TelegramError::Api {
            method: method.to_string(),
            description: "response carried no result".to_string(),
        })
    }

    /// Long-poll for updates starting at `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, TelegramError> {
        let params = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message", "edited_message"],
        });
        self.call("getUpdates", &params, Some(Duration::from_secs(timeout_secs) + POLL_GRACE))
            .await
    }
}

fn parse_mode(message: &TextMessage) -> Option<&'static str> {
    message.markdown.then_some("Markdown")
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn send_text(&self, chat_id: i64, message: &TextMessage) -> Result<i64, TelegramError> {
        let request = SendMessageRequest {
            chat_id,
            text: &message.text,
            parse_mode: parse_mode(message),
            disable_web_page_preview: message.disable_preview,
            reply_to_message_id: message.reply_to,
            reply_markup: message.force_reply.then_some(ForceReply {
                force_reply: true,
                selective: true,
            }),
        };
        let sent: SentMessage = self.call("sendMessage", &request, None).await?;
        Ok(sent.message_id)
    }

    async fn edit_text(
        &self,
        chat_id: i64,
        message_id: i64,
        message: &TextMessage,
    ) -> Result<(), TelegramError> {
        let request = EditMessageTextRequest {
            chat_id,
            message_id,
            text: &message.text,
            parse_mode: parse_mode(message),
            disable_web_page_preview: message.disable_preview,
        };
        // Result is either the edited message or `true`; only success matters
        let _: serde_json::Value = self.call("editMessageText", &request, None).await?;
        Ok(())
    }

    async fn send_media(
        &self,
        chat_id: i64,
        media: &Media,
        reply_to: Option<i64>,
    ) -> Result<i64, TelegramError> {
        let (method, field) = media.kind.method();
        let mut params = json!({ "chat_id": chat_id });
        params[field] = json!(media.file);
        if let Some(reply_to) = reply_to {
            params["reply_to_message_id"] = json!(reply_to);
        }
        let sent: SentMessage = self.call(method, &params, None).await?;
        Ok(sent.message_id)
    }

    async fn send_chat_action(&self, chat_id: i64, action: ChatAction) -> Result<(), TelegramError> {
        let params = json!({ "chat_id": chat_id, "action": action.as_str() });
        let _: bool = self.call("sendChatAction", &params, None).await?;
        Ok(())
    }

    async fn get_chat(&self, chat_id: i64) -> Result<Chat, TelegramError> {
        self.call("getChat", &json!({ "chat_id": chat_id }), None).await
    }

    async fn administrator_ids(&self, chat_id: i64) -> Result<Vec<i64>, TelegramError> {
        let members: Vec<ChatMember> = self
            .call("getChatAdministrators", &json!({ "chat_id": chat_id }), None)
            .await?;
        Ok(members.into_iter().map(|m| m.user.id).collect())
    }
}
