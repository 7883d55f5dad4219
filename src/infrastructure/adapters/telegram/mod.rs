//! Telegram adapter
//!
//! Long polls the Bot HTTP API. Group chats stand in for guilds and the
//! bot's command menu (`setMyCommands`) stands in for app commands.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use crate::application::errors::BotError;
use crate::domain::entities::{self, AppCommand, Channel, ChannelKind, CommandScope, Event};
use crate::domain::traits::{BotInfo, ChatClient};

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Long poll timeout in seconds
const POLL_TIMEOUT: i64 = 30;

/// Longest text Telegram accepts in one message
const MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub date: i64,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotCommand {
    pub command: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
struct ChatMember {
    status: String,
    user: User,
}

/// Envelope around every API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: RwLock<BotInfo>,
    offset: AtomicI64,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: RwLock::new(BotInfo {
                id: "unknown".to_string(),
                name: "cogbot".to_string(),
                username: "cogbot".to_string(),
                platform: "telegram".to_string(),
            }),
            offset: AtomicI64::new(0),
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    /// Call an API method and unwrap the response envelope
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, BotError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let status = response.status();
        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(format!("{}: {}", method, e)))?;

        if !data.ok {
            let description = data
                .description
                .unwrap_or_else(|| format!("Telegram API error: {}", status));
            return Err(match status {
                StatusCode::UNAUTHORIZED => BotError::Auth(description),
                StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST if description.contains("not found") => {
                    BotError::NotFound(description)
                }
                _ => BotError::Platform(format!("{}: {}", method, description)),
            });
        }

        data.result
            .ok_or_else(|| BotError::Parse(format!("{}: response without result", method)))
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&self) -> Result<BotInfo, BotError> {
        let me: User = self.call("getMe", &json!({})).await?;
        let info = BotInfo {
            id: me.id.to_string(),
            name: me.first_name.unwrap_or_else(|| "cogbot".to_string()),
            username: me.username.unwrap_or_default(),
            platform: "telegram".to_string(),
        };

        if let Ok(mut current) = self.info.write() {
            *current = info.clone();
        }
        Ok(info)
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        self.call(
            "getUpdates",
            &json!({
                "offset": offset,
                "timeout": timeout,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update]) -> Option<i64> {
        updates.iter().map(|u| u.update_id + 1).max()
    }

    /// Send a message with specific parse mode
    async fn send_with_format(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<&str>,
        reply_to: Option<&str>,
    ) -> Result<String, BotError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        if let Some(message_id) = reply_to.and_then(|id| id.parse::<i64>().ok()) {
            body["reply_parameters"] = json!({
                "message_id": message_id,
                "allow_sending_without_reply": true,
            });
        }

        let sent: Message = self.call("sendMessage", &body).await?;
        Ok(sent.message_id.to_string())
    }

    /// Send with Markdown, falling back to plain text when Telegram rejects
    /// the markup
    async fn send_text(&self, chat_id: &str, text: &str, reply_to: Option<&str>) -> Result<String, BotError> {
        match self.send_with_format(chat_id, text, Some("Markdown"), reply_to).await {
            Ok(id) => Ok(id),
            Err(BotError::Platform(e)) => {
                tracing::warn!("Markdown failed, using plain text: {}", e);
                self.send_with_format(chat_id, text, None, reply_to).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Telegram `BotCommandScope` for a scope
pub fn scope_json(scope: &CommandScope) -> serde_json::Value {
    match scope {
        CommandScope::Global => json!({ "type": "default" }),
        CommandScope::Guild(chat_id) => json!({ "type": "chat", "chat_id": chat_id }),
    }
}

/// Telegram command names are 1-32 chars of `a-z`, `0-9` and `_`
pub fn command_name(name: &str) -> Option<String> {
    let name: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect();
    let valid = !name.is_empty()
        && name.len() <= 32
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    valid.then_some(name)
}

/// First characters of a token, safe to log
fn token_preview(token: &str) -> String {
    token.chars().take(8).collect()
}

fn channel_kind(kind: &str) -> ChannelKind {
    match kind {
        "private" => ChannelKind::Private,
        "group" | "supergroup" | "channel" => ChannelKind::Text,
        other => ChannelKind::Other(other.to_string()),
    }
}

impl From<User> for entities::User {
    fn from(user: User) -> Self {
        let mut converted = entities::User::new(user.id.to_string());
        converted.username = user.username;
        converted.first_name = user.first_name;
        converted.last_name = user.last_name;
        converted.is_bot = user.is_bot;
        converted
    }
}

/// Convert a Telegram text message. Messages without text or sender are dropped.
pub fn convert_message(message: Message) -> Option<entities::Message> {
    let text = message.text?;
    let author: entities::User = message.from?.into();
    let chat_id = message.chat.id.to_string();

    let mut converted = entities::Message::new(chat_id.clone(), author, text)
        .with_id(message.message_id.to_string())
        .with_platform("telegram");
    if let Some(ts) = chrono::DateTime::from_timestamp(message.date, 0) {
        converted.timestamp = ts;
    }
    if matches!(message.chat.kind.as_str(), "group" | "supergroup") {
        converted = converted.in_guild(chat_id);
    }
    Some(converted)
}

#[async_trait]
impl ChatClient for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {}...)", token_preview(&self.token));
        let info = self.fetch_bot_info().await?;
        tracing::info!("Authenticated as @{} ({})", info.username, info.id);
        Ok(())
    }

    async fn poll_events(&self) -> Result<Vec<Event>, BotError> {
        let updates = self
            .get_updates(self.offset.load(Ordering::SeqCst), POLL_TIMEOUT)
            .await?;
        if let Some(next) = Self::get_next_offset(&updates) {
            self.offset.store(next, Ordering::SeqCst);
        }

        Ok(updates
            .into_iter()
            .filter_map(|u| u.message)
            .filter_map(convert_message)
            .map(Event::Message)
            .collect())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        tracing::debug!("Sending to {}: {}", chat_id, text);
        self.send_text(chat_id, text, None).await
    }

    async fn reply(&self, message: &entities::Message, text: &str) -> Result<String, BotError> {
        self.send_text(&message.channel_id, text, Some(&message.id)).await
    }

    async fn edit_message(&self, chat_id: &str, message_id: &str, text: &str) -> Result<(), BotError> {
        let message_id: i64 = message_id
            .parse()
            .map_err(|_| BotError::Parse(format!("invalid message id {}", message_id)))?;
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &json!({ "chat_id": chat_id, "message_id": message_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    async fn add_reaction(&self, chat_id: &str, message_id: &str, emoji: &str) -> Result<(), BotError> {
        let message_id: i64 = message_id
            .parse()
            .map_err(|_| BotError::Parse(format!("invalid message id {}", message_id)))?;
        let _: bool = self
            .call(
                "setMessageReaction",
                &json!({
                    "chat_id": chat_id,
                    "message_id": message_id,
                    "reaction": [{ "type": "emoji", "emoji": emoji }],
                }),
            )
            .await?;
        Ok(())
    }

    async fn fetch_channel(&self, chat_id: &str) -> Result<Channel, BotError> {
        let chat: Chat = self.call("getChat", &json!({ "chat_id": chat_id })).await?;
        Ok(Channel {
            id: chat.id.to_string(),
            name: chat.title.or(chat.username),
            kind: channel_kind(&chat.kind),
        })
    }

    async fn fetch_guild_owner(&self, guild_id: &str) -> Result<Option<String>, BotError> {
        let admins: Vec<ChatMember> = self
            .call("getChatAdministrators", &json!({ "chat_id": guild_id }))
            .await?;
        Ok(admins
            .into_iter()
            .find(|member| member.status == "creator")
            .map(|member| member.user.id.to_string()))
    }

    async fn fetch_app_commands(&self, scope: &CommandScope) -> Result<Vec<AppCommand>, BotError> {
        let commands: Vec<BotCommand> = self
            .call("getMyCommands", &json!({ "scope": scope_json(scope) }))
            .await?;
        Ok(commands
            .into_iter()
            .map(|c| AppCommand::new(c.command, c.description))
            .collect())
    }

    async fn set_app_commands(
        &self,
        scope: &CommandScope,
        commands: &[AppCommand],
    ) -> Result<Vec<AppCommand>, BotError> {
        if commands.is_empty() {
            let _: bool = self
                .call("deleteMyCommands", &json!({ "scope": scope_json(scope) }))
                .await?;
            return Ok(Vec::new());
        }

        let mut published = Vec::with_capacity(commands.len());
        for command in commands {
            match command_name(&command.name) {
                Some(name) => published.push(BotCommand {
                    command: name,
                    description: command.description.chars().take(256).collect(),
                }),
                None => tracing::warn!("Skipping command '{}': not a valid Telegram command name", command.name),
            }
        }

        let _: bool = self
            .call(
                "setMyCommands",
                &json!({ "commands": published, "scope": scope_json(scope) }),
            )
            .await?;
        tracing::info!("Registered {} bot commands with Telegram {}", published.len(), scope);

        Ok(published
            .into_iter()
            .map(|c| AppCommand::new(c.command, c.description))
            .collect())
    }

    async fn close(&self) -> Result<(), BotError> {
        tracing::info!("Telegram adapter closed");
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info
            .read()
            .map(|info| info.clone())
            .unwrap_or_default()
    }

    fn native_prefix(&self) -> Option<&str> {
        Some("/")
    }

    fn max_message_length(&self) -> usize {
        MAX_MESSAGE_LENGTH
    }

    fn invite_url(&self) -> Option<String> {
        let username = self.bot_info().username;
        (!username.is_empty()).then(|| format!("https://t.me/{}?startgroup=true", username))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_preview_counts_characters() {
        assert_eq!(token_preview("123456789:ABCdef"), "12345678");
        assert_eq!(token_preview("abc"), "abc");
        assert_eq!(token_preview("ééééééééé:x"), "éééééééé");
    }

    fn tg_message(chat_kind: &str, text: Option<&str>) -> Message {
        Message {
            message_id: 7,
            from: Some(User {
                id: 42,
                is_bot: false,
                username: Some("ada".to_string()),
                first_name: Some("Ada".to_string()),
                last_name: None,
            }),
            chat: Chat {
                id: -100,
                kind: chat_kind.to_string(),
                title: Some("devs".to_string()),
                username: None,
            },
            date: 1_700_000_000,
            text: text.map(str::to_string),
        }
    }

    #[test]
    fn test_group_messages_carry_guild_id() {
        let message = convert_message(tg_message("supergroup", Some("!help"))).unwrap();
        assert_eq!(message.guild_id.as_deref(), Some("-100"));
        assert_eq!(message.channel_id, "-100");
        assert_eq!(message.id, "7");
        assert_eq!(message.author.handle(), "@ada");
        assert_eq!(message.platform, "telegram");

        let private = convert_message(tg_message("private", Some("!help"))).unwrap();
        assert!(private.guild_id.is_none());
    }

    #[test]
    fn test_messages_without_text_are_dropped() {
        assert!(convert_message(tg_message("private", None)).is_none());
    }

    #[test]
    fn test_command_names_are_normalized() {
        assert_eq!(command_name("generate-invite").as_deref(), Some("generate_invite"));
        assert_eq!(command_name("Sync").as_deref(), Some("sync"));
        assert!(command_name("").is_none());
        assert!(command_name("héllo").is_none());
    }

    #[test]
    fn test_scope_json() {
        assert_eq!(scope_json(&CommandScope::Global), json!({ "type": "default" }));
        assert_eq!(
            scope_json(&CommandScope::Guild("-100".to_string())),
            json!({ "type": "chat", "chat_id": "-100" })
        );
    }

    #[test]
    fn test_next_offset() {
        let updates = vec![
            Update { update_id: 3, message: None },
            Update { update_id: 9, message: None },
        ];
        assert_eq!(TelegramAdapter::get_next_offset(&updates), Some(10));
        assert_eq!(TelegramAdapter::get_next_offset(&[]), None);
    }
}
