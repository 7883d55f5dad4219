use async_trait::async_trait;
use crate::application::errors::BotError;
use crate::domain::entities::{AppCommand, Channel, CommandScope, Event, Message};

/// Chat client trait - abstraction for messaging platform adapters
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Connect and authenticate
    async fn start(&self) -> Result<(), BotError>;

    /// Wait for the next batch of events
    async fn poll_events(&self) -> Result<Vec<Event>, BotError>;

    /// Send a message to a chat, returning the new message id
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError>;

    /// Send a message as a reply to `message`
    async fn reply(&self, message: &Message, text: &str) -> Result<String, BotError> {
        self.send_message(&message.channel_id, text).await
    }

    async fn edit_message(&self, chat_id: &str, message_id: &str, text: &str) -> Result<(), BotError>;

    async fn add_reaction(&self, chat_id: &str, message_id: &str, emoji: &str) -> Result<(), BotError>;

    async fn fetch_channel(&self, chat_id: &str) -> Result<Channel, BotError>;

    /// Id of the group owner, if the platform reports one
    async fn fetch_guild_owner(&self, guild_id: &str) -> Result<Option<String>, BotError>;

    /// App commands currently published for `scope`
    async fn fetch_app_commands(&self, scope: &CommandScope) -> Result<Vec<AppCommand>, BotError>;

    /// Replace the app commands published for `scope`. An empty list clears them.
    async fn set_app_commands(
        &self,
        scope: &CommandScope,
        commands: &[AppCommand],
    ) -> Result<Vec<AppCommand>, BotError>;

    /// Disconnect from the platform
    async fn close(&self) -> Result<(), BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;

    /// Prefix the platform uses for its own command menu (Telegram's `/`)
    fn native_prefix(&self) -> Option<&str> {
        None
    }

    fn max_message_length(&self) -> usize {
        2000
    }

    /// Link that adds the bot to a group
    fn invite_url(&self) -> Option<String> {
        None
    }
}

/// Bot information
#[derive(Debug, Clone, Default)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
    pub platform: String,
}
