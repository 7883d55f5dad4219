//! Console adapter for development/testing
//!
//! Every line read from the input becomes a message from the local user in
//! the `console` chat, which counts as a group chat so guild-only commands
//! work. Everything the bot does is printed and kept in a transcript.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};

use crate::application::errors::BotError;
use crate::domain::entities::{AppCommand, Channel, ChannelKind, CommandScope, Event, Message, User};
use crate::domain::traits::{BotInfo, ChatClient};

/// Id of the only chat the console knows
pub const CONSOLE_CHAT: &str = "console";

type Input = Lines<Box<dyn AsyncBufRead + Unpin + Send>>;

/// Something the bot did, as recorded by the console adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleOutput {
    Sent { id: String, chat_id: String, text: String },
    Edited { id: String, text: String },
    Reacted { message_id: String, emoji: String },
}

/// Console bot adapter for local development
pub struct ConsoleAdapter {
    info: BotInfo,
    user: User,
    input: tokio::sync::Mutex<Input>,
    next_id: AtomicU64,
    transcript: Mutex<Vec<ConsoleOutput>>,
    app_commands: Mutex<HashMap<CommandScope, Vec<AppCommand>>>,
}

impl ConsoleAdapter {
    /// Read from stdin
    pub fn new(user_id: impl Into<String>) -> Self {
        Self::with_input(user_id, BufReader::new(tokio::io::stdin()))
    }

    /// Read lines from any reader
    pub fn with_input<R>(user_id: impl Into<String>, reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let reader: Box<dyn AsyncBufRead + Unpin + Send> = Box::new(reader);
        let user_id = user_id.into();
        Self {
            info: BotInfo {
                id: "0".to_string(),
                name: "cogbot".to_string(),
                username: "cogbot".to_string(),
                platform: "console".to_string(),
            },
            user: User::new(user_id.clone())
                .with_username(user_id)
                .with_name("Console", None::<String>),
            input: tokio::sync::Mutex::new(reader.lines()),
            next_id: AtomicU64::new(1),
            transcript: Mutex::new(Vec::new()),
            app_commands: Mutex::new(HashMap::new()),
        }
    }

    fn next_id(&self) -> String {
        self.next_id.fetch_add(1, Ordering::SeqCst).to_string()
    }

    fn record(&self, output: ConsoleOutput) {
        if let Ok(mut transcript) = self.transcript.lock() {
            transcript.push(output);
        }
    }

    /// Everything the bot has done so far
    pub fn transcript(&self) -> Vec<ConsoleOutput> {
        self.transcript
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Texts of sent messages, in order
    pub fn sent_texts(&self) -> Vec<String> {
        self.transcript()
            .into_iter()
            .filter_map(|output| match output {
                ConsoleOutput::Sent { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Build a message from the console user
    pub fn message(&self, content: impl Into<String>) -> Message {
        Message::new(CONSOLE_CHAT, self.user.clone(), content)
            .with_id(self.next_id())
            .in_guild(CONSOLE_CHAT)
            .with_platform("console")
    }
}

#[async_trait]
impl ChatClient for ConsoleAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting console bot (dev mode)");
        Ok(())
    }

    async fn poll_events(&self) -> Result<Vec<Event>, BotError> {
        let mut input = self.input.lock().await;
        match input.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => Ok(Vec::new()),
            Ok(Some(line)) => Ok(vec![Event::Message(self.message(line.trim_end()))]),
            Ok(None) => Ok(vec![Event::Closed]),
            Err(e) => Err(BotError::Platform(format!("failed to read console input: {}", e))),
        }
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        let id = self.next_id();
        println!("[BOT] {}", text);
        self.record(ConsoleOutput::Sent {
            id: id.clone(),
            chat_id: chat_id.to_string(),
            text: text.to_string(),
        });
        Ok(id)
    }

    async fn edit_message(&self, _chat_id: &str, message_id: &str, text: &str) -> Result<(), BotError> {
        println!("[BOT edited #{}] {}", message_id, text);
        self.record(ConsoleOutput::Edited {
            id: message_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn add_reaction(&self, _chat_id: &str, message_id: &str, emoji: &str) -> Result<(), BotError> {
        println!("[BOT reacted {} to #{}]", emoji, message_id);
        self.record(ConsoleOutput::Reacted {
            message_id: message_id.to_string(),
            emoji: emoji.to_string(),
        });
        Ok(())
    }

    async fn fetch_channel(&self, chat_id: &str) -> Result<Channel, BotError> {
        if chat_id != CONSOLE_CHAT {
            return Err(BotError::NotFound(format!("channel {}", chat_id)));
        }
        Ok(Channel {
            id: CONSOLE_CHAT.to_string(),
            name: Some(CONSOLE_CHAT.to_string()),
            kind: ChannelKind::Text,
        })
    }

    async fn fetch_guild_owner(&self, guild_id: &str) -> Result<Option<String>, BotError> {
        Ok((guild_id == CONSOLE_CHAT).then(|| self.user.id.clone()))
    }

    async fn fetch_app_commands(&self, scope: &CommandScope) -> Result<Vec<AppCommand>, BotError> {
        let commands = self
            .app_commands
            .lock()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?;
        Ok(commands.get(scope).cloned().unwrap_or_default())
    }

    async fn set_app_commands(
        &self,
        scope: &CommandScope,
        commands: &[AppCommand],
    ) -> Result<Vec<AppCommand>, BotError> {
        let published: Vec<AppCommand> = commands
            .iter()
            .map(|c| AppCommand {
                id: Some(self.next_id()),
                ..c.clone()
            })
            .collect();

        let mut stored = self
            .app_commands
            .lock()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?;
        stored.insert(scope.clone(), published.clone());
        Ok(published)
    }

    async fn close(&self) -> Result<(), BotError> {
        tracing::info!("Console adapter closed");
        Ok(())
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
