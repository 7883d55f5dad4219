//! Per-invocation command context

use crate::application::bot::Bot;
use crate::application::errors::CommandError;
use crate::application::messaging::Invocation;
use crate::domain::entities::{Board, Command, Message, User};
use crate::utils::formatters::cleanup_code;
use crate::utils::iterables::slice_text;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

const SUCCESS_EMOJI: &str = "✅";
const FAILURE_EMOJI: &str = "❌";

/// Everything a command needs to know about how it was invoked
pub struct Context {
    pub bot: Arc<Bot>,
    pub message: Message,
    /// Prefix as typed, e.g. `!` or `@cogbot`
    pub prefix: String,
    /// Name the command was invoked with (may be an alias)
    pub invoked_with: String,
    /// Resolved command, `None` when nothing matched
    pub command: Option<Command>,
    pub args: Vec<String>,
    /// Raw text after the command name
    pub rest: String,
    /// Message content with code fences removed
    pub cleaned_up_code: String,
}

impl Context {
    pub fn new(bot: Arc<Bot>, message: Message, invocation: Invocation) -> Self {
        let cleaned_up_code = cleanup_code(&invocation.rest);
        Self {
            bot,
            message,
            prefix: invocation.prefix,
            invoked_with: invocation.name,
            command: None,
            args: invocation.args,
            rest: invocation.rest,
            cleaned_up_code,
        }
    }

    /// Prefix in the form a user would type it, with a trailing space after
    /// mentions
    pub fn clean_prefix(&self) -> String {
        if self.prefix.starts_with('@') {
            format!("{} ", self.prefix)
        } else {
            self.prefix.clone()
        }
    }

    pub fn author(&self) -> &User {
        &self.message.author
    }

    pub fn channel_id(&self) -> &str {
        &self.message.channel_id
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.message.guild_id.as_deref()
    }

    /// Name of the resolved command, or what was typed
    pub fn command_name(&self) -> &str {
        self.command
            .as_ref()
            .map(|c| c.name.as_str())
            .unwrap_or(&self.invoked_with)
    }

    /// Required positional argument
    pub fn arg(&self, index: usize, name: &str, kind: &str) -> Result<&str, CommandError> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CommandError::missing(name, kind))
    }

    /// Required positional argument parsed into `T`
    pub fn parse_arg<T>(&self, index: usize, name: &str, kind: &str) -> Result<T, CommandError>
    where
        T: std::str::FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.arg(index, name, kind)?;
        raw.parse()
            .map_err(|e| CommandError::InvalidArgs(format!("`{}` is not a valid {}: {}", raw, kind, e)))
    }

    /// Send to the invoking chat, split into several messages when needed.
    /// Returns the id of the last message sent.
    pub async fn send(&self, text: &str) -> Result<String, CommandError> {
        let client = self.bot.client();
        let mut last = String::new();
        for chunk in slice_text(text, client.max_message_length()) {
            last = client.send_message(self.channel_id(), &chunk).await?;
        }
        Ok(last)
    }

    /// Reply to the invoking message
    pub async fn reply(&self, text: &str) -> Result<String, CommandError> {
        let client = self.bot.client();
        let mut chunks = slice_text(text, client.max_message_length()).into_iter();
        let mut last = match chunks.next() {
            Some(first) => client.reply(&self.message, &first).await?,
            None => return Ok(String::new()),
        };
        for chunk in chunks {
            last = client.send_message(self.channel_id(), &chunk).await?;
        }
        Ok(last)
    }

    /// Edit a message the bot sent in this chat
    pub async fn edit(&self, message_id: &str, text: &str) -> Result<(), CommandError> {
        self.bot
            .client()
            .edit_message(self.channel_id(), message_id, text)
            .await?;
        Ok(())
    }

    /// Add a reaction to the invoking message
    pub async fn react(&self, emoji: &str) -> Result<(), CommandError> {
        self.bot
            .client()
            .add_reaction(self.channel_id(), &self.message.id, emoji)
            .await?;
        Ok(())
    }

    pub async fn success(&self) -> Result<(), CommandError> {
        self.react(SUCCESS_EMOJI).await
    }

    pub async fn yes(&self) -> Result<(), CommandError> {
        self.success().await
    }

    pub async fn tick(&self) -> Result<(), CommandError> {
        self.success().await
    }

    pub async fn failure(&self) -> Result<(), CommandError> {
        self.react(FAILURE_EMOJI).await
    }

    pub async fn no(&self) -> Result<(), CommandError> {
        self.failure().await
    }

    pub async fn cross(&self) -> Result<(), CommandError> {
        self.failure().await
    }

    /// Start a board, the text stand-in for an embed
    pub fn create_board(
        &self,
        title: Option<&str>,
        description: Option<&str>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Board {
        let mut board = Board::new();
        if let Some(title) = title {
            board = board.title(title);
        }
        if let Some(description) = description {
            board = board.description(description);
        }
        if let Some(timestamp) = timestamp {
            board = board.timestamp(timestamp);
        }
        board
    }

    pub async fn send_board(&self, board: &Board) -> Result<String, CommandError> {
        self.send(&board.render()).await
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("message", &self.message.id)
            .field("prefix", &self.prefix)
            .field("invoked_with", &self.invoked_with)
            .field("args", &self.args)
            .finish()
    }
}
