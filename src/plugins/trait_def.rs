//! Cog and extension definitions

use crate::application::bot::Bot;
use crate::application::context::Context;
use crate::application::errors::{CommandError, ExtensionError};
use crate::domain::entities::{Command, Message};
use crate::plugins::manager::CogRegistry;
use async_trait::async_trait;
use std::sync::Arc;

/// Events delivered to every registered cog
pub enum BotEvent<'a> {
    /// Setup finished and the bot is polling
    Ready,
    /// Any message, before command processing
    Message(&'a Message),
    /// A command passed its checks and is about to run
    CommandInvoked(&'a Context),
    /// A command finished without error
    CommandCompleted(&'a Context),
    /// Parsing, checks or the command itself failed
    CommandError(&'a Context, &'a CommandError),
}

/// A group of commands and listeners registered by an extension
#[async_trait]
pub trait Cog: Send + Sync {
    /// Unique name, also the help category
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        "No description provided."
    }

    fn emoji(&self) -> Option<&str> {
        None
    }

    /// Hidden cogs are left out of help for non-admins
    fn hidden(&self) -> bool {
        false
    }

    /// Commands this cog answers to
    fn commands(&self) -> Vec<Command> {
        Vec::new()
    }

    /// Gate applied before any of this cog's commands run
    async fn cog_check(&self, _ctx: &Context) -> Result<bool, CommandError> {
        Ok(true)
    }

    /// Run the command called `name`
    async fn invoke(&self, name: &str, _ctx: &mut Context) -> Result<(), CommandError> {
        Err(CommandError::NotFound(name.to_string()))
    }

    async fn on_event(&self, _bot: &Arc<Bot>, _event: &BotEvent<'_>) {}

    /// Called when the cog is removed from the registry
    fn cog_unload(&self) {}
}

/// Registration entry point of an extension
pub type SetupFn = fn(&mut CogRegistry) -> Result<(), ExtensionError>;

/// A catalog entry: one loadable extension module
#[derive(Clone)]
pub struct ExtensionEntry {
    /// Qualified identifier, e.g. `cogs.developer`
    pub name: String,
    pub setup: Option<SetupFn>,
    /// Inert module, skipped at startup
    pub ignore: bool,
}

impl ExtensionEntry {
    pub fn new(name: impl Into<String>, setup: SetupFn) -> Self {
        Self {
            name: name.into(),
            setup: Some(setup),
            ignore: false,
        }
    }

    /// An entry that has no setup function
    pub fn without_setup(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            setup: None,
            ignore: false,
        }
    }

    pub fn ignored(mut self) -> Self {
        self.ignore = true;
        self
    }

    /// Name with the namespace prefix removed
    pub fn short_name(&self) -> &str {
        self.name
            .split_once('.')
            .map(|(_, rest)| rest)
            .unwrap_or(&self.name)
    }
}

impl std::fmt::Debug for ExtensionEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionEntry")
            .field("name", &self.name)
            .field("has_setup", &self.setup.is_some())
            .field("ignore", &self.ignore)
            .finish()
    }
}
