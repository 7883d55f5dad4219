//! The bot: composes a platform client with cogs, config and storage

use crate::application::command_tree::CommandTree;
use crate::application::errors::{BotError, StorageError};
use crate::application::messaging::MessageParser;
use crate::application::services::{command_service, help::Help};
use crate::domain::entities::{AppCommand, Channel, CommandScope, Event, Message};
use crate::domain::traits::{BotInfo, ChatClient};
use crate::infrastructure::config::Config;
use crate::infrastructure::database::Database;
use crate::plugins::{BotEvent, CogRegistry, ExtensionEntry, ExtensionLoader, ExtensionManager, LoadReport};
use crate::utils::console::{mprint, print_versions};
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// How long in-flight commands get to finish once shutdown starts
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Pause before polling again after a failed poll
const POLL_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Why the run loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Stop,
    Restart,
}

pub struct Bot {
    config: Config,
    client: Arc<dyn ChatClient>,
    tree: CommandTree,
    extensions: RwLock<ExtensionManager>,
    database: Mutex<Option<Database>>,
    uptime: RwLock<Option<DateTime<Utc>>>,
    log_channel: RwLock<Option<Channel>>,
    shutdown: watch::Sender<Option<Shutdown>>,
}

impl Bot {
    /// Create a bot over `client`. `catalog` holds the discovered extension
    /// entries; nothing is loaded until [`setup_hook`](Self::setup_hook).
    pub fn new(config: Config, client: Arc<dyn ChatClient>, catalog: Vec<ExtensionEntry>) -> Result<Self, BotError> {
        let mut builtins = CogRegistry::new();
        builtins.add_cog(Help)?;

        let extensions = ExtensionManager::new(config.extensions.namespace.clone(), catalog, builtins);
        let (shutdown, _) = watch::channel(None);

        Ok(Self {
            config,
            client,
            tree: CommandTree::new(),
            extensions: RwLock::new(extensions),
            database: Mutex::new(None),
            uptime: RwLock::new(None),
            log_channel: RwLock::new(None),
            shutdown,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn ChatClient> {
        &self.client
    }

    pub fn bot_info(&self) -> BotInfo {
        self.client.bot_info()
    }

    pub fn tree(&self) -> &CommandTree {
        &self.tree
    }

    /// When setup started, `None` before that
    pub fn uptime(&self) -> Option<DateTime<Utc>> {
        self.uptime.read().ok().and_then(|u| *u)
    }

    pub fn log_channel(&self) -> Option<Channel> {
        self.log_channel.read().ok().and_then(|c| c.clone())
    }

    // ---- extensions ----

    /// Run `f` with exclusive access to the extension manager
    pub fn with_extensions<R>(&self, f: impl FnOnce(&mut ExtensionManager) -> R) -> Result<R, BotError> {
        let mut manager = self
            .extensions
            .write()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?;
        Ok(f(&mut manager))
    }

    /// Snapshot of the registered cogs and commands
    pub fn registry(&self) -> Result<CogRegistry, BotError> {
        self.extensions
            .read()
            .map(|m| m.registry().clone())
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))
    }

    /// `developer` becomes `cogs.developer`
    pub fn qualify_extension(&self, name: &str) -> Result<String, BotError> {
        self.extensions
            .read()
            .map(|m| m.qualify(name))
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))
    }

    pub fn load_extension(&self, name: &str) -> Result<(), BotError> {
        self.with_extensions(|m| m.load(name))??;
        Ok(())
    }

    pub fn unload_extension(&self, name: &str) -> Result<(), BotError> {
        self.with_extensions(|m| m.unload(name))??;
        Ok(())
    }

    pub fn reload_extension(&self, name: &str) -> Result<(), BotError> {
        self.with_extensions(|m| m.reload(name))??;
        Ok(())
    }

    pub fn loaded_extensions(&self) -> Vec<String> {
        self.extensions
            .read()
            .map(|m| m.loaded())
            .unwrap_or_default()
    }

    /// Load every catalog entry not excluded by config and log the summary
    pub fn load_all_extensions(&self) -> Result<LoadReport, BotError> {
        let loader = ExtensionLoader::new(
            self.config.extensions.namespace.clone(),
            &self.config.extensions.exclude,
        );
        let report = self.with_extensions(|m| {
            let entries = m.catalog().to_vec();
            loader.load_all(m, &entries)
        })?;
        report.log(&self.config.bot.name);
        Ok(report)
    }

    // ---- app commands ----

    /// App command definitions for every registered slash command
    pub fn app_commands(&self) -> Result<Vec<AppCommand>, BotError> {
        Ok(self
            .registry()?
            .commands()
            .all()
            .filter(|c| c.slash)
            .map(AppCommand::from)
            .collect())
    }

    pub async fn sync_commands(&self, scope: &CommandScope) -> Result<Vec<AppCommand>, BotError> {
        let global = self.app_commands()?;
        self.tree.sync(self.client.as_ref(), &global, scope).await
    }

    /// Mention an app command like a user or channel mention
    pub fn slash_mention(&self, qualified_name: &str) -> String {
        self.tree.slash_mention(qualified_name)
    }

    // ---- database ----

    pub fn connect_db(&self) -> Result<(), StorageError> {
        let mut database = self.database.lock().map_err(|_| StorageError::Poisoned)?;
        if database.is_some() {
            warn!("tried to connect to database while already connected");
            return Ok(());
        }

        let db = Database::new(&self.config.database.path)?;
        match db.enable_wal_mode() {
            Ok(mode) => debug!("SQLite journal mode set to {}", mode),
            Err(e) => warn!("error setting WAL mode: {}", e),
        }
        *database = Some(db);
        info!("connected to database");
        Ok(())
    }

    pub fn disconnect_db(&self) -> Result<(), StorageError> {
        let mut database = self.database.lock().map_err(|_| StorageError::Poisoned)?;
        if database.take().is_none() {
            warn!("tried to disconnect from database while already disconnected");
            return Ok(());
        }
        info!("disconnected from database");
        Ok(())
    }

    /// Run `f` against the open database
    pub fn with_db<R>(&self, f: impl FnOnce(&Database) -> rusqlite::Result<R>) -> Result<R, StorageError> {
        let database = self.database.lock().map_err(|_| StorageError::Poisoned)?;
        let db = database.as_ref().ok_or(StorageError::NotConnected)?;
        Ok(f(db)?)
    }

    // ---- lifecycle ----

    fn print_banner(&self) {
        mprint("");
        mprint(&format!(
            "{} {} {}",
            "~".white(),
            self.config.bot.name.to_uppercase().bold().green(),
            "~".white()
        ));
        mprint(&format!(
            "{} {} {}",
            "running".bright_green(),
            env!("CARGO_PKG_NAME").yellow(),
            env!("CARGO_PKG_VERSION").blue()
        ));
        mprint("");
        print_versions();
    }

    async fn setup_log_channel(&self) {
        let Some(channel_id) = self.config.logging.log_channel.clone() else {
            warn!("log channel not set because log channel id was not set");
            return;
        };

        info!("getting log channel with id {}", channel_id);
        let channel = match self.client.fetch_channel(&channel_id).await {
            Ok(channel) if channel.is_text() => Some(channel),
            Ok(_) => {
                error!("log channel with id {} is not a text channel, log_channel not set", channel_id);
                None
            }
            Err(e) => {
                error!("could not get log channel with id {} due to exception: {}", channel_id, e);
                None
            }
        };

        match &channel {
            Some(channel) => info!("log channel: {} (id: {})", channel.label(), channel.id),
            None => error!("log channel with id {} not found. this can cause problems.", channel_id),
        }
        if let Ok(mut slot) = self.log_channel.write() {
            *slot = channel;
        }
    }

    /// Post to the log channel. Returns `false` when none is set.
    pub async fn send_to_log_channel(&self, text: &str) -> Result<bool, BotError> {
        let Some(channel) = self.log_channel() else {
            return Ok(false);
        };
        self.client.send_message(&channel.id, text).await?;
        Ok(true)
    }

    /// Connect storage, load extensions, refresh the app command cache and
    /// set up the log channel
    pub async fn setup_hook(&self) -> Result<LoadReport, BotError> {
        if let Ok(mut uptime) = self.uptime.write() {
            *uptime = Some(Utc::now());
        }

        self.print_banner();
        self.connect_db()?;
        let report = self.load_all_extensions()?;

        match self.tree.update_app_commands(self.client.as_ref()).await {
            Ok(_) => info!("app commands loaded: {}", self.tree.len()),
            Err(e) => warn!("could not fetch app commands: {}", e),
        }

        let me = self.bot_info();
        info!("logged in successfully");
        info!("user: {} (@{}, id: {})", me.name, me.username, me.id);
        if let Some(invite) = self.client.invite_url() {
            info!("invite: {}", invite);
        }

        self.setup_log_channel().await;
        if let Err(e) = self
            .send_to_log_channel(&format!("*{}* logged in successfully", me.name))
            .await
        {
            error!("could not send log message to log channel due to exception: {}", e);
        }

        Ok(report)
    }

    /// Disconnect storage and the client
    pub async fn close(&self, abandon: bool) {
        if let Err(e) = self.disconnect_db() {
            error!("failed to disconnect from database: {}", e);
        }
        if let Err(e) = self.client.close().await {
            error!("failed to close client: {}", e);
        }

        if abandon {
            warn!("bot process exited (abandoned)");
        } else {
            warn!("bot process exited");
        }
    }

    /// Ask the run loop to stop
    pub fn request_shutdown(&self, kind: Shutdown) {
        self.shutdown.send_replace(Some(kind));
    }

    pub fn shutdown_requested(&self) -> Option<Shutdown> {
        *self.shutdown.borrow()
    }

    /// Prefix parser for the current client
    pub fn parser(&self) -> MessageParser {
        let mut parser = MessageParser::new(self.config.bot.default_prefix.clone());
        if self.config.bot.mention_is_also_prefix {
            parser = parser.with_mention(self.bot_info().username);
        }
        if let Some(native) = self.client.native_prefix() {
            parser = parser.with_prefix(native);
        }
        parser
    }

    /// Deliver an event to every registered cog
    pub async fn dispatch_event(self: &Arc<Self>, event: &BotEvent<'_>) {
        let cogs = match self.registry() {
            Ok(registry) => registry.cogs().to_vec(),
            Err(e) => {
                error!("could not dispatch event: {}", e);
                return;
            }
        };
        for cog in cogs {
            cog.on_event(self, event).await;
        }
    }

    /// Handle one incoming message: listeners first, then commands
    pub async fn handle_message(self: &Arc<Self>, message: Message) {
        self.dispatch_event(&BotEvent::Message(&message)).await;
        if message.author.is_bot {
            return;
        }
        command_service::process_commands(self, message).await;
    }

    /// Start the client, run setup, then handle events until shutdown
    pub async fn run(self: &Arc<Self>) -> Result<Shutdown, BotError> {
        self.client.start().await?;
        if let Err(e) = self.setup_hook().await {
            self.close(true).await;
            return Err(e);
        }
        self.dispatch_event(&BotEvent::Ready).await;

        let mut shutdown = self.shutdown.subscribe();
        let mut tasks = JoinSet::new();

        let outcome = loop {
            let requested = *shutdown.borrow_and_update();
            if let Some(kind) = requested {
                break kind;
            }

            tokio::select! {
                polled = self.client.poll_events() => match polled {
                    Ok(events) => {
                        for event in events {
                            match event {
                                Event::Message(message) => {
                                    let bot = Arc::clone(self);
                                    tasks.spawn(async move { bot.handle_message(message).await });
                                }
                                Event::Closed => {
                                    info!("client has no more events, shutting down");
                                    self.request_shutdown(Shutdown::Stop);
                                }
                            }
                        }
                    }
                    Err(BotError::Auth(e)) => {
                        error!("authentication failed: {}", e);
                        self.close(true).await;
                        return Err(BotError::Auth(e));
                    }
                    Err(e) => {
                        warn!("failed to poll events: {}", e);
                        tokio::select! {
                            _ = tokio::time::sleep(POLL_RETRY_DELAY) => {}
                            _ = shutdown.changed() => {}
                            _ = tokio::signal::ctrl_c() => {
                                warn!("received Ctrl+C, shutting down");
                                self.request_shutdown(Shutdown::Stop);
                            }
                        }
                    }
                },
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = joined {
                        error!("message handler panicked: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break Shutdown::Stop;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    warn!("received Ctrl+C, shutting down");
                    break Shutdown::Stop;
                }
            }
        };

        let drained = tokio::time::timeout(DRAIN_TIMEOUT, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            warn!("abandoning {} running command(s)", tasks.len());
            tasks.abort_all();
        }

        self.close(false).await;
        Ok(outcome)
    }
}
