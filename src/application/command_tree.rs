//! App command tree - what the platform knows about our slash commands

use crate::application::errors::BotError;
use crate::domain::entities::{AppCommand, CommandScope};
use crate::domain::traits::ChatClient;
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::debug;

/// Local cache of published app commands plus per-guild overrides
#[derive(Debug, Default)]
pub struct CommandTree {
    all_app_commands: RwLock<BTreeMap<String, AppCommand>>,
    guild_commands: RwLock<HashMap<String, Vec<AppCommand>>>,
}

impl CommandTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace_cache(&self, commands: &[AppCommand]) -> Result<(), BotError> {
        let mut cache = self
            .all_app_commands
            .write()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?;
        *cache = commands
            .iter()
            .map(|c| (c.name.clone(), c.clone()))
            .collect();
        Ok(())
    }

    /// Publish commands for `scope` and refresh the local cache.
    ///
    /// Global syncs publish `global`. Guild syncs publish whatever
    /// [`copy_global_to`](Self::copy_global_to) or
    /// [`clear_commands`](Self::clear_commands) left for that guild, which is
    /// nothing by default.
    pub async fn sync(
        &self,
        client: &dyn ChatClient,
        global: &[AppCommand],
        scope: &CommandScope,
    ) -> Result<Vec<AppCommand>, BotError> {
        debug!("syncing app commands {}...", scope);
        let commands = match scope {
            CommandScope::Global => global.to_vec(),
            CommandScope::Guild(id) => self
                .guild_commands
                .read()
                .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?
                .get(id)
                .cloned()
                .unwrap_or_default(),
        };

        let synced = client.set_app_commands(scope, &commands).await?;
        self.replace_cache(&synced)?;
        debug!("app commands synced & app commands list updated locally ({})", synced.len());
        Ok(synced)
    }

    /// Make the next sync of `guild` publish the global commands there too
    pub fn copy_global_to(&self, guild: &str, global: &[AppCommand]) -> Result<(), BotError> {
        self.guild_commands
            .write()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?
            .insert(guild.to_string(), global.to_vec());
        Ok(())
    }

    /// Make the next sync of `guild` remove every command there
    pub fn clear_commands(&self, guild: &str) -> Result<(), BotError> {
        self.guild_commands
            .write()
            .map_err(|_| BotError::Internal("Lock poisoned".to_string()))?
            .insert(guild.to_string(), Vec::new());
        Ok(())
    }

    /// Refresh the cache from the platform's global commands
    pub async fn update_app_commands(&self, client: &dyn ChatClient) -> Result<Vec<AppCommand>, BotError> {
        debug!("fetching app commands...");
        let commands = client.fetch_app_commands(&CommandScope::Global).await?;
        self.replace_cache(&commands)?;
        debug!("app commands fetched & updated locally ({})", commands.len());
        Ok(commands)
    }

    /// Number of cached app commands
    pub fn len(&self) -> usize {
        self.all_app_commands.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, name: &str) -> Option<AppCommand> {
        self.all_app_commands.read().ok()?.get(name).cloned()
    }

    /// Mention an app command: `</name sub:id>` when its id is cached,
    /// `` `/name sub` `` otherwise
    pub fn slash_mention(&self, qualified_name: &str) -> String {
        let name = qualified_name.strip_prefix('/').unwrap_or(qualified_name);
        let parent = name.split_whitespace().next().unwrap_or(name);

        match self.get(parent).and_then(|c| c.id) {
            Some(id) => format!("</{}:{}>", name, id),
            None => format!("`/{}`", name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::ConsoleAdapter;
    use tokio::io::BufReader;

    fn client() -> ConsoleAdapter {
        ConsoleAdapter::with_input("console", BufReader::new(&b""[..]))
    }

    fn global() -> Vec<AppCommand> {
        vec![
            AppCommand::new("help", "Show help"),
            AppCommand::new("stats", "Command usage"),
        ]
    }

    #[test]
    fn test_slash_mention_without_cache() {
        let tree = CommandTree::new();
        assert_eq!(tree.slash_mention("/stats"), "`/stats`");
        assert_eq!(tree.slash_mention("config set"), "`/config set`");
    }

    #[tokio::test]
    async fn test_slash_mention_with_cached_id() {
        let client = client();
        let tree = CommandTree::new();
        let synced = tree.sync(&client, &global(), &CommandScope::Global).await.unwrap();
        let id = synced[1].id.clone().unwrap();

        assert_eq!(tree.len(), 2);
        assert_eq!(tree.slash_mention("/stats"), format!("</stats:{}>", id));
        assert_eq!(tree.slash_mention("stats top"), format!("</stats top:{}>", id));
        assert_eq!(tree.slash_mention("nope"), "`/nope`");
    }

    #[tokio::test]
    async fn test_guild_sync_uses_overrides() {
        let client = client();
        let tree = CommandTree::new();
        let guild = CommandScope::Guild("console".to_string());

        assert!(tree.sync(&client, &global(), &guild).await.unwrap().is_empty());

        tree.copy_global_to("console", &global()).unwrap();
        assert_eq!(tree.sync(&client, &global(), &guild).await.unwrap().len(), 2);

        tree.clear_commands("console").unwrap();
        assert!(tree.sync(&client, &global(), &guild).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_app_commands_reads_global() {
        let client = client();
        client
            .set_app_commands(&CommandScope::Global, &global())
            .await
            .unwrap();

        let tree = CommandTree::new();
        assert!(tree.is_empty());
        tree.update_app_commands(&client).await.unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.get("help").and_then(|c| c.id).is_some());
    }
}
