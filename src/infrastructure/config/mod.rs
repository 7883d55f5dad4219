//! Configuration management

use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub logging: LoggingConfig,
    pub messages: MessagesConfig,
    pub extensions: ExtensionsConfig,
    pub database: DatabaseConfig,
    pub adapters: AdaptersConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    /// Only shown in logs
    pub name: String,
    pub default_prefix: String,
    /// `@botname help` works like `!help`
    pub mention_is_also_prefix: bool,
    /// User ids with access to the developer cog
    pub admins: Vec<String>,
    pub debug: bool,
    /// Items shown per page in paginated output
    pub items_per_page: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggingConfig {
    /// Chat the bot posts lifecycle logs to
    pub log_channel: Option<String>,
    pub notify_all_errors_to_user: bool,
    pub log_commands_to_console: bool,
    pub log_not_found_commands_to_console: bool,
    /// Log files are only written when set
    pub logs_folder: Option<PathBuf>,
    pub log_filename_time_format: String,
}

/// Reply templates. A missing (null) template disables that reply.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct MessagesConfig {
    pub missing_argument: Option<String>,
    pub no_permissions: Option<String>,
    pub bot_no_permissions: Option<String>,
    pub command_not_found: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ExtensionsConfig {
    pub namespace: String,
    /// Identifiers, with or without the namespace, skipped at startup
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
    pub console: Option<ConsoleConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ConsoleConfig {
    pub enabled: bool,
    /// Id given to the local user typing into the console
    #[serde(default = "default_console_user")]
    pub user_id: String,
}

fn default_console_user() -> String {
    "console".to_string()
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "cogbot".to_string(),
            default_prefix: "!".to_string(),
            mention_is_also_prefix: true,
            admins: vec![default_console_user()],
            debug: false,
            items_per_page: 5,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_channel: None,
            notify_all_errors_to_user: true,
            log_commands_to_console: true,
            log_not_found_commands_to_console: true,
            logs_folder: Some(PathBuf::from("./logs")),
            log_filename_time_format: "%Y-%m-%d %H-%M-%S".to_string(),
        }
    }
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            missing_argument: Some(
                "Missing argument `{argument}` of type `{type}`.\n\
                 For more information refer to `{clean_prefix}help {command}`."
                    .to_string(),
            ),
            no_permissions: Some("You don't have permissions to use this command.".to_string()),
            bot_no_permissions: Some(
                "I'm missing permissions to run this command.\n\
                 Permissions required: {joined_permissions_code}"
                    .to_string(),
            ),
            command_not_found: Some("Command `{clean_prefix}{command}` not found.".to_string()),
        }
    }
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            namespace: "cogs".to_string(),
            exclude: vec!["template".to_string()],
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cogbot.db"),
        }
    }
}

impl Default for AdaptersConfig {
    fn default() -> Self {
        Self {
            telegram: Some(TelegramConfig {
                enabled: false,
                token: None,
            }),
            console: Some(ConsoleConfig {
                enabled: true,
                user_id: default_console_user(),
            }),
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Defaults with environment overrides applied
    pub fn load_env() -> Self {
        let mut config = Config::default();
        config.apply_env();
        config
    }

    /// `TOKEN` enables the Telegram adapter, `BOT_PREFIX` replaces the prefix
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("TOKEN") {
            self.set_token(token);
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            if !prefix.is_empty() {
                self.bot.default_prefix = prefix;
            }
        }
    }

    pub fn set_token(&mut self, token: impl Into<String>) {
        let tg = self.adapters.telegram.get_or_insert(TelegramConfig {
            enabled: true,
            token: None,
        });
        tg.token = Some(token.into());
        tg.enabled = true;
    }

    /// Token of the enabled Telegram adapter, if any
    pub fn telegram_token(&self) -> Option<&str> {
        self.adapters
            .telegram
            .as_ref()
            .filter(|tg| tg.enabled)
            .and_then(|tg| tg.token.as_deref())
            .filter(|token| !token.is_empty())
    }

    pub fn console_user(&self) -> String {
        self.adapters
            .console
            .as_ref()
            .map(|c| c.user_id.clone())
            .unwrap_or_else(default_console_user)
    }

    /// Check if a user id has admin access
    pub fn is_admin(&self, user_id: &str) -> bool {
        self.bot.admins.iter().any(|admin| admin == user_id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.admins.is_empty() {
            return Err(ConfigError::MissingField("bot.admins".to_string()));
        }
        if self.bot.default_prefix.trim().is_empty() {
            return Err(ConfigError::InvalidValue("bot.default-prefix must not be blank".to_string()));
        }
        if self.extensions.namespace.is_empty() || self.extensions.namespace.contains('.') {
            return Err(ConfigError::InvalidValue(format!(
                "extensions.namespace '{}' must be a single non-empty name",
                self.extensions.namespace
            )));
        }
        if self.bot.items_per_page == 0 {
            return Err(ConfigError::InvalidValue("bot.items-per-page must be at least 1".to_string()));
        }
        let time_format = &self.logging.log_filename_time_format;
        if StrftimeItems::new(time_format).any(|item| matches!(item, Item::Error)) {
            return Err(ConfigError::InvalidValue(format!(
                "logging.log-filename-time-format '{}' is not a valid time format",
                time_format
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "bot:\n  name: sqd bot\n  admins: [\"42\"]\nextensions:\n  exclude: []\n",
        )
        .unwrap();

        assert_eq!(config.bot.name, "sqd bot");
        assert_eq!(config.bot.default_prefix, "!");
        assert!(config.is_admin("42"));
        assert!(!config.is_admin("console"));
        assert_eq!(config.extensions.namespace, "cogs");
        assert!(config.extensions.exclude.is_empty());
        assert_eq!(config.bot.items_per_page, 5);
    }

    #[test]
    fn test_null_template_disables_reply() {
        let config = Config::from_yaml("messages:\n  command-not-found: null\n").unwrap();
        assert!(config.messages.command_not_found.is_none());
        assert!(config.messages.no_permissions.is_some());
    }

    #[test]
    fn test_default_config_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.extensions.exclude, vec!["template".to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_unknown_time_specifier() {
        let mut config = Config::default();
        config.logging.log_filename_time_format = "%Y-%Q".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        config.logging.log_filename_time_format = "%Y-%m-%d %H-%M-%S".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_admins() {
        let mut config = Config::default();
        config.bot.admins.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn test_set_token_enables_telegram() {
        let mut config = Config::default();
        assert!(config.telegram_token().is_none());
        config.set_token("123:abc");
        assert_eq!(config.telegram_token(), Some("123:abc"));
    }
}
