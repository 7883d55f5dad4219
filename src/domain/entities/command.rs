use crate::application::errors::ExtensionError;
use std::collections::BTreeMap;

/// Metadata of a prefix command. The behaviour lives in the cog that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub name: String,
    pub description: Option<String>,
    pub aliases: Vec<String>,
    pub usage: Option<String>,
    /// Name of the owning cog, filled in on registration
    pub cog: String,
    pub hidden: bool,
    /// Also exposed as a platform app (slash) command
    pub slash: bool,
    pub guild_only: bool,
    /// Only the owner of the group may run it
    pub guild_owner_only: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            aliases: Vec::new(),
            usage: None,
            cog: String::new(),
            hidden: false,
            slash: false,
            guild_only: false,
            guild_owner_only: false,
        }
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = aliases.iter().map(|a| a.to_string()).collect();
        self
    }

    /// Argument signature shown after the command name, e.g. `<extension>`
    pub fn with_usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn slash(mut self) -> Self {
        self.slash = true;
        self
    }

    pub fn guild_only(mut self) -> Self {
        self.guild_only = true;
        self
    }

    /// Restrict to the group owner. Implies [`guild_only`](Self::guild_only).
    pub fn guild_owner_only(mut self) -> Self {
        self.guild_only = true;
        self.guild_owner_only = true;
        self
    }

    pub fn matches(&self, input: &str) -> bool {
        let input_lower = input.to_lowercase();
        self.name.to_lowercase() == input_lower
            || self.aliases.iter().any(|a| a.to_lowercase() == input_lower)
    }

    /// Name plus aliases
    pub fn names(&self) -> Vec<&str> {
        std::iter::once(self.name.as_str())
            .chain(self.aliases.iter().map(String::as_str))
            .collect()
    }

    /// `name <usage>`
    pub fn signature(&self) -> String {
        match &self.usage {
            Some(usage) => format!("{} {}", self.name, usage),
            None => self.name.clone(),
        }
    }
}

/// Commands keyed by lowercased name. Names and aliases share one namespace.
#[derive(Debug, Clone, Default)]
pub struct CommandRegistry {
    commands: BTreeMap<String, Command>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command, refusing any name or alias that is already taken
    pub fn register(&mut self, command: Command) -> Result<(), ExtensionError> {
        self.check_free(&command)?;
        self.commands.insert(command.name.to_lowercase(), command);
        Ok(())
    }

    /// Fail with the conflicting name if any of `command`'s names is taken
    pub fn check_free(&self, command: &Command) -> Result<(), ExtensionError> {
        for name in command.names() {
            if let Some(owner) = self.find(name) {
                return Err(ExtensionError::CommandConflict {
                    command: name.to_string(),
                    owner: owner.cog.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Command> {
        self.commands.get(&name.to_lowercase())
    }

    /// Look up by name or alias, case-insensitively
    pub fn find(&self, input: &str) -> Option<&Command> {
        self.get(input)
            .or_else(|| self.commands.values().find(|c| c.matches(input)))
    }

    /// Drop every command owned by `cog`, returning how many were removed
    pub fn remove_cog(&mut self, cog: &str) -> usize {
        let before = self.commands.len();
        self.commands.retain(|_, c| c.cog != cog);
        before - self.commands.len()
    }

    pub fn by_cog<'a>(&'a self, cog: &'a str) -> impl Iterator<Item = &'a Command> + 'a {
        self.commands.values().filter(move |c| c.cog == cog)
    }

    /// All commands, sorted by name
    pub fn all(&self) -> impl Iterator<Item = &Command> {
        self.commands.values()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Where app commands are published
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CommandScope {
    Global,
    Guild(String),
}

impl std::fmt::Display for CommandScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandScope::Global => write!(f, "globally"),
            CommandScope::Guild(id) => write!(f, "to guild {}", id),
        }
    }
}

/// An app command as known to the platform. `id` is only set when the
/// platform assigns one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppCommand {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
}

impl AppCommand {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
        }
    }
}

impl From<&Command> for AppCommand {
    fn from(command: &Command) -> Self {
        AppCommand::new(
            command.name.clone(),
            command
                .description
                .clone()
                .unwrap_or_else(|| "No description provided.".to_string()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(cmd: Command, cog: &str) -> Command {
        Command { cog: cog.to_string(), ..cmd }
    }

    #[test]
    fn test_find_by_alias_ignores_case() {
        let mut registry = CommandRegistry::new();
        registry
            .register(owned(Command::new("exec").with_aliases(&["eval", "run"]), "Developer"))
            .unwrap();

        assert_eq!(registry.find("EVAL").map(|c| c.name.as_str()), Some("exec"));
        assert_eq!(registry.find("Exec").map(|c| c.name.as_str()), Some("exec"));
        assert!(registry.find("shell").is_none());
    }

    #[test]
    fn test_alias_conflict_names_owner() {
        let mut registry = CommandRegistry::new();
        registry
            .register(owned(Command::new("exec").with_aliases(&["run"]), "Developer"))
            .unwrap();

        let err = registry
            .register(owned(Command::new("run"), "Template"))
            .unwrap_err();
        assert_eq!(
            err,
            ExtensionError::CommandConflict {
                command: "run".to_string(),
                owner: "Developer".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_cog_only_drops_its_commands() {
        let mut registry = CommandRegistry::new();
        registry.register(owned(Command::new("load"), "Developer")).unwrap();
        registry.register(owned(Command::new("sync"), "Developer")).unwrap();
        registry.register(owned(Command::new("stats"), "Statistics")).unwrap();

        assert_eq!(registry.remove_cog("Developer"), 2);
        assert_eq!(registry.all().map(|c| c.name.as_str()).collect::<Vec<_>>(), vec!["stats"]);
    }

    #[test]
    fn test_app_command_default_description() {
        let app = AppCommand::from(&Command::new("uptime"));
        assert_eq!(app.description, "No description provided.");
        assert!(app.id.is_none());
    }
}
