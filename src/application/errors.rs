//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    #[error("Unsupported by this client: {0}")]
    Unsupported(&'static str),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Missing argument `{name}` of type `{kind}`")]
    MissingArgument { name: String, kind: String },

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Missing permissions: {}", .0.join(", "))]
    MissingPermissions(Vec<String>),

    #[error("Bot missing permissions: {}", .0.join(", "))]
    BotMissingPermissions(Vec<String>),

    #[error("Command can only be used in a group chat")]
    NoPrivateMessage,

    #[error("Check failed")]
    CheckFailure,

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Extension(#[from] ExtensionError),

    #[error("Platform error: {0}")]
    Platform(String),
}

impl CommandError {
    /// Short type name, used when reporting errors to users and logs
    pub fn type_name(&self) -> &'static str {
        match self {
            CommandError::NotFound(_) => "CommandNotFound",
            CommandError::MissingArgument { .. } => "MissingRequiredArgument",
            CommandError::InvalidArgs(_) => "BadArgument",
            CommandError::MissingPermissions(_) => "MissingPermissions",
            CommandError::BotMissingPermissions(_) => "BotMissingPermissions",
            CommandError::NoPrivateMessage => "NoPrivateMessage",
            CommandError::CheckFailure => "CheckFailure",
            CommandError::ExecutionFailed(_) => "CommandInvokeError",
            CommandError::Extension(e) => e.type_name(),
            CommandError::Platform(_) => "PlatformError",
        }
    }

    pub fn missing(name: impl Into<String>, kind: impl Into<String>) -> Self {
        CommandError::MissingArgument {
            name: name.into(),
            kind: kind.into(),
        }
    }
}

impl From<BotError> for CommandError {
    fn from(e: BotError) -> Self {
        match e {
            BotError::Command(inner) => inner,
            BotError::Extension(inner) => CommandError::Extension(inner),
            other => CommandError::Platform(other.to_string()),
        }
    }
}

/// Extension (cog module) loading errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtensionError {
    #[error("Extension '{0}' has no 'setup' function")]
    NoEntryPoint(String),

    #[error("Extension '{0}' is already loaded")]
    AlreadyLoaded(String),

    #[error("Extension '{0}' has not been loaded")]
    NotLoaded(String),

    #[error("Extension '{0}' could not be found")]
    NotFound(String),

    #[error("Command '{command}' is already registered by cog '{owner}'")]
    CommandConflict { command: String, owner: String },

    #[error("Cog '{0}' is already registered")]
    CogConflict(String),

    #[error("Extension '{name}' raised an error during setup: {reason}")]
    Setup { name: String, reason: String },

    #[error("Could not discover extensions in '{namespace}': {reason}")]
    Discovery { namespace: String, reason: String },
}

impl ExtensionError {
    /// Stable type name recorded by the loader for failed modules
    pub fn type_name(&self) -> &'static str {
        match self {
            ExtensionError::NoEntryPoint(_) => "NoEntryPointError",
            ExtensionError::AlreadyLoaded(_) => "ExtensionAlreadyLoaded",
            ExtensionError::NotLoaded(_) => "ExtensionNotLoaded",
            ExtensionError::NotFound(_) => "ExtensionNotFound",
            ExtensionError::CommandConflict { .. } => "CommandRegistrationError",
            ExtensionError::CogConflict(_) => "ClientException",
            ExtensionError::Setup { .. } => "ExtensionFailed",
            ExtensionError::Discovery { .. } => "DiscoveryFailure",
        }
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not connected to the database")]
    NotConnected,

    #[error("Lock poisoned")]
    Poisoned,
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
