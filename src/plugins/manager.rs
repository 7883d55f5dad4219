//! Extension manager - cog registry and extension lifecycle

use crate::application::errors::ExtensionError;
use crate::domain::entities::{Command, CommandRegistry};
use crate::plugins::trait_def::{Cog, ExtensionEntry};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Registered cogs and the commands they provide
#[derive(Clone, Default)]
pub struct CogRegistry {
    cogs: Vec<Arc<dyn Cog>>,
    commands: CommandRegistry,
}

impl CogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cog
    pub fn add_cog<C: Cog + 'static>(&mut self, cog: C) -> Result<(), ExtensionError> {
        self.add_shared(Arc::new(cog))
    }

    /// Register a cog and all of its commands, or nothing at all
    pub fn add_shared(&mut self, cog: Arc<dyn Cog>) -> Result<(), ExtensionError> {
        let name = cog.name().to_string();
        if self.get_cog(&name).is_some() {
            return Err(ExtensionError::CogConflict(name));
        }

        let mut commands = self.commands.clone();
        for command in cog.commands() {
            commands.register(Command {
                cog: name.clone(),
                ..command
            })?;
        }

        debug!("Registering cog: {}", name);
        self.commands = commands;
        self.cogs.push(cog);
        Ok(())
    }

    /// Remove a cog and its commands, running its unload hook
    pub fn remove_cog(&mut self, name: &str) -> Option<Arc<dyn Cog>> {
        let cog = self.detach_cog(name)?;
        cog.cog_unload();
        Some(cog)
    }

    /// Remove a cog and its commands without running any hook
    fn detach_cog(&mut self, name: &str) -> Option<Arc<dyn Cog>> {
        let index = self
            .cogs
            .iter()
            .position(|c| c.name().eq_ignore_ascii_case(name))?;
        let cog = self.cogs.remove(index);
        self.commands.remove_cog(cog.name());
        debug!("Removed cog: {}", cog.name());
        Some(cog)
    }

    pub fn get_cog(&self, name: &str) -> Option<Arc<dyn Cog>> {
        self.cogs
            .iter()
            .find(|c| c.name().eq_ignore_ascii_case(name))
            .cloned()
    }

    /// Cogs in registration order
    pub fn cogs(&self) -> &[Arc<dyn Cog>] {
        &self.cogs
    }

    pub fn cog_names(&self) -> Vec<String> {
        self.cogs.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Find a command by name or alias along with its owning cog
    pub fn resolve(&self, input: &str) -> Option<(Command, Arc<dyn Cog>)> {
        let command = self.commands.find(input)?;
        let cog = self.get_cog(&command.cog)?;
        Some((command.clone(), cog))
    }
}

impl fmt::Debug for CogRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CogRegistry")
            .field("cogs", &self.cog_names())
            .field("commands", &self.commands.len())
            .finish()
    }
}

/// Something extensions can be loaded into
pub trait ExtensionHost {
    /// Run the entry's setup against the host's registry
    fn load_extension(&mut self, entry: &ExtensionEntry) -> Result<(), ExtensionError>;

    /// Number of registered commands
    fn command_count(&self) -> usize;
}

#[derive(Debug, Clone)]
struct LoadedExtension {
    name: String,
    cogs: Vec<String>,
}

/// Owns the registry and tracks which extension registered which cogs
#[derive(Debug)]
pub struct ExtensionManager {
    namespace: String,
    catalog: Vec<ExtensionEntry>,
    registry: CogRegistry,
    loaded: Vec<LoadedExtension>,
}

impl ExtensionManager {
    /// Create a manager over a discovered catalog. `registry` may already hold
    /// built-in cogs, which are never unloaded.
    pub fn new(namespace: impl Into<String>, catalog: Vec<ExtensionEntry>, registry: CogRegistry) -> Self {
        Self {
            namespace: namespace.into(),
            catalog,
            registry,
            loaded: Vec::new(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn catalog(&self) -> &[ExtensionEntry] {
        &self.catalog
    }

    pub fn registry(&self) -> &CogRegistry {
        &self.registry
    }

    /// `developer` becomes `cogs.developer`; qualified names are kept
    pub fn qualify(&self, name: &str) -> String {
        let prefix = format!("{}.", self.namespace);
        if name.starts_with(&prefix) {
            name.to_string()
        } else {
            format!("{}{}", prefix, name)
        }
    }

    /// Loaded extension names, in load order
    pub fn loaded(&self) -> Vec<String> {
        self.loaded.iter().map(|e| e.name.clone()).collect()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        let name = self.qualify(name);
        self.loaded.iter().any(|e| e.name == name)
    }

    /// Load a catalog entry by (possibly unqualified) name
    pub fn load(&mut self, name: &str) -> Result<(), ExtensionError> {
        let qualified = self.qualify(name);
        let entry = self
            .catalog
            .iter()
            .find(|e| e.name == qualified)
            .cloned()
            .ok_or(ExtensionError::NotFound(qualified))?;
        self.load_entry(&entry)
    }

    /// Run an entry's setup on a staged copy of the registry. The copy only
    /// replaces the live registry when setup succeeds.
    pub fn load_entry(&mut self, entry: &ExtensionEntry) -> Result<(), ExtensionError> {
        if self.loaded.iter().any(|e| e.name == entry.name) {
            return Err(ExtensionError::AlreadyLoaded(entry.name.clone()));
        }
        let setup = entry
            .setup
            .ok_or_else(|| ExtensionError::NoEntryPoint(entry.name.clone()))?;

        let before = self.registry.cog_names();
        let mut staged = self.registry.clone();
        setup(&mut staged)?;

        let cogs: Vec<String> = staged
            .cog_names()
            .into_iter()
            .filter(|name| !before.contains(name))
            .collect();

        info!("Loaded extension {} (cogs: {})", entry.name, cogs.join(", "));
        self.registry = staged;
        self.loaded.push(LoadedExtension {
            name: entry.name.clone(),
            cogs,
        });
        Ok(())
    }

    /// Remove every cog the extension registered
    pub fn unload(&mut self, name: &str) -> Result<(), ExtensionError> {
        let qualified = self.qualify(name);
        let index = self
            .loaded
            .iter()
            .position(|e| e.name == qualified)
            .ok_or_else(|| ExtensionError::NotLoaded(qualified.clone()))?;

        let extension = self.loaded.remove(index);
        for cog in &extension.cogs {
            self.registry.remove_cog(cog);
        }
        info!("Unloaded extension {}", extension.name);
        Ok(())
    }

    /// Swap an extension's cogs for freshly set up ones. The old cogs stay
    /// live, with their unload hooks not run, unless setup succeeds.
    pub fn reload(&mut self, name: &str) -> Result<(), ExtensionError> {
        let qualified = self.qualify(name);
        let index = self
            .loaded
            .iter()
            .position(|e| e.name == qualified)
            .ok_or_else(|| ExtensionError::NotLoaded(qualified.clone()))?;
        let setup = self
            .catalog
            .iter()
            .find(|e| e.name == qualified)
            .ok_or_else(|| ExtensionError::NotFound(qualified.clone()))?
            .setup
            .ok_or_else(|| ExtensionError::NoEntryPoint(qualified.clone()))?;

        let mut staged = self.registry.clone();
        let old: Vec<Arc<dyn Cog>> = self.loaded[index]
            .cogs
            .iter()
            .filter_map(|cog| staged.detach_cog(cog))
            .collect();

        let before = staged.cog_names();
        setup(&mut staged)?;
        let cogs: Vec<String> = staged
            .cog_names()
            .into_iter()
            .filter(|name| !before.contains(name))
            .collect();

        for cog in &old {
            cog.cog_unload();
        }
        info!("Reloaded extension {} (cogs: {})", qualified, cogs.join(", "));
        self.registry = staged;
        self.loaded[index] = LoadedExtension { name: qualified, cogs };
        Ok(())
    }
}

impl ExtensionHost for ExtensionManager {
    fn load_extension(&mut self, entry: &ExtensionEntry) -> Result<(), ExtensionError> {
        self.load_entry(entry)
    }

    fn command_count(&self) -> usize {
        self.registry.commands().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct Greeter;

    impl Cog for Greeter {
        fn name(&self) -> &str {
            "Greeter"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("hello").with_aliases(&["hi"])]
        }
    }

    struct Clash;

    impl Cog for Clash {
        fn name(&self) -> &str {
            "Clash"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("hi")]
        }
    }

    struct Extra;

    impl Cog for Extra {
        fn name(&self) -> &str {
            "Extra"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("extra")]
        }
    }

    struct Flaky;

    impl Cog for Flaky {
        fn name(&self) -> &str {
            "Flaky"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("flake")]
        }
    }

    static BREAK_FLAKY: AtomicBool = AtomicBool::new(false);

    static BREAK_WATCHED: AtomicBool = AtomicBool::new(false);
    static WATCHED_UNLOADS: AtomicUsize = AtomicUsize::new(0);

    struct Watched;

    impl Cog for Watched {
        fn name(&self) -> &str {
            "Watched"
        }

        fn commands(&self) -> Vec<Command> {
            vec![Command::new("watch")]
        }

        fn cog_unload(&self) {
            WATCHED_UNLOADS.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup_watched(registry: &mut CogRegistry) -> Result<(), ExtensionError> {
        if BREAK_WATCHED.load(Ordering::SeqCst) {
            return Err(ExtensionError::Setup {
                name: "tests.watched".to_string(),
                reason: "broken".to_string(),
            });
        }
        registry.add_cog(Watched)
    }

    fn setup_greeter(registry: &mut CogRegistry) -> Result<(), ExtensionError> {
        registry.add_cog(Greeter)
    }

    fn setup_flaky(registry: &mut CogRegistry) -> Result<(), ExtensionError> {
        if BREAK_FLAKY.load(Ordering::SeqCst) {
            return Err(ExtensionError::Setup {
                name: "tests.flaky".to_string(),
                reason: "broken".to_string(),
            });
        }
        registry.add_cog(Flaky)
    }

    fn setup_half(registry: &mut CogRegistry) -> Result<(), ExtensionError> {
        registry.add_cog(Extra)?;
        registry.add_cog(Clash)
    }

    fn manager() -> ExtensionManager {
        ExtensionManager::new(
            "tests",
            vec![
                ExtensionEntry::new("tests.greeter", setup_greeter),
                ExtensionEntry::new("tests.half", setup_half),
                ExtensionEntry::new("tests.flaky", setup_flaky),
                ExtensionEntry::without_setup("tests.empty"),
                ExtensionEntry::new("tests.watched", setup_watched),
            ],
            CogRegistry::new(),
        )
    }

    #[test]
    fn test_load_and_unload_by_short_name() {
        let mut manager = manager();
        manager.load("greeter").unwrap();
        assert!(manager.is_loaded("greeter"));
        assert_eq!(manager.command_count(), 1);
        assert!(manager.registry().resolve("HI").is_some());

        assert_eq!(
            manager.load("greeter").unwrap_err(),
            ExtensionError::AlreadyLoaded("tests.greeter".to_string())
        );

        manager.unload("greeter").unwrap();
        assert_eq!(manager.command_count(), 0);
        assert_eq!(
            manager.unload("greeter").unwrap_err(),
            ExtensionError::NotLoaded("tests.greeter".to_string())
        );
    }

    #[test]
    fn test_unknown_and_entrypointless_extensions() {
        let mut manager = manager();
        assert_eq!(
            manager.load("nope").unwrap_err(),
            ExtensionError::NotFound("tests.nope".to_string())
        );
        assert_eq!(
            manager.load("empty").unwrap_err().type_name(),
            "NoEntryPointError"
        );
    }

    #[test]
    fn test_failed_setup_registers_nothing() {
        let mut manager = manager();
        manager.load("greeter").unwrap();

        // Extra registers fine, then Clash collides with Greeter's alias
        let err = manager.load("half").unwrap_err();
        assert_eq!(err.type_name(), "CommandRegistrationError");
        assert!(manager.registry().get_cog("Extra").is_none());
        assert!(!manager.is_loaded("half"));
        assert_eq!(manager.loaded(), vec!["tests.greeter".to_string()]);
    }

    #[test]
    fn test_reload_failure_restores_previous_cogs() {
        let mut manager = manager();
        manager.load("flaky").unwrap();

        BREAK_FLAKY.store(true, Ordering::SeqCst);
        let result = manager.reload("flaky");
        BREAK_FLAKY.store(false, Ordering::SeqCst);

        assert_eq!(result.unwrap_err().type_name(), "ExtensionFailed");
        assert!(manager.is_loaded("flaky"));
        assert!(manager.registry().get_cog("Flaky").is_some());
        assert!(manager.registry().resolve("flake").is_some());
    }

    #[test]
    fn test_unload_hook_runs_only_after_successful_reload() {
        let mut manager = manager();
        manager.load("watched").unwrap();

        BREAK_WATCHED.store(true, Ordering::SeqCst);
        let result = manager.reload("watched");
        BREAK_WATCHED.store(false, Ordering::SeqCst);

        assert!(result.is_err());
        assert_eq!(WATCHED_UNLOADS.load(Ordering::SeqCst), 0);
        assert!(manager.registry().resolve("watch").is_some());

        manager.reload("watched").unwrap();
        assert_eq!(WATCHED_UNLOADS.load(Ordering::SeqCst), 1);
        assert!(manager.registry().resolve("watch").is_some());
        assert_eq!(manager.loaded(), vec!["tests.watched".to_string()]);

        manager.unload("watched").unwrap();
        assert_eq!(WATCHED_UNLOADS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_duplicate_cog_name_rejected() {
        let mut registry = CogRegistry::new();
        registry.add_cog(Greeter).unwrap();
        assert_eq!(
            registry.add_cog(Greeter).unwrap_err(),
            ExtensionError::CogConflict("Greeter".to_string())
        );
    }
}
