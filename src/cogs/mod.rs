//! Extensions shipped with the bot

pub mod developer;
pub mod events;
pub mod statistics;
pub mod template;

use crate::plugins::{ExtensionCatalog, ExtensionEntry};

/// Namespace the shipped extensions live in
pub const NAMESPACE: &str = "cogs";

/// Every extension the binary can load, in load order
pub fn catalog() -> ExtensionCatalog {
    ExtensionCatalog::new().namespace(
        NAMESPACE,
        vec![
            ExtensionEntry::new("cogs.developer", developer::setup),
            ExtensionEntry::new("cogs.events", events::setup),
            ExtensionEntry::new("cogs.statistics", statistics::setup),
            ExtensionEntry::new("cogs.template", template::setup),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::{CogRegistry, ExtensionHost, ExtensionLoader, ExtensionManager, ExtensionStatus};

    #[test]
    fn test_catalog_discovers_in_order() {
        let entries = catalog().discover(NAMESPACE).unwrap();
        let names: Vec<&str> = entries.iter().map(|e| e.short_name()).collect();
        assert_eq!(names, vec!["developer", "events", "statistics", "template"]);
    }

    #[test]
    fn test_shipped_extensions_load_without_conflicts() {
        let entries = catalog().discover(NAMESPACE).unwrap();
        let mut manager = ExtensionManager::new(NAMESPACE, entries.clone(), CogRegistry::new());
        let loader = ExtensionLoader::new(NAMESPACE, &["template".to_string()]);

        let report = loader.load_all(&mut manager, &entries);
        assert_eq!(report.loaded(), vec!["cogs.developer", "cogs.events", "cogs.statistics"]);
        assert_eq!(
            report.status("cogs.template"),
            Some(&ExtensionStatus::ExcludedByConfig { ignored: false })
        );
        assert_eq!(report.command_count(), manager.command_count());
        assert!(manager.registry().get_cog("example").is_none());
    }
}
