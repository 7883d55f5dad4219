//! Startup extension loader
//!
//! Walks the discovered entries in order, skips the ones excluded by config
//! or marked inert, loads the rest into an [`ExtensionHost`] and records one
//! outcome per module. Errors from a single module never stop the walk.

use crate::plugins::manager::ExtensionHost;
use crate::plugins::trait_def::ExtensionEntry;
use crate::utils::iterables::paginate;
use crate::application::errors::ExtensionError;
use tracing::{error, info, warn};

/// Outcome of loading one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtensionStatus {
    Loaded,
    /// Skipped because of the exclusion list, or because the module is inert
    ExcludedByConfig { ignored: bool },
    ExcludedNoEntryPoint,
    ExcludedError { error_type: String, detail: String },
}

impl ExtensionStatus {
    /// Annotation shown next to excluded modules
    pub fn annotation(&self) -> Option<String> {
        match self {
            ExtensionStatus::Loaded => None,
            ExtensionStatus::ExcludedByConfig { ignored: false } => Some("(excluded in config)".to_string()),
            ExtensionStatus::ExcludedByConfig { ignored: true } => Some("(ignored)".to_string()),
            ExtensionStatus::ExcludedNoEntryPoint => Some("(no 'setup' function)".to_string()),
            ExtensionStatus::ExcludedError { error_type, .. } => Some(format!("(error: {})", error_type)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRecord {
    pub name: String,
    pub status: ExtensionStatus,
}

/// Everything the loader decided, in enumeration order
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    records: Vec<ExtensionRecord>,
    command_count: usize,
}

impl LoadReport {
    pub fn records(&self) -> &[ExtensionRecord] {
        &self.records
    }

    pub fn status(&self, name: &str) -> Option<&ExtensionStatus> {
        self.records.iter().find(|r| r.name == name).map(|r| &r.status)
    }

    pub fn loaded(&self) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.status == ExtensionStatus::Loaded)
            .map(|r| r.name.clone())
            .collect()
    }

    /// Excluded module names with their annotation
    pub fn excluded(&self) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|r| r.status.annotation().map(|note| format!("{} {}", r.name, note)))
            .collect()
    }

    /// Commands registered once loading finished
    pub fn command_count(&self) -> usize {
        self.command_count
    }

    pub fn loaded_summary(&self, indent: usize) -> String {
        summarize("the following cogs have been loaded:", &self.loaded(), 3, indent)
    }

    pub fn excluded_summary(&self, indent: usize) -> String {
        summarize("the following cogs have been excluded:", &self.excluded(), 2, indent)
    }

    /// Log both summaries and the command count, aligned under the log prefix
    pub fn log(&self, bot_name: &str) {
        let indent = summary_indent(bot_name);
        info!("{}", self.loaded_summary(indent));
        info!("{}", self.excluded_summary(indent));
        info!("commands loaded: {}", self.command_count);
    }
}

/// Width of the log prefix the summary lines align under
pub fn summary_indent(bot_name: &str) -> usize {
    30 + bot_name.chars().count()
}

/// A header line followed by `per_line` items per indented line
pub fn summarize(header: &str, items: &[String], per_line: usize, indent: usize) -> String {
    let mut text = format!("{}\n", header);
    for group in paginate(items, per_line) {
        let names: Vec<&str> = group.iter().map(|s| s.as_str()).collect();
        text.push_str(&" ".repeat(indent));
        text.push_str(&names.join(", "));
        text.push('\n');
    }
    text.trim().to_string()
}

/// Loads catalog entries at startup
#[derive(Debug, Clone)]
pub struct ExtensionLoader {
    namespace: String,
    exclude: Vec<String>,
}

impl ExtensionLoader {
    pub fn new(namespace: impl Into<String>, exclude: &[String]) -> Self {
        Self {
            namespace: namespace.into(),
            exclude: exclude.to_vec(),
        }
    }

    /// Excluded either by full identifier or by the name without the namespace
    pub fn is_excluded(&self, name: &str) -> bool {
        let prefix = format!("{}.", self.namespace);
        let short = name.strip_prefix(&prefix).unwrap_or(name);
        self.exclude.iter().any(|e| e == name || e == short)
    }

    pub fn load_all<H: ExtensionHost + ?Sized>(&self, host: &mut H, entries: &[ExtensionEntry]) -> LoadReport {
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            let status = if self.is_excluded(&entry.name) {
                ExtensionStatus::ExcludedByConfig { ignored: false }
            } else if entry.ignore {
                ExtensionStatus::ExcludedByConfig { ignored: true }
            } else {
                match host.load_extension(entry) {
                    Ok(()) => ExtensionStatus::Loaded,
                    Err(ExtensionError::NoEntryPoint(_)) => {
                        warn!(
                            "excluding `{}` because there is no entry point (no 'setup' function found)",
                            entry.name
                        );
                        ExtensionStatus::ExcludedNoEntryPoint
                    }
                    Err(e) => {
                        error!(
                            "excluding `{}` because there was an error while loading it (this may cause unintended behaviour): {}",
                            entry.name, e
                        );
                        ExtensionStatus::ExcludedError {
                            error_type: e.type_name().to_string(),
                            detail: e.to_string(),
                        }
                    }
                }
            };

            records.push(ExtensionRecord {
                name: entry.name.clone(),
                status,
            });
        }

        LoadReport {
            records,
            command_count: host.command_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::manager::CogRegistry;

    /// Host that records what it was asked to load and fails on demand
    #[derive(Default)]
    struct MockHost {
        asked: Vec<String>,
        commands: usize,
    }

    impl ExtensionHost for MockHost {
        fn load_extension(&mut self, entry: &ExtensionEntry) -> Result<(), ExtensionError> {
            self.asked.push(entry.name.clone());
            let setup = entry
                .setup
                .ok_or_else(|| ExtensionError::NoEntryPoint(entry.name.clone()))?;
            let mut registry = CogRegistry::new();
            setup(&mut registry)?;
            self.commands += 1;
            Ok(())
        }

        fn command_count(&self) -> usize {
            self.commands
        }
    }

    fn ok(_registry: &mut CogRegistry) -> Result<(), ExtensionError> {
        Ok(())
    }

    fn boom(_registry: &mut CogRegistry) -> Result<(), ExtensionError> {
        Err(ExtensionError::Setup {
            name: "cogs.broken".to_string(),
            reason: "boom".to_string(),
        })
    }

    fn entries() -> Vec<ExtensionEntry> {
        vec![
            ExtensionEntry::new("cogs.developer", ok),
            ExtensionEntry::new("cogs.template", ok),
            ExtensionEntry::new("cogs.sleepy", ok).ignored(),
            ExtensionEntry::without_setup("cogs.helpers"),
            ExtensionEntry::new("cogs.broken", boom),
            ExtensionEntry::new("cogs.statistics", ok),
        ]
    }

    #[test]
    fn test_each_module_gets_one_outcome() {
        let mut host = MockHost::default();
        let loader = ExtensionLoader::new("cogs", &["template".to_string()]);
        let report = loader.load_all(&mut host, &entries());

        assert_eq!(report.records().len(), 6);
        assert_eq!(report.status("cogs.developer"), Some(&ExtensionStatus::Loaded));
        assert_eq!(
            report.status("cogs.template"),
            Some(&ExtensionStatus::ExcludedByConfig { ignored: false })
        );
        assert_eq!(
            report.status("cogs.sleepy"),
            Some(&ExtensionStatus::ExcludedByConfig { ignored: true })
        );
        assert_eq!(report.status("cogs.helpers"), Some(&ExtensionStatus::ExcludedNoEntryPoint));
        assert!(matches!(
            report.status("cogs.broken"),
            Some(ExtensionStatus::ExcludedError { error_type, .. }) if error_type == "ExtensionFailed"
        ));
        assert_eq!(report.status("cogs.statistics"), Some(&ExtensionStatus::Loaded));
        assert_eq!(report.command_count(), 2);
    }

    #[test]
    fn test_excluded_and_ignored_modules_never_reach_the_host() {
        let mut host = MockHost::default();
        let loader = ExtensionLoader::new("cogs", &["cogs.developer".to_string(), "template".to_string()]);
        loader.load_all(&mut host, &entries());

        assert!(!host.asked.iter().any(|n| n == "cogs.developer"));
        assert!(!host.asked.iter().any(|n| n == "cogs.template"));
        assert!(!host.asked.iter().any(|n| n == "cogs.sleepy"));
        // The failure in cogs.broken did not stop later modules
        assert!(host.asked.iter().any(|n| n == "cogs.statistics"));
    }

    #[test]
    fn test_nothing_excluded_loads_everything_in_order() {
        let entries = vec![
            ExtensionEntry::new("cogs.developer", ok),
            ExtensionEntry::new("cogs.events", ok),
            ExtensionEntry::new("cogs.statistics", ok),
            ExtensionEntry::new("cogs.template", ok),
        ];
        let mut host = MockHost::default();
        let loader = ExtensionLoader::new("cogs", &[]);
        let report = loader.load_all(&mut host, &entries);

        let names: Vec<String> = entries.iter().map(|e| e.name.clone()).collect();
        assert_eq!(report.loaded(), names);
        assert_eq!(host.asked, names);
        assert!(report.excluded().is_empty());
    }

    #[test]
    fn test_summary_groups_and_annotations() {
        let mut host = MockHost::default();
        let loader = ExtensionLoader::new("cogs", &["template".to_string()]);
        let report = loader.load_all(&mut host, &entries());

        let indent = summary_indent("bot");
        assert_eq!(indent, 33);
        let pad = " ".repeat(indent);

        assert_eq!(
            report.loaded_summary(indent),
            format!("the following cogs have been loaded:\n{}cogs.developer, cogs.statistics", pad)
        );
        assert_eq!(
            report.excluded_summary(indent),
            format!(
                "the following cogs have been excluded:\n\
                 {pad}cogs.template (excluded in config), cogs.sleepy (ignored)\n\
                 {pad}cogs.helpers (no 'setup' function), cogs.broken (error: ExtensionFailed)",
                pad = pad
            )
        );
    }

    #[test]
    fn test_three_loaded_per_line() {
        let items: Vec<String> = (1..=4).map(|i| format!("cogs.m{}", i)).collect();
        assert_eq!(
            summarize("loaded:", &items, 3, 2),
            "loaded:\n  cogs.m1, cogs.m2, cogs.m3\n  cogs.m4"
        );
    }
}
