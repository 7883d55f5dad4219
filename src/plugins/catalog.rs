//! Extension catalog - the compiled-in list of loadable extension modules

use crate::application::errors::ExtensionError;
use crate::plugins::trait_def::ExtensionEntry;
use std::collections::HashSet;

/// Extension entries grouped by namespace, in declaration order
#[derive(Debug, Clone, Default)]
pub struct ExtensionCatalog {
    namespaces: Vec<(String, Vec<ExtensionEntry>)>,
}

impl ExtensionCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a namespace and its entries
    pub fn namespace(mut self, name: impl Into<String>, entries: Vec<ExtensionEntry>) -> Self {
        self.namespaces.push((name.into(), entries));
        self
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.namespaces.iter().map(|(name, _)| name.as_str())
    }

    /// Enumerate the entries of `namespace`.
    ///
    /// Fails when the namespace is unknown, when an entry lives outside it,
    /// or when two entries share an identifier.
    pub fn discover(&self, namespace: &str) -> Result<Vec<ExtensionEntry>, ExtensionError> {
        let discovery_error = |reason: String| ExtensionError::Discovery {
            namespace: namespace.to_string(),
            reason,
        };

        let (_, entries) = self
            .namespaces
            .iter()
            .find(|(name, _)| name == namespace)
            .ok_or_else(|| discovery_error("namespace is not registered".to_string()))?;

        let prefix = format!("{}.", namespace);
        let mut seen = HashSet::new();
        for entry in entries {
            if !entry.name.starts_with(&prefix) || entry.name.len() == prefix.len() {
                return Err(discovery_error(format!(
                    "'{}' is not a module of this namespace",
                    entry.name
                )));
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(discovery_error(format!("duplicate identifier '{}'", entry.name)));
            }
        }

        Ok(entries.clone())
    }
}
