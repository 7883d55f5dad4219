//! Extension system for cogbot
//!
//! Extensions are compiled-in modules listed in an [`ExtensionCatalog`].
//! Loading one runs its setup function, which registers cogs into a
//! [`CogRegistry`].

pub mod catalog;
pub mod loader;
pub mod manager;
pub mod trait_def;

pub use catalog::ExtensionCatalog;
pub use loader::{ExtensionLoader, ExtensionRecord, ExtensionStatus, LoadReport};
pub use manager::{CogRegistry, ExtensionHost, ExtensionManager};
pub use trait_def::{BotEvent, Cog, ExtensionEntry, SetupFn};
