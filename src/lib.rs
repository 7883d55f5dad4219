//! cogbot - a chat bot scaffold with loadable cogs
//!
//! Layers:
//! - `domain`: entities and the platform client trait
//! - `application`: the bot runtime, context, dispatch and errors
//! - `infrastructure`: config, logging, SQLite and platform adapters
//! - `plugins`: cogs, the extension catalog, manager and loader
//! - `cogs`: extensions shipped with the bot
//! - `utils`: formatting, search and console helpers

pub mod application;
pub mod cogs;
pub mod domain;
pub mod infrastructure;
pub mod plugins;
pub mod utils;
