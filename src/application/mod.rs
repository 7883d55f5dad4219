//! Application layer - the bot runtime
//!
//! This layer contains:
//! - Bot: lifecycle, extensions, event loop
//! - Context and checks for command invocations
//! - CommandTree: app command cache
//! - Services: command dispatch and the built-in help
//! - Messaging: prefix parsing
//! - Errors

pub mod bot;
pub mod checks;
pub mod command_tree;
pub mod context;
pub mod errors;
pub mod messaging;
pub mod services;

pub use bot::{Bot, Shutdown};
pub use context::Context;
