//! Utilities shared by the bot and its cogs

pub mod bot;
pub mod console;
pub mod formatters;
pub mod iterables;
pub mod searchers;
pub mod values;

pub use formatters::{cleanup_code, code};
pub use iterables::paginate;
pub use searchers::{get_matches, is_match};
