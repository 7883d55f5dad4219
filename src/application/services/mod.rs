//! Application services - command dispatch and built-in commands

pub mod command_service;
pub mod help;

pub use command_service::{invoke, process_commands};
pub use help::Help;
