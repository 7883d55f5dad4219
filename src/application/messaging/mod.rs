//! Message handling - prefix parsing

pub mod parser;

pub use parser::{Invocation, MessageParser};
