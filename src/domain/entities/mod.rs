//! Domain entities - Core business objects with no external dependencies

pub mod board;
pub mod channel;
pub mod command;
pub mod message;
pub mod user;

pub use board::{Board, BoardField};
pub use channel::{Channel, ChannelKind};
pub use command::{AppCommand, Command, CommandRegistry, CommandScope};
pub use message::{Event, Message};
pub use user::User;
