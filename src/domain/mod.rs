//! Domain layer - Core business objects with no infrastructure dependencies
//!
//! This layer contains:
//! - Entities: User, Message, Channel, Command metadata, Board
//! - Traits: the `ChatClient` seam platform adapters implement

pub mod entities;
pub mod traits;
