// Discord layer - commands, event handlers and the platform adapter.

#[path = "protection/commands.rs"]
pub mod commands;

#[path = "protection/events.rs"]
pub mod events;

#[path = "protection/platform.rs"]
pub mod platform;

// Re-export command types for convenience
pub use commands::{Data, Error};
