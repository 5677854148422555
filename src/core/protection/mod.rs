// Core protection module - the moderation decision engine.
//
// Pure domain logic: nothing in here talks to Discord directly. The
// discord layer feeds MessageEvents in and implements the PlatformClient
// port; the infra layer implements the SettingsStore port.

pub mod checkers;
pub mod executor;
pub mod pipeline;
pub mod protection_models;
pub mod settings;
pub mod state_cache;
pub mod warning_ledger;

pub use executor::*;
pub use pipeline::*;
pub use protection_models::*;
pub use settings::*;
pub use state_cache::*;
pub use warning_ledger::*;
