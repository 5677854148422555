// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "audit.rs"]
pub mod audit;

#[path = "protection/mod.rs"]
pub mod protection;
