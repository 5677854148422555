// Infra implementations of the protection settings store.

pub mod in_memory;
pub mod sqlite_settings_store;

pub use in_memory::MemorySettingsStore;
pub use sqlite_settings_store::SqliteSettingsStore;
