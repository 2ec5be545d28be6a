// Money Pot - Core Library
// Exposes the allocation model, storage and configuration for the CLI, TUI and tests

pub mod allocation;
pub mod config;
pub mod db;
pub mod record;
pub mod storage;
pub mod store;
pub mod summary;

// Re-export commonly used types
pub use allocation::{
    parse_percentage, parse_total, round2, AllocationState, AllocationStatus, Category,
    SEED_CATEGORIES,
};
pub use config::{Cli, Command, Config};
pub use db::SqliteStore;
pub use record::{PersistedState, RECORD_VERSION};
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use store::{AllocationStore, STORAGE_KEY};
pub use summary::{format_money, format_percentage, AllocationSummary, GoalRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
