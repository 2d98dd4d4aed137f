pub mod operations;
pub mod types;

// Re-export types
pub use types::{SharedConfig, SyncConfig};

// Re-export operations
pub use operations::{init_first_run, load_cfg, save_cfg};
