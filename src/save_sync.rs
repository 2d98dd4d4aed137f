//! Save synchronization controller
//!
//! Decides when a save folder is uploaded, when an upload written by the game
//! during shutdown is taken back, and when a newer remote save is pulled down.
//!
//! ## Module Structure
//! - `types.rs`: shared state, timings and outcomes
//! - `pure.rs`: path and time-window decisions
//! - `operations.rs`: filesystem side effects
//! - `pipelines.rs`: [`SyncController`], the orchestration

mod operations;
mod pipelines;
mod pure;
#[cfg(test)]
pub mod testing;
mod types;

pub use operations::list_save_folders;
pub use pipelines::SyncController;
pub use types::SyncTimings;
