//! Save directory watcher
//!
//! Watches the save root and each save folder below it (non-recursive), turns
//! notify events into upload requests for the debounced uploader.
//!
//! ## Module Structure
//! - `types.rs`: backend-neutral events and classification results
//! - `pure.rs`: event mapping and classification
//! - `operations.rs`: watch set and upload trigger seams
//! - `pipelines.rs`: [`SaveWatcher`], the event loop

mod operations;
mod pipelines;
mod pure;
mod types;

pub use operations::DebouncedUploader;
pub use pipelines::SaveWatcher;
