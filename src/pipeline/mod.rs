//! Pipeline entry points for backup operations.
//!
//! - `run_backup`: Enumerate and download every configured resource type
//! - `run_archive`: Bundle the run's output tree into a tarball
//! - `run_prune`: Remove dated directories past the retention threshold

pub mod archive;
pub mod backup;
pub mod prune;

pub use archive::run_archive;
pub use backup::{RunSummary, TypeSummary, run_backup};
pub use prune::{PruneOutcome, run_prune};
