// src/models/run.rs

//! Per-run execution context.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::models::{Config, MissingEntriesPolicy};

/// Identifies one execution of the backup job.
///
/// Built once from configuration at process start and shared read-only by
/// every component. The run date in particular is fixed here and never
/// recomputed, so a run straddling midnight still writes one consistent
/// dated tree.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Calendar date naming this run's output directory
    pub run_date: NaiveDate,

    /// Base FHIR endpoint, trailing slashes stripped
    pub endpoint: String,

    /// Resource types to back up, in order
    pub resource_types: Vec<String>,

    /// Absolute or relative base output directory
    pub output_root: PathBuf,

    /// Parallel downloads within one resource type, >= 1
    pub concurrency: usize,

    /// Age threshold for pruning dated directories (0 = never prune)
    pub retention_days: u32,

    /// Whether to bundle the run's output into a tarball
    pub archive: bool,

    /// Policy for listing pages without an `entry` array
    pub on_missing_entries: MissingEntriesPolicy,
}

impl RunContext {
    /// Build the context for a run starting on `run_date`.
    pub fn new(config: &Config, run_date: NaiveDate) -> Self {
        Self {
            run_date,
            endpoint: config.server.endpoint.clone(),
            resource_types: config.backup.resource_types.clone(),
            output_root: config.backup.output_dir.clone(),
            concurrency: config.backup.parallel.max(1),
            retention_days: config.retention.delete_days,
            archive: config.retention.tarball,
            on_missing_entries: config.backup.on_missing_entries,
        }
    }

    /// Listing URL for one resource type.
    pub fn listing_url(&self, resource_type: &str) -> String {
        format!("{}/{}", self.endpoint, resource_type)
    }
}
