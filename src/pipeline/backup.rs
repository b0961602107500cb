// src/pipeline/backup.rs

//! Backup pipeline: enumerate and download every configured resource type.

use crate::error::Result;
use crate::models::RunContext;
use crate::services::{CatalogWalker, FetchFailure, ResourceFetcher};
use crate::storage::OutputLayout;
use crate::utils::http::Transport;

/// Outcome for one resource type.
#[derive(Debug)]
pub struct TypeSummary {
    pub resource_type: String,
    pub discovered: usize,
    pub fetched: usize,
    pub failures: Vec<FetchFailure>,
}

/// Aggregated outcome of the fetch phase.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub types: Vec<TypeSummary>,
}

impl RunSummary {
    pub fn total_discovered(&self) -> usize {
        self.types.iter().map(|t| t.discovered).sum()
    }

    pub fn total_fetched(&self) -> usize {
        self.types.iter().map(|t| t.fetched).sum()
    }

    pub fn failure_count(&self) -> usize {
        self.types.iter().map(|t| t.failures.len()).sum()
    }

    /// True when every discovered resource was persisted.
    pub fn is_complete(&self) -> bool {
        self.failure_count() == 0
    }
}

/// Run the fetch phase for every configured resource type, one type at a
/// time. Returns only after the last worker pool has fully drained; callers
/// may archive and prune immediately afterwards.
///
/// An enumeration error (transport failure or malformed listing page) aborts
/// the run: a partial listing is never trusted. Per-resource download
/// failures are isolated and reported in the summary instead.
pub async fn run_backup(ctx: &RunContext, transport: &dyn Transport) -> Result<RunSummary> {
    let layout = OutputLayout::new(&ctx.output_root, ctx.run_date);
    log::info!(
        "Backing up {} resource type(s) to {}",
        ctx.resource_types.len(),
        layout.run_dir().display()
    );

    let walker = CatalogWalker::new(transport, ctx.on_missing_entries);
    let fetcher = ResourceFetcher::new(transport, &layout);
    let mut summary = RunSummary::default();

    for resource_type in &ctx.resource_types {
        let descriptors = walker
            .collect_descriptors(&ctx.listing_url(resource_type))
            .await?;
        let discovered = descriptors.len();
        log::info!("Got {discovered} resource(s) of type {resource_type}");

        if discovered == 0 {
            summary.types.push(TypeSummary {
                resource_type: resource_type.clone(),
                discovered: 0,
                fetched: 0,
                failures: Vec::new(),
            });
            continue;
        }

        let report = fetcher
            .fetch_all(resource_type, descriptors, ctx.concurrency)
            .await?;
        summary.types.push(TypeSummary {
            resource_type: resource_type.clone(),
            discovered,
            fetched: report.success_count,
            failures: report.failures,
        });
    }

    Ok(summary)
}
