// src/services/fetch.rs

//! Bounded-concurrency resource downloads.
//!
//! Drains a type's descriptors across a fixed number of workers. A failure
//! fetching or writing one resource is recorded against that descriptor and
//! never aborts the siblings; the caller reads overall run health from the
//! returned report.

use std::path::PathBuf;

use futures::stream::{self, StreamExt};

use crate::error::{AppError, Result};
use crate::models::ResourceDescriptor;
use crate::storage::OutputLayout;
use crate::utils::http::Transport;

/// One descriptor that could not be fetched or persisted.
#[derive(Debug)]
pub struct FetchFailure {
    pub descriptor: ResourceDescriptor,
    pub error: AppError,
}

/// Outcome of draining one resource type's descriptors.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub success_count: usize,
    pub failures: Vec<FetchFailure>,
}

impl FetchReport {
    /// True when every descriptor was persisted.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Service downloading discovered resources into the output layout.
pub struct ResourceFetcher<'a> {
    transport: &'a dyn Transport,
    layout: &'a OutputLayout,
}

impl<'a> ResourceFetcher<'a> {
    pub fn new(transport: &'a dyn Transport, layout: &'a OutputLayout) -> Self {
        Self { transport, layout }
    }

    /// Download every descriptor with at most `concurrency` requests in
    /// flight. Returns only once every worker has drained, so callers may
    /// archive or prune immediately afterwards.
    pub async fn fetch_all(
        &self,
        resource_type: &str,
        descriptors: Vec<ResourceDescriptor>,
        concurrency: usize,
    ) -> Result<FetchReport> {
        let concurrency = concurrency.max(1);
        self.layout.ensure_type_dir(resource_type).await?;

        log::info!(
            "Downloading {} {} resource(s) with {} parallel worker(s)",
            descriptors.len(),
            resource_type,
            concurrency
        );

        let mut report = FetchReport::default();
        let mut downloads = stream::iter(descriptors)
            .map(|descriptor| async move {
                let result = self.fetch_one(resource_type, &descriptor).await;
                (descriptor, result)
            })
            .buffer_unordered(concurrency);

        while let Some((descriptor, result)) = downloads.next().await {
            match result {
                Ok(path) => {
                    report.success_count += 1;
                    log::info!(
                        " - {} (canonical {}) -> {}",
                        descriptor.fetch_url,
                        descriptor.canonical_url,
                        path.display()
                    );
                }
                Err(error) => {
                    log::warn!("Failed to fetch {}: {}", descriptor.fetch_url, error);
                    report.failures.push(FetchFailure { descriptor, error });
                }
            }
        }

        Ok(report)
    }

    /// Fetch one resource and persist its body pretty-printed.
    async fn fetch_one(
        &self,
        resource_type: &str,
        descriptor: &ResourceDescriptor,
    ) -> Result<PathBuf> {
        let body = self.transport.get_json(&descriptor.fetch_url).await?;
        let path = self.layout.target_path(resource_type, descriptor);
        self.layout.write_pretty_json(&path, &body).await?;
        Ok(path)
    }
}
