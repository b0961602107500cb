// src/services/walker.rs

//! Cursor-linked catalog enumeration.
//!
//! Walks a resource type's listing pages by following `next` links until a
//! page carries none. Pages are fetched lazily, one at a time as consumed;
//! the walk is finite and not restartable.

use std::collections::HashSet;
use std::pin::pin;

use futures::stream::{self, Stream, TryStreamExt};

use crate::error::{AppError, Result};
use crate::models::{Bundle, ListingPage, MissingEntriesPolicy, ResourceDescriptor};
use crate::utils::http::Transport;
use crate::utils::resolve_url;

/// Service walking one resource type's paged listing.
pub struct CatalogWalker<'a> {
    transport: &'a dyn Transport,
    on_missing_entries: MissingEntriesPolicy,
}

struct WalkState {
    next: Option<String>,
    visited: HashSet<String>,
}

impl<'a> CatalogWalker<'a> {
    /// Create a walker over the given transport.
    pub fn new(transport: &'a dyn Transport, on_missing_entries: MissingEntriesPolicy) -> Self {
        Self {
            transport,
            on_missing_entries,
        }
    }

    /// Lazy sequence of listing pages starting at `base_url`.
    ///
    /// Each element is produced by one GET; the sequence ends the first time
    /// a page declares no next cursor. Cursor URLs are resolved against the
    /// page that declared them. A next cursor pointing back at an
    /// already-visited URL is a malformed-page error: re-reading a page would
    /// yield duplicate descriptors.
    pub fn pages<'s>(&'s self, base_url: &str) -> impl Stream<Item = Result<ListingPage>> + 's {
        let state = WalkState {
            next: Some(base_url.to_string()),
            visited: HashSet::new(),
        };

        stream::try_unfold(state, move |mut state| async move {
            let Some(url) = state.next.take() else {
                return Ok::<Option<(ListingPage, WalkState)>, AppError>(None);
            };
            if !state.visited.insert(url.clone()) {
                return Err(AppError::malformed_page(
                    url,
                    "pagination cycle: next link repeats an earlier page",
                ));
            }

            let base = url::Url::parse(&url)?;
            let page = self.fetch_page(&url).await?;
            state.next = page
                .next_url
                .as_deref()
                .map(|next| resolve_url(&base, next));
            Ok(Some((page, state)))
        })
    }

    /// Drain the walk and return every discovered descriptor in order.
    pub async fn collect_descriptors(&self, base_url: &str) -> Result<Vec<ResourceDescriptor>> {
        let mut pages = pin!(self.pages(base_url));
        let mut descriptors = Vec::new();
        let mut page_count = 0usize;

        while let Some(page) = pages.try_next().await? {
            page_count += 1;
            log::debug!(
                "Listing page {page_count}: {} entr(ies)",
                page.descriptors.len()
            );
            descriptors.extend(page.descriptors);
        }

        log::debug!("Walk of {base_url} finished after {page_count} page(s)");
        Ok(descriptors)
    }

    async fn fetch_page(&self, url: &str) -> Result<ListingPage> {
        log::info!("Requesting listing page from {url}");
        let body = self.transport.get_json(url).await?;
        let bundle: Bundle = serde_json::from_value(body)
            .map_err(|e| AppError::malformed_page(url, format!("not a parseable Bundle: {e}")))?;
        ListingPage::from_bundle(bundle, url, self.on_missing_entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{StaticTransport, listing_body};

    const BASE: &str = "https://x/fhir/CodeSystem";

    #[tokio::test]
    async fn test_walk_collects_every_descriptor_exactly_once() {
        let transport = StaticTransport::default()
            .with_page(BASE, listing_body(BASE, &["a", "b"], Some("https://x/p2")))
            .with_page(
                "https://x/p2",
                listing_body(BASE, &["c", "d"], Some("https://x/p3")),
            )
            .with_page("https://x/p3", listing_body(BASE, &["e"], None));

        let walker = CatalogWalker::new(&transport, MissingEntriesPolicy::Empty);
        let descriptors = walker.collect_descriptors(BASE).await.unwrap();

        let ids: Vec<_> = descriptors.iter().map(|d| d.resource_id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);
        assert_eq!(
            transport.requests(),
            [BASE, "https://x/p2", "https://x/p3"]
        );
    }

    #[tokio::test]
    async fn test_page_with_zero_entries_does_not_terminate() {
        let transport = StaticTransport::default()
            .with_page(BASE, listing_body(BASE, &[], Some("https://x/p2")))
            .with_page("https://x/p2", listing_body(BASE, &["a"], None));

        let walker = CatalogWalker::new(&transport, MissingEntriesPolicy::Empty);
        let descriptors = walker.collect_descriptors(BASE).await.unwrap();
        assert_eq!(descriptors.len(), 1);
    }

    #[tokio::test]
    async fn test_relative_next_link_resolves_against_page_url() {
        let mut page1 = listing_body(BASE, &["a"], None);
        page1["link"]
            .as_array_mut()
            .unwrap()
            .push(serde_json::json!({ "relation": "next", "url": "?page=2" }));
        let transport = StaticTransport::default()
            .with_page(BASE, page1)
            .with_page(
                "https://x/fhir/CodeSystem?page=2",
                listing_body(BASE, &["b"], None),
            );

        let walker = CatalogWalker::new(&transport, MissingEntriesPolicy::Empty);
        let descriptors = walker.collect_descriptors(BASE).await.unwrap();
        assert_eq!(descriptors.len(), 2);
    }

    #[tokio::test]
    async fn test_cursor_cycle_is_an_error() {
        let transport = StaticTransport::default()
            .with_page(BASE, listing_body(BASE, &["a"], Some("https://x/p2")))
            .with_page("https://x/p2", listing_body(BASE, &["b"], Some(BASE)));

        let walker = CatalogWalker::new(&transport, MissingEntriesPolicy::Empty);
        let err = walker.collect_descriptors(BASE).await.unwrap_err();
        assert!(err.to_string().contains("pagination cycle"));
    }

    #[tokio::test]
    async fn test_transport_error_aborts_walk() {
        let transport = StaticTransport::default()
            .with_page(BASE, listing_body(BASE, &["a"], Some("https://x/p2")))
            .with_error("https://x/p2", 500);

        let walker = CatalogWalker::new(&transport, MissingEntriesPolicy::Empty);
        let err = walker.collect_descriptors(BASE).await.unwrap_err();
        assert!(matches!(err, AppError::Transport { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_non_bundle_body_is_malformed() {
        let transport =
            StaticTransport::default().with_page(BASE, serde_json::json!({ "link": "nope" }));

        let walker = CatalogWalker::new(&transport, MissingEntriesPolicy::Empty);
        let err = walker.collect_descriptors(BASE).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedPage { .. }));
    }
}
