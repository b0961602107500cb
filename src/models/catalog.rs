// src/models/catalog.rs

//! Listing-page wire types and resource descriptors.
//!
//! A search against `{endpoint}/{resourceType}` returns a Bundle: an ordered
//! set of entries plus relation links, where `link[relation="next"]` carries
//! the cursor URL of the following page.

use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::models::MissingEntriesPolicy;

/// Raw search Bundle as returned by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct Bundle {
    /// Relation links; `next` points at the following page.
    #[serde(default)]
    pub link: Vec<BundleLink>,

    /// Matched entries. Servers omit the array entirely for some empty
    /// result sets, which is distinct from an explicit empty array.
    #[serde(default)]
    pub entry: Option<Vec<BundleEntry>>,
}

/// A single relation link on a Bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleLink {
    pub relation: String,
    pub url: String,
}

/// One matched entry of a search Bundle.
#[derive(Debug, Clone, Deserialize)]
pub struct BundleEntry {
    /// Absolute URL of the full resource representation.
    #[serde(rename = "fullUrl")]
    pub full_url: Option<String>,

    /// Summary of the matched resource.
    pub resource: Option<EntryResource>,
}

/// The resource summary carried inside a Bundle entry.
#[derive(Debug, Clone, Deserialize)]
pub struct EntryResource {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: Option<String>,
    pub version: Option<String>,
}

/// Everything needed to download one discovered resource.
///
/// Created per listing entry and consumed exactly once by a fetch worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// Server-assigned id, unique within one resource type's listing.
    pub resource_id: String,

    /// Display name, when the resource declares one.
    pub title: Option<String>,

    /// The resource's stable logical identifier.
    pub canonical_url: String,

    /// Absolute URL to retrieve the full representation.
    pub fetch_url: String,

    /// Business version, when the resource declares one.
    pub version: Option<String>,
}

impl ResourceDescriptor {
    /// Build a descriptor from a raw Bundle entry.
    ///
    /// `fullUrl`, `resource.id` and `resource.url` are required by the
    /// catalog's contract; a missing one fails extraction for the page.
    fn from_entry(entry: BundleEntry, source_url: &str, index: usize) -> Result<Self> {
        let fetch_url = entry
            .full_url
            .filter(|u| !u.is_empty())
            .ok_or_else(|| missing_field(source_url, index, "fullUrl"))?;

        let resource = entry
            .resource
            .ok_or_else(|| missing_field(source_url, index, "resource"))?;

        let resource_id = resource
            .id
            .filter(|v| !v.is_empty())
            .ok_or_else(|| missing_field(source_url, index, "resource.id"))?;

        let canonical_url = resource
            .url
            .filter(|v| !v.is_empty())
            .ok_or_else(|| missing_field(source_url, index, "resource.url"))?;

        Ok(Self {
            resource_id,
            title: resource.name.filter(|v| !v.is_empty()),
            canonical_url,
            fetch_url,
            version: resource.version.filter(|v| !v.is_empty()),
        })
    }
}

fn missing_field(source_url: &str, index: usize, field: &str) -> AppError {
    AppError::malformed_page(source_url, format!("entry {index} is missing '{field}'"))
}

/// One parsed page of a paged catalog response.
#[derive(Debug, Clone)]
pub struct ListingPage {
    /// Descriptors in listing order.
    pub descriptors: Vec<ResourceDescriptor>,

    /// Cursor URL of the next page; absence terminates the walk.
    pub next_url: Option<String>,
}

impl ListingPage {
    /// Parse a raw Bundle into descriptors plus the next cursor.
    ///
    /// A Bundle without an `entry` array follows `on_missing_entries`; an
    /// empty `entry` array is always a valid page with zero descriptors.
    pub fn from_bundle(
        bundle: Bundle,
        source_url: &str,
        on_missing_entries: MissingEntriesPolicy,
    ) -> Result<Self> {
        let next_url = bundle
            .link
            .into_iter()
            .find(|link| link.relation == "next" && !link.url.is_empty())
            .map(|link| link.url);

        let raw_entries = match bundle.entry {
            Some(entries) => entries,
            None => match on_missing_entries {
                MissingEntriesPolicy::Empty => Vec::new(),
                MissingEntriesPolicy::Fail => {
                    return Err(AppError::malformed_page(
                        source_url,
                        "listing page has no 'entry' array",
                    ));
                }
            },
        };

        let descriptors = raw_entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| ResourceDescriptor::from_entry(entry, source_url, index))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            descriptors,
            next_url,
        })
    }
}
