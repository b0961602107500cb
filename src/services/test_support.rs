// src/services/test_support.rs

//! Scripted in-memory transport for exercising the walker and fetch pool
//! without a network.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::utils::http::Transport;

/// Transport serving canned JSON bodies keyed by URL.
#[derive(Default)]
pub(crate) struct StaticTransport {
    pages: HashMap<String, Value>,
    errors: HashMap<String, u16>,
    requests: Mutex<Vec<String>>,
}

impl StaticTransport {
    pub fn with_page(mut self, url: &str, body: Value) -> Self {
        self.pages.insert(url.to_string(), body);
        self
    }

    pub fn with_error(mut self, url: &str, status: u16) -> Self {
        self.errors.insert(url.to_string(), status);
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StaticTransport {
    async fn get_json(&self, url: &str) -> Result<Value> {
        self.requests.lock().unwrap().push(url.to_string());
        if let Some(status) = self.errors.get(url) {
            return Err(AppError::transport(url, *status));
        }
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| AppError::transport(url, 404))
    }
}

/// Build a listing-page body with one entry per id and an optional next link.
pub(crate) fn listing_body(base: &str, ids: &[&str], next: Option<&str>) -> Value {
    let entries: Vec<Value> = ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "fullUrl": format!("{base}/{id}"),
                "resource": {
                    "id": id,
                    "name": format!("Resource {id}"),
                    "url": format!("http://example.org/{id}"),
                    "version": "1.0"
                }
            })
        })
        .collect();

    let mut links = vec![serde_json::json!({ "relation": "self", "url": base })];
    if let Some(next) = next {
        links.push(serde_json::json!({ "relation": "next", "url": next }));
    }

    serde_json::json!({ "link": links, "entry": entries })
}
