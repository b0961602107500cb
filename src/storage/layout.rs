//! Deterministic output layout for one run.
//!
//! ## Directory Structure
//!
//! ```text
//! {output_root}/
//! └── 2026-08-07/                  # one directory per run date
//!     ├── CodeSystem/
//!     │   └── codesystem-loinc_loinc_2026-08-07.json
//!     ├── ValueSet/
//!     └── 2026-08-07.tar.gz        # optional archive of the day's tree
//! ```
//!
//! The dated directory is the retention pruner's deletion unit. Every write
//! goes to a temp path and is renamed into place, so a consumable path never
//! holds a partial file.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use crate::error::Result;
use crate::models::ResourceDescriptor;
use crate::utils::slugify;

/// Path policy for one run's output tree.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    output_root: PathBuf,
    run_date: NaiveDate,
}

impl OutputLayout {
    /// Create a layout rooted at `output_root` for the given run date.
    pub fn new(output_root: impl Into<PathBuf>, run_date: NaiveDate) -> Self {
        Self {
            output_root: output_root.into(),
            run_date,
        }
    }

    /// The dated directory holding everything this run produces.
    pub fn run_dir(&self) -> PathBuf {
        self.output_root.join(self.run_date.to_string())
    }

    /// Directory for one resource type's files.
    pub fn type_dir(&self, resource_type: &str) -> PathBuf {
        self.run_dir().join(resource_type)
    }

    /// Create a resource type's directory, parents included, idempotently.
    pub async fn ensure_type_dir(&self, resource_type: &str) -> Result<PathBuf> {
        let dir = self.type_dir(resource_type);
        tokio::fs::create_dir_all(&dir).await?;
        Ok(dir)
    }

    /// Target file for one descriptor.
    ///
    /// Deterministic for identical inputs; descriptors whose id and title
    /// collide after slugification overwrite each other, which is accepted
    /// since ids are unique within a type.
    pub fn target_path(&self, resource_type: &str, descriptor: &ResourceDescriptor) -> PathBuf {
        let stem = format!(
            "{}-{}_{}_{}",
            resource_type,
            descriptor.resource_id,
            descriptor.title.as_deref().unwrap_or(""),
            self.run_date
        );
        self.type_dir(resource_type)
            .join(format!("{}.json", slugify(&stem)))
    }

    /// Write a value pretty-printed to `path`, atomically.
    pub async fn write_pretty_json<T: Serialize + ?Sized>(
        &self,
        path: &Path,
        value: &T,
    ) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(path, &bytes).await
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn layout(root: &Path) -> OutputLayout {
        OutputLayout::new(root, NaiveDate::from_ymd_opt(2026, 8, 7).unwrap())
    }

    fn descriptor(title: Option<&str>) -> ResourceDescriptor {
        ResourceDescriptor {
            resource_id: "loinc".to_string(),
            title: title.map(String::from),
            canonical_url: "http://loinc.org".to_string(),
            fetch_url: "https://x/fhir/CodeSystem/loinc".to_string(),
            version: None,
        }
    }

    #[test]
    fn test_target_path_is_safe_and_stable() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(tmp.path());
        let descriptor = descriptor(Some("LOINC — Größe & Test!"));

        let first = layout.target_path("CodeSystem", &descriptor);
        let second = layout.target_path("CodeSystem", &descriptor);
        assert_eq!(first, second);

        let name = first.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, "codesystem-loinc_loinc-grosse-test_2026-08-07.json");
        assert!(
            name.trim_end_matches(".json")
                .chars()
                .all(|c| c.is_ascii_lowercase()
                    || c.is_ascii_digit()
                    || c == '-'
                    || c == '_')
        );
    }

    #[test]
    fn test_target_path_without_title() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(tmp.path());
        let path = layout.target_path("CodeSystem", &descriptor(None));
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "codesystem-loinc__2026-08-07.json"
        );
    }

    #[tokio::test]
    async fn test_ensure_type_dir_idempotent() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(tmp.path());

        let dir = layout.ensure_type_dir("ValueSet").await.unwrap();
        assert!(dir.is_dir());
        layout.ensure_type_dir("ValueSet").await.unwrap();
        assert_eq!(dir, tmp.path().join("2026-08-07").join("ValueSet"));
    }

    #[tokio::test]
    async fn test_write_pretty_json_atomic_and_overwriting() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(tmp.path());
        let path = tmp.path().join("resource.json");

        layout
            .write_pretty_json(&path, &json!({ "id": "one" }))
            .await
            .unwrap();
        layout
            .write_pretty_json(&path, &json!({ "id": "two" }))
            .await
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"id\": \"two\""));
        assert!(!tmp.path().join("resource.tmp").exists());
    }
}
