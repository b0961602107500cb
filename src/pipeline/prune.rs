// src/pipeline/prune.rs

//! Retention pruning of dated output directories.

use std::path::{Path, PathBuf};

use chrono::{Days, NaiveDate};

use crate::error::Result;

/// What happened to one deletion candidate.
#[derive(Debug)]
pub struct PruneOutcome {
    pub path: PathBuf,
    pub date: NaiveDate,
    pub deleted: bool,
    pub error: Option<String>,
}

/// Remove dated subdirectories of `output_root` that are at least
/// `retention_days` old.
///
/// The cutoff is inclusive: a directory dated exactly `retention_days` ago
/// is deleted. Only immediate subdirectories whose names parse as ISO dates
/// are considered; everything else is left alone. A failure deleting one
/// candidate (permissions, typically) is recorded in its outcome and never
/// aborts the remaining candidates. `retention_days == 0` disables pruning.
pub async fn run_prune(
    output_root: &Path,
    retention_days: u32,
    today: NaiveDate,
) -> Result<Vec<PruneOutcome>> {
    if retention_days == 0 {
        log::info!("No directories were removed (retention disabled)");
        return Ok(Vec::new());
    }

    let cutoff = today - Days::new(u64::from(retention_days));
    log::info!(
        "Removing from {}, >= {} day(s) ago (cutoff {})",
        output_root.display(),
        retention_days,
        cutoff
    );

    let mut candidates = Vec::new();
    let mut entries = tokio::fs::read_dir(output_root).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(name, "%Y-%m-%d") else {
            continue;
        };
        if date <= cutoff {
            candidates.push((date, entry.path()));
        }
    }
    candidates.sort();

    let mut outcomes = Vec::with_capacity(candidates.len());
    for (date, path) in candidates {
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                log::info!(" - {} -- deleted", path.display());
                outcomes.push(PruneOutcome {
                    path,
                    date,
                    deleted: true,
                    error: None,
                });
            }
            Err(error) => {
                log::error!("Failed to delete {}: {}", path.display(), error);
                outcomes.push(PruneOutcome {
                    path,
                    date,
                    deleted: false,
                    error: Some(error.to_string()),
                });
            }
        }
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    fn make_dated_dir(root: &Path, days_ago: u64) -> PathBuf {
        let date = today() - Days::new(days_ago);
        let dir = root.join(date.to_string());
        std::fs::create_dir_all(dir.join("CodeSystem")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_inclusive_cutoff_boundary() {
        let tmp = TempDir::new().unwrap();
        let keep = make_dated_dir(tmp.path(), 5);
        let at_cutoff = make_dated_dir(tmp.path(), 10);
        let older = make_dated_dir(tmp.path(), 11);

        let outcomes = run_prune(tmp.path(), 10, today()).await.unwrap();

        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|o| o.deleted && o.error.is_none()));
        assert!(keep.exists());
        assert!(!at_cutoff.exists());
        assert!(!older.exists());
    }

    #[tokio::test]
    async fn test_zero_retention_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let old = make_dated_dir(tmp.path(), 400);

        let outcomes = run_prune(tmp.path(), 0, today()).await.unwrap();
        assert!(outcomes.is_empty());
        assert!(old.exists());
    }

    #[tokio::test]
    async fn test_non_date_names_are_never_deleted() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("not-a-date")).unwrap();
        std::fs::create_dir(tmp.path().join("2026-08-07junk")).unwrap();
        std::fs::write(tmp.path().join("1970-01-01"), b"a file, not a dir").unwrap();

        let outcomes = run_prune(tmp.path(), 1, today()).await.unwrap();
        assert!(outcomes.is_empty());
        assert!(tmp.path().join("not-a-date").exists());
        assert!(tmp.path().join("2026-08-07junk").exists());
        assert!(tmp.path().join("1970-01-01").exists());
    }

    #[tokio::test]
    async fn test_candidates_processed_oldest_first() {
        let tmp = TempDir::new().unwrap();
        make_dated_dir(tmp.path(), 30);
        make_dated_dir(tmp.path(), 20);
        make_dated_dir(tmp.path(), 40);

        let outcomes = run_prune(tmp.path(), 15, today()).await.unwrap();
        let dates: Vec<_> = outcomes.iter().map(|o| o.date).collect();
        let mut sorted = dates.clone();
        sorted.sort();
        assert_eq!(dates, sorted);
        assert_eq!(outcomes.len(), 3);
    }
}
