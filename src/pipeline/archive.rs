// src/pipeline/archive.rs

//! Tarball creation for one run's output tree.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::{AppError, Result};

/// Bundle everything under `{output_root}/{run_date}/` into
/// `{run_date}.tar.gz` inside that same directory, keeping the originals.
///
/// Entries are collected before the archive file is created, and the archive
/// name is excluded from the collection, so a re-run never folds an earlier
/// archive into the new one. The tarball is written to a temp path and
/// renamed into place; any error here is fatal to the run, since a partial
/// archive is worse than none.
///
/// Returns `None` when the run directory does not exist (a run that
/// discovered nothing never creates it).
pub async fn run_archive(output_root: &Path, run_date: NaiveDate) -> Result<Option<PathBuf>> {
    let run_dir = output_root.join(run_date.to_string());
    if !run_dir.is_dir() {
        log::warn!("Nothing to archive: {} does not exist", run_dir.display());
        return Ok(None);
    }

    let archive_name = format!("{run_date}.tar.gz");
    let tmp_name = format!("{archive_name}.tmp");
    let archive_path = run_dir.join(&archive_name);

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(&run_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name == archive_name || name == tmp_name {
            continue;
        }
        names.push(name);
    }
    names.sort();

    log::info!("Creating tarball at {}", archive_path.display());

    let prefix = run_date.to_string();
    let task_run_dir = run_dir.clone();
    let task_archive_path = archive_path.clone();
    tokio::task::spawn_blocking(move || {
        build_tarball(&task_run_dir, &task_archive_path, &tmp_name, &prefix, &names)
    })
    .await
    .map_err(|e| AppError::archive(format!("archive task failed: {e}")))??;

    log::info!("Tarball complete: {}", archive_path.display());
    Ok(Some(archive_path))
}

/// Synchronous tar+gzip encoding, run on the blocking pool.
fn build_tarball(
    run_dir: &Path,
    archive_path: &Path,
    tmp_name: &str,
    prefix: &str,
    names: &[String],
) -> Result<()> {
    let tmp_path = run_dir.join(tmp_name);
    let file = std::fs::File::create(&tmp_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for name in names {
        let src = run_dir.join(name);
        let dst = format!("{prefix}/{name}");
        if src.is_dir() {
            builder.append_dir_all(&dst, &src)?;
        } else {
            builder.append_path_with_name(&src, &dst)?;
        }
        log::info!(" - added {} to tarball", src.display());
    }

    builder.into_inner()?.finish()?;
    std::fs::rename(&tmp_path, archive_path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    fn run_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    fn seed_run_dir(root: &Path) -> PathBuf {
        let type_dir = root.join("2026-08-07").join("CodeSystem");
        std::fs::create_dir_all(&type_dir).unwrap();
        for name in ["a.json", "b.json", "c.json"] {
            std::fs::write(type_dir.join(name), b"{}").unwrap();
        }
        type_dir
    }

    fn entry_names(archive_path: &Path) -> Vec<String> {
        let file = std::fs::File::open(archive_path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let mut names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| {
                e.unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .trim_end_matches('/')
                    .to_string()
            })
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_archives_run_directory_under_date_prefix() {
        let tmp = TempDir::new().unwrap();
        seed_run_dir(tmp.path());

        let archive_path = run_archive(tmp.path(), run_date()).await.unwrap().unwrap();
        assert_eq!(
            archive_path,
            tmp.path().join("2026-08-07").join("2026-08-07.tar.gz")
        );

        assert_eq!(
            entry_names(&archive_path),
            [
                "2026-08-07/CodeSystem",
                "2026-08-07/CodeSystem/a.json",
                "2026-08-07/CodeSystem/b.json",
                "2026-08-07/CodeSystem/c.json",
            ]
        );

        // originals are kept
        assert!(
            tmp.path()
                .join("2026-08-07")
                .join("CodeSystem")
                .join("a.json")
                .exists()
        );
    }

    #[tokio::test]
    async fn test_rearchiving_excludes_previous_archive() {
        let tmp = TempDir::new().unwrap();
        seed_run_dir(tmp.path());

        run_archive(tmp.path(), run_date()).await.unwrap();
        let archive_path = run_archive(tmp.path(), run_date()).await.unwrap().unwrap();

        let names = entry_names(&archive_path);
        assert!(!names.iter().any(|n| n.ends_with(".tar.gz")));
        assert_eq!(names.len(), 4);
    }

    #[tokio::test]
    async fn test_missing_run_directory_is_a_noop() {
        let tmp = TempDir::new().unwrap();
        let result = run_archive(tmp.path(), run_date()).await.unwrap();
        assert!(result.is_none());
    }
}
