//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Terminology server connection settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Backup behavior settings
    #[serde(default)]
    pub backup: BackupConfig,

    /// Archiving and retention settings
    #[serde(default)]
    pub retention: RetentionConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Clamp and canonicalize values the way the CLI contract promises:
    /// trailing slashes are stripped from the endpoint and parallelism is
    /// raised to at least one worker.
    pub fn normalize(&mut self) {
        let trimmed = self.server.endpoint.trim_end_matches('/');
        if trimmed.len() != self.server.endpoint.len() {
            self.server.endpoint = trimmed.to_string();
        }
        self.backup.parallel = self.backup.parallel.max(1);
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.server.endpoint.trim().is_empty() {
            return Err(AppError::config("server.endpoint is empty"));
        }
        if let Err(e) = url::Url::parse(&self.server.endpoint) {
            return Err(AppError::config(format!(
                "server.endpoint is not a valid URL: {e}"
            )));
        }
        if self.server.user_agent.trim().is_empty() {
            return Err(AppError::config("server.user_agent is empty"));
        }
        if self.server.timeout_secs == 0 {
            return Err(AppError::config("server.timeout_secs must be > 0"));
        }
        if self.backup.resource_types.is_empty() {
            return Err(AppError::config("backup.resource_types is empty"));
        }
        if self.backup.parallel == 0 {
            return Err(AppError::config("backup.parallel must be > 0"));
        }
        if self.backup.output_dir.as_os_str().is_empty() {
            return Err(AppError::config("backup.output_dir is empty"));
        }
        Ok(())
    }
}

/// Terminology server connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base FHIR endpoint of the server
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Raw `Name: value` headers passed with every request
    #[serde(default)]
    pub headers: Vec<String>,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            headers: Vec::new(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Backup behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Resource types to back up, in order
    #[serde(default = "defaults::resource_types")]
    pub resource_types: Vec<String>,

    /// Destination directory for dated output trees
    #[serde(default = "defaults::output_dir")]
    pub output_dir: PathBuf,

    /// Number of parallel downloads within one resource type
    #[serde(default = "defaults::parallel")]
    pub parallel: usize,

    /// How to treat a listing page without an `entry` array
    #[serde(default)]
    pub on_missing_entries: MissingEntriesPolicy,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            resource_types: defaults::resource_types(),
            output_dir: defaults::output_dir(),
            parallel: defaults::parallel(),
            on_missing_entries: MissingEntriesPolicy::default(),
        }
    }
}

/// Archiving and retention settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Remove dated directories at least this many days old (0 = never)
    #[serde(default)]
    pub delete_days: u32,

    /// Bundle the run's output into a tarball
    #[serde(default)]
    pub tarball: bool,
}

/// Policy for a listing page that lacks an `entry` array entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingEntriesPolicy {
    /// Treat the page as an empty resource type and continue
    #[default]
    Empty,

    /// Treat the page as a malformed response and fail the run
    Fail,
}

mod defaults {
    use std::path::PathBuf;

    pub fn endpoint() -> String {
        "http://localhost:8080/fhir".into()
    }
    pub fn user_agent() -> String {
        "fhir-backup/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn resource_types() -> Vec<String> {
        vec![
            "CodeSystem".into(),
            "ValueSet".into(),
            "ConceptMap".into(),
            "StructureDefinition".into(),
        ]
    }
    pub fn output_dir() -> PathBuf {
        PathBuf::from("./output")
    }
    pub fn parallel() -> usize {
        1
    }
}
