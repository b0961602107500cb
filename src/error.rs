// src/error.rs

//! Unified error handling for the backup application.

use std::fmt;

use thiserror::Error;

/// Result type alias for backup operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization failed
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Server returned a non-success status
    #[error("HTTP {status} getting from {url}")]
    Transport { url: String, status: u16 },

    /// Listing page is structurally unusable
    #[error("Malformed page from {url}: {message}")]
    MalformedPage { url: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Archive creation failed
    #[error("Archive error: {0}")]
    Archive(String),

    /// The run completed but some resources failed to download
    #[error("{0} resource(s) failed to download")]
    Incomplete(usize),
}

impl AppError {
    /// Create a transport error for a non-success status.
    pub fn transport(url: impl Into<String>, status: u16) -> Self {
        Self::Transport {
            url: url.into(),
            status,
        }
    }

    /// Create a malformed-page error with its source URL.
    pub fn malformed_page(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::MalformedPage {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create an archive error.
    pub fn archive(message: impl fmt::Display) -> Self {
        Self::Archive(message.to_string())
    }
}
