//! Error types for leafdex.
//!
//! Library crates use [`LeafdexError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Severity is decided by the caller, not the variant: a [`LeafdexError::CatalogFetch`]
//! aborts a run, an [`LeafdexError::ItemFetch`] drops one item, and a
//! [`LeafdexError::SectionFetch`] only empties one section.

use std::path::PathBuf;

/// Top-level error type for all leafdex operations.
#[derive(Debug, thiserror::Error)]
pub enum LeafdexError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The document provider could not be started.
    #[error("engine error: {0}")]
    Engine(String),

    /// A single navigation failed (network, HTTP status, timeout).
    #[error("navigation error: {0}")]
    Navigation(String),

    /// The catalog index page could not be fetched.
    #[error("catalog fetch failed for {url}: {message}")]
    CatalogFetch { url: String, message: String },

    /// An item's detail page could not be fetched.
    #[error("item fetch failed for {url}: {message}")]
    ItemFetch { url: String, message: String },

    /// One section page of an item could not be fetched or parsed.
    #[error("section fetch failed for {url}: {message}")]
    SectionFetch { url: String, message: String },

    /// HTML parsing or content extraction error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Data validation error (bad URL, empty catalog, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeafdexError>;

impl LeafdexError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Tag a failure as fatal for the whole catalog.
    pub fn catalog_fetch(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::CatalogFetch {
            url: url.into(),
            message: cause.to_string(),
        }
    }

    /// Tag a failure as fatal for one item.
    pub fn item_fetch(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::ItemFetch {
            url: url.into(),
            message: cause.to_string(),
        }
    }

    /// Tag a failure as local to one section.
    pub fn section_fetch(url: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        Self::SectionFetch {
            url: url.into(),
            message: cause.to_string(),
        }
    }

    /// The URL the failure is tagged with, if any.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::CatalogFetch { url, .. }
            | Self::ItemFetch { url, .. }
            | Self::SectionFetch { url, .. } => Some(url),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for LeafdexError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = LeafdexError::config("concurrency must be at least 1");
        assert_eq!(err.to_string(), "config error: concurrency must be at least 1");

        let err = LeafdexError::validation("index URL has no host");
        assert!(err.to_string().contains("no host"));
    }

    #[test]
    fn fetch_errors_carry_url() {
        let cause = LeafdexError::Navigation("HTTP 503".into());
        let err = LeafdexError::item_fetch("https://example.com/medicines/aspirin/", &cause);
        assert_eq!(err.url(), Some("https://example.com/medicines/aspirin/"));
        assert!(err.to_string().contains("HTTP 503"));

        assert_eq!(LeafdexError::parse("bad").url(), None);
    }
}
