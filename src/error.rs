//! Error handling types and utilities.

use std::path::PathBuf;

/// A specialized Result type for product-search binaries and glue code.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods. Library operations return the typed errors below.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when loading search configuration fails.
///
/// Malformed `weights` or `synonyms` sections are not errors; they fall back to
/// defaults. Only an unreadable or syntactically invalid file ends up here.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config: {0}")]
    Inline(#[from] toml::de::Error),
}

/// Error raised by a catalog store while answering a lookup.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog not found at {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse catalog {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// Lookup failure reported by a backing store.
    #[error("Catalog lookup failed: {0}")]
    Lookup(String),
}

/// Error surfaced to the host when a query cannot be executed.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}
