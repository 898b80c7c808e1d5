//! Weighted, typo-tolerant relevance ranking for product catalogs.
//!
//! A raw query is normalized, expanded into exact, compact and fuzzy
//! patterns, gated, and scored against each product's fields. See
//! [`search::ProductSearch`] for the entry point.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod format;
pub mod logging;
pub mod search;

pub use catalog::{CatalogStore, InMemoryCatalog, Product, ProductId, TaxonomyKind, TaxonomyTerm};
pub use config::{
    ConfigHandle, EmptyQueryPolicy, MatchKind, SearchConfig, SynonymMap, WeightTable,
};
pub use error::{CatalogError, ConfigError, Result, SearchError};
pub use search::{CompiledQuery, ProductSearch, ScoredResult, SearchOutcome};
