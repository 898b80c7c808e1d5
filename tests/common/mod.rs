//! Shared test fixtures and utilities for integration tests.
//!
//! # Available Fixtures
//!
//! - `sample_catalog`: a small tobacco/vape catalog covering every field and
//!   taxonomy kind
//! - `engine`: a [`ProductSearch`] with default configuration
//!
//! [`TempWorkspace`] provides a temp directory for tests that load config or
//! catalog files from disk.

use product_search::catalog::{InMemoryCatalog, Product, TaxonomyKind, TaxonomyTerm};
use product_search::config::SearchConfig;
use product_search::search::{ProductSearch, ScoredResult};
use rstest::fixture;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// A temporary directory that is removed when dropped.
#[allow(dead_code)] // Methods used across different integration test crates
pub struct TempWorkspace {
    _temp: TempDir,
    root: PathBuf,
}

#[allow(dead_code)] // Methods used across different integration test crates
impl TempWorkspace {
    /// Creates a new empty temporary workspace.
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        Self { _temp: temp, root }
    }

    /// Returns the root path of this workspace.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Creates a file with the given content and returns its full path.
    ///
    /// # Panics
    /// Panics if file creation fails.
    pub fn create_file(&self, path: &str, content: &str) -> PathBuf {
        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("Failed to create parent directory for '{}': {}", path, e)
            });
        }
        std::fs::write(&full_path, content)
            .unwrap_or_else(|e| panic!("Failed to write file '{}': {}", path, e));
        full_path
    }
}

impl Default for TempWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

#[fixture]
pub fn sample_catalog() -> InMemoryCatalog {
    InMemoryCatalog::new(vec![
        Product::new(1, "Peach Fuzz Disposable")
            .with_sku("PF-5000")
            .with_excerpt("Ripe peach with a fuzzy finish")
            .modified_at(300),
        Product::new(2, "Peach Rings")
            .with_sku("PEACH-R")
            .with_excerpt("Peach candy flavor")
            .with_body("Sweet peach rings e-liquid with a sour peach coating.")
            .with_term(TaxonomyTerm::new(TaxonomyKind::Category, "Peach", "peach"))
            .with_term(TaxonomyTerm::new(TaxonomyKind::Attribute, "Peach", "peach"))
            .modified_at(200),
        Product::new(3, "Brickhouse Maduro Robusto").modified_at(100),
        Product::new(4, "Brickhouse Connecticut").with_body("Mild, not a maduro"),
        Product::new(5, "Brick House Maduro Toro"),
        Product::new(6, "Sushi Roll Kit").with_sku("SUSHI-01"),
        Product::new(7, "Slush Machine"),
        Product::new(8, "Nicotine Pouch 6 mg")
            .with_term(TaxonomyTerm::new(TaxonomyKind::Tag, "Pouches", "pouches")),
        Product::new(9, "Cigar Sampler Pack").with_excerpt("Five cigar sample pack"),
    ])
}

#[fixture]
pub fn engine() -> ProductSearch {
    ProductSearch::default()
}

/// Engine using `config`.
#[allow(dead_code)]
pub fn engine_with(config: SearchConfig) -> ProductSearch {
    ProductSearch::new(Arc::new(config))
}

/// Product ids in result order.
#[allow(dead_code)]
pub fn ids(results: &[ScoredResult]) -> Vec<u64> {
    results.iter().map(|r| r.product.id).collect()
}
