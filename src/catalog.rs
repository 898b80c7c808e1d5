//! Catalog store abstraction and an in-memory implementation.
//!
//! The search core never owns products. It reads them through [`CatalogStore`],
//! which also answers the cheap existence checks used by the fuzzy gate.

use crate::error::CatalogError;
use crate::search::{MatchMode, Pattern, text_matches};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;

/// Stable product identifier, used as the final ordering tie-breaker.
pub type ProductId = u64;

/// Taxonomy a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaxonomyKind {
    Category,
    Tag,
    Attribute,
}

/// A category, tag or attribute value attached to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxonomyTerm {
    pub name: String,
    #[serde(default)]
    pub slug: String,
    pub kind: TaxonomyKind,
}

impl TaxonomyTerm {
    pub fn new(kind: TaxonomyKind, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            slug: slug.into(),
            kind,
        }
    }
}

/// A catalog product as exposed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub sku: String,
    /// Last creation/modification time in unix seconds.
    #[serde(default)]
    pub modified: i64,
    #[serde(default)]
    pub taxonomy: Vec<TaxonomyTerm>,
}

impl Product {
    pub fn new(id: ProductId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            excerpt: String::new(),
            body: String::new(),
            sku: String::new(),
            modified: 0,
            taxonomy: Vec::new(),
        }
    }

    pub fn with_excerpt(mut self, excerpt: impl Into<String>) -> Self {
        self.excerpt = excerpt.into();
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = sku.into();
        self
    }

    pub const fn modified_at(mut self, modified: i64) -> Self {
        self.modified = modified;
        self
    }

    pub fn with_term(mut self, term: TaxonomyTerm) -> Self {
        self.taxonomy.push(term);
        self
    }
}

/// Read access to the products a query runs against.
///
/// Implementations must be safe to call concurrently for independent queries.
pub trait CatalogStore {
    /// All products eligible for the current query.
    fn products(&self) -> Result<Cow<'_, [Product]>, CatalogError>;

    /// Whether any product title matches `pattern` under `mode`.
    ///
    /// The default scans [`CatalogStore::products`]; SQL-backed stores should
    /// answer with a single `EXISTS ... LIKE` query instead.
    fn any_title_matches(&self, pattern: &Pattern, mode: MatchMode) -> Result<bool, CatalogError> {
        let products = self.products()?;
        Ok(products
            .iter()
            .any(|product| text_matches(&product.title, pattern, mode)))
    }
}

/// A catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: Vec<Product>,
}

impl InMemoryCatalog {
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Loads a JSON array of products from `path`.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            return Err(CatalogError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let products: Vec<Product> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!("Loaded {} products from {}", products.len(), path.display());
        Ok(Self { products })
    }

    pub fn get(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl CatalogStore for InMemoryCatalog {
    fn products(&self) -> Result<Cow<'_, [Product]>, CatalogError> {
        Ok(Cow::Borrowed(&self.products))
    }
}
