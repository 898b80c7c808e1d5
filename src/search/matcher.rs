//! Field-level match evaluation against a single product.

use super::pattern::Pattern;
use crate::catalog::{Product, TaxonomyKind};

/// How a field is prepared before a pattern is tested against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    /// Lowercased field, pattern must be contained.
    Contains,
    /// Lowercased field with all whitespace removed.
    Compact,
}

/// Product fields a pattern can be tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Excerpt,
    Body,
    Sku,
    CompactTitle,
    CompactSku,
}

/// Removes every whitespace character.
pub(crate) fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Tests `pattern` against raw `text` prepared according to `mode`.
pub fn text_matches(text: &str, pattern: &Pattern, mode: MatchMode) -> bool {
    let lower = text.to_lowercase();
    match mode {
        MatchMode::Contains => pattern.is_match(&lower),
        MatchMode::Compact => pattern.is_match(&compact(&lower)),
    }
}

/// Lowercased taxonomy term, prepared once per query.
#[derive(Debug)]
struct PreparedTerm {
    kind: TaxonomyKind,
    name: String,
    slug: String,
}

/// A product with its searchable fields lowercased and compacted once per query.
#[derive(Debug)]
pub struct PreparedProduct<'a> {
    product: &'a Product,
    title: String,
    excerpt: String,
    body: String,
    sku: String,
    compact_title: String,
    compact_sku: String,
    taxonomy: Vec<PreparedTerm>,
}

impl<'a> PreparedProduct<'a> {
    pub fn new(product: &'a Product) -> Self {
        let title = product.title.to_lowercase();
        let sku = product.sku.to_lowercase();
        Self {
            product,
            compact_title: compact(&title),
            compact_sku: compact(&sku),
            title,
            excerpt: product.excerpt.to_lowercase(),
            body: product.body.to_lowercase(),
            sku,
            taxonomy: product
                .taxonomy
                .iter()
                .map(|term| PreparedTerm {
                    kind: term.kind,
                    name: term.name.to_lowercase(),
                    slug: term.slug.to_lowercase(),
                })
                .collect(),
        }
    }

    pub const fn product(&self) -> &'a Product {
        self.product
    }

    fn field(&self, field: Field) -> &str {
        match field {
            Field::Title => &self.title,
            Field::Excerpt => &self.excerpt,
            Field::Body => &self.body,
            Field::Sku => &self.sku,
            Field::CompactTitle => &self.compact_title,
            Field::CompactSku => &self.compact_sku,
        }
    }

    /// Does `field` of this product contain `pattern`?
    ///
    /// Empty fields never match, mirroring a NULL column in a SQL store.
    pub fn matches(&self, field: Field, pattern: &Pattern) -> bool {
        let text = self.field(field);
        !text.is_empty() && pattern.is_match(text)
    }

    /// Does any taxonomy term accepted by `kinds` match by name or slug?
    pub fn taxonomy_matches(
        &self,
        pattern: &Pattern,
        kinds: impl Fn(TaxonomyKind) -> bool,
    ) -> bool {
        self.taxonomy.iter().filter(|t| kinds(t.kind)).any(|t| {
            (!t.name.is_empty() && pattern.is_match(&t.name))
                || (!t.slug.is_empty() && pattern.is_match(&t.slug))
        })
    }
}
