//! Relevance scoring and the two inclusion gates.
//!
//! A product is included when some term matches one of its fields (the base
//! test) AND, for multi-token queries, every token after the first matches its
//! title on its own (the brand-structure gate). Fuzzy terms take part only when
//! the fuzzy gate is open, i.e. no title in the catalog matches the leading
//! exact or compact terms.
//!
//! Scores are plain sums of [`WeightTable`] weights, one per matched
//! (term, field) pair, plus a single bonus when the title contains every
//! required token. Such a full title match also ranks ahead of every partial
//! match whatever the sums are, see [`compare_results`].

use super::matcher::{Field, MatchMode, PreparedProduct};
use super::pattern::Pattern;
use super::query::{CompiledQuery, QueryContext};
use crate::catalog::{CatalogStore, Product, TaxonomyKind};
use crate::config::{MatchKind, WeightTable};
use crate::diagnostics::DiagnosticEvent;
use crate::error::CatalogError;
use std::cmp::Ordering;

/// Number of leading exact and compact terms looked up by the fuzzy gate.
pub(crate) const GATE_LOOKUP_TERMS: usize = 3;

/// Outcome of the fuzzy gate for one query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FuzzyGate {
    /// The query produced no fuzzy patterns.
    NoFuzzyTerms,
    /// Gating is switched off; fuzzy patterns always apply.
    Bypassed,
    /// No lookup term matched a title; fuzzy patterns apply.
    Open,
    /// A catalog title matched `hit`; fuzzy patterns are ignored.
    Suppressed { hit: Pattern, mode: MatchMode },
}

impl FuzzyGate {
    pub const fn allows_fuzzy(&self) -> bool {
        matches!(self, Self::Bypassed | Self::Open)
    }
}

/// Decides whether fuzzy patterns should take part in this query.
pub fn check_fuzzy_gate<S>(
    query: &CompiledQuery,
    store: &S,
    ctx: &QueryContext<'_>,
) -> Result<FuzzyGate, CatalogError>
where
    S: CatalogStore + ?Sized,
{
    let decision = if query.terms.fuzzy.is_empty() {
        FuzzyGate::NoFuzzyTerms
    } else if !ctx.config().gate_fuzzy_when_exact_or_compact_matches {
        FuzzyGate::Bypassed
    } else {
        let lookups = query
            .terms
            .exact
            .iter()
            .take(GATE_LOOKUP_TERMS)
            .map(|p| (p, MatchMode::Contains))
            .chain(
                query
                    .terms
                    .compact
                    .iter()
                    .take(GATE_LOOKUP_TERMS)
                    .map(|p| (p, MatchMode::Compact)),
            );

        let mut decision = FuzzyGate::Open;
        for (pattern, mode) in lookups {
            if store.any_title_matches(pattern, mode)? {
                decision = FuzzyGate::Suppressed {
                    hit: pattern.clone(),
                    mode,
                };
                break;
            }
        }
        decision
    };

    tracing::debug!("Fuzzy gate: {:?}", decision);
    ctx.record(&DiagnosticEvent::FuzzyGate {
        decision: decision.clone(),
    });
    Ok(decision)
}

/// One weighted (term, field) match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contribution {
    pub kind: MatchKind,
    /// `None` for the all-tokens title bonus.
    pub pattern: Option<Pattern>,
    pub weight: u32,
}

/// A product that passed the filter, with its relevance score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredResult {
    pub product: Product,
    pub score: u32,
    /// The title contains every required query token.
    pub title_all_tokens: bool,
    pub contributions: Vec<Contribution>,
}

/// Applies one compiled query to individual products.
#[derive(Debug)]
pub struct Scorer<'q> {
    query: &'q CompiledQuery,
    weights: &'q WeightTable,
    fuzzy: &'q [Pattern],
    required: Vec<Pattern>,
}

impl<'q> Scorer<'q> {
    pub fn new(query: &'q CompiledQuery, weights: &'q WeightTable, gate: &FuzzyGate) -> Self {
        let fuzzy: &[Pattern] = if gate.allows_fuzzy() {
            &query.terms.fuzzy
        } else {
            &[]
        };
        Self {
            query,
            weights,
            fuzzy,
            required: query.required().iter().map(Pattern::literal).collect(),
        }
    }

    /// Base test AND brand-structure gate.
    pub fn includes(&self, product: &PreparedProduct<'_>) -> bool {
        self.base_match(product) && self.passes_brand_gate(product)
    }

    /// Scores `product`, or `None` when it is filtered out.
    pub fn evaluate(&self, product: &PreparedProduct<'_>) -> Option<ScoredResult> {
        if !self.includes(product) {
            return None;
        }
        let title_all_tokens = self.title_has_all_tokens(product);
        let contributions = self.contributions(product, title_all_tokens);
        let score = contributions
            .iter()
            .fold(0u32, |acc, c| acc.saturating_add(c.weight));

        Some(ScoredResult {
            product: product.product().clone(),
            score,
            title_all_tokens,
            contributions,
        })
    }

    fn base_match(&self, product: &PreparedProduct<'_>) -> bool {
        let terms = &self.query.terms;
        terms.exact.iter().any(|p| {
            [Field::Title, Field::Excerpt, Field::Body, Field::Sku]
                .into_iter()
                .any(|field| product.matches(field, p))
                || product.taxonomy_matches(p, |_| true)
        }) || terms.compact.iter().any(|p| {
            product.matches(Field::CompactTitle, p) || product.matches(Field::CompactSku, p)
        }) || self
            .fuzzy
            .iter()
            .any(|p| product.matches(Field::Title, p) || product.matches(Field::Sku, p))
    }

    fn passes_brand_gate(&self, product: &PreparedProduct<'_>) -> bool {
        self.query.brand_requirements.iter().all(|req| {
            product.matches(Field::Title, &req.exact)
                || product.matches(Field::CompactTitle, &req.compact)
                || req.fuzzy.iter().any(|p| product.matches(Field::Title, p))
        })
    }

    fn title_has_all_tokens(&self, product: &PreparedProduct<'_>) -> bool {
        !self.required.is_empty() && self.required.iter().all(|p| product.matches(Field::Title, p))
    }

    fn contributions(
        &self,
        product: &PreparedProduct<'_>,
        title_all_tokens: bool,
    ) -> Vec<Contribution> {
        let mut out = Vec::new();
        let mut add = |kind: MatchKind, pattern: Option<&Pattern>| {
            out.push(Contribution {
                kind,
                pattern: pattern.cloned(),
                weight: self.weights.get(kind),
            });
        };

        for p in &self.query.terms.exact {
            if product.matches(Field::Title, p) {
                let kind = if p.is_phrase() {
                    MatchKind::TitlePhrase
                } else {
                    MatchKind::Title
                };
                add(kind, Some(p));
            }
            if product.matches(Field::Sku, p) {
                add(MatchKind::Sku, Some(p));
            }
            if product.taxonomy_matches(p, |k| k == TaxonomyKind::Attribute) {
                add(MatchKind::Attribute, Some(p));
            }
            if product.taxonomy_matches(p, |k| k != TaxonomyKind::Attribute) {
                add(MatchKind::Taxonomy, Some(p));
            }
            if product.matches(Field::Excerpt, p) {
                add(MatchKind::Excerpt, Some(p));
            }
            if product.matches(Field::Body, p) {
                add(MatchKind::Content, Some(p));
            }
        }

        for p in &self.query.terms.compact {
            if product.matches(Field::CompactTitle, p) {
                add(MatchKind::TitleFuzzy, Some(p));
            }
            if product.matches(Field::CompactSku, p) {
                add(MatchKind::SkuFuzzy, Some(p));
            }
        }

        for p in self.fuzzy {
            if product.matches(Field::Title, p) {
                add(MatchKind::TitleFuzzy, Some(p));
            }
            if product.matches(Field::Sku, p) {
                add(MatchKind::SkuFuzzy, Some(p));
            }
        }

        if title_all_tokens {
            add(MatchKind::TitleAllTokens, None);
        }

        out
    }
}

/// Full title matches first, then score descending, then most recently
/// modified, then lowest id.
pub fn compare_results(a: &ScoredResult, b: &ScoredResult) -> Ordering {
    b.title_all_tokens
        .cmp(&a.title_all_tokens)
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| b.product.modified.cmp(&a.product.modified))
        .then_with(|| a.product.id.cmp(&b.product.id))
}

/// Filters and scores `products`, returning them in final order.
pub fn score_products(products: &[Product], scorer: &Scorer<'_>) -> Vec<ScoredResult> {
    let mut results: Vec<ScoredResult> = products
        .iter()
        .filter_map(|product| scorer.evaluate(&PreparedProduct::new(product)))
        .collect();
    results.sort_by(compare_results);
    results
}
