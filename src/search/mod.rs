//! Weighted, typo-tolerant product search.
//!
//! This module compiles a raw query into exact, compact and fuzzy patterns and
//! scores catalog products against them: normalization, term expansion, fuzzy
//! pattern generation, gating and relevance scoring.

// Module declarations
pub(crate) mod expand;
pub(crate) mod fuzzy;
pub(crate) mod matcher;
pub(crate) mod pattern;
pub(crate) mod query;
pub(crate) mod scoring;
pub(crate) mod tokenize;

// Public re-exports (used via lib.rs)
pub use expand::TermSet;
pub use fuzzy::{DEFAULT_FUZZY_MAX_TERMS, fuzzy_patterns};
pub use matcher::{Field, MatchMode, PreparedProduct, text_matches};
pub use pattern::{Pattern, SQL_LIKE_ESCAPE, escape_like};
pub use query::{CompiledQuery, QueryContext, RequiredToken, compile};
pub use scoring::{
    Contribution, FuzzyGate, ScoredResult, Scorer, check_fuzzy_gate, compare_results,
    score_products,
};
pub use tokenize::{NormalizedQuery, Token, TokenKind, normalize, strip_markup};

use crate::catalog::CatalogStore;
use crate::config::{ConfigHandle, EmptyQueryPolicy, SearchConfig};
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink, NoopSink};
use crate::error::SearchError;
use std::sync::Arc;

/// Result of running a query before the empty-query policy is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The query normalized to nothing; no filter was computed.
    NoTerms,
    /// Filtered products in final order.
    Ranked(Vec<ScoredResult>),
}

/// Product search engine bound to one configuration snapshot.
///
/// Cheap to clone and safe to share across threads. Each call to
/// [`ProductSearch::rank`] is independent.
#[derive(Clone)]
pub struct ProductSearch {
    config: Arc<SearchConfig>,
    sink: Arc<dyn DiagnosticSink>,
}

impl std::fmt::Debug for ProductSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductSearch")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Default for ProductSearch {
    fn default() -> Self {
        Self::new(Arc::new(SearchConfig::default()))
    }
}

impl ProductSearch {
    pub fn new(config: Arc<SearchConfig>) -> Self {
        Self {
            config,
            sink: Arc::new(NoopSink),
        }
    }

    /// Engine using the handle's current snapshot.
    pub fn from_handle(handle: &ConfigHandle) -> Self {
        Self::new(handle.snapshot())
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    fn context(&self) -> QueryContext<'_> {
        QueryContext::new(&self.config, self.sink.as_ref())
    }

    /// Compiles `raw` without touching a catalog.
    pub fn compile(&self, raw: &str) -> Option<CompiledQuery> {
        compile(raw, &self.context())
    }

    /// Filters and ranks the store's products for `raw`.
    pub fn rank<S>(&self, raw: &str, store: &S) -> Result<SearchOutcome, SearchError>
    where
        S: CatalogStore + ?Sized,
    {
        let ctx = self.context();
        let Some(query) = compile(raw, &ctx) else {
            return Ok(SearchOutcome::NoTerms);
        };

        let gate = check_fuzzy_gate(&query, store, &ctx)?;
        let products = store.products()?;
        let scorer = Scorer::new(&query, &self.config.weights, &gate);
        let results = score_products(&products, &scorer);

        ctx.record(&DiagnosticEvent::Ranked {
            candidates: products.len(),
            included: results.len(),
        });
        tracing::debug!(
            "Ranked '{}': {} of {} products included",
            query.normalized.lower,
            results.len(),
            products.len()
        );

        Ok(SearchOutcome::Ranked(results))
    }

    /// [`ProductSearch::rank`] with the configured [`EmptyQueryPolicy`] applied.
    pub fn search<S>(&self, raw: &str, store: &S) -> Result<Vec<ScoredResult>, SearchError>
    where
        S: CatalogStore + ?Sized,
    {
        match self.rank(raw, store)? {
            SearchOutcome::Ranked(results) => Ok(results),
            SearchOutcome::NoTerms => match self.config.empty_query {
                EmptyQueryPolicy::Empty => Ok(Vec::new()),
                EmptyQueryPolicy::All => {
                    let mut all: Vec<ScoredResult> = store
                        .products()?
                        .iter()
                        .map(|product| ScoredResult {
                            product: product.clone(),
                            score: 0,
                            title_all_tokens: false,
                            contributions: Vec::new(),
                        })
                        .collect();
                    all.sort_by(compare_results);
                    Ok(all)
                }
            },
        }
    }
}
