//! Request-scoped query compilation.
//!
//! [`QueryContext`] carries the configuration snapshot and diagnostic sink for
//! one request. [`compile`] runs normalization, expansion and fuzzy generation
//! and returns a [`CompiledQuery`], which is all later stages need.

use super::expand::{TermSet, expand};
use super::fuzzy::fuzzy_patterns;
use super::matcher::compact;
use super::pattern::Pattern;
use super::tokenize::{NormalizedQuery, Token, TokenKind, normalize};
use crate::config::SearchConfig;
use crate::diagnostics::{DiagnosticEvent, DiagnosticSink};
use ahash::AHashSet;
use std::fmt::{self, Debug, Formatter};

/// Deduplicates patterns preserving first occurrence, keeping at most `cap`.
pub(crate) fn dedup_capped<I>(patterns: I, cap: usize) -> Vec<Pattern>
where
    I: IntoIterator<Item = Pattern>,
{
    let mut seen = AHashSet::new();
    patterns
        .into_iter()
        .filter(|p| !p.is_empty() && seen.insert(p.clone()))
        .take(cap)
        .collect()
}

/// Per-request state threaded through every pipeline stage by reference.
#[derive(Clone, Copy)]
pub struct QueryContext<'a> {
    config: &'a SearchConfig,
    sink: &'a dyn DiagnosticSink,
}

impl Debug for QueryContext<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryContext")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> QueryContext<'a> {
    pub const fn new(config: &'a SearchConfig, sink: &'a dyn DiagnosticSink) -> Self {
        Self { config, sink }
    }

    pub const fn config(&self) -> &'a SearchConfig {
        self.config
    }

    pub fn record(&self, event: &DiagnosticEvent<'_>) {
        self.sink.record(event);
    }
}

/// A token after the first ("brand") position that the title must contain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredToken {
    pub exact: Pattern,
    /// Matched against the whitespace-stripped title.
    pub compact: Pattern,
    /// Fuzzy patterns derived from this token alone.
    pub fuzzy: Vec<Pattern>,
}

/// Everything derived from a raw query, ready for scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub normalized: NormalizedQuery,
    pub terms: TermSet,
    /// Per-token title requirements; empty when the brand gate does not apply.
    pub brand_requirements: Vec<RequiredToken>,
}

impl CompiledQuery {
    pub fn tokens(&self) -> &[Token] {
        &self.normalized.tokens
    }

    /// Required token texts for the all-tokens title bonus.
    pub fn required(&self) -> &[String] {
        &self.normalized.required
    }
}

/// Compiles `raw` into term sets.
///
/// Returns `None` when the query has no usable tokens; callers decide what an
/// empty query means (see [`crate::config::EmptyQueryPolicy`]).
pub fn compile(raw: &str, ctx: &QueryContext<'_>) -> Option<CompiledQuery> {
    let config = ctx.config();

    let normalized = normalize(raw);
    ctx.record(&DiagnosticEvent::Normalized {
        raw,
        query: &normalized,
    });
    if normalized.is_empty() {
        ctx.record(&DiagnosticEvent::NoTerms { raw });
        return None;
    }

    let mut terms = expand(&normalized, &config.synonyms);

    let token_count = normalized.tokens.len();
    let fuzzy_enabled = config.fuzzy_enabled_for(token_count);
    if fuzzy_enabled {
        terms.fuzzy = fuzzy_patterns(normalized.token_texts(), config.fuzzy_max_terms);
    }
    ctx.record(&DiagnosticEvent::Expanded { terms: &terms });

    let brand_requirements = if config.require_tokens_after_brand && token_count > 1 {
        brand_requirements(
            &normalized.tokens[1..],
            fuzzy_enabled,
            config.fuzzy_max_terms,
        )
    } else {
        Vec::new()
    };

    tracing::debug!(
        "Compiled query '{}': {} exact, {} compact, {} fuzzy, {} required after brand",
        normalized.lower,
        terms.exact.len(),
        terms.compact.len(),
        terms.fuzzy.len(),
        brand_requirements.len()
    );

    Some(CompiledQuery {
        normalized,
        terms,
        brand_requirements,
    })
}

/// Numbers and bare units describe a variant rather than the product, so they
/// are never individually required.
fn brand_requirements(
    tokens: &[Token],
    fuzzy_enabled: bool,
    fuzzy_max: usize,
) -> Vec<RequiredToken> {
    tokens
        .iter()
        .filter(|t| !matches!(t.kind(), TokenKind::Numeric | TokenKind::Unit))
        .map(|t| RequiredToken {
            exact: Pattern::literal(t.text()),
            compact: Pattern::literal(compact(t.text())),
            fuzzy: if fuzzy_enabled {
                fuzzy_patterns([t.text()], fuzzy_max)
            } else {
                Vec::new()
            },
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{MemorySink, NoopSink};
    use assert2::check;

    fn compile_with(raw: &str, config: &SearchConfig) -> Option<CompiledQuery> {
        compile(raw, &QueryContext::new(config, &NoopSink))
    }

    #[test]
    fn test_single_token_enables_fuzzy_by_default() {
        let compiled = compile_with("sush", &SearchConfig::default()).unwrap();
        let fuzzy = &compiled.terms.fuzzy;
        check!(fuzzy.contains(&Pattern::from_segments(["s", "u", "s", "h"])));
        check!(fuzzy.contains(&Pattern::from_segments(["s", "ush"])));
        check!(compiled.brand_requirements.is_empty());
    }

    #[test]
    fn test_multi_token_disables_fuzzy_by_default() {
        let compiled = compile_with("brickhouse maduro", &SearchConfig::default()).unwrap();
        check!(compiled.terms.fuzzy.is_empty());
        check!(compiled.brand_requirements.len() == 1);
        check!(compiled.brand_requirements[0].exact == Pattern::literal("maduro"));
        check!(compiled.brand_requirements[0].fuzzy.is_empty());
    }

    #[test]
    fn test_forced_fuzzy_feeds_brand_requirements() {
        let config = SearchConfig {
            enable_fuzzy: Some(true),
            ..SearchConfig::default()
        };
        let compiled = compile_with("brickhouse maduro", &config).unwrap();
        check!(compiled.terms.fuzzy.len() == 8);
        check!(compiled.brand_requirements[0].fuzzy.len() == 5);
    }

    #[test]
    fn test_numbers_and_units_not_required() {
        let compiled = compile_with("pouch 6 mg", &SearchConfig::default()).unwrap();
        // "6 mg" merges into one measure token, which is required.
        check!(compiled.brand_requirements.len() == 1);
        check!(compiled.brand_requirements[0].compact == Pattern::literal("6mg"));

        let compiled = compile_with("pouch 20 oz lb", &SearchConfig::default()).unwrap();
        let required: Vec<_> = compiled
            .brand_requirements
            .iter()
            .map(|r| r.exact.to_string())
            .collect();
        check!(required == ["20oz"]);
    }

    #[test]
    fn test_brand_gate_disabled() {
        let config = SearchConfig {
            require_tokens_after_brand: false,
            ..SearchConfig::default()
        };
        let compiled = compile_with("brickhouse maduro", &config).unwrap();
        check!(compiled.brand_requirements.is_empty());
    }

    #[test]
    fn test_empty_query_records_no_terms() {
        let sink = MemorySink::default();
        let config = SearchConfig::default();
        let result = compile("  <br/> ", &QueryContext::new(&config, &sink));
        check!(result.is_none());
        check!(sink.stages() == ["normalized", "no_terms"]);
    }

    #[test]
    fn test_stages_recorded_in_order() {
        let sink = MemorySink::default();
        let config = SearchConfig::default();
        let _ = compile("peach fuzz", &QueryContext::new(&config, &sink));
        check!(sink.stages() == ["normalized", "expanded"]);
    }

    #[test]
    fn test_dedup_capped() {
        let patterns = ["a", "b", "a", "c", "", "d"].map(Pattern::literal);
        let deduped = dedup_capped(patterns, 3);
        check!(deduped == ["a", "b", "c"].map(Pattern::literal));
    }
}
