//! Term expansion: bigrams, full phrase, unit phrases, synonyms and compact
//! (space-stripped) variants.

use super::matcher::compact;
use super::pattern::Pattern;
use super::query::dedup_capped;
use super::tokenize::{MIN_TOKEN_LENGTH, NormalizedQuery};
use crate::config::SynonymMap;

/// Cap on exact terms after deduplication.
pub(crate) const MAX_EXACT_TERMS: usize = 12;

/// Cap on adjacent bigrams contributed to each term list.
pub(crate) const MAX_BIGRAMS: usize = 5;

/// Patterns compiled from one query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    /// Tokens, phrases and synonyms matched as plain substrings.
    pub exact: Vec<Pattern>,
    /// Space-stripped phrases matched against space-stripped fields.
    pub compact: Vec<Pattern>,
    /// Typo-tolerant patterns; empty when fuzzy matching is off or gated.
    pub fuzzy: Vec<Pattern>,
}

impl TermSet {
    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.compact.is_empty() && self.fuzzy.is_empty()
    }
}

fn bigrams(tokens: &[&str]) -> impl Iterator<Item = String> {
    tokens
        .windows(2)
        .take(MAX_BIGRAMS)
        .map(|pair| format!("{} {}", pair[0], pair[1]))
}

/// Builds exact and compact terms. The fuzzy list is left empty.
pub fn expand(query: &NormalizedQuery, synonyms: &SynonymMap) -> TermSet {
    let tokens: Vec<&str> = query.token_texts().collect();

    let mut exact: Vec<String> = tokens.iter().map(|t| (*t).to_string()).collect();
    exact.extend(bigrams(&tokens));
    exact.extend(query.unit_phrases.iter().cloned());
    if tokens.len() >= 2 {
        exact.push(tokens.join(" "));
    }
    // Synonyms look at the unfiltered query so suppressed short words still count.
    exact.extend(synonyms.expansions(&query.lower).map(str::to_string));

    let exact = dedup_capped(
        exact
            .into_iter()
            .filter(|t| !t.is_empty())
            .map(Pattern::literal),
        MAX_EXACT_TERMS,
    );

    let joined = tokens.concat();
    let compact_terms = std::iter::once(joined)
        .chain(bigrams(&tokens).map(|bigram| compact(&bigram)))
        .filter(|term| term.chars().count() >= MIN_TOKEN_LENGTH)
        .map(Pattern::literal);
    let compact = dedup_capped(compact_terms, usize::MAX);

    TermSet {
        exact,
        compact,
        fuzzy: Vec::new(),
    }
}
