//! Search configuration: relevance weights, synonyms and feature flags.
//!
//! Configuration is loaded once (usually from TOML) and shared as an immutable
//! `Arc<SearchConfig>` snapshot. [`ConfigHandle`] swaps whole snapshots so a
//! reload never races with a query that is already scoring.

use crate::error::ConfigError;
use crate::search::fuzzy::DEFAULT_FUZZY_MAX_TERMS;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

/// Expands tilde (`~`) in a path to the user's home directory.
///
/// - `~/foo` becomes `/home/user/foo`
/// - `~` becomes `/home/user`
/// - Other paths are returned unchanged
pub fn expand_tilde(path: &str) -> Cow<'_, str> {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return Cow::Owned(home.join(stripped).display().to_string());
        }
    } else if path == "~"
        && let Some(home) = dirs::home_dir()
    {
        return Cow::Owned(home.display().to_string());
    }
    Cow::Borrowed(path)
}

/// Kind of match a weight applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Title,
    TitlePhrase,
    TitleAllTokens,
    Sku,
    Attribute,
    Taxonomy,
    Excerpt,
    Content,
    TitleFuzzy,
    SkuFuzzy,
}

impl MatchKind {
    pub const ALL: [Self; 10] = [
        Self::Title,
        Self::TitlePhrase,
        Self::TitleAllTokens,
        Self::Sku,
        Self::Attribute,
        Self::Taxonomy,
        Self::Excerpt,
        Self::Content,
        Self::TitleFuzzy,
        Self::SkuFuzzy,
    ];

    /// Configuration key for this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::TitlePhrase => "title_phrase",
            Self::TitleAllTokens => "title_all_tokens",
            Self::Sku => "sku",
            Self::Attribute => "attribute",
            Self::Taxonomy => "taxonomy",
            Self::Excerpt => "excerpt",
            Self::Content => "content",
            Self::TitleFuzzy => "title_fuzzy",
            Self::SkuFuzzy => "sku_fuzzy",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == key)
    }
}

/// Non-negative integer weight per [`MatchKind`].
///
/// `title_phrase` always exceeds `title`, which is therefore capped at
/// `u32::MAX - 1`; see [`WeightTable::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightTable {
    weights: [u32; MatchKind::ALL.len()],
}

impl Default for WeightTable {
    fn default() -> Self {
        let mut weights = [0; MatchKind::ALL.len()];
        for kind in MatchKind::ALL {
            weights[kind as usize] = match kind {
                MatchKind::Title => 80,
                MatchKind::TitlePhrase => 140,
                MatchKind::TitleAllTokens => 500,
                MatchKind::Sku => 40,
                MatchKind::Attribute => 25,
                MatchKind::Taxonomy | MatchKind::Excerpt => 20,
                MatchKind::Content => 10,
                MatchKind::TitleFuzzy => 8,
                MatchKind::SkuFuzzy => 6,
            };
        }
        Self { weights }
    }
}

impl WeightTable {
    pub const fn get(&self, kind: MatchKind) -> u32 {
        self.weights[kind as usize]
    }

    /// Sets one weight, then restores the phrase-over-title invariant.
    pub fn set(&mut self, kind: MatchKind, weight: u32) {
        self.weights[kind as usize] = weight;
        self.enforce_phrase_priority();
    }

    /// Builder-style [`WeightTable::set`].
    #[must_use]
    pub fn with(mut self, kind: MatchKind, weight: u32) -> Self {
        self.set(kind, weight);
        self
    }

    fn enforce_phrase_priority(&mut self) {
        let mut title = self.get(MatchKind::Title);
        if title == u32::MAX {
            title = u32::MAX - 1;
            tracing::warn!(
                "title weight {} leaves no room for title_phrase, lowering to {}",
                u32::MAX,
                title
            );
            self.weights[MatchKind::Title as usize] = title;
        }
        if self.get(MatchKind::TitlePhrase) <= title {
            let corrected = title.saturating_add(1);
            tracing::warn!(
                "title_phrase weight {} does not exceed title weight {}, raising to {}",
                self.get(MatchKind::TitlePhrase),
                title,
                corrected
            );
            self.weights[MatchKind::TitlePhrase as usize] = corrected;
        }
    }

    /// Merges a TOML table of overrides over the defaults.
    ///
    /// Any invalid entry rejects the whole table; unknown keys are ignored.
    fn from_toml(value: &toml::Value) -> Result<Self, String> {
        let table = value
            .as_table()
            .ok_or_else(|| format!("expected a table, found {}", value.type_str()))?;

        let mut overrides = Vec::with_capacity(table.len());
        for (key, raw) in table {
            let Some(kind) = MatchKind::from_key(key) else {
                tracing::warn!("Ignoring unknown weight '{}'", key);
                continue;
            };
            let weight = raw
                .as_integer()
                .ok_or_else(|| format!("weight '{}' must be an integer", key))?;
            let weight = u32::try_from(weight)
                .map_err(|_| format!("weight '{}' out of range: {}", key, weight))?;
            overrides.push((kind, weight));
        }

        // Apply all overrides before checking the invariant so that raising
        // both `title` and `title_phrase` in one table is not "corrected".
        let mut weights = Self::default();
        for (kind, weight) in overrides {
            weights.weights[kind as usize] = weight;
        }
        weights.enforce_phrase_priority();
        Ok(weights)
    }
}

/// One-directional phrase → replacement phrases map.
///
/// Keys and targets are stored lowercased and trimmed. Ordered so expansion
/// (and the term cap applied after it) is deterministic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynonymMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl Default for SynonymMap {
    fn default() -> Self {
        let mut map = Self::empty();
        map.insert("sampler", ["sample pack"]);
        map.insert("sample pack", ["sampler"]);
        map.insert("maduro", ["dark"]);
        map.insert("dark", ["maduro"]);
        map
    }
}

impl SynonymMap {
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds targets for `from`. Blank keys and targets are skipped.
    pub fn insert<I, S>(&mut self, from: &str, targets: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = from.trim().to_lowercase();
        if key.is_empty() {
            return;
        }
        let entry = self.entries.entry(key).or_default();
        for target in targets {
            let target = target.as_ref().trim().to_lowercase();
            if !target.is_empty() && !entry.contains(&target) {
                entry.push(target);
            }
        }
    }

    /// Targets of every entry whose key occurs as a whole-word phrase in `lower`.
    pub fn expansions<'a>(&'a self, lower: &str) -> impl Iterator<Item = &'a str> {
        let haystack = format!(" {} ", lower);
        self.entries
            .iter()
            .filter(move |(key, _)| haystack.contains(&format!(" {} ", key)))
            .flat_map(|(_, targets)| targets.iter().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses `{ phrase = ["target", ...] }`. A bare string target is accepted.
    fn from_toml(value: &toml::Value) -> Result<Self, String> {
        let table = value
            .as_table()
            .ok_or_else(|| format!("expected a table, found {}", value.type_str()))?;

        let mut map = Self::empty();
        for (from, targets) in table {
            let targets: Vec<&str> = match targets {
                toml::Value::String(single) => vec![single.as_str()],
                toml::Value::Array(items) => items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .ok_or_else(|| format!("synonyms for '{}' must be strings", from))
                    })
                    .collect::<Result<_, _>>()?,
                other => {
                    return Err(format!(
                        "synonyms for '{}' must be a list of strings, found {}",
                        from,
                        other.type_str()
                    ));
                }
            };
            map.insert(from, targets);
        }
        Ok(map)
    }
}

/// What the engine returns when a query normalizes to nothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyQueryPolicy {
    /// No results.
    #[default]
    Empty,
    /// Every product, unscored, most recent first.
    All,
}

/// Immutable search configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub weights: WeightTable,
    pub synonyms: SynonymMap,
    pub fuzzy_max_terms: usize,
    /// `None` enables fuzzy matching only for single-token queries.
    pub enable_fuzzy: Option<bool>,
    pub gate_fuzzy_when_exact_or_compact_matches: bool,
    pub require_tokens_after_brand: bool,
    pub empty_query: EmptyQueryPolicy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            weights: WeightTable::default(),
            synonyms: SynonymMap::default(),
            fuzzy_max_terms: DEFAULT_FUZZY_MAX_TERMS,
            enable_fuzzy: None,
            gate_fuzzy_when_exact_or_compact_matches: true,
            require_tokens_after_brand: true,
            empty_query: EmptyQueryPolicy::Empty,
        }
    }
}

/// On-disk shape. `weights` and `synonyms` stay untyped so a malformed section
/// can fall back to defaults instead of failing the whole file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    weights: Option<toml::Value>,
    synonyms: Option<toml::Value>,
    fuzzy_max_terms: Option<i64>,
    enable_fuzzy: Option<bool>,
    gate_fuzzy_when_exact_or_compact_matches: Option<bool>,
    require_tokens_after_brand: Option<bool>,
    empty_query: Option<EmptyQueryPolicy>,
}

impl SearchConfig {
    /// Parses a TOML document, filling unset values with defaults.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;
        Ok(Self::from_raw(raw))
    }

    /// Loads configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded search config from {}", path.display());
        Ok(Self::from_raw(raw))
    }

    /// `$XDG_CONFIG_HOME/product-search/config.toml` (or the platform equivalent).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("product-search").join("config.toml"))
    }

    /// Whether fuzzy patterns are generated for a query with `token_count` tokens.
    pub fn fuzzy_enabled_for(&self, token_count: usize) -> bool {
        self.enable_fuzzy.unwrap_or(token_count == 1)
    }

    fn from_raw(raw: RawConfig) -> Self {
        let defaults = Self::default();

        let weights = raw.weights.map_or(defaults.weights, |value| {
            WeightTable::from_toml(&value).unwrap_or_else(|reason| {
                tracing::warn!("Invalid weights ({}), using defaults", reason);
                defaults.weights
            })
        });

        let synonyms = match raw.synonyms {
            Some(value) => SynonymMap::from_toml(&value).unwrap_or_else(|reason| {
                tracing::warn!("Invalid synonyms ({}), using defaults", reason);
                SynonymMap::default()
            }),
            None => defaults.synonyms,
        };

        let fuzzy_max_terms = raw.fuzzy_max_terms.map_or(defaults.fuzzy_max_terms, |max| {
            usize::try_from(max).unwrap_or_else(|_| {
                tracing::warn!("fuzzy_max_terms {} is negative, disabling fuzzy terms", max);
                0
            })
        });

        Self {
            weights,
            synonyms,
            fuzzy_max_terms,
            enable_fuzzy: raw.enable_fuzzy,
            gate_fuzzy_when_exact_or_compact_matches: raw
                .gate_fuzzy_when_exact_or_compact_matches
                .unwrap_or(defaults.gate_fuzzy_when_exact_or_compact_matches),
            require_tokens_after_brand: raw
                .require_tokens_after_brand
                .unwrap_or(defaults.require_tokens_after_brand),
            empty_query: raw.empty_query.unwrap_or(defaults.empty_query),
        }
    }
}

/// Shared, swappable configuration snapshot.
///
/// Readers clone the current `Arc` and score against it without holding the
/// lock; [`ConfigHandle::replace`] installs a new snapshot for later queries.
#[derive(Debug, Default)]
pub struct ConfigHandle {
    current: RwLock<Arc<SearchConfig>>,
}

impl ConfigHandle {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    pub fn snapshot(&self) -> Arc<SearchConfig> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Installs `config` and returns the previous snapshot.
    pub fn replace(&self, config: SearchConfig) -> Arc<SearchConfig> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[test]
    fn test_default_weights() {
        let weights = WeightTable::default();
        check!(weights.get(MatchKind::Title) == 80);
        check!(weights.get(MatchKind::TitlePhrase) == 140);
        check!(weights.get(MatchKind::TitleAllTokens) == 500);
        check!(weights.get(MatchKind::Sku) == 40);
        check!(weights.get(MatchKind::Attribute) == 25);
        check!(weights.get(MatchKind::Taxonomy) == 20);
        check!(weights.get(MatchKind::Excerpt) == 20);
        check!(weights.get(MatchKind::Content) == 10);
        check!(weights.get(MatchKind::TitleFuzzy) == 8);
        check!(weights.get(MatchKind::SkuFuzzy) == 6);
    }

    #[test]
    fn test_match_kind_keys_round_trip() {
        for kind in MatchKind::ALL {
            check!(MatchKind::from_key(kind.as_str()) == Some(kind));
        }
        check!(MatchKind::from_key("popularity").is_none());
    }

    #[rstest]
    #[case(MatchKind::Title, 200, 200, 201)]
    #[case(MatchKind::TitlePhrase, 10, 80, 81)]
    #[case(MatchKind::TitlePhrase, 80, 80, 81)]
    #[case(MatchKind::Title, u32::MAX - 1, u32::MAX - 1, u32::MAX)]
    #[case(MatchKind::Title, u32::MAX, u32::MAX - 1, u32::MAX)]
    fn test_phrase_priority_enforced(
        #[case] kind: MatchKind,
        #[case] weight: u32,
        #[case] expected_title: u32,
        #[case] expected_phrase: u32,
    ) {
        let weights = WeightTable::default().with(kind, weight);
        check!(weights.get(MatchKind::Title) == expected_title);
        check!(weights.get(MatchKind::TitlePhrase) == expected_phrase);
        check!(weights.get(MatchKind::TitlePhrase) > weights.get(MatchKind::Title));
    }

    #[test]
    fn test_synonym_expansion_is_whole_phrase() {
        let map = SynonymMap::default();
        let found: Vec<_> = map.expansions("dark roast sampler").collect();
        check!(found == ["maduro", "sample pack"]);
        check!(map.expansions("darker samplers").next().is_none());
        check!(map.expansions("cigar sample pack").collect::<Vec<_>>() == ["sampler"]);
    }

    #[test]
    fn test_synonym_insert_normalizes() {
        let mut map = SynonymMap::empty();
        map.insert("  Gift Set ", ["Bundle", " ", "bundle"]);
        map.insert("   ", ["ignored"]);
        check!(map.len() == 1);
        check!(map.expansions("gift set").collect::<Vec<_>>() == ["bundle"]);
    }

    #[test]
    fn test_config_handle_swaps_snapshots() {
        let handle = ConfigHandle::new(SearchConfig::default());
        let before = handle.snapshot();

        let mut next = SearchConfig::default();
        next.fuzzy_max_terms = 3;
        let previous = handle.replace(next);

        check!(Arc::ptr_eq(&before, &previous));
        check!(before.fuzzy_max_terms == DEFAULT_FUZZY_MAX_TERMS);
        check!(handle.snapshot().fuzzy_max_terms == 3);
    }

    #[rstest]
    #[case(None, 1, true)]
    #[case(None, 2, false)]
    #[case(Some(true), 3, true)]
    #[case(Some(false), 1, false)]
    fn test_fuzzy_enabled_for(
        #[case] flag: Option<bool>,
        #[case] tokens: usize,
        #[case] expected: bool,
    ) {
        let config = SearchConfig {
            enable_fuzzy: flag,
            ..SearchConfig::default()
        };
        check!(config.fuzzy_enabled_for(tokens) == expected);
    }
}
