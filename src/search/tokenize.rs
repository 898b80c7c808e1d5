//! Query normalization: markup stripping, tokenization, short-token
//! suppression and number+unit merging.

use regex::Regex;
use std::sync::LazyLock;

/// Maximum number of query tokens considered, before and after merging.
pub(crate) const MAX_QUERY_TOKENS: usize = 6;

/// Tokens shorter than this are dropped once any token reaches it.
pub(crate) const MIN_TOKEN_LENGTH: usize = 3;

/// Unit abbreviations kept (and merged) when they follow a number.
pub(crate) const UNIT_ABBREVIATIONS: &[&str] = &[
    "mg", "g", "kg", "ml", "l", "oz", "lb", "lbs", "mm", "cm", "in",
];

static SCRIPT_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("static regex")
});

/// A `<` followed by whitespace is text; any other `<` opens a tag that runs to
/// the next `>` or to the end of the input.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:[^\s>][^>]*)?(?:>|\z)").expect("static regex"));

/// What a token represents, as far as gating and merging care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Word,
    /// Digits with at most one decimal separator: `6`, `1.5`.
    Numeric,
    /// A known unit abbreviation: `mg`, `oz`.
    Unit,
    /// A number merged with its unit: `6mg`.
    Measure,
}

/// A normalized query token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    text: String,
    position: usize,
    kind: TokenKind,
}

impl Token {
    fn new(text: String, position: usize) -> Self {
        let kind = classify(&text);
        Self {
            text,
            position,
            kind,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Index of the source word in the whitespace-split query.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub const fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == TokenKind::Numeric
    }

    pub fn is_unit(&self) -> bool {
        self.kind == TokenKind::Unit
    }
}

/// Output of [`normalize`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedQuery {
    /// Markup-free, whitespace-collapsed, lowercased query (all words).
    pub lower: String,
    /// Tokens after suppression and unit merging.
    pub tokens: Vec<Token>,
    /// Token texts after suppression but before merging.
    pub required: Vec<String>,
    /// Spaced `number unit` phrases consumed by merging.
    pub unit_phrases: Vec<String>,
}

impl NormalizedQuery {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token_texts(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(Token::text)
    }
}

/// Removes `<script>`/`<style>` blocks and every remaining tag, including an
/// unclosed one at the end.
pub fn strip_markup(raw: &str) -> String {
    let without_blocks = SCRIPT_STYLE.replace_all(raw, "");
    TAG.replace_all(&without_blocks, "").into_owned()
}

/// Normalizes a raw query into tokens.
///
/// Deterministic and idempotent: normalizing `lower` again yields the same
/// tokens.
pub fn normalize(raw: &str) -> NormalizedQuery {
    let stripped = strip_markup(raw);
    let lower = stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();

    let words: Vec<Token> = lower
        .split_whitespace()
        .take(MAX_QUERY_TOKENS)
        .enumerate()
        .map(|(position, word)| Token::new(word.to_string(), position))
        .collect();

    let kept = suppress_short_tokens(words);
    let required = kept.iter().map(|t| t.text.clone()).collect();
    let (mut tokens, unit_phrases) = merge_units(kept);
    tokens.truncate(MAX_QUERY_TOKENS);

    NormalizedQuery {
        lower,
        tokens,
        required,
        unit_phrases,
    }
}

/// Drops short tokens when at least one long token exists.
///
/// Numbers always survive; units survive only alongside a number.
fn suppress_short_tokens(tokens: Vec<Token>) -> Vec<Token> {
    if !tokens.iter().any(|t| t.len() >= MIN_TOKEN_LENGTH) {
        return tokens;
    }
    let has_number = tokens.iter().any(Token::is_numeric);

    tokens
        .into_iter()
        .filter(|t| t.len() >= MIN_TOKEN_LENGTH || t.is_numeric() || (t.is_unit() && has_number))
        .collect()
}

/// Merges each `number unit` pair into a single measure token.
fn merge_units(tokens: Vec<Token>) -> (Vec<Token>, Vec<String>) {
    let mut merged = Vec::with_capacity(tokens.len());
    let mut phrases = Vec::new();
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        if token.is_numeric()
            && let Some(unit) = iter.next_if(Token::is_unit)
        {
            phrases.push(format!("{} {}", token.text, unit.text));
            merged.push(Token {
                text: format!("{}{}", token.text, unit.text),
                position: token.position,
                kind: TokenKind::Measure,
            });
        } else {
            merged.push(token);
        }
    }

    (merged, phrases)
}

fn classify(text: &str) -> TokenKind {
    if is_numeric(text) {
        TokenKind::Numeric
    } else if UNIT_ABBREVIATIONS.contains(&text) {
        TokenKind::Unit
    } else {
        TokenKind::Word
    }
}

fn is_numeric(text: &str) -> bool {
    let mut separators = 0;
    for c in text.chars() {
        match c {
            '0'..='9' => {}
            '.' | ',' => separators += 1,
            _ => return false,
        }
    }
    separators <= 1
        && text.starts_with(|c: char| c.is_ascii_digit())
        && text.ends_with(|c: char| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn texts(query: &NormalizedQuery) -> Vec<&str> {
        query.token_texts().collect()
    }

    #[rstest]
    #[case("Peach   Fuzz", &["peach", "fuzz"])]
    #[case("  <b>Brickhouse</b>\n\tMaduro ", &["brickhouse", "maduro"])]
    #[case("a la carte", &["carte"])]
    #[case("ab cd", &["ab", "cd"])]
    #[case("one two three four five six seven", &["one", "two", "three", "four", "five", "six"])]
    #[case("ÉCLAIR Über", &["éclair", "über"])]
    fn test_tokens(#[case] input: &str, #[case] expected: &[&str]) {
        check!(texts(&normalize(input)) == expected);
    }

    #[test]
    fn test_script_contents_removed() {
        let query = normalize("cigar<script>alert('x')</script> <style>p{}</style>box");
        check!(query.lower == "cigar box");
        check!(texts(&query) == ["cigar", "box"]);
    }

    #[rstest]
    #[case("cigars i <3 cigars", "cigars i")]
    #[case("maduro <b", "maduro")]
    #[case("box <", "box")]
    #[case("1 < 2 <> 3", "1 < 2 3")]
    #[case("a<br/>b", "ab")]
    fn test_unclosed_tag_runs_to_end(#[case] input: &str, #[case] expected: &str) {
        check!(normalize(input).lower == expected);
    }

    #[test]
    fn test_empty_and_markup_only() {
        check!(normalize("").is_empty());
        check!(normalize("   \n\t").is_empty());
        check!(normalize("<p></p>").is_empty());
    }

    #[test]
    fn test_number_and_unit_merge() {
        let query = normalize("6 mg");
        check!(texts(&query) == ["6mg"]);
        check!(query.tokens[0].kind() == TokenKind::Measure);
        check!(query.unit_phrases == ["6 mg"]);
        check!(query.required == ["6", "mg"]);
    }

    #[test]
    fn test_units_kept_only_with_numbers() {
        let query = normalize("nicotine pouch 6 mg");
        check!(texts(&query) == ["nicotine", "pouch", "6mg"]);
        check!(query.required == ["nicotine", "pouch", "6", "mg"]);

        let query = normalize("made in cuba");
        check!(texts(&query) == ["made", "cuba"]);
    }

    #[test]
    fn test_short_numbers_survive() {
        let query = normalize("pack of 5");
        check!(texts(&query) == ["pack", "5"]);
        check!(query.tokens[1].is_numeric());
    }

    #[test]
    fn test_unit_without_number_not_merged() {
        let query = normalize("oz mg");
        check!(texts(&query) == ["oz", "mg"]);
        check!(query.unit_phrases.is_empty());
    }

    #[test]
    fn test_positions_refer_to_source_words() {
        let query = normalize("an old cigar");
        check!(query.tokens[0].position() == 1);
        check!(query.tokens[1].position() == 2);
    }

    #[rstest]
    #[case("6", true)]
    #[case("1.5", true)]
    #[case("1,5", true)]
    #[case("1.2.3", false)]
    #[case(".5", false)]
    #[case("6mg", false)]
    #[case("", false)]
    fn test_is_numeric(#[case] input: &str, #[case] expected: bool) {
        check!(is_numeric(input) == expected);
    }

    #[rstest]
    #[case("Peach Fuzz 6 MG")]
    #[case("<i>Sampler</i>  set")]
    #[case("a b c")]
    #[case("i <3 cigars")]
    #[case("Москва 🦀 日本")]
    fn test_normalize_idempotent(#[case] input: &str) {
        let first = normalize(input);
        let second = normalize(&first.lower);
        check!(first == second);
    }
}
