//! Typo-tolerant pattern generation.
//!
//! Approximates single-edit tolerance without computing edit distance: each
//! token is turned into a few wildcard patterns depending on its length.
//!
//! | Length | Strategy                                                   |
//! |--------|------------------------------------------------------------|
//! | < 3    | none                                                       |
//! | 3      | interspersed: `*a*b*c*`                                    |
//! | 4–5    | one-gap (`a*bcd`, `ab*cd`, `abc*d`) plus interspersed      |
//! | 6–7    | one-gap                                                    |
//! | 8–14   | word-break near the midpoint: `brick*house`               |
//! | > 14   | none                                                       |

use super::pattern::Pattern;
use super::query::dedup_capped;

/// Default cap on generated fuzzy patterns per query.
pub const DEFAULT_FUZZY_MAX_TERMS: usize = 10;

const MIN_FUZZY_LENGTH: usize = 3;
const MAX_ONE_GAP_LENGTH: usize = 7;
const MAX_INTERSPERSED_LENGTH: usize = 5;
const MIN_WORD_BREAK_LENGTH: usize = 8;
const MAX_WORD_BREAK_LENGTH: usize = 14;
/// Each side of a word-break split keeps at least this many characters.
const MIN_WORD_BREAK_SIDE: usize = 3;

/// Generates fuzzy patterns for `tokens`, stopping once `max` are produced.
pub fn fuzzy_patterns<'a, I>(tokens: I, max: usize) -> Vec<Pattern>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut patterns = Vec::new();

    'tokens: for token in tokens {
        for pattern in token_patterns(token) {
            if patterns.len() >= max {
                break 'tokens;
            }
            patterns.push(pattern);
        }
    }

    dedup_capped(patterns, max)
}

fn token_patterns(token: &str) -> Vec<Pattern> {
    let chars: Vec<char> = token.chars().collect();
    let len = chars.len();

    match len {
        MIN_FUZZY_LENGTH => vec![Pattern::interspersed(&chars)],
        4..=MAX_ONE_GAP_LENGTH => {
            let mut out: Vec<Pattern> = (1..len).map(|i| Pattern::split_at(&chars, i)).collect();
            if len <= MAX_INTERSPERSED_LENGTH {
                out.push(Pattern::interspersed(&chars));
            }
            out
        }
        MIN_WORD_BREAK_LENGTH..=MAX_WORD_BREAK_LENGTH => {
            let mid = len / 2;
            [mid - 1, mid, mid + 1]
                .into_iter()
                .filter(|&at| at >= MIN_WORD_BREAK_SIDE && len - at >= MIN_WORD_BREAK_SIDE)
                .map(|at| Pattern::split_at(&chars, at))
                .collect()
        }
        _ => Vec::new(),
    }
}
