//! Plain-text rendering of search results and compiled terms for the CLI.

use crate::search::{CompiledQuery, Pattern, ScoredResult};
use std::fmt::Write as _;

/// Format ranked results into a readable string.
///
/// With `explain`, each result lists the weighted matches behind its score.
pub fn format_results(results: &[ScoredResult], query: &str, explain: bool) -> String {
    if results.is_empty() {
        let mut msg = format!("No products found for '{}'.\n\n", query);
        msg.push_str("Search tips:\n");
        msg.push_str("• Try fewer words; every word after the first must appear in the title\n");
        msg.push_str("• Misspellings are tolerated only for single-word queries by default\n");
        msg.push_str("• Words shorter than 3 letters are ignored next to longer ones\n");
        return msg;
    }

    let mut output = format!("Results for '{}' ({} found):\n\n", query, results.len());
    let max_score = results.iter().map(|r| r.score).max().unwrap_or(0).max(1);

    for (idx, result) in results.iter().enumerate() {
        let product = &result.product;
        let relevance = u64::from(result.score) * 100 / u64::from(max_score);
        let _ = write!(
            output,
            "{}. {} [#{}] score: {} ({}%)",
            idx + 1,
            product.title,
            product.id,
            result.score,
            relevance
        );
        if !product.sku.is_empty() {
            let _ = write!(output, " sku: {}", product.sku);
        }
        output.push('\n');

        if let Some(line) = first_line(&product.excerpt) {
            let _ = writeln!(output, "   {}", line);
        }

        if explain {
            for contribution in &result.contributions {
                let term = contribution
                    .pattern
                    .as_ref()
                    .map_or_else(|| "(all tokens)".to_string(), Pattern::to_string);
                let _ = writeln!(
                    output,
                    "   + {:>4}  {:<16} {}",
                    contribution.weight,
                    contribution.kind.as_str(),
                    term
                );
            }
        }
        output.push('\n');
    }

    output
}

/// Format the term lists of a compiled query along with their SQL `LIKE` renderings.
pub fn format_terms(query: &CompiledQuery) -> String {
    let mut output = format!("Query: '{}'\n", query.normalized.lower);
    let tokens: Vec<&str> = query.normalized.token_texts().collect();
    let _ = writeln!(output, "Tokens: {}", tokens.join(", "));

    let sections = [
        ("Exact", &query.terms.exact),
        ("Compact", &query.terms.compact),
        ("Fuzzy", &query.terms.fuzzy),
    ];
    for (label, patterns) in sections {
        let _ = writeln!(output, "\n{} ({}):", label, patterns.len());
        for pattern in patterns {
            let _ = writeln!(output, "  {:<24} LIKE '{}'", pattern, pattern.to_sql_like());
        }
    }

    if !query.brand_requirements.is_empty() {
        output.push_str("\nRequired in title:\n");
        for req in &query.brand_requirements {
            let _ = write!(output, "  {} (compact: {}", req.exact, req.compact);
            if !req.fuzzy.is_empty() {
                let fuzzy: Vec<String> = req.fuzzy.iter().map(Pattern::to_string).collect();
                let _ = write!(output, ", fuzzy: {}", fuzzy.join(" | "));
            }
            output.push_str(")\n");
        }
    }

    output
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Product;
    use crate::config::SearchConfig;
    use crate::diagnostics::NoopSink;
    use crate::search::{QueryContext, compile};
    use assert2::check;

    fn result(id: u64, title: &str, score: u32) -> ScoredResult {
        ScoredResult {
            product: Product::new(id, title).with_excerpt("\n  Smooth and creamy.\nSecond line"),
            score,
            title_all_tokens: false,
            contributions: Vec::new(),
        }
    }

    #[test]
    fn test_format_results() {
        let results = [result(4, "Peach Fuzz", 808), result(9, "Peach Rings", 404)];
        let output = format_results(&results, "peach", false);
        check!(output.starts_with("Results for 'peach' (2 found):"));
        check!(output.contains("1. Peach Fuzz [#4] score: 808 (100%)"));
        check!(output.contains("2. Peach Rings [#9] score: 404 (50%)"));
        check!(output.contains("   Smooth and creamy.\n"));
        check!(!output.contains("Second line"));
    }

    #[test]
    fn test_relevance_relative_to_best_score() {
        let mut full = result(1, "Alpha Bravo", 600);
        full.title_all_tokens = true;
        let results = [full, result(2, "Bravo", 1200)];
        let output = format_results(&results, "alpha bravo", false);
        check!(output.contains("1. Alpha Bravo [#1] score: 600 (50%)"));
        check!(output.contains("2. Bravo [#2] score: 1200 (100%)"));
    }

    #[test]
    fn test_format_empty_results() {
        let output = format_results(&[], "zzz", true);
        check!(output.starts_with("No products found for 'zzz'."));
        check!(output.contains("Search tips:"));
    }

    #[test]
    fn test_format_terms_shows_like() {
        let config = SearchConfig::default();
        let query = compile("sush", &QueryContext::new(&config, &NoopSink)).unwrap();
        let output = format_terms(&query);
        check!(output.contains("Exact (1):"));
        check!(output.contains("LIKE '%sush%'"));
        check!(output.contains("LIKE '%s%ush%'"));
        check!(!output.contains("Required in title"));
    }
}
