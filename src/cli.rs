use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "product-search")]
#[command(about = "Rank catalog products against a search query", long_about = None)]
pub struct Cli {
    /// Search configuration file (TOML). Defaults to the user config directory.
    #[arg(short, long, global = true)]
    pub config: Option<String>,
    /// Log pipeline diagnostics at DEBUG level
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Filter and rank a catalog
    Search {
        query: String,
        /// Catalog file (JSON array of products)
        #[arg(long)]
        catalog: PathBuf,
        #[arg(short = 'n', long, default_value = "25")]
        limit: usize,
        /// Show the weighted matches behind each score
        #[arg(long)]
        explain: bool,
    },
    /// Show the terms a query compiles to
    Terms { query: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};

    #[test]
    fn test_parse_search() {
        let cli = Cli::parse_from([
            "product-search",
            "search",
            "peach fuzz",
            "--catalog",
            "products.json",
            "-n",
            "5",
            "--explain",
            "-v",
        ]);
        check!(cli.verbose);
        check!(cli.config.is_none());
        let_assert!(
            Commands::Search {
                query,
                catalog,
                limit,
                explain,
            } = cli.command
        );
        check!(query == "peach fuzz");
        check!(catalog == PathBuf::from("products.json"));
        check!(limit == 5);
        check!(explain);
    }

    #[test]
    fn test_parse_terms_with_config() {
        let cli = Cli::parse_from([
            "product-search",
            "--config",
            "~/search.toml",
            "terms",
            "sush",
        ]);
        check!(cli.config.as_deref() == Some("~/search.toml"));
        let_assert!(Commands::Terms { query } = cli.command);
        check!(query == "sush");
    }
}
