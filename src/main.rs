use anyhow::Context;
use clap::Parser;
use product_search::catalog::InMemoryCatalog;
use product_search::cli::{Cli, Commands};
use product_search::config::{SearchConfig, expand_tilde};
use product_search::diagnostics::TracingSink;
use product_search::format::{format_results, format_terms};
use product_search::logging;
use product_search::search::ProductSearch;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn load_config(explicit: Option<&str>) -> anyhow::Result<SearchConfig> {
    if let Some(path) = explicit {
        let path = PathBuf::from(expand_tilde(path).as_ref());
        return SearchConfig::load(&path).context("Failed to load search configuration");
    }

    match SearchConfig::default_path() {
        Some(path) if path.exists() => {
            SearchConfig::load(&path).context("Failed to load search configuration")
        }
        _ => {
            tracing::debug!("No config file found, using defaults");
            Ok(SearchConfig::default())
        }
    }
}

fn load_catalog(path: &Path) -> anyhow::Result<InMemoryCatalog> {
    let path = PathBuf::from(expand_tilde(&path.to_string_lossy()).as_ref());
    InMemoryCatalog::load(&path).context("Failed to load catalog")
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    let engine = ProductSearch::new(Arc::new(config)).with_sink(Arc::new(TracingSink));

    match cli.command {
        Commands::Search {
            query,
            catalog,
            limit,
            explain,
        } => {
            let catalog = load_catalog(&catalog)?;
            let mut results = engine.search(&query, &catalog)?;
            results.truncate(limit);
            print!("{}", format_results(&results, &query, explain));
        }
        Commands::Terms { query } => match engine.compile(&query) {
            Some(compiled) => print!("{}", format_terms(&compiled)),
            None => println!("Query '{}' has no searchable terms.", query),
        },
    }

    Ok(())
}
