use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use shopsearch_core::loader::load_products;
use shopsearch_core::{analyze, CacheConfig, SearchEngine};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "shopsearch")]
#[command(about = "Query analysis and product search over a catalog file", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print how a query is normalized, corrected and interpreted
    Analyze {
        #[arg(long)]
        query: String,
    },
    /// Index a catalog and run a single search against it
    Search {
        /// Catalog path (.json/.jsonl file or directory)
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        query: String,
        /// Print at most this many results
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Index a catalog and print token statistics
    Stats {
        #[arg(long)]
        catalog: PathBuf,
        /// Number of most frequent tokens to list
        #[arg(long, default_value_t = 20)]
        top: usize,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).with_writer(std::io::stderr).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze { query } => print_json(&analyze(&query)),
        Commands::Search { catalog, query, limit } => {
            let engine = load_engine(&catalog)?;
            let mut response = (*engine.search(&query)).clone();
            if let Some(limit) = limit {
                response.data.truncate(limit);
            }
            print_json(&response)
        }
        Commands::Stats { catalog, top } => {
            let engine = load_engine(&catalog)?;
            print_json(&engine.stats(top))
        }
    }
}

fn load_engine(catalog: &Path) -> Result<SearchEngine> {
    let products = load_products(catalog)?;
    tracing::info!(products = products.len(), catalog = %catalog.display(), "catalog loaded");
    let engine = SearchEngine::new(CacheConfig::default());
    engine.load_catalog(&products);
    Ok(engine)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
