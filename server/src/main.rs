use anyhow::Result;
use axum::Router;
use clap::Parser;
use shopsearch_core::CacheConfig;
use shopsearch_server::{build_app, ServerConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
struct Args {
    /// Product catalog to seed (.json/.jsonl file or directory)
    #[arg(long)]
    catalog: Option<PathBuf>,
    /// Host to bind
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to bind
    #[arg(long, default_value_t = 3001)]
    port: u16,
    /// Maximum cached search responses
    #[arg(long, default_value_t = 200)]
    cache_max_entries: i64,
    /// Lifetime of a cached search response in milliseconds
    #[arg(long, default_value_t = 30_000)]
    cache_ttl_ms: i64,
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let args = Args::parse();
    let config = ServerConfig {
        catalog_path: args.catalog,
        cache: CacheConfig::new(args.cache_max_entries, args.cache_ttl_ms),
        admin_token: std::env::var("ADMIN_TOKEN").ok(),
    };
    let app: Router = build_app(config)?;

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
