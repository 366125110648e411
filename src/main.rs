mod cli;

use mediashelf::{
    config,
    server::{self, AppContext},
};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

async fn start_server(
    host: Option<String>,
    port: Option<u16>,
    config_path: Option<&Path>,
) -> Result<()> {
    let mut config = config::load_config_or_default(config_path)?;

    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    tracing::info!("Starting mediashelf server");
    tracing::info!(
        "Server will listen on {}:{}",
        config.server.host,
        config.server.port
    );
    tracing::info!("Library root: {}", config.library.root_path.display());

    let ctx = AppContext::from_config(config)?;
    server::start_server(ctx).await
}

async fn scan(path: Option<PathBuf>, json: bool, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let root = path.unwrap_or_else(|| config.library.root_path.clone());
    let ctx = AppContext::from_config(config)?;

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight files");
            on_signal.cancel();
        }
    });

    let result = ctx.scanner.scan_with_cancel(&root, &cancel).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    println!("Scanned {}", root.display());
    println!("  Files:     {}", result.scanned);
    println!("  Added:     {}", result.added);
    println!("  Updated:   {}", result.updated);
    println!("  Skipped:   {}", result.skipped);
    println!("  Enriched:  {}", result.enriched);
    println!("  Unmatched: {}", result.unmatched);
    if !result.errors.is_empty() {
        println!("\nErrors: {}", result.errors.len());
        for e in &result.errors {
            println!("  {}: {}", e.path, e.message);
        }
    }
    if !result.enrichment_failures.is_empty() {
        println!("\nEnrichment failures: {}", result.enrichment_failures.len());
        for e in &result.enrichment_failures {
            println!("  {}: {}", e.path, e.message);
        }
    }
    if result.cancelled {
        println!("\nScan was cancelled before completion.");
    }

    Ok(())
}

async fn reconcile(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let ctx = AppContext::from_config(config)?;
    let deleted = ctx.scanner.reconcile_orphans().await?;
    println!("Removed {} orphaned entries", deleted);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediashelf=trace,mediashelf_db=debug,mediashelf_common=debug,tower_http=debug"
                .to_string()
        } else {
            "mediashelf=info,mediashelf_db=info,tower_http=info".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Start { host, port } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_server(host, port, cli.config.as_deref()))
        }
        Commands::Scan { path, json } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(scan(path, json, cli.config.as_deref()))
        }
        Commands::Reconcile => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(reconcile(cli.config.as_deref()))
        }
        Commands::Validate { file } => {
            let path = file.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Version => {
            println!("mediashelf {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, checking defaults and environment");
            config::load_config_or_default(None)?
        }
    };

    println!("✓ Configuration is valid");
    println!("  Server: {}:{}", config.server.host, config.server.port);
    println!("  Database: {}", config.server.db_path.display());
    println!("  Library root: {}", config.library.root_path.display());
    println!("  Scan concurrency: {}", config.library.scan_concurrency);
    println!(
        "  TMDB enrichment: {}",
        if config.tmdb.api_key().is_some() {
            "enabled"
        } else {
            "disabled"
        }
    );
    println!(
        "  Cache: {}",
        config.cache.url.as_deref().unwrap_or("disabled")
    );

    Ok(())
}
