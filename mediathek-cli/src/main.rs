mod cli;
mod config;
mod output;

use crate::{
    cli::{Args, Commands},
    config::AppConfig,
    output::OutputManager,
};
use anyhow::{Context, Result};
use clap::Parser;
use mediathek_parser::{
    BackendKind, MediaResolver, ProtocolCapabilityRegistry,
    catalog::Catalog,
    resolver::{ContentFetcher, HttpFetcher},
};
use std::{process, sync::Arc};
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, error, warn};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Application error: {:#}", e);
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet)?;

    let config = AppConfig::load(args.config.as_deref())?;
    debug!(?config, "Loaded configuration");

    let fetcher: Arc<dyn ContentFetcher> = Arc::new(
        HttpFetcher::new(&config.resolver).context("Failed to build HTTP client")?,
    );
    let output = OutputManager::new(cfg!(feature = "colored-output"));

    match args.command {
        Commands::Resolve {
            url,
            legacy,
            schemes,
            json,
        } => {
            let backend = if legacy {
                BackendKind::Legacy
            } else {
                config.backend
            };
            let registry = capability_registry(&config, schemes);
            let resolver = MediaResolver::new(backend, config.resolver.clone(), fetcher);

            let cancel = CancellationToken::new();
            spawn_ctrl_c(cancel.clone());

            let resolution = resolver
                .resolve_uri_with_cancel(&url, &registry.snapshot(), cancel)
                .await
                .with_context(|| format!("Failed to resolve {url}"))?;
            println!("{}", output.format_resolution(&resolution, json)?);
        }

        Commands::Browse {
            url,
            resolve,
            schemes,
            json,
        } => {
            let catalog = Catalog::new(config.resolver.clone(), fetcher.clone());
            let (title, entries) = match &url {
                Some(url) => (
                    url.as_str(),
                    catalog
                        .list(url)
                        .await
                        .with_context(|| format!("Failed to list {url}"))?,
                ),
                None => (catalog.root_title(), catalog.root()),
            };
            println!("{}", output.format_entries(title, &entries, json)?);

            if resolve {
                let registry = capability_registry(&config, schemes);
                let resolver = MediaResolver::new(config.backend, config.resolver.clone(), fetcher);
                let outcomes = catalog
                    .resolve_videos(&entries, &resolver, &registry.snapshot())
                    .await;
                println!("{}", output.format_outcomes(&outcomes, json)?);
            }
        }
    }

    Ok(())
}

/// Schemes given on the command line replace the configured ones.
fn capability_registry(config: &AppConfig, schemes: Vec<String>) -> ProtocolCapabilityRegistry {
    if schemes.is_empty() {
        ProtocolCapabilityRegistry::with_schemes(&config.schemes)
    } else {
        ProtocolCapabilityRegistry::with_schemes(schemes)
    }
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling resolution");
            cancel.cancel();
        }
    });
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to install logger")?;
    Ok(())
}
