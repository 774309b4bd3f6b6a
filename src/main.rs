//! conf-builder
//!
//! Watches a service registry and keeps an HAProxy configuration in sync.
//!
//! # Architecture Overview
//!
//! ```text
//!     Registry (Consul HTTP API)
//!         │  blocking catalog query (index, wait)
//!         ▼
//!   ┌───────────┐   changed index   ┌────────────┐   document   ┌────────────┐
//!   │  watcher  │──────────────────▶│ assembler  │─────────────▶│   apply    │
//!   │ poll loop │                   │ KV + catalog│             │ diff/swap/ │
//!   └─────┬─────┘                   └────────────┘              │  reload    │
//!         │ errors                                              └────────────┘
//!         ▼
//!   error sink (mpsc) → logs
//!
//!   Cross-cutting: config, lifecycle (signals/shutdown), observability,
//!   resilience (retry delays)
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;

use conf_builder::apply::{SafeApply, SystemRunner};
use conf_builder::assembler::ConfigAssembler;
use conf_builder::config::loader::load_config;
use conf_builder::lifecycle::{signals, Shutdown};
use conf_builder::observability::{logging, metrics};
use conf_builder::registry::{HttpRegistry, Registry, RegistryIndex};
use conf_builder::resilience::RetryPolicy;
use conf_builder::watcher::{log_errors, ChangeWatcher};
use conf_builder::WatchError;

#[derive(Parser)]
#[command(name = "conf-builder")]
#[command(about = "Builds HAProxy configuration from registry state", long_about = None)]
struct Cli {
    /// Config file (TOML, or JSON when the name ends in .json)
    #[arg(short, long, default_value = "conf.json")]
    config: PathBuf,

    /// Overrides observability.log_level
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the registry and apply every change (default)
    Watch {
        /// Registry index to resume from
        #[arg(long)]
        index: Option<u64>,
    },
    /// Build once and print the document
    Render,
    /// Build once and apply it
    Apply,
    /// List catalog services
    Services,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    logging::init_logging(&config.observability);

    tracing::info!(
        config = %cli.config.display(),
        registry = %config.registry_base(),
        vips = ?config.vips,
        "conf-builder v{} starting",
        env!("CARGO_PKG_VERSION")
    );

    let registry = Arc::new(HttpRegistry::from_config(&config)?);
    let assembler = ConfigAssembler::from_config(registry.clone(), &config);

    match cli.command.unwrap_or(Commands::Watch { index: None }) {
        Commands::Render => {
            let doc = assembler.build().await?;
            print!("{}", doc);
        }
        Commands::Apply => {
            let apply = SafeApply::from_config(Arc::new(SystemRunner), &config);
            let doc = assembler.build().await?;
            let outcome = apply.apply(&doc).await?;
            tracing::info!(outcome = ?outcome, "Apply finished");
        }
        Commands::Services => {
            for (name, tags) in registry.services().await? {
                if tags.is_empty() {
                    println!("{}", name);
                } else {
                    println!("{} [{}]", name, tags.join(", "));
                }
            }
        }
        Commands::Watch { index } => {
            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr),
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let (error_tx, error_rx) = mpsc::unbounded_channel::<WatchError>();
            let sink = log_errors(error_rx);

            let apply = SafeApply::from_config(Arc::new(SystemRunner), &config);
            let resume = index.unwrap_or(config.watch.resume_index);
            let watcher = ChangeWatcher::new(registry, assembler, apply, error_tx)
                .with_retry(RetryPolicy::from_config(&config.retry))
                .with_index(RegistryIndex(resume));

            let shutdown = Shutdown::new();
            let handle = tokio::spawn(watcher.run(shutdown.subscribe()));

            if let Err(e) = signals::shutdown_on_signal(&shutdown).await {
                tracing::error!(error = %e, "Failed to listen for signals");
                shutdown.trigger();
            }

            let last = handle.await?;
            let errors = sink.await?;
            tracing::info!(index = last.0, errors, "Shutdown complete");
        }
    }

    Ok(())
}
