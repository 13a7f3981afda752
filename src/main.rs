//! Failover guard (v1)
//!
//! Keeps this process subscribed to its channel on an active-standby store
//! whose replication does not carry subscriptions across failover.
//!
//! # Architecture Overview
//!
//! ```text
//!    ┌──────────────────────────────────────────────────────────────┐
//!    │                       FAILOVER GUARD                          │
//!    │                                                               │
//!    │   every interval                                              │
//!    │  ┌──────────────┐   ┌───────────┐   ┌──────────────┐          │
//!    │  │ orchestrator │──▶│ detector  │──▶│ introspector │──────────┼──▶ CLIENT LIST
//!    │  └──────┬───────┘   └───────────┘   └──────────────┘          │
//!    │         │ FailedOver                                          │
//!    │         ▼                                                     │
//!    │  ┌──────────────────────────────┐                             │
//!    │  │ store::ConnectionManager     │                             │
//!    │  │ reset → connect → subscribe  │─────────────────────────────┼──▶ SUBSCRIBE
//!    │  └──────────────────────────────┘                             │
//!    │                                                               │
//!    │  config │ observability │ lifecycle                            │
//!    └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use failover_guard::config::loader::load_config;
use failover_guard::lifecycle::{signals, startup, Shutdown};
use failover_guard::observability::{logging, metrics};
use failover_guard::GuardConfig;

const MESSAGE_BUFFER: usize = 1024;

#[derive(Parser)]
#[command(name = "failover-guard")]
#[command(about = "Restores a pub/sub subscription lost to silent store failover", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overriding the configuration file.
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GuardConfig::default(),
    };

    let level = cli
        .log_level
        .as_deref()
        .unwrap_or(&config.observability.log_level);
    logging::init_logging(level);

    tracing::info!("failover-guard v0.1.0 starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let (message_tx, _message_log) = startup::spawn_message_log(MESSAGE_BUFFER);

    let orchestrator = startup::build_orchestrator(&config, message_tx)?;
    if let Err(e) = orchestrator.subscribe_initial().await {
        tracing::warn!(
            error = %e,
            "Initial subscribe failed; the failover check will retry while enabled"
        );
    }

    let shutdown = Shutdown::new();
    let check_loop = tokio::spawn(orchestrator.run(shutdown.listener()));

    signals::wait_for_termination().await;
    shutdown.trigger();
    check_loop.await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
