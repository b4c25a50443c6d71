//! # bf-runner
//!
//! Entry point for the Binance futures market-data adapter.
//!
//! Loads a JSON configuration file, starts the feed module, and runs until
//! interrupted. Events are emitted to the log sink as JSON lines.
//!
//! # Usage
//!
//! ```bash
//! bf-runner config.json --log-level info
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use bf_md::FeedModule;
use clap::Parser;
use tracing::{error, info};

/// Binance USDT-Futures Market Data Adapter.
#[derive(Parser)]
#[command(name = "bf-runner", about = "Binance USDT-Futures Market Data Adapter")]
struct Cli {
    /// Configuration file path (JSON).
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Optional log directory for file output.
    #[arg(long)]
    log_dir: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration
    let config = bf_core::config::load_config(&cli.config)?;

    // 2. Initialize logging
    let log_dir = cli.log_dir.as_deref().or(config.log_path.as_deref());
    bf_core::logging::init_logging(&cli.log_level, log_dir, config.module_name());

    info!(
        "bf-runner starting — config={}, {} symbol(s), {} channel(s)",
        cli.config.display(),
        config.symbols.len(),
        config.channels.len(),
    );

    // 3. Create and start the feed module
    let sink = Arc::new(bf_core::sink::LogSink);
    let mut module = bf_md::BinanceFuturesMd::new(config, sink);
    module.start().await?;
    info!("module '{}' started — press Ctrl+C to stop", module.name());

    // 4. Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");

    // 5. Stop gracefully
    if let Err(e) = module.stop().await {
        error!("error stopping '{}': {e}", module.name());
    }

    info!("stopped — goodbye");
    Ok(())
}
