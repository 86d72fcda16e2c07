//! Terminal monitor for the Open API job queue.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

mod app;
mod config;
mod effects;
mod input;
mod notify;
mod render;

use config::{MonitorConfig, Overrides, SortOrder, DEFAULT_CONFIG_FILE};

#[derive(Debug, Parser)]
#[command(name = "queue_monitor", version, about = "Watch and prune the Open API job queue")]
struct Cli {
    /// RON config file; a missing file means defaults.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Server base url, e.g. http://localhost:8081
    #[arg(long)]
    base_url: Option<String>,

    /// Poll interval in milliseconds.
    #[arg(long)]
    interval_ms: Option<u64>,

    #[arg(long, value_enum)]
    sort: Option<SortOrder>,

    /// error, warn, info, debug or trace.
    #[arg(long)]
    log_level: Option<String>,

    /// Log file path, or "-" for the terminal.
    #[arg(long)]
    log_file: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            poll_interval_ms: self.interval_ms,
            log_level: self.log_level.clone(),
            log_file: self.log_file.clone(),
            sort: self.sort,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = MonitorConfig::load(&cli.config, cli.overrides())
        .with_context(|| format!("loading {}", cli.config.display()))?;

    monitor_logging::initialize(&config.log_destination, config.log_level);

    app::run(config)
}
