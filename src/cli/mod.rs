pub mod commands;

use clap::Parser;
use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;

/// Every flag is optional; a bare invocation runs with `combined-rss.toml`
/// from the working directory or the built-in defaults.
#[derive(Parser, Debug)]
#[command(name = "combined-rss")]
#[command(about = "Merge RSS feeds into one RSS 2.0 file with archive links and full text")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "COMBINED_RSS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = Config::discover(self.config.as_deref())?;

        let _log_guard = commands::init_logging(self.debug, self.verbose, &config.logging)?;

        commands::combine(config).await
    }
}
