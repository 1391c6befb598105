//! Intent Router
//!
//! Maps natural-language commands in seven languages onto actions.
//!
//! # Usage
//!
//! ```bash
//! intent-router query "check my points"
//! intent-router repl
//! intent-router detect "查询我的积分"
//! intent-router stats [--json]
//! intent-router clear-cache
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/intent-router/config.toml)
//! 3. Environment variables (INTENT_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use intent_cli::{
    clear_cache, init_logging, load_settings, run_detect, run_query, run_repl, show_stats, Cli,
    Commands,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.config.as_deref(), cli.log_level.as_deref(), cli.provider)?;
    init_logging(&settings)?;

    match cli.command {
        Commands::Query { text, json } => {
            run_query(&settings, &text.join(" "), json).await?;
        }
        Commands::Repl => {
            run_repl(&settings).await?;
        }
        Commands::Detect { text, json } => {
            run_detect(&settings, &text.join(" "), json)?;
        }
        Commands::Stats { json } => {
            show_stats(&settings, json).await?;
        }
        Commands::ClearCache => {
            clear_cache(&settings).await?;
        }
    }

    Ok(())
}
