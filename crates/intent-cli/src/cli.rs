//! CLI argument parsing for the intent router.
//!
//! CLI flags override every other configuration source.

use clap::{Parser, Subcommand, ValueEnum};
use intent_types::ProviderKind;

/// Intent Router
///
/// Maps natural-language commands in seven languages onto actions.
#[derive(Parser, Debug)]
#[command(name = "intent-router")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/intent-router/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Embedding provider override
    #[arg(short, long, global = true, value_enum)]
    pub provider: Option<ProviderArg>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Embedding provider choices
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderArg {
    /// Local sentence-transformer model (downloaded on first use)
    Candle,
    /// Feature hashing, no model files
    Hashing,
}

impl From<ProviderArg> for ProviderKind {
    fn from(arg: ProviderArg) -> Self {
        match arg {
            ProviderArg::Candle => ProviderKind::Candle,
            ProviderArg::Hashing => ProviderKind::Hashing,
        }
    }
}

/// Router commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Answer a single utterance
    Query {
        /// Text to interpret
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Interactive prompt; one utterance per line
    Repl,

    /// Detect the language of a text without matching it
    Detect {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show catalog, index and cache statistics
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Remove the on-disk embedding cache
    ClearCache,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_query_joins_words() {
        let cli = Cli::parse_from(["intent-router", "query", "check", "my", "points"]);
        match cli.command {
            Commands::Query { text, json } => {
                assert_eq!(text.join(" "), "check my points");
                assert!(!json);
            }
            _ => panic!("Expected Query command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "intent-router",
            "stats",
            "--json",
            "--provider",
            "hashing",
            "--log-level",
            "debug",
        ]);
        assert_eq!(cli.provider, Some(ProviderArg::Hashing));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Stats { json: true }));
    }

    #[test]
    fn test_cli_clear_cache_with_config() {
        let cli = Cli::parse_from(["intent-router", "--config", "/tmp/router.toml", "clear-cache"]);
        assert_eq!(cli.config.as_deref(), Some("/tmp/router.toml"));
        assert!(matches!(cli.command, Commands::ClearCache));
    }

    #[test]
    fn test_cli_query_requires_text() {
        assert!(Cli::try_parse_from(["intent-router", "query"]).is_err());
    }
}
