//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// BoardBot - board game referee bot
#[derive(Parser, Debug)]
#[command(
    name = "bb",
    author,
    version,
    about = "Board game referee bot: map updates, dice, and timed number collection"
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show the effective configuration
    Config {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Show the reconnect wait schedule
    Backoff {
        /// Number of attempts to show
        #[arg(short, long, default_value = "6")]
        attempts: u32,
    },

    /// Roll dice for a player
    Roll {
        /// Dice variant (dice1, dice2, dice3, dice4)
        variant: String,

        /// Player number, starting at 1
        player: u8,
    },

    /// Draw a marker on the map
    Draw {
        /// Circle as "cx,cy ex,ey"
        locator: String,

        /// Update category (auction-folded, unmortgaged, mortgaged)
        category: String,

        /// Owner token (p1, p2, ...)
        owner: String,
    },

    /// Replace the map with a fresh copy of the template
    Refresh,
}

/// Output format for the config command
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        debug!(%s, "OutputFormat::from_str: called");
        match s.to_lowercase().as_str() {
            "text" | "yaml" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use text or json.", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_draw() {
        let cli = Cli::try_parse_from(["bb", "draw", "745,1136 755,1146", "mortgaged", "p3"]).unwrap();
        match cli.command {
            Command::Draw {
                locator,
                category,
                owner,
            } => {
                assert_eq!(locator, "745,1136 755,1146");
                assert_eq!(category, "mortgaged");
                assert_eq!(owner, "p3");
            }
            other => panic!("Expected Draw, got {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["bb", "backoff", "--log-level", "debug", "-c", "x.yml"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.config, Some(PathBuf::from("x.yml")));
    }

    #[test]
    fn test_output_format_parse() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("yaml".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert!("table".parse::<OutputFormat>().is_err());
    }
}
