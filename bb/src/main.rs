//! BoardBot - board game referee bot
//!
//! CLI entry point for one-shot map updates, dice rolls and config inspection.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result, eyre};
use tracing::{debug, info};

use boardbot::cli::{Cli, Command, OutputFormat};
use boardbot::config::Config;
use boardbot::{
    Bot, Category, CommandRenderer, DiceTable, DiceVariant, Locator, OfflineTransport, OutboxReceiver, backoff_wait,
};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("boardbot")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("boardbot.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_log_level = Config::load_log_level(cli.config.as_ref());
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(nickname = %config.irc.nickname, channel = %config.irc.channel, "BoardBot loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Config { format } => cmd_config(&config, format),
        Command::Backoff { attempts } => cmd_backoff(&config, attempts),
        Command::Roll { variant, player } => cmd_roll(&config, &variant, player),
        Command::Draw {
            locator,
            category,
            owner,
        } => cmd_draw(config, &locator, &category, &owner).await,
        Command::Refresh => cmd_refresh(config).await,
    }
}

/// Print the effective configuration
fn cmd_config(config: &Config, format: OutputFormat) -> Result<()> {
    debug!(?format, "cmd_config: called");
    let rendered = match format {
        OutputFormat::Text => serde_yaml::to_string(config).context("Failed to render config")?,
        OutputFormat::Json => serde_json::to_string_pretty(config).context("Failed to render config")?,
    };
    println!("{}", rendered.trim_end());
    Ok(())
}

/// Print the reconnect wait after each failed attempt
fn cmd_backoff(config: &Config, attempts: u32) -> Result<()> {
    debug!(attempts, "cmd_backoff: called");
    let (base, max) = (config.reconnect.base_wait(), config.reconnect.max_wait());
    for attempt in 1..=attempts {
        let wait = backoff_wait(base, max, attempt);
        let marker = if wait == max { " (capped)".dimmed().to_string() } else { String::new() };
        println!("attempt {}: wait {}s{}", attempt.to_string().cyan(), wait.as_secs(), marker);
    }
    Ok(())
}

fn cmd_roll(config: &Config, variant: &str, player: u8) -> Result<()> {
    debug!(%variant, player, "cmd_roll: called");
    let variant: DiceVariant = variant.parse()?;
    let mut table = DiceTable::new(config.dice.num_players);
    let roll = table.roll(variant, player)?;
    println!("{} {}", "🎲".yellow(), roll);
    Ok(())
}

async fn cmd_draw(config: Config, locator: &str, category: &str, owner: &str) -> Result<()> {
    debug!(%locator, %category, %owner, "cmd_draw: called");
    let target: Locator = locator.parse()?;
    let category: Category = category.parse()?;

    let renderer = Arc::new(CommandRenderer::from_config(&config.render));
    let (bot, rx) = Bot::start(config, Arc::new(OfflineTransport), renderer)?;
    bot.mark(target, category, owner);
    finish(bot, rx).await
}

async fn cmd_refresh(config: Config) -> Result<()> {
    debug!("cmd_refresh: called");
    let renderer = Arc::new(CommandRenderer::from_config(&config.render));
    let (bot, rx) = Bot::start(config, Arc::new(OfflineTransport), renderer)?;
    let staged = bot.refresh().await;
    finish(bot, rx).await?;
    staged
}

/// Drain the queue, echo any messages, and fail if a task failed
async fn finish(bot: Bot, mut rx: OutboxReceiver) -> Result<()> {
    let artifact = bot.config().artifact.path.clone();
    let metrics = bot.shutdown().await;

    while let Ok(msg) = rx.try_recv() {
        println!("{}", msg.text().dimmed());
    }

    if metrics.failed > 0 {
        return Err(eyre!("{} of {} update(s) failed, see log", metrics.failed, metrics.enqueued));
    }
    println!(
        "{} Applied {} update(s) to {}",
        "✓".green(),
        metrics.applied,
        artifact.display().to_string().cyan()
    );
    Ok(())
}
