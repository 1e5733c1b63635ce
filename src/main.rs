//! metrics-dash - unit metrics dashboard over a published spreadsheet export
//!
//! # Usage
//!
//! ```bash
//! metrics-dash --url "https://docs.google.com/.../pub?output=csv"
//! metrics-dash --file export.csv --format json --once
//! metrics-dash --config dashboard.json --interval 60
//! ```
//!
//! While running, stdin accepts `r` (refresh), `u <unit>` (select a unit),
//! `a` (all units) and `q` (quit).

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use metrics_dash::analyzer::{DashboardOptions, Selection};
use metrics_dash::ingest::source_from_config;
use metrics_dash::render::{JsonPublisher, Publisher, TablePublisher};
use metrics_dash::{trigger_channel, AppConfig, RefreshOrchestrator, Trigger, TriggerHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

/// Unit metrics dashboard over a published spreadsheet export
#[derive(Parser, Debug)]
#[command(name = "metrics-dash")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// CSV export URL (overrides the config file)
    #[arg(long, conflicts_with = "file")]
    url: Option<String>,

    /// Local CSV export (overrides the config file)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Seconds between automatic refreshes
    #[arg(short, long)]
    interval: Option<u64>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Refresh once, publish, and exit
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_json)?;

    let config = load_config(&cli)?;
    let source = source_from_config(&config.source)?;
    let publisher: Box<dyn Publisher> = match cli.format {
        OutputFormat::Table => Box::new(TablePublisher::new(
            std::io::stdout(),
            config.schema.clone(),
        )),
        OutputFormat::Json => Box::new(JsonPublisher::new(std::io::stdout())),
    };
    let mut orchestrator = RefreshOrchestrator::new(
        source,
        publisher,
        config.schema.clone(),
        DashboardOptions::from(&config),
    );

    if cli.once {
        orchestrator.refresh().await.context("refresh failed")?;
        return Ok(());
    }

    let (handle, rx) = trigger_channel(16);
    tokio::spawn(read_commands(handle.clone()));
    tokio::spawn(shutdown_on_ctrl_c(handle));

    let period = Duration::from_secs(config.refresh_interval_secs);
    tracing::info!(interval_secs = config.refresh_interval_secs, "Dashboard started");
    let orchestrator = orchestrator.run(rx, period).await;

    let state = orchestrator.state();
    tracing::info!(
        rows = state.rows.len(),
        failures = state.consecutive_failures,
        "Dashboard stopped"
    );
    Ok(())
}

/// Config file first, then command-line overrides.
fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = AppConfig::load(cli.config.as_deref())
        .with_context(|| format!("loading config {:?}", cli.config))?;

    if let Some(url) = &cli.url {
        config.source.url = Some(url.clone());
        config.source.path = None;
    }
    if let Some(file) = &cli.file {
        config.source.path = Some(file.clone());
    }
    if let Some(secs) = cli.interval {
        config.refresh_interval_secs = secs;
    }
    config.validate()?;
    Ok(config)
}

/// Initialize the tracing subscriber; logs go to stderr so stdout carries
/// only the dashboard.
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow::anyhow!("invalid log level: {}", e))?;

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .init();
    }
    Ok(())
}

fn parse_command(line: &str) -> Option<Trigger> {
    let line = line.trim();
    let (cmd, arg) = match line.split_once(char::is_whitespace) {
        Some((cmd, arg)) => (cmd, arg.trim()),
        None => (line, ""),
    };
    match cmd {
        "r" | "refresh" => Some(Trigger::Refresh),
        "a" | "all" => Some(Trigger::Select(Selection::All)),
        "u" | "unit" => Some(Trigger::Select(Selection::from_label(arg))),
        "q" | "quit" => Some(Trigger::Shutdown),
        _ => None,
    }
}

async fn read_commands(handle: TriggerHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => return,
            Err(e) => {
                tracing::warn!(error = %e, "Reading commands from stdin failed");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        let Some(trigger) = parse_command(&line) else {
            tracing::warn!(input = %line.trim(), "Unknown command (r, u <unit>, a, q)");
            continue;
        };
        let quit = trigger == Trigger::Shutdown;
        if handle.send(trigger).await.is_err() || quit {
            return;
        }
    }
}

async fn shutdown_on_ctrl_c(handle: TriggerHandle) {
    if tokio::signal::ctrl_c().await.is_ok() {
        let _ = handle.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("r"), Some(Trigger::Refresh));
        assert_eq!(parse_command(" q "), Some(Trigger::Shutdown));
        assert_eq!(parse_command("a"), Some(Trigger::Select(Selection::All)));
        assert_eq!(
            parse_command("u  Loja Centro "),
            Some(Trigger::Select(Selection::Unit("Loja Centro".into())))
        );
        assert_eq!(parse_command("u"), Some(Trigger::Select(Selection::All)));
        assert_eq!(parse_command("x"), None);
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::parse_from(["metrics-dash", "--file", "export.csv", "--interval", "5"]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.source.path, Some(PathBuf::from("export.csv")));
        assert_eq!(config.refresh_interval_secs, 5);
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let cli = Cli::parse_from(["metrics-dash"]);
        assert!(load_config(&cli).is_err());
    }

    #[test]
    fn test_url_and_file_conflict() {
        let parsed = Cli::try_parse_from(["metrics-dash", "--url", "http://x", "--file", "a.csv"]);
        assert!(parsed.is_err());
    }
}
