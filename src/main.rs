#![forbid(unsafe_code)]

//! `slack-activity`: lists the conversations active on a given day.
//!
//! Loads configuration, recovers slackdump credentials, and prints the active
//! conversations with resolved names plus the UTC export window.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use slack_activity::config::EngineConfig;
use slack_activity::discovery::{self, ActivityReport};
use slack_activity::window::local_today;
use slack_activity::{AppError, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "slack-activity", about = "List active Slack conversations for a day", version, long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long)]
    config: PathBuf,

    /// Export day (YYYY-MM-DD) in the configured timezone; defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// Output format for the conversation list.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> ExitCode {
    let args = Cli::parse();
    if let Err(err) = init_tracing(args.log_format) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))
        .and_then(|runtime| runtime.block_on(run(args)));

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(AppError::Credential(err)) => {
            error!(code = %err.code(), "{}", err.message());
            eprintln!("{}", err.remediation());
            ExitCode::FAILURE
        }
        Err(err) => {
            error!(%err, "discovery failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Cli) -> Result<()> {
    let config = EngineConfig::load_from_path(&args.config)?;
    let date = match args.date {
        Some(date) => date,
        None => local_today(config.tz()?).format("%Y-%m-%d").to_string(),
    };
    info!(%date, timezone = %config.timezone, "discovering active conversations");

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, cancelling");
            ctrl_c.cancel();
        }
    });

    let report = discovery::discover(&config, &date, cancel).await?;
    print_report(&report, args.output)
}

fn print_report(report: &ActivityReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(report)
                .map_err(|err| AppError::Io(format!("cannot encode report: {err}")))?;
            println!("{json}");
        }
        OutputFormat::Table => {
            println!(
                "window: {} .. {}",
                report.window.start_utc.to_rfc3339(),
                report.window.end_utc.to_rfc3339()
            );
            for conv in &report.conversations {
                let last = conv
                    .last_message_time
                    .map_or_else(|| "-".to_owned(), |t| t.to_rfc3339());
                println!("{:<12} {:<8} {:<32} {last}", conv.id, conv.kind(), conv.name);
            }
        }
    }
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(env_filter).with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
