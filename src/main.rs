//! matchpilot - contest tournament runner
//!
//! Main entry point for the matchpilot CLI.

mod cli;
mod prompt;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, bail};
use clap::Parser;
use tokio::sync::Notify;
use tracing::{error, info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use matchpilot_browser::{BrowserManager, BrowserManagerConfig};
use matchpilot_config::{Config, ConfigLoader, ConfigValidator};
use matchpilot_core::{TournamentResult, Workflow};

use cli::{Cli, Commands, RunArgs};
use prompt::{ConsolePrompt, spawn_enter_listener};

/// Get the matchpilot data directory.
fn matchpilot_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".matchpilot")
}

/// Initialize tracing with both console and file output.
///
/// Log files are written to ~/.matchpilot/logs/ with daily rotation.
fn init_tracing() -> anyhow::Result<()> {
    let log_dir = matchpilot_dir().join("logs");
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("matchpilot")
        .filename_suffix("log")
        .max_log_files(30)
        .build(&log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Dropping the guard stops the writer thread and loses buffered lines.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let Cli { config, command } = Cli::parse();

    match command.unwrap_or_else(|| Commands::Run(RunArgs::default())) {
        Commands::Run(args) => run(&config, args).await,
        Commands::CheckConfig => check_config(&config),
        Commands::Report { file } => report(&file),
    }
}

/// Load the config file and make sure it is usable.
fn load_config(path: &Path, args: &RunArgs) -> anyhow::Result<Config> {
    let mut config =
        ConfigLoader::load(path).with_context(|| format!("loading {}", path.display()))?;

    if let Some(rounds) = args.rounds_per_side {
        config.tournament.rounds_per_side = rounds;
    }
    if let Some(opponent) = &args.opponent {
        config.tournament.opponent_name = opponent.clone();
    }

    let warnings = ConfigValidator::validate(&config)?.into_result()?;
    for warning in warnings {
        warn!(field = %warning.path, "{}", warning.message);
    }
    Ok(config)
}

async fn run(config_path: &Path, args: RunArgs) -> anyhow::Result<()> {
    let config = load_config(config_path, &args)?;
    info!(
        contest = %config.tournament.contest_name,
        opponent = %config.tournament.opponent_name,
        rounds = config.tournament.total_rounds(),
        "Starting tournament"
    );

    let browser = Arc::new(BrowserManager::new(BrowserManagerConfig::from_config(
        &config.browser,
    )));
    browser.connect().await.context("connecting to Chrome")?;

    let wake = Arc::new(Notify::new());
    spawn_enter_listener(wake.clone());

    let workflow = Workflow::new(config, Arc::new(ConsolePrompt)).with_wake(wake);
    let outcome = workflow.run(browser.clone()).await;

    if let Err(e) = &outcome {
        error!("Tournament failed: {}", e);
    }

    if !args.no_hold {
        info!("Browser left open for inspection. Press Ctrl-C to exit.");
        tokio::signal::ctrl_c().await?;
    }

    browser.close().await?;
    outcome.map(|_| ()).context("tournament did not finish")
}

fn check_config(path: &Path) -> anyhow::Result<()> {
    let config = ConfigLoader::load(path).with_context(|| format!("loading {}", path.display()))?;
    let result = ConfigValidator::validate(&config)?;

    for warning in &result.warnings {
        println!("warning: {}: {}", warning.path, warning.message);
    }
    for err in &result.errors {
        println!("error: {}: {}", err.path, err.message);
    }

    if !result.is_valid() {
        bail!("{} has {} error(s)", path.display(), result.errors.len());
    }
    println!(
        "{} is valid: {} vs {} in {}, {} rounds",
        path.display(),
        config.tournament.self_name,
        config.tournament.opponent_name,
        config.tournament.contest_name,
        config.tournament.total_rounds()
    );
    Ok(())
}

fn report(path: &Path) -> anyhow::Result<()> {
    let result = TournamentResult::load(path).with_context(|| format!("reading {}", path.display()))?;
    println!("{}", result.report());
    Ok(())
}
