//! CLI definitions for matchpilot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// matchpilot CLI.
#[derive(Parser)]
#[command(name = "matchpilot")]
#[command(about = "Plays a head-to-head contest tournament on a game site through Chrome")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/matchpilot.toml", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Sign in, register, set up the contest and play every round (default)
    Run(RunArgs),

    /// Load and validate the configuration, then exit
    CheckConfig,

    /// Print the summary of a saved tournament result
    Report {
        /// Results JSON written by a previous run
        file: PathBuf,
    },
}

#[derive(clap::Args, Default)]
pub(crate) struct RunArgs {
    /// Override tournament.rounds_per_side
    #[arg(long)]
    pub rounds_per_side: Option<u32>,

    /// Override tournament.opponent_name
    #[arg(long)]
    pub opponent: Option<String>,

    /// Exit when the tournament ends instead of keeping the browser open
    #[arg(long)]
    pub no_hold: bool,
}
