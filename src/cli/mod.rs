//! CLI module - Command-line interface definitions and handlers
//!
//! Uses clap v4 with derive macros for argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use output::OutputFormat;

pub mod commands;
pub mod output;

/// paperbridge - blocking literature search over a publish/subscribe broker
#[derive(Parser, Debug)]
#[command(name = "paperbridge")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable JSON output for machine consumption (same as -O json)
    #[arg(long, global = true)]
    pub robot: bool,

    /// Output format (human, json, plain)
    #[arg(long, short = 'O', global = true, value_enum)]
    pub output_format: Option<OutputFormat>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Silence log output on stderr (results and errors are still printed)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file path (default: <config dir>/paperbridge/config.toml)
    #[arg(long, global = true, env = "PAPERBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    #[must_use]
    pub fn output_format(&self) -> OutputFormat {
        OutputFormat::from_args(self.robot, self.output_format)
    }

    /// Whether errors and results should be emitted as JSON.
    #[must_use]
    pub fn machine_output(&self) -> bool {
        self.output_format().is_machine_readable()
    }
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search the literature API and wait for the reply
    Search(commands::search::SearchArgs),

    /// Show the effective configuration
    Config(commands::config::ConfigArgs),
}
