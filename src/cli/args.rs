//! CLI argument definitions using clap.
//!
//! This module defines the command-line interface structure for all rld
//! commands. It uses clap's derive API for declarative argument parsing.
//!
//! ## Commands
//!
//! - `check`: Analyze a project for re-render loops and import cycles
//! - `init`: Initialize an rld configuration file

use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};

use crate::diagnostics::{Confidence, Severity};

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Arguments {
    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Arguments {
    /// Check if a command was provided, otherwise print help and return None.
    pub fn with_command_or_help(self) -> Option<Self> {
        if self.command.is_none() {
            Self::command().print_help().ok();
            None
        } else {
            Some(self)
        }
    }

    /// Get the verbose flag from the command's args.
    pub fn verbose(&self) -> bool {
        match &self.command {
            Some(Command::Check(cmd)) => cmd.args.verbose,
            Some(Command::Init) | None => false,
        }
    }
}

/// Output format for check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Cargo-style terminal report.
    #[default]
    Text,
    /// Machine-readable JSON envelope.
    Json,
}

#[derive(Debug, Clone, Parser)]
pub struct CheckArgs {
    /// Project root to analyze (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Path to the configuration file (default: .rldrc.json discovered upward)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    /// Minimum severity to report (overrides config file)
    #[arg(long, value_enum)]
    pub min_severity: Option<Severity>,

    /// Minimum confidence to report (overrides config file)
    #[arg(long, value_enum)]
    pub min_confidence: Option<Confidence>,

    /// Only report confirmed infinite loops, dropping potential issues
    #[arg(long)]
    pub confirmed_only: bool,

    /// Extra ignore globs (can be specified multiple times)
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Number of analysis threads (default: logical cores - 1)
    #[arg(long, env = "RLD_JOBS")]
    pub jobs: Option<usize>,

    /// Attach rule debug records to diagnostics
    #[arg(long)]
    pub debug: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Args)]
pub struct CheckCommand {
    #[command(flatten)]
    pub args: CheckArgs,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a React project for infinite re-render risks and import cycles
    Check(CheckCommand),
    /// Initialize a new .rldrc.json configuration file
    Init,
}
