//! CLI layer - User-facing command-line interface.
//!
//! This module provides the command-line interface for the rld tool.
//! It handles argument parsing, command dispatch, and result reporting.
//!
//! ## Module Structure
//!
//! - `args`: CLI argument definitions using clap
//! - `exit_status`: Exit status codes
//! - `run`: Command dispatcher

use anyhow::Result;

pub use args::{Arguments, CheckArgs, Command, OutputFormat};
pub use exit_status::ExitStatus;

pub mod args;
mod exit_status;
mod run;

pub fn run_cli(args: Arguments) -> Result<ExitStatus> {
    let Some(args) = args.with_command_or_help() else {
        return Ok(ExitStatus::Success);
    };

    run::run(args)
}
