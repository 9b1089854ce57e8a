//! Command dispatcher for the rld CLI.
//!
//! Builds the resolved configuration (CLI overrides layered over the config
//! file), drives the analysis context, and renders either the terminal
//! report or the JSON envelope.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;

use super::{
    args::{Arguments, CheckArgs, Command, OutputFormat},
    exit_status::ExitStatus,
};
use crate::{
    config::{CONFIG_FILE_NAME, default_config_json, load_config, load_config_file},
    core::context::AnalysisContext,
    envelope,
    report::{print_parse_warning, print_success, report},
};

pub fn run(Arguments { command }: Arguments) -> Result<ExitStatus> {
    match command {
        Some(Command::Check(cmd)) => check(cmd.args),
        Some(Command::Init) => {
            init()?;
            Ok(ExitStatus::Success)
        }
        None => {
            anyhow::bail!("No command provided. Use --help to see available commands.")
        }
    }
}

fn check(args: CheckArgs) -> Result<ExitStatus> {
    let root = args.path.clone().unwrap_or_else(|| PathBuf::from("."));

    let loaded = match &args.config {
        Some(path) => load_config_file(path)?,
        None => load_config(&root)?,
    };
    if args.verbose && !loaded.from_file {
        eprintln!("Note: No {} found, using default configuration", CONFIG_FILE_NAME);
    }

    let mut config = loaded.config;
    if let Some(severity) = args.min_severity {
        config.min_severity = severity;
    }
    if let Some(confidence) = args.min_confidence {
        config.min_confidence = confidence;
    }
    if args.confirmed_only {
        config.include_potential_issues = false;
    }
    config.ignores.extend(args.ignore.iter().cloned());
    if args.jobs.is_some() {
        config.jobs = args.jobs;
    }
    if args.debug {
        config.debug = true;
    }
    config.validate()?;

    let context = AnalysisContext::new(config, &root, args.verbose)?;
    let result = context.run()?;

    match args.format {
        OutputFormat::Text => {
            print_parse_warning(result.summary.files_skipped, args.verbose);
            if result.is_clean() {
                print_success(result.summary.files_analyzed, result.summary.hooks_analyzed);
            } else {
                report(&result);
            }
        }
        OutputFormat::Json => {
            println!("{}", envelope::to_json(&result)?);
        }
    }

    Ok(if result.has_blocking() {
        ExitStatus::Failure
    } else {
        ExitStatus::Success
    })
}

fn init() -> Result<()> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", CONFIG_FILE_NAME);
    }

    fs::write(config_path, default_config_json()?)?;
    Ok(())
}
