//! rld - infinite re-render loop detector for React projects
//!
//! rld is a CLI tool and library that statically analyzes React codebases and
//! reports infinite re-render risks: state setters called during render,
//! effects that unconditionally write state they also depend on, unstable
//! references in dependency lists, and import cycles across the file graph.
//!
//! ## Module Structure
//!
//! - `cli`: Command-line interface layer (arguments, exit codes, driver)
//! - `config`: Resolved analyzer configuration and `.rldrc.json` loading
//! - `core`: Core analysis engine (scanner, parser, semantics, CFG, rules)
//! - `diagnostics`: Diagnostic type definitions and the run result
//! - `envelope`: Machine-readable JSON output
//! - `report`: Terminal report formatting

pub mod cli;
pub mod config;
pub mod core;
pub mod diagnostics;
pub mod envelope;
pub mod report;
