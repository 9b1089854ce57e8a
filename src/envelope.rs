//! Machine-readable JSON envelope.
//!
//! One entry per diagnostic with `ruleId`, `level` (critical → error,
//! warning → warning, performance → note), the message, and the physical
//! location, plus the cycle lists and the run summary. The envelope carries
//! a schema version and the tool name/version so downstream consumers can
//! detect drift.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::diagnostics::{Category, Diagnostic, RunResult, RunSummary};

pub const SCHEMA_VERSION: &str = "1.0.0";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<'a> {
    schema_version: &'static str,
    tool: Tool,
    results: Vec<ResultEntry<'a>>,
    summary: &'a RunSummary,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Location<'a> {
    path: &'a str,
    line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    column: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultEntry<'a> {
    rule_id: &'static str,
    level: &'static str,
    message: &'a str,
    location: Location<'a>,
    category: Category,
    severity: crate::diagnostics::Severity,
    confidence: crate::diagnostics::Confidence,
    kind: crate::diagnostics::DiagnosticKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    hook_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    problematic_dependency: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    setter_function: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cycle: Option<&'a [String]>,
}

fn level_for(category: Category) -> &'static str {
    match category {
        Category::Critical => "error",
        Category::Warning => "warning",
        Category::Performance => "note",
    }
}

fn entry(diagnostic: &Diagnostic) -> ResultEntry<'_> {
    ResultEntry {
        rule_id: diagnostic.code.as_str(),
        level: level_for(diagnostic.category),
        message: &diagnostic.explanation,
        location: Location {
            path: &diagnostic.location.file_path,
            line: diagnostic.location.line,
            column: diagnostic.location.col,
        },
        category: diagnostic.category,
        severity: diagnostic.severity,
        confidence: diagnostic.confidence,
        kind: diagnostic.kind,
        hook_kind: diagnostic.hook_kind.map(|k| k.as_str()),
        problematic_dependency: diagnostic.problematic_dependency.as_deref(),
        setter_function: diagnostic.setter_function.as_deref(),
        suggestion: diagnostic.suggestion.as_deref(),
        cycle: diagnostic.cycle.as_deref(),
    }
}

/// Serialize the run result as the machine-readable envelope.
pub fn to_json(result: &RunResult) -> Result<String> {
    let envelope = Envelope {
        schema_version: SCHEMA_VERSION,
        tool: Tool {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
        results: result.all().map(entry).collect(),
        summary: &result.summary,
    };
    serde_json::to_string_pretty(&envelope).context("Failed to serialize analysis result")
}
