//! Report formatting and printing utilities.
//!
//! This module displays diagnostics in cargo-style format. It is separate
//! from the core so rld can be used as a library without pulling terminal
//! concerns along.

use std::fs;
use std::io::{self, Write};

use colored::Colorize;
use unicode_width::UnicodeWidthStr;

use crate::diagnostics::{Category, Diagnostic, RunResult};

/// Success mark for consistent output formatting.
pub const SUCCESS_MARK: &str = "\u{2713}"; // ✓

/// Failure mark for consistent output formatting.
pub const FAILURE_MARK: &str = "\u{2718}"; // ✘

/// Print the run result in cargo-style format to stdout.
pub fn report(result: &RunResult) {
    report_to(result, &mut io::stdout().lock());
}

/// Print the run result to a custom writer.
///
/// Useful for testing or redirecting output.
pub fn report_to<W: Write>(result: &RunResult, writer: &mut W) {
    let diagnostics: Vec<&Diagnostic> = result.all().collect();
    if diagnostics.is_empty() {
        return;
    }

    let max_line_width = diagnostics
        .iter()
        .map(|d| d.location.line)
        .max()
        .map(|n| n.to_string().len())
        .unwrap_or(1);

    for diagnostic in &diagnostics {
        print_diagnostic(diagnostic, writer, max_line_width);
    }

    print_summary(result, writer);
}

/// Print a success message when nothing was found.
pub fn print_success(files: usize, hooks: usize) {
    print_success_to(files, hooks, &mut io::stdout().lock());
}

pub fn print_success_to<W: Write>(files: usize, hooks: usize, writer: &mut W) {
    let msg = format!(
        "{} {}",
        SUCCESS_MARK.green(),
        format!(
            "Analyzed {} {} ({} {}) - no re-render risks found",
            files,
            if files == 1 { "file" } else { "files" },
            hooks,
            if hooks == 1 { "hook" } else { "hooks" }
        )
        .green()
    );
    let _ = writeln!(writer, "{}", msg);
}

/// Print a warning about files that could not be parsed or read.
pub fn print_parse_warning(count: usize, verbose: bool) {
    print_parse_warning_to(count, verbose, &mut io::stderr().lock());
}

pub fn print_parse_warning_to<W: Write>(count: usize, verbose: bool, writer: &mut W) {
    if count > 0 && !verbose {
        let _ = writeln!(
            writer,
            "{} {} file(s) skipped (use {} for details)",
            "warning:".bold().yellow(),
            count,
            "-v".cyan()
        );
    }
}

// ============================================================
// Internal Functions
// ============================================================

fn print_diagnostic<W: Write>(diagnostic: &Diagnostic, writer: &mut W, max_line_width: usize) {
    let level = match diagnostic.category {
        Category::Critical => "error".bold().red(),
        Category::Warning => "warning".bold().yellow(),
        Category::Performance => "note".bold().cyan(),
    };

    let _ = writeln!(
        writer,
        "{}: {}  {}",
        level,
        diagnostic.explanation,
        diagnostic.code.to_string().dimmed().cyan()
    );

    // Clickable location: --> path:line:col
    let _ = writeln!(
        writer,
        "  {} {}:{}:{}",
        "-->".blue(),
        diagnostic.location.file_path,
        diagnostic.location.line,
        diagnostic.location.col_or_default()
    );

    if let Some(source_line) = read_source_line(diagnostic) {
        let caret = match diagnostic.category {
            Category::Critical => "^".red(),
            Category::Warning => "^".yellow(),
            Category::Performance => "^".cyan(),
        };

        let _ = writeln!(
            writer,
            "{:>width$} {}",
            "",
            "|".blue(),
            width = max_line_width
        );
        let _ = writeln!(
            writer,
            "{:>width$} {} {}",
            diagnostic.location.line.to_string().blue(),
            "|".blue(),
            source_line,
            width = max_line_width
        );

        // Caret pointing to the column (col is 1-based)
        let col = diagnostic.location.col_or_default();
        let prefix: String = source_line.chars().take(col.saturating_sub(1)).collect();
        let caret_padding = UnicodeWidthStr::width(prefix.as_str());
        let _ = writeln!(
            writer,
            "{:>width$} {} {:>padding$}{}",
            "",
            "|".blue(),
            "",
            caret,
            width = max_line_width,
            padding = caret_padding
        );
    }

    if let Some(cycle) = &diagnostic.cycle {
        let _ = writeln!(
            writer,
            "{:>width$} {} {} {}",
            "",
            "=".blue(),
            "cycle:".bold(),
            cycle.join(" -> "),
            width = max_line_width
        );
    }

    if let Some(suggestion) = &diagnostic.suggestion {
        let _ = writeln!(
            writer,
            "{:>width$} {} {} {}",
            "",
            "=".blue(),
            "help:".bold().cyan(),
            suggestion,
            width = max_line_width
        );
    }

    if let Some(record) = &diagnostic.debug_record {
        let _ = writeln!(
            writer,
            "{:>width$} {} {} {}",
            "",
            "=".blue(),
            "debug:".bold(),
            record.dimmed(),
            width = max_line_width
        );
    }

    let _ = writeln!(writer); // Empty line between diagnostics
}

/// Fetch the offending source line for context; display only, so a read
/// failure silently drops the snippet.
fn read_source_line(diagnostic: &Diagnostic) -> Option<String> {
    let content = fs::read_to_string(&diagnostic.location.file_path).ok()?;
    content
        .lines()
        .nth(diagnostic.location.line.checked_sub(1)?)
        .map(str::to_string)
}

fn print_summary<W: Write>(result: &RunResult, writer: &mut W) {
    let errors = result.summary.critical_count;
    let warnings = result.summary.warning_count;
    let notes = result.summary.performance_count;
    let total = errors + warnings + notes;

    if total > 0 {
        let _ = writeln!(
            writer,
            "\n{} {} problems ({} {}, {} {}, {} {})",
            FAILURE_MARK.red(),
            total,
            errors,
            if errors == 1 { "error" } else { "errors" }.red(),
            warnings,
            if warnings == 1 { "warning" } else { "warnings" }.yellow(),
            notes,
            if notes == 1 { "note" } else { "notes" }.cyan()
        );
    }
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{DiagnosticCode, RunSummary, SourceLocation};

    fn strip_ansi(s: &str) -> String {
        // Simple ANSI escape code stripper for testing
        let mut result = String::new();
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            if c == '\x1b' {
                while let Some(&next) = chars.peek() {
                    chars.next();
                    if next == 'm' {
                        break;
                    }
                }
            } else {
                result.push(c);
            }
        }
        result
    }

    fn run_result(diagnostics: Vec<Diagnostic>) -> RunResult {
        let mut summary = RunSummary::default();
        for d in &diagnostics {
            match d.category {
                Category::Critical => summary.critical_count += 1,
                Category::Warning => summary.warning_count += 1,
                Category::Performance => summary.performance_count += 1,
            }
        }
        RunResult {
            import_cycles: Vec::new(),
            cross_file_cycles: Vec::new(),
            hook_diagnostics: diagnostics,
            summary,
        }
    }

    #[test]
    fn test_report_empty() {
        let mut output = Vec::new();
        report_to(&RunResult::default(), &mut output);
        assert!(output.is_empty());
    }

    #[test]
    fn test_report_critical_diagnostic() {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::EffectUnconditionalWrite,
            Category::Critical,
            SourceLocation::new("./src/App.tsx", 10).with_col(5),
            "the effect always writes state it depends on",
        )
        .with_suggestion("guard the write");

        let mut output = Vec::new();
        report_to(&run_result(vec![diagnostic]), &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());

        assert!(stripped.contains("error:"));
        assert!(stripped.contains("RLD-200"));
        assert!(stripped.contains("./src/App.tsx:10:5"));
        assert!(stripped.contains("help:"));
        assert!(stripped.contains("guard the write"));
        assert!(stripped.contains("1 problems (1 error, 0 warnings, 0 notes)"));
    }

    #[test]
    fn test_report_performance_note() {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::UnstableObjectDep,
            Category::Performance,
            SourceLocation::new("./src/App.tsx", 4).with_col(3),
            "object literal dependency",
        );

        let mut output = Vec::new();
        report_to(&run_result(vec![diagnostic]), &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());

        assert!(stripped.contains("note:"));
        assert!(stripped.contains("RLD-400"));
        assert!(stripped.contains("0 errors, 0 warnings, 1 note"));
    }

    #[test]
    fn test_report_cycle_line() {
        let diagnostic = Diagnostic::new(
            DiagnosticCode::ImportCycle,
            Category::Critical,
            SourceLocation::new("./b.tsx", 1),
            "Import cycle detected",
        )
        .with_cycle(vec![
            "./a.tsx".to_string(),
            "./b.tsx".to_string(),
            "./a.tsx".to_string(),
        ]);

        let mut result = RunResult::default();
        result.summary.critical_count = 1;
        result.import_cycles.push(diagnostic);

        let mut output = Vec::new();
        report_to(&result, &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());

        assert!(stripped.contains("cycle:"));
        assert!(stripped.contains("./a.tsx -> ./b.tsx -> ./a.tsx"));
    }

    #[test]
    fn test_print_success() {
        let mut output = Vec::new();
        print_success_to(12, 34, &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());

        assert!(stripped.contains("12 files"));
        assert!(stripped.contains("34 hooks"));
        assert!(stripped.contains("no re-render risks found"));
    }

    #[test]
    fn test_print_parse_warning() {
        let mut output = Vec::new();
        print_parse_warning_to(3, false, &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());
        assert!(stripped.contains("3 file(s) skipped"));

        let mut quiet = Vec::new();
        print_parse_warning_to(0, false, &mut quiet);
        assert!(quiet.is_empty());

        let mut verbose = Vec::new();
        print_parse_warning_to(3, true, &mut verbose);
        assert!(verbose.is_empty());
    }

    #[test]
    fn test_source_context_with_real_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("App.tsx");
        std::fs::write(&path, "const a = 1;\nconst b = 2;\nconst c = 3;\n").unwrap();

        let diagnostic = Diagnostic::new(
            DiagnosticCode::RenderPhaseSetState,
            Category::Critical,
            SourceLocation::new(path.to_string_lossy().to_string(), 2).with_col(7),
            "state write during render",
        );

        let mut output = Vec::new();
        report_to(&run_result(vec![diagnostic]), &mut output);
        let stripped = strip_ansi(&String::from_utf8(output).unwrap());

        assert!(stripped.contains("const b = 2;"));
        assert!(stripped.contains("^"));
    }
}
