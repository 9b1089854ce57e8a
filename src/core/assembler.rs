//! Diagnostic assembly: merge, de-duplicate, filter, order.
//!
//! Rule outputs from all files meet here. De-duplication is by
//! (file, line, code) with the first survivor winning, which is
//! deterministic because the input is sorted first and rules run in a fixed
//! order within a file. Policy filters and in-source suppression markers
//! are applied before the final (path, line, column, code) ordering.

use std::collections::{HashMap, HashSet};

use crate::config::Config;
use crate::core::suppressions::SuppressionTable;
use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// Apply merge policy to raw rule output.
pub fn assemble(
    mut diagnostics: Vec<Diagnostic>,
    suppressions: &HashMap<String, &SuppressionTable>,
    config: &Config,
) -> Vec<Diagnostic> {
    diagnostics.sort();

    let mut seen: HashSet<(String, usize, &'static str)> = HashSet::new();
    let mut kept = Vec::with_capacity(diagnostics.len());

    for diagnostic in diagnostics {
        if diagnostic.severity < config.min_severity {
            continue;
        }
        if diagnostic.confidence < config.min_confidence {
            continue;
        }
        if !config.include_potential_issues && diagnostic.kind == DiagnosticKind::PotentialIssue {
            continue;
        }
        if let Some(table) = suppressions.get(&diagnostic.location.file_path)
            && table.is_suppressed(diagnostic.location.line, diagnostic.code.as_str())
        {
            continue;
        }
        let key = (
            diagnostic.location.file_path.clone(),
            diagnostic.location.line,
            diagnostic.code.as_str(),
        );
        if !seen.insert(key) {
            continue;
        }
        kept.push(diagnostic);
    }

    kept
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::HookPolicy;
    use crate::core::oracle::NullOracle;
    use crate::core::parser::parse_source;
    use crate::diagnostics::{Category, Confidence, DiagnosticCode, Severity, SourceLocation};

    fn diag(path: &str, line: usize, col: usize, code: DiagnosticCode) -> Diagnostic {
        Diagnostic::new(
            code,
            Category::Warning,
            SourceLocation::new(path, line).with_col(col),
            "finding",
        )
    }

    #[test]
    fn test_dedupe_by_file_line_code() {
        let diagnostics = vec![
            diag("./a.tsx", 3, 1, DiagnosticCode::EffectConditionalWrite),
            diag("./a.tsx", 3, 9, DiagnosticCode::EffectConditionalWrite),
            diag("./a.tsx", 3, 1, DiagnosticCode::UnstableObjectDep),
        ];
        let kept = assemble(diagnostics, &HashMap::new(), &Config::default());
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_sorted_output() {
        let diagnostics = vec![
            diag("./b.tsx", 1, 1, DiagnosticCode::EffectConditionalWrite),
            diag("./a.tsx", 9, 1, DiagnosticCode::EffectConditionalWrite),
            diag("./a.tsx", 2, 1, DiagnosticCode::EffectConditionalWrite),
        ];
        let kept = assemble(diagnostics, &HashMap::new(), &Config::default());
        let order: Vec<(&str, usize)> = kept
            .iter()
            .map(|d| (d.location.file_path.as_str(), d.location.line))
            .collect();
        assert_eq!(order, vec![("./a.tsx", 2), ("./a.tsx", 9), ("./b.tsx", 1)]);
    }

    #[test]
    fn test_min_severity_filter() {
        let config = Config {
            min_severity: Severity::High,
            ..Default::default()
        };
        let low = diag("./a.tsx", 1, 1, DiagnosticCode::UnstableObjectDep)
            .with_severity(Severity::Low);
        let high = diag("./a.tsx", 2, 1, DiagnosticCode::EffectUnconditionalWrite)
            .with_severity(Severity::High);
        let kept = assemble(vec![low, high], &HashMap::new(), &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].severity, Severity::High);
    }

    #[test]
    fn test_min_confidence_filter() {
        let config = Config {
            min_confidence: Confidence::High,
            ..Default::default()
        };
        let medium = diag("./a.tsx", 1, 1, DiagnosticCode::EffectConditionalWrite)
            .with_confidence(Confidence::Medium);
        let kept = assemble(vec![medium], &HashMap::new(), &config);
        assert!(kept.is_empty());
    }

    #[test]
    fn test_confirmed_only_drops_potential() {
        let config = Config {
            include_potential_issues: false,
            ..Default::default()
        };
        let potential = diag("./a.tsx", 1, 1, DiagnosticCode::EffectConditionalWrite)
            .with_kind(DiagnosticKind::PotentialIssue);
        let confirmed = diag("./a.tsx", 2, 1, DiagnosticCode::EffectUnconditionalWrite)
            .with_kind(DiagnosticKind::ConfirmedInfiniteLoop);
        let kept = assemble(vec![potential, confirmed], &HashMap::new(), &config);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, DiagnosticKind::ConfirmedInfiniteLoop);
    }

    #[test]
    fn test_suppression_markers_apply() {
        let policy = HookPolicy::default();
        let parsed = parse_source(
            "./a.tsx",
            "// rld-disable-next-line\nconst x = 1;\nconst y = 2;\n".to_string(),
            &policy,
            &NullOracle,
            false,
        )
        .unwrap();

        let mut suppressions: HashMap<String, &SuppressionTable> = HashMap::new();
        suppressions.insert("./a.tsx".to_string(), &parsed.suppressions);

        let on_suppressed_line = diag("./a.tsx", 2, 1, DiagnosticCode::EffectConditionalWrite);
        let elsewhere = diag("./a.tsx", 3, 1, DiagnosticCode::EffectConditionalWrite);
        let kept = assemble(
            vec![on_suppressed_line, elsewhere],
            &suppressions,
            &Config::default(),
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].location.line, 3);
    }
}
