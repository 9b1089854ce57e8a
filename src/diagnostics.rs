//! Diagnostic types for re-render analysis results.
//!
//! A [`Diagnostic`] is a single finding: one hook call site, one render-phase
//! write, or one import edge. Findings are merged into a [`RunResult`] by the
//! assembler, which also guarantees the deterministic
//! (path, line, column, code) ordering tests rely on.

use std::cmp::Ordering;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::semantics::HookKind;

// ============================================================
// Location
// ============================================================

/// Location in a source file (1-based line, optional 1-based column).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file_path: String,
    pub line: usize,
    pub col: Option<usize>,
}

impl SourceLocation {
    pub fn new(file_path: impl Into<String>, line: usize) -> Self {
        Self {
            file_path: file_path.into(),
            line,
            col: None,
        }
    }

    pub fn with_col(mut self, col: usize) -> Self {
        self.col = Some(col);
        self
    }

    /// Get column with default value (for cases where col is required).
    pub fn col_or_default(&self) -> usize {
        self.col.unwrap_or(1)
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file_path
            .cmp(&other.file_path)
            .then_with(|| self.line.cmp(&other.line))
            .then_with(|| self.col.cmp(&other.col))
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================
// Classification enums
// ============================================================

/// Diagnostic code. The `RLD-` prefixed codes map to hook-level findings,
/// the cycle codes to module-graph findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticCode {
    ImportCycle,
    CrossFileCycle,
    ContextCycle,
    FunctionCallCycle,
    RenderPhaseSetState,
    RenderPhaseDispatch,
    EffectUnconditionalWrite,
    UnstableObjectDep,
    UnstableArrayDep,
    UnstableFunctionDep,
    UnstableCallDep,
    UnstableContextValue,
    UnstableMemoProp,
    UnstableGetSnapshot,
    SelfModifyingMemo,
    EffectMissingDeps,
    EffectConditionalWrite,
    RenderPhaseRefWrite,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ImportCycle => "IMPORT-CYCLE",
            DiagnosticCode::CrossFileCycle => "CROSS-FILE-CYCLE",
            DiagnosticCode::ContextCycle => "CONTEXT-CYCLE",
            DiagnosticCode::FunctionCallCycle => "FUNCTION-CALL-CYCLE",
            DiagnosticCode::RenderPhaseSetState => "RLD-100",
            DiagnosticCode::RenderPhaseDispatch => "RLD-101",
            DiagnosticCode::EffectUnconditionalWrite => "RLD-200",
            DiagnosticCode::UnstableObjectDep => "RLD-400",
            DiagnosticCode::UnstableArrayDep => "RLD-401",
            DiagnosticCode::UnstableFunctionDep => "RLD-402",
            DiagnosticCode::UnstableCallDep => "RLD-403",
            DiagnosticCode::UnstableContextValue => "RLD-404",
            DiagnosticCode::UnstableMemoProp => "RLD-405",
            DiagnosticCode::UnstableGetSnapshot => "RLD-407",
            DiagnosticCode::SelfModifyingMemo => "RLD-420",
            DiagnosticCode::EffectMissingDeps => "RLD-500",
            DiagnosticCode::EffectConditionalWrite => "RLD-501",
            DiagnosticCode::RenderPhaseRefWrite => "RLD-600",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Performance,
    Warning,
    Critical,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Critical => write!(f, "critical"),
            Category::Warning => write!(f, "warning"),
            Category::Performance => write!(f, "performance"),
        }
    }
}

/// Severity, ordered so that `Low < Medium < High` for threshold filtering.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Confidence, ordered like [`Severity`] for threshold filtering.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Default,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::High => write!(f, "high"),
            Confidence::Medium => write!(f, "medium"),
            Confidence::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Preconditions guarantee non-termination absent runtime-only escapes.
    ConfirmedInfiniteLoop,
    /// Necessary but not sufficient preconditions; needs human review.
    PotentialIssue,
}

// ============================================================
// Diagnostic
// ============================================================

/// A single analysis finding.
///
/// Each diagnostic maps to at most one hook call site or one import edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    pub category: Category,
    pub severity: Severity,
    pub confidence: Confidence,
    pub kind: DiagnosticKind,
    pub location: SourceLocation,
    pub hook_kind: Option<HookKind>,
    /// The dependency-list entry that triggers re-execution.
    pub problematic_dependency: Option<String>,
    /// The state setter (or reducer dispatch) involved.
    pub setter_function: Option<String>,
    pub explanation: String,
    pub suggestion: Option<String>,
    /// Files participating in a cycle, first repeated last (`[A, B, A]`).
    pub cycle: Option<Vec<String>>,
    /// Rule-internal trace, populated only in debug mode.
    pub debug_record: Option<String>,
}

impl Diagnostic {
    pub fn new(
        code: DiagnosticCode,
        category: Category,
        location: SourceLocation,
        explanation: impl Into<String>,
    ) -> Self {
        let kind = match category {
            Category::Critical => DiagnosticKind::ConfirmedInfiniteLoop,
            _ => DiagnosticKind::PotentialIssue,
        };
        Self {
            code,
            category,
            severity: match category {
                Category::Critical => Severity::High,
                Category::Warning => Severity::Medium,
                Category::Performance => Severity::Low,
            },
            confidence: Confidence::High,
            kind,
            location,
            hook_kind: None,
            problematic_dependency: None,
            setter_function: None,
            explanation: explanation.into(),
            suggestion: None,
            cycle: None,
            debug_record: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_confidence(mut self, confidence: Confidence) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_kind(mut self, kind: DiagnosticKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_hook_kind(mut self, hook_kind: HookKind) -> Self {
        self.hook_kind = Some(hook_kind);
        self
    }

    pub fn with_dependency(mut self, dep: impl Into<String>) -> Self {
        self.problematic_dependency = Some(dep.into());
        self
    }

    pub fn with_setter(mut self, setter: impl Into<String>) -> Self {
        self.setter_function = Some(setter.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_cycle(mut self, cycle: Vec<String>) -> Self {
        self.cycle = Some(cycle);
        self
    }

    pub fn with_debug_record(mut self, record: Option<String>) -> Self {
        self.debug_record = record;
        self
    }

    pub fn is_cycle(&self) -> bool {
        matches!(
            self.code,
            DiagnosticCode::ImportCycle
                | DiagnosticCode::CrossFileCycle
                | DiagnosticCode::ContextCycle
                | DiagnosticCode::FunctionCallCycle
        )
    }

    /// Should this finding make the run exit nonzero?
    pub fn is_blocking(&self) -> bool {
        self.category == Category::Critical || self.kind == DiagnosticKind::ConfirmedInfiniteLoop
    }
}

impl Ord for Diagnostic {
    fn cmp(&self, other: &Self) -> Ordering {
        // (path, line, col, code): HashMap iteration and rayon completion
        // order are both nondeterministic, so every field that can differ
        // must participate.
        self.location
            .cmp(&other.location)
            .then_with(|| self.code.cmp(&other.code))
            .then_with(|| self.explanation.cmp(&other.explanation))
    }
}

impl PartialOrd for Diagnostic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ============================================================
// Run result
// ============================================================

/// Counts for the final summary line and the JSON envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub files_analyzed: usize,
    pub files_skipped: usize,
    pub hooks_analyzed: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub performance_count: usize,
}

/// The complete, deterministic result of one analysis run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunResult {
    pub import_cycles: Vec<Diagnostic>,
    pub cross_file_cycles: Vec<Diagnostic>,
    pub hook_diagnostics: Vec<Diagnostic>,
    pub summary: RunSummary,
}

impl RunResult {
    /// All diagnostics in report order: cycles first, then hook findings.
    pub fn all(&self) -> impl Iterator<Item = &Diagnostic> {
        self.import_cycles
            .iter()
            .chain(&self.cross_file_cycles)
            .chain(&self.hook_diagnostics)
    }

    pub fn is_clean(&self) -> bool {
        self.import_cycles.is_empty()
            && self.cross_file_cycles.is_empty()
            && self.hook_diagnostics.is_empty()
    }

    pub fn has_blocking(&self) -> bool {
        self.all().any(Diagnostic::is_blocking)
    }
}

// ============================================================
// Tests
// ============================================================
