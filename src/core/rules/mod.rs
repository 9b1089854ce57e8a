//! Hook analyzer rule engine.
//!
//! Rules run per file, in a fixed order so inter-rule de-duplication stays
//! deterministic. Each rule receives a [`RuleContext`] holding the parsed
//! file, its summary, the collected hook occurrences and JSX usages (with
//! live AST references), and the cross-file [`ProjectIndex`]. A rule emits
//! at most one diagnostic per hook call site; no rule may abort the run.

use swc_common::Span;

use crate::config::{Config, HookPolicy};
use crate::core::parser::ParsedFile;
use crate::core::propagate::ProjectIndex;
use crate::core::semantics::{FileSummary, StabilityClass};
use crate::diagnostics::Diagnostic;

pub mod collect;
pub mod effect_deps;
pub mod jsx_props;
pub mod render_phase;
pub mod unstable_deps;

pub use collect::{Body, ComponentBody, Dep, HookOccurrence, JsxTarget, JsxUsage};

/// Everything a rule may look at for one file.
pub struct RuleContext<'a> {
    pub parsed: &'a ParsedFile,
    pub summary: &'a FileSummary,
    pub project: &'a ProjectIndex,
    pub config: &'a Config,
    pub policy: &'a HookPolicy,
    pub hooks: Vec<HookOccurrence<'a>>,
    pub jsx: Vec<JsxUsage<'a>>,
    pub components: Vec<ComponentBody<'a>>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        parsed: &'a ParsedFile,
        project: &'a ProjectIndex,
        config: &'a Config,
        policy: &'a HookPolicy,
    ) -> Self {
        let collected = collect::collect(parsed);
        RuleContext {
            parsed,
            summary: parsed.summary.as_ref(),
            project,
            config,
            policy,
            hooks: collected.hooks,
            jsx: collected.jsx,
            components: collected.components,
        }
    }

    pub fn line_col(&self, span: Span) -> (usize, usize) {
        let loc = self.parsed.source_map.lookup_char_pos(span.lo);
        (loc.line, loc.col_display + 1)
    }

    /// Stability of a name as seen from `component`, with module fallback.
    pub fn stability_of(&self, component: Option<&str>, name: &str) -> Option<&StabilityClass> {
        self.summary.stability.lookup(component, name)
    }

    pub fn is_unstable(&self, class: &StabilityClass) -> bool {
        class.is_unstable(self.policy.unknown_hooks_are_unstable())
    }

    /// Attach a rule trace when debug mode is on.
    pub fn debug_record(&self, record: impl FnOnce() -> String) -> Option<String> {
        self.config.debug.then(record)
    }
}

pub trait Rule: Send + Sync {
    fn name(&self) -> &'static str;
    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic>;
}

/// The fixed rule order. De-duplication and report ordering depend on it.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(render_phase::RenderPhaseWriteRule),
        Box::new(render_phase::RenderPhaseRefWriteRule),
        Box::new(effect_deps::EffectDependencyRule),
        Box::new(unstable_deps::UnstableDependencyRule),
        Box::new(unstable_deps::SelfModifyingMemoRule),
        Box::new(unstable_deps::GetSnapshotRule),
        Box::new(jsx_props::ContextValueRule),
        Box::new(jsx_props::MemoPropRule),
    ]
}

/// Run every rule over one file.
pub fn analyze_file(
    parsed: &ParsedFile,
    project: &ProjectIndex,
    config: &Config,
    policy: &HookPolicy,
    verbose: bool,
) -> Vec<Diagnostic> {
    let context = RuleContext::new(parsed, project, config, policy);
    let mut diagnostics = Vec::new();
    for rule in default_rules() {
        if verbose {
            eprintln!("Running rule {} on {}", rule.name(), parsed.path);
        }
        diagnostics.extend(rule.check(&context));
    }
    diagnostics
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use crate::core::oracle::NullOracle;
    use crate::core::parser::parse_source;
    use crate::diagnostics::DiagnosticCode;

    /// Analyze a single in-memory source file with the default config.
    pub fn check_source(code: &str) -> Vec<Diagnostic> {
        check_source_with(Config::default(), code)
    }

    pub fn check_source_with(config: Config, code: &str) -> Vec<Diagnostic> {
        let policy = config.compile().unwrap();
        let parsed = parse_source("./test.tsx", code.to_string(), &policy, &NullOracle, false)
            .expect("test source parses");
        let project = ProjectIndex {
            summaries: {
                let mut map = BTreeMap::new();
                map.insert("./test.tsx".to_string(), parsed.summary.clone());
                map
            },
            resolved_imports: HashMap::new(),
        };
        let mut diagnostics = analyze_file(&parsed, &project, &config, &policy, false);
        diagnostics.sort();
        diagnostics
    }

    pub fn codes(diagnostics: &[Diagnostic]) -> Vec<DiagnosticCode> {
        diagnostics.iter().map(|d| d.code).collect()
    }
}
