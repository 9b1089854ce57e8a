//! JSX prop rules: unstable context values and memoization-breaking props.
//!
//! A context provider propagates its `value` identity to every consumer, so
//! an unstable value there is reported unconditionally. A memoized
//! component's props are compared by identity; passing a fresh object or
//! inline handler defeats the wrapper. Lowercase HTML-like elements never
//! trigger either rule.

use swc_ecma_ast::Expr;

use crate::core::oracle::NullOracle;
use crate::core::semantics::stability::{Classifier, StabilityClass};
use crate::diagnostics::{
    Category, Diagnostic, DiagnosticCode, DiagnosticKind, SourceLocation,
};

use super::{JsxTarget, JsxUsage, Rule, RuleContext};

/// Props that never participate in memo comparison.
const EXEMPT_PROPS: &[&str] = &["key", "ref", "children"];

fn classify_attr_value(
    cx: &RuleContext<'_>,
    component: Option<&str>,
    value: &Expr,
) -> StabilityClass {
    let lookup = |name: &str| cx.stability_of(component, name).cloned();
    let classifier = Classifier {
        policy: cx.policy,
        oracle: &NullOracle,
        strict_mode: false,
        file_path: &cx.parsed.path,
        lookup: &lookup,
    };
    classifier.classify(value)
}

fn describe(class: &StabilityClass) -> &'static str {
    match class {
        StabilityClass::UnstableArray => "a fresh array",
        StabilityClass::UnstableFunction => "a fresh function",
        StabilityClass::UnstableCall => "an unmemoized call result",
        _ => "a fresh object",
    }
}

// ============================================================
// RLD-404: context provider value
// ============================================================

pub struct ContextValueRule;

impl Rule for ContextValueRule {
    fn name(&self) -> &'static str {
        "unstable-context-value"
    }

    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for usage in &cx.jsx {
            let JsxTarget::ContextProvider { context } = &usage.target else {
                continue;
            };
            let Some(attr) = usage.attrs.iter().find(|a| a.name == "value") else {
                continue;
            };
            let Some(value) = attr.value else {
                continue;
            };
            let class = classify_attr_value(cx, usage.component.as_deref(), value);
            if !cx.is_unstable(&class) {
                continue;
            }
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::UnstableContextValue,
                    Category::Performance,
                    SourceLocation::new(cx.parsed.path.clone(), attr.line).with_col(attr.col),
                    format!(
                        "\"{}.Provider\" receives {} as its value; every consumer of the \
                         context re-renders each time",
                        context,
                        describe(&class)
                    ),
                )
                .with_kind(DiagnosticKind::PotentialIssue)
                .with_suggestion("Memoize the provider value with useMemo"),
            );
        }
        diagnostics
    }
}

// ============================================================
// RLD-405: memoization-breaking prop
// ============================================================

pub struct MemoPropRule;

impl Rule for MemoPropRule {
    fn name(&self) -> &'static str {
        "memo-breaking-prop"
    }

    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for usage in &cx.jsx {
            let JsxTarget::Component { name } = &usage.target else {
                continue;
            };
            // Namespace members (`Nav.Item`) cannot be resolved to a wrapper.
            if name.contains('.') {
                continue;
            }
            if !cx.project.is_memoized_component(
                &cx.parsed.path,
                name,
                cx.config.max_import_hops,
            ) {
                continue;
            }
            if let Some(diagnostic) = first_unstable_prop(cx, usage, name) {
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }
}

fn first_unstable_prop(
    cx: &RuleContext<'_>,
    usage: &JsxUsage<'_>,
    component_name: &str,
) -> Option<Diagnostic> {
    for attr in &usage.attrs {
        if EXEMPT_PROPS.contains(&attr.name.as_str()) {
            continue;
        }
        let Some(value) = attr.value else {
            continue;
        };
        let class = classify_attr_value(cx, usage.component.as_deref(), value);
        if !cx.is_unstable(&class) {
            continue;
        }
        return Some(
            Diagnostic::new(
                DiagnosticCode::UnstableMemoProp,
                Category::Performance,
                SourceLocation::new(cx.parsed.path.clone(), attr.line).with_col(attr.col),
                format!(
                    "\"{}\" is memoized, but its \"{}\" prop is {} on every render, \
                     so the memo comparison never passes",
                    component_name,
                    attr.name,
                    describe(&class)
                ),
            )
            .with_kind(DiagnosticKind::PotentialIssue)
            .with_dependency(attr.name.clone())
            .with_suggestion("Wrap the value in useCallback/useMemo before passing it down"),
        );
    }
    None
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::testutil::{check_source, codes};
    use crate::diagnostics::{Category, DiagnosticCode};

    #[test]
    fn test_provider_with_inline_object_value() {
        let diagnostics = check_source(
            "const ThemeContext = createContext(null);\n\
             function App() {\n\
               return (\n\
                 <ThemeContext.Provider value={{ dark: true }}>\n\
                   <div />\n\
                 </ThemeContext.Provider>\n\
               );\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::UnstableContextValue]);
        assert_eq!(diagnostics[0].category, Category::Performance);
    }

    #[test]
    fn test_provider_with_unstable_binding() {
        let diagnostics = check_source(
            "const ThemeContext = createContext(null);\n\
             function App() {\n\
               const theme = { dark: true };\n\
               return <ThemeContext.Provider value={theme} />;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::UnstableContextValue]);
    }

    #[test]
    fn test_provider_with_memoized_value_is_fine() {
        let diagnostics = check_source(
            "const ThemeContext = createContext(null);\n\
             function App() {\n\
               const theme = useMemo(() => ({ dark: true }), []);\n\
               return <ThemeContext.Provider value={theme} />;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_memoized_child_with_inline_handler() {
        let diagnostics = check_source(
            "import { memo } from \"react\";\n\
             const Button = memo(() => <button />);\n\
             function App() {\n\
               return <Button onClick={() => {}} />;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::UnstableMemoProp]);
        assert_eq!(diagnostics[0].problematic_dependency.as_deref(), Some("onClick"));
    }

    #[test]
    fn test_lowercase_element_never_triggers() {
        let diagnostics = check_source(
            "function App() {\n\
               return <button onClick={() => {}} />;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unmemoized_component_does_not_trigger() {
        let diagnostics = check_source(
            "function Button() { return <button />; }\n\
             function App() {\n\
               return <Button onClick={() => {}} />;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_memoized_child_with_stable_props_is_fine() {
        let diagnostics = check_source(
            "import { memo } from \"react\";\n\
             const Button = memo(() => <button />);\n\
             function App() {\n\
               const onClick = useCallback(() => {}, []);\n\
               return <Button onClick={onClick} label=\"hi\" />;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_memo_prop_reports_one_finding_per_element() {
        let diagnostics = check_source(
            "import { memo } from \"react\";\n\
             const Button = memo(() => <button />);\n\
             function App() {\n\
               return <Button onClick={() => {}} style={{ color: \"red\" }} />;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::UnstableMemoProp]);
    }
}
