//! Unstable-reference rules.
//!
//! A dependency entry that gets a fresh identity every render defeats the
//! hook's memoization: the comparison fails each time and the hook re-runs.
//! Each dependency element is classified through the enclosing component's
//! stability table (module scope as fallback); member expressions are
//! judged by their root identifier.

use swc_ecma_ast::{AssignTarget, BlockStmtOrExpr, Expr, SimpleAssignTarget, Stmt};

use crate::core::oracle::NullOracle;
use crate::core::semantics::stability::{Classifier, StabilityClass, callee_parts, unwrap_expr};
use crate::core::semantics::HookKind;
use crate::diagnostics::{
    Category, Confidence, Diagnostic, DiagnosticCode, DiagnosticKind, Severity, SourceLocation,
};

use super::{Dep, HookOccurrence, Rule, RuleContext};

/// RLD-400..403: unstable reference in a dependency list.
pub struct UnstableDependencyRule;

impl Rule for UnstableDependencyRule {
    fn name(&self) -> &'static str {
        "unstable-dependency"
    }

    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for hook in &cx.hooks {
            if hook.kind.dep_arg_index().is_none() {
                continue;
            }
            let Some(deps) = &hook.deps else {
                continue;
            };
            if let Some(diagnostic) = check_deps(cx, hook, deps) {
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }
}

fn check_deps(
    cx: &RuleContext<'_>,
    hook: &HookOccurrence<'_>,
    deps: &[Dep<'_>],
) -> Option<Diagnostic> {
    let component = hook.component.as_deref();

    for dep in deps {
        let Some(class) = classify_dep(cx, component, dep) else {
            continue;
        };

        if let Some(code) = unstable_code(cx, &class) {
            return Some(unstable_dep_diagnostic(cx, hook, dep, code, None));
        }

        // A memoized intermediate driven by an unstable root: the chain
        // still re-runs, so the consuming hook is flagged alongside the
        // hook that owns the root.
        if matches!(class, StabilityClass::MemoizedByWrapper(_))
            && let Some(root) = dep.root.as_deref()
            && let Some(chain_roots) = cx.summary.memo_dep_roots.get(root)
        {
            for chain_root in chain_roots {
                let Some(chain_class) = cx.stability_of(component, chain_root) else {
                    continue;
                };
                if let Some(code) = unstable_code(cx, chain_class) {
                    return Some(unstable_dep_diagnostic(
                        cx,
                        hook,
                        dep,
                        code,
                        Some(chain_root.as_str()),
                    ));
                }
            }
        }
    }
    None
}

fn classify_dep(
    cx: &RuleContext<'_>,
    component: Option<&str>,
    dep: &Dep<'_>,
) -> Option<StabilityClass> {
    use crate::core::semantics::DepForm;
    match dep.form {
        DepForm::Literal => None,
        DepForm::Call => {
            let lookup = |name: &str| cx.stability_of(component, name).cloned();
            let classifier = Classifier {
                policy: cx.policy,
                oracle: &NullOracle,
                strict_mode: false,
                file_path: &cx.parsed.path,
                lookup: &lookup,
            };
            Some(classifier.classify(dep.expr))
        }
        _ => {
            let root = dep.root.as_deref()?;
            cx.stability_of(component, root).cloned()
        }
    }
}

fn unstable_code(cx: &RuleContext<'_>, class: &StabilityClass) -> Option<DiagnosticCode> {
    match class {
        StabilityClass::UnstableObject => Some(DiagnosticCode::UnstableObjectDep),
        StabilityClass::UnstableArray => Some(DiagnosticCode::UnstableArrayDep),
        StabilityClass::UnstableFunction => Some(DiagnosticCode::UnstableFunctionDep),
        StabilityClass::UnstableCall => Some(DiagnosticCode::UnstableCallDep),
        StabilityClass::UnknownHookReturn if cx.policy.unknown_hooks_are_unstable() => {
            Some(DiagnosticCode::UnstableCallDep)
        }
        _ => None,
    }
}

fn unstable_dep_diagnostic(
    cx: &RuleContext<'_>,
    hook: &HookOccurrence<'_>,
    dep: &Dep<'_>,
    code: DiagnosticCode,
    chain_root: Option<&str>,
) -> Diagnostic {
    let what = match code {
        DiagnosticCode::UnstableObjectDep => "a fresh object",
        DiagnosticCode::UnstableArrayDep => "a fresh array",
        DiagnosticCode::UnstableFunctionDep => "a fresh function",
        _ => "an unmemoized call result",
    };
    let explanation = match chain_root {
        Some(root) => format!(
            "\"{}\" depends on \"{}\", which is memoized over the unstable \"{}\"; \
             the chain re-computes every render",
            hook.callee, dep.text, root
        ),
        None => format!(
            "\"{}\" lists \"{}\" as a dependency, but it is {} on every render",
            hook.callee, dep.text, what
        ),
    };
    let debug_record = cx.debug_record(|| {
        format!("dep {:?} classified {:?}, chain root {:?}", dep.text, code, chain_root)
    });
    Diagnostic::new(
        code,
        Category::Performance,
        SourceLocation::new(cx.parsed.path.clone(), hook.line).with_col(hook.col),
        explanation,
    )
    .with_kind(DiagnosticKind::PotentialIssue)
    .with_hook_kind(hook.kind)
    .with_dependency(dep.text.clone())
    .with_suggestion("Memoize the value with useMemo/useCallback or move it out of the component")
    .with_debug_record(debug_record)
}

// ============================================================
// RLD-420: self-modifying memoization hook
// ============================================================

pub struct SelfModifyingMemoRule;

impl Rule for SelfModifyingMemoRule {
    fn name(&self) -> &'static str {
        "self-modifying-memo"
    }

    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for hook in &cx.hooks {
            if !matches!(hook.kind, HookKind::Memo | HookKind::Callback) {
                continue;
            }
            let (Some(deps), Some(callback)) = (&hook.deps, hook.callback) else {
                continue;
            };

            let mut modified = Vec::new();
            collect_modified_names(cx, hook.component.as_deref(), callback, &mut modified);

            let hit = deps.iter().find_map(|dep| {
                let root = dep.root.as_deref()?;
                modified.contains(&root.to_string()).then(|| dep.text.clone())
            });
            if let Some(dep_text) = hit {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::SelfModifyingMemo,
                        Category::Warning,
                        SourceLocation::new(cx.parsed.path.clone(), hook.line).with_col(hook.col),
                        format!(
                            "\"{}\" depends on \"{}\" and also modifies it, so each use \
                             invalidates the memoized value",
                            hook.callee, dep_text
                        ),
                    )
                    .with_severity(Severity::Medium)
                    .with_confidence(Confidence::Medium)
                    .with_kind(DiagnosticKind::PotentialIssue)
                    .with_hook_kind(hook.kind)
                    .with_dependency(dep_text),
                );
            }
        }
        diagnostics
    }
}

/// Names the callback writes: setter targets and direct assignments. The
/// scan descends into nested functions because a `useCallback` result runs
/// its body later.
fn collect_modified_names(
    cx: &RuleContext<'_>,
    component: Option<&str>,
    expr: &Expr,
    out: &mut Vec<String>,
) {
    match unwrap_expr(expr) {
        Expr::Arrow(arrow) => match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => {
                for stmt in &block.stmts {
                    collect_modified_in_stmt(cx, component, stmt, out);
                }
            }
            BlockStmtOrExpr::Expr(inner) => collect_modified_names(cx, component, inner, out),
        },
        Expr::Fn(fn_expr) => {
            if let Some(block) = &fn_expr.function.body {
                for stmt in &block.stmts {
                    collect_modified_in_stmt(cx, component, stmt, out);
                }
            }
        }
        Expr::Call(call) => {
            if let Some((None, name)) = callee_parts(&call.callee)
                && let Some(binding) = cx.summary.binding_for_setter(component, &name)
            {
                out.push(binding.name.clone());
            }
            for arg in &call.args {
                collect_modified_names(cx, component, &arg.expr, out);
            }
        }
        Expr::Assign(assign) => {
            if let AssignTarget::Simple(SimpleAssignTarget::Ident(ident)) = &assign.left {
                out.push(ident.id.sym.to_string());
            }
            collect_modified_names(cx, component, &assign.right, out);
        }
        Expr::Bin(bin) => {
            collect_modified_names(cx, component, &bin.left, out);
            collect_modified_names(cx, component, &bin.right, out);
        }
        Expr::Cond(cond) => {
            collect_modified_names(cx, component, &cond.test, out);
            collect_modified_names(cx, component, &cond.cons, out);
            collect_modified_names(cx, component, &cond.alt, out);
        }
        Expr::Paren(paren) => collect_modified_names(cx, component, &paren.expr, out),
        Expr::Seq(seq) => {
            for inner in &seq.exprs {
                collect_modified_names(cx, component, inner, out);
            }
        }
        Expr::Await(await_expr) => collect_modified_names(cx, component, &await_expr.arg, out),
        _ => {}
    }
}

fn collect_modified_in_stmt(
    cx: &RuleContext<'_>,
    component: Option<&str>,
    stmt: &Stmt,
    out: &mut Vec<String>,
) {
    match stmt {
        Stmt::Block(block) => {
            for inner in &block.stmts {
                collect_modified_in_stmt(cx, component, inner, out);
            }
        }
        Stmt::Expr(expr_stmt) => collect_modified_names(cx, component, &expr_stmt.expr, out),
        Stmt::If(if_stmt) => {
            collect_modified_in_stmt(cx, component, &if_stmt.cons, out);
            if let Some(alt) = &if_stmt.alt {
                collect_modified_in_stmt(cx, component, alt, out);
            }
        }
        Stmt::Return(ret) => {
            if let Some(arg) = &ret.arg {
                collect_modified_names(cx, component, arg, out);
            }
        }
        Stmt::While(while_stmt) => collect_modified_in_stmt(cx, component, &while_stmt.body, out),
        Stmt::For(for_stmt) => collect_modified_in_stmt(cx, component, &for_stmt.body, out),
        Stmt::Labeled(labeled) => collect_modified_in_stmt(cx, component, &labeled.body, out),
        _ => {}
    }
}

// ============================================================
// RLD-407: unstable getSnapshot
// ============================================================

pub struct GetSnapshotRule;

impl Rule for GetSnapshotRule {
    fn name(&self) -> &'static str {
        "unstable-get-snapshot"
    }

    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for hook in &cx.hooks {
            if hook.kind != HookKind::SyncExternalStore {
                continue;
            }
            let Some(get_snapshot) = hook.callback else {
                continue;
            };

            let location =
                SourceLocation::new(cx.parsed.path.clone(), hook.line).with_col(hook.col);

            if inline_returns_fresh_value(get_snapshot) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::UnstableGetSnapshot,
                        Category::Critical,
                        location,
                        format!(
                            "the snapshot function passed to \"{}\" builds a new value on \
                             every call, so the store never looks settled",
                            hook.callee
                        ),
                    )
                    .with_confidence(Confidence::High)
                    .with_kind(DiagnosticKind::ConfirmedInfiniteLoop)
                    .with_hook_kind(hook.kind)
                    .with_suggestion("Cache the snapshot and return the same reference until the store changes"),
                );
                continue;
            }

            if let Expr::Ident(ident) = unwrap_expr(get_snapshot)
                && let Some(class) =
                    cx.stability_of(hook.component.as_deref(), ident.sym.as_str())
                && *class == StabilityClass::UnstableFunction
            {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::UnstableGetSnapshot,
                        Category::Warning,
                        location,
                        format!(
                            "\"{}\" receives the unmemoized snapshot function \"{}\"",
                            hook.callee, ident.sym
                        ),
                    )
                    .with_severity(Severity::Medium)
                    .with_confidence(Confidence::Medium)
                    .with_kind(DiagnosticKind::PotentialIssue)
                    .with_hook_kind(hook.kind)
                    .with_dependency(ident.sym.to_string()),
                );
            }
        }
        diagnostics
    }
}

/// Inline function whose return value is an object or array literal.
fn inline_returns_fresh_value(expr: &Expr) -> bool {
    fn is_fresh(expr: &Expr) -> bool {
        matches!(unwrap_expr(expr), Expr::Object(_) | Expr::Array(_))
    }
    fn block_returns_fresh(stmts: &[Stmt]) -> bool {
        stmts.iter().any(|stmt| match stmt {
            Stmt::Return(ret) => ret.arg.as_deref().is_some_and(is_fresh),
            Stmt::If(if_stmt) => {
                block_returns_fresh(std::slice::from_ref(&if_stmt.cons))
                    || if_stmt
                        .alt
                        .as_deref()
                        .is_some_and(|alt| block_returns_fresh(std::slice::from_ref(alt)))
            }
            Stmt::Block(block) => block_returns_fresh(&block.stmts),
            _ => false,
        })
    }

    match unwrap_expr(expr) {
        Expr::Arrow(arrow) => match &*arrow.body {
            BlockStmtOrExpr::Expr(body) => is_fresh(body),
            BlockStmtOrExpr::BlockStmt(block) => block_returns_fresh(&block.stmts),
        },
        Expr::Fn(fn_expr) => fn_expr
            .function
            .body
            .as_ref()
            .is_some_and(|block| block_returns_fresh(&block.stmts)),
        _ => false,
    }
}
