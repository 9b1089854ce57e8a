//! Effect dependency rules: the self-triggering effect family.
//!
//! An effect that writes a state variable it also depends on re-runs after
//! every commit. Whether that is a confirmed loop depends on flow facts:
//! the write must be guaranteed to execute (it dominates the callback's
//! exit), and no recognized guard may stand between entry and the write.
//! Setter calls are followed through locally-defined helpers and through
//! imported functions that invoke a setter passed as a parameter; promise
//! continuations count as unconditional, timer-style callbacks as
//! conditional.

use swc_common::Span;
use swc_ecma_ast::{BlockStmtOrExpr, Expr, Prop, PropOrSpread};

use crate::core::cfg::flow::{dominators, enumerate_paths, reachable};
use crate::core::cfg::guards::{GuardStrength, evaluate_paths};
use crate::core::cfg::{Cfg, build_callback_cfg};
use crate::core::semantics::stability::{callee_parts, unwrap_expr};
use crate::core::semantics::{StateBinding, is_hook_name};
use crate::diagnostics::{
    Category, Confidence, Diagnostic, DiagnosticCode, DiagnosticKind, Severity, SourceLocation,
};

use super::{Dep, HookOccurrence, Rule, RuleContext};

/// Functions whose callbacks run on a deferred schedule and may never fire.
const DEFERRED_FUNCTIONS: &[&str] = &[
    "setTimeout",
    "setInterval",
    "requestAnimationFrame",
    "requestIdleCallback",
];

/// Array methods that invoke their callback synchronously.
const SYNC_ITERATION_METHODS: &[&str] = &[
    "map", "forEach", "filter", "find", "some", "every", "flatMap", "reduce",
];

/// When a setter call executes relative to the effect body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Runs while the callback runs.
    Sync,
    /// Promise continuation: will eventually execute.
    Promise,
    /// Timer or frame callback: may never execute.
    Deferred,
}

/// One discovered state write inside an effect callback.
#[derive(Debug)]
struct SetterUse {
    binding: StateBinding,
    /// Span of the call that anchors the write in the callback's CFG (the
    /// setter call itself, or the call into the helper that performs it).
    span: Span,
    context: ExecutionContext,
    /// Helper function the write goes through, if any.
    via: Option<String>,
}

pub struct EffectDependencyRule;

impl Rule for EffectDependencyRule {
    fn name(&self) -> &'static str {
        "effect-dependency"
    }

    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for hook in cx.hooks.iter().filter(|h| h.kind.is_effect()) {
            if let Some(diagnostic) = check_effect(cx, hook) {
                diagnostics.push(diagnostic);
            }
        }
        diagnostics
    }
}

fn check_effect(cx: &RuleContext<'_>, hook: &HookOccurrence<'_>) -> Option<Diagnostic> {
    let callback = hook.callback?;
    let component = hook.component.as_deref();

    let mut scan = SetterScan {
        cx,
        component,
        uses: Vec::new(),
    };
    scan.scan_callback(callback);
    let uses = scan.uses;
    if uses.is_empty() {
        return None;
    }

    let cfg = build_callback_cfg(callback);

    match &hook.deps {
        // Missing dependency array: the effect re-runs after every render,
        // and it writes state.
        None => missing_deps_diagnostic(cx, hook, &uses, cfg.as_ref()),
        Some(deps) => tracked_write_diagnostic(cx, hook, deps, &uses, cfg.as_ref()),
    }
}

fn missing_deps_diagnostic(
    cx: &RuleContext<'_>,
    hook: &HookOccurrence<'_>,
    uses: &[SetterUse],
    cfg: Option<&Cfg<'_>>,
) -> Option<Diagnostic> {
    let use_ = uses.iter().find(|u| match (u.context, cfg) {
        (ExecutionContext::Sync, Some(cfg)) => {
            let reach = reachable(cfg);
            cfg.node_containing(u.span).is_none_or(|node| reach[node])
        }
        _ => true,
    })?;

    let location =
        SourceLocation::new(cx.parsed.path.clone(), hook.line).with_col(hook.col);
    let confidence = match use_.context {
        ExecutionContext::Deferred => Confidence::Medium,
        _ => Confidence::High,
    };
    let debug_record = cx.debug_record(|| {
        format!(
            "no dependency array; first write: {} ({:?})",
            use_.binding.setter_name, use_.context
        )
    });
    Some(
        Diagnostic::new(
            DiagnosticCode::EffectMissingDeps,
            Category::Critical,
            location,
            format!(
                "\"{}\" has no dependency array and calls \"{}\", so it re-runs \
                 after the state update it causes",
                hook.callee, use_.binding.setter_name
            ),
        )
        .with_confidence(confidence)
        .with_kind(DiagnosticKind::ConfirmedInfiniteLoop)
        .with_hook_kind(hook.kind)
        .with_setter(use_.binding.setter_name.clone())
        .with_suggestion("Add a dependency array that does not change on every render")
        .with_debug_record(debug_record),
    )
}

fn tracked_write_diagnostic(
    cx: &RuleContext<'_>,
    hook: &HookOccurrence<'_>,
    deps: &[Dep<'_>],
    uses: &[SetterUse],
    cfg: Option<&Cfg<'_>>,
) -> Option<Diagnostic> {
    let doms = cfg.map(dominators);
    let mut conditional: Option<(&SetterUse, GuardStrength)> = None;

    for use_ in uses {
        // Does the dependency list track the state this setter writes?
        // A reducer dispatch counts as a write to the whole state root, and
        // member dependencies are matched by their root identifier.
        let tracked = deps
            .iter()
            .any(|dep| dep.root.as_deref() == Some(use_.binding.name.as_str()));
        if !tracked {
            continue;
        }

        let node = cfg.as_ref().and_then(|cfg| cfg.node_containing(use_.span));
        let guaranteed = match use_.context {
            ExecutionContext::Deferred => false,
            ExecutionContext::Promise => match (&doms, node) {
                (Some(doms), Some(node)) => doms.is_guaranteed(node),
                // No graph to consult: a continuation will eventually run.
                _ => true,
            },
            ExecutionContext::Sync => match (&doms, node) {
                (Some(doms), Some(node)) => doms.is_guaranteed(node),
                // CFG-build failure: reachable but not guaranteed.
                _ => false,
            },
        };

        if guaranteed {
            return Some(confirmed_write(cx, hook, use_));
        }

        let strength = match (cfg, node) {
            (Some(cfg), Some(node)) => {
                let enumeration = enumerate_paths(
                    cfg,
                    node,
                    cx.config.max_enumerated_paths,
                    cx.config.max_path_length,
                );
                if enumeration.overflowed {
                    // Bounded-enumeration overflow: treat as unguarded.
                    GuardStrength::Unguarded
                } else {
                    evaluate_paths(cfg, &enumeration, node, &use_.binding.name)
                }
            }
            _ => GuardStrength::Unguarded,
        };

        match strength {
            GuardStrength::Effective => {}
            weaker => {
                if conditional.is_none() {
                    conditional = Some((use_, weaker));
                }
            }
        }
    }

    let (use_, strength) = conditional?;
    Some(conditional_write(cx, hook, use_, strength))
}

fn confirmed_write(
    cx: &RuleContext<'_>,
    hook: &HookOccurrence<'_>,
    use_: &SetterUse,
) -> Diagnostic {
    let location = SourceLocation::new(cx.parsed.path.clone(), hook.line).with_col(hook.col);
    let via = use_
        .via
        .as_ref()
        .map(|f| format!(" (through \"{}\")", f))
        .unwrap_or_default();
    let debug_record = cx.debug_record(|| {
        format!(
            "write to {} via {:?} dominates callback exit ({:?})",
            use_.binding.name, use_.via, use_.context
        )
    });
    Diagnostic::new(
        DiagnosticCode::EffectUnconditionalWrite,
        Category::Critical,
        location,
        format!(
            "\"{}\" always calls \"{}\"{} while depending on \"{}\", so every run \
             schedules the next one",
            hook.callee, use_.binding.setter_name, via, use_.binding.name
        ),
    )
    .with_confidence(Confidence::High)
    .with_kind(DiagnosticKind::ConfirmedInfiniteLoop)
    .with_hook_kind(hook.kind)
    .with_dependency(use_.binding.name.clone())
    .with_setter(use_.binding.setter_name.clone())
    .with_suggestion("Guard the write on a changed value, or drop the state from the dependency list")
    .with_debug_record(debug_record)
}

fn conditional_write(
    cx: &RuleContext<'_>,
    hook: &HookOccurrence<'_>,
    use_: &SetterUse,
    strength: GuardStrength,
) -> Diagnostic {
    let location = SourceLocation::new(cx.parsed.path.clone(), hook.line).with_col(hook.col);
    let risky = strength == GuardStrength::Risky;
    let explanation = if risky {
        format!(
            "\"{}\" writes \"{}\" behind a property comparison; the guard works only \
             while the compared object keeps its identity",
            hook.callee, use_.binding.name
        )
    } else {
        format!(
            "\"{}\" may call \"{}\" while depending on \"{}\"; if the condition stays \
             truthy across renders this loops",
            hook.callee, use_.binding.setter_name, use_.binding.name
        )
    };
    let debug_record = cx.debug_record(|| {
        format!(
            "conditional write to {} ({:?}); guard strength {:?}",
            use_.binding.name, use_.context, strength
        )
    });
    Diagnostic::new(DiagnosticCode::EffectConditionalWrite, Category::Warning, location, explanation)
        .with_severity(Severity::Medium)
        .with_confidence(Confidence::Medium)
        .with_kind(DiagnosticKind::PotentialIssue)
        .with_hook_kind(hook.kind)
        .with_dependency(use_.binding.name.clone())
        .with_setter(use_.binding.setter_name.clone())
        .with_suggestion("Compare against the incoming value with an equality or toggle guard")
        .with_debug_record(debug_record)
}

// ============================================================
// Setter discovery
// ============================================================

struct SetterScan<'a, 'b> {
    cx: &'b RuleContext<'a>,
    component: Option<&'b str>,
    uses: Vec<SetterUse>,
}

impl<'a, 'b> SetterScan<'a, 'b> {
    fn scan_callback(&mut self, callback: &'a Expr) {
        match unwrap_expr(callback) {
            Expr::Arrow(arrow) => match &*arrow.body {
                BlockStmtOrExpr::BlockStmt(block) => {
                    for stmt in &block.stmts {
                        self.scan_stmt(stmt, ExecutionContext::Sync);
                    }
                }
                BlockStmtOrExpr::Expr(expr) => self.scan_expr(expr, ExecutionContext::Sync),
            },
            Expr::Fn(fn_expr) => {
                if let Some(block) = &fn_expr.function.body {
                    for stmt in &block.stmts {
                        self.scan_stmt(stmt, ExecutionContext::Sync);
                    }
                }
            }
            // A referenced callback identifier: follow it like a helper.
            Expr::Ident(ident) => {
                self.record_transitive_calls(
                    ident.sym.as_str(),
                    ident.span,
                    ExecutionContext::Sync,
                );
            }
            _ => {}
        }
    }

    fn scan_stmt(&mut self, stmt: &'a swc_ecma_ast::Stmt, context: ExecutionContext) {
        use swc_ecma_ast::Stmt;
        match stmt {
            Stmt::Block(block) => {
                for inner in &block.stmts {
                    self.scan_stmt(inner, context);
                }
            }
            Stmt::Expr(expr_stmt) => self.scan_expr(&expr_stmt.expr, context),
            Stmt::Decl(swc_ecma_ast::Decl::Var(var)) => {
                for declarator in &var.decls {
                    if let Some(init) = &declarator.init {
                        self.scan_expr(init, context);
                    }
                }
            }
            Stmt::If(if_stmt) => {
                self.scan_expr(&if_stmt.test, context);
                self.scan_stmt(&if_stmt.cons, context);
                if let Some(alt) = &if_stmt.alt {
                    self.scan_stmt(alt, context);
                }
            }
            Stmt::While(while_stmt) => {
                self.scan_expr(&while_stmt.test, context);
                self.scan_stmt(&while_stmt.body, context);
            }
            Stmt::DoWhile(do_while) => {
                self.scan_stmt(&do_while.body, context);
                self.scan_expr(&do_while.test, context);
            }
            Stmt::For(for_stmt) => {
                if let Some(test) = &for_stmt.test {
                    self.scan_expr(test, context);
                }
                self.scan_stmt(&for_stmt.body, context);
            }
            Stmt::ForIn(for_in) => self.scan_stmt(&for_in.body, context),
            Stmt::ForOf(for_of) => self.scan_stmt(&for_of.body, context),
            Stmt::Switch(switch) => {
                for case in &switch.cases {
                    for inner in &case.cons {
                        self.scan_stmt(inner, context);
                    }
                }
            }
            Stmt::Try(try_stmt) => {
                for inner in &try_stmt.block.stmts {
                    self.scan_stmt(inner, context);
                }
                if let Some(handler) = &try_stmt.handler {
                    for inner in &handler.body.stmts {
                        self.scan_stmt(inner, context);
                    }
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    for inner in &finalizer.stmts {
                        self.scan_stmt(inner, context);
                    }
                }
            }
            Stmt::Return(ret) => {
                // The cleanup function runs on unmount, not per commit.
                let _ = ret;
            }
            Stmt::Labeled(labeled) => self.scan_stmt(&labeled.body, context),
            _ => {}
        }
    }

    fn scan_expr(&mut self, expr: &'a Expr, context: ExecutionContext) {
        match unwrap_expr(expr) {
            Expr::Call(call) => self.scan_call(call, context),
            Expr::Arrow(_) | Expr::Fn(_) => {
                // A function merely defined here runs only if called; the
                // call site is what gets followed.
            }
            Expr::Bin(bin) => {
                self.scan_expr(&bin.left, context);
                self.scan_expr(&bin.right, context);
            }
            Expr::Unary(unary) => self.scan_expr(&unary.arg, context),
            Expr::Cond(cond) => {
                self.scan_expr(&cond.test, context);
                self.scan_expr(&cond.cons, context);
                self.scan_expr(&cond.alt, context);
            }
            Expr::Assign(assign) => self.scan_expr(&assign.right, context),
            Expr::Member(member) => self.scan_expr(&member.obj, context),
            Expr::Paren(paren) => self.scan_expr(&paren.expr, context),
            Expr::Seq(seq) => {
                for inner in &seq.exprs {
                    self.scan_expr(inner, context);
                }
            }
            Expr::Await(await_expr) => self.scan_expr(&await_expr.arg, context),
            Expr::Object(object) => {
                for prop in &object.props {
                    match prop {
                        PropOrSpread::Spread(spread) => self.scan_expr(&spread.expr, context),
                        PropOrSpread::Prop(prop) => {
                            if let Prop::KeyValue(kv) = &**prop {
                                self.scan_expr(&kv.value, context);
                            }
                        }
                    }
                }
            }
            Expr::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.scan_expr(&elem.expr, context);
                }
            }
            Expr::Tpl(tpl) => {
                for inner in &tpl.exprs {
                    self.scan_expr(inner, context);
                }
            }
            Expr::OptChain(opt) => match &*opt.base {
                swc_ecma_ast::OptChainBase::Member(member) => self.scan_expr(&member.obj, context),
                swc_ecma_ast::OptChainBase::Call(call) => {
                    self.scan_expr(&call.callee, context);
                    for arg in &call.args {
                        self.scan_expr(&arg.expr, context);
                    }
                }
            },
            _ => {}
        }
    }

    fn scan_call(&mut self, call: &'a swc_ecma_ast::CallExpr, context: ExecutionContext) {
        let parts = callee_parts(&call.callee);

        if let Some((object, name)) = &parts {
            // Direct setter call.
            if object.is_none()
                && let Some(binding) = self.cx.summary.binding_for_setter(self.component, name)
            {
                self.uses.push(SetterUse {
                    binding: binding.clone(),
                    span: call.span,
                    context,
                    via: None,
                });
            }

            // Promise continuations will eventually execute.
            if object.is_some() && matches!(name.as_str(), "then" | "catch" | "finally") {
                let inner = match context {
                    ExecutionContext::Deferred => ExecutionContext::Deferred,
                    _ => ExecutionContext::Promise,
                };
                for arg in &call.args {
                    self.scan_callback_arg(&arg.expr, inner);
                }
                // The receiver chain may contain further calls.
                if let swc_ecma_ast::Callee::Expr(callee) = &call.callee
                    && let Expr::Member(member) = unwrap_expr(callee)
                {
                    self.scan_expr(&member.obj, context);
                }
                return;
            }

            // Timer-style schedulers may never fire.
            if object.is_none()
                && (DEFERRED_FUNCTIONS.contains(&name.as_str())
                    || self.cx.policy.is_deferred(name))
            {
                for arg in &call.args {
                    self.scan_callback_arg(&arg.expr, ExecutionContext::Deferred);
                }
                return;
            }

            // Synchronous array iteration runs its callback now.
            if object.is_some() && SYNC_ITERATION_METHODS.contains(&name.as_str()) {
                for arg in &call.args {
                    self.scan_callback_arg(&arg.expr, context);
                }
                return;
            }

            // A call into a helper that itself writes state.
            if object.is_none() && !is_hook_name(name) {
                self.record_transitive_calls(name, call.span, context);
            }

            // A setter passed as an argument into a function that invokes it.
            for (index, arg) in call.args.iter().enumerate() {
                if let Expr::Ident(ident) = unwrap_expr(&arg.expr)
                    && let Some(binding) = self
                        .cx
                        .summary
                        .binding_for_setter(self.component, ident.sym.as_str())
                    && object.is_none()
                    && self.cx.project.function_invokes_param(
                        &self.cx.parsed.path,
                        name,
                        index,
                        self.cx.config.max_import_hops,
                    )
                {
                    self.uses.push(SetterUse {
                        binding: binding.clone(),
                        span: call.span,
                        context,
                        via: Some(name.clone()),
                    });
                }
            }
        }

        // Arguments may hold further calls (not bare callbacks, handled
        // above for the callee kinds that run them).
        for arg in &call.args {
            if !matches!(unwrap_expr(&arg.expr), Expr::Arrow(_) | Expr::Fn(_)) {
                self.scan_expr(&arg.expr, context);
            }
        }
    }

    fn scan_callback_arg(&mut self, arg: &'a Expr, context: ExecutionContext) {
        match unwrap_expr(arg) {
            Expr::Arrow(arrow) => match &*arrow.body {
                BlockStmtOrExpr::BlockStmt(block) => {
                    for stmt in &block.stmts {
                        self.scan_stmt(stmt, context);
                    }
                }
                BlockStmtOrExpr::Expr(expr) => self.scan_expr(expr, context),
            },
            Expr::Fn(fn_expr) => {
                if let Some(block) = &fn_expr.function.body {
                    for stmt in &block.stmts {
                        self.scan_stmt(stmt, context);
                    }
                }
            }
            Expr::Ident(ident) => {
                self.record_transitive_calls(ident.sym.as_str(), ident.span, context);
            }
            other => self.scan_expr(other, context),
        }
    }

    /// Follow `helper()` into locally-known functions: if the helper (or a
    /// function it calls, within the depth bound) calls a setter, the
    /// effect is treated as calling it at this call site.
    fn record_transitive_calls(&mut self, name: &str, span: Span, context: ExecutionContext) {
        let mut visited = std::collections::HashSet::new();
        if let Some(binding) =
            self.find_transitive_setter(name, self.cx.config.max_call_depth, &mut visited)
        {
            self.uses.push(SetterUse {
                binding,
                span,
                context,
                via: Some(name.to_string()),
            });
        }
    }

    fn find_transitive_setter(
        &self,
        name: &str,
        depth: usize,
        visited: &mut std::collections::HashSet<String>,
    ) -> Option<StateBinding> {
        if depth == 0 || !visited.insert(name.to_string()) {
            return None;
        }
        let function = self.cx.summary.functions.get(name)?;
        for called in &function.calls {
            if let Some(binding) = self.cx.summary.binding_for_setter(self.component, called) {
                return Some(binding.clone());
            }
        }
        for called in &function.calls {
            if let Some(binding) = self.find_transitive_setter(called, depth - 1, visited) {
                return Some(binding);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::testutil::{check_source, codes};
    use crate::diagnostics::{Category, Confidence, DiagnosticCode, DiagnosticKind};

    #[test]
    fn test_unconditional_effect_setter() {
        let diagnostics = check_source(
            "function Counter() {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => {\n\
                 setX(x + 1);\n\
               }, [x]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectUnconditionalWrite]);
        let d = &diagnostics[0];
        assert_eq!(d.category, Category::Critical);
        assert_eq!(d.confidence, Confidence::High);
        assert_eq!(d.kind, DiagnosticKind::ConfirmedInfiniteLoop);
        assert_eq!(d.problematic_dependency.as_deref(), Some("x"));
        assert_eq!(d.setter_function.as_deref(), Some("setX"));
        assert_eq!(d.location.line, 3);
    }

    #[test]
    fn test_equality_guard_suppresses() {
        let diagnostics = check_source(
            "function Sync({ newX }) {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => {\n\
                 if (x !== newX) setX(newX);\n\
               }, [x, newX]);\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_toggle_guard_suppresses() {
        let diagnostics = check_source(
            "function Once() {\n\
               const [done, setDone] = useState(false);\n\
               useEffect(() => {\n\
                 if (!done) setDone(true);\n\
               }, [done]);\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_unguarded_conditional_write_is_potential() {
        let diagnostics = check_source(
            "function App({ flag }) {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => {\n\
                 if (flag) setX(x + 1);\n\
               }, [x, flag]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectConditionalWrite]);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::PotentialIssue);
    }

    #[test]
    fn test_property_comparison_guard_is_medium_confidence() {
        let diagnostics = check_source(
            "function App({ user }) {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => {\n\
                 if (user.id !== x) setX(user.id);\n\
               }, [x, user]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectConditionalWrite]);
        assert_eq!(diagnostics[0].confidence, Confidence::Medium);
    }

    #[test]
    fn test_missing_dep_array_with_setter() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => {\n\
                 setX(1);\n\
               });\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectMissingDeps]);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::ConfirmedInfiniteLoop);
    }

    #[test]
    fn test_empty_dep_array_runs_once() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => {\n\
                 setX(1);\n\
               }, []);\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_untracked_state_write_is_fine() {
        let diagnostics = check_source(
            "function App({ query }) {\n\
               const [results, setResults] = useState([]);\n\
               useEffect(() => {\n\
                 setResults(search(query));\n\
               }, [query]);\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_reducer_dispatch_counts_as_root_write() {
        let diagnostics = check_source(
            "function App() {\n\
               const [state, dispatch] = useReducer(reducer, {});\n\
               useEffect(() => {\n\
                 dispatch({ type: \"tick\" });\n\
               }, [state]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectUnconditionalWrite]);
        assert_eq!(diagnostics[0].problematic_dependency.as_deref(), Some("state"));
        assert_eq!(diagnostics[0].setter_function.as_deref(), Some("dispatch"));
    }

    #[test]
    fn test_member_dep_matches_root() {
        let diagnostics = check_source(
            "function App() {\n\
               const [user, setUser] = useState({ id: 0 });\n\
               useEffect(() => {\n\
                 setUser({ id: 1 });\n\
               }, [user.id]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectUnconditionalWrite]);
    }

    #[test]
    fn test_promise_continuation_is_unconditional() {
        let diagnostics = check_source(
            "function App() {\n\
               const [data, setData] = useState(null);\n\
               useEffect(() => {\n\
                 fetchData().then((next) => setData(next));\n\
               }, [data]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectUnconditionalWrite]);
    }

    #[test]
    fn test_timer_callback_is_conditional() {
        let diagnostics = check_source(
            "function App() {\n\
               const [tick, setTick] = useState(0);\n\
               useEffect(() => {\n\
                 setTimeout(() => setTick(tick + 1), 1000);\n\
               }, [tick]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectConditionalWrite]);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::PotentialIssue);
    }

    #[test]
    fn test_transitive_write_through_helper() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               const bump = () => {\n\
                 setX(x + 1);\n\
               };\n\
               useEffect(() => {\n\
                 bump();\n\
               }, [x]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectUnconditionalWrite]);
        assert!(diagnostics[0].explanation.contains("bump"));
    }

    #[test]
    fn test_sync_iteration_callback_counts() {
        let diagnostics = check_source(
            "function App() {\n\
               const [n, setN] = useState(0);\n\
               useEffect(() => {\n\
                 [1, 2, 3].forEach((i) => setN(i));\n\
               }, [n]);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::EffectUnconditionalWrite]);
    }

    #[test]
    fn test_early_return_guard_suppresses() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => {\n\
                 if (x > 10) return;\n\
                 setX(x + 1);\n\
               }, [x]);\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_cleanup_function_writes_are_ignored() {
        let diagnostics = check_source(
            "function App() {\n\
               const [open, setOpen] = useState(false);\n\
               useEffect(() => {\n\
                 return () => setOpen(false);\n\
               }, [open]);\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }
}
