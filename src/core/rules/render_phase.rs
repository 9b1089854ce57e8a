//! Render-phase write rules.
//!
//! A setter called directly during render re-triggers the render that
//! called it: a confirmed loop unless a recognized one-shot pattern guards
//! it (`if (!flag) setFlag(true)`, the derived-state diff
//! `if (prop !== prev) setPrev(prop)`, or an early return ahead of the
//! call). Ref writes during render don't loop by themselves but leak
//! state-derived values outside the render contract, so they surface as
//! potential issues.

use swc_ecma_ast::{
    AssignOp, AssignTarget, BinaryOp, Expr, MemberProp, Prop, PropOrSpread, SimpleAssignTarget,
    Stmt,
};

use crate::core::cfg::guards::{GuardKind, classify_condition};
use crate::core::semantics::stability::{callee_parts, unwrap_expr};
use crate::core::semantics::{DeclaringHook, StateBinding};
use crate::diagnostics::{
    Category, Confidence, Diagnostic, DiagnosticCode, DiagnosticKind, Severity, SourceLocation,
};

use super::{Body, Rule, RuleContext};

/// RLD-100 / RLD-101: state write in the component body itself.
pub struct RenderPhaseWriteRule;

impl Rule for RenderPhaseWriteRule {
    fn name(&self) -> &'static str {
        "render-phase-write"
    }

    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for component in &cx.components {
            let mut walker = RenderWalker {
                cx,
                component: &component.name,
                guards: Vec::new(),
                diagnostics: &mut diagnostics,
            };
            walker.walk_body(component.body, false);
        }
        diagnostics
    }
}

struct RenderWalker<'a, 'b> {
    cx: &'b RuleContext<'a>,
    component: &'b str,
    /// Enclosing branch conditions with the side taken to get here.
    guards: Vec<(&'a Expr, bool)>,
    diagnostics: &'b mut Vec<Diagnostic>,
}

impl<'a, 'b> RenderWalker<'a, 'b> {
    fn walk_body(&mut self, body: Body<'a>, protected: bool) {
        match body {
            Body::Block(block) => self.walk_block(&block.stmts, protected),
            Body::Expr(expr) => self.scan_expr(expr, protected),
        }
    }

    fn walk_block(&mut self, stmts: &'a [Stmt], mut protected: bool) {
        for stmt in stmts {
            self.walk_stmt(stmt, protected);
            // A conditional early return ahead of the setter is a
            // recognized one-shot protection for the rest of the block.
            if is_conditional_early_return(stmt) {
                protected = true;
            }
            if stmt_terminates(stmt) {
                break;
            }
        }
    }

    fn walk_stmt(&mut self, stmt: &'a Stmt, protected: bool) {
        match stmt {
            Stmt::Block(block) => self.walk_block(&block.stmts, protected),
            Stmt::Expr(expr_stmt) => self.scan_expr(&expr_stmt.expr, protected),
            Stmt::Decl(swc_ecma_ast::Decl::Var(var)) => {
                for declarator in &var.decls {
                    if let Some(init) = &declarator.init {
                        self.scan_expr(init, protected);
                    }
                }
            }
            Stmt::If(if_stmt) => {
                self.scan_expr(&if_stmt.test, protected);
                self.guards.push((&if_stmt.test, true));
                self.walk_stmt(&if_stmt.cons, protected);
                self.guards.pop();
                if let Some(alt) = &if_stmt.alt {
                    self.guards.push((&if_stmt.test, false));
                    self.walk_stmt(alt, protected);
                    self.guards.pop();
                }
            }
            Stmt::Return(ret) => {
                if let Some(arg) = &ret.arg {
                    self.scan_expr(arg, protected);
                }
            }
            Stmt::While(while_stmt) => {
                self.scan_expr(&while_stmt.test, protected);
                self.walk_stmt(&while_stmt.body, protected);
            }
            Stmt::DoWhile(do_while) => {
                self.walk_stmt(&do_while.body, protected);
                self.scan_expr(&do_while.test, protected);
            }
            Stmt::For(for_stmt) => {
                if let Some(test) = &for_stmt.test {
                    self.scan_expr(test, protected);
                }
                self.walk_stmt(&for_stmt.body, protected);
            }
            Stmt::ForIn(for_in) => self.walk_stmt(&for_in.body, protected),
            Stmt::ForOf(for_of) => self.walk_stmt(&for_of.body, protected),
            Stmt::Switch(switch) => {
                for case in &switch.cases {
                    for inner in &case.cons {
                        self.walk_stmt(inner, protected);
                    }
                }
            }
            Stmt::Try(try_stmt) => {
                self.walk_block(&try_stmt.block.stmts, protected);
                if let Some(handler) = &try_stmt.handler {
                    self.walk_block(&handler.body.stmts, protected);
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    self.walk_block(&finalizer.stmts, protected);
                }
            }
            Stmt::Labeled(labeled) => self.walk_stmt(&labeled.body, protected),
            _ => {}
        }
    }

    /// Scan an expression for direct setter calls, staying out of nested
    /// functions (handlers and hook callbacks run later, not during render).
    fn scan_expr(&mut self, expr: &'a Expr, protected: bool) {
        match unwrap_expr(expr) {
            Expr::Arrow(_) | Expr::Fn(_) => {}
            Expr::Call(call) => {
                if let Some((None, name)) = callee_parts(&call.callee)
                    && let Some(binding) = self
                        .cx
                        .summary
                        .binding_for_setter(Some(self.component), &name)
                {
                    self.report(call, binding, protected);
                }
                for arg in &call.args {
                    self.scan_expr(&arg.expr, protected);
                }
                if let swc_ecma_ast::Callee::Expr(callee) = &call.callee {
                    if let Expr::Member(member) = unwrap_expr(callee) {
                        self.scan_expr(&member.obj, protected);
                    }
                }
            }
            Expr::Bin(bin)
                if matches!(
                    bin.op,
                    BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
                ) =>
            {
                self.scan_expr(&bin.left, protected);
                let taken = bin.op == BinaryOp::LogicalAnd;
                self.guards.push((&bin.left, taken));
                self.scan_expr(&bin.right, protected);
                self.guards.pop();
            }
            Expr::Bin(bin) => {
                self.scan_expr(&bin.left, protected);
                self.scan_expr(&bin.right, protected);
            }
            Expr::Cond(cond) => {
                self.scan_expr(&cond.test, protected);
                self.guards.push((&cond.test, true));
                self.scan_expr(&cond.cons, protected);
                self.guards.pop();
                self.guards.push((&cond.test, false));
                self.scan_expr(&cond.alt, protected);
                self.guards.pop();
            }
            Expr::Unary(unary) => self.scan_expr(&unary.arg, protected),
            Expr::Assign(assign) => self.scan_expr(&assign.right, protected),
            Expr::Member(member) => self.scan_expr(&member.obj, protected),
            Expr::Paren(paren) => self.scan_expr(&paren.expr, protected),
            Expr::Seq(seq) => {
                for inner in &seq.exprs {
                    self.scan_expr(inner, protected);
                }
            }
            Expr::Await(await_expr) => self.scan_expr(&await_expr.arg, protected),
            Expr::Object(object) => {
                for prop in &object.props {
                    match prop {
                        PropOrSpread::Spread(spread) => self.scan_expr(&spread.expr, protected),
                        PropOrSpread::Prop(prop) => {
                            if let Prop::KeyValue(kv) = &**prop {
                                self.scan_expr(&kv.value, protected);
                            }
                        }
                    }
                }
            }
            Expr::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.scan_expr(&elem.expr, protected);
                }
            }
            Expr::Tpl(tpl) => {
                for inner in &tpl.exprs {
                    self.scan_expr(inner, protected);
                }
            }
            Expr::JSXElement(element) => self.scan_jsx(element, protected),
            Expr::JSXFragment(fragment) => {
                for child in &fragment.children {
                    self.scan_jsx_child(child, protected);
                }
            }
            _ => {}
        }
    }

    fn scan_jsx(&mut self, element: &'a swc_ecma_ast::JSXElement, protected: bool) {
        use swc_ecma_ast::{JSXAttrOrSpread, JSXAttrValue, JSXExpr};
        for attr in &element.opening.attrs {
            match attr {
                JSXAttrOrSpread::JSXAttr(attr) => {
                    if let Some(JSXAttrValue::JSXExprContainer(container)) = &attr.value
                        && let JSXExpr::Expr(expr) = &container.expr
                    {
                        self.scan_expr(expr, protected);
                    }
                }
                JSXAttrOrSpread::SpreadElement(spread) => self.scan_expr(&spread.expr, protected),
            }
        }
        for child in &element.children {
            self.scan_jsx_child(child, protected);
        }
    }

    fn scan_jsx_child(&mut self, child: &'a swc_ecma_ast::JSXElementChild, protected: bool) {
        use swc_ecma_ast::{JSXElementChild, JSXExpr};
        match child {
            JSXElementChild::JSXElement(element) => self.scan_jsx(element, protected),
            JSXElementChild::JSXFragment(fragment) => {
                for inner in &fragment.children {
                    self.scan_jsx_child(inner, protected);
                }
            }
            JSXElementChild::JSXExprContainer(container) => {
                if let JSXExpr::Expr(expr) = &container.expr {
                    self.scan_expr(expr, protected);
                }
            }
            _ => {}
        }
    }

    fn report(&mut self, call: &'a swc_ecma_ast::CallExpr, binding: &StateBinding, protected: bool) {
        if protected || self.is_one_shot_guarded(binding) {
            return;
        }
        let (line, col) = self.cx.line_col(call.span);
        let (code, hook_kind) = match binding.declaring_hook {
            DeclaringHook::State => (
                DiagnosticCode::RenderPhaseSetState,
                crate::core::semantics::HookKind::State,
            ),
            DeclaringHook::Reducer => (
                DiagnosticCode::RenderPhaseDispatch,
                crate::core::semantics::HookKind::Reducer,
            ),
        };
        let debug_record = self.cx.debug_record(|| {
            format!(
                "render-phase call to {} in {}; {} enclosing condition(s), none recognized",
                binding.setter_name,
                self.component,
                self.guards.len()
            )
        });
        self.diagnostics.push(
            Diagnostic::new(
                code,
                Category::Critical,
                SourceLocation::new(self.cx.parsed.path.clone(), line).with_col(col),
                format!(
                    "\"{}\" is called while \"{}\" renders, so every render schedules another one",
                    binding.setter_name, self.component
                ),
            )
            .with_severity(Severity::High)
            .with_confidence(Confidence::High)
            .with_kind(DiagnosticKind::ConfirmedInfiniteLoop)
            .with_hook_kind(hook_kind)
            .with_setter(binding.setter_name.clone())
            .with_suggestion("Move the state write into an effect or an event handler")
            .with_debug_record(debug_record),
        );
    }

    /// Is any enclosing condition a recognized idempotent guard for the
    /// state this setter writes? Equality covers the derived-state diff
    /// pattern (`if (prop !== prev) setPrev(prop)`); relational limits like
    /// `count < 100` are monotone, not idempotent, and do not qualify.
    fn is_one_shot_guarded(&self, binding: &StateBinding) -> bool {
        self.guards.iter().any(|(cond, taken)| {
            matches!(
                classify_condition(cond, *taken, &binding.name),
                Some(GuardKind::Equality) | Some(GuardKind::Toggle)
            )
        })
    }
}

fn stmt_terminates(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::Return(_) | Stmt::Throw(_) | Stmt::Break(_) | Stmt::Continue(_)
    )
}

/// `if (cond) return;` (or a block ending in return) with no alternate.
fn is_conditional_early_return(stmt: &Stmt) -> bool {
    let Stmt::If(if_stmt) = stmt else {
        return false;
    };
    if if_stmt.alt.is_some() {
        return false;
    }
    arm_terminates_with_return(&if_stmt.cons)
}

fn arm_terminates_with_return(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::Return(_) | Stmt::Throw(_) => true,
        Stmt::Block(block) => block.stmts.last().is_some_and(arm_terminates_with_return),
        _ => false,
    }
}

// ============================================================
// RLD-600: render-phase ref mutation
// ============================================================

/// RLD-600: `ref.current = <state-derived>` in the component body.
pub struct RenderPhaseRefWriteRule;

impl Rule for RenderPhaseRefWriteRule {
    fn name(&self) -> &'static str {
        "render-phase-ref-write"
    }

    fn check(&self, cx: &RuleContext<'_>) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for component in &cx.components {
            let mut walker = RefWalker {
                cx,
                component: &component.name,
                diagnostics: &mut diagnostics,
            };
            match component.body {
                Body::Block(block) => walker.walk_stmts(&block.stmts),
                Body::Expr(expr) => walker.scan_expr(expr),
            }
        }
        diagnostics
    }
}

struct RefWalker<'a, 'b> {
    cx: &'b RuleContext<'a>,
    component: &'b str,
    diagnostics: &'b mut Vec<Diagnostic>,
}

impl<'a, 'b> RefWalker<'a, 'b> {
    fn walk_stmts(&mut self, stmts: &'a [Stmt]) {
        for stmt in stmts {
            self.walk_stmt(stmt);
        }
    }

    /// Ref mutations inside effects, handlers, and other nested functions
    /// are the supported idiom and are not visited.
    fn walk_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(block) => self.walk_stmts(&block.stmts),
            Stmt::Expr(expr_stmt) => self.scan_expr(&expr_stmt.expr),
            Stmt::If(if_stmt) => {
                self.walk_stmt(&if_stmt.cons);
                if let Some(alt) = &if_stmt.alt {
                    self.walk_stmt(alt);
                }
            }
            Stmt::While(while_stmt) => self.walk_stmt(&while_stmt.body),
            Stmt::For(for_stmt) => self.walk_stmt(&for_stmt.body),
            Stmt::Labeled(labeled) => self.walk_stmt(&labeled.body),
            _ => {}
        }
    }

    fn scan_expr(&mut self, expr: &'a Expr) {
        match unwrap_expr(expr) {
            Expr::Arrow(_) | Expr::Fn(_) => {}
            Expr::Assign(assign) if assign.op == AssignOp::Assign => {
                if let AssignTarget::Simple(SimpleAssignTarget::Member(member)) = &assign.left
                    && let Expr::Ident(obj) = unwrap_expr(&member.obj)
                    && let MemberProp::Ident(prop) = &member.prop
                    && prop.sym.as_str() == "current"
                    && self
                        .cx
                        .summary
                        .is_ref_name(Some(self.component), obj.sym.as_str())
                    && let Some(state) = self.read_state(&assign.right)
                {
                    self.report(expr, obj.sym.as_str(), &state);
                }
            }
            Expr::Seq(seq) => {
                for inner in &seq.exprs {
                    self.scan_expr(inner);
                }
            }
            Expr::Paren(paren) => self.scan_expr(&paren.expr),
            _ => {}
        }
    }

    /// Does the assigned expression read a tracked state variable?
    fn read_state(&self, expr: &Expr) -> Option<String> {
        let mut found = None;
        scan_idents(expr, &mut |name| {
            if found.is_none()
                && self
                    .cx
                    .summary
                    .state_binding(Some(self.component), name)
                    .is_some()
            {
                found = Some(name.to_string());
            }
        });
        found
    }

    fn report(&mut self, expr: &Expr, ref_name: &str, state: &str) {
        use swc_common::Spanned;
        let (line, col) = self.cx.line_col(expr.span());
        self.diagnostics.push(
            Diagnostic::new(
                DiagnosticCode::RenderPhaseRefWrite,
                Category::Warning,
                SourceLocation::new(self.cx.parsed.path.clone(), line).with_col(col),
                format!(
                    "\"{}.current\" is written during render from state \"{}\"; \
                     renders must not have side effects",
                    ref_name, state
                ),
            )
            .with_severity(Severity::Medium)
            .with_confidence(Confidence::Medium)
            .with_kind(DiagnosticKind::PotentialIssue)
            .with_hook_kind(crate::core::semantics::HookKind::Ref)
            .with_dependency(state.to_string())
            .with_suggestion("Assign the ref inside an effect instead"),
        );
    }
}

fn scan_idents(expr: &Expr, f: &mut impl FnMut(&str)) {
    match unwrap_expr(expr) {
        Expr::Ident(ident) => f(ident.sym.as_str()),
        Expr::Member(member) => scan_idents(&member.obj, f),
        Expr::Bin(bin) => {
            scan_idents(&bin.left, f);
            scan_idents(&bin.right, f);
        }
        Expr::Unary(unary) => scan_idents(&unary.arg, f),
        Expr::Cond(cond) => {
            scan_idents(&cond.test, f);
            scan_idents(&cond.cons, f);
            scan_idents(&cond.alt, f);
        }
        Expr::Call(call) => {
            for arg in &call.args {
                scan_idents(&arg.expr, f);
            }
        }
        Expr::Tpl(tpl) => {
            for inner in &tpl.exprs {
                scan_idents(inner, f);
            }
        }
        Expr::Object(object) => {
            for prop in &object.props {
                if let PropOrSpread::Prop(prop) = prop
                    && let Prop::KeyValue(kv) = &**prop
                {
                    scan_idents(&kv.value, f);
                }
            }
        }
        Expr::Array(array) => {
            for elem in array.elems.iter().flatten() {
                scan_idents(&elem.expr, f);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::testutil::{check_source, codes};
    use crate::diagnostics::{Category, Confidence, DiagnosticCode};

    #[test]
    fn test_unguarded_render_setter_is_confirmed() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               setX(1);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RenderPhaseSetState]);
        assert_eq!(diagnostics[0].category, Category::Critical);
        assert_eq!(diagnostics[0].confidence, Confidence::High);
        assert_eq!(diagnostics[0].setter_function.as_deref(), Some("setX"));
        assert_eq!(diagnostics[0].location.line, 3);
    }

    #[test]
    fn test_dispatch_in_render_uses_reducer_code() {
        let diagnostics = check_source(
            "function App() {\n\
               const [state, dispatch] = useReducer(reducer, {});\n\
               dispatch({ type: \"init\" });\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RenderPhaseDispatch]);
    }

    #[test]
    fn test_one_shot_toggle_is_not_flagged() {
        let diagnostics = check_source(
            "function App() {\n\
               const [initialized, setInitialized] = useState(false);\n\
               if (!initialized) {\n\
                 setInitialized(true);\n\
               }\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_derived_state_diff_is_not_flagged() {
        let diagnostics = check_source(
            "function List({ items }) {\n\
               const [prevItems, setPrevItems] = useState(items);\n\
               if (items !== prevItems) {\n\
                 setPrevItems(items);\n\
               }\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_guarded_counter_is_still_flagged() {
        // `count < 100` is a monotone limit, not an idempotent guard.
        let diagnostics = check_source(
            "function App() {\n\
               const [count, setCount] = useState(0);\n\
               if (count < 100) {\n\
                 setCount(count + 1);\n\
               }\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RenderPhaseSetState]);
    }

    #[test]
    fn test_early_return_protects_following_setter() {
        let diagnostics = check_source(
            "function App() {\n\
               const [ready, setReady] = useState(false);\n\
               if (ready) return null;\n\
               setReady(true);\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_setter_in_handler_is_fine() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               const onClick = () => setX(1);\n\
               return <button onClick={onClick} />;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_setter_in_jsx_attribute_call_is_flagged() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               return <div data-x={setX(1)} />;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RenderPhaseSetState]);
    }

    #[test]
    fn test_short_circuit_setter_unguarded_condition() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               x < 5 && setX(x + 1);\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RenderPhaseSetState]);
    }

    #[test]
    fn test_other_component_setter_not_confused() {
        let diagnostics = check_source(
            "function A() {\n\
               const [x, setX] = useState(0);\n\
               return null;\n\
             }\n\
             function B() {\n\
               setX(1);\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_ref_write_from_state_in_render() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               const latest = useRef(x);\n\
               latest.current = x;\n\
               return null;\n\
             }\n",
        );
        assert_eq!(codes(&diagnostics), vec![DiagnosticCode::RenderPhaseRefWrite]);
        assert_eq!(diagnostics[0].problematic_dependency.as_deref(), Some("x"));
    }

    #[test]
    fn test_ref_write_inside_effect_is_fine() {
        let diagnostics = check_source(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               const latest = useRef(x);\n\
               useEffect(() => {\n\
                 latest.current = x;\n\
               }, [x]);\n\
               return null;\n\
             }\n",
        );
        assert!(codes(&diagnostics).is_empty());
    }

    #[test]
    fn test_ref_write_without_state_read_is_fine() {
        let diagnostics = check_source(
            "function App() {\n\
               const latest = useRef(0);\n\
               latest.current = 42;\n\
               return null;\n\
             }\n",
        );
        assert!(diagnostics.is_empty());
    }
}
