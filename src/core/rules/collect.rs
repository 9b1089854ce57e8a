//! Per-file occurrence collection for the rule engine.
//!
//! Rules need live AST references (hook callbacks to build CFGs from, JSX
//! attribute values to classify), which the published summaries cannot
//! carry. This collector re-walks the module once per analysis and hands
//! each rule the same collected view. It is a hand-rolled recursive walk
//! because the collected items borrow from the AST.

use swc_common::{SourceMapper, Span, Spanned};
use swc_ecma_ast::{
    BlockStmt, BlockStmtOrExpr, CallExpr, DefaultDecl, Decl, Expr, JSXAttrName, JSXAttrOrSpread,
    JSXAttrValue, JSXElement, JSXElementName, JSXExpr, JSXFragment, JSXObject, ModuleDecl,
    ModuleItem, Pat, Prop, PropOrSpread, Stmt, VarDeclOrExpr,
};

use crate::core::parser::ParsedFile;
use crate::core::semantics::stability::{callee_parts, member_root, unwrap_expr};
use crate::core::semantics::{DepForm, HookKind, is_component_name, is_hook_name};

/// A dependency-list entry with its backing expression.
#[derive(Debug)]
pub struct Dep<'a> {
    pub expr: &'a Expr,
    pub text: String,
    pub root: Option<String>,
    pub form: DepForm,
}

/// A hook call site with live AST references.
#[derive(Debug)]
pub struct HookOccurrence<'a> {
    pub kind: HookKind,
    pub callee: String,
    pub component: Option<String>,
    pub line: usize,
    pub col: usize,
    pub call: &'a CallExpr,
    /// The main callback argument, when the hook takes one.
    pub callback: Option<&'a Expr>,
    /// `None` = dependency argument absent; `Some([])` = present but empty.
    pub deps: Option<Vec<Dep<'a>>>,
}

/// What a JSX element resolves to for prop analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsxTarget {
    /// `<C.Provider value={...}>` where `C` is a created context.
    ContextProvider { context: String },
    /// Capitalized component element.
    Component { name: String },
    /// Lowercase HTML-like element; never triggers prop rules.
    Lowercase,
}

#[derive(Debug)]
pub struct JsxAttrUse<'a> {
    pub name: String,
    /// Expression-valued attributes only; string literals are stable.
    pub value: Option<&'a Expr>,
    pub line: usize,
    pub col: usize,
}

#[derive(Debug)]
pub struct JsxUsage<'a> {
    pub target: JsxTarget,
    pub component: Option<String>,
    pub attrs: Vec<JsxAttrUse<'a>>,
    pub line: usize,
    pub col: usize,
}

/// A component body, for render-phase analysis.
#[derive(Debug)]
pub struct ComponentBody<'a> {
    pub name: String,
    pub body: Body<'a>,
}

#[derive(Debug, Clone, Copy)]
pub enum Body<'a> {
    Block(&'a BlockStmt),
    Expr(&'a Expr),
}

pub struct Collected<'a> {
    pub hooks: Vec<HookOccurrence<'a>>,
    pub jsx: Vec<JsxUsage<'a>>,
    pub components: Vec<ComponentBody<'a>>,
}

pub fn collect(parsed: &ParsedFile) -> Collected<'_> {
    let mut collector = Collector {
        parsed,
        owner: None,
        hooks: Vec::new(),
        jsx: Vec::new(),
        components: Vec::new(),
    };
    collector.walk_module();
    Collected {
        hooks: collector.hooks,
        jsx: collector.jsx,
        components: collector.components,
    }
}

struct Collector<'a> {
    parsed: &'a ParsedFile,
    owner: Option<String>,
    hooks: Vec<HookOccurrence<'a>>,
    jsx: Vec<JsxUsage<'a>>,
    components: Vec<ComponentBody<'a>>,
}

impl<'a> Collector<'a> {
    fn line_col(&self, span: Span) -> (usize, usize) {
        let loc = self.parsed.source_map.lookup_char_pos(span.lo);
        (loc.line, loc.col_display + 1)
    }

    fn snippet(&self, span: Span) -> String {
        self.parsed.source_map.span_to_snippet(span).unwrap_or_default()
    }

    fn is_framework_namespace(&self, name: &str) -> bool {
        name == "React" || self.parsed.summary.namespace_imports.contains(name)
    }

    fn framework_hook(&self, call: &CallExpr) -> Option<(String, HookKind)> {
        let (object, name) = callee_parts(&call.callee)?;
        match object {
            None => HookKind::from_name(&name).map(|kind| (name, kind)),
            Some(ns) if self.is_framework_namespace(&ns) => {
                HookKind::from_name(&name).map(|kind| (format!("{}.{}", ns, name), kind))
            }
            _ => None,
        }
    }

    /// The extractor already resolved wrapper names through the configured
    /// policy; a name in the memoized set marks its initializer as a
    /// wrapped component body.
    fn is_wrapped_component(&self, name: &str) -> bool {
        self.parsed.summary.memoized_components.contains(name)
    }

    // ============================================================
    // Module level: owner boundaries
    // ============================================================

    fn walk_module(&mut self) {
        let parsed = self.parsed;
        for item in &parsed.module.body {
            match item {
                ModuleItem::Stmt(stmt) => self.walk_top_stmt(stmt),
                ModuleItem::ModuleDecl(decl) => self.walk_module_decl(decl),
            }
        }
    }

    fn walk_module_decl(&mut self, decl: &'a ModuleDecl) {
        match decl {
            ModuleDecl::ExportDecl(export) => match &export.decl {
                Decl::Fn(fn_decl) => {
                    let name = fn_decl.ident.sym.to_string();
                    self.enter_function_decl(&name, &fn_decl.function);
                }
                Decl::Var(var) => {
                    for declarator in &var.decls {
                        self.walk_top_declarator(declarator);
                    }
                }
                _ => {}
            },
            ModuleDecl::ExportDefaultDecl(export) => {
                if let DefaultDecl::Fn(fn_expr) = &export.decl {
                    let name = fn_expr
                        .ident
                        .as_ref()
                        .map(|i| i.sym.to_string())
                        .unwrap_or_else(|| "default".to_string());
                    self.enter_function_decl(&name, &fn_expr.function);
                }
            }
            ModuleDecl::ExportDefaultExpr(export) => {
                self.walk_top_expr_value("default", unwrap_expr(&export.expr));
            }
            _ => {}
        }
    }

    fn walk_top_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Decl(Decl::Fn(fn_decl)) => {
                let name = fn_decl.ident.sym.to_string();
                self.enter_function_decl(&name, &fn_decl.function);
            }
            Stmt::Decl(Decl::Var(var)) => {
                for declarator in &var.decls {
                    self.walk_top_declarator(declarator);
                }
            }
            other => self.walk_stmt(other),
        }
    }

    fn walk_top_declarator(&mut self, declarator: &'a swc_ecma_ast::VarDeclarator) {
        let Some(init) = &declarator.init else {
            return;
        };
        if let Pat::Ident(binding) = &declarator.name {
            let name = binding.id.sym.to_string();
            self.walk_top_expr_value(&name, unwrap_expr(init));
        } else {
            self.walk_expr(init);
        }
    }

    /// A top-level named value: component, custom hook, wrapped component,
    /// or ordinary module code.
    fn walk_top_expr_value(&mut self, name: &str, init: &'a Expr) {
        match init {
            Expr::Arrow(arrow) => {
                let body = match &*arrow.body {
                    BlockStmtOrExpr::BlockStmt(block) => Body::Block(block),
                    BlockStmtOrExpr::Expr(expr) => Body::Expr(expr),
                };
                self.enter_owner_body(name, body);
            }
            Expr::Fn(fn_expr) => {
                self.enter_function_decl(name, &fn_expr.function);
            }
            Expr::Call(call) if self.is_wrapped_component(name) => {
                if let Some(arg) = call.args.first() {
                    self.walk_top_expr_value(name, unwrap_expr(&arg.expr));
                }
            }
            other => self.walk_expr(other),
        }
    }

    fn enter_function_decl(&mut self, name: &str, function: &'a swc_ecma_ast::Function) {
        if let Some(block) = &function.body {
            self.enter_owner_body(name, Body::Block(block));
        }
    }

    fn enter_owner_body(&mut self, name: &str, body: Body<'a>) {
        let becomes_owner = is_component_name(name) || is_hook_name(name);
        if becomes_owner {
            if is_component_name(name) {
                self.components.push(ComponentBody {
                    name: name.to_string(),
                    body,
                });
            }
            let prev = self.owner.replace(name.to_string());
            self.walk_body(body);
            self.owner = prev;
        } else {
            self.walk_body(body);
        }
    }

    fn walk_body(&mut self, body: Body<'a>) {
        match body {
            Body::Block(block) => {
                for stmt in &block.stmts {
                    self.walk_stmt(stmt);
                }
            }
            Body::Expr(expr) => self.walk_expr(expr),
        }
    }

    // ============================================================
    // Statements
    // ============================================================

    fn walk_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Block(block) => {
                for inner in &block.stmts {
                    self.walk_stmt(inner);
                }
            }
            Stmt::Expr(expr_stmt) => self.walk_expr(&expr_stmt.expr),
            Stmt::Decl(Decl::Var(var)) => {
                for declarator in &var.decls {
                    if let Some(init) = &declarator.init {
                        self.walk_expr(init);
                    }
                }
            }
            Stmt::Decl(Decl::Fn(fn_decl)) => {
                if let Some(block) = &fn_decl.function.body {
                    for inner in &block.stmts {
                        self.walk_stmt(inner);
                    }
                }
            }
            Stmt::Decl(_) => {}
            Stmt::If(if_stmt) => {
                self.walk_expr(&if_stmt.test);
                self.walk_stmt(&if_stmt.cons);
                if let Some(alt) = &if_stmt.alt {
                    self.walk_stmt(alt);
                }
            }
            Stmt::While(while_stmt) => {
                self.walk_expr(&while_stmt.test);
                self.walk_stmt(&while_stmt.body);
            }
            Stmt::DoWhile(do_while) => {
                self.walk_stmt(&do_while.body);
                self.walk_expr(&do_while.test);
            }
            Stmt::For(for_stmt) => {
                match &for_stmt.init {
                    Some(VarDeclOrExpr::Expr(expr)) => self.walk_expr(expr),
                    Some(VarDeclOrExpr::VarDecl(var)) => {
                        for declarator in &var.decls {
                            if let Some(init) = &declarator.init {
                                self.walk_expr(init);
                            }
                        }
                    }
                    None => {}
                }
                if let Some(test) = &for_stmt.test {
                    self.walk_expr(test);
                }
                if let Some(update) = &for_stmt.update {
                    self.walk_expr(update);
                }
                self.walk_stmt(&for_stmt.body);
            }
            Stmt::ForIn(for_in) => {
                self.walk_expr(&for_in.right);
                self.walk_stmt(&for_in.body);
            }
            Stmt::ForOf(for_of) => {
                self.walk_expr(&for_of.right);
                self.walk_stmt(&for_of.body);
            }
            Stmt::Switch(switch) => {
                self.walk_expr(&switch.discriminant);
                for case in &switch.cases {
                    if let Some(test) = &case.test {
                        self.walk_expr(test);
                    }
                    for inner in &case.cons {
                        self.walk_stmt(inner);
                    }
                }
            }
            Stmt::Try(try_stmt) => {
                for inner in &try_stmt.block.stmts {
                    self.walk_stmt(inner);
                }
                if let Some(handler) = &try_stmt.handler {
                    for inner in &handler.body.stmts {
                        self.walk_stmt(inner);
                    }
                }
                if let Some(finalizer) = &try_stmt.finalizer {
                    for inner in &finalizer.stmts {
                        self.walk_stmt(inner);
                    }
                }
            }
            Stmt::Return(ret) => {
                if let Some(arg) = &ret.arg {
                    self.walk_expr(arg);
                }
            }
            Stmt::Throw(throw) => self.walk_expr(&throw.arg),
            Stmt::Labeled(labeled) => self.walk_stmt(&labeled.body),
            _ => {}
        }
    }

    // ============================================================
    // Expressions
    // ============================================================

    fn walk_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Call(call) => {
                if let Some((callee, kind)) = self.framework_hook(call)
                    && self.owner.is_some()
                {
                    self.record_hook(call, callee, kind);
                }
                if let swc_ecma_ast::Callee::Expr(callee) = &call.callee {
                    self.walk_expr(callee);
                }
                for arg in &call.args {
                    self.walk_expr(&arg.expr);
                }
            }
            Expr::New(new_expr) => {
                self.walk_expr(&new_expr.callee);
                if let Some(args) = &new_expr.args {
                    for arg in args {
                        self.walk_expr(&arg.expr);
                    }
                }
            }
            Expr::Arrow(arrow) => match &*arrow.body {
                BlockStmtOrExpr::BlockStmt(block) => {
                    for stmt in &block.stmts {
                        self.walk_stmt(stmt);
                    }
                }
                BlockStmtOrExpr::Expr(inner) => self.walk_expr(inner),
            },
            Expr::Fn(fn_expr) => {
                if let Some(block) = &fn_expr.function.body {
                    for stmt in &block.stmts {
                        self.walk_stmt(stmt);
                    }
                }
            }
            Expr::Bin(bin) => {
                self.walk_expr(&bin.left);
                self.walk_expr(&bin.right);
            }
            Expr::Unary(unary) => self.walk_expr(&unary.arg),
            Expr::Cond(cond) => {
                self.walk_expr(&cond.test);
                self.walk_expr(&cond.cons);
                self.walk_expr(&cond.alt);
            }
            Expr::Assign(assign) => self.walk_expr(&assign.right),
            Expr::Member(member) => self.walk_expr(&member.obj),
            Expr::OptChain(opt) => match &*opt.base {
                swc_ecma_ast::OptChainBase::Member(member) => self.walk_expr(&member.obj),
                swc_ecma_ast::OptChainBase::Call(call) => {
                    self.walk_expr(&call.callee);
                    for arg in &call.args {
                        self.walk_expr(&arg.expr);
                    }
                }
            },
            Expr::Paren(paren) => self.walk_expr(&paren.expr),
            Expr::Seq(seq) => {
                for inner in &seq.exprs {
                    self.walk_expr(inner);
                }
            }
            Expr::Await(await_expr) => self.walk_expr(&await_expr.arg),
            Expr::Object(object) => {
                for prop in &object.props {
                    match prop {
                        PropOrSpread::Spread(spread) => self.walk_expr(&spread.expr),
                        PropOrSpread::Prop(prop) => match &**prop {
                            Prop::KeyValue(kv) => self.walk_expr(&kv.value),
                            Prop::Getter(getter) => {
                                if let Some(block) = &getter.body {
                                    for stmt in &block.stmts {
                                        self.walk_stmt(stmt);
                                    }
                                }
                            }
                            _ => {}
                        },
                    }
                }
            }
            Expr::Array(array) => {
                for elem in array.elems.iter().flatten() {
                    self.walk_expr(&elem.expr);
                }
            }
            Expr::Tpl(tpl) => {
                for inner in &tpl.exprs {
                    self.walk_expr(inner);
                }
            }
            Expr::TaggedTpl(tagged) => {
                for inner in &tagged.tpl.exprs {
                    self.walk_expr(inner);
                }
            }
            Expr::JSXElement(element) => self.walk_jsx_element(element),
            Expr::JSXFragment(fragment) => self.walk_jsx_fragment(fragment),
            Expr::TsAs(e) => self.walk_expr(&e.expr),
            Expr::TsNonNull(e) => self.walk_expr(&e.expr),
            Expr::TsConstAssertion(e) => self.walk_expr(&e.expr),
            Expr::TsTypeAssertion(e) => self.walk_expr(&e.expr),
            Expr::TsSatisfies(e) => self.walk_expr(&e.expr),
            _ => {}
        }
    }

    // ============================================================
    // JSX
    // ============================================================

    fn walk_jsx_element(&mut self, element: &'a JSXElement) {
        let target = self.jsx_target(&element.opening.name);
        let (line, col) = self.line_col(element.span);

        let mut attrs = Vec::new();
        for attr in &element.opening.attrs {
            let JSXAttrOrSpread::JSXAttr(attr) = attr else {
                continue;
            };
            let name = match &attr.name {
                JSXAttrName::Ident(ident) => ident.sym.to_string(),
                JSXAttrName::JSXNamespacedName(ns) => {
                    format!("{}:{}", ns.ns.sym, ns.name.sym)
                }
            };
            let (attr_line, attr_col) = self.line_col(attr.span);
            let value = match &attr.value {
                Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                    JSXExpr::Expr(expr) => Some(&**expr),
                    JSXExpr::JSXEmptyExpr(_) => None,
                },
                _ => None,
            };
            attrs.push(JsxAttrUse {
                name,
                value,
                line: attr_line,
                col: attr_col,
            });
        }

        self.jsx.push(JsxUsage {
            target,
            component: self.owner.clone(),
            attrs,
            line,
            col,
        });

        // Attribute expressions and children may contain hooks and more JSX.
        for attr in &element.opening.attrs {
            match attr {
                JSXAttrOrSpread::JSXAttr(attr) => {
                    if let Some(JSXAttrValue::JSXExprContainer(container)) = &attr.value
                        && let JSXExpr::Expr(expr) = &container.expr
                    {
                        self.walk_expr(expr);
                    }
                }
                JSXAttrOrSpread::SpreadElement(spread) => self.walk_expr(&spread.expr),
            }
        }
        for child in &element.children {
            self.walk_jsx_child(child);
        }
    }

    fn walk_jsx_fragment(&mut self, fragment: &'a JSXFragment) {
        for child in &fragment.children {
            self.walk_jsx_child(child);
        }
    }

    fn walk_jsx_child(&mut self, child: &'a swc_ecma_ast::JSXElementChild) {
        use swc_ecma_ast::JSXElementChild;
        match child {
            JSXElementChild::JSXElement(element) => self.walk_jsx_element(element),
            JSXElementChild::JSXFragment(fragment) => self.walk_jsx_fragment(fragment),
            JSXElementChild::JSXExprContainer(container) => {
                if let JSXExpr::Expr(expr) = &container.expr {
                    self.walk_expr(expr);
                }
            }
            _ => {}
        }
    }

    fn jsx_target(&self, name: &JSXElementName) -> JsxTarget {
        match name {
            JSXElementName::Ident(ident) => {
                let name = ident.sym.to_string();
                if is_component_name(&name) {
                    JsxTarget::Component { name }
                } else {
                    JsxTarget::Lowercase
                }
            }
            JSXElementName::JSXMemberExpr(member) => {
                let object = match &member.obj {
                    JSXObject::Ident(ident) => ident.sym.to_string(),
                    JSXObject::JSXMemberExpr(_) => return JsxTarget::Lowercase,
                };
                if member.prop.sym.as_str() == "Provider" {
                    JsxTarget::ContextProvider { context: object }
                } else {
                    JsxTarget::Component {
                        name: format!("{}.{}", object, member.prop.sym),
                    }
                }
            }
            JSXElementName::JSXNamespacedName(_) => JsxTarget::Lowercase,
        }
    }

    // ============================================================
    // Hook occurrences
    // ============================================================

    fn record_hook(&mut self, call: &'a CallExpr, callee: String, kind: HookKind) {
        let (line, col) = self.line_col(call.span);
        let callback = kind
            .callback_arg_index()
            .and_then(|index| call.args.get(index))
            .map(|arg| &*arg.expr);
        let deps = kind.dep_arg_index().and_then(|index| {
            call.args.get(index).map(|arg| match unwrap_expr(&arg.expr) {
                Expr::Array(array) => array
                    .elems
                    .iter()
                    .flatten()
                    .map(|elem| self.make_dep(&elem.expr))
                    .collect(),
                other => vec![self.make_dep_of_form(other, DepForm::Other)],
            })
        });

        self.hooks.push(HookOccurrence {
            kind,
            callee,
            component: self.owner.clone(),
            line,
            col,
            call,
            callback,
            deps,
        });
    }

    fn make_dep(&self, expr: &'a Expr) -> Dep<'a> {
        let form = match unwrap_expr(expr) {
            Expr::Ident(_) => DepForm::Identifier,
            Expr::Member(_) | Expr::OptChain(_) => DepForm::Member,
            Expr::Call(_) => DepForm::Call,
            Expr::Lit(_) | Expr::Tpl(_) => DepForm::Literal,
            _ => DepForm::Other,
        };
        self.make_dep_of_form(expr, form)
    }

    fn make_dep_of_form(&self, expr: &'a Expr, form: DepForm) -> Dep<'a> {
        Dep {
            expr,
            text: self.snippet(expr.span()),
            root: member_root(unwrap_expr(expr)),
            form,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::Config;
    use crate::core::oracle::NullOracle;
    use crate::core::parser::parse_source;

    fn parsed(code: &str) -> ParsedFile {
        let policy = Config::default().compile().unwrap();
        parse_source("./test.tsx", code.to_string(), &policy, &NullOracle, false).unwrap()
    }

    #[test]
    fn test_collects_hook_with_callback_and_deps() {
        let file = parsed(
            "function App() {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => { setX(1); }, [x]);\n\
               return null;\n\
             }\n",
        );
        let collected = collect(&file);
        let effect = collected
            .hooks
            .iter()
            .find(|h| h.kind == HookKind::Effect)
            .unwrap();
        assert!(effect.callback.is_some());
        let deps = effect.deps.as_ref().unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].root.as_deref(), Some("x"));
        assert_eq!(effect.component.as_deref(), Some("App"));
    }

    #[test]
    fn test_absent_vs_empty_deps() {
        let file = parsed(
            "function App() {\n\
               useEffect(() => {});\n\
               useEffect(() => {}, []);\n\
               return null;\n\
             }\n",
        );
        let collected = collect(&file);
        assert!(collected.hooks[0].deps.is_none());
        assert_eq!(collected.hooks[1].deps.as_ref().unwrap().len(), 0);
    }

    #[test]
    fn test_jsx_targets() {
        let file = parsed(
            "const ThemeContext = createContext(null);\n\
             function App() {\n\
               const style = { color: \"red\" };\n\
               return (\n\
                 <ThemeContext.Provider value={style}>\n\
                   <Button onClick={() => {}} label=\"hi\" />\n\
                   <div onMouseOver={() => {}} />\n\
                 </ThemeContext.Provider>\n\
               );\n\
             }\n",
        );
        let collected = collect(&file);
        assert_eq!(collected.jsx.len(), 3);
        assert_eq!(
            collected.jsx[0].target,
            JsxTarget::ContextProvider {
                context: "ThemeContext".to_string()
            }
        );
        assert_eq!(
            collected.jsx[1].target,
            JsxTarget::Component {
                name: "Button".to_string()
            }
        );
        assert_eq!(collected.jsx[2].target, JsxTarget::Lowercase);

        // Expression values kept, string literals dropped.
        let button = &collected.jsx[1];
        let on_click = button.attrs.iter().find(|a| a.name == "onClick").unwrap();
        assert!(on_click.value.is_some());
        let label = button.attrs.iter().find(|a| a.name == "label").unwrap();
        assert!(label.value.is_none());
    }

    #[test]
    fn test_component_bodies_include_memo_wrapped() {
        let file = parsed(
            "import { memo } from \"react\";\n\
             function App() { return null; }\n\
             const Button = memo(() => <button />);\n\
             const helper = () => 1;\n",
        );
        let collected = collect(&file);
        let names: Vec<&str> = collected
            .components
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["App", "Button"]);
    }

    #[test]
    fn test_get_snapshot_callback_position() {
        let file = parsed(
            "function App() {\n\
               const snap = useSyncExternalStore(subscribe, () => ({ a: 1 }));\n\
               return null;\n\
             }\n",
        );
        let collected = collect(&file);
        let store = collected
            .hooks
            .iter()
            .find(|h| h.kind == HookKind::SyncExternalStore)
            .unwrap();
        // The tracked callback is the second argument (getSnapshot).
        assert!(store.callback.is_some());
        assert!(matches!(
            unwrap_expr(store.callback.unwrap()),
            Expr::Arrow(_)
        ));
    }
}
