//! Single-pass semantic extraction.
//!
//! One traversal per file computes the whole [`FileSummary`]: component
//! boundaries, state/ref bindings, hook call sites (with dependency-list
//! fidelity), the stability table, created contexts, memoized component
//! names, imports/exports, and local function flow info. A lexical scope
//! stack keeps shadowed names from leaking between scopes.

use std::collections::HashMap;

use swc_common::{SourceMap, SourceMapper, Spanned};
use swc_ecma_ast::{
    ArrowExpr, CallExpr, DefaultDecl, Expr, FnDecl, Function, ImportSpecifier, Module,
    ModuleExportName, ObjectPatProp, Pat, VarDecl, VarDeclarator,
};
use swc_ecma_visit::{Visit, VisitWith};

use crate::config::HookPolicy;
use crate::core::oracle::TypeOracle;

use super::stability::{Classifier, StabilityClass, callee_parts, member_root, unwrap_expr};
use super::{
    Component, ComponentKind, DeclaringHook, DepEntry, DepForm, Export, FileSummary, FunctionInfo,
    HookKind, HookSite, Import, ImportBinding, ImportedName, ParamForward, ReExport, RefBinding,
    StateBinding, is_component_name, is_hook_name,
};

/// Extract the semantic summary for one parsed module.
pub fn extract_summary(
    path: &str,
    module: &Module,
    source_map: &SourceMap,
    policy: &HookPolicy,
    oracle: &dyn TypeOracle,
    strict_mode: bool,
) -> FileSummary {
    let mut extractor = Extractor {
        path,
        source_map,
        policy,
        oracle,
        strict_mode,
        summary: FileSummary {
            path: path.to_string(),
            ..Default::default()
        },
        scopes: vec![HashMap::new()],
        owner: None,
        nested_depth: 0,
    };
    module.visit_with(&mut extractor);
    extractor.finish()
}

struct Extractor<'a> {
    path: &'a str,
    source_map: &'a SourceMap,
    policy: &'a HookPolicy,
    oracle: &'a dyn TypeOracle,
    strict_mode: bool,
    summary: FileSummary,
    /// Lexical scope stack for stability lookups; index 0 is module scope.
    scopes: Vec<HashMap<String, StabilityClass>>,
    /// Enclosing component or custom hook, for attribution.
    owner: Option<String>,
    /// Function nesting below the owner's own body (0 = owner body).
    nested_depth: usize,
}

impl<'a> Extractor<'a> {
    fn finish(mut self) -> FileSummary {
        // Exports can precede the declaration they name, so the memoized
        // flag is resolved after the walk.
        let memoized = self.summary.memoized_components.clone();
        for export in &mut self.summary.exports {
            if let Some(local) = &export.local_name
                && memoized.contains(local)
            {
                export.is_memoized_component = true;
            }
        }
        self.summary
    }

    fn line_col(&self, span: swc_common::Span) -> (usize, usize) {
        let loc = self.source_map.lookup_char_pos(span.lo);
        (loc.line, loc.col_display + 1)
    }

    fn snippet(&self, span: swc_common::Span) -> String {
        self.source_map.span_to_snippet(span).unwrap_or_default()
    }

    // ============================================================
    // Scope handling
    // ============================================================

    fn enter_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    fn lookup_class(&self, name: &str) -> Option<StabilityClass> {
        for scope in self.scopes.iter().rev() {
            if let Some(class) = scope.get(name) {
                return Some(class.clone());
            }
        }
        None
    }

    /// Record a binding in the innermost scope, mirroring it into the
    /// summary table when it sits in component-body or module scope.
    fn record_class(&mut self, name: &str, class: StabilityClass) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), class.clone());
        }
        match (&self.owner, self.nested_depth) {
            (Some(owner), 0) => {
                let owner = owner.clone();
                self.summary.stability.insert_component(&owner, name, class);
            }
            (None, _) if self.scopes.len() == 1 => {
                self.summary.stability.insert_module(name, class);
            }
            _ => {}
        }
    }

    fn classify_expr(&self, expr: &Expr) -> StabilityClass {
        let lookup = |name: &str| self.lookup_class(name);
        let classifier = Classifier {
            policy: self.policy,
            oracle: self.oracle,
            strict_mode: self.strict_mode,
            file_path: self.path,
            lookup: &lookup,
        };
        classifier.classify(expr)
    }

    // ============================================================
    // Hook recognition
    // ============================================================

    fn is_framework_namespace(&self, name: &str) -> bool {
        name == "React" || self.summary.namespace_imports.contains(name)
    }

    /// Recognize a framework hook call, namespaced or bare.
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

    /// Recognize a memoization component wrapper call (`memo(X)`).
    fn is_wrapper_call(&self, call: &CallExpr) -> bool {
        let Some((object, name)) = callee_parts(&call.callee) else {
            return false;
        };
        self.policy.is_wrapper(&name)
            && match object {
                None => true,
                Some(ns) => self.is_framework_namespace(&ns),
            }
    }

    fn is_create_context_call(&self, call: &CallExpr) -> bool {
        let Some((object, name)) = callee_parts(&call.callee) else {
            return false;
        };
        name == "createContext"
            && match object {
                None => true,
                Some(ns) => self.is_framework_namespace(&ns),
            }
    }

    fn dep_entries(&self, call: &CallExpr, kind: HookKind) -> Option<Vec<DepEntry>> {
        let index = kind.dep_arg_index()?;
        let arg = call.args.get(index)?;
        match unwrap_expr(&arg.expr) {
            Expr::Array(array) => Some(
                array
                    .elems
                    .iter()
                    .flatten()
                    .map(|elem| self.dep_entry(&elem.expr))
                    .collect(),
            ),
            // A non-literal dependency argument is present but opaque.
            other => Some(vec![self.dep_entry_of_form(other, DepForm::Other)]),
        }
    }

    fn dep_entry(&self, expr: &Expr) -> DepEntry {
        let form = match unwrap_expr(expr) {
            Expr::Ident(_) => DepForm::Identifier,
            Expr::Member(_) | Expr::OptChain(_) => DepForm::Member,
            Expr::Call(_) => DepForm::Call,
            Expr::Lit(_) | Expr::Tpl(_) => DepForm::Literal,
            _ => DepForm::Other,
        };
        self.dep_entry_of_form(expr, form)
    }

    fn dep_entry_of_form(&self, expr: &Expr, form: DepForm) -> DepEntry {
        DepEntry {
            text: self.snippet(expr.span()),
            root: member_root(unwrap_expr(expr)),
            form,
        }
    }

    fn record_hook_site(&mut self, call: &CallExpr, callee: String, kind: HookKind) {
        let (line, col) = self.line_col(call.span);
        let deps = self.dep_entries(call, kind);
        self.summary.hooks.push(HookSite {
            kind,
            callee,
            component: self.owner.clone(),
            line,
            col,
            deps,
        });
    }

    // ============================================================
    // Declarations
    // ============================================================

    /// Enter a named function body: a component, a custom hook, or a helper.
    fn walk_owned_function<F>(&mut self, name: &str, walk: F)
    where
        F: FnOnce(&mut Self),
    {
        let becomes_owner =
            self.owner.is_none() && (is_component_name(name) || is_hook_name(name));
        let prev_owner = self.owner.clone();
        let prev_depth = self.nested_depth;

        if becomes_owner {
            self.owner = Some(name.to_string());
            self.nested_depth = 0;
        } else {
            self.nested_depth += 1;
        }
        self.enter_scope();
        walk(self);
        self.exit_scope();
        self.owner = prev_owner;
        self.nested_depth = prev_depth;
    }

    fn record_component(&mut self, name: &str, kind: ComponentKind, span: swc_common::Span) {
        let start_line = self.source_map.lookup_char_pos(span.lo).line;
        let end_line = self.source_map.lookup_char_pos(span.hi).line;
        self.summary.components.push(Component {
            name: name.to_string(),
            kind,
            start_line,
            end_line,
        });
    }

    /// Collect call-flow facts for a named function.
    fn record_function_info(&mut self, name: &str, params: Vec<String>, body: FnBody<'_>, line: usize) {
        let mut flow = FnFlowCollector {
            params: &params,
            calls: Vec::new(),
            invoked_params: Default::default(),
            forwarded_params: Vec::new(),
        };
        match body {
            FnBody::Function(function) => {
                if let Some(block) = &function.body {
                    block.visit_with(&mut flow);
                }
            }
            FnBody::Arrow(arrow) => arrow.body.visit_with(&mut flow),
        }
        let calls = flow.calls;
        let invoked_params = flow.invoked_params;
        let forwarded_params = flow.forwarded_params;
        self.summary.functions.insert(
            name.to_string(),
            FunctionInfo {
                name: name.to_string(),
                params,
                line,
                calls,
                invoked_params,
                forwarded_params,
            },
        );
    }

    /// Handle one `const`/`let` declarator.
    fn handle_declarator(&mut self, decl: &VarDeclarator) {
        let Some(init) = &decl.init else {
            // Uninitialized binding: nothing syntactically evident.
            decl.name.visit_with(self);
            return;
        };
        let init_expr = unwrap_expr(init);

        match &decl.name {
            Pat::Ident(binding) => {
                let name = binding.id.sym.to_string();
                self.handle_named_init(&name, init_expr, decl);
            }
            Pat::Array(array_pat) => {
                self.handle_array_destructure(array_pat, init_expr);
            }
            Pat::Object(object_pat) => {
                self.handle_object_destructure(object_pat, init_expr);
            }
            _ => {
                init_expr.visit_with(self);
            }
        }
    }

    fn handle_named_init(&mut self, name: &str, init: &Expr, decl: &VarDeclarator) {
        let (line, _) = self.line_col(decl.span);

        match init {
            Expr::Arrow(arrow) => {
                if self.owner.is_none() && is_component_name(name) {
                    self.record_component(name, ComponentKind::ArrowVariable, arrow.span);
                }
                self.record_class(name, StabilityClass::UnstableFunction);
                self.record_function_info(name, arrow_params(arrow), FnBody::Arrow(arrow), line);
                self.walk_owned_function(name, |this| {
                    arrow.visit_children_with(this);
                });
                return;
            }
            Expr::Fn(fn_expr) => {
                if self.owner.is_none() && is_component_name(name) {
                    self.record_component(name, ComponentKind::FunctionExpression, fn_expr.function.span);
                }
                self.record_class(name, StabilityClass::UnstableFunction);
                self.record_function_info(
                    name,
                    function_params(&fn_expr.function),
                    FnBody::Function(&fn_expr.function),
                    line,
                );
                self.walk_owned_function(name, |this| {
                    fn_expr.function.visit_children_with(this);
                });
                return;
            }
            Expr::Call(call) => {
                if self.is_create_context_call(call) {
                    self.summary.created_contexts.insert(name.to_string());
                    self.record_class(name, StabilityClass::Stable);
                    return;
                }
                if self.is_wrapper_call(call) {
                    self.summary.memoized_components.insert(name.to_string());
                    if self.owner.is_none() && is_component_name(name) {
                        self.record_component(name, ComponentKind::ArrowVariable, call.span);
                    }
                    self.record_class(name, StabilityClass::Stable);
                    // The wrapped render function still gets analyzed.
                    self.walk_owned_function(name, |this| {
                        call.visit_children_with(this);
                    });
                    return;
                }
                if let Some((callee, kind)) = self.framework_hook(call) {
                    self.handle_named_hook_result(name, call, &callee, kind);
                    return;
                }

                let class = self.classify_expr(init);
                self.record_class(name, class);
                call.visit_children_with(self);
                return;
            }
            _ => {}
        }

        let class = self.classify_expr(init);
        self.record_class(name, class);
        init.visit_with(self);
    }

    /// `const value = useRef()/useMemo()/useContext()/...` with a plain name.
    fn handle_named_hook_result(
        &mut self,
        name: &str,
        call: &CallExpr,
        callee: &str,
        kind: HookKind,
    ) {
        self.record_hook_site(call, callee.to_string(), kind);

        match kind {
            HookKind::Ref => {
                self.summary.ref_bindings.push(RefBinding {
                    name: name.to_string(),
                    component: self.owner.clone(),
                });
                self.record_class(name, StabilityClass::Stable);
            }
            HookKind::Memo | HookKind::Callback => {
                self.record_class(name, StabilityClass::MemoizedByWrapper(kind));
                let roots: Vec<String> = self
                    .dep_entries(call, kind)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|entry| entry.root)
                    .collect();
                self.summary.memo_dep_roots.insert(name.to_string(), roots);
            }
            _ => {
                self.record_class(name, StabilityClass::Stable);
            }
        }

        for arg in &call.args {
            arg.expr.visit_with(self);
        }
    }

    /// `[value, setter] = useState(...)` and general array destructuring.
    fn handle_array_destructure(&mut self, pat: &swc_ecma_ast::ArrayPat, init: &Expr) {
        if let Expr::Call(call) = init
            && let Some((callee, kind)) = self.framework_hook(call)
        {
            self.record_hook_site(call, callee, kind);

            if matches!(kind, HookKind::State | HookKind::Reducer) {
                let value = pat.elems.first().and_then(|e| e.as_ref()).and_then(pat_ident);
                let setter = pat.elems.get(1).and_then(|e| e.as_ref()).and_then(pat_ident);

                if let Some(value) = &value {
                    self.record_class(value, StabilityClass::Stable);
                }
                if let Some(setter_name) = &setter {
                    self.record_class(setter_name, StabilityClass::SetterFromTrackedHook);
                }
                if let (Some(value), Some(setter_name)) = (value, setter) {
                    self.summary.state_bindings.push(StateBinding {
                        name: value,
                        setter_name,
                        declaring_hook: match kind {
                            HookKind::Reducer => DeclaringHook::Reducer,
                            _ => DeclaringHook::State,
                        },
                        component: self.owner.clone(),
                    });
                }
            } else {
                let class = self.classify_expr(init);
                self.propagate_to_pat_names(&Pat::Array(pat.clone()), class);
            }
            for arg in &call.args {
                arg.expr.visit_with(self);
            }
            return;
        }

        let class = self.classify_expr(init);
        self.propagate_to_pat_names(&Pat::Array(pat.clone()), class);
        init.visit_with(self);
    }

    fn handle_object_destructure(&mut self, pat: &swc_ecma_ast::ObjectPat, init: &Expr) {
        if let Expr::Call(call) = init
            && let Some((callee, kind)) = self.framework_hook(call)
        {
            self.record_hook_site(call, callee, kind);
            let class = self.classify_expr(init);
            self.propagate_to_pat_names(&Pat::Object(pat.clone()), class);
            for arg in &call.args {
                arg.expr.visit_with(self);
            }
            return;
        }
        let class = self.classify_expr(init);
        self.propagate_to_pat_names(&Pat::Object(pat.clone()), class);
        init.visit_with(self);
    }

    /// Destructuring from an unstable source marks every bound name
    /// unstable; a stable source marks them stable.
    fn propagate_to_pat_names(&mut self, pat: &Pat, class: StabilityClass) {
        let propagated = if class.is_unstable(self.policy.unknown_hooks_are_unstable()) {
            class
        } else {
            StabilityClass::Stable
        };
        for name in binding_names(pat) {
            self.record_class(&name, propagated.clone());
        }
    }
}

enum FnBody<'a> {
    Function(&'a Function),
    Arrow(&'a ArrowExpr),
}

fn pat_ident(pat: &Pat) -> Option<String> {
    match pat {
        Pat::Ident(ident) => Some(ident.id.sym.to_string()),
        Pat::Assign(assign) => pat_ident(&assign.left),
        _ => None,
    }
}

/// All identifier names bound by a pattern.
fn binding_names(pat: &Pat) -> Vec<String> {
    let mut names = Vec::new();
    collect_binding_names(pat, &mut names);
    names
}

fn collect_binding_names(pat: &Pat, out: &mut Vec<String>) {
    match pat {
        Pat::Ident(ident) => out.push(ident.id.sym.to_string()),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                collect_binding_names(elem, out);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_binding_names(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(assign.key.sym.to_string()),
                    ObjectPatProp::Rest(rest) => collect_binding_names(&rest.arg, out),
                }
            }
        }
        Pat::Assign(assign) => collect_binding_names(&assign.left, out),
        Pat::Rest(rest) => collect_binding_names(&rest.arg, out),
        _ => {}
    }
}

fn arrow_params(arrow: &ArrowExpr) -> Vec<String> {
    arrow
        .params
        .iter()
        .map(|p| pat_ident(p).unwrap_or_default())
        .collect()
}

fn function_params(function: &Function) -> Vec<String> {
    function
        .params
        .iter()
        .map(|p| pat_ident(&p.pat).unwrap_or_default())
        .collect()
}

impl<'a> Visit for Extractor<'a> {
    fn visit_import_decl(&mut self, node: &swc_ecma_ast::ImportDecl) {
        let Some(specifier) = node.src.value.as_str() else {
            return;
        };
        let (line, _) = self.line_col(node.span);

        let mut bindings = Vec::new();
        for spec in &node.specifiers {
            match spec {
                ImportSpecifier::Default(default) => {
                    let local = default.local.sym.to_string();
                    if specifier == "react" {
                        self.summary.namespace_imports.insert(local.clone());
                    }
                    bindings.push(ImportBinding {
                        local,
                        imported: ImportedName::Default,
                    });
                }
                ImportSpecifier::Named(named) => {
                    let imported = match &named.imported {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                        Some(ModuleExportName::Str(s)) => {
                            s.value.as_str().unwrap_or_default().to_string()
                        }
                        None => named.local.sym.to_string(),
                    };
                    bindings.push(ImportBinding {
                        local: named.local.sym.to_string(),
                        imported: ImportedName::Named(imported),
                    });
                }
                ImportSpecifier::Namespace(ns) => {
                    let local = ns.local.sym.to_string();
                    if specifier == "react" {
                        self.summary.namespace_imports.insert(local.clone());
                    }
                    bindings.push(ImportBinding {
                        local,
                        imported: ImportedName::Namespace,
                    });
                }
            }
        }

        self.summary.imports.push(Import {
            specifier: specifier.to_string(),
            line,
            bindings,
        });
    }

    fn visit_export_decl(&mut self, node: &swc_ecma_ast::ExportDecl) {
        let (line, _) = self.line_col(node.span);
        match &node.decl {
            swc_ecma_ast::Decl::Fn(fn_decl) => {
                let name = fn_decl.ident.sym.to_string();
                self.summary.exports.push(Export {
                    local_name: Some(name.clone()),
                    exported_name: name,
                    is_default: false,
                    is_memoized_component: false,
                    line,
                    reexport: None,
                });
            }
            swc_ecma_ast::Decl::Var(var) => {
                for decl in &var.decls {
                    for name in binding_names(&decl.name) {
                        self.summary.exports.push(Export {
                            local_name: Some(name.clone()),
                            exported_name: name,
                            is_default: false,
                            is_memoized_component: false,
                            line,
                            reexport: None,
                        });
                    }
                }
            }
            _ => {}
        }
        node.visit_children_with(self);
    }

    fn visit_named_export(&mut self, node: &swc_ecma_ast::NamedExport) {
        let (line, _) = self.line_col(node.span);
        let specifier = node
            .src
            .as_ref()
            .and_then(|s| s.value.as_str().map(str::to_string));

        for spec in &node.specifiers {
            if let swc_ecma_ast::ExportSpecifier::Named(named) = spec {
                let orig = match &named.orig {
                    ModuleExportName::Ident(ident) => ident.sym.to_string(),
                    ModuleExportName::Str(s) => s.value.as_str().unwrap_or_default().to_string(),
                };
                let exported = match &named.exported {
                    Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                    Some(ModuleExportName::Str(s)) => {
                        s.value.as_str().unwrap_or_default().to_string()
                    }
                    None => orig.clone(),
                };
                let reexport = specifier.as_ref().map(|spec| ReExport {
                    specifier: spec.clone(),
                    source: if orig == "default" {
                        ImportedName::Default
                    } else {
                        ImportedName::Named(orig.clone())
                    },
                });
                self.summary.exports.push(Export {
                    local_name: (reexport.is_none()).then(|| orig.clone()),
                    exported_name: exported,
                    is_default: false,
                    is_memoized_component: false,
                    line,
                    reexport,
                });
            }
        }
    }

    fn visit_export_default_decl(&mut self, node: &swc_ecma_ast::ExportDefaultDecl) {
        let (line, _) = self.line_col(node.span);
        if let DefaultDecl::Fn(fn_expr) = &node.decl {
            let name = fn_expr
                .ident
                .as_ref()
                .map(|i| i.sym.to_string())
                .unwrap_or_else(|| "default".to_string());

            if is_component_name(&name) && self.owner.is_none() {
                self.record_component(&name, ComponentKind::NamedFunction, fn_expr.function.span);
            }
            self.summary.exports.push(Export {
                local_name: fn_expr.ident.as_ref().map(|i| i.sym.to_string()),
                exported_name: "default".to_string(),
                is_default: true,
                is_memoized_component: false,
                line,
                reexport: None,
            });

            self.record_function_info(
                &name,
                function_params(&fn_expr.function),
                FnBody::Function(&fn_expr.function),
                line,
            );
            self.walk_owned_function(&name, |this| {
                fn_expr.function.visit_children_with(this);
            });
            return;
        }
        node.visit_children_with(self);
    }

    fn visit_export_default_expr(&mut self, node: &swc_ecma_ast::ExportDefaultExpr) {
        let (line, _) = self.line_col(node.span);
        let expr = unwrap_expr(&node.expr);

        let mut export = Export {
            local_name: None,
            exported_name: "default".to_string(),
            is_default: true,
            is_memoized_component: false,
            line,
            reexport: None,
        };

        match expr {
            Expr::Ident(ident) => {
                export.local_name = Some(ident.sym.to_string());
            }
            Expr::Call(call) if self.is_wrapper_call(call) => {
                export.is_memoized_component = true;
                if let Some(arg) = call.args.first()
                    && let Expr::Ident(ident) = unwrap_expr(&arg.expr)
                {
                    export.local_name = Some(ident.sym.to_string());
                    self.summary
                        .memoized_components
                        .insert(ident.sym.to_string());
                }
            }
            _ => {}
        }

        self.summary.exports.push(export);
        node.visit_children_with(self);
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        let name = node.ident.sym.to_string();
        let (line, _) = self.line_col(node.function.span);

        if self.owner.is_none() && is_component_name(&name) {
            self.record_component(&name, ComponentKind::NamedFunction, node.function.span);
        }
        self.record_class(&name, StabilityClass::UnstableFunction);
        self.record_function_info(
            &name,
            function_params(&node.function),
            FnBody::Function(&node.function),
            line,
        );

        self.walk_owned_function(&name, |this| {
            node.function.visit_children_with(this);
        });
    }

    fn visit_var_decl(&mut self, node: &VarDecl) {
        for decl in &node.decls {
            self.handle_declarator(decl);
        }
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        // Anonymous nested function (callback, inline handler).
        self.nested_depth += 1;
        self.enter_scope();
        node.visit_children_with(self);
        self.exit_scope();
        self.nested_depth -= 1;
    }

    fn visit_function(&mut self, node: &Function) {
        self.nested_depth += 1;
        self.enter_scope();
        node.visit_children_with(self);
        self.exit_scope();
        self.nested_depth -= 1;
    }

    fn visit_call_expr(&mut self, node: &CallExpr) {
        // Hook calls not captured by a declarator (bare `useEffect(...)`).
        if let Some((callee, kind)) = self.framework_hook(node)
            && self.owner.is_some()
        {
            self.record_hook_site(node, callee, kind);
        }
        node.visit_children_with(self);
    }
}

// ============================================================
// Function flow collection
// ============================================================

/// Collects call-flow facts inside one function body: which names are
/// called, which own parameters are invoked, and which are forwarded into
/// other calls.
struct FnFlowCollector<'a> {
    params: &'a [String],
    calls: Vec<String>,
    invoked_params: std::collections::BTreeSet<usize>,
    forwarded_params: Vec<ParamForward>,
}

impl<'a> Visit for FnFlowCollector<'a> {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Some((_, name)) = callee_parts(&node.callee) {
            if let Some(index) = self.params.iter().position(|p| p == &name) {
                self.invoked_params.insert(index);
            } else {
                self.calls.push(name.clone());
                for (arg_index, arg) in node.args.iter().enumerate() {
                    if let Expr::Ident(ident) = unwrap_expr(&arg.expr)
                        && let Some(param_index) =
                            self.params.iter().position(|p| p == ident.sym.as_str())
                    {
                        self.forwarded_params.push(ParamForward {
                            callee: name.clone(),
                            arg_index,
                            param_index,
                        });
                    }
                }
            }
        }
        node.visit_children_with(self);
    }
}
