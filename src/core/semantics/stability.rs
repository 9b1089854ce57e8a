//! Referential stability classification.
//!
//! Every local binding whose initializer is syntactically evident gets a
//! [`StabilityClass`]. Dependency-list entries and JSX attribute values are
//! later judged by these classes: an `UnstableObject` in a dependency list
//! re-triggers the hook every render.

use swc_ecma_ast::{Callee, Expr, MemberProp};

use crate::config::{HookPolicy, HookVerdict};
use crate::core::oracle::{TypeDescription, TypeOracle};

use super::{HookKind, is_hook_name};

/// Array methods that produce a fresh array per call.
const FRESH_ARRAY_METHODS: &[&str] = &["map", "filter", "concat", "slice", "flat", "flatMap"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StabilityClass {
    /// Referentially stable across renders.
    Stable,
    /// Fresh object literal (or equivalent) per render.
    UnstableObject,
    /// Fresh array per render.
    UnstableArray,
    /// Fresh closure per render.
    UnstableFunction,
    /// Result of calling an unknown or unstable function.
    UnstableCall,
    /// Derived primitive: new each render but compared by value.
    PrimitiveDerived,
    /// Wrapped by a memoization hook; stable while its inputs are.
    MemoizedByWrapper(HookKind),
    /// A setter or dispatch returned by a tracked state hook.
    SetterFromTrackedHook,
    /// Return value of an unrecognized custom hook; policy decides.
    UnknownHookReturn,
}

impl StabilityClass {
    /// Is this class a re-render trigger when used as a dependency?
    ///
    /// `unknown_unstable` applies the configured policy for unknown custom
    /// hook returns.
    pub fn is_unstable(&self, unknown_unstable: bool) -> bool {
        match self {
            StabilityClass::UnstableObject
            | StabilityClass::UnstableArray
            | StabilityClass::UnstableFunction
            | StabilityClass::UnstableCall => true,
            StabilityClass::UnknownHookReturn => unknown_unstable,
            _ => false,
        }
    }
}

// ============================================================
// Shared AST helpers
// ============================================================

/// Strip parentheses and TypeScript assertion wrappers.
pub fn unwrap_expr(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unwrap_expr(&paren.expr),
        Expr::TsAs(e) => unwrap_expr(&e.expr),
        Expr::TsNonNull(e) => unwrap_expr(&e.expr),
        Expr::TsConstAssertion(e) => unwrap_expr(&e.expr),
        Expr::TsTypeAssertion(e) => unwrap_expr(&e.expr),
        Expr::TsSatisfies(e) => unwrap_expr(&e.expr),
        Expr::TsInstantiation(e) => unwrap_expr(&e.expr),
        _ => expr,
    }
}

/// Split a callee into (object, name): `useEffect` → (None, "useEffect"),
/// `React.useEffect` → (Some("React"), "useEffect").
///
/// The object side is `None` ONLY for a bare identifier callee. Method
/// calls on non-identifier receivers (`fetch().then`, `a.b.c.map`) report
/// the receiver's root identifier, or a placeholder when there is none, so
/// callers can tell method calls from plain calls.
pub fn callee_parts(callee: &Callee) -> Option<(Option<String>, String)> {
    let Callee::Expr(expr) = callee else {
        return None;
    };
    match unwrap_expr(expr) {
        Expr::Ident(ident) => Some((None, ident.sym.to_string())),
        Expr::Member(member) => {
            let MemberProp::Ident(prop) = &member.prop else {
                return None;
            };
            let object = match unwrap_expr(&member.obj) {
                Expr::Ident(obj) => obj.sym.to_string(),
                other => member_root(other).unwrap_or_else(|| "<expr>".to_string()),
            };
            Some((Some(object), prop.sym.to_string()))
        }
        _ => None,
    }
}

/// Root identifier of a member chain: `a.b.c` → `a`, `a?.b` → `a`.
pub fn member_root(expr: &Expr) -> Option<String> {
    match unwrap_expr(expr) {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) => member_root(&member.obj),
        Expr::OptChain(opt) => match &*opt.base {
            swc_ecma_ast::OptChainBase::Member(member) => member_root(&member.obj),
            swc_ecma_ast::OptChainBase::Call(call) => member_root(&call.callee),
        },
        Expr::This(_) => None,
        _ => None,
    }
}

// ============================================================
// Classifier
// ============================================================

/// Classification environment for one declaration site.
pub struct Classifier<'a> {
    pub policy: &'a HookPolicy,
    pub oracle: &'a dyn TypeOracle,
    pub strict_mode: bool,
    pub file_path: &'a str,
    /// Stability of already-classified bindings in the enclosing scopes.
    pub lookup: &'a dyn Fn(&str) -> Option<StabilityClass>,
}

impl<'a> Classifier<'a> {
    /// Classify an initializer (or inline) expression.
    pub fn classify(&self, expr: &Expr) -> StabilityClass {
        let expr = unwrap_expr(expr);
        match expr {
            Expr::Object(_) | Expr::JSXElement(_) | Expr::JSXFragment(_) => {
                StabilityClass::UnstableObject
            }
            Expr::Array(_) => StabilityClass::UnstableArray,
            Expr::Arrow(_) | Expr::Fn(_) => StabilityClass::UnstableFunction,
            Expr::Lit(_) => StabilityClass::PrimitiveDerived,
            Expr::Tpl(_) => StabilityClass::PrimitiveDerived,
            Expr::Unary(_) | Expr::Bin(_) => StabilityClass::PrimitiveDerived,
            Expr::Ident(ident) => (self.lookup)(ident.sym.as_str())
                .unwrap_or(StabilityClass::Stable),
            Expr::Member(member) => member_root(&member.obj)
                .and_then(|root| (self.lookup)(&root))
                .unwrap_or(StabilityClass::Stable),
            Expr::Cond(cond) => {
                let cons = self.classify(&cond.cons);
                if cons.is_unstable(self.policy.unknown_hooks_are_unstable()) {
                    cons
                } else {
                    self.classify(&cond.alt)
                }
            }
            Expr::Await(await_expr) => self.classify(&await_expr.arg),
            Expr::Call(call) => self.classify_call(call),
            Expr::New(_) => StabilityClass::UnstableCall,
            _ => StabilityClass::Stable,
        }
    }

    fn classify_call(&self, call: &swc_ecma_ast::CallExpr) -> StabilityClass {
        let Some((object, name)) = callee_parts(&call.callee) else {
            return StabilityClass::UnstableCall;
        };

        // Fresh-array chains: items.map(...), list.filter(...)
        if object.is_some() && FRESH_ARRAY_METHODS.contains(&name.as_str()) {
            return StabilityClass::UnstableArray;
        }

        // State-store actions idiom: store.getState() and friends.
        if object.is_some() && name == "getState" {
            return StabilityClass::Stable;
        }

        // Memoization hooks keep their origin.
        if let Some(kind) = HookKind::from_name(&name)
            && kind.is_memoizing()
        {
            return StabilityClass::MemoizedByWrapper(kind);
        }

        match self.policy.verdict(&name) {
            HookVerdict::Stable => StabilityClass::Stable,
            HookVerdict::Unstable => StabilityClass::UnstableObject,
            HookVerdict::Unknown => {
                if is_hook_name(&name) {
                    self.refine_unknown_hook(call)
                } else {
                    StabilityClass::UnstableCall
                }
            }
        }
    }

    fn refine_unknown_hook(&self, call: &swc_ecma_ast::CallExpr) -> StabilityClass {
        if self.strict_mode
            && let Some(description) = self.oracle.type_of(self.file_path, call.span)
        {
            return match description {
                TypeDescription::Primitive => StabilityClass::PrimitiveDerived,
                TypeDescription::Object => StabilityClass::UnknownHookReturn,
                TypeDescription::Array => StabilityClass::UnknownHookReturn,
                TypeDescription::Function => StabilityClass::UnknownHookReturn,
                TypeDescription::Unknown => StabilityClass::UnknownHookReturn,
            };
        }
        StabilityClass::UnknownHookReturn
    }
}
