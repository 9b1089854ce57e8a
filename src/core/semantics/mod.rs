//! Per-file semantic model.
//!
//! One extractor pass (see [`extractor`]) turns an AST into a [`FileSummary`]:
//! component boundaries, state bindings, hook call sites, the variable
//! stability table, imports/exports, created contexts, memoized component
//! names, and enough local function info to follow setter calls through
//! helper functions and across files. Summaries are published once and read
//! immutably by every later phase.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

pub mod extractor;
pub mod stability;

pub use extractor::extract_summary;
pub use stability::StabilityClass;

// ============================================================
// Hooks
// ============================================================

/// The framework hooks the analyzer models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HookKind {
    State,
    Reducer,
    Effect,
    LayoutEffect,
    Memo,
    Callback,
    ImperativeHandle,
    SyncExternalStore,
    Ref,
    Context,
}

impl HookKind {
    /// Map a bare hook name (`useEffect`, not `React.useEffect`) to its kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "useState" => Some(Self::State),
            "useReducer" => Some(Self::Reducer),
            "useEffect" => Some(Self::Effect),
            "useLayoutEffect" | "useInsertionEffect" => Some(Self::LayoutEffect),
            "useMemo" => Some(Self::Memo),
            "useCallback" => Some(Self::Callback),
            "useImperativeHandle" => Some(Self::ImperativeHandle),
            "useSyncExternalStore" => Some(Self::SyncExternalStore),
            "useRef" => Some(Self::Ref),
            "useContext" => Some(Self::Context),
            _ => None,
        }
    }

    /// Argument index of the dependency list, when the hook takes one.
    pub fn dep_arg_index(self) -> Option<usize> {
        match self {
            Self::Effect | Self::LayoutEffect | Self::Memo | Self::Callback => Some(1),
            Self::ImperativeHandle => Some(2),
            _ => None,
        }
    }

    /// Argument index of the main callback body, when the hook takes one.
    pub fn callback_arg_index(self) -> Option<usize> {
        match self {
            Self::Effect | Self::LayoutEffect | Self::Memo | Self::Callback => Some(0),
            Self::ImperativeHandle | Self::SyncExternalStore => Some(1),
            _ => None,
        }
    }

    pub fn is_effect(self) -> bool {
        matches!(self, Self::Effect | Self::LayoutEffect)
    }

    pub fn is_memoizing(self) -> bool {
        matches!(self, Self::Memo | Self::Callback | Self::ImperativeHandle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Reducer => "reducer",
            Self::Effect => "effect",
            Self::LayoutEffect => "layout_effect",
            Self::Memo => "memo",
            Self::Callback => "callback",
            Self::ImperativeHandle => "imperative_handle",
            Self::SyncExternalStore => "sync_external_store",
            Self::Ref => "ref",
            Self::Context => "context",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Does this name follow the hook naming pattern (`use` + upper-case)?
pub fn is_hook_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| c.is_ascii_uppercase())
}

/// Components are named by convention: a capitalized identifier.
pub fn is_component_name(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_ascii_uppercase())
}

// ============================================================
// Imports and exports
// ============================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    Default,
    Named(String),
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub local: String,
    pub imported: ImportedName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    pub specifier: String,
    pub line: usize,
    pub bindings: Vec<ImportBinding>,
}

/// `export { X as Y } from "./mod"` carries the source module and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReExport {
    pub specifier: String,
    pub source: ImportedName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Name inside this module; `None` for anonymous default exports.
    pub local_name: Option<String>,
    pub exported_name: String,
    pub is_default: bool,
    /// True when the export's initializer matches a memoization wrapper.
    pub is_memoized_component: bool,
    pub line: usize,
    pub reexport: Option<ReExport>,
}

// ============================================================
// Components, state, hook sites
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    NamedFunction,
    ArrowVariable,
    FunctionExpression,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub kind: ComponentKind,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclaringHook {
    State,
    Reducer,
}

/// `[value, setter] = useState(...)`. For reducer bindings the second tuple
/// element (the dispatch) is recorded as the setter regardless of its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateBinding {
    pub name: String,
    pub setter_name: String,
    pub declaring_hook: DeclaringHook,
    pub component: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefBinding {
    pub name: String,
    pub component: Option<String>,
}

/// Syntactic form of a dependency-list entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepForm {
    Identifier,
    Member,
    Call,
    Literal,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepEntry {
    /// Textual form used in reports (e.g. `user.profile.id`).
    pub text: String,
    /// Root identifier for stability lookups (`user` for `user.profile.id`).
    pub root: Option<String>,
    pub form: DepForm,
}

/// A hook call site as recorded in the summary.
///
/// `deps: None` means the dependency argument is absent, which is distinct
/// from `Some(vec![])` (present but empty).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookSite {
    pub kind: HookKind,
    pub callee: String,
    pub component: Option<String>,
    pub line: usize,
    pub col: usize,
    pub deps: Option<Vec<DepEntry>>,
}

// ============================================================
// Local functions (for transitive setter flow)
// ============================================================

/// A parameter forwarded into another call: `f(x)` inside `g(a, x)` records
/// which argument slot of which callee receives which of our parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamForward {
    pub callee: String,
    pub arg_index: usize,
    pub param_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: String,
    pub params: Vec<String>,
    pub line: usize,
    /// Names this function calls directly (setters, helpers, imports).
    pub calls: Vec<String>,
    /// Indexes of own parameters invoked as functions in the body.
    pub invoked_params: BTreeSet<usize>,
    pub forwarded_params: Vec<ParamForward>,
}

// ============================================================
// Stability table
// ============================================================

/// Name → stability class, scoped per component with a module-scope fallback.
#[derive(Debug, Clone, Default)]
pub struct StabilityTable {
    module: BTreeMap<String, StabilityClass>,
    components: BTreeMap<String, BTreeMap<String, StabilityClass>>,
}

impl StabilityTable {
    pub fn insert_module(&mut self, name: impl Into<String>, class: StabilityClass) {
        self.module.insert(name.into(), class);
    }

    pub fn insert_component(
        &mut self,
        component: &str,
        name: impl Into<String>,
        class: StabilityClass,
    ) {
        self.components
            .entry(component.to_string())
            .or_default()
            .insert(name.into(), class);
    }

    /// Component scope first, then module scope.
    pub fn lookup(&self, component: Option<&str>, name: &str) -> Option<&StabilityClass> {
        if let Some(component) = component
            && let Some(scope) = self.components.get(component)
            && let Some(class) = scope.get(name)
        {
            return Some(class);
        }
        self.module.get(name)
    }

    pub fn module_scope(&self) -> &BTreeMap<String, StabilityClass> {
        &self.module
    }
}

// ============================================================
// File summary
// ============================================================

/// The per-file semantic summary: everything later phases need without
/// touching the AST again, published once and immutable afterwards.
#[derive(Debug, Default)]
pub struct FileSummary {
    pub path: String,
    pub imports: Vec<Import>,
    pub exports: Vec<Export>,
    pub components: Vec<Component>,
    pub hooks: Vec<HookSite>,
    pub state_bindings: Vec<StateBinding>,
    pub ref_bindings: Vec<RefBinding>,
    pub stability: StabilityTable,
    pub created_contexts: BTreeSet<String>,
    pub memoized_components: BTreeSet<String>,
    /// useMemo/useCallback variable → dependency roots of the memoizing hook.
    pub memo_dep_roots: BTreeMap<String, Vec<String>>,
    pub functions: BTreeMap<String, FunctionInfo>,
    /// Local names bound to the framework namespace (e.g. `React`).
    pub namespace_imports: BTreeSet<String>,
}

impl FileSummary {
    /// Find the state binding whose setter (or dispatch) has this name.
    pub fn binding_for_setter(&self, component: Option<&str>, setter: &str) -> Option<&StateBinding> {
        self.state_bindings
            .iter()
            .find(|b| b.setter_name == setter && component_matches(&b.component, component))
    }

    /// Find a state binding by its value name.
    pub fn state_binding(&self, component: Option<&str>, name: &str) -> Option<&StateBinding> {
        self.state_bindings
            .iter()
            .find(|b| b.name == name && component_matches(&b.component, component))
    }

    pub fn is_ref_name(&self, component: Option<&str>, name: &str) -> bool {
        self.ref_bindings
            .iter()
            .any(|r| r.name == name && component_matches(&r.component, component))
    }

    /// The import binding that introduced `local`, if any.
    pub fn import_of(&self, local: &str) -> Option<(&Import, &ImportBinding)> {
        self.imports.iter().find_map(|import| {
            import
                .bindings
                .iter()
                .find(|b| b.local == local)
                .map(|b| (import, b))
        })
    }

    /// The export with this exported name, if any.
    pub fn export_named(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.exported_name == name)
    }

    pub fn default_export(&self) -> Option<&Export> {
        self.exports.iter().find(|e| e.is_default)
    }
}

/// Binding scope check: a binding scoped to a component matches only that
/// component; a module-scoped binding matches anywhere in the file.
fn component_matches(binding: &Option<String>, component: Option<&str>) -> bool {
    match binding {
        Some(owner) => component == Some(owner.as_str()),
        None => true,
    }
}
