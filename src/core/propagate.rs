//! Cross-file propagation.
//!
//! Three flows cross file boundaries, all over published read-only
//! summaries: memoization flags through alias chains and re-exports,
//! setter-as-parameter flow into imported functions, and the memoized-import
//! lookup used when a component passes props to an imported component.
//! Every traversal is bounded by hop/depth limits and a visited set;
//! unresolvable references conservatively drop the flag.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use crate::core::semantics::{FileSummary, ImportedName};

/// Read-only view over every file's summary plus resolved import targets.
///
/// Published once by the orchestrator between Phase 1 and Phase 3; rules
/// borrow it, never mutate it.
pub struct ProjectIndex {
    pub summaries: BTreeMap<String, Arc<FileSummary>>,
    /// (importer path, specifier) → resolved in-project path.
    pub resolved_imports: HashMap<(String, String), String>,
}

impl ProjectIndex {
    pub fn summary(&self, path: &str) -> Option<&FileSummary> {
        self.summaries.get(path).map(Arc::as_ref)
    }

    fn resolve(&self, importer: &str, specifier: &str) -> Option<&str> {
        self.resolved_imports
            .get(&(importer.to_string(), specifier.to_string()))
            .map(String::as_str)
    }

    /// Where does `local` in `file` come from? Returns the defining file
    /// and the name it was imported under.
    fn import_source(&self, file: &str, local: &str) -> Option<(String, ImportedName)> {
        let summary = self.summary(file)?;
        let (import, binding) = summary.import_of(local)?;
        let target = self.resolve(file, &import.specifier)?;
        Some((target.to_string(), binding.imported.clone()))
    }

    /// Is `local` in `file` a memoization-wrapped component, locally or
    /// through imports and re-export chains?
    pub fn is_memoized_component(&self, file: &str, local: &str, max_hops: usize) -> bool {
        if let Some(summary) = self.summary(file)
            && summary.memoized_components.contains(local)
        {
            return true;
        }
        let Some((target, imported)) = self.import_source(file, local) else {
            return false;
        };
        self.export_is_memoized(&target, &imported, max_hops)
    }

    /// Does `file` export `name` as a memoized component (following
    /// re-export chains up to `hops`)?
    pub fn export_is_memoized(&self, file: &str, name: &ImportedName, hops: usize) -> bool {
        if hops == 0 {
            return false;
        }
        let Some(summary) = self.summary(file) else {
            return false;
        };
        let export = match name {
            ImportedName::Default => summary.default_export(),
            ImportedName::Named(exported) => summary.export_named(exported),
            ImportedName::Namespace => None,
        };
        let Some(export) = export else {
            return false;
        };
        if export.is_memoized_component {
            return true;
        }
        if let Some(reexport) = &export.reexport
            && let Some(next) = self.resolve(file, &reexport.specifier)
        {
            return self.export_is_memoized(&next.to_string(), &reexport.source, hops - 1);
        }
        false
    }

    /// Does calling `callee` (a local or imported function visible in
    /// `file`) invoke its `arg_index`-th parameter, directly or through
    /// further calls?
    ///
    /// This is the setter-as-parameter flow: when an effect passes a setter
    /// into a helper that calls it, the effect is analyzed as if it called
    /// the setter itself.
    pub fn function_invokes_param(
        &self,
        file: &str,
        callee: &str,
        arg_index: usize,
        max_hops: usize,
    ) -> bool {
        let mut visited = HashSet::new();
        self.invokes_param_inner(file, callee, arg_index, max_hops, &mut visited)
    }

    fn invokes_param_inner(
        &self,
        file: &str,
        callee: &str,
        arg_index: usize,
        hops_left: usize,
        visited: &mut HashSet<(String, String, usize)>,
    ) -> bool {
        if hops_left == 0 {
            return false;
        }
        if !visited.insert((file.to_string(), callee.to_string(), arg_index)) {
            return false;
        }

        let Some(summary) = self.summary(file) else {
            return false;
        };

        if let Some(function) = summary.functions.get(callee) {
            if function.invoked_params.contains(&arg_index) {
                return true;
            }
            for forward in &function.forwarded_params {
                if forward.param_index == arg_index
                    && self.invokes_param_inner(
                        file,
                        &forward.callee,
                        forward.arg_index,
                        hops_left - 1,
                        visited,
                    )
                {
                    return true;
                }
            }
            return false;
        }

        // Imported function: follow to its defining file.
        let Some((target, imported)) = self.import_source(file, callee) else {
            return false;
        };
        let Some(target_summary) = self.summary(&target) else {
            return false;
        };
        let defined_name = match &imported {
            ImportedName::Default => target_summary
                .default_export()
                .and_then(|e| e.local_name.clone()),
            ImportedName::Named(exported) => target_summary
                .export_named(exported)
                .and_then(|e| e.local_name.clone())
                .or_else(|| Some(exported.clone())),
            ImportedName::Namespace => None,
        };
        let Some(defined_name) = defined_name else {
            return false;
        };
        self.invokes_param_inner(&target, &defined_name, arg_index, hops_left - 1, visited)
    }
}
