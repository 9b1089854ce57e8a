//! Module graph: import resolution and file-level cycle detection.
//!
//! Resolution order for a specifier: alias table, then relative join
//! against the importer's directory, then the extension search
//! (`.tsx/.ts/.jsx/.js`), then `/index.*`, then the directory's package
//! manifest (`exports` → `main`). Bare package specifiers are external and
//! ignored. Unresolvable imports are treated as external, never raised.
//!
//! Cycles: a DFS with a recursion stack emits one `IMPORT-CYCLE` per edge
//! that closes a cycle; Tarjan's SCC pass emits one `CROSS-FILE-CYCLE` per
//! strongly-connected component. Mutual imports that bind a created context
//! or a named function additionally produce advisory diagnostics.

use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Component, Path, PathBuf},
    sync::Arc,
};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticKind, SourceLocation};

use crate::core::semantics::FileSummary;

const SOURCE_EXTENSIONS: &[&str] = &["tsx", "ts", "jsx", "js"];

/// Alias table plus the root it is anchored to.
pub struct ResolverOptions<'a> {
    pub aliases: &'a BTreeMap<String, String>,
    pub project_root: &'a Path,
}

/// Resolve a relative or alias-mapped import specifier to a file path.
pub fn resolve_specifier(
    importer: &Path,
    specifier: &str,
    options: &ResolverOptions<'_>,
) -> Option<String> {
    // Longest alias prefix wins.
    let mut aliases: Vec<(&String, &String)> = options.aliases.iter().collect();
    aliases.sort_by_key(|(prefix, _)| std::cmp::Reverse(prefix.len()));
    for (prefix, replacement) in aliases {
        if let Some(rest) = specifier.strip_prefix(prefix.as_str()) {
            let candidate = options.project_root.join(replacement).join(rest);
            return resolve_candidate(&candidate);
        }
    }

    if specifier.starts_with('.') {
        let base = importer.parent()?;
        let candidate = base.join(specifier);
        return resolve_candidate(&candidate);
    }

    // Bare package specifier: external.
    None
}

fn resolve_candidate(candidate: &Path) -> Option<String> {
    let candidate = normalize_path(candidate);

    if candidate.is_file() {
        return Some(candidate.to_string_lossy().to_string());
    }

    for ext in SOURCE_EXTENSIONS {
        let with_ext = PathBuf::from(format!("{}.{}", candidate.display(), ext));
        if with_ext.is_file() {
            return Some(with_ext.to_string_lossy().to_string());
        }
    }

    if candidate.is_dir() {
        for ext in SOURCE_EXTENSIONS {
            let index = candidate.join(format!("index.{}", ext));
            if index.is_file() {
                return Some(index.to_string_lossy().to_string());
            }
        }
        if let Some(manifest_entry) = manifest_entry_point(&candidate) {
            let entry = normalize_path(&candidate.join(manifest_entry));
            if entry.is_file() {
                return Some(entry.to_string_lossy().to_string());
            }
        }
    }

    None
}

/// Read the entry point out of a directory's package manifest:
/// `exports` (string or `{".": ...}`) first, then `main`.
fn manifest_entry_point(dir: &Path) -> Option<String> {
    let manifest = fs::read_to_string(dir.join("package.json")).ok()?;
    let json: serde_json::Value = serde_json::from_str(&manifest).ok()?;

    if let Some(exports) = json.get("exports") {
        if let Some(entry) = exports.as_str() {
            return Some(entry.to_string());
        }
        if let Some(dot) = exports.get(".") {
            if let Some(entry) = dot.as_str() {
                return Some(entry.to_string());
            }
            for key in ["import", "default", "require"] {
                if let Some(entry) = dot.get(key).and_then(|v| v.as_str()) {
                    return Some(entry.to_string());
                }
            }
        }
    }

    json.get("main")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !result.pop() {
                    result.push(Component::ParentDir);
                }
            }
            other => result.push(other),
        }
    }
    result
}

/// Metadata carried on each resolved import edge.
#[derive(Debug, Clone)]
pub struct ImportEdge {
    pub specifier: String,
    pub line: usize,
}

/// File-level import graph, built once after Phase 1 and read-only after.
pub struct ModuleGraph {
    graph: DiGraph<String, ImportEdge>,
    nodes: HashMap<String, NodeIndex>,
    /// (importer, specifier) → resolved in-project path.
    resolved: HashMap<(String, String), String>,
}

impl ModuleGraph {
    pub fn build(
        summaries: &BTreeMap<String, Arc<FileSummary>>,
        options: &ResolverOptions<'_>,
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        let mut resolved = HashMap::new();

        for path in summaries.keys() {
            nodes.insert(path.clone(), graph.add_node(path.clone()));
        }

        for (path, summary) in summaries {
            let importer_index = nodes[path];
            for import in &summary.imports {
                let Some(target) =
                    resolve_specifier(Path::new(path), &import.specifier, options)
                else {
                    continue;
                };
                // Imports that resolve outside the analyzed set are external.
                let Some(&target_index) = nodes.get(&target) else {
                    continue;
                };
                resolved.insert((path.clone(), import.specifier.clone()), target.clone());
                graph.add_edge(
                    importer_index,
                    target_index,
                    ImportEdge {
                        specifier: import.specifier.clone(),
                        line: import.line,
                    },
                );
            }
        }

        ModuleGraph {
            graph,
            nodes,
            resolved,
        }
    }

    /// Resolved target of `(importer, specifier)`, if it is in-project.
    pub fn resolved_target(&self, importer: &str, specifier: &str) -> Option<&str> {
        self.resolved
            .get(&(importer.to_string(), specifier.to_string()))
            .map(String::as_str)
    }

    pub fn resolved_imports(&self) -> &HashMap<(String, String), String> {
        &self.resolved
    }

    /// `IMPORT-CYCLE` diagnostics: one per edge that closes a cycle.
    pub fn import_cycles(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut visited: HashMap<NodeIndex, bool> = HashMap::new();
        let mut order: Vec<(&String, &NodeIndex)> = self.nodes.iter().collect();
        order.sort_by_key(|(path, _)| path.as_str());

        for (_, &start) in order {
            if visited.contains_key(&start) {
                continue;
            }
            let mut stack: Vec<NodeIndex> = Vec::new();
            self.cycle_dfs(start, &mut stack, &mut visited, &mut diagnostics);
        }
        diagnostics
    }

    fn cycle_dfs(
        &self,
        node: NodeIndex,
        stack: &mut Vec<NodeIndex>,
        visited: &mut HashMap<NodeIndex, bool>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        visited.insert(node, true);
        stack.push(node);

        let mut neighbors: Vec<(NodeIndex, &ImportEdge)> = self
            .graph
            .edges(node)
            .map(|edge| (edge.target(), edge.weight()))
            .collect();
        neighbors.sort_by_key(|(target, _)| self.graph[*target].clone());

        for (target, edge) in neighbors {
            if let Some(position) = stack.iter().position(|&n| n == target) {
                // Edge closing a cycle: report the loop as seen from its
                // first file.
                let mut cycle: Vec<String> =
                    stack[position..].iter().map(|&n| self.graph[n].clone()).collect();
                cycle.push(self.graph[target].clone());
                let importer = self.graph[node].clone();
                let explanation = format!("Import cycle detected: {}", cycle.join(" -> "));
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::ImportCycle,
                        Category::Critical,
                        SourceLocation::new(importer, edge.line),
                        explanation,
                    )
                    .with_kind(DiagnosticKind::PotentialIssue)
                    .with_suggestion(
                        "Break the cycle by moving shared code into a module neither file imports",
                    )
                    .with_cycle(cycle),
                );
                continue;
            }
            if !visited.contains_key(&target) {
                self.cycle_dfs(target, stack, visited, diagnostics);
            }
        }

        stack.pop();
    }

    /// `CROSS-FILE-CYCLE` diagnostics: one per strongly-connected component.
    pub fn cross_file_cycles(&self) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for component in tarjan_scc(&self.graph) {
            let is_cycle = component.len() > 1
                || (component.len() == 1
                    && self.graph.contains_edge(component[0], component[0]));
            if !is_cycle {
                continue;
            }
            let mut members: Vec<String> = component
                .iter()
                .map(|&index| self.graph[index].clone())
                .collect();
            members.sort();
            let location = SourceLocation::new(members[0].clone(), 1);
            let explanation = format!(
                "Strongly-connected import group of {} files: {}",
                members.len(),
                members.join(", ")
            );
            diagnostics.push(
                Diagnostic::new(
                    DiagnosticCode::CrossFileCycle,
                    Category::Warning,
                    location,
                    explanation,
                )
                .with_cycle(members),
            );
        }
        diagnostics.sort();
        diagnostics
    }

    /// Advisory diagnostics for mutual imports that bind a created context
    /// or a named function on at least one side.
    pub fn advisory_cycles(
        &self,
        summaries: &BTreeMap<String, Arc<FileSummary>>,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for ((importer, specifier), target) in &self.resolved {
            if importer >= target {
                continue;
            }
            // Mutual import?
            let back = self
                .resolved
                .iter()
                .any(|((from, _), to)| from == target && to == importer);
            if !back {
                continue;
            }
            let Some(importer_summary) = summaries.get(importer) else {
                continue;
            };
            let Some(target_summary) = summaries.get(target) else {
                continue;
            };
            let Some(import) = importer_summary
                .imports
                .iter()
                .find(|i| &i.specifier == specifier)
            else {
                continue;
            };

            let mut context_binding = None;
            let mut function_binding = None;
            for binding in &import.bindings {
                let source_name = match &binding.imported {
                    super::semantics::ImportedName::Named(name) => name.as_str(),
                    _ => continue,
                };
                if target_summary.created_contexts.contains(source_name) {
                    context_binding.get_or_insert(source_name.to_string());
                }
                if target_summary.functions.contains_key(source_name) {
                    function_binding.get_or_insert(source_name.to_string());
                }
            }

            if let Some(name) = context_binding {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::ContextCycle,
                        Category::Warning,
                        SourceLocation::new(importer.clone(), import.line),
                        format!(
                            "Mutually-importing files share the context \"{}\"; \
                             provider updates can ping-pong between them",
                            name
                        ),
                    )
                    .with_severity(crate::diagnostics::Severity::Low)
                    .with_confidence(crate::diagnostics::Confidence::Low)
                    .with_cycle(vec![importer.clone(), target.clone(), importer.clone()]),
                );
            }
            if let Some(name) = function_binding {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticCode::FunctionCallCycle,
                        Category::Warning,
                        SourceLocation::new(importer.clone(), import.line),
                        format!(
                            "Mutually-importing files call across the cycle through \"{}\"",
                            name
                        ),
                    )
                    .with_severity(crate::diagnostics::Severity::Low)
                    .with_confidence(crate::diagnostics::Confidence::Low)
                    .with_cycle(vec![importer.clone(), target.clone(), importer.clone()]),
                );
            }
        }

        diagnostics.sort();
        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::config::Config;
    use crate::core::oracle::NullOracle;
    use crate::core::parser::parse_source;

    fn summarize_files(files: &[(&str, &str)], dir: &Path) -> BTreeMap<String, Arc<FileSummary>> {
        let policy = Config::default().compile().unwrap();
        let mut summaries = BTreeMap::new();
        for (name, content) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            let path_str = path.to_string_lossy().to_string();
            let parsed = parse_source(
                &path_str,
                content.to_string(),
                &policy,
                &NullOracle,
                false,
            )
            .unwrap();
            summaries.insert(path_str, parsed.summary);
        }
        summaries
    }

    fn graph_for(
        files: &[(&str, &str)],
        dir: &Path,
        aliases: BTreeMap<String, String>,
    ) -> (ModuleGraph, BTreeMap<String, Arc<FileSummary>>) {
        let summaries = summarize_files(files, dir);
        let options = ResolverOptions {
            aliases: &aliases,
            project_root: dir,
        };
        let graph = ModuleGraph::build(&summaries, &options);
        (graph, summaries)
    }

    #[test]
    fn test_relative_resolution_with_extension_search() {
        let dir = tempdir().unwrap();
        let (graph, _) = graph_for(
            &[
                ("a.tsx", "import { b } from \"./b\";\nexport const a = 1;\n"),
                ("b.tsx", "export const b = 1;\n"),
            ],
            dir.path(),
            BTreeMap::new(),
        );
        let a = dir.path().join("a.tsx").to_string_lossy().to_string();
        let target = graph.resolved_target(&a, "./b").unwrap();
        assert!(target.ends_with("b.tsx"));
    }

    #[test]
    fn test_index_resolution() {
        let dir = tempdir().unwrap();
        let (graph, _) = graph_for(
            &[
                ("a.tsx", "import { w } from \"./widgets\";\n"),
                ("widgets/index.ts", "export const w = 1;\n"),
            ],
            dir.path(),
            BTreeMap::new(),
        );
        let a = dir.path().join("a.tsx").to_string_lossy().to_string();
        let target = graph.resolved_target(&a, "./widgets").unwrap();
        assert!(target.ends_with("widgets/index.ts"));
    }

    #[test]
    fn test_alias_resolution() {
        let dir = tempdir().unwrap();
        let mut aliases = BTreeMap::new();
        aliases.insert("@/".to_string(), "src/".to_string());
        let (graph, _) = graph_for(
            &[
                ("app.tsx", "import { util } from \"@/lib/util\";\n"),
                ("src/lib/util.ts", "export const util = 1;\n"),
            ],
            dir.path(),
            aliases,
        );
        let app = dir.path().join("app.tsx").to_string_lossy().to_string();
        let target = graph.resolved_target(&app, "@/lib/util").unwrap();
        assert!(target.ends_with("src/lib/util.ts"));
    }

    #[test]
    fn test_package_manifest_resolution() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(
            dir.path().join("pkg/package.json"),
            r#"{ "main": "./entry.ts" }"#,
        )
        .unwrap();
        let (graph, _) = graph_for(
            &[
                ("a.tsx", "import { e } from \"./pkg\";\n"),
                ("pkg/entry.ts", "export const e = 1;\n"),
            ],
            dir.path(),
            BTreeMap::new(),
        );
        let a = dir.path().join("a.tsx").to_string_lossy().to_string();
        let target = graph.resolved_target(&a, "./pkg").unwrap();
        assert!(target.ends_with("pkg/entry.ts"));
    }

    #[test]
    fn test_bare_specifiers_are_external() {
        let dir = tempdir().unwrap();
        let (graph, _) = graph_for(
            &[("a.tsx", "import React from \"react\";\n")],
            dir.path(),
            BTreeMap::new(),
        );
        let a = dir.path().join("a.tsx").to_string_lossy().to_string();
        assert!(graph.resolved_target(&a, "react").is_none());
        assert!(graph.import_cycles().is_empty());
    }

    #[test]
    fn test_two_file_cycle() {
        let dir = tempdir().unwrap();
        let (graph, _) = graph_for(
            &[
                ("a.tsx", "import { b } from \"./b\";\nexport const a = 1;\n"),
                ("b.tsx", "import { a } from \"./a\";\nexport const b = 1;\n"),
            ],
            dir.path(),
            BTreeMap::new(),
        );

        let cycles = graph.import_cycles();
        assert_eq!(cycles.len(), 1);
        let cycle = cycles[0].cycle.as_ref().unwrap();
        assert_eq!(cycle.len(), 3);
        assert_eq!(cycle[0], cycle[2]);
        assert!(cycle[0].ends_with("a.tsx"));
        assert!(cycle[1].ends_with("b.tsx"));

        let sccs = graph.cross_file_cycles();
        assert_eq!(sccs.len(), 1);
        assert_eq!(sccs[0].cycle.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycles() {
        let dir = tempdir().unwrap();
        let (graph, _) = graph_for(
            &[
                ("a.tsx", "import { b } from \"./b\";\n"),
                ("b.tsx", "import { c } from \"./c\";\n"),
                ("c.tsx", "export const c = 1;\n"),
            ],
            dir.path(),
            BTreeMap::new(),
        );
        assert!(graph.import_cycles().is_empty());
        assert!(graph.cross_file_cycles().is_empty());
    }

    #[test]
    fn test_context_cycle_advisory() {
        let dir = tempdir().unwrap();
        let (graph, summaries) = graph_for(
            &[
                (
                    "a.tsx",
                    "import { ThemeContext } from \"./b\";\nexport const a = 1;\n",
                ),
                (
                    "b.tsx",
                    "import { a } from \"./a\";\n\
                     import { createContext } from \"react\";\n\
                     export const ThemeContext = createContext(null);\n",
                ),
            ],
            dir.path(),
            BTreeMap::new(),
        );
        let advisories = graph.advisory_cycles(&summaries);
        assert!(advisories
            .iter()
            .any(|d| d.code == DiagnosticCode::ContextCycle));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/x/./a/../b.ts")),
            PathBuf::from("/x/b.ts")
        );
    }
}
