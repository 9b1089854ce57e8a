//! Analysis orchestrator.
//!
//! Drives the four phases: parallel parse+extract over candidate files
//! (with the digest-keyed cache), the single-threaded module graph, the
//! parallel per-file rule pass reading other files' summaries through the
//! read-only project index, and final assembly into a deterministic
//! [`RunResult`]. Parallelism is capped at logical cores minus one unless
//! configured; a cooperative cancellation token is honored at file
//! boundaries.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use anyhow::{Context as _, Result};
use rayon::prelude::*;

use crate::config::{Config, HookPolicy};
use crate::core::assembler::assemble;
use crate::core::cache::ParseCache;
use crate::core::module_graph::{ModuleGraph, ResolverOptions};
use crate::core::oracle::{NullOracle, TypeOracle};
use crate::core::parser::{ParsedFile, content_digest, parse_source};
use crate::core::propagate::ProjectIndex;
use crate::core::rules::analyze_file;
use crate::core::scanner::discover;
use crate::diagnostics::{Category, Diagnostic, RunResult, RunSummary};

/// Cooperative cancellation, checked at file boundaries only.
#[derive(Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

struct ParsePhase {
    files: BTreeMap<String, Arc<ParsedFile>>,
    /// Unparseable or unreadable files, skipped without aborting the run.
    skipped: usize,
}

/// Owns the pipeline: configuration, the parsed-file cache, the module
/// graph, and the thread pool.
pub struct AnalysisContext {
    config: Config,
    policy: HookPolicy,
    root: PathBuf,
    verbose: bool,
    files: Vec<String>,
    scan_skipped: usize,
    cache: ParseCache,
    oracle: Box<dyn TypeOracle>,
    cancel: CancellationToken,
    pool: rayon::ThreadPool,
    parsed: OnceLock<ParsePhase>,
    graph: OnceLock<ModuleGraph>,
    project: OnceLock<ProjectIndex>,
}

impl AnalysisContext {
    pub fn new(config: Config, root: &Path, verbose: bool) -> Result<Self> {
        Self::with_oracle(config, root, verbose, Box::new(NullOracle))
    }

    /// Attach an external type-checker bridge (used under `strictMode`).
    pub fn with_oracle(
        config: Config,
        root: &Path,
        verbose: bool,
        oracle: Box<dyn TypeOracle>,
    ) -> Result<Self> {
        config.validate()?;
        let policy = config.compile()?;

        let root_str = root
            .to_str()
            .with_context(|| format!("Invalid analysis root: {:?}", root))?;
        let scan = discover(root_str, &config.includes, &config.ignores, verbose);
        if verbose {
            eprintln!("Discovered {} candidate file(s)", scan.files.len());
        }

        let threads = config.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1).max(1))
                .unwrap_or(1)
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("Failed to build analysis thread pool")?;

        Ok(Self {
            config,
            policy,
            root: root.to_path_buf(),
            verbose,
            files: scan.files,
            scan_skipped: scan.skipped_count,
            cache: ParseCache::new(),
            oracle,
            cancel: CancellationToken::new(),
            pool,
            parsed: OnceLock::new(),
            graph: OnceLock::new(),
            project: OnceLock::new(),
        })
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn candidate_files(&self) -> &[String] {
        &self.files
    }

    // ============================================================
    // Phase 1: parse + extract (parallel)
    // ============================================================

    fn parsed(&self) -> &ParsePhase {
        self.parsed.get_or_init(|| {
            let results: Vec<(String, Option<Arc<ParsedFile>>)> = self.pool.install(|| {
                self.files
                    .par_iter()
                    .map(|path| (path.clone(), self.parse_one(path)))
                    .collect()
            });

            let mut files = BTreeMap::new();
            let mut skipped = 0;
            for (path, parsed) in results {
                match parsed {
                    Some(parsed) => {
                        files.insert(path, parsed);
                    }
                    None => skipped += 1,
                }
            }
            if self.verbose {
                eprintln!("Parsed {} file(s), skipped {}", files.len(), skipped);
            }
            ParsePhase { files, skipped }
        })
    }

    /// One file is one unit of work: read, cache check, parse, extract.
    fn parse_one(&self, path: &str) -> Option<Arc<ParsedFile>> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let code = match std::fs::read_to_string(path) {
            Ok(code) => code,
            Err(err) => {
                if self.verbose {
                    eprintln!("Warning: {} - {}", path, err);
                }
                return None;
            }
        };
        let size = code.len() as u64;
        let digest = content_digest(&code);
        if let Some(hit) = self.cache.lookup(path, size, digest) {
            return Some(hit);
        }

        match parse_source(
            path,
            code,
            &self.policy,
            self.oracle.as_ref(),
            self.config.strict_mode,
        ) {
            Ok(parsed) => {
                let parsed = Arc::new(parsed);
                self.cache.insert(parsed.clone());
                Some(parsed)
            }
            Err(err) => {
                if self.verbose {
                    eprintln!("Warning: {}", err);
                }
                None
            }
        }
    }

    // ============================================================
    // Phase 2: module graph (single-threaded)
    // ============================================================

    fn module_graph(&self) -> &ModuleGraph {
        self.graph.get_or_init(|| {
            let parsed = self.parsed();
            let summaries: BTreeMap<String, Arc<crate::core::semantics::FileSummary>> = parsed
                .files
                .iter()
                .map(|(path, file)| (path.clone(), file.summary.clone()))
                .collect();
            let project_root = self
                .config
                .project_root
                .clone()
                .unwrap_or_else(|| self.root.clone());
            let options = ResolverOptions {
                aliases: &self.config.aliases,
                project_root: &project_root,
            };
            ModuleGraph::build(&summaries, &options)
        })
    }

    fn project_index(&self) -> &ProjectIndex {
        self.project.get_or_init(|| {
            let parsed = self.parsed();
            let graph = self.module_graph();
            ProjectIndex {
                summaries: parsed
                    .files
                    .iter()
                    .map(|(path, file)| (path.clone(), file.summary.clone()))
                    .collect(),
                resolved_imports: graph.resolved_imports().clone(),
            }
        })
    }

    // ============================================================
    // Phases 3 + 4: rules and assembly
    // ============================================================

    /// Run the full pipeline and produce the deterministic result.
    pub fn run(&self) -> Result<RunResult> {
        let parsed = self.parsed();
        let graph = self.module_graph();
        let project = self.project_index();

        let mut raw: Vec<Diagnostic> = Vec::new();
        raw.extend(graph.import_cycles());
        raw.extend(graph.cross_file_cycles());
        raw.extend(graph.advisory_cycles(&project.summaries));

        let rule_output: Vec<Vec<Diagnostic>> = self.pool.install(|| {
            parsed
                .files
                .par_iter()
                .map(|(_, file)| {
                    if self.cancel.is_cancelled() {
                        return Vec::new();
                    }
                    analyze_file(file, project, &self.config, &self.policy, self.verbose)
                })
                .collect()
        });
        for mut diagnostics in rule_output {
            raw.append(&mut diagnostics);
        }

        let suppressions: HashMap<String, &crate::core::suppressions::SuppressionTable> = parsed
            .files
            .iter()
            .map(|(path, file)| (path.clone(), &file.suppressions))
            .collect();
        let kept = assemble(raw, &suppressions, &self.config);

        let mut result = RunResult {
            import_cycles: Vec::new(),
            cross_file_cycles: Vec::new(),
            hook_diagnostics: Vec::new(),
            summary: RunSummary {
                files_analyzed: parsed.files.len(),
                files_skipped: self.scan_skipped + parsed.skipped,
                hooks_analyzed: parsed
                    .files
                    .values()
                    .map(|file| file.summary.hooks.len())
                    .sum(),
                ..Default::default()
            },
        };

        for diagnostic in kept {
            match diagnostic.category {
                Category::Critical => result.summary.critical_count += 1,
                Category::Warning => result.summary.warning_count += 1,
                Category::Performance => result.summary.performance_count += 1,
            }
            match diagnostic.code {
                crate::diagnostics::DiagnosticCode::ImportCycle => {
                    result.import_cycles.push(diagnostic)
                }
                crate::diagnostics::DiagnosticCode::CrossFileCycle => {
                    result.cross_file_cycles.push(diagnostic)
                }
                _ => result.hook_diagnostics.push(diagnostic),
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;
    use crate::diagnostics::DiagnosticCode;

    fn write(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    fn run_in(dir: &Path) -> RunResult {
        let context = AnalysisContext::new(Config::default(), dir, false).unwrap();
        context.run().unwrap()
    }

    #[test]
    fn test_end_to_end_effect_loop() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "Counter.tsx",
            "import { useEffect, useState } from \"react\";\n\
             export function Counter() {\n\
               const [x, setX] = useState(0);\n\
               useEffect(() => {\n\
                 setX(x + 1);\n\
               }, [x]);\n\
               return null;\n\
             }\n",
        );

        let result = run_in(dir.path());
        assert_eq!(result.hook_diagnostics.len(), 1);
        assert_eq!(
            result.hook_diagnostics[0].code,
            DiagnosticCode::EffectUnconditionalWrite
        );
        assert_eq!(result.summary.files_analyzed, 1);
        assert_eq!(result.summary.critical_count, 1);
        assert!(result.has_blocking());
    }

    #[test]
    fn test_import_cycle_end_to_end() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "a.tsx",
            "import { B } from \"./b\";\nexport const A = () => <B />;\n",
        );
        write(
            dir.path(),
            "b.tsx",
            "import { A } from \"./a\";\nexport const B = () => <A />;\n",
        );

        let result = run_in(dir.path());
        assert_eq!(result.import_cycles.len(), 1);
        assert_eq!(result.cross_file_cycles.len(), 1);
        let cycle = result.import_cycles[0].cycle.as_ref().unwrap();
        assert_eq!(cycle.len(), 3);
        assert_eq!(cycle[0], cycle[2]);
    }

    #[test]
    fn test_deterministic_across_runs() {
        let dir = tempdir().unwrap();
        for i in 0..4 {
            write(
                dir.path(),
                &format!("C{}.tsx", i),
                "import { useEffect, useState } from \"react\";\n\
                 export function Widget() {\n\
                   const cfg = { id: 1 };\n\
                   const [x, setX] = useState(0);\n\
                   useEffect(() => { setX(x + 1); }, [x, cfg]);\n\
                   return null;\n\
                 }\n",
            );
        }

        let first = run_in(dir.path());
        let second = run_in(dir.path());
        assert_eq!(first, second);
        let paths: Vec<&str> = first
            .hook_diagnostics
            .iter()
            .map(|d| d.location.file_path.as_str())
            .collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_parse_failure_skips_file_and_continues() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "broken.tsx",
            "import { useState } from \"react\";\nconst = ;\n",
        );
        write(
            dir.path(),
            "Fine.tsx",
            "import { useState } from \"react\";\n\
             export function Fine() {\n\
               const [x, setX] = useState(0);\n\
               setX(1);\n\
               return null;\n\
             }\n",
        );

        let result = run_in(dir.path());
        assert_eq!(result.summary.files_analyzed, 1);
        assert_eq!(result.summary.files_skipped, 1);
        assert_eq!(result.hook_diagnostics.len(), 1);
        assert_eq!(
            result.hook_diagnostics[0].code,
            DiagnosticCode::RenderPhaseSetState
        );
    }

    #[test]
    fn test_cache_reuses_parsed_files() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "App.tsx",
            "import { useState } from \"react\";\nexport function App() { return null; }\n",
        );

        let context = AnalysisContext::new(Config::default(), dir.path(), false).unwrap();
        context.run().unwrap();
        assert_eq!(context.cache.len(), 1);

        // Repeated runs on the same context serve parses from the cache.
        let before = context.cache.len();
        context.run().unwrap();
        assert_eq!(context.cache.len(), before);
    }

    #[test]
    fn test_cancellation_stops_at_file_boundaries() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "App.tsx",
            "import { useState } from \"react\";\nexport function App() { return null; }\n",
        );

        let context = AnalysisContext::new(Config::default(), dir.path(), false).unwrap();
        context.cancellation_token().cancel();
        let result = context.run().unwrap();
        assert_eq!(result.summary.files_analyzed, 0);
    }

    #[test]
    fn test_suppression_marker_end_to_end() {
        let dir = tempdir().unwrap();
        write(
            dir.path(),
            "App.tsx",
            "import { useEffect, useState } from \"react\";\n\
             export function App() {\n\
               const [x, setX] = useState(0);\n\
               // rld-disable-next-line\n\
               useEffect(() => { setX(x + 1); }, [x]);\n\
               return null;\n\
             }\n",
        );

        let result = run_in(dir.path());
        assert!(result.hook_diagnostics.is_empty());
    }
}
