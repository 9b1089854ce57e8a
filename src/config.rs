//! Analyzer configuration.
//!
//! The core consumes a fully-resolved, immutable [`Config`] value. This module
//! also carries the `.rldrc.json` loader used by the CLI collaborator: the
//! file is discovered upward from the analysis root (stopping at `.git`),
//! parsed with serde, validated, and then handed to the core as a value.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Ok, Result};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::diagnostics::{Confidence, Severity};

pub const CONFIG_FILE_NAME: &str = ".rldrc.json";

/// Directories that are never worth analyzing: dependencies, build outputs
/// and framework caches.
pub const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "**/node_modules/**",
    "**/dist/**",
    "**/build/**",
    "**/.next/**",
    "**/.turbo/**",
    "**/out/**",
    "**/coverage/**",
    "**/.git/**",
];

/// Per-function overrides for call-site classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFunction {
    /// The function's return value is referentially stable across renders.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable: Option<bool>,
    /// Callbacks passed to the function run on a deferred schedule
    /// (timer-like), not synchronously.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deferred: Option<bool>,
}

/// Policy for the return value of unknown custom hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownHookStability {
    /// Treat unknown hook returns as stable (fewer false positives).
    #[default]
    Stable,
    /// Treat unknown hook returns as unstable objects.
    Unstable,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Hook names whose return value is referentially stable.
    #[serde(default)]
    pub stable_hooks: Vec<String>,
    /// Hook names whose return value is a fresh object per render.
    #[serde(default)]
    pub unstable_hooks: Vec<String>,
    /// Regex patterns matched against hook names, stable side.
    #[serde(default)]
    pub stable_hook_patterns: Vec<String>,
    /// Regex patterns matched against hook names, unstable side.
    #[serde(default)]
    pub unstable_hook_patterns: Vec<String>,
    /// Per-function classification overrides.
    #[serde(default)]
    pub custom_functions: BTreeMap<String, CustomFunction>,
    /// Names recognized as memoization component wrappers.
    #[serde(default = "default_memo_wrappers")]
    pub memo_wrappers: Vec<String>,
    /// Extra exclude globs, merged with the built-in defaults.
    #[serde(default)]
    pub ignores: Vec<String>,
    /// Directories (or globs) to analyze; empty means the whole root.
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub min_severity: Severity,
    #[serde(default)]
    pub min_confidence: Confidence,
    /// When false, potential-issue diagnostics are dropped from the result.
    #[serde(default = "default_true")]
    pub include_potential_issues: bool,
    /// Enables the external type-oracle bridge for stability refinement.
    #[serde(default)]
    pub strict_mode: bool,
    #[serde(default)]
    pub unknown_hook_stability: UnknownHookStability,
    /// Root used by the alias resolver; defaults to the analysis root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,
    /// Recorded for the alias resolver collaborator; the core only stores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tsconfig_path: Option<PathBuf>,
    /// Import alias table, e.g. `{"@/": "src/"}`.
    #[serde(default)]
    pub aliases: BTreeMap<String, String>,
    /// Analysis thread count; defaults to logical cores - 1.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
    /// Upper bound on enumerated entry-to-target paths per control-flow graph.
    #[serde(default = "default_max_paths")]
    pub max_enumerated_paths: usize,
    /// Upper bound on the length of a single enumerated path.
    #[serde(default = "default_max_path_length")]
    pub max_path_length: usize,
    /// Bound on transitive call chains followed inside a file.
    #[serde(default = "default_max_call_depth")]
    pub max_call_depth: usize,
    /// Bound on cross-file hops for setter flow and memo-flag chains.
    #[serde(default = "default_max_import_hops")]
    pub max_import_hops: usize,
    /// Attach rule debug records to diagnostics.
    #[serde(default)]
    pub debug: bool,
}

fn default_memo_wrappers() -> Vec<String> {
    vec!["memo".to_string()]
}

fn default_true() -> bool {
    true
}

fn default_max_paths() -> usize {
    64
}

fn default_max_path_length() -> usize {
    128
}

fn default_max_call_depth() -> usize {
    4
}

fn default_max_import_hops() -> usize {
    3
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stable_hooks: Vec::new(),
            unstable_hooks: Vec::new(),
            stable_hook_patterns: Vec::new(),
            unstable_hook_patterns: Vec::new(),
            custom_functions: BTreeMap::new(),
            memo_wrappers: default_memo_wrappers(),
            ignores: Vec::new(),
            includes: Vec::new(),
            min_severity: Severity::default(),
            min_confidence: Confidence::default(),
            include_potential_issues: true,
            strict_mode: false,
            unknown_hook_stability: UnknownHookStability::default(),
            project_root: None,
            tsconfig_path: None,
            aliases: BTreeMap::new(),
            jobs: None,
            max_enumerated_paths: default_max_paths(),
            max_path_length: default_max_path_length(),
            max_call_depth: default_max_call_depth(),
            max_import_hops: default_max_import_hops(),
            debug: false,
        }
    }
}

impl Config {
    /// Validate configuration values.
    ///
    /// Returns an error if any glob pattern in `ignores`/`includes` or any
    /// hook-name regex is invalid. Invoked before any file is processed so a
    /// bad configuration fails the run up front.
    pub fn validate(&self) -> Result<()> {
        for pattern in &self.ignores {
            Pattern::new(pattern)
                .with_context(|| format!("Invalid glob pattern in 'ignores': \"{}\"", pattern))?;
        }

        for pattern in &self.includes {
            if pattern.contains('*') || pattern.contains('?') {
                Pattern::new(pattern).with_context(|| {
                    format!("Invalid glob pattern in 'includes': \"{}\"", pattern)
                })?;
            }
        }

        for pattern in self
            .stable_hook_patterns
            .iter()
            .chain(&self.unstable_hook_patterns)
        {
            Regex::new(pattern)
                .with_context(|| format!("Invalid hook name pattern: \"{}\"", pattern))?;
        }

        Ok(())
    }

    /// Compile the hook-name lists and patterns into a lookup policy.
    pub fn compile(&self) -> Result<HookPolicy> {
        let stable_patterns = self
            .stable_hook_patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("Invalid hook name pattern: \"{}\"", p)))
            .collect::<Result<Vec<_>>>()?;
        let unstable_patterns = self
            .unstable_hook_patterns
            .iter()
            .map(|p| Regex::new(p).with_context(|| format!("Invalid hook name pattern: \"{}\"", p)))
            .collect::<Result<Vec<_>>>()?;

        Ok(HookPolicy {
            stable: self.stable_hooks.iter().cloned().collect(),
            unstable: self.unstable_hooks.iter().cloned().collect(),
            stable_patterns,
            unstable_patterns,
            custom: self.custom_functions.clone(),
            wrappers: self.memo_wrappers.iter().cloned().collect(),
            unknown_unstable: self.unknown_hook_stability == UnknownHookStability::Unstable,
        })
    }
}

/// Verdict for a named call's return value, used by stability classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookVerdict {
    Stable,
    Unstable,
    Unknown,
}

/// Compiled hook-name policy derived from [`Config`].
#[derive(Debug, Default)]
pub struct HookPolicy {
    stable: std::collections::BTreeSet<String>,
    unstable: std::collections::BTreeSet<String>,
    stable_patterns: Vec<Regex>,
    unstable_patterns: Vec<Regex>,
    custom: BTreeMap<String, CustomFunction>,
    wrappers: std::collections::BTreeSet<String>,
    unknown_unstable: bool,
}

impl HookPolicy {
    /// Classify a custom hook or function name. Exact lists win over
    /// patterns, stable over unstable on a tie.
    pub fn verdict(&self, name: &str) -> HookVerdict {
        if self.stable.contains(name) {
            return HookVerdict::Stable;
        }
        if self.unstable.contains(name) {
            return HookVerdict::Unstable;
        }
        if let Some(custom) = self.custom.get(name)
            && let Some(stable) = custom.stable
        {
            return if stable {
                HookVerdict::Stable
            } else {
                HookVerdict::Unstable
            };
        }
        if self.stable_patterns.iter().any(|r| r.is_match(name)) {
            return HookVerdict::Stable;
        }
        if self.unstable_patterns.iter().any(|r| r.is_match(name)) {
            return HookVerdict::Unstable;
        }
        HookVerdict::Unknown
    }

    /// Resolve the policy for an unknown custom hook's return value.
    pub fn unknown_hooks_are_unstable(&self) -> bool {
        self.unknown_unstable
    }

    /// Is this name a configured memoization component wrapper?
    pub fn is_wrapper(&self, name: &str) -> bool {
        self.wrappers.contains(name)
    }

    /// Do callbacks passed to this function run on a deferred schedule?
    pub fn is_deferred(&self, name: &str) -> bool {
        self.custom
            .get(name)
            .and_then(|c| c.deferred)
            .unwrap_or(false)
    }
}

pub fn default_config_json() -> Result<String> {
    let config = Config::default();
    serde_json::to_string_pretty(&config).context("Failed to generate default config.")
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE_NAME);
        if config_path.exists() {
            return Some(config_path);
        }
        if current.join(".git").exists() {
            return None;
        }
        if !current.pop() {
            return None;
        }
    }
}

/// Result of loading configuration.
pub struct ConfigLoadResult {
    pub config: Config,
    /// True if config was loaded from a file, false if using defaults.
    pub from_file: bool,
}

pub fn load_config(start_dir: &Path) -> Result<ConfigLoadResult> {
    match find_config_file(start_dir) {
        Some(path) => load_config_file(&path),
        None => Ok(ConfigLoadResult {
            config: Config::default(),
            from_file: false,
        }),
    }
}

pub fn load_config_file(path: &Path) -> Result<ConfigLoadResult> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;
    let config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;
    config.validate()?;
    Ok(ConfigLoadResult {
        config,
        from_file: true,
    })
}
