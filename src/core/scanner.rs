//! Candidate file discovery.
//!
//! Walks the project tree, applies include/ignore patterns, and filters out
//! files that cannot contain framework code: anything over 1 MiB, and
//! anything whose first ~2 KiB shows none of the framework-indicative
//! tokens (a react import, a capitalized JSX tag, or a hook-style `useX`
//! name). The probe keeps huge vendored bundles out of the parser.

use std::{
    collections::BTreeSet,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use colored::Colorize;
use glob::{Pattern, glob};
use regex::Regex;
use walkdir::WalkDir;

use crate::config::DEFAULT_IGNORE_PATTERNS;

/// Files larger than this are skipped without parsing.
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// How much of the file head the probe inspects.
const PROBE_LEN: usize = 2048;

/// Check if a pattern contains glob wildcards (* or ?).
/// Patterns without wildcards are treated as literal directory paths.
fn is_glob_pattern(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Result of scanning files.
pub struct ScanResult {
    /// Candidate paths, sorted for deterministic downstream order.
    pub files: Vec<String>,
    pub skipped_count: usize,
}

struct HeadProbe {
    jsx_tag: Regex,
    hook_name: Regex,
}

impl HeadProbe {
    fn new() -> Self {
        Self {
            jsx_tag: Regex::new(r"<[A-Z][A-Za-z0-9]*").expect("probe pattern is valid"),
            hook_name: Regex::new(r"\buse[A-Z]").expect("probe pattern is valid"),
        }
    }

    fn matches(&self, head: &str) -> bool {
        head.contains("react") || self.jsx_tag.is_match(head) || self.hook_name.is_match(head)
    }
}

pub fn discover(
    base_dir: &str,
    includes: &[String],
    ignore_patterns: &[String],
    verbose: bool,
) -> ScanResult {
    let mut files: BTreeSet<String> = BTreeSet::new();
    let mut skipped_count = 0;
    let probe = HeadProbe::new();

    // Separate ignore patterns into literal paths and glob patterns
    let mut literal_ignore_paths: Vec<PathBuf> = Vec::new();
    let mut glob_patterns: Vec<Pattern> = Vec::new();

    for p in DEFAULT_IGNORE_PATTERNS {
        if let Ok(pattern) = Pattern::new(p) {
            glob_patterns.push(pattern);
        }
    }

    for p in ignore_patterns {
        if is_glob_pattern(p) {
            match Pattern::new(p) {
                Ok(pattern) => glob_patterns.push(pattern),
                Err(e) => {
                    if verbose {
                        eprintln!(
                            "{} Invalid ignore pattern '{}': {}",
                            "warning:".bold().yellow(),
                            p,
                            e
                        );
                    }
                }
            }
        } else {
            let path = Path::new(base_dir).join(p);
            literal_ignore_paths.push(path);
        }
    }

    let dirs_to_scan: Vec<PathBuf> = if includes.is_empty() {
        vec![Path::new(base_dir).to_path_buf()]
    } else {
        let mut paths = Vec::new();
        for inc in includes {
            if is_glob_pattern(inc) {
                let full_pattern = Path::new(base_dir).join(inc);
                let pattern_str = full_pattern.to_string_lossy();
                match glob(&pattern_str) {
                    Ok(entries) => {
                        for entry in entries.flatten() {
                            if entry.is_dir() {
                                paths.push(entry);
                            }
                        }
                    }
                    Err(e) => {
                        if verbose {
                            eprintln!(
                                "{} Invalid glob pattern '{}': {}",
                                "warning:".bold().yellow(),
                                inc,
                                e
                            );
                        }
                    }
                }
            } else {
                let path = Path::new(base_dir).join(inc);
                if path.exists() {
                    paths.push(path);
                } else if verbose {
                    eprintln!(
                        "{} Include path does not exist: {}",
                        "warning:".bold().yellow(),
                        path.display()
                    );
                }
            }
        }
        paths
    };

    for dir in dirs_to_scan {
        for entry in WalkDir::new(dir) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    skipped_count += 1;
                    if verbose {
                        eprintln!("{} Cannot access path: {}", "warning:".bold().yellow(), e);
                    }
                    continue;
                }
            };
            let path = entry.path();
            let path_str = path.to_string_lossy();

            if literal_ignore_paths
                .iter()
                .any(|ignore_path| path.starts_with(ignore_path))
            {
                continue;
            }

            if glob_patterns.iter().any(|p| p.matches(&path_str)) {
                continue;
            }

            if !path.is_file() || !is_scannable_file(path) {
                continue;
            }

            match is_candidate(path, &probe) {
                Candidate::Yes => {
                    files.insert(path_str.into());
                }
                Candidate::No => {}
                Candidate::Unreadable => {
                    skipped_count += 1;
                }
            }
        }
    }

    ScanResult {
        files: files.into_iter().collect(),
        skipped_count,
    }
}

fn is_scannable_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("tsx" | "ts" | "jsx" | "js")
    )
}

enum Candidate {
    Yes,
    No,
    Unreadable,
}

/// Apply the size cap and the head probe.
fn is_candidate(path: &Path, probe: &HeadProbe) -> Candidate {
    let Ok(metadata) = path.metadata() else {
        return Candidate::Unreadable;
    };
    if metadata.len() > MAX_FILE_SIZE {
        return Candidate::No;
    }

    let Ok(mut file) = File::open(path) else {
        return Candidate::Unreadable;
    };
    let mut head = vec![0u8; PROBE_LEN.min(metadata.len() as usize)];
    if file.read_exact(&mut head).is_err() {
        return Candidate::Unreadable;
    }
    let head = String::from_utf8_lossy(&head);
    if probe.matches(&head) {
        Candidate::Yes
    } else {
        Candidate::No
    }
}
