//! In-source suppression markers.
//!
//! Supported directives, matched inside line and block comments:
//! - `rld-disable-next-line` - suppress diagnostics on the next line
//!   (as a trailing comment it suppresses its own line)
//! - `rld-disable-next-line RLD-200` - suppress only the named codes
//! - `rld-disable` / `rld-enable` - range-based suppression
//!
//! A marker with no code arguments suppresses every diagnostic.

use std::collections::HashSet;

use swc_common::SourceMap;

use crate::core::parser::ExtractedComments;

/// Which diagnostic codes a directive applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeFilter {
    All,
    Codes(HashSet<String>),
}

impl CodeFilter {
    fn parse(rest: &str) -> Self {
        let rest = rest.trim();
        if rest.is_empty() {
            return CodeFilter::All;
        }
        let codes: HashSet<String> = rest
            .split_whitespace()
            .filter(|tok| tok.to_ascii_uppercase().starts_with("RLD-") || tok.contains("CYCLE"))
            .map(|tok| tok.to_ascii_uppercase())
            .collect();
        // Unrecognized arguments fall back to suppressing everything.
        if codes.is_empty() {
            CodeFilter::All
        } else {
            CodeFilter::Codes(codes)
        }
    }

    fn matches(&self, code: &str) -> bool {
        match self {
            CodeFilter::All => true,
            CodeFilter::Codes(codes) => codes.contains(&code.to_ascii_uppercase()),
        }
    }

    fn overlaps(&self, other: &CodeFilter) -> bool {
        match (self, other) {
            (CodeFilter::All, _) | (_, CodeFilter::All) => true,
            (CodeFilter::Codes(a), CodeFilter::Codes(b)) => !a.is_disjoint(b),
        }
    }
}

/// Parsed rld directive.
#[derive(Debug, Clone)]
enum Directive {
    Disable(CodeFilter),
    Enable(CodeFilter),
    DisableNextLine(CodeFilter),
}

impl Directive {
    /// Parse directive from comment text.
    /// Returns None if not an rld directive.
    fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        // Order matters: check longer prefix first
        if let Some(rest) = text.strip_prefix("rld-disable-next-line") {
            return Some(Self::DisableNextLine(CodeFilter::parse(rest)));
        }
        if let Some(rest) = text.strip_prefix("rld-disable") {
            return Some(Self::Disable(CodeFilter::parse(rest)));
        }
        if let Some(rest) = text.strip_prefix("rld-enable") {
            return Some(Self::Enable(CodeFilter::parse(rest)));
        }

        None
    }
}

#[derive(Debug, Clone)]
struct DisabledRange {
    start: usize,
    end: usize, // usize::MAX for open-ended
    filter: CodeFilter,
}

/// Per-file suppression table built from comments once, then read-only.
#[derive(Debug, Default)]
pub struct SuppressionTable {
    disabled_lines: Vec<(usize, CodeFilter)>,
    disabled_ranges: Vec<DisabledRange>,
}

impl SuppressionTable {
    /// Check whether a diagnostic with `code` at `line` is suppressed.
    pub fn is_suppressed(&self, line: usize, code: &str) -> bool {
        if self
            .disabled_lines
            .iter()
            .any(|(l, filter)| *l == line && filter.matches(code))
        {
            return true;
        }
        self.disabled_ranges
            .iter()
            .any(|r| line >= r.start && line <= r.end && r.filter.matches(code))
    }

    pub fn is_empty(&self) -> bool {
        self.disabled_lines.is_empty() && self.disabled_ranges.is_empty()
    }

    /// Build the table from extracted comments.
    pub fn from_comments(comments: &ExtractedComments, source_map: &SourceMap) -> Self {
        let mut table = Self::default();

        // (line, is_trailing, directive), in line order for range pairing.
        let mut directives: Vec<(usize, bool, Directive)> = Vec::new();
        for (trailing, map) in [(false, &comments.leading), (true, &comments.trailing)] {
            for comment in map.values().flat_map(|v| v.iter()) {
                if let Some(directive) = Directive::parse(comment.text.trim()) {
                    let line = source_map.lookup_char_pos(comment.span.lo).line;
                    directives.push((line, trailing, directive));
                }
            }
        }
        directives.sort_by_key(|(line, _, _)| *line);

        let mut open_ranges: Vec<(usize, CodeFilter)> = Vec::new();

        for (line, trailing, directive) in directives {
            match directive {
                Directive::Disable(filter) => {
                    open_ranges.push((line, filter));
                }
                Directive::Enable(filter) => {
                    let mut still_open = Vec::new();
                    for (start, open_filter) in open_ranges.drain(..) {
                        if open_filter.overlaps(&filter) {
                            table.disabled_ranges.push(DisabledRange {
                                start,
                                end: line.saturating_sub(1),
                                filter: open_filter,
                            });
                        } else {
                            still_open.push((start, open_filter));
                        }
                    }
                    open_ranges = still_open;
                }
                Directive::DisableNextLine(filter) => {
                    // A trailing marker sits after code on its own line and
                    // suppresses that line instead of the next one.
                    let target = if trailing { line } else { line + 1 };
                    table.disabled_lines.push((target, filter));
                }
            }
        }

        // Close any open ranges (extend to end of file)
        for (start, filter) in open_ranges {
            table.disabled_ranges.push(DisabledRange {
                start,
                end: usize::MAX,
                filter,
            });
        }

        table
    }
}
