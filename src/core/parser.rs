//! Parse driver: source text → [`ParsedFile`].
//!
//! Each file is parsed with its own `SourceMap` wrapped in `Arc` so parsing
//! can run on rayon workers, and comments are pulled out of
//! `SingleThreadedComments` into plain maps before the parser state drops.
//! A [`ParsedFile`] owns the AST and every per-file table derived from it;
//! downstream phases only borrow.

use std::collections::HashMap;
use std::hash::BuildHasher;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use foldhash::fast::FixedState;
use swc_common::{
    BytePos, FileName, Globals, SourceMap,
    comments::{Comment, SingleThreadedComments},
};
use swc_ecma_ast::Module;
use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

use crate::config::HookPolicy;
use crate::core::oracle::TypeOracle;
use crate::core::semantics::{FileSummary, extract_summary};
use crate::core::suppressions::SuppressionTable;

/// Map of byte positions to comments.
pub type CommentMap = HashMap<BytePos, Vec<Comment>>;

/// Thread-safe extracted comments from SingleThreadedComments.
/// Extracted during parsing and stored independently of swc types.
#[derive(Debug, Clone)]
pub struct ExtractedComments {
    pub leading: CommentMap,
    pub trailing: CommentMap,
}

impl ExtractedComments {
    /// Extract comments from SingleThreadedComments.
    /// This must be called before SingleThreadedComments is dropped.
    pub fn from_swc(comments: &SingleThreadedComments) -> Self {
        let (leading, trailing) = comments.borrow_all();
        Self {
            leading: leading.iter().map(|(k, v)| (*k, v.clone())).collect(),
            trailing: trailing.iter().map(|(k, v)| (*k, v.clone())).collect(),
        }
    }

    /// Iterate over all comments, leading and trailing.
    pub fn iter(&self) -> impl Iterator<Item = &Comment> {
        self.leading
            .values()
            .chain(self.trailing.values())
            .flat_map(|v| v.iter())
    }
}

/// An immutable, fully-analyzed source file.
///
/// Owns the AST, the source map, the extracted comments, the suppression
/// table, and the semantic summary. Cached across runs keyed by
/// (path, size, digest).
pub struct ParsedFile {
    pub path: String,
    pub size: u64,
    pub digest: u64,
    pub module: Module,
    pub source_map: Arc<SourceMap>,
    pub comments: ExtractedComments,
    pub suppressions: SuppressionTable,
    /// Shared so the cross-file index can hold it without copying.
    pub summary: Arc<FileSummary>,
}

impl std::fmt::Debug for ParsedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParsedFile")
            .field("path", &self.path)
            .field("size", &self.size)
            .field("digest", &self.digest)
            .field("module", &self.module)
            .field("comments", &self.comments)
            .field("suppressions", &self.suppressions)
            .field("summary", &self.summary)
            .finish()
    }
}

/// Position-independent content digest used as the cache key.
pub fn content_digest(code: &str) -> u64 {
    FixedState::default().hash_one(code.as_bytes())
}

fn syntax_for(path: &str) -> Syntax {
    // Plain .ts cannot be parsed with tsx enabled: `<T>(x)` generics would
    // be read as JSX.
    let tsx = !path.ends_with(".ts");
    Syntax::Typescript(TsSyntax {
        tsx,
        ..Default::default()
    })
}

/// Parse source text and derive every per-file table in one unit of work.
///
/// A failure yields a structured error; the orchestrator skips the file and
/// keeps the run alive.
pub fn parse_source(
    path: &str,
    code: String,
    policy: &HookPolicy,
    oracle: &dyn TypeOracle,
    strict_mode: bool,
) -> Result<ParsedFile> {
    use swc_common::GLOBALS;

    let size = code.len() as u64;
    let digest = content_digest(&code);
    let source_map = Arc::new(SourceMap::default());

    GLOBALS.set(&Globals::new(), || {
        let source_file = source_map.new_source_file(FileName::Real(path.into()).into(), code);

        let comments = SingleThreadedComments::default();
        let mut parser = Parser::new(
            syntax_for(path),
            StringInput::from(&*source_file),
            Some(&comments),
        );

        let module = parser
            .parse_module()
            .map_err(|e| anyhow!("Failed to parse {}: {:?}", path, e))?;

        // Extract comments immediately (before SingleThreadedComments drops)
        let comments = ExtractedComments::from_swc(&comments);
        let suppressions = SuppressionTable::from_comments(&comments, &source_map);
        let summary = Arc::new(extract_summary(
            path,
            &module,
            &source_map,
            policy,
            oracle,
            strict_mode,
        ));

        Ok(ParsedFile {
            path: path.to_string(),
            size,
            digest,
            module,
            source_map,
            comments,
            suppressions,
            summary,
        })
    })
}

/// Read and parse a file from disk.
pub fn parse_file(
    path: &str,
    policy: &HookPolicy,
    oracle: &dyn TypeOracle,
    strict_mode: bool,
) -> Result<ParsedFile> {
    let code =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))?;
    parse_source(path, code, policy, oracle, strict_mode)
}
