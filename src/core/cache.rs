//! Parsed-file cache.
//!
//! Keyed by (canonical path, file size, content digest). Writers insert at
//! most once per key and entries are immutable after publication, so a
//! plain read-write lock is enough: readers either miss or see a fully
//! initialized file. The cache survives across runs on the same context,
//! which is what makes repeated analyses of an unchanged tree cheap.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::core::parser::ParsedFile;

#[derive(Default)]
pub struct ParseCache {
    entries: RwLock<HashMap<String, Arc<ParsedFile>>>,
}

impl ParseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache hit requires the size and digest to match, not just the path.
    pub fn lookup(&self, path: &str, size: u64, digest: u64) -> Option<Arc<ParsedFile>> {
        let entries = self.entries.read().expect("parse cache lock poisoned");
        entries
            .get(path)
            .filter(|file| file.size == size && file.digest == digest)
            .cloned()
    }

    pub fn insert(&self, file: Arc<ParsedFile>) {
        let mut entries = self.entries.write().expect("parse cache lock poisoned");
        entries.insert(file.path.clone(), file);
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("parse cache lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
