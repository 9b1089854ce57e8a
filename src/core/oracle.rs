//! Narrow bridge to an external type-checker.
//!
//! In strict mode the stability classifier may ask an oracle what type an
//! expression has, to refine verdicts for unknown hook returns. The core
//! treats the oracle as opaque; the default implementation knows nothing.

use swc_common::Span;

/// A coarse type description, enough to refine stability verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDescription {
    Primitive,
    Object,
    Array,
    Function,
    Unknown,
}

/// Synchronous type lookup for an AST node, identified by file and span.
pub trait TypeOracle: Send + Sync {
    fn type_of(&self, file: &str, span: Span) -> Option<TypeDescription>;
}

/// Oracle that answers nothing; used when no type-checker is attached.
pub struct NullOracle;

impl TypeOracle for NullOracle {
    fn type_of(&self, _file: &str, _span: Span) -> Option<TypeDescription> {
        None
    }
}
