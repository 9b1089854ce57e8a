//! Arena-owned control-flow graphs.
//!
//! One graph is built per hook callback body (and per component body for
//! render-phase analysis). Nodes live in a flat arena indexed by small
//! integers; successor/predecessor lists are index vectors, so the graph has
//! no cyclic ownership. Each node optionally points back to its originating
//! AST node, which is how guard analysis recovers branch conditions.
//!
//! Invariants: exactly one `Entry` and one `Exit`; `Branch` and `LoopTest`
//! carry explicit true/false successors; terminators never fall through;
//! unreachable nodes are retained (and reported by `flow::reachable`).

use swc_common::Span;
use swc_ecma_ast::{Expr, Stmt};

pub mod builder;
pub mod flow;
pub mod guards;

pub use builder::build_callback_cfg;

pub type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Entry,
    Exit,
    Statement,
    Branch,
    LoopTest,
    LoopUpdate,
    Try,
    Catch,
    Finally,
    Throw,
    Return,
    Break,
    Continue,
    Merge,
}

impl NodeKind {
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            NodeKind::Return | NodeKind::Throw | NodeKind::Break | NodeKind::Continue
        )
    }
}

/// Back-reference to the AST node a CFG node was lowered from.
#[derive(Debug, Clone, Copy)]
pub enum AstRef<'a> {
    Stmt(&'a Stmt),
    Expr(&'a Expr),
}

impl<'a> AstRef<'a> {
    pub fn span(&self) -> Span {
        use swc_common::Spanned;
        match self {
            AstRef::Stmt(stmt) => stmt.span(),
            AstRef::Expr(expr) => expr.span(),
        }
    }

    pub fn as_expr(&self) -> Option<&'a Expr> {
        match self {
            AstRef::Expr(expr) => Some(expr),
            AstRef::Stmt(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct Node<'a> {
    pub kind: NodeKind,
    pub ast: Option<AstRef<'a>>,
    pub succs: Vec<NodeId>,
    pub preds: Vec<NodeId>,
    /// Explicit outcome successors, set on `Branch` and `LoopTest` nodes.
    pub true_succ: Option<NodeId>,
    pub false_succ: Option<NodeId>,
}

#[derive(Debug)]
pub struct Cfg<'a> {
    nodes: Vec<Node<'a>>,
    pub entry: NodeId,
    pub exit: NodeId,
}

impl<'a> Cfg<'a> {
    pub fn new() -> Self {
        let mut cfg = Cfg {
            nodes: Vec::new(),
            entry: 0,
            exit: 0,
        };
        cfg.entry = cfg.add_node(NodeKind::Entry, None);
        cfg.exit = cfg.add_node(NodeKind::Exit, None);
        cfg
    }

    pub fn add_node(&mut self, kind: NodeKind, ast: Option<AstRef<'a>>) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            kind,
            ast,
            succs: Vec::new(),
            preds: Vec::new(),
            true_succ: None,
            false_succ: None,
        });
        id
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) {
        if !self.nodes[from].succs.contains(&to) {
            self.nodes[from].succs.push(to);
        }
        if !self.nodes[to].preds.contains(&from) {
            self.nodes[to].preds.push(from);
        }
    }

    /// Connect a branch outcome and record which side it is.
    pub fn connect_outcome(&mut self, from: NodeId, to: NodeId, outcome: bool) {
        self.connect(from, to);
        if outcome {
            self.nodes[from].true_succ = Some(to);
        } else {
            self.nodes[from].false_succ = Some(to);
        }
    }

    pub fn node(&self, id: NodeId) -> &Node<'a> {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<'a>)> {
        self.nodes.iter().enumerate()
    }

    /// The condition expression of a `Branch`/`LoopTest` node.
    pub fn condition(&self, id: NodeId) -> Option<&'a Expr> {
        self.nodes[id].ast.as_ref().and_then(AstRef::as_expr)
    }

    /// Smallest node whose originating span contains `target`.
    ///
    /// This is how rules map a setter call expression back onto the graph.
    pub fn node_containing(&self, target: Span) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for (id, node) in self.iter() {
            if let Some(ast) = &node.ast {
                let span = ast.span();
                if span.lo <= target.lo && target.hi <= span.hi {
                    let width = span.hi.0 - span.lo.0;
                    if best.is_none_or(|(_, best_width)| width < best_width) {
                        best = Some((id, width));
                    }
                }
            }
        }
        best.map(|(id, _)| id)
    }
}

impl<'a> Default for Cfg<'a> {
    fn default() -> Self {
        Self::new()
    }
}
