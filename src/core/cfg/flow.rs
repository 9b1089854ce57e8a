//! Flow facts over a built CFG: reachability, dominators, and bounded
//! path enumeration.
//!
//! The dominator computation is the iterative intersect-to-fixpoint
//! algorithm. "Guaranteed to execute" has exactly one definition here: a
//! node is guaranteed iff it dominates the exit node. Path enumeration is
//! bounded by both a path count and a path length; overflowing callers must
//! degrade to "potential" findings rather than "confirmed".

use std::collections::HashSet;

use super::{Cfg, NodeId, NodeKind};

/// Forward reachability from the entry node.
pub fn reachable(cfg: &Cfg<'_>) -> Vec<bool> {
    let mut seen = vec![false; cfg.len()];
    let mut stack = vec![cfg.entry];
    seen[cfg.entry] = true;
    while let Some(node) = stack.pop() {
        for &succ in &cfg.node(node).succs {
            if !seen[succ] {
                seen[succ] = true;
                stack.push(succ);
            }
        }
    }
    seen
}

/// Forward reachability from an arbitrary node.
pub fn reachable_from(cfg: &Cfg<'_>, start: NodeId) -> Vec<bool> {
    let mut seen = vec![false; cfg.len()];
    let mut stack = vec![start];
    seen[start] = true;
    while let Some(node) = stack.pop() {
        for &succ in &cfg.node(node).succs {
            if !seen[succ] {
                seen[succ] = true;
                stack.push(succ);
            }
        }
    }
    seen
}

/// Dominator sets, restricted to reachable nodes.
pub struct Dominators {
    sets: Vec<Option<HashSet<NodeId>>>,
    exit: NodeId,
}

impl Dominators {
    /// Does `a` dominate `b`? Unreachable nodes dominate nothing.
    pub fn dominates(&self, a: NodeId, b: NodeId) -> bool {
        self.sets
            .get(b)
            .and_then(|set| set.as_ref())
            .is_some_and(|set| set.contains(&a))
    }

    /// A node is guaranteed to execute iff it dominates the exit node.
    pub fn is_guaranteed(&self, node: NodeId) -> bool {
        self.dominates(node, self.exit)
    }
}

/// Iterative intersection-to-fixpoint dominator computation.
pub fn dominators(cfg: &Cfg<'_>) -> Dominators {
    let reach = reachable(cfg);
    let all: HashSet<NodeId> = (0..cfg.len()).filter(|&n| reach[n]).collect();

    let mut sets: Vec<Option<HashSet<NodeId>>> = (0..cfg.len())
        .map(|n| {
            if !reach[n] {
                None
            } else if n == cfg.entry {
                Some(HashSet::from([cfg.entry]))
            } else {
                Some(all.clone())
            }
        })
        .collect();

    let mut changed = true;
    while changed {
        changed = false;
        for node in 0..cfg.len() {
            if !reach[node] || node == cfg.entry {
                continue;
            }
            let mut intersection: Option<HashSet<NodeId>> = None;
            for &pred in &cfg.node(node).preds {
                let Some(pred_set) = sets[pred].as_ref() else {
                    continue;
                };
                intersection = Some(match intersection {
                    None => pred_set.clone(),
                    Some(acc) => acc.intersection(pred_set).copied().collect(),
                });
            }
            let mut next = intersection.unwrap_or_default();
            next.insert(node);
            if sets[node].as_ref() != Some(&next) {
                sets[node] = Some(next);
                changed = true;
            }
        }
    }

    Dominators {
        sets,
        exit: cfg.exit,
    }
}

/// One branch decision along an enumerated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub node: NodeId,
    pub taken: bool,
}

/// Result of bounded path enumeration.
pub struct PathEnumeration {
    /// Branch decisions per discovered entry-to-target path.
    pub paths: Vec<Vec<Decision>>,
    /// True when a bound was hit; callers must degrade to "potential".
    pub overflowed: bool,
}

/// Enumerate paths from entry to `target`, bounded by `max_paths` and
/// `max_len` nodes per path. For every `Branch`/`LoopTest` traversed the
/// decision taken is recorded.
pub fn enumerate_paths(
    cfg: &Cfg<'_>,
    target: NodeId,
    max_paths: usize,
    max_len: usize,
) -> PathEnumeration {
    let mut result = PathEnumeration {
        paths: Vec::new(),
        overflowed: false,
    };
    let mut decisions: Vec<Decision> = Vec::new();
    walk(
        cfg,
        cfg.entry,
        target,
        0,
        max_paths,
        max_len,
        &mut decisions,
        &mut result,
    );
    result
}

#[allow(clippy::too_many_arguments)]
fn walk(
    cfg: &Cfg<'_>,
    node: NodeId,
    target: NodeId,
    depth: usize,
    max_paths: usize,
    max_len: usize,
    decisions: &mut Vec<Decision>,
    result: &mut PathEnumeration,
) {
    if result.paths.len() >= max_paths {
        result.overflowed = true;
        return;
    }
    if depth > max_len {
        result.overflowed = true;
        return;
    }
    if node == target {
        result.paths.push(decisions.clone());
        return;
    }

    let current = cfg.node(node);
    if matches!(current.kind, NodeKind::Branch | NodeKind::LoopTest) {
        for (succ, taken) in [(current.true_succ, true), (current.false_succ, false)] {
            let Some(succ) = succ else { continue };
            decisions.push(Decision { node, taken });
            walk(cfg, succ, target, depth + 1, max_paths, max_len, decisions, result);
            decisions.pop();
        }
        // Successors beyond the labeled pair (switch dispatch edges).
        for &succ in &current.succs {
            if Some(succ) == current.true_succ || Some(succ) == current.false_succ {
                continue;
            }
            walk(cfg, succ, target, depth + 1, max_paths, max_len, decisions, result);
        }
    } else {
        for &succ in &current.succs {
            walk(cfg, succ, target, depth + 1, max_paths, max_len, decisions, result);
        }
    }
}
