//! Guard recognition.
//!
//! The recognized guard set is closed: equality guards, toggle guards,
//! early-return guards, and the effective-but-risky property-comparison
//! variant. Anything else is no guard. An effective guard downgrades a
//! confirmed loop to a potential issue or suppresses it, depending on the
//! rule consuming the verdict.

use swc_ecma_ast::{BinaryOp, Expr, UnaryOp};

use crate::core::semantics::stability::{member_root, unwrap_expr};

use super::flow::{Decision, PathEnumeration, reachable_from};
use super::{Cfg, NodeId, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    /// `x !== y` branch-true / `x === y` branch-false over the tracked state.
    Equality,
    /// `!flag` branch-true over the tracked boolean state.
    Toggle,
    /// The opposite branch side returns before the setter runs.
    EarlyReturn,
    /// Equality guard with a member-access operand; effective but risky.
    PropertyComparison,
}

/// Combined strength over all paths to a setter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum GuardStrength {
    Unguarded,
    Risky,
    Effective,
}

/// Classify a single branch condition against the tracked state variable.
pub fn classify_condition(cond: &Expr, taken: bool, state_name: &str) -> Option<GuardKind> {
    match unwrap_expr(cond) {
        Expr::Bin(bin) => {
            let equality_outcome = match bin.op {
                BinaryOp::NotEqEq | BinaryOp::NotEq => taken,
                BinaryOp::EqEqEq | BinaryOp::EqEq => !taken,
                _ => return None,
            };
            if !equality_outcome {
                return None;
            }
            let left = unwrap_expr(&bin.left);
            let right = unwrap_expr(&bin.right);
            if !mentions_state(left, state_name) && !mentions_state(right, state_name) {
                return None;
            }
            if is_member_access(left) || is_member_access(right) {
                Some(GuardKind::PropertyComparison)
            } else {
                Some(GuardKind::Equality)
            }
        }
        Expr::Unary(unary) if unary.op == UnaryOp::Bang && taken => {
            match unwrap_expr(&unary.arg) {
                Expr::Ident(ident) if ident.sym.as_str() == state_name => Some(GuardKind::Toggle),
                _ => None,
            }
        }
        _ => None,
    }
}

fn mentions_state(expr: &Expr, state_name: &str) -> bool {
    match expr {
        Expr::Ident(ident) => ident.sym.as_str() == state_name,
        _ => member_root(expr).is_some_and(|root| root == state_name),
    }
}

fn is_member_access(expr: &Expr) -> bool {
    matches!(expr, Expr::Member(_) | Expr::OptChain(_))
}

/// Does the side of the branch the path did NOT take terminate with a
/// `return` before it could reach the setter?
pub fn untaken_side_returns(cfg: &Cfg<'_>, decision: Decision, target: NodeId) -> bool {
    let branch = cfg.node(decision.node);
    let untaken = if decision.taken {
        branch.false_succ
    } else {
        branch.true_succ
    };
    let Some(untaken) = untaken else {
        return false;
    };
    let reach = reachable_from(cfg, untaken);
    if reach[target] {
        return false;
    }
    cfg.iter()
        .any(|(id, node)| reach[id] && node.kind == NodeKind::Return)
}

/// Judge every enumerated path to the setter.
///
/// A path is effective when it crosses an equality/toggle guard on the
/// tracked state or an early-return branch; risky when its only guard is a
/// property comparison. The overall verdict is the weakest path: one
/// unguarded path makes the whole site unguarded.
pub fn evaluate_paths(
    cfg: &Cfg<'_>,
    enumeration: &PathEnumeration,
    target: NodeId,
    state_name: &str,
) -> GuardStrength {
    if enumeration.paths.is_empty() {
        return GuardStrength::Unguarded;
    }

    let mut overall = GuardStrength::Effective;
    for path in &enumeration.paths {
        let mut strength = GuardStrength::Unguarded;
        for decision in path {
            let classified = cfg
                .condition(decision.node)
                .and_then(|cond| classify_condition(cond, decision.taken, state_name));
            match classified {
                Some(GuardKind::Equality) | Some(GuardKind::Toggle) => {
                    strength = GuardStrength::Effective;
                    break;
                }
                Some(GuardKind::PropertyComparison) => {
                    strength = strength.max(GuardStrength::Risky);
                }
                Some(GuardKind::EarlyReturn) => unreachable!("not produced by classification"),
                None => {
                    if untaken_side_returns(cfg, *decision, target) {
                        strength = GuardStrength::Effective;
                        break;
                    }
                }
            }
        }
        overall = overall.min(strength);
        if overall == GuardStrength::Unguarded {
            break;
        }
    }
    overall
}
