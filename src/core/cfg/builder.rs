//! Lowering from AST statements to the CFG arena.
//!
//! Sequential statements chain in order and block statements flatten into
//! their parent chain. Short-circuit operators, ternaries and optional
//! chains produce explicit branch nodes so their right-hand sides are
//! conditional. `return`/`throw`/`break`/`continue` are terminators: nothing
//! falls through them, and statements lowered after one stay in the arena
//! as unreachable nodes.

use swc_ecma_ast::{BinaryOp, BlockStmtOrExpr, Expr, Stmt, VarDeclOrExpr};

use crate::core::semantics::stability::unwrap_expr;

use super::{AstRef, Cfg, NodeId, NodeKind};

/// A lowered sub-graph: its first node and its fall-through frontier.
///
/// `first: None` means the construct produced no nodes. `frontier: None`
/// with a `first` means every path through the construct terminated.
#[derive(Debug, Clone, Copy)]
struct Region {
    first: Option<NodeId>,
    frontier: Option<NodeId>,
}

impl Region {
    const EMPTY: Region = Region {
        first: None,
        frontier: None,
    };

    fn solo(node: NodeId) -> Region {
        Region {
            first: Some(node),
            frontier: Some(node),
        }
    }

    fn terminated(node: NodeId) -> Region {
        Region {
            first: Some(node),
            frontier: None,
        }
    }
}

/// Build a CFG for a hook callback argument.
///
/// Returns `None` when the callback is not an inline function (for example
/// a referenced identifier); callers fall back to conservative analysis.
pub fn build_callback_cfg<'a>(callback: &'a Expr) -> Option<Cfg<'a>> {
    match unwrap_expr(callback) {
        Expr::Arrow(arrow) => match &*arrow.body {
            BlockStmtOrExpr::BlockStmt(block) => Some(build_block_cfg(&block.stmts)),
            BlockStmtOrExpr::Expr(expr) => Some(build_expr_cfg(expr)),
        },
        Expr::Fn(fn_expr) => fn_expr
            .function
            .body
            .as_ref()
            .map(|block| build_block_cfg(&block.stmts)),
        _ => None,
    }
}

/// Build a CFG for a statement list (a function or component body).
pub fn build_block_cfg<'a>(stmts: &'a [Stmt]) -> Cfg<'a> {
    let mut builder = Builder::new();
    let region = builder.lower_stmts(stmts);
    builder.seal(region)
}

/// Build a CFG for an expression-bodied arrow.
pub fn build_expr_cfg<'a>(expr: &'a Expr) -> Cfg<'a> {
    let mut builder = Builder::new();
    let region = builder.lower_expr(expr);
    builder.seal(region)
}

struct Builder<'a> {
    cfg: Cfg<'a>,
    break_stack: Vec<NodeId>,
    continue_stack: Vec<NodeId>,
    catch_stack: Vec<NodeId>,
}

impl<'a> Builder<'a> {
    fn new() -> Self {
        Builder {
            cfg: Cfg::new(),
            break_stack: Vec::new(),
            continue_stack: Vec::new(),
            catch_stack: Vec::new(),
        }
    }

    fn seal(mut self, region: Region) -> Cfg<'a> {
        let entry = self.cfg.entry;
        let exit = self.cfg.exit;
        match region.first {
            Some(first) => {
                self.cfg.connect(entry, first);
                if let Some(frontier) = region.frontier {
                    self.cfg.connect(frontier, exit);
                }
            }
            None => self.cfg.connect(entry, exit),
        }
        self.cfg
    }

    // ============================================================
    // Statements
    // ============================================================

    fn lower_stmts(&mut self, stmts: &'a [Stmt]) -> Region {
        let mut first = None;
        let mut frontier: Option<NodeId> = None;
        let mut live = true;

        for stmt in stmts {
            let region = self.lower_stmt(stmt);
            let Some(region_first) = region.first else {
                continue;
            };
            if first.is_none() {
                first = Some(region_first);
            } else if live && let Some(prev) = frontier {
                self.cfg.connect(prev, region_first);
            }
            // After a terminator the remaining statements are lowered but
            // left unconnected: retained as unreachable nodes.
            frontier = region.frontier;
            live = region.frontier.is_some();
        }

        Region { first, frontier }
    }

    fn lower_stmt(&mut self, stmt: &'a Stmt) -> Region {
        match stmt {
            Stmt::Block(block) => self.lower_stmts(&block.stmts),
            Stmt::Empty(_) => Region::EMPTY,
            Stmt::Expr(expr_stmt) => self.lower_expr(&expr_stmt.expr),
            Stmt::If(if_stmt) => self.lower_if(if_stmt),
            Stmt::While(while_stmt) => self.lower_while(while_stmt),
            Stmt::DoWhile(do_while) => self.lower_do_while(do_while),
            Stmt::For(for_stmt) => self.lower_for(for_stmt),
            Stmt::ForIn(for_in) => self.lower_iterated_loop(&for_in.right, &for_in.body),
            Stmt::ForOf(for_of) => self.lower_iterated_loop(&for_of.right, &for_of.body),
            Stmt::Switch(switch) => self.lower_switch(switch),
            Stmt::Try(try_stmt) => self.lower_try(try_stmt),
            Stmt::Labeled(labeled) => self.lower_stmt(&labeled.body),
            Stmt::Return(_) => {
                let node = self.cfg.add_node(NodeKind::Return, Some(AstRef::Stmt(stmt)));
                let exit = self.cfg.exit;
                self.cfg.connect(node, exit);
                Region::terminated(node)
            }
            Stmt::Throw(_) => {
                let node = self.cfg.add_node(NodeKind::Throw, Some(AstRef::Stmt(stmt)));
                let target = self.catch_stack.last().copied().unwrap_or(self.cfg.exit);
                self.cfg.connect(node, target);
                Region::terminated(node)
            }
            Stmt::Break(_) => {
                let node = self.cfg.add_node(NodeKind::Break, Some(AstRef::Stmt(stmt)));
                let target = self.break_stack.last().copied().unwrap_or(self.cfg.exit);
                self.cfg.connect(node, target);
                Region::terminated(node)
            }
            Stmt::Continue(_) => {
                let node = self
                    .cfg
                    .add_node(NodeKind::Continue, Some(AstRef::Stmt(stmt)));
                let target = self.continue_stack.last().copied().unwrap_or(self.cfg.exit);
                self.cfg.connect(node, target);
                Region::terminated(node)
            }
            Stmt::Decl(decl) => {
                // A declarator whose initializer short-circuits still needs
                // branch nodes.
                if let swc_ecma_ast::Decl::Var(var) = decl
                    && var.decls.len() == 1
                    && let Some(init) = &var.decls[0].init
                    && is_conditional_expr(init)
                {
                    return self.lower_expr(init);
                }
                let node = self
                    .cfg
                    .add_node(NodeKind::Statement, Some(AstRef::Stmt(stmt)));
                Region::solo(node)
            }
            _ => {
                let node = self
                    .cfg
                    .add_node(NodeKind::Statement, Some(AstRef::Stmt(stmt)));
                Region::solo(node)
            }
        }
    }

    fn lower_if(&mut self, if_stmt: &'a swc_ecma_ast::IfStmt) -> Region {
        let branch = self
            .cfg
            .add_node(NodeKind::Branch, Some(AstRef::Expr(&*if_stmt.test)));
        let merge = self.cfg.add_node(NodeKind::Merge, None);

        let cons = self.lower_stmt(&if_stmt.cons);
        match cons.first {
            Some(first) => {
                self.cfg.connect_outcome(branch, first, true);
                if let Some(frontier) = cons.frontier {
                    self.cfg.connect(frontier, merge);
                }
            }
            None => self.cfg.connect_outcome(branch, merge, true),
        }

        match &if_stmt.alt {
            Some(alt) => {
                let alt_region = self.lower_stmt(alt);
                match alt_region.first {
                    Some(first) => {
                        self.cfg.connect_outcome(branch, first, false);
                        if let Some(frontier) = alt_region.frontier {
                            self.cfg.connect(frontier, merge);
                        }
                    }
                    None => self.cfg.connect_outcome(branch, merge, false),
                }
            }
            // Empty alternate: the false edge goes straight to the merge.
            None => self.cfg.connect_outcome(branch, merge, false),
        }

        Region {
            first: Some(branch),
            frontier: Some(merge),
        }
    }

    fn lower_while(&mut self, while_stmt: &'a swc_ecma_ast::WhileStmt) -> Region {
        let test = self
            .cfg
            .add_node(NodeKind::LoopTest, Some(AstRef::Expr(&*while_stmt.test)));
        let exit = self.cfg.add_node(NodeKind::Merge, None);

        self.break_stack.push(exit);
        self.continue_stack.push(test);
        let body = self.lower_stmt(&while_stmt.body);
        self.continue_stack.pop();
        self.break_stack.pop();

        match body.first {
            Some(first) => {
                self.cfg.connect_outcome(test, first, true);
                if let Some(frontier) = body.frontier {
                    self.cfg.connect(frontier, test);
                }
            }
            None => self.cfg.connect_outcome(test, test, true),
        }
        self.cfg.connect_outcome(test, exit, false);

        Region {
            first: Some(test),
            frontier: Some(exit),
        }
    }

    fn lower_do_while(&mut self, do_while: &'a swc_ecma_ast::DoWhileStmt) -> Region {
        let test = self
            .cfg
            .add_node(NodeKind::LoopTest, Some(AstRef::Expr(&*do_while.test)));
        let exit = self.cfg.add_node(NodeKind::Merge, None);

        self.break_stack.push(exit);
        self.continue_stack.push(test);
        let body = self.lower_stmt(&do_while.body);
        self.continue_stack.pop();
        self.break_stack.pop();

        // Body precedes the test; the back edge re-enters the body.
        let first = match body.first {
            Some(first) => {
                if let Some(frontier) = body.frontier {
                    self.cfg.connect(frontier, test);
                }
                self.cfg.connect_outcome(test, first, true);
                first
            }
            None => {
                self.cfg.connect_outcome(test, test, true);
                test
            }
        };
        self.cfg.connect_outcome(test, exit, false);

        Region {
            first: Some(first),
            frontier: Some(exit),
        }
    }

    fn lower_for(&mut self, for_stmt: &'a swc_ecma_ast::ForStmt) -> Region {
        let init = for_stmt.init.as_ref().map(|init| match init {
            VarDeclOrExpr::Expr(expr) => self
                .cfg
                .add_node(NodeKind::Statement, Some(AstRef::Expr(expr))),
            VarDeclOrExpr::VarDecl(_) => self.cfg.add_node(NodeKind::Statement, None),
        });
        let test_ast = for_stmt.test.as_deref().map(AstRef::Expr);
        let test = self.cfg.add_node(NodeKind::LoopTest, test_ast);
        let update = for_stmt
            .update
            .as_deref()
            .map(|update| self.cfg.add_node(NodeKind::LoopUpdate, Some(AstRef::Expr(update))));
        let exit = self.cfg.add_node(NodeKind::Merge, None);

        if let Some(init) = init {
            self.cfg.connect(init, test);
        }

        let back_target = update.unwrap_or(test);
        self.break_stack.push(exit);
        self.continue_stack.push(back_target);
        let body = self.lower_stmt(&for_stmt.body);
        self.continue_stack.pop();
        self.break_stack.pop();

        match body.first {
            Some(first) => {
                self.cfg.connect_outcome(test, first, true);
                if let Some(frontier) = body.frontier {
                    self.cfg.connect(frontier, back_target);
                }
            }
            None => self.cfg.connect_outcome(test, back_target, true),
        }
        if let Some(update) = update {
            self.cfg.connect(update, test);
        }
        self.cfg.connect_outcome(test, exit, false);

        Region {
            first: init.or(Some(test)),
            frontier: Some(exit),
        }
    }

    fn lower_iterated_loop(&mut self, right: &'a Expr, body: &'a Stmt) -> Region {
        let test = self
            .cfg
            .add_node(NodeKind::LoopTest, Some(AstRef::Expr(right)));
        let exit = self.cfg.add_node(NodeKind::Merge, None);

        self.break_stack.push(exit);
        self.continue_stack.push(test);
        let body_region = self.lower_stmt(body);
        self.continue_stack.pop();
        self.break_stack.pop();

        match body_region.first {
            Some(first) => {
                self.cfg.connect_outcome(test, first, true);
                if let Some(frontier) = body_region.frontier {
                    self.cfg.connect(frontier, test);
                }
            }
            None => self.cfg.connect_outcome(test, test, true),
        }
        self.cfg.connect_outcome(test, exit, false);

        Region {
            first: Some(test),
            frontier: Some(exit),
        }
    }

    fn lower_switch(&mut self, switch: &'a swc_ecma_ast::SwitchStmt) -> Region {
        let branch = self
            .cfg
            .add_node(NodeKind::Branch, Some(AstRef::Expr(&*switch.discriminant)));
        let exit = self.cfg.add_node(NodeKind::Merge, None);

        self.break_stack.push(exit);
        let mut has_default = false;
        let mut fall_through: Option<NodeId> = None;

        for case in &switch.cases {
            if case.test.is_none() {
                has_default = true;
            }
            let mut region = self.lower_stmts(&case.cons);
            if region.first.is_none() {
                // Empty case body still needs a node so fall-through and
                // dispatch edges have somewhere to land.
                let node = self.cfg.add_node(NodeKind::Merge, None);
                region = Region::solo(node);
            }
            let first = region.first.expect("case region has a first node");
            self.cfg.connect(branch, first);
            if let Some(prev) = fall_through {
                self.cfg.connect(prev, first);
            }
            fall_through = region.frontier;
        }

        self.break_stack.pop();

        if let Some(last) = fall_through {
            self.cfg.connect(last, exit);
        }
        // A discriminant with no default can skip every case.
        if !has_default {
            self.cfg.connect(branch, exit);
        }

        Region {
            first: Some(branch),
            frontier: Some(exit),
        }
    }

    fn lower_try(&mut self, try_stmt: &'a swc_ecma_ast::TryStmt) -> Region {
        let try_node = self.cfg.add_node(NodeKind::Try, None);
        let merge = self.cfg.add_node(NodeKind::Merge, None);

        let finally = try_stmt.finalizer.as_ref().map(|finalizer| {
            let node = self.cfg.add_node(NodeKind::Finally, None);
            let region = self.lower_stmts(&finalizer.stmts);
            match region.first {
                Some(first) => {
                    self.cfg.connect(node, first);
                    if let Some(frontier) = region.frontier {
                        self.cfg.connect(frontier, merge);
                    }
                }
                None => self.cfg.connect(node, merge),
            }
            node
        });
        // Finally always runs before whatever follows the construct.
        let after = finally.unwrap_or(merge);

        let catch_node = try_stmt
            .handler
            .as_ref()
            .map(|_| self.cfg.add_node(NodeKind::Catch, None));

        if let Some(catch_node) = catch_node {
            // Implicit exception edge: any statement in the protected
            // region may transfer to the handler.
            self.cfg.connect(try_node, catch_node);
            self.catch_stack.push(catch_node);
        }
        let body = self.lower_stmts(&try_stmt.block.stmts);
        if catch_node.is_some() {
            self.catch_stack.pop();
        }

        match body.first {
            Some(first) => {
                self.cfg.connect(try_node, first);
                if let Some(frontier) = body.frontier {
                    self.cfg.connect(frontier, after);
                }
            }
            None => self.cfg.connect(try_node, after),
        }

        if let (Some(catch_node), Some(handler)) = (catch_node, &try_stmt.handler) {
            let handler_region = self.lower_stmts(&handler.body.stmts);
            match handler_region.first {
                Some(first) => {
                    self.cfg.connect(catch_node, first);
                    if let Some(frontier) = handler_region.frontier {
                        self.cfg.connect(frontier, after);
                    }
                }
                None => self.cfg.connect(catch_node, after),
            }
        }

        Region {
            first: Some(try_node),
            frontier: Some(merge),
        }
    }

    // ============================================================
    // Expressions
    // ============================================================

    fn lower_expr(&mut self, expr: &'a Expr) -> Region {
        let unwrapped = unwrap_expr(expr);
        match unwrapped {
            Expr::Bin(bin)
                if matches!(
                    bin.op,
                    BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
                ) =>
            {
                let branch = self
                    .cfg
                    .add_node(NodeKind::Branch, Some(AstRef::Expr(&*bin.left)));
                let merge = self.cfg.add_node(NodeKind::Merge, None);
                let rhs = self.lower_expr(&bin.right);
                let rhs_first = rhs.first.unwrap_or(merge);

                // `a && b` runs b when a is truthy; `a || b` / `a ?? b`
                // run b on the falsy side.
                if bin.op == BinaryOp::LogicalAnd {
                    self.cfg.connect_outcome(branch, rhs_first, true);
                    self.cfg.connect_outcome(branch, merge, false);
                } else {
                    self.cfg.connect_outcome(branch, merge, true);
                    self.cfg.connect_outcome(branch, rhs_first, false);
                }
                if let Some(frontier) = rhs.frontier {
                    self.cfg.connect(frontier, merge);
                }

                Region {
                    first: Some(branch),
                    frontier: Some(merge),
                }
            }
            Expr::Cond(cond) => {
                let branch = self
                    .cfg
                    .add_node(NodeKind::Branch, Some(AstRef::Expr(&*cond.test)));
                let merge = self.cfg.add_node(NodeKind::Merge, None);

                let cons = self.lower_expr(&cond.cons);
                match cons.first {
                    Some(first) => {
                        self.cfg.connect_outcome(branch, first, true);
                        if let Some(frontier) = cons.frontier {
                            self.cfg.connect(frontier, merge);
                        }
                    }
                    None => self.cfg.connect_outcome(branch, merge, true),
                }
                let alt = self.lower_expr(&cond.alt);
                match alt.first {
                    Some(first) => {
                        self.cfg.connect_outcome(branch, first, false);
                        if let Some(frontier) = alt.frontier {
                            self.cfg.connect(frontier, merge);
                        }
                    }
                    None => self.cfg.connect_outcome(branch, merge, false),
                }

                Region {
                    first: Some(branch),
                    frontier: Some(merge),
                }
            }
            Expr::OptChain(opt) => {
                let object: &Expr = match &*opt.base {
                    swc_ecma_ast::OptChainBase::Member(member) => &member.obj,
                    swc_ecma_ast::OptChainBase::Call(call) => &call.callee,
                };
                let branch = self
                    .cfg
                    .add_node(NodeKind::Branch, Some(AstRef::Expr(object)));
                let merge = self.cfg.add_node(NodeKind::Merge, None);
                let continuation = self
                    .cfg
                    .add_node(NodeKind::Statement, Some(AstRef::Expr(expr)));

                self.cfg.connect_outcome(branch, continuation, true);
                // Short-circuit to undefined.
                self.cfg.connect_outcome(branch, merge, false);
                self.cfg.connect(continuation, merge);

                Region {
                    first: Some(branch),
                    frontier: Some(merge),
                }
            }
            Expr::Seq(seq) => {
                let mut first = None;
                let mut frontier: Option<NodeId> = None;
                for inner in &seq.exprs {
                    let region = self.lower_expr(inner);
                    let Some(region_first) = region.first else {
                        continue;
                    };
                    if first.is_none() {
                        first = Some(region_first);
                    } else if let Some(prev) = frontier {
                        self.cfg.connect(prev, region_first);
                    }
                    frontier = region.frontier;
                }
                Region { first, frontier }
            }
            _ => {
                let node = self
                    .cfg
                    .add_node(NodeKind::Statement, Some(AstRef::Expr(expr)));
                Region::solo(node)
            }
        }
    }
}

fn is_conditional_expr(expr: &Expr) -> bool {
    match unwrap_expr(expr) {
        Expr::Bin(bin) => matches!(
            bin.op,
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
        ),
        Expr::Cond(_) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use swc_common::{FileName, SourceMap};
    use swc_ecma_ast::Module;
    use swc_ecma_parser::{Parser, StringInput, Syntax, TsSyntax};

    use super::*;

    fn parse_module(code: &str) -> Module {
        let source_map = SourceMap::default();
        let source_file = source_map
            .new_source_file(FileName::Real("test.tsx".into()).into(), code.to_string());
        let syntax = Syntax::Typescript(TsSyntax {
            tsx: true,
            ..Default::default()
        });
        let mut parser = Parser::new(syntax, StringInput::from(&*source_file), None);
        parser.parse_module().unwrap()
    }

    /// Build a CFG for the body of `function f() { ... }`.
    fn with_body_cfg<R>(code: &str, check: impl FnOnce(&Cfg<'_>) -> R) -> R {
        let module = parse_module(code);
        for item in &module.body {
            if let swc_ecma_ast::ModuleItem::Stmt(Stmt::Decl(swc_ecma_ast::Decl::Fn(f))) = item {
                let block = f.function.body.as_ref().unwrap();
                let cfg = build_block_cfg(&block.stmts);
                return check(&cfg);
            }
        }
        panic!("no function in test source");
    }

    fn count_kind(cfg: &Cfg<'_>, kind: NodeKind) -> usize {
        cfg.iter().filter(|(_, n)| n.kind == kind).count()
    }

    #[test]
    fn test_single_entry_and_exit() {
        with_body_cfg("function f() { a(); b(); }", |cfg| {
            assert_eq!(count_kind(cfg, NodeKind::Entry), 1);
            assert_eq!(count_kind(cfg, NodeKind::Exit), 1);
            assert_eq!(count_kind(cfg, NodeKind::Statement), 2);
        });
    }

    #[test]
    fn test_empty_body_connects_entry_to_exit() {
        with_body_cfg("function f() {}", |cfg| {
            assert_eq!(cfg.node(cfg.entry).succs, vec![cfg.exit]);
        });
    }

    #[test]
    fn test_if_has_branch_and_merge() {
        with_body_cfg("function f() { if (x) { a(); } b(); }", |cfg| {
            assert_eq!(count_kind(cfg, NodeKind::Branch), 1);
            assert_eq!(count_kind(cfg, NodeKind::Merge), 1);
            let (branch_id, branch) = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Branch)
                .unwrap();
            assert!(branch.true_succ.is_some());
            assert!(branch.false_succ.is_some());
            // Empty alternate: false edge lands on the merge.
            let merge = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Merge)
                .map(|(id, _)| id)
                .unwrap();
            assert_eq!(cfg.node(branch_id).false_succ, Some(merge));
        });
    }

    #[test]
    fn test_return_is_terminator_with_exit_edge() {
        with_body_cfg("function f() { return; a(); }", |cfg| {
            let (ret_id, ret) = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Return)
                .unwrap();
            assert_eq!(ret.succs, vec![cfg.exit]);
            // a() is retained but unreachable: no predecessor chain from
            // the return.
            let unreachable = cfg
                .iter()
                .find(|(id, n)| n.kind == NodeKind::Statement && *id != ret_id)
                .unwrap();
            assert!(unreachable.1.preds.is_empty());
        });
    }

    #[test]
    fn test_while_loop_shape() {
        with_body_cfg("function f() { while (x) { a(); } b(); }", |cfg| {
            let (test_id, test) = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::LoopTest)
                .unwrap();
            let body = test.true_succ.unwrap();
            assert_eq!(cfg.node(body).kind, NodeKind::Statement);
            // Body tail loops back to the test.
            assert!(cfg.node(body).succs.contains(&test_id));
            assert!(test.false_succ.is_some());
        });
    }

    #[test]
    fn test_for_loop_update_node() {
        with_body_cfg("function f() { for (let i = 0; i < 3; i++) { a(); } }", |cfg| {
            assert_eq!(count_kind(cfg, NodeKind::LoopTest), 1);
            assert_eq!(count_kind(cfg, NodeKind::LoopUpdate), 1);
            let (update_id, update) = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::LoopUpdate)
                .unwrap();
            let (test_id, _) = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::LoopTest)
                .unwrap();
            assert!(update.succs.contains(&test_id));
            // Body tail goes to the update, not straight to the test.
            let body_stmt = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Statement && n.succs.contains(&update_id))
                .unwrap();
            assert_eq!(body_stmt.1.succs, vec![update_id]);
        });
    }

    #[test]
    fn test_do_while_body_precedes_test() {
        with_body_cfg("function f() { do { a(); } while (x); }", |cfg| {
            // Entry flows into the body first, not the test.
            let entry_succ = cfg.node(cfg.entry).succs[0];
            assert_eq!(cfg.node(entry_succ).kind, NodeKind::Statement);
        });
    }

    #[test]
    fn test_switch_fall_through_and_no_default() {
        with_body_cfg(
            "function f() { switch (x) { case 1: a(); case 2: b(); break; } c(); }",
            |cfg| {
                let (branch_id, branch) = cfg
                    .iter()
                    .find(|(_, n)| n.kind == NodeKind::Branch)
                    .unwrap();
                // One successor per case plus the no-default edge.
                assert_eq!(branch.succs.len(), 3);
                // Fall-through: case 1's statement connects to case 2's.
                let case1 = branch.succs[0];
                let case2 = branch.succs[1];
                assert!(cfg.node(case1).succs.contains(&case2));
                assert_eq!(count_kind(cfg, NodeKind::Break), 1);
                let _ = branch_id;
            },
        );
    }

    #[test]
    fn test_break_targets_loop_exit() {
        with_body_cfg("function f() { while (x) { if (y) break; a(); } b(); }", |cfg| {
            let (break_id, break_node) = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Break)
                .unwrap();
            assert_eq!(break_node.succs.len(), 1);
            let target = break_node.succs[0];
            assert_eq!(cfg.node(target).kind, NodeKind::Merge);
            // The loop exit merge leads onward to b(), never back to the test.
            assert!(!cfg.node(target).succs.iter().any(|&s| {
                cfg.node(s).kind == NodeKind::LoopTest
            }));
            let _ = break_id;
        });
    }

    #[test]
    fn test_try_catch_finally_shape() {
        with_body_cfg(
            "function f() { try { a(); throw e; } catch (err) { b(); } finally { c(); } d(); }",
            |cfg| {
                assert_eq!(count_kind(cfg, NodeKind::Try), 1);
                assert_eq!(count_kind(cfg, NodeKind::Catch), 1);
                assert_eq!(count_kind(cfg, NodeKind::Finally), 1);
                assert_eq!(count_kind(cfg, NodeKind::Throw), 1);

                let (catch_id, _) = cfg
                    .iter()
                    .find(|(_, n)| n.kind == NodeKind::Catch)
                    .unwrap();
                let (throw_id, throw_node) = cfg
                    .iter()
                    .find(|(_, n)| n.kind == NodeKind::Throw)
                    .unwrap();
                // Throws in the protected region enter the handler.
                assert!(throw_node.succs.contains(&catch_id));
                // The try node carries the implicit exception edge.
                let (try_id, try_node) = cfg.iter().find(|(_, n)| n.kind == NodeKind::Try).unwrap();
                assert!(try_node.succs.contains(&catch_id));
                let _ = (throw_id, try_id);
            },
        );
    }

    #[test]
    fn test_short_circuit_creates_branch() {
        with_body_cfg("function f() { x && a(); }", |cfg| {
            assert_eq!(count_kind(cfg, NodeKind::Branch), 1);
            let branch = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Branch)
                .unwrap()
                .1;
            // a() sits on the true side of `&&`.
            let true_side = branch.true_succ.unwrap();
            assert_eq!(cfg.node(true_side).kind, NodeKind::Statement);
            let false_side = branch.false_succ.unwrap();
            assert_eq!(cfg.node(false_side).kind, NodeKind::Merge);
        });
    }

    #[test]
    fn test_nullish_runs_rhs_on_falsy_side() {
        with_body_cfg("function f() { x ?? a(); }", |cfg| {
            let branch = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Branch)
                .unwrap()
                .1;
            let false_side = branch.false_succ.unwrap();
            assert_eq!(cfg.node(false_side).kind, NodeKind::Statement);
        });
    }

    #[test]
    fn test_ternary_creates_branch_with_both_arms() {
        with_body_cfg("function f() { x ? a() : b(); }", |cfg| {
            let branch = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Branch)
                .unwrap()
                .1;
            assert_eq!(cfg.node(branch.true_succ.unwrap()).kind, NodeKind::Statement);
            assert_eq!(cfg.node(branch.false_succ.unwrap()).kind, NodeKind::Statement);
        });
    }

    #[test]
    fn test_optional_chain_branches() {
        with_body_cfg("function f() { obj?.method(); }", |cfg| {
            assert_eq!(count_kind(cfg, NodeKind::Branch), 1);
            let branch = cfg
                .iter()
                .find(|(_, n)| n.kind == NodeKind::Branch)
                .unwrap()
                .1;
            assert!(branch.true_succ.is_some());
            assert!(branch.false_succ.is_some());
        });
    }

    #[test]
    fn test_expression_bodied_arrow() {
        let module = parse_module("const f = () => a() && b();");
        let swc_ecma_ast::ModuleItem::Stmt(Stmt::Decl(swc_ecma_ast::Decl::Var(var))) =
            &module.body[0]
        else {
            panic!("expected var decl");
        };
        let init = var.decls[0].init.as_ref().unwrap();
        let cfg = build_callback_cfg(init).unwrap();
        assert_eq!(
            cfg.iter().filter(|(_, n)| n.kind == NodeKind::Branch).count(),
            1
        );
    }

    #[test]
    fn test_callback_reference_has_no_cfg() {
        let module = parse_module("const f = handler;");
        let swc_ecma_ast::ModuleItem::Stmt(Stmt::Decl(swc_ecma_ast::Decl::Var(var))) =
            &module.body[0]
        else {
            panic!("expected var decl");
        };
        let init = var.decls[0].init.as_ref().unwrap();
        assert!(build_callback_cfg(init).is_none());
    }
}
