//! Members receiving a disposable value.

use rustc_hash::FxHashSet;

use crate::host::syntax::{AssignOp, Expr, ExprKind, MethodBody, MethodDecl, Stmt, StmtKind};

use super::FixtureClass;

/// Names of the tracked members assigned a disposable value anywhere in `methods` or in the
/// methods of the class they call
pub(crate) fn assigned_in<'c>(
    class: &FixtureClass<'c>,
    methods: impl IntoIterator<Item = &'c MethodDecl>,
) -> FxHashSet<&'c str> {
    let mut walker = AssignmentWalker {
        class,
        visited: FxHashSet::default(),
        assigned: FxHashSet::default(),
    };
    for method in methods {
        walker.method(method);
    }
    walker.assigned
}

struct AssignmentWalker<'a, 'c> {
    class: &'a FixtureClass<'c>,
    visited: FxHashSet<usize>,
    assigned: FxHashSet<&'c str>,
}

impl<'c> AssignmentWalker<'_, 'c> {
    fn method(&mut self, method: &'c MethodDecl) {
        if !self.visited.insert(method.span.start) {
            return;
        }
        match &method.body {
            Some(MethodBody::Block(block)) => self.stmts(&block.stmts),
            Some(MethodBody::Expr(expr)) => self.expression(expr),
            None => {}
        }
    }

    fn stmts(&mut self, stmts: &'c [Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &'c Stmt) {
        match &stmt.kind {
            StmtKind::Block(block) => self.stmts(&block.stmts),
            StmtKind::Expression(expr) => self.expression(expr),
            StmtKind::If { then, otherwise, .. } => {
                self.stmt(then);
                if let Some(otherwise) = otherwise {
                    self.stmt(otherwise);
                }
            }
            StmtKind::Switch { sections, .. } => {
                for section in sections {
                    self.stmts(&section.stmts);
                }
            }
            StmtKind::Try { block, finally, .. } => {
                self.stmts(&block.stmts);
                if let Some(finally) = finally {
                    self.stmts(&finally.stmts);
                }
            }
            _ => {}
        }
    }

    fn expression(&mut self, expr: &'c Expr) {
        let mut expr = expr.unparenthesized();
        if let ExprKind::Await(operand) = &expr.kind {
            expr = operand.unparenthesized();
        }
        match &expr.kind {
            ExprKind::Assignment {
                op: AssignOp::Assign | AssignOp::Coalesce,
                target,
                value,
            } => {
                if let Some(name) = self.class.tracked_name(target) {
                    if self.class.creates_disposable(value) {
                        self.assigned.insert(name);
                    }
                }
            }
            ExprKind::Invocation { .. } => {
                if let Some(method) = self.class.local_method(expr) {
                    self.method(method);
                }
            }
            _ => {}
        }
    }
}
