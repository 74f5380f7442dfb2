//! Members released by a dispose-like call.

use rustc_hash::FxHashSet;

use crate::{
    config::AnalyzerConfig,
    host::syntax::{Expr, ExprKind, MethodBody, MethodDecl, Pattern, Stmt, StmtKind},
};

use super::FixtureClass;

/// Names of the tracked members disposed anywhere in `methods` or in the methods of the class
/// they call
pub(crate) fn disposed_in<'c>(
    class: &FixtureClass<'c>,
    config: &AnalyzerConfig,
    methods: impl IntoIterator<Item = &'c MethodDecl>,
) -> FxHashSet<&'c str> {
    let mut walker = DisposalWalker {
        class,
        config,
        visited: FxHashSet::default(),
        aliases: Vec::new(),
        disposed: FxHashSet::default(),
    };
    for method in methods {
        walker.method(method);
    }
    walker.disposed
}

struct DisposalWalker<'a, 'c> {
    class: &'a FixtureClass<'c>,
    config: &'a AnalyzerConfig,
    visited: FxHashSet<usize>,
    /// Pattern variables standing for a member: `if (member is IDisposable alias)`
    aliases: Vec<(&'c str, &'c str)>,
    disposed: FxHashSet<&'c str>,
}

impl<'c> DisposalWalker<'_, 'c> {
    fn method(&mut self, method: &'c MethodDecl) {
        if !self.visited.insert(method.span.start) {
            return;
        }
        let aliases = std::mem::take(&mut self.aliases);
        match &method.body {
            Some(MethodBody::Block(block)) => self.stmts(&block.stmts),
            Some(MethodBody::Expr(expr)) => self.expression(expr),
            None => {}
        }
        self.aliases = aliases;
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
            StmtKind::If { cond, then, otherwise } => {
                let depth = self.aliases.len();
                self.bind_alias(cond);
                self.stmt(then);
                self.aliases.truncate(depth);
                if let Some(otherwise) = otherwise {
                    self.stmt(otherwise);
                }
            }
            StmtKind::Switch { sections, .. } => {
                for section in sections {
                    self.stmts(&section.stmts);
                }
            }
            StmtKind::Try {
                block,
                catches,
                finally,
            } => {
                self.stmts(&block.stmts);
                for catch in catches {
                    self.stmts(&catch.block.stmts);
                }
                if let Some(finally) = finally {
                    self.stmts(&finally.stmts);
                }
            }
            _ => {}
        }
    }

    fn bind_alias(&mut self, cond: &'c Expr) {
        let ExprKind::Is { expr, pattern } = &cond.unparenthesized().kind else {
            return;
        };
        let Pattern::Type {
            designation: Some(alias),
            ..
        } = pattern
        else {
            return;
        };
        if let Some(member) = self.class.tracked_name(expr) {
            self.aliases.push((alias.text.as_str(), member));
        }
    }

    fn expression(&mut self, expr: &'c Expr) {
        let mut expr = expr.unparenthesized();
        if let ExprKind::Await(operand) = &expr.kind {
            expr = without_configure_await(operand);
        }
        match &expr.kind {
            ExprKind::Invocation { callee, .. } => match &callee.kind {
                ExprKind::MemberAccess { target, name, .. }
                    if self.config.is_dispose_method(&name.text) =>
                {
                    if let Some(member) = self.disposal_target(target) {
                        self.disposed.insert(member);
                    }
                }
                _ => {
                    if let Some(method) = self.class.local_method(expr) {
                        self.method(method);
                    }
                }
            },
            ExprKind::ConditionalAccess { target, access } => {
                let access = without_configure_await(access);
                if let ExprKind::Invocation { callee, .. } = &access.kind {
                    if let ExprKind::MemberBinding { name, .. } = &callee.kind {
                        if self.config.is_dispose_method(&name.text) {
                            if let Some(member) = self.disposal_target(target) {
                                self.disposed.insert(member);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    /// The member released through `receiver`, looking through casts and pattern aliases
    fn disposal_target(&self, receiver: &'c Expr) -> Option<&'c str> {
        let mut receiver = receiver.unparenthesized();
        loop {
            match &receiver.kind {
                ExprKind::As { expr, .. } | ExprKind::Cast { expr, .. } => {
                    receiver = expr.unparenthesized();
                }
                _ => break,
            }
        }
        if let ExprKind::Name { name, .. } = &receiver.kind {
            if let Some((_, member)) = self.aliases.iter().rev().find(|(alias, _)| name.is(alias)) {
                return Some(*member);
            }
        }
        self.class.tracked_name(receiver)
    }
}

/// `x.ConfigureAwait(..)` as `x`
fn without_configure_await(expr: &Expr) -> &Expr {
    let expr = expr.unparenthesized();
    if let ExprKind::Invocation { callee, .. } = &expr.kind {
        if let ExprKind::MemberAccess { target, name, .. } = &callee.kind {
            if name.is("ConfigureAwait") {
                return target.unparenthesized();
            }
        }
    }
    expr
}
