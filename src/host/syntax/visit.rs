//! Read-only traversal of syntax trees.
//!
//! Implement [`Visitor`] and override the hooks of interest; the default implementations
//! forward to the `walk_*` functions, which visit every child node in source order.

use crate::host::syntax::ast::{
    ArgumentList, Block, CompilationUnit, Expr, ExprKind, LambdaBody, MemberDecl, MethodBody,
    MethodDecl, NamespaceMember, Pattern, Stmt, StmtKind, TypeDecl, UsingResource,
};

/// Syntax tree visitor
pub trait Visitor<'a> {
    /// Called for every type declaration
    fn visit_type(&mut self, decl: &'a TypeDecl) {
        walk_type(self, decl);
    }

    /// Called for every method, constructor and local function
    fn visit_method(&mut self, method: &'a MethodDecl) {
        walk_method(self, method);
    }

    /// Called for every statement
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        walk_stmt(self, stmt);
    }

    /// Called for every expression
    fn visit_expr(&mut self, expr: &'a Expr) {
        walk_expr(self, expr);
    }
}

/// Visit every type declaration of a compilation unit
pub fn walk_unit<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, unit: &'a CompilationUnit) {
    fn members<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, list: &'a [NamespaceMember]) {
        for member in list {
            match member {
                NamespaceMember::Namespace(ns) => members(visitor, &ns.members),
                NamespaceMember::Type(decl) => visitor.visit_type(decl),
            }
        }
    }
    members(visitor, &unit.members);
}

/// Visit the members of a type declaration
pub fn walk_type<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, decl: &'a TypeDecl) {
    for member in &decl.members {
        match member {
            MemberDecl::Field(field) => {
                for declarator in &field.declarators {
                    if let Some(init) = &declarator.init {
                        visitor.visit_expr(init);
                    }
                }
            }
            MemberDecl::Property(property) => {
                for accessor in &property.accessors {
                    if let Some(body) = &accessor.body {
                        walk_body(visitor, body);
                    }
                }
                if let Some(body) = &property.expr_body {
                    visitor.visit_expr(body);
                }
                if let Some(init) = &property.initializer {
                    visitor.visit_expr(init);
                }
            }
            MemberDecl::Method(method) => visitor.visit_method(method),
            MemberDecl::Type(nested) => visitor.visit_type(nested),
        }
    }
}

/// Visit the constructor initializer and body of a method
pub fn walk_method<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, method: &'a MethodDecl) {
    if let Some(initializer) = &method.initializer {
        walk_args(visitor, initializer);
    }
    if let Some(body) = &method.body {
        walk_body(visitor, body);
    }
}

/// Visit a method body
pub fn walk_body<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, body: &'a MethodBody) {
    match body {
        MethodBody::Block(block) => walk_block(visitor, block),
        MethodBody::Expr(expr) => visitor.visit_expr(expr),
    }
}

/// Visit the statements of a block
pub fn walk_block<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, block: &'a Block) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt);
    }
}

fn walk_args<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, args: &'a ArgumentList) {
    for arg in &args.args {
        visitor.visit_expr(&arg.expr);
    }
}

fn walk_pattern<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, pattern: &'a Pattern) {
    match pattern {
        Pattern::Constant(expr) => visitor.visit_expr(expr),
        Pattern::Not(inner) => walk_pattern(visitor, inner),
        _ => {}
    }
}

/// Visit the children of a statement
pub fn walk_stmt<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, stmt: &'a Stmt) {
    match &stmt.kind {
        StmtKind::Block(block) => walk_block(visitor, block),
        StmtKind::Local { declarators, .. } => {
            for declarator in declarators {
                if let Some(init) = &declarator.init {
                    visitor.visit_expr(init);
                }
            }
        }
        StmtKind::Expression(expr) => visitor.visit_expr(expr),
        StmtKind::If { cond, then, otherwise } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(then);
            if let Some(otherwise) = otherwise {
                visitor.visit_stmt(otherwise);
            }
        }
        StmtKind::Switch { expr, sections } => {
            visitor.visit_expr(expr);
            for section in sections {
                for label in section.labels.iter().flatten() {
                    walk_pattern(visitor, label);
                }
                for stmt in &section.stmts {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        StmtKind::Try { block, catches, finally } => {
            walk_block(visitor, block);
            for catch in catches {
                if let Some(filter) = &catch.filter {
                    visitor.visit_expr(filter);
                }
                walk_block(visitor, &catch.block);
            }
            if let Some(finally) = finally {
                walk_block(visitor, finally);
            }
        }
        StmtKind::Using { resource, body, .. } => {
            match resource {
                UsingResource::Declaration { declarators, .. } => {
                    for declarator in declarators {
                        if let Some(init) = &declarator.init {
                            visitor.visit_expr(init);
                        }
                    }
                }
                UsingResource::Expr(expr) => visitor.visit_expr(expr),
            }
            visitor.visit_stmt(body);
        }
        StmtKind::Return(value) | StmtKind::Throw(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::While { cond, body } | StmtKind::DoWhile { body, cond } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(body);
        }
        StmtKind::For { init, cond, step, body } => {
            if let Some(init) = init {
                visitor.visit_stmt(init);
            }
            if let Some(cond) = cond {
                visitor.visit_expr(cond);
            }
            for step in step {
                visitor.visit_expr(step);
            }
            visitor.visit_stmt(body);
        }
        StmtKind::Foreach { expr, body, .. } | StmtKind::Lock { expr, body } => {
            visitor.visit_expr(expr);
            visitor.visit_stmt(body);
        }
        StmtKind::LocalFunction(method) => visitor.visit_method(method),
        StmtKind::Break | StmtKind::Continue | StmtKind::Empty => {}
    }
}

/// Visit the children of an expression
pub fn walk_expr<'a, V: Visitor<'a> + ?Sized>(visitor: &mut V, expr: &'a Expr) {
    match &expr.kind {
        ExprKind::Name { .. }
        | ExprKind::PredefinedType(_)
        | ExprKind::Literal(_)
        | ExprKind::Interpolated(_)
        | ExprKind::MemberBinding { .. }
        | ExprKind::TypeOf(_)
        | ExprKind::Default(_)
        | ExprKind::Declaration { .. }
        | ExprKind::This
        | ExprKind::Base => {}
        ExprKind::MemberAccess { target, .. } => visitor.visit_expr(target),
        ExprKind::ConditionalAccess { target, access } => {
            visitor.visit_expr(target);
            visitor.visit_expr(access);
        }
        ExprKind::Invocation { callee, args } => {
            visitor.visit_expr(callee);
            walk_args(visitor, args);
        }
        ExprKind::ElementAccess { target, args } => {
            visitor.visit_expr(target);
            walk_args(visitor, args);
        }
        ExprKind::ObjectCreation { args, initializer, .. } => {
            if let Some(args) = args {
                walk_args(visitor, args);
            }
            for element in initializer.iter().flatten() {
                visitor.visit_expr(element);
            }
        }
        ExprKind::ArrayCreation { sizes, initializer, .. } => {
            for size in sizes {
                visitor.visit_expr(size);
            }
            for element in initializer.iter().flatten() {
                visitor.visit_expr(element);
            }
        }
        ExprKind::InitializerList(elements) => {
            for element in elements {
                visitor.visit_expr(element);
            }
        }
        ExprKind::Conditional { cond, when_true, when_false } => {
            visitor.visit_expr(cond);
            visitor.visit_expr(when_true);
            visitor.visit_expr(when_false);
        }
        ExprKind::Binary { left, right, .. } => {
            visitor.visit_expr(left);
            visitor.visit_expr(right);
        }
        ExprKind::Assignment { target, value, .. } => {
            visitor.visit_expr(target);
            visitor.visit_expr(value);
        }
        ExprKind::Unary { operand, .. }
        | ExprKind::Await(operand)
        | ExprKind::Parenthesized(operand)
        | ExprKind::Throw(operand) => visitor.visit_expr(operand),
        ExprKind::Is { expr, pattern } => {
            visitor.visit_expr(expr);
            walk_pattern(visitor, pattern);
        }
        ExprKind::As { expr, .. } | ExprKind::Cast { expr, .. } => visitor.visit_expr(expr),
        ExprKind::Lambda { body, .. } => match body {
            LambdaBody::Expr(body) => visitor.visit_expr(body),
            LambdaBody::Block(block) => walk_block(visitor, block),
        },
        ExprKind::Tuple(elements) => {
            for element in elements {
                visitor.visit_expr(&element.expr);
            }
        }
    }
}

/// Collect every expression matching `predicate` below `stmt`, in source order
pub fn collect_exprs<'a>(stmt: &'a Stmt, predicate: impl Fn(&'a Expr) -> bool) -> Vec<&'a Expr> {
    struct Collector<'a, F> {
        predicate: F,
        found: Vec<&'a Expr>,
    }

    impl<'a, F: Fn(&'a Expr) -> bool> Visitor<'a> for Collector<'a, F> {
        fn visit_expr(&mut self, expr: &'a Expr) {
            if (self.predicate)(expr) {
                self.found.push(expr);
            }
            walk_expr(self, expr);
        }
    }

    let mut collector = Collector {
        predicate,
        found: Vec::new(),
    };
    collector.visit_stmt(stmt);
    collector.found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::syntax::SyntaxTree;

    struct InvocationNames(Vec<String>);

    impl<'a> Visitor<'a> for InvocationNames {
        fn visit_expr(&mut self, expr: &'a Expr) {
            if let Some(name) = expr.invoked_name() {
                self.0.push(name.to_string());
            }
            walk_expr(self, expr);
        }
    }

    #[test]
    fn test_visitor_reaches_nested_invocations() {
        let tree = SyntaxTree::parse(
            "t.cs",
            "class C { void M() { Assert.Multiple(() => { Assert.That(F(), Is.True); }); } }",
        )
        .unwrap();
        let mut names = InvocationNames(Vec::new());
        walk_unit(&mut names, tree.root());
        assert_eq!(names.0, vec!["Multiple", "That", "F"]);
    }

    #[test]
    fn test_walk_unit_enters_nested_namespaces() {
        let tree = SyntaxTree::parse(
            "t.cs",
            "namespace Outer
{
    class A { void M() { First(); } }
    namespace Inner
    {
        class B { void M() { Second(); } }
    }
}
class C { void M() { Third(); } }",
        )
        .unwrap();
        let mut names = InvocationNames(Vec::new());
        walk_unit(&mut names, tree.root());
        assert_eq!(names.0, vec!["First", "Second", "Third"]);
    }
}
