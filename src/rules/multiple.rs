//! Consecutive independent `Assert.That` statements.

use rustc_hash::FxHashSet;

use crate::{
    host::syntax::{
        visit::{walk_expr, Visitor},
        Expr, ExprKind, MethodBody, Stmt, StmtKind, UsingResource,
    },
    query::{self, AssertClass},
    rules::{
        descriptor::{Category, DiagnosticDescriptor, Severity},
        diagnostic::{keys, Diagnostic, Properties},
        Rule, RuleContext,
    },
    Result,
};

/// NUnit2045
pub static USE_ASSERT_MULTIPLE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit2045",
    title: "Use Assert.Multiple",
    message_format: "Call independent Assert statements from inside an Assert.Multiple",
    category: Category::Assertion,
    default_severity: Severity::Info,
    description: "Grouping independent assertions reports every failure instead of stopping \
                  at the first one.",
};

/// Reports runs of at least two consecutive `Assert.That` statements whose actual values do not
/// depend on each other
pub struct MultipleAssertsRule;

/// One `Assert.That` statement of a run
struct AssertStmt<'c> {
    stmt: &'c Stmt,
    actual: &'c Expr,
}

/// Names referenced anywhere in `expr`
fn referenced_names(expr: &Expr) -> FxHashSet<&str> {
    struct Names<'a>(FxHashSet<&'a str>);

    impl<'a> Visitor<'a> for Names<'a> {
        fn visit_expr(&mut self, expr: &'a Expr) {
            if let ExprKind::Name { name, .. } = &expr.kind {
                self.0.insert(name.text.as_str());
            }
            walk_expr(self, expr);
        }
    }

    let mut names = Names(FxHashSet::default());
    names.visit_expr(expr);
    names.0
}

struct Scanner<'r, 'c> {
    cx: &'r RuleContext<'c>,
    runs: Vec<Vec<AssertStmt<'c>>>,
}

impl<'c> Scanner<'_, 'c> {
    /// The statement as an `Assert.That(actual, ...)` call
    fn assert_that(&self, stmt: &'c Stmt) -> Option<AssertStmt<'c>> {
        let StmtKind::Expression(expr) = &stmt.kind else {
            return None;
        };
        let assert = query::assert_invocation(&self.cx.cx, expr)?;
        if !assert.is(AssertClass::Assert, "That") {
            return None;
        }
        let actual = &assert.args.args.first()?.expr;
        Some(AssertStmt { stmt, actual })
    }

    fn stmts(&mut self, stmts: &'c [Stmt]) {
        let mut run: Vec<AssertStmt<'c>> = Vec::new();
        let mut actuals: FxHashSet<&'c str> = FxHashSet::default();
        for stmt in stmts {
            match self.assert_that(stmt) {
                Some(assert) => {
                    let dependent = referenced_names(assert.actual)
                        .iter()
                        .any(|name| actuals.contains(name));
                    if dependent {
                        self.flush(&mut run);
                        actuals.clear();
                    }
                    if let ExprKind::Name { name, .. } = &assert.actual.unparenthesized().kind {
                        actuals.insert(name.text.as_str());
                    }
                    run.push(assert);
                }
                None => {
                    self.flush(&mut run);
                    actuals.clear();
                    self.stmt(stmt);
                }
            }
        }
        self.flush(&mut run);
    }

    fn flush(&mut self, run: &mut Vec<AssertStmt<'c>>) {
        let run = std::mem::take(run);
        if run.len() >= 2 {
            self.runs.push(run);
        }
    }

    fn stmt(&mut self, stmt: &'c Stmt) {
        match &stmt.kind {
            StmtKind::Block(block) => self.stmts(&block.stmts),
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
            StmtKind::Try { block, catches, finally } => {
                self.stmts(&block.stmts);
                for catch in catches {
                    self.stmts(&catch.block.stmts);
                }
                if let Some(finally) = finally {
                    self.stmts(&finally.stmts);
                }
            }
            StmtKind::Using { resource, body, .. } => {
                let multiple_scope = matches!(
                    resource,
                    UsingResource::Expr(expr) if expr.invoked_name() == Some("EnterMultipleScope")
                );
                if !multiple_scope {
                    self.stmt(body);
                }
            }
            StmtKind::While { body, .. }
            | StmtKind::DoWhile { body, .. }
            | StmtKind::For { body, .. }
            | StmtKind::Foreach { body, .. }
            | StmtKind::Lock { body, .. } => self.stmt(body),
            StmtKind::LocalFunction(method) => {
                if let Some(MethodBody::Block(block)) = &method.body {
                    self.stmts(&block.stmts);
                }
            }
            _ => {}
        }
    }
}

impl Rule for MultipleAssertsRule {
    fn name(&self) -> &'static str {
        "assert-multiple"
    }

    fn descriptors(&self) -> Vec<&'static DiagnosticDescriptor> {
        vec![&USE_ASSERT_MULTIPLE]
    }

    fn analyze(&self, cx: &RuleContext<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<()> {
        let mut scanner = Scanner { cx, runs: Vec::new() };
        for decl in cx.cx.tree.root().types() {
            cx.check_cancelled()?;
            for method in decl.methods() {
                if let Some(MethodBody::Block(block)) = &method.body {
                    scanner.stmts(&block.stmts);
                }
            }
        }

        let supports_scope = cx.config().supports_enter_multiple_scope();
        for run in scanner.runs {
            let (Some(first), Some(last)) = (run.first(), run.last()) else {
                continue;
            };
            let span = first.stmt.span.cover(last.stmt.span);
            let properties = Properties::new()
                .with(keys::SUPPORTS_ENTER_MULTIPLE_SCOPE, supports_scope)
                .with(keys::STATEMENT_COUNT, run.len());
            diagnostics.push(
                Diagnostic::new(&USE_ASSERT_MULTIPLE, cx.tree(), span, &[])
                    .with_properties(properties)
                    .with_additional_spans(run.iter().map(|a| a.stmt.span).collect()),
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AnalyzerConfig, FrameworkVersion},
        test::{compile, compile_with, fixture},
    };
    use crate::engine::CancellationToken;

    fn run_on(compilation: &crate::Compilation) -> Vec<Diagnostic> {
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        MultipleAssertsRule.analyze(&cx, &mut diagnostics).unwrap();
        diagnostics
    }

    #[test]
    fn test_consecutive_asserts() {
        let compilation = compile(&fixture(
            "var a = GetValue();
            var b = GetValue();
            Assert.That(a, Is.EqualTo(1));
            Assert.That(b, Is.EqualTo(2));
            Assert.That(a + b, Is.EqualTo(3));
            M(a);
            Assert.That(b, Is.Positive);",
        ));
        let diagnostics = run_on(&compilation);
        assert_eq!(diagnostics.len(), 1);
        let diagnostic = &diagnostics[0];
        assert_eq!(diagnostic.additional_spans.len(), 2);
        assert_eq!(diagnostic.properties.number(keys::STATEMENT_COUNT).unwrap(), 2);
        assert!(!diagnostic.properties.flag(keys::SUPPORTS_ENTER_MULTIPLE_SCOPE).unwrap());
        let text = compilation.tree(0).text_of(diagnostic.span);
        assert!(text.starts_with("Assert.That(a, Is.EqualTo(1));"));
        assert!(text.ends_with("Assert.That(b, Is.EqualTo(2));"));
    }

    #[test]
    fn test_dependent_actual_starts_a_new_run() {
        let compilation = compile(&fixture(
            "var text = GetValue().ToString();
            Assert.That(text, Is.Not.Null);
            Assert.That(text.Length, Is.EqualTo(2));
            Assert.That(GetValue(), Is.Positive);",
        ));
        let diagnostics = run_on(&compilation);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].properties.number(keys::STATEMENT_COUNT).unwrap(), 2);
        assert!(compilation
            .tree(0)
            .text_of(diagnostics[0].span)
            .starts_with("Assert.That(text.Length"));
    }

    #[test]
    fn test_grouped_asserts_are_not_reported() {
        let source = fixture(
            "Assert.Multiple(() =>
            {
                Assert.That(1, Is.EqualTo(1));
                Assert.That(2, Is.EqualTo(2));
            });
            using (Assert.EnterMultipleScope())
            {
                Assert.That(1, Is.EqualTo(1));
                Assert.That(2, Is.EqualTo(2));
            }",
        );
        let config =
            AnalyzerConfig::default().with_framework_version(FrameworkVersion::new(4, 2, 0));
        let compilation = compile_with(&source, config);
        assert!(run_on(&compilation).is_empty());
    }

    #[test]
    fn test_nested_blocks_and_scope_support() {
        let source = fixture(
            "if (GetValue() > 0)
            {
                Assert.That(1, Is.EqualTo(1));
                Assert.That(2, Is.EqualTo(2));
            }",
        );
        let config =
            AnalyzerConfig::default().with_framework_version(FrameworkVersion::new(4, 3, 0));
        let diagnostics = run_on(&compile_with(&source, config));
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0]
            .properties
            .flag(keys::SUPPORTS_ENTER_MULTIPLE_SCOPE)
            .unwrap());
    }
}
