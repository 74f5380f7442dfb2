//! The constraint-expression model.
//!
//! A constraint argument such as `Is.Not.EqualTo(expected).IgnoreCase | Has.Count.Zero` is a
//! fluent chain, possibly several chains joined by `&`/`|` or continued with the `And`, `Or`
//! and `With` properties. [`ConstraintExpression::parse`] splits it into logical
//! [`ConstraintExpressionPart`]s, binary operators first and continuation properties second,
//! and classifies the links of every part into prefixes, a root and suffixes.
//!
//! # Examples
//!
//! ```rust
//! use assertscope::{constraints::ConstraintExpression, query::{self, TreeContext}, Compilation};
//! use assertscope::host::syntax::ExprKind;
//!
//! let compilation = Compilation::from_source(
//!     "Tests.cs",
//!     "using NUnit.Framework; class T { void M() { \
//!      Assert.That(\"a\", Is.Not.EqualTo(\"A\").IgnoreCase); } }",
//! )?;
//! let cx = TreeContext::new(&compilation, 0);
//! let that = query::invocations(cx.tree.root())[0];
//! let ExprKind::Invocation { args, .. } = &that.kind else { unreachable!() };
//! let expression = ConstraintExpression::parse(&cx, &args.args[1].expr);
//! let part = &expression.parts()[0];
//! assert_eq!(part.root_name(), Some("EqualTo"));
//! assert!(part.has_prefix("Not"));
//! assert!(part.has_suffix("IgnoreCase"));
//! # Ok::<(), assertscope::Error>(())
//! ```

mod part;

pub use part::{ChainLink, ConstraintExpressionPart, ExpectedArgument};

use crate::{
    host::{
        semantic::Symbol,
        syntax::{ArgumentList, BinaryOp, Expr, ExprKind, Ident, UnaryOp},
        types::Ty,
    },
    query::TreeContext,
};

/// Properties that end one constraint part and start the next
pub const CONTINUATION_COMBINATORS: [&str; 3] = ["And", "Or", "With"];

/// A constraint argument split into its logical parts
#[derive(Debug, Clone)]
pub struct ConstraintExpression<'c> {
    expr: &'c Expr,
    parts: Vec<ConstraintExpressionPart<'c>>,
}

impl<'c> ConstraintExpression<'c> {
    /// Split `expr` into parts. Never fails: shapes that cannot be analysed produce parts
    /// reporting [`ConstraintExpressionPart::has_unknown_expressions`].
    #[must_use]
    pub fn parse(cx: &TreeContext<'c>, expr: &'c Expr) -> Self {
        let mut parts = Vec::new();
        for operand in split_binary(expr) {
            split_chain(cx, operand, &mut parts);
        }
        ConstraintExpression { expr, parts }
    }

    /// The parsed expression
    #[must_use]
    pub fn expr(&self) -> &'c Expr {
        self.expr
    }

    /// The parts in source order; never empty
    #[must_use]
    pub fn parts(&self) -> &[ConstraintExpressionPart<'c>] {
        &self.parts
    }

    /// The source text of every part
    #[must_use]
    pub fn part_texts(&self, cx: &TreeContext<'c>) -> Vec<&'c str> {
        self.parts.iter().map(|p| p.text(cx)).collect()
    }

    /// True if any part cannot be analysed statically
    #[must_use]
    pub fn has_unknown_expressions(&self) -> bool {
        self.parts.iter().any(ConstraintExpressionPart::has_unknown_expressions)
    }
}

/// Operands of top-level `&` and `|` operators, left to right
fn split_binary(expr: &Expr) -> Vec<&Expr> {
    let expr = expr.unparenthesized();
    match &expr.kind {
        ExprKind::Binary {
            op: BinaryOp::BitAnd | BinaryOp::BitOr,
            left,
            right,
        } => {
            let mut operands = split_binary(left);
            operands.extend(split_binary(right));
            operands
        }
        ExprKind::Unary {
            op: UnaryOp::Not,
            operand,
        } => split_binary(operand),
        _ => vec![expr],
    }
}

/// Split one chain at its continuation combinators and push the resulting parts
fn split_chain<'c>(
    cx: &TreeContext<'c>,
    expr: &'c Expr,
    parts: &mut Vec<ConstraintExpressionPart<'c>>,
) {
    let (base, links) = flatten(cx, expr);
    let (helper_class, unknown_base) = classify_base(cx, base);

    let mut start = base.map_or_else(
        || links.first().map_or(expr.span.start, |l| l.expr.span.start),
        |b| b.span.start,
    );
    let mut helper_class = helper_class;
    let mut unknown_base = unknown_base;
    let mut current = Vec::new();
    let mut links = links.into_iter().peekable();

    while let Some(link) = links.next() {
        let is_combinator =
            !link.is_invocation() && CONTINUATION_COMBINATORS.iter().any(|c| link.is(c));
        if is_combinator && !current.is_empty() {
            let end = current
                .last()
                .map_or(start, |l: &ChainLink<'c>| l.expr.span.end);
            parts.push(ConstraintExpressionPart::new(
                cx,
                helper_class.take(),
                std::mem::take(&mut current),
                start,
                end,
                unknown_base,
            ));
            unknown_base = false;
            if let Some(next) = links.peek() {
                start = next.name.span.start;
            }
            continue;
        }
        current.push(link);
    }

    let end = current.last().map_or(expr.span.end, |l| l.expr.span.end);
    parts.push(ConstraintExpressionPart::new(
        cx,
        helper_class,
        current,
        start,
        end,
        unknown_base,
    ));
}

/// The chain's base expression (if it does not start with a bare member name) and its links in
/// source order
fn flatten<'c>(cx: &TreeContext<'c>, expr: &'c Expr) -> (Option<&'c Expr>, Vec<ChainLink<'c>>) {
    let mut links = Vec::new();
    let mut current = expr.unparenthesized();
    let base = loop {
        match &current.kind {
            ExprKind::Invocation { callee, args } => match &callee.kind {
                ExprKind::MemberAccess { target, name, .. } => {
                    links.push(link(cx, current, name, Some(args)));
                    current = target.unparenthesized();
                }
                ExprKind::Name { name, .. } => {
                    links.push(link(cx, current, name, Some(args)));
                    break None;
                }
                _ => break Some(current),
            },
            ExprKind::MemberAccess { target, name, .. } => {
                if is_type_or_namespace(cx.symbol_of(current)) {
                    break Some(current);
                }
                links.push(link(cx, current, name, None));
                current = target.unparenthesized();
            }
            ExprKind::Name { name, .. } if is_static_member(cx, current) => {
                links.push(link(cx, current, name, None));
                break None;
            }
            _ => break Some(current),
        }
    };
    links.reverse();
    (base, links)
}

fn link<'c>(
    cx: &TreeContext<'c>,
    expr: &'c Expr,
    name: &'c Ident,
    args: Option<&'c ArgumentList>,
) -> ChainLink<'c> {
    let symbol = match &expr.kind {
        ExprKind::Invocation { callee, .. } => cx.symbol_of(callee),
        _ => cx.symbol_of(expr),
    };
    ChainLink {
        expr,
        name,
        args,
        ty: cx.type_of(expr),
        call: cx.call_of(expr),
        symbol,
    }
}

/// A bare name bound to a static member, as imported with `using static`
fn is_static_member(cx: &TreeContext<'_>, expr: &Expr) -> bool {
    matches!(cx.symbol_of(expr), Some(Symbol::Member(m)) if cx.member(m).is_static())
}

fn is_type_or_namespace(symbol: Option<&Symbol>) -> bool {
    matches!(symbol, Some(Symbol::Type(_) | Symbol::Namespace(_)))
}

/// Helper class of a chain base, and whether the base defeats static analysis
fn classify_base(cx: &TreeContext<'_>, base: Option<&Expr>) -> (Option<Ty>, bool) {
    let Some(base) = base else {
        return (None, false);
    };
    match (&base.kind, cx.symbol_of(base)) {
        (_, Some(Symbol::Type(ty))) => (Some(ty.clone()), false),
        (ExprKind::ObjectCreation { .. }, _) => (None, cx.type_of(base).is_error()),
        _ => (None, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{compile, find_expr, fixture};

    fn parts_of(body: &str, constraint: &str) -> (Vec<String>, Vec<bool>) {
        let compilation = compile(&fixture(body));
        let cx = TreeContext::new(&compilation, 0);
        let expression = ConstraintExpression::parse(&cx, find_expr(&compilation, constraint));
        (
            expression
                .part_texts(&cx)
                .into_iter()
                .map(ToString::to_string)
                .collect(),
            expression
                .parts()
                .iter()
                .map(ConstraintExpressionPart::has_unknown_expressions)
                .collect(),
        )
    }

    #[test]
    fn test_continuation_split() {
        let (texts, unknown) = parts_of(
            "Assert.That(\"a\", Is.Empty.Or.Some.EqualTo(\"A\").IgnoreCase);",
            "Is.Empty.Or.Some.EqualTo(\"A\").IgnoreCase",
        );
        assert_eq!(texts, vec!["Is.Empty", "Some.EqualTo(\"A\").IgnoreCase"]);
        assert_eq!(unknown, vec![false, false]);
    }

    #[test]
    fn test_binary_split_comes_first() {
        let (texts, _) = parts_of(
            "Assert.That(1, Is.Null | Is.Positive.And.LessThan(5) & Is.Not.Zero);",
            "Is.Null | Is.Positive.And.LessThan(5) & Is.Not.Zero",
        );
        assert_eq!(texts, vec!["Is.Null", "Is.Positive", "LessThan(5)", "Is.Not.Zero"]);
    }

    #[test]
    fn test_prefixes_root_and_suffixes() {
        let compilation = compile(&fixture(
            "Assert.That(new[] { \"a\" }, Has.Some.EqualTo(\"A\").IgnoreCase);",
        ));
        let cx = TreeContext::new(&compilation, 0);
        let expression = ConstraintExpression::parse(
            &cx,
            find_expr(&compilation, "Has.Some.EqualTo(\"A\").IgnoreCase"),
        );
        let part = &expression.parts()[0];
        assert_eq!(
            part.helper_class().map(|t| cx.registry.display(t)),
            Some("Has".to_string())
        );
        assert_eq!(part.root_name(), Some("EqualTo"));
        assert!(part.has_prefix("Some"));
        assert!(part.has_suffix("IgnoreCase"));
        assert!(!part.has_suffix("Some"));

        let expected = part.expected_argument().unwrap();
        assert_eq!(cx.text(expected.expr.span), "\"A\"");
        assert!(expected.link.is("EqualTo"));
    }

    #[test]
    fn test_expected_argument_absent_for_parameterless_constraints() {
        let compilation = compile(&fixture("Assert.That(1, Is.Not.Null);"));
        let cx = TreeContext::new(&compilation, 0);
        let expression = ConstraintExpression::parse(&cx, find_expr(&compilation, "Is.Not.Null"));
        let part = &expression.parts()[0];
        assert_eq!(part.root_name(), Some("Null"));
        assert!(part.expected_argument().is_none());
    }

    #[test]
    fn test_unknown_expressions() {
        let (_, unknown) = parts_of(
            "var flag = GetValue() > 1; Assert.That(1, flag ? Is.Null : Is.Not.Null);",
            "flag ? Is.Null : Is.Not.Null",
        );
        assert_eq!(unknown, vec![true]);

        let (_, unknown) = parts_of(
            "var c = Is.EqualTo(1); Assert.That(1, c.IgnoreCase);",
            "c.IgnoreCase",
        );
        assert_eq!(unknown, vec![true]);

        let (texts, unknown) = parts_of(
            "Assert.That(1, new EqualConstraint(1).Within(2));",
            "new EqualConstraint(1).Within(2)",
        );
        assert_eq!(texts, vec!["new EqualConstraint(1).Within(2)"]);
        assert_eq!(unknown, vec![false]);
    }
}
