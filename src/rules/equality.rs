//! `EqualTo` comparisons between types that can never compare equal.

use crate::{
    compat,
    constraints::{ConstraintExpression, ConstraintExpressionPart},
    host::{
        syntax::Span,
        types::{Ty, WellKnown},
    },
    query::{self, names, AssertClass, AssertInvocation, TreeContext},
    rules::{
        descriptor::{Category, DiagnosticDescriptor, Severity},
        diagnostic::Diagnostic,
        Rule, RuleContext,
    },
    Result,
};

/// NUnit2021
pub static INCOMPATIBLE_EQUAL_TO: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit2021",
    title: "Incompatible types for EqualTo constraint",
    message_format: "The EqualTo constraint always fails as the actual value of type '{0}' can \
                     never be equal to the expected value of type '{1}'",
    category: Category::Assertion,
    default_severity: Severity::Error,
    description: "The actual and the expected value have types that the equality comparer \
                  never reports as equal.",
};

/// Prefixes that apply the rest of the part to every element of the actual value
const ITEM_PREFIXES: [&str; 4] = ["All", "Some", "Exactly", "One"];

/// Prefixes negating the comparison, which then always succeeds instead
const NEGATING_PREFIXES: [&str; 3] = ["Not", "No", "None"];

/// Prefixes that redirect the comparison to something this rule does not model
const OPAQUE_PREFIXES: [&str; 4] = ["Property", "Member", "Attribute", "InnerException"];

/// Reports `Is.EqualTo(expected)` and `AreEqual(expected, actual)` where the two types are
/// incompatible
pub struct EqualityRule;

/// Type of the value `Assert.That` checks, or `None` for shapes without one
fn actual_type(cx: &TreeContext<'_>, assert: &AssertInvocation<'_>) -> Option<Ty> {
    if assert.has_param("del") {
        let produced = assert.call.type_args.first()?;
        return Some(query::unwrap_task(cx.registry, produced));
    }
    let actual = assert.argument("actual")?;
    let ty = cx.type_of(&actual.expr);
    if cx.registry.is_delegate(ty) {
        let (_, ret) = cx.registry.delegate_signature(ty)?;
        return Some(query::unwrap_task(cx.registry, &ret));
    }
    Some(ty.clone())
}

/// The type the root of `part` is applied to, after its prefixes
fn apply_prefixes(
    cx: &TreeContext<'_>,
    part: &ConstraintExpressionPart<'_>,
    actual: Ty,
) -> Option<Ty> {
    let mut ty = actual;
    for prefix in part.prefixes() {
        let name = prefix.name.text.as_str();
        if OPAQUE_PREFIXES.contains(&name) || NEGATING_PREFIXES.contains(&name) {
            return None;
        }
        if ITEM_PREFIXES.contains(&name) {
            ty = cx.registry.element_type(&ty)?;
        } else if name == "Count" || name == "Length" {
            ty = cx.registry.well_known_ty(WellKnown::Int32);
        } else if name == "Message" {
            ty = cx.registry.well_known_ty(WellKnown::String);
        }
    }
    Some(ty)
}

impl EqualityRule {
    fn check_that(
        cx: &RuleContext<'_>,
        assert: &AssertInvocation<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let Some(constraint) = assert
            .argument("expression")
            .or_else(|| assert.argument("expr"))
        else {
            return;
        };
        let Some(actual) = actual_type(&cx.cx, assert) else {
            return;
        };
        let expression = ConstraintExpression::parse(&cx.cx, &constraint.expr);
        for part in expression.parts() {
            if part.has_unknown_expressions() {
                log::trace!("skipping constraint part {}", part.text(&cx.cx));
                continue;
            }
            if part.root_name() != Some("EqualTo") || part.has_suffix("Using") {
                continue;
            }
            let Some(expected) = part.expected_argument() else {
                continue;
            };
            let Some(actual) = apply_prefixes(&cx.cx, part, actual.clone()) else {
                continue;
            };
            let expected_ty = cx.cx.type_of(expected.expr);
            Self::report(cx, &actual, expected_ty, expected.expr.span, diagnostics);
        }
    }

    fn check_classic(
        cx: &RuleContext<'_>,
        assert: &AssertInvocation<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if assert.has_param("delta") {
            return;
        }
        let (Some(expected), Some(actual)) = (
            assert.argument(names::EXPECTED_PARAMETER),
            assert.argument("actual"),
        ) else {
            return;
        };
        let actual_ty = cx.cx.type_of(&actual.expr);
        let expected_ty = cx.cx.type_of(&expected.expr);
        Self::report(cx, actual_ty, expected_ty, expected.expr.span, diagnostics);
    }

    fn report(
        cx: &RuleContext<'_>,
        actual: &Ty,
        expected: &Ty,
        span: Span,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if compat::can_be_equal(cx.cx.registry, actual, expected) {
            return;
        }
        let actual_name = cx.cx.registry.display(actual);
        let expected_name = cx.cx.registry.display(expected);
        diagnostics.push(Diagnostic::new(
            &INCOMPATIBLE_EQUAL_TO,
            cx.tree(),
            span,
            &[&actual_name, &expected_name],
        ));
    }
}

impl Rule for EqualityRule {
    fn name(&self) -> &'static str {
        "incompatible-equality"
    }

    fn descriptors(&self) -> Vec<&'static DiagnosticDescriptor> {
        vec![&INCOMPATIBLE_EQUAL_TO]
    }

    fn analyze(&self, cx: &RuleContext<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<()> {
        for assert in cx.assert_invocations()? {
            match (assert.class, assert.method) {
                (
                    AssertClass::Assert | AssertClass::Assume | AssertClass::Warn,
                    "That" | "If" | "Unless",
                ) => {
                    Self::check_that(cx, &assert, diagnostics);
                }
                (AssertClass::Assert | AssertClass::ClassicAssert, "AreEqual") => {
                    Self::check_classic(cx, &assert, diagnostics);
                }
                _ => {}
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::CancellationToken,
        test::{compile, fixture},
    };

    fn run(body: &str) -> Vec<String> {
        let compilation = compile(&fixture(body));
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        EqualityRule.analyze(&cx, &mut diagnostics).unwrap();
        diagnostics
            .iter()
            .map(|d| compilation.tree(0).text_of(d.span).to_string())
            .collect()
    }

    #[test]
    fn test_incompatible_literals() {
        assert_eq!(
            run("Assert.That(1, Is.EqualTo(\"1\")); Assert.That(1, Is.EqualTo(1.0)); \
                 Assert.That(1, Is.Not.EqualTo(\"x\"));"),
            vec!["\"1\""]
        );
    }

    #[test]
    fn test_prefixes_change_the_actual_type() {
        let found = run(
            "var list = new List<int>();
            Assert.That(list, Has.Some.EqualTo(\"a\"));
            Assert.That(list, Has.Count.EqualTo(2));
            Assert.That(list, Has.All.EqualTo(3));
            Assert.That(list, Has.Property(\"Count\").EqualTo(\"n\"));",
        );
        assert_eq!(found, vec!["\"a\""]);
    }

    #[test]
    fn test_comparer_and_unknown_parts_are_skipped() {
        let found = run(
            "var flag = GetValue() > 1;
            Assert.That(1, Is.EqualTo(\"1\").Using((IComparer)null!));
            Assert.That(1, (flag ? Is.Not : Is.All).EqualTo(\"1\"));
            Assert.That(1, Is.EqualTo(2) | Is.EqualTo(\"2\"));",
        );
        assert_eq!(found, vec!["\"2\""]);
    }

    #[test]
    fn test_classic_are_equal() {
        let found = run(
            "ClassicAssert.AreEqual(\"1\", 1); ClassicAssert.AreEqual(1L, 1); \
             ClassicAssert.AreEqual(1.0, 1.5, 0.5);",
        );
        assert_eq!(found, vec!["\"1\""]);
    }

    #[test]
    fn test_message_names_both_types() {
        let compilation = compile(&fixture("Assert.That(\"a\", Is.EqualTo(true));"));
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        EqualityRule.analyze(&cx, &mut diagnostics).unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert!(diagnostics[0].message.contains("'string'"));
        assert!(diagnostics[0].message.contains("'bool'"));
    }
}
