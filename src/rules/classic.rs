//! Classic model assertions that have a constraint model equivalent.

use crate::{
    query::{self, names, AssertClass, AssertInvocation},
    rules::{
        descriptor::{Category, DiagnosticDescriptor, Severity},
        diagnostic::{keys, Diagnostic, Properties},
        Rule, RuleContext,
    },
    Result,
};

macro_rules! classic_descriptor {
    ($name:ident, $id:literal, $model:literal, $classic:literal) => {
        #[allow(missing_docs)]
        pub static $name: DiagnosticDescriptor = DiagnosticDescriptor {
            id: $id,
            title: concat!("Consider using ", $model, " instead of ", $classic),
            message_format: concat!(
                "Consider using the constraint model, ",
                $model,
                ", instead of the classic model, ",
                $classic
            ),
            category: Category::Assertion,
            default_severity: Severity::Info,
            description: concat!(
                "The constraint model is the recommended assertion style; ",
                $classic,
                " can be written as ",
                $model,
                "."
            ),
        };
    };
}

classic_descriptor!(FALSE, "NUnit2001", "Assert.That(expr, Is.False)", "ClassicAssert.False(expr)");
classic_descriptor!(
    IS_FALSE,
    "NUnit2002",
    "Assert.That(expr, Is.False)",
    "ClassicAssert.IsFalse(expr)"
);
classic_descriptor!(
    IS_TRUE,
    "NUnit2003",
    "Assert.That(expr, Is.True)",
    "ClassicAssert.IsTrue(expr)"
);
classic_descriptor!(TRUE, "NUnit2004", "Assert.That(expr, Is.True)", "ClassicAssert.True(expr)");
classic_descriptor!(
    ARE_EQUAL,
    "NUnit2005",
    "Assert.That(actual, Is.EqualTo(expected))",
    "ClassicAssert.AreEqual(expected, actual)"
);
classic_descriptor!(
    ARE_NOT_EQUAL,
    "NUnit2006",
    "Assert.That(actual, Is.Not.EqualTo(expected))",
    "ClassicAssert.AreNotEqual(expected, actual)"
);
classic_descriptor!(
    ARE_SAME,
    "NUnit2015",
    "Assert.That(actual, Is.SameAs(expected))",
    "ClassicAssert.AreSame(expected, actual)"
);
classic_descriptor!(NULL, "NUnit2016", "Assert.That(expr, Is.Null)", "ClassicAssert.Null(expr)");
classic_descriptor!(
    IS_NULL,
    "NUnit2017",
    "Assert.That(expr, Is.Null)",
    "ClassicAssert.IsNull(expr)"
);
classic_descriptor!(
    NOT_NULL,
    "NUnit2018",
    "Assert.That(expr, Is.Not.Null)",
    "ClassicAssert.NotNull(expr)"
);
classic_descriptor!(
    IS_NOT_NULL,
    "NUnit2019",
    "Assert.That(expr, Is.Not.Null)",
    "ClassicAssert.IsNotNull(expr)"
);
classic_descriptor!(
    GREATER,
    "NUnit2027",
    "Assert.That(arg1, Is.GreaterThan(arg2))",
    "ClassicAssert.Greater(arg1, arg2)"
);
classic_descriptor!(
    GREATER_OR_EQUAL,
    "NUnit2028",
    "Assert.That(arg1, Is.GreaterThanOrEqualTo(arg2))",
    "ClassicAssert.GreaterOrEqual(arg1, arg2)"
);
classic_descriptor!(
    LESS,
    "NUnit2029",
    "Assert.That(arg1, Is.LessThan(arg2))",
    "ClassicAssert.Less(arg1, arg2)"
);
classic_descriptor!(
    LESS_OR_EQUAL,
    "NUnit2030",
    "Assert.That(arg1, Is.LessThanOrEqualTo(arg2))",
    "ClassicAssert.LessOrEqual(arg1, arg2)"
);
classic_descriptor!(
    ARE_NOT_SAME,
    "NUnit2031",
    "Assert.That(actual, Is.Not.SameAs(expected))",
    "ClassicAssert.AreNotSame(expected, actual)"
);
classic_descriptor!(ZERO, "NUnit2032", "Assert.That(expr, Is.Zero)", "ClassicAssert.Zero(expr)");
classic_descriptor!(
    NOT_ZERO,
    "NUnit2033",
    "Assert.That(expr, Is.Not.Zero)",
    "ClassicAssert.NotZero(expr)"
);
classic_descriptor!(IS_NAN, "NUnit2034", "Assert.That(expr, Is.NaN)", "ClassicAssert.IsNaN(expr)");
classic_descriptor!(
    IS_EMPTY,
    "NUnit2035",
    "Assert.That(collection, Is.Empty)",
    "ClassicAssert.IsEmpty(collection)"
);
classic_descriptor!(
    IS_NOT_EMPTY,
    "NUnit2036",
    "Assert.That(collection, Is.Not.Empty)",
    "ClassicAssert.IsNotEmpty(collection)"
);
classic_descriptor!(
    CONTAINS,
    "NUnit2037",
    "Assert.That(collection, Has.Member(instance))",
    "ClassicAssert.Contains(instance, collection)"
);
classic_descriptor!(
    IS_INSTANCE_OF,
    "NUnit2038",
    "Assert.That(actual, Is.InstanceOf(expected))",
    "ClassicAssert.IsInstanceOf(expected, actual)"
);
classic_descriptor!(
    IS_NOT_INSTANCE_OF,
    "NUnit2039",
    "Assert.That(actual, Is.Not.InstanceOf(expected))",
    "ClassicAssert.IsNotInstanceOf(expected, actual)"
);
classic_descriptor!(
    POSITIVE,
    "NUnit2070",
    "Assert.That(expr, Is.Positive)",
    "ClassicAssert.Positive(expr)"
);
classic_descriptor!(
    NEGATIVE,
    "NUnit2071",
    "Assert.That(expr, Is.Negative)",
    "ClassicAssert.Negative(expr)"
);
classic_descriptor!(
    IS_ASSIGNABLE_FROM,
    "NUnit2072",
    "Assert.That(actual, Is.AssignableFrom(expected))",
    "ClassicAssert.IsAssignableFrom(expected, actual)"
);
classic_descriptor!(
    IS_NOT_ASSIGNABLE_FROM,
    "NUnit2073",
    "Assert.That(actual, Is.Not.AssignableFrom(expected))",
    "ClassicAssert.IsNotAssignableFrom(expected, actual)"
);

/// `StringAssert` usage
pub static STRING_ASSERT_USAGE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit2048",
    title: "Consider using Assert.That(...) instead of StringAssert(...)",
    message_format: "Consider using the constraint model, Assert.That(actual, ...), instead of \
                     the classic model, StringAssert.{0}(...)",
    category: Category::Assertion,
    default_severity: Severity::Info,
    description: "Every StringAssert method has an equivalent string constraint.",
};

/// `CollectionAssert` usage
pub static COLLECTION_ASSERT_USAGE: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit2049",
    title: "Consider using Assert.That(...) instead of CollectionAssert(...)",
    message_format: "Consider using the constraint model, Assert.That(actual, ...), instead of \
                     the classic model, CollectionAssert.{0}(...)",
    category: Category::Assertion,
    default_severity: Severity::Info,
    description: "Every CollectionAssert method has an equivalent collection constraint.",
};

/// Classic model methods of `Assert`/`ClassicAssert` and their diagnostics
pub static CLASSIC_METHODS: [(&str, &DiagnosticDescriptor); 28] = [
    ("False", &FALSE),
    ("IsFalse", &IS_FALSE),
    ("IsTrue", &IS_TRUE),
    ("True", &TRUE),
    ("AreEqual", &ARE_EQUAL),
    ("AreNotEqual", &ARE_NOT_EQUAL),
    ("AreSame", &ARE_SAME),
    ("Null", &NULL),
    ("IsNull", &IS_NULL),
    ("NotNull", &NOT_NULL),
    ("IsNotNull", &IS_NOT_NULL),
    ("Greater", &GREATER),
    ("GreaterOrEqual", &GREATER_OR_EQUAL),
    ("Less", &LESS),
    ("LessOrEqual", &LESS_OR_EQUAL),
    ("AreNotSame", &ARE_NOT_SAME),
    ("Zero", &ZERO),
    ("NotZero", &NOT_ZERO),
    ("IsNaN", &IS_NAN),
    ("IsEmpty", &IS_EMPTY),
    ("IsNotEmpty", &IS_NOT_EMPTY),
    ("Contains", &CONTAINS),
    ("IsInstanceOf", &IS_INSTANCE_OF),
    ("IsNotInstanceOf", &IS_NOT_INSTANCE_OF),
    ("Positive", &POSITIVE),
    ("Negative", &NEGATIVE),
    ("IsAssignableFrom", &IS_ASSIGNABLE_FROM),
    ("IsNotAssignableFrom", &IS_NOT_ASSIGNABLE_FROM),
];

const STRING_ASSERT_METHODS: [&str; 10] = [
    "Contains",
    "DoesNotContain",
    "StartsWith",
    "DoesNotStartWith",
    "EndsWith",
    "DoesNotEndWith",
    "AreEqualIgnoringCase",
    "AreNotEqualIgnoringCase",
    "IsMatch",
    "DoesNotMatch",
];

const COLLECTION_ASSERT_METHODS: [&str; 16] = [
    "AllItemsAreInstancesOfType",
    "AllItemsAreNotNull",
    "AllItemsAreUnique",
    "AreEqual",
    "AreEquivalent",
    "AreNotEqual",
    "AreNotEquivalent",
    "Contains",
    "DoesNotContain",
    "IsEmpty",
    "IsNotEmpty",
    "IsOrdered",
    "IsSubsetOf",
    "IsNotSubsetOf",
    "IsSupersetOf",
    "IsNotSupersetOf",
];

/// Reports calls to the classic model: `ClassicAssert`, the classic methods of NUnit 3
/// `Assert`, `StringAssert` and `CollectionAssert`
pub struct ClassicAssertRule;

impl ClassicAssertRule {
    fn descriptor_for(assert: &AssertInvocation<'_>) -> Option<&'static DiagnosticDescriptor> {
        match assert.class {
            AssertClass::Assert | AssertClass::ClassicAssert => CLASSIC_METHODS
                .iter()
                .find(|(method, _)| *method == assert.method)
                .map(|(_, descriptor)| *descriptor),
            AssertClass::StringAssert => {
                STRING_ASSERT_METHODS.contains(&assert.method).then_some(&STRING_ASSERT_USAGE)
            }
            AssertClass::CollectionAssert => COLLECTION_ASSERT_METHODS
                .contains(&assert.method)
                .then_some(&COLLECTION_ASSERT_USAGE),
            AssertClass::Assume | AssertClass::Warn => None,
        }
    }

    fn properties(cx: &RuleContext<'_>, assert: &AssertInvocation<'_>) -> Properties {
        let mut properties = Properties::new()
            .with(keys::METHOD_NAME, assert.method)
            .with(keys::HAS_COMPARER, assert.argument("comparer").is_some())
            .with(keys::HAS_DELTA, assert.argument("delta").is_some())
            .with(keys::PARAMS_ARGUMENT_IS_ARRAY, params_argument_is_array(assert));

        let is_equality = matches!(assert.class, AssertClass::Assert | AssertClass::ClassicAssert)
            && matches!(assert.method, "AreEqual" | "AreNotEqual");
        let sentinel = is_equality
            && assert
                .argument(names::EXPECTED_PARAMETER)
                .is_some_and(|arg| query::is_empty_string_sentinel(&cx.cx, &arg.expr));
        properties.insert(keys::IS_EMPTY_SENTINEL, sentinel);

        if let Some(index) = assert.call.argument_named(names::MESSAGE_PARAMETER) {
            properties.insert(keys::MESSAGE_ARGUMENT_INDEX, index);
        }
        properties
    }
}

/// True if the `params` argument was passed as a single array value
pub(crate) fn params_argument_is_array(assert: &AssertInvocation<'_>) -> bool {
    !assert.call.expanded && assert.arguments(names::ARGS_PARAMETER).len() == 1
}

impl Rule for ClassicAssertRule {
    fn name(&self) -> &'static str {
        "classic-assert"
    }

    fn descriptors(&self) -> Vec<&'static DiagnosticDescriptor> {
        let mut descriptors: Vec<_> = CLASSIC_METHODS.iter().map(|(_, d)| *d).collect();
        descriptors.push(&STRING_ASSERT_USAGE);
        descriptors.push(&COLLECTION_ASSERT_USAGE);
        descriptors
    }

    fn analyze(&self, cx: &RuleContext<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<()> {
        for assert in cx.assert_invocations()? {
            let Some(descriptor) = Self::descriptor_for(&assert) else {
                continue;
            };
            diagnostics.push(
                Diagnostic::new(descriptor, cx.tree(), assert.expr.span, &[assert.method])
                    .with_properties(Self::properties(cx, &assert)),
            );
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

    fn run(body: &str) -> Vec<Diagnostic> {
        let compilation = compile(&fixture(body));
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        ClassicAssertRule.analyze(&cx, &mut diagnostics).unwrap();
        diagnostics
    }

    #[test]
    fn test_classic_methods_are_reported() {
        let diagnostics = run(
            "ClassicAssert.IsTrue(GetValue() > 1); Assert.AreEqual(1, GetValue()); \
             Assert.That(GetValue(), Is.EqualTo(1));",
        );
        let ids: Vec<_> = diagnostics.iter().map(Diagnostic::id).collect();
        assert_eq!(ids, vec!["NUnit2003", "NUnit2005"]);
        assert_eq!(
            diagnostics[0].message,
            "Consider using the constraint model, Assert.That(expr, Is.True), instead of the \
             classic model, ClassicAssert.IsTrue(expr)"
        );
    }

    #[test]
    fn test_properties() {
        let diagnostics = run(
            "ClassicAssert.AreEqual(\"\", \"a\", \"{0} values\", GetValue()); \
             ClassicAssert.AreEqual(1.0, 1.1, 0.5);",
        );
        let first = &diagnostics[0].properties;
        assert_eq!(first.get(keys::METHOD_NAME).unwrap(), "AreEqual");
        assert!(first.flag(keys::IS_EMPTY_SENTINEL).unwrap());
        assert!(!first.flag(keys::HAS_DELTA).unwrap());
        assert!(!first.flag(keys::PARAMS_ARGUMENT_IS_ARRAY).unwrap());
        assert_eq!(first.number(keys::MESSAGE_ARGUMENT_INDEX).unwrap(), 2);

        let second = &diagnostics[1].properties;
        assert!(second.flag(keys::HAS_DELTA).unwrap());
        assert!(!second.contains(keys::MESSAGE_ARGUMENT_INDEX));
    }

    #[test]
    fn test_string_and_collection_asserts() {
        let diagnostics = run(
            "StringAssert.StartsWith(\"a\", \"abc\"); IComparer? comparer = null; \
             CollectionAssert.AreEqual(new[] { 1 }, new[] { 1 }, comparer);",
        );
        assert_eq!(diagnostics[0].id(), "NUnit2048");
        assert!(diagnostics[0].message.ends_with("StringAssert.StartsWith(...)"));
        assert_eq!(diagnostics[1].id(), "NUnit2049");
        assert!(diagnostics[1].properties.flag(keys::HAS_COMPARER).unwrap());
    }
}
