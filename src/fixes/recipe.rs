//! Classic method to constraint recipes.
//!
//! Every classic assertion the rules report has exactly one entry in one of three tables. The
//! table decides which call arguments become the actual and the expected value:
//!
//! | Table | Actual | Expected | Example |
//! |-------|--------|----------|---------|
//! | parameterless | parameter 0 | none | `IsTrue(x)` to `Is.True` |
//! | swapped | parameter 1 | parameter 0 | `AreEqual(e, a)` to `Is.EqualTo(e)` |
//! | direct | parameter 0 | parameter 1 | `Greater(a, e)` to `Is.GreaterThan(e)` |

use crate::{fixes::factory::Code, query::AssertClass, Error, Result};

/// A constraint expression shape: `Helper[.Modifier][.Method(expected)][.Suffix]*`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstraintRecipe {
    /// Static helper class the chain starts from
    pub helper: &'static str,
    /// Optional modifier property such as `Not` or `All`
    pub modifier: Option<&'static str>,
    /// Constraint method taking the expected value, or a constraint property when the recipe
    /// takes no expected value
    pub method: Option<&'static str>,
    /// Trailing properties
    pub suffixes: &'static [&'static str],
}

impl ConstraintRecipe {
    const fn new(
        helper: &'static str,
        modifier: Option<&'static str>,
        method: Option<&'static str>,
        suffixes: &'static [&'static str],
    ) -> Self {
        ConstraintRecipe {
            helper,
            modifier,
            method,
            suffixes,
        }
    }

    /// Build the constraint, calling the method with `expected` if one is given
    #[must_use]
    pub fn build(&self, expected: Option<&str>) -> Code {
        let mut code = Code::name(self.helper);
        if let Some(modifier) = self.modifier {
            code = code.member(modifier);
        }
        if let Some(method) = self.method {
            code = code.member(method);
            if let Some(expected) = expected {
                code = code.call([expected]);
            }
        }
        self.suffixes.iter().fold(code, |code, suffix| code.member(*suffix))
    }
}

/// Where the actual and expected values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentOrder {
    /// Actual at 0, no expected value
    Parameterless,
    /// Expected at 0, actual at 1
    Swapped,
    /// Actual at 0, expected at 1
    Direct,
}

impl ArgumentOrder {
    /// Parameter positions of the actual and the expected value
    #[must_use]
    pub fn positions(self) -> (usize, Option<usize>) {
        match self {
            ArgumentOrder::Parameterless => (0, None),
            ArgumentOrder::Swapped => (1, Some(0)),
            ArgumentOrder::Direct => (0, Some(1)),
        }
    }
}

/// A table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recipe {
    /// Argument order
    pub order: ArgumentOrder,
    /// Constraint shape
    pub constraint: ConstraintRecipe,
}

/// Which table family a class uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Classic,
    String,
    Collection,
}

type Entry = (Family, &'static str, ConstraintRecipe);

const fn is(method: &'static str) -> ConstraintRecipe {
    ConstraintRecipe::new("Is", None, Some(method), &[])
}

const fn is_not(method: &'static str) -> ConstraintRecipe {
    ConstraintRecipe::new("Is", Some("Not"), Some(method), &[])
}

const fn does(modifier: Option<&'static str>, method: &'static str) -> ConstraintRecipe {
    ConstraintRecipe::new("Does", modifier, Some(method), &[])
}

const PARAMETERLESS: [Entry; 20] = [
    (Family::Classic, "False", is("False")),
    (Family::Classic, "IsFalse", is("False")),
    (Family::Classic, "True", is("True")),
    (Family::Classic, "IsTrue", is("True")),
    (Family::Classic, "Null", is("Null")),
    (Family::Classic, "IsNull", is("Null")),
    (Family::Classic, "NotNull", is_not("Null")),
    (Family::Classic, "IsNotNull", is_not("Null")),
    (Family::Classic, "Zero", is("Zero")),
    (Family::Classic, "NotZero", is_not("Zero")),
    (Family::Classic, "IsNaN", is("NaN")),
    (Family::Classic, "IsEmpty", is("Empty")),
    (Family::Classic, "IsNotEmpty", is_not("Empty")),
    (Family::Classic, "Positive", is("Positive")),
    (Family::Classic, "Negative", is("Negative")),
    (
        Family::Collection,
        "AllItemsAreNotNull",
        ConstraintRecipe::new("Is", Some("All"), Some("Not"), &["Null"]),
    ),
    (Family::Collection, "AllItemsAreUnique", is("Unique")),
    (Family::Collection, "IsEmpty", is("Empty")),
    (Family::Collection, "IsNotEmpty", is_not("Empty")),
    (Family::Collection, "IsOrdered", is("Ordered")),
];

const SWAPPED: [Entry; 23] = [
    (Family::Classic, "AreEqual", is("EqualTo")),
    (Family::Classic, "AreNotEqual", is_not("EqualTo")),
    (Family::Classic, "AreSame", is("SameAs")),
    (Family::Classic, "AreNotSame", is_not("SameAs")),
    (Family::Classic, "Contains", ConstraintRecipe::new("Has", None, Some("Member"), &[])),
    (Family::Classic, "IsInstanceOf", is("InstanceOf")),
    (Family::Classic, "IsNotInstanceOf", is_not("InstanceOf")),
    (Family::Classic, "IsAssignableFrom", is("AssignableFrom")),
    (Family::Classic, "IsNotAssignableFrom", is_not("AssignableFrom")),
    (Family::String, "Contains", does(None, "Contain")),
    (Family::String, "DoesNotContain", does(Some("Not"), "Contain")),
    (Family::String, "StartsWith", does(None, "StartWith")),
    (Family::String, "DoesNotStartWith", does(Some("Not"), "StartWith")),
    (Family::String, "EndsWith", does(None, "EndWith")),
    (Family::String, "DoesNotEndWith", does(Some("Not"), "EndWith")),
    (
        Family::String,
        "AreEqualIgnoringCase",
        ConstraintRecipe::new("Is", None, Some("EqualTo"), &["IgnoreCase"]),
    ),
    (
        Family::String,
        "AreNotEqualIgnoringCase",
        ConstraintRecipe::new("Is", Some("Not"), Some("EqualTo"), &["IgnoreCase"]),
    ),
    (Family::String, "IsMatch", does(None, "Match")),
    (Family::String, "DoesNotMatch", does(Some("Not"), "Match")),
    (
        Family::Collection,
        "AreEqual",
        ConstraintRecipe::new("Is", None, Some("EqualTo"), &["AsCollection"]),
    ),
    (Family::Collection, "AreEquivalent", is("EquivalentTo")),
    (
        Family::Collection,
        "AreNotEqual",
        ConstraintRecipe::new("Is", Some("Not"), Some("EqualTo"), &["AsCollection"]),
    ),
    (Family::Collection, "AreNotEquivalent", is_not("EquivalentTo")),
];

const DIRECT: [Entry; 11] = [
    (Family::Classic, "Greater", is("GreaterThan")),
    (Family::Classic, "GreaterOrEqual", is("GreaterThanOrEqualTo")),
    (Family::Classic, "Less", is("LessThan")),
    (Family::Classic, "LessOrEqual", is("LessThanOrEqualTo")),
    (Family::Collection, "IsSubsetOf", is("SubsetOf")),
    (Family::Collection, "IsNotSubsetOf", is_not("SubsetOf")),
    (Family::Collection, "IsSupersetOf", is("SupersetOf")),
    (Family::Collection, "IsNotSupersetOf", is_not("SupersetOf")),
    (
        Family::Collection,
        "AllItemsAreInstancesOfType",
        ConstraintRecipe::new("Is", Some("All"), Some("InstanceOf"), &[]),
    ),
    (Family::Collection, "Contains", ConstraintRecipe::new("Has", None, Some("Member"), &[])),
    (
        Family::Collection,
        "DoesNotContain",
        ConstraintRecipe::new("Has", Some("No"), Some("Member"), &[]),
    ),
];

/// The recipe for `class.method`
///
/// # Errors
///
/// Returns [`Error::UnknownRecipe`] if no table has the method.
pub fn recipe_for(class: AssertClass, method: &str) -> Result<Recipe> {
    let family = match class {
        AssertClass::Assert | AssertClass::ClassicAssert => Some(Family::Classic),
        AssertClass::StringAssert => Some(Family::String),
        AssertClass::CollectionAssert => Some(Family::Collection),
        AssertClass::Assume | AssertClass::Warn => None,
    };
    let tables = [
        (ArgumentOrder::Parameterless, &PARAMETERLESS[..]),
        (ArgumentOrder::Swapped, &SWAPPED[..]),
        (ArgumentOrder::Direct, &DIRECT[..]),
    ];
    family
        .and_then(|family| {
            tables.iter().find_map(|(order, table)| {
                table
                    .iter()
                    .find(|(f, name, _)| *f == family && *name == method)
                    .map(|(_, _, constraint)| Recipe {
                        order: *order,
                        constraint: *constraint,
                    })
            })
        })
        .ok_or_else(|| Error::UnknownRecipe(format!("{class}.{method}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::CLASSIC_METHODS;

    fn render(class: AssertClass, method: &str, expected: Option<&str>) -> String {
        recipe_for(class, method).unwrap().constraint.build(expected).to_string()
    }

    #[test]
    fn test_every_reported_method_has_a_recipe() {
        for (method, _) in CLASSIC_METHODS.iter() {
            assert!(recipe_for(AssertClass::ClassicAssert, method).is_ok(), "{method}");
        }
    }

    #[test]
    fn test_rendering() {
        assert_eq!(render(AssertClass::ClassicAssert, "IsNotNull", None), "Is.Not.Null");
        assert_eq!(
            render(AssertClass::CollectionAssert, "AllItemsAreNotNull", None),
            "Is.All.Not.Null"
        );
        assert_eq!(
            render(AssertClass::CollectionAssert, "AreEqual", Some("expected")),
            "Is.EqualTo(expected).AsCollection"
        );
        assert_eq!(
            render(AssertClass::StringAssert, "AreNotEqualIgnoringCase", Some("\"a\"")),
            "Is.Not.EqualTo(\"a\").IgnoreCase"
        );
        assert_eq!(
            render(AssertClass::CollectionAssert, "DoesNotContain", Some("x")),
            "Has.No.Member(x)"
        );
    }

    #[test]
    fn test_argument_orders() {
        assert_eq!(
            recipe_for(AssertClass::Assert, "AreEqual").unwrap().order,
            ArgumentOrder::Swapped
        );
        assert_eq!(
            recipe_for(AssertClass::CollectionAssert, "Contains").unwrap().order,
            ArgumentOrder::Direct
        );
        assert_eq!(ArgumentOrder::Swapped.positions(), (1, Some(0)));
    }

    #[test]
    fn test_unknown_method_fails_loudly() {
        match recipe_for(AssertClass::StringAssert, "AreEqual") {
            Err(Error::UnknownRecipe(name)) => assert_eq!(name, "StringAssert.AreEqual"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
