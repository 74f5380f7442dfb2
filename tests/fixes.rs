//! Integration tests for the rewrites offered by the default fix providers.
//!
//! The tests drive analysis and fixing the way an editor integration would: analyze, ask the
//! engine for code actions, apply the edits and look at the resulting source.

use assertscope::{
    config::{AnalyzerConfig, FrameworkVersion},
    prelude::*,
};

const USINGS: &str = "using System;
using System.IO;
using NUnit.Framework;
using NUnit.Framework.Legacy;
";

fn test_method(body: &str) -> String {
    format!(
        "{USINGS}
public class Tests
{{
    [Test]
    public void Test()
    {{
        {body}
    }}
}}
"
    )
}

fn first_action(source: &str) -> (Diagnostic, CodeAction) {
    let compilation = Compilation::from_source("Tests.cs", source).unwrap();
    let engine = AnalysisEngine::with_defaults();
    let diagnostics = engine.analyze(&compilation, &CancellationToken::new()).unwrap();
    let diagnostic = diagnostics.into_iter().next().unwrap();
    let action = engine
        .fixes_for(&compilation, &diagnostic)
        .unwrap()
        .into_iter()
        .next()
        .unwrap();
    (diagnostic, action)
}

#[test]
fn classic_assert_becomes_constraint() {
    let source = test_method("ClassicAssert.AreEqual(4, 2 + 2);");
    let (diagnostic, action) = first_action(&source);

    assert_eq!(diagnostic.id(), "NUnit2005");
    assert_eq!(action.title, "Use Assert.That instead of ClassicAssert.AreEqual");
    assert_eq!(action.equivalence_key, "ConvertToConstraintModel");
    assert_eq!(action.edit.new_text, "Assert.That(2 + 2, Is.EqualTo(4))");

    let fixed = apply_edits(&source, &[action.edit]);
    assert!(fixed.contains("        Assert.That(2 + 2, Is.EqualTo(4));\n"));
}

#[test]
fn classic_message_becomes_interpolated() {
    let source = test_method(
        "var count = 3;
        ClassicAssert.IsTrue(count > 0, \"count was {0}\", count);",
    );
    let (_, action) = first_action(&source);

    assert_eq!(
        action.edit.new_text,
        "Assert.That(count > 0, Is.True, $\"count was {count}\")"
    );
}

#[test]
fn format_specification_fix() {
    let source = test_method("Assert.Pass(\"Passed: {0}\", 42);");
    let (diagnostic, action) = first_action(&source);

    assert_eq!(diagnostic.id(), "NUnit2050");
    assert_eq!(action.equivalence_key, "ConvertToInterpolatedString");
    let fixed = apply_edits(&source, &[action.edit]);
    assert!(fixed.contains("Assert.Pass($\"Passed: {42}\");"));
}

#[test]
fn nameof_fix() {
    let source = format!(
        "{USINGS}
public class Tests
{{
    private static readonly int[] Cases = {{ 1, 2 }};

    [TestCaseSource(\"Cases\")]
    public void Test(int value) {{ }}
}}
"
    );
    let (diagnostic, action) = first_action(&source);

    assert_eq!(diagnostic.id(), "NUnit1014");
    assert_eq!(action.edit.new_text, "nameof(Cases)");
    let fixed = apply_edits(&source, &[action.edit]);
    assert!(fixed.contains("[TestCaseSource(nameof(Cases))]"));
}

#[test]
fn fix_all_converges_in_two_passes() {
    let source = test_method(
        "ClassicAssert.AreEqual(4, 2 + 2);
        ClassicAssert.IsTrue(true);",
    );
    let engine = AnalysisEngine::with_defaults();

    let first = engine.fix_all(&source, AnalyzerConfig::default()).unwrap();
    assert!(first.contains("Assert.That(2 + 2, Is.EqualTo(4));"));
    assert!(first.contains("Assert.That(true, Is.True);"));
    assert!(!first.contains("ClassicAssert"));

    let second = engine.fix_all(&first, AnalyzerConfig::default()).unwrap();
    assert!(second.contains("Assert.Multiple(() =>"));
    assert!(second.contains("            Assert.That(2 + 2, Is.EqualTo(4));\n"));

    let third = engine.fix_all(&second, AnalyzerConfig::default()).unwrap();
    assert_eq!(third, second);
}

#[test]
fn enter_multiple_scope_with_newer_framework() {
    let source = test_method(
        "Assert.That(1, Is.EqualTo(1));
        Assert.That(2, Is.EqualTo(2));",
    );
    let config = AnalyzerConfig::default().with_framework_version(FrameworkVersion::new(4, 2, 0));

    let fixed = AnalysisEngine::with_defaults().fix_all(&source, config).unwrap();
    assert!(fixed.contains(
        "        using (Assert.EnterMultipleScope())
        {
            Assert.That(1, Is.EqualTo(1));
            Assert.That(2, Is.EqualTo(2));
        }
"
    ));
}

#[test]
fn clean_source_is_unchanged() {
    let source = test_method("Assert.That(2 + 2, Is.EqualTo(4));");
    let fixed = AnalysisEngine::with_defaults()
        .fix_all(&source, AnalyzerConfig::default())
        .unwrap();
    assert_eq!(fixed, source);
}

#[test]
fn overlapping_edits_are_skipped() {
    let edits = [
        TextEdit::new(Span::new(0, 5), "hello"),
        TextEdit::new(Span::new(3, 8), "ignored"),
        TextEdit::new(Span::new(9, 11), "!!"),
    ];
    assert_eq!(apply_edits("abcdefghijk", &edits), "hellofghi!!");
}
