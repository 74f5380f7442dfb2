//! Integration tests for the diagnostics produced by the default rule set.
//!
//! Every test compiles C# test sources through the public API and inspects what
//! [`AnalysisEngine::analyze`] reports for them.

use assertscope::{config::AnalyzerConfig, prelude::*, rules};

const USINGS: &str = "using System;
using System.Collections.Generic;
using System.IO;
using NUnit.Framework;
using NUnit.Framework.Legacy;
";

fn source(body: &str) -> String {
    format!("{USINGS}\n{body}")
}

fn analyze(compilation: &Compilation) -> Vec<Diagnostic> {
    AnalysisEngine::with_defaults()
        .analyze(compilation, &CancellationToken::new())
        .unwrap()
}

fn analyze_source(body: &str) -> (Compilation, Vec<Diagnostic>) {
    let compilation = Compilation::from_source("Tests.cs", source(body)).unwrap();
    let diagnostics = analyze(&compilation);
    (compilation, diagnostics)
}

fn located(compilation: &Compilation, diagnostics: &[Diagnostic]) -> Vec<(&'static str, String)> {
    diagnostics
        .iter()
        .map(|d| (d.id(), compilation.tree(d.tree).text_of(d.span).to_string()))
        .collect()
}

#[test]
fn classic_assert_is_reported_with_descriptor_data() {
    let (_, diagnostics) = analyze_source(
        "public class Tests
{
    [Test]
    public void Sum() { ClassicAssert.AreEqual(4, 2 + 2); }
}",
    );

    assert_eq!(diagnostics.len(), 1);
    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.id(), "NUnit2005");
    assert_eq!(diagnostic.severity, Severity::Info);
    assert_eq!(diagnostic.descriptor.category, Category::Assertion);
    assert!(diagnostic.message.contains("Assert.That(actual, Is.EqualTo(expected))"));
    assert!(diagnostic.descriptor.help_link().ends_with("/NUnit2005.md"));
    assert_eq!(rules::descriptor("NUnit2005"), Some(diagnostic.descriptor));
}

#[test]
fn string_and_collection_asserts() {
    let (_, diagnostics) = analyze_source(
        "public class Tests
{
    [Test]
    public void Text() { StringAssert.StartsWith(\"a\", \"abc\"); }

    [Test]
    public void Items() { CollectionAssert.AreEqual(new[] { 1 }, new[] { 1 }); }
}",
    );

    let ids: Vec<_> = diagnostics.iter().map(Diagnostic::id).collect();
    assert_eq!(ids, vec!["NUnit2048", "NUnit2049"]);
    assert!(diagnostics[0].message.ends_with("StringAssert.StartsWith(...)"));
}

#[test]
fn incompatible_expected_value() {
    let (compilation, diagnostics) = analyze_source(
        "public class Tests
{
    [Test]
    public void Compare()
    {
        Assert.That(1, Is.EqualTo(\"1\"));
    }
}",
    );

    assert_eq!(
        located(&compilation, &diagnostics),
        vec![("NUnit2021", "\"1\"".to_string())]
    );
    assert!(diagnostics[0].message.contains("'string'"));
    assert!(diagnostics[0].message.contains("'int'"));
}

#[test]
fn undisposed_fixture_member() {
    let (compilation, diagnostics) = analyze_source(
        "public class Tests
{
    private Stream input;

    [SetUp]
    public void SetUp() { input = File.OpenRead(\"data.bin\"); }

    [Test]
    public void Read() { }
}",
    );

    assert_eq!(
        located(&compilation, &diagnostics),
        vec![("NUnit1032", "input".to_string())]
    );
    assert!(diagnostics[0].message.contains("[TearDown]"));
}

#[test]
fn editorconfig_dispose_methods() {
    let text = source(
        "public class Tests
{
    private Stream input;

    [SetUp]
    public void SetUp() { input = File.OpenRead(\"data.bin\"); }

    [TearDown]
    public void TearDown() { input.Flush(); }

    [Test]
    public void Read() { }
}",
    );

    let compilation = Compilation::from_source("Tests.cs", text.as_str()).unwrap();
    assert_eq!(analyze(&compilation).len(), 1);

    let config = AnalyzerConfig::from_editorconfig(
        "[*.cs]\ndotnet_diagnostic.NUnit1032.additional_dispose_methods = Flush\n",
    );
    let compilation = Compilation::new([("Tests.cs", text.as_str())], config).unwrap();
    assert!(analyze(&compilation).is_empty());
}

#[test]
fn test_case_sources() {
    let (compilation, diagnostics) = analyze_source(
        "public class Tests
{
    private static readonly int[] Cases = { 1, 2 };

    [TestCaseSource(\"Cases\")]
    public void Known(int value) { }

    [TestCaseSource(\"Missing\")]
    public void Unknown(int value) { }
}",
    );

    assert_eq!(
        located(&compilation, &diagnostics),
        vec![
            ("NUnit1014", "\"Cases\"".to_string()),
            ("NUnit1015", "\"Missing\"".to_string()),
        ]
    );
    assert_eq!(diagnostics[1].severity, Severity::Error);
}

#[test]
fn format_specification_and_grouping() {
    let (_, diagnostics) = analyze_source(
        "public class Tests
{
    [Test]
    public void Pass() { Assert.Pass(\"Passed: {0}\", 42); }

    [Test]
    public void Group()
    {
        Assert.That(1, Is.EqualTo(1));
        Assert.That(2, Is.EqualTo(2));
    }
}",
    );

    let ids: Vec<_> = diagnostics.iter().map(Diagnostic::id).collect();
    assert_eq!(ids, vec!["NUnit2050", "NUnit2045"]);
    assert_eq!(diagnostics[1].additional_spans.len(), 2);
}

#[test]
fn diagnostics_follow_tree_order() {
    let first = source(
        "public class First
{
    [Test]
    public void T() { ClassicAssert.IsTrue(true); }
}",
    );
    let second = source(
        "public class Second
{
    [Test]
    public void T() { ClassicAssert.IsFalse(false); }
}",
    );
    let compilation = Compilation::new(
        [("First.cs", first.as_str()), ("Second.cs", second.as_str())],
        AnalyzerConfig::default(),
    )
    .unwrap();

    let diagnostics = analyze(&compilation);
    let trees: Vec<_> = diagnostics.iter().map(|d| d.tree).collect();
    assert_eq!(trees, vec![0, 1]);
    assert_eq!(compilation.tree(1).path(), "Second.cs");
}

#[test]
fn severity_configuration() {
    let text = source(
        "public class Tests
{
    [Test]
    public void T()
    {
        ClassicAssert.IsTrue(true);
        ClassicAssert.AreEqual(1, 1);
    }
}",
    );
    let config = AnalyzerConfig::from_editorconfig(
        "[*.cs]\n\
         dotnet_diagnostic.NUnit2003.severity = none\n\
         dotnet_diagnostic.NUnit2005.severity = error\n",
    );
    let compilation = Compilation::new([("Tests.cs", text.as_str())], config).unwrap();

    let diagnostics = analyze(&compilation);
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].id(), "NUnit2005");
    assert_eq!(diagnostics[0].severity, Severity::Error);
}

#[test]
fn cancelled_analysis_fails() {
    let compilation =
        Compilation::from_source("Tests.cs", source("public class Tests { }")).unwrap();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = AnalysisEngine::with_defaults().analyze(&compilation, &cancel);
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn unparsable_source() {
    let result = Compilation::from_source("Broken.cs", "public class {");
    assert!(matches!(result, Err(Error::Syntax { .. })));
}

#[test]
fn plain_code_is_clean() {
    let (_, diagnostics) = analyze_source(
        "public class Calculator
{
    private Stream log;
    public int Add(int a, int b) => a + b;
    public void Open() { log = File.OpenRead(\"log.txt\"); }
}",
    );
    assert!(diagnostics.is_empty());
}
