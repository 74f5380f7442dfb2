//! Messages passed as a format specification with separate arguments.

use crate::{
    query::{names, AssertClass, AssertInvocation},
    rules::{
        classic::{params_argument_is_array, CLASSIC_METHODS},
        descriptor::{Category, DiagnosticDescriptor, Severity},
        diagnostic::{keys, Diagnostic, Properties},
        Rule, RuleContext,
    },
    Result,
};

/// NUnit2050
pub static FORMAT_SPECIFICATION: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit2050",
    title: "NUnit 4 no longer supports string.Format specification",
    message_format: "The {0} method uses a format specification with arguments; replace it \
                     with an interpolated string",
    category: Category::Assertion,
    default_severity: Severity::Error,
    description: "The message overloads taking a format string and params arguments were \
                  removed in NUnit 4.",
};

/// Reports constraint-model assertions whose message is a format string with arguments
pub struct FormatStringRule;

impl FormatStringRule {
    fn applies(assert: &AssertInvocation<'_>) -> bool {
        match assert.class {
            AssertClass::Assume | AssertClass::Warn => true,
            AssertClass::Assert => !CLASSIC_METHODS.iter().any(|(m, _)| *m == assert.method),
            _ => false,
        }
    }
}

impl Rule for FormatStringRule {
    fn name(&self) -> &'static str {
        "format-specification"
    }

    fn descriptors(&self) -> Vec<&'static DiagnosticDescriptor> {
        vec![&FORMAT_SPECIFICATION]
    }

    fn analyze(&self, cx: &RuleContext<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<()> {
        for assert in cx.assert_invocations()? {
            if !Self::applies(&assert) || assert.arguments(names::ARGS_PARAMETER).is_empty() {
                continue;
            }
            let Some(message) = assert.call.argument_named(names::MESSAGE_PARAMETER) else {
                continue;
            };
            let properties = Properties::new()
                .with(keys::METHOD_NAME, assert.method)
                .with(keys::PARAMS_ARGUMENT_IS_ARRAY, params_argument_is_array(&assert))
                .with(keys::MESSAGE_ARGUMENT_INDEX, message);
            let span = assert.expr.span;
            diagnostics.push(
                Diagnostic::new(&FORMAT_SPECIFICATION, cx.tree(), span, &[assert.method])
                    .with_properties(properties),
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
        FormatStringRule.analyze(&cx, &mut diagnostics).unwrap();
        diagnostics
    }

    #[test]
    fn test_format_arguments_are_reported() {
        let diagnostics = run(
            "Assert.That(GetValue(), Is.EqualTo(42), \"Got {0}\", GetValue());
            Assert.Pass(\"Passed: {0}\", 42);
            Assert.Pass(\"Passed\");
            Assert.That(true, $\"Got {GetValue()}\");
            ClassicAssert.IsTrue(true, \"{0}\", 1);",
        );
        let methods: Vec<_> = diagnostics
            .iter()
            .map(|d| d.properties.get(keys::METHOD_NAME).unwrap().to_string())
            .collect();
        assert_eq!(methods, vec!["That", "Pass"]);
        assert_eq!(
            diagnostics[0].properties.number(keys::MESSAGE_ARGUMENT_INDEX).unwrap(),
            2
        );
        assert_eq!(
            diagnostics[1].properties.number(keys::MESSAGE_ARGUMENT_INDEX).unwrap(),
            0
        );
    }

    #[test]
    fn test_params_array() {
        let diagnostics = run(
            "var values = new object[] { 1, 2 };
            Assert.Fail(\"{0} {1}\", values);
            Assert.Fail(\"{0} {1}\", 1, 2);",
        );
        assert!(diagnostics[0].properties.flag(keys::PARAMS_ARGUMENT_IS_ARRAY).unwrap());
        assert!(!diagnostics[1].properties.flag(keys::PARAMS_ARGUMENT_IS_ARRAY).unwrap());
    }
}
