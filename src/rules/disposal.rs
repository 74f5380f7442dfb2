//! Disposable fixture members that are never disposed.

use crate::{
    host::types::{DefId, TypeRegistry},
    lifecycle,
    query::names,
    rules::{
        descriptor::{Category, DiagnosticDescriptor, Severity},
        diagnostic::{keys, Diagnostic, Properties},
        Rule, RuleContext,
    },
    Result,
};

/// NUnit1032
pub static UNDISPOSED_MEMBER: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit1032",
    title: "An IDisposable field/property should be Disposed in a TearDown method",
    message_format: "The {0} {1} should be disposed in a method annotated with [{2}]",
    category: Category::Structure,
    default_severity: Severity::Error,
    description: "A disposable value stored in a fixture member must be disposed in the \
                  tear-down matching the phase that created it.",
};

/// True if the class or one of its members carries a framework attribute
fn is_test_fixture(registry: &TypeRegistry, def: DefId) -> bool {
    let framework = |name: &String| name.starts_with(names::NUNIT_FRAMEWORK);
    let definition = registry.def(def);
    definition.attributes.iter().any(framework)
        || definition
            .members
            .iter()
            .any(|member| member.attributes.iter().any(framework))
}

/// Reports fields and properties of test fixtures that hold a disposable value not disposed in
/// the matching tear-down phase
pub struct DisposalRule;

impl Rule for DisposalRule {
    fn name(&self) -> &'static str {
        "fixture-disposal"
    }

    fn descriptors(&self) -> Vec<&'static DiagnosticDescriptor> {
        vec![&UNDISPOSED_MEMBER]
    }

    fn analyze(&self, cx: &RuleContext<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<()> {
        for decl in cx.cx.tree.root().types() {
            cx.check_cancelled()?;
            let Some(def) = cx.compilation.declared_type(cx.tree(), decl) else {
                continue;
            };
            if !is_test_fixture(cx.cx.registry, def) {
                continue;
            }
            let undisposed = lifecycle::undisposed_members(&cx.cx, cx.config(), decl, def);
            log::debug!(
                "class {}: {} undisposed member(s)",
                decl.name.text,
                undisposed.len()
            );
            for member in undisposed {
                let kind = member.kind.to_string();
                let teardown = member.teardown.to_string();
                diagnostics.push(
                    Diagnostic::new(
                        &UNDISPOSED_MEMBER,
                        cx.tree(),
                        member.span,
                        &[&kind, &member.name, &teardown],
                    )
                    .with_properties(Properties::new().with(keys::MEMBER_NAME, &member.name)),
                );
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
        test::{compile, with_usings},
        Error,
    };

    fn run(source: &str) -> Vec<Diagnostic> {
        let compilation = compile(&with_usings(source));
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        DisposalRule.analyze(&cx, &mut diagnostics).unwrap();
        diagnostics
    }

    #[test]
    fn test_message_and_location() {
        let source = "public class Tests
            {
                private Stream? Input { get; set; }

                [OneTimeSetUp]
                public void Start() => Input = File.OpenRead(\"in.txt\");

                [Test]
                public void Read() { }
            }";
        let diagnostics = run(source);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(
            diagnostics[0].message,
            "The property Input should be disposed in a method annotated with [OneTimeTearDown]"
        );
        assert_eq!(
            diagnostics[0].properties.get(keys::MEMBER_NAME).unwrap(),
            "Input"
        );
        let text = with_usings(source);
        assert_eq!(&text[diagnostics[0].span.start..diagnostics[0].span.end], "Input");
    }

    #[test]
    fn test_plain_classes_are_ignored() {
        let diagnostics = run(
            "public class Holder
            {
                private Stream stream;
                public void Open() { stream = File.OpenRead(\"a\"); }
            }",
        );
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_cancellation() {
        let compilation = compile(&with_usings("public class Tests { }"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        assert!(matches!(
            DisposalRule.analyze(&cx, &mut diagnostics),
            Err(Error::Cancelled)
        ));
    }
}
