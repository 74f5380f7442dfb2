//! `TestCaseSource` and `ValueSource` member references.

use crate::{
    host::{
        syntax::{Argument, AttributeSyntax, ExprKind, TypeDecl},
        types::Ty,
    },
    query::names,
    rules::{
        descriptor::{Category, DiagnosticDescriptor, Severity},
        diagnostic::{keys, Diagnostic, Properties},
        Rule, RuleContext,
    },
    Result,
};

/// NUnit1014
pub static USE_NAMEOF: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit1014",
    title: "TestCaseSource should use nameof operator to specify target",
    message_format: "Consider using nameof({0}) instead of \"{1}\"",
    category: Category::Structure,
    default_severity: Severity::Warning,
    description: "A nameof expression keeps the source reference valid when the member is renamed.",
};

/// NUnit1015
pub static SOURCE_NOT_FOUND: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit1015",
    title: "The source type does not contain the source member",
    message_format: "The source '{0}' does not specify an existing member",
    category: Category::Structure,
    default_severity: Severity::Error,
    description: "The named source member must exist on the source type.",
};

/// NUnit1016
pub static SOURCE_NOT_STATIC: DiagnosticDescriptor = DiagnosticDescriptor {
    id: "NUnit1016",
    title: "Source must be static",
    message_format: "The specified source '{0}' is not static",
    category: Category::Structure,
    default_severity: Severity::Error,
    description: "Test case and value sources are read before any fixture instance exists.",
};

/// Reports source attributes naming their member with a string, naming a missing member or
/// naming an instance member
pub struct SourceRule;

/// How the source member was named
enum SourceName<'c> {
    Literal(&'c str),
    NameOf(&'c str),
}

impl SourceRule {
    fn check_attribute(
        cx: &RuleContext<'_>,
        attribute: &AttributeSyntax,
        containing: &Ty,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let model = cx.cx.model;
        let registry = cx.cx.registry;
        let Some(info) = model.attribute(attribute) else {
            return;
        };
        let Some(def) = info.ty.def() else {
            return;
        };
        let attribute_name = registry.metadata_name(def);
        if attribute_name != names::TEST_CASE_SOURCE_ATTRIBUTE
            && attribute_name != names::VALUE_SOURCE_ATTRIBUTE
        {
            return;
        }
        let (Some(call), Some(list)) = (info.call.as_ref(), attribute.args.as_ref()) else {
            return;
        };
        let Some(name_arg) = call.argument_named("sourceName").and_then(|i| list.args.get(i)) else {
            return;
        };

        let source_type_arg = call.argument_named("sourceType").and_then(|i| list.args.get(i));
        let target = match source_type_arg {
            Some(arg) => match model.typeof_operand(&arg.expr) {
                Some(ty) => ty.clone(),
                None => return,
            },
            None => containing.clone(),
        };

        let Some(name) = source_name(name_arg) else {
            log::trace!("skipping non-constant source name at {}", name_arg.span.start);
            return;
        };
        let (member_name, is_literal) = match name {
            SourceName::Literal(value) => (value, true),
            SourceName::NameOf(value) => (value, false),
        };

        let members = registry.members_named(&target, member_name);
        let Some(member) = members.first() else {
            diagnostics.push(Diagnostic::new(
                &SOURCE_NOT_FOUND,
                cx.tree(),
                name_arg.expr.span,
                &[member_name],
            ));
            return;
        };

        if is_literal {
            let qualified = match source_type_arg {
                Some(arg) => match &arg.expr.kind {
                    ExprKind::TypeOf(ty) => format!("{}.{}", cx.cx.text(ty.span), member_name),
                    _ => member_name.to_string(),
                },
                None => member_name.to_string(),
            };
            diagnostics.push(
                Diagnostic::new(
                    &USE_NAMEOF,
                    cx.tree(),
                    name_arg.expr.span,
                    &[&qualified, member_name],
                )
                .with_properties(Properties::new().with(keys::MEMBER_NAME, qualified)),
            );
        }

        if !registry.member(member).is_static() {
            diagnostics.push(Diagnostic::new(
                &SOURCE_NOT_STATIC,
                cx.tree(),
                name_arg.expr.span,
                &[member_name],
            ));
        }
    }

    fn check_type(cx: &RuleContext<'_>, decl: &TypeDecl, diagnostics: &mut Vec<Diagnostic>) {
        let Some(def) = cx.compilation.declared_type(cx.tree(), decl) else {
            return;
        };
        let containing = Ty::named(def);
        for method in decl.methods() {
            for attribute in &method.attributes {
                Self::check_attribute(cx, attribute, &containing, diagnostics);
            }
            for param in &method.params {
                for attribute in &param.attributes {
                    Self::check_attribute(cx, attribute, &containing, diagnostics);
                }
            }
        }
    }
}

/// The member name of a string literal or a `nameof` expression
fn source_name(arg: &Argument) -> Option<SourceName<'_>> {
    let expr = arg.expr.unparenthesized();
    if let Some(value) = expr.string_value() {
        return Some(SourceName::Literal(value));
    }
    let ExprKind::Invocation { args, .. } = &expr.kind else {
        return None;
    };
    if expr.invoked_name() != Some("nameof") {
        return None;
    }
    let operand = args.args.first()?;
    operand
        .expr
        .member_name()
        .map(|name| SourceName::NameOf(name.text.as_str()))
}

impl Rule for SourceRule {
    fn name(&self) -> &'static str {
        "test-source"
    }

    fn descriptors(&self) -> Vec<&'static DiagnosticDescriptor> {
        vec![&USE_NAMEOF, &SOURCE_NOT_FOUND, &SOURCE_NOT_STATIC]
    }

    fn analyze(&self, cx: &RuleContext<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<()> {
        for decl in cx.cx.tree.root().types() {
            cx.check_cancelled()?;
            Self::check_type(cx, decl, diagnostics);
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
    };

    fn run(source: &str) -> Vec<(&'static str, String)> {
        let compilation = compile(&with_usings(source));
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        SourceRule.analyze(&cx, &mut diagnostics).unwrap();
        diagnostics
            .iter()
            .map(|d| (d.id(), compilation.tree(0).text_of(d.span).to_string()))
            .collect()
    }

    #[test]
    fn test_string_names() {
        let found = run(
            "public class Tests
            {
                private static readonly int[] Cases = { 1, 2 };
                private readonly int[] instanceCases = { 3 };

                [TestCaseSource(\"Cases\")]
                public void A(int value) { }

                [TestCaseSource(\"Missing\")]
                public void B(int value) { }

                [TestCaseSource(\"instanceCases\")]
                public void C(int value) { }

                [TestCaseSource(nameof(Cases))]
                public void D(int value) { }
            }",
        );
        assert_eq!(
            found,
            vec![
                ("NUnit1014", "\"Cases\"".to_string()),
                ("NUnit1015", "\"Missing\"".to_string()),
                ("NUnit1014", "\"instanceCases\"".to_string()),
                ("NUnit1016", "\"instanceCases\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_nameof_and_source_type() {
        let found = run(
            "public class Data
            {
                public static IEnumerable<int> Values => new[] { 1 };
                public IEnumerable<int> Instance => new[] { 2 };
            }

            public class Tests
            {
                [TestCaseSource(typeof(Data), nameof(Data.Instance))]
                public void A(int value) { }

                [Test]
                public void B([ValueSource(typeof(Data), \"Values\")] int value) { }

                [TestCaseSource(typeof(Data), \"Nope\")]
                public void C(int value) { }
            }",
        );
        assert_eq!(
            found,
            vec![
                ("NUnit1016", "nameof(Data.Instance)".to_string()),
                ("NUnit1014", "\"Values\"".to_string()),
                ("NUnit1015", "\"Nope\"".to_string()),
            ]
        );
    }

    #[test]
    fn test_qualified_member_name_property() {
        let compilation = compile(&with_usings(
            "public class Data { public static int[] Values = { 1 }; }
            public class Tests
            {
                [TestCaseSource(typeof(Data), \"Values\")]
                public void A(int value) { }
            }",
        ));
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        SourceRule.analyze(&cx, &mut diagnostics).unwrap();
        assert_eq!(
            diagnostics[0].properties.get(keys::MEMBER_NAME).unwrap(),
            "Data.Values"
        );
        assert_eq!(
            diagnostics[0].message,
            "Consider using nameof(Data.Values) instead of \"Values\""
        );
    }
}
