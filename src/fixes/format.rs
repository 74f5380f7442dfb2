//! Format specification messages to interpolated strings.

use crate::{
    fixes::{arguments, assert_at, factory::Code, interpolation, CodeAction, FixProvider, TextEdit},
    host::syntax::{Argument, Expr, ExprKind, Literal},
    query::{names, AssertClass, AssertInvocation, TreeContext},
    rules::{keys, Diagnostic, FORMAT_SPECIFICATION},
    Result,
};

/// Text of an argument value, parenthesized when it is a conditional expression
fn substitution(cx: &TreeContext<'_>, expr: &Expr) -> String {
    let text = cx.text(expr.span);
    match &expr.unparenthesized().kind {
        ExprKind::Conditional { .. } if !matches!(expr.kind, ExprKind::Parenthesized(_)) => {
            format!("({text})")
        }
        _ => text.to_string(),
    }
}

/// The values the placeholders refer to, if they are known one by one
fn format_values<'c>(assert: &AssertInvocation<'c>, is_array: bool) -> Option<Vec<&'c Expr>> {
    let args = assert.arguments(names::ARGS_PARAMETER);
    if !is_array {
        return Some(args.into_iter().map(|arg| &arg.expr).collect());
    }
    match &args.first()?.expr.unparenthesized().kind {
        ExprKind::ArrayCreation {
            initializer: Some(elements),
            ..
        } => Some(elements.iter().collect()),
        _ => None,
    }
}

/// A single message expression replacing the message and its `params` arguments.
///
/// A literal format string becomes an interpolated string. Anything else is formatted at run
/// time: `Assert.That` gets a message factory lambda, the other methods an inline
/// `string.Format` call.
///
/// # Errors
///
/// Returns [`crate::Error::InvalidFormatString`] if a literal format string cannot be decoded.
pub(crate) fn message_expression(
    cx: &TreeContext<'_>,
    assert: &AssertInvocation<'_>,
    message: &Argument,
    is_array: bool,
) -> Result<String> {
    let format_args = assert.arguments(names::ARGS_PARAMETER);
    if format_args.is_empty() {
        return Ok(cx.text(message.expr.span).to_string());
    }

    let values = format_values(assert, is_array);
    if let (ExprKind::Literal(Literal::String { verbatim, .. }), Some(values)) =
        (&message.expr.kind, values.as_ref())
    {
        let literal = cx.text(message.expr.span);
        let prefix = if *verbatim { 2 } else { 1 };
        let content = literal
            .get(prefix..literal.len().saturating_sub(1))
            .unwrap_or_default();
        let values: Vec<String> = values.iter().map(|expr| substitution(cx, expr)).collect();
        return interpolation::interpolate(content, *verbatim, &values);
    }

    log::trace!(
        "format string at {} is not a literal, formatting at run time",
        message.span.start
    );
    let call = Code::path("string.Format").call(
        std::iter::once(&message.expr)
            .chain(format_args.iter().map(|arg| &arg.expr))
            .map(|expr| cx.text(expr.span)),
    );
    if assert.is(AssertClass::Assert, "That") {
        Ok(call.into_lambda(false).to_string())
    } else {
        Ok(call.to_string())
    }
}

/// Replaces the message and its `params` arguments with one interpolated message
pub struct FormatStringFix;

impl FixProvider for FormatStringFix {
    fn fixable_ids(&self) -> Vec<&'static str> {
        vec![FORMAT_SPECIFICATION.id]
    }

    fn actions(&self, cx: &TreeContext<'_>, diagnostic: &Diagnostic) -> Result<Vec<CodeAction>> {
        let properties = &diagnostic.properties;
        let message_index = properties.number(keys::MESSAGE_ARGUMENT_INDEX)?;
        let is_array = properties.flag(keys::PARAMS_ARGUMENT_IS_ARRAY)?;
        let assert = assert_at(cx, diagnostic.span)?;
        let Some(message) = assert.args.args.get(message_index) else {
            return Err(malformed_error!(
                "message argument {} is out of range",
                message_index
            ));
        };

        let replacement = match message_expression(cx, &assert, message, is_array) {
            Ok(replacement) => replacement,
            Err(e) => {
                log::trace!("no fix for {}: {}", diagnostic.id(), e);
                return Ok(Vec::new());
            }
        };

        let format_args: Vec<_> = assert
            .arguments(names::ARGS_PARAMETER)
            .into_iter()
            .map(|arg| arg.span)
            .collect();
        let mut new_args = Vec::with_capacity(assert.args.args.len());
        for (i, arg) in assert.args.args.iter().enumerate() {
            if i == message_index {
                new_args.push(match &message.name {
                    Some(name) => format!("{}: {replacement}", name.text),
                    None => replacement.clone(),
                });
            } else if !format_args.contains(&arg.span) {
                new_args.push(cx.text(arg.span).to_string());
            }
        }

        let list = arguments::rebuild(cx.tree, assert.args, &new_args);
        Ok(vec![CodeAction {
            title: "Replace format specification with interpolated string".to_string(),
            equivalence_key: "ConvertToInterpolatedString",
            edit: TextEdit::new(assert.args.span, list),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::CancellationToken,
        fixes::apply_edits,
        rules::{FormatStringRule, Rule, RuleContext},
        test::{compile, fixture},
    };

    /// The fixed body of the fixture's test method
    fn fix(body: &str) -> String {
        let source = fixture(body);
        let compilation = compile(&source);
        let cancel = CancellationToken::new();
        let rule_cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        FormatStringRule.analyze(&rule_cx, &mut diagnostics).unwrap();
        let edits: Vec<TextEdit> = diagnostics
            .iter()
            .flat_map(|d| FormatStringFix.actions(&rule_cx.cx, d).unwrap())
            .map(|action| action.edit)
            .collect();
        let fixed = apply_edits(&source, &edits);
        let start = fixed.find("public void Test()").unwrap();
        let body_start = start + fixed[start..].find('{').unwrap() + 1;
        let body_end = fixed.rfind("    }\n}").unwrap();
        fixed[body_start..body_end].trim().to_string()
    }

    #[test]
    fn test_literal_format_becomes_interpolated() {
        assert_eq!(
            fix("Assert.Pass(\"Passed: {0}\", 42);"),
            "Assert.Pass($\"Passed: {42}\");"
        );
        assert_eq!(fix("Assert.Pass(\"{{{0}}}\", 42);"), "Assert.Pass($\"{{{42}}}\");");
    }

    #[test]
    fn test_constraint_arguments_are_kept() {
        assert_eq!(
            fix(
                "Assert.That(GetValue(), Is.EqualTo(42), \"Got {0} ({1})\", GetValue(), true ? 1 \
                 : 2);"
            ),
            "Assert.That(GetValue(), Is.EqualTo(42), $\"Got {GetValue()} ({(true ? 1 : 2)})\");"
        );
    }

    #[test]
    fn test_array_arguments() {
        assert_eq!(
            fix("Assert.Fail(\"{0} and {1}\", new object[] { 1, \"two\" });"),
            "Assert.Fail($\"{1} and {\"two\"}\");"
        );
        assert_eq!(
            fix("var values = new object[] { 1 };\n        Assert.Fail(\"{0}\", values);"),
            "var values = new object[] { 1 };\n        Assert.Fail(string.Format(\"{0}\", values));"
        );
    }

    #[test]
    fn test_non_literal_format_is_formatted_at_run_time() {
        assert_eq!(
            fix("const string Format = \"{0}\";\n        Assert.That(true, Is.True, Format, 1);"),
            "const string Format = \"{0}\";
        Assert.That(true, Is.True, () => string.Format(Format, 1));"
        );
        assert_eq!(
            fix("string format = \"{0}\";\n        Assume.That(true, Is.True, format, 1);"),
            "string format = \"{0}\";
        Assume.That(true, Is.True, string.Format(format, 1));"
        );
    }
}
