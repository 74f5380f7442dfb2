//! Grouping independent assertions.

use crate::{
    fixes::{factory::Code, CodeAction, FixProvider, TextEdit},
    host::syntax::Span,
    query::TreeContext,
    rules::{keys, Diagnostic, USE_ASSERT_MULTIPLE},
    Result,
};

/// Wraps a run of `Assert.That` statements into `Assert.Multiple` or, from NUnit 4.2 on, a
/// `using (Assert.EnterMultipleScope())` block
pub struct MultipleAssertsFix;

impl MultipleAssertsFix {
    /// The statements of `span`, each line moved four columns to the right
    fn indented_block(cx: &TreeContext<'_>, span: Span, indent: &str, newline: &str) -> String {
        let mut block = String::new();
        block.push_str(indent);
        block.push('{');
        block.push_str(newline);
        for (i, line) in cx.text(span).lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if i == 0 {
                block.push_str(indent);
            }
            if !line.trim().is_empty() {
                block.push_str("    ");
                block.push_str(line);
            }
            block.push_str(newline);
        }
        block.push_str(indent);
        block.push('}');
        block
    }

    fn contains_await(cx: &TreeContext<'_>, span: Span) -> bool {
        cx.tree
            .tokens()
            .iter()
            .filter(|token| span.contains(token.span))
            .any(|token| token.is("await"))
    }
}

impl FixProvider for MultipleAssertsFix {
    fn fixable_ids(&self) -> Vec<&'static str> {
        vec![USE_ASSERT_MULTIPLE.id]
    }

    fn actions(&self, cx: &TreeContext<'_>, diagnostic: &Diagnostic) -> Result<Vec<CodeAction>> {
        let properties = &diagnostic.properties;
        let count = properties.number(keys::STATEMENT_COUNT)?;
        if count != diagnostic.additional_spans.len() {
            return Err(malformed_error!(
                "{} statements recorded, {} located",
                count,
                diagnostic.additional_spans.len()
            ));
        }

        let span = diagnostic.span;
        let newline = cx.tree.newline();
        let indent = cx.tree.line_indent(span.start);
        let block = Self::indented_block(cx, span, indent, newline);

        let (title, key, replacement) = if properties.flag(keys::SUPPORTS_ENTER_MULTIPLE_SCOPE)? {
            let scope = Code::path("Assert.EnterMultipleScope").call_with("()");
            (
                "Use Assert.EnterMultipleScope",
                "UseAssertEnterMultipleScope",
                format!("using ({scope}){newline}{block}"),
            )
        } else if Self::contains_await(cx, span) {
            let lambda = format!("async () =>{newline}{block}");
            (
                "Use Assert.MultipleAsync",
                "UseAssertMultiple",
                format!("await {};", Code::path("Assert.MultipleAsync").call([lambda])),
            )
        } else {
            let lambda = format!("() =>{newline}{block}");
            (
                "Use Assert.Multiple",
                "UseAssertMultiple",
                format!("{};", Code::path("Assert.Multiple").call([lambda])),
            )
        };

        log::debug!("grouping {} assertions at {}", count, span);
        Ok(vec![CodeAction {
            title: title.to_string(),
            equivalence_key: key,
            edit: TextEdit::new(span, replacement),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{AnalyzerConfig, FrameworkVersion},
        engine::CancellationToken,
        fixes::apply_edits,
        rules::{MultipleAssertsRule, Rule, RuleContext},
        test::compile_with,
    };

    const HEADER: &str = "using NUnit.Framework;
using System.Threading.Tasks;

public class Tests
{
";

    fn fix(method: &str, config: AnalyzerConfig) -> String {
        let source = format!("{HEADER}{method}}}\n");
        let compilation = compile_with(&source, config);
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        MultipleAssertsRule.analyze(&cx, &mut diagnostics).unwrap();
        let edits: Vec<_> = diagnostics
            .iter()
            .flat_map(|d| MultipleAssertsFix.actions(&cx.cx, d).unwrap())
            .map(|action| action.edit)
            .collect();
        let fixed = apply_edits(&source, &edits);
        fixed[HEADER.len()..fixed.len() - 2].to_string()
    }

    #[test]
    fn test_assert_multiple() {
        let method = "    [Test]
    public void T()
    {
        Assert.That(1, Is.EqualTo(1));
        // second
        Assert.That(2, Is.EqualTo(2));
    }
";
        assert_eq!(
            fix(method, AnalyzerConfig::default()),
            "    [Test]
    public void T()
    {
        Assert.Multiple(() =>
        {
            Assert.That(1, Is.EqualTo(1));
            // second
            Assert.That(2, Is.EqualTo(2));
        });
    }
"
        );
    }

    #[test]
    fn test_enter_multiple_scope() {
        let method = "    [Test]
    public void T()
    {
        Assert.That(1, Is.EqualTo(1));
        Assert.That(2, Is.EqualTo(2));
    }
";
        let config =
            AnalyzerConfig::default().with_framework_version(FrameworkVersion::new(4, 2, 0));
        assert_eq!(
            fix(method, config),
            "    [Test]
    public void T()
    {
        using (Assert.EnterMultipleScope())
        {
            Assert.That(1, Is.EqualTo(1));
            Assert.That(2, Is.EqualTo(2));
        }
    }
"
        );
    }

    #[test]
    fn test_awaited_actual_uses_multiple_async() {
        let method = "    [Test]
    public async Task T()
    {
        Assert.That(await Task.FromResult(1), Is.EqualTo(1));
        Assert.That(2, Is.EqualTo(2));
    }
";
        assert_eq!(
            fix(method, AnalyzerConfig::default()),
            "    [Test]
    public async Task T()
    {
        await Assert.MultipleAsync(async () =>
        {
            Assert.That(await Task.FromResult(1), Is.EqualTo(1));
            Assert.That(2, Is.EqualTo(2));
        });
    }
"
        );
    }
}
