//! String source names to `nameof`.

use crate::{
    fixes::{factory::Code, CodeAction, FixProvider, TextEdit},
    query::TreeContext,
    rules::{keys, Diagnostic, USE_NAMEOF},
    Result,
};

/// Replaces a string naming a test source member with `nameof(Member)`
pub struct NameofFix;

impl FixProvider for NameofFix {
    fn fixable_ids(&self) -> Vec<&'static str> {
        vec![USE_NAMEOF.id]
    }

    fn actions(&self, _cx: &TreeContext<'_>, diagnostic: &Diagnostic) -> Result<Vec<CodeAction>> {
        let member = diagnostic.properties.get(keys::MEMBER_NAME)?;
        let replacement = Code::name("nameof").call([member]);
        Ok(vec![CodeAction {
            title: format!("Use {replacement}"),
            equivalence_key: "UseNameofOperator",
            edit: TextEdit::new(diagnostic.span, replacement.to_string()),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::CancellationToken,
        fixes::apply_edits,
        rules::{Rule, RuleContext, SourceRule},
        test::{compile, with_usings},
    };

    #[test]
    fn test_string_names_become_nameof() {
        let source = with_usings(
            "public class Data { public static int[] Values = { 1 }; }
public class Tests
{
    private static readonly int[] Cases = { 1, 2 };

    [TestCaseSource(\"Cases\")]
    public void A(int value) { }

    [TestCaseSource(typeof(Data), \"Values\")]
    public void B(int value) { }
}",
        );
        let compilation = compile(&source);
        let cancel = CancellationToken::new();
        let cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        SourceRule.analyze(&cx, &mut diagnostics).unwrap();

        let edits: Vec<_> = diagnostics
            .iter()
            .flat_map(|d| NameofFix.actions(&cx.cx, d).unwrap())
            .map(|action| action.edit)
            .collect();
        let fixed = apply_edits(&source, &edits);
        assert!(fixed.contains("[TestCaseSource(nameof(Cases))]"));
        assert!(fixed.contains("[TestCaseSource(typeof(Data), nameof(Data.Values))]"));
    }
}
