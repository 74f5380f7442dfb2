//! Classic assertions to `Assert.That` with a constraint.

use crate::{
    fixes::{
        arguments, assert_at,
        factory::Code,
        format::message_expression,
        recipe::recipe_for,
        CodeAction, FixProvider, TextEdit,
    },
    host::syntax::{ExprKind, Span},
    query::{names, AssertInvocation, TreeContext},
    rules::{
        keys, Diagnostic, Properties, CLASSIC_METHODS, COLLECTION_ASSERT_USAGE,
        STRING_ASSERT_USAGE,
    },
    Result,
};

/// Rewrites classic model calls into `Assert.That(actual, constraint[, message])`
pub struct ClassicAssertFix;

impl ClassicAssertFix {
    /// Source text of the argument bound to parameter `param`
    fn argument_text<'c>(
        cx: &TreeContext<'c>,
        assert: &AssertInvocation<'c>,
        param: usize,
    ) -> Option<&'c str> {
        let index = assert.call.argument_for(param)?;
        assert.args.args.get(index).map(|arg| cx.text(arg.expr.span))
    }

    /// Explicit type arguments of the invoked method, e.g. `<Foo>` of `IsInstanceOf<Foo>(x)`
    fn type_arguments<'c>(cx: &TreeContext<'c>, assert: &AssertInvocation<'c>) -> Option<&'c str> {
        match &assert.callee.kind {
            ExprKind::MemberAccess { type_args, .. } if !type_args.is_empty() => {
                Some(cx.text(Span::new(assert.name.span.end, assert.callee.span.end)))
            }
            _ => None,
        }
    }

    fn constraint(
        cx: &TreeContext<'_>,
        assert: &AssertInvocation<'_>,
        properties: &Properties,
    ) -> Result<Option<(String, Code)>> {
        let method = properties.get(keys::METHOD_NAME)?;
        let recipe = recipe_for(assert.class, method)?;

        let type_args = Self::type_arguments(cx, assert);
        let (actual_param, expected_param) = match type_args {
            Some(_) => (0, None),
            None => recipe.order.positions(),
        };
        let Some(actual) = Self::argument_text(cx, assert, actual_param) else {
            return Ok(None);
        };

        let mut constraint = if properties.flag(keys::IS_EMPTY_SENTINEL)? {
            match method {
                "AreNotEqual" => Code::path("Is.Not.Empty"),
                _ => Code::path("Is.Empty"),
            }
        } else if let Some(type_args) = type_args {
            let mut code = Code::name(recipe.constraint.helper);
            if let Some(modifier) = recipe.constraint.modifier {
                code = code.member(modifier);
            }
            let method = recipe.constraint.method.unwrap_or_default();
            code.member(format!("{method}{type_args}")).call_with("()")
        } else {
            let expected = match expected_param {
                Some(param) => match Self::argument_text(cx, assert, param) {
                    Some(text) => Some(text),
                    None => return Ok(None),
                },
                None => None,
            };
            recipe.constraint.build(expected)
        };

        if properties.flag(keys::HAS_DELTA)? {
            if let Some(delta) = assert.argument("delta") {
                constraint = constraint.member("Within").call([cx.text(delta.expr.span)]);
            }
        }
        if properties.flag(keys::HAS_COMPARER)? {
            if let Some(comparer) = assert.argument("comparer") {
                constraint = constraint
                    .strip_member("AsCollection")
                    .member("Using")
                    .call([cx.text(comparer.expr.span)]);
            }
        }
        Ok(Some((actual.to_string(), constraint)))
    }
}

impl FixProvider for ClassicAssertFix {
    fn fixable_ids(&self) -> Vec<&'static str> {
        let mut ids: Vec<_> = CLASSIC_METHODS.iter().map(|(_, d)| d.id).collect();
        ids.push(STRING_ASSERT_USAGE.id);
        ids.push(COLLECTION_ASSERT_USAGE.id);
        ids
    }

    fn actions(&self, cx: &TreeContext<'_>, diagnostic: &Diagnostic) -> Result<Vec<CodeAction>> {
        let properties = &diagnostic.properties;
        let assert = assert_at(cx, diagnostic.span)?;
        let Some((actual, constraint)) = Self::constraint(cx, &assert, properties)? else {
            log::trace!(
                "no fix for {} at {}: argument not bound",
                diagnostic.id(),
                diagnostic.span
            );
            return Ok(Vec::new());
        };

        let mut new_args = vec![actual, constraint.to_string()];
        if properties.contains(keys::MESSAGE_ARGUMENT_INDEX) {
            let index = properties.number(keys::MESSAGE_ARGUMENT_INDEX)?;
            let Some(message) = assert.args.args.get(index) else {
                return Err(malformed_error!("message argument {} is out of range", index));
            };
            let is_array = properties.flag(keys::PARAMS_ARGUMENT_IS_ARRAY)?;
            match message_expression(cx, &assert, message, is_array) {
                Ok(message) => new_args.push(message),
                Err(e) => {
                    log::trace!("keeping message at {} as written: {}", message.span.start, e);
                    new_args.push(cx.text(message.expr.span).to_string());
                    new_args.extend(
                        assert
                            .arguments(names::ARGS_PARAMETER)
                            .iter()
                            .map(|arg| cx.text(arg.expr.span).to_string()),
                    );
                }
            }
        }

        let list = arguments::rebuild(cx.tree, assert.args, &new_args);
        let replacement = Code::path("Assert.That").call_with(list);
        let method = properties.get(keys::METHOD_NAME)?;
        Ok(vec![CodeAction {
            title: format!("Use Assert.That instead of {}.{}", assert.class, method),
            equivalence_key: "ConvertToConstraintModel",
            edit: TextEdit::new(assert.expr.span, replacement.to_string()),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        engine::CancellationToken,
        fixes::apply_edits,
        rules::{ClassicAssertRule, Rule, RuleContext},
        test::{compile, fixture},
    };

    fn fix(body: &str) -> Vec<String> {
        let source = fixture(body);
        let compilation = compile(&source);
        let cancel = CancellationToken::new();
        let rule_cx = RuleContext::new(&compilation, 0, &cancel);
        let mut diagnostics = Vec::new();
        ClassicAssertRule.analyze(&rule_cx, &mut diagnostics).unwrap();
        diagnostics
            .iter()
            .map(|d| {
                let actions = ClassicAssertFix.actions(&rule_cx.cx, d).unwrap();
                let edit = &actions[0].edit;
                let fixed = apply_edits(compilation.tree(0).text(), std::slice::from_ref(edit));
                fixed[edit.span.start..]
                    .split(";\n")
                    .next()
                    .unwrap()
                    .to_string()
            })
            .collect()
    }

    #[test]
    fn test_collection_are_equal() {
        assert_eq!(
            fix("var expected = new[] { 1 }; var actual = new[] { 1 };
        CollectionAssert.AreEqual(expected, actual);"),
            vec!["Assert.That(actual, Is.EqualTo(expected).AsCollection)"]
        );
    }

    #[test]
    fn test_comparer_replaces_as_collection() {
        assert_eq!(
            fix("var expected = new[] { 1 }; var actual = new[] { 1 }; IComparer? comparer = null;
        CollectionAssert.AreEqual(expected, actual, comparer);"),
            vec!["Assert.That(actual, Is.EqualTo(expected).Using(comparer))"]
        );
    }

    #[test]
    fn test_orders_and_modifiers() {
        assert_eq!(
            fix("ClassicAssert.IsTrue(GetValue() > 1);
        ClassicAssert.AreNotEqual(1, GetValue());
        ClassicAssert.Greater(GetValue(), 2);
        StringAssert.DoesNotStartWith(\"a\", \"abc\");"),
            vec![
                "Assert.That(GetValue() > 1, Is.True)",
                "Assert.That(GetValue(), Is.Not.EqualTo(1))",
                "Assert.That(GetValue(), Is.GreaterThan(2))",
                "Assert.That(\"abc\", Does.Not.StartWith(\"a\"))",
            ]
        );
    }

    #[test]
    fn test_delta_sentinel_and_message() {
        assert_eq!(
            fix("ClassicAssert.AreEqual(1.0, 1.1, 0.2);
        ClassicAssert.AreEqual(string.Empty, GetValue().ToString());
        ClassicAssert.IsNotNull(GetValue(), \"value {0}\", 1);"),
            vec![
                "Assert.That(1.1, Is.EqualTo(1.0).Within(0.2))",
                "Assert.That(GetValue().ToString(), Is.Empty)",
                "Assert.That(GetValue(), Is.Not.Null, $\"value {1}\")",
            ]
        );
    }

    #[test]
    fn test_same_count_preserves_trivia() {
        assert_eq!(
            fix("ClassicAssert.AreEqual(1,\n            GetValue());"),
            vec!["Assert.That(GetValue(),\n            Is.EqualTo(1))"]
        );
    }

    #[test]
    fn test_generic_instance_of() {
        assert_eq!(
            fix("ClassicAssert.IsInstanceOf<string>(\"a\");"),
            vec!["Assert.That(\"a\", Is.InstanceOf<string>())"]
        );
    }
}
