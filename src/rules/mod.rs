//! Diagnostic-producing rules.
//!
//! Every rule implements [`Rule`]: it owns one or more [`DiagnosticDescriptor`]s and inspects one
//! syntax tree at a time through a [`RuleContext`]. Rules hold only immutable tables, so a single
//! instance serves all trees of a compilation in parallel.
//!
//! # Key Components
//!
//! - [`ClassicAssertRule`] - classic model calls that have a constraint equivalent
//! - [`EqualityRule`] - `EqualTo` comparisons between types that can never be equal
//! - [`DisposalRule`] - disposable fixture members left undisposed
//! - [`FormatStringRule`] - message arguments using format specifications
//! - [`MultipleAssertsRule`] - consecutive independent `Assert.That` calls
//! - [`SourceRule`] - `TestCaseSource`/`ValueSource` references
//!
//! The ids and default severities:
//!
//! | Id | Severity | Rule |
//! |----|----------|------|
//! | NUnit1014 | warning | source names should use `nameof` |
//! | NUnit1015 | error | source member not found |
//! | NUnit1016 | error | source member not static |
//! | NUnit1032 | error | disposable member not disposed in tear-down |
//! | NUnit2001-2039, 2070-2073 | info | classic assertion |
//! | NUnit2048 / NUnit2049 | info | `StringAssert` / `CollectionAssert` |
//! | NUnit2021 | error | incompatible `EqualTo` types |
//! | NUnit2045 | info | group independent assertions |
//! | NUnit2050 | error | format specification in message |

mod classic;
mod descriptor;
mod diagnostic;
mod disposal;
mod equality;
mod format;
mod multiple;
mod source;

pub use classic::{ClassicAssertRule, CLASSIC_METHODS, COLLECTION_ASSERT_USAGE, STRING_ASSERT_USAGE};
pub use descriptor::{Category, DiagnosticDescriptor, Severity, DOCUMENTATION_BASE};
pub use diagnostic::{keys, Diagnostic, Properties};
pub use disposal::{DisposalRule, UNDISPOSED_MEMBER};
pub use equality::{EqualityRule, INCOMPATIBLE_EQUAL_TO};
pub use format::{FormatStringRule, FORMAT_SPECIFICATION};
pub use multiple::{MultipleAssertsRule, USE_ASSERT_MULTIPLE};
pub use source::{SourceRule, SOURCE_NOT_FOUND, SOURCE_NOT_STATIC, USE_NAMEOF};

use crate::{
    config::AnalyzerConfig,
    engine::CancellationToken,
    host::semantic::Compilation,
    query::{self, AssertInvocation, TreeContext},
    Result,
};

/// A diagnostic-producing rule
pub trait Rule: Send + Sync {
    /// Name for logging
    fn name(&self) -> &'static str;

    /// The diagnostics this rule can produce
    fn descriptors(&self) -> Vec<&'static DiagnosticDescriptor>;

    /// Inspect one tree and push findings with their default severity.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Cancelled`] if the token is cancelled while the rule runs.
    fn analyze(&self, cx: &RuleContext<'_>, diagnostics: &mut Vec<Diagnostic>) -> Result<()>;
}

/// One tree of a compilation as seen by a rule
#[derive(Clone, Copy)]
pub struct RuleContext<'c> {
    /// The compilation
    pub compilation: &'c Compilation,
    /// The tree with its semantic model
    pub cx: TreeContext<'c>,
    /// Cancellation signal
    pub cancel: &'c CancellationToken,
}

impl<'c> RuleContext<'c> {
    /// Context for tree `index`
    #[must_use]
    pub fn new(compilation: &'c Compilation, index: usize, cancel: &'c CancellationToken) -> Self {
        RuleContext {
            compilation,
            cx: TreeContext::new(compilation, index),
            cancel,
        }
    }

    /// The analyzer configuration
    #[must_use]
    pub fn config(&self) -> &'c AnalyzerConfig {
        self.compilation.config()
    }

    /// Index of the tree
    #[must_use]
    pub fn tree(&self) -> usize {
        self.cx.index
    }

    /// Fail with [`crate::Error::Cancelled`] once cancellation was requested
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Cancelled`] if the token is cancelled.
    pub fn check_cancelled(&self) -> Result<()> {
        self.cancel.check()
    }

    /// Every resolved assertion call of the tree, in source order
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Cancelled`] if the token is cancelled.
    pub fn assert_invocations(&self) -> Result<Vec<AssertInvocation<'c>>> {
        let mut found = Vec::new();
        for expr in query::invocations(self.cx.tree.root()) {
            self.check_cancelled()?;
            if let Some(assert) = query::assert_invocation(&self.cx, expr) {
                found.push(assert);
            }
        }
        Ok(found)
    }
}

/// A new instance of every rule
#[must_use]
pub fn all_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(SourceRule),
        Box::new(DisposalRule),
        Box::new(ClassicAssertRule),
        Box::new(EqualityRule),
        Box::new(MultipleAssertsRule),
        Box::new(FormatStringRule),
    ]
}

/// The descriptor with id `id`
#[must_use]
pub fn descriptor(id: &str) -> Option<&'static DiagnosticDescriptor> {
    all_rules()
        .iter()
        .flat_map(|rule| rule.descriptors())
        .find(|d| d.id.eq_ignore_ascii_case(id))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_descriptor_ids_are_unique() {
        let mut seen = HashSet::new();
        for rule in all_rules() {
            for descriptor in rule.descriptors() {
                assert!(seen.insert(descriptor.id), "duplicate id {}", descriptor.id);
                assert!(descriptor.id.starts_with("NUnit"));
            }
        }
        assert!(seen.len() > 30);
    }

    #[test]
    fn test_descriptor_lookup() {
        let descriptor = descriptor("nunit2005").unwrap();
        assert_eq!(descriptor.id, "NUnit2005");
        assert_eq!(descriptor.default_severity, Severity::Info);
        assert!(descriptor.help_link().ends_with("/NUnit2005.md"));
    }
}
