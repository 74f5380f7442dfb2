//! Analysis driver.
//!
//! The [`AnalysisEngine`] owns one instance of every rule and every fix provider. Rules are
//! stateless, so the engine runs all syntax trees of a compilation in parallel and merges the
//! findings afterwards in source order. Configured severity overrides are applied to the merged
//! result; a rule disabled by configuration still runs but its findings are dropped.
//!
//! # Examples
//!
//! ```rust
//! use assertscope::{config::AnalyzerConfig, AnalysisEngine};
//!
//! let source = "using NUnit.Framework;
//! using NUnit.Framework.Legacy;
//! public class Tests
//! {
//!     [Test]
//!     public void T() { ClassicAssert.IsTrue(1 < 2); }
//! }";
//! let fixed = AnalysisEngine::with_defaults().fix_all(source, AnalyzerConfig::default())?;
//! assert!(fixed.contains("Assert.That(1 < 2, Is.True);"));
//! # Ok::<(), assertscope::Error>(())
//! ```

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use rayon::prelude::*;

use crate::{
    config::AnalyzerConfig,
    fixes::{self, apply_edits, CodeAction, FixProvider},
    host::semantic::Compilation,
    query::TreeContext,
    rules::{self, Diagnostic, Rule, RuleContext},
    Error, Result,
};

/// Cooperative cancellation signal shared between the caller and a running analysis.
///
/// Clones share the same flag. Rules check it at the start of every invocation and every
/// class declaration they inspect.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// A token that is not cancelled
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// True once cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Fail once cancellation was requested
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the token is cancelled.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Runs rules over compilations and produces fixes for their findings
pub struct AnalysisEngine {
    /// Registered rules
    pub rules: Vec<Box<dyn Rule>>,
    /// Registered fix providers
    pub fixes: Vec<Box<dyn FixProvider>>,
}

impl Default for AnalysisEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl AnalysisEngine {
    /// An engine without rules or fixes
    #[must_use]
    pub fn new() -> Self {
        AnalysisEngine {
            rules: Vec::new(),
            fixes: Vec::new(),
        }
    }

    /// An engine with every built-in rule and fix
    #[must_use]
    pub fn with_defaults() -> Self {
        AnalysisEngine {
            rules: rules::all_rules(),
            fixes: fixes::all_fixes(),
        }
    }

    /// Register a rule
    #[must_use]
    pub fn with_rule(mut self, rule: Box<dyn Rule>) -> Self {
        self.rules.push(rule);
        self
    }

    /// Register a fix provider
    #[must_use]
    pub fn with_fix(mut self, fix: Box<dyn FixProvider>) -> Self {
        self.fixes.push(fix);
        self
    }

    /// Run every rule on tree `index`
    fn analyze_tree(
        &self,
        compilation: &Compilation,
        index: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>> {
        let cx = RuleContext::new(compilation, index, cancel);
        let mut diagnostics = Vec::new();
        for rule in &self.rules {
            cancel.check()?;
            let before = diagnostics.len();
            rule.analyze(&cx, &mut diagnostics)?;
            log::debug!(
                "{}: rule {} produced {} diagnostics",
                compilation.tree(index).path(),
                rule.name(),
                diagnostics.len() - before
            );
        }
        Ok(diagnostics)
    }

    /// Analyze every tree of `compilation`.
    ///
    /// Diagnostics are ordered by tree, position and id. Severities configured in the
    /// compilation's [`AnalyzerConfig`] replace the defaults; disabled rules report nothing.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `cancel` is triggered before the analysis completes.
    pub fn analyze(
        &self,
        compilation: &Compilation,
        cancel: &CancellationToken,
    ) -> Result<Vec<Diagnostic>> {
        let per_tree = (0..compilation.trees().len())
            .into_par_iter()
            .map(|index| self.analyze_tree(compilation, index, cancel))
            .collect::<Result<Vec<_>>>()?;

        let config = compilation.config();
        let mut diagnostics: Vec<Diagnostic> = per_tree
            .into_iter()
            .flatten()
            .filter_map(|mut diagnostic| {
                let default = diagnostic.descriptor.default_severity;
                diagnostic.severity = config.severity_for(diagnostic.id(), default)?;
                Some(diagnostic)
            })
            .collect();
        diagnostics.sort_by_key(|d| (d.tree, d.span.start, d.id(), d.span.end));
        log::debug!(
            "analyzed {} trees, {} diagnostics",
            compilation.trees().len(),
            diagnostics.len()
        );
        Ok(diagnostics)
    }

    /// The code actions every registered provider offers for `diagnostic`
    ///
    /// # Errors
    ///
    /// Returns an error if a provider finds the diagnostic inconsistent with its rule, see
    /// [`FixProvider::actions`].
    pub fn fixes_for(
        &self,
        compilation: &Compilation,
        diagnostic: &Diagnostic,
    ) -> Result<Vec<CodeAction>> {
        let cx = TreeContext::new(compilation, diagnostic.tree);
        let mut actions = Vec::new();
        for fix in &self.fixes {
            if fix.fixable_ids().contains(&diagnostic.id()) {
                actions.extend(fix.actions(&cx, diagnostic)?);
            }
        }
        Ok(actions)
    }

    /// Analyze a single source and apply the first action of every fixable diagnostic.
    ///
    /// Actions overlapping an earlier one are skipped; running the method again picks them up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Syntax`] if `source` cannot be parsed, or the error of a failing fix.
    pub fn fix_all(&self, source: &str, config: AnalyzerConfig) -> Result<String> {
        let compilation = Compilation::new([("input.cs", source)], config)?;
        let diagnostics = self.analyze(&compilation, &CancellationToken::new())?;
        let mut edits = Vec::new();
        for diagnostic in &diagnostics {
            if let Some(action) = self.fixes_for(&compilation, diagnostic)?.into_iter().next() {
                edits.push(action.edit);
            }
        }
        Ok(apply_edits(source, &edits))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        rules::Severity,
        test::{compile, compile_with, fixture},
    };

    #[test]
    fn test_cancellation_token() {
        let token = CancellationToken::new();
        let shared = token.clone();
        assert!(token.check().is_ok());
        shared.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[test]
    fn test_analyze_orders_diagnostics() {
        let compilation = compile(&fixture(
            "ClassicAssert.IsTrue(true);
        Assert.Pass(\"{0}\", 1);
        ClassicAssert.AreEqual(1, 2);",
        ));
        let diagnostics = AnalysisEngine::with_defaults()
            .analyze(&compilation, &CancellationToken::new())
            .unwrap();
        let ids: Vec<_> = diagnostics.iter().map(Diagnostic::id).collect();
        assert_eq!(ids, vec!["NUnit2003", "NUnit2050", "NUnit2005"]);
    }

    #[test]
    fn test_severity_overrides() {
        let config = AnalyzerConfig::default()
            .with_severity("NUnit2003", None)
            .with_severity("nunit2005", Some(Severity::Warning));
        let compilation = compile_with(
            &fixture("ClassicAssert.IsTrue(true);\n        ClassicAssert.AreEqual(1, 2);"),
            config,
        );
        let diagnostics = AnalysisEngine::with_defaults()
            .analyze(&compilation, &CancellationToken::new())
            .unwrap();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].id(), "NUnit2005");
        assert_eq!(diagnostics[0].severity, Severity::Warning);
    }

    #[test]
    fn test_cancelled_analysis() {
        let compilation = compile(&fixture("ClassicAssert.IsTrue(true);"));
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(matches!(
            AnalysisEngine::with_defaults().analyze(&compilation, &cancel),
            Err(Error::Cancelled)
        ));
    }

    #[test]
    fn test_fix_all() {
        let source = fixture(
            "CollectionAssert.AreEqual(new[] { 1 }, new[] { 1 });
        Assert.Pass(\"Passed: {0}\", 42);",
        );
        let fixed = AnalysisEngine::with_defaults()
            .fix_all(&source, AnalyzerConfig::default())
            .unwrap();
        assert!(fixed.contains("Assert.That(new[] { 1 }, Is.EqualTo(new[] { 1 }).AsCollection);"));
        assert!(fixed.contains("Assert.Pass($\"Passed: {42}\");"));
    }
}
