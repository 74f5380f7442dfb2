//! Rewrite engine producing code fixes for reported diagnostics.
//!
//! A fix never re-runs the analysis. It reads what its paired rule recorded in the diagnostic's
//! [`crate::rules::Properties`], locates the reported node again through the diagnostic span and
//! renders a replacement for it. Replacements reuse the original source text of every node
//! they keep, so comments and formatting inside arguments survive.
//!
//! # Key Components
//!
//! - [`FixProvider`] - Fixes for one or more diagnostic ids
//! - [`CodeAction`] / [`TextEdit`] - A titled replacement of one span
//! - [`apply_edits`] - Applies non-overlapping edits to a source text
//! - [`recipe`] - Classic method to constraint tables
//! - [`interpolation`] - Format specification to interpolated string conversion
//! - [`arguments`] - Argument list reconstruction
//!
//! # Examples
//!
//! ```rust
//! use assertscope::fixes::{apply_edits, TextEdit};
//! use assertscope::host::syntax::Span;
//!
//! let text = "Assert.IsTrue(x);";
//! let edit = TextEdit::new(Span::new(0, 16), "Assert.That(x, Is.True)");
//! assert_eq!(apply_edits(text, &[edit]), "Assert.That(x, Is.True);");
//! ```

pub mod arguments;
mod classic;
pub mod factory;
mod format;
pub mod interpolation;
mod multiple;
pub mod recipe;
mod source;

pub use classic::ClassicAssertFix;
pub use format::FormatStringFix;
pub use multiple::MultipleAssertsFix;
pub use source::NameofFix;

use crate::{
    host::syntax::Span,
    query::{self, AssertInvocation, TreeContext},
    rules::Diagnostic,
    Result,
};

/// Replacement of the text at `span`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Replaced range
    pub span: Span,
    /// Replacement text
    pub new_text: String,
}

impl TextEdit {
    /// Replace `span` with `new_text`
    #[must_use]
    pub fn new(span: Span, new_text: impl Into<String>) -> Self {
        TextEdit {
            span,
            new_text: new_text.into(),
        }
    }
}

/// A proposed fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAction {
    /// Human readable title
    pub title: String,
    /// Groups equivalent actions of different diagnostics for fix-all
    pub equivalence_key: &'static str,
    /// The edit
    pub edit: TextEdit,
}

/// Produces code actions for diagnostics of the ids it declares
pub trait FixProvider: Send + Sync {
    /// Ids of the diagnostics this provider can fix
    fn fixable_ids(&self) -> Vec<&'static str>;

    /// The actions for `diagnostic`, reported in the tree of `cx`.
    ///
    /// An empty list means the site has a shape the fix does not handle.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingProperty`] or [`crate::Error::UnknownRecipe`] if the
    /// diagnostic does not carry what its rule is expected to record.
    fn actions(&self, cx: &TreeContext<'_>, diagnostic: &Diagnostic) -> Result<Vec<CodeAction>>;
}

/// A new instance of every fix provider
#[must_use]
pub fn all_fixes() -> Vec<Box<dyn FixProvider>> {
    vec![
        Box::new(ClassicAssertFix),
        Box::new(FormatStringFix),
        Box::new(NameofFix),
        Box::new(MultipleAssertsFix),
    ]
}

/// Apply `edits` to `text`.
///
/// Edits are accepted in the given order; an edit overlapping one accepted before it is
/// skipped. The accepted edits are applied from the end of the text backwards so that their
/// spans stay valid.
#[must_use]
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut accepted: Vec<&TextEdit> = Vec::with_capacity(edits.len());
    for edit in edits {
        let overlaps = accepted
            .iter()
            .any(|a| edit.span.start < a.span.end && a.span.start < edit.span.end);
        if overlaps || edit.span.end > text.len() || edit.span.start > edit.span.end {
            log::debug!("skipping edit at {} overlapping a previous edit", edit.span);
            continue;
        }
        accepted.push(edit);
    }
    accepted.sort_by_key(|edit| std::cmp::Reverse(edit.span.start));

    let mut out = text.to_string();
    for edit in accepted {
        out.replace_range(edit.span.start..edit.span.end, &edit.new_text);
    }
    out
}

/// The assertion call a diagnostic was reported on
///
/// # Errors
///
/// Returns [`crate::Error::Malformed`] if no resolved assertion call spans `span`.
pub(crate) fn assert_at<'c>(cx: &TreeContext<'c>, span: Span) -> Result<AssertInvocation<'c>> {
    query::invocations(cx.tree.root())
        .into_iter()
        .filter(|expr| expr.span == span)
        .find_map(|expr| query::assert_invocation(cx, expr))
        .ok_or_else(|| malformed_error!("no assertion call at {}", span))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_edits_right_to_left() {
        let text = "a(b, c);";
        let edits = [
            TextEdit::new(Span::new(2, 3), "first"),
            TextEdit::new(Span::new(5, 6), "second"),
        ];
        assert_eq!(apply_edits(text, &edits), "a(first, second);");
    }

    #[test]
    fn test_overlapping_edit_is_skipped() {
        let text = "Assert.IsTrue(x);";
        let edits = [
            TextEdit::new(Span::new(0, 16), "Assert.That(x, Is.True)"),
            TextEdit::new(Span::new(14, 15), "y"),
            TextEdit::new(Span::new(16, 17), ";;"),
        ];
        assert_eq!(apply_edits(text, &edits), "Assert.That(x, Is.True);;");
    }

    #[test]
    fn test_every_fixable_id_has_a_rule() {
        for fix in all_fixes() {
            for id in fix.fixable_ids() {
                assert!(crate::rules::descriptor(id).is_some(), "{id}");
            }
        }
    }
}
