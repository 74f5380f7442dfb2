//! One logical unit of a constraint expression.

use crate::{
    host::{
        semantic::{CallInfo, Symbol},
        syntax::{ArgumentList, Expr, Ident, Span},
        types::Ty,
    },
    query::{self, names, TreeContext},
};

/// One member access or method call of a fluent chain
#[derive(Debug, Clone, Copy)]
pub struct ChainLink<'c> {
    /// The node completing this link: a member access, or the invocation of a method
    pub expr: &'c Expr,
    /// Accessed member name
    pub name: &'c Ident,
    /// Arguments of a method call
    pub args: Option<&'c ArgumentList>,
    /// Type produced by the link
    pub ty: &'c Ty,
    /// Resolved call of a method link
    pub call: Option<&'c CallInfo>,
    /// Resolved symbol of a property link
    pub symbol: Option<&'c Symbol>,
}

impl ChainLink<'_> {
    /// True if the member is named `name`
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.name.is(name)
    }

    /// True for method calls
    #[must_use]
    pub fn is_invocation(&self) -> bool {
        self.args.is_some()
    }

    /// True if the binder could not resolve the link
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        self.call.is_none() && self.symbol.is_none() && self.ty.is_error()
    }
}

/// The expected-value argument of a constraint method with its resolved call
#[derive(Debug, Clone, Copy)]
pub struct ExpectedArgument<'c> {
    /// The argument expression
    pub expr: &'c Expr,
    /// The method taking it
    pub call: &'c CallInfo,
    /// The link of the method
    pub link: ChainLink<'c>,
}

/// One logical constraint of a constraint expression: an optional helper class, prefixes, the
/// constraint-producing root and suffixes.
///
/// In `Has.Some.EqualTo("A").IgnoreCase` the helper class is `Has`, `Some` is a prefix,
/// `EqualTo` is the root and `IgnoreCase` a suffix.
#[derive(Debug, Clone)]
pub struct ConstraintExpressionPart<'c> {
    pub(crate) helper_class: Option<Ty>,
    pub(crate) links: Vec<ChainLink<'c>>,
    pub(crate) root: Option<usize>,
    pub(crate) span: Span,
    pub(crate) unknown: bool,
}

impl<'c> ConstraintExpressionPart<'c> {
    pub(crate) fn new(
        cx: &TreeContext<'c>,
        helper_class: Option<Ty>,
        links: Vec<ChainLink<'c>>,
        start: usize,
        end: usize,
        unknown_base: bool,
    ) -> Self {
        let root = links.iter().position(|l| query::is_constraint(cx.registry, l.ty));
        let unknown = unknown_base || links.iter().any(ChainLink::is_unresolved);
        ConstraintExpressionPart {
            helper_class,
            links,
            root,
            span: Span::new(start, end),
            unknown,
        }
    }

    /// The static class the chain starts from; only the first part of an expression has one
    #[must_use]
    pub fn helper_class(&self) -> Option<&Ty> {
        self.helper_class.as_ref()
    }

    /// The first link producing a constraint
    #[must_use]
    pub fn root(&self) -> Option<&ChainLink<'c>> {
        self.root.map(|i| &self.links[i])
    }

    /// Links before the root; all links if there is no root
    #[must_use]
    pub fn prefixes(&self) -> &[ChainLink<'c>] {
        match self.root {
            Some(i) => &self.links[..i],
            None => &self.links,
        }
    }

    /// Links after the root
    #[must_use]
    pub fn suffixes(&self) -> &[ChainLink<'c>] {
        match self.root {
            Some(i) => &self.links[i + 1..],
            None => &[],
        }
    }

    /// All links in source order
    #[must_use]
    pub fn links(&self) -> &[ChainLink<'c>] {
        &self.links
    }

    /// The prefix named `name`
    #[must_use]
    pub fn prefix(&self, name: &str) -> Option<&ChainLink<'c>> {
        self.prefixes().iter().find(|l| l.is(name))
    }

    /// The suffix named `name`
    #[must_use]
    pub fn suffix(&self, name: &str) -> Option<&ChainLink<'c>> {
        self.suffixes().iter().find(|l| l.is(name))
    }

    /// True if a prefix is named `name`
    #[must_use]
    pub fn has_prefix(&self, name: &str) -> bool {
        self.prefix(name).is_some()
    }

    /// True if a suffix is named `name`
    #[must_use]
    pub fn has_suffix(&self, name: &str) -> bool {
        self.suffix(name).is_some()
    }

    /// Name of the root member
    #[must_use]
    pub fn root_name(&self) -> Option<&str> {
        self.root().map(|l| l.name.text.as_str())
    }

    /// Location of the part's text
    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    /// The part as written in source
    #[must_use]
    pub fn text(&self, cx: &TreeContext<'c>) -> &'c str {
        cx.text(self.span)
    }

    /// True if the chain starts from something that cannot be classified statically: a
    /// conditional, a variable or an unresolved name
    #[must_use]
    pub fn has_unknown_expressions(&self) -> bool {
        self.unknown
    }

    /// The argument of the single-argument method taking the expected value.
    ///
    /// The root and the suffixes are searched first; prefixes only when the root itself is not
    /// a method call.
    #[must_use]
    pub fn expected_argument(&self) -> Option<ExpectedArgument<'c>> {
        let root_is_call = self.root().is_some_and(ChainLink::is_invocation);
        let candidates = self
            .root()
            .into_iter()
            .chain(self.suffixes())
            .chain(if root_is_call { &[][..] } else { self.prefixes() });
        candidates.copied().find_map(|link| {
            let args = link.args?;
            let call = link.call?;
            if args.args.len() != 1 {
                return None;
            }
            let param = call.arg_params.first().copied().flatten()?;
            if call.param_names.get(param).map(String::as_str) != Some(names::EXPECTED_PARAMETER) {
                return None;
            }
            Some(ExpectedArgument {
                expr: &args.args[0].expr,
                call,
                link,
            })
        })
    }
}
