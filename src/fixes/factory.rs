//! Replacement expressions built by the fixes.
//!
//! Fixes assemble new code as a small expression tree and render it with [`std::fmt::Display`].
//! Leaves that come from the original source (arguments, statements) are carried as
//! [`Code::Raw`] text, so their formatting and comments survive unchanged.

use std::fmt;

/// A replacement expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Code {
    /// A simple name, e.g. `Is`
    Name(String),
    /// Source text used verbatim
    Raw(String),
    /// `target.name`
    Member(Box<Code>, String),
    /// `target(args)`; the argument list is already rendered, parentheses included
    Call(Box<Code>, String),
    /// `() => body` or `async () => body`
    Lambda {
        /// `async` modifier
        is_async: bool,
        /// The body as written
        body: Box<Code>,
    },
}

impl Code {
    /// A simple name
    #[must_use]
    pub fn name(name: impl Into<String>) -> Self {
        Code::Name(name.into())
    }

    /// Verbatim source text
    #[must_use]
    pub fn raw(text: impl Into<String>) -> Self {
        Code::Raw(text.into())
    }

    /// `Class.Member` from a dotted path
    #[must_use]
    pub fn path(path: &str) -> Self {
        let mut segments = path.split('.');
        let first = Code::name(segments.next().unwrap_or_default());
        segments.fold(first, Code::member)
    }

    /// `self.name`
    #[must_use]
    pub fn member(self, name: impl Into<String>) -> Self {
        Code::Member(Box::new(self), name.into())
    }

    /// `self(args)` with `args` separated by `, `
    #[must_use]
    pub fn call<I, S>(self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|a| a.as_ref().to_string()).collect();
        self.call_with(format!("({})", args.join(", ")))
    }

    /// `self` followed by an already rendered argument list
    #[must_use]
    pub fn call_with(self, list: impl Into<String>) -> Self {
        Code::Call(Box::new(self), list.into())
    }

    /// `() => self`
    #[must_use]
    pub fn into_lambda(self, is_async: bool) -> Self {
        Code::Lambda {
            is_async,
            body: Box::new(self),
        }
    }

    /// True if the outermost node is a member access with this name
    #[must_use]
    pub fn is_member(&self, name: &str) -> bool {
        matches!(self, Code::Member(_, member) if member == name)
    }

    /// The target of a member access, or the expression itself
    #[must_use]
    pub fn strip_member(self, name: &str) -> Self {
        match self {
            Code::Member(target, member) if member == name => *target,
            other => other,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name}"),
            Self::Raw(text) => write!(f, "{text}"),
            Self::Member(target, name) => write!(f, "{target}.{name}"),
            Self::Call(target, list) => write!(f, "{target}{list}"),
            Self::Lambda { is_async: true, body } => write!(f, "async () => {body}"),
            Self::Lambda { is_async: false, body } => write!(f, "() => {body}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_chain() {
        let code = Code::path("Is.Not")
            .member("EqualTo")
            .call(["expected"])
            .member("IgnoreCase");
        assert_eq!(code.to_string(), "Is.Not.EqualTo(expected).IgnoreCase");
        assert!(code.is_member("IgnoreCase"));
        assert_eq!(
            code.strip_member("IgnoreCase").to_string(),
            "Is.Not.EqualTo(expected)"
        );
    }

    #[test]
    fn test_lambda() {
        let body = Code::path("string.Format").call(["\"{0}\"", "x"]);
        assert_eq!(
            body.clone().into_lambda(false).to_string(),
            "() => string.Format(\"{0}\", x)"
        );
        assert_eq!(
            Code::raw("{ }").into_lambda(true).to_string(),
            "async () => { }"
        );
    }
}
