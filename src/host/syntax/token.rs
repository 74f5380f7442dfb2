//! Tokens, trivia and source spans.

use std::fmt;

/// A half-open byte range `[start, end)` into a source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Span {
    /// First byte of the range
    pub start: usize,
    /// One past the last byte of the range
    pub end: usize,
}

impl Span {
    /// Create a new span
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Length of the span in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// True if the span covers no bytes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if `other` lies completely inside this span
    #[must_use]
    pub fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// The smallest span covering both `self` and `other`
    #[must_use]
    pub fn cover(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Lexical category of a [`Token`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Identifier, including contextual keywords such as `var` or `nameof`
    Identifier,
    /// Reserved keyword
    Keyword,
    /// Integer literal, with optional `u`/`l` suffix
    IntLiteral,
    /// Real literal, with optional `f`/`d`/`m` suffix
    RealLiteral,
    /// Regular or verbatim string literal
    StringLiteral,
    /// Interpolated string literal (`$"..."`), kept as a single token
    InterpolatedString,
    /// Character literal
    CharLiteral,
    /// Operator or punctuation
    Punct,
    /// End of input; carries the trailing trivia of the file as leading trivia
    EndOfFile,
}

/// A token together with the trivia surrounding it.
///
/// Trivia (whitespace, newlines and comments) is kept verbatim. The trailing trivia of a
/// token extends up to and including the first end-of-line; anything after that belongs to
/// the leading trivia of the next token. Concatenating `leading + text + trailing` over all
/// tokens of a file reproduces the file byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lexical category
    pub kind: TokenKind,
    /// The token text without trivia
    pub text: String,
    /// Position of `text` in the source; empty for synthesized tokens
    pub span: Span,
    /// Trivia preceding the token
    pub leading: String,
    /// Trivia following the token on the same line, including the line break
    pub trailing: String,
}

impl Token {
    /// Create a synthesized token without trivia
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Token {
            kind,
            text: text.into(),
            span: Span::default(),
            leading: String::new(),
            trailing: String::new(),
        }
    }

    /// Create a synthesized punctuation token
    pub fn punct(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Punct, text)
    }

    /// Create a synthesized identifier token
    pub fn ident(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Identifier, text)
    }

    /// Create a synthesized keyword token
    pub fn keyword(text: impl Into<String>) -> Self {
        Token::new(TokenKind::Keyword, text)
    }

    /// True if this is a punctuation, keyword or identifier token with exactly this text
    #[must_use]
    pub fn is(&self, text: &str) -> bool {
        matches!(
            self.kind,
            TokenKind::Punct | TokenKind::Keyword | TokenKind::Identifier
        ) && self.text == text
    }

    /// Replace the leading trivia
    #[must_use]
    pub fn with_leading(mut self, leading: impl Into<String>) -> Self {
        self.leading = leading.into();
        self
    }

    /// Replace the trailing trivia
    #[must_use]
    pub fn with_trailing(mut self, trailing: impl Into<String>) -> Self {
        self.trailing = trailing.into();
        self
    }

    /// The span including leading and trailing trivia
    #[must_use]
    pub fn full_span(&self) -> Span {
        Span::new(
            self.span.start.saturating_sub(self.leading.len()),
            self.span.end + self.trailing.len(),
        )
    }

    /// True if the trailing trivia ends a line
    #[must_use]
    pub fn ends_line(&self) -> bool {
        self.trailing.ends_with('\n')
    }

    /// Append the token with its trivia to `out`
    pub fn write_to(&self, out: &mut String) {
        out.push_str(&self.leading);
        out.push_str(&self.text);
        out.push_str(&self.trailing);
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Reserved words of the supported language subset.
///
/// Contextual keywords (`var`, `async`, `nameof`, `get`, `set`, `when`, `not`, ...) are
/// lexed as identifiers and recognized by the parser where they matter.
pub const KEYWORDS: &[&str] = &[
    "abstract", "as", "await", "base", "bool", "break", "byte", "case", "catch", "char",
    "class", "const", "continue", "decimal", "default", "delegate", "do", "double", "else",
    "enum", "event", "explicit", "extern", "false", "finally", "float", "for", "foreach",
    "if", "implicit", "in", "int", "interface", "internal", "is", "long", "namespace", "new",
    "null", "object", "operator", "out", "override", "params", "private", "protected",
    "public", "readonly", "ref", "return", "sbyte", "sealed", "short", "static", "string",
    "struct", "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong", "ushort",
    "using", "virtual", "void", "volatile", "while",
];

/// Keywords naming a predefined type
pub const PREDEFINED_TYPES: &[&str] = &[
    "bool", "byte", "char", "decimal", "double", "float", "int", "long", "object", "sbyte",
    "short", "string", "uint", "ulong", "ushort", "void",
];

/// True if `text` is a reserved keyword
#[must_use]
pub fn is_keyword(text: &str) -> bool {
    KEYWORDS.contains(&text)
}

/// True if `text` names a predefined type
#[must_use]
pub fn is_predefined_type(text: &str) -> bool {
    PREDEFINED_TYPES.contains(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_cover_and_contains() {
        let a = Span::new(4, 10);
        let b = Span::new(8, 20);
        assert_eq!(a.cover(b), Span::new(4, 20));
        assert!(a.cover(b).contains(a));
        assert!(!a.contains(b));
        assert_eq!(a.len(), 6);
    }

    #[test]
    fn test_token_full_span() {
        let mut token = Token::ident("value").with_leading("  ").with_trailing(" \n");
        token.span = Span::new(10, 15);
        assert_eq!(token.full_span(), Span::new(8, 17));
        assert!(token.ends_line());

        let mut out = String::new();
        token.write_to(&mut out);
        assert_eq!(out, "  value \n");
    }
}
