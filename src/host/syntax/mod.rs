//! Full-fidelity syntax trees for the supported C# subset.
//!
//! A [`SyntaxTree`] owns the source text, the token stream (with trivia) and the parsed
//! [`CompilationUnit`]. Nodes refer back to the text through [`Span`]s, so any node can be
//! rendered exactly as written, with or without the trivia around it.
//!
//! # Key Components
//!
//! - [`token`] - Tokens, trivia and spans
//! - [`lexer`] - Tokenizer
//! - [`ast`] - Node types
//! - [`parser`] - Recursive-descent parser
//! - [`visit`] - Read-only traversal helpers
//!
//! # Examples
//!
//! ```rust
//! use assertscope::host::syntax::SyntaxTree;
//!
//! let tree = SyntaxTree::parse("Test.cs", "class C { int x = 1; }")?;
//! assert_eq!(tree.root().types()[0].name.text, "C");
//! # Ok::<(), assertscope::Error>(())
//! ```

pub mod ast;
pub mod lexer;
pub mod parser;
pub mod token;
pub mod visit;

use crate::Result;

pub use ast::*;
pub use token::{Span, Token, TokenKind};

/// A parsed source file
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    path: String,
    text: String,
    tokens: Vec<Token>,
    root: CompilationUnit,
}

impl SyntaxTree {
    /// Parse `text`, recording `path` for diagnostics
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Syntax`] if the text is outside the supported subset.
    pub fn parse(path: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let text = text.into();
        let tokens = lexer::tokenize(&text)?;
        let root = parser::parse_tokens(&text, &tokens)?;
        log::debug!("parsed {} ({} tokens)", path, tokens.len());
        Ok(SyntaxTree {
            path,
            text,
            tokens,
            root,
        })
    }

    /// The file path given at parse time
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The complete source text
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The token stream; the last token is always the end-of-file token
    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// The root node
    #[must_use]
    pub fn root(&self) -> &CompilationUnit {
        &self.root
    }

    /// The source text of `span`, without outer trivia
    #[must_use]
    pub fn text_of(&self, span: Span) -> &str {
        self.text.get(span.start..span.end).unwrap_or_default()
    }

    /// The token whose text starts at `offset`
    #[must_use]
    pub fn token_starting_at(&self, offset: usize) -> Option<&Token> {
        self.tokens
            .binary_search_by_key(&offset, |t| t.span.start)
            .ok()
            .map(|i| &self.tokens[i])
    }

    /// The token whose text ends at `offset`
    #[must_use]
    pub fn token_ending_at(&self, offset: usize) -> Option<&Token> {
        let real = &self.tokens[..self.tokens.len().saturating_sub(1)];
        real.binary_search_by_key(&offset, |t| t.span.end)
            .ok()
            .map(|i| &real[i])
    }

    /// Index of the token whose text starts at `offset`
    #[must_use]
    pub fn token_index_at(&self, offset: usize) -> Option<usize> {
        self.tokens
            .binary_search_by_key(&offset, |t| t.span.start)
            .ok()
    }

    /// Trivia in front of the node covering `span`
    #[must_use]
    pub fn leading_trivia(&self, span: Span) -> &str {
        self.token_starting_at(span.start)
            .map(|t| t.leading.as_str())
            .unwrap_or_default()
    }

    /// Trivia after the node covering `span`, up to and including the end of its line
    #[must_use]
    pub fn trailing_trivia(&self, span: Span) -> &str {
        self.token_ending_at(span.end)
            .map(|t| t.trailing.as_str())
            .unwrap_or_default()
    }

    /// `span` widened by its leading and trailing trivia
    #[must_use]
    pub fn full_span(&self, span: Span) -> Span {
        Span::new(
            span.start - self.leading_trivia(span).len(),
            span.end + self.trailing_trivia(span).len(),
        )
    }

    /// Source text of `span` including outer trivia
    #[must_use]
    pub fn full_text(&self, span: Span) -> &str {
        self.text_of(self.full_span(span))
    }

    /// `replacement` wrapped in the outer trivia of the node at `span`
    #[must_use]
    pub fn with_trivia_from(&self, span: Span, replacement: &str) -> String {
        let mut out = String::with_capacity(replacement.len() + 8);
        out.push_str(self.leading_trivia(span));
        out.push_str(replacement);
        out.push_str(self.trailing_trivia(span));
        out
    }

    /// 1-based line and column of a byte offset
    #[must_use]
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        lexer::line_column(&self.text, offset)
    }

    /// Leading whitespace of the line containing `offset`
    #[must_use]
    pub fn line_indent(&self, offset: usize) -> &str {
        let offset = offset.min(self.text.len());
        let line_start = self.text[..offset].rfind('\n').map_or(0, |p| p + 1);
        let rest = &self.text[line_start..];
        let width = rest
            .char_indices()
            .find(|(_, c)| *c != ' ' && *c != '\t')
            .map_or(rest.len(), |(i, _)| i);
        &rest[..width]
    }

    /// The line ending used by the file
    #[must_use]
    pub fn newline(&self) -> &'static str {
        if self.text.contains("\r\n") {
            "\r\n"
        } else {
            "\n"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trivia_queries() {
        let source = "class C {\n    int x = Call( a, // first\n        b);\n}\n";
        let tree = SyntaxTree::parse("t.cs", source).unwrap();
        let ty = tree.root().types()[0];
        let MemberDecl::Field(field) = &ty.members[0] else {
            panic!("expected field");
        };
        let init = field.declarators[0].init.as_ref().unwrap();
        assert_eq!(tree.text_of(init.span), "Call( a, // first\n        b)");

        let ExprKind::Invocation { args, .. } = &init.kind else {
            panic!("expected invocation");
        };
        assert_eq!(tree.leading_trivia(args.args[0].span), "");
        assert_eq!(tree.trailing_trivia(args.separators[0]), " // first\n");
        assert_eq!(tree.leading_trivia(args.args[1].span), "        ");
        assert_eq!(tree.line_indent(field.span.start), "    ");
        assert_eq!(tree.with_trivia_from(args.args[1].span, "c"), "        c");
    }
}
