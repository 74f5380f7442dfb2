//! Tokenizer for the supported C# subset.
//!
//! The lexer produces a flat token vector where every byte of the input is owned either by a
//! token's text or by one of its trivia strings. The final token is always
//! [`TokenKind::EndOfFile`].

use crate::{
    host::syntax::token::{is_keyword, Span, Token, TokenKind},
    Error, Result,
};

/// Multi-character punctuators, longest first. There is no `>>`: nested
/// generic argument lists close one `>` at a time.
const PUNCTUATORS: &[&str] = &[
    "??=", "<<=", "?.", "??", "=>", "==", "!=", "<=", ">=", "&&", "||", "++", "--", "+=",
    "-=", "*=", "/=", "%=", "&=", "|=", "^=", "::", "<<", "{", "}", "(", ")", "[", "]", ".",
    ",", ";", ":", "?", "=", "<", ">", "!", "~", "+", "-", "*", "/", "%", "&", "|", "^", "@",
];

/// Compute the 1-based line and column of a byte offset
#[must_use]
pub fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = &text[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(pos) => before[pos + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

/// Split `text` into tokens.
///
/// # Errors
///
/// Returns [`Error::Syntax`] for unterminated literals or comments and for characters that
/// cannot start a token.
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    Lexer::new(text).run()
}

struct Lexer<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Lexer {
            text,
            bytes: text.as_bytes(),
            pos: 0,
        }
    }

    fn error(&self, offset: usize, message: impl Into<String>) -> Error {
        let (line, column) = line_column(self.text, offset);
        Error::Syntax {
            message: message.into(),
            line,
            column,
        }
    }

    fn peek(&self, ahead: usize) -> u8 {
        self.bytes.get(self.pos + ahead).copied().unwrap_or(0)
    }

    fn run(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let leading_start = self.pos;
            self.skip_trivia(false)?;
            let leading = self.text[leading_start..self.pos].to_string();

            if self.pos >= self.bytes.len() {
                let mut eof = Token::new(TokenKind::EndOfFile, "");
                eof.span = Span::new(self.pos, self.pos);
                eof.leading = leading;
                tokens.push(eof);
                return Ok(tokens);
            }

            let start = self.pos;
            let kind = self.scan_token()?;
            let span = Span::new(start, self.pos);

            let trailing_start = self.pos;
            self.skip_trivia(true)?;
            let trailing = self.text[trailing_start..self.pos].to_string();

            tokens.push(Token {
                kind,
                text: self.text[span.start..span.end].to_string(),
                span,
                leading,
                trailing,
            });
        }
    }

    /// Consume whitespace and comments. In trailing mode, stop after the first line break.
    fn skip_trivia(&mut self, trailing: bool) -> Result<()> {
        while self.pos < self.bytes.len() {
            match self.peek(0) {
                b' ' | b'\t' | 0x0c => self.pos += 1,
                b'\r' if self.peek(1) == b'\n' => {
                    self.pos += 2;
                    if trailing {
                        return Ok(());
                    }
                }
                b'\n' | b'\r' => {
                    self.pos += 1;
                    if trailing {
                        return Ok(());
                    }
                }
                b'/' if self.peek(1) == b'/' => {
                    while self.pos < self.bytes.len() && !matches!(self.peek(0), b'\n' | b'\r') {
                        self.pos += 1;
                    }
                }
                b'/' if self.peek(1) == b'*' => {
                    let start = self.pos;
                    match self.text[self.pos + 2..].find("*/") {
                        Some(end) => self.pos += end + 4,
                        None => return Err(self.error(start, "unterminated block comment")),
                    }
                }
                // Preprocessor lines (#region, #nullable, ...) are kept as leading trivia
                b'#' if !trailing && self.at_line_start() => {
                    while self.pos < self.bytes.len() && !matches!(self.peek(0), b'\n' | b'\r') {
                        self.pos += 1;
                    }
                }
                _ => return Ok(()),
            }
        }
        Ok(())
    }

    fn at_line_start(&self) -> bool {
        self.text[..self.pos]
            .chars()
            .rev()
            .take_while(|c| *c != '\n')
            .all(|c| c == ' ' || c == '\t')
    }

    fn scan_token(&mut self) -> Result<TokenKind> {
        let c = self.peek(0);
        match c {
            b'"' => {
                self.scan_regular_string()?;
                Ok(TokenKind::StringLiteral)
            }
            b'@' if self.peek(1) == b'"' => {
                self.pos += 1;
                self.scan_verbatim_string()?;
                Ok(TokenKind::StringLiteral)
            }
            b'$' => {
                self.scan_interpolated_string()?;
                Ok(TokenKind::InterpolatedString)
            }
            b'@' if self.peek(1) == b'$' => {
                self.scan_interpolated_string()?;
                Ok(TokenKind::InterpolatedString)
            }
            b'\'' => {
                self.scan_char()?;
                Ok(TokenKind::CharLiteral)
            }
            b'0'..=b'9' => Ok(self.scan_number()),
            b'.' if self.peek(1).is_ascii_digit() => Ok(self.scan_number()),
            b'@' if is_ident_start(self.char_at(self.pos + 1)) => {
                self.pos += 1;
                self.scan_identifier_tail();
                Ok(TokenKind::Identifier)
            }
            _ if is_ident_start(self.char_at(self.pos)) => {
                let start = self.pos;
                self.scan_identifier_tail();
                if is_keyword(&self.text[start..self.pos]) {
                    Ok(TokenKind::Keyword)
                } else {
                    Ok(TokenKind::Identifier)
                }
            }
            _ => {
                let rest = &self.text[self.pos..];
                for punct in PUNCTUATORS {
                    if rest.starts_with(punct) {
                        self.pos += punct.len();
                        return Ok(TokenKind::Punct);
                    }
                }
                let message = format!("unexpected character '{}'", self.char_at(self.pos));
                Err(self.error(self.pos, message))
            }
        }
    }

    fn char_at(&self, offset: usize) -> char {
        self.text[offset.min(self.text.len())..]
            .chars()
            .next()
            .unwrap_or('\0')
    }

    fn scan_identifier_tail(&mut self) {
        while self.pos < self.bytes.len() {
            let c = self.char_at(self.pos);
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut kind = TokenKind::IntLiteral;
        if self.peek(0) == b'0' && matches!(self.peek(1), b'x' | b'X') {
            self.pos += 2;
            while self.peek(0).is_ascii_hexdigit() || self.peek(0) == b'_' {
                self.pos += 1;
            }
        } else {
            while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
                self.pos += 1;
            }
            if self.peek(0) == b'.' && self.peek(1).is_ascii_digit() {
                kind = TokenKind::RealLiteral;
                self.pos += 1;
                while self.peek(0).is_ascii_digit() || self.peek(0) == b'_' {
                    self.pos += 1;
                }
            }
            if matches!(self.peek(0), b'e' | b'E')
                && (self.peek(1).is_ascii_digit()
                    || (matches!(self.peek(1), b'+' | b'-') && self.peek(2).is_ascii_digit()))
            {
                kind = TokenKind::RealLiteral;
                self.pos += 2;
                while self.peek(0).is_ascii_digit() {
                    self.pos += 1;
                }
            }
        }
        match self.peek(0) {
            b'f' | b'F' | b'd' | b'D' | b'm' | b'M' => {
                self.pos += 1;
                kind = TokenKind::RealLiteral;
            }
            b'u' | b'U' | b'l' | b'L' => {
                while matches!(self.peek(0), b'u' | b'U' | b'l' | b'L') {
                    self.pos += 1;
                }
            }
            _ => {}
        }
        kind
    }

    fn scan_regular_string(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                b'\\' => self.pos += 2,
                b'"' => {
                    self.pos += 1;
                    return Ok(());
                }
                0 | b'\n' if self.pos >= self.bytes.len() || self.peek(0) == b'\n' => {
                    return Err(self.error(start, "unterminated string literal"))
                }
                _ => self.pos += 1,
            }
        }
    }

    fn scan_verbatim_string(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        loop {
            if self.pos >= self.bytes.len() {
                return Err(self.error(start, "unterminated verbatim string literal"));
            }
            if self.peek(0) == b'"' {
                if self.peek(1) == b'"' {
                    self.pos += 2;
                    continue;
                }
                self.pos += 1;
                return Ok(());
            }
            self.pos += 1;
        }
    }

    fn scan_interpolated_string(&mut self) -> Result<()> {
        let start = self.pos;
        let mut verbatim = false;
        while matches!(self.peek(0), b'$' | b'@') {
            verbatim |= self.peek(0) == b'@';
            self.pos += 1;
        }
        if self.peek(0) != b'"' {
            return Err(self.error(start, "expected '\"' after interpolated string prefix"));
        }
        self.pos += 1;
        let mut depth = 0usize;
        loop {
            if self.pos >= self.bytes.len() {
                return Err(self.error(start, "unterminated interpolated string"));
            }
            let c = self.peek(0);
            if depth == 0 {
                match c {
                    b'\\' if !verbatim => self.pos += 2,
                    b'"' if verbatim && self.peek(1) == b'"' => self.pos += 2,
                    b'"' => {
                        self.pos += 1;
                        return Ok(());
                    }
                    b'{' if self.peek(1) == b'{' => self.pos += 2,
                    b'}' if self.peek(1) == b'}' => self.pos += 2,
                    b'{' => {
                        depth = 1;
                        self.pos += 1;
                    }
                    b'\n' if !verbatim => {
                        return Err(self.error(start, "unterminated interpolated string"))
                    }
                    _ => self.pos += 1,
                }
            } else {
                match c {
                    b'{' => {
                        depth += 1;
                        self.pos += 1;
                    }
                    b'}' => {
                        depth -= 1;
                        self.pos += 1;
                    }
                    b'"' => self.scan_regular_string()?,
                    b'\'' => self.scan_char()?,
                    _ => self.pos += 1,
                }
            }
        }
    }

    fn scan_char(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        loop {
            match self.peek(0) {
                b'\\' => self.pos += 2,
                b'\'' => {
                    self.pos += 1;
                    return Ok(());
                }
                0 | b'\n' => return Err(self.error(start, "unterminated character literal")),
                _ => self.pos += self.char_at(self.pos).len_utf8(),
            }
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_tokenize_roundtrips_source() {
        let source = "// header\nclass A { int x = 1; /* c */ }\n";
        let tokens = tokenize(source).unwrap();
        let mut out = String::new();
        for token in &tokens {
            token.write_to(&mut out);
        }
        assert_eq!(out, source);
    }

    #[test]
    fn test_trailing_trivia_stops_at_line_break() {
        let tokens = tokenize("a, // note\n    b").unwrap();
        assert_eq!(texts(&tokens), vec!["a", ",", "b", ""]);
        assert_eq!(tokens[1].trailing, " // note\n");
        assert_eq!(tokens[2].leading, "    ");
    }

    #[test]
    fn test_literals() {
        let tokens = tokenize(r#"42 1.5 2L 3.0f "a\"b" @"c""d" $"x {y} {{z}}" 'q'"#).unwrap();
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral,
                TokenKind::RealLiteral,
                TokenKind::IntLiteral,
                TokenKind::RealLiteral,
                TokenKind::StringLiteral,
                TokenKind::StringLiteral,
                TokenKind::InterpolatedString,
                TokenKind::CharLiteral,
                TokenKind::EndOfFile,
            ]
        );
    }

    #[test]
    fn test_nested_generics_do_not_lex_shift() {
        let tokens = tokenize("List<List<int>> x").unwrap();
        assert_eq!(
            texts(&tokens),
            vec!["List", "<", "List", "<", "int", ">", ">", "x", ""]
        );
    }

    #[test]
    fn test_conditional_access_and_keywords() {
        let tokens = tokenize("x?.Dispose(); await y;").unwrap();
        assert_eq!(tokens[1].text, "?.");
        assert_eq!(tokens[6].kind, TokenKind::Keyword);
    }

    #[test]
    fn test_unterminated_string_is_error() {
        let err = tokenize("var s = \"abc\n;").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 1, column: 9, .. }));
    }
}
