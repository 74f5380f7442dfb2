//! Conversion of composite format strings into interpolated strings.
//!
//! The format string is read as written in the source, escapes included. Doubled braces are
//! literal braces in both notations and are copied unchanged; each `{index[,alignment][:format]}`
//! placeholder has its index replaced by the text of the matching argument.

use crate::{Error, Result};

/// One piece of a composite format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Literal text, escapes and doubled braces as written
    Text(&'a str),
    /// A placeholder
    Placeholder {
        /// Argument index
        index: usize,
        /// `,alignment` and `:format` clauses as written, empty if absent
        clauses: &'a str,
    },
}

/// Split the source text of a format string's content into segments
///
/// # Errors
///
/// Returns [`Error::InvalidFormatString`] for an unbalanced brace or a placeholder without an
/// index.
pub fn parse(format: &str) -> Result<Vec<Segment<'_>>> {
    let bytes = format.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => i += 2,
            b'{' => {
                if text_start < i {
                    segments.push(Segment::Text(&format[text_start..i]));
                }
                let close = format[i..]
                    .find('}')
                    .map(|offset| i + offset)
                    .ok_or_else(|| {
                        let message = format!("unterminated placeholder in '{format}'");
                        Error::InvalidFormatString(message)
                    })?;
                let inner = &format[i + 1..close];
                let digits = inner.bytes().take_while(u8::is_ascii_digit).count();
                let index = inner[..digits]
                    .parse()
                    .map_err(|_| {
                        Error::InvalidFormatString(format!("missing index in '{{{inner}}}'"))
                    })?;
                let clauses = inner[digits..].trim_start();
                if !(clauses.is_empty() || clauses.starts_with(',') || clauses.starts_with(':')) {
                    return Err(Error::InvalidFormatString(format!(
                        "invalid placeholder '{{{inner}}}'"
                    )));
                }
                segments.push(Segment::Placeholder { index, clauses });
                i = close + 1;
                text_start = i;
            }
            b'}' => {
                return Err(Error::InvalidFormatString(format!(
                    "unbalanced '}}' at {i} in '{format}'"
                )))
            }
            _ => i += 1,
        }
    }
    if text_start < bytes.len() {
        segments.push(Segment::Text(&format[text_start..]));
    }
    Ok(segments)
}

/// Build an interpolated string literal from the content of a format string literal.
///
/// `content` is the text between the quotes as written; `verbatim` selects the `@"..."`
/// notation. Each argument is inserted as given, so callers parenthesize conditional
/// expressions themselves.
///
/// # Errors
///
/// Returns [`Error::InvalidFormatString`] if the format string cannot be decoded or refers to a
/// missing argument.
pub fn interpolate(content: &str, verbatim: bool, args: &[String]) -> Result<String> {
    let mut out = String::with_capacity(content.len() + 3);
    out.push_str(if verbatim { "$@\"" } else { "$\"" });
    for segment in parse(content)? {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Placeholder { index, clauses } => {
                let arg = args.get(index).ok_or_else(|| {
                    Error::InvalidFormatString(format!(
                        "placeholder {index} has no argument, {} given",
                        args.len()
                    ))
                })?;
                out.push('{');
                out.push_str(arg);
                out.push_str(clauses);
                out.push('}');
            }
        }
    }
    out.push('"');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_simple_placeholder() {
        assert_eq!(
            interpolate("Passed: {0}", false, &args(&["42"])).unwrap(),
            "$\"Passed: {42}\""
        );
    }

    #[test]
    fn test_escaped_braces() {
        assert_eq!(
            interpolate("{{{0}}}", false, &args(&["42"])).unwrap(),
            "$\"{{{42}}}\""
        );
        assert_eq!(
            parse("{{{0}}}").unwrap(),
            vec![
                Segment::Text("{{"),
                Segment::Placeholder { index: 0, clauses: "" },
                Segment::Text("}}"),
            ]
        );
    }

    #[test]
    fn test_alignment_format_and_reuse() {
        assert_eq!(
            interpolate("{1,-5:N2} of {0} and {1}", false, &args(&["total", "x"])).unwrap(),
            "$\"{x,-5:N2} of {total} and {x}\""
        );
        assert_eq!(
            interpolate("path \\\"{0}\\\"", false, &args(&["p"])).unwrap(),
            "$\"path \\\"{p}\\\"\""
        );
        assert_eq!(
            interpolate("\"\"{0}\"\"", true, &args(&["p"])).unwrap(),
            "$@\"\"\"{p}\"\"\""
        );
    }

    #[test]
    fn test_invalid_formats() {
        assert!(matches!(
            interpolate("{2}", false, &args(&["a"])),
            Err(Error::InvalidFormatString(_))
        ));
        assert!(parse("{0").is_err());
        assert!(parse("a } b").is_err());
        assert!(parse("{x}").is_err());
    }
}
