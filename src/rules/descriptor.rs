//! Rule descriptors: identity, texts and default severity of every diagnostic.

use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Base of the documentation links
pub const DOCUMENTATION_BASE: &str =
    "https://github.com/nunit/nunit.analyzers/tree/master/documentation";

/// Severity of a reported diagnostic
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Display,
    AsRefStr,
    EnumString,
    EnumIter,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Severity {
    /// Not shown, fix still offered
    Hidden,
    /// Suggestion
    Info,
    /// Warning
    Warning,
    /// Error
    Error,
}

/// Rule category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Category {
    /// Test structure: sources, lifecycle
    Structure,
    /// Assertion usage
    Assertion,
}

/// The static description of one diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticDescriptor {
    /// Stable identifier, e.g. `NUnit2005`
    pub id: &'static str,
    /// Short title
    pub title: &'static str,
    /// Message with `{0}`-style placeholders
    pub message_format: &'static str,
    /// Category
    pub category: Category,
    /// Severity unless overridden by configuration
    pub default_severity: Severity,
    /// Longer description
    pub description: &'static str,
}

impl DiagnosticDescriptor {
    /// Documentation page of the rule
    #[must_use]
    pub fn help_link(&self) -> String {
        format!("{}/{}.md", DOCUMENTATION_BASE, self.id)
    }

    /// Substitute `args` into the message format. `{{` and `}}` produce literal braces;
    /// placeholders without a matching argument are kept as written.
    #[must_use]
    pub fn format_message(&self, args: &[&str]) -> String {
        let format = self.message_format;
        let mut out = String::with_capacity(format.len());
        let mut rest = format;
        while let Some(pos) = rest.find(['{', '}']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];
            if tail.starts_with("{{") || tail.starts_with("}}") {
                out.push_str(&tail[..1]);
                rest = &tail[2..];
                continue;
            }
            if tail.starts_with('{') {
                if let Some(end) = tail.find('}') {
                    let index = tail[1..end].parse::<usize>().ok();
                    if let Some(arg) = index.and_then(|i| args.get(i)) {
                        out.push_str(arg);
                    } else {
                        out.push_str(&tail[..=end]);
                    }
                    rest = &tail[end + 1..];
                    continue;
                }
            }
            out.push_str(&tail[..1]);
            rest = &tail[1..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    const SAMPLE: DiagnosticDescriptor = DiagnosticDescriptor {
        id: "NUnit9999",
        title: "Sample",
        message_format: "The {0} '{1}' uses {{braces}} and {7}",
        category: Category::Assertion,
        default_severity: Severity::Info,
        description: "",
    };

    #[test]
    fn test_format_message() {
        assert_eq!(
            SAMPLE.format_message(&["field", "stream"]),
            "The field 'stream' uses {braces} and {7}"
        );
    }

    #[test]
    fn test_help_link() {
        assert_eq!(
            SAMPLE.help_link(),
            "https://github.com/nunit/nunit.analyzers/tree/master/documentation/NUnit9999.md"
        );
    }

    #[test]
    fn test_severity_names() {
        assert_eq!(Severity::from_str("Warning").unwrap(), Severity::Warning);
        assert_eq!(Severity::Info.to_string(), "info");
        assert!(Severity::Error > Severity::Hidden);
    }
}
