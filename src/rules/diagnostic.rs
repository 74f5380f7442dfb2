//! Reported findings and the metadata they carry for their fixes.

use std::collections::BTreeMap;

use crate::{
    host::syntax::Span,
    rules::descriptor::{DiagnosticDescriptor, Severity},
    Error, Result,
};

/// Keys of the properties bag
pub mod keys {
    /// Name of the invoked assertion method
    pub const METHOD_NAME: &str = "MethodName";
    /// The `params` argument was passed as one array value
    pub const PARAMS_ARGUMENT_IS_ARRAY: &str = "ParamsArgumentIsArray";
    /// The expected argument is `""` or `string.Empty`
    pub const IS_EMPTY_SENTINEL: &str = "IsEmptySentinel";
    /// The call passes a comparer
    pub const HAS_COMPARER: &str = "HasComparer";
    /// The call passes a tolerance
    pub const HAS_DELTA: &str = "HasDelta";
    /// Index of the message argument in the argument list
    pub const MESSAGE_ARGUMENT_INDEX: &str = "MessageArgumentIndex";
    /// `Assert.EnterMultipleScope()` is available
    pub const SUPPORTS_ENTER_MULTIPLE_SCOPE: &str = "SupportsEnterMultipleScope";
    /// Number of grouped statements
    pub const STATEMENT_COUNT: &str = "StatementCount";
    /// Name of the referenced member
    pub const MEMBER_NAME: &str = "MemberName";
}

/// String-keyed metadata a rule attaches for its fix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<&'static str, String>);

impl Properties {
    /// An empty bag
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `key` and return the bag
    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    /// Set `key`
    pub fn insert(&mut self, key: &'static str, value: impl ToString) {
        self.0.insert(key, value.to_string());
    }

    /// The value of `key`
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingProperty`] if the rule did not record `key`.
    pub fn get(&self, key: &'static str) -> Result<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .ok_or(Error::MissingProperty(key))
    }

    /// The value of `key` as a flag
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingProperty`] if the rule did not record `key`.
    pub fn flag(&self, key: &'static str) -> Result<bool> {
        Ok(self.get(key)? == "true")
    }

    /// The value of `key` as an index or count
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingProperty`] if `key` is absent or not a number.
    pub fn number(&self, key: &'static str) -> Result<usize> {
        self.get(key)?
            .parse()
            .map_err(|_| Error::MissingProperty(key))
    }

    /// True if `key` was recorded
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Iterate the entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// A finding at a location of one syntax tree
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// The describing rule
    pub descriptor: &'static DiagnosticDescriptor,
    /// Formatted message
    pub message: String,
    /// Effective severity
    pub severity: Severity,
    /// Index of the tree in its compilation
    pub tree: usize,
    /// Primary location
    pub span: Span,
    /// Further locations, e.g. every grouped statement
    pub additional_spans: Vec<Span>,
    /// Metadata for the paired fix
    pub properties: Properties,
}

impl Diagnostic {
    /// A diagnostic of `descriptor` with its message formatted from `args`
    #[must_use]
    pub fn new(
        descriptor: &'static DiagnosticDescriptor,
        tree: usize,
        span: Span,
        args: &[&str],
    ) -> Self {
        Diagnostic {
            descriptor,
            message: descriptor.format_message(args),
            severity: descriptor.default_severity,
            tree,
            span,
            additional_spans: Vec::new(),
            properties: Properties::new(),
        }
    }

    /// Attach the properties bag
    #[must_use]
    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// Attach further locations
    #[must_use]
    pub fn with_additional_spans(mut self, spans: Vec<Span>) -> Self {
        self.additional_spans = spans;
        self
    }

    /// The rule id
    #[must_use]
    pub fn id(&self) -> &'static str {
        self.descriptor.id
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]: {}", self.descriptor.id, self.severity, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties() {
        let properties = Properties::new()
            .with(keys::METHOD_NAME, "AreEqual")
            .with(keys::HAS_DELTA, true)
            .with(keys::STATEMENT_COUNT, 3);
        assert_eq!(properties.get(keys::METHOD_NAME).unwrap(), "AreEqual");
        assert!(properties.flag(keys::HAS_DELTA).unwrap());
        assert_eq!(properties.number(keys::STATEMENT_COUNT).unwrap(), 3);
        assert!(matches!(
            properties.get(keys::HAS_COMPARER),
            Err(Error::MissingProperty("HasComparer"))
        ));
    }
}
