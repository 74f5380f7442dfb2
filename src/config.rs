//! Analyzer configuration.
//!
//! Options come from a host-supplied key/value lookup, either any [`OptionsProvider`] or the
//! text of an `.editorconfig`-style file. Only a handful of keys are understood:
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `dotnet_diagnostic.NUnit1032.additional_dispose_methods` | extra dispose-like method names |
//! | `dotnet_diagnostic.<ID>.severity` | severity override, `none`/`silent` disables the rule |
//! | `assertscope.framework_version` | version of the analysed test framework |
//!
//! # Examples
//!
//! ```rust
//! use assertscope::config::AnalyzerConfig;
//! use assertscope::rules::Severity;
//!
//! let config = AnalyzerConfig::from_editorconfig(
//!     "[*.cs]\n\
//!      dotnet_diagnostic.NUnit1032.additional_dispose_methods = Release; Shutdown\n\
//!      dotnet_diagnostic.NUnit2005.severity = error\n",
//! );
//! assert!(config.is_dispose_method("Shutdown"));
//! assert_eq!(config.severity_for("NUnit2005", Severity::Info), Some(Severity::Error));
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    path::Path,
};

use rustc_hash::FxHashMap;

use crate::{rules::Severity, Error, Result};

/// Key listing additional dispose-like method names
pub const ADDITIONAL_DISPOSE_METHODS: &str =
    "dotnet_diagnostic.NUnit1032.additional_dispose_methods";

/// Key holding the analysed framework version
pub const FRAMEWORK_VERSION: &str = "assertscope.framework_version";

const DIAGNOSTIC_PREFIX: &str = "dotnet_diagnostic.";
const SEVERITY_SUFFIX: &str = ".severity";

/// A key/value option lookup supplied by the host
pub trait OptionsProvider {
    /// The raw value of `key`, if set
    fn get(&self, key: &str) -> Option<&str>;

    /// All keys known to the provider
    fn keys(&self) -> Vec<&str>;
}

impl OptionsProvider for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        HashMap::keys(self).map(String::as_str).collect()
    }
}

impl OptionsProvider for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        BTreeMap::get(self, key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        BTreeMap::keys(self).map(String::as_str).collect()
    }
}

/// Version of the analysed test framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameworkVersion {
    /// Major version
    pub major: u32,
    /// Minor version
    pub minor: u32,
    /// Patch version, 0 if not given
    pub patch: u32,
}

impl FrameworkVersion {
    /// The first version offering `Assert.EnterMultipleScope()`
    pub const ENTER_MULTIPLE_SCOPE: FrameworkVersion = FrameworkVersion {
        major: 4,
        minor: 2,
        patch: 0,
    };

    /// Create a version
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        FrameworkVersion {
            major,
            minor,
            patch,
        }
    }

    /// Parse `major.minor[.patch]`, ignoring any pre-release suffix
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a component is missing or not a number.
    pub fn parse(text: &str) -> Result<Self> {
        let core = text.trim().split(['-', '+']).next().unwrap_or_default();
        let mut parts = core.split('.');
        let mut next = |required: bool| -> Result<u32> {
            match parts.next() {
                Some(part) => part
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid framework version '{}'", text))),
                None if required => Err(Error::Config(format!(
                    "invalid framework version '{}'",
                    text
                ))),
                None => Ok(0),
            }
        };
        let major = next(true)?;
        let minor = next(true)?;
        let patch = next(false)?;
        Ok(FrameworkVersion::new(major, minor, patch))
    }

    /// True if the version supports `Assert.EnterMultipleScope()`
    #[must_use]
    pub fn supports_enter_multiple_scope(&self) -> bool {
        *self >= Self::ENTER_MULTIPLE_SCOPE
    }
}

/// Options controlling which rules run and how they behave.
///
/// The default configuration runs every rule with its default severity, treats only the
/// standard `Dispose`/`DisposeAsync`/`Close`/`CloseAsync` methods as disposal and assumes an
/// NUnit 4 framework without `Assert.EnterMultipleScope()`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalyzerConfig {
    /// Extra method names that count as disposal for NUnit1032
    pub additional_dispose_methods: Vec<String>,

    /// Severity overrides by upper-cased rule id; `None` disables the rule
    pub severities: FxHashMap<String, Option<Severity>>,

    /// Version of the analysed framework, if known
    pub framework_version: Option<FrameworkVersion>,
}

impl AnalyzerConfig {
    /// The standard dispose-like method names
    pub const DISPOSE_METHODS: [&'static str; 4] =
        ["Dispose", "DisposeAsync", "Close", "CloseAsync"];

    /// Creates the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the understood keys from `provider`. Keys are matched case-insensitively.
    ///
    /// Unknown severity names and unparsable versions are logged and ignored.
    #[must_use]
    pub fn from_provider(provider: &dyn OptionsProvider) -> Self {
        let mut config = AnalyzerConfig::default();
        let mut keys = provider.keys();
        keys.sort_unstable();
        for key in keys {
            let Some(value) = provider.get(key) else { continue };
            let lower = key.to_ascii_lowercase();
            if lower == ADDITIONAL_DISPOSE_METHODS.to_ascii_lowercase() {
                config.additional_dispose_methods = split_names(value);
            } else if lower == FRAMEWORK_VERSION {
                match FrameworkVersion::parse(value) {
                    Ok(version) => config.framework_version = Some(version),
                    Err(e) => log::warn!("ignoring {} - {}", FRAMEWORK_VERSION, e),
                }
            } else if let Some(id) = lower
                .strip_prefix(DIAGNOSTIC_PREFIX)
                .and_then(|rest| rest.strip_suffix(SEVERITY_SUFFIX))
            {
                match parse_severity(value) {
                    Ok(severity) => {
                        config.severities.insert(id.to_ascii_uppercase(), severity);
                    }
                    Err(e) => log::warn!("ignoring severity for {} - {}", id, e),
                }
            }
        }
        config
    }

    /// Parse `.editorconfig`-style text: `key = value` lines, `#`/`;` comments, section headers
    /// ignored. Later assignments win.
    #[must_use]
    pub fn from_editorconfig(text: &str) -> Self {
        let mut options: BTreeMap<String, String> = BTreeMap::new();
        for line in text.lines() {
            let line = line.trim();
            if line.is_empty()
                || line.starts_with('#')
                || line.starts_with(';')
                || line.starts_with('[')
            {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                options.insert(key.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }
        Self::from_provider(&options)
    }

    /// Read and parse an `.editorconfig`-style file, see [`AnalyzerConfig::from_editorconfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::FileError`] if the file cannot be read.
    pub fn from_editorconfig_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_editorconfig(&text))
    }

    /// Adds extra dispose-like method names.
    #[must_use]
    pub fn with_dispose_methods<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_dispose_methods
            .extend(names.into_iter().map(Into::into));
        self
    }

    /// Overrides the severity of one rule; `None` disables it.
    #[must_use]
    pub fn with_severity(mut self, id: &str, severity: Option<Severity>) -> Self {
        self.severities.insert(id.to_ascii_uppercase(), severity);
        self
    }

    /// Sets the analysed framework version.
    #[must_use]
    pub fn with_framework_version(mut self, version: FrameworkVersion) -> Self {
        self.framework_version = Some(version);
        self
    }

    /// True if `name` is a standard or configured dispose-like method
    #[must_use]
    pub fn is_dispose_method(&self, name: &str) -> bool {
        Self::DISPOSE_METHODS.contains(&name)
            || self.additional_dispose_methods.iter().any(|m| m == name)
    }

    /// The effective severity of rule `id`, or `None` if it is disabled
    #[must_use]
    pub fn severity_for(&self, id: &str, default: Severity) -> Option<Severity> {
        match self.severities.get(&id.to_ascii_uppercase()) {
            Some(severity) => *severity,
            None => Some(default),
        }
    }

    /// True if the fix for independent assertions may use `Assert.EnterMultipleScope()`
    #[must_use]
    pub fn supports_enter_multiple_scope(&self) -> bool {
        self.framework_version
            .is_some_and(|v| v.supports_enter_multiple_scope())
    }
}

/// Split a list of names separated by `,`, `;` or whitespace
fn split_names(value: &str) -> Vec<String> {
    value
        .split(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_severity(value: &str) -> Result<Option<Severity>> {
    match value.trim().to_ascii_lowercase().as_str() {
        "none" | "silent" => Ok(None),
        "suggestion" | "info" => Ok(Some(Severity::Info)),
        "warning" => Ok(Some(Severity::Warning)),
        "error" => Ok(Some(Severity::Error)),
        "hidden" => Ok(Some(Severity::Hidden)),
        other => Err(Error::Config(format!("unknown severity '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispose_method_list_separators() {
        let mut options = HashMap::new();
        options.insert(
            ADDITIONAL_DISPOSE_METHODS.to_string(),
            "Release,Shutdown; Stop  Cleanup".to_string(),
        );
        let config = AnalyzerConfig::from_provider(&options);
        assert_eq!(
            config.additional_dispose_methods,
            vec!["Release", "Shutdown", "Stop", "Cleanup"]
        );
        assert!(config.is_dispose_method("Dispose"));
        assert!(config.is_dispose_method("Stop"));
        assert!(!config.is_dispose_method("Free"));
    }

    #[test]
    fn test_severity_overrides() {
        let config = AnalyzerConfig::from_editorconfig(
            "# comment\n\
             [*.cs]\n\
             dotnet_diagnostic.NUnit2005.severity = none\n\
             DOTNET_DIAGNOSTIC.nunit2006.SEVERITY = Error\n\
             dotnet_diagnostic.NUnit2007.severity = loud\n",
        );
        assert_eq!(config.severity_for("NUnit2005", Severity::Info), None);
        assert_eq!(config.severity_for("NUnit2006", Severity::Info), Some(Severity::Error));
        assert_eq!(config.severity_for("NUnit2007", Severity::Info), Some(Severity::Info));
        assert_eq!(config.severity_for("NUnit2001", Severity::Warning), Some(Severity::Warning));
    }

    #[test]
    fn test_framework_version() {
        assert_eq!(FrameworkVersion::parse("4.2").unwrap(), FrameworkVersion::new(4, 2, 0));
        assert_eq!(FrameworkVersion::parse("4.3.1-beta").unwrap(), FrameworkVersion::new(4, 3, 1));
        assert!(FrameworkVersion::parse("four").is_err());
        assert!(FrameworkVersion::parse("4").is_err());

        let config = AnalyzerConfig::from_editorconfig("assertscope.framework_version = 4.1\n");
        assert!(!config.supports_enter_multiple_scope());
        let config = AnalyzerConfig::new().with_framework_version(FrameworkVersion::new(4, 2, 0));
        assert!(config.supports_enter_multiple_scope());
    }

    #[test]
    fn test_editorconfig_file() {
        let path = std::env::temp_dir()
            .join(format!("assertscope-{}.editorconfig", std::process::id()));
        std::fs::write(&path, "[*.cs]\ndotnet_diagnostic.NUnit2045.severity = warning\n").unwrap();
        let config = AnalyzerConfig::from_editorconfig_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(config.severity_for("NUnit2045", Severity::Info), Some(Severity::Warning));

        assert!(matches!(
            AnalyzerConfig::from_editorconfig_file(path.with_extension("missing")),
            Err(Error::FileError(_))
        ));
    }
}
