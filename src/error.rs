use thiserror::Error;

macro_rules! malformed_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::Malformed {
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::Malformed {
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// Analysis itself is lenient: unresolvable semantic information and unsupported
/// syntactic shapes never surface as errors, they simply produce no diagnostic. The variants
/// below cover the cases that are genuinely exceptional - source text that cannot be parsed at
/// all, configuration that cannot be understood, cancellation, and internal consistency
/// violations between rules and their paired fixes.
///
/// # Error Categories
///
/// ## Input Errors
/// - [`Error::Syntax`] - The source text could not be parsed
/// - [`Error::FileError`] - Filesystem I/O errors
/// - [`Error::Config`] - An option value could not be understood
///
/// ## Internal Consistency Errors
/// - [`Error::Malformed`] - An internal invariant was violated
/// - [`Error::UnknownRecipe`] - A diagnostic names a method the rewrite tables do not know
/// - [`Error::MissingProperty`] - A fix consumed a property its rule did not produce
/// - [`Error::InvalidFormatString`] - A format specification could not be decoded
///
/// ## Control Flow
/// - [`Error::Cancelled`] - The analysis was cancelled cooperatively
///
/// # Examples
///
/// ```rust
/// use assertscope::{Compilation, Error};
///
/// match Compilation::from_source("broken.cs", "class {") {
///     Ok(_) => println!("Parsed"),
///     Err(Error::Syntax { message, line, column }) => {
///         eprintln!("{}:{}: {}", line, column, message);
///     }
///     Err(e) => eprintln!("Other error: {}", e),
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// The source text could not be parsed.
    ///
    /// Raised by the lexer and parser for input outside the supported language subset.
    /// Line and column are 1-based.
    #[error("Syntax error at {line}:{column}: {message}")]
    Syntax {
        /// Description of what was expected or found
        message: String,
        /// 1-based line of the offending token
        line: usize,
        /// 1-based column of the offending token
        column: usize,
    },

    /// An internal invariant was violated.
    ///
    /// This error includes the source location where the violation was detected for
    /// debugging purposes.
    #[error("Malformed - {file}:{line}: {message}")]
    Malformed {
        /// The message to be printed for the Malformed error
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// A diagnostic names a method that none of the rewrite tables contain.
    ///
    /// Rules and their paired fixes share the method tables; hitting this means the two
    /// have drifted apart. It is a programming defect and is never swallowed.
    #[error("No constraint recipe for method '{0}'")]
    UnknownRecipe(String),

    /// A fix consumed a diagnostic property that its rule did not record.
    #[error("Diagnostic property '{0}' is missing")]
    MissingProperty(&'static str),

    /// A format specification could not be decoded.
    #[error("Invalid format string - {0}")]
    InvalidFormatString(String),

    /// A configuration value could not be understood.
    #[error("Invalid configuration - {0}")]
    Config(String),

    /// The analysis was cancelled through its [`crate::CancellationToken`].
    #[error("The analysis was cancelled")]
    Cancelled,

    /// File I/O error.
    ///
    /// Wraps standard I/O errors that can occur while reading source files.
    #[error("{0}")]
    FileError(#[from] std::io::Error),
}
