// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(clippy::too_many_arguments)]

//! # assertscope
//!
//! Static analysis for NUnit test code written in C#. `assertscope` parses test sources,
//! binds them against a built-in catalog of the NUnit and base class library APIs, reports
//! misuse of the assertion framework and proposes source rewrites that fix what it reports.
//!
//! ## Features
//!
//! - **Constraint model migration** - classic `ClassicAssert`, `StringAssert` and
//!   `CollectionAssert` calls rewritten to `Assert.That` with the equivalent constraint
//! - **Type compatibility** - `Is.EqualTo` comparisons that can never succeed at runtime
//! - **Resource lifecycle** - disposable fixture members that are never disposed in the
//!   matching tear-down
//! - **Message formatting** - format specifications converted into interpolated strings
//! - **Grouping** - consecutive independent assertions wrapped into `Assert.Multiple` or
//!   `Assert.EnterMultipleScope()`
//! - **Test sources** - `TestCaseSource`/`ValueSource` members that are missing, not static or
//!   named by string
//!
//! ## Quick Start
//!
//! ```rust
//! use assertscope::prelude::*;
//!
//! let source = "using NUnit.Framework;
//! using NUnit.Framework.Legacy;
//! public class Tests
//! {
//!     [Test]
//!     public void Sum() { ClassicAssert.AreEqual(4, 2 + 2); }
//! }";
//!
//! let compilation = Compilation::from_source("Tests.cs", source)?;
//! let engine = AnalysisEngine::with_defaults();
//! let diagnostics = engine.analyze(&compilation, &CancellationToken::new())?;
//! assert_eq!(diagnostics[0].id(), "NUnit2005");
//!
//! let actions = engine.fixes_for(&compilation, &diagnostics[0])?;
//! assert_eq!(actions[0].edit.new_text, "Assert.That(2 + 2, Is.EqualTo(4))");
//! # Ok::<(), assertscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`host`] - Syntax trees with trivia, the type registry, the API catalog and the binder
//! - [`query`] - Predicates and lookups over typed trees
//! - [`constraints`] - Decomposition of constraint expressions
//! - [`compat`] - The type-compatibility oracle
//! - [`lifecycle`] - Assignment and disposal tracking across fixture lifecycle methods
//! - [`rules`] - Diagnostic descriptors and the rules producing them
//! - [`fixes`] - The rewrite engine
//! - [`engine`] - Parallel analysis, severity configuration and fix application
//! - [`config`] - Analyzer options
//!
//! ## Error Handling
//!
//! Analysis is lenient: a construct the rules do not understand produces no diagnostic. Errors
//! are reserved for unparsable input, cancellation and inconsistencies between a rule and its
//! fix:
//!
//! ```rust
//! use assertscope::{Compilation, Error};
//!
//! match Compilation::from_source("broken.cs", "class {") {
//!     Ok(_) => println!("Parsed"),
//!     Err(Error::Syntax { line, column, .. }) => println!("Syntax error at {}:{}", line, column),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and installs no logger. Per-tree progress is
//! logged at `debug`, skipped sites at `trace`, ignored configuration values at `warn`.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use assertscope::prelude::*;
///
/// let compilation = Compilation::from_source("Empty.cs", "class C { }")?;
/// let engine = AnalysisEngine::with_defaults();
/// let diagnostics = engine.analyze(&compilation, &CancellationToken::new())?;
/// assert!(diagnostics.is_empty());
/// # Ok::<(), assertscope::Error>(())
/// ```
pub mod prelude;

/// The host language services: syntax, types, the API catalog and semantic binding
pub mod host;

/// Typed-tree query layer used by rules and fixes
pub mod query;

/// The constraint-expression model
pub mod constraints;

/// Whether values of two types can ever compare equal
pub mod compat;

/// Resource-lifecycle dataflow analysis of test fixtures
pub mod lifecycle;

/// Diagnostic descriptors, diagnostics and the rules producing them
pub mod rules;

/// Code fixes
pub mod fixes;

/// Analyzer configuration
pub mod config;

/// Analysis driver and cancellation
pub mod engine;

/// `assertscope` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `assertscope` Error type
///
/// Covers parse failures, cancellation and rule/fix inconsistencies.
pub use error::Error;

/// Parsed and bound source files, the input of every analysis
///
/// # Example
///
/// ```rust
/// use assertscope::Compilation;
/// let compilation = Compilation::from_source("C.cs", "class C { }")?;
/// assert_eq!(compilation.trees().len(), 1);
/// # Ok::<(), assertscope::Error>(())
/// ```
pub use host::semantic::Compilation;

/// The analysis driver
pub use engine::{AnalysisEngine, CancellationToken};
