//! # assertscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the assertscope library. Import this module to get quick access to everything needed
//! to analyze test sources and apply fixes.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all assertscope operations
pub use crate::Error;

/// The result type used throughout assertscope
pub use crate::Result;

/// Analyzer options
pub use crate::config::{AnalyzerConfig, FrameworkVersion, OptionsProvider};

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Parsed and bound sources
pub use crate::Compilation;

/// Analysis driver and cancellation
pub use crate::{AnalysisEngine, CancellationToken};

// ================================================================================================
// Diagnostics
// ================================================================================================

/// Rules and what they report
pub use crate::rules::{
    Category, Diagnostic, DiagnosticDescriptor, Properties, Rule, RuleContext, Severity,
};

// ================================================================================================
// Fixes
// ================================================================================================

/// Fix providers and their edits
pub use crate::fixes::{apply_edits, CodeAction, FixProvider, TextEdit};

// ================================================================================================
// Analysis Building Blocks
// ================================================================================================

/// Typed-tree queries
pub use crate::query::{AssertClass, AssertInvocation, TreeContext};

/// Constraint expressions
pub use crate::constraints::{ConstraintExpression, ConstraintExpressionPart};

/// Syntax trees and locations
pub use crate::host::syntax::{Span, SyntaxTree};
