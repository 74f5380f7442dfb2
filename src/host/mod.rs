//! The host layer: syntax trees, types and semantic binding for the C# subset test code is
//! written in.
//!
//! The analyzers never look at raw text. They consume the read-only query surface exposed
//! here: immutable syntax trees with full trivia, a registry of type definitions, and a
//! per-tree semantic model resolving expressions to types, symbols and selected overloads.
//!
//! # Key Components
//!
//! - [`syntax`] - Lexer, parser and syntax tree
//! - [`types`] - Type definitions, structural types and conversions
//! - [`catalog`] - Framework declarations every compilation starts from
//! - [`semantic`] - Declaration passes, binder and [`semantic::Compilation`]

pub mod catalog;
pub mod semantic;
pub mod syntax;
pub mod types;
