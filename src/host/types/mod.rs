//! Type definitions, structural types and conversions.
//!
//! # Key Components
//!
//! - [`Ty`] - Structural type values
//! - [`TypeRegistry`] - Arena of [`TypeDef`]s with hierarchy and member queries
//! - [`classify_conversion`] - Conversion classification between two types
//! - [`WellKnown`] - Framework types referenced by name

mod conversions;
mod registry;
mod ty;
mod well_known;

pub use conversions::{classify_conversion, Conversion};
pub use registry::{
    MemberDef, MemberKind, MemberRef, ParamDef, TypeDef, TypeKind, TypeOrigin, TypeRegistry,
};
pub use ty::{DefId, Ty};
pub use well_known::{NumericKind, WellKnown};
