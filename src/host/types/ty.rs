//! Structural type representation.

use rustc_hash::FxHashMap;

/// Index of a [`TypeDef`](crate::host::types::TypeDef) in the registry arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DefId(pub u32);

/// A type as seen by the binder.
///
/// Types are plain values compared structurally: two `Named` types are the same type exactly
/// when they refer to the same definition with the same arguments. Nullable value types are
/// `System.Nullable<T>`, tuples are `System.ValueTuple<...>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    /// A class, struct, interface, enum or delegate, possibly instantiated
    Named {
        /// Definition
        def: DefId,
        /// Generic arguments, empty for non-generic types
        args: Vec<Ty>,
    },
    /// Single or multi-dimensional array
    Array {
        /// Element type
        elem: Box<Ty>,
        /// Number of dimensions
        rank: u32,
    },
    /// An unsubstituted generic parameter
    Param(String),
    /// A lambda or method group before conversion to a delegate type
    Function {
        /// Number of parameters
        arity: usize,
        /// Return type; `Error` when unknown, `void` type for statement lambdas without value
        ret: Box<Ty>,
    },
    /// The type of the `null` literal
    Null,
    /// Unresolvable type
    Error,
}

impl Ty {
    /// A non-generic named type
    #[must_use]
    pub fn named(def: DefId) -> Ty {
        Ty::Named { def, args: Vec::new() }
    }

    /// A generic instantiation
    #[must_use]
    pub fn generic(def: DefId, args: Vec<Ty>) -> Ty {
        Ty::Named { def, args }
    }

    /// Single-dimensional array of `elem`
    #[must_use]
    pub fn array(elem: Ty) -> Ty {
        Ty::Array {
            elem: Box::new(elem),
            rank: 1,
        }
    }

    /// True for the error type
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Ty::Error)
    }

    /// True if this type or any type argument is the error type
    #[must_use]
    pub fn contains_error(&self) -> bool {
        match self {
            Ty::Error => true,
            Ty::Named { args, .. } => args.iter().any(Ty::contains_error),
            Ty::Array { elem, .. } => elem.contains_error(),
            Ty::Function { ret, .. } => ret.contains_error(),
            Ty::Param(_) | Ty::Null => false,
        }
    }

    /// The definition of a named type
    #[must_use]
    pub fn def(&self) -> Option<DefId> {
        match self {
            Ty::Named { def, .. } => Some(*def),
            _ => None,
        }
    }

    /// Generic arguments of a named type
    #[must_use]
    pub fn args(&self) -> &[Ty] {
        match self {
            Ty::Named { args, .. } => args,
            _ => &[],
        }
    }

    /// True if this type mentions a generic parameter
    #[must_use]
    pub fn has_params(&self) -> bool {
        match self {
            Ty::Param(_) => true,
            Ty::Named { args, .. } => args.iter().any(Ty::has_params),
            Ty::Array { elem, .. } => elem.has_params(),
            Ty::Function { ret, .. } => ret.has_params(),
            Ty::Null | Ty::Error => false,
        }
    }

    /// Replace generic parameters according to `map`; unmapped parameters are kept
    #[must_use]
    pub fn substitute(&self, map: &FxHashMap<String, Ty>) -> Ty {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            Ty::Param(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            Ty::Named { def, args } => Ty::Named {
                def: *def,
                args: args.iter().map(|a| a.substitute(map)).collect(),
            },
            Ty::Array { elem, rank } => Ty::Array {
                elem: Box::new(elem.substitute(map)),
                rank: *rank,
            },
            Ty::Function { arity, ret } => Ty::Function {
                arity: *arity,
                ret: Box::new(ret.substitute(map)),
            },
            Ty::Null | Ty::Error => self.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute() {
        let list = DefId(7);
        let ty = Ty::generic(list, vec![Ty::array(Ty::Param("T".into()))]);
        let mut map = FxHashMap::default();
        map.insert("T".to_string(), Ty::named(DefId(1)));
        assert_eq!(
            ty.substitute(&map),
            Ty::generic(list, vec![Ty::array(Ty::named(DefId(1)))])
        );
        assert!(ty.has_params());
        assert!(!ty.substitute(&map).has_params());
    }

    #[test]
    fn test_contains_error() {
        assert!(Ty::generic(DefId(0), vec![Ty::Error]).contains_error());
        assert!(!Ty::array(Ty::named(DefId(0))).contains_error());
    }
}
