//! Type-compatibility oracle.
//!
//! Decides at compile time whether the framework's runtime equality comparer could ever report
//! a value of one type equal to a value of another. The decision table mirrors what the
//! comparer does at runtime:
//!
//! 1. an unresolved type on either side is compatible (upstream errors are reported elsewhere)
//! 2. one level of `Nullable<T>` is unwrapped on each side
//! 3. identity, reference, boxing and unboxing conversions in either direction are compatible
//! 4. two numeric types are compatible (`char` is not numeric here)
//! 5. a pair already under comparison is incompatible, which cuts self-referential types
//! 6. tuples and value tuples of equal arity compare element-wise
//! 7. dictionaries need convertible keys (no numeric widening) and compatible values
//! 8. key/value pairs compare key and value
//! 9. enumerables compare element types, unless one side only has the non-generic interface
//! 10. two streams are compatible
//! 11. `IEquatable<T>` on either side, with `T` matching the other side, is compatible
//! 12. anything else is incompatible
//!
//! Enums only match the identical enum type through rule 3, so two distinct enums with the same
//! members never compare equal.
//!
//! # Examples
//!
//! ```rust
//! use assertscope::{compat, host::types::WellKnown, Compilation};
//!
//! let compilation = Compilation::from_source("empty.cs", "class C { }")?;
//! let registry = compilation.registry();
//! let int = registry.well_known_ty(WellKnown::Int32);
//! let double = registry.well_known_ty(WellKnown::Double);
//! let string = registry.well_known_ty(WellKnown::String);
//! assert!(compat::can_be_equal(registry, &int, &double));
//! assert!(!compat::can_be_equal(registry, &int, &string));
//! # Ok::<(), assertscope::Error>(())
//! ```

use rustc_hash::FxHashSet;

use crate::{
    host::types::{classify_conversion, NumericKind, Ty, TypeRegistry, WellKnown},
    query,
};

const TUPLE_PREFIX: &str = "System.Tuple`";
const VALUE_TUPLE_PREFIX: &str = "System.ValueTuple`";

/// True if a value of type `left` could compare equal to a value of type `right`
#[must_use]
pub fn can_be_equal(registry: &TypeRegistry, left: &Ty, right: &Ty) -> bool {
    EqualityOracle::new(registry).can_be_equal(left, right)
}

/// One compatibility query with its visited-pair cache
struct EqualityOracle<'r> {
    registry: &'r TypeRegistry,
    visited: FxHashSet<(Ty, Ty)>,
}

impl<'r> EqualityOracle<'r> {
    fn new(registry: &'r TypeRegistry) -> Self {
        EqualityOracle {
            registry,
            visited: FxHashSet::default(),
        }
    }

    fn can_be_equal(&mut self, left: &Ty, right: &Ty) -> bool {
        if is_unknown(left) || is_unknown(right) {
            return true;
        }

        let registry = self.registry;
        let left = registry.strip_nullable(left);
        let right = registry.strip_nullable(right);

        if self.converts(left, right) || self.converts(right, left) {
            return true;
        }
        if self.is_numeric(left) && self.is_numeric(right) {
            return true;
        }

        if !self.visited.insert((left.clone(), right.clone())) {
            return false;
        }

        if let Some(pairs) = self.tuple_elements(left, right) {
            return pairs.iter().all(|(l, r)| self.can_be_equal(l, r));
        }

        if let (Some(l), Some(r)) = (
            self.supertype(left, WellKnown::Dictionary),
            self.supertype(right, WellKnown::Dictionary),
        ) {
            let (l_args, r_args) = (l.args(), r.args());
            if l_args.len() == 2 && r_args.len() == 2 {
                let keys_match = self.converts_exactly(&l_args[0], &r_args[0])
                    || self.converts_exactly(&r_args[0], &l_args[0]);
                return keys_match && self.can_be_equal(&l_args[1], &r_args[1]);
            }
        }

        if registry.is_well_known(left, WellKnown::KeyValuePair)
            && registry.is_well_known(right, WellKnown::KeyValuePair)
        {
            let (l_args, r_args) = (left.args(), right.args());
            if l_args.len() == 2 && r_args.len() == 2 {
                return self.can_be_equal(&l_args[0], &r_args[0])
                    && self.can_be_equal(&l_args[1], &r_args[1]);
            }
        }

        if registry.is_enumerable(left) && registry.is_enumerable(right) {
            return match (registry.element_type(left), registry.element_type(right)) {
                (Some(l), Some(r)) => self.can_be_equal(&l, &r),
                _ => true,
            };
        }

        if self.supertype(left, WellKnown::Stream).is_some()
            && self.supertype(right, WellKnown::Stream).is_some()
        {
            return true;
        }

        query::implements_equatable_of(registry, left, right)
            || query::implements_equatable_of(registry, right, left)
    }

    /// Identity, reference, boxing or unboxing conversion from `from` to `to`
    fn converts(&self, from: &Ty, to: &Ty) -> bool {
        let conversion = classify_conversion(self.registry, from, to);
        conversion.is_identity()
            || conversion.is_reference()
            || conversion.is_boxing()
            || conversion.is_unboxing()
    }

    /// Identity or reference conversion only, as required of dictionary keys
    fn converts_exactly(&self, from: &Ty, to: &Ty) -> bool {
        let conversion = classify_conversion(self.registry, from, to);
        conversion.is_identity() || conversion.is_reference()
    }

    fn is_numeric(&self, ty: &Ty) -> bool {
        self.registry
            .numeric_kind(ty)
            .is_some_and(|kind| kind != NumericKind::Char)
    }

    fn supertype(&self, ty: &Ty, which: WellKnown) -> Option<Ty> {
        let def = self.registry.well_known(which)?;
        self.registry.find_supertype(ty, def)
    }

    /// Element pairs of two tuples, or two value tuples, of the same arity
    fn tuple_elements(&self, left: &Ty, right: &Ty) -> Option<Vec<(Ty, Ty)>> {
        let (l, r) = (left.def()?, right.def()?);
        let l_name = self.registry.metadata_name(l);
        let r_name = self.registry.metadata_name(r);
        let same_family = (l_name.starts_with(TUPLE_PREFIX) && r_name.starts_with(TUPLE_PREFIX))
            || (l_name.starts_with(VALUE_TUPLE_PREFIX) && r_name.starts_with(VALUE_TUPLE_PREFIX));
        if !same_family || left.args().len() != right.args().len() {
            return None;
        }
        Some(
            left.args()
                .iter()
                .cloned()
                .zip(right.args().iter().cloned())
                .collect(),
        )
    }
}

/// Types the oracle cannot reason about
fn is_unknown(ty: &Ty) -> bool {
    matches!(ty, Ty::Error | Ty::Param(_) | Ty::Null | Ty::Function { .. })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        host::{semantic::Compilation, types::DefId},
        test::{compile, with_usings},
    };

    const TYPES: &str = "
        public enum Colour { Red, Green }
        public enum Shade { Red, Green }
        public class A : IEnumerable<A> { }
        public class B : IEnumerable<B> { }
        public class Legacy : IEnumerable { }
        public class Money : IEquatable<decimal> { public bool Equals(decimal other) => false; }
        public class Animal { }
        public sealed class Dog : Animal { }
        public sealed class Car { }
        public struct Point { }
    ";

    fn compilation() -> Compilation {
        compile(&with_usings(TYPES))
    }

    fn named(compilation: &Compilation, name: &str) -> Ty {
        compilation
            .registry()
            .lookup(name)
            .map(Ty::named)
            .unwrap_or_else(|| panic!("no type {}", name))
    }

    fn generic(compilation: &Compilation, name: &str, args: Vec<Ty>) -> Ty {
        let def: DefId = compilation.registry().lookup(name).unwrap();
        Ty::generic(def, args)
    }

    fn check(registry: &TypeRegistry, left: &Ty, right: &Ty) -> bool {
        let forward = can_be_equal(registry, left, right);
        let backward = can_be_equal(registry, right, left);
        assert_eq!(forward, backward, "{} vs {}", registry.display(left), registry.display(right));
        forward
    }

    #[test]
    fn test_reflexive_including_errors() {
        let compilation = compilation();
        let registry = compilation.registry();
        for ty in [
            Ty::Error,
            named(&compilation, "Colour"),
            named(&compilation, "A"),
            named(&compilation, "Point"),
            registry.well_known_ty(WellKnown::String),
            Ty::array(registry.well_known_ty(WellKnown::Int32)),
        ] {
            assert!(can_be_equal(registry, &ty, &ty), "{}", registry.display(&ty));
        }
        assert!(check(registry, &Ty::Error, &named(&compilation, "Car")));
    }

    #[test]
    fn test_enums_compare_by_identity() {
        let compilation = compilation();
        let registry = compilation.registry();
        let colour = named(&compilation, "Colour");
        let shade = named(&compilation, "Shade");
        let nullable_colour =
            registry.well_known_generic(WellKnown::Nullable, vec![colour.clone()]);
        assert!(!check(registry, &colour, &shade));
        assert!(check(registry, &colour, &nullable_colour));
        assert!(!check(registry, &colour, &registry.well_known_ty(WellKnown::Int32)));
    }

    #[test]
    fn test_numerics_and_references() {
        let compilation = compilation();
        let registry = compilation.registry();
        let int = registry.well_known_ty(WellKnown::Int32);
        let long = registry.well_known_ty(WellKnown::Int64);
        let decimal = registry.well_known_ty(WellKnown::Decimal);
        let char = registry.well_known_ty(WellKnown::Char);
        let object = registry.well_known_ty(WellKnown::Object);
        assert!(check(registry, &int, &long));
        assert!(check(registry, &decimal, &registry.well_known_ty(WellKnown::Double)));
        assert!(!check(registry, &char, &registry.well_known_ty(WellKnown::String)));
        assert!(check(registry, &int, &object));
        assert!(check(registry, &named(&compilation, "Dog"), &named(&compilation, "Animal")));
        assert!(!check(registry, &named(&compilation, "Dog"), &named(&compilation, "Car")));
        assert!(!check(registry, &named(&compilation, "Point"), &int));
    }

    #[test]
    fn test_dictionary_keys_are_strict() {
        let compilation = compilation();
        let registry = compilation.registry();
        let int = registry.well_known_ty(WellKnown::Int32);
        let double = registry.well_known_ty(WellKnown::Double);
        let string = registry.well_known_ty(WellKnown::String);
        let dict = |k: &Ty, v: &Ty| {
            registry.well_known_generic(WellKnown::Dictionary, vec![k.clone(), v.clone()])
        };
        assert!(!check(registry, &dict(&int, &string), &dict(&double, &string)));
        assert!(check(registry, &dict(&string, &int), &dict(&string, &double)));
        assert!(!check(registry, &dict(&string, &int), &dict(&string, &string)));
    }

    #[test]
    fn test_tuples_and_pairs() {
        let compilation = compilation();
        let registry = compilation.registry();
        let int = registry.well_known_ty(WellKnown::Int32);
        let double = registry.well_known_ty(WellKnown::Double);
        let string = registry.well_known_ty(WellKnown::String);
        let tuple = |args: Vec<Ty>| generic(&compilation, "System.Tuple`2", args);
        let value_tuple = |args: Vec<Ty>| generic(&compilation, "System.ValueTuple`2", args);
        assert!(check(
            registry,
            &tuple(vec![int.clone(), string.clone()]),
            &tuple(vec![double.clone(), string.clone()])
        ));
        assert!(!check(
            registry,
            &tuple(vec![int.clone(), string.clone()]),
            &tuple(vec![string.clone(), int.clone()])
        ));
        assert!(check(
            registry,
            &value_tuple(vec![int.clone(), int.clone()]),
            &value_tuple(vec![long_of(registry), int.clone()])
        ));
        assert!(!check(
            registry,
            &tuple(vec![int.clone(), int.clone()]),
            &value_tuple(vec![int.clone(), int.clone()])
        ));

        let pair = |k: &Ty, v: &Ty| {
            registry.well_known_generic(WellKnown::KeyValuePair, vec![k.clone(), v.clone()])
        };
        assert!(check(registry, &pair(&int, &string), &pair(&double, &string)));
        assert!(!check(registry, &pair(&int, &string), &pair(&int, &int)));
    }

    fn long_of(registry: &TypeRegistry) -> Ty {
        registry.well_known_ty(WellKnown::Int64)
    }

    #[test]
    fn test_enumerables() {
        let compilation = compilation();
        let registry = compilation.registry();
        let int = registry.well_known_ty(WellKnown::Int32);
        let string = registry.well_known_ty(WellKnown::String);
        let list =
            |t: &Ty| generic(&compilation, "System.Collections.Generic.List`1", vec![t.clone()]);
        let doubles = Ty::array(registry.well_known_ty(WellKnown::Double));
        assert!(check(registry, &list(&int), &doubles));
        assert!(!check(registry, &list(&int), &list(&string)));
        assert!(check(registry, &named(&compilation, "Legacy"), &list(&string)));
    }

    #[test]
    fn test_self_referential_enumerables_terminate() {
        let compilation = compilation();
        let registry = compilation.registry();
        assert!(!check(registry, &named(&compilation, "A"), &named(&compilation, "B")));
    }

    #[test]
    fn test_streams_and_equatable() {
        let compilation = compilation();
        let registry = compilation.registry();
        let file = named(&compilation, "System.IO.FileStream");
        let memory = named(&compilation, "System.IO.MemoryStream");
        assert!(check(registry, &file, &memory));
        let money = named(&compilation, "Money");
        assert!(check(registry, &money, &registry.well_known_ty(WellKnown::Decimal)));
        assert!(!check(registry, &money, &registry.well_known_ty(WellKnown::String)));
    }
}
