//! Classification of conversions between types.
//!
//! [`classify_conversion`] answers "which kind of conversion, if any, exists from one type to
//! another", following the C# conversion categories. Both implicit and explicit conversions
//! are reported; [`Conversion::is_implicit`] tells them apart.

use crate::host::types::{
    registry::TypeRegistry,
    ty::Ty,
    well_known::WellKnown,
};

/// Kind of conversion between two types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conversion {
    /// Same type
    Identity,
    /// Widening between built-in numeric types
    ImplicitNumeric,
    /// Narrowing between built-in numeric types
    ExplicitNumeric,
    /// Up-cast between reference types
    ImplicitReference,
    /// Down-cast or cross-cast between reference types
    ExplicitReference,
    /// Value type to object, `System.ValueType` or an implemented interface
    Boxing,
    /// The reverse of boxing
    Unboxing,
    /// `T` to `T?`, or lifted implicit conversion
    ImplicitNullable,
    /// `T?` to `T`, or lifted explicit conversion
    ExplicitNullable,
    /// Between an enum and a numeric type or another enum
    ExplicitEnumeration,
    /// The `null` literal to a reference or nullable type
    NullLiteral,
    /// Lambda or method group to a compatible delegate
    FunctionToDelegate,
    /// No conversion exists
    None,
}

impl Conversion {
    /// True if any conversion exists
    #[must_use]
    pub fn exists(self) -> bool {
        self != Conversion::None
    }

    /// True if the conversion is implicit
    #[must_use]
    pub fn is_implicit(self) -> bool {
        matches!(
            self,
            Conversion::Identity
                | Conversion::ImplicitNumeric
                | Conversion::ImplicitReference
                | Conversion::Boxing
                | Conversion::ImplicitNullable
                | Conversion::NullLiteral
                | Conversion::FunctionToDelegate
        )
    }

    /// True for identity
    #[must_use]
    pub fn is_identity(self) -> bool {
        self == Conversion::Identity
    }

    /// True for implicit or explicit numeric conversions
    #[must_use]
    pub fn is_numeric(self) -> bool {
        matches!(self, Conversion::ImplicitNumeric | Conversion::ExplicitNumeric)
    }

    /// True for implicit or explicit reference conversions
    #[must_use]
    pub fn is_reference(self) -> bool {
        matches!(
            self,
            Conversion::ImplicitReference | Conversion::ExplicitReference
        )
    }

    /// True for boxing
    #[must_use]
    pub fn is_boxing(self) -> bool {
        self == Conversion::Boxing
    }

    /// True for unboxing
    #[must_use]
    pub fn is_unboxing(self) -> bool {
        self == Conversion::Unboxing
    }

    /// Cost used to rank overload candidates; lower is better
    #[must_use]
    pub fn rank(self) -> u32 {
        match self {
            Conversion::Identity => 0,
            Conversion::ImplicitNumeric | Conversion::NullLiteral => 2,
            Conversion::ImplicitNullable | Conversion::FunctionToDelegate => 2,
            Conversion::ImplicitReference => 3,
            Conversion::Boxing => 4,
            _ => 100,
        }
    }
}

/// Classify the conversion from `from` to `to`.
///
/// The error type and unsubstituted generic parameters convert to and from anything with an
/// explicit reference conversion.
#[must_use]
pub fn classify_conversion(registry: &TypeRegistry, from: &Ty, to: &Ty) -> Conversion {
    if from == to {
        return Conversion::Identity;
    }

    match (from, to) {
        (Ty::Error, _) | (_, Ty::Error) => return Conversion::ExplicitReference,
        (Ty::Null, _) => {
            return if registry.is_reference_type(to)
                || registry.nullable_underlying(to).is_some()
                || matches!(to, Ty::Param(_))
            {
                Conversion::NullLiteral
            } else {
                Conversion::None
            };
        }
        (Ty::Function { arity, ret }, _) => return function_to_delegate(registry, *arity, ret, to),
        (Ty::Param(_), _) => {
            return if registry.is_well_known(to, WellKnown::Object) {
                Conversion::Boxing
            } else {
                Conversion::ExplicitReference
            };
        }
        (_, Ty::Param(_)) => return Conversion::ExplicitReference,
        _ => {}
    }

    if let (Some(f), Some(t)) = (registry.numeric_kind(from), registry.numeric_kind(to)) {
        return if f.widens_to(t) {
            Conversion::ImplicitNumeric
        } else {
            Conversion::ExplicitNumeric
        };
    }

    let from_enum = registry.is_enum(from);
    let to_enum = registry.is_enum(to);
    if (from_enum && (to_enum || registry.numeric_kind(to).is_some()))
        || (to_enum && registry.numeric_kind(from).is_some())
    {
        return Conversion::ExplicitEnumeration;
    }

    if let Some(conversion) = nullable_conversion(registry, from, to) {
        return conversion;
    }

    let from_value = registry.is_value_type(from);
    let to_value = registry.is_value_type(to);

    if from_value && !to_value {
        return if boxes_to(registry, from, to) {
            Conversion::Boxing
        } else {
            Conversion::None
        };
    }
    if to_value && !from_value {
        return if boxes_to(registry, to, from) {
            Conversion::Unboxing
        } else {
            Conversion::None
        };
    }
    if from_value && to_value {
        return Conversion::None;
    }

    reference_conversion(registry, from, to)
}

fn function_to_delegate(registry: &TypeRegistry, arity: usize, ret: &Ty, to: &Ty) -> Conversion {
    let Some((params, invoke_ret)) = registry.delegate_signature(to) else {
        // untyped lambdas convert to the delegate base types as a last resort
        return if registry.is_well_known(to, WellKnown::Delegate)
            || registry.is_well_known(to, WellKnown::Object)
        {
            Conversion::ExplicitReference
        } else {
            Conversion::None
        };
    };
    if params.len() != arity {
        return Conversion::None;
    }
    let void = registry.is_well_known(&invoke_ret, WellKnown::Void);
    let ret_void = registry.is_well_known(ret, WellKnown::Void);
    if void || ret.is_error() || invoke_ret.has_params() {
        return Conversion::FunctionToDelegate;
    }
    if ret_void {
        return Conversion::None;
    }
    let inner = classify_conversion(registry, ret, &invoke_ret);
    if inner.is_implicit() || (inner == Conversion::ExplicitReference && ret.contains_error()) {
        Conversion::FunctionToDelegate
    } else if unwrap_task(registry, &invoke_ret).is_some() {
        // async lambdas: the body type is the awaited type
        Conversion::FunctionToDelegate
    } else {
        Conversion::None
    }
}

fn unwrap_task<'t>(registry: &TypeRegistry, ty: &'t Ty) -> Option<&'t Ty> {
    if registry.is_well_known(ty, WellKnown::TaskOfT)
        || registry.is_well_known(ty, WellKnown::ValueTaskOfT)
    {
        ty.args().first()
    } else {
        None
    }
}

fn nullable_conversion(registry: &TypeRegistry, from: &Ty, to: &Ty) -> Option<Conversion> {
    let from_inner = registry.nullable_underlying(from);
    let to_inner = registry.nullable_underlying(to);
    match (from_inner, to_inner) {
        (Some(f), Some(t)) => {
            let inner = classify_conversion(registry, f, t);
            Some(if !inner.exists() {
                Conversion::None
            } else if inner.is_implicit() {
                Conversion::ImplicitNullable
            } else {
                Conversion::ExplicitNullable
            })
        }
        (None, Some(t)) if registry.is_value_type(from) => {
            let inner = classify_conversion(registry, from, t);
            Some(if !inner.exists() {
                Conversion::None
            } else if inner.is_implicit() {
                Conversion::ImplicitNullable
            } else {
                Conversion::ExplicitNullable
            })
        }
        (Some(f), None) if registry.is_value_type(to) => {
            Some(if classify_conversion(registry, f, to).exists() {
                Conversion::ExplicitNullable
            } else {
                Conversion::None
            })
        }
        // `T?` boxes like `T`
        (Some(f), None) => Some(if boxes_to(registry, f, to) {
            Conversion::Boxing
        } else {
            Conversion::None
        }),
        (None, Some(t)) => Some(if boxes_to(registry, t, from) {
            Conversion::Unboxing
        } else {
            Conversion::None
        }),
        (None, None) => None,
    }
}

/// True if `value` boxes to the reference type `target`
fn boxes_to(registry: &TypeRegistry, value: &Ty, target: &Ty) -> bool {
    registry.is_well_known(target, WellKnown::Object)
        || registry.is_well_known(target, WellKnown::ValueType)
        || (registry.is_well_known(target, WellKnown::Enum) && registry.is_enum(value))
        || registry.interfaces(value).contains(target)
}

fn reference_conversion(registry: &TypeRegistry, from: &Ty, to: &Ty) -> Conversion {
    if registry.is_well_known(to, WellKnown::Object) {
        return Conversion::ImplicitReference;
    }
    if registry.is_well_known(from, WellKnown::Object) {
        return Conversion::ExplicitReference;
    }

    if let (Ty::Array { elem: fe, rank: fr }, Ty::Array { elem: te, rank: tr }) = (from, to) {
        if fr != tr || registry.is_value_type(fe) || registry.is_value_type(te) {
            return Conversion::None;
        }
        let inner = classify_conversion(registry, fe, te);
        return if inner.is_reference() || inner.is_identity() {
            inner
        } else {
            Conversion::None
        };
    }

    if registry.supertypes(from).contains(to) {
        return Conversion::ImplicitReference;
    }
    if registry.supertypes(to).contains(from) {
        return Conversion::ExplicitReference;
    }

    // casts involving interfaces succeed at runtime unless a sealed class rules them out
    let from_interface = registry.is_interface(from);
    let to_interface = registry.is_interface(to);
    if (from_interface && to_interface)
        || (from_interface && !registry.is_sealed(to))
        || (to_interface && !registry.is_sealed(from))
    {
        return Conversion::ExplicitReference;
    }
    Conversion::None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::catalog_registry;

    fn ty(registry: &TypeRegistry, name: &str) -> Ty {
        Ty::named(registry.lookup(name).unwrap())
    }

    #[test]
    fn test_numeric_and_identity() {
        let registry = catalog_registry();
        let int = ty(&registry, "System.Int32");
        let double = ty(&registry, "System.Double");
        assert_eq!(classify_conversion(&registry, &int, &int), Conversion::Identity);
        assert_eq!(classify_conversion(&registry, &int, &double), Conversion::ImplicitNumeric);
        assert_eq!(classify_conversion(&registry, &double, &int), Conversion::ExplicitNumeric);
    }

    #[test]
    fn test_boxing_and_reference() {
        let registry = catalog_registry();
        let int = ty(&registry, "System.Int32");
        let object = ty(&registry, "System.Object");
        let string = ty(&registry, "System.String");
        let stream = ty(&registry, "System.IO.Stream");
        let memory = ty(&registry, "System.IO.MemoryStream");
        let disposable = ty(&registry, "System.IDisposable");
        assert_eq!(classify_conversion(&registry, &int, &object), Conversion::Boxing);
        assert_eq!(classify_conversion(&registry, &object, &int), Conversion::Unboxing);
        assert_eq!(classify_conversion(&registry, &memory, &stream), Conversion::ImplicitReference);
        assert_eq!(classify_conversion(&registry, &stream, &memory), Conversion::ExplicitReference);
        assert_eq!(
            classify_conversion(&registry, &memory, &disposable),
            Conversion::ImplicitReference
        );
        assert_eq!(classify_conversion(&registry, &string, &stream), Conversion::None);
        assert_eq!(classify_conversion(&registry, &Ty::Null, &string), Conversion::NullLiteral);
        assert_eq!(classify_conversion(&registry, &Ty::Null, &int), Conversion::None);
    }

    #[test]
    fn test_nullable() {
        let registry = catalog_registry();
        let int = ty(&registry, "System.Int32");
        let nullable_int = registry.well_known_generic(WellKnown::Nullable, vec![int.clone()]);
        assert_eq!(
            classify_conversion(&registry, &int, &nullable_int),
            Conversion::ImplicitNullable
        );
        assert_eq!(
            classify_conversion(&registry, &nullable_int, &int),
            Conversion::ExplicitNullable
        );
    }
}
