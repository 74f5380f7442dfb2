//! Framework types the binder and the analyzers refer to by name.

use strum::{AsRefStr, EnumIter, IntoEnumIterator, IntoStaticStr};

/// Well-known framework types, keyed by metadata name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, IntoStaticStr, EnumIter)]
#[allow(missing_docs)]
pub enum WellKnown {
    #[strum(serialize = "System.Object")]
    Object,
    #[strum(serialize = "System.String")]
    String,
    #[strum(serialize = "System.ValueType")]
    ValueType,
    #[strum(serialize = "System.Enum")]
    Enum,
    #[strum(serialize = "System.Array")]
    Array,
    #[strum(serialize = "System.Void")]
    Void,
    #[strum(serialize = "System.Boolean")]
    Boolean,
    #[strum(serialize = "System.Char")]
    Char,
    #[strum(serialize = "System.SByte")]
    SByte,
    #[strum(serialize = "System.Byte")]
    Byte,
    #[strum(serialize = "System.Int16")]
    Int16,
    #[strum(serialize = "System.UInt16")]
    UInt16,
    #[strum(serialize = "System.Int32")]
    Int32,
    #[strum(serialize = "System.UInt32")]
    UInt32,
    #[strum(serialize = "System.Int64")]
    Int64,
    #[strum(serialize = "System.UInt64")]
    UInt64,
    #[strum(serialize = "System.Single")]
    Single,
    #[strum(serialize = "System.Double")]
    Double,
    #[strum(serialize = "System.Decimal")]
    Decimal,
    #[strum(serialize = "System.Nullable`1")]
    Nullable,
    #[strum(serialize = "System.Delegate")]
    Delegate,
    #[strum(serialize = "System.MulticastDelegate")]
    MulticastDelegate,
    #[strum(serialize = "System.Exception")]
    Exception,
    #[strum(serialize = "System.Type")]
    Type,
    #[strum(serialize = "System.IDisposable")]
    IDisposable,
    #[strum(serialize = "System.IAsyncDisposable")]
    IAsyncDisposable,
    #[strum(serialize = "System.IEquatable`1")]
    IEquatable,
    #[strum(serialize = "System.Collections.IEnumerable")]
    IEnumerable,
    #[strum(serialize = "System.Collections.ICollection")]
    ICollection,
    #[strum(serialize = "System.Collections.IList")]
    IList,
    #[strum(serialize = "System.Collections.Generic.IEnumerable`1")]
    IEnumerableOfT,
    #[strum(serialize = "System.Collections.Generic.ICollection`1")]
    ICollectionOfT,
    #[strum(serialize = "System.Collections.Generic.IList`1")]
    IListOfT,
    #[strum(serialize = "System.Collections.Generic.IReadOnlyCollection`1")]
    IReadOnlyCollectionOfT,
    #[strum(serialize = "System.Collections.Generic.IReadOnlyList`1")]
    IReadOnlyListOfT,
    #[strum(serialize = "System.Collections.Generic.Dictionary`2")]
    Dictionary,
    #[strum(serialize = "System.Collections.Generic.KeyValuePair`2")]
    KeyValuePair,
    #[strum(serialize = "System.IO.Stream")]
    Stream,
    #[strum(serialize = "System.Threading.Tasks.Task")]
    Task,
    #[strum(serialize = "System.Threading.Tasks.Task`1")]
    TaskOfT,
    #[strum(serialize = "System.Threading.Tasks.ValueTask")]
    ValueTask,
    #[strum(serialize = "System.Threading.Tasks.ValueTask`1")]
    ValueTaskOfT,
}

impl WellKnown {
    /// Metadata name, e.g. `System.Collections.Generic.List`1`
    #[must_use]
    pub fn metadata_name(self) -> &'static str {
        self.into()
    }

    /// The well-known type with the given metadata name
    #[must_use]
    pub fn from_metadata_name(name: &str) -> Option<WellKnown> {
        WellKnown::iter().find(|w| w.as_ref() == name)
    }

    /// C# keyword alias, e.g. `int` for `System.Int32`
    #[must_use]
    pub fn keyword(self) -> Option<&'static str> {
        Some(match self {
            WellKnown::Object => "object",
            WellKnown::String => "string",
            WellKnown::Void => "void",
            WellKnown::Boolean => "bool",
            WellKnown::Char => "char",
            WellKnown::SByte => "sbyte",
            WellKnown::Byte => "byte",
            WellKnown::Int16 => "short",
            WellKnown::UInt16 => "ushort",
            WellKnown::Int32 => "int",
            WellKnown::UInt32 => "uint",
            WellKnown::Int64 => "long",
            WellKnown::UInt64 => "ulong",
            WellKnown::Single => "float",
            WellKnown::Double => "double",
            WellKnown::Decimal => "decimal",
            _ => return None,
        })
    }

    /// The well-known type named by a predefined type keyword
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<WellKnown> {
        WellKnown::iter().find(|w| w.keyword() == Some(keyword))
    }

    /// The numeric kind of this type, if it is one of the built-in numeric types
    #[must_use]
    pub fn numeric_kind(self) -> Option<NumericKind> {
        Some(match self {
            WellKnown::SByte => NumericKind::SByte,
            WellKnown::Byte => NumericKind::Byte,
            WellKnown::Int16 => NumericKind::Int16,
            WellKnown::UInt16 => NumericKind::UInt16,
            WellKnown::Int32 => NumericKind::Int32,
            WellKnown::UInt32 => NumericKind::UInt32,
            WellKnown::Int64 => NumericKind::Int64,
            WellKnown::UInt64 => NumericKind::UInt64,
            WellKnown::Char => NumericKind::Char,
            WellKnown::Single => NumericKind::Single,
            WellKnown::Double => NumericKind::Double,
            WellKnown::Decimal => NumericKind::Decimal,
            _ => return None,
        })
    }
}

/// The built-in numeric kinds, `char` included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum NumericKind {
    SByte,
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Char,
    Single,
    Double,
    Decimal,
}

impl NumericKind {
    /// True if a value of `self` converts implicitly to `to`
    #[must_use]
    pub fn widens_to(self, to: NumericKind) -> bool {
        use NumericKind::{
            Byte, Char, Decimal, Double, Int16, Int32, Int64, SByte, Single, UInt16, UInt32,
            UInt64,
        };
        if self == to {
            return true;
        }
        match self {
            SByte => matches!(to, Int16 | Int32 | Int64 | Single | Double | Decimal),
            Byte => matches!(
                to,
                Int16 | UInt16 | Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
            ),
            Int16 => matches!(to, Int32 | Int64 | Single | Double | Decimal),
            UInt16 | Char => matches!(
                to,
                Int32 | UInt32 | Int64 | UInt64 | Single | Double | Decimal
            ) || (self == Char && to == UInt16),
            Int32 => matches!(to, Int64 | Single | Double | Decimal),
            UInt32 => matches!(to, Int64 | UInt64 | Single | Double | Decimal),
            Int64 | UInt64 => matches!(to, Single | Double | Decimal),
            Single => to == Double,
            Double | Decimal => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_and_keywords() {
        assert_eq!(WellKnown::Int32.metadata_name(), "System.Int32");
        assert_eq!(WellKnown::Int32.as_ref(), "System.Int32");
        assert_eq!(WellKnown::from_keyword("double"), Some(WellKnown::Double));
        assert_eq!(
            WellKnown::from_metadata_name("System.Collections.Generic.IEnumerable`1"),
            Some(WellKnown::IEnumerableOfT)
        );
    }

    #[test]
    fn test_numeric_widening() {
        assert!(NumericKind::Int32.widens_to(NumericKind::Double));
        assert!(NumericKind::Char.widens_to(NumericKind::UInt16));
        assert!(!NumericKind::Double.widens_to(NumericKind::Int32));
        assert!(!NumericKind::Int32.widens_to(NumericKind::UInt32));
    }
}
