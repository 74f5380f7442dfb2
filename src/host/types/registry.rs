//! Type definitions and the registry that owns them.
//!
//! The [`TypeRegistry`] is an arena of [`TypeDef`]s indexed by [`DefId`], with a secondary
//! index by metadata name (`Namespace.Name` plus a `` `N `` arity suffix for generic types and
//! `+` separators for nested types). All structural queries the binder and the analyzers need
//! live here: base-type chains, transitive interface closure with type-argument substitution,
//! member lookup through the hierarchy and delegate signatures.
//!
//! Hierarchies in user code can be cyclic when the code does not compile. Every walk is
//! bounded, so a malformed hierarchy yields incomplete answers instead of looping.

use rustc_hash::{FxHashMap, FxHashSet};
use strum::{AsRefStr, Display};

use crate::host::{
    syntax::{Modifiers, ParamModifier, Span},
    types::{
        ty::{DefId, Ty},
        well_known::{NumericKind, WellKnown},
    },
};

/// Upper bound on the length of a base-type chain
const MAX_HIERARCHY_DEPTH: usize = 64;

/// Kind of a type definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[allow(missing_docs)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Enum,
    Delegate,
}

/// Kind of a type member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[allow(missing_docs)]
pub enum MemberKind {
    Field,
    Property,
    Indexer,
    Method,
    Constructor,
    EnumMember,
}

/// A method or indexer parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamDef {
    /// Parameter name
    pub name: String,
    /// Declared type
    pub ty: Ty,
    /// `params`, `ref`, `out`, `in` or `this`
    pub modifier: ParamModifier,
    /// True if a default value is declared
    pub has_default: bool,
}

impl ParamDef {
    /// True for a `params` array parameter
    #[must_use]
    pub fn is_params(&self) -> bool {
        self.modifier == ParamModifier::Params
    }
}

/// A field, property, method, constructor or enum member of a type
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDef {
    /// Member name; `.ctor` for constructors
    pub name: String,
    /// Kind
    pub kind: MemberKind,
    /// Modifiers
    pub modifiers: Modifiers,
    /// Field or property type, method return type
    pub ty: Ty,
    /// Method generic parameters
    pub generics: Vec<String>,
    /// Parameters of methods, constructors and indexers
    pub params: Vec<ParamDef>,
    /// Metadata names of applied attributes
    pub attributes: Vec<String>,
    /// Declared as an extension method
    pub is_extension: bool,
    /// Declaration site in user source
    pub span: Option<Span>,
}

impl MemberDef {
    /// Create a member with no parameters or attributes
    #[must_use]
    pub fn new(name: impl Into<String>, kind: MemberKind, modifiers: Modifiers, ty: Ty) -> Self {
        MemberDef {
            name: name.into(),
            kind,
            modifiers,
            ty,
            generics: Vec::new(),
            params: Vec::new(),
            attributes: Vec::new(),
            is_extension: false,
            span: None,
        }
    }

    /// True for static members and constants
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.intersects(Modifiers::STATIC | Modifiers::CONST)
            || self.kind == MemberKind::EnumMember
    }

    /// True for fields and properties
    #[must_use]
    pub fn is_variable(&self) -> bool {
        matches!(self.kind, MemberKind::Field | MemberKind::Property)
    }

    /// True if an attribute with this metadata name is applied
    #[must_use]
    pub fn has_attribute(&self, metadata_name: &str) -> bool {
        self.attributes.iter().any(|a| a == metadata_name)
    }
}

/// Where a definition comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeOrigin {
    /// The built-in framework catalog
    Catalog,
    /// A user syntax tree
    Source {
        /// Index of the tree in the compilation
        tree: usize,
        /// Declaration span
        span: Span,
    },
}

/// A class, struct, interface, enum or delegate definition
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    /// Namespace, empty for the global namespace
    pub namespace: String,
    /// Simple name without arity suffix
    pub name: String,
    /// Generic parameter names
    pub generics: Vec<String>,
    /// Kind
    pub kind: TypeKind,
    /// Modifiers
    pub modifiers: Modifiers,
    /// Base class; `None` for `System.Object` and interfaces
    pub base: Option<Ty>,
    /// Directly implemented interfaces
    pub interfaces: Vec<Ty>,
    /// Members
    pub members: Vec<MemberDef>,
    /// Metadata names of applied attributes
    pub attributes: Vec<String>,
    /// Arguments of applied attributes, as source text, keyed by attribute metadata name
    pub attribute_args: Vec<(String, Vec<String>)>,
    /// Containing type for nested types
    pub outer: Option<DefId>,
    /// Origin
    pub origin: TypeOrigin,
}

impl TypeDef {
    /// Create an empty definition
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        TypeDef {
            namespace: namespace.into(),
            name: name.into(),
            generics: Vec::new(),
            kind,
            modifiers: Modifiers::empty(),
            base: None,
            interfaces: Vec::new(),
            members: Vec::new(),
            attributes: Vec::new(),
            attribute_args: Vec::new(),
            outer: None,
            origin: TypeOrigin::Catalog,
        }
    }

    /// True if an attribute with this metadata name is applied
    #[must_use]
    pub fn has_attribute(&self, metadata_name: &str) -> bool {
        self.attributes.iter().any(|a| a == metadata_name)
    }

    /// True for value types
    #[must_use]
    pub fn is_value_type(&self) -> bool {
        matches!(self.kind, TypeKind::Struct | TypeKind::Enum)
    }

    /// True for static classes
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(Modifiers::STATIC)
    }
}

/// Reference to a member of an instantiated type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemberRef {
    /// Declaring type with its generic arguments
    pub owner: Ty,
    /// Index into the declaring definition's members
    pub index: usize,
}

/// Arena of type definitions
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    defs: Vec<TypeDef>,
    by_name: FxHashMap<String, DefId>,
    namespaces: FxHashSet<String>,
    extensions: FxHashMap<String, Vec<(DefId, usize)>>,
}

impl TypeRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a definition and index it by metadata name.
    ///
    /// A later definition with the same metadata name shadows the earlier one in name
    /// lookups; both stay addressable by id.
    pub fn add(&mut self, def: TypeDef) -> DefId {
        let id = DefId(self.defs.len() as u32);
        let mut namespace = String::new();
        for part in def.namespace.split('.').filter(|p| !p.is_empty()) {
            if !namespace.is_empty() {
                namespace.push('.');
            }
            namespace.push_str(part);
            self.namespaces.insert(namespace.clone());
        }
        self.defs.push(def);
        let name = self.metadata_name(id);
        self.by_name.insert(name, id);
        id
    }

    /// Number of definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// True if the registry holds no definitions
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Iterate all definitions
    pub fn iter(&self) -> impl Iterator<Item = (DefId, &TypeDef)> {
        self.defs
            .iter()
            .enumerate()
            .map(|(i, d)| (DefId(i as u32), d))
    }

    /// The definition behind `id`
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this registry.
    #[must_use]
    pub fn def(&self, id: DefId) -> &TypeDef {
        &self.defs[id.0 as usize]
    }

    /// Mutable access for the declaration passes
    pub fn def_mut(&mut self, id: DefId) -> &mut TypeDef {
        &mut self.defs[id.0 as usize]
    }

    /// Look up a definition by metadata name, e.g. `System.Collections.Generic.List`1`
    #[must_use]
    pub fn lookup(&self, metadata_name: &str) -> Option<DefId> {
        self.by_name.get(metadata_name).copied()
    }

    /// True if `name` is a known namespace
    #[must_use]
    pub fn is_namespace(&self, name: &str) -> bool {
        self.namespaces.contains(name)
    }

    /// Definition id of a well-known type
    #[must_use]
    pub fn well_known(&self, which: WellKnown) -> Option<DefId> {
        self.lookup(which.metadata_name())
    }

    /// A well-known non-generic type, or the error type if the catalog lacks it
    #[must_use]
    pub fn well_known_ty(&self, which: WellKnown) -> Ty {
        self.well_known(which).map_or(Ty::Error, Ty::named)
    }

    /// A well-known generic type instantiated with `args`
    #[must_use]
    pub fn well_known_generic(&self, which: WellKnown, args: Vec<Ty>) -> Ty {
        self.well_known(which)
            .map_or(Ty::Error, |def| Ty::generic(def, args))
    }

    /// True if `ty` is the well-known type `which`, ignoring generic arguments
    #[must_use]
    pub fn is_well_known(&self, ty: &Ty, which: WellKnown) -> bool {
        ty.def().is_some() && ty.def() == self.well_known(which)
    }

    /// The well-known identity of `ty`
    #[must_use]
    pub fn well_known_of(&self, ty: &Ty) -> Option<WellKnown> {
        let def = ty.def()?;
        WellKnown::from_metadata_name(&self.metadata_name(def))
    }

    /// Register an extension method so that member lookup can find it
    pub fn add_extension(&mut self, def: DefId, index: usize) {
        let name = self.def(def).members[index].name.clone();
        self.extensions.entry(name).or_default().push((def, index));
    }

    /// Extension methods with the given name
    #[must_use]
    pub fn extensions_named(&self, name: &str) -> Vec<MemberRef> {
        self.extensions
            .get(name)
            .map(|list| {
                list.iter()
                    .map(|(def, index)| MemberRef {
                        owner: Ty::named(*def),
                        index: *index,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Metadata name: `Namespace.Outer+Name`N`
    #[must_use]
    pub fn metadata_name(&self, id: DefId) -> String {
        let def = self.def(id);
        let mut name = match def.outer {
            Some(outer) => format!("{}+", self.metadata_name(outer)),
            None if def.namespace.is_empty() => String::new(),
            None => format!("{}.", def.namespace),
        };
        name.push_str(&def.name);
        if !def.generics.is_empty() {
            name.push('`');
            name.push_str(&def.generics.len().to_string());
        }
        name
    }

    /// Metadata name of a type; arrays get a `[]` suffix, other non-named types render
    /// through [`TypeRegistry::display`]
    #[must_use]
    pub fn full_name(&self, ty: &Ty) -> String {
        match ty {
            Ty::Named { def, .. } => self.metadata_name(*def),
            Ty::Array { elem, rank } => format!(
                "{}[{}]",
                self.full_name(elem),
                ",".repeat((*rank as usize).saturating_sub(1))
            ),
            _ => self.display(ty),
        }
    }

    /// C#-style display string, e.g. `List<int>`, `int?`, `(int, string)`
    #[must_use]
    pub fn display(&self, ty: &Ty) -> String {
        match ty {
            Ty::Named { def, args } => {
                if let Some(keyword) = self.well_known_of(ty).and_then(WellKnown::keyword) {
                    return keyword.to_string();
                }
                if self.is_well_known(ty, WellKnown::Nullable) && args.len() == 1 {
                    return format!("{}?", self.display(&args[0]));
                }
                let d = self.def(*def);
                if d.namespace == "System" && d.name == "ValueTuple" && args.len() > 1 {
                    let inner: Vec<String> = args.iter().map(|a| self.display(a)).collect();
                    return format!("({})", inner.join(", "));
                }
                let mut out = match d.outer {
                    Some(outer) => format!("{}.", self.display(&Ty::named(outer))),
                    None => String::new(),
                };
                out.push_str(&d.name);
                if !args.is_empty() {
                    let inner: Vec<String> = args.iter().map(|a| self.display(a)).collect();
                    out.push('<');
                    out.push_str(&inner.join(", "));
                    out.push('>');
                }
                out
            }
            Ty::Array { elem, rank } => format!(
                "{}[{}]",
                self.display(elem),
                ",".repeat((*rank as usize).saturating_sub(1))
            ),
            Ty::Param(name) => name.clone(),
            Ty::Function { .. } => "lambda expression".to_string(),
            Ty::Null => "null".to_string(),
            Ty::Error => "?".to_string(),
        }
    }

    /// Kind of a named type
    #[must_use]
    pub fn kind_of(&self, ty: &Ty) -> Option<TypeKind> {
        ty.def().map(|d| self.def(d).kind)
    }

    /// True for structs and enums
    #[must_use]
    pub fn is_value_type(&self, ty: &Ty) -> bool {
        matches!(self.kind_of(ty), Some(TypeKind::Struct | TypeKind::Enum))
    }

    /// True for classes, interfaces, delegates and arrays
    #[must_use]
    pub fn is_reference_type(&self, ty: &Ty) -> bool {
        matches!(ty, Ty::Array { .. })
            || matches!(
                self.kind_of(ty),
                Some(TypeKind::Class | TypeKind::Interface | TypeKind::Delegate)
            )
    }

    /// True for enums
    #[must_use]
    pub fn is_enum(&self, ty: &Ty) -> bool {
        self.kind_of(ty) == Some(TypeKind::Enum)
    }

    /// True for interfaces
    #[must_use]
    pub fn is_interface(&self, ty: &Ty) -> bool {
        self.kind_of(ty) == Some(TypeKind::Interface)
    }

    /// True for delegates
    #[must_use]
    pub fn is_delegate(&self, ty: &Ty) -> bool {
        self.kind_of(ty) == Some(TypeKind::Delegate)
    }

    /// True for sealed classes, value types and delegates
    #[must_use]
    pub fn is_sealed(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Named { def, .. } => {
                let d = self.def(*def);
                d.is_value_type()
                    || d.kind == TypeKind::Delegate
                    || d.modifiers.intersects(Modifiers::SEALED | Modifiers::STATIC)
            }
            Ty::Array { .. } => true,
            _ => false,
        }
    }

    /// `T` for `System.Nullable<T>`
    #[must_use]
    pub fn nullable_underlying<'t>(&self, ty: &'t Ty) -> Option<&'t Ty> {
        if self.is_well_known(ty, WellKnown::Nullable) {
            ty.args().first()
        } else {
            None
        }
    }

    /// `ty` with one level of `System.Nullable<T>` removed
    #[must_use]
    pub fn strip_nullable<'t>(&self, ty: &'t Ty) -> &'t Ty {
        self.nullable_underlying(ty).unwrap_or(ty)
    }

    /// Numeric kind of a built-in numeric type
    #[must_use]
    pub fn numeric_kind(&self, ty: &Ty) -> Option<NumericKind> {
        self.well_known_of(ty).and_then(WellKnown::numeric_kind)
    }

    /// Mapping from the generic parameters of a named type to its arguments
    #[must_use]
    pub fn type_map(&self, ty: &Ty) -> FxHashMap<String, Ty> {
        let mut map = FxHashMap::default();
        if let Ty::Named { def, args } = ty {
            let def = self.def(*def);
            if let Some(outer) = def.outer {
                // nested types see the parameters of their containing type
                for name in &self.def(outer).generics {
                    map.insert(name.clone(), Ty::Param(name.clone()));
                }
            }
            for (name, arg) in def.generics.iter().zip(args) {
                map.insert(name.clone(), arg.clone());
            }
        }
        map
    }

    /// Direct base type with generic arguments substituted.
    ///
    /// Arrays derive from `System.Array`; interfaces and `System.Object` have no base.
    #[must_use]
    pub fn base_type(&self, ty: &Ty) -> Option<Ty> {
        match ty {
            Ty::Named { def, .. } => {
                let base = self.def(*def).base.as_ref()?;
                Some(base.substitute(&self.type_map(ty)))
            }
            Ty::Array { .. } => Some(self.well_known_ty(WellKnown::Array)),
            _ => None,
        }
    }

    /// Base chain from the direct base up to `System.Object`, excluding `ty` itself
    #[must_use]
    pub fn base_chain(&self, ty: &Ty) -> Vec<Ty> {
        let mut chain = Vec::new();
        let mut current = self.base_type(ty);
        while let Some(base) = current {
            if chain.len() >= MAX_HIERARCHY_DEPTH || chain.contains(&base) {
                break;
            }
            current = self.base_type(&base);
            chain.push(base);
        }
        chain
    }

    /// All interfaces implemented by `ty`, directly or through bases and other interfaces,
    /// with generic arguments substituted. `ty` itself is included if it is an interface.
    #[must_use]
    pub fn interfaces(&self, ty: &Ty) -> Vec<Ty> {
        let mut result: Vec<Ty> = Vec::new();
        let mut seen: FxHashSet<Ty> = FxHashSet::default();
        let mut pending: Vec<Ty> = Vec::new();

        if self.is_interface(ty) {
            pending.push(ty.clone());
        }
        let mut owners = vec![ty.clone()];
        owners.extend(self.base_chain(ty));
        for owner in &owners {
            match owner {
                Ty::Named { def, .. } => {
                    let map = self.type_map(owner);
                    for interface in &self.def(*def).interfaces {
                        pending.push(interface.substitute(&map));
                    }
                }
                Ty::Array { elem, rank } => {
                    if *rank == 1 {
                        for which in [
                            WellKnown::IListOfT,
                            WellKnown::ICollectionOfT,
                            WellKnown::IEnumerableOfT,
                            WellKnown::IReadOnlyListOfT,
                            WellKnown::IReadOnlyCollectionOfT,
                        ] {
                            let interface = self.well_known_generic(which, vec![(**elem).clone()]);
                            if !interface.is_error() {
                                pending.push(interface);
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        while let Some(interface) = pending.pop() {
            if !seen.insert(interface.clone()) {
                continue;
            }
            if let Ty::Named { def, .. } = &interface {
                let map = self.type_map(&interface);
                for inherited in &self.def(*def).interfaces {
                    pending.push(inherited.substitute(&map));
                }
            }
            result.push(interface);
        }
        result
    }

    /// Base chain followed by all interfaces
    #[must_use]
    pub fn supertypes(&self, ty: &Ty) -> Vec<Ty> {
        let mut all = self.base_chain(ty);
        for interface in self.interfaces(ty) {
            if &interface != ty {
                all.push(interface);
            }
        }
        all
    }

    /// The instantiation of `def` that `ty` is or derives from, e.g. the `IEnumerable<T>`
    /// implemented by a `List<int>`
    #[must_use]
    pub fn find_supertype(&self, ty: &Ty, def: DefId) -> Option<Ty> {
        if ty.def() == Some(def) {
            return Some(ty.clone());
        }
        self.supertypes(ty).into_iter().find(|t| t.def() == Some(def))
    }

    /// True if `ty` is, derives from or implements `def`
    #[must_use]
    pub fn is_subtype_of(&self, ty: &Ty, def: DefId) -> bool {
        self.find_supertype(ty, def).is_some()
    }

    /// True if `ty` is or derives from the type with metadata name `name`
    #[must_use]
    pub fn is_subtype_of_name(&self, ty: &Ty, name: &str) -> bool {
        self.lookup(name).is_some_and(|def| self.is_subtype_of(ty, def))
    }

    /// Members named `name` visible on `ty`: its own, then those of its bases, then (for
    /// interfaces) those of inherited interfaces. Members hidden by a derived member with the
    /// same name and signature shape are still returned; callers rank them.
    #[must_use]
    pub fn members_named(&self, ty: &Ty, name: &str) -> Vec<MemberRef> {
        let mut owners = match ty {
            Ty::Param(_) | Ty::Error | Ty::Null | Ty::Function { .. } => {
                vec![self.well_known_ty(WellKnown::Object)]
            }
            Ty::Array { .. } => vec![ty.clone()],
            Ty::Named { .. } => vec![ty.clone()],
        };
        owners.extend(self.base_chain(ty));
        if self.is_interface(ty) {
            owners.extend(self.interfaces(ty).into_iter().filter(|t| t != ty));
            owners.push(self.well_known_ty(WellKnown::Object));
        }

        let mut found = Vec::new();
        for owner in owners {
            let Ty::Named { def, .. } = &owner else {
                continue;
            };
            for (index, member) in self.def(*def).members.iter().enumerate() {
                if member.name == name {
                    found.push(MemberRef {
                        owner: owner.clone(),
                        index,
                    });
                }
            }
        }
        found
    }

    /// The member definition behind a reference
    #[must_use]
    pub fn member(&self, member: &MemberRef) -> &MemberDef {
        let def = member.owner.def().unwrap_or(DefId(0));
        &self.def(def).members[member.index]
    }

    /// Declared type of a member with the owner's generic arguments substituted
    #[must_use]
    pub fn member_type(&self, member: &MemberRef) -> Ty {
        self.member(member)
            .ty
            .substitute(&self.type_map(&member.owner))
    }

    /// Invoke signature of a delegate type: parameter types and return type
    #[must_use]
    pub fn delegate_signature(&self, ty: &Ty) -> Option<(Vec<Ty>, Ty)> {
        if !self.is_delegate(ty) {
            return None;
        }
        let invoke = self
            .members_named(ty, "Invoke")
            .into_iter()
            .next()?;
        let map = self.type_map(&invoke.owner);
        let member = self.member(&invoke);
        let params = member.params.iter().map(|p| p.ty.substitute(&map)).collect();
        Some((params, member.ty.substitute(&map)))
    }

    /// Element type of an enumerable: array element, or the argument of the implemented
    /// `IEnumerable<T>`. `None` if only the non-generic interface is known.
    #[must_use]
    pub fn element_type(&self, ty: &Ty) -> Option<Ty> {
        if let Ty::Array { elem, .. } = ty {
            return Some((**elem).clone());
        }
        let enumerable = self.well_known(WellKnown::IEnumerableOfT)?;
        let instance = self.find_supertype(ty, enumerable)?;
        instance.args().first().cloned()
    }

    /// True if `ty` implements the generic or non-generic enumerable interface
    #[must_use]
    pub fn is_enumerable(&self, ty: &Ty) -> bool {
        if matches!(ty, Ty::Array { .. }) {
            return true;
        }
        self.well_known(WellKnown::IEnumerable)
            .is_some_and(|def| self.is_subtype_of(ty, def))
            || self
                .well_known(WellKnown::IEnumerableOfT)
                .is_some_and(|def| self.is_subtype_of(ty, def))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (TypeRegistry, DefId, DefId, DefId) {
        let mut registry = TypeRegistry::new();
        let object = registry.add(TypeDef::new("System", "Object", TypeKind::Class));
        let mut enumerable =
            TypeDef::new("System.Collections.Generic", "IEnumerable", TypeKind::Interface);
        enumerable.generics = vec!["T".into()];
        let enumerable = registry.add(enumerable);
        let mut list = TypeDef::new("System.Collections.Generic", "List", TypeKind::Class);
        list.generics = vec!["T".into()];
        list.base = Some(Ty::named(object));
        list.interfaces = vec![Ty::generic(enumerable, vec![Ty::Param("T".into())])];
        let list = registry.add(list);
        (registry, object, enumerable, list)
    }

    #[test]
    fn test_metadata_names() {
        let (registry, object, _, list) = registry();
        assert_eq!(registry.metadata_name(list), "System.Collections.Generic.List`1");
        assert_eq!(registry.lookup("System.Object"), Some(object));
        assert!(registry.is_namespace("System.Collections"));
        assert!(!registry.is_namespace("System.Coll"));
    }

    #[test]
    fn test_interface_substitution() {
        let (registry, object, enumerable, list) = registry();
        let list_of_object = Ty::generic(list, vec![Ty::named(object)]);
        let found = registry.find_supertype(&list_of_object, enumerable);
        assert_eq!(found, Some(Ty::generic(enumerable, vec![Ty::named(object)])));
        assert_eq!(registry.element_type(&list_of_object), Some(Ty::named(object)));
        assert_eq!(registry.base_chain(&list_of_object), vec![Ty::named(object)]);
    }

    #[test]
    fn test_cyclic_hierarchy_terminates() {
        let mut registry = TypeRegistry::new();
        let a = registry.add(TypeDef::new("", "A", TypeKind::Class));
        let b = registry.add(TypeDef::new("", "B", TypeKind::Class));
        registry.def_mut(a).base = Some(Ty::named(b));
        registry.def_mut(b).base = Some(Ty::named(a));
        assert!(registry.base_chain(&Ty::named(a)).len() <= 2);
        assert!(!registry.is_subtype_of(&Ty::named(a), DefId(99)));
    }
}
