//! Type name resolution.
//!
//! A [`TypeScope`] captures everything that decides what a type name means at one point of
//! the source: the enclosing namespace, the using directives in force, the enclosing type
//! declarations and the generic parameters introduced by methods. Lookups follow the C#
//! order: generic parameters, nested types of the enclosing types (and their bases), the
//! enclosing namespaces from the innermost outwards, aliases, then imported namespaces.

use crate::host::{
    syntax::{NameSegment, TypeSyntax, TypeSyntaxKind, UsingDirective},
    types::{DefId, Ty, TypeRegistry, WellKnown},
};

/// The using directives in force for a declaration
#[derive(Debug, Clone, Default)]
pub struct Imports {
    /// `using N;`
    pub namespaces: Vec<String>,
    /// `using A = T;`
    pub aliases: Vec<(String, TypeSyntax)>,
    /// `using static T;`
    pub static_types: Vec<TypeSyntax>,
}

impl Imports {
    /// Collect the imports of a list of using directives
    #[must_use]
    pub fn from_usings(usings: &[&UsingDirective]) -> Self {
        let mut imports = Imports::default();
        for using in usings {
            if let Some(alias) = &using.alias {
                imports.aliases.push((alias.text.clone(), using.name.clone()));
            } else if using.is_static {
                imports.static_types.push(using.name.clone());
            } else if let Some(name) = dotted(&using.name) {
                imports.namespaces.push(name);
            }
        }
        imports
    }
}

/// Dotted name of a non-generic named type syntax
fn dotted(syntax: &TypeSyntax) -> Option<String> {
    match &syntax.kind {
        TypeSyntaxKind::Named(segments) => Some(
            segments
                .iter()
                .map(|s| s.name.text.as_str())
                .collect::<Vec<_>>()
                .join("."),
        ),
        _ => None,
    }
}

/// Metadata name of `name` with `arity` generic parameters
fn with_arity(name: &str, arity: usize) -> String {
    if arity == 0 {
        name.to_string()
    } else {
        format!("{}`{}", name, arity)
    }
}

/// Name resolution context for type syntax
#[derive(Debug, Clone, Default)]
pub struct TypeScope {
    /// Enclosing namespace, empty for the global namespace
    pub namespace: String,
    /// Using directives in force
    pub imports: Imports,
    /// Enclosing type definitions, outermost first
    pub enclosing: Vec<DefId>,
    /// Generic parameters of enclosing methods and local functions
    pub type_params: Vec<String>,
}

impl TypeScope {
    /// A scope for the members of `def`, nested inside `self`
    #[must_use]
    pub fn nested(&self, def: DefId) -> TypeScope {
        let mut scope = self.clone();
        scope.enclosing.push(def);
        scope
    }

    /// A scope with additional generic parameters
    #[must_use]
    pub fn with_type_params<'a>(&self, params: impl IntoIterator<Item = &'a str>) -> TypeScope {
        let mut scope = self.clone();
        scope
            .type_params
            .extend(params.into_iter().map(ToString::to_string));
        scope
    }

    /// True if `name` is a generic parameter in scope
    #[must_use]
    pub fn is_type_param(&self, registry: &TypeRegistry, name: &str) -> bool {
        self.type_params.iter().any(|p| p == name)
            || self
                .enclosing
                .iter()
                .any(|def| registry.def(*def).generics.iter().any(|g| g == name))
    }

    /// Resolve type syntax; unknown names resolve to [`Ty::Error`]
    #[must_use]
    pub fn resolve(&self, registry: &TypeRegistry, syntax: &TypeSyntax) -> Ty {
        match &syntax.kind {
            TypeSyntaxKind::Predefined(keyword) => WellKnown::from_keyword(keyword)
                .map_or(Ty::Error, |which| registry.well_known_ty(which)),
            TypeSyntaxKind::Named(segments) => self
                .resolve_segments(registry, segments)
                .unwrap_or(Ty::Error),
            TypeSyntaxKind::Array { elem, rank } => Ty::Array {
                elem: Box::new(self.resolve(registry, elem)),
                rank: *rank,
            },
            TypeSyntaxKind::Nullable(inner) => {
                let inner = self.resolve(registry, inner);
                if registry.is_value_type(&inner) && registry.nullable_underlying(&inner).is_none()
                {
                    registry.well_known_generic(WellKnown::Nullable, vec![inner])
                } else {
                    inner
                }
            }
            TypeSyntaxKind::Tuple(elements) => {
                let args: Vec<Ty> = elements.iter().map(|e| self.resolve(registry, e)).collect();
                registry
                    .lookup(&with_arity("System.ValueTuple", args.len()))
                    .map_or(Ty::Error, |def| Ty::generic(def, args))
            }
        }
    }

    /// Resolve a simple type name with the given number of generic arguments
    #[must_use]
    pub fn resolve_simple(&self, registry: &TypeRegistry, name: &str, arity: usize) -> Option<Ty> {
        if arity == 0 && self.is_type_param(registry, name) {
            return Some(Ty::Param(name.to_string()));
        }
        self.lookup_simple(registry, name, arity).map(Ty::named)
    }

    fn lookup_simple(&self, registry: &TypeRegistry, name: &str, arity: usize) -> Option<DefId> {
        let simple = with_arity(name, arity);

        for outer in self.enclosing.iter().rev() {
            let mut owners = vec![Ty::named(*outer)];
            owners.extend(registry.base_chain(&Ty::named(*outer)));
            for owner in owners {
                let Some(def) = owner.def() else { continue };
                let nested = format!("{}+{}", registry.metadata_name(def), simple);
                if let Some(found) = registry.lookup(&nested) {
                    return Some(found);
                }
            }
        }

        let mut namespace = self.namespace.as_str();
        loop {
            let candidate = if namespace.is_empty() {
                simple.clone()
            } else {
                format!("{}.{}", namespace, simple)
            };
            if let Some(found) = registry.lookup(&candidate) {
                return Some(found);
            }
            if namespace.is_empty() {
                break;
            }
            namespace = namespace.rfind('.').map_or("", |dot| &namespace[..dot]);
        }

        if arity == 0 {
            if let Some((_, target)) = self.imports.aliases.iter().find(|(a, _)| a == name) {
                return TypeScope::default().resolve(registry, target).def();
            }
        }

        for namespace in &self.imports.namespaces {
            if let Some(found) = registry.lookup(&format!("{}.{}", namespace, simple)) {
                return Some(found);
            }
        }

        for target in &self.imports.static_types {
            if let Some(def) = TypeScope::default().resolve(registry, target).def() {
                let nested = format!("{}+{}", registry.metadata_name(def), simple);
                if let Some(found) = registry.lookup(&nested) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// The namespace an alias or a dotted prefix names, if any
    #[must_use]
    pub fn resolve_namespace(&self, registry: &TypeRegistry, name: &str) -> Option<String> {
        if let Some((_, target)) = self.imports.aliases.iter().find(|(a, _)| a == name) {
            return dotted(target).filter(|ns| registry.is_namespace(ns));
        }
        if registry.is_namespace(name) {
            return Some(name.to_string());
        }
        // namespaces are also found relative to the enclosing namespace
        let mut namespace = self.namespace.as_str();
        while !namespace.is_empty() {
            let candidate = format!("{}.{}", namespace, name);
            if registry.is_namespace(&candidate) {
                return Some(candidate);
            }
            namespace = namespace.rfind('.').map_or("", |dot| &namespace[..dot]);
        }
        None
    }

    /// Resolve the member type named `name` inside `namespace`
    #[must_use]
    pub fn lookup_in_namespace(
        registry: &TypeRegistry,
        namespace: &str,
        name: &str,
        arity: usize,
    ) -> Option<DefId> {
        registry.lookup(&format!("{}.{}", namespace, with_arity(name, arity)))
    }

    /// Resolve the nested type `name` of `outer`
    #[must_use]
    pub fn lookup_nested(
        registry: &TypeRegistry,
        outer: DefId,
        name: &str,
        arity: usize,
    ) -> Option<DefId> {
        registry.lookup(&format!(
            "{}+{}",
            registry.metadata_name(outer),
            with_arity(name, arity)
        ))
    }

    fn resolve_segments(&self, registry: &TypeRegistry, segments: &[NameSegment]) -> Option<Ty> {
        let (first, rest) = segments.split_first()?;
        let args = |segment: &NameSegment| -> Vec<Ty> {
            segment.args.iter().map(|a| self.resolve(registry, a)).collect()
        };

        // leading type, then nested types
        if let Some(head) = self.resolve_simple(registry, &first.name.text, first.args.len()) {
            let mut current = match head {
                Ty::Named { def, .. } => Ty::generic(def, args(first)),
                other => other,
            };
            for segment in rest {
                let outer = current.def()?;
                let arity = segment.args.len();
                let nested = Self::lookup_nested(registry, outer, &segment.name.text, arity)?;
                current = Ty::generic(nested, args(segment));
            }
            return Some(current);
        }

        // namespace prefix followed by a type and nested types
        let mut namespace = self.resolve_namespace(registry, &first.name.text)?;
        for (index, segment) in rest.iter().enumerate() {
            let arity = segment.args.len();
            if let Some(def) =
                Self::lookup_in_namespace(registry, &namespace, &segment.name.text, arity)
            {
                let mut current = Ty::generic(def, args(segment));
                for nested in &rest[index + 1..] {
                    let outer = current.def()?;
                    let arity = nested.args.len();
                    let inner = Self::lookup_nested(registry, outer, &nested.name.text, arity)?;
                    current = Ty::generic(inner, args(nested));
                }
                return Some(current);
            }
            namespace = format!("{}.{}", namespace, segment.name.text);
        }
        None
    }
}
