//! Declaration passes: turn type declarations into registry definitions.
//!
//! Declaration runs in three steps over every tree of a compilation. The first adds an empty
//! [`TypeDef`] per declaration so that any type can be referenced by name from anywhere. The
//! second resolves base types and interfaces, which nested-type lookups through base classes
//! depend on. The third resolves members.

use rustc_hash::FxHashMap;

use crate::host::{
    semantic::scope::{Imports, TypeScope},
    syntax::{
        AttributeSyntax, MemberDecl, Modifiers, NamespaceMember, ParamModifier, Parameter, Span,
        SyntaxTree, TypeDecl, TypeDeclKind, UsingDirective,
    },
    types::{
        DefId, MemberDef, MemberKind, ParamDef, Ty, TypeDef, TypeKind, TypeOrigin, TypeRegistry,
        WellKnown,
    },
};

/// A declared type awaiting resolution
#[derive(Debug, Clone)]
pub(crate) struct Declared<'t> {
    /// The definition created for the declaration
    pub def: DefId,
    /// Index of the declaring tree
    pub tree: usize,
    /// The declaration
    pub decl: &'t TypeDecl,
    /// Scope of the declaration's members
    pub scope: TypeScope,
}

/// Add a definition for every type declared in `trees`.
///
/// Trees whose origin is the catalog get [`TypeOrigin::Catalog`]; the others record the tree
/// index and declaration span.
pub(crate) fn declare_types<'t>(
    registry: &mut TypeRegistry,
    trees: &'t [SyntaxTree],
    catalog: bool,
) -> Vec<Declared<'t>> {
    let mut declared = Vec::new();
    for (index, tree) in trees.iter().enumerate() {
        let usings: Vec<&UsingDirective> = tree.root().usings.iter().collect();
        let scope = TypeScope {
            imports: Imports::from_usings(&usings),
            ..TypeScope::default()
        };
        let mut walker = DeclareWalker {
            registry: &mut *registry,
            tree: index,
            catalog,
            declared: &mut declared,
        };
        walker.members(&tree.root().members, &scope, &usings);
    }
    declared
}

struct DeclareWalker<'r, 't> {
    registry: &'r mut TypeRegistry,
    tree: usize,
    catalog: bool,
    declared: &'r mut Vec<Declared<'t>>,
}

impl<'t> DeclareWalker<'_, 't> {
    fn members(
        &mut self,
        members: &'t [NamespaceMember],
        scope: &TypeScope,
        usings: &[&'t UsingDirective],
    ) {
        for member in members {
            match member {
                NamespaceMember::Type(decl) => self.declare(decl, scope),
                NamespaceMember::Namespace(ns) => {
                    let mut inner = usings.to_vec();
                    inner.extend(ns.usings.iter());
                    let namespace = if scope.namespace.is_empty() {
                        ns.name.clone()
                    } else {
                        format!("{}.{}", scope.namespace, ns.name)
                    };
                    let nested = TypeScope {
                        namespace,
                        imports: Imports::from_usings(&inner),
                        ..TypeScope::default()
                    };
                    self.members(&ns.members, &nested, &inner);
                }
            }
        }
    }

    fn declare(&mut self, decl: &'t TypeDecl, scope: &TypeScope) {
        let kind = match decl.kind {
            TypeDeclKind::Class | TypeDeclKind::Record => TypeKind::Class,
            TypeDeclKind::Struct => TypeKind::Struct,
            TypeDeclKind::Interface => TypeKind::Interface,
            TypeDeclKind::Enum => TypeKind::Enum,
            TypeDeclKind::Delegate => TypeKind::Delegate,
        };
        let mut def = TypeDef::new(scope.namespace.clone(), decl.name.text.clone(), kind);
        def.generics = decl.type_params.iter().map(|p| p.text.clone()).collect();
        def.modifiers = decl.modifiers;
        def.outer = scope.enclosing.last().copied();
        def.origin = if self.catalog {
            TypeOrigin::Catalog
        } else {
            TypeOrigin::Source {
                tree: self.tree,
                span: decl.span,
            }
        };
        let id = self.registry.add(def);
        let inner = scope.nested(id);
        self.declared.push(Declared {
            def: id,
            tree: self.tree,
            decl,
            scope: inner.clone(),
        });
        for member in &decl.members {
            if let MemberDecl::Type(nested) = member {
                self.declare(nested, &inner);
            }
        }
    }
}

/// Resolve base types and interfaces of every declared type
pub(crate) fn resolve_bases(registry: &mut TypeRegistry, declared: &[Declared<'_>]) {
    let object = registry.well_known(WellKnown::Object);
    for item in declared {
        let kind = registry.def(item.def).kind;
        let mut base = None;
        let mut interfaces = Vec::new();
        for (index, syntax) in item.decl.bases.iter().enumerate() {
            let ty = item.scope.resolve(registry, syntax);
            if ty.is_error() {
                continue;
            }
            if index == 0
                && kind == TypeKind::Class
                && registry.kind_of(&ty) == Some(TypeKind::Class)
            {
                base = Some(ty);
            } else if registry.is_interface(&ty) {
                interfaces.push(ty);
            }
        }
        let base = match kind {
            TypeKind::Class if base.is_none() && object != Some(item.def) => {
                object.map(Ty::named)
            }
            TypeKind::Class => base,
            TypeKind::Struct => Some(registry.well_known_ty(WellKnown::ValueType)),
            TypeKind::Enum => Some(registry.well_known_ty(WellKnown::Enum)),
            TypeKind::Delegate => Some(registry.well_known_ty(WellKnown::MulticastDelegate)),
            TypeKind::Interface => None,
        };
        let def = registry.def_mut(item.def);
        def.base = base.filter(|b| !b.is_error());
        def.interfaces = interfaces;
    }
}

/// Resolve attributes and members of every declared type and register extension methods
pub(crate) fn resolve_members(
    registry: &mut TypeRegistry,
    trees: &[SyntaxTree],
    declared: &[Declared<'_>],
) {
    for item in declared {
        let tree = &trees[item.tree];
        let decl = item.decl;
        let (attributes, attribute_args) =
            resolve_attributes(registry, &item.scope, tree, &decl.attributes);
        let mut members = Vec::new();

        match decl.kind {
            TypeDeclKind::Enum => {
                for name in &decl.enum_members {
                    let mut member = MemberDef::new(
                        name.text.clone(),
                        MemberKind::EnumMember,
                        Modifiers::PUBLIC | Modifiers::STATIC,
                        Ty::named(item.def),
                    );
                    member.span = Some(name.span);
                    members.push(member);
                }
            }
            TypeDeclKind::Delegate => {
                if let Some((ret, params)) = &decl.delegate {
                    let mut invoke = MemberDef::new(
                        "Invoke",
                        MemberKind::Method,
                        Modifiers::PUBLIC,
                        item.scope.resolve(registry, ret),
                    );
                    invoke.params = resolve_params(registry, &item.scope, params);
                    members.push(invoke);
                }
            }
            _ => {}
        }

        for member in &decl.members {
            match member {
                MemberDecl::Field(field) => {
                    let ty = item.scope.resolve(registry, &field.ty);
                    let (names, _) =
                        resolve_attributes(registry, &item.scope, tree, &field.attributes);
                    for declarator in &field.declarators {
                        let mut def = MemberDef::new(
                            declarator.name.text.clone(),
                            MemberKind::Field,
                            field.modifiers,
                            ty.clone(),
                        );
                        def.attributes = names.clone();
                        def.span = Some(declarator.span);
                        members.push(def);
                    }
                }
                MemberDecl::Property(property) => {
                    let kind = if property.name.is("this") {
                        MemberKind::Indexer
                    } else {
                        MemberKind::Property
                    };
                    let mut def = MemberDef::new(
                        property.name.text.clone(),
                        kind,
                        property.modifiers,
                        item.scope.resolve(registry, &property.ty),
                    );
                    def.params = resolve_params(registry, &item.scope, &property.params);
                    def.attributes =
                        resolve_attributes(registry, &item.scope, tree, &property.attributes).0;
                    def.span = Some(property.span);
                    members.push(def);
                }
                MemberDecl::Method(method) => {
                    let scope = item
                        .scope
                        .with_type_params(method.type_params.iter().map(|p| p.text.as_str()));
                    let (name, kind, ty) = if method.is_constructor {
                        (
                            ".ctor".to_string(),
                            MemberKind::Constructor,
                            registry.well_known_ty(WellKnown::Void),
                        )
                    } else {
                        let ret = method
                            .return_type
                            .as_ref()
                            .map_or(Ty::Error, |r| scope.resolve(registry, r));
                        (method.name.text.clone(), MemberKind::Method, ret)
                    };
                    let mut def = MemberDef::new(name, kind, method.modifiers, ty);
                    def.generics = method.type_params.iter().map(|p| p.text.clone()).collect();
                    def.params = resolve_params(registry, &scope, &method.params);
                    def.attributes =
                        resolve_attributes(registry, &scope, tree, &method.attributes).0;
                    def.is_extension = method.modifiers.contains(Modifiers::STATIC)
                        && method
                            .params
                            .first()
                            .is_some_and(|p| p.modifier == ParamModifier::This);
                    def.span = Some(method.span);
                    members.push(def);
                }
                MemberDecl::Type(_) => {}
            }
        }

        let extensions: Vec<usize> = members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_extension)
            .map(|(i, _)| i)
            .collect();

        let def = registry.def_mut(item.def);
        def.attributes = attributes;
        def.attribute_args = attribute_args;
        def.members = members;
        for index in extensions {
            registry.add_extension(item.def, index);
        }
    }
}

fn resolve_params(
    registry: &TypeRegistry,
    scope: &TypeScope,
    params: &[Parameter],
) -> Vec<ParamDef> {
    params
        .iter()
        .map(|p| ParamDef {
            name: p.name.text.clone(),
            ty: scope.resolve(registry, &p.ty),
            modifier: p.modifier,
            has_default: p.default.is_some(),
        })
        .collect()
}

/// Metadata names of attributes, trying the `Attribute` suffix first. Unresolved attributes
/// keep their written name with the suffix added so that lookups by simple name still work.
fn resolve_attributes(
    registry: &TypeRegistry,
    scope: &TypeScope,
    tree: &SyntaxTree,
    attributes: &[AttributeSyntax],
) -> (Vec<String>, Vec<(String, Vec<String>)>) {
    let mut names = Vec::with_capacity(attributes.len());
    let mut args = Vec::new();
    for attribute in attributes {
        let name = attribute_name(registry, scope, attribute);
        if let Some(list) = &attribute.args {
            args.push((
                name.clone(),
                list.args
                    .iter()
                    .map(|a| tree.text_of(a.span).to_string())
                    .collect(),
            ));
        }
        names.push(name);
    }
    (names, args)
}

/// Metadata name of the attribute class applied by `attribute`
pub(crate) fn attribute_name(
    registry: &TypeRegistry,
    scope: &TypeScope,
    attribute: &AttributeSyntax,
) -> String {
    let short = attribute.short_name();
    let mut suffixed = attribute.name.clone();
    if let crate::host::syntax::TypeSyntaxKind::Named(segments) = &mut suffixed.kind {
        if let Some(last) = segments.last_mut() {
            if !last.name.text.ends_with("Attribute") {
                last.name.text.push_str("Attribute");
            }
        }
    }
    for candidate in [&suffixed, &attribute.name] {
        if let Some(def) = scope.resolve(registry, candidate).def() {
            return registry.metadata_name(def);
        }
    }
    format!("{}Attribute", short)
}

/// Lookup from declaration sites to definitions
#[derive(Debug, Default, Clone)]
pub(crate) struct DeclarationIndex {
    types: FxHashMap<(usize, Span), DefId>,
}

impl DeclarationIndex {
    pub(crate) fn build(declared: &[Declared<'_>]) -> Self {
        let mut index = DeclarationIndex::default();
        for item in declared {
            index.types.insert((item.tree, item.decl.span), item.def);
        }
        index
    }

    pub(crate) fn type_at(&self, tree: usize, span: Span) -> Option<DefId> {
        self.types.get(&(tree, span)).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn declare(sources: &[&str]) -> TypeRegistry {
        let mut registry = crate::test::catalog_registry();
        let trees: Vec<SyntaxTree> = sources
            .iter()
            .enumerate()
            .map(|(i, s)| SyntaxTree::parse(format!("t{}.cs", i), *s).unwrap())
            .collect();
        let declared = declare_types(&mut registry, &trees, false);
        resolve_bases(&mut registry, &declared);
        resolve_members(&mut registry, &trees, &declared);
        registry
    }

    #[test]
    fn test_nested_types_and_bases() {
        let registry = declare(&[
            "namespace N { using System.IO; class Outer { class Inner : Stream, \
             System.IDisposable { } } }",
        ]);
        let inner = registry.lookup("N.Outer+Inner").unwrap();
        let base = registry.def(inner).base.clone().unwrap();
        assert_eq!(registry.full_name(&base), "System.IO.Stream");
        assert_eq!(registry.def(inner).interfaces.len(), 1);
    }

    #[test]
    fn test_members_resolve_across_trees() {
        let registry = declare(&[
            "namespace A { public class Holder { public B.Item Value; public int? Count { get; } \
             } }",
            "namespace B { public struct Item { } }",
        ]);
        let holder = registry.lookup("A.Holder").unwrap();
        let members = &registry.def(holder).members;
        assert_eq!(registry.display(&members[0].ty), "Item");
        assert_eq!(registry.display(&members[1].ty), "int?");
        assert_eq!(members[1].kind, MemberKind::Property);
    }

    #[test]
    fn test_attributes_and_extensions() {
        let registry = declare(&[
            "using NUnit.Framework;
             [TestFixture] class T { [Test, Category(\"x\")] public void M() { } }
             static class Ext { public static int Twice(this int x) => x * 2; }",
        ]);
        let fixture = registry.lookup("T").unwrap();
        assert!(registry.def(fixture).has_attribute("NUnit.Framework.TestFixtureAttribute"));
        let method = &registry.def(fixture).members[0];
        assert!(method.has_attribute("NUnit.Framework.TestAttribute"));
        assert!(method.has_attribute("NUnit.Framework.CategoryAttribute"));
        assert_eq!(registry.extensions_named("Twice").len(), 1);
    }

    #[test]
    fn test_unknown_attribute_keeps_suffixed_name() {
        let registry = declare(&["class C { [Custom] void M() { } }"]);
        let c = registry.lookup("C").unwrap();
        assert!(registry.def(c).members[0].has_attribute("CustomAttribute"));
    }
}
