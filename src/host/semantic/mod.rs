//! Declaration and binding of source trees against the framework catalog.
//!
//! A [`Compilation`] is the unit every analysis runs on. Building one parses each source,
//! declares its types on top of a copy of the catalog registry, resolves base types and member
//! signatures and finally binds every member body into a per-tree [`SemanticModel`].
//!
//! # Key Components
//!
//! - [`Compilation`] - Parsed trees, the type registry and the per-tree models
//! - [`SemanticModel`] - Types, symbols and resolved calls of one tree
//! - [`TypeScope`] - Type name resolution context
//!
//! # Examples
//!
//! ```rust
//! use assertscope::Compilation;
//!
//! let compilation = Compilation::from_source(
//!     "Tests.cs",
//!     "using NUnit.Framework; class T { [Test] public void M() { \
//!      Assert.That(1, Is.EqualTo(1)); } }",
//! )?;
//! assert_eq!(compilation.trees().len(), 1);
//! # Ok::<(), assertscope::Error>(())
//! ```

mod binder;
pub(crate) mod declare;
mod model;
mod scope;

use rayon::prelude::*;

use crate::{
    config::AnalyzerConfig,
    host::{
        catalog,
        syntax::{Span, SyntaxTree, TypeDecl},
        types::{DefId, MemberRef, Ty, TypeRegistry},
    },
    Result,
};

pub use model::{AttributeInfo, CallInfo, SemanticModel, Symbol};
pub use scope::{Imports, TypeScope};

use declare::{declare_types, resolve_bases, resolve_members, DeclarationIndex};

/// Parsed and bound source files
#[derive(Debug)]
pub struct Compilation {
    trees: Vec<SyntaxTree>,
    registry: TypeRegistry,
    models: Vec<SemanticModel>,
    index: DeclarationIndex,
    config: AnalyzerConfig,
}

impl Compilation {
    /// Parse, declare and bind `sources`, given as `(path, text)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Syntax`] if any source fails to parse.
    pub fn new<I, P, T>(sources: I, config: AnalyzerConfig) -> Result<Self>
    where
        I: IntoIterator<Item = (P, T)>,
        P: Into<String>,
        T: Into<String>,
    {
        let trees = sources
            .into_iter()
            .map(|(path, text)| SyntaxTree::parse(path, text))
            .collect::<Result<Vec<_>>>()?;

        let mut registry = catalog::registry()?;
        let declared = declare_types(&mut registry, &trees, false);
        resolve_bases(&mut registry, &declared);
        resolve_members(&mut registry, &trees, &declared);
        let index = DeclarationIndex::build(&declared);
        drop(declared);

        let models = trees
            .par_iter()
            .enumerate()
            .map(|(i, tree)| binder::bind_tree(&registry, tree, i, &index))
            .collect();

        log::debug!("compiled {} trees, {} types", trees.len(), registry.len());
        Ok(Compilation {
            trees,
            registry,
            models,
            index,
            config,
        })
    }

    /// Compile a single source with the default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Syntax`] if the source fails to parse.
    pub fn from_source(path: impl Into<String>, text: impl Into<String>) -> Result<Self> {
        Self::new([(path.into(), text.into())], AnalyzerConfig::default())
    }

    /// All syntax trees, in the order the sources were given
    #[must_use]
    pub fn trees(&self) -> &[SyntaxTree] {
        &self.trees
    }

    /// The syntax tree at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn tree(&self, index: usize) -> &SyntaxTree {
        &self.trees[index]
    }

    /// The semantic model of the tree at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn model(&self, index: usize) -> &SemanticModel {
        &self.models[index]
    }

    /// The type registry holding catalog and source types
    #[must_use]
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// The analyzer configuration
    #[must_use]
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// The definition created for a type declaration of tree `tree`
    #[must_use]
    pub fn declared_type(&self, tree: usize, decl: &TypeDecl) -> Option<DefId> {
        self.index.type_at(tree, decl.span)
    }

    /// The member of `def` declared at `span` (a field declarator, property or method span)
    #[must_use]
    pub fn declared_member(&self, def: DefId, span: Span) -> Option<MemberRef> {
        let definition = self.registry.def(def);
        let index = definition
            .members
            .iter()
            .position(|m| m.span == Some(span))?;
        let owner = Ty::generic(
            def,
            definition.generics.iter().map(|g| Ty::Param(g.clone())).collect(),
        );
        Some(MemberRef { owner, index })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::types::MemberKind;

    #[test]
    fn test_syntax_error_is_reported() {
        let result = Compilation::from_source("broken.cs", "class C { void M( }");
        assert!(matches!(result, Err(crate::Error::Syntax { .. })));
    }

    #[test]
    fn test_types_across_trees() {
        let compilation = Compilation::new(
            [
                ("a.cs", "namespace N { public class A { public B Other; } }"),
                (
                    "b.cs",
                    "namespace N { public class B : System.IDisposable { \
                     public void Dispose() { } } }",
                ),
            ],
            AnalyzerConfig::default(),
        )
        .unwrap();
        let registry = compilation.registry();
        let a = registry.lookup("N.A").unwrap();
        let b = registry.lookup("N.B").unwrap();
        let decl = compilation.tree(0).root().types()[0];
        assert_eq!(compilation.declared_type(0, decl), Some(a));
        assert!(registry.is_subtype_of_name(&Ty::named(b), "System.IDisposable"));

        let field = registry.members_named(&Ty::named(a), "Other");
        assert_eq!(registry.member(&field[0]).kind, MemberKind::Field);
        assert_eq!(registry.member_type(&field[0]), Ty::named(b));
    }
}
