//! Shared fixtures for unit tests: compiling snippets against the catalog and locating nodes.

use crate::{
    config::AnalyzerConfig,
    host::{
        catalog,
        semantic::Compilation,
        syntax::{
            visit::{walk_expr, walk_unit, Visitor},
            Expr, TypeDecl,
        },
        types::TypeRegistry,
    },
    query,
};

const USINGS: &str = "using System;
using System.Collections;
using System.Collections.Generic;
using System.IO;
using System.Threading.Tasks;
using NUnit.Framework;
using NUnit.Framework.Constraints;
using NUnit.Framework.Legacy;
";

// Helper function to get a copy of the catalog registry
pub fn catalog_registry() -> TypeRegistry {
    match catalog::registry() {
        Ok(registry) => registry,
        Err(e) => panic!("catalog failed to build: {}", e),
    }
}

// Helper function to wrap test statements into a fixture with a few helper members
pub fn fixture(body: &str) -> String {
    format!(
        "{}
public class Fixture
{{
    private static void M(object? value) {{ }}
    private static int GetValue() => 42;

    [Test]
    public void Test()
    {{
        {}
    }}
}}
",
        USINGS, body
    )
}

// Helper function to prepend the usual usings to a source snippet
pub fn with_usings(source: &str) -> String {
    format!("{}\n{}", USINGS, source)
}

// Helper function to compile a single source with the default configuration
pub fn compile(source: &str) -> Compilation {
    compile_with(source, AnalyzerConfig::default())
}

// Helper function to compile a single source with `config`
pub fn compile_with(source: &str, config: AnalyzerConfig) -> Compilation {
    match Compilation::new([("Test.cs", source)], config) {
        Ok(compilation) => compilation,
        Err(e) => panic!("failed to compile test source: {}\n{}", e, source),
    }
}

// Helper function to find all invocations of a method named `name` in the first tree
pub fn find_invocations<'c>(compilation: &'c Compilation, name: &str) -> Vec<&'c Expr> {
    query::invocations(compilation.tree(0).root())
        .into_iter()
        .filter(|e| e.invoked_name() == Some(name))
        .collect()
}

// Helper function to find the first invocation of a method named `name`
pub fn find_invocation<'c>(compilation: &'c Compilation, name: &str) -> &'c Expr {
    match find_invocations(compilation, name).first() {
        Some(expr) => expr,
        None => panic!("no invocation of {}", name),
    }
}

// Helper function to find the first expression whose source text is exactly `text`
pub fn find_expr<'c>(compilation: &'c Compilation, text: &str) -> &'c Expr {
    struct Finder<'a, 't> {
        tree: &'t crate::host::syntax::SyntaxTree,
        text: &'t str,
        found: Option<&'a Expr>,
    }

    impl<'a> Visitor<'a> for Finder<'a, '_> {
        fn visit_expr(&mut self, expr: &'a Expr) {
            if self.found.is_none() && self.tree.text_of(expr.span) == self.text {
                self.found = Some(expr);
            }
            walk_expr(self, expr);
        }
    }

    let tree = compilation.tree(0);
    let mut finder = Finder {
        tree,
        text,
        found: None,
    };
    walk_unit(&mut finder, tree.root());
    match finder.found {
        Some(expr) => expr,
        None => panic!("no expression '{}'", text),
    }
}

// Helper function to find a type declaration by simple name
pub fn find_class<'c>(compilation: &'c Compilation, name: &str) -> &'c TypeDecl {
    match compilation
        .tree(0)
        .root()
        .types()
        .into_iter()
        .find(|t| t.name.is(name))
    {
        Some(decl) => decl,
        None => panic!("no type {}", name),
    }
}
