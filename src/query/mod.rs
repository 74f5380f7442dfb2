//! Typed-tree query layer.
//!
//! Thin, side-effect-free predicates and lookups over the host's syntax trees, semantic models
//! and type registry. Everything the rules, the constraint model, the lifecycle analyzer and the
//! fixes need to ask about a program goes through here: full-name matching, disposability,
//! constraint-ness, awaitable unwrapping, recognition of assertion invocations and attribute
//! lookups that follow method overrides.
//!
//! # Key Components
//!
//! - [`TreeContext`] - One tree with its semantic model and the registry
//! - [`AssertInvocation`] - A recognized call on one of the assertion classes
//! - [`names`] - Metadata names matched on
//!
//! # Examples
//!
//! ```rust
//! use assertscope::{query::{self, TreeContext}, Compilation};
//!
//! let compilation = Compilation::from_source(
//!     "Tests.cs",
//!     "using NUnit.Framework; class T { public void M() { Assert.IsTrue(true); } }",
//! )?;
//! let cx = TreeContext::new(&compilation, 0);
//! let call = query::invocations(cx.tree.root())[0];
//! let assert = query::assert_invocation(&cx, call).unwrap();
//! assert_eq!(assert.method, "IsTrue");
//! # Ok::<(), assertscope::Error>(())
//! ```

pub mod names;

use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::host::{
    semantic::{CallInfo, Compilation, SemanticModel, Symbol},
    syntax::{
        visit::{walk_expr, walk_unit, Visitor},
        Argument, ArgumentList, CompilationUnit, Expr, ExprKind, Ident, Literal, Modifiers, Span,
        SyntaxTree,
    },
    types::{
        classify_conversion, Conversion, MemberDef, MemberKind, MemberRef, Ty, TypeRegistry,
        WellKnown,
    },
};

/// A syntax tree together with its semantic model and the compilation's registry
#[derive(Clone, Copy)]
pub struct TreeContext<'c> {
    /// Index of the tree in the compilation
    pub index: usize,
    /// The tree
    pub tree: &'c SyntaxTree,
    /// Semantic model of the tree
    pub model: &'c SemanticModel,
    /// Type registry of the compilation
    pub registry: &'c TypeRegistry,
}

impl<'c> TreeContext<'c> {
    /// Context for tree `index` of `compilation`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range.
    #[must_use]
    pub fn new(compilation: &'c Compilation, index: usize) -> Self {
        TreeContext {
            index,
            tree: compilation.tree(index),
            model: compilation.model(index),
            registry: compilation.registry(),
        }
    }

    /// Source text of `span`
    #[must_use]
    pub fn text(&self, span: Span) -> &'c str {
        self.tree.text_of(span)
    }

    /// Type of `expr`; [`Ty::Error`] if unknown
    #[must_use]
    pub fn type_of(&self, expr: &Expr) -> &'c Ty {
        self.model.type_of(expr)
    }

    /// Symbol `expr` refers to
    #[must_use]
    pub fn symbol_of(&self, expr: &Expr) -> Option<&'c Symbol> {
        self.model.symbol_of(expr)
    }

    /// Resolved target of an invocation or object creation
    #[must_use]
    pub fn call_of(&self, expr: &Expr) -> Option<&'c CallInfo> {
        self.model.call_of(expr)
    }

    /// The member definition behind a member reference
    #[must_use]
    pub fn member(&self, member: &MemberRef) -> &'c MemberDef {
        self.registry.member(member)
    }

    /// Metadata name of the definition declaring `member`
    #[must_use]
    pub fn owner_name(&self, member: &MemberRef) -> Option<String> {
        member.owner.def().map(|def| self.registry.metadata_name(def))
    }
}

/// True if `ty` is the type with metadata name `name`
#[must_use]
pub fn is_type(registry: &TypeRegistry, ty: &Ty, name: &str) -> bool {
    ty.def().is_some_and(|def| registry.metadata_name(def) == name)
}

/// True if `ty` is one of the types named in `names`
#[must_use]
pub fn is_any_type(registry: &TypeRegistry, ty: &Ty, names: &[&str]) -> bool {
    ty.def().is_some_and(|def| {
        let name = registry.metadata_name(def);
        names.iter().any(|n| *n == name)
    })
}

/// True if `ty` implements `IDisposable` or `IAsyncDisposable`
#[must_use]
pub fn is_disposable(registry: &TypeRegistry, ty: &Ty) -> bool {
    [WellKnown::IDisposable, WellKnown::IAsyncDisposable]
        .into_iter()
        .filter_map(|which| registry.well_known(which))
        .any(|def| registry.is_subtype_of(ty, def))
}

/// True if a value of type `ty` needs disposing: it is disposable and not one of the types
/// known to hold no unmanaged resources
#[must_use]
pub fn needs_disposal(registry: &TypeRegistry, ty: &Ty) -> bool {
    is_disposable(registry, ty) && !is_any_type(registry, ty, &names::DISPOSAL_EXCLUSIONS)
}

/// True if `ty` is or derives from the constraint base class
#[must_use]
pub fn is_constraint(registry: &TypeRegistry, ty: &Ty) -> bool {
    registry.is_subtype_of_name(ty, names::CONSTRAINT)
}

/// Result type of awaiting a value of type `ty`, or `None` if `ty` is not awaitable.
///
/// `Task` and `ValueTask` produce `void`; their generic forms and the `ConfigureAwait`
/// awaitables produce their type argument.
#[must_use]
pub fn awaited_type(registry: &TypeRegistry, ty: &Ty) -> Option<Ty> {
    if registry.is_well_known(ty, WellKnown::Task)
        || registry.is_well_known(ty, WellKnown::ValueTask)
    {
        return Some(registry.well_known_ty(WellKnown::Void));
    }
    if registry.is_well_known(ty, WellKnown::TaskOfT)
        || registry.is_well_known(ty, WellKnown::ValueTaskOfT)
    {
        return ty.args().first().cloned();
    }
    let name = registry.metadata_name(ty.def()?);
    let rest = name.strip_prefix(names::CONFIGURED_AWAITABLE_PREFIX)?;
    if rest.ends_with("`1") {
        ty.args().first().cloned()
    } else {
        Some(registry.well_known_ty(WellKnown::Void))
    }
}

/// `ty` with one level of task-like wrapping removed; non-awaitable types are returned as is
#[must_use]
pub fn unwrap_task(registry: &TypeRegistry, ty: &Ty) -> Ty {
    awaited_type(registry, ty).unwrap_or_else(|| ty.clone())
}

/// True if `ty` implements `IEquatable<T>` for a `T` that `other` converts to implicitly
#[must_use]
pub fn implements_equatable_of(registry: &TypeRegistry, ty: &Ty, other: &Ty) -> bool {
    let Some(equatable) = registry.well_known(WellKnown::IEquatable) else {
        return false;
    };
    registry
        .supertypes(ty)
        .into_iter()
        .chain(std::iter::once(ty.clone()))
        .filter(|t| t.def() == Some(equatable))
        .filter_map(|t| t.args().first().cloned())
        .any(|arg| {
            let conversion = classify_conversion(registry, other, &arg);
            conversion.is_identity() || conversion == Conversion::ImplicitReference
        })
}

/// True if `member` carries an attribute deriving from `attribute`, either directly or on a
/// method it overrides further up the base chain of `owner`
#[must_use]
pub fn has_attribute_inherited(
    registry: &TypeRegistry,
    owner: &Ty,
    member: &MemberDef,
    attribute: &str,
) -> bool {
    if has_attribute_derived(registry, &member.attributes, attribute) {
        return true;
    }
    if !member.modifiers.contains(Modifiers::OVERRIDE) {
        return false;
    }
    registry.base_chain(owner).iter().any(|base| {
        let Some(def) = base.def() else { return false };
        registry.def(def).members.iter().any(|m| {
            m.kind == member.kind
                && m.name == member.name
                && m.params.len() == member.params.len()
                && has_attribute_derived(registry, &m.attributes, attribute)
        })
    })
}

/// True if any of `applied` names `attribute` or a class derived from it
#[must_use]
pub fn has_attribute_derived(registry: &TypeRegistry, applied: &[String], attribute: &str) -> bool {
    applied.iter().any(|name| {
        name == attribute
            || registry
                .lookup(name)
                .is_some_and(|def| registry.is_subtype_of_name(&Ty::named(def), attribute))
    })
}

/// Every invocation expression of a compilation unit, in source order
#[must_use]
pub fn invocations(unit: &CompilationUnit) -> Vec<&Expr> {
    struct Invocations<'a>(Vec<&'a Expr>);

    impl<'a> Visitor<'a> for Invocations<'a> {
        fn visit_expr(&mut self, expr: &'a Expr) {
            if matches!(expr.kind, ExprKind::Invocation { .. }) {
                self.0.push(expr);
            }
            walk_expr(self, expr);
        }
    }

    let mut found = Invocations(Vec::new());
    walk_unit(&mut found, unit);
    found.0
}

/// True for `""`, `string.Empty` and `String.Empty`
#[must_use]
pub fn is_empty_string_sentinel(cx: &TreeContext<'_>, expr: &Expr) -> bool {
    let expr = expr.unparenthesized();
    match &expr.kind {
        ExprKind::Literal(Literal::String { value, .. }) => value.is_empty(),
        ExprKind::MemberAccess { name, .. } if name.is("Empty") => cx
            .symbol_of(expr)
            .and_then(Symbol::member)
            .is_some_and(|m| {
                cx.registry.is_well_known(&m.owner, WellKnown::String)
                    && cx.member(m).kind == MemberKind::Field
            }),
        _ => false,
    }
}

/// The assertion classes whose calls the rules recognize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumString, EnumIter)]
#[allow(missing_docs)]
pub enum AssertClass {
    Assert,
    ClassicAssert,
    StringAssert,
    CollectionAssert,
    Assume,
    Warn,
}

impl AssertClass {
    /// The class with metadata name `name`, in either the framework or the legacy namespace
    #[must_use]
    pub fn from_metadata_name(name: &str) -> Option<(AssertClass, bool)> {
        let (namespace, simple) = name.rsplit_once('.')?;
        let legacy = match namespace {
            names::NUNIT_FRAMEWORK => false,
            names::NUNIT_LEGACY => true,
            _ => return None,
        };
        AssertClass::iter()
            .find(|class| class.as_ref() == simple)
            .map(|class| (class, legacy))
    }

    /// True for the classes carrying the classic model: `ClassicAssert`, `StringAssert`,
    /// `CollectionAssert` and (for NUnit 3) `Assert`
    #[must_use]
    pub fn has_classic_model(self) -> bool {
        matches!(
            self,
            AssertClass::Assert
                | AssertClass::ClassicAssert
                | AssertClass::StringAssert
                | AssertClass::CollectionAssert
        )
    }
}

/// A resolved invocation of a method on one of the assertion classes
#[derive(Debug, Clone, Copy)]
pub struct AssertInvocation<'c> {
    /// The invocation expression
    pub expr: &'c Expr,
    /// The invoked member access
    pub callee: &'c Expr,
    /// Name of the invoked method as written
    pub name: &'c Ident,
    /// Arguments
    pub args: &'c ArgumentList,
    /// Selected overload
    pub call: &'c CallInfo,
    /// Class declaring the method
    pub class: AssertClass,
    /// The class lives in the legacy namespace
    pub is_legacy: bool,
    /// Method name
    pub method: &'c str,
}

impl<'c> AssertInvocation<'c> {
    /// True if this is `class.method`
    #[must_use]
    pub fn is(&self, class: AssertClass, method: &str) -> bool {
        self.class == class && self.method == method
    }

    /// The first argument bound to the parameter named `param`
    #[must_use]
    pub fn argument(&self, param: &str) -> Option<&'c Argument> {
        self.call
            .argument_named(param)
            .and_then(|i| self.args.args.get(i))
    }

    /// All arguments bound to the parameter named `param`, in source order
    #[must_use]
    pub fn arguments(&self, param: &str) -> Vec<&'c Argument> {
        match self.call.param_named(param) {
            Some(p) => self
                .call
                .arguments_for(p)
                .into_iter()
                .filter_map(|i| self.args.args.get(i))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Pairs of parameter name and argument, in source order; arguments the binder could not
    /// map are skipped
    #[must_use]
    pub fn named_arguments(&self) -> Vec<(&'c str, &'c Argument)> {
        self.args
            .args
            .iter()
            .zip(&self.call.arg_params)
            .filter_map(|(arg, param)| {
                let name = self.call.param_names.get((*param)?)?;
                Some((name.as_str(), arg))
            })
            .collect()
    }

    /// True if the selected overload has a parameter named `param`
    #[must_use]
    pub fn has_param(&self, param: &str) -> bool {
        self.call.param_named(param).is_some()
    }
}

/// Recognize `expr` as a resolved call on an assertion class
#[must_use]
pub fn assert_invocation<'c>(cx: &TreeContext<'c>, expr: &'c Expr) -> Option<AssertInvocation<'c>> {
    let ExprKind::Invocation { callee, args } = &expr.kind else {
        return None;
    };
    let name = callee.member_name()?;
    let call = cx.call_of(expr)?;
    let owner = cx.owner_name(&call.method)?;
    let (class, is_legacy) = AssertClass::from_metadata_name(&owner)?;
    Some(AssertInvocation {
        expr,
        callee,
        name,
        args,
        call,
        class,
        is_legacy,
        method: cx.member(&call.method).name.as_str(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{compile, find_invocation, fixture};

    #[test]
    fn test_disposable_and_exclusions() {
        let compilation = compile(&fixture(""));
        let registry = compilation.registry();
        let stream = registry.lookup("System.IO.FileStream").map(Ty::named).unwrap();
        let memory = registry.lookup("System.IO.MemoryStream").map(Ty::named).unwrap();
        let task = registry.well_known_ty(WellKnown::Task);
        assert!(is_disposable(registry, &stream));
        assert!(needs_disposal(registry, &stream));
        assert!(is_disposable(registry, &memory));
        assert!(!needs_disposal(registry, &memory));
        assert!(!needs_disposal(registry, &task));
        assert!(!is_disposable(registry, &registry.well_known_ty(WellKnown::String)));
    }

    #[test]
    fn test_awaited_type() {
        let compilation = compile(&fixture(""));
        let registry = compilation.registry();
        let int = registry.well_known_ty(WellKnown::Int32);
        let task_of_int = registry.well_known_generic(WellKnown::TaskOfT, vec![int.clone()]);
        assert_eq!(awaited_type(registry, &task_of_int), Some(int.clone()));
        assert_eq!(
            awaited_type(registry, &registry.well_known_ty(WellKnown::Task)),
            Some(registry.well_known_ty(WellKnown::Void))
        );
        assert_eq!(awaited_type(registry, &int), None);
        assert_eq!(unwrap_task(registry, &int), int);
    }

    #[test]
    fn test_assert_invocation_in_both_namespaces() {
        let compilation = compile(&fixture(
            "Assert.That(1, Is.EqualTo(1)); ClassicAssert.AreEqual(1, 2, \"m\"); \
             StringAssert.Contains(\"a\", \"b\");",
        ));
        let cx = TreeContext::new(&compilation, 0);

        let that = assert_invocation(&cx, find_invocation(&compilation, "That")).unwrap();
        assert!(that.is(AssertClass::Assert, "That"));
        assert!(!that.is_legacy);
        assert!(that.has_param("expression"));

        let are_equal = assert_invocation(&cx, find_invocation(&compilation, "AreEqual")).unwrap();
        assert!(are_equal.is(AssertClass::ClassicAssert, "AreEqual"));
        assert!(are_equal.is_legacy);
        assert_eq!(cx.text(are_equal.argument("actual").unwrap().span), "2");
        assert_eq!(cx.text(are_equal.argument("message").unwrap().span), "\"m\"");
        assert_eq!(
            are_equal
                .named_arguments()
                .iter()
                .map(|(name, _)| *name)
                .collect::<Vec<_>>(),
            vec!["expected", "actual", "message"]
        );

        let contains = assert_invocation(&cx, find_invocation(&compilation, "Contains")).unwrap();
        assert_eq!(contains.class, AssertClass::StringAssert);
        assert!(contains.class.has_classic_model());
    }

    #[test]
    fn test_constraint_types() {
        let compilation = compile(&fixture("var c = Is.EqualTo(1).IgnoreCase; var e = Is.Not;"));
        let registry = compilation.registry();
        let equal = registry
            .lookup("NUnit.Framework.Constraints.EqualConstraint")
            .map(Ty::named)
            .unwrap();
        let expression = registry
            .lookup("NUnit.Framework.Constraints.ConstraintExpression")
            .map(Ty::named)
            .unwrap();
        assert!(is_constraint(registry, &equal));
        assert!(!is_constraint(registry, &expression));
        assert!(is_type(registry, &equal, "NUnit.Framework.Constraints.EqualConstraint"));
    }

    #[test]
    fn test_empty_string_sentinels() {
        let compilation = compile(&fixture(
            "M(\"\"); M(string.Empty); M(String.Empty); M(\"x\"); M(Empty);",
        ));
        let cx = TreeContext::new(&compilation, 0);
        let sentinels: Vec<bool> = invocations(cx.tree.root())
            .into_iter()
            .filter(|e| e.invoked_name() == Some("M"))
            .map(|e| {
                let ExprKind::Invocation { args, .. } = &e.kind else { unreachable!() };
                is_empty_string_sentinel(&cx, &args.args[0].expr)
            })
            .collect();
        assert_eq!(sentinels, vec![true, true, true, false, false]);
    }

    #[test]
    fn test_attribute_inherited_through_override() {
        let source = "using NUnit.Framework;
            public class Base { [TearDown] public virtual void Clean() { } }
            public class Derived : Base
            {
                public override void Clean() { }
                [TestFixtureTearDown] public void Old() { }
            }";
        let compilation = compile(source);
        let registry = compilation.registry();
        let derived = registry.lookup("Derived").map(Ty::named).unwrap();
        let clean = &registry.members_named(&derived, "Clean")[0];
        assert!(has_attribute_inherited(
            registry,
            &derived,
            registry.member(clean),
            names::TEARDOWN_ATTRIBUTE
        ));
        let old = &registry.members_named(&derived, "Old")[0];
        assert!(has_attribute_inherited(
            registry,
            &derived,
            registry.member(old),
            names::ONE_TIME_TEARDOWN_ATTRIBUTE
        ));
    }
}
