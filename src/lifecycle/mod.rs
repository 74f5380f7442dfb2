//! Resource-lifecycle analysis for test fixtures.
//!
//! A fixture that stores a disposable object in a field or property during set-up has to dispose
//! of it during the matching tear-down, otherwise every test run leaks it. The analysis pairs the
//! lifecycle phases of a class:
//!
//! | Assigned in | Must be disposed in |
//! |-------------|---------------------|
//! | initializers and constructors | `[OneTimeTearDown]` (`[TearDown]` if instance per test case) |
//! | `[OneTimeSetUp]` methods | `[OneTimeTearDown]` methods |
//! | `[SetUp]` methods | `[TearDown]` methods |
//! | other public and protected methods | `[TearDown]` methods |
//!
//! Assignments and disposals are found by a flow-insensitive walk over statement blocks, both
//! branches of `if`, every `switch` section and `try`/`finally`, following calls to methods of
//! the same class. Loops are not entered.
//!
//! # Examples
//!
//! ```rust
//! use assertscope::{lifecycle, query::TreeContext, Compilation};
//!
//! let compilation = Compilation::from_source(
//!     "Tests.cs",
//!     "using System.IO; using NUnit.Framework;
//!      public class Tests {
//!          private Stream stream;
//!          [SetUp] public void SetUp() { stream = new FileStream(\"a\", FileMode.Open); }
//!      }",
//! )?;
//! let cx = TreeContext::new(&compilation, 0);
//! let decl = cx.tree.root().types()[0];
//! let def = compilation.declared_type(0, decl).unwrap();
//! let undisposed = lifecycle::undisposed_members(&cx, compilation.config(), decl, def);
//! assert_eq!(undisposed[0].name, "stream");
//! # Ok::<(), assertscope::Error>(())
//! ```

mod assigned;
mod disposed;

use rustc_hash::{FxHashMap, FxHashSet};
use strum::{AsRefStr, Display};

use crate::{
    config::AnalyzerConfig,
    host::{
        semantic::Symbol,
        syntax::{Expr, ExprKind, MemberDecl, MethodDecl, Modifiers, Span, TypeDecl},
        types::{DefId, MemberDef, Ty},
    },
    query::{self, names, TreeContext},
};

/// Kind of a tracked member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum TrackedKind {
    /// An instance or static field
    Field,
    /// An instance or static property
    Property,
}

/// The tear-down phase responsible for a disposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display, AsRefStr)]
pub enum TearDownPhase {
    /// Once after all tests of the fixture
    OneTimeTearDown,
    /// After every test
    TearDown,
}

/// A field or property that receives a disposable value in one phase and is not disposed in the
/// matching tear-down
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndisposedMember {
    /// Member name
    pub name: String,
    /// Field or property
    pub kind: TrackedKind,
    /// Location of the member name in its declaration
    pub span: Span,
    /// The tear-down phase that should dispose of the member
    pub teardown: TearDownPhase,
}

/// Lifecycle role of a method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Constructor,
    OneTimeSetUp,
    OneTimeTearDown,
    SetUp,
    TearDown,
    Other,
    Private,
}

#[derive(Debug, Clone, Copy)]
struct Tracked {
    kind: TrackedKind,
    span: Span,
}

/// One class under analysis: its tracked members and its methods with their definitions
pub(crate) struct FixtureClass<'c> {
    cx: TreeContext<'c>,
    def: DefId,
    tracked: FxHashMap<&'c str, Tracked>,
    methods: Vec<(&'c MethodDecl, Option<&'c MemberDef>)>,
}

impl<'c> FixtureClass<'c> {
    fn new(cx: &TreeContext<'c>, decl: &'c TypeDecl, def: DefId) -> Self {
        let definition = cx.registry.def(def);
        let mut tracked = FxHashMap::default();
        let mut methods = Vec::new();
        for member in &decl.members {
            match member {
                MemberDecl::Field(field) if !field.modifiers.contains(Modifiers::CONST) => {
                    for declarator in &field.declarators {
                        tracked.insert(
                            declarator.name.text.as_str(),
                            Tracked {
                                kind: TrackedKind::Field,
                                span: declarator.name.span,
                            },
                        );
                    }
                }
                MemberDecl::Property(property) if property.params.is_empty() => {
                    tracked.insert(
                        property.name.text.as_str(),
                        Tracked {
                            kind: TrackedKind::Property,
                            span: property.name.span,
                        },
                    );
                }
                MemberDecl::Method(method) => {
                    let member = definition.members.iter().find(|m| m.span == Some(method.span));
                    methods.push((method, member));
                }
                _ => {}
            }
        }
        FixtureClass {
            cx: *cx,
            def,
            tracked,
            methods,
        }
    }

    fn role(&self, method: &MethodDecl, member: Option<&MemberDef>) -> Role {
        if method.is_constructor {
            return Role::Constructor;
        }
        if let Some(member) = member {
            let owner = Ty::named(self.def);
            let has = |attribute: &str| {
                query::has_attribute_inherited(self.cx.registry, &owner, member, attribute)
            };
            if has(names::ONE_TIME_SETUP_ATTRIBUTE) {
                return Role::OneTimeSetUp;
            }
            if has(names::ONE_TIME_TEARDOWN_ATTRIBUTE) {
                return Role::OneTimeTearDown;
            }
            if has(names::SETUP_ATTRIBUTE) {
                return Role::SetUp;
            }
            if has(names::TEARDOWN_ATTRIBUTE) {
                return Role::TearDown;
            }
        }
        if method.modifiers.intersects(Modifiers::PUBLIC | Modifiers::PROTECTED) {
            Role::Other
        } else {
            Role::Private
        }
    }

    fn methods_with(&self, role: Role) -> Vec<&'c MethodDecl> {
        self.methods
            .iter()
            .filter(|(method, member)| self.role(method, *member) == role)
            .map(|(method, _)| *method)
            .collect()
    }

    /// The tracked member `expr` names: `x` or `this.x`, unless `x` is shadowed by a local
    pub(crate) fn tracked_name(&self, expr: &Expr) -> Option<&'c str> {
        let expr = expr.unparenthesized();
        let name = match &expr.kind {
            ExprKind::Name { name, .. } => {
                if self.cx.symbol_of(expr).is_some_and(Symbol::is_variable) {
                    return None;
                }
                name
            }
            ExprKind::MemberAccess { target, name, .. }
                if matches!(target.kind, ExprKind::This) =>
            {
                name
            }
            _ => return None,
        };
        self.tracked
            .get_key_value(name.text.as_str())
            .map(|(key, _)| *key)
    }

    /// The method of this class invoked by `invocation`, if its body is available
    pub(crate) fn local_method(&self, invocation: &Expr) -> Option<&'c MethodDecl> {
        let ExprKind::Invocation { callee, .. } = &invocation.kind else {
            return None;
        };
        let name = match &callee.kind {
            ExprKind::Name { name, .. } => name,
            ExprKind::MemberAccess { target, name, .. }
                if matches!(target.kind, ExprKind::This) =>
            {
                name
            }
            _ => return None,
        };
        if let Some(call) = self.cx.call_of(invocation) {
            if call.method.owner.def() != Some(self.def) {
                return None;
            }
            let span = self.cx.member(&call.method).span;
            return self
                .methods
                .iter()
                .find(|(method, _)| Some(method.span) == span)
                .map(|(method, _)| *method);
        }
        let mut candidates = self
            .methods
            .iter()
            .filter(|(method, _)| !method.is_constructor && method.name.is(&name.text));
        match (candidates.next(), candidates.next()) {
            (Some((method, _)), None) => Some(*method),
            _ => None,
        }
    }

    /// True if `value` produces a new object that the receiving member has to dispose of.
    ///
    /// Calls to `Add*` methods are taken to return an object owned elsewhere.
    pub(crate) fn creates_disposable(&self, value: &Expr) -> bool {
        let value = value.unparenthesized();
        match &value.kind {
            ExprKind::ObjectCreation { .. } => {
                query::needs_disposal(self.cx.registry, self.cx.type_of(value))
            }
            ExprKind::Invocation { .. } => {
                !is_add_call(value)
                    && query::needs_disposal(self.cx.registry, self.cx.type_of(value))
            }
            ExprKind::Await(operand) => {
                let operand = operand.unparenthesized();
                matches!(operand.kind, ExprKind::Invocation { .. })
                    && !is_add_call(operand)
                    && query::awaited_type(self.cx.registry, self.cx.type_of(operand))
                        .is_some_and(|ty| query::needs_disposal(self.cx.registry, &ty))
            }
            _ => false,
        }
    }

    /// Members initialized with a disposable value at their declaration
    fn initialized(&self, decl: &'c TypeDecl) -> FxHashSet<&'c str> {
        let mut initialized = FxHashSet::default();
        for member in &decl.members {
            match member {
                MemberDecl::Field(field) => {
                    for declarator in &field.declarators {
                        let init = declarator.init.as_ref();
                        if init.is_some_and(|init| self.creates_disposable(init)) {
                            initialized.insert(declarator.name.text.as_str());
                        }
                    }
                }
                MemberDecl::Property(property) => {
                    let init = property.initializer.as_ref();
                    if init.is_some_and(|init| self.creates_disposable(init)) {
                        initialized.insert(property.name.text.as_str());
                    }
                }
                _ => {}
            }
        }
        initialized.retain(|name| self.tracked.contains_key(name));
        initialized
    }

    fn is_instance_per_test_case(&self) -> bool {
        self.cx
            .registry
            .def(self.def)
            .attribute_args
            .iter()
            .any(|(attribute, args)| {
                attribute == names::FIXTURE_LIFE_CYCLE_ATTRIBUTE
                    && args.iter().any(|a| a.ends_with(names::INSTANCE_PER_TEST_CASE))
            })
    }
}

fn is_add_call(invocation: &Expr) -> bool {
    invocation
        .invoked_name()
        .is_some_and(|name| name.starts_with("Add"))
}

/// Find the fields and properties of `decl` that are assigned a disposable value without being
/// disposed in the matching tear-down phase.
///
/// Classes that are disposable themselves are skipped. Results are in declaration order and
/// name each member at most once per tear-down phase.
#[must_use]
pub fn undisposed_members<'c>(
    cx: &TreeContext<'c>,
    config: &AnalyzerConfig,
    decl: &'c TypeDecl,
    def: DefId,
) -> Vec<UndisposedMember> {
    if query::is_disposable(cx.registry, &Ty::named(def)) {
        log::trace!("skipping disposable class {}", decl.name.text);
        return Vec::new();
    }

    let class = FixtureClass::new(cx, decl, def);
    if class.tracked.is_empty() {
        return Vec::new();
    }

    let one_time_teardown =
        disposed::disposed_in(&class, config, class.methods_with(Role::OneTimeTearDown));
    let teardown = disposed::disposed_in(&class, config, class.methods_with(Role::TearDown));

    let mut constructed = class.initialized(decl);
    constructed.extend(assigned::assigned_in(&class, class.methods_with(Role::Constructor)));
    let constructed_disposed: FxHashSet<&str> = if class.is_instance_per_test_case() {
        one_time_teardown.union(&teardown).copied().collect()
    } else {
        one_time_teardown.clone()
    };

    let passes = [
        (constructed, &constructed_disposed, TearDownPhase::OneTimeTearDown),
        (
            assigned::assigned_in(&class, class.methods_with(Role::OneTimeSetUp)),
            &one_time_teardown,
            TearDownPhase::OneTimeTearDown,
        ),
        (
            assigned::assigned_in(&class, class.methods_with(Role::SetUp)),
            &teardown,
            TearDownPhase::TearDown,
        ),
        (
            assigned::assigned_in(&class, class.methods_with(Role::Other)),
            &teardown,
            TearDownPhase::TearDown,
        ),
    ];

    let mut seen = FxHashSet::default();
    let mut undisposed = Vec::new();
    for (assigned, disposed, phase) in passes {
        for name in assigned.difference(disposed) {
            if !seen.insert((*name, phase)) {
                continue;
            }
            if let Some(tracked) = class.tracked.get(name) {
                undisposed.push(UndisposedMember {
                    name: (*name).to_string(),
                    kind: tracked.kind,
                    span: tracked.span,
                    teardown: phase,
                });
            }
        }
    }
    undisposed.sort_by_key(|m| (m.span.start, m.teardown));
    undisposed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AnalyzerConfig,
        host::semantic::Compilation,
        test::{compile, compile_with, find_class, with_usings},
    };

    fn undisposed_in(compilation: &Compilation, class: &str) -> Vec<(String, TearDownPhase)> {
        let cx = TreeContext::new(compilation, 0);
        let decl = find_class(compilation, class);
        let def = compilation.declared_type(0, decl).unwrap();
        undisposed_members(&cx, compilation.config(), decl, def)
            .into_iter()
            .map(|m| (m.name, m.teardown))
            .collect()
    }

    fn check(source: &str) -> Vec<(String, TearDownPhase)> {
        let compilation = compile(&with_usings(source));
        undisposed_in(&compilation, "Tests")
    }

    #[test]
    fn test_setup_without_teardown() {
        let found = check(
            "public class Tests
            {
                private Stream stream;
                private Stream other;

                [SetUp]
                public void SetUp()
                {
                    stream = new FileStream(\"a\", FileMode.Open);
                    this.other = File.OpenRead(\"b\");
                }

                [TearDown]
                public void TearDown()
                {
                    stream.Dispose();
                }
            }",
        );
        assert_eq!(found, vec![("other".to_string(), TearDownPhase::TearDown)]);
    }

    #[test]
    fn test_initializer_needs_one_time_teardown() {
        let found = check(
            "public class Tests
            {
                private readonly Stream stream = File.OpenRead(\"a\");
                private readonly MemoryStream memory = new MemoryStream();

                [TearDown]
                public void TearDown() => stream.Dispose();
            }",
        );
        assert_eq!(found, vec![("stream".to_string(), TearDownPhase::OneTimeTearDown)]);
    }

    #[test]
    fn test_instance_per_test_case_accepts_teardown() {
        let found = check(
            "[FixtureLifeCycle(LifeCycle.InstancePerTestCase)]
            public class Tests
            {
                private readonly Stream stream = File.OpenRead(\"a\");

                [TearDown]
                public void TearDown() => stream.Dispose();
            }",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_disposal_forms() {
        let found = check(
            "public class Tests
            {
                private Stream a;
                private Stream b;
                private Stream c;
                private object d;
                private Stream e;

                [OneTimeSetUp]
                public async Task OneTimeSetUp()
                {
                    a = new FileStream(\"a\", FileMode.Open);
                    b = new FileStream(\"b\", FileMode.Open);
                    c = new FileStream(\"c\", FileMode.Open);
                    d = new FileStream(\"d\", FileMode.Open);
                    e = await OpenAsync();
                }

                [OneTimeTearDown]
                public async Task OneTimeTearDown()
                {
                    a?.Dispose();
                    await b.DisposeAsync().ConfigureAwait(false);
                    if (d is IDisposable disposable)
                    {
                        disposable.Dispose();
                    }
                    try { }
                    finally { Release(); }
                }

                private void Release()
                {
                    c.Close();
                    (e as IDisposable)?.Dispose();
                }

                private static Task<Stream> OpenAsync() =>
                    Task.FromResult<Stream>(new MemoryStream());
            }",
        );
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_switch_sections() {
        let found = check(
            "public class Tests
            {
                private int mode;
                private Stream first;
                private Stream second;

                [SetUp]
                public void SetUp()
                {
                    switch (mode)
                    {
                        case 0:
                            first = File.OpenRead(\"a\");
                            break;
                        case 1:
                            second = File.OpenRead(\"b\");
                            break;
                        default:
                            break;
                    }
                }

                [TearDown]
                public void TearDown()
                {
                    switch (mode)
                    {
                        case 0:
                            first.Dispose();
                            break;
                    }
                }
            }",
        );
        assert_eq!(found, vec![("second".to_string(), TearDownPhase::TearDown)]);
    }

    #[test]
    fn test_recursive_disposal_helpers() {
        let found = check(
            "public class Tests
            {
                private Stream direct;
                private Stream indirect;

                [OneTimeSetUp]
                public void Open()
                {
                    direct = File.OpenRead(\"a\");
                    indirect = File.OpenRead(\"b\");
                }

                [OneTimeTearDown]
                public void Shutdown()
                {
                    Release(2);
                    First();
                }

                private void Release(int n)
                {
                    if (n == 0)
                    {
                        direct.Dispose();
                    }
                    else
                    {
                        Release(n - 1);
                    }
                }

                private void First() => Second();

                private void Second()
                {
                    indirect.Dispose();
                    First();
                }
            }",
        );
        assert!(found.is_empty(), "{:?}", found);
    }

    #[test]
    fn test_one_time_setup_requires_one_time_teardown() {
        let found = check(
            "public class Tests
            {
                private Stream stream;

                [TestFixtureSetUp]
                public void Open() { stream = File.OpenRead(\"a\"); }

                [TearDown]
                public void TearDown() { stream.Dispose(); }
            }",
        );
        assert_eq!(found, vec![("stream".to_string(), TearDownPhase::OneTimeTearDown)]);
    }

    #[test]
    fn test_test_methods_and_helpers() {
        let found = check(
            "public class Tests
            {
                private Stream created;
                private Stream added;
                private Stream looped;

                [Test]
                public void Test()
                {
                    if (GetHashCode() > 0)
                    {
                        Create();
                    }
                    added = AddStream(new MemoryStream());
                    while (looped == null)
                    {
                        looped = File.OpenRead(\"a\");
                    }
                }

                private void Create() { created = File.OpenRead(\"a\"); Create(); }

                private Stream AddStream(Stream stream) => File.OpenRead(\"b\");
            }",
        );
        assert_eq!(found, vec![("created".to_string(), TearDownPhase::TearDown)]);
    }

    #[test]
    fn test_excluded_and_shadowed_values() {
        let found = check(
            "public class Tests
            {
                private Task task;
                private Stream stream;

                [SetUp]
                public void SetUp()
                {
                    task = Task.Delay(1);
                    Stream stream = File.OpenRead(\"a\");
                    stream.Dispose();
                }
            }",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_disposable_fixture_is_skipped() {
        let found = check(
            "public class Tests : IDisposable
            {
                private Stream stream;

                [SetUp]
                public void SetUp() { stream = File.OpenRead(\"a\"); }

                public void Dispose() { }
            }",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_additional_dispose_methods() {
        let source = with_usings(
            "public class Tests
            {
                private Stream stream;

                [SetUp]
                public void SetUp() { stream = File.OpenRead(\"a\"); }

                [TearDown]
                public void TearDown() { stream.Flush(); }
            }",
        );
        let compilation = compile(&source);
        assert_eq!(undisposed_in(&compilation, "Tests").len(), 1);

        let config = AnalyzerConfig::new().with_dispose_methods(["Flush"]);
        let compilation = compile_with(&source, config);
        assert!(undisposed_in(&compilation, "Tests").is_empty());
    }
}
