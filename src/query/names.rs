//! Metadata names of framework types, members and parameters the analyzers match on.

/// Namespace of the constraint model and the NUnit 3 classic model
pub const NUNIT_FRAMEWORK: &str = "NUnit.Framework";
/// Namespace of the NUnit 4 classic model
pub const NUNIT_LEGACY: &str = "NUnit.Framework.Legacy";

/// Base class of every constraint
pub const CONSTRAINT: &str = "NUnit.Framework.Constraints.Constraint";
/// Interface accepted by `Assert.That`
pub const RESOLVE_CONSTRAINT: &str = "NUnit.Framework.Constraints.IResolveConstraint";

/// `[Test]`
pub const TEST_ATTRIBUTE: &str = "NUnit.Framework.TestAttribute";
/// `[TestCase]`
pub const TEST_CASE_ATTRIBUTE: &str = "NUnit.Framework.TestCaseAttribute";
/// `[TestCaseSource]`
pub const TEST_CASE_SOURCE_ATTRIBUTE: &str = "NUnit.Framework.TestCaseSourceAttribute";
/// `[ValueSource]`
pub const VALUE_SOURCE_ATTRIBUTE: &str = "NUnit.Framework.ValueSourceAttribute";
/// `[SetUp]`
pub const SETUP_ATTRIBUTE: &str = "NUnit.Framework.SetUpAttribute";
/// `[TearDown]`
pub const TEARDOWN_ATTRIBUTE: &str = "NUnit.Framework.TearDownAttribute";
/// `[OneTimeSetUp]`, also the base of the legacy `[TestFixtureSetUp]`
pub const ONE_TIME_SETUP_ATTRIBUTE: &str = "NUnit.Framework.OneTimeSetUpAttribute";
/// `[OneTimeTearDown]`, also the base of the legacy `[TestFixtureTearDown]`
pub const ONE_TIME_TEARDOWN_ATTRIBUTE: &str = "NUnit.Framework.OneTimeTearDownAttribute";
/// `[FixtureLifeCycle]`
pub const FIXTURE_LIFE_CYCLE_ATTRIBUTE: &str = "NUnit.Framework.FixtureLifeCycleAttribute";
/// The enum member selecting one fixture instance per test case
pub const INSTANCE_PER_TEST_CASE: &str = "InstancePerTestCase";

/// Parameter holding the expected value of a constraint method
pub const EXPECTED_PARAMETER: &str = "expected";
/// Parameter holding the assertion message
pub const MESSAGE_PARAMETER: &str = "message";
/// Parameter holding the format arguments of the assertion message
pub const ARGS_PARAMETER: &str = "args";

/// Disposable types that never need disposing
pub const DISPOSAL_EXCLUSIONS: [&str; 4] = [
    "System.Threading.Tasks.Task",
    "System.Threading.Tasks.Task`1",
    "System.IO.MemoryStream",
    "System.IO.StringReader",
];

/// Prefix of the task awaitables returned by `ConfigureAwait`
pub const CONFIGURED_AWAITABLE_PREFIX: &str = "System.Runtime.CompilerServices.Configured";
