//! Fixtures - Test lifecycle and the assertion context
//!
//! A [`TestCase`] supplies identity and test logic. The [`Fixture`] wrapping
//! it owns the per-run state: check counters, the bounded [`ErrorLog`] and
//! the lifecycle [`Phase`]. During a run the test receives a
//! [`TestContext`] that points at exactly that state, so assertions never
//! need to look up the fixture that is executing.
//!
//! # Example
//!
//! ```rust
//! use simpletest::{Fixture, TestCase, TestContext};
//!
//! struct Arithmetic;
//!
//! impl TestCase for Arithmetic {
//!     fn name(&self) -> &str {
//!         "arithmetic"
//!     }
//!
//!     fn run(&mut self, ctx: &mut TestContext<'_>) {
//!         ctx.check_eq(2 + 2, 4);
//!         ctx.check_lt(1, 2);
//!     }
//! }
//!
//! let mut fixture = Fixture::new(Arithmetic);
//! assert!(fixture.execute_test());
//! assert_eq!(fixture.checks_performed(), 2);
//! ```

use std::fmt;
use std::panic::Location;

use tracing::debug;

use crate::error_log::{AppendOutcome, DEFAULT_MESSAGE_SPACE, Entries, ErrorLog};
use crate::format::FormatValue;

/// Group used when a test does not name one.
pub const DEFAULT_GROUP: &str = "Global";

/// The capabilities a test must provide.
///
/// Only [`name`](TestCase::name) and [`run`](TestCase::run) are required.
/// Resources needed by the test live in the implementing type and are
/// created in [`setup`](TestCase::setup) and released in
/// [`tear_down`](TestCase::tear_down).
pub trait TestCase: Send {
    /// Name of the test, unique within its group.
    fn name(&self) -> &str;

    /// Group the test belongs to.
    fn group(&self) -> &str {
        DEFAULT_GROUP
    }

    /// Runs before [`run`](TestCase::run) on every execution.
    fn setup(&mut self, _ctx: &mut TestContext<'_>) {}

    /// The test body. Failed checks are recorded and execution continues.
    fn run(&mut self, ctx: &mut TestContext<'_>);

    /// Runs after [`run`](TestCase::run), whether or not checks failed.
    fn tear_down(&mut self, _ctx: &mut TestContext<'_>) {}
}

/// Stable identity of a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FixtureId {
    group: String,
    name: String,
}

impl FixtureId {
    /// Creates an identifier from a group and a name.
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Group of the fixture.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Name of the fixture, unique within its group.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FixtureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

/// Where a fixture is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    /// Not executing
    #[default]
    Idle,
    /// Inside `setup`
    SettingUp,
    /// Inside `run`
    Running,
    /// Inside `tear_down`
    TearingDown,
}

/// Counters for the most recent run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CheckCounts {
    /// Checks evaluated
    pub performed: u32,
    /// Checks that failed
    pub failed: u32,
}

/// Comparison operators understood by [`TestContext::compare`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
}

impl Comparison {
    /// Operator as written in source.
    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Ne => "!=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
            Comparison::Lt => "<",
            Comparison::Le => "<=",
        }
    }

    /// Operator that held instead when the comparison failed.
    pub fn negated_symbol(&self) -> &'static str {
        match self {
            Comparison::Eq => "!=",
            Comparison::Ne => "==",
            Comparison::Gt => "<=",
            Comparison::Ge => "<",
            Comparison::Lt => ">=",
            Comparison::Le => ">",
        }
    }
}

/// Overflow-free distance between two values, used by tolerance checks.
///
/// Signed integers measure in their unsigned counterpart, so
/// `i32::MIN` and `i32::MAX` are `u32::MAX` apart rather than overflowing.
pub trait AbsDiff: Copy + FormatValue {
    /// Type the distance is measured in.
    type Output: PartialOrd + FormatValue;

    /// Absolute difference between `self` and `other`.
    fn abs_diff(self, other: Self) -> Self::Output;

    /// `self` as a tolerance, or `None` when no distance can be within it.
    fn as_tolerance(self) -> Option<Self::Output>;
}

macro_rules! impl_abs_diff_signed {
    ($($signed:ty => $unsigned:ty),* $(,)?) => {
        $(
            impl AbsDiff for $signed {
                type Output = $unsigned;

                fn abs_diff(self, other: Self) -> $unsigned {
                    <$signed>::abs_diff(self, other)
                }

                fn as_tolerance(self) -> Option<$unsigned> {
                    <$unsigned>::try_from(self).ok()
                }
            }
        )*
    };
}

macro_rules! impl_abs_diff_unsigned {
    ($($unsigned:ty),* $(,)?) => {
        $(
            impl AbsDiff for $unsigned {
                type Output = $unsigned;

                fn abs_diff(self, other: Self) -> $unsigned {
                    <$unsigned>::abs_diff(self, other)
                }

                fn as_tolerance(self) -> Option<$unsigned> {
                    Some(self)
                }
            }
        )*
    };
}

macro_rules! impl_abs_diff_float {
    ($($float:ty),* $(,)?) => {
        $(
            impl AbsDiff for $float {
                type Output = $float;

                fn abs_diff(self, other: Self) -> $float {
                    (self - other).abs()
                }

                fn as_tolerance(self) -> Option<$float> {
                    Some(self)
                }
            }
        )*
    };
}

impl_abs_diff_signed!(
    i8 => u8,
    i16 => u16,
    i32 => u32,
    i64 => u64,
    i128 => u128,
    isize => usize,
);
impl_abs_diff_unsigned!(u8, u16, u32, u64, u128, usize);
impl_abs_diff_float!(f32, f64);

/// Handle to the fixture under test, passed to every lifecycle hook.
pub struct TestContext<'a> {
    id: &'a FixtureId,
    counts: &'a mut CheckCounts,
    log: &'a mut ErrorLog,
}

impl<'a> TestContext<'a> {
    /// Identity of the fixture.
    pub fn id(&self) -> &FixtureId {
        self.id
    }

    /// Name of the fixture, unique within its group.
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Group of the fixture.
    pub fn group(&self) -> &str {
        self.id.group()
    }

    /// Checks performed so far in this run.
    pub fn checks_performed(&self) -> u32 {
        self.counts.performed
    }

    /// Checks failed so far in this run.
    pub fn checks_failed(&self) -> u32 {
        self.counts.failed
    }

    /// Messages recorded so far in this run.
    pub fn errors(&self) -> Entries<'_> {
        self.log.entries()
    }

    /// Counts one check.
    pub fn add_check(&mut self) {
        self.counts.performed = self.counts.performed.saturating_add(1);
    }

    /// Counts a failure and records its message.
    ///
    /// The failure is counted even when the log has no room for the text.
    /// A failure logged without a matching [`add_check`](Self::add_check)
    /// counts as a check of its own.
    pub fn log_error(&mut self, args: fmt::Arguments<'_>) -> AppendOutcome {
        self.counts.failed = self.counts.failed.saturating_add(1);
        self.counts.performed = self.counts.performed.max(self.counts.failed);
        self.log.append(args)
    }

    /// Checks that `condition` holds.
    #[track_caller]
    pub fn check(&mut self, condition: bool) -> bool {
        self.compare(condition, Comparison::Eq, &condition, &true, None)
    }

    /// Checks that `lhs == rhs`.
    #[track_caller]
    pub fn check_eq<L, R>(&mut self, lhs: L, rhs: R) -> bool
    where
        L: PartialEq<R> + FormatValue,
        R: FormatValue,
    {
        self.compare(lhs == rhs, Comparison::Eq, &lhs, &rhs, None)
    }

    /// Checks that `lhs != rhs`.
    #[track_caller]
    pub fn check_ne<L, R>(&mut self, lhs: L, rhs: R) -> bool
    where
        L: PartialEq<R> + FormatValue,
        R: FormatValue,
    {
        self.compare(lhs != rhs, Comparison::Ne, &lhs, &rhs, None)
    }

    /// Checks that `lhs > rhs`.
    #[track_caller]
    pub fn check_gt<L, R>(&mut self, lhs: L, rhs: R) -> bool
    where
        L: PartialOrd<R> + FormatValue,
        R: FormatValue,
    {
        self.compare(lhs > rhs, Comparison::Gt, &lhs, &rhs, None)
    }

    /// Checks that `lhs >= rhs`.
    #[track_caller]
    pub fn check_ge<L, R>(&mut self, lhs: L, rhs: R) -> bool
    where
        L: PartialOrd<R> + FormatValue,
        R: FormatValue,
    {
        self.compare(lhs >= rhs, Comparison::Ge, &lhs, &rhs, None)
    }

    /// Checks that `lhs < rhs`.
    #[track_caller]
    pub fn check_lt<L, R>(&mut self, lhs: L, rhs: R) -> bool
    where
        L: PartialOrd<R> + FormatValue,
        R: FormatValue,
    {
        self.compare(lhs < rhs, Comparison::Lt, &lhs, &rhs, None)
    }

    /// Checks that `lhs <= rhs`.
    #[track_caller]
    pub fn check_le<L, R>(&mut self, lhs: L, rhs: R) -> bool
    where
        L: PartialOrd<R> + FormatValue,
        R: FormatValue,
    {
        self.compare(lhs <= rhs, Comparison::Le, &lhs, &rhs, None)
    }

    /// Checks that `lhs` and `rhs` differ by at most `epsilon`.
    #[track_caller]
    pub fn check_close<T: AbsDiff>(&mut self, lhs: T, rhs: T, epsilon: T) -> bool {
        self.close(lhs, rhs, epsilon, None)
    }

    /// Checks `condition`, recording `message` when it does not hold.
    #[track_caller]
    pub fn check_message(&mut self, condition: bool, message: fmt::Arguments<'_>) -> bool {
        self.message(condition, None, message)
    }

    /// Records the outcome of a comparison that has already been evaluated.
    ///
    /// `condition` is the source text of the comparison when known; without
    /// it the rendered operands stand in.
    #[track_caller]
    pub fn compare(
        &mut self,
        passed: bool,
        op: Comparison,
        lhs: &dyn FormatValue,
        rhs: &dyn FormatValue,
        condition: Option<&str>,
    ) -> bool {
        self.add_check();
        if passed {
            return true;
        }
        let lhs = lhs.format_value();
        let rhs = rhs.format_value();
        let negated = op.negated_symbol();
        match condition {
            Some(condition) => self.fail(
                format_args!("{condition}"),
                format_args!("{lhs} {negated} {rhs}"),
            ),
            None => self.fail(
                format_args!("{lhs} {} {rhs}", op.symbol()),
                format_args!("{lhs} {negated} {rhs}"),
            ),
        }
        false
    }

    /// Tolerance check with optional source text; see [`check_close`](Self::check_close).
    #[track_caller]
    pub fn close<T: AbsDiff>(
        &mut self,
        lhs: T,
        rhs: T,
        epsilon: T,
        condition: Option<&str>,
    ) -> bool {
        self.add_check();
        let difference = lhs.abs_diff(rhs);
        // NaN operands never compare, so they fail here.
        if epsilon
            .as_tolerance()
            .is_some_and(|tolerance| difference <= tolerance)
        {
            return true;
        }
        let difference = difference.format_value();
        let epsilon = epsilon.format_value();
        match condition {
            Some(condition) => self.fail(
                format_args!("{condition}"),
                format_args!("Difference of {difference} is greater than {epsilon}"),
            ),
            None => self.fail(
                format_args!("{} close to {}", lhs.format_value(), rhs.format_value()),
                format_args!("Difference of {difference} is greater than {epsilon}"),
            ),
        }
        false
    }

    /// Custom-message check with optional source text.
    #[track_caller]
    pub fn message(
        &mut self,
        passed: bool,
        condition: Option<&str>,
        message: fmt::Arguments<'_>,
    ) -> bool {
        self.add_check();
        if passed {
            return true;
        }
        self.fail(format_args!("{}", condition.unwrap_or("false")), message);
        false
    }

    #[track_caller]
    fn fail(&mut self, condition: fmt::Arguments<'_>, detail: fmt::Arguments<'_>) {
        let location = Location::caller();
        self.log_error(format_args!(
            "{}({}): Condition [{condition}] Failed. {detail}",
            location.file(),
            location.line()
        ));
    }
}

/// A registered test together with the state of its latest run.
pub struct Fixture {
    case: Box<dyn TestCase>,
    id: FixtureId,
    counts: CheckCounts,
    log: ErrorLog,
    phase: Phase,
}

impl Fixture {
    /// Wraps `case` with the default message space.
    pub fn new<T: TestCase + 'static>(case: T) -> Self {
        Self::from_boxed(Box::new(case), DEFAULT_MESSAGE_SPACE)
    }

    /// Wraps `case` with `message_space` bytes reserved for failure text.
    pub fn from_boxed(case: Box<dyn TestCase>, message_space: usize) -> Self {
        let id = FixtureId::new(case.group(), case.name());
        Self {
            case,
            id,
            counts: CheckCounts::default(),
            log: ErrorLog::new(message_space),
            phase: Phase::Idle,
        }
    }

    /// Identity of the fixture.
    pub fn id(&self) -> &FixtureId {
        &self.id
    }

    /// Name of the fixture, unique within its group.
    pub fn name(&self) -> &str {
        self.id.name()
    }

    /// Group of the fixture.
    pub fn group(&self) -> &str {
        self.id.group()
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Counters of the latest run.
    pub fn counts(&self) -> CheckCounts {
        self.counts
    }

    /// Checks performed in the latest run.
    pub fn checks_performed(&self) -> u32 {
        self.counts.performed
    }

    /// Checks failed in the latest run.
    pub fn checks_failed(&self) -> u32 {
        self.counts.failed
    }

    /// Returns true if the latest run had no failed checks.
    pub fn passed(&self) -> bool {
        self.counts.failed == 0
    }

    /// Failure messages of the latest run.
    pub fn errors(&self) -> Entries<'_> {
        self.log.entries()
    }

    /// The log holding the latest run's failure messages.
    pub fn error_log(&self) -> &ErrorLog {
        &self.log
    }

    /// Failures of the latest run whose text did not fit in the log.
    pub fn unrecorded_failures(&self) -> u32 {
        let recorded = u32::try_from(self.log.len()).unwrap_or(u32::MAX);
        self.counts.failed.saturating_sub(recorded)
    }

    /// Runs setup, the test body and tear-down, in that order.
    ///
    /// Counters and the log from any previous run are discarded first.
    /// Returns true if no check failed.
    pub fn execute_test(&mut self) -> bool {
        let Self {
            case,
            id,
            counts,
            log,
            phase,
        } = self;

        *counts = CheckCounts::default();
        log.clear();
        debug!(fixture = %id, "executing fixture");

        let mut ctx = TestContext {
            id: &*id,
            counts: &mut *counts,
            log: &mut *log,
        };
        *phase = Phase::SettingUp;
        case.setup(&mut ctx);
        *phase = Phase::Running;
        case.run(&mut ctx);
        *phase = Phase::TearingDown;
        case.tear_down(&mut ctx);
        *phase = Phase::Idle;

        debug!(
            fixture = %id,
            checks = counts.performed,
            failed = counts.failed,
            "fixture finished"
        );
        counts.failed == 0
    }
}

impl fmt::Debug for Fixture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fixture")
            .field("id", &self.id)
            .field("counts", &self.counts)
            .field("phase", &self.phase)
            .field("errors", &self.log.len())
            .finish_non_exhaustive()
    }
}
