#![forbid(unsafe_code)]
// Allow pedantic lints for early-stage API ergonomics.
#![allow(clippy::nursery)]
#![allow(clippy::pedantic)]

//! # SimpleTest
//!
//! A small unit-testing harness built around fixtures that are registered
//! once, run in place as often as needed, and keep their failures in a
//! bounded per-fixture log.
//!
//! The harness provides:
//! - **TestCase**: the trait a test implements (`name`, `group`, `run`,
//!   optional `setup` and `tear_down`)
//! - **TestContext**: the explicit handle assertions record into
//! - **Fixture**: a test plus the counters and [`ErrorLog`] of its latest run
//! - **Registry**: all fixtures of a process, in registration order
//! - **Runner**: filtered execution with reports through an [`Output`]
//! - **FormatValue**: short text for operands in failure messages
//!
//! ## Example
//!
//! ```rust
//! use simpletest::{
//!     define_test, test_eq, test_lt, BufferOutput, OutputMode, Registry, Runner, Selection,
//! };
//!
//! define_test!(Addition, Math, |ctx| {
//!     test_eq!(ctx, 2 + 2, 4);
//!     test_lt!(ctx, 1, 2);
//! });
//!
//! let mut registry = Registry::new();
//! registry.register(Addition).unwrap();
//!
//! let output = BufferOutput::new();
//! let mut runner = Runner::new(OutputMode::Normal, output.clone());
//! let summary = runner.run(&mut registry, &Selection::group("Math"));
//!
//! assert!(summary.all_passed());
//! assert!(output.contents().contains("[Addition]: Passed 2 out of 2 tests"));
//! ```
//!
//! ## Bounded failure logs
//!
//! Every fixture reserves a fixed number of bytes for failure text
//! ([`DEFAULT_MESSAGE_SPACE`] unless configured otherwise). When the space
//! runs out further messages are dropped, but the failure count stays
//! exact and the report notes how many messages were lost.

pub mod config;
pub mod error_log;
pub mod fixture;
pub mod format;
mod macros;
pub mod output;
pub mod registry;
pub mod runner;

pub use config::{ConfigError, HarnessConfig, MIN_MESSAGE_SPACE};
pub use error_log::{
    AppendOutcome, DEFAULT_MESSAGE_SPACE, ENTRY_ALIGN, ENTRY_HEADER, Entries, ErrorLog,
    SAFETY_MARGIN,
};
pub use fixture::{
    AbsDiff, CheckCounts, Comparison, DEFAULT_GROUP, Fixture, FixtureId, Phase, TestCase,
    TestContext,
};
pub use format::{
    FormatValue, NULL_TEXT, STRING_LENGTH, TempString, UNKNOWN_TEXT, Unformattable, format_float,
};
pub use output::{BufferOutput, FnOutput, Output, Status, StdoutOutput};
pub use registry::{FixtureFactory, Registry, RegistryError, RegistryResult};
pub use runner::{
    FixtureReport, OutputMode, ParseOutputModeError, RunSummary, Runner, Selection, run_all,
    run_group, run_one, run_selected,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Fixture, FormatValue, HarnessConfig, Output, OutputMode, Registry, RunSummary, Runner,
        Selection, TestCase, TestContext,
    };
    pub use crate::{
        define_test, test_check, test_close, test_eq, test_ge, test_gt, test_le, test_lt,
        test_message, test_ne,
    };
}
