#![forbid(unsafe_code)]

//! # SimpleTest demo
//!
//! Runs a small built-in suite through the harness.
//!
//! ## Usage
//!
//! ```bash
//! simpletest-demo                          # Run everything (the Demo group fails on purpose)
//! simpletest-demo --group Format           # Run one group
//! simpletest-demo --group Demo --name DeliberateFailures --verbose
//! simpletest-demo --list                   # List registered fixtures
//! RUST_LOG=simpletest=debug simpletest-demo --silent
//! ```
//!
//! Exit status is 0 when every selected fixture passed (including when
//! nothing matched), 1 when a fixture failed and 2 on configuration errors.

use std::process::ExitCode;

use clap::Parser;
use simpletest::prelude::*;
use simpletest::{DEFAULT_MESSAGE_SPACE, FixtureFactory, NULL_TEXT, Unformattable};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "simpletest-demo", version, about = "Run the built-in SimpleTest demo suite")]
struct Args {
    /// Only run fixtures in this group
    #[arg(long)]
    group: Option<String>,

    /// Only run fixtures with this name
    #[arg(long)]
    name: Option<String>,

    /// Output mode: silent, normal or verbose
    #[arg(long, default_value_t = OutputMode::Normal)]
    mode: OutputMode,

    /// Shorthand for --mode verbose
    #[arg(short, long, conflicts_with = "silent")]
    verbose: bool,

    /// Shorthand for --mode silent
    #[arg(short, long)]
    silent: bool,

    /// Bytes of failure text kept per fixture
    #[arg(long, default_value_t = DEFAULT_MESSAGE_SPACE)]
    message_space: usize,

    /// Disable coloured output
    #[arg(long)]
    no_color: bool,

    /// List registered fixtures and exit
    #[arg(long)]
    list: bool,
}

impl Args {
    fn output_mode(&self) -> OutputMode {
        if self.verbose {
            OutputMode::Verbose
        } else if self.silent {
            OutputMode::Silent
        } else {
            self.mode
        }
    }
}

define_test!(Integers, Format, |ctx| {
    test_eq!(ctx, (-42i32).format_value().as_str(), "-42");
    test_eq!(ctx, 42u32.format_value().as_str(), "42");
    test_eq!(ctx, u64::MAX.format_value().as_str(), "18446744073709551615");
});

define_test!(Floats, Format, |ctx| {
    test_eq!(ctx, 1.0f64.format_value().as_str(), "1");
    test_eq!(ctx, 0.1f64.format_value().as_str(), "0.1");
    test_eq!(ctx, 2.25f64.format_value().as_str(), "2.25");
    test_eq!(ctx, (0.1f64 + 0.2).format_value().as_str(), "0.3");
    test_close!(ctx, 0.1f64 + 0.2, 0.3, 1e-9);
});

define_test!(TextAndPointers, Format, |ctx| {
    test_eq!(ctx, true.format_value().as_str(), "true");
    test_eq!(ctx, None::<&str>.format_value().as_str(), NULL_TEXT);
    test_eq!(ctx, std::ptr::null::<u8>().format_value().as_str(), NULL_TEXT);
    test_eq!(ctx, Unformattable(()).format_value().as_str(), "(unknown type)");
});

define_test!(DeliberateFailures, Demo, |ctx| {
    let answer = 41;
    test_eq!(ctx, answer, 42);
    test_check!(ctx, answer % 2 == 0);
    test_close!(ctx, 1.0, 1.5, 0.25);
    test_message!(ctx, answer > 100, "answer {} is too small", answer);
    test_gt!(ctx, answer, 0);
});

/// Floods a deliberately small log to show the overflow report.
struct Flood {
    scratch: Vec<u32>,
}

impl TestCase for Flood {
    fn name(&self) -> &str {
        "log_overflow"
    }

    fn group(&self) -> &str {
        "Demo"
    }

    fn setup(&mut self, _ctx: &mut TestContext<'_>) {
        self.scratch = (0..500).collect();
    }

    fn run(&mut self, ctx: &mut TestContext<'_>) {
        for &value in &self.scratch {
            test_eq!(ctx, value, value + 1);
        }
    }

    fn tear_down(&mut self, _ctx: &mut TestContext<'_>) {
        self.scratch.clear();
    }
}

define_test!(Arithmetic, |ctx| {
    test_eq!(ctx, 2 + 2, 4);
    test_ne!(ctx, 2 + 2, 5);
    test_le!(ctx, 7 / 2, 3);
    test_ge!(ctx, 7 % 2, 1);
    test_lt!(ctx, -1, 0);
});

const SUITE: &[FixtureFactory] = &[
    || Box::new(Integers),
    || Box::new(Floats),
    || Box::new(TextAndPointers),
    || Box::new(DeliberateFailures),
    || Box::new(Flood { scratch: Vec::new() }),
    || Box::new(Arithmetic),
];

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let config = HarnessConfig::new()
        .message_space(args.message_space)
        .output_mode(args.output_mode())
        .colors(!args.no_color);

    let mut registry = match config.build_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::from(2);
        }
    };
    if let Err(e) = registry.register_factories(SUITE) {
        eprintln!("Error: {e}");
        return ExitCode::from(2);
    }

    if args.list {
        for id in registry.ids() {
            println!("{id}");
        }
        return ExitCode::SUCCESS;
    }

    let selection = Selection::from_filters(args.group.as_deref(), args.name.as_deref());
    let mut runner = config.build_runner();
    let summary = runner.run(&mut registry, &selection);

    if summary.all_passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
