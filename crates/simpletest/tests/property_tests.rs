use proptest::prelude::*;
use simpletest::prelude::*;
use simpletest::{AppendOutcome, BufferOutput, ENTRY_HEADER, ErrorLog, FixtureId, SAFETY_MARGIN};

/// Runs a scripted sequence of pass/fail checks.
struct Scripted {
    name: String,
    group: String,
    outcomes: Vec<bool>,
}

impl TestCase for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn group(&self) -> &str {
        &self.group
    }

    fn run(&mut self, ctx: &mut TestContext<'_>) {
        for (index, &pass) in self.outcomes.iter().enumerate() {
            test_message!(ctx, pass, "scripted check {} failed", index);
        }
    }
}

fn identifier() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["alpha", "beta", "Gamma", "gamma"]).prop_map(String::from)
}

proptest! {
    #[test]
    fn test_check_counts_match_outcomes(
        outcomes in prop::collection::vec(any::<bool>(), 0..300),
        space in (ENTRY_HEADER + SAFETY_MARGIN)..4096usize
    ) {
        let expected_failed = outcomes.iter().filter(|&&pass| !pass).count();
        let mut fixture = Fixture::from_boxed(
            Box::new(Scripted {
                name: "scripted".into(),
                group: "Props".into(),
                outcomes: outcomes.clone(),
            }),
            space,
        );

        let passed = fixture.execute_test();

        // Invariant: N counts every check, F counts every failure, F <= N
        prop_assert_eq!(fixture.checks_performed() as usize, outcomes.len());
        prop_assert_eq!(fixture.checks_failed() as usize, expected_failed);
        prop_assert_eq!(passed, expected_failed == 0);

        // Invariant: recorded messages never exceed failures, the rest are reported
        let recorded = fixture.errors().count();
        prop_assert!(recorded <= expected_failed);
        prop_assert_eq!(fixture.unrecorded_failures() as usize, expected_failed - recorded);
    }

    #[test]
    fn test_error_log_stays_within_capacity(
        capacity in 0usize..2048,
        messages in prop::collection::vec("\\PC{0,120}", 0..64)
    ) {
        let mut log = ErrorLog::new(capacity);
        let mut recorded = 0;
        let mut closed = false;

        for message in &messages {
            let outcome = log.append(format_args!("{message}"));

            // Invariant: a full log never records again
            if closed {
                prop_assert_eq!(outcome, AppendOutcome::Dropped);
            }
            if outcome.is_recorded() {
                recorded += 1;
            }
            closed |= log.is_full();

            // Invariant: the cursor never passes capacity
            prop_assert!(log.cursor() <= capacity);
        }

        prop_assert_eq!(log.len(), recorded);
        for (entry, message) in log.entries().zip(&messages) {
            // Invariant: entries are prefixes of what was written
            prop_assert!(message.starts_with(entry));
        }
    }

    #[test]
    fn test_selection_runs_exactly_the_matching_fixtures(
        ids in prop::collection::btree_set((identifier(), identifier()), 1..10),
        group in prop::option::of(identifier()),
        name in prop::option::of(identifier())
    ) {
        let mut registry = Registry::new();
        for (g, n) in &ids {
            registry
                .register(Scripted { name: n.clone(), group: g.clone(), outcomes: vec![true] })
                .unwrap();
        }

        let selection = Selection::from_filters(group.as_deref(), name.as_deref());
        let expected: Vec<FixtureId> = registry
            .ids()
            .filter(|id| {
                group.as_deref().is_none_or(|g| g == id.group())
                    && name.as_deref().is_none_or(|n| n == id.name())
            })
            .cloned()
            .collect();

        let mut runner = Runner::new(OutputMode::Silent, BufferOutput::new());
        let summary = runner.run(&mut registry, &selection);

        let ran: Vec<FixtureId> = summary.reports.iter().map(|r| r.id.clone()).collect();
        prop_assert_eq!(&ran, &expected);
        prop_assert_eq!(summary.no_tests_found(), expected.is_empty());
        prop_assert!(summary.all_passed());

        // Invariant: fixtures outside the selection never ran
        for fixture in &registry {
            let selected = expected.contains(fixture.id());
            prop_assert_eq!(fixture.checks_performed() == 1, selected);
        }
    }

    #[test]
    fn test_close_is_symmetric(
        a in -1.0e6f64..1.0e6,
        b in -1.0e6f64..1.0e6,
        eps in 0.0f64..10.0
    ) {
        let mut forward = Fixture::new(CloseCase { a, b, eps });
        let mut backward = Fixture::new(CloseCase { a: b, b: a, eps });
        prop_assert_eq!(forward.execute_test(), backward.execute_test());
        prop_assert_eq!(forward.execute_test(), (a - b).abs() <= eps);
    }
}

struct CloseCase {
    a: f64,
    b: f64,
    eps: f64,
}

impl TestCase for CloseCase {
    fn name(&self) -> &str {
        "close_case"
    }

    fn run(&mut self, ctx: &mut TestContext<'_>) {
        test_close!(ctx, self.a, self.b, self.eps);
    }
}
