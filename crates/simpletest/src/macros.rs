//! Definition and assertion macros.
//!
//! The assertion macros forward to [`TestContext`](crate::TestContext)
//! methods and add the source text of the checked condition to failure
//! messages, e.g. `src/lib.rs(12): Condition [a + 1 == b] Failed. 3 != 4`.

/// Defines a unit struct implementing [`TestCase`](crate::TestCase).
///
/// ```rust
/// use simpletest::{define_test, test_eq, Fixture};
///
/// define_test!(Addition, Math, |ctx| {
///     test_eq!(ctx, 1 + 1, 2);
/// });
///
/// let mut fixture = Fixture::new(Addition);
/// assert_eq!(fixture.group(), "Math");
/// assert!(fixture.execute_test());
/// ```
#[macro_export]
macro_rules! define_test {
    ($name:ident, $group:ident, |$ctx:ident| $body:block) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl $crate::TestCase for $name {
            fn name(&self) -> &str {
                stringify!($name)
            }

            fn group(&self) -> &str {
                stringify!($group)
            }

            fn run(&mut self, $ctx: &mut $crate::TestContext<'_>) $body
        }
    };
    ($name:ident, |$ctx:ident| $body:block) => {
        $crate::define_test!($name, Global, |$ctx| $body);
    };
}

/// Checks that a boolean condition holds.
#[macro_export]
macro_rules! test_check {
    ($ctx:expr, $cond:expr $(,)?) => {
        $crate::test_eq!($ctx, $cond, true)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __test_compare {
    ($ctx:expr, $lhs:expr, $rhs:expr, $op:tt, $comparison:ident) => {
        match (&$lhs, &$rhs) {
            (lhs, rhs) => $ctx.compare(
                lhs $op rhs,
                $crate::Comparison::$comparison,
                lhs,
                rhs,
                ::core::option::Option::Some(concat!(
                    stringify!($lhs),
                    " ",
                    stringify!($op),
                    " ",
                    stringify!($rhs)
                )),
            ),
        }
    };
}

#[macro_export]
macro_rules! test_eq {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => {
        $crate::__test_compare!($ctx, $lhs, $rhs, ==, Eq)
    };
}

#[macro_export]
macro_rules! test_ne {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => {
        $crate::__test_compare!($ctx, $lhs, $rhs, !=, Ne)
    };
}

#[macro_export]
macro_rules! test_gt {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => {
        $crate::__test_compare!($ctx, $lhs, $rhs, >, Gt)
    };
}

#[macro_export]
macro_rules! test_ge {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => {
        $crate::__test_compare!($ctx, $lhs, $rhs, >=, Ge)
    };
}

#[macro_export]
macro_rules! test_lt {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => {
        $crate::__test_compare!($ctx, $lhs, $rhs, <, Lt)
    };
}

#[macro_export]
macro_rules! test_le {
    ($ctx:expr, $lhs:expr, $rhs:expr $(,)?) => {
        $crate::__test_compare!($ctx, $lhs, $rhs, <=, Le)
    };
}

/// Checks that two values differ by at most an epsilon.
#[macro_export]
macro_rules! test_close {
    ($ctx:expr, $lhs:expr, $rhs:expr, $eps:expr $(,)?) => {
        $ctx.close(
            $lhs,
            $rhs,
            $eps,
            ::core::option::Option::Some(concat!(
                stringify!($lhs),
                " close to ",
                stringify!($rhs)
            )),
        )
    };
}

/// Checks a condition and records a custom message when it fails.
#[macro_export]
macro_rules! test_message {
    ($ctx:expr, $cond:expr, $($arg:tt)+) => {
        $ctx.message(
            $cond,
            ::core::option::Option::Some(stringify!($cond)),
            format_args!($($arg)+),
        )
    };
}

#[cfg(test)]
mod tests {
    use crate::{Fixture, TestCase, TestContext};

    define_test!(MacroPasses, Macros, |ctx| {
        let value = 3;
        test_check!(ctx, value == 3);
        test_eq!(ctx, value, 3);
        test_ne!(ctx, value, 4);
        test_gt!(ctx, value, 2);
        test_ge!(ctx, value, 3);
        test_lt!(ctx, value, 4);
        test_le!(ctx, value, 3);
        test_close!(ctx, 1.0, 1.0001, 0.001);
        test_message!(ctx, value > 0, "value was {}", value);
    });

    define_test!(DefaultGroup, |ctx| {
        test_check!(ctx, true);
    });

    struct MacroFailures;

    impl TestCase for MacroFailures {
        fn name(&self) -> &str {
            "macro_failures"
        }

        fn run(&mut self, ctx: &mut TestContext<'_>) {
            let a = 1;
            let b = 2;
            test_eq!(ctx, a + 1, b + 1);
            test_check!(ctx, a > b);
            test_close!(ctx, 1.0, 2.0, 0.5);
            test_message!(ctx, a == b, "a was {} and b was {}", a, b);
            test_le!(ctx, "beta", "alpha");
        }
    }

    #[test]
    fn passing_macros_count_checks() {
        let mut fixture = Fixture::new(MacroPasses);
        assert!(fixture.execute_test());
        assert_eq!(fixture.checks_performed(), 9);
        assert_eq!(fixture.name(), "MacroPasses");
        assert_eq!(fixture.group(), "Macros");
    }

    #[test]
    fn define_test_defaults_to_global_group() {
        let fixture = Fixture::new(DefaultGroup);
        assert_eq!(fixture.group(), "Global");
    }

    #[test]
    fn failing_macros_include_source_text() {
        let mut fixture = Fixture::new(MacroFailures);
        assert!(!fixture.execute_test());
        assert_eq!(fixture.checks_failed(), 5);
        let errors: Vec<_> = fixture.errors().collect();
        let expected = [
            "Condition [a + 1 == b + 1] Failed. 2 != 3",
            "Condition [a > b == true] Failed. false != true",
            "Condition [1.0 close to 2.0] Failed. Difference of 1 is greater than 0.5",
            "Condition [a == b] Failed. a was 1 and b was 2",
            "Condition [\"beta\" <= \"alpha\"] Failed. beta > alpha",
        ];
        for (error, expected) in errors.iter().zip(expected) {
            assert!(error.contains(expected), "{error}");
        }
        assert!(errors.iter().all(|e| e.contains("macros.rs(")));
    }
}
