//! Shared test utilities for skillmine.

pub mod fixtures;
pub mod logging;

use std::panic::{AssertUnwindSafe, catch_unwind};

/// Table-driven test case structure.
#[derive(Debug, Clone)]
pub struct TestCase<I, E> {
    pub name: &'static str,
    pub input: I,
    pub expected: E,
    pub should_panic: bool,
}

impl<I, E> TestCase<I, E> {
    pub const fn new(name: &'static str, input: I, expected: E) -> Self {
        Self {
            name,
            input,
            expected,
            should_panic: false,
        }
    }
}

/// Run every case, reporting the failing case by name.
pub fn run_table_tests<I, E, F>(cases: Vec<TestCase<I, E>>, test_fn: F)
where
    I: std::fmt::Debug + Clone,
    E: std::fmt::Debug + PartialEq,
    F: Fn(I) -> E,
{
    for case in cases {
        let start = std::time::Instant::now();
        println!("[TEST] {} <- {:?}", case.name, case.input);

        let result = catch_unwind(AssertUnwindSafe(|| test_fn(case.input.clone())));

        if case.should_panic {
            assert!(result.is_err(), "case '{}' expected a panic", case.name);
            println!("[TEST] {}: panicked as expected", case.name);
            continue;
        }

        let Ok(actual) = result else {
            panic!("case '{}' panicked unexpectedly", case.name);
        };
        assert_eq!(actual, case.expected, "case '{}' failed", case.name);
        println!("[TEST] {}: ok ({:?})", case.name, start.elapsed());
    }
}
