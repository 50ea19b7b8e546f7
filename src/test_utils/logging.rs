use std::fmt::Debug;
use std::time::Instant;

/// Brackets a test's stdout with its name, inputs and outcome.
pub struct TestLogger {
    test_name: String,
    start_time: Instant,
}

impl TestLogger {
    pub fn new(test_name: &str) -> Self {
        println!("\n[TEST START] {test_name}");
        Self {
            test_name: test_name.to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn log_input<T: Debug>(&self, name: &str, value: &T) {
        println!("[INPUT] {name}: {value:?}");
    }

    pub fn log_step(&self, step: &str) {
        println!("[STEP] {step} (+{:?})", self.start_time.elapsed());
    }

    pub fn log_actual<T: Debug>(&self, value: &T) {
        println!("[ACTUAL] {value:?}");
    }

    pub fn pass(&self) {
        println!(
            "[RESULT] {} passed in {:?}",
            self.test_name,
            self.start_time.elapsed()
        );
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }
}
