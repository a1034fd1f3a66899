use std::time::{Duration, Instant};

/// Prints a framed, timed trace of one test scenario to stdout.
pub struct TestLogger {
    test_name: String,
    start_time: Instant,
}

impl TestLogger {
    #[must_use]
    pub fn new(test_name: &str) -> Self {
        let separator = "=".repeat(60);
        println!("\n{separator}");
        println!("[TEST START] {test_name}");
        println!("{separator}");
        Self {
            test_name: test_name.to_string(),
            start_time: Instant::now(),
        }
    }

    pub fn log_input<T: std::fmt::Debug>(&self, name: &str, value: &T) {
        println!("[INPUT] {name}: {value:?}");
    }

    pub fn log_actual<T: std::fmt::Debug>(&self, value: &T) {
        println!("[ACTUAL] {value:?}");
    }

    /// Time since the logger was created.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn pass(&self) {
        println!("[RESULT] {} PASSED in {:?}", self.test_name, self.elapsed());
        println!("{}\n", "=".repeat(60));
    }
}
