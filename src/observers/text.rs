//! Plain text report of a single run.
//!
//! Produces the three lines the counter programs have always printed, so
//! scripts that scrape them keep working:
//!
//! ```text
//! Time taken: 12.34 ms
//! Final counter value: 80000
//! Expected value: 80000
//! ```
//!
//! With [`TimeUnit::Seconds`] the time line becomes
//! `Elapsed time: 0.012340 seconds` and follows the counter value.

use crate::runner::RunResult;

/// Unit used for the elapsed time line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimeUnit {
    /// Milliseconds with two decimals.
    #[default]
    Millis,
    /// Seconds with six decimals.
    Seconds,
}

/// Renders a [`RunResult`] as plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextObserver {
    unit: TimeUnit,
}

impl TextObserver {
    /// Creates a text observer reporting milliseconds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the time unit.
    pub fn with_unit(mut self, unit: TimeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Renders the report, without a trailing newline.
    pub fn render(&self, result: &RunResult) -> String {
        match self.unit {
            TimeUnit::Millis => format!(
                "Time taken: {:.2} ms\nFinal counter value: {}\nExpected value: {}",
                result.elapsed_ms(),
                result.total,
                result.expected
            ),
            TimeUnit::Seconds => format!(
                "Final counter value: {}\nElapsed time: {:.6} seconds\nExpected value: {}",
                result.total,
                result.elapsed_secs(),
                result.expected
            ),
        }
    }
}
