//! Table observer for benchmark runs.
//!
//! This module provides [`TableObserver`], which renders a sequence of
//! [`RunResult`]s as an ASCII table using the `tabled` crate, one row per run.
//! It is the natural output of a thread-count sweep.
//!
//! # Feature Flag
//!
//! This module requires the `table` feature:
//!
//! ```toml
//! [dependencies]
//! sloppy = { version = "0.1", features = ["table"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use sloppy::observers::table::{TableObserver, TableStyle};
//! use sloppy::runner::{sweep, RunConfig};
//!
//! let results = sweep(&RunConfig::new(1, 1), 1..=4, 1_000_000)?;
//! println!("{}", TableObserver::new().with_style(TableStyle::Rounded).render(&results));
//! // ╭─────────┬──────────┬────────────┬────────┬─────────┬──────────┬───────────┬────╮
//! // │ Threads │ Strategy │ Per thread │ Shards │ Total   │ Expected │ Time (ms) │ OK │
//! // ├─────────┼──────────┼────────────┼────────┼─────────┼──────────┼───────────┼────┤
//! // │ 1       │ sloppy   │ 1000000    │ 8      │ 1000000 │ 1000000  │ 9.81      │ ✓  │
//! // ...
//! ```

use crate::runner::RunResult;
use tabled::{settings::Style, Table, Tabled};

/// Available table styles for rendering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TableStyle {
    /// ASCII table with simple characters: +, -, |
    Ascii,
    /// Modern rounded corners (default)
    #[default]
    Rounded,
    /// Sharp corners with box-drawing characters
    Sharp,
    /// GitHub-flavored Markdown table
    Markdown,
    /// No borders, just spacing
    Blank,
}

#[derive(Debug, Clone, Default)]
struct TableConfig {
    style: TableStyle,
    title: Option<String>,
}

/// Internal row representation for tabled.
#[derive(Tabled)]
struct RunRow {
    #[tabled(rename = "Threads")]
    workers: usize,
    #[tabled(rename = "Strategy")]
    strategy: String,
    #[tabled(rename = "Per thread")]
    per_worker: u64,
    #[tabled(rename = "Shards")]
    shards: usize,
    #[tabled(rename = "Pinned")]
    pinned: usize,
    #[tabled(rename = "Total")]
    total: u64,
    #[tabled(rename = "Expected")]
    expected: u64,
    #[tabled(rename = "Time (ms)")]
    elapsed_ms: String,
    #[tabled(rename = "OK")]
    consistent: &'static str,
}

impl From<&RunResult> for RunRow {
    fn from(result: &RunResult) -> Self {
        RunRow {
            workers: result.workers,
            strategy: result.strategy.to_string(),
            per_worker: result.increments_per_worker,
            shards: result.shards,
            pinned: result.pinned_workers,
            total: result.total,
            expected: result.expected,
            elapsed_ms: format!("{:.2}", result.elapsed_ms()),
            consistent: if result.is_consistent() { "✓" } else { "✗" },
        }
    }
}

/// An observer that renders runs as a formatted table.
#[derive(Debug, Clone, Default)]
pub struct TableObserver {
    config: TableConfig,
}

impl TableObserver {
    /// Creates a new table observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the table style.
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.config.style = style;
        self
    }

    /// Sets an optional title for the table.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    fn apply_style(&self, table: &mut Table) {
        match self.config.style {
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Rounded => table.with(Style::rounded()),
            TableStyle::Sharp => table.with(Style::sharp()),
            TableStyle::Markdown => table.with(Style::markdown()),
            TableStyle::Blank => table.with(Style::blank()),
        };
    }

    /// Renders the runs as a table string, one row per run.
    pub fn render<'a>(&self, results: impl IntoIterator<Item = &'a RunResult>) -> String {
        let rows: Vec<RunRow> = results.into_iter().map(RunRow::from).collect();

        let mut table = Table::new(&rows);
        self.apply_style(&mut table);

        if let Some(ref title) = self.config.title {
            format!("{}\n{}", title, table)
        } else {
            table.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Strategy;
    use crate::sharding::ShardingMode;
    use std::time::Duration;

    fn result(workers: usize, total: u64) -> RunResult {
        RunResult {
            strategy: Strategy::PerThread,
            sharding: ShardingMode::Logical,
            workers,
            increments_per_worker: 250,
            shards: workers,
            threshold: Some(1000),
            pinned_workers: 0,
            total,
            expected: workers as u64 * 250,
            elapsed: Duration::from_millis(3),
        }
    }

    #[test]
    fn test_render_empty() {
        let results: [RunResult; 0] = [];
        let output = TableObserver::new().render(&results);
        assert!(output.contains("Threads"));
    }

    #[test]
    fn test_render_rows() {
        let results = [result(1, 250), result(4, 1000)];
        let output = TableObserver::new().render(&results);
        assert!(output.contains("per-thread"));
        assert!(output.contains("1000"));
        assert!(output.contains("3.00"));
        assert!(output.contains("✓"));
        assert!(!output.contains("✗"));
    }

    #[test]
    fn test_render_flags_inconsistent_run() {
        let output = TableObserver::new().render(&[result(2, 499)]);
        assert!(output.contains("✗"));
    }

    #[test]
    fn test_render_with_title() {
        let output = TableObserver::new()
            .with_title("sweep")
            .render(&[result(1, 250)]);
        assert!(output.starts_with("sweep\n"));
    }

    #[test]
    fn test_render_styles() {
        let results = [result(1, 250)];
        let ascii = TableObserver::new()
            .with_style(TableStyle::Ascii)
            .render(&results);
        assert!(ascii.contains('+'));

        let markdown = TableObserver::new()
            .with_style(TableStyle::Markdown)
            .render(&results);
        assert!(markdown.contains('|'));
    }
}
