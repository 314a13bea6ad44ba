//! JSON observer for benchmark runs.
//!
//! This module provides [`JsonObserver`], which serializes [`RunResult`]s
//! through [`RunSnapshot`] using serde.
//!
//! # Feature Flag
//!
//! This module requires the `json` feature:
//!
//! ```toml
//! [dependencies]
//! sloppy = { version = "0.1", features = ["json"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use sloppy::observers::json::JsonObserver;
//! use sloppy::runner::{execute, RunConfig};
//!
//! let result = execute(&RunConfig::new(4, 1000))?;
//! println!("{}", JsonObserver::new().to_json(&result)?);
//! // {"strategy":"sloppy","sharding":"logical","workers":4,...,"consistent":true}
//! ```

use crate::runner::RunResult;
use crate::snapshot::{RunSnapshot, SweepSnapshot};

#[derive(Debug, Clone, Default)]
struct JsonConfig {
    pretty: bool,
    include_timestamp: bool,
}

/// An observer that serializes runs to JSON.
#[derive(Debug, Clone, Default)]
pub struct JsonObserver {
    config: JsonConfig,
}

impl JsonObserver {
    /// Creates a new JSON observer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables pretty-printing.
    pub fn pretty(mut self, enabled: bool) -> Self {
        self.config.pretty = enabled;
        self
    }

    /// Enables or disables the timestamp on sweeps.
    pub fn include_timestamp(mut self, enabled: bool) -> Self {
        self.config.include_timestamp = enabled;
        self
    }

    /// Serializes a single run as a JSON object.
    pub fn to_json(&self, result: &RunResult) -> Result<String, serde_json::Error> {
        self.serialize(&RunSnapshot::from(result))
    }

    /// Serializes a sequence of runs as a [`SweepSnapshot`] object.
    pub fn to_json_all<'a>(
        &self,
        results: impl IntoIterator<Item = &'a RunResult>,
    ) -> Result<String, serde_json::Error> {
        let mut snapshot = SweepSnapshot::collect(results);
        if self.config.include_timestamp {
            snapshot.timestamp_ms = Some(current_timestamp_ms());
        }
        self.serialize(&snapshot)
    }

    fn serialize<T: serde::Serialize>(&self, value: &T) -> Result<String, serde_json::Error> {
        if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
    }
}

/// Returns the current timestamp in milliseconds since Unix epoch.
fn current_timestamp_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::Strategy;
    use crate::sharding::ShardingMode;
    use std::time::Duration;

    fn result(workers: usize) -> RunResult {
        RunResult {
            strategy: Strategy::Sloppy,
            sharding: ShardingMode::CpuAffinity,
            workers,
            increments_per_worker: 10,
            shards: 2,
            threshold: Some(1000),
            pinned_workers: workers,
            total: workers as u64 * 10,
            expected: workers as u64 * 10,
            elapsed: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_to_json_single_run() {
        let json = JsonObserver::new().to_json(&result(4)).unwrap();
        assert!(json.starts_with('{'));
        assert!(json.contains(r#""sharding":"cpu-affinity""#));
        assert!(json.contains(r#""total":40"#));
        assert!(json.contains(r#""pinned_workers":4"#));
    }

    #[test]
    fn test_to_json_pretty() {
        let json = JsonObserver::new().pretty(true).to_json(&result(1)).unwrap();
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_all() {
        let results = [result(1), result(2)];
        let json = JsonObserver::new().to_json_all(&results).unwrap();
        let parsed: SweepSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.runs.len(), 2);
        assert_eq!(parsed.timestamp_ms, None);
        assert_eq!(parsed.runs[1].total, 20);
    }

    #[test]
    fn test_to_json_all_with_timestamp() {
        let results = [result(1)];
        let json = JsonObserver::new()
            .include_timestamp(true)
            .to_json_all(&results)
            .unwrap();
        let parsed: SweepSnapshot = serde_json::from_str(&json).unwrap();
        assert!(parsed.timestamp_ms.is_some());
    }
}
