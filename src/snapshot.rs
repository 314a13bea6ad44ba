//! Serializable snapshots of benchmark results.
//!
//! # Feature Flag
//!
//! This module requires the `serde` feature:
//!
//! ```toml
//! [dependencies]
//! sloppy = { version = "0.1", features = ["serde"] }
//! ```
//!
//! # Examples
//!
//! ```rust,ignore
//! use sloppy::runner::{execute, RunConfig};
//! use sloppy::snapshot::RunSnapshot;
//!
//! let result = execute(&RunConfig::new(4, 1000))?;
//! let snapshot = RunSnapshot::from(&result);
//!
//! // Serialize with any serde-compatible format
//! let json = serde_json::to_string(&snapshot)?;
//! ```

use crate::runner::{RunResult, Strategy};
use crate::sharding::ShardingMode;
use serde::{Deserialize, Serialize};

/// A flattened, serializable view of one [`RunResult`].
///
/// Elapsed time is stored in milliseconds rather than as a `Duration`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSnapshot {
    /// Counter that was exercised.
    pub strategy: Strategy,
    /// Sharding that was used.
    pub sharding: ShardingMode,
    /// Number of workers.
    pub workers: usize,
    /// Increments per worker.
    pub increments_per_worker: u64,
    /// Number of independent local counts.
    pub shards: usize,
    /// Flush threshold, absent for the locked counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<u64>,
    /// Workers pinned to a core.
    pub pinned_workers: usize,
    /// Final total.
    pub total: u64,
    /// Expected total.
    pub expected: u64,
    /// Wall time in milliseconds.
    pub elapsed_ms: f64,
    /// Whether `total == expected`.
    pub consistent: bool,
}

impl From<&RunResult> for RunSnapshot {
    fn from(result: &RunResult) -> Self {
        Self {
            strategy: result.strategy,
            sharding: result.sharding,
            workers: result.workers,
            increments_per_worker: result.increments_per_worker,
            shards: result.shards,
            threshold: result.threshold,
            pinned_workers: result.pinned_workers,
            total: result.total,
            expected: result.expected,
            elapsed_ms: result.elapsed_ms(),
            consistent: result.is_consistent(),
        }
    }
}

/// A collection of run snapshots, typically one sweep.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SweepSnapshot {
    /// Optional timestamp in milliseconds since Unix epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<u64>,
    /// The runs, in execution order.
    pub runs: Vec<RunSnapshot>,
}

impl SweepSnapshot {
    /// Creates a new sweep snapshot with the given runs.
    pub fn new(runs: Vec<RunSnapshot>) -> Self {
        Self {
            timestamp_ms: None,
            runs,
        }
    }

    /// Collects snapshots from a sequence of results.
    pub fn collect<'a>(results: impl IntoIterator<Item = &'a RunResult>) -> Self {
        Self::new(results.into_iter().map(RunSnapshot::from).collect())
    }
}
