//! Benchmark harness: spawn workers, hammer a counter, join, measure.
//!
//! [`run`] is the core loop. It spawns one scoped thread per worker, lets each
//! one perform its increments against the shard its [`Placement`] assigns,
//! and waits for all of them. The join barrier is the only ordering point:
//! once it has been passed every increment is visible to
//! [`Counter::total`].
//!
//! [`execute`] builds the counter described by a [`RunConfig`] and runs it;
//! [`sweep`] repeats that for a range of thread counts while keeping the total
//! amount of work constant.
//!
//! ```rust
//! use sloppy::runner::{execute, RunConfig, Strategy};
//!
//! let config = RunConfig::new(4, 10_000)
//!     .with_strategy(Strategy::Sloppy)
//!     .with_shards(2);
//! let result = execute(&config).unwrap();
//!
//! assert_eq!(result.total, 40_000);
//! assert!(result.is_consistent());
//! ```

use std::fmt::{self, Display};
use std::ops::RangeInclusive;
use std::thread::{self, ScopedJoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::adapters::PerThread;
use crate::counters::locked::Locked;
use crate::counters::sloppy::Sloppy;
use crate::counters::{Counter, DEFAULT_THRESHOLD};
use crate::error::{ConfigError, Result, RunError};
use crate::sharding::{self, Placement, ShardAssignment, ShardingMode};

/// Largest number of workers a single run spawns.
pub const MAX_WORKERS: usize = 1 << 15;

/// Which counter a run exercises.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum Strategy {
    /// One value behind one global lock.
    Locked,
    /// Locked shards flushing into a global accumulator.
    #[default]
    Sloppy,
    /// Thread-owned tallies flushing into a global accumulator.
    PerThread,
}

impl Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Locked => f.write_str("locked"),
            Strategy::Sloppy => f.write_str("sloppy"),
            Strategy::PerThread => f.write_str("per-thread"),
        }
    }
}

/// Parameters of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of worker threads.
    pub workers: usize,
    /// Increments each worker performs.
    pub increments_per_worker: u64,
    /// Counter under test.
    pub strategy: Strategy,
    /// How workers are mapped onto shards.
    pub sharding: ShardingMode,
    /// Shard count. `None` lets the placement choose (one per core).
    pub shards: Option<usize>,
    /// Flush threshold for the sloppy strategies.
    pub threshold: u64,
}

impl RunConfig {
    /// Creates a config for `workers` workers doing `increments_per_worker`
    /// increments each, with the default strategy, logical sharding and the
    /// [`DEFAULT_THRESHOLD`].
    pub fn new(workers: usize, increments_per_worker: u64) -> Self {
        Self {
            workers,
            increments_per_worker,
            strategy: Strategy::default(),
            sharding: ShardingMode::default(),
            shards: None,
            threshold: DEFAULT_THRESHOLD,
        }
    }

    /// Sets the counter under test.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Sets the sharding mode.
    pub fn with_sharding(mut self, sharding: ShardingMode) -> Self {
        self.sharding = sharding;
        self
    }

    /// Sets an explicit shard count.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = Some(shards);
        self
    }

    /// Sets the flush threshold.
    pub fn with_threshold(mut self, threshold: u64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Checks every parameter. Nothing is spawned for a config that fails.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.workers > MAX_WORKERS {
            return Err(ConfigError::TooManyWorkers {
                workers: self.workers,
                max: MAX_WORKERS,
            });
        }
        if self.increments_per_worker == 0 {
            return Err(ConfigError::NoIncrements);
        }
        if self.shards == Some(0) {
            return Err(ConfigError::NoShards);
        }
        if self.threshold == 0 {
            return Err(ConfigError::ZeroThreshold);
        }
        self.expected_total().map(|_| ())
    }

    /// Returns `workers * increments_per_worker`.
    pub fn expected_total(&self) -> std::result::Result<u64, ConfigError> {
        u64::try_from(self.workers)
            .ok()
            .and_then(|workers| workers.checked_mul(self.increments_per_worker))
            .ok_or(ConfigError::ExpectedOverflow {
                workers: self.workers,
                increments: self.increments_per_worker,
            })
    }
}

/// What [`run`] observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Measurement {
    /// Counter total read after the join barrier.
    pub total: u64,
    /// Time from just before the first spawn to just after the last join.
    pub elapsed: Duration,
    /// Workers whose thread was actually pinned to a core.
    pub pinned_workers: usize,
}

/// Immutable report of a finished run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunResult {
    /// Counter that was exercised.
    pub strategy: Strategy,
    /// Sharding actually used (after any fallback).
    pub sharding: ShardingMode,
    /// Number of workers.
    pub workers: usize,
    /// Increments each worker performed.
    pub increments_per_worker: u64,
    /// Number of independent local counts.
    pub shards: usize,
    /// Flush threshold, for the sloppy strategies.
    pub threshold: Option<u64>,
    /// Workers whose thread was pinned to a core.
    pub pinned_workers: usize,
    /// Final counter total.
    pub total: u64,
    /// `workers * increments_per_worker`.
    pub expected: u64,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl RunResult {
    /// Returns `true` if the counter saw every increment.
    pub fn is_consistent(&self) -> bool {
        self.total == self.expected
    }

    /// Elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Elapsed time in seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Increments per second over the whole run.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.total as f64 / secs
        } else {
            0.0
        }
    }
}

/// Runs `workers` threads that each call [`Counter::drive`] with
/// `increments_per_worker` on the shard `placement` assigns them, then reads
/// the total after all of them have been joined.
///
/// At most [`MAX_WORKERS`] workers are accepted. A panicking worker fails the
/// whole run with [`RunError::WorkerPanicked`] once every other worker has
/// been joined.
pub fn run<C>(
    counter: &C,
    workers: usize,
    increments_per_worker: u64,
    placement: &dyn Placement,
) -> Result<Measurement>
where
    C: Counter + ?Sized,
{
    if workers == 0 {
        return Err(ConfigError::NoWorkers.into());
    }
    if workers > MAX_WORKERS {
        return Err(ConfigError::TooManyWorkers {
            workers,
            max: MAX_WORKERS,
        }
        .into());
    }

    let num_shards = counter.num_shards();
    let assignments: Vec<ShardAssignment> = (0..workers)
        .map(|worker| placement.assign(worker, num_shards))
        .collect();
    for assignment in &assignments {
        debug!(
            worker = assignment.worker,
            shard = assignment.shard,
            core = ?assignment.core,
            "worker assigned"
        );
    }

    let start = Instant::now();
    let joined = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers);
        for assignment in &assignments {
            let spawned = thread::Builder::new()
                .name(format!("worker-{}", assignment.worker))
                .spawn_scoped(scope, move || {
                    let pinned = placement.bind(assignment);
                    counter.drive(assignment.shard, increments_per_worker);
                    pinned
                });
            match spawned {
                Ok(handle) => handles.push((assignment.worker, handle)),
                Err(source) => {
                    // Settle the workers already running before giving up.
                    let _ = join_all(handles);
                    return Err(RunError::Spawn {
                        worker: assignment.worker,
                        source,
                    });
                }
            }
        }
        join_all(handles)
    });
    let elapsed = start.elapsed();
    let pinned_workers = joined?;

    Ok(Measurement {
        total: counter.total(),
        elapsed,
        pinned_workers,
    })
}

/// Joins every handle and returns how many workers were pinned.
fn join_all(handles: Vec<(usize, ScopedJoinHandle<'_, bool>)>) -> Result<usize> {
    let mut pinned = 0;
    let mut panicked = None;
    for (worker, handle) in handles {
        match handle.join() {
            Ok(true) => pinned += 1,
            Ok(false) => {}
            Err(_) => {
                error!(worker, "worker panicked");
                panicked.get_or_insert(worker);
            }
        }
    }
    match panicked {
        Some(worker) => Err(RunError::WorkerPanicked { worker }),
        None => Ok(pinned),
    }
}

/// Validates `config`, builds the counter it describes and runs it.
pub fn execute(config: &RunConfig) -> Result<RunResult> {
    config.validate()?;
    let expected = config.expected_total()?;

    let placement = sharding::placement(config.sharding);
    let shards = config
        .shards
        .unwrap_or_else(|| placement.preferred_shards())
        .max(1);

    info!(
        strategy = %config.strategy,
        sharding = %placement.mode(),
        workers = config.workers,
        increments_per_worker = config.increments_per_worker,
        shards,
        "starting run"
    );

    let workers = config.workers;
    let increments = config.increments_per_worker;
    let (measurement, shards, threshold) = match config.strategy {
        Strategy::Locked => {
            let counter = Locked::new().with_name("locked");
            (run(&counter, workers, increments, placement.as_ref())?, 1, None)
        }
        Strategy::Sloppy => {
            let counter = Sloppy::new(shards)
                .with_threshold(config.threshold)
                .with_name("sloppy");
            (
                run(&counter, workers, increments, placement.as_ref())?,
                shards,
                Some(config.threshold),
            )
        }
        Strategy::PerThread => {
            // Every worker owns its local count; the shards are never used.
            let counter = PerThread::new(
                Sloppy::new(1)
                    .with_threshold(config.threshold)
                    .with_name("per-thread"),
            );
            (
                run(&counter, workers, increments, placement.as_ref())?,
                workers,
                Some(config.threshold),
            )
        }
    };

    let result = RunResult {
        strategy: config.strategy,
        sharding: placement.mode(),
        workers,
        increments_per_worker: increments,
        shards,
        threshold,
        pinned_workers: measurement.pinned_workers,
        total: measurement.total,
        expected,
        elapsed: measurement.elapsed,
    };

    info!(
        total = result.total,
        expected = result.expected,
        elapsed_ms = result.elapsed_ms(),
        pinned = result.pinned_workers,
        "run finished"
    );
    if !result.is_consistent() {
        warn!(
            total = result.total,
            expected = result.expected,
            "counter total does not match the expected value"
        );
    }
    Ok(result)
}

/// Runs `template` once per thread count in `threads`, splitting
/// `total_increments` evenly between the workers of each run.
///
/// Every config is validated before the first run starts.
pub fn sweep(
    template: &RunConfig,
    threads: RangeInclusive<usize>,
    total_increments: u64,
) -> Result<Vec<RunResult>> {
    if threads.is_empty() {
        return Err(ConfigError::EmptySweep {
            min: *threads.start(),
            max: *threads.end(),
        }
        .into());
    }

    let configs = threads
        .map(|workers| {
            let per_worker = u64::try_from(workers)
                .ok()
                .and_then(|n| total_increments.checked_div(n))
                .unwrap_or(0);
            let config = RunConfig {
                workers,
                increments_per_worker: per_worker,
                ..template.clone()
            };
            config.validate().map(|()| config)
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    configs.iter().map(execute).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharding::Logical;

    /// Hands every worker a shard one past the end.
    #[derive(Debug)]
    struct OutOfRange;

    impl Placement for OutOfRange {
        fn mode(&self) -> ShardingMode {
            ShardingMode::Logical
        }

        fn preferred_shards(&self) -> usize {
            1
        }

        fn assign(&self, worker: usize, num_shards: usize) -> ShardAssignment {
            ShardAssignment {
                worker,
                shard: num_shards,
                core: None,
            }
        }

        fn bind(&self, _assignment: &ShardAssignment) -> bool {
            false
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = RunConfig::new(4, 10);
        assert_eq!(config.strategy, Strategy::Sloppy);
        assert_eq!(config.sharding, ShardingMode::Logical);
        assert_eq!(config.shards, None);
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
        assert_eq!(config.expected_total(), Ok(40));
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(RunConfig::new(0, 1).validate(), Err(ConfigError::NoWorkers));
        assert_eq!(
            RunConfig::new(1, 0).validate(),
            Err(ConfigError::NoIncrements)
        );
        assert_eq!(
            RunConfig::new(1, 1).with_shards(0).validate(),
            Err(ConfigError::NoShards)
        );
        assert_eq!(
            RunConfig::new(1, 1).with_threshold(0).validate(),
            Err(ConfigError::ZeroThreshold)
        );
        assert_eq!(
            RunConfig::new(2, u64::MAX).validate(),
            Err(ConfigError::ExpectedOverflow {
                workers: 2,
                increments: u64::MAX
            })
        );
        assert_eq!(RunConfig::new(3, 7).validate(), Ok(()));
    }

    #[test]
    fn test_execute_rejects_before_spawning() {
        let err = execute(&RunConfig::new(0, 100)).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::NoWorkers)));
    }

    #[test]
    fn test_run_rejects_zero_workers() {
        let counter = Sloppy::new(1);
        let err = run(&counter, 0, 10, &Logical).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::NoWorkers)));
    }

    #[test]
    fn test_worker_limit() {
        assert_eq!(RunConfig::new(MAX_WORKERS, 1).validate(), Ok(()));
        assert_eq!(
            RunConfig::new(MAX_WORKERS + 1, 1).validate(),
            Err(ConfigError::TooManyWorkers {
                workers: MAX_WORKERS + 1,
                max: MAX_WORKERS
            })
        );

        let counter = Sloppy::new(1);
        let err = run(&counter, usize::MAX, 1, &Logical).unwrap_err();
        assert!(matches!(
            err,
            RunError::Config(ConfigError::TooManyWorkers { workers, .. }) if workers == usize::MAX
        ));
        assert_eq!(counter.total(), 0);

        let err = execute(&RunConfig::new(usize::MAX, 1)).unwrap_err();
        assert!(matches!(
            err,
            RunError::Config(ConfigError::TooManyWorkers { .. })
        ));
    }

    #[test]
    fn test_totals_for_any_shard_count() {
        for workers in [1usize, 4, 16, 64] {
            for increments in [1u64, 1_000, 100_000] {
                let mut shard_counts = vec![1, workers.div_ceil(2), workers];
                shard_counts.dedup();
                for shards in shard_counts {
                    let counter = Sloppy::new(shards);
                    let measured = run(&counter, workers, increments, &Logical).unwrap();
                    assert_eq!(
                        measured.total,
                        workers as u64 * increments,
                        "workers={workers} increments={increments} shards={shards}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_totals_for_every_strategy() {
        for strategy in [Strategy::Locked, Strategy::Sloppy, Strategy::PerThread] {
            for workers in [1usize, 4, 16] {
                let config = RunConfig::new(workers, 1_000)
                    .with_strategy(strategy)
                    .with_shards(3);
                let result = execute(&config).unwrap();
                assert!(result.is_consistent(), "{strategy} with {workers} workers");
                assert_eq!(result.strategy, strategy);
            }
        }
    }

    #[test]
    fn test_single_shard_matches_global_lock() {
        let sloppy = Sloppy::new(1);
        let measured = run(&sloppy, 8, 10_000, &Logical).unwrap();
        assert_eq!(measured.total, 80_000);

        let locked = Locked::new();
        let measured = run(&locked, 8, 10_000, &Logical).unwrap();
        assert_eq!(measured.total, 80_000);
    }

    #[test]
    fn test_one_worker_per_shard() {
        let counter = Sloppy::new(8).with_threshold(1000);
        let measured = run(&counter, 8, 1_000_000, &Logical).unwrap();
        assert_eq!(measured.total, 8_000_000);
        // 1_000_000 is a multiple of the threshold, so every shard flushed
        assert_eq!(counter.global_value(), 8_000_000);
        for shard in 0..8 {
            assert_eq!(counter.local_value(shard), 0);
        }
    }

    #[test]
    fn test_four_workers_per_shard() {
        let counter = Sloppy::new(4);
        let measured = run(&counter, 16, 500, &Logical).unwrap();
        assert_eq!(measured.total, 8000);
        // each shard saw 4 x 500 = 2000 increments, two full flushes
        assert_eq!(counter.global_value(), 8000);
    }

    #[test]
    fn test_threshold_one() {
        let counter = Sloppy::new(4).with_threshold(1);
        let measured = run(&counter, 16, 1_000, &Logical).unwrap();
        assert_eq!(measured.total, 16_000);
        assert_eq!(counter.global_value(), 16_000);
    }

    #[test]
    fn test_total_stable_after_join() {
        let counter = Sloppy::new(3).with_threshold(7);
        run(&counter, 5, 333, &Logical).unwrap();
        let first = counter.total();
        assert_eq!(first, 5 * 333);
        assert_eq!(counter.total(), first);
    }

    #[test]
    fn test_worker_panic_fails_run() {
        let counter = Sloppy::new(2);
        let err = run(&counter, 4, 10, &OutOfRange).unwrap_err();
        assert!(matches!(err, RunError::WorkerPanicked { worker: 0 }));
    }

    #[test]
    fn test_cpu_affinity_run() {
        let config = RunConfig::new(4, 2_000).with_sharding(ShardingMode::CpuAffinity);
        let result = execute(&config).unwrap();
        assert!(result.is_consistent());
        assert!(result.pinned_workers <= result.workers);
        assert!(result.shards >= 1);
    }

    #[test]
    fn test_result_reports_config() {
        let config = RunConfig::new(2, 50)
            .with_strategy(Strategy::Sloppy)
            .with_shards(5)
            .with_threshold(9);
        let result = execute(&config).unwrap();
        assert_eq!(result.workers, 2);
        assert_eq!(result.increments_per_worker, 50);
        assert_eq!(result.shards, 5);
        assert_eq!(result.threshold, Some(9));
        assert_eq!(result.expected, 100);
        assert_eq!(result.total, 100);
        assert_eq!(result.sharding, ShardingMode::Logical);
        assert_eq!(result.pinned_workers, 0);
    }

    #[test]
    fn test_locked_result_has_one_shard() {
        let config = RunConfig::new(3, 10)
            .with_strategy(Strategy::Locked)
            .with_shards(8);
        let result = execute(&config).unwrap();
        assert_eq!(result.shards, 1);
        assert_eq!(result.threshold, None);
    }

    #[test]
    fn test_elapsed_conversions() {
        let result = RunResult {
            strategy: Strategy::Locked,
            sharding: ShardingMode::Logical,
            workers: 1,
            increments_per_worker: 500,
            shards: 1,
            threshold: None,
            pinned_workers: 0,
            total: 500,
            expected: 500,
            elapsed: Duration::from_millis(250),
        };
        assert_eq!(result.elapsed_ms(), 250.0);
        assert_eq!(result.elapsed_secs(), 0.25);
        assert_eq!(result.throughput(), 2000.0);
    }

    #[test]
    fn test_sweep() {
        let template = RunConfig::new(1, 1).with_shards(2);
        let results = sweep(&template, 1..=4, 1_000).unwrap();
        let workers: Vec<usize> = results.iter().map(|r| r.workers).collect();
        assert_eq!(workers, [1, 2, 3, 4]);
        let per_worker: Vec<u64> = results.iter().map(|r| r.increments_per_worker).collect();
        assert_eq!(per_worker, [1000, 500, 333, 250]);
        assert!(results.iter().all(RunResult::is_consistent));
    }

    #[test]
    fn test_sweep_rejects_empty_range() {
        #[allow(clippy::reversed_empty_ranges)]
        let err = sweep(&RunConfig::new(1, 1), 4..=2, 100).unwrap_err();
        assert!(matches!(
            err,
            RunError::Config(ConfigError::EmptySweep { min: 4, max: 2 })
        ));
    }

    #[test]
    fn test_sweep_validates_every_run_first() {
        let err = sweep(&RunConfig::new(1, 1), 1..=8, 4).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::NoIncrements)));

        let err = sweep(&RunConfig::new(1, 1), 0..=2, 4).unwrap_err();
        assert!(matches!(err, RunError::Config(ConfigError::NoWorkers)));
    }

    #[test]
    fn test_strategy_display() {
        assert_eq!(Strategy::Locked.to_string(), "locked");
        assert_eq!(Strategy::Sloppy.to_string(), "sloppy");
        assert_eq!(Strategy::PerThread.to_string(), "per-thread");
    }
}
