//! Error types for configuring and running a benchmark.
//!
//! Counters themselves never fail: every error here is raised either while a
//! [`RunConfig`](crate::runner::RunConfig) is validated, before any worker
//! exists, or while workers are spawned and joined.

use thiserror::Error;

/// A rejected run configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The run has no workers.
    #[error("number of workers must be a positive integer")]
    NoWorkers,

    /// Workers have nothing to do.
    #[error("increments per worker must be a positive integer")]
    NoIncrements,

    /// More workers than a run may spawn.
    #[error("{workers} workers exceeds the limit of {max}")]
    TooManyWorkers {
        /// Requested number of workers.
        workers: usize,
        /// Largest accepted number of workers.
        max: usize,
    },

    /// An explicit shard count of zero was requested.
    #[error("number of shards must be a positive integer")]
    NoShards,

    /// A flush threshold of zero was requested.
    #[error("flush threshold must be a positive integer")]
    ZeroThreshold,

    /// `workers * increments` does not fit in a `u64`.
    #[error("{workers} workers x {increments} increments overflows the counter")]
    ExpectedOverflow {
        /// Requested number of workers.
        workers: usize,
        /// Requested increments per worker.
        increments: u64,
    },

    /// A sweep range that yields no runs.
    #[error("thread range {min}..={max} is empty")]
    EmptySweep {
        /// Smallest thread count.
        min: usize,
        /// Largest thread count.
        max: usize,
    },
}

/// Error raised by [`runner::run`](crate::runner::run) and friends.
#[derive(Debug, Error)]
pub enum RunError {
    /// The configuration was rejected before anything was spawned.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The OS refused to create a worker thread.
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        /// Index of the worker that could not be spawned.
        worker: usize,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A worker panicked, invalidating the whole run.
    #[error("worker {worker} panicked")]
    WorkerPanicked {
        /// Index of the first worker found to have panicked.
        worker: usize,
    },
}

/// Result type for benchmark operations.
pub type Result<T> = std::result::Result<T, RunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages() {
        assert_eq!(
            ConfigError::NoWorkers.to_string(),
            "number of workers must be a positive integer"
        );
        assert_eq!(
            ConfigError::EmptySweep { min: 4, max: 2 }.to_string(),
            "thread range 4..=2 is empty"
        );
        assert_eq!(
            ConfigError::TooManyWorkers {
                workers: 70_000,
                max: 32_768
            }
            .to_string(),
            "70000 workers exceeds the limit of 32768"
        );
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err = RunError::from(ConfigError::NoIncrements);
        assert_eq!(
            err.to_string(),
            "increments per worker must be a positive integer"
        );
        assert!(matches!(err, RunError::Config(ConfigError::NoIncrements)));
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        use std::error::Error as _;

        let err = RunError::Spawn {
            worker: 3,
            source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no memory"),
        };
        assert!(err.to_string().starts_with("failed to spawn worker 3"));
        assert!(err.source().is_some());
    }
}
