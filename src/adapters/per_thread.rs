//! Per-thread wrapper for sloppy counters.
//!
//! This module provides [`PerThread`], a wrapper that changes how a worker
//! drives a [`Sloppy`] counter: instead of incrementing a locked shard, each
//! worker accumulates into its own unlocked [`Tally`](crate::counters::sloppy::Tally)
//! and only takes the global lock when the tally reaches the threshold.
//!
//! # Example
//!
//! ```rust
//! use sloppy::adapters::PerThread;
//! use sloppy::counters::sloppy::Sloppy;
//! use sloppy::counters::Counter;
//!
//! let counter = PerThread::new(Sloppy::new(1).with_threshold(100));
//!
//! std::thread::scope(|s| {
//!     for _ in 0..4 {
//!         s.spawn(|| counter.drive(0, 250));
//!     }
//! });
//!
//! assert_eq!(counter.total(), 1000);
//! ```

use crate::counters::sloppy::Sloppy;
use crate::counters::Counter;
use std::fmt::{self, Debug};
use std::ops::Deref;

/// A wrapper that drives a [`Sloppy`] counter through thread-owned tallies.
///
/// Only the global lock is ever contended while a worker runs: the local
/// count lives on the worker's own stack. The remainder below the threshold
/// is handed over when the worker's tally is dropped at the end of
/// [`Counter::drive`], so the total is exact once the workers are joined.
///
/// Direct calls to [`Counter::increment`] still go through the wrapped
/// counter's locked shards.
pub struct PerThread {
    inner: Sloppy,
}

impl PerThread {
    /// Creates a new per-thread wrapper around the given counter.
    pub fn new(inner: Sloppy) -> Self {
        Self { inner }
    }

    /// Returns a reference to the inner counter.
    pub fn inner(&self) -> &Sloppy {
        &self.inner
    }

    /// Consumes the wrapper and returns the inner counter.
    pub fn into_inner(self) -> Sloppy {
        self.inner
    }
}

impl Counter for PerThread {
    fn name(&self) -> &str {
        Counter::name(&self.inner)
    }

    fn num_shards(&self) -> usize {
        self.inner.num_shards()
    }

    fn increment(&self, shard: usize) {
        self.inner.increment(shard);
    }

    fn total(&self) -> u64 {
        self.inner.total()
    }

    /// Runs the worker against a private tally. The shard is not touched.
    fn drive(&self, _shard: usize, count: u64) {
        let mut tally = self.inner.tally();
        for _ in 0..count {
            tally.increment();
        }
    }
}

impl Debug for PerThread {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerThread")
            .field("inner", &self.inner)
            .finish()
    }
}

/// Allows transparent access to the inner counter's methods.
impl Deref for PerThread {
    type Target = Sloppy;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let counter = PerThread::new(Sloppy::new(2).with_name("test"));
        assert_eq!(Counter::name(&counter), "test");
        assert_eq!(Counter::num_shards(&counter), 2);
        assert_eq!(Counter::total(&counter), 0);
    }

    #[test]
    fn test_drive_leaves_shards_untouched() {
        let counter = PerThread::new(Sloppy::new(2).with_threshold(10));
        counter.drive(1, 25);
        assert_eq!(counter.local_value(0), 0);
        assert_eq!(counter.local_value(1), 0);
        assert_eq!(counter.global_value(), 25);
    }

    #[test]
    fn test_increment_uses_locked_shard() {
        let counter = PerThread::new(Sloppy::new(2).with_threshold(10));
        Counter::increment(&counter, 1);
        assert_eq!(counter.local_value(1), 1);
        assert_eq!(Counter::total(&counter), 1);
    }

    #[test]
    fn test_multiple_threads() {
        let counter = PerThread::new(Sloppy::new(1));
        std::thread::scope(|s| {
            for _ in 0..16 {
                s.spawn(|| counter.drive(0, 1_001));
            }
        });
        assert_eq!(Counter::total(&counter), 16 * 1_001);
    }

    #[test]
    fn test_into_inner() {
        let counter = PerThread::new(Sloppy::new(1));
        counter.drive(0, 5);
        let inner = counter.into_inner();
        assert_eq!(inner.total(), 5);
    }

    #[test]
    fn test_debug() {
        let counter = PerThread::new(Sloppy::new(1).with_name("debug_test"));
        let debug_str = format!("{:?}", counter);
        assert!(debug_str.contains("PerThread"));
        assert!(debug_str.contains("debug_test"));
    }
}
