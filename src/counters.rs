//! Counter implementations and the trait they share.
//!
//! Two counters live here:
//!
//! - [`Locked`](locked::Locked): one value behind one mutex. Every increment
//!   from every thread goes through the same lock.
//! - [`Sloppy`](sloppy::Sloppy): a value split into shards, each with its own
//!   lock and local count, plus a global accumulator that shards flush into
//!   once their local count reaches a threshold.
//!
//! # Architecture
//!
//! ```text
//!                         ┌──────────────────────────────────────┐
//!                         │            Sloppy counter            │
//!                         ├──────────────────────────────────────┤
//!   Worker 0 ──lock──►    │ [Shard 0] local (CachePadded Mutex)  │──┐
//!   Worker 1 ──lock──►    │ [Shard 1] local (CachePadded Mutex)  │──┤ flush when
//!        ...              │    ...                               │  │ local >= threshold
//!   Worker N ──lock──►    │ [Shard N] local (CachePadded Mutex)  │──┤
//!                         ├──────────────────────────────────────┤  │
//!                         │ global accumulator (Mutex)           │◄─┘
//!                         └──────────────────────────────────────┘
//!                                          │
//!                                          ▼
//!                               total() = global + Σ local
//! ```
//!
//! # Lock Ordering
//!
//! A flush takes the global lock while still holding the shard lock. No code
//! path takes them in the opposite order, and no code path holds two shard
//! locks at once, so concurrent flushers cannot deadlock.

pub mod locked;
pub mod sloppy;

use std::fmt::{Debug, Display};

/// Local count at which a shard flushes into the global accumulator.
///
/// Lower values push more traffic onto the global lock; higher values leave
/// more of the count invisible to concurrent readers of the global value.
pub const DEFAULT_THRESHOLD: u64 = 1000;

/// A counter that can be driven by the benchmark runner.
///
/// Implementors are `Sync`: one instance is shared by reference between all
/// worker threads of a run.
///
/// # Examples
///
/// ```rust
/// use sloppy::counters::Counter;
/// use sloppy::counters::sloppy::Sloppy;
///
/// let counter = Sloppy::new(4).with_name("requests");
/// counter.increment(0);
/// counter.increment(3);
///
/// let dynamic: &dyn Counter = &counter;
/// assert_eq!(dynamic.total(), 2);
/// assert_eq!(dynamic.to_string(), "requests:2");
/// ```
pub trait Counter: Debug + Sync {
    /// Returns the name of this counter, or an empty string.
    fn name(&self) -> &str;

    /// Returns the number of shards a worker may be assigned to.
    ///
    /// Valid shard indexes are `0..num_shards()`.
    fn num_shards(&self) -> usize;

    /// Adds one to the counter on behalf of a worker bound to `shard`.
    ///
    /// # Panics
    ///
    /// Panics if `shard >= num_shards()`.
    fn increment(&self, shard: usize);

    /// Returns the reconciled value of the counter.
    ///
    /// Exact once every incrementing thread has been joined. While increments
    /// are in flight the result is a best-effort snapshot.
    fn total(&self) -> u64;

    /// Performs one worker's whole workload: `count` increments on `shard`.
    fn drive(&self, shard: usize, count: u64) {
        for _ in 0..count {
            self.increment(shard);
        }
    }
}

impl Display for dyn Counter + '_ {
    /// Formats the counter as `name:total` if named, or just `total` otherwise.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.name().is_empty() {
            write!(f, "{}:{}", self.name(), self.total())
        } else {
            write!(f, "{}", self.total())
        }
    }
}
