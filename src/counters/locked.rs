//! Globally locked counter.
//!
//! This module provides [`Locked`], the baseline every sloppy variant is
//! measured against: one `u64` behind one mutex. It is always exact, and every
//! increment from every thread serializes on the same lock, so throughput
//! saturates and then degrades once more threads than cores contend for it.

use parking_lot::Mutex;
use std::fmt::Debug;

use crate::counters::Counter;

/// A counter protected by a single global lock.
///
/// # Examples
///
/// ```rust
/// use sloppy::counters::locked::Locked;
/// use std::thread;
///
/// let counter = Locked::new();
///
/// thread::scope(|s| {
///     for _ in 0..4 {
///         s.spawn(|| {
///             for _ in 0..1000 {
///                 counter.increment();
///             }
///         });
///     }
/// });
///
/// assert_eq!(counter.value(), 4000);
/// ```
pub struct Locked {
    name: &'static str,
    value: Mutex<u64>,
}

impl Locked {
    /// Creates a new counter initialized to zero.
    pub const fn new() -> Self {
        Locked {
            name: "",
            value: Mutex::new(0),
        }
    }

    /// Sets the name of this counter, returning `self` for method chaining.
    pub const fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Adds one to the counter.
    #[inline]
    pub fn increment(&self) {
        *self.value.lock() += 1;
    }

    /// Adds `amount` to the counter.
    #[inline]
    pub fn add(&self, amount: u64) {
        *self.value.lock() += amount;
    }

    /// Returns the current value.
    #[inline]
    pub fn value(&self) -> u64 {
        *self.value.lock()
    }
}

impl Counter for Locked {
    #[inline]
    fn name(&self) -> &str {
        self.name
    }

    /// A locked counter has a single shard.
    #[inline]
    fn num_shards(&self) -> usize {
        1
    }

    /// Adds one to the counter. Every worker shares shard 0.
    #[inline]
    fn increment(&self, shard: usize) {
        assert!(shard == 0, "shard {shard} out of range for a locked counter");
        self.add(1);
    }

    #[inline]
    fn total(&self) -> u64 {
        self.value()
    }
}

impl Default for Locked {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Locked {
    /// Output format: `name{ value }`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ {} }}", self.name, self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::sloppy::Sloppy;

    #[test]
    fn test_new() {
        let counter = Locked::new();
        assert_eq!(counter.value(), 0);
        assert_eq!(Counter::num_shards(&counter), 1);
    }

    #[test]
    fn test_increment_and_add() {
        let counter = Locked::new();
        counter.increment();
        counter.add(4);
        assert_eq!(counter.value(), 5);
        assert_eq!(Counter::total(&counter), 5);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_nonzero_shard_panics() {
        let counter = Locked::new();
        Counter::increment(&counter, 1);
    }

    #[test]
    fn test_matches_single_shard_threshold_one() {
        let locked = Locked::new();
        let sloppy = Sloppy::new(1).with_threshold(1);
        for _ in 0..37 {
            Counter::increment(&locked, 0);
            sloppy.increment(0);
            assert_eq!(locked.value(), sloppy.global_value());
        }
    }

    #[test]
    fn test_multiple_threads() {
        let counter = Locked::new();
        std::thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| counter.drive(0, 10_000));
            }
        });
        assert_eq!(counter.value(), 80_000);
    }

    #[test]
    fn test_debug() {
        let counter = Locked::new().with_name("plain");
        counter.add(3);
        assert_eq!(format!("{:?}", counter), "plain{ 3 }");
    }

    #[test]
    fn test_dyn_format() {
        let counter = Locked::new();
        counter.add(9);
        assert_eq!(format!("{}", &counter as &dyn Counter), "9");
    }
}
