//! Sloppy counter: sharded local counts with threshold-triggered flushes.
//!
//! This module provides [`Sloppy`], a counter whose increments scale across
//! many concurrent callers. Each shard keeps a local count behind its own lock
//! and only touches the shared global accumulator once every `threshold`
//! increments. The price is that the global accumulator lags behind the true
//! count until the shards are reconciled by [`Sloppy::total`].
//!
//! It also provides [`Tally`], an unlocked thread-owned local count that
//! flushes into the same global accumulator.

use crossbeam_utils::CachePadded;
use parking_lot::Mutex;
use std::fmt::Debug;

use crate::counters::{Counter, DEFAULT_THRESHOLD};

/// A sharded counter with per-shard local counts and a global accumulator.
///
/// Every shard is a cache-line padded mutex around a `u64`. An increment locks
/// only its own shard; when the shard's local count reaches the threshold the
/// increment also locks the global accumulator, moves the local count into
/// it and resets the shard to zero. The shard lock is held across that flush,
/// so a reader locking the same shard observes either the state before the
/// flush or after it, never a count that is in both places or in neither.
///
/// # Examples
///
/// Basic usage:
///
/// ```rust
/// use sloppy::counters::sloppy::Sloppy;
///
/// let counter = Sloppy::new(2).with_threshold(3);
/// counter.increment(0);
/// counter.increment(0);
/// assert_eq!(counter.global_value(), 0);
/// assert_eq!(counter.total(), 2);
///
/// counter.increment(0);
/// assert_eq!(counter.global_value(), 3);
/// assert_eq!(counter.local_value(0), 0);
/// ```
///
/// Multi-threaded usage:
///
/// ```rust
/// use sloppy::counters::sloppy::Sloppy;
/// use std::thread;
///
/// let counter = Sloppy::new(4);
///
/// thread::scope(|s| {
///     for worker in 0..8 {
///         let counter = &counter;
///         s.spawn(move || {
///             for _ in 0..1000 {
///                 counter.increment(worker % 4);
///             }
///         });
///     }
/// });
///
/// assert_eq!(counter.total(), 8000);
/// ```
pub struct Sloppy {
    name: &'static str,
    threshold: u64,
    global: CachePadded<Mutex<u64>>,
    shards: Box<[CachePadded<Mutex<u64>>]>,
}

impl Sloppy {
    /// Creates a counter with `num_shards` zeroed shards and the
    /// [`DEFAULT_THRESHOLD`].
    ///
    /// # Panics
    ///
    /// Panics if `num_shards` is zero.
    pub fn new(num_shards: usize) -> Self {
        assert!(num_shards > 0, "a sloppy counter needs at least one shard");
        let shards = (0..num_shards)
            .map(|_| CachePadded::new(Mutex::new(0)))
            .collect();
        Sloppy {
            name: "",
            threshold: DEFAULT_THRESHOLD,
            global: CachePadded::new(Mutex::new(0)),
            shards,
        }
    }

    /// Sets the local count at which a shard flushes into the global
    /// accumulator.
    ///
    /// A threshold of 1 flushes on every increment, which makes the counter
    /// behave like a single globally locked value (with extra locking).
    ///
    /// # Panics
    ///
    /// Panics if `threshold` is zero.
    pub fn with_threshold(self, threshold: u64) -> Self {
        assert!(threshold > 0, "the flush threshold must be at least 1");
        Self { threshold, ..self }
    }

    /// Sets the name of this counter, returning `self` for method chaining.
    ///
    /// ```rust
    /// use sloppy::counters::sloppy::Sloppy;
    /// use sloppy::counters::Counter;
    ///
    /// let counter = Sloppy::new(1).with_name("hits");
    /// assert_eq!(counter.name(), "hits");
    /// ```
    pub fn with_name(self, name: &'static str) -> Self {
        Self { name, ..self }
    }

    /// Returns the flush threshold.
    #[inline]
    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    /// Returns the number of shards.
    #[inline]
    pub fn num_shards(&self) -> usize {
        self.shards.len()
    }

    /// Adds one to `shard`, flushing it into the global accumulator if its
    /// local count reaches the threshold.
    ///
    /// # Panics
    ///
    /// Panics if `shard >= self.num_shards()`.
    #[inline]
    pub fn increment(&self, shard: usize) {
        self.add(shard, 1);
    }

    /// Adds `amount` to `shard`, flushing it into the global accumulator if
    /// its local count reaches the threshold.
    ///
    /// After this returns the shard's local count is below the threshold.
    ///
    /// # Panics
    ///
    /// Panics if `shard >= self.num_shards()`.
    pub fn add(&self, shard: usize, amount: u64) {
        let mut local = self.shards[shard].lock();
        *local += amount;
        if *local >= self.threshold {
            *self.global.lock() += *local;
            *local = 0;
        }
    }

    /// Moves whatever `shard` has accumulated into the global accumulator,
    /// regardless of the threshold.
    ///
    /// # Panics
    ///
    /// Panics if `shard >= self.num_shards()`.
    pub fn flush(&self, shard: usize) {
        let mut local = self.shards[shard].lock();
        if *local > 0 {
            *self.global.lock() += *local;
            *local = 0;
        }
    }

    /// Returns the reconciled value: the global accumulator plus every shard's
    /// local count.
    ///
    /// The global lock is released before the shards are visited, and each
    /// shard is locked on its own. The sum is exact once all incrementing
    /// threads have been joined; while increments are in flight it is a
    /// best-effort snapshot with no atomicity across shards.
    ///
    /// Counts still pending in live [`Tally`] handles are not included.
    pub fn total(&self) -> u64 {
        let mut total = *self.global.lock();
        for shard in self.shards.iter() {
            total += *shard.lock();
        }
        total
    }

    /// Returns the global accumulator alone.
    ///
    /// This under-reports the true count by whatever the shards have not yet
    /// flushed.
    #[inline]
    pub fn global_value(&self) -> u64 {
        *self.global.lock()
    }

    /// Returns the local count of `shard`.
    ///
    /// # Panics
    ///
    /// Panics if `shard >= self.num_shards()`.
    #[inline]
    pub fn local_value(&self, shard: usize) -> u64 {
        *self.shards[shard].lock()
    }

    /// Consumes the counter and returns its final total.
    pub fn into_total(self) -> u64 {
        self.total()
    }

    /// Returns a thread-owned local count that flushes into this counter's
    /// global accumulator.
    ///
    /// ```rust
    /// use sloppy::counters::sloppy::Sloppy;
    ///
    /// let counter = Sloppy::new(1).with_threshold(10);
    /// {
    ///     let mut tally = counter.tally();
    ///     for _ in 0..25 {
    ///         tally.increment();
    ///     }
    ///     assert_eq!(tally.pending(), 5);
    ///     assert_eq!(counter.global_value(), 20);
    /// }
    /// // Dropping the tally hands over the remainder.
    /// assert_eq!(counter.total(), 25);
    /// ```
    pub fn tally(&self) -> Tally<'_> {
        Tally {
            counter: self,
            local: 0,
        }
    }

    /// Adds an already accumulated amount straight to the global accumulator.
    #[inline]
    fn absorb(&self, amount: u64) {
        *self.global.lock() += amount;
    }
}

impl Counter for Sloppy {
    #[inline]
    fn name(&self) -> &str {
        self.name
    }

    #[inline]
    fn num_shards(&self) -> usize {
        self.shards.len()
    }

    #[inline]
    fn increment(&self, shard: usize) {
        self.add(shard, 1);
    }

    #[inline]
    fn total(&self) -> u64 {
        Sloppy::total(self)
    }
}

impl Debug for Sloppy {
    /// Formats the counter showing the global value and non-zero shards.
    ///
    /// Output format: `name{ global:value [shard]:value ... }`
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{{ global:{}", self.name, self.global_value())?;
        for (i, shard) in self.shards.iter().enumerate() {
            let val = *shard.lock();
            if val != 0 {
                write!(f, " [{i}]:{val}")?;
            }
        }
        write!(f, " }}")
    }
}

/// An unlocked local count owned by one thread.
///
/// A `Tally` accumulates without taking any lock and only locks the parent
/// counter's global accumulator when its count reaches the threshold. Whatever
/// is left when the tally is dropped is flushed, so joining the thread that
/// owned it is enough to make its whole contribution visible to
/// [`Sloppy::total`].
#[derive(Debug)]
pub struct Tally<'a> {
    counter: &'a Sloppy,
    local: u64,
}

impl Tally<'_> {
    /// Adds one to the local count.
    #[inline]
    pub fn increment(&mut self) {
        self.add(1);
    }

    /// Adds `amount` to the local count, flushing if it reaches the threshold.
    #[inline]
    pub fn add(&mut self, amount: u64) {
        self.local += amount;
        if self.local >= self.counter.threshold {
            self.counter.absorb(self.local);
            self.local = 0;
        }
    }

    /// Returns the count not yet flushed.
    #[inline]
    pub fn pending(&self) -> u64 {
        self.local
    }
}

impl Drop for Tally<'_> {
    fn drop(&mut self) {
        if self.local > 0 {
            self.counter.absorb(self.local);
            self.local = 0;
        }
    }
}
