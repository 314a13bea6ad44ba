//! # Sloppy - Approximate Sharded Counters
//!
//! A Rust library of thread-safe counters that trade read accuracy for
//! write scalability, plus a small harness that measures them under
//! concurrent load.
//!
//! ## The Problem
//!
//! The obvious concurrent counter is a single integer behind a single lock.
//! It is always exact, but every increment from every thread serializes on
//! that lock and its cache line bounces between cores. The more threads
//! count, the slower each of them gets.
//!
//! ## The Solution: Sloppy Counters
//!
//! A sloppy counter splits the count into **local** counts, one per shard,
//! and a **global** accumulator. Threads increment the local count of their
//! shard and only move it into the global accumulator once it reaches a
//! **threshold**. Contention on the global lock drops by roughly that
//! factor.
//!
//! ### Design Principles
//!
//! 1. **Locked Shards**: Each shard is a [`parking_lot::Mutex`] around a
//!    `u64`. Threads mapped to the same shard still coordinate, threads on
//!    different shards never do.
//!
//! 2. **Cache Line Padding**: Each shard and the global accumulator are
//!    wrapped in [`crossbeam_utils::CachePadded`], so neighbouring shards do
//!    not falsely share a cache line.
//!
//! 3. **Fixed Lock Order**: A flush holds the shard lock and then takes the
//!    global lock. Nothing ever locks in the opposite order.
//!
//! 4. **Reconcile on Read**: The global accumulator alone may under-report
//!    by up to `shards × (threshold - 1)`. [`Counter::total`](counters::Counter::total) adds the
//!    outstanding local counts back in, and is exact once writers are done.
//!
//! ## Available Counter Types
//!
//! | Type | Description | Use Case |
//! |------|-------------|----------|
//! | [`Locked`](counters::locked::Locked) | One integer, one lock | Baseline, low contention |
//! | [`Sloppy`](counters::sloppy::Sloppy) | Locked shards flushing into a global | Shared by many threads |
//! | [`PerThread`](adapters::PerThread) | Unlocked thread-owned tallies flushing into a global | One tally per worker |
//!
//! ## Quick Start
//!
//! ```rust
//! use sloppy::counters::sloppy::Sloppy;
//!
//! let counter = Sloppy::new(4).with_name("requests").with_threshold(100);
//!
//! counter.increment(0);
//! counter.increment(3);
//!
//! // The global accumulator has not seen a flush yet.
//! assert_eq!(counter.global_value(), 0);
//! // The reconciled total is exact.
//! assert_eq!(counter.total(), 2);
//! ```
//!
//! ## Measuring
//!
//! The [`runner`] module spawns worker threads, maps them onto shards
//! through a [`sharding::Placement`] and times the whole run:
//!
//! ```rust
//! use sloppy::runner::{execute, RunConfig, Strategy};
//!
//! let result = execute(&RunConfig::new(4, 10_000).with_strategy(Strategy::PerThread))?;
//! assert_eq!(result.total, 40_000);
//! assert!(result.is_consistent());
//! # Ok::<(), sloppy::error::RunError>(())
//! ```
//!
//! ## Observers
//!
//! Run results can be rendered in several formats. All but the plain text
//! observer are gated behind a feature flag:
//!
//! | Feature | Module | Description |
//! |---------|--------|-------------|
//! | - | [`observers::text`] | The classic three-line report |
//! | `table` | `observers::table` | One row per run as an ASCII table |
//! | `json` | `observers::json` | Serialize runs and sweeps to JSON |
//!
//! The `cli` feature, on by default, builds the command line programs and
//! pulls in `table` and `json`.

pub mod adapters;
pub mod counters;
pub mod error;
pub mod observers;
pub mod runner;
pub mod sharding;

#[cfg(feature = "serde")]
pub mod snapshot;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "cli")]
pub mod logging;
