//! Wrapper types that change how workers drive a counter.
//!
//! | Wrapper | Description |
//! |---------|-------------|
//! | [`PerThread`] | Workers accumulate in thread-owned tallies and contend only on the global lock |
//!
//! # Example
//!
//! ```rust
//! use sloppy::adapters::PerThread;
//! use sloppy::counters::sloppy::Sloppy;
//! use sloppy::counters::Counter;
//!
//! let counter = PerThread::new(Sloppy::new(1));
//! counter.drive(0, 1500);
//!
//! // 1000 were flushed by the threshold, 500 when the worker's tally dropped.
//! assert_eq!(counter.global_value(), 1500);
//! ```

mod per_thread;

pub use per_thread::PerThread;
