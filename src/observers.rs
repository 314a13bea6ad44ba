//! Observers that turn benchmark results into output.
//!
//! - [`text`] - The classic three-line report (always available)
//! - [`table`] - One row per run, rendered with the `tabled` crate
//! - [`json`] - Serialize runs to JSON
//!
//! # Feature Flags
//!
//! - `table` - Enables the [`table`] module
//! - `json` - Enables the [`json`] module
//! - `cli` - Enables both, plus the binaries
//!
//! # Example
//!
//! ```rust,ignore
//! use sloppy::observers::text::{TextObserver, TimeUnit};
//! use sloppy::runner::{execute, RunConfig};
//!
//! let result = execute(&RunConfig::new(8, 10_000))?;
//! println!("{}", TextObserver::new().with_unit(TimeUnit::Millis).render(&result));
//! ```

mod error;

pub use error::{ObserverError, Result};

pub mod text;

#[cfg(feature = "table")]
pub mod table;

#[cfg(feature = "json")]
pub mod json;
