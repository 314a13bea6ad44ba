//! Runs the sloppy counter once for every thread count in a range.
//!
//! Usage: `counter-sweep <min_threads> <max_threads> <total_increments>`

use std::process::ExitCode;

use sloppy::cli::{sweep_main, Profile};

fn main() -> ExitCode {
    sweep_main(Profile::SWEEP)
}
