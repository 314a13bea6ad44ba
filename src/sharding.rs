//! Worker-to-shard placement.
//!
//! A [`Placement`] decides which shard a worker increments and, optionally,
//! which CPU core the worker's thread runs on. Two capabilities exist:
//!
//! - [`Logical`]: `shard = worker % num_shards`. Portable and always
//!   available, but nothing stops the scheduler from migrating a worker to
//!   another core halfway through a run.
//! - [`CpuAffinity`]: worker `i` is pinned to the `i % cores`-th available
//!   core and uses that core's shard, so a core mostly touches its own shard's
//!   lock and count.
//!
//! Pinning is best-effort. [`placement`] falls back to [`Logical`] when the
//! platform cannot enumerate cores, and [`Placement::bind`] reports whether a
//! thread was really pinned. A failed pin never changes the shard, so totals
//! stay exact either way.

use core_affinity::CoreId;
use std::fmt::{self, Debug, Display};
use std::num::NonZeroUsize;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How workers are mapped onto shards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "kebab-case")
)]
pub enum ShardingMode {
    /// Shard chosen by worker index modulo shard count.
    #[default]
    Logical,
    /// Shard chosen by the CPU core the worker is pinned to.
    CpuAffinity,
}

impl Display for ShardingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShardingMode::Logical => f.write_str("logical"),
            ShardingMode::CpuAffinity => f.write_str("cpu-affinity"),
        }
    }
}

/// The shard (and core, if any) a worker is bound to for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardAssignment {
    /// Index of the worker.
    pub worker: usize,
    /// Shard the worker increments.
    pub shard: usize,
    /// Core the worker should be pinned to. `None` for logical placement.
    pub core: Option<usize>,
}

impl ShardAssignment {
    /// Returns `true` if the assignment targets a physical core.
    pub fn is_physical(&self) -> bool {
        self.core.is_some()
    }
}

/// Capability that maps workers to shards.
pub trait Placement: Debug + Send + Sync {
    /// Returns which mode this placement implements.
    fn mode(&self) -> ShardingMode;

    /// Returns the shard count this placement works best with.
    fn preferred_shards(&self) -> usize;

    /// Computes the assignment of `worker` on a counter with `num_shards`
    /// shards. The returned shard is always below `num_shards`.
    fn assign(&self, worker: usize, num_shards: usize) -> ShardAssignment;

    /// Binds the calling thread according to `assignment`.
    ///
    /// Called from the worker's own thread before its first increment.
    /// Returns `true` if the thread is now pinned to a core.
    fn bind(&self, assignment: &ShardAssignment) -> bool;
}

/// Portable placement by worker index.
#[derive(Debug, Clone, Copy, Default)]
pub struct Logical;

impl Placement for Logical {
    fn mode(&self) -> ShardingMode {
        ShardingMode::Logical
    }

    fn preferred_shards(&self) -> usize {
        online_cpus()
    }

    fn assign(&self, worker: usize, num_shards: usize) -> ShardAssignment {
        ShardAssignment {
            worker,
            shard: worker % num_shards,
            core: None,
        }
    }

    fn bind(&self, _assignment: &ShardAssignment) -> bool {
        false
    }
}

/// Placement that pins each worker to a CPU core.
#[derive(Debug, Clone)]
pub struct CpuAffinity {
    cores: Vec<CoreId>,
}

impl CpuAffinity {
    /// Enumerates the cores this process may run on.
    ///
    /// Returns `None` if the platform does not expose core affinity.
    pub fn detect() -> Option<Self> {
        core_affinity::get_core_ids()
            .filter(|cores| !cores.is_empty())
            .map(|cores| Self { cores })
    }

    /// Builds a placement over an explicit list of core ids.
    ///
    /// Returns `None` if `cores` is empty.
    pub fn with_cores(cores: impl IntoIterator<Item = usize>) -> Option<Self> {
        let cores: Vec<CoreId> = cores.into_iter().map(|id| CoreId { id }).collect();
        if cores.is_empty() {
            None
        } else {
            Some(Self { cores })
        }
    }

    /// Returns the number of cores workers are spread over.
    pub fn num_cores(&self) -> usize {
        self.cores.len()
    }
}

impl Placement for CpuAffinity {
    fn mode(&self) -> ShardingMode {
        ShardingMode::CpuAffinity
    }

    fn preferred_shards(&self) -> usize {
        self.cores.len()
    }

    fn assign(&self, worker: usize, num_shards: usize) -> ShardAssignment {
        let slot = worker % self.cores.len();
        ShardAssignment {
            worker,
            shard: slot % num_shards,
            core: Some(self.cores[slot].id),
        }
    }

    fn bind(&self, assignment: &ShardAssignment) -> bool {
        let Some(id) = assignment.core else {
            return false;
        };
        let pinned = core_affinity::set_for_current(CoreId { id });
        if !pinned {
            warn!(
                worker = assignment.worker,
                core = id,
                "failed to pin worker, it stays on its shard unpinned"
            );
        }
        pinned
    }
}

/// Returns the placement for `mode`.
///
/// [`ShardingMode::CpuAffinity`] falls back to [`Logical`] when the platform
/// cannot enumerate cores.
pub fn placement(mode: ShardingMode) -> Box<dyn Placement> {
    match mode {
        ShardingMode::Logical => Box::new(Logical),
        ShardingMode::CpuAffinity => match CpuAffinity::detect() {
            Some(affinity) => {
                debug!(cores = affinity.num_cores(), "core affinity available");
                Box::new(affinity)
            }
            None => {
                warn!("core affinity is not available, falling back to logical sharding");
                Box::new(Logical)
            }
        },
    }
}

/// Returns the number of online processors, or 1 if it cannot be detected.
pub fn online_cpus() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or_else(|err| {
            warn!(%err, "failed to detect CPU count, assuming 1");
            1
        })
}
