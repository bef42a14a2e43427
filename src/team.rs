//! Host execution environment: domains, teams, fork and barrier.
//!
//! The kernels only need a handful of services from the platform they run on:
//! which execution domain the caller is in, how many units a team may have,
//! and a fork primitive that starts one unit per work item and returns once
//! every unit has reached the barrier. [`ExecutionEnv`] is that boundary;
//! [`RayonTeam`] provides it on a hosted OS with a dedicated rayon pool.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::debug;

use crate::error::{Result, TransmulError};

/// Physical execution domain of the calling code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    /// The control processor. It can dispatch work but cannot join a team.
    FabricController,
    /// The compute cluster whose cores form teams.
    Cluster,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::FabricController => f.write_str("fabric controller"),
            Domain::Cluster => f.write_str("cluster"),
        }
    }
}

/// Identity of one unit inside a forked team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitCtx {
    /// 0-based index of this unit.
    pub index: usize,
    /// Number of units in the active team.
    pub team_size: usize,
}

/// What a fork observed when its team joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForkReport {
    /// Units started.
    pub team_size: usize,
    /// Units that reached the barrier.
    pub arrived: usize,
}

/// Services the parallel kernels need from the platform.
pub trait ExecutionEnv: Sync {
    /// Domain the caller is currently running on.
    fn domain(&self) -> Domain;

    /// How many of `requested` units a fork would actually start.
    fn granted_units(&self, requested: usize) -> usize;

    /// Starts one unit per item of `work` and waits for all of them.
    ///
    /// Unit `i` runs `entry(ctx, item_i)` with `ctx.index == i` and
    /// `ctx.team_size == work.len()`. The call returns only after every unit
    /// has returned from `entry`, which is the team barrier.
    fn fork<W, I, F>(&self, work: I, entry: F) -> ForkReport
    where
        W: Send,
        I: IntoIterator<Item = W>,
        I::IntoIter: ExactSizeIterator + Send,
        F: Fn(UnitCtx, W) + Sync;
}

impl<E: ExecutionEnv> ExecutionEnv for &E {
    fn domain(&self) -> Domain {
        (**self).domain()
    }

    fn granted_units(&self, requested: usize) -> usize {
        (**self).granted_units(requested)
    }

    fn fork<W, I, F>(&self, work: I, entry: F) -> ForkReport
    where
        W: Send,
        I: IntoIterator<Item = W>,
        I::IntoIter: ExactSizeIterator + Send,
        F: Fn(UnitCtx, W) + Sync,
    {
        (**self).fork(work, entry)
    }
}

/// A fixed-size team host backed by its own rayon thread pool.
///
/// The pool is built once with `max_units` threads; a fork grants at most that
/// many units and runs each unit as one scoped task.
pub struct RayonTeam {
    pool: ThreadPool,
    domain: Domain,
}

impl RayonTeam {
    /// Builds a host on the cluster domain with room for `max_units` units.
    ///
    /// # Errors
    ///
    /// Returns [`TransmulError::InvalidUnits`] for `max_units == 0` and
    /// [`TransmulError::ThreadPool`] if the pool cannot be started.
    pub fn new(max_units: usize) -> Result<Self> {
        if max_units == 0 {
            return Err(TransmulError::InvalidUnits(max_units));
        }
        let pool = ThreadPoolBuilder::new()
            .num_threads(max_units)
            .thread_name(|i| format!("transmul-unit-{i}"))
            .build()?;
        debug!(max_units, "team pool started");
        Ok(Self {
            pool,
            domain: Domain::Cluster,
        })
    }

    /// Reports `domain` to callers instead of the cluster.
    pub fn with_domain(mut self, domain: Domain) -> Self {
        self.domain = domain;
        self
    }

    /// Largest team this host can start.
    pub fn max_units(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl fmt::Debug for RayonTeam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RayonTeam")
            .field("max_units", &self.max_units())
            .field("domain", &self.domain)
            .finish()
    }
}

impl ExecutionEnv for RayonTeam {
    fn domain(&self) -> Domain {
        self.domain
    }

    fn granted_units(&self, requested: usize) -> usize {
        requested.min(self.max_units())
    }

    fn fork<W, I, F>(&self, work: I, entry: F) -> ForkReport
    where
        W: Send,
        I: IntoIterator<Item = W>,
        I::IntoIter: ExactSizeIterator + Send,
        F: Fn(UnitCtx, W) + Sync,
    {
        let work = work.into_iter();
        let team_size = work.len();
        let arrived = AtomicUsize::new(0);
        let entry = &entry;
        let counter = &arrived;

        self.pool.scope(move |s| {
            for (index, item) in work.enumerate() {
                s.spawn(move |_| {
                    entry(UnitCtx { index, team_size }, item);
                    counter.fetch_add(1, Ordering::AcqRel);
                });
            }
        });

        ForkReport {
            team_size,
            arrived: arrived.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use super::*;

    #[test]
    fn test_zero_units_rejected() {
        assert!(matches!(
            RayonTeam::new(0),
            Err(TransmulError::InvalidUnits(0))
        ));
    }

    #[test]
    fn test_granted_units_capped_by_pool() {
        let team = RayonTeam::new(3).unwrap();
        assert_eq!(team.granted_units(1), 1);
        assert_eq!(team.granted_units(3), 3);
        assert_eq!(team.granted_units(16), 3);
    }

    #[test]
    fn test_domain_override() {
        let team = RayonTeam::new(1).unwrap();
        assert_eq!(team.domain(), Domain::Cluster);
        let team = team.with_domain(Domain::FabricController);
        assert_eq!(team.domain(), Domain::FabricController);
    }

    #[test]
    fn test_fork_runs_every_unit_once() {
        let team = RayonTeam::new(4).unwrap();
        let seen = Mutex::new(HashSet::new());

        let report = team.fork(0..4usize, |ctx, item| {
            assert_eq!(ctx.index, item);
            assert_eq!(ctx.team_size, 4);
            assert!(seen.lock().unwrap().insert(ctx.index));
        });

        assert_eq!(report, ForkReport { team_size: 4, arrived: 4 });
        assert_eq!(seen.into_inner().unwrap().len(), 4);
    }

    #[test]
    fn test_fork_hands_out_disjoint_mut_slices() {
        let team = RayonTeam::new(3).unwrap();
        let mut out = [0usize; 6];

        let report = team.fork(out.chunks_mut(2), |ctx, chunk| chunk.fill(ctx.index + 1));

        assert_eq!(report.arrived, 3);
        assert_eq!(out, [1, 1, 2, 2, 3, 3]);
    }

    #[test]
    fn test_fork_with_more_items_than_threads_still_joins() {
        let team = RayonTeam::new(2).unwrap();
        let report = team.fork(0..5usize, |_, _| {});
        assert_eq!(report, ForkReport { team_size: 5, arrived: 5 });
    }
}
