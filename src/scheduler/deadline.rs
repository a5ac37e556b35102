//! Deadlines and the idle-callback boundary.
//!
//! The host decides when the engine may run and for how long. It hands the
//! work loop a [`Deadline`]; when the loop stops early it asks for another
//! slice through [`IdleScheduler::request_idle_callback`].
//!
//! [`IdleLoop`] is a deterministic stand-in for a host's idle-callback
//! facility: it keeps granting fresh slices until the cycle commits.

use std::time::{Duration, Instant};

use super::{Renderer, WorkStatus};
use crate::commit::CommitReport;
use crate::config::SchedulerConfig;
use crate::error::{Error, Result};
use crate::host::HostAdapter;

// =============================================================================
// Deadline
// =============================================================================

/// Remaining time in the current idle slice.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// A fixed amount of remaining time that never runs down.
impl Deadline for Duration {
    fn time_remaining(&self) -> Duration {
        *self
    }
}

/// Never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Wall-clock budget starting when the slice is created.
#[derive(Debug, Clone, Copy)]
pub struct TimeBudget {
    started: Instant,
    budget: Duration,
}

impl TimeBudget {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Deadline for TimeBudget {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

// =============================================================================
// Idle Callbacks
// =============================================================================

/// The host's "call me again when idle" primitive.
///
/// The work loop asks for a callback only when it yields with work left.
/// A slice that commits, or finds nothing to do, requests nothing; the
/// next `render` is what starts the host driving the loop again.
pub trait IdleScheduler {
    fn request_idle_callback(&mut self);
}

/// Discards requests. For callers that drive the loop themselves.
#[derive(Debug, Default)]
pub struct NoIdle;

impl IdleScheduler for NoIdle {
    fn request_idle_callback(&mut self) {}
}

/// Drives a render cycle to commit, one slice per idle callback.
#[derive(Debug)]
pub struct IdleLoop {
    config: SchedulerConfig,
    pending: bool,
    slices: usize,
}

impl IdleScheduler for IdleLoop {
    fn request_idle_callback(&mut self) {
        self.pending = true;
    }
}

impl IdleLoop {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            pending: false,
            slices: 0,
        }
    }

    /// Slices granted so far.
    pub fn slices(&self) -> usize {
        self.slices
    }

    /// Run with a wall-clock [`TimeBudget`] of `config.slice_budget` per slice.
    pub fn run<H: HostAdapter>(&mut self, renderer: &mut Renderer<H>) -> Result<Option<CommitReport>> {
        let budget = self.config.slice_budget;
        self.run_with(renderer, || TimeBudget::new(budget))
    }

    /// Run with a caller-supplied deadline per slice.
    ///
    /// Returns the commit report, or `None` if there was nothing to do.
    pub fn run_with<H, D, F>(
        &mut self,
        renderer: &mut Renderer<H>,
        mut next_deadline: F,
    ) -> Result<Option<CommitReport>>
    where
        H: HostAdapter,
        D: Deadline,
        F: FnMut() -> D,
    {
        self.pending = true;
        while self.pending {
            if self.config.max_slices.is_some_and(|max| self.slices >= max) {
                return Err(Error::invariant(format!(
                    "render cycle did not commit within {} idle slices",
                    self.slices
                )));
            }
            self.pending = false;
            self.slices += 1;

            let deadline = next_deadline();
            match renderer.work_loop(&deadline, self)? {
                WorkStatus::Committed(report) => return Ok(Some(report)),
                WorkStatus::Idle => return Ok(None),
                WorkStatus::Yielded => {}
            }
        }
        Ok(None)
    }
}
