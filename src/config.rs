//! Scheduler configuration.
//!
//! Controls how much of an idle slice the work loop may use before it hands
//! control back to the host.

use std::env;
use std::time::Duration;

/// Overrides [`SchedulerConfig::yield_threshold`], in microseconds.
pub const YIELD_THRESHOLD_ENV: &str = "SPARK_FIBER_YIELD_THRESHOLD_US";

/// Overrides [`SchedulerConfig::slice_budget`], in microseconds.
pub const SLICE_BUDGET_ENV: &str = "SPARK_FIBER_SLICE_BUDGET_US";

/// Timing knobs for the work loop and the idle-loop driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// The loop yields once the deadline reports less time than this.
    pub yield_threshold: Duration,
    /// Length of each slice granted by [`IdleLoop`](crate::scheduler::IdleLoop).
    pub slice_budget: Duration,
    /// Upper bound on slices per cycle for [`IdleLoop`](crate::scheduler::IdleLoop).
    /// `None` means unbounded.
    pub max_slices: Option<usize>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            slice_budget: Duration::from_millis(16),
            max_slices: None,
        }
    }
}

impl SchedulerConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Default configuration with environment overrides applied.
    ///
    /// Values that do not parse as whole microseconds are ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(threshold) = read_micros(YIELD_THRESHOLD_ENV) {
            config.yield_threshold = threshold;
        }
        if let Some(budget) = read_micros(SLICE_BUDGET_ENV) {
            config.slice_budget = budget;
        }
        config
    }

    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_slice_budget(mut self, budget: Duration) -> Self {
        self.slice_budget = budget;
        self
    }

    pub fn with_max_slices(mut self, max_slices: usize) -> Self {
        self.max_slices = Some(max_slices);
        self
    }
}

fn read_micros(var: &str) -> Option<Duration> {
    let raw = env::var(var).ok()?;
    let parsed = parse_micros(&raw);
    if parsed.is_none() {
        tracing::warn!(var, value = %raw, "ignoring unparsable scheduler override");
    }
    parsed
}

fn parse_micros(raw: &str) -> Option<Duration> {
    raw.trim().parse::<u64>().ok().map(Duration::from_micros)
}
