//! Work Scheduler - Cooperative render cycles.
//!
//! [`Renderer`] owns everything one render target needs: the host adapter,
//! the fiber arena and the [`RenderCycle`] bookkeeping. There is no global
//! state; two renderers never share anything.
//!
//! # Cycle
//!
//! ```text
//! render(element, container)      seeds a work-in-progress root
//!        │
//!        ▼
//! work_loop(deadline) ──▶ perform_unit_of_work ──▶ ... ──▶ time low? ──▶ Yielded
//!        │                                                    (request idle callback)
//!        ▼ no work left
//! commit_root ──▶ current_root = wip root ──▶ Committed(report)
//! ```
//!
//! The host tree is touched only inside `commit_root`, which never yields,
//! so nobody observes a half-reconciled tree.
//!
//! # Example
//!
//! ```ignore
//! let mut host = MemoryHost::new();
//! let container = host.create_container("root");
//! let mut renderer = Renderer::new(host);
//!
//! renderer.render(app, container);
//! let mut idle = IdleLoop::new(SchedulerConfig::default());
//! let report = idle.run(&mut renderer)?;
//! ```

mod deadline;
mod work;

pub use deadline::{Deadline, IdleLoop, IdleScheduler, NoIdle, TimeBudget, Unbounded};
pub use work::perform_unit_of_work;

use tracing::{debug, error, warn};

use crate::commit::{CommitReport, commit_root};
use crate::config::SchedulerConfig;
use crate::element::Element;
use crate::error::{Error, Result};
use crate::fiber::{Fiber, FiberArena, FiberId};
use crate::host::HostAdapter;

// =============================================================================
// Cycle State
// =============================================================================

/// Bookkeeping for the committed tree and the cycle in progress.
#[derive(Debug, Default)]
pub struct RenderCycle {
    /// Root of the last committed tree.
    pub current_root: Option<FiberId>,
    /// Root of the tree under construction. `None` when idle.
    pub wip_root: Option<FiberId>,
    pub next_unit_of_work: Option<FiberId>,
    /// Previous-generation fibers to remove at commit, in discovery order.
    pub deletions: Vec<FiberId>,
}

impl RenderCycle {
    pub fn is_in_progress(&self) -> bool {
        self.wip_root.is_some()
    }
}

/// Outcome of one [`Renderer::work_loop`] slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkStatus {
    /// No cycle was pending.
    Idle,
    /// Ran out of time with work remaining; another idle callback was requested.
    Yielded,
    /// The cycle finished and its effects were applied.
    Committed(CommitReport),
}

// =============================================================================
// Renderer
// =============================================================================

/// Render context for one host.
#[derive(Debug)]
pub struct Renderer<H: HostAdapter> {
    host: H,
    config: SchedulerConfig,
    arena: FiberArena<H::Node>,
    cycle: RenderCycle,
    units_performed: u64,
    /// Set when a commit failed part-way; the host no longer matches
    /// `current_root`.
    diverged: bool,
}

impl<H: HostAdapter> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, SchedulerConfig::default())
    }

    pub fn with_config(host: H, config: SchedulerConfig) -> Self {
        Self {
            host,
            config,
            arena: FiberArena::new(),
            cycle: RenderCycle::default(),
            units_performed: 0,
            diverged: false,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Mutable host access, for painting or event routing between cycles.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn arena(&self) -> &FiberArena<H::Node> {
        &self.arena
    }

    pub fn cycle(&self) -> &RenderCycle {
        &self.cycle
    }

    /// Total units of work performed over the renderer's lifetime.
    pub fn units_performed(&self) -> u64 {
        self.units_performed
    }

    /// True once a commit has failed. Every later `work_loop` errors.
    pub fn is_diverged(&self) -> bool {
        self.diverged
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Schedule a render of `element` into `container`.
    ///
    /// Does no work and does not touch the host. If a cycle is already in
    /// progress, its work-in-progress tree is dropped without host effect
    /// and replaced by this one.
    pub fn render(&mut self, element: Element, container: H::Node) {
        if let Some(abandoned) = self.cycle.wip_root.take() {
            let released = self.arena.release_tree(abandoned);
            warn!(
                released,
                "render scheduled while a cycle was in progress; abandoning uncommitted work"
            );
        }

        let root = self
            .arena
            .insert(Fiber::root(container, element, self.cycle.current_root));
        self.cycle.wip_root = Some(root);
        self.cycle.next_unit_of_work = Some(root);
        self.cycle.deletions.clear();
        debug!(?root, "render scheduled");
    }

    /// Perform units of work until none remain or `deadline` runs low.
    ///
    /// On running low, asks `idle` for another callback and returns
    /// [`WorkStatus::Yielded`]. When the last unit completes, commits.
    /// A failure during work abandons the cycle and the committed tree stays
    /// current. A failure during commit leaves the host partly mutated, so
    /// the renderer refuses all further work with [`Error::Invariant`].
    pub fn work_loop(
        &mut self,
        deadline: &dyn Deadline,
        idle: &mut dyn IdleScheduler,
    ) -> Result<WorkStatus> {
        if self.diverged {
            self.abandon_cycle();
            return Err(Error::invariant(
                "host tree diverged after a failed commit; no further renders are possible",
            ));
        }

        let mut performed = 0usize;
        while let Some(fiber) = self.cycle.next_unit_of_work {
            let step = perform_unit_of_work(
                &mut self.host,
                &mut self.arena,
                &mut self.cycle.deletions,
                fiber,
            );
            match step {
                Ok(next) => self.cycle.next_unit_of_work = next,
                Err(err) => {
                    self.abandon_cycle();
                    return Err(err);
                }
            }
            performed += 1;
            self.units_performed += 1;

            if self.cycle.next_unit_of_work.is_some()
                && deadline.time_remaining() < self.config.yield_threshold
            {
                debug!(performed, "yielding to host");
                idle.request_idle_callback();
                return Ok(WorkStatus::Yielded);
            }
        }

        if self.cycle.wip_root.is_none() {
            return Ok(WorkStatus::Idle);
        }
        debug!(performed, "work exhausted, committing");
        self.commit().map(WorkStatus::Committed)
    }

    /// Run the pending cycle to completion in a single slice.
    pub fn flush(&mut self) -> Result<Option<CommitReport>> {
        match self.work_loop(&Unbounded, &mut NoIdle)? {
            WorkStatus::Committed(report) => Ok(Some(report)),
            WorkStatus::Idle => Ok(None),
            WorkStatus::Yielded => Err(Error::invariant("unbounded slice yielded")),
        }
    }

    fn commit(&mut self) -> Result<CommitReport> {
        let Some(wip) = self.cycle.wip_root else {
            return Err(Error::invariant("commit without a work-in-progress root"));
        };

        let report = match commit_root(&mut self.host, &self.arena, wip, &self.cycle.deletions) {
            Ok(report) => report,
            Err(err) => {
                error!(%err, "commit failed part-way; host tree no longer matches the committed fibers");
                self.diverged = true;
                self.abandon_cycle();
                return Err(err);
            }
        };

        let previous = self.cycle.current_root.replace(wip);
        self.cycle.wip_root = None;
        self.cycle.deletions.clear();
        if let Some(previous) = previous {
            let released = self.arena.release_tree(previous);
            debug!(released, "released previous generation");
        }
        Ok(report)
    }

    fn abandon_cycle(&mut self) {
        self.cycle.next_unit_of_work = None;
        self.cycle.deletions.clear();
        if let Some(wip) = self.cycle.wip_root.take() {
            self.arena.release_tree(wip);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use crate::element::{Props, create_element};
    use crate::host::memory::MemoryHost;
    use std::cell::Cell;
    use std::time::Duration;

    /// Reports plenty of time for `units` checks, then none.
    struct UnitBudget {
        remaining: Cell<usize>,
    }

    impl UnitBudget {
        fn new(units: usize) -> Self {
            Self {
                remaining: Cell::new(units),
            }
        }
    }

    impl Deadline for UnitBudget {
        fn time_remaining(&self) -> Duration {
            let left = self.remaining.get().saturating_sub(1);
            self.remaining.set(left);
            if left == 0 {
                Duration::ZERO
            } else {
                Duration::MAX
            }
        }
    }

    #[derive(Default)]
    struct CountingIdle(usize);

    impl IdleScheduler for CountingIdle {
        fn request_idle_callback(&mut self) {
            self.0 += 1;
        }
    }

    fn app(title: &str) -> Element {
        create_element(
            "div",
            Props::new(),
            children![create_element("h1", Props::new(), children![title])],
        )
    }

    #[test]
    fn test_render_does_no_work() {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut renderer = Renderer::new(host);

        renderer.render(app("Hello"), container);

        assert!(renderer.cycle().is_in_progress());
        assert_eq!(renderer.cycle().next_unit_of_work, renderer.cycle().wip_root);
        assert_eq!(renderer.units_performed(), 0);
        assert!(renderer.host().ops().is_empty());
    }

    #[test]
    fn test_idle_without_render() {
        let mut renderer = Renderer::new(MemoryHost::new());
        let status = renderer.work_loop(&Unbounded, &mut NoIdle).unwrap();
        assert_eq!(status, WorkStatus::Idle);
        assert_eq!(renderer.flush().unwrap(), None);
    }

    #[test]
    fn test_yield_and_resume() {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut renderer = Renderer::new(host);
        let mut idle = CountingIdle::default();
        renderer.render(app("Hello"), container);

        // root, div, h1, text: four units.
        let status = renderer.work_loop(&UnitBudget::new(2), &mut idle).unwrap();
        assert_eq!(status, WorkStatus::Yielded);
        assert_eq!(renderer.units_performed(), 2);
        assert_eq!(idle.0, 1);
        // Suspended mid-traversal: nothing attached yet.
        assert!(renderer.host().children(container).is_empty());

        let status = renderer.work_loop(&Unbounded, &mut idle).unwrap();
        assert!(matches!(status, WorkStatus::Committed(_)));
        assert_eq!(renderer.units_performed(), 4);
        assert_eq!(idle.0, 1);
        assert_eq!(
            renderer.host().render_to_string(container),
            "<root><div><h1>Hello</h1></div></root>"
        );
        assert!(!renderer.cycle().is_in_progress());
        assert!(renderer.cycle().deletions.is_empty());
    }

    #[test]
    fn test_exhausted_deadline_still_performs_one_unit() {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut renderer = Renderer::new(host);
        renderer.render(app("Hello"), container);

        let status = renderer.work_loop(&Duration::ZERO, &mut NoIdle).unwrap();
        assert_eq!(status, WorkStatus::Yielded);
        assert_eq!(renderer.units_performed(), 1);
    }

    #[test]
    fn test_commit_releases_previous_generation() {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut renderer = Renderer::new(host);

        renderer.render(app("one"), container);
        renderer.flush().unwrap();
        let first_root = renderer.cycle().current_root.unwrap();
        let live = renderer.arena().len();

        renderer.render(app("two"), container);
        renderer.flush().unwrap();

        assert!(!renderer.arena().contains(first_root));
        assert_eq!(renderer.arena().len(), live);
        assert_eq!(renderer.host().text_content(container), "two");
    }

    #[test]
    fn test_render_during_cycle_abandons_wip() {
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut renderer = Renderer::new(host);

        renderer.render(app("first"), container);
        renderer.work_loop(&UnitBudget::new(3), &mut NoIdle).unwrap();
        let abandoned = renderer.cycle().wip_root.unwrap();

        renderer.render(app("second"), container);
        assert!(!renderer.arena().contains(abandoned));
        assert!(renderer.host().children(container).is_empty());

        renderer.flush().unwrap();
        assert_eq!(renderer.host().text_content(container), "second");
        assert_eq!(renderer.host().children(container).len(), 1);
    }

    #[test]
    fn test_host_failure_abandons_cycle() {
        let mut host = MemoryHost::new();
        host.reject_element_type("h1");
        let container = host.create_container("root");
        let mut renderer = Renderer::new(host);

        renderer.render(app("boom"), container);
        let err = renderer.flush().unwrap_err();

        assert!(err.is_host());
        assert!(!renderer.cycle().is_in_progress());
        assert_eq!(renderer.cycle().next_unit_of_work, None);
        assert_eq!(renderer.cycle().current_root, None);
        assert!(renderer.arena().is_empty());
        assert!(renderer.host().children(container).is_empty());
    }

    #[test]
    fn test_failed_commit_stops_further_renders() {
        let heading = |props: Props| create_element("h1", props, children!["a"]);
        let subtitle = || create_element("h2", Props::new(), children!["b"]);
        let mut host = MemoryHost::new();
        let container = host.create_container("root");
        let mut renderer = Renderer::new(host);

        renderer.render(
            create_element("div", Props::new(), children![heading(Props::new()), subtitle()]),
            container,
        );
        renderer.flush().unwrap();
        renderer.host_mut().reject_property("title");

        // The commit removes h2, then fails updating h1.
        renderer.render(
            create_element("div", Props::new(), children![heading(Props::new().set("title", "t"))]),
            container,
        );
        assert!(renderer.flush().unwrap_err().is_host());
        assert!(renderer.is_diverged());
        let after_failure = renderer.host().render_to_string(container);
        assert_eq!(after_failure, "<root><div><h1>a</h1></div></root>");

        renderer.render(
            create_element("div", Props::new(), children![heading(Props::new()), subtitle()]),
            container,
        );
        let err = renderer.flush().unwrap_err();

        assert!(matches!(err, Error::Invariant(_)));
        assert!(!renderer.cycle().is_in_progress());
        assert_eq!(renderer.host().render_to_string(container), after_failure);
    }
}
