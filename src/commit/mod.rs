//! Commit Executor - Applies a finished work-in-progress tree to the host.
//!
//! The commit runs start to finish without yielding, and it is the only
//! phase that attaches or detaches host nodes. Order:
//!
//! 1. every pending deletion, in the order reconciliation found them
//! 2. a pre-order walk of the finished tree (child before sibling),
//!    applying each fiber's placement or update
//!
//! Placements append to the nearest ancestor that owns a host node. Deleting
//! a fiber detaches only its own host node; its host subtree goes with it.

use tracing::{debug, debug_span};

use crate::error::{Error, Result};
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};
use crate::host::HostAdapter;

/// Counts of the host mutations applied by one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
}

impl CommitReport {
    /// True if nothing was placed or deleted.
    pub fn is_structurally_unchanged(&self) -> bool {
        self.placements == 0 && self.deletions == 0
    }
}

/// Apply `deletions`, then every effect below `root`.
pub fn commit_root<H: HostAdapter>(
    host: &mut H,
    arena: &FiberArena<H::Node>,
    root: FiberId,
    deletions: &[FiberId],
) -> Result<CommitReport> {
    let span = debug_span!("commit_root", deletions = deletions.len());
    let _guard = span.enter();

    let mut report = CommitReport::default();
    for &fiber in deletions {
        commit_work(host, arena, fiber, &mut report)?;
    }
    for fiber in arena.descendants(root) {
        commit_work(host, arena, fiber, &mut report)?;
    }

    debug!(
        placements = report.placements,
        updates = report.updates,
        deletions = report.deletions,
        "commit complete"
    );
    Ok(report)
}

fn commit_work<H: HostAdapter>(
    host: &mut H,
    arena: &FiberArena<H::Node>,
    id: FiberId,
    report: &mut CommitReport,
) -> Result<()> {
    let fiber = arena.fiber(id)?;
    match fiber.effect_tag {
        Some(EffectTag::Placement) => {
            if let Some(node) = &fiber.host {
                let parent = host_parent(arena, fiber)?;
                host.append_child(&parent, node)?;
                report.placements += 1;
            }
        }
        Some(EffectTag::Update) => {
            if let Some(node) = &fiber.host {
                let previous = fiber
                    .alternate
                    .and_then(|alternate| arena.get(alternate))
                    .ok_or_else(|| {
                        Error::invariant(format!("update fiber {id:?} has no live alternate"))
                    })?;
                host.diff_properties(node, &previous.props, &fiber.props)?;
                report.updates += 1;
            }
        }
        Some(EffectTag::Deletion) => {
            let node = fiber.host.as_ref().ok_or_else(|| {
                Error::invariant(format!("deleted fiber {id:?} never owned a host node"))
            })?;
            let parent = host_parent(arena, fiber)?;
            host.remove_child(&parent, node)?;
            report.deletions += 1;
        }
        None => {}
    }
    Ok(())
}

/// Host node of the nearest ancestor that has one.
fn host_parent<N: Clone>(arena: &FiberArena<N>, fiber: &Fiber<N>) -> Result<N> {
    let mut cursor = fiber.parent;
    while let Some(id) = cursor {
        let ancestor = arena.fiber(id)?;
        if let Some(node) = &ancestor.host {
            return Ok(node.clone());
        }
        cursor = ancestor.parent;
    }
    Err(Error::invariant("fiber has no ancestor with a host node"))
}

// =============================================================================
// Tests
// =============================================================================
