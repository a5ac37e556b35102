//! One unit of work.

use std::rc::Rc;

use crate::element::Props;
use crate::error::Result;
use crate::fiber::{FiberArena, FiberId, next_unit_of_work};
use crate::host::HostAdapter;
use crate::reconciler::reconcile_children;

/// Process `fiber` and return the next fiber to process.
///
/// Creates the fiber's host node if it has none (detached, props applied),
/// reconciles its children, then steps to the next fiber in pre-order.
/// Never attaches anything to the host tree.
pub fn perform_unit_of_work<H: HostAdapter>(
    host: &mut H,
    arena: &mut FiberArena<H::Node>,
    deletions: &mut Vec<FiberId>,
    fiber: FiberId,
) -> Result<Option<FiberId>> {
    let current = arena.fiber(fiber)?;
    let props = Rc::clone(&current.props);

    if current.host.is_none() {
        let element_type = Rc::clone(&current.element_type);
        let node = host.create_node(&element_type)?;
        host.diff_properties(&node, &Props::default(), &props)?;
        arena.fiber_mut(fiber)?.host = Some(node);
    }

    reconcile_children(arena, deletions, fiber, props.children());

    let next = next_unit_of_work(arena, fiber);
    tracing::trace!(?fiber, ?next, "performed unit of work");
    Ok(next)
}
