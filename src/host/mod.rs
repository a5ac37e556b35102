//! Host Adapter - The boundary between the reconciler and real nodes.
//!
//! The reconciler never touches host nodes directly. It asks a
//! [`HostAdapter`] to create nodes, to diff props onto them, and (during
//! commit only) to attach and detach them.
//!
//! Two adapters ship with the crate:
//!
//! - [`memory::MemoryHost`] - in-memory node tree with an operation log
//! - [`terminal::TerminalHost`] - paints the tree to a terminal via crossterm

pub mod memory;
pub mod terminal;

use std::fmt;

use crate::element::{Listener, PropValue, Props};

pub use crate::error::HostError;

// =============================================================================
// Adapter Trait
// =============================================================================

/// Host-side primitives consumed by the render cycle.
pub trait HostAdapter {
    /// Handle to one host node. Cloning a handle must not clone the node.
    type Node: Clone + fmt::Debug;

    /// Create a detached node for `element_type`.
    fn create_node(&mut self, element_type: &str) -> Result<Self::Node, HostError>;

    /// Assign a plain property.
    fn set_property(
        &mut self,
        node: &Self::Node,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn add_listener(
        &mut self,
        node: &Self::Node,
        event_type: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    fn remove_listener(
        &mut self,
        node: &Self::Node,
        event_type: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    /// Attach `child` as the last child of `parent`.
    fn append_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Detach `child` (and with it, its whole subtree) from `parent`.
    fn remove_child(&mut self, parent: &Self::Node, child: &Self::Node) -> Result<(), HostError>;

    /// Bring `node` from `prev` props to `next` props.
    fn diff_properties(
        &mut self,
        node: &Self::Node,
        prev: &Props,
        next: &Props,
    ) -> Result<(), HostError> {
        diff_properties(self, node, prev, next)
    }
}

// =============================================================================
// Prop Diff
// =============================================================================

/// Default prop diff, in four passes:
///
/// 1. remove listeners that are gone or whose identity changed
/// 2. blank attributes that are gone (set to [`PropValue::EMPTY`])
/// 3. set attributes that are new or changed
/// 4. add listeners that are new or whose identity changed
///
/// Children are not props here and are never forwarded.
pub fn diff_properties<H>(
    host: &mut H,
    node: &H::Node,
    prev: &Props,
    next: &Props,
) -> Result<(), HostError>
where
    H: HostAdapter + ?Sized,
{
    for (event_type, listener) in prev.listeners() {
        let kept = next
            .listener_for(event_type)
            .is_some_and(|next_listener| next_listener.same(listener));
        if !kept {
            host.remove_listener(node, event_type, listener)?;
        }
    }

    for (name, _) in prev.attributes() {
        if !next.has_attribute(name) {
            host.set_property(node, name, &PropValue::EMPTY)?;
        }
    }

    for (name, value) in next.attributes() {
        if prev.attribute(name) != Some(value) {
            host.set_property(node, name, value)?;
        }
    }

    for (event_type, listener) in next.listeners() {
        let existed = prev
            .listener_for(event_type)
            .is_some_and(|prev_listener| prev_listener.same(listener));
        if !existed {
            host.add_listener(node, event_type, listener)?;
        }
    }

    Ok(())
}
