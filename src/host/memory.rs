//! In-memory host tree.
//!
//! Nodes live in a flat vector and are addressed by [`NodeId`]. Every
//! mutation is appended to an operation log, which is what the scheduler
//! tests assert against. Element types and property names can be marked as
//! rejected to exercise host failures.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use super::{HostAdapter, HostError};
use crate::element::{Event, Listener, NODE_VALUE, PropValue, TEXT_ELEMENT};

// =============================================================================
// Types
// =============================================================================

/// Handle to a node in a [`MemoryHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One recorded host mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    Create { node: NodeId, element_type: String },
    SetProperty { node: NodeId, name: String, value: PropValue },
    AddListener { node: NodeId, event_type: String },
    RemoveListener { node: NodeId, event_type: String },
    Append { parent: NodeId, child: NodeId },
    Remove { parent: NodeId, child: NodeId },
}

#[derive(Debug)]
struct HostNode {
    element_type: String,
    properties: BTreeMap<String, PropValue>,
    listeners: Vec<(String, Listener)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl HostNode {
    fn new(element_type: &str) -> Self {
        Self {
            element_type: element_type.to_string(),
            properties: BTreeMap::new(),
            listeners: Vec::new(),
            children: Vec::new(),
            parent: None,
        }
    }
}

// =============================================================================
// Memory Host
// =============================================================================

/// Host adapter backed by an in-memory node tree.
///
/// Node storage only grows. A removed node, or a node created by a cycle
/// that was later abandoned, keeps its slot with its properties and
/// children, so a [`NodeId`] never aliases a newer node. Memory is
/// proportional to every node ever created; drop the host to reclaim it.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    ops: Vec<HostOp>,
    rejected_types: HashSet<String>,
    rejected_properties: HashSet<String>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root container. Not recorded in the operation log.
    pub fn create_container(&mut self, element_type: &str) -> NodeId {
        self.push_node(element_type)
    }

    /// Make `create_node` fail for `element_type`.
    pub fn reject_element_type(&mut self, element_type: &str) -> &mut Self {
        self.rejected_types.insert(element_type.to_string());
        self
    }

    /// Make `set_property` fail for `name`.
    pub fn reject_property(&mut self, name: &str) -> &mut Self {
        self.rejected_properties.insert(name.to_string());
        self
    }

    // -------------------------------------------------------------------------
    // Operation log
    // -------------------------------------------------------------------------

    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain the operation log.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    // -------------------------------------------------------------------------
    // Inspection
    // -------------------------------------------------------------------------

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_type(&self, node: NodeId) -> Option<&str> {
        self.nodes.get(node.0).map(|n| n.element_type.as_str())
    }

    pub fn property(&self, node: NodeId, name: &str) -> Option<&PropValue> {
        self.nodes.get(node.0)?.properties.get(name)
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.nodes
            .get(node.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.get(node.0)?.parent
    }

    pub fn listener_count(&self, node: NodeId, event_type: &str) -> usize {
        self.nodes.get(node.0).map_or(0, |n| {
            n.listeners
                .iter()
                .filter(|(ty, _)| ty == event_type)
                .count()
        })
    }

    /// Concatenated `nodeValue` of every text node under `node`.
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        if n.element_type == TEXT_ELEMENT {
            if let Some(value) = n.properties.get(NODE_VALUE) {
                out.push_str(&value.to_string());
            }
        }
        for &child in &n.children {
            self.collect_text(child, out);
        }
    }

    /// Markup-like rendering of the subtree under `node` (listeners omitted).
    pub fn render_to_string(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.write_markup(node, &mut out);
        out
    }

    fn write_markup(&self, node: NodeId, out: &mut String) {
        let Some(n) = self.nodes.get(node.0) else {
            return;
        };
        if n.element_type == TEXT_ELEMENT {
            if let Some(value) = n.properties.get(NODE_VALUE) {
                out.push_str(&value.to_string());
            }
            return;
        }
        out.push('<');
        out.push_str(&n.element_type);
        for (name, value) in &n.properties {
            out.push_str(&format!(" {name}=\"{value}\""));
        }
        out.push('>');
        for &child in &n.children {
            self.write_markup(child, out);
        }
        out.push_str("</");
        out.push_str(&n.element_type);
        out.push('>');
    }

    /// Depth-first list of `node` and everything attached below it.
    pub fn subtree(&self, node: NodeId) -> Vec<(NodeId, usize)> {
        let mut out = Vec::new();
        let mut stack = vec![(node, 0)];
        while let Some((id, depth)) = stack.pop() {
            out.push((id, depth));
            for &child in self.children(id).iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }

    // -------------------------------------------------------------------------
    // Events
    // -------------------------------------------------------------------------

    /// Invoke `node`'s listeners for `event`. Returns how many ran.
    pub fn dispatch(&self, node: NodeId, event: &Event) -> usize {
        let listeners: Vec<Listener> = match self.nodes.get(node.0) {
            Some(n) => n
                .listeners
                .iter()
                .filter(|(ty, _)| *ty == event.event_type)
                .map(|(_, listener)| listener.clone())
                .collect(),
            None => return 0,
        };
        for listener in &listeners {
            listener.call(event);
        }
        listeners.len()
    }

    /// Dispatch at `node`, then at each ancestor in turn.
    pub fn dispatch_bubbling(&self, node: NodeId, event: &Event) -> usize {
        let mut invoked = 0;
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            invoked += self.dispatch(id, event);
            cursor = self.parent(id);
        }
        invoked
    }

    /// Dispatch to every node attached under `root`.
    pub fn broadcast(&self, root: NodeId, event: &Event) -> usize {
        self.subtree(root)
            .into_iter()
            .map(|(id, _)| self.dispatch(id, event))
            .sum()
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    fn push_node(&mut self, element_type: &str) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(HostNode::new(element_type));
        id
    }

    fn node_mut(&mut self, node: NodeId) -> Result<&mut HostNode, HostError> {
        self.nodes
            .get_mut(node.0)
            .ok_or_else(|| HostError::UnknownNode(node.to_string()))
    }

    fn detach(&mut self, child: NodeId) -> Result<(), HostError> {
        if let Some(old_parent) = self.node_mut(child)?.parent.take() {
            self.node_mut(old_parent)?.children.retain(|&c| c != child);
        }
        Ok(())
    }
}

// =============================================================================
// Adapter
// =============================================================================

impl HostAdapter for MemoryHost {
    type Node = NodeId;

    fn create_node(&mut self, element_type: &str) -> Result<NodeId, HostError> {
        if self.rejected_types.contains(element_type) {
            return Err(HostError::UnsupportedElement(element_type.to_string()));
        }
        let node = self.push_node(element_type);
        self.ops.push(HostOp::Create {
            node,
            element_type: element_type.to_string(),
        });
        Ok(node)
    }

    fn set_property(
        &mut self,
        node: &NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        let rejected = self.rejected_properties.contains(name);
        let target = self.node_mut(*node)?;
        if rejected {
            return Err(HostError::UnsupportedProperty {
                element_type: target.element_type.clone(),
                name: name.to_string(),
            });
        }
        target.properties.insert(name.to_string(), value.clone());
        self.ops.push(HostOp::SetProperty {
            node: *node,
            name: name.to_string(),
            value: value.clone(),
        });
        Ok(())
    }

    fn add_listener(
        &mut self,
        node: &NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        let target = self.node_mut(*node)?;
        let duplicate = target
            .listeners
            .iter()
            .any(|(ty, existing)| ty == event_type && existing.same(listener));
        if !duplicate {
            target
                .listeners
                .push((event_type.to_string(), listener.clone()));
        }
        self.ops.push(HostOp::AddListener {
            node: *node,
            event_type: event_type.to_string(),
        });
        Ok(())
    }

    fn remove_listener(
        &mut self,
        node: &NodeId,
        event_type: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        self.node_mut(*node)?
            .listeners
            .retain(|(ty, existing)| !(ty == event_type && existing.same(listener)));
        self.ops.push(HostOp::RemoveListener {
            node: *node,
            event_type: event_type.to_string(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        self.node_mut(*parent)?;
        self.detach(*child)?;
        self.node_mut(*child)?.parent = Some(*parent);
        self.node_mut(*parent)?.children.push(*child);
        self.ops.push(HostOp::Append {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }

    fn remove_child(&mut self, parent: &NodeId, child: &NodeId) -> Result<(), HostError> {
        let attached = self.node_mut(*parent)?.children.contains(child);
        if !attached {
            return Err(HostError::NotAChild {
                parent: parent.to_string(),
                child: child.to_string(),
            });
        }
        self.detach(*child)?;
        self.ops.push(HostOp::Remove {
            parent: *parent,
            child: *child,
        });
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
