//! Fiber Tree - The mutable, resumable representation of render work.
//!
//! One fiber per element, stored in a generational arena:
//!
//! ```text
//! root ──child──▶ div ──child──▶ h1 ──sibling──▶ h2
//!                  ▲              │               │
//!                  └────parent────┴───────────────┘
//! ```
//!
//! `child` and `sibling` are owning links: releasing a fiber releases its
//! whole child chain. `parent` and `alternate` are back-references that never
//! keep anything alive. Because keys are generational, an alternate whose
//! generation has been released reads as absent instead of aliasing a newer
//! fiber.
//!
//! The sibling list (rather than a child vector) lets [`next_unit_of_work`]
//! find the next fiber from the current one alone, so the scheduler can stop
//! after any fiber and resume later without an explicit stack.

use std::rc::Rc;

use slotmap::{SlotMap, new_key_type};

use crate::element::{Element, Props};
use crate::error::{Error, Result};

new_key_type! {
    /// Handle to a fiber in a [`FiberArena`].
    pub struct FiberId;
}

/// Type tag of the root fiber. Never compared against element types.
pub const HOST_ROOT: &str = "HOST_ROOT";

// =============================================================================
// Effect Tag
// =============================================================================

/// Host mutation a fiber requires at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    /// Insert the fiber's host node under its parent's host node.
    Placement,
    /// Diff the alternate's props against the fiber's props on the reused node.
    Update,
    /// Remove the (previous generation) fiber's host node.
    Deletion,
}

// =============================================================================
// Fiber
// =============================================================================

/// A unit of reconciliation work for one tree position.
#[derive(Debug)]
pub struct Fiber<N> {
    pub element_type: Rc<str>,
    pub props: Rc<Props>,
    /// Host node, created at most once per fiber.
    pub host: Option<N>,
    pub parent: Option<FiberId>,
    pub child: Option<FiberId>,
    pub sibling: Option<FiberId>,
    /// Counterpart in the previously committed generation.
    pub alternate: Option<FiberId>,
    pub effect_tag: Option<EffectTag>,
}

impl<N> Fiber<N> {
    /// Root fiber wrapping `container`, whose only child will be `element`.
    pub fn root(container: N, element: Element, alternate: Option<FiberId>) -> Self {
        Self {
            element_type: Rc::from(HOST_ROOT),
            props: Rc::new(Props::new().with_children(vec![element])),
            host: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect_tag: None,
        }
    }

    /// New position: no host node and no alternate yet.
    pub fn placement(element: &Element, parent: FiberId) -> Self {
        Self {
            element_type: Rc::clone(element.type_tag()),
            props: Rc::clone(element.props()),
            host: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect_tag: Some(EffectTag::Placement),
        }
    }

    /// Same type at the same position: new props, reused host node.
    pub fn update(element: &Element, parent: FiberId, host: Option<N>, alternate: FiberId) -> Self {
        Self {
            element_type: Rc::clone(element.type_tag()),
            props: Rc::clone(element.props()),
            host,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: Some(alternate),
            effect_tag: Some(EffectTag::Update),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

// =============================================================================
// Arena
// =============================================================================

/// Storage for every live fiber of the current and in-progress generations.
#[derive(Debug)]
pub struct FiberArena<N> {
    fibers: SlotMap<FiberId, Fiber<N>>,
}

impl<N> Default for FiberArena<N> {
    fn default() -> Self {
        Self {
            fibers: SlotMap::with_key(),
        }
    }
}

impl<N> FiberArena<N> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fiber: Fiber<N>) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber<N>> {
        self.fibers.get(id)
    }

    pub fn get_mut(&mut self, id: FiberId) -> Option<&mut Fiber<N>> {
        self.fibers.get_mut(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Like [`get`](Self::get), but a missing fiber is an invariant violation.
    pub(crate) fn fiber(&self, id: FiberId) -> Result<&Fiber<N>> {
        self.fibers
            .get(id)
            .ok_or_else(|| Error::invariant(format!("fiber {id:?} is not in the arena")))
    }

    pub(crate) fn fiber_mut(&mut self, id: FiberId) -> Result<&mut Fiber<N>> {
        self.fibers
            .get_mut(id)
            .ok_or_else(|| Error::invariant(format!("fiber {id:?} is not in the arena")))
    }

    /// Direct children of `id`, following the sibling list.
    pub fn children(&self, id: FiberId) -> Children<'_, N> {
        Children {
            arena: self,
            next: self.get(id).and_then(|fiber| fiber.child),
        }
    }

    /// Pre-order walk of everything below `root` (child before sibling).
    pub fn descendants(&self, root: FiberId) -> Descendants<'_, N> {
        Descendants {
            arena: self,
            root,
            next: self.get(root).and_then(|fiber| fiber.child),
        }
    }

    /// Release `root` and its whole child chain. Returns the number of
    /// fibers released. `root`'s own siblings are left alone.
    pub fn release_tree(&mut self, root: FiberId) -> usize {
        let mut released = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.fibers.remove(id) else {
                continue;
            };
            released += 1;
            if let Some(child) = fiber.child {
                stack.push(child);
            }
            if id != root {
                if let Some(sibling) = fiber.sibling {
                    stack.push(sibling);
                }
            }
        }
        released
    }
}

/// Iterator over a fiber's direct children.
pub struct Children<'a, N> {
    arena: &'a FiberArena<N>,
    next: Option<FiberId>,
}

impl<N> Iterator for Children<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.next?;
        self.next = self.arena.get(id).and_then(|fiber| fiber.sibling);
        Some(id)
    }
}

/// Pre-order iterator bounded to one subtree.
pub struct Descendants<'a, N> {
    arena: &'a FiberArena<N>,
    root: FiberId,
    next: Option<FiberId>,
}

impl<N> Iterator for Descendants<'_, N> {
    type Item = FiberId;

    fn next(&mut self) -> Option<FiberId> {
        let id = self.next?;
        self.next = step(self.arena, id, Some(self.root));
        Some(id)
    }
}

// =============================================================================
// Traversal
// =============================================================================

/// The fiber to process after `fiber`: its child, else the sibling of the
/// nearest ancestor (itself included) that has one, else `None`.
pub fn next_unit_of_work<N>(arena: &FiberArena<N>, fiber: FiberId) -> Option<FiberId> {
    step(arena, fiber, None)
}

fn step<N>(arena: &FiberArena<N>, fiber: FiberId, boundary: Option<FiberId>) -> Option<FiberId> {
    if let Some(child) = arena.get(fiber)?.child {
        return Some(child);
    }
    let mut cursor = Some(fiber);
    while let Some(id) = cursor {
        if Some(id) == boundary {
            return None;
        }
        let current = arena.get(id)?;
        if let Some(sibling) = current.sibling {
            return Some(sibling);
        }
        cursor = current.parent;
    }
    None
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Props, text};
    use std::collections::HashSet;

    fn el(tag: &str) -> Element {
        Element::new(tag, Props::new())
    }

    /// root
    /// └── a
    ///     ├── b
    ///     │   └── d
    ///     └── c
    fn sample() -> (FiberArena<u32>, [FiberId; 5]) {
        let mut arena = FiberArena::new();
        let root = arena.insert(Fiber::root(0, el("a"), None));
        let a = arena.insert(Fiber::placement(&el("a"), root));
        let b = arena.insert(Fiber::placement(&el("b"), a));
        let c = arena.insert(Fiber::placement(&el("c"), a));
        let d = arena.insert(Fiber::placement(&text("d"), b));

        arena.get_mut(root).unwrap().child = Some(a);
        arena.get_mut(a).unwrap().child = Some(b);
        arena.get_mut(b).unwrap().sibling = Some(c);
        arena.get_mut(b).unwrap().child = Some(d);

        (arena, [root, a, b, c, d])
    }

    #[test]
    fn test_next_unit_of_work_order() {
        let (arena, [root, a, b, c, d]) = sample();

        let mut order = vec![root];
        let mut cursor = next_unit_of_work(&arena, root);
        while let Some(id) = cursor {
            order.push(id);
            cursor = next_unit_of_work(&arena, id);
        }

        assert_eq!(order, vec![root, a, b, d, c]);
        let unique: HashSet<_> = order.iter().copied().collect();
        assert_eq!(unique.len(), arena.len());
    }

    #[test]
    fn test_descendants_stay_in_subtree() {
        let (arena, [root, a, b, c, d]) = sample();

        let all: Vec<_> = arena.descendants(root).collect();
        assert_eq!(all, vec![a, b, d, c]);

        // b's subtree must not leak into its sibling c.
        let under_b: Vec<_> = arena.descendants(b).collect();
        assert_eq!(under_b, vec![d]);
    }

    #[test]
    fn test_children() {
        let (arena, [root, a, b, c, _]) = sample();
        assert_eq!(arena.children(a).collect::<Vec<_>>(), vec![b, c]);
        assert_eq!(arena.children(root).collect::<Vec<_>>(), vec![a]);
    }

    #[test]
    fn test_release_tree_keeps_root_siblings() {
        let (mut arena, [_, a, b, c, d]) = sample();

        assert_eq!(arena.release_tree(b), 2);
        assert!(!arena.contains(b));
        assert!(!arena.contains(d));
        assert!(arena.contains(c));
        assert!(arena.contains(a));
    }

    #[test]
    fn test_release_whole_tree() {
        let (mut arena, [root, a, ..]) = sample();

        assert_eq!(arena.release_tree(root), 5);
        assert!(arena.is_empty());
        assert!(arena.get(a).is_none());
    }

    #[test]
    fn test_released_alternate_reads_absent() {
        let mut arena: FiberArena<u32> = FiberArena::new();
        let old = arena.insert(Fiber::root(0, el("x"), None));
        let new = arena.insert(Fiber::root(0, el("x"), Some(old)));
        arena.release_tree(old);

        let alternate = arena.get(new).unwrap().alternate.unwrap();
        assert!(arena.get(alternate).is_none());
        assert!(arena.fiber(alternate).is_err());
    }
}
