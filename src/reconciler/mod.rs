//! Reconciler - Positional diff of one fiber's children.
//!
//! The new child elements and the previous generation's child fibers are
//! walked in lockstep by index. At each position:
//!
//! | old fiber | new element | same type | result                              |
//! |-----------|-------------|-----------|-------------------------------------|
//! | yes       | yes         | yes       | `Update` fiber reusing the host node |
//! | any       | yes         | no        | `Placement` fiber                    |
//! | yes       | any         | no        | old fiber tagged `Deletion`          |
//!
//! Identity is position plus type tag only. There are no keys, so swapping
//! two same-typed siblings yields two updates that each diff against the
//! other's old props.

use std::rc::Rc;

use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, FiberArena, FiberId};

/// Build `wip`'s child fibers for `elements`, diffed against the children
/// of `wip`'s alternate. Old fibers without a match are tagged `Deletion`
/// and pushed onto `deletions`.
pub fn reconcile_children<N: Clone>(
    arena: &mut FiberArena<N>,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: &[Element],
) {
    let mut old = arena
        .get(wip)
        .and_then(|fiber| fiber.alternate)
        .and_then(|alternate| arena.get(alternate))
        .and_then(|alternate| alternate.child);
    let mut prev_sibling: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let old_fiber = old.and_then(|id| arena.get(id));
        let old_type = old_fiber.map(|fiber| Rc::clone(&fiber.element_type));
        let old_host = old_fiber.and_then(|fiber| fiber.host.clone());
        let old_sibling = old_fiber.and_then(|fiber| fiber.sibling);

        let same_type = match (element, &old_type, old) {
            (Some(element), Some(old_type), Some(_)) => element.element_type() == &**old_type,
            _ => false,
        };

        let new_fiber = match (element, old) {
            (Some(element), Some(old_id)) if same_type => {
                Some(arena.insert(Fiber::update(element, wip, old_host, old_id)))
            }
            (Some(element), _) => Some(arena.insert(Fiber::placement(element, wip))),
            (None, _) => None,
        };

        if !same_type {
            if let Some(old_id) = old {
                if let Some(old_fiber) = arena.get_mut(old_id) {
                    old_fiber.effect_tag = Some(EffectTag::Deletion);
                    deletions.push(old_id);
                }
            }
        }

        if let Some(new_id) = new_fiber {
            let link = match prev_sibling {
                Some(prev) => arena.get_mut(prev).map(|fiber| &mut fiber.sibling),
                None => arena.get_mut(wip).map(|fiber| &mut fiber.child),
            };
            if let Some(slot) = link {
                *slot = Some(new_id);
            }
            prev_sibling = Some(new_id);
        }

        old = old_sibling;
        index += 1;
    }

    tracing::trace!(
        wip = ?wip,
        children = elements.len(),
        deletions = deletions.len(),
        "reconciled children"
    );
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::children;
    use crate::element::{Props, create_element};

    fn el(tag: &str) -> Element {
        create_element(tag, Props::new(), children![])
    }

    fn effects(arena: &FiberArena<u32>, parent: FiberId) -> Vec<(String, Option<EffectTag>)> {
        arena
            .children(parent)
            .map(|id| {
                let fiber = arena.get(id).unwrap();
                (fiber.element_type.to_string(), fiber.effect_tag)
            })
            .collect()
    }

    /// A committed parent with host node 1 and children of the given types,
    /// each with host node 10 + index.
    fn committed(arena: &mut FiberArena<u32>, tags: &[&str]) -> FiberId {
        let parent = arena.insert(Fiber::root(1, el("div"), None));
        let elements: Vec<Element> = tags.iter().map(|tag| el(tag)).collect();
        let mut deletions = Vec::new();
        reconcile_children(arena, &mut deletions, parent, &elements);
        for (index, id) in arena.children(parent).collect::<Vec<_>>().into_iter().enumerate() {
            arena.get_mut(id).unwrap().host = Some(10 + index as u32);
        }
        parent
    }

    fn next_parent(arena: &mut FiberArena<u32>, alternate: FiberId) -> FiberId {
        arena.insert(Fiber::root(1, el("div"), Some(alternate)))
    }

    #[test]
    fn test_first_render_places_everything() {
        let mut arena = FiberArena::new();
        let parent = arena.insert(Fiber::root(1, el("div"), None));
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, parent, &[el("h1"), el("h2")]);

        assert_eq!(
            effects(&arena, parent),
            vec![
                ("h1".to_string(), Some(EffectTag::Placement)),
                ("h2".to_string(), Some(EffectTag::Placement)),
            ]
        );
        assert!(deletions.is_empty());
        for id in arena.children(parent) {
            let fiber = arena.get(id).unwrap();
            assert_eq!(fiber.parent, Some(parent));
            assert!(fiber.host.is_none());
            assert!(fiber.alternate.is_none());
        }
    }

    #[test]
    fn test_same_type_updates_and_reuses_host() {
        let mut arena = FiberArena::new();
        let old_parent = committed(&mut arena, &["h1", "h2"]);
        let old_children: Vec<_> = arena.children(old_parent).collect();
        let parent = next_parent(&mut arena, old_parent);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, parent, &[el("h1"), el("h2")]);

        let new_children: Vec<_> = arena.children(parent).collect();
        assert_eq!(new_children.len(), 2);
        for (index, id) in new_children.iter().enumerate() {
            let fiber = arena.get(*id).unwrap();
            assert_eq!(fiber.effect_tag, Some(EffectTag::Update));
            assert_eq!(fiber.alternate, Some(old_children[index]));
            assert_eq!(fiber.host, Some(10 + index as u32));
        }
        assert!(deletions.is_empty());
    }

    #[test]
    fn test_type_change_deletes_and_places() {
        let mut arena = FiberArena::new();
        let old_parent = committed(&mut arena, &["h1"]);
        let old_h1 = arena.children(old_parent).next().unwrap();
        let parent = next_parent(&mut arena, old_parent);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, parent, &[el("span")]);

        assert_eq!(
            effects(&arena, parent),
            vec![("span".to_string(), Some(EffectTag::Placement))]
        );
        assert_eq!(deletions, vec![old_h1]);
        assert_eq!(arena.get(old_h1).unwrap().effect_tag, Some(EffectTag::Deletion));
        let span = arena.children(parent).next().unwrap();
        assert!(arena.get(span).unwrap().host.is_none());
    }

    #[test]
    fn test_trailing_old_fibers_are_deleted() {
        let mut arena = FiberArena::new();
        let old_parent = committed(&mut arena, &["h1", "h2", "p"]);
        let old: Vec<_> = arena.children(old_parent).collect();
        let parent = next_parent(&mut arena, old_parent);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, parent, &[el("h1")]);

        assert_eq!(
            effects(&arena, parent),
            vec![("h1".to_string(), Some(EffectTag::Update))]
        );
        assert_eq!(deletions, vec![old[1], old[2]]);
    }

    #[test]
    fn test_trailing_new_elements_are_placed() {
        let mut arena = FiberArena::new();
        let old_parent = committed(&mut arena, &["h1"]);
        let parent = next_parent(&mut arena, old_parent);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, parent, &[el("h1"), el("p"), el("p")]);

        assert_eq!(
            effects(&arena, parent),
            vec![
                ("h1".to_string(), Some(EffectTag::Update)),
                ("p".to_string(), Some(EffectTag::Placement)),
                ("p".to_string(), Some(EffectTag::Placement)),
            ]
        );
        assert!(deletions.is_empty());
    }

    #[test]
    fn test_reorder_is_two_updates() {
        let mut arena = FiberArena::new();
        let old_parent = committed(&mut arena, &["p", "p"]);
        let old: Vec<_> = arena.children(old_parent).collect();
        let parent = next_parent(&mut arena, old_parent);
        let mut deletions = Vec::new();

        let first = create_element("p", Props::new().set("id", "b"), children![]);
        let second = create_element("p", Props::new().set("id", "a"), children![]);
        reconcile_children(&mut arena, &mut deletions, parent, &[first, second]);

        let new: Vec<_> = arena.children(parent).collect();
        assert_eq!(arena.get(new[0]).unwrap().alternate, Some(old[0]));
        assert_eq!(arena.get(new[1]).unwrap().alternate, Some(old[1]));
        assert!(
            new.iter()
                .all(|id| arena.get(*id).unwrap().effect_tag == Some(EffectTag::Update))
        );
        assert!(deletions.is_empty());
    }

    #[test]
    fn test_empty_children_clear_everything() {
        let mut arena = FiberArena::new();
        let old_parent = committed(&mut arena, &["h1", "h2"]);
        let parent = next_parent(&mut arena, old_parent);
        let mut deletions = Vec::new();

        reconcile_children(&mut arena, &mut deletions, parent, &[]);

        assert!(arena.get(parent).unwrap().child.is_none());
        assert_eq!(deletions.len(), 2);
    }
}
