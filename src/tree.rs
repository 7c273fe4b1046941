//! AVL tree over arena slot indices.
//!
//! Every function takes the arena plus the index of a subtree root and returns
//! the (possibly new) subtree root. The tree has no state of its own besides
//! the root index the caller keeps. Recursion depth is bounded by the tree
//! height, which is `O(log capacity)` (under 50 for the largest capacity).

use std::cmp::Ordering;

use crate::arena::{Arena, SlotIdx, EMPTY_HEIGHT};
use crate::error::{Error, Result};

// =============================================================================
// Heights
// =============================================================================

#[inline]
pub(crate) fn height<V>(arena: &Arena<V>, idx: SlotIdx) -> i8 {
    if idx.is_nil() {
        EMPTY_HEIGHT
    } else {
        arena.slot(idx).height
    }
}

#[inline]
fn update_height<V>(arena: &mut Arena<V>, idx: SlotIdx) {
    let slot = arena.slot(idx);
    let h = height(arena, slot.left).max(height(arena, slot.right)) + 1;
    arena.slot_mut(idx).height = h;
}

/// `height(left) - height(right)`.
#[inline]
pub(crate) fn balance_factor<V>(arena: &Arena<V>, idx: SlotIdx) -> i32 {
    let slot = arena.slot(idx);
    i32::from(height(arena, slot.left)) - i32::from(height(arena, slot.right))
}

// =============================================================================
// Rotations
// =============================================================================

fn rotate_right<V>(arena: &mut Arena<V>, node: SlotIdx) -> SlotIdx {
    let pivot = arena.slot(node).left;
    debug_assert!(!pivot.is_nil());
    let inner = arena.slot(pivot).right;
    arena.slot_mut(node).left = inner;
    arena.slot_mut(pivot).right = node;
    update_height(arena, node);
    update_height(arena, pivot);
    pivot
}

fn rotate_left<V>(arena: &mut Arena<V>, node: SlotIdx) -> SlotIdx {
    let pivot = arena.slot(node).right;
    debug_assert!(!pivot.is_nil());
    let inner = arena.slot(pivot).left;
    arena.slot_mut(node).right = inner;
    arena.slot_mut(pivot).left = node;
    update_height(arena, node);
    update_height(arena, pivot);
    pivot
}

/// Restores the AVL rule at `node` and refreshes its height.
///
/// Children must already be balanced with correct heights.
pub(crate) fn rebalance<V>(arena: &mut Arena<V>, node: SlotIdx) -> SlotIdx {
    let bf = balance_factor(arena, node);
    if bf > 1 {
        let left = arena.slot(node).left;
        if balance_factor(arena, left) < 0 {
            let new_left = rotate_left(arena, left);
            arena.slot_mut(node).left = new_left;
        }
        rotate_right(arena, node)
    } else if bf < -1 {
        let right = arena.slot(node).right;
        if balance_factor(arena, right) > 0 {
            let new_right = rotate_right(arena, right);
            arena.slot_mut(node).right = new_right;
        }
        rotate_left(arena, node)
    } else {
        update_height(arena, node);
        node
    }
}

// =============================================================================
// Insert / find / remove
// =============================================================================

/// Links the populated slot `new` into the subtree rooted at `at`.
///
/// On `DuplicateKey` no link or height has been touched.
pub(crate) fn insert<V>(arena: &mut Arena<V>, new: SlotIdx, at: SlotIdx) -> Result<SlotIdx> {
    if at.is_nil() {
        return Ok(new);
    }
    let key = arena.slot(new).key;
    let here = arena.slot(at);
    let (left, right) = (here.left, here.right);
    match key.cmp(&here.key) {
        Ordering::Less => {
            let left = insert(arena, new, left)?;
            arena.slot_mut(at).left = left;
        }
        Ordering::Greater => {
            let right = insert(arena, new, right)?;
            arena.slot_mut(at).right = right;
        }
        Ordering::Equal => return Err(Error::DuplicateKey { hash: key }),
    }
    Ok(rebalance(arena, at))
}

pub(crate) fn find<V>(arena: &Arena<V>, hash: i32, root: SlotIdx) -> Option<SlotIdx> {
    let mut current = root;
    while !current.is_nil() {
        let slot = arena.slot(current);
        current = match hash.cmp(&slot.key) {
            Ordering::Less => slot.left,
            Ordering::Greater => slot.right,
            Ordering::Equal => return Some(current),
        };
    }
    None
}

/// Smallest key in the subtree rooted at `at`.
pub(crate) fn leftmost<V>(arena: &Arena<V>, mut at: SlotIdx) -> SlotIdx {
    debug_assert!(!at.is_nil());
    loop {
        let left = arena.slot(at).left;
        if left.is_nil() {
            return at;
        }
        at = left;
    }
}

/// Unlinks the entry with `hash` from the subtree rooted at `at`.
///
/// Returns the new subtree root and the victim: the slot that is no longer
/// reachable and now holds the removed key and value. When the matching node
/// has two children its payload is swapped with its in-order successor, so the
/// victim is the successor's slot rather than the matched one.
pub(crate) fn remove<V>(arena: &mut Arena<V>, hash: i32, at: SlotIdx) -> (SlotIdx, Option<SlotIdx>) {
    if at.is_nil() {
        return (SlotIdx::NIL, None);
    }
    let here = arena.slot(at);
    let (left, right) = (here.left, here.right);
    match hash.cmp(&here.key) {
        Ordering::Less => {
            let (new_left, victim) = remove(arena, hash, left);
            if victim.is_none() {
                return (at, None);
            }
            arena.slot_mut(at).left = new_left;
            (rebalance(arena, at), victim)
        }
        Ordering::Greater => {
            let (new_right, victim) = remove(arena, hash, right);
            if victim.is_none() {
                return (at, None);
            }
            arena.slot_mut(at).right = new_right;
            (rebalance(arena, at), victim)
        }
        Ordering::Equal => match (left.is_nil(), right.is_nil()) {
            (true, true) => (SlotIdx::NIL, Some(at)),
            (false, true) => (left, Some(at)),
            (true, false) => (right, Some(at)),
            (false, false) => {
                // The successor now carries `hash` and is still the minimum of
                // the right subtree, so the recursive call lands on it.
                let successor = leftmost(arena, right);
                arena.swap_payload(at, successor);
                let (new_right, victim) = remove(arena, hash, right);
                debug_assert_eq!(victim, Some(successor));
                arena.slot_mut(at).right = new_right;
                (rebalance(arena, at), victim)
            }
        },
    }
}
