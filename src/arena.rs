//! Fixed slot storage with an occupancy bitmap.
//!
//! The arena owns every node the map will ever hold. It is sized once at
//! construction and never grows; slots are handed out and reclaimed by index.
//! Bit `i` of the bitmap lives in byte `i / 8` at position `i % 8` (LSB first).

use crate::error::{Error, Result};

// =============================================================================
// Slot index
// =============================================================================

/// Slot index: 32-bit position in the arena.
///
/// Child links are stored as indices, never as references.
/// Special: `u32::MAX` = NIL ("no child" / empty tree).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SlotIdx(u32);

impl SlotIdx {
    pub(crate) const NIL: SlotIdx = SlotIdx(u32::MAX);

    #[inline]
    pub(crate) fn new(idx: usize) -> Self {
        debug_assert!(idx < u32::MAX as usize);
        Self(idx as u32)
    }

    #[inline]
    pub(crate) fn is_nil(self) -> bool {
        self == Self::NIL
    }

    #[inline]
    pub(crate) fn get(self) -> usize {
        debug_assert!(!self.is_nil());
        self.0 as usize
    }
}

impl std::fmt::Debug for SlotIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_nil() {
            f.write_str("NIL")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Largest capacity addressable by a [`SlotIdx`].
pub const MAX_CAPACITY: usize = u32::MAX as usize - 1;

/// Height stored in a slot that holds no entry.
pub(crate) const EMPTY_HEIGHT: i8 = -1;

// =============================================================================
// Slot
// =============================================================================

#[derive(Clone, Debug)]
pub(crate) struct Slot<V> {
    /// Hash of the original string key. Meaningless while unoccupied.
    pub(crate) key: i32,
    pub(crate) value: Option<V>,
    /// AVL height; leaves are 0.
    pub(crate) height: i8,
    pub(crate) left: SlotIdx,
    pub(crate) right: SlotIdx,
}

impl<V> Slot<V> {
    fn empty() -> Self {
        Self {
            key: -1,
            value: None,
            height: EMPTY_HEIGHT,
            left: SlotIdx::NIL,
            right: SlotIdx::NIL,
        }
    }

    /// Returns the slot to its empty state, handing back any payload it held.
    pub(crate) fn reset(&mut self) -> Option<V> {
        std::mem::replace(self, Self::empty()).value
    }
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Clone)]
pub(crate) struct Arena<V> {
    slots: Box<[Slot<V>]>,
    /// One bit per slot, `ceil(capacity / 8)` bytes. Padding bits stay clear.
    bitmap: Box<[u8]>,
}

impl<V> Arena<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        debug_assert!(capacity > 0 && capacity <= MAX_CAPACITY);
        Self {
            slots: (0..capacity).map(|_| Slot::empty()).collect(),
            bitmap: vec![0u8; capacity.div_ceil(8)].into_boxed_slice(),
        }
    }

    #[inline]
    pub(crate) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn bit(idx: SlotIdx) -> (usize, u8) {
        let i = idx.get();
        (i / 8, 1u8 << (i % 8))
    }

    #[inline]
    pub(crate) fn is_occupied(&self, idx: SlotIdx) -> bool {
        let (byte, mask) = Self::bit(idx);
        self.bitmap[byte] & mask != 0
    }

    /// Number of set bits in the bitmap.
    #[cfg(test)]
    pub(crate) fn occupied(&self) -> usize {
        self.bitmap.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// Finds the lowest free slot.
    ///
    /// The slot is not marked occupied; the caller commits it with
    /// [`Arena::toggle`] once it is wired into the tree.
    pub(crate) fn allocate(&self) -> Result<SlotIdx> {
        let exhausted = Error::Exhausted {
            capacity: self.capacity(),
        };
        let Some(byte) = self.bitmap.iter().position(|&b| b != u8::MAX) else {
            return Err(exhausted);
        };
        let idx = byte * 8 + self.bitmap[byte].trailing_ones() as usize;
        // Clear padding bits past the last slot must never be handed out.
        if idx >= self.capacity() {
            return Err(exhausted);
        }
        Ok(SlotIdx::new(idx))
    }

    /// Flips the occupancy bit of `idx`.
    #[inline]
    pub(crate) fn toggle(&mut self, idx: SlotIdx) {
        let (byte, mask) = Self::bit(idx);
        self.bitmap[byte] ^= mask;
    }

    /// Empties `idx` and clears its occupancy bit, returning the payload.
    ///
    /// Also used to roll back a slot that was allocated but never committed,
    /// in which case the bit is already clear.
    pub(crate) fn release(&mut self, idx: SlotIdx) -> Option<V> {
        let (byte, mask) = Self::bit(idx);
        self.bitmap[byte] &= !mask;
        self.slots[idx.get()].reset()
    }

    /// Empties every slot and clears the bitmap.
    pub(crate) fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.reset();
        }
        self.bitmap.fill(0);
    }

    #[inline]
    pub(crate) fn slot(&self, idx: SlotIdx) -> &Slot<V> {
        &self.slots[idx.get()]
    }

    #[inline]
    pub(crate) fn slot_mut(&mut self, idx: SlotIdx) -> &mut Slot<V> {
        &mut self.slots[idx.get()]
    }

    /// Exchanges key and value between two slots. Links and heights stay put.
    pub(crate) fn swap_payload(&mut self, a: SlotIdx, b: SlotIdx) {
        if a == b {
            return;
        }
        let (lo, hi) = if a.get() < b.get() { (a, b) } else { (b, a) };
        let (head, tail) = self.slots.split_at_mut(hi.get());
        let x = &mut head[lo.get()];
        let y = &mut tail[0];
        std::mem::swap(&mut x.key, &mut y.key);
        std::mem::swap(&mut x.value, &mut y.value);
    }
}
