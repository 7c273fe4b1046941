//! # fsmap
//!
//! A fixed-capacity map from string keys to values.
//!
//! All entries live in one AVL tree whose nodes are slots of a pre-allocated
//! arena. Child links are slot indices and free slots are tracked by an
//! occupancy bitmap, so the map never allocates after construction and
//! insert, lookup and delete are `O(log capacity)`.
//!
//! Keys are reduced to a 32-bit hash ([`Poly31`] by default) and the tree is
//! ordered by that hash alone. Two keys with the same hash cannot coexist:
//! the second `set` fails exactly like a duplicate key would. Setting an
//! existing key also fails; there is no in-place update through `set`.
//!
//! ## Example
//!
//! ```rust
//! use fsmap::FixedMap;
//!
//! let mut map: FixedMap<&str> = FixedMap::new(2).unwrap();
//! assert!(map.set("hello", "world"));
//! assert!(map.set("foo", "bar"));
//! assert!(!map.set("baz", "qux")); // full
//!
//! assert_eq!(map.get("hello"), Some(&"world"));
//! assert_eq!(map.delete("foo"), Some("bar"));
//! assert_eq!(map.load(), 0.5);
//! ```

#![deny(unsafe_code)]

mod arena;
mod error;
mod hash;
mod tree;

pub use arena::MAX_CAPACITY;
pub use error::{Error, Result};
pub use hash::{KeyHasher, Poly31};

use arena::{Arena, SlotIdx};
use tracing::{debug, trace};

// =============================================================================
// FixedMap
// =============================================================================

/// A fixed-capacity map ordered by key hash.
///
/// Capacity is chosen at construction and never changes. Operations run to
/// completion on the calling thread; the map does no internal locking, so
/// shared use across threads needs an external lock around the whole map.
#[derive(Clone)]
pub struct FixedMap<V, H = Poly31> {
    arena: Arena<V>,
    root: SlotIdx,
    count: usize,
    hasher: H,
}

impl<V> FixedMap<V> {
    /// Creates a map with room for exactly `capacity` entries.
    ///
    /// Fails with [`Error::InvalidCapacity`] when `capacity` is 0 or above
    /// [`MAX_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self> {
        Self::with_hasher(capacity, Poly31)
    }
}

impl<V> TryFrom<i64> for FixedMap<V> {
    type Error = Error;

    fn try_from(capacity: i64) -> std::result::Result<Self, Self::Error> {
        match usize::try_from(capacity) {
            Ok(c) if c > 0 => Self::new(c),
            _ => Err(Error::InvalidCapacity(capacity)),
        }
    }
}

impl<V, H: KeyHasher> FixedMap<V, H> {
    pub fn with_hasher(capacity: usize, hasher: H) -> Result<Self> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(Error::InvalidCapacity(
                i64::try_from(capacity).unwrap_or(i64::MAX),
            ));
        }
        Ok(Self {
            arena: Arena::new(capacity),
            root: SlotIdx::NIL,
            count: 0,
            hasher,
        })
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.arena.capacity()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count == self.capacity()
    }

    /// Fraction of slots in use, in `[0, 1]`.
    pub fn load(&self) -> f32 {
        self.count as f32 / self.capacity() as f32
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Associates `key` with `value`.
    ///
    /// Returns `false` if the map is full or the key's hash is already stored;
    /// the value is dropped in that case. See [`FixedMap::try_set`] to tell
    /// the two apart.
    pub fn set(&mut self, key: &str, value: V) -> bool {
        self.try_set(key, value).is_ok()
    }

    /// Associates `key` with `value`, reporting why it could not.
    ///
    /// On failure the map is exactly as it was before the call.
    pub fn try_set(&mut self, key: &str, value: V) -> Result<()> {
        if self.is_full() {
            debug!(capacity = self.capacity(), "set rejected, map is full");
            return Err(Error::Exhausted {
                capacity: self.capacity(),
            });
        }
        let idx = self.arena.allocate()?;
        let hash = self.hasher.hash_key(key);
        {
            let slot = self.arena.slot_mut(idx);
            slot.key = hash;
            slot.value = Some(value);
            slot.height = 0;
        }

        // Nothing is committed to the bitmap or count until the slot is linked.
        match tree::insert(&mut self.arena, idx, self.root) {
            Ok(root) => {
                self.root = root;
                self.arena.toggle(idx);
                self.count += 1;
                trace!(hash, slot = ?idx, len = self.count, "inserted");
                Ok(())
            }
            Err(e) => {
                self.arena.release(idx);
                debug!(hash, slot = ?idx, "duplicate key hash, slot released");
                Err(e)
            }
        }
    }

    fn find(&self, key: &str) -> Option<SlotIdx> {
        if self.is_empty() {
            return None;
        }
        tree::find(&self.arena, self.hasher.hash_key(key), self.root)
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        let idx = self.find(key)?;
        self.arena.slot(idx).value.as_ref()
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        let idx = self.find(key)?;
        self.arena.slot_mut(idx).value.as_mut()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_some()
    }

    /// Removes `key`, returning its value. The freed slot is reused by later sets.
    pub fn delete(&mut self, key: &str) -> Option<V> {
        if self.is_empty() {
            return None;
        }
        let hash = self.hasher.hash_key(key);
        let (root, victim) = tree::remove(&mut self.arena, hash, self.root);
        self.root = root;
        let victim = victim?;
        debug_assert!(self.arena.is_occupied(victim));
        let value = self.arena.release(victim);
        self.count -= 1;
        trace!(hash, slot = ?victim, len = self.count, "deleted");
        value
    }

    /// Removes every entry. Capacity is unchanged.
    pub fn clear(&mut self) {
        self.arena.clear();
        self.root = SlotIdx::NIL;
        self.count = 0;
    }
}

impl<V, H> FixedMap<V, H> {
    /// Iterates `(hash, value)` pairs in ascending hash order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            arena: &self.arena,
            stack: Vec::new(),
            current: self.root,
            remaining: self.count,
        }
    }
}

impl<V: std::fmt::Debug, H> std::fmt::Debug for FixedMap<V, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, V, H> IntoIterator for &'a FixedMap<V, H> {
    type Item = (i32, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over a [`FixedMap`].
pub struct Iter<'a, V> {
    arena: &'a Arena<V>,
    stack: Vec<SlotIdx>,
    current: SlotIdx,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (i32, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        while !self.current.is_nil() {
            self.stack.push(self.current);
            self.current = self.arena.slot(self.current).left;
        }
        let idx = self.stack.pop()?;
        let slot = self.arena.slot(idx);
        self.current = slot.right;
        self.remaining -= 1;
        slot.value.as_ref().map(|v| (slot.key, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}


#[cfg(test)]
mod proptests;
