//! Reduction of string keys to the 32-bit ordering key.
//!
//! The map orders entries by hash only, so a hasher must be deterministic.
//! Collisions are allowed but two colliding keys cannot both be stored.

/// Maps a string key to the signed 32-bit value the tree is ordered by.
pub trait KeyHasher {
    fn hash_key(&self, key: &str) -> i32;
}

/// Polynomial string hash: `h = 31 * h + unit` over UTF-16 code units,
/// wrapping at 32 bits, starting from 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Poly31;

impl KeyHasher for Poly31 {
    #[inline]
    fn hash_key(&self, key: &str) -> i32 {
        key.encode_utf16()
            .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)))
    }
}

impl<F> KeyHasher for F
where
    F: Fn(&str) -> i32,
{
    #[inline]
    fn hash_key(&self, key: &str) -> i32 {
        self(key)
    }
}
