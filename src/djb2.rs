//! The DJB2 string hash, exposed through the standard hasher traits.
//!
//! The accumulator starts at 5381 and folds in one byte at a time as
//! `hash = hash * 33 + byte`, wrapping on `u64`. The algorithm is
//! bit-reproducible: two implementations that agree on the capacity agree
//! on every home index, and therefore on every probe sequence.

use core::hash::BuildHasher;
use core::hash::Hasher;

/// Initial accumulator value of the DJB2 algorithm.
const SEED: u64 = 5381;

/// A [`Hasher`] implementing DJB2.
///
/// Table code feeds key bytes through [`Hasher::write`] directly rather
/// than via `str::hash`, which appends a length-prefix byte and would
/// change the accumulator.
///
/// # Examples
///
/// ```rust
/// use core::hash::Hasher;
///
/// use brim_hash::djb2::Djb2Hasher;
///
/// let mut hasher = Djb2Hasher::default();
/// hasher.write(b"hello");
/// assert_eq!(hasher.finish(), 210_714_636_441);
/// ```
#[derive(Debug, Clone)]
pub struct Djb2Hasher {
    state: u64,
}

impl Default for Djb2Hasher {
    fn default() -> Self {
        Djb2Hasher { state: SEED }
    }
}

impl Hasher for Djb2Hasher {
    fn finish(&self) -> u64 {
        self.state
    }

    fn write(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            self.state = self.state.wrapping_mul(33).wrapping_add(u64::from(byte));
        }
    }
}

/// A [`BuildHasher`] producing [`Djb2Hasher`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct Djb2;

impl BuildHasher for Djb2 {
    type Hasher = Djb2Hasher;

    fn build_hasher(&self) -> Self::Hasher {
        Djb2Hasher::default()
    }
}

/// Hashes a key's raw bytes with DJB2.
pub fn hash_key(key: &str) -> u64 {
    let mut hasher = Djb2.build_hasher();
    hasher.write(key.as_bytes());
    hasher.finish()
}

/// Maps a key to its home index in a table of `capacity` slots.
///
/// `capacity` must be non-zero; tables reject zero capacity at
/// construction.
pub(crate) fn home_index(key: &str, capacity: usize) -> usize {
    (hash_key(key) % capacity as u64) as usize
}
