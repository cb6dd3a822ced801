//! A fixed-capacity, unsynchronized hash table mapping string keys to
//! integers.
//!
//! Collisions are resolved by linear probing: a key whose home slot is
//! taken scans forward (with wraparound) for the first empty slot.
//! Deletion shifts later cluster members backward to close the gap, so
//! probe clusters never contain holes and no tombstones accumulate.
//!
//! The table never resizes. [`SyncHashTable`] layers blocking capacity
//! control on top of this type; here a full table simply refuses inserts.
//!
//! [`SyncHashTable`]: crate::sync_table::SyncHashTable

use core::fmt;

use crate::djb2;
use crate::error::Error;

#[derive(Debug, Clone)]
struct Slot {
    key: String,
    value: i64,
}

/// A fixed-capacity open-addressed hash table from [`String`] keys to
/// [`i64`] values.
///
/// # Examples
///
/// ```rust
/// use brim_hash::HashTable;
///
/// let mut table = HashTable::new(10)?;
/// table.insert("hello", 1)?;
/// table.insert("there", 2)?;
///
/// assert_eq!(table.get("hello"), Some(1));
/// assert_eq!(table.remove("there")?, 2);
/// assert!(table.remove("there").is_err());
/// # Ok::<(), brim_hash::Error>(())
/// ```
#[derive(Clone)]
pub struct HashTable {
    slots: Box<[Option<Slot>]>,
    occupied: usize,
}

impl HashTable {
    /// Creates a table with exactly `capacity` slots.
    ///
    /// The capacity is fixed for the table's lifetime; choose it up
    /// front. Fails with [`Error::Alloc`] if `capacity` is zero or the
    /// slot array cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brim_hash::HashTable;
    ///
    /// let table = HashTable::new(10)?;
    /// assert_eq!(table.capacity(), 10);
    /// assert!(table.is_empty());
    /// # Ok::<(), brim_hash::Error>(())
    /// ```
    pub fn new(capacity: usize) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::Alloc);
        }
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity).map_err(|_| Error::Alloc)?;
        slots.resize_with(capacity, || None);
        Ok(HashTable {
            slots: slots.into_boxed_slice(),
            occupied: 0,
        })
    }

    /// Returns the number of slots in the table.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> usize {
        self.occupied
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    /// Returns `true` if every slot is occupied.
    pub fn is_full(&self) -> bool {
        self.occupied == self.slots.len()
    }

    /// Inserts a key-value pair, or overwrites the value in place if the
    /// key is already present.
    ///
    /// A full table refuses with [`Error::Capacity`] even when the key is
    /// already present; this mirrors the blocking variant, which parks
    /// writers on a full table before probing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brim_hash::HashTable;
    ///
    /// let mut table = HashTable::new(4)?;
    /// table.insert("k", 1)?;
    /// table.insert("k", 2)?;
    ///
    /// // Overwrite keeps a single occupied slot.
    /// assert_eq!(table.len(), 1);
    /// assert_eq!(table.get("k"), Some(2));
    /// # Ok::<(), brim_hash::Error>(())
    /// ```
    pub fn insert(&mut self, key: impl Into<String>, value: i64) -> Result<(), Error> {
        if self.is_full() {
            return Err(Error::Capacity);
        }
        let key = key.into();
        let capacity = self.slots.len();
        let mut idx = djb2::home_index(&key, capacity);
        // occupied < capacity and gap-free deletion guarantee an empty
        // slot on the probe path, so the scan terminates.
        loop {
            let slot = &mut self.slots[idx];
            match slot {
                None => {
                    *slot = Some(Slot { key, value });
                    self.occupied += 1;
                    return Ok(());
                }
                Some(existing) if existing.key == key => {
                    existing.value = value;
                    return Ok(());
                }
                Some(_) => idx = (idx + 1) % capacity,
            }
        }
    }

    /// Returns the value mapped to `key`, if present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brim_hash::HashTable;
    ///
    /// let mut table = HashTable::new(4)?;
    /// table.insert("k", 7)?;
    /// assert_eq!(table.get("k"), Some(7));
    /// assert_eq!(table.get("missing"), None);
    /// # Ok::<(), brim_hash::Error>(())
    /// ```
    pub fn get(&self, key: &str) -> Option<i64> {
        let idx = self.find_slot(key)?;
        self.slots[idx].as_ref().map(|slot| slot.value)
    }

    /// Removes `key` and returns its value.
    ///
    /// Fails with [`Error::KeyNotFound`] if the key is absent; the table
    /// is unchanged in that case. On success the probe cluster is
    /// compacted so that every remaining key stays reachable from its
    /// home index.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brim_hash::{Error, HashTable};
    ///
    /// let mut table = HashTable::new(4)?;
    /// table.insert("k", 7)?;
    /// assert_eq!(table.remove("k")?, 7);
    /// assert_eq!(table.remove("k"), Err(Error::KeyNotFound));
    /// # Ok::<(), brim_hash::Error>(())
    /// ```
    pub fn remove(&mut self, key: &str) -> Result<i64, Error> {
        let idx = self.find_slot(key).ok_or(Error::KeyNotFound)?;
        match self.slots[idx].take() {
            Some(slot) => {
                self.occupied -= 1;
                self.close_gap(idx);
                Ok(slot.value)
            }
            None => Err(Error::KeyNotFound),
        }
    }

    /// Copies every occupied slot's key into a freshly owned list.
    ///
    /// The result is a snapshot in ascending slot order; later mutation
    /// of the table does not affect it. Fails with [`Error::Alloc`] if
    /// the list cannot be allocated, without leaking a partial copy.
    pub fn keys(&self) -> Result<Vec<String>, Error> {
        let mut keys = Vec::new();
        keys.try_reserve_exact(self.occupied).map_err(|_| Error::Alloc)?;
        for (key, _) in self.iter() {
            keys.push(key.to_owned());
        }
        Ok(keys)
    }

    /// Returns an iterator over `(key, value)` pairs in ascending slot
    /// order.
    ///
    /// Slot order is determined by each key's home index and probe
    /// sequence, not by insertion order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brim_hash::HashTable;
    ///
    /// let mut table = HashTable::new(10)?;
    /// table.insert("hello", 1)?;
    /// table.insert("th", 3)?;
    ///
    /// let pairs: Vec<(&str, i64)> = table.iter().collect();
    /// assert_eq!(pairs, [("hello", 1), ("th", 3)]);
    /// # Ok::<(), brim_hash::Error>(())
    /// ```
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            slots: self.slots.iter(),
        }
    }

    /// Returns the occupied slot at `index` as a `(key, value)` pair.
    pub(crate) fn slot(&self, index: usize) -> Option<(&str, i64)> {
        self.slots[index]
            .as_ref()
            .map(|slot| (slot.key.as_str(), slot.value))
    }

    /// Locates the slot holding `key`.
    ///
    /// The scan may stop at the first empty slot: `close_gap` never
    /// leaves a hole inside a probe cluster. Wrapping back to the home
    /// index terminates the scan when the table has no empty slots.
    fn find_slot(&self, key: &str) -> Option<usize> {
        let capacity = self.slots.len();
        let home = djb2::home_index(key, capacity);
        let mut idx = home;
        loop {
            match &self.slots[idx] {
                None => return None,
                Some(slot) if slot.key == key => return Some(idx),
                Some(_) => {
                    idx = (idx + 1) % capacity;
                    if idx == home {
                        return None;
                    }
                }
            }
        }
    }

    /// Shifts cluster members after a cleared slot backward so the gap
    /// cannot disconnect them from their home index.
    fn close_gap(&mut self, mut hole: usize) {
        let capacity = self.slots.len();
        let mut idx = (hole + 1) % capacity;
        loop {
            let home = match &self.slots[idx] {
                Some(slot) => djb2::home_index(&slot.key, capacity),
                // First empty slot ends the cluster. At least one empty
                // slot exists (the hole itself), so the scan terminates.
                None => break,
            };
            // The entry at `idx` sits `(idx - home) % capacity` steps
            // into its probe sequence; it may move back into the hole
            // only if that sequence passes through the hole.
            if (idx + capacity - home) % capacity >= (idx + capacity - hole) % capacity {
                let moved = self.slots[idx].take();
                self.slots[hole] = moved;
                hole = idx;
            }
            idx = (idx + 1) % capacity;
        }
    }
}

impl fmt::Debug for HashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in self.iter() {
            map.entry(&key, &value);
        }
        map.finish()
    }
}

/// Formats the table as a bracketed listing of `<key, value>` pairs in
/// ascending slot order, `[]` when empty.
///
/// # Examples
///
/// ```rust
/// use brim_hash::HashTable;
///
/// let mut table = HashTable::new(10)?;
/// assert_eq!(table.to_string(), "[]");
/// table.insert("hello", 1)?;
/// assert_eq!(table.to_string(), "[ <hello, 1> ]");
/// # Ok::<(), brim_hash::Error>(())
/// ```
impl fmt::Display for HashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (key, value) in self.iter() {
            write!(f, " <{key}, {value}> ")?;
        }
        f.write_str("]")
    }
}

/// A borrowing iterator over a [`HashTable`]'s occupied slots in
/// ascending index order.
pub struct Iter<'a> {
    slots: core::slice::Iter<'a, Option<Slot>>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, i64);

    fn next(&mut self) -> Option<Self::Item> {
        self.slots
            .find_map(|slot| slot.as_ref().map(|s| (s.key.as_str(), s.value)))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;

    // DJB2 mod 8 maps "ab", "aj", "ar", and "az" to home index 0.
    const CLUSTER: [&str; 4] = ["ab", "aj", "ar", "az"];

    #[test]
    fn zero_capacity_is_rejected() {
        assert_eq!(HashTable::new(0).err(), Some(Error::Alloc));
    }

    #[test]
    fn insert_and_get() {
        let mut table = HashTable::new(8).unwrap();
        for (i, key) in ["a", "b", "c"].into_iter().enumerate() {
            table.insert(key, i as i64).unwrap();
        }
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("a"), Some(0));
        assert_eq!(table.get("b"), Some(1));
        assert_eq!(table.get("c"), Some(2));
        assert_eq!(table.get("d"), None);
    }

    #[test]
    fn overwrite_keeps_one_slot() {
        let mut table = HashTable::new(4).unwrap();
        table.insert("k", 1).unwrap();
        table.insert("k", 2).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("k"), Some(2));
        assert_eq!(table.keys().unwrap(), ["k"]);
    }

    #[test]
    fn full_table_refuses_insert() {
        let mut table = HashTable::new(2).unwrap();
        table.insert("a", 1).unwrap();
        table.insert("b", 2).unwrap();
        assert!(table.is_full());
        assert_eq!(table.insert("c", 3), Err(Error::Capacity));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn remove_round_trip() {
        let mut table = HashTable::new(4).unwrap();
        table.insert("k", 9).unwrap();
        assert_eq!(table.remove("k"), Ok(9));
        assert_eq!(table.remove("k"), Err(Error::KeyNotFound));
        assert!(table.is_empty());
    }

    #[test]
    fn remove_from_empty_table() {
        let mut table = HashTable::new(4).unwrap();
        assert_eq!(table.remove("k"), Err(Error::KeyNotFound));
    }

    #[test]
    fn colliding_keys_all_placed() {
        let mut table = HashTable::new(8).unwrap();
        for (i, key) in CLUSTER.into_iter().enumerate() {
            table.insert(key, i as i64).unwrap();
        }
        for (i, key) in CLUSTER.into_iter().enumerate() {
            assert_eq!(table.get(key), Some(i as i64), "lost {key}");
        }
    }

    #[test]
    fn deletion_does_not_orphan_cluster_members() {
        let mut table = HashTable::new(8).unwrap();
        table.insert("ab", 1).unwrap();
        table.insert("aj", 2).unwrap();
        table.insert("ar", 3).unwrap();

        // Removing the head of the cluster must leave the later members
        // reachable from their shared home index.
        assert_eq!(table.remove("ab"), Ok(1));
        assert_eq!(table.get("aj"), Some(2));
        assert_eq!(table.get("ar"), Some(3));

        // Re-inserting another colliding key keeps the whole cluster
        // locatable.
        table.insert("az", 4).unwrap();
        assert_eq!(table.get("aj"), Some(2));
        assert_eq!(table.get("ar"), Some(3));
        assert_eq!(table.get("az"), Some(4));

        // Removing a middle member, same story.
        assert_eq!(table.remove("ar"), Ok(3));
        assert_eq!(table.get("aj"), Some(2));
        assert_eq!(table.get("az"), Some(4));
        assert_eq!(table.remove("aj"), Ok(2));
        assert_eq!(table.remove("az"), Ok(4));
        assert!(table.is_empty());
    }

    #[test]
    fn remove_probes_past_earlier_cluster_members() {
        // "aa" occupies slot 7, next to the cluster at 0 across the wrap
        // boundary.
        let mut table = HashTable::new(8).unwrap();
        table.insert("aa", 10).unwrap();
        table.insert("ab", 11).unwrap();
        table.insert("aj", 12).unwrap();
        assert_eq!(table.remove("aj"), Ok(12));
        assert_eq!(table.get("aa"), Some(10));
        assert_eq!(table.get("ab"), Some(11));
    }

    #[test]
    fn gap_closing_wraps_around() {
        // "aa" and "ai" home at 7; "ai" wraps to slot 0 and pushes "ab"
        // (home 0) to slot 1.
        let mut table = HashTable::new(8).unwrap();
        table.insert("aa", 1).unwrap();
        table.insert("ai", 2).unwrap();
        table.insert("ab", 3).unwrap();

        // Removing "aa" must pull the wrapped entries back across the
        // index-0 boundary without losing either.
        assert_eq!(table.remove("aa"), Ok(1));
        assert_eq!(table.get("ai"), Some(2));
        assert_eq!(table.get("ab"), Some(3));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn missing_key_on_full_table_terminates() {
        let mut table = HashTable::new(2).unwrap();
        table.insert("a", 1).unwrap();
        table.insert("b", 2).unwrap();
        // No empty slot to stop at; the probe must wrap to its home
        // index and give up.
        assert_eq!(table.get("zzz"), None);
        assert_eq!(table.remove("zzz"), Err(Error::KeyNotFound));
    }

    #[test]
    fn scenario_capacity_ten_layout() {
        let mut table = HashTable::new(10).unwrap();
        for (key, value) in [
            ("hello", 1),
            ("there", 2),
            ("ther", 6),
            ("the", 5),
            ("theree", 4),
            ("th", 3),
        ] {
            table.insert(key, value).unwrap();
        }
        let pairs: Vec<(&str, i64)> = table.iter().collect();
        assert_eq!(
            pairs,
            [
                ("hello", 1),
                ("th", 3),
                ("the", 5),
                ("ther", 6),
                ("theree", 4),
                ("there", 2),
            ]
        );
        assert_eq!(
            table.to_string(),
            "[ <hello, 1>  <th, 3>  <the, 5>  <ther, 6>  <theree, 4>  <there, 2> ]"
        );
    }

    #[test]
    fn keys_snapshot_is_owned() {
        let mut table = HashTable::new(4).unwrap();
        table.insert("a", 1).unwrap();
        table.insert("b", 2).unwrap();
        let snapshot = table.keys().unwrap();
        table.remove("a").unwrap();
        let mut sorted = snapshot.clone();
        sorted.sort();
        assert_eq!(sorted, ["a", "b"]);
    }

    #[test]
    fn display_empty() {
        let table = HashTable::new(4).unwrap();
        assert_eq!(table.to_string(), "[]");
    }

    #[test]
    fn random_ops_mirror_std_hashmap() {
        let mut rng = SmallRng::seed_from_u64(0x00C0_FFEE);
        let mut table = HashTable::new(64).unwrap();
        let mut mirror: HashMap<String, i64> = HashMap::new();

        for _ in 0..10_000 {
            let key = format!("key{}", rng.random_range(0..96u32));
            if rng.random_bool(0.6) {
                let value = rng.random_range(-1000..1000);
                match table.insert(key.clone(), value) {
                    Ok(()) => {
                        mirror.insert(key, value);
                    }
                    Err(Error::Capacity) => assert_eq!(mirror.len(), 64),
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            } else {
                match table.remove(&key) {
                    Ok(value) => assert_eq!(mirror.remove(&key), Some(value)),
                    Err(Error::KeyNotFound) => assert!(!mirror.contains_key(&key)),
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
            assert_eq!(table.len(), mirror.len());
            assert!(table.len() <= table.capacity());
        }

        for (key, value) in &mirror {
            assert_eq!(table.get(key), Some(*value), "diverged on {key}");
        }
        let mut keys = table.keys().unwrap();
        keys.sort();
        let mut expected: Vec<&str> = mirror.keys().map(String::as_str).collect();
        expected.sort_unstable();
        assert!(keys.iter().map(String::as_str).eq(expected));
    }
}
