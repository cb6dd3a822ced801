//! A thread-safe bounded hash table with blocking capacity control.
//!
//! [`SyncHashTable`] wraps the unsynchronized [`HashTable`] in a mutex
//! and two condition variables. [`put`] parks the calling thread while
//! the table is full; [`remove`] parks while it is empty; both re-check
//! their wait condition on every wake and both are force-released by
//! [`set_shutting_down`], the only cancellation mechanism.
//!
//! Every other operation only contends for the lock and never waits on a
//! condition. There is no fairness guarantee between equally-eligible
//! waiters, but every state-changing operation signals its counterpart
//! condition variable, so a waiter is eventually woken.
//!
//! [`put`]: SyncHashTable::put
//! [`remove`]: SyncHashTable::remove
//! [`set_shutting_down`]: SyncHashTable::set_shutting_down

use core::fmt;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::error::Error;
use crate::hash_table::HashTable;

/// Why a blocked operation resumed.
///
/// There is no timeout arm: plain calls block until their condition
/// holds or shutdown is requested.
enum Wake {
    /// The wait condition is satisfied; proceed normally.
    Satisfied,
    /// Shutdown was requested while the condition still held; abort the
    /// wait.
    ShutDown,
}

/// State shared under the table lock.
///
/// The slot array, occupancy count, and shutdown flag are the only
/// shared mutable state; every access happens while holding the mutex.
struct State {
    table: HashTable,
    shutting_down: bool,
}

/// A bounded, thread-safe hash table from [`String`] keys to [`i64`]
/// values, with blocking capacity control.
///
/// Shared across threads behind an [`Arc`]; all operations take `&self`.
/// Dropping the last handle releases the lock, both condition variables,
/// and the slot array — a handle cannot outlive its table, so
/// use-after-destroy is unrepresentable. Call
/// [`set_shutting_down`](Self::set_shutting_down) first if threads may
/// still be parked in [`put`](Self::put) or [`remove`](Self::remove).
///
/// [`Arc`]: std::sync::Arc
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use std::thread;
///
/// use brim_hash::SyncHashTable;
///
/// let table = Arc::new(SyncHashTable::new(1)?);
/// table.put("only", 1)?;
///
/// // The table is full: this writer parks until the consumer below
/// // frees the slot.
/// let writer = {
///     let table = Arc::clone(&table);
///     thread::spawn(move || table.put("next", 2))
/// };
///
/// assert_eq!(table.remove("only")?, 1);
/// writer.join().unwrap()?;
/// assert_eq!(table.keys()?, ["next"]);
/// # Ok::<(), brim_hash::Error>(())
/// ```
pub struct SyncHashTable {
    state: Mutex<State>,
    space_available: Condvar,
    item_available: Condvar,
    capacity: usize,
}

impl SyncHashTable {
    /// Creates a table with exactly `capacity` slots.
    ///
    /// Fails with [`Error::Alloc`] if `capacity` is zero or the slot
    /// array cannot be allocated.
    pub fn new(capacity: usize) -> Result<Self, Error> {
        let table = HashTable::new(capacity)?;
        Ok(SyncHashTable {
            state: Mutex::new(State {
                table,
                shutting_down: false,
            }),
            space_available: Condvar::new(),
            item_available: Condvar::new(),
            capacity,
        })
    }

    /// Returns the number of slots in the table.
    ///
    /// The capacity is immutable, so this does not take the lock.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of occupied slots.
    pub fn len(&self) -> Result<usize, Error> {
        Ok(self.lock()?.table.len())
    }

    /// Returns `true` if no slot is occupied.
    pub fn is_empty(&self) -> Result<bool, Error> {
        Ok(self.lock()?.table.is_empty())
    }

    /// Inserts a key-value pair, blocking while the table is full.
    ///
    /// If the key is already present its value is overwritten in place
    /// and the occupancy count is unchanged; the overwrite still waits
    /// for a free slot first. On success, one waiter parked in
    /// [`remove`](Self::remove) is woken.
    ///
    /// Fails with [`Error::Capacity`] if shutdown is requested while the
    /// table is still full: the pair is not stored and the slots are
    /// untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brim_hash::SyncHashTable;
    ///
    /// let table = SyncHashTable::new(4)?;
    /// table.put("k", 1)?;
    /// table.put("k", 2)?;
    /// assert_eq!(table.len()?, 1);
    /// # Ok::<(), brim_hash::Error>(())
    /// ```
    pub fn put(&self, key: impl Into<String>, value: i64) -> Result<(), Error> {
        let (mut state, wake) =
            self.block_until(&self.space_available, |state| state.table.is_full())?;
        if let Wake::ShutDown = wake {
            return Err(Error::Capacity);
        }
        state.table.insert(key, value)?;
        drop(state);
        self.item_available.notify_one();
        Ok(())
    }

    /// Removes `key` and returns its value, blocking while the table is
    /// empty.
    ///
    /// Once an item may exist, the probe either finds the key or fails
    /// with [`Error::KeyNotFound`] without waiting again. On success, one
    /// waiter parked in [`put`](Self::put) is woken.
    ///
    /// A removal parked on an empty table is released by shutdown and
    /// fails with [`Error::KeyNotFound`]: no key exists in an empty
    /// table.
    pub fn remove(&self, key: &str) -> Result<i64, Error> {
        let (mut state, wake) =
            self.block_until(&self.item_available, |state| state.table.is_empty())?;
        if let Wake::ShutDown = wake {
            return Err(Error::KeyNotFound);
        }
        let value = state.table.remove(key)?;
        drop(state);
        self.space_available.notify_one();
        Ok(value)
    }

    /// Returns the value mapped to `key`, if present.
    ///
    /// Never blocks on a condition, only on lock availability.
    pub fn get(&self, key: &str) -> Result<Option<i64>, Error> {
        Ok(self.lock()?.table.get(key))
    }

    /// Copies every occupied slot's key into a freshly owned list.
    ///
    /// Snapshot semantics: the result reflects the table at the moment
    /// of the call and is unaffected by later mutation. Fails with
    /// [`Error::Alloc`] if the list cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brim_hash::SyncHashTable;
    ///
    /// let table = SyncHashTable::new(4)?;
    /// table.put("a", 1)?;
    /// let snapshot = table.keys()?;
    /// table.remove("a")?;
    /// assert_eq!(snapshot, ["a"]);
    /// # Ok::<(), brim_hash::Error>(())
    /// ```
    pub fn keys(&self) -> Result<Vec<String>, Error> {
        self.lock()?.table.keys()
    }

    /// Renders the table as a bracketed listing of `<key, value>` pairs
    /// in ascending slot order, `[]` when empty.
    pub fn render(&self) -> Result<String, Error> {
        Ok(self.lock()?.table.to_string())
    }

    /// Sets the shutdown flag and wakes every parked waiter.
    ///
    /// Waiters observe the flag and return failure instead of waiting
    /// indefinitely; this is the only mechanism for unblocking
    /// permanently-stuck threads at process shutdown. Clearing the flag
    /// again re-enables blocking for later calls.
    pub fn set_shutting_down(&self, shutting_down: bool) -> Result<(), Error> {
        let mut state = self.lock()?;
        state.shutting_down = shutting_down;
        drop(state);
        self.space_available.notify_all();
        self.item_available.notify_all();
        Ok(())
    }

    /// Creates an iterator holding the table's lock for its entire
    /// lifetime.
    ///
    /// The table is frozen while the iterator is alive: every other
    /// operation — including a second `iter` call, even from the same
    /// thread — blocks until the iterator is dropped. The scan is
    /// consistent and torn-free in exchange. Entries are yielded in
    /// ascending slot order; an exhausted iterator keeps returning
    /// `None` but still holds the lock until dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use brim_hash::SyncHashTable;
    ///
    /// let table = SyncHashTable::new(10)?;
    /// table.put("hello", 1)?;
    ///
    /// let mut iter = table.iter()?;
    /// assert_eq!(iter.next(), Some(("hello".to_string(), 1)));
    /// assert_eq!(iter.next(), None);
    /// drop(iter); // releases the table
    ///
    /// table.put("there", 2)?;
    /// # Ok::<(), brim_hash::Error>(())
    /// ```
    pub fn iter(&self) -> Result<Iter<'_>, Error> {
        Ok(Iter {
            state: self.lock()?,
            cursor: 0,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, Error> {
        self.state.lock().map_err(|_| Error::Lock)
    }

    /// Parks the calling thread while `blocked` holds and shutdown has
    /// not been requested.
    ///
    /// The lock is released for the duration of each wait and re-acquired
    /// before `blocked` is re-checked, so a stale wake never proceeds.
    fn block_until<'a>(
        &'a self,
        condvar: &Condvar,
        blocked: impl Fn(&State) -> bool,
    ) -> Result<(MutexGuard<'a, State>, Wake), Error> {
        let guard = self.lock()?;
        let guard = condvar
            .wait_while(guard, |state| blocked(state) && !state.shutting_down)
            .map_err(|_| Error::Lock)?;
        let wake = if blocked(&guard) {
            Wake::ShutDown
        } else {
            Wake::Satisfied
        };
        Ok((guard, wake))
    }
}

impl fmt::Debug for SyncHashTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_lock() {
            Ok(state) => f
                .debug_struct("SyncHashTable")
                .field("table", &state.table)
                .field("capacity", &self.capacity)
                .field("shutting_down", &state.shutting_down)
                .finish(),
            Err(_) => f
                .debug_struct("SyncHashTable")
                .field("capacity", &self.capacity)
                .field("state", &"<locked>")
                .finish(),
        }
    }
}

/// An iterator over a [`SyncHashTable`] that holds the table's lock
/// exclusively from construction until it is dropped.
///
/// Created by [`SyncHashTable::iter`]. Yields owned `(key, value)` pairs
/// in ascending slot order. Dropping the iterator releases the lock
/// exactly once, on every exit path.
pub struct Iter<'a> {
    state: MutexGuard<'a, State>,
    cursor: usize,
}

impl Iterator for Iter<'_> {
    type Item = (String, i64);

    fn next(&mut self) -> Option<Self::Item> {
        while self.cursor < self.state.table.capacity() {
            let index = self.cursor;
            self.cursor += 1;
            if let Some((key, value)) = self.state.table.slot(index) {
                return Some((key.to_owned(), value));
            }
        }
        None
    }
}
