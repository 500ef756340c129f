// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The sparse set backing every component storage.

use std::ops::{Index, IndexMut};

/// Marks a sparse entry that has no dense slot.
const ABSENT: u32 = u32::MAX;

/// An associative container from small integer keys to values, with O(1)
/// insert, remove, lookup and membership tests.
///
/// Values live packed in a `dense` array. A parallel `indices` array records
/// which key owns each dense slot, and the `sparse` array maps a key back to its
/// dense slot (or [`ABSENT`]).
///
/// Removal swaps the last dense element into the hole, so iteration order is
/// **not** stable across removals.
#[derive(Debug, Clone)]
pub struct SparseSet<T> {
    sparse: Vec<u32>,
    dense: Vec<T>,
    indices: Vec<u32>,
}

/// The storage used for every component type.
pub type ComponentStorage<T> = SparseSet<T>;

impl<T> Default for SparseSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseSet<T> {
    /// Creates an empty set.
    pub const fn new() -> Self {
        Self {
            sparse: Vec::new(),
            dense: Vec::new(),
            indices: Vec::new(),
        }
    }

    /// Creates an empty set with room for `capacity` values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sparse: Vec::with_capacity(capacity),
            dense: Vec::with_capacity(capacity),
            indices: Vec::with_capacity(capacity),
        }
    }

    /// The number of stored values.
    pub fn len(&self) -> usize {
        self.dense.len()
    }

    /// Whether the set holds no value.
    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    #[inline]
    fn slot(&self, index: u32) -> Option<usize> {
        match self.sparse.get(index as usize) {
            Some(&slot) if slot != ABSENT => Some(slot as usize),
            _ => None,
        }
    }

    /// Whether `index` has a value.
    #[inline]
    pub fn contains(&self, index: u32) -> bool {
        self.slot(index).is_some()
    }

    /// Stores `value` under `index`, returning the value it replaces, if any.
    ///
    /// The sparse array grows as needed; `Vec`'s amortized growth keeps inserts
    /// O(1) amortized.
    ///
    /// # Panics
    ///
    /// Panics if `index` is `u32::MAX`, which is reserved as the absent marker.
    pub fn insert(&mut self, index: u32, value: T) -> Option<T> {
        assert!(index != ABSENT, "index {ABSENT} is reserved");

        if let Some(slot) = self.slot(index) {
            return Some(std::mem::replace(&mut self.dense[slot], value));
        }

        let position = index as usize;
        if position >= self.sparse.len() {
            self.sparse.resize(position + 1, ABSENT);
        }
        self.sparse[position] = self.dense.len() as u32;
        self.dense.push(value);
        self.indices.push(index);
        None
    }

    /// Removes the value stored under `index`. Absent indices are a no-op.
    pub fn remove(&mut self, index: u32) -> Option<T> {
        let slot = self.slot(index)?;

        let value = self.dense.swap_remove(slot);
        self.indices.swap_remove(slot);
        if let Some(&moved) = self.indices.get(slot) {
            self.sparse[moved as usize] = slot as u32;
        }
        self.sparse[index as usize] = ABSENT;
        Some(value)
    }

    /// The value stored under `index`, if any.
    #[inline]
    pub fn get(&self, index: u32) -> Option<&T> {
        self.slot(index).map(|slot| &self.dense[slot])
    }

    /// The value stored under `index`, mutably, if any.
    #[inline]
    pub fn get_mut(&mut self, index: u32) -> Option<&mut T> {
        self.slot(index).map(move |slot| &mut self.dense[slot])
    }

    /// Removes every value, keeping the allocations.
    pub fn clear(&mut self) {
        self.sparse.clear();
        self.dense.clear();
        self.indices.clear();
    }

    /// The keys, in dense order.
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// The values, in dense order.
    pub fn values(&self) -> &[T] {
        &self.dense
    }

    /// The values, mutably, in dense order.
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.dense
    }

    /// Iterates over `(key, value)` pairs in dense order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &T)> {
        self.indices.iter().copied().zip(self.dense.iter())
    }

    /// Iterates over `(key, value)` pairs in dense order, with mutable values.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u32, &mut T)> {
        self.indices.iter().copied().zip(self.dense.iter_mut())
    }

    /// Borrows the set's buffers as raw pointers for view iteration.
    pub(crate) fn raw_parts(&mut self) -> RawSparseSet<T> {
        RawSparseSet {
            sparse: self.sparse.as_ptr(),
            sparse_len: self.sparse.len(),
            dense: self.dense.as_mut_ptr(),
            indices: self.indices.as_ptr(),
            len: self.dense.len(),
        }
    }
}

/// Unchecked access: the fast path for callers that already know `index` is present.
///
/// # Panics
///
/// Panics if `index` has no value. Use [`SparseSet::get`] when presence is not
/// guaranteed.
impl<T> Index<u32> for SparseSet<T> {
    type Output = T;

    fn index(&self, index: u32) -> &T {
        match self.slot(index) {
            Some(slot) => &self.dense[slot],
            None => panic!("sparse set has no value for index {index}"),
        }
    }
}

impl<T> IndexMut<u32> for SparseSet<T> {
    fn index_mut(&mut self, index: u32) -> &mut T {
        match self.slot(index) {
            Some(slot) => &mut self.dense[slot],
            None => panic!("sparse set has no value for index {index}"),
        }
    }
}

/// A pointer snapshot of a [`SparseSet`], used by views to hand out references
/// into several storages at once.
///
/// The snapshot is only valid while the set it came from is neither moved nor
/// structurally modified.
#[doc(hidden)]
pub struct RawSparseSet<T> {
    sparse: *const u32,
    sparse_len: usize,
    dense: *mut T,
    indices: *const u32,
    len: usize,
}

impl<T> Clone for RawSparseSet<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RawSparseSet<T> {}

impl<T> RawSparseSet<T> {
    /// The keys, in dense order.
    ///
    /// # Safety
    /// The source set must outlive `'a` and stay structurally unchanged.
    pub unsafe fn indices<'a>(&self) -> &'a [u32] {
        std::slice::from_raw_parts(self.indices, self.len)
    }

    /// # Safety
    /// The source set must outlive `'a` and stay structurally unchanged.
    #[inline]
    unsafe fn slot(&self, index: u32) -> Option<usize> {
        if (index as usize) >= self.sparse_len {
            return None;
        }
        let slot = *self.sparse.add(index as usize);
        (slot != ABSENT).then_some(slot as usize)
    }

    /// A shared reference to the value under `index`.
    ///
    /// # Safety
    /// The source set must outlive `'a` and stay structurally unchanged, and no
    /// mutable reference to the same value may exist during `'a`.
    #[inline]
    pub unsafe fn get<'a>(&self, index: u32) -> Option<&'a T> {
        self.slot(index).map(|slot| &*self.dense.add(slot))
    }

    /// A mutable reference to the value under `index`.
    ///
    /// # Safety
    /// The source set must outlive `'a` and stay structurally unchanged, and no
    /// other reference to the same value may exist during `'a`.
    #[inline]
    pub unsafe fn get_mut<'a>(&self, index: u32) -> Option<&'a mut T> {
        self.slot(index).map(|slot| &mut *self.dense.add(slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_contains_get() {
        let mut set = SparseSet::new();
        assert_eq!(set.insert(3, "three"), None);
        assert_eq!(set.insert(10, "ten"), None);

        assert!(set.contains(3));
        assert!(set.contains(10));
        assert!(!set.contains(4));
        assert!(!set.contains(1_000), "Indices past the sparse array are absent");
        assert_eq!(set.get(10), Some(&"ten"));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_insert_overwrites_existing_value() {
        let mut set = SparseSet::new();
        set.insert(2, 1);

        let previous = set.insert(2, 5);

        assert_eq!(previous, Some(1));
        assert_eq!(set[2], 5);
        assert_eq!(set.len(), 1, "Overwriting must not add a dense slot");
    }

    #[test]
    fn test_swap_remove_keeps_other_entries_intact() {
        // --- 1. SETUP ---
        let mut set = SparseSet::new();
        for index in [0u32, 4, 7, 9] {
            set.insert(index, index * 100);
        }

        // --- 2. ACTION ---
        // Removing the first dense slot moves the last one (9) into it.
        let removed = set.remove(0);

        // --- 3. ASSERTIONS ---
        assert_eq!(removed, Some(0));
        assert!(!set.contains(0));
        for index in [4u32, 7, 9] {
            assert_eq!(set.get(index), Some(&(index * 100)), "Entry {index} changed");
        }
        assert_eq!(set.indices(), &[9, 4, 7]);
    }

    #[test]
    fn test_remove_last_and_absent() {
        let mut set = SparseSet::new();
        set.insert(1, 'a');
        set.insert(2, 'b');

        assert_eq!(set.remove(2), Some('b'));
        assert_eq!(set.remove(2), None, "Second removal is a no-op");
        assert_eq!(set.remove(50), None);
        assert_eq!(set.get(1), Some(&'a'));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_reinsert_after_remove() {
        let mut set = SparseSet::new();
        set.insert(5, 1.0);
        set.remove(5);
        set.insert(5, 2.0);

        assert_eq!(set.get(5), Some(&2.0));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_mixed_sequence_matches_reference_map() {
        use std::collections::HashMap;

        let mut set = SparseSet::new();
        let mut reference = HashMap::new();
        // A fixed pseudo-random walk over 64 keys.
        let mut state = 0x2545_f491_u32;
        for step in 0..2_000u32 {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let key = state % 64;
            if state % 3 == 0 {
                assert_eq!(set.remove(key), reference.remove(&key));
            } else {
                assert_eq!(set.insert(key, step), reference.insert(key, step));
            }

            assert_eq!(set.len(), reference.len());
            for key in 0..64 {
                assert_eq!(set.get(key), reference.get(&key), "Mismatch for key {key}");
            }
        }
    }

    #[test]
    fn test_iter_pairs_keys_with_values() {
        let mut set = SparseSet::new();
        set.insert(8, "x");
        set.insert(2, "y");

        let pairs: Vec<_> = set.iter().collect();
        assert_eq!(pairs, vec![(8, &"x"), (2, &"y")]);

        for (_, value) in set.iter_mut() {
            *value = "z";
        }
        assert_eq!(set.values(), &["z", "z"]);
    }

    #[test]
    #[should_panic(expected = "no value for index 3")]
    fn test_index_on_absent_key_violates_precondition() {
        let set: SparseSet<i32> = SparseSet::new();
        let _ = set[3];
    }
}
