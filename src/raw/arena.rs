use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

use super::handle::Handle;

/// Caller-owned slot storage for the objects an [`AvlTree`](crate::AvlTree) indexes.
///
/// The arena is where objects live; the tree only records handles to them and
/// rewrites their embedded [`Links`](crate::Links). The tree never inserts into or
/// removes from an arena, so allocation policy stays entirely with the caller.
///
/// Removing an object that is still linked into a tree is a logic error: the tree
/// keeps the stale handle and later operations will panic or see the wrong object.
/// Remove it from the tree first.
///
/// # Examples
///
/// ```
/// use avl_index::Arena;
///
/// let mut arena = Arena::new();
/// let a = arena.insert("a");
/// let b = arena.insert("b");
/// assert_eq!(arena[a], "a");
/// assert_eq!(arena.remove(b), Some("b"));
/// assert_eq!(arena.get(b), None);
/// assert_eq!(arena.len(), 1);
/// ```
#[derive(Clone, Debug)]
pub struct Arena<T> {
    slots: Vec<Option<T>>,
    free: Vec<Handle>,
}

impl<T> Arena<T> {
    /// Creates an empty arena. Does not allocate.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Creates an empty arena with room for at least `capacity` objects.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
        }
    }

    /// Returns the number of slots the arena can hold without reallocating.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.capacity()
    }

    /// Returns the number of live objects.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.slots.len().saturating_sub(self.free.len())
    }

    /// Returns `true` if the arena holds no objects.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stores `element` and returns its handle. Freed slots are reused first.
    ///
    /// # Panics
    ///
    /// Panics if every slot a [`Handle`] can address is in use.
    pub fn insert(&mut self, element: T) -> Handle {
        if let Some(h) = self.free.pop() {
            // Reuse a free slot/handle.
            self.slots[h.index()] = Some(element);
            h
        } else {
            // The new slot index must still be addressable by a handle.
            assert!(
                self.slots.len() <= Handle::MAX,
                "`Arena::insert()` - arena is at maximum capacity ({})",
                Handle::MAX + 1
            );
            self.slots.push(Some(element));
            Handle::from_index(self.slots.len() - 1)
        }
    }

    /// Returns a reference to the object behind `handle`, if it is live.
    #[inline]
    #[must_use]
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.index()).and_then(Option::as_ref)
    }

    /// Returns a mutable reference to the object behind `handle`, if it is live.
    ///
    /// Mutating the part of an indexed object that its comparator reads is a
    /// logic error.
    #[inline]
    #[must_use]
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slots.get_mut(handle.index()).and_then(Option::as_mut)
    }

    /// Returns `true` if `handle` refers to a live object.
    #[must_use]
    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Removes and returns the object behind `handle`, freeing its slot.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let element = self.slots.get_mut(handle.index())?.take()?;
        self.free.push(handle);
        Some(element)
    }

    /// Drops every object and invalidates every handle.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<Handle> for Arena<T> {
    type Output = T;

    #[inline]
    fn index(&self, handle: Handle) -> &T {
        self.get(handle).expect("`Arena::index()` - `handle` is invalid!")
    }
}

impl<T> IndexMut<Handle> for Arena<T> {
    #[inline]
    fn index_mut(&mut self, handle: Handle) -> &mut T {
        self.get_mut(handle).expect("`Arena::index_mut()` - `handle` is invalid!")
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn arena_capacity() {
        let arena: Arena<u32> = Arena::with_capacity(10);
        assert_eq!(arena.capacity(), 10);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        let _b = arena.insert(2);
        assert_eq!(arena.remove(a), Some(1));
        assert_eq!(arena.remove(a), None);
        let c = arena.insert(3);
        assert_eq!(c, a);
        assert_eq!(arena[c], 3);
    }

    #[test]
    #[should_panic(expected = "`Arena::index()` - `handle` is invalid!")]
    fn index_of_freed_handle_panics() {
        let mut arena = Arena::new();
        let a = arena.insert(1);
        arena.remove(a);
        let _ = arena[a];
    }

    proptest! {
        #[test]
        fn arena_behaves_like_vec(operations in prop::collection::vec(strategy(), 0..256)) {
            let mut model: Vec<(Handle, u32)> = Vec::new();
            let mut arena: Arena<u32> = Arena::new();

            for operation in operations {
                match operation {
                    Operation::Insert(value) => {
                        let handle = arena.insert(value);
                        model.push((handle, value));
                    }
                    Operation::Get(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        prop_assert_eq!(arena.get(handle), Some(&model[index].1));
                    }
                    Operation::GetMut(which, value) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        arena[handle] = value;
                        model[index].1 = value;
                    }
                    Operation::Remove(which) => {
                        if model.is_empty() {
                            continue;
                        }

                        let index = which % model.len();
                        let handle = model[index].0;
                        let value1 = arena.remove(handle);
                        let (_, value2) = model.swap_remove(index);
                        prop_assert_eq!(value1, Some(value2));
                        prop_assert!(!arena.contains(handle));
                    }
                    Operation::Clear => {
                        arena.clear();
                        model.clear();
                    }
                }

                prop_assert_eq!(arena.len(), model.len());
                prop_assert_eq!(arena.is_empty(), model.is_empty());

                for &(handle, value) in &model {
                    prop_assert_eq!(arena[handle], value);
                }
            }
        }
    }

    #[derive(Clone, Debug)]
    enum Operation {
        Insert(u32),
        Get(usize),
        GetMut(usize, u32),
        Remove(usize),
        Clear,
    }

    fn strategy() -> impl Strategy<Value = Operation> {
        prop_oneof![
            20 => any::<u32>().prop_map(Operation::Insert),
            5 => any::<usize>().prop_map(Operation::Get),
            5 => (any::<usize>(), any::<u32>()).prop_map(|(which, value)| Operation::GetMut(which, value)),
            10 => any::<usize>().prop_map(Operation::Remove),
            1 => Just(Operation::Clear),
        ]
    }
}
