use core::cmp::Ordering;
use core::fmt;
use core::marker::PhantomData;

use crate::compare::{Comparator, KeyComparator, KeyOrder};
use crate::error::Error;

use super::arena::Arena;
use super::cursor::{Cursor, Direction};
use super::handle::Handle;
use super::iter::Iter;
use super::links::{Linked, Side, Slot};
use super::stack::BoundedStack;

/// An intrusive AVL tree over objects stored in an [`Arena`].
///
/// The tree owns nothing but a root handle, an element count, a generation
/// counter and its comparator. Objects live in the caller's arena and carry their
/// own [`Links`](crate::Links); linking and unlinking only rewrites those links.
/// No operation allocates. Mutations record their path in a caller-supplied
/// buffer (see [`path_buffer`](crate::path_buffer)) and fail with
/// [`Error::StackOverflow`] before touching anything if it is too small.
///
/// Every successful mutation bumps the [generation](Self::generation), which is
/// how a [`Cursor`] detects that the tree changed underneath it.
///
/// # Examples
///
/// ```
/// use avl_index::{path_buffer, Arena, AvlTree, Keyed, Linked, Links};
///
/// struct Timer {
///     links: Links,
///     deadline: u64,
/// }
///
/// impl Linked for Timer {
///     fn links(&self) -> &Links {
///         &self.links
///     }
///
///     fn links_mut(&mut self) -> &mut Links {
///         &mut self.links
///     }
/// }
///
/// impl Keyed for Timer {
///     type Key = u64;
///
///     fn key(&self) -> &u64 {
///         &self.deadline
///     }
/// }
///
/// let mut arena = Arena::new();
/// let mut timers = AvlTree::new();
/// let mut buf = path_buffer();
///
/// for deadline in [30, 10, 20] {
///     let handle = arena.insert(Timer { links: Links::new(), deadline });
///     timers.insert(&mut arena, handle, &mut buf).unwrap();
/// }
///
/// let next = timers.pop_first(&mut arena, &mut buf).unwrap();
/// assert_eq!(arena[next].deadline, 10);
/// assert_eq!(timers.len(), 2);
/// ```
pub struct AvlTree<T, C = KeyOrder> {
    root: Option<Handle>,
    len: usize,
    generation: u64,
    cmp: C,
    marker: PhantomData<fn(&T) -> Ordering>,
}

impl<T> AvlTree<T, KeyOrder> {
    /// Creates an empty tree ordered by the objects' [`Keyed`](crate::Keyed) keys.
    #[must_use]
    pub const fn new() -> Self {
        Self::with_comparator(KeyOrder)
    }
}

impl<T, C> AvlTree<T, C> {
    /// Creates an empty tree ordered by `cmp`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::{AvlTree, Links};
    ///
    /// struct Job {
    ///     links: Links,
    ///     priority: u8,
    /// }
    ///
    /// let by_priority = |a: &Job, b: &Job| b.priority.cmp(&a.priority);
    /// let tree: AvlTree<Job, _> = AvlTree::with_comparator(by_priority);
    /// assert!(tree.is_empty());
    /// ```
    #[must_use]
    pub const fn with_comparator(cmp: C) -> Self {
        Self {
            root: None,
            len: 0,
            generation: 0,
            cmp,
            marker: PhantomData,
        }
    }

    /// Returns the number of linked objects.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no objects are linked.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the root object's handle.
    #[must_use]
    pub const fn root(&self) -> Option<Handle> {
        self.root
    }

    /// Returns the mutation counter. It changes on every successful insert,
    /// removal or clear and never on a failed one.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the comparator.
    #[must_use]
    pub const fn comparator(&self) -> &C {
        &self.cmp
    }

    /// Unlinks every object at once, in O(1).
    ///
    /// The objects' links are left stale; they are reset when an object is next
    /// inserted.
    pub fn clear(&mut self) {
        self.root = None;
        self.len = 0;
        self.bump();
    }

    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<T: Linked, C> AvlTree<T, C> {
    /// Returns the height of the tree: 0 when empty, 1 for a single object.
    ///
    /// Runs in O(log n) by following the taller child at each level.
    #[must_use]
    pub fn height(&self, arena: &Arena<T>) -> usize {
        let mut height = 0;
        let mut current = self.root;
        while let Some(node) = current {
            height += 1;
            let links = arena[node].links();
            current = if links.balance() > 0 { links.right() } else { links.left() };
        }
        height
    }

    /// Returns the least object.
    #[must_use]
    pub fn first(&self, arena: &Arena<T>) -> Option<Handle> {
        self.edge(arena, Side::Left)
    }

    /// Returns the greatest object.
    #[must_use]
    pub fn last(&self, arena: &Arena<T>) -> Option<Handle> {
        self.edge(arena, Side::Right)
    }

    fn edge(&self, arena: &Arena<T>, side: Side) -> Option<Handle> {
        let mut current = self.root?;
        while let Some(child) = arena[current].links().child(side) {
            current = child;
        }
        Some(current)
    }

    /// Returns the handle of the object matching `key`. Needs no path buffer.
    pub fn get<Q>(&self, arena: &Arena<T>, key: &Q) -> Option<Handle>
    where
        Q: ?Sized,
        C: KeyComparator<Q, T>,
    {
        let mut current = self.root;
        while let Some(node) = current {
            let links = *arena[node].links();
            current = match self.cmp.compare_key(key, &arena[node]) {
                Ordering::Less => links.left(),
                Ordering::Greater => links.right(),
                Ordering::Equal => return Some(node),
            };
        }
        None
    }

    /// Returns `true` if an object matches `key`.
    pub fn contains<Q>(&self, arena: &Arena<T>, key: &Q) -> bool
    where
        Q: ?Sized,
        C: KeyComparator<Q, T>,
    {
        self.get(arena, key).is_some()
    }

    /// Links the object behind `handle` into the tree.
    ///
    /// The object's existing links are overwritten. It must not already be linked
    /// into another tree that shares its [`Links`](crate::Links) field.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateKey`] with the handle of the linked object that compares
    ///   equal. Inserting an object that is already linked reports its own handle.
    /// - [`Error::StackOverflow`] if `buf` is shorter than the tree's height.
    ///
    /// The tree is unchanged on error.
    ///
    /// # Panics
    ///
    /// Panics if `handle` is not live in `arena`.
    pub fn insert(&mut self, arena: &mut Arena<T>, handle: Handle, buf: &mut [Option<Handle>]) -> Result<(), Error>
    where
        C: Comparator<T>,
    {
        let Some(mut parent) = self.root else {
            arena[handle].links_mut().reset();
            self.root = Some(handle);
            self.len += 1;
            self.bump();
            return Ok(());
        };

        let mut path = BoundedStack::new(buf);
        let side = loop {
            path.push(parent)?;
            let side = match self.cmp.compare(&arena[handle], &arena[parent]) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => {
                    trace!(existing = ?parent, "insert rejected duplicate");
                    return Err(Error::DuplicateKey(parent));
                }
            };
            match arena[parent].links().child(side) {
                Some(child) => parent = child,
                None => break side,
            }
        };

        arena[handle].links_mut().reset();
        arena[parent].links_mut().set_child(side, Some(handle));
        self.len += 1;
        self.bump();
        self.retrace_insert(arena, &mut path, side);
        Ok(())
    }

    /// Unlinks and returns the object matching `key`. Its links are reset.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if no object matches.
    /// - [`Error::StackOverflow`] if `buf` is shorter than the tree's height.
    ///
    /// The tree is unchanged on error.
    pub fn remove<Q>(&mut self, arena: &mut Arena<T>, key: &Q, buf: &mut [Option<Handle>]) -> Result<Handle, Error>
    where
        Q: ?Sized,
        C: KeyComparator<Q, T>,
    {
        let mut path = BoundedStack::new(buf);
        let mut current = self.root;
        while let Some(node) = current {
            path.push(node)?;
            let links = *arena[node].links();
            current = match self.cmp.compare_key(key, &arena[node]) {
                Ordering::Less => links.left(),
                Ordering::Greater => links.right(),
                Ordering::Equal => {
                    self.unlink(arena, &mut path)?;
                    return Ok(node);
                }
            };
        }
        trace!("remove found no match");
        Err(Error::NotFound)
    }

    /// Unlinks the object behind `handle`, locating it with the object-to-object
    /// comparator. Its links are reset.
    ///
    /// # Errors
    ///
    /// - [`Error::NotFound`] if `handle` is not live or is not linked into this tree.
    /// - [`Error::StackOverflow`] if `buf` is shorter than the tree's height.
    ///
    /// The tree is unchanged on error.
    pub fn remove_handle(&mut self, arena: &mut Arena<T>, handle: Handle, buf: &mut [Option<Handle>]) -> Result<(), Error>
    where
        C: Comparator<T>,
    {
        if !arena.contains(handle) {
            return Err(Error::NotFound);
        }

        let mut path = BoundedStack::new(buf);
        let mut current = self.root;
        while let Some(node) = current {
            path.push(node)?;
            let links = *arena[node].links();
            current = match self.cmp.compare(&arena[handle], &arena[node]) {
                Ordering::Less => links.left(),
                Ordering::Greater => links.right(),
                // Keys are unique, so an equal object that is not `handle` means
                // `handle` is not linked here.
                Ordering::Equal if node != handle => break,
                Ordering::Equal => return self.unlink(arena, &mut path),
            };
        }
        Err(Error::NotFound)
    }

    /// Unlinks and returns the least object.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the tree is empty, [`Error::StackOverflow`] if `buf`
    /// is too short. The tree is unchanged on error.
    pub fn pop_first(&mut self, arena: &mut Arena<T>, buf: &mut [Option<Handle>]) -> Result<Handle, Error> {
        self.pop_edge(arena, buf, Side::Left)
    }

    /// Unlinks and returns the greatest object.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if the tree is empty, [`Error::StackOverflow`] if `buf`
    /// is too short. The tree is unchanged on error.
    pub fn pop_last(&mut self, arena: &mut Arena<T>, buf: &mut [Option<Handle>]) -> Result<Handle, Error> {
        self.pop_edge(arena, buf, Side::Right)
    }

    fn pop_edge(&mut self, arena: &mut Arena<T>, buf: &mut [Option<Handle>], side: Side) -> Result<Handle, Error> {
        let mut path = BoundedStack::new(buf);
        let mut current = self.root;
        while let Some(node) = current {
            path.push(node)?;
            current = arena[node].links().child(side);
        }
        let target = path.peek().ok_or(Error::NotFound)?;
        self.unlink(arena, &mut path)?;
        Ok(target)
    }

    /// Creates a cursor positioned before the first object in `direction`.
    ///
    /// The cursor keeps its path in `buf` and does not borrow the tree, so the
    /// tree may be mutated while it exists; the cursor then reports
    /// [`Error::Invalidated`].
    ///
    /// # Errors
    ///
    /// [`Error::StackOverflow`] if `buf` is shorter than the tree's height. A
    /// cursor that is created never overflows later.
    pub fn cursor<'s>(&self, arena: &Arena<T>, direction: Direction, buf: &'s mut [Option<Handle>]) -> Result<Cursor<'s>, Error> {
        let capacity = buf.len();
        if capacity < self.height(arena) {
            trace!(capacity, "cursor buffer is shorter than the tree");
            return Err(Error::StackOverflow { capacity });
        }
        Cursor::new(self.root, self.generation, arena, direction, buf)
    }

    /// Returns a double-ended iterator over the linked objects in order.
    ///
    /// The iterator keeps its own inline path and needs no buffer.
    pub fn iter<'a>(&'a self, arena: &'a Arena<T>) -> Iter<'a, T> {
        Iter::new(self.root, self.len, arena)
    }

    /// Unlinks the object on top of `path`, which must hold the full path from the root.
    ///
    /// Every push happens before the first write, so an overflow leaves the tree intact.
    fn unlink(&mut self, arena: &mut Arena<T>, path: &mut BoundedStack<'_>) -> Result<(), Error> {
        let target_index = path.len() - 1;
        let target = path.peek().expect("`AvlTree::unlink()` - `path` is empty!");
        let links = *arena[target].links();
        let parent = target_index.checked_sub(1).and_then(|index| path.get(index));
        let target_slot = Slot::above(arena, parent, target);

        let shrunk = match links.left() {
            None => {
                path.pop();
                self.slot_set(arena, target_slot, links.right());
                target_slot
            }
            Some(left) => {
                // The replacement is the in-order predecessor: the rightmost node of
                // the left subtree.
                path.push(left)?;
                let mut predecessor = left;
                while let Some(right) = arena[predecessor].links().right() {
                    path.push(right)?;
                    predecessor = right;
                }
                path.pop();

                let shrunk = if predecessor == left {
                    Slot::Child(predecessor, Side::Left)
                } else {
                    let above = path.peek().expect("`AvlTree::unlink()` - predecessor has no parent!");
                    let orphan = arena[predecessor].links().left();
                    arena[above].links_mut().set_child(Side::Right, orphan);
                    arena[predecessor].links_mut().set_child(Side::Left, Some(left));
                    Slot::Child(above, Side::Right)
                };

                let moved = arena[predecessor].links_mut();
                moved.set_child(Side::Right, links.right());
                moved.set_balance(links.balance());
                self.slot_set(arena, target_slot, Some(predecessor));
                path.replace(target_index, predecessor);
                shrunk
            }
        };

        arena[target].links_mut().reset();
        self.len -= 1;
        self.bump();
        self.retrace_remove(arena, path, shrunk);
        Ok(())
    }

    /// Walks back up `path` after the subtree on `side` of its top node grew by one.
    fn retrace_insert(&mut self, arena: &mut Arena<T>, path: &mut BoundedStack<'_>, mut side: Side) {
        while let Some(node) = path.pop() {
            let balance = arena[node].links().balance() + side.sign();
            arena[node].links_mut().set_balance(balance);
            let slot = Slot::above(arena, path.peek(), node);
            match balance {
                0 => return,
                -1 | 1 => {}
                _ => {
                    self.rebalance(arena, slot, node);
                    return;
                }
            }
            match slot {
                Slot::Root => return,
                Slot::Child(_, parent_side) => side = parent_side,
            }
        }
    }

    /// Walks back up `path` after the subtree held by `shrunk` lost one level.
    fn retrace_remove(&mut self, arena: &mut Arena<T>, path: &mut BoundedStack<'_>, shrunk: Slot) {
        let Slot::Child(_, mut side) = shrunk else {
            return;
        };
        while let Some(node) = path.pop() {
            let balance = arena[node].links().balance() - side.sign();
            arena[node].links_mut().set_balance(balance);
            let slot = Slot::above(arena, path.peek(), node);
            match balance {
                -1 | 1 => return,
                0 => {}
                _ => {
                    if !self.rebalance(arena, slot, node) {
                        return;
                    }
                }
            }
            match slot {
                Slot::Root => return,
                Slot::Child(_, parent_side) => side = parent_side,
            }
        }
    }

    /// Restores balance at `pivot`, whose balance factor is ±2, and fixes the
    /// balance factors of every node that moved.
    ///
    /// Returns `true` if the subtree in `slot` ended up one level shorter than
    /// before the rotation.
    fn rebalance(&mut self, arena: &mut Arena<T>, slot: Slot, pivot: Handle) -> bool {
        let pivot_balance = arena[pivot].links().balance();
        debug_assert_eq!(pivot_balance.abs(), 2, "`AvlTree::rebalance()` - `pivot` is not out of balance!");
        let heavy_side = Side::heavier(pivot_balance);
        let sign = heavy_side.sign();
        let heavy = arena[pivot]
            .links()
            .child(heavy_side)
            .expect("`AvlTree::rebalance()` - heavy side is empty!");
        let heavy_balance = arena[heavy].links().balance();

        if heavy_balance == -sign {
            // The inner grandchild rises two levels.
            let inner = arena[heavy]
                .links()
                .child(heavy_side.opposite())
                .expect("`AvlTree::rebalance()` - inner grandchild is missing!");
            let inner_balance = arena[inner].links().balance();
            let (pivot_after, heavy_after) = match inner_balance {
                b if b == sign => (-sign, 0),
                b if b == -sign => (0, sign),
                _ => (0, 0),
            };
            self.rotate(arena, Slot::Child(pivot, heavy_side), heavy, heavy_side);
            self.rotate(arena, slot, pivot, heavy_side.opposite());
            arena[pivot].links_mut().set_balance(pivot_after);
            arena[heavy].links_mut().set_balance(heavy_after);
            arena[inner].links_mut().set_balance(0);
            true
        } else {
            self.rotate(arena, slot, pivot, heavy_side.opposite());
            if heavy_balance == 0 {
                // Only reachable on removal; the subtree keeps its height.
                arena[pivot].links_mut().set_balance(sign);
                arena[heavy].links_mut().set_balance(-sign);
                false
            } else {
                arena[pivot].links_mut().set_balance(0);
                arena[heavy].links_mut().set_balance(0);
                true
            }
        }
    }

    /// Rotates `pivot`, held in `slot`, down towards `down`. Its child on the other
    /// side rises into `slot` and is returned. [`Side::Left`] is a left rotation.
    ///
    /// Balance factors are left to the caller.
    fn rotate(&mut self, arena: &mut Arena<T>, slot: Slot, pivot: Handle, down: Side) -> Handle {
        let up = down.opposite();
        let riser = arena[pivot]
            .links()
            .child(up)
            .expect("`AvlTree::rotate()` - `pivot` has no child to rotate up!");
        let crossing = arena[riser].links().child(down);
        arena[pivot].links_mut().set_child(up, crossing);
        arena[riser].links_mut().set_child(down, Some(pivot));
        self.slot_set(arena, slot, Some(riser));
        trace!(?pivot, ?riser, ?down, "rotated");
        riser
    }

    fn slot_set(&mut self, arena: &mut Arena<T>, slot: Slot, child: Option<Handle>) {
        match slot {
            Slot::Root => self.root = child,
            Slot::Child(parent, side) => arena[parent].links_mut().set_child(side, child),
        }
    }
}

impl<T> Default for AvlTree<T, KeyOrder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, C: Clone> Clone for AvlTree<T, C> {
    /// Clones the bookkeeping only. The clone is meaningful together with a clone
    /// of the arena it indexes.
    fn clone(&self) -> Self {
        Self {
            root: self.root,
            len: self.len,
            generation: self.generation,
            cmp: self.cmp.clone(),
            marker: PhantomData,
        }
    }
}

impl<T, C: fmt::Debug> fmt::Debug for AvlTree<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvlTree")
            .field("root", &self.root)
            .field("len", &self.len)
            .field("generation", &self.generation)
            .field("cmp", &self.cmp)
            .finish()
    }
}
