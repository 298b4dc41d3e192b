use crate::error::Error;

use super::arena::Arena;
use super::avl_tree::AvlTree;
use super::handle::Handle;
use super::links::{Linked, Side};
use super::stack::BoundedStack;

/// Traversal order of a [`Cursor`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Ascending.
    Forward,
    /// Descending.
    Backward,
}

impl Direction {
    /// The side the next visited object hangs from.
    const fn leading(self) -> Side {
        match self {
            Direction::Forward => Side::Left,
            Direction::Backward => Side::Right,
        }
    }
}

/// An in-order walk that tolerates, and detects, concurrent mutation.
///
/// A cursor keeps the pending path in a caller buffer and remembers the tree's
/// root and [generation](AvlTree::generation) at creation. It borrows neither the
/// tree nor the arena between steps, so the tree can be changed while a walk is in
/// progress; the next step then fails with [`Error::Invalidated`] instead of
/// following stale links.
///
/// The buffer is checked against the tree's height up front, so a cursor that
/// was created successfully never runs out of room.
///
/// # Examples
///
/// ```
/// use avl_index::{path_buffer, Arena, AvlTree, Direction, Error, Keyed, Linked, Links};
///
/// struct Item {
///     links: Links,
///     key: u32,
/// }
///
/// impl Linked for Item {
///     fn links(&self) -> &Links {
///         &self.links
///     }
///
///     fn links_mut(&mut self) -> &mut Links {
///         &mut self.links
///     }
/// }
///
/// impl Keyed for Item {
///     type Key = u32;
///
///     fn key(&self) -> &u32 {
///         &self.key
///     }
/// }
///
/// let mut arena = Arena::new();
/// let mut tree = AvlTree::new();
/// let mut buf = path_buffer();
/// for key in [2, 1, 3] {
///     let handle = arena.insert(Item { links: Links::new(), key });
///     tree.insert(&mut arena, handle, &mut buf).unwrap();
/// }
///
/// let mut cursor_buf = path_buffer();
/// let mut cursor = tree.cursor(&arena, Direction::Backward, &mut cursor_buf).unwrap();
/// let top = cursor.next(&tree, &arena).unwrap().unwrap();
/// assert_eq!(arena[top].key, 3);
///
/// tree.remove(&mut arena, &1, &mut buf).unwrap();
/// assert_eq!(cursor.next(&tree, &arena), Err(Error::Invalidated));
/// ```
#[derive(Debug)]
pub struct Cursor<'s> {
    path: BoundedStack<'s>,
    root: Option<Handle>,
    generation: u64,
    direction: Direction,
}

impl<'s> Cursor<'s> {
    /// The caller guarantees `buf` is at least as long as the tree is tall.
    pub(crate) fn new<T: Linked>(
        root: Option<Handle>,
        generation: u64,
        arena: &Arena<T>,
        direction: Direction,
        buf: &'s mut [Option<Handle>],
    ) -> Result<Self, Error> {
        let mut cursor = Self {
            path: BoundedStack::new(buf),
            root,
            generation,
            direction,
        };
        cursor.descend(arena, root)?;
        Ok(cursor)
    }

    /// Returns the traversal order.
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }

    /// Returns the generation of the tree this cursor was created from.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Advances to the next object and returns its handle, or `Ok(None)` once the
    /// walk is complete.
    ///
    /// `tree` and `arena` must be the ones the cursor was created from. Handing in
    /// a tree with a different root is caught like a mutation.
    ///
    /// # Errors
    ///
    /// [`Error::Invalidated`] if `tree` has been mutated since the cursor was
    /// created. The cursor stays invalid.
    ///
    /// # Panics
    ///
    /// May panic if `tree` or `arena` is not the pair the cursor was created from.
    pub fn next<T: Linked, C>(&mut self, tree: &AvlTree<T, C>, arena: &Arena<T>) -> Result<Option<Handle>, Error> {
        if tree.generation() != self.generation || tree.root() != self.root {
            trace!(
                created = self.generation,
                current = tree.generation(),
                "cursor invalidated"
            );
            return Err(Error::Invalidated);
        }

        let Some(node) = self.path.pop() else {
            return Ok(None);
        };
        let trailing = arena[node].links().child(self.direction.leading().opposite());
        // The path never holds more than the height, which `AvlTree::cursor()` checked.
        self.descend(arena, trailing)
            .expect("`Cursor::next()` - path outgrew a buffer checked against the height!");
        Ok(Some(node))
    }

    /// Pushes `node` and its chain of leading children.
    fn descend<T: Linked>(&mut self, arena: &Arena<T>, mut node: Option<Handle>) -> Result<(), Error> {
        let side = self.direction.leading();
        while let Some(handle) = node {
            self.path.push(handle)?;
            node = arena[handle].links().child(side);
        }
        Ok(())
    }
}
