use core::iter::FusedIterator;

use smallvec::SmallVec;

use super::arena::Arena;
use super::handle::Handle;
use super::links::{Linked, Side};
use super::stack::MAX_DEPTH;

/// Pending nodes on one end of an in-order walk. Never spills: no tree over an
/// [`Arena`] is taller than [`MAX_DEPTH`].
type Spine = SmallVec<[Handle; MAX_DEPTH]>;

/// A borrowing, double-ended in-order iterator over an [`AvlTree`](crate::AvlTree).
///
/// Created by [`AvlTree::iter`](crate::AvlTree::iter). Yields each object with
/// its handle.
pub struct Iter<'a, T> {
    arena: &'a Arena<T>,
    front: Spine,
    back: Spine,
    remaining: usize,
}

impl<'a, T: Linked> Iter<'a, T> {
    pub(crate) fn new(root: Option<Handle>, len: usize, arena: &'a Arena<T>) -> Self {
        let mut iter = Self {
            arena,
            front: Spine::new(),
            back: Spine::new(),
            remaining: len,
        };
        iter.descend(root, Side::Left);
        iter.descend(root, Side::Right);
        iter
    }

    /// Pushes `node` and its chain of children on `side` onto the spine that
    /// walks from that side.
    fn descend(&mut self, mut node: Option<Handle>, side: Side) {
        let spine = match side {
            Side::Left => &mut self.front,
            Side::Right => &mut self.back,
        };
        while let Some(handle) = node {
            spine.push(handle);
            node = self.arena[handle].links().child(side);
        }
    }

    fn step(&mut self, side: Side) -> Option<(Handle, &'a T)> {
        if self.remaining == 0 {
            return None;
        }
        let spine = match side {
            Side::Left => &mut self.front,
            Side::Right => &mut self.back,
        };
        let handle = spine.pop()?;
        let arena = self.arena;
        self.descend(arena[handle].links().child(side.opposite()), side);
        self.remaining -= 1;
        Some((handle, &arena[handle]))
    }
}

impl<'a, T: Linked> Iterator for Iter<'a, T> {
    type Item = (Handle, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        self.step(Side::Left)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T: Linked> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.step(Side::Right)
    }
}

impl<T: Linked> ExactSizeIterator for Iter<'_, T> {}

impl<T: Linked> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            arena: self.arena,
            front: self.front.clone(),
            back: self.back.clone(),
            remaining: self.remaining,
        }
    }
}
