use crate::error::Error;

use super::handle::Handle;

/// Path buffer capacity that is enough for every tree an [`Arena`](crate::Arena)
/// can hold.
///
/// An AVL tree over `n` elements is never taller than [`max_height(n)`](max_height),
/// and `max_height(Handle::MAX + 1)` is 45.
pub const MAX_DEPTH: usize = 45;

/// A caller-owned scratch buffer that can hold the deepest possible path.
pub type PathBuffer = [Option<Handle>; MAX_DEPTH];

/// Returns an empty [`PathBuffer`].
///
/// # Examples
///
/// ```
/// use avl_index::{path_buffer, MAX_DEPTH};
///
/// let mut buf = path_buffer();
/// assert_eq!(buf.len(), MAX_DEPTH);
/// ```
#[must_use]
pub const fn path_buffer() -> PathBuffer {
    [None; MAX_DEPTH]
}

/// Returns the greatest height an AVL tree holding `len` elements can reach.
///
/// This is the exact bound, not the `1.44 * log2(len)` approximation: the sparsest
/// AVL tree of height `h` has `N(h) = N(h - 1) + N(h - 2) + 1` nodes, and the result
/// is the largest `h` with `N(h) <= len`. A path buffer of this many entries is
/// always enough to operate on a tree of `len` elements.
///
/// # Examples
///
/// ```
/// use avl_index::max_height;
///
/// assert_eq!(max_height(0), 0);
/// assert_eq!(max_height(1), 1);
/// assert_eq!(max_height(7), 4);
/// assert_eq!(max_height(1_000_000), 28);
/// ```
#[must_use]
pub const fn max_height(len: usize) -> usize {
    // Loop invariant: `smaller == N(height)` and `larger == N(height + 1)`.
    let mut smaller: usize = 0;
    let mut larger: usize = 1;
    let mut height = 0;
    while larger <= len {
        let Some(next) = larger.checked_add(smaller + 1) else {
            return height + 1;
        };
        smaller = larger;
        larger = next;
        height += 1;
    }
    height
}

/// A stack of node handles backed by caller-supplied memory.
///
/// The tree records the path from the root to the node it is working on here
/// instead of recursing or keeping parent pointers. The stack never grows: a push
/// past the end of the buffer fails with [`Error::StackOverflow`].
#[derive(Debug)]
pub struct BoundedStack<'a> {
    buf: &'a mut [Option<Handle>],
    len: usize,
}

impl<'a> BoundedStack<'a> {
    /// Wraps `buf` as an empty stack. Existing buffer contents are ignored.
    #[must_use]
    pub fn new(buf: &'a mut [Option<Handle>]) -> Self {
        Self { buf, len: 0 }
    }

    /// Returns the number of handles the buffer can hold.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Returns the number of handles on the stack.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the stack is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Pushes `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StackOverflow`] if the buffer is full. The stack is unchanged.
    pub fn push(&mut self, handle: Handle) -> Result<(), Error> {
        let capacity = self.buf.len();
        let Some(slot) = self.buf.get_mut(self.len) else {
            trace!(capacity, "path stack overflow");
            return Err(Error::StackOverflow { capacity });
        };
        *slot = Some(handle);
        self.len += 1;
        Ok(())
    }

    /// Pops the top handle.
    pub fn pop(&mut self) -> Option<Handle> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        self.buf[self.len].take()
    }

    /// Returns the top handle without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<Handle> {
        self.len.checked_sub(1).and_then(|top| self.buf[top])
    }

    /// Empties the stack.
    pub fn clear(&mut self) {
        self.buf[..self.len].fill(None);
        self.len = 0;
    }

    /// Returns the handle at depth `index` from the bottom, if it is on the stack.
    pub(crate) fn get(&self, index: usize) -> Option<Handle> {
        if index < self.len { self.buf[index] } else { None }
    }

    /// Overwrites the entry at depth `index`.
    pub(crate) fn replace(&mut self, index: usize, handle: Handle) {
        assert!(index < self.len, "`BoundedStack::replace()` - `index` is not on the stack!");
        self.buf[index] = Some(handle);
    }
}
