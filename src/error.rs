use core::fmt;

use crate::Handle;

/// The error type for tree operations.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Error {
    /// An element comparing equal to the one being inserted is already linked.
    /// Carries the handle of that element; the tree is unchanged.
    DuplicateKey(Handle),
    /// No element matches the key.
    NotFound,
    /// The path buffer is too small for the tree's current height.
    /// The tree is unchanged.
    StackOverflow {
        /// Length of the buffer that was supplied.
        capacity: usize,
    },
    /// The tree was mutated after the cursor was created.
    Invalidated,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::DuplicateKey(existing) => write!(f, "an equal element is already linked at {existing:?}"),
            Error::NotFound => f.write_str("no element matches the key"),
            Error::StackOverflow { capacity } => {
                write!(f, "path buffer of {capacity} entries is too small for the tree height")
            }
            Error::Invalidated => f.write_str("cursor invalidated by a tree mutation"),
        }
    }
}

impl core::error::Error for Error {}

/// A broken structural invariant, as reported by [`AvlTree::verify`](crate::AvlTree::verify).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Violation {
    /// `node` is not strictly between the bounds inherited from its ancestors.
    OutOfOrder {
        /// The misplaced element.
        node: Handle,
    },
    /// The subtrees of `node` differ in height by more than one.
    Unbalanced {
        /// The unbalanced element.
        node: Handle,
        /// Height of the left subtree.
        left: usize,
        /// Height of the right subtree.
        right: usize,
    },
    /// The balance factor stored in `node` disagrees with its subtree heights.
    BalanceMismatch {
        /// The element with the stale balance factor.
        node: Handle,
        /// The recorded balance factor.
        stored: i8,
        /// `height(right) - height(left)`.
        actual: isize,
    },
    /// The number of reachable elements is not the tree's recorded length.
    /// A count above `len` also catches link cycles.
    LenMismatch {
        /// The recorded length.
        len: usize,
        /// Elements reached before stopping.
        counted: usize,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::OutOfOrder { node } => write!(f, "{node:?} is out of order"),
            Violation::Unbalanced { node, left, right } => {
                write!(f, "{node:?} is unbalanced (left height {left}, right height {right})")
            }
            Violation::BalanceMismatch { node, stored, actual } => {
                write!(f, "{node:?} records balance {stored} but is {actual}")
            }
            Violation::LenMismatch { len, counted } => {
                write!(f, "tree records {len} elements but {counted} are reachable")
            }
        }
    }
}

impl core::error::Error for Violation {}
