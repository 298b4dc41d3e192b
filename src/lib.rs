//! An intrusive, allocation-free AVL tree for Rust.
//!
//! This crate provides [`AvlTree`], a self-balancing ordered index over objects
//! the caller owns, and [`AvlMap`], an owning map built on the same engine.
//!
//! The tree never allocates and never owns its elements. Objects live in an
//! [`Arena`] and embed a [`Links`] node; the tree only rewrites those links.
//! Mutations walk the tree with a caller-supplied [`BoundedStack`] buffer rather
//! than recursion or parent pointers, and a generation counter lets a [`Cursor`]
//! notice when the tree changed beneath it.
//!
//! # Example
//!
//! ```
//! use avl_index::{path_buffer, Arena, AvlTree, Direction, Keyed, Linked, Links};
//!
//! struct Connection {
//!     links: Links,
//!     id: u32,
//!     peer: &'static str,
//! }
//!
//! impl Linked for Connection {
//!     fn links(&self) -> &Links {
//!         &self.links
//!     }
//!
//!     fn links_mut(&mut self) -> &mut Links {
//!         &mut self.links
//!     }
//! }
//!
//! impl Keyed for Connection {
//!     type Key = u32;
//!
//!     fn key(&self) -> &u32 {
//!         &self.id
//!     }
//! }
//!
//! let mut arena = Arena::new();
//! let mut by_id = AvlTree::new();
//! let mut buf = path_buffer();
//!
//! for (id, peer) in [(7, "alpha"), (3, "beta"), (9, "gamma")] {
//!     let handle = arena.insert(Connection { links: Links::new(), id, peer });
//!     by_id.insert(&mut arena, handle, &mut buf).unwrap();
//! }
//!
//! // O(log n) lookup without a path buffer.
//! let beta = by_id.get(&arena, &3).unwrap();
//! assert_eq!(arena[beta].peer, "beta");
//!
//! // In-order walk.
//! let ids: Vec<u32> = by_id.iter(&arena).map(|(_, c)| c.id).collect();
//! assert_eq!(ids, [3, 7, 9]);
//!
//! // Unlinking hands the handle back; freeing the object is up to the caller.
//! let gone = by_id.remove(&mut arena, &7, &mut buf).unwrap();
//! assert_eq!(arena.remove(gone).unwrap().peer, "alpha");
//! assert_eq!(by_id.verify(&arena), Ok(2));
//! ```
//!
//! # Features
//!
//! - **`no_std` compatible** - Only requires `alloc`, and only for [`Arena`] and [`AvlMap`]
//! - **No hidden allocation** - Tree operations use caller-supplied scratch space only
//! - **Strict height bound** - Never taller than [`max_height`], at most [`MAX_DEPTH`] levels
//! - **`tracing`** (optional) - Emits `trace`-level events for rotations, rejected
//!   duplicates, path overflows and cursor invalidation
//!
//! # Implementation
//!
//! Each node stores a balance factor, `height(right) - height(left)`, in `-1..=1`.
//! Insertion and removal retrace the recorded path upward, adjusting balance
//! factors and performing at most one single or double rotation per level, and
//! stop as soon as a subtree's height is known to be unchanged. Removal of a node
//! with two children swaps in its in-order predecessor.

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

/// Emits a `tracing` event at trace level when the `tracing` feature is enabled.
/// Arguments are not evaluated otherwise.
macro_rules! trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!($($arg)*);
    };
}

mod compare;
mod error;
mod raw;

pub mod avl_map;

pub use avl_map::AvlMap;
pub use compare::{Comparator, KeyComparator, KeyOrder, Keyed};
pub use error::{Error, Violation};
pub use raw::{
    Arena, AvlTree, BoundedStack, Cursor, Direction, Handle, Iter, Linked, Links, MAX_DEPTH, PathBuffer, max_height,
    path_buffer,
};
