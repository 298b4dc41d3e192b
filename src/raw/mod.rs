mod arena;
mod avl_tree;
mod cursor;
mod handle;
mod iter;
mod links;
mod stack;
mod verify;

pub use arena::Arena;
pub use avl_tree::AvlTree;
pub use cursor::{Cursor, Direction};
pub use handle::Handle;
pub use iter::Iter;
pub use links::{Linked, Links};
pub use stack::{BoundedStack, MAX_DEPTH, PathBuffer, max_height, path_buffer};
