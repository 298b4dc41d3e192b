use super::arena::Arena;
use super::handle::Handle;

/// The intrusive tree node: two child links and a balance factor.
///
/// Embed one `Links` in every object you want to index and expose it through
/// [`Linked`]. The node carries no key and no parent pointer; ordering comes from
/// the tree's comparator applied to the enclosing object, and ancestors are
/// recovered from the path stack during each mutation.
///
/// `balance` is `height(right) - height(left)` and is always in `-1..=1` for a node
/// that is linked into a tree at rest. Only the tree writes these fields; it
/// resets them when the node is inserted and again when it is removed.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Links {
    left: Option<Handle>,
    right: Option<Handle>,
    balance: i8,
}

/// Gives the tree access to the [`Links`] embedded in an object.
///
/// # Examples
///
/// ```
/// use avl_index::{Linked, Links};
///
/// struct Session {
///     links: Links,
///     id: u64,
/// }
///
/// impl Linked for Session {
///     fn links(&self) -> &Links {
///         &self.links
///     }
///
///     fn links_mut(&mut self) -> &mut Links {
///         &mut self.links
///     }
/// }
/// ```
pub trait Linked {
    /// Returns the embedded node.
    fn links(&self) -> &Links;

    /// Returns the embedded node mutably. Only the tree should write through this.
    fn links_mut(&mut self) -> &mut Links;
}

/// Which child of a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

/// A place that holds a subtree root: the tree's root, or one child link of a node.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Slot {
    Root,
    Child(Handle, Side),
}

impl Links {
    /// Creates a detached node.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            left: None,
            right: None,
            balance: 0,
        }
    }

    /// Returns the left child.
    #[inline]
    #[must_use]
    pub const fn left(&self) -> Option<Handle> {
        self.left
    }

    /// Returns the right child.
    #[inline]
    #[must_use]
    pub const fn right(&self) -> Option<Handle> {
        self.right
    }

    /// Returns `height(right) - height(left)` as last recorded by the tree.
    #[inline]
    #[must_use]
    pub const fn balance(&self) -> i8 {
        self.balance
    }

    /// Returns `true` if the node has no children.
    #[inline]
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    #[inline]
    pub(crate) const fn child(&self, side: Side) -> Option<Handle> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    #[inline]
    pub(crate) fn set_child(&mut self, side: Side, child: Option<Handle>) {
        match side {
            Side::Left => self.left = child,
            Side::Right => self.right = child,
        }
    }

    #[inline]
    pub(crate) fn set_balance(&mut self, balance: i8) {
        self.balance = balance;
    }

    /// Detaches the node: clears both children and zeroes the balance.
    #[inline]
    pub(crate) fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Side {
    /// The balance-factor contribution of one extra level of height on this side.
    #[inline]
    pub(crate) const fn sign(self) -> i8 {
        match self {
            Side::Left => -1,
            Side::Right => 1,
        }
    }

    #[inline]
    pub(crate) const fn opposite(self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// The side an extra level of height is on, given a nonzero balance.
    #[inline]
    pub(crate) const fn heavier(balance: i8) -> Self {
        if balance > 0 { Side::Right } else { Side::Left }
    }
}

impl Slot {
    /// Locates the link that holds `child`, given its parent from the path stack.
    pub(crate) fn above<T: Linked>(arena: &Arena<T>, parent: Option<Handle>, child: Handle) -> Self {
        let Some(parent) = parent else {
            return Slot::Root;
        };
        let links = arena[parent].links();
        if links.left == Some(child) {
            Slot::Child(parent, Side::Left)
        } else {
            debug_assert_eq!(links.right, Some(child), "`Slot::above()` - `parent` does not link to `child`!");
            Slot::Child(parent, Side::Right)
        }
    }
}
