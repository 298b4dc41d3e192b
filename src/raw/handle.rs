use core::fmt;
use core::num::NonZero;

type RawHandle = u32;

/// A stable reference to an element stored in an [`Arena`](crate::Arena).
///
/// Handles stand in for node pointers: every child link in the tree is an
/// `Option<Handle>`, which the niche in [`NonZero`] keeps at the size of a `u32`.
/// A handle stays valid until the element is removed from its arena; after that
/// the slot (and therefore the handle value) may be reused.
#[derive(Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Handle(NonZero<RawHandle>);

impl Handle {
    /// The largest slot index a handle can address.
    pub const MAX: usize = (RawHandle::MAX - 1) as usize;

    #[inline]
    pub(crate) const fn from_index(index: usize) -> Self {
        assert!(index <= Self::MAX, "`Handle::from_index()` - `index` > `Handle::MAX`!");
        // `index + 1` cannot be zero and cannot overflow.
        #[allow(clippy::cast_possible_truncation)]
        Self(NonZero::new((index + 1) as RawHandle).unwrap())
    }

    /// Returns the zero-based arena slot this handle refers to.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        (self.0.get() - 1) as usize
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.index())
    }
}
