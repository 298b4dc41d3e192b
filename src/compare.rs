//! Ordering strategies for indexed objects.
//!
//! A tree never looks inside the objects it links. Every ordering decision goes
//! through its comparator, which must be a strict total order that stays fixed
//! for as long as an object is linked.

use core::borrow::Borrow;
use core::cmp::Ordering;

/// Orders two linked objects.
///
/// Used when inserting and when removing by handle.
pub trait Comparator<T: ?Sized> {
    /// Compares `a` with `b`.
    fn compare(&self, a: &T, b: &T) -> Ordering;
}

/// Orders a search key against a linked object.
///
/// Used by lookups and removal by key. For any object `x`, `compare_key` with a
/// key extracted from `x` must agree with [`Comparator::compare`] against `x`.
pub trait KeyComparator<Q: ?Sized, T: ?Sized>: Comparator<T> {
    /// Compares `key` with the key of `elem`.
    fn compare_key(&self, key: &Q, elem: &T) -> Ordering;
}

/// An object that carries its own ordering key.
pub trait Keyed {
    /// The key type.
    type Key: Ord + ?Sized;

    /// Returns the key.
    fn key(&self) -> &Self::Key;
}

/// Orders [`Keyed`] objects by their key's [`Ord`] implementation.
///
/// This is the default comparator of [`AvlTree`](crate::AvlTree). Lookups accept
/// any `Q` the key can be borrowed as, the same way `BTreeMap::get` does.
///
/// # Examples
///
/// ```
/// use avl_index::{Comparator, KeyComparator, KeyOrder, Keyed};
/// use core::cmp::Ordering;
///
/// struct User {
///     name: String,
/// }
///
/// impl Keyed for User {
///     type Key = String;
///
///     fn key(&self) -> &String {
///         &self.name
///     }
/// }
///
/// let ann = User { name: "ann".into() };
/// let bob = User { name: "bob".into() };
/// assert_eq!(KeyOrder.compare(&ann, &bob), Ordering::Less);
/// assert_eq!(KeyOrder.compare_key("bob", &bob), Ordering::Equal);
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct KeyOrder;

impl<T: Keyed + ?Sized> Comparator<T> for KeyOrder {
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        a.key().cmp(b.key())
    }
}

impl<Q, T> KeyComparator<Q, T> for KeyOrder
where
    Q: Ord + ?Sized,
    T: Keyed + ?Sized,
    T::Key: Borrow<Q>,
{
    #[inline]
    fn compare_key(&self, key: &Q, elem: &T) -> Ordering {
        key.cmp(elem.key().borrow())
    }
}

/// Any `Fn(&T, &T) -> Ordering` closure orders objects directly.
///
/// Closures cannot serve as a [`KeyComparator`]; look such trees up with a search
/// object of type `T` instead.
impl<T: ?Sized, F> Comparator<T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &T, b: &T) -> Ordering {
        self(a, b)
    }
}

impl<T: ?Sized, F> KeyComparator<T, T> for F
where
    F: Fn(&T, &T) -> Ordering,
{
    #[inline]
    fn compare_key(&self, key: &T, elem: &T) -> Ordering {
        self(key, elem)
    }
}
