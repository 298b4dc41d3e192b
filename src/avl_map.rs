use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;
use core::hash::{Hash, Hasher};
use core::iter::FusedIterator;
use core::mem;
use core::ops::Index;

use smallvec::SmallVec;

use crate::compare::Keyed;
use crate::error::Error;
use crate::raw::{self, Arena, AvlTree, Direction, Handle, Linked, Links, path_buffer};

mod capacity;

/// One key-value pair together with its tree links.
#[derive(Clone)]
struct Node<K, V> {
    links: Links,
    key: K,
    value: V,
}

impl<K, V> Linked for Node<K, V> {
    fn links(&self) -> &Links {
        &self.links
    }

    fn links_mut(&mut self) -> &mut Links {
        &mut self.links
    }
}

impl<K: Ord, V> Keyed for Node<K, V> {
    type Key = K;

    fn key(&self) -> &K {
        &self.key
    }
}

/// Unwraps an engine result from a call made with a full [`path_buffer`], which
/// cannot overflow. A miss becomes `None`.
fn found<T>(result: Result<T, Error>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(Error::NotFound) => None,
        Err(error) => panic!("`AvlMap` - unexpected tree error: {error}"),
    }
}

/// An ordered map based on an [AVL tree].
///
/// `AvlMap` owns its entries: each `insert` places a node in an internal
/// [`Arena`] and links it into an [`AvlTree`], and each removal unlinks it and
/// hands the pair back. It is the non-intrusive face of the same engine, for
/// callers that do not want to embed [`Links`] in their own types.
///
/// Lookups take O(log n) comparisons, and the tree is never taller than
/// [`max_height(len)`](crate::max_height). Iterators yield entries in key order.
///
/// It is a logic error for a key to be modified in such a way that the key's
/// ordering relative to any other key, as determined by the [`Ord`] trait,
/// changes while it is in the map.
///
/// [AVL tree]: https://en.wikipedia.org/wiki/AVL_tree
///
/// # Examples
///
/// ```
/// use avl_index::AvlMap;
///
/// let mut ports = AvlMap::new();
/// ports.insert(443, "https");
/// ports.insert(22, "ssh");
/// ports.insert(80, "http");
///
/// assert_eq!(ports.get(&22), Some(&"ssh"));
/// assert_eq!(ports.insert(80, "www"), Some("http"));
/// assert_eq!(ports.first_key_value(), Some((&22, &"ssh")));
///
/// let names: Vec<_> = ports.values().copied().collect();
/// assert_eq!(names, ["ssh", "www", "https"]);
/// ```
pub struct AvlMap<K, V> {
    arena: Arena<Node<K, V>>,
    tree: AvlTree<Node<K, V>>,
}

impl<K, V> AvlMap<K, V> {
    /// Makes a new, empty `AvlMap`. Does not allocate anything on its own.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, "a");
    /// ```
    #[must_use]
    pub const fn new() -> AvlMap<K, V> {
        AvlMap {
            arena: Arena::new(),
            tree: AvlTree::new(),
        }
    }

    /// Returns the number of elements in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut a = AvlMap::new();
    /// assert_eq!(a.len(), 0);
    /// a.insert(1, "a");
    /// assert_eq!(a.len(), 1);
    /// ```
    #[must_use]
    pub const fn len(&self) -> usize {
        self.tree.len()
    }

    /// Returns `true` if the map contains no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Returns the height of the underlying tree.
    ///
    /// This is an extension and is not part of the standard `BTreeMap` API.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::{max_height, AvlMap};
    ///
    /// let map: AvlMap<u32, ()> = (0..1000).map(|k| (k, ())).collect();
    /// assert!(map.height() <= max_height(map.len()));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    #[must_use]
    pub fn height(&self) -> usize {
        self.tree.height(&self.arena)
    }

    /// Clears the map, removing all elements.
    pub fn clear(&mut self) {
        self.tree.clear();
        self.arena.clear();
    }

    /// Returns the first key-value pair in the map. The key in this pair is the
    /// minimum key in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// assert_eq!(map.first_key_value(), None);
    /// map.insert(1, "b");
    /// map.insert(2, "a");
    /// assert_eq!(map.first_key_value(), Some((&1, &"b")));
    /// ```
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.tree.first(&self.arena).map(|handle| self.pair(handle))
    }

    /// Returns the last key-value pair in the map. The key in this pair is the
    /// maximum key in the map.
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.tree.last(&self.arena).map(|handle| self.pair(handle))
    }

    /// Removes and returns the first element in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, "a");
    /// map.insert(2, "b");
    /// while let Some((key, _val)) = map.pop_first() {
    ///     assert!(map.iter().all(|(k, _v)| *k > key));
    /// }
    /// assert!(map.is_empty());
    /// ```
    pub fn pop_first(&mut self) -> Option<(K, V)> {
        let mut buf = path_buffer();
        let handle = found(self.tree.pop_first(&mut self.arena, &mut buf))?;
        Some(self.take(handle))
    }

    /// Removes and returns the last element in the map.
    pub fn pop_last(&mut self) -> Option<(K, V)> {
        let mut buf = path_buffer();
        let handle = found(self.tree.pop_last(&mut self.arena, &mut buf))?;
        Some(self.take(handle))
    }

    /// Gets an iterator over the entries of the map, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let map = AvlMap::from([(3, "c"), (2, "b"), (1, "a")]);
    /// let mut iter = map.iter();
    /// assert_eq!(iter.next(), Some((&1, &"a")));
    /// assert_eq!(iter.next_back(), Some((&3, &"c")));
    /// assert_eq!(iter.len(), 1);
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.tree.iter(&self.arena),
        }
    }

    /// Gets an iterator over the keys of the map, in sorted order.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Gets an iterator over the values of the map, in order by key.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    fn pair(&self, handle: Handle) -> (&K, &V) {
        let node = &self.arena[handle];
        (&node.key, &node.value)
    }

    /// Frees the slot of an entry that has just been unlinked.
    fn take(&mut self, handle: Handle) -> (K, V) {
        let node = self
            .arena
            .remove(handle)
            .expect("`AvlMap::take()` - unlinked entry is missing!");
        (node.key, node.value)
    }
}

impl<K: Ord, V> AvlMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the ordering
    /// on the borrowed form *must* match the ordering on the key type.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(String::from("one"), 1);
    /// assert_eq!(map.get("one"), Some(&1));
    /// assert_eq!(map.get("two"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(&self.arena, key).map(|handle| &self.arena[handle].value)
    }

    /// Returns the key-value pair corresponding to the supplied key.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.get(&self.arena, key).map(|handle| self.pair(handle))
    }

    /// Returns a mutable reference to the value corresponding to the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, "a");
    /// if let Some(x) = map.get_mut(&1) {
    ///     *x = "b";
    /// }
    /// assert_eq!(map[&1], "b");
    /// ```
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let handle = self.tree.get(&self.arena, key)?;
        Some(&mut self.arena[handle].value)
    }

    /// Returns `true` if the map contains a value for the specified key.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.tree.contains(&self.arena, key)
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map did not have this key present, `None` is returned.
    ///
    /// If the map did have this key present, the value is updated, and the old
    /// value is returned. The key is not updated.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// assert_eq!(map.insert(37, "a"), None);
    /// assert_eq!(map.is_empty(), false);
    ///
    /// map.insert(37, "b");
    /// assert_eq!(map.insert(37, "c"), Some("b"));
    /// assert_eq!(map[&37], "c");
    /// ```
    ///
    /// # Complexity
    ///
    /// O(log n)
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        let handle = self.arena.insert(Node {
            links: Links::new(),
            key,
            value,
        });
        let mut buf = path_buffer();
        match self.tree.insert(&mut self.arena, handle, &mut buf) {
            Ok(()) => None,
            Err(Error::DuplicateKey(existing)) => {
                let (_, value) = self.take(handle);
                Some(mem::replace(&mut self.arena[existing].value, value))
            }
            Err(error) => panic!("`AvlMap::insert()` - unexpected tree error: {error}"),
        }
    }

    /// Removes a key from the map, returning the value at the key if the key was
    /// previously in the map.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut map = AvlMap::new();
    /// map.insert(1, "a");
    /// assert_eq!(map.remove(&1), Some("a"));
    /// assert_eq!(map.remove(&1), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes a key from the map, returning the stored key and value if the key
    /// was previously in the map.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut buf = path_buffer();
        let handle = found(self.tree.remove(&mut self.arena, key, &mut buf))?;
        Some(self.take(handle))
    }

    /// Retains only the elements specified by the predicate.
    ///
    /// In other words, remove all pairs `(k, v)` for which `f(&k, &mut v)` returns
    /// `false`. The elements are visited in ascending key order.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut map: AvlMap<i32, i32> = (0..8).map(|x| (x, x * 10)).collect();
    /// // Keep only the elements with even-numbered keys.
    /// map.retain(|&k, _| k % 2 == 0);
    /// assert!(map.into_iter().eq(vec![(0, 0), (2, 20), (4, 40), (6, 60)]));
    /// ```
    ///
    /// # Complexity
    ///
    /// O(n + m log n), where m is the number of removed elements.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &mut V) -> bool,
    {
        let mut doomed: SmallVec<[Handle; 16]> = SmallVec::new();
        let mut cursor_buf = path_buffer();
        // The cursor borrows neither the tree nor the arena between steps, so
        // values can be handed out mutably during the walk.
        if let Some(mut cursor) = found(self.tree.cursor(&self.arena, Direction::Forward, &mut cursor_buf)) {
            while let Some(Some(handle)) = found(cursor.next(&self.tree, &self.arena)) {
                let node = &mut self.arena[handle];
                if !f(&node.key, &mut node.value) {
                    doomed.push(handle);
                }
            }
        }

        let mut buf = path_buffer();
        for handle in doomed {
            found(self.tree.remove_handle(&mut self.arena, handle, &mut buf))
                .expect("`AvlMap::retain()` - visited entry is not linked!");
            self.take(handle);
        }
    }

    /// Moves all elements from `other` into `self`, leaving `other` empty.
    ///
    /// If a key from `other` is already present in `self`, the respective value
    /// from `self` will be overwritten with the respective value from `other`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let mut a = AvlMap::from([(1, "a"), (3, "c")]);
    /// let mut b = AvlMap::from([(3, "d"), (4, "e")]);
    /// a.append(&mut b);
    /// assert_eq!(a.len(), 3);
    /// assert!(b.is_empty());
    /// assert_eq!(a[&3], "d");
    /// ```
    pub fn append(&mut self, other: &mut Self) {
        let other = mem::take(other);
        self.extend(other);
    }
}

impl<K: Clone, V: Clone> Clone for AvlMap<K, V> {
    /// Handles are slot indices, so the cloned tree is valid over the cloned arena.
    fn clone(&self) -> Self {
        AvlMap {
            arena: self.arena.clone(),
            tree: self.tree.clone(),
        }
    }
}

impl<K: Hash, V: Hash> Hash for AvlMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for (k, v) in self {
            k.hash(state);
            v.hash(state);
        }
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for AvlMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<K: Eq, V: Eq> Eq for AvlMap<K, V> {}

impl<K: PartialOrd, V: PartialOrd> PartialOrd for AvlMap<K, V> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.iter().partial_cmp(other.iter())
    }
}

impl<K: Ord, V: Ord> Ord for AvlMap<K, V> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.iter().cmp(other.iter())
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for AvlMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V> Default for AvlMap<K, V> {
    fn default() -> Self {
        AvlMap::new()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = AvlMap::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlMap<K, V> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K: Ord + Copy, V: Copy> Extend<(&'a K, &'a V)> for AvlMap<K, V> {
    fn extend<T: IntoIterator<Item = (&'a K, &'a V)>>(&mut self, iter: T) {
        for (&k, &v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a, K, V> IntoIterator for &'a AvlMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<K, V> IntoIterator for AvlMap<K, V> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    /// Gets an owning iterator over the entries of the map, sorted by key.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl_index::AvlMap;
    ///
    /// let map = AvlMap::from([(2, "b"), (1, "a")]);
    /// let mut iter = map.into_iter();
    /// assert_eq!(iter.next(), Some((1, "a")));
    /// assert_eq!(iter.next_back(), Some((2, "b")));
    /// ```
    fn into_iter(self) -> IntoIter<K, V> {
        IntoIter { map: self }
    }
}

impl<K, Q, V> Index<&Q> for AvlMap<K, V>
where
    K: Borrow<Q> + Ord,
    Q: ?Sized + Ord,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present in the map.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AvlMap<K, V> {
    fn from(arr: [(K, V); N]) -> Self {
        arr.into_iter().collect()
    }
}

/// An iterator over the entries of an `AvlMap`.
///
/// This `struct` is created by the [`iter`](AvlMap::iter) method on [`AvlMap`].
pub struct Iter<'a, K, V> {
    inner: raw::Iter<'a, Node<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, node)| (&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, node)| (&node.key, &node.value))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the keys of an `AvlMap`.
///
/// This `struct` is created by the [`keys`](AvlMap::keys) method on [`AvlMap`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for Keys<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

impl<K: fmt::Debug, V> fmt::Debug for Keys<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An iterator over the values of an `AvlMap`.
///
/// This `struct` is created by the [`values`](AvlMap::values) method on [`AvlMap`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn last(mut self) -> Option<Self::Item> {
        self.next_back()
    }
}

impl<K, V> DoubleEndedIterator for Values<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {
    fn len(&self) -> usize {
        self.inner.len()
    }
}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

impl<K, V: fmt::Debug> fmt::Debug for Values<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// An owning iterator over the entries of an `AvlMap`, sorted by key.
///
/// This `struct` is created by the [`into_iter`](IntoIterator::into_iter) method
/// on [`AvlMap`]. Each step unlinks one entry in O(log n).
pub struct IntoIter<K, V> {
    map: AvlMap<K, V>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<(K, V)> {
        self.map.pop_first()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.map.len(), Some(self.map.len()))
    }
}

impl<K, V> DoubleEndedIterator for IntoIter<K, V> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.map.pop_last()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for IntoIter<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.map.iter()).finish()
    }
}

impl<K, V> Default for IntoIter<K, V> {
    /// Creates an empty `avl_map::IntoIter`.
    ///
    /// ```
    /// # use avl_index::avl_map;
    /// let iter: avl_map::IntoIter<u8, u8> = Default::default();
    /// assert_eq!(iter.len(), 0);
    /// ```
    fn default() -> Self {
        IntoIter { map: AvlMap::new() }
    }
}
