//! ChainSet: bucket array of singly linked chains over a node arena.

use crate::capacity::{Capacity, ReserveError};
use crate::cursor::{Cursor, IntoIter, Iter};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

/// Link to the next node of a chain, or to a chain head from a bucket.
pub(crate) type Link = Option<DefaultKey>;

#[derive(Clone, Debug)]
pub(crate) struct Node<K> {
    pub(crate) key: K,
    pub(crate) hash: u64,
    pub(crate) next: Link,
}

/// A set of unique keys stored in separately chained buckets.
///
/// `N` is the minimum bucket count; the table starts at `N` buckets and
/// doubles whenever an insertion would push the load factor to 0.7 or
/// above. Erasing never shrinks the table.
///
/// A zero minimum is rejected when the set is first used:
///
/// ```compile_fail
/// use chain_set::ChainSet;
/// use std::collections::hash_map::RandomState;
///
/// let s: ChainSet<u32, RandomState, 0> = ChainSet::new();
/// ```
pub struct ChainSet<K, S = RandomState, const N: usize = 12> {
    hasher: S,
    capacity: Capacity,
    buckets: Box<[Link]>,
    nodes: SlotMap<DefaultKey, Node<K>>,
}

impl<K, S, const N: usize> ChainSet<K, S, N> {
    const MIN_CAPACITY: Capacity = Capacity::minimum(N);

    /// Creates an empty set with `N` buckets that hashes with `hasher`.
    pub fn with_hasher(hasher: S) -> Self {
        let capacity = Self::MIN_CAPACITY;
        Self {
            hasher,
            capacity,
            buckets: capacity.empty_buckets(None),
            nodes: SlotMap::with_key(),
        }
    }

    /// Creates an empty set already grown to hold `target` keys.
    pub fn with_capacity_and_hasher(target: usize, hasher: S) -> Self {
        let mut s = Self::with_hasher(hasher);
        s.reserve(target);
        s
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current number of buckets.
    pub fn capacity(&self) -> usize {
        self.capacity.get()
    }

    /// Ratio of stored keys to buckets; always below [`MAX_LOAD_FACTOR`](crate::MAX_LOAD_FACTOR).
    pub fn load_factor(&self) -> f64 {
        self.len() as f64 / self.capacity() as f64
    }

    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Cursor at the first key in bucket order, or at the end when empty.
    pub fn begin(&self) -> Cursor<'_, K> {
        Cursor::begin(&self.buckets, &self.nodes)
    }

    pub fn end(&self) -> Cursor<'_, K> {
        Cursor::end(&self.buckets, &self.nodes)
    }

    pub fn iter(&self) -> Iter<'_, K> {
        Iter::new(self.begin(), self.len())
    }

    /// Drops every key and returns to an empty table of `N` buckets.
    pub fn clear(&mut self) {
        let capacity = Self::MIN_CAPACITY;
        let old = core::mem::replace(&mut self.nodes, SlotMap::with_key());
        self.buckets = capacity.empty_buckets(None);
        self.capacity = capacity;
        // The set is already empty and consistent when key destructors run.
        drop(old);
    }

    /// Exchanges the contents of two sets without copying any key.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    /// Diagnostic rendering of the bucket table; see [`Dump`].
    pub fn dump(&self) -> Dump<'_, K> {
        Dump {
            buckets: &self.buckets,
            nodes: &self.nodes,
        }
    }

    fn cursor_at(&self, bucket: usize, node: DefaultKey) -> Cursor<'_, K> {
        Cursor::at(&self.buckets, &self.nodes, bucket, node)
    }

    // Moves every node into a fresh table of `capacity` buckets using the
    // stored hashes. No user code runs here.
    fn relink(&mut self, capacity: Capacity) {
        let mut buckets = capacity.empty_buckets(None);
        for &head in self.buckets.iter() {
            let mut cur = head;
            while let Some(k) = cur {
                let node = &mut self.nodes[k];
                cur = node.next;
                let b = capacity.bucket_of(node.hash);
                node.next = buckets[b];
                buckets[b] = Some(k);
            }
        }
        self.buckets = buckets;
        self.capacity = capacity;
    }

    /// Rebuilds the table with at least `requested` buckets.
    ///
    /// The bucket count used is the largest of `N`, `requested`, and the
    /// smallest count that keeps the current keys under the load bound, so
    /// a small request can never break the load invariant.
    ///
    /// # Panics
    ///
    /// Panics if the required bucket count overflows `usize`.
    pub fn rehash(&mut self, requested: usize) {
        match Capacity::for_rehash(Self::MIN_CAPACITY, requested, self.len()) {
            Ok(capacity) => self.relink(capacity),
            Err(e) => panic!("{e}"),
        }
    }

    /// Grows the table, by doubling, until `target` keys fit under the load
    /// bound. Does nothing if they already fit.
    pub fn try_reserve(&mut self, target: usize) -> Result<(), ReserveError> {
        if let Some(grown) = self.capacity.grown_for(target)? {
            let capacity = Capacity::for_rehash(Self::MIN_CAPACITY, grown.get(), self.len())?;
            self.relink(capacity);
        }
        Ok(())
    }

    /// Infallible form of [`try_reserve`](Self::try_reserve).
    ///
    /// # Panics
    ///
    /// Panics if the required bucket count overflows `usize`.
    pub fn reserve(&mut self, target: usize) {
        if let Err(e) = self.try_reserve(target) {
            panic!("{e}");
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        assert_eq!(self.buckets.len(), self.capacity());
        assert!(self.capacity() >= N);
        assert!(self.capacity.holds(self.len()), "load bound violated");
        let mut reachable = 0;
        for (b, &head) in self.buckets.iter().enumerate() {
            let mut cur = head;
            while let Some(k) = cur {
                let node = &self.nodes[k];
                assert_eq!(self.capacity.bucket_of(node.hash), b, "node in wrong bucket");
                reachable += 1;
                cur = node.next;
            }
        }
        assert_eq!(reachable, self.len(), "unreachable or shared nodes");
    }
}

impl<K, const N: usize> ChainSet<K, RandomState, N> {
    pub fn new() -> Self {
        Self::with_hasher(RandomState::new())
    }

    /// Creates an empty set already grown to hold `target` keys.
    pub fn with_capacity(target: usize) -> Self {
        Self::with_capacity_and_hasher(target, RandomState::new())
    }
}

impl<K, S, const N: usize> ChainSet<K, S, N>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    // Bucket and node of the key equal to `q`, if any.
    fn locate<Q>(&self, hash: u64, q: &Q) -> Option<(usize, DefaultKey)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let bucket = self.capacity.bucket_of(hash);
        let mut cur = self.buckets[bucket];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if node.hash == hash && node.key.borrow() == q {
                return Some((bucket, k));
            }
            cur = node.next;
        }
        None
    }

    /// Returns 1 if a key equal to `q` is stored, else 0.
    pub fn count<Q>(&self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.contains(q))
    }

    pub fn contains<Q>(&self, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.locate(self.make_hash(q), q).is_some()
    }

    /// The stored key equal to `q`.
    pub fn get<Q>(&self, q: &Q) -> Option<&K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, k) = self.locate(self.make_hash(q), q)?;
        Some(&self.nodes[k].key)
    }

    /// Cursor at the key equal to `q`, or the end cursor if absent.
    pub fn find<Q>(&self, q: &Q) -> Cursor<'_, K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        match self.locate(self.make_hash(q), q) {
            Some((bucket, k)) => self.cursor_at(bucket, k),
            None => self.end(),
        }
    }

    /// Inserts `key` unless an equal key is already stored.
    ///
    /// Returns a cursor at the stored key and whether `key` was inserted. The
    /// table grows for the post-insert length before the new node is linked,
    /// so its bucket is computed against the grown table. A rejected `key` is
    /// dropped and the existing key is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the required bucket count overflows `usize`.
    pub fn insert(&mut self, key: K) -> (Cursor<'_, K>, bool) {
        let hash = self.make_hash(&key);
        if let Some((bucket, k)) = self.locate(hash, &key) {
            return (self.cursor_at(bucket, k), false);
        }
        self.reserve(self.len() + 1);
        let bucket = self.capacity.bucket_of(hash);
        let next = self.buckets[bucket];
        let k = self.nodes.insert(Node { key, hash, next });
        self.buckets[bucket] = Some(k);
        debug_assert!(self.capacity.holds(self.len()));
        (self.cursor_at(bucket, k), true)
    }

    /// Inserts every key not yet present; the first of several equal keys wins.
    pub fn insert_all<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = K>,
    {
        for key in keys {
            self.insert(key);
        }
    }

    /// Removes the key equal to `q` and hands it back.
    pub fn take<Q>(&mut self, q: &Q) -> Option<K>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        let bucket = self.capacity.bucket_of(hash);
        let mut prev: Link = None;
        let mut cur = self.buckets[bucket];
        while let Some(k) = cur {
            let node = &self.nodes[k];
            if node.hash == hash && node.key.borrow() == q {
                let next = node.next;
                match prev {
                    None => self.buckets[bucket] = next,
                    Some(p) => self.nodes[p].next = next,
                }
                return self.nodes.remove(k).map(|n| n.key);
            }
            prev = cur;
            cur = node.next;
        }
        None
    }

    /// Removes the key equal to `q`; returns 1 if one was removed, else 0.
    /// The table never shrinks.
    pub fn erase<Q>(&mut self, q: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.take(q).is_some())
    }
}

impl<K, const N: usize> Default for ChainSet<K, RandomState, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, S, const N: usize> Clone for ChainSet<K, S, N>
where
    K: Clone,
    S: Clone,
{
    fn clone(&self) -> Self {
        Self {
            hasher: self.hasher.clone(),
            capacity: self.capacity,
            buckets: self.buckets.clone(),
            nodes: self.nodes.clone(),
        }
    }
}

impl<K, S, const N: usize> PartialEq for ChainSet<K, S, N>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|k| other.contains(k))
    }
}

impl<K, S, const N: usize> Eq for ChainSet<K, S, N>
where
    K: Eq + Hash,
    S: BuildHasher,
{
}

impl<K: fmt::Debug, S, const N: usize> fmt::Debug for ChainSet<K, S, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<'a, K, S, const N: usize> IntoIterator for &'a ChainSet<K, S, N> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K>;

    fn into_iter(self) -> Iter<'a, K> {
        self.iter()
    }
}

impl<K, S, const N: usize> IntoIterator for ChainSet<K, S, N> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter::new(self.nodes, self.buckets)
    }
}

impl<K, S, const N: usize> Extend<K> for ChainSet<K, S, N>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        self.insert_all(iter);
    }
}

impl<'a, K, S, const N: usize> Extend<&'a K> for ChainSet<K, S, N>
where
    K: Eq + Hash + Copy + 'a,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = &'a K>>(&mut self, iter: I) {
        self.insert_all(iter.into_iter().copied());
    }
}

impl<K, S, const N: usize> FromIterator<K> for ChainSet<K, S, N>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut s = Self::with_hasher(S::default());
        s.insert_all(iter);
        s
    }
}

impl<K, const M: usize> From<[K; M]> for ChainSet<K>
where
    K: Eq + Hash,
{
    fn from(keys: [K; M]) -> Self {
        keys.into_iter().collect()
    }
}

/// Human-readable bucket table, produced by [`ChainSet::dump`].
///
/// Prints the bucket count and length, then one line per bucket listing its
/// chain. The layout is for debugging and may change.
pub struct Dump<'a, K> {
    buckets: &'a [Link],
    nodes: &'a SlotMap<DefaultKey, Node<K>>,
}

impl<K: fmt::Debug> fmt::Display for Dump<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "buckets = {}, len = {}", self.buckets.len(), self.nodes.len())?;
        for (b, &head) in self.buckets.iter().enumerate() {
            write!(f, "[{b}]:")?;
            let mut cur = head;
            while let Some(k) = cur {
                let node = &self.nodes[k];
                write!(f, " {:?}", node.key)?;
                cur = node.next;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
