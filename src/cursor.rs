//! Cursors and iterators over a `ChainSet`.
//!
//! Traversal order is ascending bucket index, then chain order within a
//! bucket. The order between distinct keys carries no meaning beyond that.

use crate::chain_set::{Link, Node};
use core::fmt;
use core::iter::FusedIterator;
use slotmap::{DefaultKey, SlotMap};

/// A forward position inside a set: either a stored key or the end.
///
/// A cursor borrows the set it came from, so no mutation can invalidate it
/// while it is alive. Reading the end position yields `None` and advancing
/// it is a no-op. Cursors taken from different sets never compare equal.
pub struct Cursor<'a, K> {
    buckets: &'a [Link],
    nodes: &'a SlotMap<DefaultKey, Node<K>>,
    bucket: usize,
    node: Link,
}

impl<'a, K> Cursor<'a, K> {
    /// Cursor at the first stored key in bucket order, or at the end.
    pub(crate) fn begin(buckets: &'a [Link], nodes: &'a SlotMap<DefaultKey, Node<K>>) -> Self {
        let mut c = Cursor {
            buckets,
            nodes,
            bucket: 0,
            node: None,
        };
        c.seek();
        c
    }

    pub(crate) fn end(buckets: &'a [Link], nodes: &'a SlotMap<DefaultKey, Node<K>>) -> Self {
        Cursor {
            buckets,
            nodes,
            bucket: buckets.len(),
            node: None,
        }
    }

    pub(crate) fn at(
        buckets: &'a [Link],
        nodes: &'a SlotMap<DefaultKey, Node<K>>,
        bucket: usize,
        node: DefaultKey,
    ) -> Self {
        Cursor {
            buckets,
            nodes,
            bucket,
            node: Some(node),
        }
    }

    /// The key under the cursor, or `None` at the end.
    #[inline]
    pub fn get(&self) -> Option<&'a K> {
        let nodes = self.nodes;
        self.node.map(move |k| &nodes[k].key)
    }

    #[inline]
    pub fn is_end(&self) -> bool {
        self.node.is_none()
    }

    /// Bucket holding the current key; equals the bucket count at the end.
    #[inline]
    pub fn bucket(&self) -> usize {
        self.bucket
    }

    /// Step to the next key in the chain, then to the next non-empty bucket.
    pub fn move_next(&mut self) {
        let Some(k) = self.node else {
            return;
        };
        match self.nodes[k].next {
            Some(next) => self.node = Some(next),
            None => {
                self.bucket += 1;
                self.seek();
            }
        }
    }

    // Settle on the head of the first non-empty bucket at or after `self.bucket`.
    fn seek(&mut self) {
        while self.bucket < self.buckets.len() {
            if let Some(head) = self.buckets[self.bucket] {
                self.node = Some(head);
                return;
            }
            self.bucket += 1;
        }
        self.node = None;
    }
}

impl<K> Clone for Cursor<'_, K> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K> Copy for Cursor<'_, K> {}

impl<K> PartialEq for Cursor<'_, K> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.nodes, other.nodes) && self.node == other.node
    }
}

impl<K> Eq for Cursor<'_, K> {}

impl<K: fmt::Debug> fmt::Debug for Cursor<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("bucket", &self.bucket)
            .field("key", &self.get())
            .finish()
    }
}

impl<'a, K> Iterator for Cursor<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        let key = self.get()?;
        self.move_next();
        Some(key)
    }
}

impl<K> FusedIterator for Cursor<'_, K> {}

/// Iterator over the keys of a set, produced by [`ChainSet::iter`](crate::ChainSet::iter).
pub struct Iter<'a, K> {
    cursor: Cursor<'a, K>,
    remaining: usize,
}

impl<'a, K> Iter<'a, K> {
    pub(crate) fn new(cursor: Cursor<'a, K>, remaining: usize) -> Self {
        Iter { cursor, remaining }
    }
}

impl<K> Clone for Iter<'_, K> {
    fn clone(&self) -> Self {
        Iter {
            cursor: self.cursor,
            remaining: self.remaining,
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Iter<'_, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

impl<'a, K> Iterator for Iter<'a, K> {
    type Item = &'a K;

    #[inline]
    fn next(&mut self) -> Option<&'a K> {
        let key = self.cursor.next()?;
        self.remaining -= 1;
        Some(key)
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K> ExactSizeIterator for Iter<'_, K> {}
impl<K> FusedIterator for Iter<'_, K> {}

/// Owning iterator over the keys of a set, in bucket order.
pub struct IntoIter<K> {
    nodes: SlotMap<DefaultKey, Node<K>>,
    buckets: std::vec::IntoIter<Link>,
    next: Link,
}

impl<K> IntoIter<K> {
    pub(crate) fn new(nodes: SlotMap<DefaultKey, Node<K>>, buckets: Box<[Link]>) -> Self {
        IntoIter {
            nodes,
            buckets: buckets.into_vec().into_iter(),
            next: None,
        }
    }
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    fn next(&mut self) -> Option<K> {
        loop {
            if let Some(k) = self.next {
                let node = self.nodes.remove(k)?;
                self.next = node.next;
                return Some(node.key);
            }
            self.next = self.buckets.next()?;
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.nodes.len(), Some(self.nodes.len()))
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}
impl<K> FusedIterator for IntoIter<K> {}

#[cfg(test)]
mod tests {
    use crate::ChainSet;
    use core::hash::{BuildHasher, Hasher};

    // Hashes every integer key to itself so bucket placement is predictable.
    #[derive(Clone, Default)]
    struct IdentityBuildHasher;
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher(0)
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for &b in bytes {
                self.0 = (self.0 << 8) | u64::from(b);
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    fn identity_set(keys: &[u64]) -> ChainSet<u64, IdentityBuildHasher> {
        let mut s = ChainSet::with_hasher(IdentityBuildHasher);
        s.insert_all(keys.iter().copied());
        s
    }

    /// Invariant: traversal visits buckets in ascending order, skipping empty
    /// ones, and reports the bucket of each key.
    #[test]
    fn cursor_walks_buckets_in_order() {
        let s = identity_set(&[7, 2, 11]);
        let mut c = s.begin();
        let mut seen = Vec::new();
        while let Some(k) = c.get() {
            seen.push((c.bucket(), *k));
            c.move_next();
        }
        assert_eq!(seen, vec![(2, 2), (7, 7), (11, 11)]);
        assert!(c.is_end());
        assert_eq!(c, s.end());
    }

    /// Invariant: a bucket's whole chain is visited before the next bucket.
    #[test]
    fn cursor_exhausts_chain_before_next_bucket() {
        // 1, 13 and 25 share bucket 1 of 12; 5 sits alone in bucket 5.
        let s = identity_set(&[1, 5, 13, 25]);
        let order: Vec<(usize, u64)> = {
            let mut c = s.begin();
            let mut v = Vec::new();
            while let Some(k) = c.get() {
                v.push((c.bucket(), *k));
                c.move_next();
            }
            v
        };
        assert_eq!(order.len(), 4);
        assert!(order[..3].iter().all(|&(b, _)| b == 1));
        assert_eq!(order[3], (5, 5));
        let mut chain: Vec<u64> = order[..3].iter().map(|&(_, k)| k).collect();
        chain.sort();
        assert_eq!(chain, vec![1, 13, 25]);
    }

    /// Invariant: an empty set's begin cursor is already the end cursor.
    #[test]
    fn empty_set_begin_is_end() {
        let s: ChainSet<u64> = ChainSet::new();
        assert!(s.begin().is_end());
        assert_eq!(s.begin(), s.end());
        assert_eq!(s.begin().get(), None);
    }

    /// Invariant: advancing the end cursor is a no-op and it keeps reading `None`.
    #[test]
    fn advancing_end_is_noop() {
        let s = identity_set(&[3]);
        let mut c = s.end();
        c.move_next();
        c.move_next();
        assert!(c.is_end());
        assert_eq!(c.get(), None);
        assert_eq!(c.next(), None);
    }

    /// Invariant: cursor equality is node identity; copies compare equal,
    /// distinct keys do not, and equal sets do not share cursors.
    #[test]
    fn cursor_equality_is_identity() {
        let a = identity_set(&[1, 2]);
        let b = a.clone();
        let c1 = a.find(&1);
        let c2 = c1;
        assert_eq!(c1, c2);
        assert_ne!(a.find(&1), a.find(&2));
        assert_ne!(a.find(&1), b.find(&1));
        assert_ne!(a.end(), b.end());
    }

    /// Invariant: `iter` reports an exact length that counts down to zero.
    #[test]
    fn iter_is_exact_size() {
        let s = identity_set(&[1, 2, 3, 40, 41]);
        let mut it = s.iter();
        assert_eq!(it.len(), 5);
        it.next();
        it.next();
        assert_eq!(it.len(), 3);
        assert_eq!(it.by_ref().count(), 3);
        assert_eq!(it.len(), 0);
        assert_eq!(it.next(), None);
    }

    /// Invariant: owned iteration yields every key once, in the same order as
    /// borrowed iteration.
    #[test]
    fn into_iter_matches_borrowed_order() {
        let s = identity_set(&[9, 4, 16, 28, 0]);
        let borrowed: Vec<u64> = s.iter().copied().collect();
        let it = s.into_iter();
        assert_eq!(it.len(), 5);
        let owned: Vec<u64> = it.collect();
        assert_eq!(owned, borrowed);
    }

    /// Invariant: dropping a partly consumed owning iterator releases the rest.
    #[test]
    fn into_iter_partial_drop() {
        use std::rc::Rc;
        let marker = Rc::new(());
        let mut s: ChainSet<(i32, Rc<()>)> = ChainSet::new();
        for i in 0..20 {
            s.insert((i, Rc::clone(&marker)));
        }
        assert_eq!(Rc::strong_count(&marker), 21);
        let mut it = s.into_iter();
        let first = it.next();
        assert!(first.is_some());
        drop(it);
        drop(first);
        assert_eq!(Rc::strong_count(&marker), 1);
    }
}
