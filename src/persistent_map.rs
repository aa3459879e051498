//! Persistent hash map (hash array mapped trie).
//!
//! Every [`PersistentMap::insert`] returns a new version and leaves the
//! receiver untouched. The two versions share every subtree that is not on the
//! root‑to‑leaf path of the inserted key, so an insert allocates
//! `O(log_{2^BITS} n)` nodes.
//!
//! ### Layout
//!
//! | Node     | Contents                                                    |
//! |----------|-------------------------------------------------------------|
//! | `Branch` | `u64` occupancy bitmap + compressed `Vec` of children       |
//! | `Leaf`   | the full 64‑bit hash + bucket of entries sharing that hash  |
//!
//! `BITS` hash bits are consumed per level, so a branch has at most
//! `2^BITS` children. Hashing uses `rustc_hash::FxHasher`, which is
//! deterministic across runs.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::FusedIterator;
use std::rc::Rc;

use rustc_hash::FxHasher;

enum Node<K, V> {
    Branch {
        bitmap: u64,
        children: Vec<Rc<Node<K, V>>>,
    },
    Leaf {
        hash: u64,
        entries: Vec<(K, V)>,
    },
}

impl<K, V> Node<K, V> {
    fn empty_branch() -> Self {
        Node::Branch {
            bitmap: 0,
            children: Vec::new(),
        }
    }
}

/// An immutable, structurally shared `K → V` map.
///
/// `BITS` is the branching exponent and must lie in `1..=6`.
pub struct PersistentMap<K, V, const BITS: u32 = 5> {
    root: Rc<Node<K, V>>,
    len: usize,
}

fn hash_of<K: Hash + ?Sized>(key: &K) -> u64 {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    hasher.finish()
}

impl<K, V, const BITS: u32> PersistentMap<K, V, BITS> {
    const VALID_BITS: () = assert!(BITS >= 1 && BITS <= 6, "BITS must be in 1..=6");

    const MASK: u64 = (1u64 << BITS) - 1;

    /// The empty map.
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::VALID_BITS;

        Self {
            root: Rc::new(Node::empty_branch()),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterates over all entries in unspecified order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            stack: vec![self.root.as_ref()],
            bucket: Default::default(),
            remaining: self.len,
        }
    }

    /// Bitmap bit selected by `hash` at the level starting at `shift`.
    #[inline]
    fn slot(hash: u64, shift: u32) -> u64 {
        1u64 << (hash.checked_shr(shift).unwrap_or(0) & Self::MASK)
    }

    #[inline]
    fn position(bitmap: u64, bit: u64) -> usize {
        (bitmap & (bit - 1)).count_ones() as usize
    }
}

impl<K, V, const BITS: u32> PersistentMap<K, V, BITS>
where
    K: Hash + Eq,
{
    /// Looks `key` up in this version. Accepts any borrowed form of `K`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash: u64 = hash_of(key);
        let mut node: &Node<K, V> = &self.root;
        let mut shift: u32 = 0;

        loop {
            match node {
                Node::Branch { bitmap, children } => {
                    let bit: u64 = Self::slot(hash, shift);

                    if bitmap & bit == 0 {
                        return None;
                    }

                    node = &children[Self::position(*bitmap, bit)];
                    shift += BITS;
                }

                Node::Leaf {
                    hash: leaf_hash,
                    entries,
                } => {
                    if *leaf_hash != hash {
                        return None;
                    }

                    return entries
                        .iter()
                        .find(|(k, _)| k.borrow() == key)
                        .map(|(_, v)| v);
                }
            }
        }
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }
}

impl<K, V, const BITS: u32> PersistentMap<K, V, BITS>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    /// A new version with `key` bound to `value`. `self` is unchanged.
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> Self {
        let hash: u64 = hash_of(&key);
        let (root, added) = Self::insert_at(&self.root, 0, hash, key, value);

        Self {
            root,
            len: self.len + usize::from(added),
        }
    }

    /// Returns the replacement for `node` and whether the key was new.
    fn insert_at(
        node: &Rc<Node<K, V>>,
        shift: u32,
        hash: u64,
        key: K,
        value: V,
    ) -> (Rc<Node<K, V>>, bool) {
        match node.as_ref() {
            Node::Branch { bitmap, children } => {
                let bit: u64 = Self::slot(hash, shift);
                let pos: usize = Self::position(*bitmap, bit);
                let mut children: Vec<Rc<Node<K, V>>> = children.clone();

                let added: bool = if bitmap & bit == 0 {
                    children.insert(
                        pos,
                        Rc::new(Node::Leaf {
                            hash,
                            entries: vec![(key, value)],
                        }),
                    );

                    true
                } else {
                    let (child, added) =
                        Self::insert_at(&children[pos], shift + BITS, hash, key, value);
                    children[pos] = child;

                    added
                };

                (
                    Rc::new(Node::Branch {
                        bitmap: bitmap | bit,
                        children,
                    }),
                    added,
                )
            }

            Node::Leaf {
                hash: leaf_hash,
                entries,
            } if *leaf_hash == hash => {
                let mut entries: Vec<(K, V)> = entries.clone();

                let added: bool = match entries.iter_mut().find(|(k, _)| *k == key) {
                    Some(entry) => {
                        entry.1 = value;
                        false
                    }
                    None => {
                        entries.push((key, value));
                        true
                    }
                };

                (Rc::new(Node::Leaf { hash, entries }), added)
            }

            // Different hash: push the existing leaf one level down and retry.
            Node::Leaf {
                hash: leaf_hash, ..
            } => {
                let bit: u64 = Self::slot(*leaf_hash, shift);
                let branch: Rc<Node<K, V>> = Rc::new(Node::Branch {
                    bitmap: bit,
                    children: vec![Rc::clone(node)],
                });

                Self::insert_at(&branch, shift, hash, key, value)
            }
        }
    }
}

impl<K, V, const BITS: u32> Clone for PersistentMap<K, V, BITS> {
    fn clone(&self) -> Self {
        Self {
            root: Rc::clone(&self.root),
            len: self.len,
        }
    }
}

impl<K, V, const BITS: u32> Default for PersistentMap<K, V, BITS> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, const BITS: u32> fmt::Debug for PersistentMap<K, V, BITS>
where
    K: fmt::Debug,
    V: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, const BITS: u32> FromIterator<(K, V)> for PersistentMap<K, V, BITS>
where
    K: Hash + Eq + Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |map, (k, v)| map.insert(k, v))
    }
}

impl<'a, K, V, const BITS: u32> IntoIterator for &'a PersistentMap<K, V, BITS> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Depth‑first iterator over a [`PersistentMap`].
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
    bucket: std::slice::Iter<'a, (K, V)>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((k, v)) = self.bucket.next() {
                self.remaining -= 1;

                return Some((k, v));
            }

            match self.stack.pop()? {
                Node::Branch { children, .. } => {
                    self.stack.extend(children.iter().rev().map(Rc::as_ref));
                }
                Node::Leaf { entries, .. } => self.bucket = entries.iter(),
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}
