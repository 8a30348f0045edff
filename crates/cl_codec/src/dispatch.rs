//! Balanced hash dispatch over byte keys.
//!
//! Keys are hashed with [`fast_hash`], sorted by hash and grouped by equal
//! hash. The group range is bisected until at most [`LEAF_LIMIT`] groups
//! remain; leaves compare the hash and then the full key. A hash tie never
//! matches without an exact byte comparison.

use cl_utils::hash::fast_hash;

/// Maximum number of hash groups scanned linearly by a leaf.
pub const LEAF_LIMIT: usize = 2;

struct Entry<T> {
    hash: u64,
    key: Box<[u8]>,
    value: T,
}

#[derive(Clone, Copy, Debug)]
enum Node {
    Branch { pivot: u64, left: usize, right: usize },
    Leaf { start: usize, end: usize },
}

/// A read-only lookup table from byte keys to values.
///
/// When several entries share a key the first one added wins.
///
/// # Examples
///
/// ```
/// use cl_codec::DispatchTree;
///
/// let tree = DispatchTree::new([("RootInt", 0), ("RootString", 1)]);
/// assert_eq!(tree.lookup(b"RootString"), Some(&1));
/// assert_eq!(tree.lookup(b"RootStrinG"), None);
/// ```
pub struct DispatchTree<T> {
    entries: Vec<Entry<T>>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

impl<T> DispatchTree<T> {
    /// Builds a tree over `(key, value)` pairs hashed with [`fast_hash`].
    pub fn new<K: AsRef<[u8]>>(items: impl IntoIterator<Item = (K, T)>) -> Self {
        Self::with_hashes(items.into_iter().map(|(key, value)| {
            let key = key.as_ref();
            (fast_hash(key), Box::from(key), value)
        }))
    }

    /// Builds a tree over entries whose hash is already known.
    pub fn with_hashes(items: impl IntoIterator<Item = (u64, Box<[u8]>, T)>) -> Self {
        let mut entries: Vec<Entry<T>> = items
            .into_iter()
            .map(|(hash, key, value)| Entry { hash, key, value })
            .collect();
        // Stable, so equal hashes keep insertion order.
        entries.sort_by_key(|e| e.hash);

        let mut groups: Vec<(u64, usize, usize)> = Vec::new();
        for (index, entry) in entries.iter().enumerate() {
            match groups.last_mut() {
                Some((hash, _, end)) if *hash == entry.hash => *end = index + 1,
                _ => groups.push((entry.hash, index, index + 1)),
            }
        }

        let mut tree = Self {
            entries,
            nodes: Vec::new(),
            root: None,
        };
        if !groups.is_empty() {
            tree.root = Some(tree.build(&groups, 0, groups.len()));
        }
        tree
    }

    fn build(&mut self, groups: &[(u64, usize, usize)], lo: usize, hi: usize) -> usize {
        let node = if hi - lo <= LEAF_LIMIT {
            Node::Leaf {
                start: groups[lo].1,
                end: groups[hi - 1].2,
            }
        } else {
            let mid = (lo + hi - 1) / 2;
            let pivot = groups[mid].0;
            let left = self.build(groups, lo, mid + 1);
            let right = self.build(groups, mid + 1, hi);
            Node::Branch { pivot, left, right }
        };
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    #[inline]
    pub fn lookup(&self, key: &[u8]) -> Option<&T> {
        self.lookup_hashed(fast_hash(key), key)
    }

    /// Looks up `key` whose hash was computed by the caller.
    pub fn lookup_hashed(&self, hash: u64, key: &[u8]) -> Option<&T> {
        let mut current = self.root?;
        loop {
            match self.nodes[current] {
                Node::Branch { pivot, left, right } => {
                    current = if hash > pivot { right } else { left };
                }
                Node::Leaf { start, end } => {
                    return self.entries[start..end]
                        .iter()
                        .filter(|e| e.hash == hash)
                        .find(|e| *e.key == *key)
                        .map(|e| &e.value);
                }
            }
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of nodes on the longest root to leaf path.
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[Node], index: usize) -> usize {
            match nodes[index] {
                Node::Leaf { .. } => 1,
                Node::Branch { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        self.root.map_or(0, |root| walk(&self.nodes, root))
    }
}

// -----------------------------------------------------------------------------
// Tests
