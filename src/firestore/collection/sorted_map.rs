use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Shared ordering function used by the persistent collections.
pub type Comparator<K> = Arc<dyn Fn(&K, &K) -> Ordering + Send + Sync>;

type Link<K, V> = Option<Arc<Node<K, V>>>;

struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
    height: usize,
    size: usize,
}

/// A persistent sorted map backed by an AVL tree.
///
/// Every update returns a new map that shares all untouched subtrees with the original, so
/// cloning is O(1) and earlier versions are never affected by later inserts or removals.
/// Positional lookups (`index_of`) are O(log n) thanks to per-node subtree sizes.
pub struct ImmutableSortedMap<K, V> {
    root: Link<K, V>,
    comparator: Comparator<K>,
}

impl<K, V> Clone for ImmutableSortedMap<K, V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            comparator: Arc::clone(&self.comparator),
        }
    }
}

/// Orders keys by their [`Ord`] implementation.
pub fn natural_order<K: Ord + 'static>() -> Comparator<K> {
    Arc::new(|left: &K, right: &K| left.cmp(right))
}

impl<K: Ord + 'static, V> ImmutableSortedMap<K, V> {
    pub fn new() -> Self {
        Self::with_comparator(natural_order())
    }
}

impl<K: Ord + 'static, V> Default for ImmutableSortedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> ImmutableSortedMap<K, V> {
    pub fn with_comparator(comparator: Comparator<K>) -> Self {
        Self {
            root: None,
            comparator,
        }
    }

    pub fn comparator(&self) -> &Comparator<K> {
        &self.comparator
    }

    pub fn len(&self) -> usize {
        size(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match (self.comparator)(key, &node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.get(key).is_some()
    }

    /// Position of `key` in iteration order.
    pub fn index_of(&self, key: &K) -> Option<usize> {
        let mut index = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match (self.comparator)(key, &node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => {
                    index += size(&node.left) + 1;
                    node.right.as_deref()
                }
                Ordering::Equal => return Some(index + size(&node.left)),
            };
        }
        None
    }

    /// Entry at `index` in iteration order.
    pub fn get_index(&self, mut index: usize) -> Option<(&K, &V)> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            let left_size = size(&node.left);
            current = match index.cmp(&left_size) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Equal => return Some((&node.key, &node.value)),
                Ordering::Greater => {
                    index -= left_size + 1;
                    node.right.as_deref()
                }
            };
        }
        None
    }

    pub fn first(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(left) = node.left.as_deref() {
            node = left;
        }
        Some((&node.key, &node.value))
    }

    pub fn last(&self) -> Option<(&K, &V)> {
        let mut node = self.root.as_deref()?;
        while let Some(right) = node.right.as_deref() {
            node = right;
        }
        Some((&node.key, &node.value))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            stack: Vec::new(),
            remaining: self.len(),
        };
        iter.push_left(self.root.as_deref());
        iter
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }
}

impl<K: Clone, V: Clone> ImmutableSortedMap<K, V> {
    /// Returns a map with `key` bound to `value`, replacing any existing binding.
    pub fn insert(&self, key: K, value: V) -> Self {
        Self {
            root: Some(insert_node(&self.root, key, value, &self.comparator)),
            comparator: Arc::clone(&self.comparator),
        }
    }

    /// Returns a map without `key`. Removing an absent key shares the whole tree.
    pub fn remove(&self, key: &K) -> Self {
        if !self.contains_key(key) {
            return self.clone();
        }
        Self {
            root: remove_node(&self.root, key, &self.comparator),
            comparator: Arc::clone(&self.comparator),
        }
    }
}

impl<K: Debug, V: Debug> Debug for ImmutableSortedMap<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a, K, V> IntoIterator for &'a ImmutableSortedMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// In-order iterator over an [`ImmutableSortedMap`].
pub struct Iter<'a, K, V> {
    stack: Vec<&'a Node<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iter<'a, K, V> {
    fn push_left(&mut self, mut node: Option<&'a Node<K, V>>) {
        while let Some(current) = node {
            self.stack.push(current);
            node = current.left.as_deref();
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.push_left(node.right.as_deref());
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

fn height<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |node| node.height)
}

fn size<K, V>(link: &Link<K, V>) -> usize {
    link.as_ref().map_or(0, |node| node.size)
}

fn make<K, V>(key: K, value: V, left: Link<K, V>, right: Link<K, V>) -> Arc<Node<K, V>> {
    Arc::new(Node {
        height: height(&left).max(height(&right)) + 1,
        size: size(&left) + size(&right) + 1,
        key,
        value,
        left,
        right,
    })
}

/// Rebuilds a node whose subtrees differ in height by at most two, restoring the AVL invariant.
fn balance<K: Clone, V: Clone>(
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
) -> Arc<Node<K, V>> {
    let left_height = height(&left);
    let right_height = height(&right);

    if left_height > right_height + 1 {
        if let Some(pivot) = left.as_deref() {
            if height(&pivot.left) >= height(&pivot.right) {
                let new_right = make(key, value, pivot.right.clone(), right);
                return make(
                    pivot.key.clone(),
                    pivot.value.clone(),
                    pivot.left.clone(),
                    Some(new_right),
                );
            }
            if let Some(inner) = pivot.right.as_deref() {
                let new_left = make(
                    pivot.key.clone(),
                    pivot.value.clone(),
                    pivot.left.clone(),
                    inner.left.clone(),
                );
                let new_right = make(key, value, inner.right.clone(), right);
                return make(
                    inner.key.clone(),
                    inner.value.clone(),
                    Some(new_left),
                    Some(new_right),
                );
            }
        }
    } else if right_height > left_height + 1 {
        if let Some(pivot) = right.as_deref() {
            if height(&pivot.right) >= height(&pivot.left) {
                let new_left = make(key, value, left, pivot.left.clone());
                return make(
                    pivot.key.clone(),
                    pivot.value.clone(),
                    Some(new_left),
                    pivot.right.clone(),
                );
            }
            if let Some(inner) = pivot.left.as_deref() {
                let new_left = make(key, value, left, inner.left.clone());
                let new_right = make(
                    pivot.key.clone(),
                    pivot.value.clone(),
                    inner.right.clone(),
                    pivot.right.clone(),
                );
                return make(
                    inner.key.clone(),
                    inner.value.clone(),
                    Some(new_left),
                    Some(new_right),
                );
            }
        }
    }
    make(key, value, left, right)
}

fn insert_node<K: Clone, V: Clone>(
    link: &Link<K, V>,
    key: K,
    value: V,
    comparator: &Comparator<K>,
) -> Arc<Node<K, V>> {
    let Some(node) = link.as_deref() else {
        return make(key, value, None, None);
    };
    match comparator(&key, &node.key) {
        Ordering::Less => {
            let left = insert_node(&node.left, key, value, comparator);
            balance(
                node.key.clone(),
                node.value.clone(),
                Some(left),
                node.right.clone(),
            )
        }
        Ordering::Greater => {
            let right = insert_node(&node.right, key, value, comparator);
            balance(
                node.key.clone(),
                node.value.clone(),
                node.left.clone(),
                Some(right),
            )
        }
        Ordering::Equal => make(key, value, node.left.clone(), node.right.clone()),
    }
}

fn remove_node<K: Clone, V: Clone>(
    link: &Link<K, V>,
    key: &K,
    comparator: &Comparator<K>,
) -> Link<K, V> {
    let node = link.as_deref()?;
    let rebuilt = match comparator(key, &node.key) {
        Ordering::Less => balance(
            node.key.clone(),
            node.value.clone(),
            remove_node(&node.left, key, comparator),
            node.right.clone(),
        ),
        Ordering::Greater => balance(
            node.key.clone(),
            node.value.clone(),
            node.left.clone(),
            remove_node(&node.right, key, comparator),
        ),
        Ordering::Equal => match (&node.left, &node.right) {
            (None, right) => return right.clone(),
            (left, None) => return left.clone(),
            (left, Some(right)) => {
                let (min_key, min_value, rest) = remove_min(right);
                balance(min_key, min_value, left.clone(), rest)
            }
        },
    };
    Some(rebuilt)
}

fn remove_min<K: Clone, V: Clone>(node: &Arc<Node<K, V>>) -> (K, V, Link<K, V>) {
    match &node.left {
        None => (node.key.clone(), node.value.clone(), node.right.clone()),
        Some(left) => {
            let (key, value, rest) = remove_min(left);
            let rebuilt = balance(
                node.key.clone(),
                node.value.clone(),
                rest,
                node.right.clone(),
            );
            (key, value, Some(rebuilt))
        }
    }
}
