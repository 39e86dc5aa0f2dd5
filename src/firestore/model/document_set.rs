use std::cmp::Ordering;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::firestore::collection::{Comparator, ImmutableSortedMap, ImmutableSortedSet};
use crate::firestore::model::{Document, DocumentKey};

/// The documents of a query result, ordered by the query's comparator.
///
/// A `DocumentSet` is persistent: `insert` and `remove` return a new set and leave the receiver
/// untouched, so snapshots handed to listeners never change underneath them. Ties in the
/// comparator are broken by document key, which makes the order total.
#[derive(Clone)]
pub struct DocumentSet {
    key_index: ImmutableSortedMap<DocumentKey, Document>,
    sorted: ImmutableSortedSet<Document>,
}

impl DocumentSet {
    pub fn new(comparator: Comparator<Document>) -> Self {
        let by_comparator_then_key: Comparator<Document> =
            Arc::new(move |left: &Document, right: &Document| {
                match comparator(left, right) {
                    Ordering::Equal => left.key().cmp(right.key()),
                    ordering => ordering,
                }
            });
        Self {
            key_index: ImmutableSortedMap::new(),
            sorted: ImmutableSortedSet::with_comparator(by_comparator_then_key),
        }
    }

    /// A set ordered only by document key.
    pub fn by_key() -> Self {
        Self::new(Arc::new(|_: &Document, _: &Document| Ordering::Equal))
    }

    pub fn len(&self) -> usize {
        self.key_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.key_index.is_empty()
    }

    pub fn contains(&self, key: &DocumentKey) -> bool {
        self.key_index.contains_key(key)
    }

    pub fn get(&self, key: &DocumentKey) -> Option<&Document> {
        self.key_index.get(key)
    }

    pub fn first(&self) -> Option<&Document> {
        self.sorted.first()
    }

    pub fn last(&self) -> Option<&Document> {
        self.sorted.last()
    }

    /// Position of the document with `key` in comparator order.
    pub fn index_of(&self, key: &DocumentKey) -> Option<usize> {
        let document = self.key_index.get(key)?;
        self.sorted.index_of(document)
    }

    /// Inserts `document`, replacing (and re-positioning) any document with the same key.
    pub fn insert(&self, document: Document) -> Self {
        let base = self.remove(document.key());
        Self {
            key_index: base.key_index.insert(document.key().clone(), document.clone()),
            sorted: base.sorted.insert(document),
        }
    }

    pub fn remove(&self, key: &DocumentKey) -> Self {
        match self.key_index.get(key) {
            Some(existing) => Self {
                key_index: self.key_index.remove(key),
                sorted: self.sorted.remove(existing),
            },
            None => self.clone(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Document> {
        self.sorted.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &DocumentKey> {
        self.sorted.iter().map(Document::key)
    }

    pub fn to_vec(&self) -> Vec<Document> {
        self.iter().cloned().collect()
    }
}

impl PartialEq for DocumentSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Debug for DocumentSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.keys()).finish()
    }
}
