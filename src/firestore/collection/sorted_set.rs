use std::fmt::{Debug, Formatter};

use crate::firestore::collection::sorted_map::{natural_order, Comparator, ImmutableSortedMap};

/// A persistent sorted set; see [`ImmutableSortedMap`] for the sharing guarantees.
pub struct ImmutableSortedSet<T> {
    map: ImmutableSortedMap<T, ()>,
}

impl<T> Clone for ImmutableSortedSet<T> {
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T: Ord + 'static> ImmutableSortedSet<T> {
    pub fn new() -> Self {
        Self::with_comparator(natural_order())
    }
}

impl<T: Ord + 'static> Default for ImmutableSortedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ImmutableSortedSet<T> {
    pub fn with_comparator(comparator: Comparator<T>) -> Self {
        Self {
            map: ImmutableSortedMap::with_comparator(comparator),
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, item: &T) -> bool {
        self.map.contains_key(item)
    }

    pub fn index_of(&self, item: &T) -> Option<usize> {
        self.map.index_of(item)
    }

    pub fn first(&self) -> Option<&T> {
        self.map.first().map(|(item, _)| item)
    }

    pub fn last(&self) -> Option<&T> {
        self.map.last().map(|(item, _)| item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.map.keys()
    }
}

impl<T: Clone> ImmutableSortedSet<T> {
    pub fn insert(&self, item: T) -> Self {
        Self {
            map: self.map.insert(item, ()),
        }
    }

    pub fn remove(&self, item: &T) -> Self {
        Self {
            map: self.map.remove(item),
        }
    }

    /// Every element of `self` plus every element of `other`, ordered by `self`'s comparator.
    pub fn union(&self, other: &Self) -> Self {
        other
            .iter()
            .fold(self.clone(), |set, item| set.insert(item.clone()))
    }
}

impl<T: PartialEq> PartialEq for ImmutableSortedSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl<T: Eq> Eq for ImmutableSortedSet<T> {}

impl<T: Debug> Debug for ImmutableSortedSet<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T: Ord + Clone + 'static> FromIterator<T> for ImmutableSortedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |set, item| set.insert(item))
    }
}
