//! Persistent (structurally shared) sorted collections used by document sets and views.

mod sorted_map;
mod sorted_set;

pub use sorted_map::{natural_order, Comparator, ImmutableSortedMap, Iter};
pub use sorted_set::ImmutableSortedSet;

use crate::firestore::model::DocumentKey;

/// Document keys in key order; used for mutated and synced key bookkeeping.
pub type DocumentKeySet = ImmutableSortedSet<DocumentKey>;
