use std::collections::BTreeMap;

use crate::firestore::value::FirestoreValue;

/// String-keyed fields. Keys are kept sorted, so insertion order never affects equality,
/// ordering or canonical ids.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MapValue {
    fields: BTreeMap<String, FirestoreValue>,
}

impl MapValue {
    pub fn new(fields: BTreeMap<String, FirestoreValue>) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &BTreeMap<String, FirestoreValue> {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&FirestoreValue> {
        self.fields.get(key)
    }

    /// Walks nested maps along `segments`. Returns `None` when any step is missing or not a map.
    pub fn get_path<S: AsRef<str>>(&self, segments: &[S]) -> Option<&FirestoreValue> {
        let (first, rest) = segments.split_first()?;
        let value = self.fields.get(first.as_ref())?;
        if rest.is_empty() {
            return Some(value);
        }
        value.as_map()?.get_path(rest)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, FirestoreValue)> for MapValue {
    fn from_iter<T: IntoIterator<Item = (K, FirestoreValue)>>(iter: T) -> Self {
        Self::new(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}
