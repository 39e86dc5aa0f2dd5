use crate::firestore::value::FirestoreValue;

/// An ordered list of values. Equality is element-wise value equality.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayValue {
    values: Vec<FirestoreValue>,
}

impl ArrayValue {
    pub fn new(values: Vec<FirestoreValue>) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[FirestoreValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Membership using value equality, so `1` is found in `[1.0]` and `NaN` is never found.
    pub fn contains(&self, needle: &FirestoreValue) -> bool {
        self.values.iter().any(|candidate| candidate == needle)
    }
}

impl FromIterator<FirestoreValue> for ArrayValue {
    fn from_iter<T: IntoIterator<Item = FirestoreValue>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
