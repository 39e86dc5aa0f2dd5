use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::firestore::model::{GeoPoint, Timestamp};
use crate::firestore::value::{values, ArrayValue, BytesValue, MapValue};

/// A document field value.
///
/// Equality follows Firestore semantics rather than structural identity: `Integer(1)` equals
/// `Double(1.0)`, `0.0` equals `-0.0`, and `NaN` equals nothing, itself included. Use
/// [`values::compare`] for the total order used when sorting.
#[derive(Clone, Debug)]
pub struct FirestoreValue {
    kind: ValueKind,
}

#[derive(Clone, Debug)]
pub enum ValueKind {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    Timestamp(Timestamp),
    String(String),
    Bytes(BytesValue),
    /// A slash-separated document path.
    Reference(String),
    GeoPoint(GeoPoint),
    Array(ArrayValue),
    Map(MapValue),
}

impl FirestoreValue {
    pub fn null() -> Self {
        Self {
            kind: ValueKind::Null,
        }
    }

    pub fn from_bool(value: bool) -> Self {
        Self {
            kind: ValueKind::Boolean(value),
        }
    }

    pub fn from_integer(value: i64) -> Self {
        Self {
            kind: ValueKind::Integer(value),
        }
    }

    pub fn from_double(value: f64) -> Self {
        Self {
            kind: ValueKind::Double(value),
        }
    }

    pub fn from_timestamp(value: Timestamp) -> Self {
        Self {
            kind: ValueKind::Timestamp(value),
        }
    }

    pub fn from_string(value: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::String(value.into()),
        }
    }

    pub fn from_bytes(value: impl Into<BytesValue>) -> Self {
        Self {
            kind: ValueKind::Bytes(value.into()),
        }
    }

    pub fn from_reference(path: impl Into<String>) -> Self {
        Self {
            kind: ValueKind::Reference(path.into()),
        }
    }

    pub fn from_geo_point(value: GeoPoint) -> Self {
        Self {
            kind: ValueKind::GeoPoint(value),
        }
    }

    pub fn from_array(values: Vec<FirestoreValue>) -> Self {
        Self {
            kind: ValueKind::Array(ArrayValue::new(values)),
        }
    }

    pub fn from_map(map: BTreeMap<String, FirestoreValue>) -> Self {
        Self {
            kind: ValueKind::Map(MapValue::new(map)),
        }
    }

    pub fn from_map_value(map: MapValue) -> Self {
        Self {
            kind: ValueKind::Map(map),
        }
    }

    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    pub fn into_kind(self) -> ValueKind {
        self.kind
    }

    pub fn is_null(&self) -> bool {
        matches!(self.kind, ValueKind::Null)
    }

    pub fn is_nan(&self) -> bool {
        matches!(self.kind, ValueKind::Double(value) if value.is_nan())
    }

    pub fn is_number(&self) -> bool {
        matches!(self.kind, ValueKind::Integer(_) | ValueKind::Double(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.kind {
            ValueKind::Boolean(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            ValueKind::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match &self.kind {
            ValueKind::Array(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapValue> {
        match &self.kind {
            ValueKind::Map(value) => Some(value),
            _ => None,
        }
    }
}

impl PartialEq for FirestoreValue {
    fn eq(&self, other: &Self) -> bool {
        values::equals(self, other)
    }
}

impl Hash for FirestoreValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        values::type_order(self).hash(state);
        match &self.kind {
            ValueKind::Null => {}
            ValueKind::Boolean(value) => value.hash(state),
            // Integral doubles hash like the equal integer; other doubles hash their bits.
            ValueKind::Integer(value) => value.hash(state),
            ValueKind::Double(value) => match values::integral_double(*value) {
                Some(integer) => integer.hash(state),
                None => value.to_bits().hash(state),
            },
            ValueKind::Timestamp(value) => value.hash(state),
            ValueKind::String(value) => value.hash(state),
            ValueKind::Bytes(value) => value.hash(state),
            ValueKind::Reference(value) => value.hash(state),
            ValueKind::GeoPoint(value) => {
                (value.latitude() + 0.0).to_bits().hash(state);
                (value.longitude() + 0.0).to_bits().hash(state);
            }
            ValueKind::Array(array) => {
                array.len().hash(state);
                array.values().iter().for_each(|value| value.hash(state));
            }
            ValueKind::Map(map) => {
                map.len().hash(state);
                for (key, value) in map.fields() {
                    key.hash(state);
                    value.hash(state);
                }
            }
        }
    }
}

impl From<bool> for FirestoreValue {
    fn from(value: bool) -> Self {
        Self::from_bool(value)
    }
}

impl From<i64> for FirestoreValue {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl From<i32> for FirestoreValue {
    fn from(value: i32) -> Self {
        Self::from_integer(i64::from(value))
    }
}

impl From<f64> for FirestoreValue {
    fn from(value: f64) -> Self {
        Self::from_double(value)
    }
}

impl From<&str> for FirestoreValue {
    fn from(value: &str) -> Self {
        Self::from_string(value)
    }
}

impl From<String> for FirestoreValue {
    fn from(value: String) -> Self {
        Self::from_string(value)
    }
}

impl From<Timestamp> for FirestoreValue {
    fn from(value: Timestamp) -> Self {
        Self::from_timestamp(value)
    }
}

impl From<BytesValue> for FirestoreValue {
    fn from(value: BytesValue) -> Self {
        Self::from_bytes(value)
    }
}

impl From<Vec<FirestoreValue>> for FirestoreValue {
    fn from(values: Vec<FirestoreValue>) -> Self {
        Self::from_array(values)
    }
}

impl From<MapValue> for FirestoreValue {
    fn from(value: MapValue) -> Self {
        Self::from_map_value(value)
    }
}
