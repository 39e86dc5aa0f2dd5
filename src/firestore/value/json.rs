use serde_json::Value as JsonValue;

use crate::firestore::value::{FirestoreValue, MapValue};

impl FirestoreValue {
    /// Converts plain JSON into a value tree.
    ///
    /// Numbers that fit in an `i64` become integers; every other number becomes a double.
    /// Timestamps, bytes, references and geo points have no JSON form and must be built directly.
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => FirestoreValue::null(),
            JsonValue::Bool(value) => FirestoreValue::from_bool(*value),
            JsonValue::Number(number) => match number.as_i64() {
                Some(integer) => FirestoreValue::from_integer(integer),
                None => FirestoreValue::from_double(number.as_f64().unwrap_or(f64::NAN)),
            },
            JsonValue::String(value) => FirestoreValue::from_string(value.as_str()),
            JsonValue::Array(values) => {
                FirestoreValue::from_array(values.iter().map(FirestoreValue::from_json).collect())
            }
            JsonValue::Object(object) => FirestoreValue::from_map_value(map_from_json(object)),
        }
    }
}

/// Builds document data from a JSON object.
pub fn map_from_json(object: &serde_json::Map<String, JsonValue>) -> MapValue {
    object
        .iter()
        .map(|(key, value)| (key.clone(), FirestoreValue::from_json(value)))
        .collect()
}
