//! Equality, ordering and canonical ids for [`FirestoreValue`].
//!
//! Values of different kinds sort by their type order:
//! `Null < Boolean < Number < Timestamp < String < Bytes < Reference < GeoPoint < Array < Map`.
//! Integers and doubles share the number slot and compare by mathematical value; integer pairs
//! compare exactly, mixed pairs compare without rounding the integer. `NaN` sorts below every other
//! number (including negative infinity) and compares equal to itself for sorting purposes only;
//! [`equals`] never considers a `NaN` equal to anything.

use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::firestore::value::{ArrayValue, FirestoreValue, MapValue, ValueKind};

pub const TYPE_ORDER_NULL: u8 = 0;
pub const TYPE_ORDER_BOOLEAN: u8 = 1;
pub const TYPE_ORDER_NUMBER: u8 = 2;
pub const TYPE_ORDER_TIMESTAMP: u8 = 3;
pub const TYPE_ORDER_STRING: u8 = 4;
pub const TYPE_ORDER_BYTES: u8 = 5;
pub const TYPE_ORDER_REFERENCE: u8 = 6;
pub const TYPE_ORDER_GEO_POINT: u8 = 7;
pub const TYPE_ORDER_ARRAY: u8 = 8;
pub const TYPE_ORDER_MAP: u8 = 9;

// 2^63 as a double; every double at or above it exceeds i64::MAX.
const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

pub fn type_order(value: &FirestoreValue) -> u8 {
    match value.kind() {
        ValueKind::Null => TYPE_ORDER_NULL,
        ValueKind::Boolean(_) => TYPE_ORDER_BOOLEAN,
        ValueKind::Integer(_) | ValueKind::Double(_) => TYPE_ORDER_NUMBER,
        ValueKind::Timestamp(_) => TYPE_ORDER_TIMESTAMP,
        ValueKind::String(_) => TYPE_ORDER_STRING,
        ValueKind::Bytes(_) => TYPE_ORDER_BYTES,
        ValueKind::Reference(_) => TYPE_ORDER_REFERENCE,
        ValueKind::GeoPoint(_) => TYPE_ORDER_GEO_POINT,
        ValueKind::Array(_) => TYPE_ORDER_ARRAY,
        ValueKind::Map(_) => TYPE_ORDER_MAP,
    }
}

/// Value equality: numeric across integer/double, never true for `NaN`, structural for
/// arrays and maps.
pub fn equals(left: &FirestoreValue, right: &FirestoreValue) -> bool {
    match (left.kind(), right.kind()) {
        (ValueKind::Null, ValueKind::Null) => true,
        (ValueKind::Boolean(a), ValueKind::Boolean(b)) => a == b,
        (ValueKind::Integer(_) | ValueKind::Double(_), ValueKind::Integer(_) | ValueKind::Double(_)) => {
            !left.is_nan() && !right.is_nan() && compare_numbers(left, right) == Ordering::Equal
        }
        (ValueKind::Timestamp(a), ValueKind::Timestamp(b)) => a == b,
        (ValueKind::String(a), ValueKind::String(b)) => a == b,
        (ValueKind::Bytes(a), ValueKind::Bytes(b)) => a == b,
        (ValueKind::Reference(a), ValueKind::Reference(b)) => a == b,
        (ValueKind::GeoPoint(a), ValueKind::GeoPoint(b)) => a == b,
        (ValueKind::Array(a), ValueKind::Array(b)) => {
            a.len() == b.len()
                && a.values()
                    .iter()
                    .zip(b.values())
                    .all(|(l, r)| equals(l, r))
        }
        (ValueKind::Map(a), ValueKind::Map(b)) => {
            a.len() == b.len()
                && a.fields()
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| equals(value, other)))
        }
        _ => false,
    }
}

/// Whether `array` holds an element equal to `needle`.
pub fn contains(array: &ArrayValue, needle: &FirestoreValue) -> bool {
    array.contains(needle)
}

/// The total order used for sorting query results.
pub fn compare(left: &FirestoreValue, right: &FirestoreValue) -> Ordering {
    let left_type = type_order(left);
    let right_type = type_order(right);
    if left_type != right_type {
        return left_type.cmp(&right_type);
    }

    match (left.kind(), right.kind()) {
        (ValueKind::Boolean(a), ValueKind::Boolean(b)) => a.cmp(b),
        (ValueKind::Timestamp(a), ValueKind::Timestamp(b)) => a.cmp(b),
        // Rust strings order by UTF-8 bytes, which is the backend's string order.
        (ValueKind::String(a), ValueKind::String(b)) => a.cmp(b),
        (ValueKind::Bytes(a), ValueKind::Bytes(b)) => a.cmp(b),
        (ValueKind::Reference(a), ValueKind::Reference(b)) => compare_references(a, b),
        (ValueKind::GeoPoint(a), ValueKind::GeoPoint(b)) => a.compare(b),
        (ValueKind::Array(a), ValueKind::Array(b)) => compare_arrays(a, b),
        (ValueKind::Map(a), ValueKind::Map(b)) => compare_maps(a, b),
        _ if left_type == TYPE_ORDER_NUMBER => compare_numbers(left, right),
        _ => Ordering::Equal,
    }
}

fn compare_numbers(left: &FirestoreValue, right: &FirestoreValue) -> Ordering {
    match (left.kind(), right.kind()) {
        (ValueKind::Integer(a), ValueKind::Integer(b)) => a.cmp(b),
        (ValueKind::Double(a), ValueKind::Double(b)) => compare_doubles(*a, *b),
        (ValueKind::Double(a), ValueKind::Integer(b)) => compare_mixed(*a, *b),
        (ValueKind::Integer(a), ValueKind::Double(b)) => compare_mixed(*b, *a).reverse(),
        _ => Ordering::Equal,
    }
}

/// Orders doubles with `NaN` first and `-0.0 == 0.0`.
pub fn compare_doubles(left: f64, right: f64) -> Ordering {
    match left.partial_cmp(&right) {
        Some(ordering) => ordering,
        None => match (left.is_nan(), right.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            _ => Ordering::Greater,
        },
    }
}

/// Compares a double against an integer without losing integer precision.
pub fn compare_mixed(double: f64, integer: i64) -> Ordering {
    if double.is_nan() {
        return Ordering::Less;
    }
    // i64::MIN is exactly representable, so anything strictly below it is out of range.
    if double < i64::MIN as f64 {
        return Ordering::Less;
    }
    if double >= TWO_POW_63 {
        return Ordering::Greater;
    }
    let truncated = double as i64;
    match truncated.cmp(&integer) {
        Ordering::Equal => compare_doubles(double - truncated as f64, 0.0),
        ordering => ordering,
    }
}

/// Returns the integer a double represents exactly, if any.
pub(crate) fn integral_double(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value >= i64::MIN as f64 && value < TWO_POW_63 {
        Some(value as i64)
    } else {
        None
    }
}

fn compare_references(left: &str, right: &str) -> Ordering {
    let mut left_segments = left.split('/');
    let mut right_segments = right.split('/');
    loop {
        match (left_segments.next(), right_segments.next()) {
            (Some(l), Some(r)) => match l.cmp(r) {
                Ordering::Equal => continue,
                ordering => return ordering,
            },
            (Some(_), None) => return Ordering::Greater,
            (None, Some(_)) => return Ordering::Less,
            (None, None) => return Ordering::Equal,
        }
    }
}

fn compare_arrays(left: &ArrayValue, right: &ArrayValue) -> Ordering {
    for (l, r) in left.values().iter().zip(right.values()) {
        match compare(l, r) {
            Ordering::Equal => continue,
            ordering => return ordering,
        }
    }
    left.len().cmp(&right.len())
}

fn compare_maps(left: &MapValue, right: &MapValue) -> Ordering {
    for ((left_key, left_value), (right_key, right_value)) in
        left.fields().iter().zip(right.fields())
    {
        let ordering = left_key
            .cmp(right_key)
            .then_with(|| compare(left_value, right_value));
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    left.len().cmp(&right.len())
}

/// A deterministic textual form, independent of map insertion order.
pub fn canonical_id(value: &FirestoreValue) -> String {
    let mut out = String::new();
    canonify(&mut out, value);
    out
}

fn canonify(out: &mut String, value: &FirestoreValue) {
    match value.kind() {
        ValueKind::Null => out.push_str("null"),
        ValueKind::Boolean(v) => {
            let _ = write!(out, "{v}");
        }
        ValueKind::Integer(v) => {
            let _ = write!(out, "{v}");
        }
        ValueKind::Double(v) => {
            let _ = write!(out, "{v:?}");
        }
        ValueKind::Timestamp(ts) => {
            let _ = write!(out, "time({},{})", ts.seconds, ts.nanos);
        }
        ValueKind::String(v) => out.push_str(v),
        ValueKind::Bytes(v) => {
            let _ = write!(out, "bytes({})", v.to_base64());
        }
        ValueKind::Reference(v) => out.push_str(v),
        ValueKind::GeoPoint(point) => {
            let _ = write!(out, "geo({:?},{:?})", point.latitude(), point.longitude());
        }
        ValueKind::Array(array) => {
            out.push('[');
            for (index, element) in array.values().iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                canonify(out, element);
            }
            out.push(']');
        }
        ValueKind::Map(map) => {
            out.push('{');
            for (index, (key, element)) in map.fields().iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                out.push_str(key);
                out.push(':');
                canonify(out, element);
            }
            out.push('}');
        }
    }
}
