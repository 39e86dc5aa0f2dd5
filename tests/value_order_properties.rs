use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use firestore_core::firestore::model::{GeoPoint, Timestamp};
use firestore_core::firestore::value::{values, BytesValue, FirestoreValue};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = FirestoreValue> {
    prop_oneof![
        Just(FirestoreValue::null()),
        any::<bool>().prop_map(FirestoreValue::from_bool),
        (-5i64..5).prop_map(FirestoreValue::from_integer),
        any::<i64>().prop_map(FirestoreValue::from_integer),
        prop_oneof![
            Just(f64::NAN),
            Just(f64::INFINITY),
            Just(f64::NEG_INFINITY),
            Just(-0.0),
            (-5i64..5).prop_map(|value| value as f64),
            any::<f64>(),
        ]
        .prop_map(FirestoreValue::from_double),
        (Timestamp::MIN_SECONDS..=Timestamp::MAX_SECONDS, 0..1_000_000_000i32)
            .prop_map(|(seconds, nanos)| FirestoreValue::from_timestamp(Timestamp::new(seconds, nanos))),
        "[a-c\u{e9}]{0,3}".prop_map(FirestoreValue::from_string),
        vec(any::<u8>(), 0..3).prop_map(|bytes| FirestoreValue::from_bytes(BytesValue::from(bytes))),
        "[ab]{1,2}/[ab]{1,2}(/[ab]{1,2}/[ab]{1,2})?".prop_map(FirestoreValue::from_reference),
        (-90.0..=90.0f64, -180.0..=180.0f64).prop_map(|(latitude, longitude)| {
            FirestoreValue::from_geo_point(GeoPoint::new(latitude, longitude).unwrap())
        }),
    ]
}

fn value() -> impl Strategy<Value = FirestoreValue> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            vec(inner.clone(), 0..4).prop_map(FirestoreValue::from_array),
            btree_map("[a-c]", inner, 0..3).prop_map(FirestoreValue::from_map),
        ]
    })
}

fn contains_nan(value: &FirestoreValue) -> bool {
    if value.is_nan() {
        return true;
    }
    if let Some(array) = value.as_array() {
        return array.values().iter().any(contains_nan);
    }
    if let Some(map) = value.as_map() {
        return map.fields().values().any(contains_nan);
    }
    false
}

fn hash_of(value: &FirestoreValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

proptest! {
    #[test]
    fn compare_is_reflexive(a in value()) {
        prop_assert_eq!(values::compare(&a, &a), Ordering::Equal);
    }

    #[test]
    fn compare_is_antisymmetric(a in value(), b in value()) {
        prop_assert_eq!(values::compare(&a, &b), values::compare(&b, &a).reverse());
    }

    #[test]
    fn compare_is_transitive(a in value(), b in value(), c in value()) {
        let mut sorted = [a, b, c];
        sorted.sort_by(values::compare);
        let [low, mid, high] = &sorted;
        prop_assert_ne!(values::compare(low, mid), Ordering::Greater);
        prop_assert_ne!(values::compare(mid, high), Ordering::Greater);
        prop_assert_ne!(values::compare(low, high), Ordering::Greater);
    }

    #[test]
    fn compare_agrees_with_equals(a in value(), b in value()) {
        let equal = values::equals(&a, &b);
        if equal {
            prop_assert_eq!(values::compare(&a, &b), Ordering::Equal);
            prop_assert_eq!(hash_of(&a), hash_of(&b));
        } else if !contains_nan(&a) && !contains_nan(&b) {
            prop_assert_ne!(values::compare(&a, &b), Ordering::Equal);
        }
    }

    #[test]
    fn type_order_dominates(a in scalar(), b in scalar()) {
        let by_type = values::type_order(&a).cmp(&values::type_order(&b));
        if by_type != Ordering::Equal {
            prop_assert_eq!(values::compare(&a, &b), by_type);
        }
    }

    #[test]
    fn integers_compare_exactly(a in any::<i64>(), b in any::<i64>()) {
        prop_assert_eq!(
            values::compare(&FirestoreValue::from_integer(a), &FirestoreValue::from_integer(b)),
            a.cmp(&b)
        );
    }
}

#[test]
fn numeric_family_equality() {
    let zero_int = FirestoreValue::from_integer(0);
    let zero = FirestoreValue::from_double(0.0);
    let negative_zero = FirestoreValue::from_double(-0.0);
    assert!(values::equals(&zero_int, &zero));
    assert!(values::equals(&zero, &negative_zero));
    assert!(values::equals(
        &FirestoreValue::from_integer(20),
        &FirestoreValue::from_double(20.0)
    ));
}

#[test]
fn nan_sorts_below_negative_infinity() {
    let nan = FirestoreValue::from_double(f64::NAN);
    let negative_infinity = FirestoreValue::from_double(f64::NEG_INFINITY);
    assert_eq!(values::compare(&nan, &negative_infinity), Ordering::Less);
    assert_eq!(
        values::compare(&nan, &FirestoreValue::from_integer(i64::MIN)),
        Ordering::Less
    );
    assert_eq!(values::compare(&nan, &nan), Ordering::Equal);
    assert!(!values::equals(&nan, &nan));
}

#[test]
fn large_integers_keep_precision_against_doubles() {
    let big = FirestoreValue::from_integer(i64::MAX);
    let rounded = FirestoreValue::from_double(i64::MAX as f64);
    assert_eq!(values::compare(&big, &rounded), Ordering::Less);
    assert!(!values::equals(&big, &rounded));
}
