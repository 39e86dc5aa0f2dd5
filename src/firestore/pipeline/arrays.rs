use crate::firestore::pipeline::evaluate::{fixed_operands, try_eval, type_error, EvaluateResult};
use crate::firestore::value::{values, ArrayValue, FirestoreValue};

fn array<'v>(name: &str, value: &'v FirestoreValue) -> Result<&'v ArrayValue, EvaluateResult> {
    value
        .as_array()
        .ok_or_else(|| type_error(name, "an array", value))
}

pub(crate) fn array_contains(args: &[EvaluateResult]) -> EvaluateResult {
    let operands = try_eval!(fixed_operands("array_contains", args, 2));
    let haystack = try_eval!(array("array_contains", operands[0]));
    EvaluateResult::boolean(values::contains(haystack, operands[1]))
}

fn array_set_test(
    name: &str,
    args: &[EvaluateResult],
    test: impl Fn(&ArrayValue, &ArrayValue) -> bool,
) -> EvaluateResult {
    let operands = try_eval!(fixed_operands(name, args, 2));
    let haystack = try_eval!(array(name, operands[0]));
    let needles = try_eval!(array(name, operands[1]));
    EvaluateResult::boolean(test(haystack, needles))
}

pub(crate) fn array_contains_any(args: &[EvaluateResult]) -> EvaluateResult {
    array_set_test("array_contains_any", args, |haystack, needles| {
        needles
            .values()
            .iter()
            .any(|needle| values::contains(haystack, needle))
    })
}

/// Vacuously true for an empty list of needles.
pub(crate) fn array_contains_all(args: &[EvaluateResult]) -> EvaluateResult {
    array_set_test("array_contains_all", args, |haystack, needles| {
        needles
            .values()
            .iter()
            .all(|needle| values::contains(haystack, needle))
    })
}

pub(crate) fn array_length(args: &[EvaluateResult]) -> EvaluateResult {
    let operands = try_eval!(fixed_operands("array_length", args, 1));
    let items = try_eval!(array("array_length", operands[0]));
    EvaluateResult::Value(FirestoreValue::from_integer(items.len() as i64))
}

/// A missing key is unset, like a missing document field.
pub(crate) fn map_get(args: &[EvaluateResult]) -> EvaluateResult {
    let operands = try_eval!(fixed_operands("map_get", args, 2));
    let Some(map) = operands[0].as_map() else {
        return type_error("map_get", "a map", operands[0]);
    };
    let Some(key) = operands[1].as_str() else {
        return type_error("map_get", "a string key", operands[1]);
    };
    match map.get(key) {
        Some(value) => EvaluateResult::from_value(value.clone()),
        None => EvaluateResult::Unset,
    }
}
