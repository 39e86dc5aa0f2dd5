use std::cmp::Ordering;

use crate::firestore::pipeline::evaluate::{
    check_arity, check_min_arity, first_error, operands, try_eval, type_error, EvaluateResult,
};
use crate::firestore::value::{values, FirestoreValue};

fn has_nan_operand(args: &[EvaluateResult]) -> bool {
    args.iter()
        .any(|arg| arg.value().is_some_and(FirestoreValue::is_nan))
}

/// Errors win, then a NaN operand decides the outcome, then nulls and unset fields are resolved.
fn comparison_operands<'r>(
    name: &str,
    args: &'r [EvaluateResult],
    nan_result: bool,
) -> Result<Vec<&'r FirestoreValue>, EvaluateResult> {
    check_arity(name, args, 2)?;
    if let Some(error) = first_error(args) {
        return Err(error);
    }
    if has_nan_operand(args) {
        return Err(EvaluateResult::boolean(nan_result));
    }
    operands(name, args)
}

pub(crate) fn eq(args: &[EvaluateResult]) -> EvaluateResult {
    let values = try_eval!(comparison_operands("eq", args, false));
    EvaluateResult::boolean(values::equals(values[0], values[1]))
}

pub(crate) fn neq(args: &[EvaluateResult]) -> EvaluateResult {
    let values = try_eval!(comparison_operands("neq", args, true));
    EvaluateResult::boolean(!values::equals(values[0], values[1]))
}

/// Values of different types are never ordered relative to each other.
fn relational(name: &str, args: &[EvaluateResult], accept: fn(Ordering) -> bool) -> EvaluateResult {
    let values = try_eval!(comparison_operands(name, args, false));
    let (left, right) = (values[0], values[1]);
    if values::type_order(left) != values::type_order(right) {
        return EvaluateResult::boolean(false);
    }
    EvaluateResult::boolean(accept(values::compare(left, right)))
}

pub(crate) fn lt(args: &[EvaluateResult]) -> EvaluateResult {
    relational("lt", args, Ordering::is_lt)
}

pub(crate) fn lte(args: &[EvaluateResult]) -> EvaluateResult {
    relational("lte", args, Ordering::is_le)
}

pub(crate) fn gt(args: &[EvaluateResult]) -> EvaluateResult {
    relational("gt", args, Ordering::is_gt)
}

pub(crate) fn gte(args: &[EvaluateResult]) -> EvaluateResult {
    relational("gte", args, Ordering::is_ge)
}

/// `Some(found)` when decided, `None` when not found but the list holds a null.
fn membership(
    name: &str,
    args: &[EvaluateResult],
    nan_result: bool,
) -> Result<Option<bool>, EvaluateResult> {
    let values = comparison_operands(name, args, nan_result)?;
    let Some(candidates) = values[1].as_array() else {
        return Err(type_error(name, "an array", values[1]));
    };
    if candidates.contains(values[0]) {
        Ok(Some(true))
    } else if candidates.values().iter().any(FirestoreValue::is_null) {
        Ok(None)
    } else {
        Ok(Some(false))
    }
}

pub(crate) fn eq_any(args: &[EvaluateResult]) -> EvaluateResult {
    match try_eval!(membership("eq_any", args, false)) {
        Some(found) => EvaluateResult::boolean(found),
        None => EvaluateResult::Null,
    }
}

pub(crate) fn not_eq_any(args: &[EvaluateResult]) -> EvaluateResult {
    match try_eval!(membership("not_eq_any", args, true)) {
        Some(found) => EvaluateResult::boolean(!found),
        None => EvaluateResult::Null,
    }
}

/// Nulls and unset fields are skipped; the result is null when nothing is left.
fn extremum(name: &str, args: &[EvaluateResult], keep: Ordering) -> EvaluateResult {
    try_eval!(check_min_arity(name, args, 1));
    if let Some(error) = first_error(args) {
        return error;
    }
    args.iter()
        .filter_map(EvaluateResult::value)
        .fold(None, |best: Option<&FirestoreValue>, candidate| match best {
            Some(best) if values::compare(candidate, best) != keep => Some(best),
            _ => Some(candidate),
        })
        .map_or(EvaluateResult::Null, |best| {
            EvaluateResult::Value(best.clone())
        })
}

pub(crate) fn logical_maximum(args: &[EvaluateResult]) -> EvaluateResult {
    extremum("logical_maximum", args, Ordering::Greater)
}

pub(crate) fn logical_minimum(args: &[EvaluateResult]) -> EvaluateResult {
    extremum("logical_minimum", args, Ordering::Less)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(value: impl Into<FirestoreValue>) -> EvaluateResult {
        EvaluateResult::Value(value.into())
    }

    fn nan() -> EvaluateResult {
        value(f64::NAN)
    }

    fn array(values: Vec<FirestoreValue>) -> EvaluateResult {
        value(FirestoreValue::from_array(values))
    }

    #[test]
    fn numeric_equality_across_types() {
        assert_eq!(eq(&[value(0), value(0.0)]).as_bool(), Some(true));
        assert_eq!(eq(&[value(0.0), value(-0.0)]).as_bool(), Some(true));
        assert_eq!(eq(&[value(20), value(20.0)]).as_bool(), Some(true));
        assert_eq!(neq(&[value(20), value(20.0)]).as_bool(), Some(false));
        assert_eq!(lt(&[value(1), value(1.5)]).as_bool(), Some(true));
        assert_eq!(gte(&[value(i64::MAX), value(9.223372036854776e18)]).as_bool(), Some(false));
    }

    #[test]
    fn nan_comparisons_are_false_except_neq() {
        let operands = [
            value(1),
            value(f64::INFINITY),
            value("a"),
            nan(),
            EvaluateResult::Null,
            EvaluateResult::Unset,
        ];
        for other in operands {
            for pair in [[other.clone(), nan()], [nan(), other.clone()]] {
                for function in [eq, lt, lte, gt, gte] {
                    assert_eq!(function(&pair).as_bool(), Some(false), "{pair:?}");
                }
                assert_eq!(neq(&pair).as_bool(), Some(true), "{pair:?}");
            }
        }
        assert!(eq(&[nan(), EvaluateResult::error("bad")]).is_error());
    }

    #[test]
    fn mixed_types_are_unordered() {
        assert_eq!(lt(&[value(1), value("a")]).as_bool(), Some(false));
        assert_eq!(gt(&[value(1), value("a")]).as_bool(), Some(false));
        assert_eq!(eq(&[value(1), value("1")]).as_bool(), Some(false));
        assert_eq!(neq(&[value(1), value("1")]).as_bool(), Some(true));
        assert_eq!(lte(&[value("a"), value("a")]).as_bool(), Some(true));
    }

    #[test]
    fn absent_fields_are_neither_equal_nor_unequal() {
        assert!(eq(&[EvaluateResult::Unset, value(20)]).is_error());
        assert!(neq(&[EvaluateResult::Unset, value(20)]).is_error());
        assert!(eq(&[EvaluateResult::Null, value(20)]).is_null());
        assert!(lt(&[EvaluateResult::Null, EvaluateResult::Unset]).is_null());
    }

    #[test]
    fn membership_checks() {
        let list = array(vec![1.into(), "b".into()]);
        assert_eq!(eq_any(&[value(1.0), list.clone()]).as_bool(), Some(true));
        assert_eq!(eq_any(&[value("c"), list.clone()]).as_bool(), Some(false));
        assert_eq!(not_eq_any(&[value("c"), list.clone()]).as_bool(), Some(true));
        assert_eq!(eq_any(&[nan(), array(vec![f64::NAN.into()])]).as_bool(), Some(false));
        assert_eq!(not_eq_any(&[nan(), list]).as_bool(), Some(true));
        assert!(eq_any(&[value(3), array(vec![FirestoreValue::null()])]).is_null());
        assert!(eq_any(&[value(3), value(3)]).is_error());
    }

    #[test]
    fn extremes_skip_nulls() {
        let max = logical_maximum(&[value(1), EvaluateResult::Null, value("a"), EvaluateResult::Unset]);
        assert_eq!(max, value("a"));
        let min = logical_minimum(&[value(2), value(1.5), value(true)]);
        assert_eq!(min, value(true));
        assert!(logical_maximum(&[EvaluateResult::Null, EvaluateResult::Unset]).is_null());
        assert!(logical_minimum(&[value(1), EvaluateResult::error("bad")]).is_error());
        assert_eq!(logical_maximum(&[nan(), value(f64::NEG_INFINITY)]), value(f64::NEG_INFINITY));
    }
}
