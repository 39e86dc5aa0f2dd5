use crate::firestore::model::Timestamp;
use crate::firestore::pipeline::evaluate::{fixed_operands, try_eval, type_error, EvaluateResult};
use crate::firestore::value::{FirestoreValue, ValueKind};

const NANOS_PER_MICRO: i128 = 1_000;
const NANOS_PER_MILLI: i128 = 1_000_000;
const NANOS_PER_SECOND: i128 = 1_000_000_000;

fn timestamp_result(name: &str, nanos: i128) -> EvaluateResult {
    match Timestamp::from_nanos(nanos) {
        Ok(timestamp) => EvaluateResult::Value(FirestoreValue::from_timestamp(timestamp)),
        Err(error) => EvaluateResult::error(format!("{name}(): {}", error.message())),
    }
}

/// Integer count of `unit_nanos` since the epoch to a range-checked timestamp.
fn from_unix(name: &str, args: &[EvaluateResult], unit_nanos: i128) -> EvaluateResult {
    let values = try_eval!(fixed_operands(name, args, 1));
    match values[0].kind() {
        ValueKind::Integer(count) => timestamp_result(name, i128::from(*count) * unit_nanos),
        _ => type_error(name, "an integer", values[0]),
    }
}

pub(crate) fn unix_micros_to_timestamp(args: &[EvaluateResult]) -> EvaluateResult {
    from_unix("unix_micros_to_timestamp", args, NANOS_PER_MICRO)
}

pub(crate) fn unix_millis_to_timestamp(args: &[EvaluateResult]) -> EvaluateResult {
    from_unix("unix_millis_to_timestamp", args, NANOS_PER_MILLI)
}

pub(crate) fn unix_seconds_to_timestamp(args: &[EvaluateResult]) -> EvaluateResult {
    from_unix("unix_seconds_to_timestamp", args, NANOS_PER_SECOND)
}

fn timestamp<'v>(name: &str, value: &'v FirestoreValue) -> Result<&'v Timestamp, EvaluateResult> {
    match value.kind() {
        ValueKind::Timestamp(timestamp) => Ok(timestamp),
        _ => Err(type_error(name, "a timestamp", value)),
    }
}

/// Whole `unit_nanos` since the epoch, rounding toward negative infinity.
fn to_unix(name: &str, args: &[EvaluateResult], unit_nanos: i128) -> EvaluateResult {
    let values = try_eval!(fixed_operands(name, args, 1));
    let timestamp = try_eval!(timestamp(name, values[0]));
    let count = timestamp.to_nanos().div_euclid(unit_nanos);
    match i64::try_from(count) {
        Ok(count) => EvaluateResult::Value(FirestoreValue::from_integer(count)),
        Err(_) => EvaluateResult::error(format!("{name}(): result overflows a 64-bit integer")),
    }
}

pub(crate) fn timestamp_to_unix_micros(args: &[EvaluateResult]) -> EvaluateResult {
    to_unix("timestamp_to_unix_micros", args, NANOS_PER_MICRO)
}

pub(crate) fn timestamp_to_unix_millis(args: &[EvaluateResult]) -> EvaluateResult {
    to_unix("timestamp_to_unix_millis", args, NANOS_PER_MILLI)
}

pub(crate) fn timestamp_to_unix_seconds(args: &[EvaluateResult]) -> EvaluateResult {
    to_unix("timestamp_to_unix_seconds", args, NANOS_PER_SECOND)
}

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "microsecond" => Some(NANOS_PER_MICRO),
        "millisecond" => Some(NANOS_PER_MILLI),
        "second" => Some(NANOS_PER_SECOND),
        "minute" => Some(60 * NANOS_PER_SECOND),
        "hour" => Some(3_600 * NANOS_PER_SECOND),
        "day" => Some(86_400 * NANOS_PER_SECOND),
        _ => None,
    }
}

/// `(timestamp, unit, amount)`; `sign` is 1 for add and -1 for sub.
fn shift(name: &str, args: &[EvaluateResult], sign: i128) -> EvaluateResult {
    let values = try_eval!(fixed_operands(name, args, 3));
    let start = try_eval!(timestamp(name, values[0]));
    let Some(unit) = values[1].as_str() else {
        return type_error(name, "a string unit", values[1]);
    };
    let Some(step) = unit_nanos(unit) else {
        return EvaluateResult::error(format!("{name}(): unknown time unit '{unit}'"));
    };
    let amount = match values[2].kind() {
        ValueKind::Integer(amount) => i128::from(*amount),
        _ => return type_error(name, "an integer amount", values[2]),
    };
    timestamp_result(name, start.to_nanos() + sign * amount * step)
}

pub(crate) fn timestamp_add(args: &[EvaluateResult]) -> EvaluateResult {
    shift("timestamp_add", args, 1)
}

pub(crate) fn timestamp_sub(args: &[EvaluateResult]) -> EvaluateResult {
    shift("timestamp_sub", args, -1)
}
