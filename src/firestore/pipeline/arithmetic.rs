use crate::firestore::pipeline::evaluate::{fixed_operands, try_eval, type_error, EvaluateResult};
use crate::firestore::value::{FirestoreValue, ValueKind};

#[derive(Clone, Copy, Debug)]
enum Number {
    Integer(i64),
    Double(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Integer(value) => value as f64,
            Number::Double(value) => value,
        }
    }

    fn into_result(self) -> EvaluateResult {
        match self {
            Number::Integer(value) => EvaluateResult::Value(FirestoreValue::from_integer(value)),
            Number::Double(value) => EvaluateResult::Value(FirestoreValue::from_double(value)),
        }
    }
}

fn number(name: &str, value: &FirestoreValue) -> Result<Number, EvaluateResult> {
    match value.kind() {
        ValueKind::Integer(value) => Ok(Number::Integer(*value)),
        ValueKind::Double(value) => Ok(Number::Double(*value)),
        _ => Err(type_error(name, "a number", value)),
    }
}

/// Integer-integer stays integer (errors on overflow); any double operand makes it a double op.
fn binary(
    name: &str,
    args: &[EvaluateResult],
    integer_op: impl Fn(i64, i64) -> Result<i64, &'static str>,
    double_op: impl Fn(f64, f64) -> f64,
) -> EvaluateResult {
    let values = try_eval!(fixed_operands(name, args, 2));
    let left = try_eval!(number(name, values[0]));
    let right = try_eval!(number(name, values[1]));
    match (left, right) {
        (Number::Integer(left), Number::Integer(right)) => match integer_op(left, right) {
            Ok(result) => Number::Integer(result).into_result(),
            Err(reason) => EvaluateResult::error(format!("{name}(): {reason}")),
        },
        (left, right) => Number::Double(double_op(left.as_f64(), right.as_f64())).into_result(),
    }
}

pub(crate) fn add(args: &[EvaluateResult]) -> EvaluateResult {
    binary(
        "add",
        args,
        |l, r| l.checked_add(r).ok_or("integer overflow"),
        |l, r| l + r,
    )
}

pub(crate) fn subtract(args: &[EvaluateResult]) -> EvaluateResult {
    binary(
        "subtract",
        args,
        |l, r| l.checked_sub(r).ok_or("integer overflow"),
        |l, r| l - r,
    )
}

pub(crate) fn multiply(args: &[EvaluateResult]) -> EvaluateResult {
    binary(
        "multiply",
        args,
        |l, r| l.checked_mul(r).ok_or("integer overflow"),
        |l, r| l * r,
    )
}

pub(crate) fn divide(args: &[EvaluateResult]) -> EvaluateResult {
    binary(
        "divide",
        args,
        |l, r| {
            if r == 0 {
                return Err("division by zero");
            }
            l.checked_div(r).ok_or("integer overflow")
        },
        |l, r| l / r,
    )
}

pub(crate) fn modulo(args: &[EvaluateResult]) -> EvaluateResult {
    binary(
        "mod",
        args,
        |l, r| {
            if r == 0 {
                return Err("division by zero");
            }
            Ok(l.wrapping_rem(r))
        },
        |l, r| l % r,
    )
}

/// Always a double, even for integer operands.
pub(crate) fn pow(args: &[EvaluateResult]) -> EvaluateResult {
    let values = try_eval!(fixed_operands("pow", args, 2));
    let base = try_eval!(number("pow", values[0]));
    let exponent = try_eval!(number("pow", values[1]));
    Number::Double(base.as_f64().powf(exponent.as_f64())).into_result()
}

fn unary(
    name: &str,
    args: &[EvaluateResult],
    op: impl Fn(Number) -> Result<Number, &'static str>,
) -> EvaluateResult {
    let values = try_eval!(fixed_operands(name, args, 1));
    let operand = try_eval!(number(name, values[0]));
    match op(operand) {
        Ok(result) => result.into_result(),
        Err(reason) => EvaluateResult::error(format!("{name}(): {reason}")),
    }
}

pub(crate) fn abs(args: &[EvaluateResult]) -> EvaluateResult {
    unary("abs", args, |operand| match operand {
        Number::Integer(value) => value
            .checked_abs()
            .map(Number::Integer)
            .ok_or("integer overflow"),
        Number::Double(value) => Ok(Number::Double(value.abs())),
    })
}

/// Shared domain rule of `ln` and `log10`: negative input (including -Infinity) is an error,
/// zero maps to -Infinity.
fn logarithm(name: &str, args: &[EvaluateResult], log: fn(f64) -> f64) -> EvaluateResult {
    unary(name, args, |operand| {
        let value = operand.as_f64();
        if value < 0.0 {
            return Err("operand must not be negative");
        }
        if value == 0.0 {
            return Ok(Number::Double(f64::NEG_INFINITY));
        }
        Ok(Number::Double(log(value)))
    })
}

pub(crate) fn ln(args: &[EvaluateResult]) -> EvaluateResult {
    logarithm("ln", args, f64::ln)
}

pub(crate) fn log10(args: &[EvaluateResult]) -> EvaluateResult {
    logarithm("log10", args, f64::log10)
}

pub(crate) fn exp(args: &[EvaluateResult]) -> EvaluateResult {
    unary("exp", args, |operand| Ok(Number::Double(operand.as_f64().exp())))
}

pub(crate) fn sqrt(args: &[EvaluateResult]) -> EvaluateResult {
    unary("sqrt", args, |operand| {
        let value = operand.as_f64();
        if value < 0.0 {
            return Err("operand must not be negative");
        }
        Ok(Number::Double(value.sqrt()))
    })
}

fn rounding(name: &str, args: &[EvaluateResult], round: fn(f64) -> f64) -> EvaluateResult {
    unary(name, args, |operand| match operand {
        Number::Integer(_) => Ok(operand),
        Number::Double(value) => Ok(Number::Double(round(value))),
    })
}

pub(crate) fn ceil(args: &[EvaluateResult]) -> EvaluateResult {
    rounding("ceil", args, f64::ceil)
}

pub(crate) fn floor(args: &[EvaluateResult]) -> EvaluateResult {
    rounding("floor", args, f64::floor)
}

/// Halves round away from zero.
pub(crate) fn round(args: &[EvaluateResult]) -> EvaluateResult {
    rounding("round", args, f64::round)
}
