use crate::firestore::pipeline::evaluate::{
    check_arity, check_min_arity, fixed_operands, operands, try_eval, type_error, EvaluateResult,
};
use crate::firestore::value::FirestoreValue;

/// `and`/`or`: the decisive boolean wins over errors and nulls; errors win over nulls.
fn junction(name: &str, args: &[EvaluateResult], decisive: bool) -> EvaluateResult {
    try_eval!(check_min_arity(name, args, 1));
    let mut error = None;
    let mut saw_null = false;
    for arg in args {
        match arg {
            EvaluateResult::Value(value) => match value.as_bool() {
                Some(flag) if flag == decisive => return EvaluateResult::boolean(decisive),
                Some(_) => {}
                None => {
                    error.get_or_insert_with(|| type_error(name, "booleans", value));
                }
            },
            EvaluateResult::Null => saw_null = true,
            EvaluateResult::Unset => {
                error.get_or_insert_with(|| {
                    EvaluateResult::error(format!("{name}() received an absent field"))
                });
            }
            EvaluateResult::Error(_) => {
                error.get_or_insert_with(|| arg.clone());
            }
        }
    }
    match error {
        Some(error) => error,
        None if saw_null => EvaluateResult::Null,
        None => EvaluateResult::boolean(!decisive),
    }
}

pub(crate) fn and(args: &[EvaluateResult]) -> EvaluateResult {
    junction("and", args, false)
}

pub(crate) fn or(args: &[EvaluateResult]) -> EvaluateResult {
    junction("or", args, true)
}

fn booleans(name: &str, values: &[&FirestoreValue]) -> Result<Vec<bool>, EvaluateResult> {
    values
        .iter()
        .map(|value| value.as_bool().ok_or_else(|| type_error(name, "booleans", value)))
        .collect()
}

pub(crate) fn xor(args: &[EvaluateResult]) -> EvaluateResult {
    try_eval!(check_min_arity("xor", args, 1));
    let values = try_eval!(operands("xor", args));
    let flags = try_eval!(booleans("xor", &values));
    EvaluateResult::boolean(flags.into_iter().fold(false, |acc, flag| acc ^ flag))
}

pub(crate) fn not(args: &[EvaluateResult]) -> EvaluateResult {
    let values = try_eval!(fixed_operands("not", args, 1));
    let flags = try_eval!(booleans("not", &values));
    EvaluateResult::boolean(!flags[0])
}

/// A null condition selects the else branch.
pub(crate) fn cond(args: &[EvaluateResult]) -> EvaluateResult {
    try_eval!(check_arity("cond", args, 3));
    match &args[0] {
        EvaluateResult::Value(value) => match value.as_bool() {
            Some(true) => args[1].clone(),
            Some(false) => args[2].clone(),
            None => type_error("cond", "a boolean condition", value),
        },
        EvaluateResult::Null => args[2].clone(),
        EvaluateResult::Unset => EvaluateResult::error("cond() received an absent condition"),
        EvaluateResult::Error(_) => args[0].clone(),
    }
}

/// Only an unset field is missing; a stored null exists.
pub(crate) fn exists(args: &[EvaluateResult]) -> EvaluateResult {
    try_eval!(check_arity("exists", args, 1));
    match &args[0] {
        EvaluateResult::Error(_) => args[0].clone(),
        EvaluateResult::Unset => EvaluateResult::boolean(false),
        EvaluateResult::Value(_) | EvaluateResult::Null => EvaluateResult::boolean(true),
    }
}

pub(crate) fn is_nan(args: &[EvaluateResult]) -> EvaluateResult {
    let values = try_eval!(fixed_operands("is_nan", args, 1));
    if !values[0].is_number() {
        return type_error("is_nan", "a number", values[0]);
    }
    EvaluateResult::boolean(values[0].is_nan())
}

pub(crate) fn is_null(args: &[EvaluateResult]) -> EvaluateResult {
    try_eval!(check_arity("is_null", args, 1));
    match &args[0] {
        EvaluateResult::Null => EvaluateResult::boolean(true),
        EvaluateResult::Value(_) => EvaluateResult::boolean(false),
        EvaluateResult::Unset => EvaluateResult::error("is_null() received an absent field"),
        EvaluateResult::Error(_) => args[0].clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t() -> EvaluateResult {
        EvaluateResult::boolean(true)
    }

    fn f() -> EvaluateResult {
        EvaluateResult::boolean(false)
    }

    fn err() -> EvaluateResult {
        EvaluateResult::error("bad")
    }

    #[test]
    fn and_truth_table() {
        assert_eq!(and(&[t(), t()]), t());
        assert_eq!(and(&[t(), f()]), f());
        assert_eq!(and(&[err(), f()]), f());
        assert_eq!(and(&[EvaluateResult::Null, f()]), f());
        assert!(and(&[t(), err()]).is_error());
        assert!(and(&[EvaluateResult::Null, err()]).is_error());
        assert!(and(&[t(), EvaluateResult::Null]).is_null());
        assert!(and(&[t(), EvaluateResult::Unset]).is_error());
        assert!(and(&[t(), EvaluateResult::Value(1.into())]).is_error());
    }

    #[test]
    fn or_truth_table() {
        assert_eq!(or(&[f(), f()]), f());
        assert_eq!(or(&[f(), t()]), t());
        assert_eq!(or(&[err(), t()]), t());
        assert_eq!(or(&[EvaluateResult::Null, t()]), t());
        assert!(or(&[f(), err()]).is_error());
        assert!(or(&[f(), EvaluateResult::Null]).is_null());
    }

    #[test]
    fn xor_and_not() {
        assert_eq!(xor(&[t(), f(), t()]), f());
        assert_eq!(xor(&[t(), f()]), t());
        assert!(xor(&[t(), EvaluateResult::Null]).is_null());
        assert!(xor(&[t(), err()]).is_error());
        assert_eq!(not(&[t()]), f());
        assert!(not(&[EvaluateResult::Value("x".into())]).is_error());
        assert!(not(&[EvaluateResult::Null]).is_null());
    }

    #[test]
    fn cond_selects_branch() {
        let then = EvaluateResult::Value("then".into());
        let otherwise = EvaluateResult::Value("else".into());
        assert_eq!(cond(&[t(), then.clone(), otherwise.clone()]), then);
        assert_eq!(cond(&[f(), then.clone(), otherwise.clone()]), otherwise);
        assert_eq!(cond(&[EvaluateResult::Null, then.clone(), otherwise.clone()]), otherwise);
        assert!(cond(&[err(), then.clone(), otherwise.clone()]).is_error());
        assert!(cond(&[EvaluateResult::Value(1.into()), then, otherwise]).is_error());
    }

    #[test]
    fn presence_checks() {
        assert_eq!(exists(&[EvaluateResult::Unset]), f());
        assert_eq!(exists(&[EvaluateResult::Null]), t());
        assert_eq!(is_null(&[EvaluateResult::Null]), t());
        assert_eq!(is_null(&[EvaluateResult::Value(0.into())]), f());
        assert!(is_null(&[EvaluateResult::Unset]).is_error());
        assert_eq!(is_nan(&[EvaluateResult::Value(f64::NAN.into())]), t());
        assert_eq!(is_nan(&[EvaluateResult::Value(1.into())]), f());
        assert!(is_nan(&[EvaluateResult::Value("NaN".into())]).is_error());
    }
}
