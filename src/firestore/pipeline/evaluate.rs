use std::error::Error;
use std::fmt::{Display, Formatter};

use crate::firestore::model::Document;
use crate::firestore::value::{FirestoreValue, ValueKind};

/// Why an expression could not produce a value. Carried for diagnostics only.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvaluationError {
    message: String,
}

impl EvaluationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for EvaluationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for EvaluationError {}

/// The outcome of evaluating an expression.
///
/// `Null` is an explicit null (a stored null or a null propagated by a function) while `Unset`
/// means the referenced field does not exist. A `Value` wrapping a null value is read as `Null`.
#[derive(Clone, Debug, PartialEq)]
pub enum EvaluateResult {
    Value(FirestoreValue),
    Null,
    Unset,
    Error(EvaluationError),
}

impl EvaluateResult {
    /// Wraps `value`, mapping a null value to [`EvaluateResult::Null`].
    pub fn from_value(value: FirestoreValue) -> Self {
        if value.is_null() {
            EvaluateResult::Null
        } else {
            EvaluateResult::Value(value)
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        EvaluateResult::Error(EvaluationError::new(message))
    }

    pub fn boolean(value: bool) -> Self {
        EvaluateResult::Value(FirestoreValue::from_bool(value))
    }

    /// Maps `Value(null)` to [`EvaluateResult::Null`] and leaves anything else as is.
    pub fn normalized(self) -> Self {
        match self {
            EvaluateResult::Value(value) => EvaluateResult::from_value(value),
            other => other,
        }
    }

    /// `Some` for a non-null value.
    pub fn value(&self) -> Option<&FirestoreValue> {
        match self {
            EvaluateResult::Value(value) if !value.is_null() => Some(value),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, EvaluateResult::Error(_))
    }

    pub fn is_null(&self) -> bool {
        match self {
            EvaluateResult::Null => true,
            EvaluateResult::Value(value) => value.is_null(),
            _ => false,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, EvaluateResult::Unset)
    }

    /// `Some` only for a boolean value.
    pub fn as_bool(&self) -> Option<bool> {
        self.value().and_then(FirestoreValue::as_bool)
    }
}

impl From<FirestoreValue> for EvaluateResult {
    fn from(value: FirestoreValue) -> Self {
        EvaluateResult::from_value(value)
    }
}

/// What field references resolve against. Without a document every field is unset.
#[derive(Clone, Copy, Debug, Default)]
pub struct EvaluationContext<'a> {
    document: Option<&'a Document>,
}

impl<'a> EvaluationContext<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_document(document: &'a Document) -> Self {
        Self {
            document: Some(document),
        }
    }

    pub fn document(&self) -> Option<&'a Document> {
        self.document
    }
}

pub(crate) fn check_arity(
    name: &str,
    args: &[EvaluateResult],
    expected: usize,
) -> Result<(), EvaluateResult> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(EvaluateResult::error(format!(
            "{name}() expects {expected} argument(s) but got {}",
            args.len()
        )))
    }
}

pub(crate) fn check_min_arity(
    name: &str,
    args: &[EvaluateResult],
    minimum: usize,
) -> Result<(), EvaluateResult> {
    if args.len() >= minimum {
        Ok(())
    } else {
        Err(EvaluateResult::error(format!(
            "{name}() expects at least {minimum} argument(s) but got {}",
            args.len()
        )))
    }
}

/// First error among `args`, if any.
pub(crate) fn first_error(args: &[EvaluateResult]) -> Option<EvaluateResult> {
    args.iter().find(|arg| arg.is_error()).cloned()
}

/// Resolves the operands shared by most functions.
///
/// An error operand makes the result an error. Otherwise any null operand makes the result null,
/// including a null paired with an unset field. Only when no operand is null does an unset
/// operand turn into an error.
pub(crate) fn operands<'r>(
    name: &str,
    args: &'r [EvaluateResult],
) -> Result<Vec<&'r FirestoreValue>, EvaluateResult> {
    if let Some(error) = first_error(args) {
        return Err(error);
    }
    if args.iter().any(EvaluateResult::is_null) {
        return Err(EvaluateResult::Null);
    }
    args.iter()
        .map(|arg| match arg {
            EvaluateResult::Value(value) => Ok(value),
            _ => Err(EvaluateResult::error(format!(
                "{name}() received an absent field"
            ))),
        })
        .collect()
}

/// [`check_arity`] followed by [`operands`].
pub(crate) fn fixed_operands<'r>(
    name: &str,
    args: &'r [EvaluateResult],
    expected: usize,
) -> Result<Vec<&'r FirestoreValue>, EvaluateResult> {
    check_arity(name, args, expected)?;
    operands(name, args)
}

pub(crate) fn type_error(name: &str, expected: &str, got: &FirestoreValue) -> EvaluateResult {
    EvaluateResult::error(format!(
        "{name}() expects {expected} but got {}",
        type_name(got)
    ))
}

pub(crate) fn type_name(value: &FirestoreValue) -> &'static str {
    match value.kind() {
        ValueKind::Null => "null",
        ValueKind::Boolean(_) => "boolean",
        ValueKind::Integer(_) => "integer",
        ValueKind::Double(_) => "double",
        ValueKind::Timestamp(_) => "timestamp",
        ValueKind::String(_) => "string",
        ValueKind::Bytes(_) => "bytes",
        ValueKind::Reference(_) => "reference",
        ValueKind::GeoPoint(_) => "geo point",
        ValueKind::Array(_) => "array",
        ValueKind::Map(_) => "map",
    }
}

/// Unwraps a `Result` whose error arm already holds the function's result.
macro_rules! try_eval {
    ($expr:expr) => {
        match $expr {
            Ok(value) => value,
            Err(result) => return result,
        }
    };
}

pub(crate) use try_eval;
