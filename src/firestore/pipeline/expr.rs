use std::fmt::{Display, Formatter};

use crate::firestore::model::{Document, FieldPath, Timestamp};
use crate::firestore::pipeline::evaluate::{EvaluateResult, EvaluationContext};
use crate::firestore::pipeline::{arithmetic, arrays, comparison, logical, strings, timestamps};
use crate::firestore::value::{values, FirestoreValue};

/// Every function the evaluator understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Add,
    Subtract,
    Multiply,
    Divide,
    Mod,
    Abs,
    Ln,
    Log10,
    Exp,
    Sqrt,
    Pow,
    Ceil,
    Floor,
    Round,
    Eq,
    Neq,
    Lt,
    Lte,
    Gt,
    Gte,
    EqAny,
    NotEqAny,
    LogicalMaximum,
    LogicalMinimum,
    And,
    Or,
    Xor,
    Not,
    Cond,
    Exists,
    IsNan,
    IsNull,
    StringConcat,
    StringContains,
    StartsWith,
    EndsWith,
    Like,
    RegexContains,
    RegexMatch,
    CharLength,
    ByteLength,
    ToUpper,
    ToLower,
    Trim,
    StringReverse,
    Substring,
    ArrayContains,
    ArrayContainsAny,
    ArrayContainsAll,
    ArrayLength,
    MapGet,
    UnixMicrosToTimestamp,
    UnixMillisToTimestamp,
    UnixSecondsToTimestamp,
    TimestampToUnixMicros,
    TimestampToUnixMillis,
    TimestampToUnixSeconds,
    TimestampAdd,
    TimestampSub,
}

impl FunctionKind {
    pub fn name(&self) -> &'static str {
        match self {
            FunctionKind::Add => "add",
            FunctionKind::Subtract => "subtract",
            FunctionKind::Multiply => "multiply",
            FunctionKind::Divide => "divide",
            FunctionKind::Mod => "mod",
            FunctionKind::Abs => "abs",
            FunctionKind::Ln => "ln",
            FunctionKind::Log10 => "log10",
            FunctionKind::Exp => "exp",
            FunctionKind::Sqrt => "sqrt",
            FunctionKind::Pow => "pow",
            FunctionKind::Ceil => "ceil",
            FunctionKind::Floor => "floor",
            FunctionKind::Round => "round",
            FunctionKind::Eq => "eq",
            FunctionKind::Neq => "neq",
            FunctionKind::Lt => "lt",
            FunctionKind::Lte => "lte",
            FunctionKind::Gt => "gt",
            FunctionKind::Gte => "gte",
            FunctionKind::EqAny => "eq_any",
            FunctionKind::NotEqAny => "not_eq_any",
            FunctionKind::LogicalMaximum => "logical_maximum",
            FunctionKind::LogicalMinimum => "logical_minimum",
            FunctionKind::And => "and",
            FunctionKind::Or => "or",
            FunctionKind::Xor => "xor",
            FunctionKind::Not => "not",
            FunctionKind::Cond => "cond",
            FunctionKind::Exists => "exists",
            FunctionKind::IsNan => "is_nan",
            FunctionKind::IsNull => "is_null",
            FunctionKind::StringConcat => "string_concat",
            FunctionKind::StringContains => "string_contains",
            FunctionKind::StartsWith => "starts_with",
            FunctionKind::EndsWith => "ends_with",
            FunctionKind::Like => "like",
            FunctionKind::RegexContains => "regex_contains",
            FunctionKind::RegexMatch => "regex_match",
            FunctionKind::CharLength => "char_length",
            FunctionKind::ByteLength => "byte_length",
            FunctionKind::ToUpper => "to_upper",
            FunctionKind::ToLower => "to_lower",
            FunctionKind::Trim => "trim",
            FunctionKind::StringReverse => "string_reverse",
            FunctionKind::Substring => "substring",
            FunctionKind::ArrayContains => "array_contains",
            FunctionKind::ArrayContainsAny => "array_contains_any",
            FunctionKind::ArrayContainsAll => "array_contains_all",
            FunctionKind::ArrayLength => "array_length",
            FunctionKind::MapGet => "map_get",
            FunctionKind::UnixMicrosToTimestamp => "unix_micros_to_timestamp",
            FunctionKind::UnixMillisToTimestamp => "unix_millis_to_timestamp",
            FunctionKind::UnixSecondsToTimestamp => "unix_seconds_to_timestamp",
            FunctionKind::TimestampToUnixMicros => "timestamp_to_unix_micros",
            FunctionKind::TimestampToUnixMillis => "timestamp_to_unix_millis",
            FunctionKind::TimestampToUnixSeconds => "timestamp_to_unix_seconds",
            FunctionKind::TimestampAdd => "timestamp_add",
            FunctionKind::TimestampSub => "timestamp_sub",
        }
    }

    /// Applies the function to already evaluated arguments.
    pub fn apply(&self, args: &[EvaluateResult]) -> EvaluateResult {
        if args.iter().any(|arg| matches!(arg, EvaluateResult::Value(value) if value.is_null())) {
            let args: Vec<EvaluateResult> =
                args.iter().cloned().map(EvaluateResult::normalized).collect();
            return self.dispatch(&args);
        }
        self.dispatch(args)
    }

    fn dispatch(&self, args: &[EvaluateResult]) -> EvaluateResult {
        match self {
            FunctionKind::Add => arithmetic::add(args),
            FunctionKind::Subtract => arithmetic::subtract(args),
            FunctionKind::Multiply => arithmetic::multiply(args),
            FunctionKind::Divide => arithmetic::divide(args),
            FunctionKind::Mod => arithmetic::modulo(args),
            FunctionKind::Abs => arithmetic::abs(args),
            FunctionKind::Ln => arithmetic::ln(args),
            FunctionKind::Log10 => arithmetic::log10(args),
            FunctionKind::Exp => arithmetic::exp(args),
            FunctionKind::Sqrt => arithmetic::sqrt(args),
            FunctionKind::Pow => arithmetic::pow(args),
            FunctionKind::Ceil => arithmetic::ceil(args),
            FunctionKind::Floor => arithmetic::floor(args),
            FunctionKind::Round => arithmetic::round(args),
            FunctionKind::Eq => comparison::eq(args),
            FunctionKind::Neq => comparison::neq(args),
            FunctionKind::Lt => comparison::lt(args),
            FunctionKind::Lte => comparison::lte(args),
            FunctionKind::Gt => comparison::gt(args),
            FunctionKind::Gte => comparison::gte(args),
            FunctionKind::EqAny => comparison::eq_any(args),
            FunctionKind::NotEqAny => comparison::not_eq_any(args),
            FunctionKind::LogicalMaximum => comparison::logical_maximum(args),
            FunctionKind::LogicalMinimum => comparison::logical_minimum(args),
            FunctionKind::And => logical::and(args),
            FunctionKind::Or => logical::or(args),
            FunctionKind::Xor => logical::xor(args),
            FunctionKind::Not => logical::not(args),
            FunctionKind::Cond => logical::cond(args),
            FunctionKind::Exists => logical::exists(args),
            FunctionKind::IsNan => logical::is_nan(args),
            FunctionKind::IsNull => logical::is_null(args),
            FunctionKind::StringConcat => strings::string_concat(args),
            FunctionKind::StringContains => strings::string_contains(args),
            FunctionKind::StartsWith => strings::starts_with(args),
            FunctionKind::EndsWith => strings::ends_with(args),
            FunctionKind::Like => strings::like(args),
            FunctionKind::RegexContains => strings::regex_contains(args),
            FunctionKind::RegexMatch => strings::regex_match(args),
            FunctionKind::CharLength => strings::char_length(args),
            FunctionKind::ByteLength => strings::byte_length(args),
            FunctionKind::ToUpper => strings::to_upper(args),
            FunctionKind::ToLower => strings::to_lower(args),
            FunctionKind::Trim => strings::trim(args),
            FunctionKind::StringReverse => strings::string_reverse(args),
            FunctionKind::Substring => strings::substring(args),
            FunctionKind::ArrayContains => arrays::array_contains(args),
            FunctionKind::ArrayContainsAny => arrays::array_contains_any(args),
            FunctionKind::ArrayContainsAll => arrays::array_contains_all(args),
            FunctionKind::ArrayLength => arrays::array_length(args),
            FunctionKind::MapGet => arrays::map_get(args),
            FunctionKind::UnixMicrosToTimestamp => timestamps::unix_micros_to_timestamp(args),
            FunctionKind::UnixMillisToTimestamp => timestamps::unix_millis_to_timestamp(args),
            FunctionKind::UnixSecondsToTimestamp => timestamps::unix_seconds_to_timestamp(args),
            FunctionKind::TimestampToUnixMicros => timestamps::timestamp_to_unix_micros(args),
            FunctionKind::TimestampToUnixMillis => timestamps::timestamp_to_unix_millis(args),
            FunctionKind::TimestampToUnixSeconds => timestamps::timestamp_to_unix_seconds(args),
            FunctionKind::TimestampAdd => timestamps::timestamp_add(args),
            FunctionKind::TimestampSub => timestamps::timestamp_sub(args),
        }
    }
}

impl Display for FunctionKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An expression tree evaluated against a single document.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Constant(FirestoreValue),
    Field(FieldPath),
    Function(FunctionKind, Vec<Expr>),
}

/// A constant expression.
pub fn constant(value: impl Into<FirestoreValue>) -> Expr {
    Expr::Constant(value.into())
}

/// A reference to a (possibly nested, dot-separated) document field.
pub fn field(path: &str) -> Expr {
    Expr::Field(FieldPath::from_dot_separated_lenient(path))
}

macro_rules! binary_builders {
    ($($method:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $method(self, other: impl Into<Expr>) -> Expr {
                Expr::Function(FunctionKind::$kind, vec![self, other.into()])
            }
        )*
    };
}

macro_rules! unary_builders {
    ($($method:ident => $kind:ident),* $(,)?) => {
        $(
            pub fn $method(self) -> Expr {
                Expr::Function(FunctionKind::$kind, vec![self])
            }
        )*
    };
}

impl Expr {
    pub fn field(path: &str) -> Expr {
        field(path)
    }

    pub fn constant(value: impl Into<FirestoreValue>) -> Expr {
        constant(value)
    }

    pub fn function(kind: FunctionKind, args: Vec<Expr>) -> Expr {
        Expr::Function(kind, args)
    }

    binary_builders! {
        add => Add,
        subtract => Subtract,
        multiply => Multiply,
        divide => Divide,
        modulo => Mod,
        pow => Pow,
        eq => Eq,
        neq => Neq,
        lt => Lt,
        lte => Lte,
        gt => Gt,
        gte => Gte,
        eq_any => EqAny,
        not_eq_any => NotEqAny,
        string_contains => StringContains,
        starts_with => StartsWith,
        ends_with => EndsWith,
        like => Like,
        regex_contains => RegexContains,
        regex_match => RegexMatch,
        array_contains => ArrayContains,
        array_contains_any => ArrayContainsAny,
        array_contains_all => ArrayContainsAll,
        map_get => MapGet,
    }

    unary_builders! {
        abs => Abs,
        ln => Ln,
        log10 => Log10,
        exp => Exp,
        sqrt => Sqrt,
        ceil => Ceil,
        floor => Floor,
        round => Round,
        not => Not,
        exists => Exists,
        is_nan => IsNan,
        is_null => IsNull,
        char_length => CharLength,
        byte_length => ByteLength,
        to_upper => ToUpper,
        to_lower => ToLower,
        trim => Trim,
        string_reverse => StringReverse,
        array_length => ArrayLength,
        unix_micros_to_timestamp => UnixMicrosToTimestamp,
        unix_millis_to_timestamp => UnixMillisToTimestamp,
        unix_seconds_to_timestamp => UnixSecondsToTimestamp,
        timestamp_to_unix_micros => TimestampToUnixMicros,
        timestamp_to_unix_millis => TimestampToUnixMillis,
        timestamp_to_unix_seconds => TimestampToUnixSeconds,
    }

    pub fn and(conditions: Vec<Expr>) -> Expr {
        Expr::Function(FunctionKind::And, conditions)
    }

    pub fn or(conditions: Vec<Expr>) -> Expr {
        Expr::Function(FunctionKind::Or, conditions)
    }

    pub fn xor(conditions: Vec<Expr>) -> Expr {
        Expr::Function(FunctionKind::Xor, conditions)
    }

    pub fn cond(condition: Expr, then: impl Into<Expr>, otherwise: impl Into<Expr>) -> Expr {
        Expr::Function(FunctionKind::Cond, vec![condition, then.into(), otherwise.into()])
    }

    pub fn string_concat(parts: Vec<Expr>) -> Expr {
        Expr::Function(FunctionKind::StringConcat, parts)
    }

    pub fn logical_maximum(values: Vec<Expr>) -> Expr {
        Expr::Function(FunctionKind::LogicalMaximum, values)
    }

    pub fn logical_minimum(values: Vec<Expr>) -> Expr {
        Expr::Function(FunctionKind::LogicalMinimum, values)
    }

    pub fn substring(self, position: impl Into<Expr>, length: Option<Expr>) -> Expr {
        let mut args = vec![self, position.into()];
        args.extend(length);
        Expr::Function(FunctionKind::Substring, args)
    }

    pub fn timestamp_add(self, unit: &str, amount: impl Into<Expr>) -> Expr {
        Expr::Function(
            FunctionKind::TimestampAdd,
            vec![self, constant(unit), amount.into()],
        )
    }

    pub fn timestamp_sub(self, unit: &str, amount: impl Into<Expr>) -> Expr {
        Expr::Function(
            FunctionKind::TimestampSub,
            vec![self, constant(unit), amount.into()],
        )
    }

    pub fn evaluate(&self, context: &EvaluationContext<'_>) -> EvaluateResult {
        match self {
            Expr::Constant(value) => EvaluateResult::from_value(value.clone()),
            Expr::Field(path) => match context.document().and_then(|doc| doc.field(path)) {
                Some(value) => EvaluateResult::from_value(value),
                None => EvaluateResult::Unset,
            },
            Expr::Function(kind, args) => {
                let args: Vec<EvaluateResult> =
                    args.iter().map(|arg| arg.evaluate(context)).collect();
                kind.apply(&args)
            }
        }
    }

    /// Filter semantics: only a boolean `true` keeps the document. Errors and nulls drop it.
    pub fn matches(&self, document: &Document) -> bool {
        self.evaluate(&EvaluationContext::for_document(document))
            .as_bool()
            .unwrap_or(false)
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Constant(value) => match value.as_str() {
                Some(text) => write!(f, "{text:?}"),
                None => f.write_str(&values::canonical_id(value)),
            },
            Expr::Field(path) => write!(f, "field({path})"),
            Expr::Function(kind, args) => {
                write!(f, "{kind}(")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
        }
    }
}

impl From<FirestoreValue> for Expr {
    fn from(value: FirestoreValue) -> Self {
        Expr::Constant(value)
    }
}

macro_rules! constant_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for Expr {
                fn from(value: $source) -> Self {
                    Expr::Constant(FirestoreValue::from(value))
                }
            }
        )*
    };
}

constant_from!(bool, i32, i64, f64, &str, String, Timestamp, Vec<FirestoreValue>);
