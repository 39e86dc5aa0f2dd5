use regex::Regex;

use crate::firestore::pipeline::evaluate::{
    check_min_arity, fixed_operands, operands, try_eval, type_error, EvaluateResult,
};
use crate::firestore::value::{BytesValue, FirestoreValue, ValueKind};

fn text<'v>(name: &str, value: &'v FirestoreValue) -> Result<&'v str, EvaluateResult> {
    value.as_str().ok_or_else(|| type_error(name, "a string", value))
}

fn string_result(value: impl Into<String>) -> EvaluateResult {
    EvaluateResult::Value(FirestoreValue::from_string(value))
}

fn bytes_result(value: Vec<u8>) -> EvaluateResult {
    EvaluateResult::Value(FirestoreValue::from_bytes(BytesValue::from(value)))
}

/// Applies `on_text` or `on_bytes` to a single string-or-bytes operand.
fn text_or_bytes(
    name: &str,
    args: &[EvaluateResult],
    on_text: impl Fn(&str) -> String,
    on_bytes: impl Fn(&[u8]) -> Vec<u8>,
) -> EvaluateResult {
    let values = try_eval!(fixed_operands(name, args, 1));
    match values[0].kind() {
        ValueKind::String(value) => string_result(on_text(value)),
        ValueKind::Bytes(value) => bytes_result(on_bytes(value.as_slice())),
        _ => type_error(name, "a string or bytes", values[0]),
    }
}

pub(crate) fn string_concat(args: &[EvaluateResult]) -> EvaluateResult {
    try_eval!(check_min_arity("string_concat", args, 1));
    let values = try_eval!(operands("string_concat", args));
    let mut out = String::new();
    for value in values {
        out.push_str(try_eval!(text("string_concat", value)));
    }
    string_result(out)
}

fn text_predicate(
    name: &str,
    args: &[EvaluateResult],
    test: impl Fn(&str, &str) -> bool,
) -> EvaluateResult {
    let values = try_eval!(fixed_operands(name, args, 2));
    let value = try_eval!(text(name, values[0]));
    let other = try_eval!(text(name, values[1]));
    EvaluateResult::boolean(test(value, other))
}

pub(crate) fn string_contains(args: &[EvaluateResult]) -> EvaluateResult {
    text_predicate("string_contains", args, |value, needle| value.contains(needle))
}

pub(crate) fn starts_with(args: &[EvaluateResult]) -> EvaluateResult {
    text_predicate("starts_with", args, |value, prefix| value.starts_with(prefix))
}

pub(crate) fn ends_with(args: &[EvaluateResult]) -> EvaluateResult {
    text_predicate("ends_with", args, |value, suffix| value.ends_with(suffix))
}

/// Translates a LIKE pattern (`%` any run, `_` any character, `\` escape) into an anchored regex.
fn like_to_regex(pattern: &str) -> Result<String, &'static str> {
    let mut regex = String::from("(?s)^");
    let mut chars = pattern.chars();
    let mut buffer = [0u8; 4];
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => regex.push_str(&regex::escape(escaped.encode_utf8(&mut buffer))),
                None => return Err("pattern ends with a dangling escape character"),
            },
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut buffer))),
        }
    }
    regex.push('$');
    Ok(regex)
}

fn regex_test(
    name: &str,
    args: &[EvaluateResult],
    build: impl Fn(&str) -> Result<String, &'static str>,
) -> EvaluateResult {
    let values = try_eval!(fixed_operands(name, args, 2));
    let value = try_eval!(text(name, values[0]));
    let pattern = try_eval!(text(name, values[1]));
    let source = match build(pattern) {
        Ok(source) => source,
        Err(reason) => return EvaluateResult::error(format!("{name}(): {reason}")),
    };
    match Regex::new(&source) {
        Ok(regex) => EvaluateResult::boolean(regex.is_match(value)),
        Err(error) => EvaluateResult::error(format!("{name}(): invalid pattern: {error}")),
    }
}

pub(crate) fn like(args: &[EvaluateResult]) -> EvaluateResult {
    regex_test("like", args, like_to_regex)
}

/// True when the pattern matches anywhere in the value.
pub(crate) fn regex_contains(args: &[EvaluateResult]) -> EvaluateResult {
    regex_test("regex_contains", args, |pattern| Ok(pattern.to_string()))
}

/// True only when the pattern matches the whole value.
pub(crate) fn regex_match(args: &[EvaluateResult]) -> EvaluateResult {
    regex_test("regex_match", args, |pattern| Ok(format!("^(?:{pattern})$")))
}

pub(crate) fn char_length(args: &[EvaluateResult]) -> EvaluateResult {
    let values = try_eval!(fixed_operands("char_length", args, 1));
    let value = try_eval!(text("char_length", values[0]));
    EvaluateResult::Value(FirestoreValue::from_integer(value.chars().count() as i64))
}

pub(crate) fn byte_length(args: &[EvaluateResult]) -> EvaluateResult {
    let values = try_eval!(fixed_operands("byte_length", args, 1));
    let length = match values[0].kind() {
        ValueKind::String(value) => value.len(),
        ValueKind::Bytes(value) => value.len(),
        _ => return type_error("byte_length", "a string or bytes", values[0]),
    };
    EvaluateResult::Value(FirestoreValue::from_integer(length as i64))
}

/// Full Unicode case mapping for strings, ASCII-only for bytes.
pub(crate) fn to_upper(args: &[EvaluateResult]) -> EvaluateResult {
    text_or_bytes("to_upper", args, str::to_uppercase, <[u8]>::to_ascii_uppercase)
}

pub(crate) fn to_lower(args: &[EvaluateResult]) -> EvaluateResult {
    text_or_bytes("to_lower", args, str::to_lowercase, <[u8]>::to_ascii_lowercase)
}

/// Strings lose Unicode whitespace at both ends; bytes lose only ASCII spaces.
pub(crate) fn trim(args: &[EvaluateResult]) -> EvaluateResult {
    text_or_bytes(
        "trim",
        args,
        |value| value.trim().to_string(),
        |bytes| {
            let start = bytes.iter().position(|b| *b != b' ').unwrap_or(bytes.len());
            let end = bytes.iter().rposition(|b| *b != b' ').map_or(start, |i| i + 1);
            bytes[start..end].to_vec()
        },
    )
}

pub(crate) fn string_reverse(args: &[EvaluateResult]) -> EvaluateResult {
    text_or_bytes(
        "string_reverse",
        args,
        |value| value.chars().rev().collect(),
        |bytes| bytes.iter().rev().copied().collect(),
    )
}

/// Start offset and end offset into a sequence of `len` units. A negative position counts back
/// from the end.
fn substring_range(len: usize, position: i64, length: Option<i64>) -> (usize, usize) {
    let len_i = len as i64;
    let start = if position < 0 {
        (len_i + position).max(0)
    } else {
        position.min(len_i)
    };
    let end = match length {
        Some(length) => start.saturating_add(length).min(len_i),
        None => len_i,
    };
    (start as usize, end as usize)
}

/// `substring(value, position[, length])` over characters for strings and bytes for bytes.
pub(crate) fn substring(args: &[EvaluateResult]) -> EvaluateResult {
    if !(2..=3).contains(&args.len()) {
        return EvaluateResult::error(format!(
            "substring() expects 2 or 3 arguments but got {}",
            args.len()
        ));
    }
    let values = try_eval!(operands("substring", args));
    let Some(position) = integer(values[1]) else {
        return type_error("substring", "an integer position", values[1]);
    };
    let length = match values.get(2) {
        Some(value) => match integer(value) {
            Some(length) if length >= 0 => Some(length),
            Some(_) => return EvaluateResult::error("substring(): length must not be negative"),
            None => return type_error("substring", "an integer length", value),
        },
        None => None,
    };

    match values[0].kind() {
        ValueKind::String(value) => {
            let chars: Vec<char> = value.chars().collect();
            let (start, end) = substring_range(chars.len(), position, length);
            string_result(chars[start..end].iter().collect::<String>())
        }
        ValueKind::Bytes(value) => {
            let bytes = value.as_slice();
            let (start, end) = substring_range(bytes.len(), position, length);
            bytes_result(bytes[start..end].to_vec())
        }
        _ => type_error("substring", "a string or bytes", values[0]),
    }
}

fn integer(value: &FirestoreValue) -> Option<i64> {
    match value.kind() {
        ValueKind::Integer(value) => Some(*value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(value: &str) -> EvaluateResult {
        string_result(value)
    }

    fn b(value: &[u8]) -> EvaluateResult {
        bytes_result(value.to_vec())
    }

    fn int(value: i64) -> EvaluateResult {
        EvaluateResult::Value(FirestoreValue::from_integer(value))
    }

    fn yes() -> EvaluateResult {
        EvaluateResult::boolean(true)
    }

    fn no() -> EvaluateResult {
        EvaluateResult::boolean(false)
    }

    #[test]
    fn like_patterns() {
        assert_eq!(like(&[s("yummy food??"), s("%food??")]), yes());
        assert_eq!(like(&[s("yummy food"), s("yummy%")]), yes());
        assert_eq!(like(&[s("abc"), s("a_c")]), yes());
        assert_eq!(like(&[s("abbc"), s("a_c")]), no());
        assert_eq!(like(&[s("a\nb"), s("a_b")]), yes());
        assert_eq!(like(&[s("100%"), s("100\\%")]), yes());
        assert_eq!(like(&[s("1000"), s("100\\%")]), no());
        assert_eq!(like(&[s("a.c"), s("a.c")]), yes());
        assert_eq!(like(&[s("abc"), s("a.c")]), no());
        assert_eq!(like(&[s("日本語"), s("日_語")]), yes());
    }

    #[test]
    fn like_rejects_bad_input() {
        for value in ["", "abc", "ends with \\"] {
            assert!(like(&[s(value), s("%\\")]).is_error());
        }
        assert!(like(&[int(1), s("%")]).is_error());
        assert!(like(&[s("a"), int(1)]).is_error());
        assert!(like(&[EvaluateResult::Null, s("%")]).is_null());
    }

    #[test]
    fn regex_contains_searches_substrings() {
        assert_eq!(regex_contains(&[s("yummy food"), s("f.o")]), yes());
        assert_eq!(regex_contains(&[s("yummy food"), s("^food")]), no());
        assert_eq!(regex_match(&[s("yummy food"), s("f.o")]), no());
        assert_eq!(regex_match(&[s("yummy food"), s("yummy.*")]), yes());
        assert!(regex_contains(&[s("abab"), s("(ab)\\1")]).is_error());
        assert!(regex_contains(&[s("abc"), s("(")]).is_error());
        assert!(regex_contains(&[b(b"abc"), s("a")]).is_error());
    }

    #[test]
    fn concat_strings() {
        assert_eq!(string_concat(&[s("a"), s("b"), s("c")]), s("abc"));
        let nested = string_concat(&[string_concat(&[s("a"), s("b")]), s("c")]);
        assert_eq!(nested, s("abc"));
        let many: Vec<_> = (0..500).map(|_| s("a")).collect();
        assert_eq!(string_concat(&many), s(&"a".repeat(500)));
        assert!(string_concat(&[s("a"), EvaluateResult::Null]).is_null());
        assert!(string_concat(&[s("a"), int(1)]).is_error());
        assert!(string_concat(&[s("a"), EvaluateResult::Unset]).is_error());
        assert!(string_concat(&[]).is_error());
    }

    #[test]
    fn substring_predicates() {
        assert_eq!(string_contains(&[s("abc"), s("")]), yes());
        assert_eq!(string_contains(&[s("abc"), s("bc")]), yes());
        assert_eq!(starts_with(&[s("abc"), s("ab")]), yes());
        assert_eq!(ends_with(&[s("abc"), s("ab")]), no());
        assert!(string_contains(&[s("abc"), b(b"a")]).is_error());
    }

    #[test]
    fn case_mapping() {
        assert_eq!(to_upper(&[s("αβγ абв ß 中文 abc")]), s("ΑΒΓ АБВ SS 中文 ABC"));
        assert_eq!(to_lower(&[s("ΑΒΓ АБВ ABC")]), s("αβγ абв abc"));
        assert_eq!(to_upper(&[b(&[b'a', 0xe9, b'z', 0xff])]), b(&[b'A', 0xe9, b'Z', 0xff]));
        assert!(to_upper(&[EvaluateResult::Null]).is_null());
        assert!(to_upper(&[int(1)]).is_error());
        let once = to_upper(&[s("straße")]);
        assert_eq!(to_upper(&[once.clone()]), once);
    }

    #[test]
    fn trimming() {
        assert_eq!(trim(&[s(" \t\r\n\x0c abc \u{3000}")]), s("abc"));
        assert_eq!(trim(&[b(b"  a b  ")]), b(b"a b"));
        assert_eq!(trim(&[b(b"    ")]), b(b""));
        assert_eq!(trim(&[b(b"\ta\t")]), b(b"\ta\t"));
        let once = trim(&[s("  x y  ")]);
        assert_eq!(trim(&[once.clone()]), once);
        assert!(trim(&[EvaluateResult::Null]).is_null());
    }

    #[test]
    fn lengths_and_reversal() {
        assert_eq!(char_length(&[s("héllo")]), int(5));
        assert_eq!(byte_length(&[s("héllo")]), int(6));
        assert_eq!(byte_length(&[b(b"abc")]), int(3));
        assert!(char_length(&[b(b"abc")]).is_error());
        assert_eq!(string_reverse(&[s("abç")]), s("çba"));
        assert_eq!(string_reverse(&[b(&[1, 2, 3])]), b(&[3, 2, 1]));
    }

    #[test]
    fn substrings() {
        assert_eq!(substring(&[s("abcdef"), int(2)]), s("cdef"));
        assert_eq!(substring(&[s("abcdef"), int(1), int(3)]), s("bcd"));
        assert_eq!(substring(&[s("abcdef"), int(-2)]), s("ef"));
        assert_eq!(substring(&[s("abcdef"), int(10)]), s(""));
        assert_eq!(substring(&[s("日本語"), int(1), int(1)]), s("本"));
        assert_eq!(substring(&[b(b"abc"), int(1), int(5)]), b(b"bc"));
        assert!(substring(&[s("abc"), int(0), int(-1)]).is_error());
        assert!(substring(&[s("abc"), s("0")]).is_error());
        assert!(substring(&[s("abc")]).is_error());
    }
}
