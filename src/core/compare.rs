//! Structural equality for field values with an optional "empty collapsing"
//! policy.
//!
//! With `collapse_empty` set, any two empty values (`null`, absent, `""`, `[]`,
//! `{}`) are equal regardless of shape, and numbers are compared after numeric
//! coercion so that `0` is never mistaken for an empty value. Without it,
//! numbers are compared strictly: `5` and `"5"` differ.

use serde_json::{Map, Value};

/// Compares `a` and `b` structurally.
pub fn deep_equal(a: &Value, b: &Value, collapse_empty: bool) -> bool {
    equal_slot(Some(a), Some(b), collapse_empty)
}

/// Compares two field mappings with the same policy as [`deep_equal`].
pub fn maps_equal(left: &Map<String, Value>, right: &Map<String, Value>, collapse_empty: bool) -> bool {
    if collapse_empty {
        // Absent keys compare as empty values.
        left.keys()
            .chain(right.keys().filter(|k| !left.contains_key(*k)))
            .all(|k| equal_slot(left.get(k), right.get(k), collapse_empty))
    } else {
        left.len() == right.len()
            && left.iter().all(|(k, l)| {
                right
                    .get(k)
                    .is_some_and(|r| equal_slot(Some(l), Some(r), collapse_empty))
            })
    }
}

/// Returns true for `null`, `""`, `[]` and `{}`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

// `None` stands for an absent value (a key missing from one side).
fn equal_slot(a: Option<&Value>, b: Option<&Value>, collapse: bool) -> bool {
    if is_composite(a) || is_composite(b) {
        return equal_composite(a, b, collapse);
    }

    if is_number(a) || is_number(b) {
        return if collapse {
            coerce_number(a) == coerce_number(b)
        } else {
            strict_number_eq(a, b)
        };
    }

    if collapse && is_empty_slot(a) && is_empty_slot(b) {
        return true;
    }

    a == b
}

fn equal_composite(a: Option<&Value>, b: Option<&Value>, collapse: bool) -> bool {
    if collapse && is_empty_slot(a) && is_empty_slot(b) {
        return true;
    }

    match (a, b) {
        (Some(Value::Array(left)), Some(Value::Array(right))) => {
            left.len() == right.len()
                && left
                    .iter()
                    .zip(right)
                    .all(|(l, r)| equal_slot(Some(l), Some(r), collapse))
        }
        (Some(Value::Object(left)), Some(Value::Object(right))) => maps_equal(left, right, collapse),
        _ => false,
    }
}

fn is_composite(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Array(_)) | Some(Value::Object(_)))
}

fn is_number(value: Option<&Value>) -> bool {
    matches!(value, Some(Value::Number(_)))
}

fn is_empty_slot(value: Option<&Value>) -> bool {
    value.is_none_or(is_empty_value)
}

fn strict_number_eq(a: Option<&Value>, b: Option<&Value>) -> bool {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x == y;
            }
            x.as_f64() == y.as_f64()
        }
        _ => false,
    }
}

/// Numeric coercion of a scalar: `null` and `""` become 0, booleans 0/1,
/// numeric strings their value, everything else NaN.
fn coerce_number(value: Option<&Value>) -> f64 {
    match value {
        None => f64::NAN,
        Some(Value::Null) => 0.0,
        Some(Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => parse_numeric_text(s),
        Some(Value::Array(_)) | Some(Value::Object(_)) => f64::NAN,
    }
}

fn parse_numeric_text(text: &str) -> f64 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0.0;
    }

    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return u64::from_str_radix(digits, radix)
                .map(|n| n as f64)
                .unwrap_or(f64::NAN);
        }
    }

    // Rust also accepts "inf" and "nan" spellings, which are not numbers here.
    if trimmed.bytes().any(|b| b.is_ascii_alphabetic() && b != b'e' && b != b'E') {
        return f64::NAN;
    }

    trimmed.parse::<f64>().unwrap_or(f64::NAN)
}
