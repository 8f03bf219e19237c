//! Helpers over the loosely typed values held in a form's value store.
//!
//! Field values arrive as JSON: strings for text and dates, strings or numbers
//! for single selections, arrays of strings for multi selections and numbers
//! for sliders. The predicates here mirror the truthiness and numeric coercion
//! rules the published forms were authored against.

use serde_json::{Map, Number, Value};

/// Live mapping of field id to the value the user entered.
pub type ValueStore = Map<String, Value>;

static NULL: Value = Value::Null;

/// Looks a field up, treating a missing entry as `null`.
pub fn lookup<'a>(values: &'a ValueStore, field_id: &str) -> &'a Value {
    values.get(field_id).unwrap_or(&NULL)
}

pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Falsy values and empty arrays are empty. Note that `0` and `false` count
/// as empty here.
pub fn is_empty(value: &Value) -> bool {
    !is_truthy(value) || matches!(value, Value::Array(items) if items.is_empty())
}

/// A truthy value that is not an empty array.
pub fn is_not_empty(value: &Value) -> bool {
    is_truthy(value) && !matches!(value, Value::Array(items) if items.is_empty())
}

/// Whether a value counts as answered for progress and required checks.
///
/// Unlike [`is_empty`], `0` and `false` are real answers.
pub fn has_answer(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(text)) => !text.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    }
}

/// Numeric coercion: blank strings and `null` become 0, booleans 0/1,
/// single-element arrays their element. Anything else that does not parse is
/// NaN, which compares false against everything.
pub fn to_number(value: &Value) -> f64 {
    match value {
        Value::Null => 0.0,
        Value::Bool(flag) => f64::from(u8::from(*flag)),
        Value::Number(number) => number.as_f64().unwrap_or(f64::NAN),
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                0.0
            } else {
                trimmed.parse::<f64>().unwrap_or(f64::NAN)
            }
        }
        Value::Array(items) => match items.as_slice() {
            [] => 0.0,
            [single] => to_number(single),
            _ => f64::NAN,
        },
        Value::Object(_) => f64::NAN,
    }
}

/// Strict equality: no cross-type coercion, but `1` and `1.0` are equal.
pub fn strictly_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

/// Textual form of a value, as used for substring checks and display.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number
            .as_f64()
            .map(format_number)
            .unwrap_or_else(|| number.to_string()),
        Value::Array(items) => items.iter().map(to_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Formats a float without a trailing `.0` for whole numbers.
pub fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        number.to_string()
    }
}

/// Builds a JSON number, preferring an integer representation.
pub fn number_value(number: f64) -> Value {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        Value::Number(Number::from(number as i64))
    } else {
        Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Converts an option value picked from a radio group or single select.
///
/// Values that parse as finite numbers are stored as numbers, so `"42"`
/// becomes `42` while `"abc"` stays a string. Blank strings are kept as-is.
pub fn coerce_choice(raw: &str) -> Value {
    let trimmed = raw.trim();
    if !trimmed.is_empty()
        && let Ok(number) = trimmed.parse::<f64>()
        && number.is_finite()
    {
        return number_value(number);
    }
    Value::String(raw.to_string())
}

/// Whether a stored single selection came from the option with `option_value`.
/// Coerced picks such as `"007"` are stored as `7`, so both forms match.
pub fn option_matches(option_value: &str, stored: &Value) -> bool {
    option_value == to_text(stored) || strictly_equal(&coerce_choice(option_value), stored)
}

/// Collects the string entries of an array value; non-arrays yield nothing.
pub fn string_items(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| items.iter().map(to_text).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_and_not_empty_are_complements() {
        for value in [
            json!(null),
            json!(""),
            json!("x"),
            json!(0),
            json!(3),
            json!(false),
            json!(true),
            json!([]),
            json!(["a"]),
            json!({}),
        ] {
            assert_ne!(is_empty(&value), is_not_empty(&value), "{value}");
        }
        assert!(!is_not_empty(&json!([])));
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!(0)));
        assert!(!is_empty(&json!(["a"])));
    }

    #[test]
    fn coerced_picks_match_their_option() {
        assert!(option_matches("007", &coerce_choice("007")));
        assert!(option_matches("1.0", &coerce_choice("1.0")));
        assert!(option_matches("1e3", &json!(1000)));
        assert!(option_matches("abc", &json!("abc")));
        assert!(!option_matches("007", &json!(8)));
        assert!(!option_matches("", &json!(0)));
    }

    #[test]
    fn numeric_coercion_follows_loose_rules() {
        assert_eq!(to_number(&json!("42")), 42.0);
        assert_eq!(to_number(&json!(" 7 ")), 7.0);
        assert_eq!(to_number(&json!("")), 0.0);
        assert_eq!(to_number(&json!(null)), 0.0);
        assert_eq!(to_number(&json!(true)), 1.0);
        assert_eq!(to_number(&json!(["5"])), 5.0);
        assert!(to_number(&json!("abc")).is_nan());
        assert!(to_number(&json!(["1", "2"])).is_nan());
    }

    #[test]
    fn choice_coercion_only_touches_numbers() {
        assert_eq!(coerce_choice("42"), json!(42));
        assert_eq!(coerce_choice("2.5"), json!(2.5));
        assert_eq!(coerce_choice("abc"), json!("abc"));
        assert_eq!(coerce_choice(""), json!(""));
    }

    #[test]
    fn has_answer_accepts_zero_but_not_blank() {
        assert!(has_answer(Some(&json!(0))));
        assert!(has_answer(Some(&json!(false))));
        assert!(!has_answer(Some(&json!("  "))));
        assert!(!has_answer(Some(&json!([]))));
        assert!(!has_answer(None));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(strictly_equal(&json!(1), &json!(1.0)));
        assert!(!strictly_equal(&json!(1), &json!("1")));
    }
}
