//! Small naming helpers shared by the data-flow and selection compilers.

use serde_json::Value;

/// Turns an arbitrary string into a valid signal/field identifier.
///
/// Every non-word character becomes `_`, and a leading digit run gets an
/// extra `_` prefix so the result never starts with a number.
pub fn var_name(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", replaced)
    } else {
        replaced
    }
}

/// Quotes a string as a JSON string literal, for splicing into expressions.
pub fn string_value(s: &str) -> String {
    Value::from(s).to_string()
}

/// `["field"]` property accessor, to append to an object expression.
pub fn access_path(field: &str) -> String {
    format!("[{}]", string_value(field))
}

/// `datum["field"]` accessor expression.
pub fn datum_ref(field: &str) -> String {
    format!("datum{}", access_path(field))
}

/// Formats a number the way the expression language prints it: integral
/// values without a fractional part.
pub fn number_to_string(n: f64) -> String {
    if n.fract() == 0.0 && n.is_finite() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Renders a JSON value the way string concatenation in the expression
/// language would (arrays are comma-joined, strings unquoted).
pub fn value_to_plain_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.as_f64().map(number_to_string).unwrap_or_else(|| n.to_string()),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(value_to_plain_string)
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

/// Renders a JSON value as an expression literal.
pub fn value_to_expr(value: &Value) -> String {
    match value {
        Value::Number(n) => n.as_f64().map(number_to_string).unwrap_or_else(|| n.to_string()),
        Value::Array(items) => format!(
            "[{}]",
            items.iter().map(value_to_expr).collect::<Vec<_>>().join(", ")
        ),
        other => other.to_string(),
    }
}
