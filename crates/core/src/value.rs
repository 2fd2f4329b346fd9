//! Small value-handling helpers shared across crates.

use crate::{HivebaseError, HivebaseResult};
use serde_json::Value;

/// Parse a human boolean: "yes"/"y"/"true"/"t"/"1" and their negations.
pub fn parse_boolish(value: &str) -> HivebaseResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "yes" | "y" | "true" | "t" | "1" => Ok(true),
        "no" | "n" | "false" | "f" | "0" => Ok(false),
        other => Err(HivebaseError::Validation(format!(
            "invalid boolean value '{other}'"
        ))),
    }
}

/// True when the value is a non-empty array of JSON objects, i.e. tabular.
pub fn is_object_rows(value: &Value) -> bool {
    match value {
        Value::Array(rows) => !rows.is_empty() && rows.iter().all(Value::is_object),
        _ => false,
    }
}

/// Render a scalar JSON value as plain text (no quotes around strings).
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_boolish() {
        assert!(parse_boolish("Yes").unwrap());
        assert!(parse_boolish("t").unwrap());
        assert!(parse_boolish("1").unwrap());
        assert!(!parse_boolish("NO").unwrap());
        assert!(!parse_boolish("0").unwrap());
        assert!(parse_boolish("maybe").is_err());
    }

    #[test]
    fn test_is_object_rows() {
        assert!(is_object_rows(&json!([{"a": 1}, {"a": 2}])));
        assert!(!is_object_rows(&json!([])));
        assert!(!is_object_rows(&json!([1, 2])));
        assert!(!is_object_rows(&json!({"a": 1})));
    }

    #[test]
    fn test_scalar_to_string() {
        assert_eq!(scalar_to_string(&json!("hi")), "hi");
        assert_eq!(scalar_to_string(&json!(3)), "3");
        assert_eq!(scalar_to_string(&Value::Null), "");
    }
}
