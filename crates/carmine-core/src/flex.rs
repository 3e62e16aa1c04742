//! Flex coercion for stringly-typed metadata fields.
//!
//! The two metadata serializations permit the same field to hold either a
//! string or a number (`"version": "1.5"` vs `"version": 1.5`). Everything
//! is coerced to a canonical string: strings pass through, numbers take
//! their concise representation, anything else becomes `"0"`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Coerce a metadata scalar to its canonical string form.
#[must_use]
pub fn flex_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i.to_string()
            } else if let Some(u) = n.as_u64() {
                u.to_string()
            } else if let Some(f) = n.as_f64() {
                // Display for f64 drops a trailing `.0`, so 2.0 prints as "2".
                format!("{f}")
            } else {
                "0".to_string()
            }
        }
        _ => "0".to_string(),
    }
}

/// Serde adapter for flex-typed fields: `#[serde(deserialize_with = ...)]`.
///
/// # Errors
/// Only fails when the underlying deserializer does; any scalar shape is
/// accepted and coerced.
pub fn deserialize_flex<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(flex_string(&value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strings_pass_through() {
        assert_eq!(flex_string(&json!("1.5")), "1.5");
        assert_eq!(flex_string(&json!("undef")), "undef");
    }

    #[test]
    fn numbers_take_concise_form() {
        assert_eq!(flex_string(&json!(2)), "2");
        assert_eq!(flex_string(&json!(1.5)), "1.5");
        assert_eq!(flex_string(&json!(2.97001)), "2.97001");
    }

    #[test]
    fn non_scalars_become_zero() {
        assert_eq!(flex_string(&json!(null)), "0");
        assert_eq!(flex_string(&json!([1, 2])), "0");
        assert_eq!(flex_string(&json!({"a": 1})), "0");
        assert_eq!(flex_string(&json!(true)), "0");
    }
}
