//! Lenient serde deserializers for fields that come from external records.
//!
//! Landing JSON is written by us, but older runs (and hand-edited files) may
//! hold `null`, bare numbers, or `"nan"` markers where a string is expected.
//! Everything is funnelled through `serde_json::Value` and checked for the
//! expected shape before any string operation runs on it.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::normalize::{clean_text, collapse_whitespace, to_decimal};

/// Accept a string or an integer; anything else becomes `None`.
pub fn opt_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(text_from_value))
}

/// Like [`opt_text`] for free text: whitespace is collapsed but marker words
/// such as "None" are kept.
pub fn opt_free_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) => collapse_whitespace(&s),
        _ => None,
    })
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()),
        Some(Value::String(s)) => to_decimal(Some(&s)),
        _ => None,
    })
}

pub fn opt_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite() && *v >= 0.0)
                .map(|v| v.round() as u64)
        }),
        Some(Value::String(s)) => {
            let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
            digits.parse().ok()
        }
        _ => None,
    })
}

/// Type-check a JSON value before treating it as text.
pub fn text_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => clean_text(Some(s)),
        // Identifiers sometimes arrive as bare integers.
        Value::Number(n) => n.as_u64().map(|v| v.to_string()),
        _ => None,
    }
}
