//! Lenient deserializers for registry fields that arrive as numbers or strings

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

/// Accept `123`, `"123"` or `" 123 "` as a `u64`
pub fn u64_from_any<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("expected unsigned integer, got {}", n))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("expected numeric string, got {:?}", s))),
        other => Err(de::Error::custom(format!("expected number or string, got {}", other))),
    }
}

/// Accept a number, a string or null; empty strings become `None`
pub fn opt_string_from_any<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(deserialize_with = "u64_from_any")]
        id: u64,
        #[serde(default, deserialize_with = "opt_string_from_any")]
        zip: Option<String>,
    }

    #[test]
    fn test_number_or_string() {
        let a: Probe = serde_json::from_str(r#"{"id": 554782, "zip": 11000}"#).unwrap();
        assert_eq!(a.id, 554782);
        assert_eq!(a.zip.as_deref(), Some("11000"));

        let b: Probe = serde_json::from_str(r#"{"id": "554782", "zip": ""}"#).unwrap();
        assert_eq!(b.id, 554782);
        assert_eq!(b.zip, None);

        let c: Probe = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert_eq!(c.zip, None);

        assert!(serde_json::from_str::<Probe>(r#"{"id": true}"#).is_err());
    }
}
