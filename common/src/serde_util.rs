//! Lenient deserializers for backend payloads.
//!
//! The backend is not consistent about identifier types (numbers vs strings)
//! or about provenance fields (plain name vs `{ "name": ... }`). Everything is
//! normalized to plain strings at this boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Converts a scalar JSON value into an identifier string.
pub fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `Option<String>` identifier that also accepts numbers.
pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_to_id))
}

/// Identifier that also accepts numbers; absent or null becomes an empty string.
pub fn id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_id(deserializer)?.unwrap_or_default())
}

/// Provenance field: either a plain string or an object carrying `name`.
pub fn provenance<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map
            .get("name")
            .or_else(|| map.get("username"))
            .and_then(value_to_id),
        Some(other) => value_to_id(&other),
        None => None,
    })
}

/// Number that tolerates null / strings / garbage by yielding NaN.
pub fn lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(f64::NAN),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(f64::NAN),
        _ => f64::NAN,
    })
}

/// Optional number that tolerates numeric strings.
pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Key/value map whose scalar values may arrive as numbers or booleans.
pub fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Object(map)) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(map
        .into_iter()
        .filter_map(|(k, v)| {
            let text = match v {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            Some((k, text))
        })
        .collect())
}

pub fn nan() -> f64 {
    f64::NAN
}

/// Coerces a list payload into a vector.
///
/// Accepts a bare array or an envelope `{ "data": [...] }`; anything else is
/// treated as empty. Elements that fail to parse are dropped.
pub fn coerce_list<T: serde::de::DeserializeOwned>(value: Value) -> Vec<T> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => Vec::new(),
    };
    items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "opt_id")]
        id: Option<String>,
        #[serde(default, deserialize_with = "provenance")]
        by: Option<String>,
        #[serde(default = "nan", deserialize_with = "lenient_f64")]
        n: f64,
    }

    #[test]
    fn test_numeric_and_string_ids() {
        let a: Probe = serde_json::from_value(json!({"id": 42})).unwrap();
        let b: Probe = serde_json::from_value(json!({"id": "42"})).unwrap();
        assert_eq!(a.id.as_deref(), Some("42"));
        assert_eq!(b.id.as_deref(), Some("42"));
    }

    #[test]
    fn test_provenance_shapes() {
        let s: Probe = serde_json::from_value(json!({"by": "alice"})).unwrap();
        let o: Probe = serde_json::from_value(json!({"by": {"name": "bob", "id": 3}})).unwrap();
        let n: Probe = serde_json::from_value(json!({"by": null})).unwrap();
        assert_eq!(s.by.as_deref(), Some("alice"));
        assert_eq!(o.by.as_deref(), Some("bob"));
        assert!(n.by.is_none());
    }

    #[test]
    fn test_lenient_number() {
        let missing: Probe = serde_json::from_value(json!({})).unwrap();
        let text: Probe = serde_json::from_value(json!({"n": "1.5"})).unwrap();
        assert!(missing.n.is_nan());
        assert_eq!(text.n, 1.5);
    }

    #[test]
    fn test_string_map_scalars() {
        #[derive(Deserialize)]
        struct Readings {
            #[serde(default, deserialize_with = "string_map")]
            r: BTreeMap<String, String>,
        }
        let v: Readings =
            serde_json::from_value(json!({"r": {"voltage": 230, "phase": "A", "x": null}})).unwrap();
        assert_eq!(v.r.get("voltage").map(String::as_str), Some("230"));
        assert_eq!(v.r.get("phase").map(String::as_str), Some("A"));
        assert!(!v.r.contains_key("x"));
        let empty: Readings = serde_json::from_value(json!({"r": null})).unwrap();
        assert!(empty.r.is_empty());
    }

    #[test]
    fn test_coerce_list_shapes() {
        let bare: Vec<u32> = coerce_list(json!([1, 2, 3]));
        let envelope: Vec<u32> = coerce_list(json!({"data": [4, 5]}));
        let garbage: Vec<u32> = coerce_list(json!({"message": "oops"}));
        let mixed: Vec<u32> = coerce_list(json!([1, "x", 2]));
        assert_eq!(bare, vec![1, 2, 3]);
        assert_eq!(envelope, vec![4, 5]);
        assert!(garbage.is_empty());
        assert_eq!(mixed, vec![1, 2]);
    }
}
