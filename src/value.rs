//! Data payloads crossing the template boundary.
//!
//! Hosts hand render data over as a [`Value`], a small tagged-variant type
//! covering exactly the shapes a template can address: null, booleans,
//! numbers, strings, arrays and string-keyed objects. Anything else (function
//! values, handles) is unrepresentable by construction, so no runtime
//! rejection path is needed. `Value` converts losslessly from
//! `serde_json::Value`, which is the common interchange shape at the host
//! boundary.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A render data value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

impl Value {
    /// An empty object, the usual starting point for render data.
    pub fn object() -> Value {
        Value::Object(BTreeMap::new())
    }

    /// Walk `keys` through nested objects. An empty path addresses `self`.
    pub fn get_path(&self, keys: &[String]) -> Option<&Value> {
        let mut current = self;
        for key in keys {
            match current {
                Value::Object(map) => current = map.get(key)?,
                _ => return None,
            }
        }
        Some(current)
    }

    /// Truthiness for `{{if}}`: null, false, zero and empty collections are
    /// false; everything else is true.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0,
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Object(map) => !map.is_empty(),
        }
    }
}

/// Interpolation output: null renders as nothing, strings verbatim, and
/// arrays/objects as their JSON serialization.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => f.write_str(s),
            Value::Array(_) | Value::Object(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Value {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or_default()),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Value {
        Value::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Value {
        Value::Number(n as f64)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Value {
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = Value::from(json!({"title": "home", "tags": ["a", "b"], "count": 3}));
        let Value::Object(map) = &value else {
            panic!("expected object");
        };
        assert_eq!(map.get("title"), Some(&Value::String("home".into())));
        assert_eq!(map.get("count"), Some(&Value::Number(3.0)));
    }

    #[test]
    fn test_get_path() {
        let value = Value::from(json!({"user": {"name": "ada"}}));
        let got = value.get_path(&["user".into(), "name".into()]);
        assert_eq!(got, Some(&Value::String("ada".into())));
        assert_eq!(value.get_path(&["user".into(), "email".into()]), None);
        assert_eq!(value.get_path(&[]), Some(&value));
    }

    #[test]
    fn test_truthiness() {
        assert!(!Value::Null.truthy());
        assert!(!Value::String(String::new()).truthy());
        assert!(!Value::Array(vec![]).truthy());
        assert!(Value::Number(1.5).truthy());
        assert!(Value::from("x").truthy());
    }

    #[test]
    fn test_display() {
        assert_eq!(Value::Null.to_string(), "");
        assert_eq!(Value::Number(42.0).to_string(), "42");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::from(json!([1, 2])).to_string(), "[1.0,2.0]");
    }

    #[test]
    fn test_untagged_serde_round_trip() {
        let value = Value::from(json!({"n": null, "ok": true}));
        let text = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, back);
    }
}
