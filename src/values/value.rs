//! Typed template input values.
//!
//! Hosts hand over every input as a raw string. [`coerce`] turns it into a
//! [`Value`] by trying a JSON decode first and falling back to the plain
//! string when the input is not JSON.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{KableError, Result};

/// A typed template input.
///
/// The variant set is closed: template expansion relies on every input
/// being one of these four shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Short name of the variant, used in type mismatch messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::String(_) => "string",
            Value::Map(_) => "map",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a dotted path (`a.b.c`) through nested maps.
    pub fn lookup(&self, path: &[&str]) -> Option<&Value> {
        let mut current = self;
        for key in path {
            current = current.as_map()?.get(*key)?;
        }
        Some(current)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::String(s) => f.write_str(s),
            // Maps render as JSON, which is also a valid YAML flow mapping.
            Value::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

/// Coerce a raw input string into a [`Value`].
///
/// JSON objects become [`Value::Map`], booleans [`Value::Bool`], integers
/// that fit in `i64` [`Value::Int`] and JSON strings the decoded
/// [`Value::String`]. Anything that is not valid JSON is kept verbatim as a
/// string. Arrays, floats and `null` have no variant and are rejected.
///
/// # Example
///
/// ```
/// use kable::values::{coerce, Value};
///
/// assert_eq!(coerce("flag", "true").unwrap(), Value::Bool(true));
/// assert_eq!(coerce("name", "Option 1").unwrap(), Value::String("Option 1".into()));
/// assert!(coerce("ports", "[80, 443]").is_err());
/// ```
pub fn coerce(name: &str, raw: &str) -> Result<Value> {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(decoded) => from_json(name, decoded),
        Err(_) => Ok(Value::String(raw.to_string())),
    }
}

fn from_json(name: &str, json: serde_json::Value) -> Result<Value> {
    use serde_json::Value as Json;

    match json {
        Json::Bool(b) => Ok(Value::Bool(b)),
        Json::String(s) => Ok(Value::String(s)),
        Json::Number(n) => n.as_i64().map(Value::Int).ok_or_else(|| unsupported(name, "float")),
        Json::Object(members) => {
            let mut map = BTreeMap::new();
            for (key, member) in members {
                let value = from_json(&format!("{name}.{key}"), member)?;
                map.insert(key, value);
            }
            Ok(Value::Map(map))
        }
        Json::Array(_) => Err(unsupported(name, "array")),
        Json::Null => Err(unsupported(name, "null")),
    }
}

fn unsupported(name: &str, kind: &str) -> KableError {
    KableError::UnsupportedValueType {
        name: name.to_string(),
        kind: kind.to_string(),
    }
}
