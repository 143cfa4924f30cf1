//! The merged set of template inputs for one render.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::value::{coerce, Value};
use crate::error::Result;

/// Placeholder shown instead of a sensitive value.
pub const REDACTED: &str = "[REDACTED]";

/// A coerced input together with its redaction flag.
#[derive(Clone, PartialEq, Eq)]
pub struct InputValue {
    pub value: Value,
    /// Only honored by logging and render info, never by expansion.
    pub sensitive: bool,
}

impl fmt::Debug for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sensitive {
            f.write_str(REDACTED)
        } else {
            write!(f, "{:?}", self.value)
        }
    }
}

/// Typed template inputs keyed by name.
///
/// # Example
///
/// ```
/// use kable::values::{Value, ValueMap};
///
/// let plain = vec![("instanceName".to_string(), "test".to_string())];
/// let sensitive = vec![("token".to_string(), "s3cr3t".to_string())];
/// let values = ValueMap::from_raw(&plain, &sensitive).unwrap();
///
/// assert_eq!(values.get("instanceName"), Some(&Value::String("test".into())));
/// assert!(!format!("{values:?}").contains("s3cr3t"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ValueMap {
    entries: BTreeMap<String, InputValue>,
}

impl ValueMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coerce and merge plain and sensitive raw inputs.
    ///
    /// A name present in both sets takes the sensitive value.
    pub fn from_raw(plain: &[(String, String)], sensitive: &[(String, String)]) -> Result<Self> {
        let mut map = Self::new();
        for (name, raw) in plain {
            map.insert(name.clone(), coerce(name, raw)?);
        }
        for (name, raw) in sensitive {
            map.insert_sensitive(name.clone(), coerce(name, raw)?);
        }
        Ok(map)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(
            name.into(),
            InputValue {
                value,
                sensitive: false,
            },
        );
    }

    pub fn insert_sensitive(&mut self, name: impl Into<String>, value: Value) {
        self.entries.insert(
            name.into(),
            InputValue {
                value,
                sensitive: true,
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.get(name).map(|input| &input.value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over all values in name order, sensitive ones included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries
            .iter()
            .map(|(name, input)| (name.as_str(), &input.value))
    }

    /// Only the values safe to record or display.
    pub fn non_sensitive(&self) -> BTreeMap<String, Value> {
        self.entries
            .iter()
            .filter(|(_, input)| !input.sensitive)
            .map(|(name, input)| (name.clone(), input.value.clone()))
            .collect()
    }

    /// Text of every sensitive string, for masking collaborator output.
    ///
    /// Strings nested in a sensitive map are included. Sensitive bools and
    /// ints are not, since masking their text would garble unrelated output.
    pub fn sensitive_strings(&self) -> Vec<String> {
        let mut out = Vec::new();
        for input in self.entries.values().filter(|input| input.sensitive) {
            collect_strings(&input.value, &mut out);
        }
        out
    }
}

fn collect_strings(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => out.push(s.clone()),
        Value::Map(members) => {
            out.push(value.to_string());
            for member in members.values() {
                collect_strings(member, out);
            }
        }
        Value::Bool(_) | Value::Int(_) => {}
    }
}

impl fmt::Debug for ValueMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

impl Serialize for ValueMap {
    /// Serializes the non-sensitive view only.
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.non_sensitive().serialize(serializer)
    }
}
