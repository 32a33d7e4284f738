//! Key/value state threaded through a chain of requests or auth steps.
use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Values accumulated during one virtual-user iteration or one
/// authentication attempt.
///
/// Keys are only ever added or overwritten; there is no removal API. A later
/// write (or overlay) shadows an earlier value under the same key.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Context {
    values: BTreeMap<String, Value>,
}

impl Context {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns the stored value, or `Value::Null` when the key was never set.
    #[must_use]
    pub fn value(&self, key: &str) -> Value {
        self.values.get(key).cloned().unwrap_or(Value::Null)
    }

    /// Returns the stored value rendered as text, see [`scalar_text`].
    #[must_use]
    pub fn text(&self, key: &str) -> Option<String> {
        self.values.get(key).and_then(scalar_text)
    }

    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.values.insert(key.into(), value.into());
    }

    /// Merges `overlay` onto this context; overlay entries win.
    pub fn overlay(&mut self, overlay: Context) {
        self.values.extend(overlay.values);
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }
}

impl<K> FromIterator<(K, Value)> for Context
where
    K: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        }
    }
}

/// Text form of a value as it appears in URLs, query strings and templates.
///
/// Strings are used verbatim, numbers and booleans use their JSON spelling,
/// composites are serialized as compact JSON. `null` has no text form.
#[must_use]
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
