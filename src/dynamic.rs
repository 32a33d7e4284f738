//! Configuration values that are either literals or derived from context.
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::context::{Context, scalar_text};

/// A pure function of the current context.
pub type Derivation<T> = Arc<dyn Fn(&Context) -> T + Send + Sync>;

/// Either a fixed value or a value computed from the accumulated context.
///
/// Resolution branches on the variant; the derived form may only read the
/// context it is handed.
pub enum DynamicValue<T> {
    Literal(T),
    Derived(Derivation<T>),
}

impl<T: Clone> DynamicValue<T> {
    pub fn derived<F>(derive: F) -> Self
    where
        F: Fn(&Context) -> T + Send + Sync + 'static,
    {
        Self::Derived(Arc::new(derive))
    }

    /// Resolves the value against `context`.
    ///
    /// Never fails on its own; a derivation that panics is a configuration
    /// bug and propagates.
    #[must_use]
    pub fn resolve(&self, context: &Context) -> T {
        match self {
            DynamicValue::Literal(value) => value.clone(),
            DynamicValue::Derived(derive) => derive(context),
        }
    }

    #[must_use]
    pub const fn is_derived(&self) -> bool {
        matches!(self, DynamicValue::Derived(_))
    }
}

impl DynamicValue<String> {
    /// Builds a value from text that may contain `{{key}}` placeholders.
    ///
    /// Text without placeholders stays a literal.
    #[must_use]
    pub fn template(input: &str) -> Self {
        if !has_placeholder(input) {
            return DynamicValue::Literal(input.to_owned());
        }
        let template = input.to_owned();
        Self::derived(move |context| render_template(&template, context))
    }
}

impl DynamicValue<Value> {
    /// Builds a JSON value whose string leaves may contain `{{key}}`
    /// placeholders.
    ///
    /// A leaf that is exactly one placeholder takes the raw context value,
    /// so numbers stay numbers.
    #[must_use]
    pub fn json_template(value: Value) -> Self {
        if !json_has_placeholder(&value) {
            return DynamicValue::Literal(value);
        }
        Self::derived(move |context| render_json(&value, context))
    }
}

impl<T> Clone for DynamicValue<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        match self {
            DynamicValue::Literal(value) => DynamicValue::Literal(value.clone()),
            DynamicValue::Derived(derive) => DynamicValue::Derived(Arc::clone(derive)),
        }
    }
}

impl<T> fmt::Debug for DynamicValue<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DynamicValue::Derived(_) => f.write_str("Derived(<fn>)"),
        }
    }
}

impl From<&str> for DynamicValue<String> {
    fn from(value: &str) -> Self {
        DynamicValue::Literal(value.to_owned())
    }
}

impl From<String> for DynamicValue<String> {
    fn from(value: String) -> Self {
        DynamicValue::Literal(value)
    }
}

impl From<Value> for DynamicValue<Value> {
    fn from(value: Value) -> Self {
        DynamicValue::Literal(value)
    }
}

impl From<&str> for DynamicValue<Value> {
    fn from(value: &str) -> Self {
        DynamicValue::Literal(Value::String(value.to_owned()))
    }
}

impl From<i64> for DynamicValue<Value> {
    fn from(value: i64) -> Self {
        DynamicValue::Literal(Value::from(value))
    }
}

impl From<bool> for DynamicValue<Value> {
    fn from(value: bool) -> Self {
        DynamicValue::Literal(Value::Bool(value))
    }
}

/// Replaces `{{key}}` placeholders with context values; unknown keys and
/// keys holding `null` are left as written.
pub(crate) fn render_template(input: &str, context: &Context) -> String {
    let mut rest = input;
    let mut output = String::with_capacity(input.len());

    loop {
        let Some(start) = rest.find("{{") else {
            output.push_str(rest);
            break;
        };
        let (before, after_start) = rest.split_at(start);
        output.push_str(before);
        let Some(after) = after_start.strip_prefix("{{") else {
            output.push_str(after_start);
            break;
        };
        let Some(end) = after.find("}}") else {
            output.push_str("{{");
            output.push_str(after);
            break;
        };
        let (key_part, after_end) = after.split_at(end);
        let key = key_part.trim();
        if let Some(value) = context.text(key) {
            output.push_str(&value);
        } else {
            output.push_str("{{");
            output.push_str(key);
            output.push_str("}}");
        }
        rest = match after_end.strip_prefix("}}") {
            Some(remaining) => remaining,
            None => {
                output.push_str(after_end);
                break;
            }
        };
    }

    output
}

fn has_placeholder(input: &str) -> bool {
    input
        .find("{{")
        .and_then(|start| input.get(start..))
        .is_some_and(|tail| tail.contains("}}"))
}

fn json_has_placeholder(value: &Value) -> bool {
    match value {
        Value::String(text) => has_placeholder(text),
        Value::Array(items) => items.iter().any(json_has_placeholder),
        Value::Object(map) => map.values().any(json_has_placeholder),
        Value::Null | Value::Bool(_) | Value::Number(_) => false,
    }
}

fn render_json(value: &Value, context: &Context) -> Value {
    match value {
        Value::String(text) => {
            if let Some(key) = whole_placeholder(text)
                && let Some(found) = context.get(key)
            {
                return found.clone();
            }
            Value::String(render_template(text, context))
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| render_json(item, context))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), render_json(item, context)))
                .collect(),
        ),
        Value::Null | Value::Bool(_) | Value::Number(_) => value.clone(),
    }
}

fn whole_placeholder(text: &str) -> Option<&str> {
    let inner = text.trim().strip_prefix("{{")?.strip_suffix("}}")?;
    if inner.contains("{{") || inner.contains("}}") {
        return None;
    }
    Some(inner.trim())
}
