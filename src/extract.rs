//! Dot/bracket path lookups into JSON response bodies.
use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};

use crate::context::Context;

/// Locates a value inside `value` by a path such as `data.items[1].id`.
///
/// `name[N]` is read as the two segments `name` and `N`. Object segments are
/// plain key lookups; array segments must be all digits and in range. A `null`
/// or scalar value with segments left to walk ends the lookup with `None`.
/// Malformed paths never panic, they just miss.
#[must_use]
pub fn extract<'value>(value: &'value Value, path: &str) -> Option<&'value Value> {
    let mut current = value;
    for segment in path_segments(path) {
        current = match current {
            Value::Object(map) => map.get(segment)?,
            Value::Array(items) => {
                if !is_array_index(segment) {
                    return None;
                }
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => return None,
        };
    }
    Some(current)
}

/// Like [`extract`], but only succeeds when the addressed value is a string.
#[must_use]
pub fn extract_str<'value>(value: &'value Value, path: &str) -> Option<&'value str> {
    extract(value, path).and_then(Value::as_str)
}

/// Runs every `context key -> path` pair of `mapping` against `body`.
///
/// Found values land in the returned overlay. A miss is not an error: it is
/// logged against `source` and the key is simply left out.
#[must_use]
pub fn extract_overlay(body: &Value, mapping: &BTreeMap<String, String>, source: &str) -> Context {
    let mut overlay = Context::new();
    for (key, path) in mapping {
        match extract(body, path) {
            Some(found) => {
                debug!("{}: extracted '{}' from '{}'", source, key, path);
                overlay.insert(key.as_str(), found.clone());
            }
            None => {
                warn!(
                    "{}: nothing found at '{}', context key '{}' not set",
                    source, path, key
                );
            }
        }
    }
    overlay
}

fn path_segments(path: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    for part in path.split('.') {
        push_part_segments(part, &mut segments);
    }
    segments
}

/// Expands trailing `[N]` groups of one dot-separated part.
fn push_part_segments<'path>(part: &'path str, segments: &mut Vec<&'path str>) {
    let mut name = part;
    let mut indexes = Vec::new();
    while let Some(inner) = name.strip_suffix(']') {
        let Some(open) = inner.rfind('[') else {
            break;
        };
        let (head, bracketed) = inner.split_at(open);
        let index = bracketed.trim_start_matches('[');
        if !is_array_index(index) {
            break;
        }
        indexes.push(index);
        name = head;
    }

    if indexes.is_empty() {
        segments.push(part);
        return;
    }
    if !name.is_empty() {
        segments.push(name);
    }
    segments.extend(indexes.into_iter().rev());
}

fn is_array_index(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit())
}
