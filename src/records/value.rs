//! Nested field addressing over JSON record values.
//!
//! Paths are sequences of segments. A segment addresses an object key, or an
//! array index when the container at that level is an array.

use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PathError {
    #[error("path must not contain empty segments")]
    EmptySegment,
    #[error("segment '{0}' is not a valid array index")]
    NotAnIndex(String),
    #[error("index {index} is out of bounds for array of length {len}")]
    OutOfBounds { index: usize, len: usize },
}

/// Split a dotted path such as `hero.items.0.title` into segments.
pub fn parse_path(path: &str) -> Result<Vec<&str>, PathError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(PathError::EmptySegment);
    }
    Ok(segments)
}

/// Look up the value at `path`, if every segment resolves.
pub fn get_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(root, |current, segment| match current {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Return a copy of `root` with the value at `path` replaced by `new_value`.
///
/// `root` is left untouched. Intermediate scalars (and missing keys) become
/// empty objects. Array segments may replace an existing element or append at
/// exactly `len`.
pub fn set_path(root: &Value, path: &[&str], new_value: Value) -> Result<Value, PathError> {
    let Some((segment, rest)) = path.split_first() else {
        return Ok(new_value);
    };

    match root {
        Value::Array(items) => {
            let index = segment
                .parse::<usize>()
                .map_err(|_| PathError::NotAnIndex(segment.to_string()))?;
            let len = items.len();
            let mut items = items.clone();
            if index < len {
                items[index] = set_path(&items[index], rest, new_value)?;
            } else if index == len {
                items.push(set_path(&Value::Null, rest, new_value)?);
            } else {
                return Err(PathError::OutOfBounds { index, len });
            }
            Ok(Value::Array(items))
        }
        Value::Object(map) => {
            let mut map = map.clone();
            let child = map.get(*segment).unwrap_or(&Value::Null);
            let updated = set_path(child, rest, new_value)?;
            map.insert(segment.to_string(), updated);
            Ok(Value::Object(map))
        }
        _ => {
            let mut map = Map::new();
            map.insert(
                segment.to_string(),
                set_path(&Value::Null, rest, new_value)?,
            );
            Ok(Value::Object(map))
        }
    }
}
