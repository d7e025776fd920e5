//! Fail-fast typed access into `serde_json::Value` trees.

use serde_json::{Map, Value};

use crate::resolver::error::ResolveError;

fn field<'a>(value: &'a Value, key: &str) -> Result<&'a Value, ResolveError> {
    value
        .get(key)
        .ok_or_else(|| ResolveError::Structure(format!("missing key `{key}`")))
}

fn mistyped(key: &str, expected: &str) -> ResolveError {
    ResolveError::Structure(format!("key `{key}` is not {expected}"))
}

pub fn get_object<'a>(value: &'a Value, key: &str) -> Result<&'a Value, ResolveError> {
    let v = field(value, key)?;
    if v.is_object() {
        Ok(v)
    } else {
        Err(mistyped(key, "an object"))
    }
}

pub fn get_map<'a>(value: &'a Value, key: &str) -> Result<&'a Map<String, Value>, ResolveError> {
    field(value, key)?
        .as_object()
        .ok_or_else(|| mistyped(key, "an object"))
}

pub fn get_array<'a>(value: &'a Value, key: &str) -> Result<&'a [Value], ResolveError> {
    field(value, key)?
        .as_array()
        .map(Vec::as_slice)
        .ok_or_else(|| mistyped(key, "an array"))
}

pub fn get_str<'a>(value: &'a Value, key: &str) -> Result<&'a str, ResolveError> {
    field(value, key)?
        .as_str()
        .ok_or_else(|| mistyped(key, "a string"))
}

pub fn get_i64(value: &Value, key: &str) -> Result<i64, ResolveError> {
    field(value, key)?
        .as_i64()
        .ok_or_else(|| mistyped(key, "an integer"))
}

pub fn get_bool(value: &Value, key: &str) -> Result<bool, ResolveError> {
    field(value, key)?
        .as_bool()
        .ok_or_else(|| mistyped(key, "a boolean"))
}

/// Walks a chain of nested objects.
pub fn get_path<'a>(value: &'a Value, keys: &[&str]) -> Result<&'a Value, ResolveError> {
    keys.iter().try_fold(value, |current, key| get_object(current, key))
}
