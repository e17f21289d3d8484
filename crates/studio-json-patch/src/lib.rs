//! RFC 6902 JSON Patch over `serde_json::Value`.
//!
//! [`apply`] applies a sequence of [`PatchOp`]s to a document atomically: if
//! any operation fails — an unresolved path, a failed `test`, a
//! type-incompatible operation — the whole patch fails with a
//! [`StudioError::validation`] and the input is left untouched (callers get
//! back an `Err`, never a partially-mutated document).

#![deny(unsafe_code)]
#![warn(missing_docs)]

/// RFC 6901 JSON Pointer parsing and resolution.
pub mod pointer;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use studio_error::StudioError;

use pointer::{parse_index, Pointer};

/// A single RFC 6902 patch operation. Paths are JSON Pointers (RFC 6901);
/// `"-"` addresses "append" at the end of an array for `add`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    /// Insert `value` at `path`, or append if the last segment is `"-"`.
    /// If `path` already has a value, it is replaced.
    Add {
        /// Target location.
        path: String,
        /// Value to insert.
        value: Value,
    },
    /// Remove the value at `path`.
    Remove {
        /// Target location.
        path: String,
    },
    /// Replace the value at `path`, which must already exist.
    Replace {
        /// Target location.
        path: String,
        /// New value.
        value: Value,
    },
    /// Remove the value at `from` and insert it at `path`.
    Move {
        /// Source location.
        from: String,
        /// Target location.
        path: String,
    },
    /// Copy the value at `from` to `path`.
    Copy {
        /// Source location.
        from: String,
        /// Target location.
        path: String,
    },
    /// Assert that the value at `path` equals `value`; fails the whole
    /// patch otherwise.
    Test {
        /// Target location.
        path: String,
        /// Expected value.
        value: Value,
    },
}

/// Apply `ops` to `doc` in order, returning the resulting document.
///
/// All-or-nothing: operations are applied to a clone of `doc`, so a failure
/// partway through never mutates the caller's copy.
pub fn apply(doc: &Value, ops: &[PatchOp]) -> Result<Value, StudioError> {
    let mut working = doc.clone();
    for op in ops {
        apply_one(&mut working, op)?;
    }
    Ok(working)
}

fn apply_one(doc: &mut Value, op: &PatchOp) -> Result<(), StudioError> {
    match op {
        PatchOp::Add { path, value } => add(doc, path, value.clone()),
        PatchOp::Remove { path } => remove(doc, path).map(|_| ()),
        PatchOp::Replace { path, value } => replace(doc, path, value.clone()),
        PatchOp::Move { from, path } => {
            if path_is_prefix_of(from, path) {
                return Err(StudioError::validation(
                    "move: destination path cannot be a child of the source path",
                ));
            }
            let value = remove(doc, from)?;
            add(doc, path, value)
        }
        PatchOp::Copy { from, path } => {
            let value = get(doc, from)?.clone();
            add(doc, path, value)
        }
        PatchOp::Test { path, value } => {
            let actual = get(doc, path)?;
            if actual == value {
                Ok(())
            } else {
                Err(StudioError::validation(format!(
                    "test failed at {path}: expected {value}, found {actual}"
                )))
            }
        }
    }
}

fn path_is_prefix_of(from: &str, path: &str) -> bool {
    path == from || path.starts_with(&format!("{from}/"))
}

fn get<'a>(doc: &'a Value, raw_path: &str) -> Result<&'a Value, StudioError> {
    let pointer = Pointer::parse(raw_path)?;
    pointer::resolve(doc, &pointer)
}

fn add(doc: &mut Value, raw_path: &str, value: Value) -> Result<(), StudioError> {
    let pointer = Pointer::parse(raw_path)?;
    if pointer.is_root() {
        *doc = value;
        return Ok(());
    }
    let parent = navigate_mut(doc, pointer.parent_tokens())?;
    let key = pointer.last_token().expect("non-root pointer has a last token");
    match parent {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            if key == "-" {
                arr.push(value);
            } else {
                let idx = parse_index(key, arr.len())?;
                arr.insert(idx, value);
            }
            Ok(())
        }
        _ => Err(StudioError::validation(format!(
            "cannot add into a scalar value at {raw_path}"
        ))),
    }
}

fn remove(doc: &mut Value, raw_path: &str) -> Result<Value, StudioError> {
    let pointer = Pointer::parse(raw_path)?;
    if pointer.is_root() {
        return Err(StudioError::validation(
            "cannot remove the document root",
        ));
    }
    let parent = navigate_mut(doc, pointer.parent_tokens())?;
    let key = pointer.last_token().expect("non-root pointer has a last token");
    match parent {
        Value::Object(map) => map
            .remove(key)
            .ok_or_else(|| StudioError::validation(format!("path {raw_path} not found"))),
        Value::Array(arr) => {
            if key == "-" {
                return Err(StudioError::validation(
                    "'-' is not a valid index to remove",
                ));
            }
            let idx = parse_index(key, arr.len().saturating_sub(1))?;
            if idx >= arr.len() {
                return Err(StudioError::validation(format!(
                    "array index {idx} out of bounds"
                )));
            }
            Ok(arr.remove(idx))
        }
        _ => Err(StudioError::validation(format!(
            "cannot remove from a scalar value at {raw_path}"
        ))),
    }
}

fn replace(doc: &mut Value, raw_path: &str, value: Value) -> Result<(), StudioError> {
    // RFC 6902: replace requires the target member to already exist.
    get(doc, raw_path)?;
    let pointer = Pointer::parse(raw_path)?;
    if pointer.is_root() {
        *doc = value;
        return Ok(());
    }
    let parent = navigate_mut(doc, pointer.parent_tokens())?;
    let key = pointer.last_token().expect("non-root pointer has a last token");
    match parent {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            let idx = parse_index(key, arr.len().saturating_sub(1))?;
            arr[idx] = value;
            Ok(())
        }
        _ => Err(StudioError::validation(format!(
            "cannot replace within a scalar value at {raw_path}"
        ))),
    }
}

fn navigate_mut<'a>(doc: &'a mut Value, tokens: &[String]) -> Result<&'a mut Value, StudioError> {
    let mut current = doc;
    for token in tokens {
        current = match current {
            Value::Object(map) => map
                .get_mut(token)
                .ok_or_else(|| StudioError::validation(format!("path segment {token:?} not found")))?,
            Value::Array(arr) => {
                let idx = parse_index(token, arr.len().saturating_sub(1))?;
                arr.get_mut(idx)
                    .ok_or_else(|| StudioError::validation(format!("array index {idx} out of bounds")))?
            }
            _ => {
                return Err(StudioError::validation(format!(
                    "cannot descend into a scalar value with segment {token:?}"
                )))
            }
        };
    }
    Ok(current)
}
