//! Structural comparison of package trees.
//!
//! [`values_differ`] is the one recursive compare used both to decide whether a package needs to
//! be written and to check search results against the identifying fields of a package.

use serde_json::Value;

use crate::error::{ErrorKind, LoaderResult};
use crate::loader_error;
use crate::types::Package;

/// Keys that never make a package count as changed: group membership and the import source.
pub const IGNORED_PACKAGE_KEYS: &[&str] = &["groups", "import_source"];

/// Returns `true` if `candidate` differs from `existing`.
///
/// Objects are compared over the keys of `candidate`, skipping `ignored_keys` at every level, so
/// keys only present in `existing` (such as server-generated metadata) never count as a change.
/// Arrays must have the same length and pairwise equal elements. Any other value is compared as
/// a scalar, with `null`, an absent value, `""`, `[]` and `{}` all considered equal.
pub fn values_differ(existing: Option<&Value>, candidate: &Value, ignored_keys: &[&str]) -> bool {
    match (existing, candidate) {
        (_, Value::Object(candidate_map)) => {
            let existing_map = existing.and_then(Value::as_object);

            candidate_map
                .iter()
                .filter(|(key, _)| !ignored_keys.contains(&key.as_str()))
                .any(|(key, candidate_value)| {
                    let existing_value = existing_map.and_then(|map| map.get(key));
                    values_differ(existing_value, candidate_value, ignored_keys)
                })
        }
        (Some(Value::Array(existing_items)), Value::Array(candidate_items)) => {
            existing_items.len() != candidate_items.len()
                || existing_items
                    .iter()
                    .zip(candidate_items)
                    .any(|(existing_item, candidate_item)| {
                        values_differ(Some(existing_item), candidate_item, ignored_keys)
                    })
        }
        _ => normalized(existing) != normalized(Some(candidate)),
    }
}

/// Maps every "no value" representation to `None`.
fn normalized(value: Option<&Value>) -> Option<&Value> {
    value.filter(|value| match value {
        Value::Null => false,
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        Value::Bool(_) | Value::Number(_) => true,
    })
}

/// Returns `true` if writing `candidate` over `existing` would change anything that matters.
pub fn package_has_changed(existing: &Package, candidate: &Package) -> LoaderResult<bool> {
    let existing = to_value(existing)?;
    let candidate = to_value(candidate)?;

    Ok(values_differ(
        Some(&existing),
        &candidate,
        IGNORED_PACKAGE_KEYS,
    ))
}

fn to_value(package: &Package) -> LoaderResult<Value> {
    serde_json::to_value(package).map_err(|err| {
        loader_error!(
            ErrorKind::SerializationError,
            "Package could not be serialized for comparison",
            format!("package '{}': {err}", package.name),
            source: err
        )
    })
}
