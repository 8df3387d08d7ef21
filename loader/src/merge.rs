//! Folding a series of incoming resources into an existing package.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::diff::values_differ;
use crate::outcome::{FieldChange, LoadWarning};
use crate::types::{Package, Resource};

/// Merges the resources of an incoming package into an existing one.
///
/// Resources are identified by a token embedded in their description: the first
/// whitespace-separated word starting with `resource_id_prefix`, without the prefix.
#[derive(Debug, Clone)]
pub struct ResourceMerger {
    resource_id_prefix: String,
    invariant_fields: Vec<String>,
}

/// Result of [`ResourceMerger::merge`].
#[derive(Debug, Clone)]
pub struct MergedPackage {
    pub package: Package,
    pub warning: Option<LoadWarning>,
}

impl ResourceMerger {
    pub fn new(resource_id_prefix: impl Into<String>, invariant_fields: Vec<String>) -> Self {
        Self {
            resource_id_prefix: resource_id_prefix.into(),
            invariant_fields,
        }
    }

    pub fn resource_id_prefix(&self) -> &str {
        &self.resource_id_prefix
    }

    /// Extracts the identity token of `resource`, if its description carries one.
    pub fn resource_id<'r>(&self, resource: &'r Resource) -> Option<&'r str> {
        resource
            .description
            .split_whitespace()
            .find_map(|word| word.strip_prefix(self.resource_id_prefix.as_str()))
            .filter(|token| !token.is_empty())
    }

    /// Returns `incoming` with its resources merged into those of `existing`.
    ///
    /// Every field except `resources` is taken from `incoming`. Each incoming resource replaces
    /// the existing resource with the same token in place, or is appended when there is none.
    /// Resources without a token are always appended. Changes to fields declared invariant are
    /// reported as a warning.
    pub fn merge(&self, existing: &Package, incoming: Package) -> MergedPackage {
        info!(package = %existing.name, "merging resources");
        debug!(existing = ?existing.resources, incoming = ?incoming.resources, "resources before merge");

        let warning = self.check_invariant_fields(existing, &incoming);

        let mut merged = incoming;
        let incoming_resources = std::mem::replace(&mut merged.resources, existing.resources.clone());

        for resource in incoming_resources {
            let position = self.resource_id(&resource).and_then(|token| {
                merged
                    .resources
                    .iter()
                    .position(|candidate| self.resource_id(candidate) == Some(token))
            });

            match position {
                Some(index) => merged.resources[index] = resource,
                None => merged.resources.push(resource),
            }
        }

        debug!(merged = ?merged.resources, "resources after merge");

        MergedPackage {
            package: merged,
            warning,
        }
    }

    fn check_invariant_fields(&self, existing: &Package, incoming: &Package) -> Option<LoadWarning> {
        let changes: Vec<FieldChange> = self
            .invariant_fields
            .iter()
            .filter_map(|field| {
                let (before, after) = if existing.has_top_level(field) || incoming.has_top_level(field)
                {
                    (existing.top_level_value(field), incoming.top_level_value(field))
                } else {
                    (existing.extra_value(field), incoming.extra_value(field))
                };

                let changed = match &after {
                    Some(after) => values_differ(before.as_ref(), after, &[]),
                    None => values_differ(None, before.as_ref().unwrap_or(&Value::Null), &[]),
                };

                changed.then(|| FieldChange {
                    field: field.clone(),
                    before: before.as_ref().map(render),
                    after: after.as_ref().map(render),
                })
            })
            .collect();

        if changes.is_empty() {
            return None;
        }

        let warning = LoadWarning::InvariantFieldsChanged {
            package: existing.name.clone(),
            changes,
        };
        warn!("{warning}");

        Some(warning)
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
