use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// How incoming packages are matched against packages already in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchStrategyConfig {
    /// Match on the package name.
    ByName,
    /// Match on a single uniqueness field kept in the package extras.
    ByExtraField { key: String },
    /// Match on several identity fields and merge the resources of a series into one package.
    ResourceSeries {
        identity_fields: Vec<String>,
        /// Prefix marking the identity token inside a resource description, e.g. `ref:`.
        resource_id_prefix: String,
        /// Fields that are expected to stay the same across the series.
        #[serde(default)]
        invariant_fields: Vec<String>,
        /// Per field, groups of values that are treated as equal while searching.
        #[serde(default)]
        synonyms: BTreeMap<String, Vec<Vec<String>>>,
    },
}

impl MatchStrategyConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            MatchStrategyConfig::ByName => Ok(()),
            MatchStrategyConfig::ByExtraField { key } => {
                if key.trim().is_empty() {
                    return Err(ValidationError::invalid("strategy.key", "must not be empty"));
                }

                Ok(())
            }
            MatchStrategyConfig::ResourceSeries {
                identity_fields,
                resource_id_prefix,
                ..
            } => {
                if identity_fields.is_empty() {
                    return Err(ValidationError::invalid(
                        "strategy.identity_fields",
                        "must list at least one field",
                    ));
                }
                if resource_id_prefix.is_empty() {
                    return Err(ValidationError::invalid(
                        "strategy.resource_id_prefix",
                        "must not be empty",
                    ));
                }

                Ok(())
            }
        }
    }
}
