//! Strategies deciding which catalog package an incoming package replaces.

use loader_config::shared::MatchStrategyConfig;

use crate::bail;
use crate::error::{ErrorKind, LoaderError, LoaderResult};
use crate::merge::ResourceMerger;
use crate::types::SynonymTable;

static NO_SYNONYMS: SynonymTable = SynonymTable::new();

/// Decides how an incoming package is matched against the catalog and how it is written.
///
/// Strategies only differ in the identity fields and synonyms fed to the identity resolver and
/// in whether resources are merged. The orchestration itself lives in
/// [`PackageLoader`](crate::loader::PackageLoader).
pub trait MatchStrategy {
    /// Fields identifying a package. `["name"]` means a direct lookup by name.
    fn identity_fields(&self) -> &[String];

    /// Values treated as equal while searching, per identity field.
    fn synonyms(&self) -> &SynonymTable {
        &NO_SYNONYMS
    }

    /// Merger folding incoming resources into the matched package, if resources are merged.
    fn resource_merger(&self) -> Option<&ResourceMerger> {
        None
    }
}

/// Replaces the package with the same name.
#[derive(Debug, Clone)]
pub struct ReplaceByName {
    identity_fields: Vec<String>,
}

impl ReplaceByName {
    pub fn new() -> Self {
        Self {
            identity_fields: vec!["name".to_owned()],
        }
    }
}

impl Default for ReplaceByName {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchStrategy for ReplaceByName {
    fn identity_fields(&self) -> &[String] {
        &self.identity_fields
    }
}

/// Replaces the package carrying the same value in one uniqueness field, typically an extra
/// such as an external reference.
#[derive(Debug, Clone)]
pub struct ReplaceByExtraField {
    identity_fields: Vec<String>,
}

impl ReplaceByExtraField {
    pub fn new(key: impl Into<String>) -> LoaderResult<Self> {
        let key = key.into();
        if key.trim().is_empty() {
            bail!(
                ErrorKind::InvalidInput,
                "The uniqueness field of a strategy must not be empty"
            );
        }

        Ok(Self {
            identity_fields: vec![key],
        })
    }

    pub fn key(&self) -> &str {
        &self.identity_fields[0]
    }
}

impl MatchStrategy for ReplaceByExtraField {
    fn identity_fields(&self) -> &[String] {
        &self.identity_fields
    }
}

/// Loads a series of packages into one catalog package.
///
/// Each incoming package of the series is matched on several identity fields, with synonyms, and
/// its resources are merged into the matched package instead of replacing them.
#[derive(Debug, Clone)]
pub struct ResourceSeries {
    identity_fields: Vec<String>,
    synonyms: SynonymTable,
    merger: ResourceMerger,
}

impl ResourceSeries {
    pub fn new(
        identity_fields: Vec<String>,
        resource_id_prefix: impl Into<String>,
        invariant_fields: Vec<String>,
        synonyms: SynonymTable,
    ) -> LoaderResult<Self> {
        if identity_fields.is_empty() {
            bail!(
                ErrorKind::InvalidInput,
                "A resource series needs at least one identity field"
            );
        }

        let resource_id_prefix = resource_id_prefix.into();
        if resource_id_prefix.is_empty() {
            bail!(
                ErrorKind::InvalidInput,
                "A resource series needs a resource id prefix"
            );
        }

        Ok(Self {
            identity_fields,
            synonyms,
            merger: ResourceMerger::new(resource_id_prefix, invariant_fields),
        })
    }
}

impl MatchStrategy for ResourceSeries {
    fn identity_fields(&self) -> &[String] {
        &self.identity_fields
    }

    fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    fn resource_merger(&self) -> Option<&ResourceMerger> {
        Some(&self.merger)
    }
}

/// A strategy chosen at runtime from configuration.
#[derive(Debug, Clone)]
pub enum ConfiguredStrategy {
    ByName(ReplaceByName),
    ByExtraField(ReplaceByExtraField),
    ResourceSeries(ResourceSeries),
}

impl MatchStrategy for ConfiguredStrategy {
    fn identity_fields(&self) -> &[String] {
        match self {
            ConfiguredStrategy::ByName(strategy) => strategy.identity_fields(),
            ConfiguredStrategy::ByExtraField(strategy) => strategy.identity_fields(),
            ConfiguredStrategy::ResourceSeries(strategy) => strategy.identity_fields(),
        }
    }

    fn synonyms(&self) -> &SynonymTable {
        match self {
            ConfiguredStrategy::ByName(strategy) => strategy.synonyms(),
            ConfiguredStrategy::ByExtraField(strategy) => strategy.synonyms(),
            ConfiguredStrategy::ResourceSeries(strategy) => strategy.synonyms(),
        }
    }

    fn resource_merger(&self) -> Option<&ResourceMerger> {
        match self {
            ConfiguredStrategy::ByName(strategy) => strategy.resource_merger(),
            ConfiguredStrategy::ByExtraField(strategy) => strategy.resource_merger(),
            ConfiguredStrategy::ResourceSeries(strategy) => strategy.resource_merger(),
        }
    }
}

impl TryFrom<MatchStrategyConfig> for ConfiguredStrategy {
    type Error = LoaderError;

    fn try_from(config: MatchStrategyConfig) -> Result<Self, Self::Error> {
        let strategy = match config {
            MatchStrategyConfig::ByName => ConfiguredStrategy::ByName(ReplaceByName::new()),
            MatchStrategyConfig::ByExtraField { key } => {
                ConfiguredStrategy::ByExtraField(ReplaceByExtraField::new(key)?)
            }
            MatchStrategyConfig::ResourceSeries {
                identity_fields,
                resource_id_prefix,
                invariant_fields,
                synonyms,
            } => ConfiguredStrategy::ResourceSeries(ResourceSeries::new(
                identity_fields,
                resource_id_prefix,
                invariant_fields,
                synonyms,
            )?),
        };

        Ok(strategy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_by_name_looks_up_by_name() {
        let strategy = ReplaceByName::new();

        assert_eq!(strategy.identity_fields(), ["name"]);
        assert!(strategy.synonyms().is_empty());
        assert!(strategy.resource_merger().is_none());
    }

    #[test]
    fn test_extra_field_key_must_not_be_blank() {
        let err = ReplaceByExtraField::new("  ").unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(ReplaceByExtraField::new("ref").unwrap().key(), "ref");
    }

    #[test]
    fn test_resource_series_validates_inputs() {
        assert!(ResourceSeries::new(vec![], "ref:", vec![], SynonymTable::new()).is_err());
        assert!(
            ResourceSeries::new(vec!["title".to_owned()], "", vec![], SynonymTable::new()).is_err()
        );

        let series =
            ResourceSeries::new(vec!["title".to_owned()], "ref:", vec![], SynonymTable::new())
                .unwrap();
        assert_eq!(
            series.resource_merger().map(ResourceMerger::resource_id_prefix),
            Some("ref:")
        );
    }

    #[test]
    fn test_configured_strategy_from_config() {
        let strategy = ConfiguredStrategy::try_from(MatchStrategyConfig::ResourceSeries {
            identity_fields: vec!["title".to_owned(), "department".to_owned()],
            resource_id_prefix: "ref:".to_owned(),
            invariant_fields: vec!["title".to_owned()],
            synonyms: SynonymTable::from([(
                "department".to_owned(),
                vec![vec!["DCSF".to_owned(), "DfE".to_owned()]],
            )]),
        })
        .unwrap();

        assert_eq!(strategy.identity_fields(), ["title", "department"]);
        assert!(strategy.synonyms().contains_key("department"));
        assert!(strategy.resource_merger().is_some());

        let err = ConfiguredStrategy::try_from(MatchStrategyConfig::ByExtraField {
            key: String::new(),
        })
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
