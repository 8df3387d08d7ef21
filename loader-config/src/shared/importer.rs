use serde::Deserialize;

use crate::Config;
use crate::shared::{CatalogConfig, MatchStrategyConfig, ValidationError};

const fn default_name_max_length() -> usize {
    ImporterConfig::DEFAULT_NAME_MAX_LENGTH
}

/// Complete configuration of the package importer.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct ImporterConfig {
    pub catalog: CatalogConfig,
    pub strategy: MatchStrategyConfig,
    /// Group every loaded package is added to, if any.
    #[serde(default)]
    pub group: Option<String>,
    /// Longest package name the catalog accepts.
    #[serde(default = "default_name_max_length")]
    pub name_max_length: usize,
}

impl ImporterConfig {
    pub const DEFAULT_NAME_MAX_LENGTH: usize = 100;

    /// Validates the complete importer configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.catalog.validate()?;
        self.strategy.validate()?;

        if self.name_max_length == 0 {
            return Err(ValidationError::invalid(
                "name_max_length",
                "must be greater than 0",
            ));
        }
        if self.group.as_deref().is_some_and(|group| group.trim().is_empty()) {
            return Err(ValidationError::invalid("group", "must not be empty when set"));
        }

        Ok(())
    }
}

impl Config for ImporterConfig {
    const LIST_PARSE_KEYS: &'static [&'static str] =
        &["strategy.identity_fields", "strategy.invariant_fields"];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(strategy: MatchStrategyConfig) -> ImporterConfig {
        ImporterConfig {
            catalog: CatalogConfig::Memory,
            strategy,
            group: None,
            name_max_length: ImporterConfig::DEFAULT_NAME_MAX_LENGTH,
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert_eq!(config(MatchStrategyConfig::ByName).validate(), Ok(()));
    }

    #[test]
    fn test_empty_extra_field_key_is_rejected() {
        let err = config(MatchStrategyConfig::ByExtraField { key: " ".to_owned() })
            .validate()
            .unwrap_err();

        assert_eq!(err, ValidationError::invalid("strategy.key", "must not be empty"));
    }

    #[test]
    fn test_resource_series_requires_identity_fields_and_prefix() {
        let without_fields = config(MatchStrategyConfig::ResourceSeries {
            identity_fields: vec![],
            resource_id_prefix: "ref:".to_owned(),
            invariant_fields: vec![],
            synonyms: Default::default(),
        });
        let without_prefix = config(MatchStrategyConfig::ResourceSeries {
            identity_fields: vec!["title".to_owned()],
            resource_id_prefix: String::new(),
            invariant_fields: vec![],
            synonyms: Default::default(),
        });

        assert!(without_fields.validate().is_err());
        assert!(without_prefix.validate().is_err());
    }

    #[test]
    fn test_http_catalog_url_is_checked() {
        let mut config = config(MatchStrategyConfig::ByName);
        config.catalog = CatalogConfig::Http {
            url: "localhost:5000".to_owned(),
            api_key: None,
            timeout_secs: CatalogConfig::DEFAULT_TIMEOUT_SECS,
        };

        let err = config.validate().unwrap_err();

        assert!(err.to_string().contains("catalog.url"));
    }

    #[test]
    fn test_strategy_deserializes_from_json() {
        let strategy: MatchStrategyConfig = serde_json::from_str(
            r#"{
                "type": "resource_series",
                "identity_fields": ["title", "department"],
                "resource_id_prefix": "ref:",
                "synonyms": {"department": [["DCSF", "DfE"]]}
            }"#,
        )
        .unwrap();

        assert_eq!(
            strategy,
            MatchStrategyConfig::ResourceSeries {
                identity_fields: vec!["title".to_owned(), "department".to_owned()],
                resource_id_prefix: "ref:".to_owned(),
                invariant_fields: vec![],
                synonyms: [(
                    "department".to_owned(),
                    vec![vec!["DCSF".to_owned(), "DfE".to_owned()]]
                )]
                .into(),
            }
        );
    }
}
