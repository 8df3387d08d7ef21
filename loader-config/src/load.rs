//! Layered configuration: a base file, an environment file, then `LOADER_` variables.

use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::{Environment, UnknownEnvironment};

/// Directory holding the configuration files, relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Stem of the file with settings shared by every environment.
const BASE_FILE_STEM: &str = "base";

/// Extensions tried, in order, for every configuration file.
const FILE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

const ENV_PREFIX: &str = "LOADER";
const ENV_NESTING_SEPARATOR: &str = "__";
const ENV_LIST_SEPARATOR: &str = ",";

/// Implemented by configuration structures loaded with [`load_config`].
pub trait Config {
    /// Keys whose environment variable overrides are split into lists on commas.
    const LIST_PARSE_KEYS: &'static [&'static str];
}

/// Errors that can occur while loading configuration files and overrides.
#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error(transparent)]
    Environment(#[from] UnknownEnvironment),

    #[error("configuration directory `{}` does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("no `{stem}` configuration file in `{}`", .directory.display())]
    MissingFile {
        stem: &'static str,
        directory: PathBuf,
    },

    #[error("invalid configuration: {0}")]
    Invalid(#[source] config::ConfigError),
}

/// Loads configuration from the `configuration` directory of the working directory.
///
/// `configuration/base.*` is read first and `configuration/{environment}.*` on top of it, with the
/// environment taken from `LOADER_ENVIRONMENT`. Variables prefixed with `LOADER_` override both;
/// nested keys are separated by double underscores (`LOADER_CATALOG__URL`).
pub fn load_config<T>() -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let base_path = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;
    let environment = Environment::load()?;

    load_config_from(&base_path, environment)
}

/// Same as [`load_config`], reading the `configuration` directory under `base_path` for an
/// explicit `environment`.
pub fn load_config_from<T>(base_path: &Path, environment: Environment) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    build_config::<T>(base_path, environment, None)
}

/// Builds the layered configuration. `env_overrides` replaces the process environment when set.
fn build_config<T>(
    base_path: &Path,
    environment: Environment,
    env_overrides: Option<config::Map<String, String>>,
) -> Result<T, LoadConfigError>
where
    T: Config + DeserializeOwned,
{
    let directory = base_path.join(CONFIGURATION_DIR);
    if !directory.is_dir() {
        return Err(LoadConfigError::MissingDirectory(directory));
    }

    let base_file = find_file(&directory, BASE_FILE_STEM)?;
    let environment_file = find_file(&directory, environment.as_str())?;

    let mut overrides = config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator(ENV_NESTING_SEPARATOR)
        .try_parsing(true)
        .source(env_overrides);

    // Without registered keys a list separator would split every value.
    if !T::LIST_PARSE_KEYS.is_empty() {
        overrides = T::LIST_PARSE_KEYS
            .iter()
            .fold(overrides.list_separator(ENV_LIST_SEPARATOR), |overrides, key| {
                overrides.with_list_parse_key(key)
            });
    }

    config::Config::builder()
        .add_source(config::File::from(base_file))
        .add_source(config::File::from(environment_file))
        .add_source(overrides)
        .build()
        .and_then(|settings| settings.try_deserialize::<T>())
        .map_err(LoadConfigError::Invalid)
}

fn find_file(directory: &Path, stem: &'static str) -> Result<PathBuf, LoadConfigError> {
    FILE_EXTENSIONS
        .iter()
        .map(|extension| directory.join(format!("{stem}.{extension}")))
        .find(|path| path.is_file())
        .ok_or_else(|| LoadConfigError::MissingFile {
            stem,
            directory: directory.to_path_buf(),
        })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use secrecy::ExposeSecret;

    use super::*;
    use crate::shared::{CatalogConfig, ImporterConfig, MatchStrategyConfig};

    const BASE_YAML: &str = r#"
catalog:
  type: http
  url: "http://localhost:5000"
  timeout_secs: 10
strategy:
  type: by_name
"#;

    const PROD_YAML: &str = r#"
catalog:
  api_key: "prod-key"
name_max_length: 60
"#;

    fn configuration_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let configuration = dir.path().join(CONFIGURATION_DIR);
        fs::create_dir(&configuration).unwrap();
        for (name, contents) in files {
            fs::write(configuration.join(name), contents).unwrap();
        }

        dir
    }

    #[test]
    fn test_environment_file_overrides_base() {
        let dir = configuration_dir(&[("base.yaml", BASE_YAML), ("prod.yaml", PROD_YAML)]);

        let config: ImporterConfig = load_config_from(dir.path(), Environment::Prod).unwrap();

        let CatalogConfig::Http {
            url,
            api_key,
            timeout_secs,
        } = config.catalog
        else {
            panic!("expected an http catalog");
        };
        assert_eq!(url, "http://localhost:5000");
        assert_eq!(api_key.unwrap().expose_secret(), "prod-key");
        assert_eq!(timeout_secs, 10);
        assert_eq!(config.name_max_length, 60);
        assert!(matches!(config.strategy, MatchStrategyConfig::ByName));
    }

    #[test]
    fn test_environment_variables_override_files() {
        let dir = configuration_dir(&[("base.yaml", BASE_YAML), ("dev.json", "{}")]);
        let overrides = config::Map::from([
            ("LOADER_GROUP".to_owned(), "ons".to_owned()),
            ("LOADER_STRATEGY__TYPE".to_owned(), "resource_series".to_owned()),
            (
                "LOADER_STRATEGY__IDENTITY_FIELDS".to_owned(),
                "title,department".to_owned(),
            ),
            (
                "LOADER_STRATEGY__RESOURCE_ID_PREFIX".to_owned(),
                "ref:".to_owned(),
            ),
        ]);

        let config: ImporterConfig =
            build_config(dir.path(), Environment::Dev, Some(overrides)).unwrap();

        assert_eq!(config.group.as_deref(), Some("ons"));
        let MatchStrategyConfig::ResourceSeries {
            identity_fields,
            resource_id_prefix,
            ..
        } = config.strategy
        else {
            panic!("expected a resource series strategy");
        };
        assert_eq!(identity_fields, vec!["title", "department"]);
        assert_eq!(resource_id_prefix, "ref:");
    }

    #[test]
    fn test_missing_environment_file_is_reported() {
        let dir = configuration_dir(&[("base.yaml", BASE_YAML)]);

        let err = load_config_from::<ImporterConfig>(dir.path(), Environment::Prod).unwrap_err();

        assert!(matches!(err, LoadConfigError::MissingFile { stem: "prod", .. }));
    }

    #[test]
    fn test_missing_configuration_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();

        let err = load_config_from::<ImporterConfig>(dir.path(), Environment::Dev).unwrap_err();

        assert!(matches!(err, LoadConfigError::MissingDirectory(_)));
    }

    #[test]
    fn test_unparsable_file_is_reported() {
        let dir = configuration_dir(&[("base.yaml", BASE_YAML), ("dev.yaml", "catalog: [")]);

        let err = load_config_from::<ImporterConfig>(dir.path(), Environment::Dev).unwrap_err();

        assert!(matches!(err, LoadConfigError::Invalid(_)));
    }
}
