use secrecy::SecretString;
use serde::Deserialize;

use crate::shared::ValidationError;

const fn default_timeout_secs() -> u64 {
    CatalogConfig::DEFAULT_TIMEOUT_SECS
}

/// Which catalog packages are loaded into.
///
/// This intentionally does not implement [`serde::Serialize`] to avoid accidentally
/// leaking the API key into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CatalogConfig {
    /// An in-memory catalog that starts empty, useful for dry runs.
    Memory,
    /// A remote catalog reached over its REST API.
    Http {
        /// Base url of the catalog, e.g. `https://data.example.org`.
        url: String,
        /// Key sent in the `Authorization` header of every request.
        #[serde(default)]
        api_key: Option<SecretString>,
        /// Timeout applied to every request.
        #[serde(default = "default_timeout_secs")]
        timeout_secs: u64,
    },
}

impl CatalogConfig {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            CatalogConfig::Memory => Ok(()),
            CatalogConfig::Http {
                url, timeout_secs, ..
            } => {
                if url.trim().is_empty() {
                    return Err(ValidationError::invalid("catalog.url", "must not be empty"));
                }
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ValidationError::invalid(
                        "catalog.url",
                        "must start with http:// or https://",
                    ));
                }
                if *timeout_secs == 0 {
                    return Err(ValidationError::invalid(
                        "catalog.timeout_secs",
                        "must be greater than 0",
                    ));
                }

                Ok(())
            }
        }
    }
}
