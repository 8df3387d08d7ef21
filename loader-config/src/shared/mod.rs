//! Configuration types shared by the loader and its binaries.

mod catalog;
mod importer;
mod strategy;

pub use catalog::CatalogConfig;
pub use importer::ImporterConfig;
pub use strategy::MatchStrategyConfig;

use thiserror::Error;

/// A configuration value that was parsed but does not satisfy its constraints.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, constraint: &str) -> Self {
        ValidationError::InvalidFieldValue {
            field: field.to_owned(),
            constraint: constraint.to_owned(),
        }
    }
}
