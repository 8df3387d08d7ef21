//! Structured results of loading packages.
//!
//! Everything the loader notices while reconciling a package is handed back to the caller in
//! these types, next to the `tracing` events emitted for operators.

use serde::Serialize;
use std::fmt;

use crate::error::LoaderError;
use crate::types::{Package, SearchOptions};

/// Which write, if any, reconciling a package resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteAction {
    /// No existing package matched, so a new one was created.
    Created,
    /// An existing package matched and was replaced.
    Updated,
    /// An existing package matched and already had the incoming content.
    Unchanged,
}

/// A field whose value changed although it was expected to stay the same.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub before: Option<String>,
    pub after: Option<String>,
}

impl fmt::Display for FieldChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:?} -> {:?}",
            self.field,
            self.before.as_deref(),
            self.after.as_deref()
        )
    }
}

/// Something unexpected but harmless that happened while loading a package.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadWarning {
    /// The preferred name was taken, so the new package got another one.
    Renamed { requested: String, assigned: String },
    /// Fields declared invariant differ between the existing and the incoming package.
    InvariantFieldsChanged {
        package: String,
        changes: Vec<FieldChange>,
    },
    /// Search missed the existing package, which was found by probing its name instead.
    SearchFallbackUsed {
        package: String,
        options: Vec<SearchOptions>,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadWarning::Renamed {
                requested,
                assigned,
            } => write!(
                f,
                "name '{requested}' already exists so the new package was renamed to '{assigned}'"
            ),
            LoadWarning::InvariantFieldsChanged { package, changes } => {
                write!(f, "package '{package}' has unexpected changes: ")?;
                for (index, change) in changes.iter().enumerate() {
                    if index > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{change}")?;
                }

                Ok(())
            }
            LoadWarning::SearchFallbackUsed { package, options } => write!(
                f,
                "search did not find package '{package}' with {options:?}, but it was found under its expected name"
            ),
        }
    }
}

/// Result of reconciling a single package.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// The package as the catalog holds it after the write.
    pub package: Package,
    pub action: WriteAction,
    pub warnings: Vec<LoadWarning>,
}

/// A package of a batch that could not be loaded.
#[derive(Debug, Clone)]
pub struct LoadFailure {
    /// Name of the package as it was supplied.
    pub package: String,
    pub error: LoaderError,
}

/// Aggregate result of loading a batch of packages.
///
/// Names and ids of loaded packages are listed in input order.
#[derive(Debug, Clone, Default)]
pub struct LoadSummary {
    pub package_names: Vec<String>,
    pub package_ids: Vec<String>,
    pub num_loaded: usize,
    pub num_errors: usize,
    pub failures: Vec<LoadFailure>,
    pub warnings: Vec<LoadWarning>,
}

impl LoadSummary {
    /// Returns `true` if every package of the batch was loaded.
    pub fn is_success(&self) -> bool {
        self.num_errors == 0
    }

    /// Folds the errors of every failed package into one, or returns `None` if none failed.
    pub fn error(&self) -> Option<LoaderError> {
        LoaderError::aggregate(self.failures.iter().map(|failure| failure.error.clone()))
    }

    pub(crate) fn record_loaded(&mut self, outcome: LoadOutcome, id: String) {
        self.package_names.push(outcome.package.name);
        self.package_ids.push(id);
        self.warnings.extend(outcome.warnings);
        self.num_loaded += 1;
    }

    pub(crate) fn record_failure(&mut self, package: String, error: LoaderError) {
        self.failures.push(LoadFailure { package, error });
        self.num_errors += 1;
    }
}

/// Serializable view of a [`LoadSummary`], with failures rendered as text.
#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub package_names: Vec<String>,
    pub package_ids: Vec<String>,
    pub num_loaded: usize,
    pub num_errors: usize,
    pub failures: Vec<FailureReport>,
    pub warnings: Vec<LoadWarning>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub package: String,
    pub error: String,
}

impl From<&LoadSummary> for LoadReport {
    fn from(summary: &LoadSummary) -> Self {
        LoadReport {
            package_names: summary.package_names.clone(),
            package_ids: summary.package_ids.clone(),
            num_loaded: summary.num_loaded,
            num_errors: summary.num_errors,
            failures: summary
                .failures
                .iter()
                .map(|failure| FailureReport {
                    package: failure.package.clone(),
                    error: failure.error.to_string(),
                })
                .collect(),
            warnings: summary.warnings.clone(),
        }
    }
}
