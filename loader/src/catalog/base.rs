use std::error;
use std::future::Future;
use thiserror::Error;

use crate::error::{ErrorKind, LoaderResult};
use crate::loader_error;
use crate::types::{Group, Package, SearchOptions, SearchResults};

/// Status the catalog reports when a package or group does not exist.
pub const NOT_FOUND_STATUS: u16 = 404;

/// Result type returned by [`CatalogClient`] calls.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failure reported by a catalog client.
///
/// Every failed call carries the status the catalog answered with, if it answered at all, and
/// the last payload it sent back. Only [`NOT_FOUND_STATUS`] has a meaning of its own; every other
/// status is unexpected.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog answered with a non-success status.
    #[error("catalog responded with status {status}: {}", .payload.as_deref().unwrap_or("<no payload>"))]
    Status { status: u16, payload: Option<String> },

    /// The request never got an answer.
    #[error("catalog transport failed: {0}")]
    Transport(#[source] Box<dyn error::Error + Send + Sync>),

    /// The catalog answered but its payload could not be decoded.
    #[error("catalog payload could not be decoded: {0}")]
    Payload(#[from] serde_json::Error),
}

impl CatalogError {
    /// Creates a not-found error for `what`.
    pub fn not_found(what: impl Into<String>) -> Self {
        CatalogError::Status {
            status: NOT_FOUND_STATUS,
            payload: Some(what.into()),
        }
    }

    /// Returns the status the catalog answered with, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            CatalogError::Status { status, .. } => Some(*status),
            CatalogError::Transport(_) | CatalogError::Payload(_) => None,
        }
    }

    /// Returns the last payload received from the catalog, if any.
    pub fn payload(&self) -> Option<&str> {
        match self {
            CatalogError::Status { payload, .. } => payload.as_deref(),
            CatalogError::Transport(_) | CatalogError::Payload(_) => None,
        }
    }

    /// Returns `true` if the catalog reported that the entity does not exist.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(NOT_FOUND_STATUS)
    }
}

/// Remote data catalog that packages are loaded into.
///
/// [`CatalogClient`] implementations own transport and authentication. The loader calls them
/// strictly one at a time and never retries; a failed call is reported to the caller as is.
/// Lookups must report a missing entity with a [`CatalogError`] whose
/// [`CatalogError::is_not_found`] returns `true`, since the loader relies on that to choose
/// between creating and updating.
pub trait CatalogClient {
    /// Returns the name of the catalog implementation.
    fn name() -> &'static str;

    /// Fetches a package by name or id.
    fn get_package(&self, name_or_id: &str) -> impl Future<Output = CatalogResult<Package>> + Send;

    /// Creates a package and returns it as stored, including its generated id.
    fn create_package(
        &self,
        package: &Package,
    ) -> impl Future<Output = CatalogResult<Package>> + Send;

    /// Replaces the package with the same name and returns it as stored.
    fn replace_package(
        &self,
        package: &Package,
    ) -> impl Future<Output = CatalogResult<Package>> + Send;

    /// Searches for packages whose fields match `options`.
    ///
    /// Catalog search is allowed to be inexact (for example substring matching), so callers
    /// must re-check every result.
    fn search_packages(
        &self,
        options: &SearchOptions,
    ) -> impl Future<Output = CatalogResult<SearchResults>> + Send;

    /// Fetches a group by name.
    fn get_group(&self, name: &str) -> impl Future<Output = CatalogResult<Group>> + Send;

    /// Replaces the group with the same name and returns it as stored.
    fn replace_group(&self, group: &Group) -> impl Future<Output = CatalogResult<Group>> + Send;
}

/// Fetches a package, mapping "not found" to `None`.
///
/// Any other failure is unexpected and returned as [`ErrorKind::CatalogRequestFailed`].
pub async fn fetch_package<C>(catalog: &C, name_or_id: &str) -> LoaderResult<Option<Package>>
where
    C: CatalogClient,
{
    match catalog.get_package(name_or_id).await {
        Ok(package) => Ok(Some(package)),
        Err(err) if err.is_not_found() => Ok(None),
        Err(err) => Err(loader_error!(
            ErrorKind::CatalogRequestFailed,
            "Unexpected status checking for package",
            format!("package '{name_or_id}': {err}"),
            source: err
        )),
    }
}
