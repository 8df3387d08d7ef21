use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::catalog::{CatalogClient, CatalogError, CatalogResult};
use crate::types::{Group, Package, PackageState, SearchOptions, SearchResults};

/// Status the in-memory catalog answers with when a package name is already taken.
const CONFLICT_STATUS: u16 = 409;

/// A write that reached the [`MemoryCatalog`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWrite {
    PackageCreated(String),
    PackageReplaced(String),
    GroupReplaced(String),
}

#[derive(Debug, Default)]
struct Inner {
    packages: BTreeMap<String, Package>,
    groups: BTreeMap<String, Group>,
    hidden_from_search: HashSet<String>,
    writes: Vec<CatalogWrite>,
}

impl Inner {
    fn find_package(&self, name_or_id: &str) -> Option<&Package> {
        self.packages.get(name_or_id).or_else(|| {
            self.packages
                .values()
                .find(|package| package.id.as_deref() == Some(name_or_id))
        })
    }
}

/// In-memory catalog for tests, development and dry runs.
///
/// [`MemoryCatalog`] behaves like a remote catalog as far as the loader can tell: packages get a
/// generated id and the `active` state on creation, missing entities are reported with a
/// not-found status, and search matches by case-insensitive substring, so it can return more
/// packages than an exact match would. Every write is recorded and can be inspected afterwards.
///
/// # Examples
///
/// ```rust,no_run
/// use loader::catalog::memory::MemoryCatalog;
/// use loader::loader::PackageLoader;
/// use loader::strategy::ReplaceByName;
/// use loader::types::Package;
///
/// # async fn example() -> loader::error::LoaderResult<()> {
/// let catalog = MemoryCatalog::new();
/// let loader = PackageLoader::new(catalog.clone(), ReplaceByName::new());
///
/// loader.load_package(Package::new("census-2011")).await?;
///
/// assert!(catalog.package("census-2011").await.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryCatalog {
    /// Creates a new empty memory catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a package as is, bypassing name checks and the write log.
    ///
    /// A missing id or state is filled in the same way [`CatalogClient::create_package`] does, so
    /// tests can seed inactive packages by setting the state explicitly.
    pub async fn insert_package(&self, package: Package) -> Package {
        let package = with_server_fields(package);
        let mut inner = self.inner.lock().await;
        inner
            .packages
            .insert(package.name.clone(), package.clone());

        package
    }

    /// Stores a group as is, bypassing the write log.
    pub async fn insert_group(&self, group: Group) {
        let mut inner = self.inner.lock().await;
        inner.groups.insert(group.name.clone(), group);
    }

    /// Excludes a package from search results while keeping it reachable by name.
    ///
    /// Useful to mimic a search index that has fallen behind the catalog.
    pub async fn hide_from_search(&self, name: impl Into<String>) {
        let mut inner = self.inner.lock().await;
        inner.hidden_from_search.insert(name.into());
    }

    /// Returns a copy of the package stored under `name`.
    pub async fn package(&self, name: &str) -> Option<Package> {
        let inner = self.inner.lock().await;
        inner.packages.get(name).cloned()
    }

    /// Returns a copy of all stored packages, ordered by name.
    pub async fn packages(&self) -> Vec<Package> {
        let inner = self.inner.lock().await;
        inner.packages.values().cloned().collect()
    }

    /// Returns a copy of the group stored under `name`.
    pub async fn group(&self, name: &str) -> Option<Group> {
        let inner = self.inner.lock().await;
        inner.groups.get(name).cloned()
    }

    /// Returns every write received so far, in order.
    pub async fn writes(&self) -> Vec<CatalogWrite> {
        let inner = self.inner.lock().await;
        inner.writes.clone()
    }
}

impl CatalogClient for MemoryCatalog {
    fn name() -> &'static str {
        "memory"
    }

    async fn get_package(&self, name_or_id: &str) -> CatalogResult<Package> {
        let inner = self.inner.lock().await;

        inner
            .find_package(name_or_id)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("package '{name_or_id}'")))
    }

    async fn create_package(&self, package: &Package) -> CatalogResult<Package> {
        let mut inner = self.inner.lock().await;

        if inner.packages.contains_key(&package.name) {
            return Err(CatalogError::Status {
                status: CONFLICT_STATUS,
                payload: Some(format!("package name '{}' already exists", package.name)),
            });
        }

        let package = with_server_fields(package.clone());
        info!(package = %package.name, "creating package in memory catalog");

        inner
            .packages
            .insert(package.name.clone(), package.clone());
        inner
            .writes
            .push(CatalogWrite::PackageCreated(package.name.clone()));

        Ok(package)
    }

    async fn replace_package(&self, package: &Package) -> CatalogResult<Package> {
        let mut inner = self.inner.lock().await;

        let Some(existing) = inner.packages.get(&package.name) else {
            return Err(CatalogError::not_found(format!("package '{}'", package.name)));
        };

        let mut replacement = package.clone();
        if replacement.id.is_none() {
            replacement.id = existing.id.clone();
        }
        if replacement.state.is_none() {
            replacement.state = existing.state.clone();
        }

        info!(package = %replacement.name, "replacing package in memory catalog");

        inner
            .packages
            .insert(replacement.name.clone(), replacement.clone());
        inner
            .writes
            .push(CatalogWrite::PackageReplaced(replacement.name.clone()));

        Ok(replacement)
    }

    async fn search_packages(&self, options: &SearchOptions) -> CatalogResult<SearchResults> {
        let inner = self.inner.lock().await;

        let results: Vec<String> = inner
            .packages
            .values()
            .filter(|package| !inner.hidden_from_search.contains(&package.name))
            .filter(|package| loosely_matches(package, options))
            .map(|package| package.name.clone())
            .collect();

        debug!(?options, hits = results.len(), "searched memory catalog");

        Ok(SearchResults {
            count: results.len(),
            results,
        })
    }

    async fn get_group(&self, name: &str) -> CatalogResult<Group> {
        let inner = self.inner.lock().await;

        inner
            .groups
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::not_found(format!("group '{name}'")))
    }

    async fn replace_group(&self, group: &Group) -> CatalogResult<Group> {
        let mut inner = self.inner.lock().await;

        if !inner.groups.contains_key(&group.name) {
            return Err(CatalogError::not_found(format!("group '{}'", group.name)));
        }

        inner.groups.insert(group.name.clone(), group.clone());
        inner
            .writes
            .push(CatalogWrite::GroupReplaced(group.name.clone()));

        Ok(group.clone())
    }
}

/// Fills in the fields a catalog generates when it stores a package.
fn with_server_fields(mut package: Package) -> Package {
    if package.id.is_none() {
        package.id = Some(Uuid::new_v4().to_string());
    }
    if package.state.is_none() {
        package.state = Some(PackageState::Active);
    }

    package
}

/// Case-insensitive substring match of every non-empty option, like a full-text index would do.
fn loosely_matches(package: &Package, options: &SearchOptions) -> bool {
    options.iter().all(|(key, wanted)| {
        if wanted.is_empty() {
            return true;
        }

        package
            .identity_value(key)
            .is_some_and(|value| value.to_lowercase().contains(&wanted.to_lowercase()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_assigns_id_and_active_state() {
        let catalog = MemoryCatalog::new();

        let created = catalog.create_package(&Package::new("census")).await.unwrap();

        assert!(created.id.is_some());
        assert!(created.is_active());
        assert_eq!(
            catalog.writes().await,
            vec![CatalogWrite::PackageCreated("census".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_create_rejects_taken_name() {
        let catalog = MemoryCatalog::new();
        catalog.insert_package(Package::new("census")).await;

        let err = catalog.create_package(&Package::new("census")).await.unwrap_err();

        assert_eq!(err.status(), Some(CONFLICT_STATUS));
    }

    #[tokio::test]
    async fn test_get_by_name_or_id() {
        let catalog = MemoryCatalog::new();
        let stored = catalog.insert_package(Package::new("census")).await;
        let id = stored.id.clone().unwrap();

        assert_eq!(catalog.get_package("census").await.unwrap(), stored);
        assert_eq!(catalog.get_package(&id).await.unwrap(), stored);
        assert!(catalog.get_package("other").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_replace_keeps_generated_fields() {
        let catalog = MemoryCatalog::new();
        let stored = catalog.insert_package(Package::new("census")).await;

        let replaced = catalog
            .replace_package(&Package::new("census").with_field("title", "Census"))
            .await
            .unwrap();

        assert_eq!(replaced.id, stored.id);
        assert!(replaced.is_active());
        assert!(
            catalog
                .replace_package(&Package::new("missing"))
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn test_search_is_loose_and_respects_hidden_packages() {
        let catalog = MemoryCatalog::new();
        catalog
            .insert_package(Package::new("a").with_extra("department", "Department of Health"))
            .await;
        catalog
            .insert_package(Package::new("b").with_extra("department", "Health"))
            .await;
        catalog
            .insert_package(Package::new("c").with_extra("department", "Education"))
            .await;
        catalog.hide_from_search("b").await;

        let options = SearchOptions::from([("department".to_owned(), "health".to_owned())]);
        let results = catalog.search_packages(&options).await.unwrap();

        assert_eq!(results.count, 1);
        assert_eq!(results.results, vec!["a".to_owned()]);
    }
}
