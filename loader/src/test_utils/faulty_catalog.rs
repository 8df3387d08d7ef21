use std::collections::HashSet;
use std::sync::Arc;

use crate::catalog::{CatalogClient, CatalogError, CatalogResult};
use crate::types::{Group, Package, SearchOptions, SearchResults};

/// Status the wrapper answers with for injected failures.
pub const INJECTED_FAILURE_STATUS: u16 = 500;

/// Test wrapper for [`CatalogClient`] implementations that injects failures.
///
/// Every package call touching one of the configured names fails with
/// [`INJECTED_FAILURE_STATUS`] instead of reaching the wrapped catalog. Searches and group calls
/// can be made to fail as a whole. All other calls are forwarded unchanged.
#[derive(Debug, Clone)]
pub struct FaultyCatalog<C> {
    wrapped_catalog: C,
    failing_packages: Arc<HashSet<String>>,
    fail_search: bool,
    fail_group_lookup: bool,
    fail_group_write: bool,
    strip_ids: bool,
}

impl<C> FaultyCatalog<C> {
    /// Wraps `catalog` without injecting any failure yet.
    pub fn wrap(catalog: C) -> Self {
        Self {
            wrapped_catalog: catalog,
            failing_packages: Arc::new(HashSet::new()),
            fail_search: false,
            fail_group_lookup: false,
            fail_group_write: false,
            strip_ids: false,
        }
    }

    /// Makes every call for the package named `name` fail.
    pub fn fail_package(mut self, name: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.failing_packages).insert(name.into());
        self
    }

    /// Removes the generated id from packages echoed back by create and replace calls.
    pub fn strip_ids(mut self) -> Self {
        self.strip_ids = true;
        self
    }

    /// Makes every package search fail.
    pub fn fail_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Makes every group lookup fail.
    pub fn fail_group_lookup(mut self) -> Self {
        self.fail_group_lookup = true;
        self
    }

    /// Makes every group write fail.
    pub fn fail_group_write(mut self) -> Self {
        self.fail_group_write = true;
        self
    }

    fn check(&self, name: &str) -> CatalogResult<()> {
        if self.failing_packages.contains(name) {
            return Err(injected_failure(format!("package '{name}'")));
        }

        Ok(())
    }

    fn echo(&self, mut package: Package) -> Package {
        if self.strip_ids {
            package.id = None;
        }

        package
    }
}

impl<C> CatalogClient for FaultyCatalog<C>
where
    C: CatalogClient + Send + Sync,
{
    fn name() -> &'static str {
        "faulty"
    }

    async fn get_package(&self, name_or_id: &str) -> CatalogResult<Package> {
        self.check(name_or_id)?;
        self.wrapped_catalog.get_package(name_or_id).await
    }

    async fn create_package(&self, package: &Package) -> CatalogResult<Package> {
        self.check(&package.name)?;
        let created = self.wrapped_catalog.create_package(package).await?;

        Ok(self.echo(created))
    }

    async fn replace_package(&self, package: &Package) -> CatalogResult<Package> {
        self.check(&package.name)?;
        let replaced = self.wrapped_catalog.replace_package(package).await?;

        Ok(self.echo(replaced))
    }

    async fn search_packages(&self, options: &SearchOptions) -> CatalogResult<SearchResults> {
        if self.fail_search {
            return Err(injected_failure(format!("search {options:?}")));
        }

        self.wrapped_catalog.search_packages(options).await
    }

    async fn get_group(&self, name: &str) -> CatalogResult<Group> {
        if self.fail_group_lookup {
            return Err(injected_failure(format!("group '{name}'")));
        }

        self.wrapped_catalog.get_group(name).await
    }

    async fn replace_group(&self, group: &Group) -> CatalogResult<Group> {
        if self.fail_group_write {
            return Err(injected_failure(format!("group '{}'", group.name)));
        }

        self.wrapped_catalog.replace_group(group).await
    }
}

fn injected_failure(target: String) -> CatalogError {
    CatalogError::Status {
        status: INJECTED_FAILURE_STATUS,
        payload: Some(format!("injected failure for {target}")),
    }
}
