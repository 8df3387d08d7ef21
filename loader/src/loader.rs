//! Reconciling incoming packages with the catalog.

use tracing::{error, info};
use uuid::Uuid;

use crate::bail;
use crate::catalog::{CatalogClient, fetch_package};
use crate::diff::package_has_changed;
use crate::error::{ErrorKind, LoaderResult};
use crate::identity::IdentityResolver;
use crate::loader_error;
use crate::naming::{PACKAGE_NAME_MAX_LENGTH, ensure_name_is_available};
use crate::outcome::{LoadOutcome, LoadSummary, LoadWarning, WriteAction};
use crate::strategy::MatchStrategy;
use crate::types::{Group, Package};

/// Loads packages into a catalog, creating new ones and updating the ones that already exist.
///
/// Which catalog package an incoming package corresponds to, and whether its resources are
/// merged into it, is decided by the [`MatchStrategy`]. Every package is reconciled on its own:
/// nothing is cached between calls and catalog calls are made one at a time.
///
/// # Examples
///
/// ```rust,no_run
/// use loader::catalog::memory::MemoryCatalog;
/// use loader::loader::PackageLoader;
/// use loader::strategy::ReplaceByExtraField;
/// use loader::types::Package;
///
/// # async fn example() -> loader::error::LoaderResult<()> {
/// let loader = PackageLoader::new(MemoryCatalog::new(), ReplaceByExtraField::new("ref")?);
///
/// let summary = loader
///     .load_packages(vec![
///         Package::new("census-2001").with_extra("ref", "CENSUS-2001"),
///         Package::new("census-2011").with_extra("ref", "CENSUS-2011"),
///     ])
///     .await;
///
/// assert_eq!(summary.num_loaded, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PackageLoader<C, S> {
    catalog: C,
    strategy: S,
    max_name_length: usize,
}

impl<C, S> PackageLoader<C, S>
where
    C: CatalogClient,
    S: MatchStrategy,
{
    pub fn new(catalog: C, strategy: S) -> Self {
        Self {
            catalog,
            strategy,
            max_name_length: PACKAGE_NAME_MAX_LENGTH,
        }
    }

    /// Overrides the longest package name the catalog accepts.
    pub fn with_max_name_length(mut self, max_name_length: usize) -> Self {
        self.max_name_length = max_name_length;
        self
    }

    /// Loads one package and returns it as the catalog holds it afterwards.
    ///
    /// When a catalog package matches, the incoming package takes over its name and replaces
    /// it, unless nothing changed. Otherwise the package is created under its own name, or under
    /// the next free variant of it.
    pub async fn load_package(&self, mut package: Package) -> LoaderResult<LoadOutcome> {
        let resolver = IdentityResolver::new(&self.catalog, self.strategy.synonyms());
        let resolved = resolver
            .resolve(&package, self.strategy.identity_fields())
            .await?;
        let mut warnings = resolved.warnings;

        match resolved.name {
            Some(existing_name) => {
                self.update_package(package, existing_name, resolved.package, warnings)
                    .await
            }
            None => {
                let renamed =
                    ensure_name_is_available(&self.catalog, &mut package, self.max_name_length)
                        .await?;
                warnings.extend(renamed);

                self.create_package(package, warnings).await
            }
        }
    }

    async fn update_package(
        &self,
        mut package: Package,
        existing_name: String,
        existing: Option<Package>,
        mut warnings: Vec<LoadWarning>,
    ) -> LoaderResult<LoadOutcome> {
        let existing = match existing {
            Some(existing) => existing,
            None => match fetch_package(&self.catalog, &existing_name).await? {
                Some(existing) => existing,
                None => bail!(
                    ErrorKind::InvalidCatalogResponse,
                    "Matched package disappeared from the catalog",
                    format!("package '{existing_name}'")
                ),
            },
        };

        package.name = existing_name;

        if let Some(merger) = self.strategy.resource_merger() {
            let merged = merger.merge(&existing, package);
            package = merged.package;
            warnings.extend(merged.warning);
        }

        if !package_has_changed(&existing, &package)? {
            info!(package = %package.name, "package exists, no change");

            return Ok(LoadOutcome {
                package: existing,
                action: WriteAction::Unchanged,
                warnings,
            });
        }

        info!(package = %package.name, "package exists, updating");
        let replaced = self
            .catalog
            .replace_package(&package)
            .await
            .map_err(|err| {
                loader_error!(
                    ErrorKind::CatalogRequestFailed,
                    "Replacing package failed",
                    format!("package '{}': {err}", package.name),
                    source: err
                )
            })?;

        Ok(LoadOutcome {
            package: replaced,
            action: WriteAction::Updated,
            warnings,
        })
    }

    async fn create_package(
        &self,
        package: Package,
        warnings: Vec<LoadWarning>,
    ) -> LoaderResult<LoadOutcome> {
        info!(package = %package.name, "package is new, creating");
        let created = self
            .catalog
            .create_package(&package)
            .await
            .map_err(|err| {
                loader_error!(
                    ErrorKind::CatalogRequestFailed,
                    "Creating package failed",
                    format!("package '{}': {err}", package.name),
                    source: err
                )
            })?;

        Ok(LoadOutcome {
            package: created,
            action: WriteAction::Created,
            warnings,
        })
    }

    /// Loads every package of a batch, in order.
    ///
    /// A package that fails is logged and counted, and loading carries on with the next one.
    pub async fn load_packages(&self, packages: Vec<Package>) -> LoadSummary {
        let mut summary = LoadSummary::default();

        for package in packages {
            let name = package.name.clone();

            let loaded = self.load_package(package).await.and_then(|outcome| {
                match outcome.package.id.clone() {
                    Some(id) => Ok((outcome, id)),
                    None => Err(loader_error!(
                        ErrorKind::InvalidCatalogResponse,
                        "Catalog returned the package without an id",
                        format!("package '{}'", outcome.package.name)
                    )),
                }
            });

            match loaded {
                Ok((outcome, id)) => summary.record_loaded(outcome, id),
                Err(err) => {
                    error!(
                        package = %name,
                        error = %err,
                        location = %err.location(),
                        "error loading package"
                    );
                    summary.record_failure(name, err);
                }
            }
        }

        info!(
            loaded = summary.num_loaded,
            errors = summary.num_errors,
            "finished loading packages"
        );

        summary
    }

    /// Appends `package_names` to the members of the group named `group_name`.
    ///
    /// Names are appended as given, after the existing members. Both the group and the packages
    /// must be referred to by name, not by id.
    pub async fn add_packages_to_group(
        &self,
        package_names: &[String],
        group_name: &str,
    ) -> LoaderResult<Group> {
        for name in package_names.iter().map(String::as_str).chain([group_name]) {
            if Uuid::try_parse(name).is_ok() {
                bail!(
                    ErrorKind::InvalidInput,
                    "Groups and packages must be referred to by name, not id",
                    format!("'{name}' is an id")
                );
            }
        }

        let mut group = match self.catalog.get_group(group_name).await {
            Ok(group) => group,
            Err(err) if err.is_not_found() => bail!(
                ErrorKind::GroupNotFound,
                "Group does not exist",
                format!("group '{group_name}'")
            ),
            Err(err) => bail!(
                ErrorKind::CatalogRequestFailed,
                "Fetching group failed",
                format!("group '{group_name}': {err}"),
                source: err
            ),
        };

        group
            .packages
            .get_or_insert_with(Vec::new)
            .extend(package_names.iter().cloned());

        info!(group = %group_name, added = package_names.len(), "adding packages to group");
        self.catalog.replace_group(&group).await.map_err(|err| {
            loader_error!(
                ErrorKind::CatalogRequestFailed,
                "Updating group failed",
                format!("group '{group_name}': {err}"),
                source: err
            )
        })
    }

    /// Appends one package to the members of the group named `group_name`.
    pub async fn add_package_to_group(
        &self,
        package_name: &str,
        group_name: &str,
    ) -> LoaderResult<Group> {
        self.add_packages_to_group(&[package_name.to_owned()], group_name)
            .await
    }
}
