use std::fs;
use std::path::{Path, PathBuf};
#[cfg(feature = "http")]
use std::time::Duration;

use anyhow::Context;
#[cfg(feature = "http")]
use loader::catalog::http::HttpCatalogClient;
use loader::catalog::CatalogClient;
use loader::catalog::memory::MemoryCatalog;
use loader::loader::PackageLoader;
use loader::outcome::LoadReport;
use loader::strategy::{ConfiguredStrategy, MatchStrategy};
use loader::types::{Group, Package};
use loader_config::shared::{CatalogConfig, ImporterConfig, MatchStrategyConfig};
use tracing::{debug, info, warn};

/// What a single importer run loads.
#[derive(Debug, Clone)]
pub struct ImportRequest {
    pub packages_path: PathBuf,
    pub group: Option<String>,
}

/// Loads the requested packages into the configured catalog and reports on the batch.
pub async fn start_import(
    config: ImporterConfig,
    request: ImportRequest,
) -> anyhow::Result<LoadReport> {
    info!("starting package import");

    log_config(&config);

    let packages = read_packages(&request.packages_path)?;
    let strategy = ConfiguredStrategy::try_from(config.strategy.clone())?;

    // Each catalog gets its own loader type. This is more verbose due to static dispatch, but
    // keeps catalog calls monomorphic.
    match &config.catalog {
        CatalogConfig::Memory => {
            let catalog = MemoryCatalog::new();
            if let Some(group) = &request.group {
                debug!(group, "seeding group in empty memory catalog");
                catalog.insert_group(Group::new(group.clone())).await;
            }

            let loader = PackageLoader::new(catalog, strategy)
                .with_max_name_length(config.name_max_length);
            run_import(&loader, packages, request.group.as_deref()).await
        }
        #[cfg(feature = "http")]
        CatalogConfig::Http {
            url,
            api_key,
            timeout_secs,
        } => {
            let catalog = HttpCatalogClient::new(
                url.clone(),
                api_key.clone(),
                Duration::from_secs(*timeout_secs),
            )?;

            let loader = PackageLoader::new(catalog, strategy)
                .with_max_name_length(config.name_max_length);
            run_import(&loader, packages, request.group.as_deref()).await
        }
        #[cfg(not(feature = "http"))]
        CatalogConfig::Http { .. } => {
            anyhow::bail!("the http catalog requires the `http` feature of loader-importer")
        }
    }
}

/// Loads `packages` and adds the ones that loaded to `group`.
pub async fn run_import<C, S>(
    loader: &PackageLoader<C, S>,
    packages: Vec<Package>,
    group: Option<&str>,
) -> anyhow::Result<LoadReport>
where
    C: CatalogClient,
    S: MatchStrategy,
{
    info!(catalog = C::name(), packages = packages.len(), "loading packages");

    let summary = loader.load_packages(packages).await;
    if let Some(err) = summary.error() {
        warn!(
            failed = summary.num_errors,
            kinds = ?err.kinds(),
            "some packages could not be loaded"
        );
    }

    if let Some(group) = group
        && !summary.package_names.is_empty()
    {
        loader
            .add_packages_to_group(&summary.package_names, group)
            .await
            .with_context(|| format!("adding loaded packages to group '{group}'"))?;
    }

    Ok(LoadReport::from(&summary))
}

/// Reads a JSON array of packages.
pub fn read_packages(path: &Path) -> anyhow::Result<Vec<Package>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading packages from `{}`", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("parsing packages from `{}`", path.display()))
}

fn log_config(config: &ImporterConfig) {
    match &config.catalog {
        CatalogConfig::Memory => debug!("using memory catalog config"),
        CatalogConfig::Http {
            url,
            api_key,
            timeout_secs,
        } => debug!(
            url,
            timeout_secs,
            authenticated = api_key.is_some(),
            "using http catalog config"
        ),
    }

    match &config.strategy {
        MatchStrategyConfig::ByName => debug!("matching packages by name"),
        MatchStrategyConfig::ByExtraField { key } => {
            debug!(key, "matching packages by extra field")
        }
        MatchStrategyConfig::ResourceSeries {
            identity_fields,
            resource_id_prefix,
            ..
        } => debug!(
            ?identity_fields,
            resource_id_prefix, "matching packages as resource series"
        ),
    }

    debug!(
        group = config.group.as_deref(),
        name_max_length = config.name_max_length,
        "using importer config"
    );
}
