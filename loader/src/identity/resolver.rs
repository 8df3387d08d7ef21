use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::bail;
use crate::catalog::{CatalogClient, fetch_package};
use crate::error::{ErrorKind, LoaderResult};
use crate::identity::options::{build_search_options, expand_synonyms, package_matches_any};
use crate::loader_error;
use crate::outcome::LoadWarning;
use crate::types::{Package, SearchOptions, SearchResults, SynonymTable};

/// Identity field that triggers a direct lookup instead of a search.
const NAME_FIELD: &str = "name";

/// Result of looking for the catalog package an incoming package corresponds to.
#[derive(Debug, Clone, Default)]
pub struct ResolvedMatch {
    /// Name of the matching package, if one was found.
    pub name: Option<String>,
    /// The matching package, when it was already fetched while resolving.
    ///
    /// It is only kept when it is certain to be current; callers fetch it otherwise.
    pub package: Option<Package>,
    pub warnings: Vec<LoadWarning>,
}

impl ResolvedMatch {
    fn none() -> Self {
        Self::default()
    }
}

/// Finds the catalog package matching an incoming one by its identifying fields.
#[derive(Debug)]
pub struct IdentityResolver<'a, C> {
    catalog: &'a C,
    synonyms: &'a SynonymTable,
}

impl<'a, C> IdentityResolver<'a, C>
where
    C: CatalogClient,
{
    pub fn new(catalog: &'a C, synonyms: &'a SynonymTable) -> Self {
        Self { catalog, synonyms }
    }

    /// Looks up the package matching `package` on `identity_fields`.
    ///
    /// When the only identity field is `name` the package is looked up directly. Otherwise the
    /// catalog is searched with every synonym alternative of the identifying values, results are
    /// narrowed down to active packages that match exactly, and more than one survivor is an
    /// [`ErrorKind::AmbiguousMatch`]. If search finds nothing, the package's own name and its
    /// underscore-suffixed variants are probed in case the search index is lagging behind.
    pub async fn resolve(
        &self,
        package: &Package,
        identity_fields: &[String],
    ) -> LoaderResult<ResolvedMatch> {
        if matches!(identity_fields, [field] if field == NAME_FIELD) {
            let existing = fetch_package(self.catalog, &package.name).await?;
            return Ok(ResolvedMatch {
                name: existing.as_ref().map(|_| package.name.clone()),
                package: existing,
                warnings: Vec::new(),
            });
        }

        let options = build_search_options(package, identity_fields)?;
        let alternatives = expand_synonyms(&options, self.synonyms);

        let resolved = self.find_by_options(&alternatives).await?;
        if resolved.name.is_some() {
            return Ok(resolved);
        }

        let Some(existing) = self.probe_by_name(package, &alternatives).await? else {
            return Ok(ResolvedMatch::none());
        };

        let warning = LoadWarning::SearchFallbackUsed {
            package: package.name.clone(),
            options: alternatives,
        };
        warn!("{warning}");

        Ok(ResolvedMatch {
            name: Some(existing.name.clone()),
            package: Some(existing),
            warnings: vec![warning],
        })
    }

    /// Runs one search per alternative and combines the hits.
    async fn search(&self, alternatives: &[SearchOptions]) -> LoaderResult<SearchResults> {
        let mut combined = SearchResults::default();

        for options in alternatives {
            let results = self.catalog.search_packages(options).await.map_err(|err| {
                loader_error!(
                    ErrorKind::CatalogRequestFailed,
                    "Search request failed",
                    format!("options {options:?}: {err}"),
                    source: err
                )
            })?;

            combined.count += results.count;
            combined.results.extend(results.results);
        }

        Ok(combined)
    }

    async fn find_by_options(&self, alternatives: &[SearchOptions]) -> LoaderResult<ResolvedMatch> {
        let search = self.search(alternatives).await?;
        debug!(count = search.count, "search returned candidates");

        let mut seen = HashSet::new();
        let mut matching_names = Vec::new();
        let mut last_fetched = None;

        // Search is not an exact match (it may find the values *inside* a field), so every
        // candidate is fetched and checked.
        for reference in &search.results {
            if !seen.insert(reference.as_str()) {
                continue;
            }

            let Some(candidate) = fetch_package(self.catalog, reference).await? else {
                debug!(reference = %reference, "search result no longer exists, skipping");
                continue;
            };

            if candidate.is_active()
                && package_matches_any(&candidate, alternatives)
                && !matching_names.contains(&candidate.name)
            {
                matching_names.push(candidate.name.clone());
            }
            last_fetched = Some(candidate);
        }

        if matching_names.len() > 1 {
            bail!(
                ErrorKind::AmbiguousMatch,
                "More than one package matches the search options",
                format!("options {alternatives:?} match {matching_names:?}")
            );
        }

        let name = matching_names.pop();

        // The fetched package is only reused when it was the sole search hit.
        let package = last_fetched
            .filter(|package| search.count == 1 && Some(&package.name) == name.as_ref());

        Ok(ResolvedMatch {
            name,
            package,
            warnings: Vec::new(),
        })
    }

    /// Probes `package.name`, `package.name_`, ... until a matching package or a free name.
    async fn probe_by_name(
        &self,
        package: &Package,
        alternatives: &[SearchOptions],
    ) -> LoaderResult<Option<Package>> {
        let mut probe_name = package.name.clone();

        while let Some(candidate) = fetch_package(self.catalog, &probe_name).await? {
            if candidate.is_active() && package_matches_any(&candidate, alternatives) {
                info!(probe = %probe_name, "found package by probing its name");
                return Ok(Some(candidate));
            }

            probe_name.push('_');
        }

        Ok(None)
    }
}
