//! Finding a free package name.

use tracing::warn;

use crate::bail;
use crate::catalog::{CatalogClient, fetch_package};
use crate::error::{ErrorKind, LoaderResult};
use crate::outcome::LoadWarning;
use crate::types::Package;

/// Maximum length of a package name accepted by the catalog.
pub const PACKAGE_NAME_MAX_LENGTH: usize = 100;

/// Returns the name to try after `name` turned out to be taken.
///
/// Below `max_length` an underscore is appended. At the limit, trailing underscores are
/// stripped, the last remaining character is dropped and the name is padded back to
/// `max_length` with underscores, so names sharing a long prefix still get distinct suffixes.
/// Returns `None` once truncation can no longer produce a different name.
pub fn next_candidate_name(name: &str, max_length: usize) -> Option<String> {
    if name.chars().count() < max_length {
        return Some(format!("{name}_"));
    }

    let mut candidate = name.trim_end_matches('_').to_owned();
    candidate.pop();

    let padding = max_length.saturating_sub(candidate.chars().count());
    candidate.extend(std::iter::repeat_n('_', padding));

    (candidate != name).then_some(candidate)
}

/// Renames `package` until its name is free in the catalog.
///
/// Returns a [`LoadWarning::Renamed`] when the name had to change.
pub async fn ensure_name_is_available<C>(
    catalog: &C,
    package: &mut Package,
    max_length: usize,
) -> LoaderResult<Option<LoadWarning>>
where
    C: CatalogClient,
{
    let preferred_name = package.name.clone();

    while fetch_package(catalog, &package.name).await?.is_some() {
        let Some(next_name) = next_candidate_name(&package.name, max_length) else {
            bail!(
                ErrorKind::NameUnavailable,
                "No free package name could be derived",
                format!("preferred name '{preferred_name}', last tried '{}'", package.name)
            );
        };
        package.name = next_name;
    }

    if package.name == preferred_name {
        return Ok(None);
    }

    let warning = LoadWarning::Renamed {
        requested: preferred_name,
        assigned: package.name.clone(),
    };
    warn!("{warning}");

    Ok(Some(warning))
}
