//! Locating the catalog package an incoming package corresponds to.

mod options;
mod resolver;

pub use options::{
    build_search_options, expand_synonyms, package_matches_any, package_matches_options,
};
pub use resolver::{IdentityResolver, ResolvedMatch};
