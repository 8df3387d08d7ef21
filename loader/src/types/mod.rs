//! Package, resource and search types shared by the loader and catalog clients.

mod package;
mod search;

pub use package::{Group, Package, PackageState, Resource};
pub use search::{SearchOptions, SearchResults, SynonymTable};
