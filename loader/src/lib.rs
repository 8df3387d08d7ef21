//! Loading dataset packages into a data catalog.
//!
//! Incoming packages are reconciled one by one with what the catalog already holds: a matching
//! package is found with a [`strategy::MatchStrategy`], its name is taken over, resources of a
//! series are merged in, and the package is only written when something actually changed. New
//! packages get a free name derived from the one they asked for.
//!
//! The entry point is [`loader::PackageLoader`]. Catalogs implement [`catalog::CatalogClient`];
//! an in-memory catalog is always available and a REST client is behind the `http` feature.

pub mod catalog;
pub mod diff;
pub mod error;
pub mod identity;
pub mod loader;
mod macros;
pub mod merge;
pub mod naming;
pub mod outcome;
pub mod strategy;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;
