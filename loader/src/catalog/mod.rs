//! Catalog abstractions for package loading.
//!
//! This module provides the [`CatalogClient`] trait the loader writes through, together with an
//! in-memory implementation and, behind the `http` feature, a REST client.

mod base;
#[cfg(feature = "http")]
pub mod http;
pub mod memory;

pub use base::{CatalogClient, CatalogError, CatalogResult, NOT_FOUND_STATUS, fetch_package};
