//! Utilities for testing code that loads packages.
//!
//! - [`faulty_catalog`] wraps a catalog and makes selected calls fail, to exercise error paths
//!   such as a batch where only some packages can be written.

pub mod faulty_catalog;
