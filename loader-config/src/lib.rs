//! Configuration for loading packages into a catalog.
//!
//! Configuration is read from `configuration/base.*` and `configuration/{environment}.*` and can
//! be overridden with `LOADER_`-prefixed environment variables. See [`load_config`].

mod environment;
mod load;
pub mod shared;

pub use environment::{Environment, UnknownEnvironment};
pub use load::{Config, LoadConfigError, load_config, load_config_from};
