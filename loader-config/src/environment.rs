use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Variable selecting the environment-specific configuration file.
const ENVIRONMENT_VAR: &str = "LOADER_ENVIRONMENT";

/// Runtime environment the loader runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

/// `LOADER_ENVIRONMENT` named an environment other than `dev` or `prod`.
#[derive(Debug, Error)]
#[error("unknown environment `{0}`, expected `dev` or `prod`")]
pub struct UnknownEnvironment(String);

impl Environment {
    /// Reads the environment from `LOADER_ENVIRONMENT`. An unset variable means [`Environment::Dev`].
    pub fn load() -> Result<Environment, UnknownEnvironment> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(value) => value.parse(),
            Err(_) => Ok(Environment::default()),
        }
    }

    /// Stem of the configuration file holding this environment's settings.
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Dev => "dev",
            Environment::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        [Environment::Dev, Environment::Prod]
            .into_iter()
            .find(|environment| value.trim().eq_ignore_ascii_case(environment.as_str()))
            .ok_or_else(|| UnknownEnvironment(value.to_owned()))
    }
}
