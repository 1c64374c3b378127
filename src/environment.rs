use crate::{allow::AllowDefault, error::Error};
use std::{env, fmt, str::FromStr};

/// Variable read by [`Environment::from_env`]
pub const ENVIRONMENT_KEY: &str = "ENV";

/// Deployment tier of the running process
///
/// Classification is explicit: call [`Environment::from_env`] once at start-up
/// and hand the result to whatever needs it, typically
/// [`Environment::allow_default`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Environment {
    Dev,
    Prod,
    Test,
}

impl FromStr for Environment {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Dev),
            "prod" | "production" => Ok(Self::Prod),
            "test" => Ok(Self::Test),
            _ => Err(Error::InvalidEnvironment {
                key: ENVIRONMENT_KEY.to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dev => write!(f, "dev"),
            Self::Prod => write!(f, "prod"),
            Self::Test => write!(f, "test"),
        }
    }
}

impl Environment {
    /// Classify using [`ENVIRONMENT_KEY`]
    pub fn from_env() -> Result<Self, Error> {
        Self::from_env_key(ENVIRONMENT_KEY)
    }

    /// Classify using the value of `key`
    pub fn from_env_key(key: &str) -> Result<Self, Error> {
        match env::var(key) {
            Ok(value) if !value.is_empty() => value.parse().map_err(|_| Error::InvalidEnvironment {
                key: key.to_string(),
                value,
            }),
            _ => Err(Error::missing(key)),
        }
    }

    pub fn is_prod(&self) -> bool {
        matches!(self, Self::Prod)
    }

    pub fn is_dev(&self) -> bool {
        matches!(self, Self::Dev)
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Self::Test)
    }

    /// Defaults are allowed everywhere except production
    pub fn allow_default(&self) -> AllowDefault {
        AllowDefault::from_bool(!self.is_prod())
    }
}
