use colored::Colorize;
use std::{fmt, sync::Arc};

/// Boxed error returned by parser functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while resolving and parsing environment variables
#[derive(Debug, Clone)]
pub enum Error {
    /// A required variable resolved to an empty value
    Missing { key: String },
    /// A variable had a value the registered parser rejected
    Parse {
        key: String,
        value: String,
        type_name: &'static str,
        source: Arc<dyn std::error::Error + Send + Sync>,
    },
    /// The active registry has no parser for the requested type
    NoParser { key: String, type_name: &'static str },
    /// Multi-value parsing was attempted with an empty separator
    EmptySplitKey { key: String },
    /// Evaluating whether a default may be used failed
    DefaultPolicy { key: String, source: Arc<Error> },
    /// The environment classification variable held an unknown value
    InvalidEnvironment { key: String, value: String },
}

impl Error {
    pub(crate) fn missing(key: impl Into<String>) -> Self {
        Self::Missing { key: key.into() }
    }

    pub(crate) fn parse<T>(key: impl Into<String>, value: impl Into<String>, source: BoxError) -> Self {
        Self::Parse {
            key: key.into(),
            value: value.into(),
            type_name: std::any::type_name::<T>(),
            source: Arc::from(source),
        }
    }

    pub(crate) fn no_parser<T>(key: impl Into<String>) -> Self {
        Self::NoParser {
            key: key.into(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub(crate) fn default_policy(key: impl Into<String>, source: Error) -> Self {
        Self::DefaultPolicy {
            key: key.into(),
            source: Arc::new(source),
        }
    }

    /// Key of the variable this error is reported against
    pub fn key(&self) -> &str {
        match self {
            Error::Missing { key }
            | Error::Parse { key, .. }
            | Error::NoParser { key, .. }
            | Error::EmptySplitKey { key }
            | Error::DefaultPolicy { key, .. }
            | Error::InvalidEnvironment { key, .. } => key,
        }
    }

    /// Whether a required variable had no value
    pub fn is_missing(&self) -> bool {
        matches!(self, Error::Missing { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Missing { key } => {
                write!(
                    f,
                    "{}: Is missing from environment and is required",
                    key.magenta().bold()
                )
            }
            Error::Parse {
                key,
                value,
                type_name,
                source,
            } => {
                write!(
                    f,
                    "{}: Invalid value {} for type {}: {}",
                    key.magenta().bold(),
                    format!("'{}'", value).red(),
                    type_name.cyan(),
                    source
                )
            }
            Error::NoParser { key, type_name } => {
                write!(
                    f,
                    "{}: No parser registered for type {}",
                    key.magenta().bold(),
                    type_name.cyan()
                )
            }
            Error::EmptySplitKey { key } => {
                write!(f, "{}: Split key cannot be empty", key.magenta().bold())
            }
            Error::DefaultPolicy { key, source } => {
                write!(
                    f,
                    "{}: Could not decide whether the default is allowed: {}",
                    key.magenta().bold(),
                    source
                )
            }
            Error::InvalidEnvironment { key, value } => {
                write!(
                    f,
                    "{}: Invalid value {}, expected one of development, dev, production, prod, test",
                    key.magenta().bold(),
                    format!("'{}'", value).red(),
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse { source, .. } => Some(source.as_ref()),
            Error::DefaultPolicy { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}
