#![forbid(unsafe_code)]

//! Configuration errors.

use std::fmt;

/// Errors raised while resolving an input's configuration.
///
/// These are fatal at construction time: an input that fails to resolve its
/// configuration is never created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No API endpoint was configured.
    MissingEndpoint,
    /// An attribute resolved to a value of the wrong shape.
    InvalidAttribute {
        /// Attribute name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::InvalidAttribute`].
    pub fn invalid(name: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self::InvalidAttribute {
            name: name.into(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingEndpoint => write!(f, "api url not provided"),
            Self::InvalidAttribute { name, reason } => {
                write!(f, "invalid attribute `{name}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
