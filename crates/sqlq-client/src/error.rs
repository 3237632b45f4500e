//! Client error types.

use std::path::PathBuf;

use sqlq_pool::PoolError;
use sqlq_types::TypeError;
use thiserror::Error;

/// Errors returned by the client and delivered to query callers.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid connection configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// An obfuscated configuration field could not be decoded.
    #[error("cannot decode `{field}`: {reason}")]
    Decode {
        /// The configuration field.
        field: &'static str,
        /// Why decoding failed.
        reason: String,
    },

    /// A parameter declares a type name that does not exist.
    #[error("parameter `{param}`: {source}")]
    Param {
        /// Parameter name.
        param: String,
        /// The lookup failure.
        #[source]
        source: TypeError,
    },

    /// A query definition is malformed.
    #[error("query definition `{id}`: {reason}")]
    Definition {
        /// Definition identifier.
        id: String,
        /// What is wrong with it.
        reason: String,
    },

    /// A SQL or definition file could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A definition file is not valid JSON.
    #[error("invalid definition file: {0}")]
    Json(#[from] serde_json::Error),

    /// Value conversion error.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// Terminal execution outcome reported by the pool.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl Error {
    /// Whether this is a configuration-time error, raised before anything
    /// was queued.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Decode { .. }
                | Self::Param { .. }
                | Self::Definition { .. }
                | Self::Io { .. }
                | Self::Json(_)
        )
    }

    /// The pool error behind an execution failure, if any.
    #[must_use]
    pub fn pool_error(&self) -> Option<&PoolError> {
        match self {
            Self::Pool(e) => Some(e),
            _ => None,
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
