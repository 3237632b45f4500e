//! Pool and driver error types.

use std::fmt;

use thiserror::Error;

/// Error codes that mark a failure as connection-level and retryable.
const TRANSIENT_CODES: &[&str] = &[
    "ETIMEOUT",
    "ESOCKET",
    "ECONNRESET",
    "ECONNREFUSED",
    "ECONNABORTED",
    "ECONNCLOSED",
    "EPIPE",
];

/// An error reported by the transport for a session or a statement.
///
/// The `code` decides how the pool reacts: timeouts and socket-level codes
/// are transient and cause the job to be retried on another connection;
/// anything else is terminal and is delivered to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverError {
    code: Option<String>,
    message: String,
}

impl DriverError {
    /// Create an error with a driver error code.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// Create an error without a code, such as a server-reported query error.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// A request timeout (`ETIMEOUT`).
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new("ETIMEOUT", message)
    }

    /// A socket-level failure (`ESOCKET`).
    pub fn socket(message: impl Into<String>) -> Self {
        Self::new("ESOCKET", message)
    }

    /// The error code, if any.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// The error message.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.message
    }

    /// Whether the failure is connection-level and the job may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| TRANSIENT_CODES.contains(&code))
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{code}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DriverError {}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        use std::io::ErrorKind;

        let code = match err.kind() {
            ErrorKind::TimedOut => "ETIMEOUT",
            ErrorKind::ConnectionReset => "ECONNRESET",
            ErrorKind::ConnectionRefused => "ECONNREFUSED",
            ErrorKind::ConnectionAborted => "ECONNABORTED",
            ErrorKind::BrokenPipe => "EPIPE",
            _ => "ESOCKET",
        };
        Self::new(code, err.to_string())
    }
}

/// Errors delivered by the pool.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// Invalid pool configuration.
    #[error("invalid pool configuration: {0}")]
    Config(String),

    /// The statement failed with a non-retryable error.
    #[error("statement failed: {0}")]
    Driver(#[source] DriverError),

    /// A job hit its retry limit on transient failures.
    #[error("statement failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of executions performed.
        attempts: u32,
        /// The last transient failure.
        #[source]
        last: DriverError,
    },

    /// No connection could be established after the configured attempts.
    #[error("server unreachable after {attempts} connection attempts: {last}")]
    Unreachable {
        /// Consecutive connection attempts made.
        attempts: u32,
        /// The last connection failure.
        #[source]
        last: DriverError,
    },

    /// The pool was shut down before the job completed.
    #[error("pool closed")]
    Closed,

    /// The reply channel was dropped before a result was delivered.
    #[error("result channel dropped")]
    Canceled,
}

impl PoolError {
    /// The underlying driver error, if any.
    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            Self::Driver(e) => Some(e),
            Self::RetriesExhausted { last, .. } | Self::Unreachable { last, .. } => Some(last),
            _ => None,
        }
    }
}
