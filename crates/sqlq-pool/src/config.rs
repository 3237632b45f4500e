//! Pool configuration.

use std::time::Duration;

use crate::error::PoolError;

/// Configuration for the connection pool and its scheduler loop.
///
/// The defaults are tuned for a small application talking to a single
/// server: up to 16 connections, a poll interval that adapts between 10ms
/// under load and 100ms when idle, and ten reconnect attempts with a linear
/// 5 second backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of connection records, connecting ones included.
    pub max_connections: u32,

    /// Shortest delay between scheduler passes.
    pub poll_floor: Duration,

    /// Longest delay between scheduler passes.
    pub poll_ceiling: Duration,

    /// Amount the delay moves by after each pass.
    pub poll_step: Duration,

    /// Consecutive connect failures tolerated before queued jobs are failed.
    pub reconnect_attempts: u32,

    /// Backoff unit; the n-th consecutive failure delays growth by n units.
    pub reconnect_backoff: Duration,

    /// Maximum executions of one job before a transient failure is surfaced.
    ///
    /// `None` retries indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 16,
            poll_floor: Duration::from_millis(10),
            poll_ceiling: Duration::from_millis(100),
            poll_step: Duration::from_millis(10),
            reconnect_attempts: 10,
            reconnect_backoff: Duration::from_secs(5),
            max_attempts: None,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.max_connections = count;
        self
    }

    /// Set the poll interval bounds.
    #[must_use]
    pub fn poll_bounds(mut self, floor: Duration, ceiling: Duration) -> Self {
        self.poll_floor = floor;
        self.poll_ceiling = ceiling;
        self
    }

    /// Set the shortest delay between scheduler passes.
    #[must_use]
    pub fn poll_floor(mut self, floor: Duration) -> Self {
        self.poll_floor = floor;
        self
    }

    /// Set the longest delay between scheduler passes.
    #[must_use]
    pub fn poll_ceiling(mut self, ceiling: Duration) -> Self {
        self.poll_ceiling = ceiling;
        self
    }

    /// Set the poll interval step.
    #[must_use]
    pub fn poll_step(mut self, step: Duration) -> Self {
        self.poll_step = step;
        self
    }

    /// Set the reconnect policy.
    #[must_use]
    pub fn reconnect(mut self, attempts: u32, backoff: Duration) -> Self {
        self.reconnect_attempts = attempts;
        self.reconnect_backoff = backoff;
        self
    }

    /// Set how many consecutive connect failures are tolerated.
    #[must_use]
    pub fn reconnect_attempts(mut self, attempts: u32) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    /// Set the reconnect backoff unit.
    #[must_use]
    pub fn reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    /// Cap the number of executions per job.
    #[must_use]
    pub fn max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_connections == 0 {
            return Err(PoolError::Config(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.poll_floor.is_zero() {
            return Err(PoolError::Config("poll_floor must be non-zero".into()));
        }

        if self.poll_floor > self.poll_ceiling {
            return Err(PoolError::Config(format!(
                "poll_floor ({:?}) exceeds poll_ceiling ({:?})",
                self.poll_floor, self.poll_ceiling
            )));
        }

        if self.reconnect_attempts == 0 {
            return Err(PoolError::Config(
                "reconnect_attempts must be greater than 0".into(),
            ));
        }

        if self.max_attempts == Some(0) {
            return Err(PoolError::Config(
                "max_attempts must be greater than 0 when set".into(),
            ));
        }

        Ok(())
    }
}
