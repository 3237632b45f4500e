//! The scheduler loop and its adaptive poll interval.
//!
//! One Tokio task per started pool. Each pass dispatches at most one job and
//! then sleeps for the current poll interval. The interval shrinks toward
//! the floor while jobs are waiting and grows toward the ceiling while the
//! queue is empty, so a busy pool drains quickly and an idle one polls
//! rarely.

use std::sync::Weak;
use std::time::Duration;

use crate::config::PoolConfig;
use crate::pool::Shared;
use crate::transport::Transport;

/// Adaptive delay between scheduler passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PollInterval {
    current: Duration,
    floor: Duration,
    ceiling: Duration,
    step: Duration,
}

impl PollInterval {
    pub(crate) fn new(config: &PoolConfig) -> Self {
        Self {
            current: config.poll_floor,
            floor: config.poll_floor,
            ceiling: config.poll_ceiling,
            step: config.poll_step,
        }
    }

    pub(crate) fn current(&self) -> Duration {
        self.current
    }

    /// Move the interval one step and return the new value.
    pub(crate) fn adjust(&mut self, backlog: bool) -> Duration {
        self.current = if backlog {
            self.current.saturating_sub(self.step).max(self.floor)
        } else {
            (self.current + self.step).min(self.ceiling)
        };
        self.current
    }

    /// Jump to the ceiling after a connection failure.
    pub(crate) fn raise(&mut self) {
        self.current = self.ceiling;
    }
}

/// Run the scheduler loop until the pool is stopped or dropped.
pub(crate) async fn run<T: Transport>(pool: Weak<Shared<T>>) {
    tracing::debug!("scheduler loop started");

    loop {
        let delay = {
            let Some(shared) = pool.upgrade() else {
                break;
            };
            if shared.is_stopped() {
                break;
            }
            shared.tick();
            shared.next_delay()
        };

        tokio::time::sleep(delay).await;
    }

    tracing::debug!("scheduler loop exited");
}
