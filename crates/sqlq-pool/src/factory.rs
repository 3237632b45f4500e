//! Connection factory.

use std::sync::Arc;

use crate::record::ConnectionId;
use crate::transport::{SessionConfig, SessionEvents, Transport};

/// Opens new sessions for the pool with the resolved connection settings.
pub(crate) struct ConnectionFactory<T> {
    transport: T,
    config: SessionConfig,
}

impl<T: Transport> ConnectionFactory<T> {
    pub(crate) fn new(transport: T, config: SessionConfig) -> Self {
        Self { transport, config }
    }

    /// Open a session for `id`, or `None` if the pool has been stopped.
    ///
    /// Must be called without the pool lock held: the transport may report
    /// lifecycle events synchronously.
    pub(crate) fn create(
        &self,
        id: ConnectionId,
        stopped: bool,
        events: SessionEvents,
    ) -> Option<Arc<T::Session>> {
        if stopped {
            tracing::debug!(connection_id = %id, "pool stopped, not opening session");
            return None;
        }

        tracing::debug!(
            connection_id = %id,
            server = %self.config.server,
            "opening session"
        );
        Some(Arc::new(self.transport.open(&self.config, events)))
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.config
    }
}
