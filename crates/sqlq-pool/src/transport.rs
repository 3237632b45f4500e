//! Boundary with the wire transport.
//!
//! The pool never speaks the database protocol itself. A [`Transport`] opens
//! sessions, a [`Session`] executes one statement at a time and can be closed,
//! and every session reports its lifecycle back to the pool through the
//! [`SessionEvents`] handle it was opened with:
//!
//! - exactly one of [`connected`](SessionEvents::connected) or
//!   [`connect_failed`](SessionEvents::connect_failed),
//! - later, at most one [`ended`](SessionEvents::ended),
//! - any number of [`error`](SessionEvents::error) and
//!   [`message`](SessionEvents::message) notices.
//!
//! Events may be raised from any thread or task, including synchronously
//! from inside [`Transport::open`] or [`Session::close`].

use std::fmt;
use std::sync::Weak;

use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlq_types::{ResultSet, Statement};

use crate::error::DriverError;
use crate::record::ConnectionId;

/// Resolved connection settings handed to the transport.
///
/// Credentials in here are plain text; any obfuscation has already been
/// removed by the caller-facing configuration layer.
#[derive(Clone, Default, PartialEq)]
pub struct SessionConfig {
    /// Server address.
    pub server: String,
    /// Login name.
    pub user_name: String,
    /// Login password.
    pub password: String,
    /// Transport-specific options, passed through untouched.
    pub options: Map<String, Value>,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("server", &self.server)
            .field("user_name", &self.user_name)
            .field("password", &"[REDACTED]")
            .field("options", &self.options)
            .finish()
    }
}

/// Opens sessions to the database.
pub trait Transport: Send + Sync + 'static {
    /// The session type this transport produces.
    type Session: Session;

    /// Begin opening a session.
    ///
    /// Returns immediately; the outcome of the connection attempt is reported
    /// through `events`.
    fn open(&self, config: &SessionConfig, events: SessionEvents) -> Self::Session;
}

/// One live connection to the database.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Execute a statement and return its result.
    ///
    /// The pool calls this at most once at a time per session.
    async fn execute(&self, statement: &Statement) -> Result<ResultSet, DriverError>;

    /// Close the session. Must be idempotent and must not block.
    fn close(&self);
}

/// A lifecycle notification raised by a session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session finished connecting.
    Connected,
    /// The session failed to connect.
    ConnectFailed(DriverError),
    /// The session ended.
    Ended,
    /// An error observed on the session outside of a statement result.
    Error(DriverError),
    /// Informational message from the server.
    Message(String),
}

/// Receiver of session lifecycle events.
pub(crate) trait EventSink: Send + Sync {
    fn on_event(&self, id: ConnectionId, event: SessionEvent);
}

/// Handle a session uses to report lifecycle events to its pool.
///
/// Events raised after the pool has been dropped are discarded.
#[derive(Clone)]
pub struct SessionEvents {
    id: ConnectionId,
    sink: Weak<dyn EventSink>,
}

impl SessionEvents {
    pub(crate) fn new(id: ConnectionId, sink: Weak<dyn EventSink>) -> Self {
        Self { id, sink }
    }

    /// A handle whose events go nowhere. Useful when testing transports.
    #[must_use]
    pub fn detached(id: ConnectionId) -> Self {
        let sink: Weak<dyn EventSink> = Weak::<Discard>::new();
        Self { id, sink }
    }

    /// The connection this handle reports for.
    #[must_use]
    pub fn connection_id(&self) -> ConnectionId {
        self.id
    }

    /// Report that the session is connected and ready.
    pub fn connected(&self) {
        self.emit(SessionEvent::Connected);
    }

    /// Report that the session could not connect.
    pub fn connect_failed(&self, error: DriverError) {
        self.emit(SessionEvent::ConnectFailed(error));
    }

    /// Report that the session has ended.
    pub fn ended(&self) {
        self.emit(SessionEvent::Ended);
    }

    /// Report an error observed on the session.
    pub fn error(&self, error: DriverError) {
        self.emit(SessionEvent::Error(error));
    }

    /// Report an informational server message.
    pub fn message(&self, message: impl Into<String>) {
        self.emit(SessionEvent::Message(message.into()));
    }

    /// Deliver an event to the pool.
    pub fn emit(&self, event: SessionEvent) {
        if let Some(sink) = self.sink.upgrade() {
            sink.on_event(self.id, event);
        }
    }
}

impl fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionEvents")
            .field("connection_id", &self.id)
            .finish()
    }
}

struct Discard;

impl EventSink for Discard {
    fn on_event(&self, _id: ConnectionId, _event: SessionEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_is_redacted() {
        let config = SessionConfig {
            server: "db.local".into(),
            user_name: "app".into(),
            password: "hunter2".into(),
            options: Map::new(),
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("db.local"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_detached_events_are_discarded() {
        let events = SessionEvents::detached(ConnectionId::new(7));
        events.connected();
        events.error(DriverError::socket("gone"));
        assert_eq!(events.connection_id(), ConnectionId::new(7));
    }
}
