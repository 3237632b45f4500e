//! Connection records and their state machine.
//!
//! ```text
//! NEW -> IDLE -> BUSY -> IDLE -> ...
//! IDLE | BUSY -> FAILED -> (evicted)
//! ```
//!
//! NEW is only held while the session is connecting. A FAILED record stays
//! in the pool until the next acquisition scan evicts it.

use std::fmt;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::time::Instant;

use crate::job::Job;

/// Identifier of a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw identifier.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Lifecycle state of a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionStatus {
    /// Connecting; not yet usable.
    New,
    /// Connected and free.
    Idle,
    /// Executing a job.
    Busy,
    /// Broken; evicted on the next acquisition scan.
    Failed,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::New => "new",
            Self::Idle => "idle",
            Self::Busy => "busy",
            Self::Failed => "failed",
        })
    }
}

/// Point-in-time view of one pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordInfo {
    /// Connection identifier.
    pub id: ConnectionId,
    /// Current status.
    pub status: ConnectionStatus,
}

/// The pool's bookkeeping entry for one session.
pub(crate) struct Record<S> {
    pub(crate) id: ConnectionId,
    /// Attached once `Transport::open` returns; events may arrive earlier.
    pub(crate) session: Option<Arc<S>>,
    pub(crate) status: ConnectionStatus,
    /// Acquisition suspended on this record finishing its connect.
    pub(crate) waiter: Option<oneshot::Sender<bool>>,
    /// The job bound to this record while it is BUSY.
    pub(crate) job: Option<Job>,
    pub(crate) created_at: Instant,
}

impl<S> Record<S> {
    pub(crate) fn connecting(id: ConnectionId, waiter: oneshot::Sender<bool>) -> Self {
        Self {
            id,
            session: None,
            status: ConnectionStatus::New,
            waiter: Some(waiter),
            job: None,
            created_at: Instant::now(),
        }
    }

    /// Whether the record can take a job right now.
    pub(crate) fn is_available(&self) -> bool {
        self.status == ConnectionStatus::Idle && self.session.is_some() && self.job.is_none()
    }

    /// Resolve a pending acquisition, if any.
    pub(crate) fn resolve_waiter(&mut self, connected: bool) {
        if let Some(waiter) = self.waiter.take() {
            let _ = waiter.send(connected);
        }
    }

    pub(crate) fn info(&self) -> RecordInfo {
        RecordInfo {
            id: self.id,
            status: self.status,
        }
    }
}

impl<S> fmt::Debug for Record<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("status", &self.status)
            .field("job", &self.job.as_ref().map(Job::id))
            .field("age", &self.created_at.elapsed())
            .finish()
    }
}
