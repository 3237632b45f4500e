//! Jobs and the job queue.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use sqlq_types::{ResultSet, Statement};

use crate::error::PoolError;

/// Identifier of a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(u64);

impl JobId {
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

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{}", self.0)
    }
}

/// Terminal outcome of a job.
pub type JobResult = Result<ResultSet, PoolError>;

/// Delivery target for a job's terminal outcome.
///
/// Callback and future delivery are both expressed as a `Reply`; the pool
/// only ever sees this one shape.
pub type Reply = Box<dyn FnOnce(JobResult) + Send + 'static>;

/// A queued statement invocation.
pub(crate) struct Job {
    id: JobId,
    statement: Arc<Statement>,
    reply: Reply,
    /// Executions started so far.
    pub(crate) attempts: u32,
}

impl Job {
    pub(crate) fn new(id: JobId, statement: Arc<Statement>, reply: Reply) -> Self {
        Self {
            id,
            statement,
            reply,
            attempts: 0,
        }
    }

    pub(crate) fn id(&self) -> JobId {
        self.id
    }

    pub(crate) fn statement(&self) -> &Arc<Statement> {
        &self.statement
    }

    /// Deliver the terminal outcome, consuming the job.
    pub(crate) fn finish(self, result: JobResult) {
        (self.reply)(result);
    }
}

/// FIFO of pending jobs.
///
/// New submissions and retried jobs both enter at the tail, so a retry never
/// jumps ahead of work submitted while it was running.
#[derive(Default)]
pub(crate) struct JobQueue {
    jobs: VecDeque<Job>,
}

impl JobQueue {
    pub(crate) fn push(&mut self, job: Job) {
        self.jobs.push_back(job);
    }

    pub(crate) fn pop(&mut self) -> Option<Job> {
        self.jobs.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.jobs.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub(crate) fn ids(&self) -> Vec<JobId> {
        self.jobs.iter().map(Job::id).collect()
    }

    pub(crate) fn drain(&mut self) -> impl Iterator<Item = Job> + '_ {
        self.jobs.drain(..)
    }
}
