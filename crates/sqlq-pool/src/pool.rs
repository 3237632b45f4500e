//! Connection pool implementation.
//!
//! The pool owns a bounded set of connection records and a FIFO of pending
//! jobs, both behind one mutex so every transition of the record state
//! machine happens together with the queue update it implies. Transport calls
//! and caller replies always run with the lock released.

use std::fmt;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use sqlq_types::{ResultSet, Statement};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};

use crate::config::PoolConfig;
use crate::error::{DriverError, PoolError};
use crate::factory::ConnectionFactory;
use crate::job::{Job, JobId, JobQueue, JobResult, Reply};
use crate::record::{ConnectionId, ConnectionStatus, Record, RecordInfo};
use crate::scheduler::{self, PollInterval};
use crate::transport::{EventSink, Session, SessionConfig, SessionEvent, SessionEvents, Transport};

/// A queued connection pool.
///
/// Callers [`submit`](Pool::submit) statements; the scheduler loop started by
/// [`start`](Pool::start) hands each one to an idle connection, opening new
/// connections up to the configured maximum as needed, and routes
/// the outcome to the job's reply.
///
/// Cloning a `Pool` is cheap; all clones share the same connections and queue.
///
/// # Example
///
/// ```rust,ignore
/// use sqlq_pool::{Pool, PoolConfig, SessionConfig};
/// use sqlq_types::Statement;
///
/// let pool = Pool::builder()
///     .session_config(session_config)
///     .max_connections(8)
///     .build(transport)?;
///
/// pool.start();
/// pool.submit(Statement::new("SELECT 1"), Box::new(|result| {
///     println!("{result:?}");
/// }));
/// ```
pub struct Pool<T: Transport> {
    inner: Arc<Shared<T>>,
}

impl<T: Transport> Clone for Pool<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) struct Shared<T: Transport> {
    /// Back-reference handed to sessions as their event sink.
    weak: Weak<Shared<T>>,

    config: PoolConfig,

    factory: ConnectionFactory<T>,

    /// Records and queue, guarded as a unit.
    state: Mutex<State<T::Session>>,

    /// Whether dispatching is stopped.
    stopped: AtomicBool,

    /// Scheduler loop task, when started.
    runner: Mutex<Option<JoinHandle<()>>>,

    next_connection_id: AtomicU64,

    next_job_id: AtomicU64,

    /// When the pool was created.
    created_at: Instant,

    metrics: Mutex<PoolMetricsInner>,
}

struct State<S> {
    records: Vec<Record<S>>,
    queue: JobQueue,
    poll: PollInterval,
    /// Consecutive failed connection attempts.
    connect_failures: u32,
    /// No new connection is opened before this instant.
    reconnect_after: Option<Instant>,
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    connections_created: u64,
    connections_closed: u64,
    connect_failures: u64,
    jobs_submitted: u64,
    jobs_dispatched: u64,
    jobs_completed: u64,
    jobs_failed: u64,
    jobs_requeued: u64,
}

/// Result of one acquisition attempt.
pub(crate) enum Acquire {
    /// An idle record.
    Ready(ConnectionId),
    /// A new record that is still connecting.
    Pending(ConnectionId, oneshot::Receiver<bool>),
    /// Stopped, at capacity, or backing off.
    Denied,
}

impl<T: Transport> Pool<T> {
    /// Create a new pool builder.
    #[must_use]
    pub fn builder() -> PoolBuilder<T> {
        PoolBuilder::new()
    }

    /// Create a new pool.
    ///
    /// No connection is opened until work arrives. Call [`start`](Self::start)
    /// to begin dispatching queued jobs.
    pub fn new(
        transport: T,
        session_config: SessionConfig,
        config: PoolConfig,
    ) -> Result<Self, PoolError> {
        config.validate()?;

        tracing::info!(
            server = %session_config.server,
            max = config.max_connections,
            "connection pool created"
        );

        let inner = Arc::new_cyclic(|weak| Shared {
            weak: weak.clone(),
            factory: ConnectionFactory::new(transport, session_config),
            state: Mutex::new(State {
                records: Vec::new(),
                queue: JobQueue::default(),
                poll: PollInterval::new(&config),
                connect_failures: 0,
                reconnect_after: None,
            }),
            config,
            stopped: AtomicBool::new(false),
            runner: Mutex::new(None),
            next_connection_id: AtomicU64::new(1),
            next_job_id: AtomicU64::new(1),
            created_at: Instant::now(),
            metrics: Mutex::new(PoolMetricsInner::default()),
        });

        Ok(Self { inner })
    }

    /// Start the scheduler loop. Idempotent.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&self) {
        let mut runner = self.inner.runner.lock();
        let was_stopped = self.inner.stopped.swap(false, Ordering::AcqRel);

        if let Some(handle) = runner.as_ref() {
            if !handle.is_finished() {
                if !was_stopped {
                    return;
                }
                // A stopped loop may still be sleeping; replace it.
                handle.abort();
            }
        }

        *runner = Some(tokio::spawn(scheduler::run(Arc::downgrade(&self.inner))));
        tracing::info!("connection pool started");
    }

    /// Stop dispatching new jobs. Idempotent.
    ///
    /// Jobs already running on a connection are not cancelled and still
    /// deliver their results. Queued jobs stay queued until the next
    /// [`start`](Self::start).
    pub fn stop(&self) {
        if !self.inner.stopped.swap(true, Ordering::AcqRel) {
            tracing::info!(queued = self.queued_len(), "connection pool stopped");
        }
    }

    /// Stop the pool and close every session, whatever its status.
    ///
    /// Jobs running on a closed session and jobs still queued are failed
    /// with [`PoolError::Closed`].
    pub fn exit(&self) {
        self.stop();
        if let Some(handle) = self.inner.runner.lock().take() {
            handle.abort();
        }

        let (sessions, jobs) = {
            let mut state = self.inner.state.lock();
            let mut sessions = Vec::new();
            let mut jobs = Vec::new();

            for mut record in state.records.drain(..) {
                record.resolve_waiter(false);
                if let Some(job) = record.job.take() {
                    jobs.push(job);
                }
                if let Some(session) = record.session.take() {
                    sessions.push(session);
                }
            }
            jobs.extend(state.queue.drain());
            (sessions, jobs)
        };

        self.inner.metrics.lock().connections_closed += sessions.len() as u64;
        tracing::info!(
            sessions = sessions.len(),
            jobs = jobs.len(),
            "connection pool exiting"
        );

        for session in sessions {
            session.close();
        }
        for job in jobs {
            self.inner.metrics.lock().jobs_failed += 1;
            job.finish(Err(PoolError::Closed));
        }
    }

    /// Check if dispatching is stopped.
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.is_stopped()
    }

    /// Check if the scheduler loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.is_stopped()
            && self
                .inner
                .runner
                .lock()
                .as_ref()
                .is_some_and(|handle| !handle.is_finished())
    }

    /// Queue a statement for execution.
    ///
    /// `reply` is invoked exactly once with the terminal outcome. Transient
    /// connection failures are retried internally and never reach it.
    pub fn submit(&self, statement: impl Into<Arc<Statement>>, reply: Reply) -> JobId {
        let id = JobId::new(self.inner.next_job_id.fetch_add(1, Ordering::Relaxed));
        let job = Job::new(id, statement.into(), reply);

        let queued = {
            let mut state = self.inner.state.lock();
            state.queue.push(job);
            state.queue.len()
        };
        self.inner.metrics.lock().jobs_submitted += 1;

        tracing::trace!(job_id = %id, queued, "job queued");
        id
    }

    /// Acquire an idle connection, opening a new one if there is room.
    ///
    /// Failed connections met during the scan are evicted. Returns `None`
    /// when the pool is stopped, when it is at capacity with nothing idle,
    /// or when a newly opened connection fails to connect. The returned
    /// connection stays IDLE; the scheduler binds jobs to it.
    pub async fn acquire(&self) -> Option<ConnectionId> {
        match self.inner.try_acquire(false) {
            Acquire::Ready(id) => Some(id),
            Acquire::Pending(id, connected) => match connected.await {
                Ok(true) => Some(id),
                _ => None,
            },
            Acquire::Denied => None,
        }
    }

    /// Get the current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock();
        let mut status = PoolStatus {
            idle: 0,
            busy: 0,
            connecting: 0,
            failed: 0,
            total: state.records.len() as u32,
            max: self.inner.config.max_connections,
            queued: state.queue.len(),
        };

        for record in &state.records {
            match record.status {
                ConnectionStatus::New => status.connecting += 1,
                ConnectionStatus::Idle => status.idle += 1,
                ConnectionStatus::Busy => status.busy += 1,
                ConnectionStatus::Failed => status.failed += 1,
            }
        }
        status
    }

    /// Get pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.inner.metrics.lock();
        PoolMetrics {
            connections_created: inner.connections_created,
            connections_closed: inner.connections_closed,
            connect_failures: inner.connect_failures,
            jobs_submitted: inner.jobs_submitted,
            jobs_dispatched: inner.jobs_dispatched,
            jobs_completed: inner.jobs_completed,
            jobs_failed: inner.jobs_failed,
            jobs_requeued: inner.jobs_requeued,
            uptime: self.inner.created_at.elapsed(),
        }
    }

    /// Snapshot of every record, in scan order.
    #[must_use]
    pub fn records(&self) -> Vec<RecordInfo> {
        self.inner
            .state
            .lock()
            .records
            .iter()
            .map(Record::info)
            .collect()
    }

    /// Identifiers of the queued jobs, head first.
    #[must_use]
    pub fn queued(&self) -> Vec<JobId> {
        self.inner.state.lock().queue.ids()
    }

    /// The current scheduler poll interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.inner.state.lock().poll.current()
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Get the session settings used for new connections.
    #[must_use]
    pub fn session_config(&self) -> &SessionConfig {
        self.inner.factory.config()
    }

    fn queued_len(&self) -> usize {
        self.inner.state.lock().queue.len()
    }
}

impl<T: Transport> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("status", &self.status())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl<T: Transport> Shared<T> {
    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// One scheduler pass: if work is waiting, bind the head job to a connection.
    pub(crate) fn tick(self: &Arc<Self>) {
        if self.state.lock().queue.is_empty() {
            return;
        }

        match self.try_acquire(true) {
            Acquire::Ready(id) => {
                self.dispatch(id);
            }
            Acquire::Pending(id, connected) => {
                let shared = Arc::clone(self);
                tokio::spawn(async move {
                    if let Ok(true) = connected.await {
                        shared.dispatch(id);
                    }
                });
            }
            Acquire::Denied => {}
        }
    }

    /// Adjust the poll interval for the current backlog and return it.
    pub(crate) fn next_delay(&self) -> Duration {
        let mut state = self.state.lock();
        let backlog = !state.queue.is_empty();
        state.poll.adjust(backlog)
    }

    /// Find an idle record, evicting failed ones on the way, or start a new one.
    ///
    /// With `demand_limited`, no new connection is opened while as many
    /// connections are already connecting as there are queued jobs.
    pub(crate) fn try_acquire(&self, demand_limited: bool) -> Acquire {
        if self.is_stopped() {
            return Acquire::Denied;
        }

        let mut evicted = Vec::new();
        let outcome = {
            let mut state = self.state.lock();

            let mut idle = None;
            let mut index = 0;
            while index < state.records.len() {
                if state.records[index].status == ConnectionStatus::Failed {
                    evicted.push(state.records.remove(index));
                    continue;
                }
                if idle.is_none() && state.records[index].is_available() {
                    idle = Some(state.records[index].id);
                }
                index += 1;
            }

            if let Some(id) = idle {
                tracing::trace!(connection_id = %id, "acquired idle connection");
                Acquire::Ready(id)
            } else if self.may_grow(&state, demand_limited) {
                let id = ConnectionId::new(self.next_connection_id.fetch_add(1, Ordering::Relaxed));
                let (tx, rx) = oneshot::channel();
                state.records.push(Record::connecting(id, tx));
                Acquire::Pending(id, rx)
            } else {
                Acquire::Denied
            }
        };

        if !evicted.is_empty() {
            self.metrics.lock().connections_closed += evicted.len() as u64;
        }
        for record in evicted {
            tracing::debug!(connection_id = %record.id, "evicting failed connection");
            if let Some(session) = record.session {
                session.close();
            }
        }

        if let Acquire::Pending(id, _) = &outcome {
            self.open(*id);
        }
        outcome
    }

    fn may_grow(&self, state: &State<T::Session>, demand_limited: bool) -> bool {
        if state.records.len() >= self.config.max_connections as usize {
            return false;
        }

        if state
            .reconnect_after
            .is_some_and(|after| Instant::now() < after)
        {
            return false;
        }

        if demand_limited {
            let connecting = state
                .records
                .iter()
                .filter(|r| r.status == ConnectionStatus::New)
                .count();
            return connecting < state.queue.len();
        }

        true
    }

    /// Open the session for a freshly pushed NEW record and attach it.
    fn open(&self, id: ConnectionId) {
        let sink: Weak<dyn EventSink> = self.weak.clone();
        let events = SessionEvents::new(id, sink);

        let Some(session) = self.factory.create(id, self.is_stopped(), events) else {
            let mut state = self.state.lock();
            if let Some(index) = state.records.iter().position(|r| r.id == id) {
                let mut record = state.records.remove(index);
                record.resolve_waiter(false);
            }
            return;
        };

        self.metrics.lock().connections_created += 1;

        let orphaned = {
            let mut state = self.state.lock();
            match state.records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    record.session = Some(session);
                    None
                }
                None => Some(session),
            }
        };

        // The session ended before it could be attached.
        if let Some(session) = orphaned {
            session.close();
        }
    }

    /// Bind the head job to an idle record and start executing it.
    pub(crate) fn dispatch(self: &Arc<Self>, id: ConnectionId) -> bool {
        let (session, statement, job_id, attempt) = {
            let mut state = self.state.lock();
            if self.is_stopped() {
                return false;
            }

            let State { records, queue, .. } = &mut *state;
            let Some(record) = records.iter_mut().find(|r| r.id == id) else {
                return false;
            };
            if !record.is_available() {
                return false;
            }
            let Some(session) = record.session.clone() else {
                return false;
            };
            let Some(mut job) = queue.pop() else {
                return false;
            };

            job.attempts += 1;
            let statement = Arc::clone(job.statement());
            let job_id = job.id();
            let attempt = job.attempts;

            record.status = ConnectionStatus::Busy;
            record.job = Some(job);
            (session, statement, job_id, attempt)
        };

        self.metrics.lock().jobs_dispatched += 1;
        tracing::debug!(connection_id = %id, job_id = %job_id, attempt, "dispatching job");

        let shared = Arc::clone(self);
        tokio::spawn(async move {
            let result = session.execute(&statement).await;
            shared.complete(id, job_id, result);
        });
        true
    }

    /// Route a statement outcome back to its job.
    fn complete(&self, id: ConnectionId, job_id: JobId, result: Result<ResultSet, DriverError>) {
        let delivery = {
            let mut state = self.state.lock();
            let State { records, queue, .. } = &mut *state;

            let Some(record) = records.iter_mut().find(|r| r.id == id) else {
                tracing::trace!(connection_id = %id, job_id = %job_id, "late result for removed connection");
                return;
            };
            if record.job.as_ref().map(Job::id) != Some(job_id) {
                tracing::trace!(connection_id = %id, job_id = %job_id, "late result for requeued job");
                return;
            }
            let Some(job) = record.job.take() else {
                return;
            };

            match result {
                Ok(set) => Some((job, Ok(set))),
                Err(error) if error.is_transient() => {
                    tracing::warn!(
                        connection_id = %id,
                        job_id = %job_id,
                        error = %error,
                        "transient failure, requeueing job"
                    );
                    record.status = ConnectionStatus::Failed;
                    self.retry(queue, job, error)
                }
                Err(error) => {
                    tracing::debug!(connection_id = %id, job_id = %job_id, error = %error, "statement failed");
                    Some((job, Err(PoolError::Driver(error))))
                }
            }
        };

        if let Some((job, result)) = delivery {
            self.deliver(job, result);
            self.release(id);
        }
    }

    /// Requeue a job after a transient failure, unless it is out of attempts.
    fn retry(&self, queue: &mut JobQueue, job: Job, error: DriverError) -> Option<(Job, JobResult)> {
        if let Some(max) = self.config.max_attempts {
            if job.attempts >= max {
                tracing::warn!(job_id = %job.id(), attempts = job.attempts, "job out of attempts");
                let attempts = job.attempts;
                return Some((
                    job,
                    Err(PoolError::RetriesExhausted {
                        attempts,
                        last: error,
                    }),
                ));
            }
        }

        queue.push(job);
        self.metrics.lock().jobs_requeued += 1;
        None
    }

    fn deliver(&self, job: Job, result: JobResult) {
        {
            let mut metrics = self.metrics.lock();
            if result.is_ok() {
                metrics.jobs_completed += 1;
            } else {
                metrics.jobs_failed += 1;
            }
        }
        job.finish(result);
    }

    /// BUSY -> IDLE once the bound job's reply has fired.
    fn release(&self, id: ConnectionId) {
        let mut state = self.state.lock();
        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            if record.status == ConnectionStatus::Busy && record.job.is_none() {
                record.status = ConnectionStatus::Idle;
            }
        }
    }

    fn connected(&self, id: ConnectionId) {
        let mut state = self.state.lock();
        state.connect_failures = 0;
        state.reconnect_after = None;

        if let Some(record) = state.records.iter_mut().find(|r| r.id == id) {
            if record.status == ConnectionStatus::New {
                record.status = ConnectionStatus::Idle;
                record.resolve_waiter(true);
                tracing::debug!(connection_id = %id, "session connected");
            }
        }
    }

    fn connect_failed(&self, id: ConnectionId, error: DriverError) {
        let expired = {
            let mut state = self.state.lock();
            let Some(record) = state.records.iter_mut().find(|r| r.id == id) else {
                return;
            };
            record.status = ConnectionStatus::Failed;
            record.resolve_waiter(false);

            state.connect_failures += 1;
            let failures = state.connect_failures;
            self.metrics.lock().connect_failures += 1;

            let live = state
                .records
                .iter()
                .any(|r| r.status != ConnectionStatus::Failed);

            if failures >= self.config.reconnect_attempts && live {
                // Live sessions keep serving the backlog; growth waits out the backoff.
                let delay = self.config.reconnect_backoff * failures;
                state.reconnect_after = Some(Instant::now() + delay);
                tracing::warn!(
                    connection_id = %id,
                    attempts = failures,
                    retry_in = ?delay,
                    queued = state.queue.len(),
                    error = %error,
                    "connection attempts exhausted, continuing on live connections"
                );
                None
            } else if failures >= self.config.reconnect_attempts {
                state.connect_failures = 0;
                state.reconnect_after = None;
                let expired: Vec<Job> = state.queue.drain().collect();
                tracing::error!(
                    connection_id = %id,
                    attempts = failures,
                    failed_jobs = expired.len(),
                    error = %error,
                    "connection attempts exhausted"
                );
                Some((failures, expired))
            } else {
                let delay = self.config.reconnect_backoff * failures;
                state.reconnect_after = Some(Instant::now() + delay);
                tracing::warn!(
                    connection_id = %id,
                    attempt = failures,
                    retry_in = ?delay,
                    error = %error,
                    "connection failed"
                );
                None
            }
        };

        if let Some((attempts, jobs)) = expired {
            for job in jobs {
                self.deliver(
                    job,
                    Err(PoolError::Unreachable {
                        attempts,
                        last: error.clone(),
                    }),
                );
            }
        }
    }

    fn ended(&self, id: ConnectionId) {
        let mut state = self.state.lock();
        let Some(index) = state.records.iter().position(|r| r.id == id) else {
            return;
        };

        let mut record = state.records.remove(index);
        record.resolve_waiter(false);
        self.metrics.lock().connections_closed += 1;
        tracing::info!(connection_id = %id, status = %record.status, "session ended");

        if let Some(job) = record.job.take() {
            let error = DriverError::new("ECONNCLOSED", "session ended while executing");
            let delivery = self.retry(&mut state.queue, job, error);
            drop(state);
            if let Some((job, result)) = delivery {
                self.deliver(job, result);
            }
        }
    }

    fn session_error(&self, id: ConnectionId, error: DriverError) {
        let mut state = self.state.lock();
        let State {
            records,
            queue,
            poll,
            ..
        } = &mut *state;
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return;
        };

        let status = record.status;
        match status {
            ConnectionStatus::New => {
                drop(state);
                self.connect_failed(id, error);
            }
            ConnectionStatus::Busy if error.is_transient() => {
                tracing::warn!(connection_id = %id, error = %error, "connection lost mid-flight");
                record.status = ConnectionStatus::Failed;
                poll.raise();
                let delivery = match record.job.take() {
                    Some(job) => self.retry(queue, job, error),
                    None => None,
                };
                drop(state);
                if let Some((job, result)) = delivery {
                    self.deliver(job, result);
                }
            }
            ConnectionStatus::Idle if error.is_transient() => {
                tracing::warn!(connection_id = %id, error = %error, "idle connection lost");
                record.status = ConnectionStatus::Failed;
            }
            _ => {
                tracing::warn!(connection_id = %id, error = %error, "session error");
            }
        }
    }
}

impl<T: Transport> EventSink for Shared<T> {
    fn on_event(&self, id: ConnectionId, event: SessionEvent) {
        match event {
            SessionEvent::Connected => self.connected(id),
            SessionEvent::ConnectFailed(error) => self.connect_failed(id, error),
            SessionEvent::Ended => self.ended(id),
            SessionEvent::Error(error) => self.session_error(id, error),
            SessionEvent::Message(message) => {
                tracing::debug!(connection_id = %id, message = %message, "server message");
            }
        }
    }
}

impl<T: Transport> Drop for Shared<T> {
    fn drop(&mut self) {
        for record in self.state.get_mut().records.drain(..) {
            if let Some(session) = record.session {
                session.close();
            }
        }
    }
}

/// Builder for creating a connection pool.
///
/// # Example
///
/// ```rust,ignore
/// let pool = Pool::builder()
///     .session_config(session_config)
///     .max_connections(4)
///     .build(transport)?;
/// ```
pub struct PoolBuilder<T> {
    pool_config: PoolConfig,
    session_config: SessionConfig,
    transport: PhantomData<fn() -> T>,
}

impl<T> Default for PoolBuilder<T> {
    fn default() -> Self {
        Self {
            pool_config: PoolConfig::default(),
            session_config: SessionConfig::default(),
            transport: PhantomData,
        }
    }
}

impl<T> fmt::Debug for PoolBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolBuilder")
            .field("pool_config", &self.pool_config)
            .field("session_config", &self.session_config)
            .finish()
    }
}

impl<T: Transport> PoolBuilder<T> {
    /// Create a new pool builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Set the session settings used to open connections.
    #[must_use]
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Set the maximum number of connections.
    #[must_use]
    pub fn max_connections(mut self, count: u32) -> Self {
        self.pool_config.max_connections = count;
        self
    }

    /// Set the scheduler poll interval bounds.
    #[must_use]
    pub fn poll_bounds(mut self, floor: Duration, ceiling: Duration) -> Self {
        self.pool_config = self.pool_config.poll_bounds(floor, ceiling);
        self
    }

    /// Set the reconnect policy.
    #[must_use]
    pub fn reconnect(mut self, attempts: u32, backoff: Duration) -> Self {
        self.pool_config = self.pool_config.reconnect(attempts, backoff);
        self
    }

    /// Cap the number of executions per job.
    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.pool_config.max_attempts = Some(attempts);
        self
    }

    /// Build the pool over the given transport.
    pub fn build(self, transport: T) -> Result<Pool<T>, PoolError> {
        Pool::new(transport, self.session_config, self.pool_config)
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Connections ready for work.
    pub idle: u32,
    /// Connections executing a job.
    pub busy: u32,
    /// Connections still connecting.
    pub connecting: u32,
    /// Broken connections awaiting eviction.
    pub failed: u32,
    /// Total number of connection records.
    pub total: u32,
    /// Maximum allowed connections.
    pub max: u32,
    /// Jobs waiting in the queue.
    pub queued: usize,
}

impl PoolStatus {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.busy as f64 / self.max as f64) * 100.0
    }

    /// Check if the pool is at capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.total >= self.max
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Sessions opened since pool creation.
    pub connections_created: u64,
    /// Sessions closed, evicted or ended.
    pub connections_closed: u64,
    /// Failed connection attempts.
    pub connect_failures: u64,
    /// Jobs submitted.
    pub jobs_submitted: u64,
    /// Executions started, retries included.
    pub jobs_dispatched: u64,
    /// Jobs delivered a successful result.
    pub jobs_completed: u64,
    /// Jobs delivered an error.
    pub jobs_failed: u64,
    /// Jobs put back in the queue after a transient failure.
    pub jobs_requeued: u64,
    /// Time since pool creation.
    pub uptime: std::time::Duration,
}

impl PoolMetrics {
    /// Fraction of finished jobs that succeeded (0.0 to 1.0).
    #[must_use]
    pub fn completion_rate(&self) -> f64 {
        let total = self.jobs_completed + self.jobs_failed;
        if total == 0 {
            return 1.0;
        }
        self.jobs_completed as f64 / total as f64
    }

    /// Fraction of connection attempts that failed (0.0 to 1.0).
    #[must_use]
    pub fn connect_failure_rate(&self) -> f64 {
        if self.connections_created == 0 {
            return 0.0;
        }
        self.connect_failures as f64 / self.connections_created as f64
    }
}
