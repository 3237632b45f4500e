//! Scripted in-memory transport.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use sqlq_pool::{ConnectionId, DriverError, Session, SessionConfig, SessionEvents, Transport};
use sqlq_types::{BoundParam, ResultSet, Statement};
use tokio::sync::watch;

/// What one execution of a statement does.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Return this result.
    Rows(ResultSet),
    /// Return this error.
    Fail(DriverError),
    /// Report a socket error on the session mid-flight, then fail the
    /// statement with the same error.
    SocketDrop,
}

impl Outcome {
    /// Success with `n` affected rows and no row data.
    #[must_use]
    pub fn affected(n: u64) -> Self {
        Self::Rows(ResultSet::affected(n))
    }

    /// Request timeout.
    #[must_use]
    pub fn timeout() -> Self {
        Self::Fail(DriverError::timeout("request timed out"))
    }

    /// Non-retryable server error.
    #[must_use]
    pub fn server_error(message: &str) -> Self {
        Self::Fail(DriverError::message(message))
    }
}

/// One statement execution seen by the mock.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Connection that ran the statement.
    pub connection: ConnectionId,
    /// SQL text.
    pub sql: String,
    /// Bound parameters.
    pub params: Vec<BoundParam>,
}

#[derive(Debug)]
struct MockState {
    connect_delay: Mutex<Duration>,
    execute_delay: Mutex<Duration>,
    connect_failures: Mutex<VecDeque<DriverError>>,
    refuse: Mutex<Option<DriverError>>,
    scripts: Mutex<HashMap<String, VecDeque<Outcome>>>,
    default_outcome: Mutex<Outcome>,
    held: watch::Sender<bool>,
    sessions: Mutex<Vec<SessionEvents>>,
    configs: Mutex<Vec<SessionConfig>>,
    executions: Mutex<Vec<Execution>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    max_session_in_flight: AtomicUsize,
}

/// A [`Transport`] whose connections and statements follow a script.
///
/// Cloning shares the script and the recorded activity, so a test keeps a
/// clone to steer and inspect the transport it handed to a pool.
///
/// By default connections succeed immediately and every statement returns
/// one affected row.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<MockState>,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    /// Create a transport with default behavior.
    #[must_use]
    pub fn new() -> Self {
        let (held, _) = watch::channel(false);
        Self {
            state: Arc::new(MockState {
                connect_delay: Mutex::new(Duration::ZERO),
                execute_delay: Mutex::new(Duration::ZERO),
                connect_failures: Mutex::new(VecDeque::new()),
                refuse: Mutex::new(None),
                scripts: Mutex::new(HashMap::new()),
                default_outcome: Mutex::new(Outcome::affected(1)),
                held,
                sessions: Mutex::new(Vec::new()),
                configs: Mutex::new(Vec::new()),
                executions: Mutex::new(Vec::new()),
                opened: AtomicUsize::new(0),
                closed: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
                max_session_in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Delay before a connection attempt reports its outcome.
    #[must_use]
    pub fn with_connect_delay(self, delay: Duration) -> Self {
        *self.state.connect_delay.lock() = delay;
        self
    }

    /// Time every statement takes to run.
    #[must_use]
    pub fn with_execute_delay(self, delay: Duration) -> Self {
        *self.state.execute_delay.lock() = delay;
        self
    }

    /// Fail the next connection attempt with `error`.
    pub fn fail_next_connect(&self, error: DriverError) {
        self.state.connect_failures.lock().push_back(error);
    }

    /// Fail every connection attempt with `error` until [`accept`](Self::accept).
    pub fn refuse(&self, error: DriverError) {
        *self.state.refuse.lock() = Some(error);
    }

    /// Stop refusing connections.
    pub fn accept(&self) {
        *self.state.refuse.lock() = None;
    }

    /// Queue outcomes for the next executions of `sql`, in order.
    pub fn script(&self, sql: &str, outcomes: impl IntoIterator<Item = Outcome>) {
        self.state
            .scripts
            .lock()
            .entry(sql.to_string())
            .or_default()
            .extend(outcomes);
    }

    /// Outcome of executions with nothing scripted.
    pub fn set_default(&self, outcome: Outcome) {
        *self.state.default_outcome.lock() = outcome;
    }

    /// Hold every execution until [`release`](Self::release).
    pub fn hold(&self) {
        self.state.held.send_replace(true);
    }

    /// Let held executions finish.
    pub fn release(&self) {
        self.state.held.send_replace(false);
    }

    /// End a connection from the server side.
    pub fn drop_connection(&self, id: ConnectionId) {
        if let Some(events) = self.events(id) {
            events.ended();
        }
    }

    /// Raise an error event on a connection.
    pub fn raise_error(&self, id: ConnectionId, error: DriverError) {
        if let Some(events) = self.events(id) {
            events.error(error);
        }
    }

    /// Sessions opened so far.
    #[must_use]
    pub fn opened(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Sessions closed by the pool.
    #[must_use]
    pub fn closed(&self) -> usize {
        self.state.closed.load(Ordering::SeqCst)
    }

    /// Statements currently running.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.state.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of statements that ran at the same time.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.state.max_in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of statements that ran at the same time on one session.
    #[must_use]
    pub fn max_session_concurrency(&self) -> usize {
        self.state.max_session_in_flight.load(Ordering::SeqCst)
    }

    /// Every execution started so far, in start order.
    #[must_use]
    pub fn executions(&self) -> Vec<Execution> {
        self.state.executions.lock().clone()
    }

    /// Executions of `sql`.
    #[must_use]
    pub fn executions_of(&self, sql: &str) -> Vec<Execution> {
        self.state
            .executions
            .lock()
            .iter()
            .filter(|e| e.sql == sql)
            .cloned()
            .collect()
    }

    /// Session settings of every connection attempt.
    #[must_use]
    pub fn configs(&self) -> Vec<SessionConfig> {
        self.state.configs.lock().clone()
    }

    fn events(&self, id: ConnectionId) -> Option<SessionEvents> {
        self.state
            .sessions
            .lock()
            .iter()
            .find(|e| e.connection_id() == id)
            .cloned()
    }
}

impl Transport for MockTransport {
    type Session = MockSession;

    fn open(&self, config: &SessionConfig, events: SessionEvents) -> MockSession {
        let id = events.connection_id();
        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.configs.lock().push(config.clone());
        self.state.sessions.lock().push(events.clone());

        let failure = self
            .state
            .connect_failures
            .lock()
            .pop_front()
            .or_else(|| self.state.refuse.lock().clone());
        let delay = *self.state.connect_delay.lock();

        tracing::trace!(connection_id = %id, refused = failure.is_some(), "mock connect");

        let connect_events = events.clone();
        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match failure {
                Some(error) => connect_events.connect_failed(error),
                None => connect_events.connected(),
            }
        });

        MockSession {
            id,
            events,
            state: Arc::clone(&self.state),
            running: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }
}

/// Session produced by [`MockTransport`].
#[derive(Debug)]
pub struct MockSession {
    id: ConnectionId,
    events: SessionEvents,
    state: Arc<MockState>,
    running: AtomicUsize,
    closed: AtomicBool,
}

impl MockSession {
    fn next_outcome(&self, sql: &str) -> Outcome {
        self.state
            .scripts
            .lock()
            .get_mut(sql)
            .and_then(VecDeque::pop_front)
            .unwrap_or_else(|| self.state.default_outcome.lock().clone())
    }
}

#[async_trait]
impl Session for MockSession {
    async fn execute(&self, statement: &Statement) -> Result<ResultSet, DriverError> {
        self.state.executions.lock().push(Execution {
            connection: self.id,
            sql: statement.sql().to_string(),
            params: statement.params().to_vec(),
        });

        let running = self.state.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.max_in_flight.fetch_max(running, Ordering::SeqCst);
        let mine = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.state
            .max_session_in_flight
            .fetch_max(mine, Ordering::SeqCst);

        let mut held = self.state.held.subscribe();
        let _ = held.wait_for(|held| !held).await;

        let delay = *self.state.execute_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.next_outcome(statement.sql());
        self.running.fetch_sub(1, Ordering::SeqCst);
        self.state.in_flight.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            Outcome::Rows(set) => Ok(set),
            Outcome::Fail(error) => Err(error),
            Outcome::SocketDrop => {
                let error = DriverError::socket("connection lost");
                self.events.error(error.clone());
                Err(error)
            }
        }
    }

    fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.closed.fetch_add(1, Ordering::SeqCst);
            self.events.ended();
        }
    }
}
