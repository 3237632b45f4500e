//! Callback and future delivery of query results.
//!
//! Both flavors submit the same kind of job to the pool and differ only in
//! how the terminal outcome reaches the caller. Retries happen inside the
//! pool and are never observed here.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use sqlq_pool::{JobId, JobResult, Pool, PoolError, Transport};
use sqlq_types::{ResultSet, Rows, Values};
use tokio::sync::oneshot;

use crate::error::Error;
use crate::query::PreparedQuery;

/// Receives the outcome of a callback-mode query.
///
/// Results are delivered unflattened.
pub type Callback = Arc<dyn Fn(Result<ResultSet, Error>) + Send + Sync + 'static>;

/// Wrap a closure as a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(Result<ResultSet, Error>) + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A query whose results are delivered to a callback.
pub struct CallbackQuery<T: Transport> {
    pool: Pool<T>,
    query: Arc<PreparedQuery>,
    callback: Callback,
}

impl<T: Transport> CallbackQuery<T> {
    pub(crate) fn new(pool: Pool<T>, query: PreparedQuery, callback: Callback) -> Self {
        Self {
            pool,
            query: Arc::new(query),
            callback,
        }
    }

    /// Queue an invocation, delivering to the default callback.
    pub fn call(&self, values: &Values) -> JobId {
        self.call_with(values, Arc::clone(&self.callback))
    }

    /// Queue an invocation, delivering to `callback` instead of the default.
    pub fn call_with(&self, values: &Values, callback: Callback) -> JobId {
        let statement = self.query.bind(values);
        self.pool.submit(
            statement,
            Box::new(move |result: JobResult| callback(result.map_err(Error::from))),
        )
    }

    /// The prepared statement this query binds.
    #[must_use]
    pub fn query(&self) -> &PreparedQuery {
        &self.query
    }
}

impl<T: Transport> Clone for CallbackQuery<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            query: Arc::clone(&self.query),
            callback: Arc::clone(&self.callback),
        }
    }
}

impl<T: Transport> fmt::Debug for CallbackQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackQuery")
            .field("sql", &self.query.sql())
            .finish_non_exhaustive()
    }
}

/// A query whose results are delivered through a [`QueryFuture`].
pub struct FutureQuery<T: Transport> {
    pool: Pool<T>,
    query: Arc<PreparedQuery>,
    flatten: bool,
}

impl<T: Transport> FutureQuery<T> {
    pub(crate) fn new(pool: Pool<T>, query: PreparedQuery, flatten: bool) -> Self {
        Self {
            pool,
            query: Arc::new(query),
            flatten,
        }
    }

    /// Queue an invocation.
    ///
    /// The job is queued immediately, whether or not the returned future is
    /// ever polled.
    pub fn call(&self, values: &Values) -> QueryFuture {
        let (tx, rx) = oneshot::channel();
        let job_id = self.pool.submit(
            self.query.bind(values),
            Box::new(move |result: JobResult| {
                let _ = tx.send(result);
            }),
        );

        QueryFuture {
            job_id,
            flatten: self.flatten,
            rx,
        }
    }

    /// Whether rows are flattened before delivery.
    #[must_use]
    pub fn flattens(&self) -> bool {
        self.flatten
    }

    /// The prepared statement this query binds.
    #[must_use]
    pub fn query(&self) -> &PreparedQuery {
        &self.query
    }
}

impl<T: Transport> Clone for FutureQuery<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            query: Arc::clone(&self.query),
            flatten: self.flatten,
        }
    }
}

impl<T: Transport> fmt::Debug for FutureQuery<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FutureQuery")
            .field("sql", &self.query.sql())
            .field("flatten", &self.flatten)
            .finish_non_exhaustive()
    }
}

/// Resolves to the rows of one queued invocation, or its terminal error.
///
/// A zero row count resolves to an empty sequence.
#[must_use = "the query runs regardless, but its result is lost if the future is dropped"]
#[derive(Debug)]
pub struct QueryFuture {
    job_id: JobId,
    flatten: bool,
    rx: oneshot::Receiver<JobResult>,
}

impl QueryFuture {
    /// Identifier of the queued job.
    #[must_use]
    pub fn job_id(&self) -> JobId {
        self.job_id
    }
}

impl Future for QueryFuture {
    type Output = Result<Rows, Error>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let flatten = self.flatten;
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Ready(Ok(Ok(set))) => Poll::Ready(Ok(set.into_rows(flatten))),
            Poll::Ready(Ok(Err(e))) => Poll::Ready(Err(e.into())),
            Poll::Ready(Err(_)) => Poll::Ready(Err(PoolError::Canceled.into())),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// A defined query in either delivery mode.
pub enum Invocable<T: Transport> {
    /// Callback delivery.
    Callback(CallbackQuery<T>),
    /// Future delivery.
    Future(FutureQuery<T>),
}

impl<T: Transport> Invocable<T> {
    /// Whether results are delivered through a future.
    #[must_use]
    pub fn is_future(&self) -> bool {
        matches!(self, Self::Future(_))
    }

    /// The callback-mode query, if this is one.
    #[must_use]
    pub fn as_callback(&self) -> Option<&CallbackQuery<T>> {
        match self {
            Self::Callback(query) => Some(query),
            Self::Future(_) => None,
        }
    }

    /// The future-mode query, if this is one.
    #[must_use]
    pub fn as_future(&self) -> Option<&FutureQuery<T>> {
        match self {
            Self::Future(query) => Some(query),
            Self::Callback(_) => None,
        }
    }
}

impl<T: Transport> Clone for Invocable<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Callback(query) => Self::Callback(query.clone()),
            Self::Future(query) => Self::Future(query.clone()),
        }
    }
}

impl<T: Transport> fmt::Debug for Invocable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(query) => query.fmt(f),
            Self::Future(query) => query.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlq_pool::DriverError;
    use sqlq_types::{Field, Row, SqlValue};

    fn future(flatten: bool) -> (oneshot::Sender<JobResult>, QueryFuture) {
        let (tx, rx) = oneshot::channel();
        (
            tx,
            QueryFuture {
                job_id: JobId::new(1),
                flatten,
                rx,
            },
        )
    }

    #[test]
    fn test_future_flattens_rows() {
        let (tx, fut) = future(true);
        let set = ResultSet::from_rows(vec![Row::new(vec![Field::new("col", 5)])]);
        tx.send(Ok(set)).unwrap();

        let rows = tokio_test::block_on(fut).unwrap();
        let flat = rows.into_flat();
        assert_eq!(flat[0].get("col"), Some(&SqlValue::Int(5)));
    }

    #[test]
    fn test_future_zero_row_count_is_empty() {
        let (tx, fut) = future(false);
        let mut set = ResultSet::from_rows(vec![Row::new(vec![Field::new("col", 5)])]);
        set.row_count = 0;
        tx.send(Ok(set)).unwrap();

        assert!(tokio_test::block_on(fut).unwrap().is_empty());
    }

    #[test]
    fn test_future_rejects_terminal_error() {
        let (tx, fut) = future(false);
        tx.send(Err(PoolError::Driver(DriverError::message("bad syntax"))))
            .unwrap();

        let err = tokio_test::block_on(fut).unwrap_err();
        assert!(matches!(err, Error::Pool(PoolError::Driver(_))));
    }

    #[test]
    fn test_future_dropped_reply_is_canceled() {
        let (tx, fut) = future(false);
        drop(tx);

        let err = tokio_test::block_on(fut).unwrap_err();
        assert!(matches!(err, Error::Pool(PoolError::Canceled)));
    }
}
