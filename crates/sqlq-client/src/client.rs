//! The caller-facing client.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use sqlq_pool::{JobId, JobResult, Pool, PoolConfig, PoolMetrics, PoolStatus, Transport};
use sqlq_types::{ResultSet, Statement};

use crate::config::Config;
use crate::delivery::{Callback, CallbackQuery, FutureQuery, Invocable, callback};
use crate::error::Error;
use crate::query::{ParamSpec, PreparedQuery, QueryDefinition};

/// Queued SQL client.
///
/// Wraps a [`Pool`] and turns query definitions into invocables that queue
/// jobs on it. Cloning is cheap and shares the pool.
pub struct Client<T: Transport> {
    pool: Pool<T>,
}

impl<T: Transport> Client<T> {
    /// Create a client with the default pool settings.
    pub fn new(config: &Config, transport: T) -> Result<Self, Error> {
        Self::with_pool_config(config, transport, PoolConfig::default())
    }

    /// Create a client with custom pool settings.
    pub fn with_pool_config(
        config: &Config,
        transport: T,
        pool_config: PoolConfig,
    ) -> Result<Self, Error> {
        let session = config.resolve()?;
        let pool = Pool::new(transport, session, pool_config)?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: Pool<T>) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<T> {
        &self.pool
    }

    /// Start the scheduler. Must be called from within a Tokio runtime.
    pub fn start(&self) {
        self.pool.start();
    }

    /// Stop dispatching new jobs; running jobs still complete.
    pub fn stop(&self) {
        self.pool.stop();
    }

    /// Close every connection and fail anything still pending.
    pub fn exit(&self) {
        self.pool.exit();
    }

    /// Queue a one-off statement with no parameters.
    pub fn exec<F>(&self, sql: impl Into<String>, callback: F) -> JobId
    where
        F: FnOnce(Result<ResultSet, Error>) + Send + 'static,
    {
        self.pool.submit(
            Statement::new(sql),
            Box::new(move |result: JobResult| callback(result.map_err(Error::from))),
        )
    }

    /// Define a callback-mode query.
    ///
    /// Parameter types are resolved now; an unknown type name is an error
    /// and nothing is queued.
    pub fn define_query<F>(
        &self,
        sql: impl Into<String>,
        params: &[ParamSpec],
        callback: F,
    ) -> Result<CallbackQuery<T>, Error>
    where
        F: Fn(Result<ResultSet, Error>) + Send + Sync + 'static,
    {
        let query = PreparedQuery::new(sql, params)?;
        tracing::debug!(params = query.param_count(), "callback query defined");
        Ok(CallbackQuery::new(self.pool.clone(), query, Arc::new(callback)))
    }

    /// Define a future-mode query.
    pub fn define_future_query(
        &self,
        sql: impl Into<String>,
        params: &[ParamSpec],
        flatten: bool,
    ) -> Result<FutureQuery<T>, Error> {
        let query = PreparedQuery::new(sql, params)?;
        tracing::debug!(params = query.param_count(), flatten, "future query defined");
        Ok(FutureQuery::new(self.pool.clone(), query, flatten))
    }

    /// Define a batch of queries, keyed by id.
    ///
    /// Relative SQL file paths are resolved against the working directory.
    pub fn define_queries(
        &self,
        definitions: impl IntoIterator<Item = QueryDefinition>,
    ) -> Result<HashMap<String, Invocable<T>>, Error> {
        self.define_all(definitions, None)
    }

    /// Load and define a JSON array of query definitions.
    ///
    /// Relative SQL file paths are resolved against the definition file's
    /// directory.
    pub fn load_definitions(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<HashMap<String, Invocable<T>>, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let definitions: Vec<QueryDefinition> = serde_json::from_str(&text)?;

        tracing::info!(
            path = %path.display(),
            count = definitions.len(),
            "loading query definitions"
        );
        self.define_all(definitions, path.parent())
    }

    /// Current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    fn define_all(
        &self,
        definitions: impl IntoIterator<Item = QueryDefinition>,
        base: Option<&Path>,
    ) -> Result<HashMap<String, Invocable<T>>, Error> {
        let mut queries = HashMap::new();

        for definition in definitions {
            if definition.id.is_empty() {
                return Err(Error::Definition {
                    id: definition.id,
                    reason: "`id` must not be empty".into(),
                });
            }
            if queries.contains_key(&definition.id) {
                return Err(Error::Definition {
                    id: definition.id,
                    reason: "duplicate id".into(),
                });
            }

            let sql = definition.load_sql(base)?;
            let query = PreparedQuery::new(sql, &definition.params)?;

            let invocable = if definition.use_future {
                Invocable::Future(FutureQuery::new(
                    self.pool.clone(),
                    query,
                    definition.flatten,
                ))
            } else {
                let default: Callback = definition.callback.unwrap_or_else(|| callback(|_| {}));
                Invocable::Callback(CallbackQuery::new(self.pool.clone(), query, default))
            };

            tracing::debug!(
                id = %definition.id,
                future = definition.use_future,
                "query defined"
            );
            queries.insert(definition.id, invocable);
        }

        Ok(queries)
    }
}

impl<T: Transport> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client").field("pool", &self.pool).finish()
    }
}
