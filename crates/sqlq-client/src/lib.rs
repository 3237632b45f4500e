//! # sqlq-client
//!
//! Declarative, parameterized queries over a queued connection pool.
//!
//! A query is defined once from SQL text and a list of typed parameters.
//! Each call binds a map of values and queues a job on the pool. The result
//! comes back either through a callback or through a future, and connection
//! failures are retried by the pool without the caller noticing.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlq_client::{Client, Config, ParamSpec};
//! use sqlq_types::{SqlValue, Values};
//!
//! let config = Config::from_json(&std::fs::read_to_string("sql.json")?)?;
//! let client = Client::new(&config, transport)?;
//! client.start();
//!
//! let by_id = client.define_future_query(
//!     "SELECT id, name FROM users WHERE id = @id",
//!     &[ParamSpec::new("id", "Int")],
//!     true,
//! )?;
//!
//! let mut values = Values::new();
//! values.insert("id".into(), SqlValue::from(42));
//! let rows = by_id.call(&values).await?;
//!
//! let touch = client.define_query(
//!     "UPDATE users SET seen = GETDATE() WHERE id = @id",
//!     &[ParamSpec::new("id", "int")],
//!     |result| {
//!         if let Err(e) = result {
//!             tracing::error!(error = %e, "touch failed");
//!         }
//!     },
//! )?;
//! touch.call(&values);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod config;
pub mod delivery;
pub mod error;
pub mod obfuscation;
pub mod query;

pub use client::Client;
pub use config::{Authentication, Config, Credentials};
pub use delivery::{Callback, CallbackQuery, FutureQuery, Invocable, QueryFuture, callback};
pub use error::{Error, Result};
pub use query::{ParamSpec, PreparedQuery, QueryDefinition};

// Re-exports for convenience
pub use sqlq_pool::{Pool, PoolConfig, PoolMetrics, PoolStatus};
pub use sqlq_types::{ResultSet, Rows, SqlValue, Values};
