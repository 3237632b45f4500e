//! # sqlq-pool
//!
//! Queued connection pool for SQL Server statements.
//!
//! Statements are submitted as jobs to a FIFO queue. A scheduler loop binds
//! the head of the queue to an idle connection, opening new connections on
//! demand up to a fixed maximum. Connection-level failures put the job back
//! at the tail of the queue so a different connection can run it; callers
//! only ever see a statement's terminal outcome.
//!
//! ## Features
//!
//! - Bounded pool with lazily opened connections
//! - FIFO job queue with transparent retry of transient failures
//! - Adaptive scheduler poll interval (fast under load, slow when idle)
//! - Eviction of broken connections on the next acquisition
//! - Linear reconnect backoff with a failure budget
//! - Status snapshots and metrics for observability
//!
//! The wire protocol lives behind the [`Transport`] and [`Session`] traits.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sqlq_pool::{Pool, PoolConfig};
//! use sqlq_types::Statement;
//! use std::time::Duration;
//!
//! let pool = Pool::builder()
//!     .session_config(session_config)
//!     .max_connections(16)
//!     .poll_bounds(Duration::from_millis(10), Duration::from_millis(100))
//!     .build(transport)?;
//!
//! pool.start();
//!
//! pool.submit(Statement::new("SELECT name FROM users"), Box::new(|result| {
//!     match result {
//!         Ok(set) => println!("{} rows", set.rows.len()),
//!         Err(e) => eprintln!("query failed: {e}"),
//!     }
//! }));
//!
//! let status = pool.status();
//! println!("Pool utilization: {:.1}%", status.utilization());
//!
//! // Close every session and fail anything still queued.
//! pool.exit();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
mod factory;
pub mod job;
pub mod pool;
pub mod record;
mod scheduler;
pub mod transport;

// Configuration
pub use config::PoolConfig;

// Error types
pub use error::{DriverError, PoolError};

// Jobs
pub use job::{JobId, JobResult, Reply};

// Pool types
pub use pool::{Pool, PoolBuilder, PoolMetrics, PoolStatus};

// Connection records
pub use record::{ConnectionId, ConnectionStatus, RecordInfo};

// Transport boundary
pub use transport::{Session, SessionConfig, SessionEvent, SessionEvents, Transport};
