//! # sqlq-testing
//!
//! Test infrastructure for the sqlq crates.
//!
//! [`MockTransport`] stands in for a database server: connection attempts
//! and statement outcomes are scripted, executions can be held open, and
//! every session and statement is recorded for assertions. The pool and
//! client scenario suites live in this crate's `tests/` directory.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod mock;

pub use mock::{Execution, MockSession, MockTransport, Outcome};

use sqlq_types::{Field, ResultSet, Row, SqlValue};

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Safe to call from every test; only the first call installs it.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// A result set with one row per entry, each row built from `(column, value)` pairs.
#[must_use]
pub fn rows<I, R, V>(rows: I) -> ResultSet
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = (&'static str, V)>,
    V: Into<SqlValue>,
{
    ResultSet::from_rows(
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(name, value)| Field::new(name, value))
                    .collect::<Row>()
            })
            .collect(),
    )
}
