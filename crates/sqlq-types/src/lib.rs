//! # sqlq-types
//!
//! Value and row types shared between the sqlq pool core, its transports and
//! the caller-facing client.
//!
//! ## Contents
//!
//! - [`SqlValue`]: a runtime parameter or column value
//! - [`SqlType`]: the transport's native parameter type tags, looked up
//!   case-insensitively from declared type names
//! - [`Row`], [`Field`] and [`FlatRow`]: native field-wrapper rows and their
//!   flattened `column -> value` projection
//! - [`Statement`]: SQL text with its bound parameters, ready to execute
//!
//! ## Example
//!
//! ```
//! use sqlq_types::{SqlType, SqlValue};
//!
//! let ty: SqlType = "nvarchar".parse().unwrap();
//! assert_eq!(ty, SqlType::NVarChar);
//!
//! let value = SqlValue::from(42_i32);
//! assert_eq!(value.as_i64(), Some(42));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod row;
pub mod sql_type;
pub mod statement;
pub mod value;

pub use error::TypeError;
pub use row::{Field, FlatRow, ResultSet, Row, Rows};
pub use sql_type::SqlType;
pub use statement::{BoundParam, ParamOptions, Statement};
pub use value::{SqlValue, Values};
