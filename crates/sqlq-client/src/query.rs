//! Query definitions and parameter binding.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sqlq_types::{BoundParam, ParamOptions, SqlType, Statement, Values};

use crate::delivery::Callback;
use crate::error::Error;

/// A declared statement parameter.
///
/// The type is named as text (`"NVarChar"`, `"int"`) and resolved
/// case-insensitively when the query is defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name, without the `@` prefix.
    pub name: String,

    /// Type name.
    #[serde(rename = "type")]
    pub type_name: String,

    /// Length, precision and scale.
    #[serde(default)]
    pub options: ParamOptions,
}

impl ParamSpec {
    /// Declare a parameter.
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            options: ParamOptions::default(),
        }
    }

    /// Set the maximum length.
    #[must_use]
    pub fn length(mut self, length: u32) -> Self {
        self.options.length = Some(length);
        self
    }

    /// Set precision and scale.
    #[must_use]
    pub fn precision(mut self, precision: u8, scale: u8) -> Self {
        self.options.precision = Some(precision);
        self.options.scale = Some(scale);
        self
    }
}

/// One entry of a batch of query definitions.
///
/// The SQL is given inline with `sql` or read from `file`. Definitions loaded
/// from JSON accept `usePromise` as an alias of `useFuture`.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDefinition {
    /// Name the invocable is registered under.
    pub id: String,

    /// Inline SQL text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,

    /// File holding the SQL text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Declared parameters, in order.
    #[serde(default)]
    pub params: Vec<ParamSpec>,

    /// Flatten rows before delivery (future mode only).
    #[serde(default)]
    pub flatten: bool,

    /// Deliver through a future instead of a callback.
    #[serde(default, alias = "usePromise")]
    pub use_future: bool,

    /// Default callback for callback-mode queries.
    #[serde(skip)]
    pub callback: Option<Callback>,
}

impl QueryDefinition {
    /// A definition with inline SQL.
    pub fn new(id: impl Into<String>, sql: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            sql: Some(sql.into()),
            ..Self::default()
        }
    }

    /// A definition whose SQL is read from a file.
    pub fn from_file(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Add a parameter.
    #[must_use]
    pub fn param(mut self, spec: ParamSpec) -> Self {
        self.params.push(spec);
        self
    }

    /// Deliver through a future, optionally flattening rows.
    #[must_use]
    pub fn future(mut self, flatten: bool) -> Self {
        self.use_future = true;
        self.flatten = flatten;
        self
    }

    /// Set the default callback.
    #[must_use]
    pub fn callback(mut self, callback: Callback) -> Self {
        self.callback = Some(callback);
        self
    }

    /// The SQL text, reading it from `file` relative to `base` when needed.
    pub fn load_sql(&self, base: Option<&Path>) -> Result<String, Error> {
        match (&self.sql, &self.file) {
            (Some(sql), None) => Ok(sql.clone()),
            (None, Some(file)) => {
                let path = match base {
                    Some(base) if file.is_relative() => base.join(file),
                    _ => file.clone(),
                };
                std::fs::read_to_string(&path).map_err(|source| Error::Io { path, source })
            }
            (Some(_), Some(_)) => Err(self.invalid("both `sql` and `file` are set")),
            (None, None) => Err(self.invalid("one of `sql` or `file` is required")),
        }
    }

    fn invalid(&self, reason: &str) -> Error {
        Error::Definition {
            id: self.id.clone(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Debug for QueryDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryDefinition")
            .field("id", &self.id)
            .field("sql", &self.sql)
            .field("file", &self.file)
            .field("params", &self.params)
            .field("flatten", &self.flatten)
            .field("use_future", &self.use_future)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ResolvedParam {
    name: String,
    sql_type: SqlType,
    options: ParamOptions,
}

/// SQL text with its parameter types resolved, ready to bind values.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedQuery {
    sql: String,
    params: Vec<ResolvedParam>,
}

impl PreparedQuery {
    /// Resolve every declared parameter type.
    ///
    /// Fails on the first unknown type name or on an option the type does
    /// not take.
    pub fn new(sql: impl Into<String>, specs: &[ParamSpec]) -> Result<Self, Error> {
        let params = specs
            .iter()
            .map(|spec| {
                let param_error = |source| Error::Param {
                    param: spec.name.clone(),
                    source,
                };
                let sql_type: SqlType = spec.type_name.parse().map_err(param_error)?;
                spec.options.check(sql_type).map_err(param_error)?;
                Ok(ResolvedParam {
                    name: spec.name.clone(),
                    sql_type,
                    options: spec.options,
                })
            })
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            sql: sql.into(),
            params,
        })
    }

    /// The SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Number of declared parameters.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params.len()
    }

    /// Bind one invocation's values.
    ///
    /// Declared parameters absent from `values` are bound as NULL; values
    /// that match no declared parameter are ignored.
    #[must_use]
    pub fn bind(&self, values: &Values) -> Statement {
        self.params
            .iter()
            .fold(Statement::new(self.sql.clone()), |statement, param| {
                statement.bind(BoundParam {
                    name: param.name.clone(),
                    sql_type: param.sql_type,
                    value: values.get(&param.name).cloned().unwrap_or_default(),
                    options: param.options,
                })
            })
    }
}
