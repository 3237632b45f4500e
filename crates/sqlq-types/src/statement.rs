//! Statements with bound parameters.

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::sql_type::SqlType;
use crate::value::SqlValue;

/// Per-parameter type options (length, precision, scale).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamOptions {
    /// Maximum length for character and binary types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    /// Total digits for DECIMAL / NUMERIC.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub precision: Option<u8>,
    /// Digits after the decimal point, or fractional-second digits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scale: Option<u8>,
}

impl ParamOptions {
    /// Check that every option set here applies to `sql_type`.
    pub fn check(&self, sql_type: SqlType) -> Result<(), TypeError> {
        let unsupported = if self.length.is_some() && !sql_type.has_length() {
            Some("length")
        } else if self.precision.is_some() && !sql_type.has_precision() {
            Some("precision")
        } else if self.scale.is_some() && !sql_type.has_scale() {
            Some("scale")
        } else {
            None
        };

        match unsupported {
            Some(option) => Err(TypeError::UnsupportedOption {
                sql_type: sql_type.name(),
                option,
            }),
            None => Ok(()),
        }
    }
}

/// A parameter bound to a value for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundParam {
    /// Parameter name, without the `@` prefix.
    pub name: String,
    /// Resolved transport type.
    pub sql_type: SqlType,
    /// Runtime value.
    pub value: SqlValue,
    /// Type options.
    pub options: ParamOptions,
}

/// SQL text plus its bound parameters, ready to be executed on a session.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Vec<BoundParam>,
}

impl Statement {
    /// Create a statement with no parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Add a bound parameter.
    #[must_use]
    pub fn bind(mut self, param: BoundParam) -> Self {
        self.params.push(param);
        self
    }

    /// Get the SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Get the bound parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    /// Find a bound parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&BoundParam> {
        self.params.iter().find(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_must_fit_the_type() {
        let length = ParamOptions {
            length: Some(50),
            ..ParamOptions::default()
        };
        assert!(length.check(SqlType::NVarChar).is_ok());
        assert_eq!(
            length.check(SqlType::Int),
            Err(TypeError::UnsupportedOption {
                sql_type: "Int",
                option: "length",
            })
        );

        let decimal = ParamOptions {
            precision: Some(10),
            scale: Some(2),
            ..ParamOptions::default()
        };
        assert!(decimal.check(SqlType::Decimal).is_ok());
        assert!(decimal.check(SqlType::VarChar).is_err());

        let scale = ParamOptions {
            scale: Some(3),
            ..ParamOptions::default()
        };
        assert!(scale.check(SqlType::DateTime2).is_ok());
        assert!(scale.check(SqlType::Bit).is_err());

        assert!(ParamOptions::default().check(SqlType::Bit).is_ok());
    }
}
