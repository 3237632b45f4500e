//! Runtime SQL values.

use std::collections::HashMap;

use bytes::Bytes;
use serde::Serialize;

use crate::error::TypeError;

/// Parameter values for one invocation, keyed by parameter name.
///
/// Parameters missing from the map are bound as [`SqlValue::Null`].
pub type Values = HashMap<String, SqlValue>;

/// A value passed as a statement parameter or read back from a column.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
#[non_exhaustive]
pub enum SqlValue {
    /// SQL NULL.
    #[default]
    Null,
    /// BIT.
    Bool(bool),
    /// Any integer type (TINYINT through BIGINT).
    Int(i64),
    /// REAL / FLOAT.
    Float(f64),
    /// Character data.
    String(String),
    /// Binary data.
    Binary(Bytes),
    /// DATETIME / DATETIME2 / SMALLDATETIME.
    #[cfg(feature = "chrono")]
    DateTime(chrono::NaiveDateTime),
    /// DATE.
    #[cfg(feature = "chrono")]
    Date(chrono::NaiveDate),
    /// UNIQUEIDENTIFIER.
    #[cfg(feature = "uuid")]
    Uuid(uuid::Uuid),
}

impl SqlValue {
    /// Whether this value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the value as an integer, if it is one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as a float. Integers are widened.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is character data.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as a boolean, if it is a BIT.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Short description of the variant, used in error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Binary(_) => "binary",
            #[cfg(feature = "chrono")]
            Self::DateTime(_) => "datetime",
            #[cfg(feature = "chrono")]
            Self::Date(_) => "date",
            #[cfg(feature = "uuid")]
            Self::Uuid(_) => "uuid",
        }
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SqlValue {
                fn from(v: $t) -> Self {
                    Self::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f32> for SqlValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Bytes> for SqlValue {
    fn from(v: Bytes) -> Self {
        Self::Binary(v)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Binary(Bytes::from(v))
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDateTime> for SqlValue {
    fn from(v: chrono::NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

#[cfg(feature = "chrono")]
impl From<chrono::NaiveDate> for SqlValue {
    fn from(v: chrono::NaiveDate) -> Self {
        Self::Date(v)
    }
}

#[cfg(feature = "uuid")]
impl From<uuid::Uuid> for SqlValue {
    fn from(v: uuid::Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl TryFrom<SqlValue> for i64 {
    type Error = TypeError;

    fn try_from(value: SqlValue) -> Result<Self, Self::Error> {
        value.as_i64().ok_or_else(|| TypeError::TypeMismatch {
            expected: "int",
            actual: value.kind().to_string(),
        })
    }
}

impl TryFrom<SqlValue> for String {
    type Error = TypeError;

    fn try_from(value: SqlValue) -> Result<Self, Self::Error> {
        match value {
            SqlValue::String(s) => Ok(s),
            other => Err(TypeError::TypeMismatch {
                expected: "string",
                actual: other.kind().to_string(),
            }),
        }
    }
}
