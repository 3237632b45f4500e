//! Row representation for query results.
//!
//! Transports hand back rows in their native shape: one [`Field`] per column,
//! wrapping the value together with its column metadata. Callers that only
//! care about values can [`flatten`](Row::flatten) a row into a [`FlatRow`],
//! a plain `column -> value` mapping.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::error::TypeError;
use crate::sql_type::SqlType;
use crate::value::SqlValue;

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    /// Column name.
    pub name: String,
    /// Column type, when the transport reports one.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<SqlType>,
    /// Whether the column is nullable.
    pub nullable: bool,
}

impl Column {
    /// Create column metadata with only a name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: None,
            nullable: true,
        }
    }
}

/// A single column value in its native field-wrapper form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    /// The column value.
    pub value: SqlValue,
    /// Metadata for the column this value belongs to.
    pub metadata: Column,
}

impl Field {
    /// Create a field for the named column.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        Self {
            value: value.into(),
            metadata: Column::new(name),
        }
    }

    /// Column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// A row from a query result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fields: Vec<Field>,
}

impl Row {
    /// Create a row from its fields, in column order.
    #[must_use]
    pub fn new(fields: Vec<Field>) -> Self {
        Self { fields }
    }

    /// Get a field by column name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|f| f.metadata.name.eq_ignore_ascii_case(name))
    }

    /// Get a value by column name, converted to `T`.
    pub fn value<T>(&self, name: &str) -> Result<T, TypeError>
    where
        T: TryFrom<SqlValue, Error = TypeError>,
    {
        let field = self
            .get(name)
            .ok_or_else(|| TypeError::ColumnNotFound(name.to_string()))?;
        T::try_from(field.value.clone())
    }

    /// Get the number of columns in the row.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check if the row is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate over the fields in column order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter()
    }

    /// Project the row to a plain `column -> value` mapping.
    #[must_use]
    pub fn flatten(&self) -> FlatRow {
        FlatRow {
            columns: self
                .fields
                .iter()
                .map(|f| (f.metadata.name.clone(), f.value.clone()))
                .collect(),
        }
    }

    /// Consuming variant of [`flatten`](Self::flatten).
    #[must_use]
    pub fn into_flat(self) -> FlatRow {
        FlatRow {
            columns: self
                .fields
                .into_iter()
                .map(|f| (f.metadata.name, f.value))
                .collect(),
        }
    }
}

impl IntoIterator for Row {
    type Item = Field;
    type IntoIter = std::vec::IntoIter<Field>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl FromIterator<Field> for Row {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for field in &self.fields {
            map.serialize_entry(field.name(), field)?;
        }
        map.end()
    }
}

/// A flattened row: column name to scalar value, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlatRow {
    columns: Vec<(String, SqlValue)>,
}

impl FlatRow {
    /// Get a value by column name (case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// Get the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Iterate over `(column, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for FlatRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl Serialize for FlatRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Outcome of one executed statement, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultSet {
    /// Number of rows returned or affected.
    pub row_count: u64,
    /// Rows in their native field-wrapper form.
    pub rows: Vec<Row>,
}

impl ResultSet {
    /// Create a result set from its rows. The row count is the number of rows.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self {
            row_count: rows.len() as u64,
            rows,
        }
    }

    /// A result with a row count and no rows (DML statements).
    #[must_use]
    pub fn affected(row_count: u64) -> Self {
        Self {
            row_count,
            rows: Vec::new(),
        }
    }

    /// Convert into the rows delivered to future-style callers.
    ///
    /// A zero row count always yields an empty sequence.
    #[must_use]
    pub fn into_rows(self, flatten: bool) -> Rows {
        let rows = if self.row_count == 0 {
            Vec::new()
        } else {
            self.rows
        };

        if flatten {
            Rows::Flat(rows.into_iter().map(Row::into_flat).collect())
        } else {
            Rows::Native(rows)
        }
    }
}

/// Rows delivered to a future-style query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Rows {
    /// Rows as produced by the transport.
    Native(Vec<Row>),
    /// Rows projected to `column -> value` mappings.
    Flat(Vec<FlatRow>),
}

impl Rows {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Native(rows) => rows.len(),
            Self::Flat(rows) => rows.len(),
        }
    }

    /// Whether there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the rows in their flattened form, flattening if necessary.
    #[must_use]
    pub fn into_flat(self) -> Vec<FlatRow> {
        match self {
            Self::Native(rows) => rows.into_iter().map(Row::into_flat).collect(),
            Self::Flat(rows) => rows,
        }
    }

    /// Get the native rows, if they were not flattened.
    #[must_use]
    pub fn native(&self) -> Option<&[Row]> {
        match self {
            Self::Native(rows) => Some(rows),
            Self::Flat(_) => None,
        }
    }
}
