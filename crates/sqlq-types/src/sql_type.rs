//! Native parameter type tags.
//!
//! Query definitions declare parameter types by name (`"int"`, `"NVarChar"`,
//! `"datetime2"`). Those names are resolved once, when the query is defined,
//! into a [`SqlType`]. The lookup ignores ASCII case; any name without a
//! matching tag is rejected with [`TypeError::UnknownType`].

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::TypeError;

/// SQL Server parameter type identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub enum SqlType {
    /// Untyped NULL.
    Null,
    /// TINYINT.
    TinyInt,
    /// BIT.
    Bit,
    /// SMALLINT.
    SmallInt,
    /// INT.
    Int,
    /// BIGINT.
    BigInt,
    /// REAL.
    Real,
    /// FLOAT.
    Float,
    /// DECIMAL.
    Decimal,
    /// NUMERIC.
    Numeric,
    /// SMALLMONEY.
    SmallMoney,
    /// MONEY.
    Money,
    /// SMALLDATETIME.
    SmallDateTime,
    /// DATETIME.
    DateTime,
    /// DATETIME2.
    DateTime2,
    /// DATETIMEOFFSET.
    DateTimeOffset,
    /// DATE.
    Date,
    /// TIME.
    Time,
    /// CHAR.
    Char,
    /// VARCHAR.
    VarChar,
    /// TEXT.
    Text,
    /// NCHAR.
    NChar,
    /// NVARCHAR.
    NVarChar,
    /// NTEXT.
    NText,
    /// BINARY.
    Binary,
    /// VARBINARY.
    VarBinary,
    /// IMAGE.
    Image,
    /// UNIQUEIDENTIFIER.
    UniqueIdentifier,
    /// XML.
    Xml,
    /// SQL_VARIANT.
    Variant,
    /// User-defined CLR type.
    Udt,
    /// Table-valued parameter.
    Tvp,
}

impl SqlType {
    /// Every known type tag, in declaration order.
    pub const ALL: &'static [SqlType] = &[
        Self::Null,
        Self::TinyInt,
        Self::Bit,
        Self::SmallInt,
        Self::Int,
        Self::BigInt,
        Self::Real,
        Self::Float,
        Self::Decimal,
        Self::Numeric,
        Self::SmallMoney,
        Self::Money,
        Self::SmallDateTime,
        Self::DateTime,
        Self::DateTime2,
        Self::DateTimeOffset,
        Self::Date,
        Self::Time,
        Self::Char,
        Self::VarChar,
        Self::Text,
        Self::NChar,
        Self::NVarChar,
        Self::NText,
        Self::Binary,
        Self::VarBinary,
        Self::Image,
        Self::UniqueIdentifier,
        Self::Xml,
        Self::Variant,
        Self::Udt,
        Self::Tvp,
    ];

    /// Canonical type name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::TinyInt => "TinyInt",
            Self::Bit => "Bit",
            Self::SmallInt => "SmallInt",
            Self::Int => "Int",
            Self::BigInt => "BigInt",
            Self::Real => "Real",
            Self::Float => "Float",
            Self::Decimal => "Decimal",
            Self::Numeric => "Numeric",
            Self::SmallMoney => "SmallMoney",
            Self::Money => "Money",
            Self::SmallDateTime => "SmallDateTime",
            Self::DateTime => "DateTime",
            Self::DateTime2 => "DateTime2",
            Self::DateTimeOffset => "DateTimeOffset",
            Self::Date => "Date",
            Self::Time => "Time",
            Self::Char => "Char",
            Self::VarChar => "VarChar",
            Self::Text => "Text",
            Self::NChar => "NChar",
            Self::NVarChar => "NVarChar",
            Self::NText => "NText",
            Self::Binary => "Binary",
            Self::VarBinary => "VarBinary",
            Self::Image => "Image",
            Self::UniqueIdentifier => "UniqueIdentifier",
            Self::Xml => "Xml",
            Self::Variant => "Variant",
            Self::Udt => "UDT",
            Self::Tvp => "TVP",
        }
    }

    /// Look up a type by name, ignoring ASCII case.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name().eq_ignore_ascii_case(name))
    }

    /// Whether the type carries a length option (character and binary types).
    #[must_use]
    pub fn has_length(&self) -> bool {
        matches!(
            self,
            Self::Char
                | Self::VarChar
                | Self::NChar
                | Self::NVarChar
                | Self::Binary
                | Self::VarBinary
        )
    }

    /// Whether the type carries precision and scale options.
    #[must_use]
    pub fn has_precision(&self) -> bool {
        matches!(self, Self::Decimal | Self::Numeric)
    }

    /// Whether the type carries a fractional-seconds scale option.
    #[must_use]
    pub fn has_scale(&self) -> bool {
        matches!(
            self,
            Self::Decimal | Self::Numeric | Self::Time | Self::DateTime2 | Self::DateTimeOffset
        )
    }
}

impl FromStr for SqlType {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| TypeError::UnknownType {
            name: s.to_string(),
        })
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
