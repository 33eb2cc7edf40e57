//! Typed values and named parameters for PostgreSQL statements.

use crate::config::Provider;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

/// Closed set of values that may cross into the driver. Application null is
/// always modeled as `Null`; a bare `None` never reaches a bind call.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i32),
    /// Exact numeric kept as its validated literal; bound with a `::numeric`
    /// cast so precision never routes through a float.
    Decimal(String),
    Float(f64),
    Bool(bool),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Raw serialized JSON sub-structure, stored as opaque text.
    Opaque(String),
}

impl SqlValue {
    /// SQL cast suffix the placeholder needs, if any.
    pub fn cast(&self) -> Option<&'static str> {
        match self {
            SqlValue::Decimal(_) => Some("numeric"),
            _ => None,
        }
    }
}

/// A named placeholder plus the value bound to it. The name is unique within
/// one statement invocation.
#[derive(Clone, Debug)]
pub struct BoundParameter {
    pub name: String,
    pub value: SqlValue,
}

impl BoundParameter {
    pub fn new(name: impl Into<String>, value: SqlValue) -> Self {
        BoundParameter {
            name: name.into(),
            value,
        }
    }

    /// Parameter named by position ("$1", "$2", ...).
    pub fn positional(ordinal: usize, value: SqlValue) -> Self {
        BoundParameter::new(placeholder(ordinal), value)
    }
}

/// Placeholder token for the given 1-based ordinal.
pub fn placeholder(ordinal: usize) -> String {
    format!("{}{}", Provider::Postgres.param_prefix(), ordinal)
}

/// Bind one value to a PostgreSQL query.
pub(crate) fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q SqlValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Int(v) => query.bind(*v),
        SqlValue::Decimal(s) => query.bind(s.as_str()),
        SqlValue::Float(v) => query.bind(*v),
        SqlValue::Bool(v) => query.bind(*v),
        SqlValue::Text(s) => query.bind(s.as_str()),
        SqlValue::Date(d) => query.bind(*d),
        SqlValue::DateTime(t) => query.bind(*t),
        SqlValue::Opaque(s) => query.bind(s.as_str()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_positional() {
        assert_eq!(placeholder(1), "$1");
        assert_eq!(placeholder(12), "$12");
    }

    #[test]
    fn positional_parameter_carries_its_token() {
        let p = BoundParameter::positional(3, SqlValue::Int(9));
        assert_eq!(p.name, "$3");
        assert_eq!(p.value, SqlValue::Int(9));
    }

    #[test]
    fn only_decimal_needs_a_cast() {
        assert_eq!(SqlValue::Decimal("1.50".into()).cast(), Some("numeric"));
        assert_eq!(SqlValue::Int(1).cast(), None);
        assert_eq!(SqlValue::Text("x".into()).cast(), None);
        assert_eq!(SqlValue::Null.cast(), None);
    }
}
