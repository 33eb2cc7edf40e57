//! Type-directed coercion: declared column types and JSON payload values
//! into [`SqlValue`].
//!
//! The declared type name comes from an `information_schema.columns` lookup
//! performed per request; the names below cover both the PostgreSQL
//! spellings and the generic ones other backends report.

use crate::error::AppError;
use crate::sql::params::SqlValue;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// How a key column is compared against its coerced value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyComparison {
    Exact,
    /// Temporal keys compare at date granularity: `CAST(col AS DATE) = $n`
    /// with a date-only bound value. Lossy on purpose.
    DateTruncated,
}

/// Coerce a raw key string according to the column's declared type name.
/// Fails with a validation error before any SQL is issued.
pub fn coerce_key_value(
    declared_type: &str,
    raw: &str,
) -> Result<(SqlValue, KeyComparison), AppError> {
    let family = declared_type.trim().to_ascii_lowercase();
    match family.as_str() {
        "int" | "integer" | "int2" | "int4" | "int8" | "bigint" | "smallint" | "tinyint"
        | "serial" | "bigserial" => {
            let n: i32 = raw.parse().map_err(|_| {
                AppError::Validation(format!("'{raw}' is not a valid integer"))
            })?;
            Ok((SqlValue::Int(n), KeyComparison::Exact))
        }
        "decimal" | "numeric" | "money" | "smallmoney" => {
            if !is_decimal_literal(raw) {
                return Err(AppError::Validation(format!(
                    "'{raw}' is not a valid decimal"
                )));
            }
            Ok((SqlValue::Decimal(raw.to_string()), KeyComparison::Exact))
        }
        "bit" | "bool" | "boolean" => {
            let b: bool = raw.parse().map_err(|_| {
                AppError::Validation(format!("'{raw}' is not a valid boolean"))
            })?;
            Ok((SqlValue::Bool(b), KeyComparison::Exact))
        }
        "float" | "real" | "float4" | "float8" | "double precision" => {
            let f: f64 = raw.parse().map_err(|_| {
                AppError::Validation(format!("'{raw}' is not a valid floating point number"))
            })?;
            if !f.is_finite() {
                return Err(AppError::Validation(format!(
                    "'{raw}' is not a valid floating point number"
                )));
            }
            Ok((SqlValue::Float(f), KeyComparison::Exact))
        }
        "char" | "nchar" | "varchar" | "nvarchar" | "bpchar" | "character"
        | "character varying" | "text" => Ok((
            SqlValue::Text(raw.to_string()),
            KeyComparison::Exact,
        )),
        "date" | "datetime" | "datetime2" | "smalldatetime" | "timestamp" | "timestamptz"
        | "timestamp without time zone" | "timestamp with time zone" => {
            let dt = parse_temporal(raw).ok_or_else(|| {
                AppError::Validation(format!("'{raw}' is not a valid date"))
            })?;
            Ok((SqlValue::Date(dt.date()), KeyComparison::DateTruncated))
        }
        _ => Err(AppError::Validation(format!(
            "unsupported data type '{declared_type}'"
        ))),
    }
}

/// Map one JSON payload value to its native representation:
/// string → datetime if it parses, else text; number → i32 if it fits, else
/// f64; object/array → raw serialized text, stored opaque.
pub fn json_to_sql_value(v: &Value) -> Result<SqlValue, AppError> {
    match v {
        Value::Null => Ok(SqlValue::Null),
        Value::Bool(b) => Ok(SqlValue::Bool(*b)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                if let Ok(i) = i32::try_from(i) {
                    return Ok(SqlValue::Int(i));
                }
            }
            n.as_f64().map(SqlValue::Float).ok_or_else(|| {
                AppError::Internal(format!("unrepresentable JSON number {n}"))
            })
        }
        Value::String(s) => Ok(match parse_temporal(s) {
            Some(dt) => SqlValue::DateTime(dt),
            None => SqlValue::Text(s.clone()),
        }),
        Value::Array(_) | Value::Object(_) => Ok(SqlValue::Opaque(v.to_string())),
    }
}

/// Lexical decimal check: optional sign, digits, at most one decimal point.
fn is_decimal_literal(s: &str) -> bool {
    let body = s.strip_prefix(['+', '-']).unwrap_or(s);
    if body.is_empty() {
        return false;
    }
    let mut dots = 0;
    let mut digits = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

fn parse_temporal(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    None
}
