//! Builds parameterized SELECT, INSERT, UPDATE, DELETE and raw statements
//! from request-time identifiers.
//!
//! Identifiers are validated and interpolated (SQL cannot parameterize
//! them); values always bind through parameters.

use crate::error::AppError;
use crate::sql::coerce::{json_to_sql_value, KeyComparison};
use crate::sql::ident::Ident;
use crate::sql::params::{placeholder, BoundParameter, SqlValue};
use serde_json::{Map, Value};

/// Statement text plus its bound parameters, in bind order.
#[derive(Debug)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<BoundParameter>,
}

impl Statement {
    fn new() -> Self {
        Statement {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    /// Append a parameter and return its placeholder (with cast suffix when
    /// the value needs one).
    fn push(&mut self, value: SqlValue) -> String {
        let n = self.params.len() + 1;
        let ph = match value.cast() {
            Some(cast) => format!("{}::{}", placeholder(n), cast),
            None => placeholder(n),
        };
        self.params.push(BoundParameter::positional(n, value));
        ph
    }
}

/// `SELECT * FROM <table>` — every row, no filtering.
pub fn select_all(table: &Ident) -> Statement {
    let mut st = Statement::new();
    st.sql = format!("SELECT * FROM {}", table.quoted());
    st
}

/// `SELECT * FROM <table> WHERE <key> = $1`, or the date-truncated variant
/// for temporal keys.
pub fn select_by_key(
    table: &Ident,
    key: &Ident,
    value: SqlValue,
    comparison: KeyComparison,
) -> Statement {
    let mut st = Statement::new();
    let ph = st.push(value);
    let lhs = match comparison {
        KeyComparison::Exact => key.quoted(),
        KeyComparison::DateTruncated => format!("CAST({} AS DATE)", key.quoted()),
    };
    st.sql = format!("SELECT * FROM {} WHERE {} = {}", table.quoted(), lhs, ph);
    st
}

/// `INSERT INTO <table> (<cols>) VALUES ($1..$n)` with one parameter per
/// field. Field names are validated as identifiers.
pub fn insert(table: &Ident, body: &Map<String, Value>) -> Result<Statement, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation(
            "insert requires at least one field".into(),
        ));
    }
    let mut st = Statement::new();
    let mut cols = Vec::with_capacity(body.len());
    let mut placeholders = Vec::with_capacity(body.len());
    for (name, value) in body {
        let col = Ident::new(name)?;
        let v = json_to_sql_value(value)?;
        placeholders.push(st.push(v));
        cols.push(col.quoted());
    }
    st.sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        table.quoted(),
        cols.join(", "),
        placeholders.join(", ")
    );
    Ok(st)
}

/// `UPDATE <table> SET col = $i, ... WHERE CAST(<key> AS TEXT) = $n`.
///
/// The key value binds as raw text with no type coercion — asymmetric with
/// get-by-key, and kept that way; the text comparison is what makes the
/// as-is binding valid against typed columns.
pub fn update(
    table: &Ident,
    key: &Ident,
    key_value: &str,
    body: &Map<String, Value>,
) -> Result<Statement, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation(
            "update requires at least one field".into(),
        ));
    }
    let mut st = Statement::new();
    let mut sets = Vec::with_capacity(body.len());
    for (name, value) in body {
        let col = Ident::new(name)?;
        let v = json_to_sql_value(value)?;
        let ph = st.push(v);
        sets.push(format!("{} = {}", col.quoted(), ph));
    }
    let key_ph = st.push(SqlValue::Text(key_value.to_string()));
    st.sql = format!(
        "UPDATE {} SET {} WHERE CAST({} AS TEXT) = {}",
        table.quoted(),
        sets.join(", "),
        key.quoted(),
        key_ph
    );
    Ok(st)
}

/// `DELETE FROM <table> WHERE CAST(<key> AS TEXT) = $1`, key bound as text.
pub fn delete(table: &Ident, key: &Ident, key_value: &str) -> Statement {
    let mut st = Statement::new();
    let ph = st.push(SqlValue::Text(key_value.to_string()));
    st.sql = format!(
        "DELETE FROM {} WHERE CAST({} AS TEXT) = {}",
        table.quoted(),
        key.quoted(),
        ph
    );
    st
}

/// Caller-supplied SQL with `@name` tokens substituted by positional
/// placeholders. Names missing the `@` prefix gain it; null values bind the
/// null sentinel, everything else binds its raw serialized text.
///
/// The SQL text itself is trusted as-is. This is the open escape hatch of
/// the surface, not a sanitized builder.
pub fn raw_query(sql: &str, params: &Map<String, Value>) -> Result<Statement, AppError> {
    if sql.trim().is_empty() {
        return Err(AppError::Validation("query text cannot be empty".into()));
    }
    let mut entries: Vec<(String, &Value)> = params
        .iter()
        .map(|(name, value)| (normalize_param_name(name), value))
        .collect();
    // Longest name first, so @id never clobbers the front of @id_two.
    entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut st = Statement::new();
    let mut text = sql.to_string();
    for (name, value) in entries {
        if !text.contains(&name) {
            continue;
        }
        let bound = match value {
            Value::Null => SqlValue::Null,
            other => SqlValue::Text(other.to_string().trim_matches('"').to_string()),
        };
        let n = st.params.len() + 1;
        text = text.replace(&name, &placeholder(n));
        st.params.push(BoundParameter::new(name, bound));
    }
    st.sql = text;
    Ok(st)
}

fn normalize_param_name(name: &str) -> String {
    if name.starts_with('@') {
        name.to_string()
    } else {
        format!("@{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ident(s: &str) -> Ident {
        Ident::new(s).expect("valid identifier")
    }

    fn body(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn select_all_has_no_parameters() {
        let st = select_all(&ident("usuario"));
        assert_eq!(st.sql, "SELECT * FROM \"usuario\"");
        assert!(st.params.is_empty());
    }

    #[test]
    fn select_by_key_binds_one_value() {
        let st = select_by_key(
            &ident("usuario"),
            &ident("id"),
            SqlValue::Int(7),
            KeyComparison::Exact,
        );
        assert_eq!(st.sql, "SELECT * FROM \"usuario\" WHERE \"id\" = $1");
        assert_eq!(st.params.len(), 1);
        assert_eq!(st.params[0].value, SqlValue::Int(7));
    }

    #[test]
    fn select_by_temporal_key_truncates_the_column() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");
        let st = select_by_key(
            &ident("evento"),
            &ident("fecha"),
            SqlValue::Date(date),
            KeyComparison::DateTruncated,
        );
        assert_eq!(
            st.sql,
            "SELECT * FROM \"evento\" WHERE CAST(\"fecha\" AS DATE) = $1"
        );
    }

    #[test]
    fn select_by_decimal_key_casts_the_placeholder() {
        let st = select_by_key(
            &ident("producto"),
            &ident("precio"),
            SqlValue::Decimal("19.99".into()),
            KeyComparison::Exact,
        );
        assert_eq!(
            st.sql,
            "SELECT * FROM \"producto\" WHERE \"precio\" = $1::numeric"
        );
    }

    #[test]
    fn insert_builds_one_parameter_per_field() {
        let st = insert(
            &ident("usuario"),
            &body(json!({"email": "a@b.com", "age": 30})),
        )
        .expect("statement");
        assert_eq!(
            st.sql,
            "INSERT INTO \"usuario\" (\"email\", \"age\") VALUES ($1, $2)"
        );
        assert_eq!(st.params[0].value, SqlValue::Text("a@b.com".into()));
        assert_eq!(st.params[1].value, SqlValue::Int(30));
    }

    #[test]
    fn insert_rejects_empty_body_and_bad_columns() {
        assert!(insert(&ident("t"), &Map::new()).is_err());
        let err = insert(&ident("t"), &body(json!({"a; drop": 1}))).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn update_binds_key_as_text_last() {
        let st = update(
            &ident("usuario"),
            &ident("id"),
            "7",
            &body(json!({"email": "new@b.com"})),
        )
        .expect("statement");
        assert_eq!(
            st.sql,
            "UPDATE \"usuario\" SET \"email\" = $1 WHERE CAST(\"id\" AS TEXT) = $2"
        );
        assert_eq!(st.params[1].value, SqlValue::Text("7".into()));
    }

    #[test]
    fn delete_binds_key_as_text() {
        let st = delete(&ident("usuario"), &ident("email"), "a@b.com");
        assert_eq!(
            st.sql,
            "DELETE FROM \"usuario\" WHERE CAST(\"email\" AS TEXT) = $1"
        );
        assert_eq!(st.params[0].value, SqlValue::Text("a@b.com".into()));
    }

    #[test]
    fn raw_query_substitutes_named_tokens() {
        let st = raw_query(
            "SELECT * FROM usuario WHERE email = @email AND age > @age",
            &body(json!({"email": "a@b.com", "age": 30})),
        )
        .expect("statement");
        assert_eq!(
            st.sql,
            "SELECT * FROM usuario WHERE email = $1 AND age > $2"
        );
        assert_eq!(st.params[0].name, "@email");
        assert_eq!(st.params[0].value, SqlValue::Text("a@b.com".into()));
        // non-null values bind their raw serialized text
        assert_eq!(st.params[1].value, SqlValue::Text("30".into()));
    }

    #[test]
    fn raw_query_normalizes_prefix_and_maps_null() {
        let st = raw_query(
            "UPDATE t SET a = @a WHERE b = @b",
            &body(json!({"a": null, "@b": "x"})),
        )
        .expect("statement");
        assert_eq!(st.sql, "UPDATE t SET a = $1 WHERE b = $2");
        let a = st.params.iter().find(|p| p.name == "@a").expect("@a bound");
        assert_eq!(a.value, SqlValue::Null);
        let b = st.params.iter().find(|p| p.name == "@b").expect("@b bound");
        assert_eq!(b.value, SqlValue::Text("x".into()));
    }

    #[test]
    fn raw_query_replaces_longest_names_first() {
        let st = raw_query(
            "SELECT * FROM t WHERE a = @id AND b = @id_two",
            &body(json!({"id": 1, "id_two": 2})),
        )
        .expect("statement");
        assert_eq!(st.sql, "SELECT * FROM t WHERE a = $2 AND b = $1");
        assert_eq!(st.params[0].name, "@id_two");
        assert_eq!(st.params[1].name, "@id");
    }

    #[test]
    fn raw_query_skips_unreferenced_parameters() {
        let st = raw_query("SELECT 1", &body(json!({"unused": 5}))).expect("statement");
        assert_eq!(st.sql, "SELECT 1");
        assert!(st.params.is_empty());
    }

    #[test]
    fn raw_query_rejects_blank_text() {
        assert!(raw_query("   ", &Map::new()).is_err());
    }
}
