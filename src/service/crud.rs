//! Generic CRUD orchestration: metadata lookup, coercion, statement build,
//! execution, projection.

use crate::db::DbSession;
use crate::error::AppError;
use crate::service::projection::rows_to_records;
use crate::service::secret;
use crate::sql::{builder, coerce, BoundParameter, Ident, SqlValue};
use serde_json::{Map, Value};
use sqlx::PgPool;
use sqlx::Row;

/// Column-type lookup, re-resolved on every keyed request so schema changes
/// are always visible. Never cached. The cast lifts the information_schema
/// domain type to plain text for decoding.
const COLUMN_TYPE_SQL: &str = "SELECT data_type::text AS data_type FROM information_schema.columns \
     WHERE table_name = $1 AND column_name = $2";

/// Password verification request: which columns hold the user and the hash,
/// and the values supplied by the caller.
#[derive(Debug, serde::Deserialize)]
pub struct PasswordCheck {
    pub user_field: String,
    pub password_field: String,
    pub user_value: String,
    pub password_value: String,
}

pub struct EntityService;

impl EntityService {
    /// Every row of the table, projected. An empty table is an empty
    /// sequence, not an error.
    pub async fn list(pool: &PgPool, table: &str) -> Result<Vec<Value>, AppError> {
        let table = Ident::new(table)?;
        let st = builder::select_all(&table);
        let mut session = DbSession::open(pool).await?;
        let rows = session.execute_query(&st.sql, &st.params).await?;
        session.close();
        Ok(rows_to_records(&rows))
    }

    /// Rows where the key column equals the supplied value, coerced per the
    /// column's declared type. Zero rows is `NotFound` here.
    pub async fn get_by_key(
        pool: &PgPool,
        table: &str,
        key: &str,
        raw_value: &str,
    ) -> Result<Vec<Value>, AppError> {
        let table = Ident::new(table)?;
        let key = Ident::new(key)?;
        if raw_value.trim().is_empty() {
            return Err(AppError::Validation("key value cannot be empty".into()));
        }
        let mut session = DbSession::open(pool).await?;
        let declared = Self::column_type(&mut session, &table, &key).await?;
        let (value, comparison) = coerce::coerce_key_value(&declared, raw_value)?;
        let st = builder::select_by_key(&table, &key, value, comparison);
        let rows = session.execute_query(&st.sql, &st.params).await?;
        session.close();
        if rows.is_empty() {
            return Err(AppError::NotFound(format!(
                "no row in '{table}' where '{key}' matches '{raw_value}'"
            )));
        }
        Ok(rows_to_records(&rows))
    }

    /// Insert one row. Password-like fields are hashed before the statement
    /// is built.
    pub async fn create(
        pool: &PgPool,
        table: &str,
        mut body: Map<String, Value>,
    ) -> Result<(), AppError> {
        let table = Ident::new(table)?;
        if body.is_empty() {
            return Err(AppError::Validation("entity body cannot be empty".into()));
        }
        secret::hash_secret_fields(&mut body).await?;
        let st = builder::insert(&table, &body)?;
        let mut session = DbSession::open(pool).await?;
        session.execute_command(&st.sql, &st.params).await?;
        session.close();
        Ok(())
    }

    /// Update rows matched by key. Returns the affected-row count; zero is
    /// still success. Password-like fields are hashed first.
    pub async fn update(
        pool: &PgPool,
        table: &str,
        key: &str,
        key_value: &str,
        mut body: Map<String, Value>,
    ) -> Result<u64, AppError> {
        let table = Ident::new(table)?;
        let key = Ident::new(key)?;
        if body.is_empty() {
            return Err(AppError::Validation("entity body cannot be empty".into()));
        }
        secret::hash_secret_fields(&mut body).await?;
        let st = builder::update(&table, &key, key_value, &body)?;
        let mut session = DbSession::open(pool).await?;
        let affected = session.execute_command(&st.sql, &st.params).await?;
        session.close();
        Ok(affected)
    }

    /// Delete rows matched by key. Returns the affected-row count.
    pub async fn delete(
        pool: &PgPool,
        table: &str,
        key: &str,
        key_value: &str,
    ) -> Result<u64, AppError> {
        let table = Ident::new(table)?;
        let key = Ident::new(key)?;
        let st = builder::delete(&table, &key, key_value);
        let mut session = DbSession::open(pool).await?;
        let affected = session.execute_command(&st.sql, &st.params).await?;
        session.close();
        Ok(affected)
    }

    /// Ternary outcome: `NotFound` when no such user, `Authentication` on a
    /// mismatch, `Ok` on success.
    pub async fn verify_password(
        pool: &PgPool,
        table: &str,
        check: &PasswordCheck,
    ) -> Result<(), AppError> {
        let table = Ident::new(table)?;
        let user_field = Ident::new(&check.user_field)?;
        let password_field = Ident::new(&check.password_field)?;
        if check.user_value.trim().is_empty() {
            return Err(AppError::Validation("user value cannot be empty".into()));
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} = $1",
            password_field.quoted(),
            table.quoted(),
            user_field.quoted()
        );
        let params = [BoundParameter::positional(
            1,
            SqlValue::Text(check.user_value.clone()),
        )];
        let mut session = DbSession::open(pool).await?;
        let rows = session.execute_query(&sql, &params).await?;
        session.close();

        let Some(row) = rows.first() else {
            return Err(AppError::NotFound("user not found".into()));
        };
        let stored: Option<String> = row.try_get(password_field.as_str())?;
        let stored = stored.unwrap_or_default();
        if secret::verify_password(&check.password_value, &stored).await? {
            Ok(())
        } else {
            Err(AppError::Authentication("password mismatch".into()))
        }
    }

    /// The raw parameterized escape hatch. Zero rows is `NotFound`, matching
    /// the keyed lookup rather than the list.
    pub async fn raw_query(
        pool: &PgPool,
        sql: &str,
        params: &Map<String, Value>,
    ) -> Result<Vec<Value>, AppError> {
        let st = builder::raw_query(sql, params)?;
        let mut session = DbSession::open(pool).await?;
        let rows = session.execute_query(&st.sql, &st.params).await?;
        session.close();
        if rows.is_empty() {
            return Err(AppError::NotFound(
                "query returned no matching rows".into(),
            ));
        }
        Ok(rows_to_records(&rows))
    }

    async fn column_type(
        session: &mut DbSession,
        table: &Ident,
        key: &Ident,
    ) -> Result<String, AppError> {
        let params = [
            BoundParameter::positional(1, SqlValue::Text(table.as_str().to_string())),
            BoundParameter::positional(2, SqlValue::Text(key.as_str().to_string())),
        ];
        let rows = session.execute_query(COLUMN_TYPE_SQL, &params).await?;
        let Some(row) = rows.first() else {
            return Err(AppError::NotFound(format!(
                "could not determine the type of column '{table}.{key}'"
            )));
        };
        let declared: Option<String> = row.try_get("data_type")?;
        match declared {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(AppError::NotFound(format!(
                "could not determine the type of column '{table}.{key}'"
            ))),
        }
    }
}
