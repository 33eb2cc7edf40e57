//! Request-scoped database session: open, execute, close.
//!
//! One session owns one pooled handle for the duration of one logical unit
//! of work. Dropping the session releases the handle, so every exit path —
//! success, validation failure, execution error — cleans up without the
//! caller remembering to. Pooling itself is the driver's job.

use crate::error::AppError;
use crate::sql::params::{bind_value, BoundParameter};
use sqlx::pool::PoolConnection;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres};

pub struct DbSession {
    conn: Option<PoolConnection<Postgres>>,
}

impl DbSession {
    /// Acquire a handle from the pool. Acquisition failure is a connection
    /// error wrapping the driver cause.
    pub async fn open(pool: &PgPool) -> Result<Self, AppError> {
        let conn = pool.acquire().await.map_err(AppError::Connection)?;
        tracing::debug!("database session opened");
        Ok(DbSession { conn: Some(conn) })
    }

    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    /// Release the handle back to the pool. Idempotent: closing a closed
    /// session is a no-op. Drop performs the same release, so explicit calls
    /// are for the happy path and Drop covers the rest.
    pub fn close(&mut self) {
        if self.conn.take().is_some() {
            tracing::debug!("database session closed");
        }
    }

    /// Run a row-returning statement. Zero rows is a valid result; a session
    /// that is not open is a contract violation.
    pub async fn execute_query(
        &mut self,
        sql: &str,
        params: &[BoundParameter],
    ) -> Result<Vec<PgRow>, AppError> {
        let conn = self.conn.as_mut().ok_or(AppError::State)?;
        tracing::debug!(sql = %sql, params = params.len(), "executing query");
        let mut query = sqlx::query(sql);
        for p in params {
            query = bind_value(query, &p.value);
        }
        let rows = query.fetch_all(&mut **conn).await?;
        Ok(rows)
    }

    /// Run a mutating statement and report the affected-row count. Zero is a
    /// valid, non-error outcome.
    pub async fn execute_command(
        &mut self,
        sql: &str,
        params: &[BoundParameter],
    ) -> Result<u64, AppError> {
        let conn = self.conn.as_mut().ok_or(AppError::State)?;
        tracing::debug!(sql = %sql, params = params.len(), "executing command");
        let mut query = sqlx::query(sql);
        for p in params {
            query = bind_value(query, &p.value);
        }
        let result = query.execute(&mut **conn).await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_session() -> DbSession {
        DbSession { conn: None }
    }

    #[tokio::test]
    async fn query_on_closed_session_is_a_state_error() {
        let mut session = closed_session();
        let err = session.execute_query("SELECT 1", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::State));
    }

    #[tokio::test]
    async fn command_on_closed_session_is_a_state_error() {
        let mut session = closed_session();
        let err = session.execute_command("DELETE FROM t", &[]).await.unwrap_err();
        assert!(matches!(err, AppError::State));
    }

    #[test]
    fn close_is_idempotent() {
        let mut session = closed_session();
        session.close();
        session.close();
        assert!(!session.is_open());
    }
}
