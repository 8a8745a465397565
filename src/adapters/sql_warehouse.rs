//! Warehouse backed by a sqlx connection pool

use async_trait::async_trait;
use serde_json::{json, Value};
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Column, Row, ValueRef};
use std::time::Duration;

use crate::config::SqlWarehouseSettings;
use crate::domain::{QueryResult, Row as ResultRow, WarehousePort};
use crate::error::QueryError;

/// Database backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseBackend {
    Sqlite,
    Postgres,
    Mysql,
}

impl DatabaseBackend {
    /// Detect the database backend from a connection URL
    pub fn from_url(url: &str) -> Result<Self, QueryError> {
        if url.starts_with("sqlite:") {
            Ok(Self::Sqlite)
        } else if url.starts_with("postgres:") || url.starts_with("postgresql:") {
            Ok(Self::Postgres)
        } else if url.starts_with("mysql:") || url.starts_with("mariadb:") {
            Ok(Self::Mysql)
        } else {
            Err(QueryError::Execution(format!(
                "Unsupported database URL format. Expected sqlite://, postgres://, or mysql://. Got: {}",
                url.split(':').next().unwrap_or("unknown")
            )))
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Sqlite => "SQLite",
            Self::Postgres => "PostgreSQL",
            Self::Mysql => "MySQL",
        }
    }
}

/// Long-lived pool shared by all prompts; the pool hands each statement its own
/// connection, so concurrent executions are allowed
#[derive(Clone)]
pub struct SqlWarehouse {
    pool: AnyPool,
    backend: DatabaseBackend,
}

impl SqlWarehouse {
    pub async fn connect(
        url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> Result<Self, QueryError> {
        sqlx::any::install_default_drivers();

        let backend = DatabaseBackend::from_url(url)?;

        tracing::info!(
            "Connecting to {} warehouse with max {} connections",
            backend.name(),
            max_connections
        );

        let pool = AnyPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(connect_timeout_secs))
            .connect(url)
            .await
            .map_err(|e| QueryError::Execution(format!("Warehouse connection error: {}", e)))?;

        tracing::info!("Connected to {} warehouse", backend.name());

        Ok(Self { pool, backend })
    }

    pub async fn from_settings(settings: &SqlWarehouseSettings) -> Result<Self, QueryError> {
        Self::connect(
            &settings.url,
            settings.max_connections,
            settings.connect_timeout_seconds,
        )
        .await
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn backend(&self) -> DatabaseBackend {
        self.backend
    }

    pub async fn health_check(&self) -> Result<(), QueryError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| QueryError::Execution(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl WarehousePort for SqlWarehouse {
    async fn run_statement(&self, sql: &str) -> Result<QueryResult, QueryError> {
        tracing::debug!("Executing statement on {} warehouse", self.backend.name());

        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        let rows: Vec<ResultRow> = rows.iter().map(row_to_json).collect();

        tracing::debug!("Statement returned {} rows", rows.len());
        Ok(QueryResult::new(rows))
    }
}

/// Convert a row to a JSON map, keeping column order
fn row_to_json(row: &AnyRow) -> ResultRow {
    let mut out = ResultRow::new();
    for (idx, col) in row.columns().iter().enumerate() {
        out.insert(col.name().to_string(), column_value(row, idx));
    }
    out
}

/// Decode a column as null, integer, float, string or bool, in that order
fn column_value(row: &AnyRow, idx: usize) -> Value {
    match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Err(_) => return Value::Null,
        _ => {}
    }

    if let Ok(i) = row.try_get::<i64, _>(idx) {
        json!(i)
    } else if let Ok(f) = row.try_get::<f64, _>(idx) {
        json!(f)
    } else if let Ok(s) = row.try_get::<String, _>(idx) {
        Value::String(s)
    } else if let Ok(b) = row.try_get::<bool, _>(idx) {
        Value::Bool(b)
    } else {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_detection() {
        assert_eq!(
            DatabaseBackend::from_url("sqlite://test.db").unwrap(),
            DatabaseBackend::Sqlite
        );
        assert_eq!(
            DatabaseBackend::from_url("sqlite::memory:").unwrap(),
            DatabaseBackend::Sqlite
        );
        assert_eq!(
            DatabaseBackend::from_url("postgresql://localhost/db").unwrap(),
            DatabaseBackend::Postgres
        );
        assert_eq!(
            DatabaseBackend::from_url("mariadb://localhost/db").unwrap(),
            DatabaseBackend::Mysql
        );
        assert!(DatabaseBackend::from_url("snowflake://acme").is_err());
    }

    async fn warehouse(dir: &tempfile::TempDir) -> SqlWarehouse {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("wh.db").display());
        let wh = SqlWarehouse::connect(&url, 2, 5).await.unwrap();

        sqlx::query(
            "CREATE TABLE products (id INTEGER PRIMARY KEY, name TEXT, price REAL, note TEXT)",
        )
        .execute(wh.pool())
        .await
        .unwrap();
        sqlx::query("INSERT INTO products (name, price, note) VALUES ('Widget', 9.5, NULL)")
            .execute(wh.pool())
            .await
            .unwrap();
        sqlx::query("INSERT INTO products (name, price, note) VALUES ('Gadget', 20.0, 'new')")
            .execute(wh.pool())
            .await
            .unwrap();
        wh
    }

    #[tokio::test]
    async fn test_rows_keep_types_and_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let wh = warehouse(&dir).await;

        let result = wh
            .execute("SELECT id, name, price, note FROM products ORDER BY id")
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        let first = &result.rows[0];
        assert_eq!(
            first.keys().collect::<Vec<_>>(),
            vec!["id", "name", "price", "note"]
        );
        assert_eq!(first["id"], json!(1));
        assert_eq!(first["name"], json!("Widget"));
        assert_eq!(first["price"], json!(9.5));
        assert_eq!(first["note"], Value::Null);
        assert_eq!(result.rows[1]["note"], json!("new"));
    }

    #[tokio::test]
    async fn test_empty_query_short_circuits() {
        let dir = tempfile::tempdir().unwrap();
        let wh = warehouse(&dir).await;
        wh.close().await;

        // Pool is closed, so any real statement would fail
        assert!(wh.execute("").await.unwrap().is_empty());
        assert!(wh.execute("   ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_sql_is_execution_error() {
        let dir = tempfile::tempdir().unwrap();
        let wh = warehouse(&dir).await;

        let err = wh.execute("SELEC name FROM products").await.unwrap_err();
        assert!(matches!(err, QueryError::Execution(_)));
        assert!(wh.health_check().await.is_ok());
    }
}
