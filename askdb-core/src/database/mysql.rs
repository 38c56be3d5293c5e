//! MySQL database provider implementation

use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Connection, Either, Executor, Row, TypeInfo};
use tracing::debug;

use crate::database::statement::split_statements;
use crate::database::traits::DatabaseProvider;
use crate::database::MAX_CONNECTIONS;
use crate::descriptor::ConnectionDescriptor;
use crate::error::{Error, Result};
use crate::schema::{ExecutionResult, SchemaSnapshot};

/// MySQL provider. Opened with the multi-statement capability: the executor
/// accepts semicolon-separated batches and runs them sequentially on one
/// acquired connection under autocommit.
pub struct MySqlProvider {
    pool: MySqlPool,
    multi_statements: bool,
}

impl MySqlProvider {
    /// Open a pooled handle for `descriptor`, with the same stale-connection
    /// pre-check as the Postgres provider.
    pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let pool = MySqlPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .test_before_acquire(true)
            .connect(&descriptor.connection_url())
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self {
            pool,
            multi_statements: descriptor.backend.supports_multi_statements(),
        })
    }

    fn row_to_json(row: &MySqlRow) -> Value {
        let mut map = serde_json::Map::new();
        for (index, column) in row.columns().iter().enumerate() {
            map.insert(column.name().to_string(), Self::value_to_json(row, index));
        }
        Value::Object(map)
    }

    fn value_to_json(row: &MySqlRow, index: usize) -> Value {
        let column = &row.columns()[index];
        let decoded = match column.type_info().name() {
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(index)
                .ok()
                .flatten()
                .map(Value::Bool),
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => row
                .try_get::<Option<i64>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into())),
            "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
            | "BIGINT UNSIGNED" => row
                .try_get::<Option<u64>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into())),
            "FLOAT" => row
                .try_get::<Option<f32>, _>(index)
                .ok()
                .flatten()
                .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
                .map(Value::Number),
            "DOUBLE" => row
                .try_get::<Option<f64>, _>(index)
                .ok()
                .flatten()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            // Rendered as text to preserve precision.
            "DECIMAL" => row
                .try_get::<Option<rust_decimal::Decimal>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM"
            | "SET" => row
                .try_get::<Option<String>, _>(index)
                .ok()
                .flatten()
                .map(Value::String),
            "DATE" => row
                .try_get::<Option<chrono::NaiveDate>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            "TIME" => row
                .try_get::<Option<chrono::NaiveTime>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            "DATETIME" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            "TIMESTAMP" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_rfc3339())),
            "JSON" => row.try_get::<Option<Value>, _>(index).ok().flatten(),
            "BINARY" | "VARBINARY" | "TINYBLOB" | "BLOB" | "MEDIUMBLOB" | "LONGBLOB" => row
                .try_get::<Option<Vec<u8>>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(format!("[{} bytes]", v.len()))),
            _ => Self::decode_fallback(row, index),
        };
        decoded.unwrap_or(Value::Null)
    }

    fn decode_fallback(row: &MySqlRow, index: usize) -> Option<Value> {
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(index) {
            return Some(Value::Number(v.into()));
        }
        if let Ok(Some(v)) = row.try_get::<Option<u64>, _>(index) {
            return Some(Value::Number(v.into()));
        }
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(index) {
            return serde_json::Number::from_f64(v).map(Value::Number);
        }
        if let Ok(Some(v)) = row.try_get::<Option<String>, _>(index) {
            return Some(Value::String(v));
        }
        if let Ok(Some(v)) = row.try_get::<Option<Vec<u8>>, _>(index) {
            return Some(Value::String(format!("[{} bytes]", v.len())));
        }
        None
    }
}

/// MySQL may hand identifier columns back as VARBINARY depending on charset
/// configuration; fall back to raw bytes before giving up.
fn get_string(row: &MySqlRow, column: &str) -> String {
    row.try_get::<String, _>(column)
        .ok()
        .or_else(|| {
            row.try_get::<Vec<u8>, _>(column)
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok())
        })
        .unwrap_or_default()
}

/// Detail text for a failed statement within a batch. Statements before the
/// failing one have already been committed under autocommit, and that partial
/// commit is part of the error context rather than hidden.
fn batch_detail(index: usize, total: usize, detail: &str) -> String {
    if total == 1 {
        detail.to_string()
    } else {
        format!(
            "statement {} of {} failed ({} prior statements already committed): {}",
            index + 1,
            total,
            index,
            detail
        )
    }
}

#[async_trait]
impl DatabaseProvider for MySqlProvider {
    async fn describe(&self) -> Result<SchemaSnapshot> {
        let table_rows = sqlx::query(
            r#"
            SELECT TABLE_NAME AS table_name
            FROM information_schema.tables
            WHERE table_schema = DATABASE()
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Introspection(e.to_string()))?;

        let tables: Vec<String> = table_rows
            .iter()
            .map(|row| get_string(row, "table_name"))
            .filter(|name| !name.is_empty())
            .collect();

        let column_rows = sqlx::query(
            r#"
            SELECT TABLE_NAME AS table_name,
                   COLUMN_NAME AS column_name,
                   COLUMN_TYPE AS column_type
            FROM information_schema.columns
            WHERE table_schema = DATABASE()
            ORDER BY table_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Introspection(e.to_string()))?;

        let columns: Vec<(String, String, String)> = column_rows
            .iter()
            .map(|row| {
                (
                    get_string(row, "table_name"),
                    get_string(row, "column_name"),
                    get_string(row, "column_type"),
                )
            })
            .collect();

        let snapshot = SchemaSnapshot::from_catalog(tables, columns);
        debug!(tables = snapshot.tables.len(), "inspected mysql schema");
        Ok(snapshot)
    }

    async fn execute(&self, sql: &str) -> Result<ExecutionResult> {
        let statements = split_statements(sql);
        if statements.is_empty() {
            return Err(Error::Execution("no SQL statement to execute".to_string()));
        }
        if statements.len() > 1 && !self.multi_statements {
            return Err(Error::Execution(
                "multi-statement SQL is not enabled for this connection".to_string(),
            ));
        }

        let total = statements.len();
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<Value> = Vec::new();
        let mut affected: u64 = 0;

        for (index, stmt) in statements.iter().enumerate() {
            // Only the final statement's row set survives; affected counts
            // accumulate across the whole batch.
            columns.clear();
            rows.clear();

            let mut stream = (&mut *conn).fetch_many(sqlx::raw_sql(stmt.as_str()));
            while let Some(step) = stream
                .try_next()
                .await
                .map_err(|e| Error::Execution(batch_detail(index, total, &e.to_string())))?
            {
                match step {
                    Either::Left(done) => affected += done.rows_affected(),
                    Either::Right(row) => {
                        if columns.is_empty() {
                            columns =
                                row.columns().iter().map(|c| c.name().to_string()).collect();
                        }
                        rows.push(Self::row_to_json(&row));
                    }
                }
            }
        }

        debug!(
            statements = total,
            rows = rows.len(),
            affected,
            "executed mysql batch"
        );
        if columns.is_empty() {
            Ok(ExecutionResult::status(affected))
        } else {
            Ok(ExecutionResult::Rows { columns, rows })
        }
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        conn.ping()
            .await
            .map_err(|e| Error::Connection(e.to_string()))
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_statement_errors_keep_the_bare_detail() {
        assert_eq!(batch_detail(0, 1, "syntax error"), "syntax error");
    }

    #[test]
    fn batch_errors_carry_partial_commit_context() {
        assert_eq!(
            batch_detail(2, 5, "duplicate key"),
            "statement 3 of 5 failed (2 prior statements already committed): duplicate key"
        );
    }
}
