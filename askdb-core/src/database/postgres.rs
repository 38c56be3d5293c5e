//! PostgreSQL database provider implementation

use async_trait::async_trait;
use futures::TryStreamExt;
use serde_json::Value;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Column, Connection, Either, Executor, PgPool, Row, TypeInfo};
use tracing::debug;

use crate::database::statement::split_statements;
use crate::database::traits::DatabaseProvider;
use crate::database::MAX_CONNECTIONS;
use crate::descriptor::ConnectionDescriptor;
use crate::error::{Error, Result};
use crate::schema::{ExecutionResult, SchemaSnapshot};

/// PostgreSQL provider. One pool per handle, disposed with
/// [`DatabaseProvider::close`].
pub struct PostgresProvider {
    pool: PgPool,
}

impl PostgresProvider {
    /// Open a pooled handle for `descriptor`.
    ///
    /// `test_before_acquire` gives every acquisition a cheap round-trip so a
    /// stale pooled connection is replaced before use instead of failing
    /// mid-query.
    pub async fn connect(descriptor: &ConnectionDescriptor) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .test_before_acquire(true)
            .connect(&descriptor.connection_url())
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    /// Convert one row into a JSON object keyed by the labels the statement
    /// returned.
    fn row_to_json(row: &PgRow) -> Value {
        let mut map = serde_json::Map::new();
        for (index, column) in row.columns().iter().enumerate() {
            map.insert(column.name().to_string(), Self::value_to_json(row, index));
        }
        Value::Object(map)
    }

    fn value_to_json(row: &PgRow, index: usize) -> Value {
        let column = &row.columns()[index];
        let decoded = match column.type_info().name() {
            "BOOL" => row
                .try_get::<Option<bool>, _>(index)
                .ok()
                .flatten()
                .map(Value::Bool),
            "INT2" => row
                .try_get::<Option<i16>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into())),
            "INT4" => row
                .try_get::<Option<i32>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into())),
            "INT8" => row
                .try_get::<Option<i64>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::Number(v.into())),
            "FLOAT4" => row
                .try_get::<Option<f32>, _>(index)
                .ok()
                .flatten()
                .and_then(|v| serde_json::Number::from_f64(f64::from(v)))
                .map(Value::Number),
            "FLOAT8" => row
                .try_get::<Option<f64>, _>(index)
                .ok()
                .flatten()
                .and_then(serde_json::Number::from_f64)
                .map(Value::Number),
            // Rendered as text to preserve precision.
            "NUMERIC" => row
                .try_get::<Option<rust_decimal::Decimal>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            "TEXT" | "VARCHAR" | "CHAR" | "BPCHAR" | "NAME" => row
                .try_get::<Option<String>, _>(index)
                .ok()
                .flatten()
                .map(Value::String),
            "UUID" => row
                .try_get::<Option<sqlx::types::Uuid>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index).ok().flatten(),
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
            "TIMESTAMP" => row
                .try_get::<Option<chrono::NaiveDateTime>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_string())),
            "TIMESTAMPTZ" => row
                .try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(v.to_rfc3339())),
            "BYTEA" => row
                .try_get::<Option<Vec<u8>>, _>(index)
                .ok()
                .flatten()
                .map(|v| Value::String(format!("[{} bytes]", v.len()))),
            _ => Self::decode_fallback(row, index),
        };
        decoded.unwrap_or(Value::Null)
    }

    /// Last-resort decoding for types without an explicit mapping.
    fn decode_fallback(row: &PgRow, index: usize) -> Option<Value> {
        if let Ok(Some(v)) = row.try_get::<Option<i64>, _>(index) {
            return Some(Value::Number(v.into()));
        }
        if let Ok(Some(v)) = row.try_get::<Option<f64>, _>(index) {
            return serde_json::Number::from_f64(v).map(Value::Number);
        }
        if let Ok(Some(v)) = row.try_get::<Option<String>, _>(index) {
            return Some(Value::String(v));
        }
        if let Ok(Some(v)) = row.try_get::<Option<bool>, _>(index) {
            return Some(Value::Bool(v));
        }
        None
    }
}

#[async_trait]
impl DatabaseProvider for PostgresProvider {
    async fn describe(&self) -> Result<SchemaSnapshot> {
        let table_rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = 'public'
              AND table_type = 'BASE TABLE'
            ORDER BY table_name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Introspection(e.to_string()))?;

        let column_rows: Vec<(String, String, String)> = sqlx::query_as(
            r#"
            SELECT table_name::text, column_name::text, data_type::text
            FROM information_schema.columns
            WHERE table_schema = 'public'
            ORDER BY table_name, ordinal_position
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| Error::Introspection(e.to_string()))?;

        let tables = table_rows.into_iter().map(|(name,)| name).collect();
        let snapshot = SchemaSnapshot::from_catalog(tables, column_rows);
        debug!(tables = snapshot.tables.len(), "inspected postgres schema");
        Ok(snapshot)
    }

    async fn execute(&self, sql: &str) -> Result<ExecutionResult> {
        let statements = split_statements(sql);
        if statements.is_empty() {
            return Err(Error::Execution("no SQL statement to execute".to_string()));
        }
        if statements.len() > 1 {
            return Err(Error::Execution(
                "the postgres backend does not accept multi-statement SQL; \
                 submit one statement at a time"
                    .to_string(),
            ));
        }

        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| Error::Connection(e.to_string()))?;

        let mut columns: Vec<String> = Vec::new();
        let mut rows: Vec<Value> = Vec::new();
        let mut affected: u64 = 0;

        let mut stream = (&mut *conn).fetch_many(sqlx::raw_sql(statements[0].as_str()));
        while let Some(step) = stream
            .try_next()
            .await
            .map_err(|e| Error::Execution(e.to_string()))?
        {
            match step {
                Either::Left(done) => affected += done.rows_affected(),
                Either::Right(row) => {
                    if columns.is_empty() {
                        columns = row.columns().iter().map(|c| c.name().to_string()).collect();
                    }
                    rows.push(Self::row_to_json(&row));
                }
            }
        }

        debug!(rows = rows.len(), affected, "executed postgres statement");
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
