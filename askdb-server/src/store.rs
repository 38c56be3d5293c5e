//! Internal record store
//!
//! SQLite-backed persistence for projects (stored connection targets), users
//! and per-project conversation history. This store is the server's own
//! bookkeeping; it never touches the databases users point askdb at.

use askdb_core::{BackendKind, ConnectionDescriptor};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

/// A stored connection target.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub db_type: String,
    pub host: String,
    pub port: u16,
    pub db_user: String,
    #[serde(skip_serializing)]
    pub db_password: String,
    pub db_name: String,
    pub status: String,
}

impl Project {
    /// Companion entry point to the connection factory: the same dialect
    /// rules as an ad-hoc descriptor, sourced from stored fields. An
    /// unsupported stored backend kind fails here, before any network I/O.
    pub fn descriptor(&self) -> askdb_core::Result<ConnectionDescriptor> {
        Ok(ConnectionDescriptor {
            backend: self.db_type.parse::<BackendKind>()?,
            host: self.host.clone(),
            port: self.port,
            username: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
        })
    }
}

/// Payload for creating a project.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub db_type: String,
    pub host: String,
    pub port: u16,
    pub db_user: String,
    pub db_password: String,
    pub db_name: String,
}

/// One remembered (question, generated SQL) pair.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: i64,
    pub project_id: i64,
    pub question: String,
    pub generated_sql: String,
    pub created_at: NaiveDateTime,
}

/// A registered user. The stored password is an Argon2 hash, never
/// plaintext.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("store error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match &error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Database(error.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Handle to the internal store.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open the store and create its tables if they do not exist yet.
    pub async fn open(database_url: &str) -> StoreResult<Self> {
        // One connection: the store sees request-synchronous traffic, and a
        // single connection keeps `sqlite::memory:` stores coherent.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;
        let store = Self { pool };
        store.setup().await?;
        Ok(store)
    }

    async fn setup(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT,
                db_type TEXT NOT NULL,
                host TEXT NOT NULL,
                port INTEGER NOT NULL,
                db_user TEXT NOT NULL,
                db_password TEXT NOT NULL,
                db_name TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'active'
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                project_id INTEGER NOT NULL REFERENCES projects(id),
                question TEXT NOT NULL,
                generated_sql TEXT NOT NULL,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn create_project(&self, new: &NewProject) -> StoreResult<Project> {
        let result = sqlx::query(
            r#"
            INSERT INTO projects (name, description, db_type, host, port, db_user, db_password, db_name)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(&new.db_type)
        .bind(&new.host)
        .bind(i64::from(new.port))
        .bind(&new.db_user)
        .bind(&new.db_password)
        .bind(&new.db_name)
        .execute(&self.pool)
        .await?;

        self.project(result.last_insert_rowid()).await
    }

    pub async fn project(&self, id: i64) -> StoreResult<Project> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;
        project_from_row(&row)
    }

    pub async fn projects(&self) -> StoreResult<Vec<Project>> {
        let rows = sqlx::query("SELECT * FROM projects ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(project_from_row).collect()
    }

    pub async fn record_history(
        &self,
        project_id: i64,
        question: &str,
        generated_sql: &str,
    ) -> StoreResult<()> {
        sqlx::query("INSERT INTO history (project_id, question, generated_sql) VALUES (?, ?, ?)")
            .bind(project_id)
            .bind(question)
            .bind(generated_sql)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// History for one project, oldest first.
    pub async fn history(&self, project_id: i64) -> StoreResult<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, question, generated_sql, created_at
            FROM history
            WHERE project_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(HistoryEntry {
                    id: row.try_get("id")?,
                    project_id: row.try_get("project_id")?,
                    question: row.try_get("question")?,
                    generated_sql: row.try_get("generated_sql")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> StoreResult<User> {
        let result =
            sqlx::query("INSERT INTO users (username, email, password_hash) VALUES (?, ?, ?)")
                .bind(username)
                .bind(email)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        })
    }

    pub async fn user_by_username(&self, username: &str) -> StoreResult<User> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)?;

        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            password_hash: row.try_get("password_hash")?,
        })
    }

    pub async fn update_password(&self, user_id: i64, password_hash: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn project_from_row(row: &SqliteRow) -> StoreResult<Project> {
    let port: i64 = row.try_get("port")?;
    Ok(Project {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        db_type: row.try_get("db_type")?,
        host: row.try_get("host")?,
        port: port as u16,
        db_user: row.try_get("db_user")?,
        db_password: row.try_get("db_password")?,
        db_name: row.try_get("db_name")?,
        status: row.try_get("status")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> NewProject {
        NewProject {
            name: "shop".to_string(),
            description: Some("staging copy".to_string()),
            db_type: "postgres".to_string(),
            host: "localhost".to_string(),
            port: 5432,
            db_user: "u".to_string(),
            db_password: "p".to_string(),
            db_name: "shop".to_string(),
        }
    }

    async fn open_store() -> Store {
        Store::open("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn project_round_trip() {
        let store = open_store().await;
        let created = store.create_project(&sample_project()).await.unwrap();
        assert_eq!(created.status, "active");

        let fetched = store.project(created.id).await.unwrap();
        assert_eq!(fetched.name, "shop");
        assert_eq!(fetched.port, 5432);

        let all = store.projects().await.unwrap();
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let store = open_store().await;
        assert!(matches!(
            store.project(42).await.unwrap_err(),
            StoreError::NotFound
        ));
    }

    #[tokio::test]
    async fn stored_project_resolves_to_a_descriptor() {
        let store = open_store().await;
        let project = store.create_project(&sample_project()).await.unwrap();
        let descriptor = project.descriptor().unwrap();
        assert_eq!(
            descriptor.connection_url(),
            "postgres://u:p@localhost:5432/shop"
        );
    }

    #[tokio::test]
    async fn unsupported_stored_backend_fails_fast() {
        let store = open_store().await;
        let mut new = sample_project();
        new.db_type = "sybase".to_string();
        let project = store.create_project(&new).await.unwrap();
        assert!(project.descriptor().is_err());
    }

    #[tokio::test]
    async fn history_comes_back_oldest_first() {
        let store = open_store().await;
        let project = store.create_project(&sample_project()).await.unwrap();

        store
            .record_history(project.id, "first?", "SELECT 1;")
            .await
            .unwrap();
        store
            .record_history(project.id, "second?", "SELECT 2;")
            .await
            .unwrap();

        let history = store.history(project.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].question, "first?");
        assert_eq!(history[1].question, "second?");
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let store = open_store().await;
        store.create_user("ann", "ann@example.com", "h1").await.unwrap();
        let error = store
            .create_user("ann", "other@example.com", "h2")
            .await
            .unwrap_err();
        assert!(matches!(error, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn password_update_targets_one_user() {
        let store = open_store().await;
        let user = store.create_user("bob", "bob@example.com", "old").await.unwrap();
        store.update_password(user.id, "new").await.unwrap();
        let fetched = store.user_by_username("bob").await.unwrap();
        assert_eq!(fetched.password_hash, "new");

        assert!(matches!(
            store.update_password(999, "x").await.unwrap_err(),
            StoreError::NotFound
        ));
    }
}
