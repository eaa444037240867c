use super::FeedbackStore;
use super::StoreError;
use super::UserStore;
use crate::feedback::Feedback;
use crate::feedback::FeedbackId;
use crate::feedback::NewFeedback;
use crate::users::NewUser;
use crate::users::User;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::sqlite::SqlitePoolOptions;
use std::str::FromStr;
use tower_sessions_sqlx_store::SqliteStore as SqliteSessionStore;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        username TEXT PRIMARY KEY NOT NULL,
        password TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS feedback (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        content TEXT NOT NULL,
        username TEXT NOT NULL REFERENCES users(username) ON DELETE CASCADE
    );

    CREATE INDEX IF NOT EXISTS idx_feedback_username ON feedback(username);
"#;

/// Database storage implementation using SQLite
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// The pool must have foreign keys enabled for deletes to cascade, which
    /// is the sqlx default for SQLite connections.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;

        Ok(Self::new(pool))
    }

    /// Initialize the database tables
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;

        Ok(())
    }

    /// A session store sharing this pool, with its table created.
    pub async fn session_store(&self) -> Result<SqliteSessionStore, StoreError> {
        let sessions = SqliteSessionStore::new(self.pool.clone());
        sessions.migrate().await?;

        Ok(sessions)
    }
}

fn map_constraint_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_error) = &e {
        if db_error.is_unique_violation() {
            return if db_error.message().contains("users.email") {
                StoreError::EmailTaken
            } else {
                StoreError::UsernameTaken
            };
        }
        if db_error.is_foreign_key_violation() {
            return StoreError::UnknownOwner;
        }
    }

    StoreError::OperationFailed(e)
}

#[async_trait]
impl UserStore for SqliteStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (username, password, email, first_name, last_name)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .execute(&self.pool)
        .await
        .map_err(map_constraint_error)?;

        Ok(User::from(user))
    }

    async fn get_user(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT username, password, email, first_name, last_name
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE username = ?")
            .bind(username)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl FeedbackStore for SqliteStore {
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError> {
        sqlx::query_as::<_, Feedback>(
            r#"
            INSERT INTO feedback (title, content, username)
            VALUES (?, ?, ?)
            RETURNING id, title, content, username
            "#,
        )
        .bind(feedback.title)
        .bind(feedback.content)
        .bind(feedback.username)
        .fetch_one(&self.pool)
        .await
        .map_err(map_constraint_error)
    }

    async fn get_feedback(&self, id: FeedbackId) -> Result<Option<Feedback>, StoreError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            "SELECT id, title, content, username FROM feedback WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(feedback)
    }

    async fn feedback_for_user(&self, username: &str) -> Result<Vec<Feedback>, StoreError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            SELECT id, title, content, username
            FROM feedback
            WHERE username = ?
            ORDER BY id
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        Ok(feedback)
    }

    async fn update_feedback(
        &self,
        id: FeedbackId,
        title: String,
        content: String,
    ) -> Result<Option<Feedback>, StoreError> {
        let feedback = sqlx::query_as::<_, Feedback>(
            r#"
            UPDATE feedback
            SET title = ?, content = ?
            WHERE id = ?
            RETURNING id, title, content, username
            "#,
        )
        .bind(title)
        .bind(content)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(feedback)
    }

    async fn delete_feedback(&self, id: FeedbackId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
