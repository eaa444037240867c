pub mod database;
pub mod memory;

pub use database::SqliteStore;
pub use memory::MemoryStore;

use crate::config::Config;
use crate::feedback::Feedback;
use crate::feedback::FeedbackId;
use crate::feedback::NewFeedback;
use crate::users::NewUser;
use crate::users::User;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;
use tracing::warn;

/// Errors that can occur during storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Username already exists")]
    UsernameTaken,
    #[error("Email already exists")]
    EmailTaken,
    #[error("Feedback owner does not exist")]
    UnknownOwner,
    #[error("Storage operation failed: {0}")]
    OperationFailed(#[from] sqlx::Error),
}

/// Persistence for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with `UsernameTaken` or `EmailTaken` when
    /// either unique column is already in use.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn username_exists(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.get_user(username).await?.is_some())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, StoreError>;

    /// Removes the user and every feedback row they own.
    ///
    /// Returns false if no such user existed.
    async fn delete_user(&self, username: &str) -> Result<bool, StoreError>;
}

/// Persistence for feedback rows.
#[async_trait]
pub trait FeedbackStore: Send + Sync {
    /// Inserts a row and assigns its id. Fails with `UnknownOwner` if the
    /// owning user does not exist.
    async fn create_feedback(&self, feedback: NewFeedback) -> Result<Feedback, StoreError>;

    async fn get_feedback(&self, id: FeedbackId) -> Result<Option<Feedback>, StoreError>;

    /// All feedback owned by `username`, oldest first.
    async fn feedback_for_user(&self, username: &str) -> Result<Vec<Feedback>, StoreError>;

    async fn update_feedback(
        &self,
        id: FeedbackId,
        title: String,
        content: String,
    ) -> Result<Option<Feedback>, StoreError>;

    async fn delete_feedback(&self, id: FeedbackId) -> Result<bool, StoreError>;
}

pub trait Store: UserStore + FeedbackStore {}

impl<T: UserStore + FeedbackStore> Store for T {}

/// Where records live for this process.
pub enum Backend {
    Sqlite(SqliteStore),
    Memory(MemoryStore),
}

impl Backend {
    pub fn store(&self) -> Arc<dyn Store> {
        match self {
            Backend::Sqlite(store) => Arc::new(store.clone()),
            Backend::Memory(store) => Arc::new(store.clone()),
        }
    }
}

/// Opens the SQLite database named by the config, or falls back to the
/// in-memory store when none is configured.
pub async fn open(config: &Config) -> Result<Backend, StoreError> {
    match config.database_url.as_deref() {
        Some(url) => {
            let store = SqliteStore::connect(url).await?;
            store.migrate().await?;
            info!("using database at {}", url);
            Ok(Backend::Sqlite(store))
        }
        None => {
            warn!("DATABASE_URL not set, data will be kept in memory only");
            Ok(Backend::Memory(MemoryStore::new()))
        }
    }
}
