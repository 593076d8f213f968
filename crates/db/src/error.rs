use bac_core::WorkflowError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Project not found: {0}")]
    ProjectNotFound(Uuid),

    #[error("Username already taken: {0}")]
    UsernameTaken(String),

    /// The transition was rejected and its transaction rolled back.
    #[error(transparent)]
    Rejected(#[from] WorkflowError),
}
