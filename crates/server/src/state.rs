use db::{UserRepository, WorkflowStore};
use sqlx::SqlitePool;

use crate::config::TrackerConfig;

#[derive(Clone)]
pub struct AppState {
    pub workflow_store: WorkflowStore,
    pub user_repository: UserRepository,
    pub organization: String,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &TrackerConfig) -> Self {
        Self {
            workflow_store: WorkflowStore::new(pool.clone()),
            user_repository: UserRepository::new(pool),
            organization: config.organization.name.clone(),
        }
    }
}
