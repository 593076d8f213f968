pub(crate) mod project_repository;
pub(crate) mod stage_repository;
mod user_repository;

pub use project_repository::ProjectRepository;
pub use stage_repository::StageRepository;
pub use user_repository::*;
