mod error;
pub mod models;
mod pool;
pub mod repositories;
mod workflow_store;

pub use error::*;
pub use pool::*;
pub use repositories::*;
pub use workflow_store::{ProjectSnapshot, TransitionOutcome, WorkflowStore};
