//! Domain model and stage-progression rules for BAC procurement tracking.
//!
//! Everything here is pure: callers load a snapshot, ask the engine for a
//! [`WriteSet`], and persist it.

pub mod domain;
mod error;
pub mod header;
pub mod statistics;
pub mod workflow;

pub use domain::*;
pub use error::*;
pub use header::{NewProject, ProjectHeaderManager};
pub use statistics::{ProjectStatistics, ProjectSummary};
pub use workflow::{FieldEditability, StageAction, StageWorkflowEngine, WriteSet};
