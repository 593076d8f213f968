use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ProjectHeader, ProjectStatus, Stage, StageSet};
use crate::workflow::StageWorkflowEngine;

/// Dashboard counters over a list of projects.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProjectStatistics {
    pub total: usize,
    pub finished: usize,
    pub ongoing: usize,
    pub percent_finished: f64,
    pub percent_ongoing: f64,
}

impl ProjectStatistics {
    pub fn from_statuses(statuses: impl IntoIterator<Item = ProjectStatus>) -> Self {
        let (total, finished) = statuses
            .into_iter()
            .fold((0usize, 0usize), |(total, finished), status| {
                (total + 1, finished + usize::from(status.is_finished()))
            });
        let ongoing = total - finished;

        Self {
            total,
            finished,
            ongoing,
            percent_finished: percentage(finished, total),
            percent_ongoing: percentage(ongoing, total),
        }
    }
}

fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

/// One dashboard row.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProjectSummary {
    pub project: ProjectHeader,
    pub creator_name: Option<String>,
    pub status: ProjectStatus,
    /// The active stage; `None` once the project is finished.
    pub current_stage: Option<Stage>,
}

impl ProjectSummary {
    pub fn new(project: ProjectHeader, stages: &StageSet, creator_name: Option<String>) -> Self {
        Self {
            project,
            creator_name,
            status: StageWorkflowEngine::compute_project_status(stages),
            current_stage: StageWorkflowEngine::compute_first_unsubmitted(stages),
        }
    }
}
