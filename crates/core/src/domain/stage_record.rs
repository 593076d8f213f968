use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::stage::Stage;

/// Per-project metadata for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct StageRecord {
    pub project_id: Uuid,
    pub stage: Stage,
    pub created_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub office: String,
    pub remarks: String,
    pub is_submitted: bool,
}

impl StageRecord {
    pub fn empty(project_id: Uuid, stage: Stage) -> Self {
        Self {
            project_id,
            stage,
            created_at: None,
            approved_at: None,
            office: String::new(),
            remarks: String::new(),
            is_submitted: false,
        }
    }
}

/// The complete, ordered set of stage records of one project.
///
/// Always holds exactly one record per [`Stage`], at position `stage.index()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSet {
    project_id: Uuid,
    records: [StageRecord; Stage::COUNT],
}

impl StageSet {
    pub(crate) fn from_records(project_id: Uuid, records: [StageRecord; Stage::COUNT]) -> Self {
        debug_assert!(records
            .iter()
            .enumerate()
            .all(|(i, r)| r.stage.index() == i && r.project_id == project_id));
        Self {
            project_id,
            records,
        }
    }

    pub fn project_id(&self) -> Uuid {
        self.project_id
    }

    pub fn get(&self, stage: Stage) -> &StageRecord {
        &self.records[stage.index()]
    }

    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StageRecord> {
        self.records.iter()
    }

    pub fn into_vec(self) -> Vec<StageRecord> {
        self.records.into()
    }

    /// Replaces every record named in `updates`; records of other projects are skipped.
    pub fn with_updates(&self, updates: &[StageRecord]) -> Self {
        let mut next = self.clone();
        for update in updates {
            if update.project_id == self.project_id {
                next.records[update.stage.index()] = update.clone();
            }
        }
        next
    }
}

/// Stage fields supplied when submitting.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct SubmitStageRequest {
    pub approved_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub office: String,
    #[serde(default)]
    pub remark: String,
    /// Arrival time override; honoured for admins on every stage but the first.
    pub created_at: Option<DateTime<Utc>>,
}

/// Result of backfilling a project's stage records.
#[derive(Debug, Clone)]
pub struct Backfill {
    pub stages: StageSet,
    /// Stages whose records had to be synthesized and still need persisting.
    pub inserted: Vec<Stage>,
}

impl Backfill {
    pub fn is_complete(&self) -> bool {
        self.inserted.is_empty()
    }

    pub fn inserted_records(&self) -> impl Iterator<Item = &StageRecord> {
        self.inserted.iter().map(|stage| self.stages.get(*stage))
    }
}
