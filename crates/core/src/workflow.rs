use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::array;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{
    Actor, AuditStamp, Backfill, HeaderUpdate, ProjectStatus, Stage, StageRecord, StageSet,
    SubmitStageRequest,
};
use crate::error::WorkflowError;

/// Rows to persist for one accepted transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WriteSet {
    pub project_id: Uuid,
    /// Full new values of every stage row that changes.
    pub stages: Vec<StageRecord>,
    pub header: HeaderUpdate,
}

/// Which inputs of a stage row accept changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FieldEditability {
    pub approved_editable: bool,
    pub created_editable: bool,
    pub office_editable: bool,
    pub remark_editable: bool,
}

impl FieldEditability {
    pub const LOCKED: Self = Self {
        approved_editable: false,
        created_editable: false,
        office_editable: false,
        remark_editable: false,
    };

    pub fn is_locked(&self) -> bool {
        *self == Self::LOCKED
    }
}

/// The single control a stage row offers to a given actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum StageAction {
    Submit,
    Unsubmit,
    Finished,
    Pending,
}

pub struct StageWorkflowEngine;

impl StageWorkflowEngine {
    /// Completes a possibly partial set of stage records.
    ///
    /// Missing records are synthesized empty; a synthesized first stage is
    /// stamped with `now`. Duplicates keep the first occurrence and records of
    /// other projects are ignored.
    pub fn ensure_initialized(
        project_id: Uuid,
        existing: impl IntoIterator<Item = StageRecord>,
        now: DateTime<Utc>,
    ) -> Backfill {
        let mut slots: [Option<StageRecord>; Stage::COUNT] = Default::default();
        for record in existing {
            if record.project_id != project_id {
                continue;
            }
            let slot = &mut slots[record.stage.index()];
            if slot.is_none() {
                *slot = Some(record);
            }
        }

        let mut inserted = Vec::new();
        let records = array::from_fn(|i| {
            slots[i].take().unwrap_or_else(|| {
                let stage = Stage::ALL[i];
                inserted.push(stage);
                let mut record = StageRecord::empty(project_id, stage);
                if stage.is_first() {
                    record.created_at = Some(now);
                }
                record
            })
        });

        Backfill {
            stages: StageSet::from_records(project_id, records),
            inserted,
        }
    }

    pub fn compute_first_unsubmitted(stages: &StageSet) -> Option<Stage> {
        stages.iter().find(|r| !r.is_submitted).map(|r| r.stage)
    }

    pub fn compute_last_submitted(stages: &StageSet) -> Option<Stage> {
        stages.iter().rev().find(|r| r.is_submitted).map(|r| r.stage)
    }

    pub fn compute_project_status(stages: &StageSet) -> ProjectStatus {
        if stages.get(Stage::TERMINAL).is_submitted {
            ProjectStatus::Finished
        } else {
            ProjectStatus::InProgress
        }
    }

    pub fn is_active(stage: Stage, stages: &StageSet) -> bool {
        Self::compute_first_unsubmitted(stages) == Some(stage)
    }

    pub fn is_field_editable(stage: Stage, stages: &StageSet, actor: &Actor) -> FieldEditability {
        if stages.get(stage).is_submitted || !Self::is_active(stage, stages) {
            return FieldEditability::LOCKED;
        }

        FieldEditability {
            approved_editable: true,
            created_editable: actor.is_admin && !stage.is_first(),
            office_editable: true,
            remark_editable: true,
        }
    }

    pub fn stage_action(stage: Stage, stages: &StageSet, actor: &Actor) -> StageAction {
        if stages.get(stage).is_submitted {
            if actor.is_admin && Self::compute_last_submitted(stages) == Some(stage) {
                StageAction::Unsubmit
            } else {
                StageAction::Finished
            }
        } else if Self::is_active(stage, stages) {
            StageAction::Submit
        } else {
            StageAction::Pending
        }
    }

    pub fn submit_stage(
        stage: Stage,
        stages: &StageSet,
        actor: &Actor,
        input: &SubmitStageRequest,
        now: DateTime<Utc>,
    ) -> Result<WriteSet, WorkflowError> {
        let active = Self::compute_first_unsubmitted(stages);
        if active != Some(stage) {
            return Err(WorkflowError::StageNotEligible { stage, active });
        }

        let office = input.office.trim();
        let remark = input.remark.trim();
        let admin_override = actor.is_admin && !stage.is_first();

        let missing_base = input.approved_at.is_none() || office.is_empty() || remark.is_empty();
        let missing_created = admin_override && input.created_at.is_none();
        if missing_base || missing_created {
            return Err(WorkflowError::MissingRequiredFields {
                stage: Some(stage),
                created_required: missing_created,
            });
        }

        let current = stages.get(stage);
        let created_at = match (admin_override, input.created_at, current.created_at) {
            (true, Some(created), _) => Some(created),
            (_, _, None) if !stage.is_first() => Some(now),
            (_, _, existing) => existing,
        };

        let mut writes = vec![StageRecord {
            created_at,
            approved_at: input.approved_at,
            office: office.to_string(),
            remarks: remark.to_string(),
            is_submitted: true,
            ..current.clone()
        }];

        if let Some(next) = stage.next() {
            let next_record = stages.get(next);
            if next_record.created_at.is_none() {
                writes.push(StageRecord {
                    created_at: Some(now),
                    ..next_record.clone()
                });
            }
        }

        Ok(WriteSet {
            project_id: stages.project_id(),
            stages: writes,
            header: HeaderUpdate::edit(AuditStamp {
                at: now,
                by: actor.user_id,
            }),
        })
    }

    /// Reverts the most recently submitted stage. Arrival time is kept.
    pub fn unsubmit_stage(
        stage: Stage,
        stages: &StageSet,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<WriteSet, WorkflowError> {
        if !actor.is_admin {
            return Err(WorkflowError::permission_denied(
                "only administrators can unsubmit a stage",
            ));
        }

        let last = Self::compute_last_submitted(stages);
        if last != Some(stage) {
            return Err(WorkflowError::NotLastSubmittedStage { stage, last });
        }

        let current = stages.get(stage);
        Ok(WriteSet {
            project_id: stages.project_id(),
            stages: vec![StageRecord {
                approved_at: None,
                office: String::new(),
                remarks: String::new(),
                is_submitted: false,
                ..current.clone()
            }],
            header: HeaderUpdate::edit(AuditStamp {
                at: now,
                by: actor.user_id,
            }),
        })
    }

    /// Stage snapshot after `write_set` has been persisted.
    pub fn apply(stages: &StageSet, write_set: &WriteSet) -> StageSet {
        stages.with_updates(&write_set.stages)
    }
}
