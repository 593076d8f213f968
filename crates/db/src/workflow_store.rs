//! Transactional glue between the stage workflow engine and SQLite.
//!
//! Every transition reads the project snapshot, asks the engine for a write
//! set, and persists it inside one `BEGIN IMMEDIATE` transaction. A rejected
//! transition drops the transaction, so nothing it touched is kept.

use std::collections::HashMap;

use bac_core::{
    Actor, CreateProjectRequest, ProjectHeader, ProjectHeaderManager, ProjectStatistics,
    ProjectSummary, Stage, StageSet, StageWorkflowEngine, SubmitStageRequest,
    UpdateProjectRequest, WorkflowError, WriteSet,
};
use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repositories::{
    project_repository, stage_repository, ProjectRepository, StageRepository, UserRepository,
};

/// A project header together with its complete stage set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSnapshot {
    pub header: ProjectHeader,
    pub stages: StageSet,
}

/// What an accepted transition wrote, and the project as it now stands.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub write_set: WriteSet,
    pub snapshot: ProjectSnapshot,
}

#[derive(Clone)]
pub struct WorkflowStore {
    pool: SqlitePool,
}

impl WorkflowStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_project(
        &self,
        actor: &Actor,
        input: &CreateProjectRequest,
    ) -> Result<ProjectSnapshot, DbError> {
        let project = ProjectHeaderManager::create_project(actor, input, now())?;
        ProjectRepository::new(self.pool.clone())
            .create(&project)
            .await?;

        info!(
            project_id = %project.header.id,
            pr_number = %project.header.pr_number,
            user_id = %actor.user_id,
            "project created"
        );
        Ok(ProjectSnapshot {
            header: project.header,
            stages: project.stages,
        })
    }

    /// Loads a project for viewing and records the access.
    pub async fn open_project(&self, id: Uuid, actor: &Actor) -> Result<ProjectSnapshot, DbError> {
        let now = now();
        let mut tx = self.begin().await?;

        let header = project_repository::fetch_header(&mut tx, id)
            .await?
            .ok_or(DbError::ProjectNotFound(id))?;
        let stages = stage_repository::load_complete(&mut tx, id, now).await?;

        let touch = ProjectHeaderManager::touch(actor, now);
        project_repository::write_header(&mut tx, id, &touch).await?;
        tx.commit().await?;

        Ok(ProjectSnapshot {
            header: header.apply(&touch),
            stages,
        })
    }

    pub async fn submit_stage(
        &self,
        id: Uuid,
        stage: Stage,
        actor: &Actor,
        input: &SubmitStageRequest,
    ) -> Result<TransitionOutcome, DbError> {
        // Rows keep whole seconds only.
        let input = SubmitStageRequest {
            approved_at: input.approved_at.map(|at| at.trunc_subsecs(0)),
            created_at: input.created_at.map(|at| at.trunc_subsecs(0)),
            ..input.clone()
        };
        let outcome = self
            .transition(id, |stages, now| {
                StageWorkflowEngine::submit_stage(stage, stages, actor, &input, now)
            })
            .await?;

        info!(project_id = %id, stage = %stage, user_id = %actor.user_id, "stage submitted");
        Ok(outcome)
    }

    pub async fn unsubmit_stage(
        &self,
        id: Uuid,
        stage: Stage,
        actor: &Actor,
    ) -> Result<TransitionOutcome, DbError> {
        let outcome = self
            .transition(id, |stages, now| {
                StageWorkflowEngine::unsubmit_stage(stage, stages, actor, now)
            })
            .await?;

        info!(project_id = %id, stage = %stage, user_id = %actor.user_id, "stage unsubmitted");
        Ok(outcome)
    }

    pub async fn update_header(
        &self,
        id: Uuid,
        actor: &Actor,
        input: &UpdateProjectRequest,
    ) -> Result<ProjectSnapshot, DbError> {
        let now = now();
        let update = ProjectHeaderManager::update_header(actor, input, now)?;
        let mut tx = self.begin().await?;

        let header = project_repository::fetch_header(&mut tx, id)
            .await?
            .ok_or(DbError::ProjectNotFound(id))?;
        let stages = stage_repository::load_complete(&mut tx, id, now).await?;
        project_repository::write_header(&mut tx, id, &update).await?;
        tx.commit().await?;

        info!(project_id = %id, user_id = %actor.user_id, "project details updated");
        Ok(ProjectSnapshot {
            header: header.apply(&update),
            stages,
        })
    }

    pub async fn delete_project(&self, id: Uuid, actor: &Actor) -> Result<(), DbError> {
        ProjectHeaderManager::authorize_delete(actor)?;

        let mut tx = self.begin().await?;
        if !project_repository::delete_project(&mut tx, id).await? {
            return Err(DbError::ProjectNotFound(id));
        }
        tx.commit().await?;

        info!(project_id = %id, user_id = %actor.user_id, "project deleted");
        Ok(())
    }

    /// Project summaries, most recently edited first, with counters over the
    /// returned rows. Missing stage rows are filled in memory only.
    pub async fn dashboard(
        &self,
        search: Option<&str>,
    ) -> Result<(Vec<ProjectSummary>, ProjectStatistics), DbError> {
        let now = now();
        let headers = ProjectRepository::new(self.pool.clone())
            .list(search)
            .await?;
        let mut stages = StageRepository::new(self.pool.clone()).find_all().await?;
        let names: HashMap<Uuid, String> = UserRepository::new(self.pool.clone())
            .find_all()
            .await?
            .into_iter()
            .map(|user| (user.id, user.short_name()))
            .collect();

        let summaries: Vec<ProjectSummary> = headers
            .into_iter()
            .map(|header| {
                let records = stages.remove(&header.id).unwrap_or_default();
                let set = StageWorkflowEngine::ensure_initialized(header.id, records, now).stages;
                let creator = names.get(&header.created_by).cloned();
                ProjectSummary::new(header, &set, creator)
            })
            .collect();

        let statistics = ProjectStatistics::from_statuses(summaries.iter().map(|s| s.status));
        Ok((summaries, statistics))
    }

    async fn transition<F>(&self, id: Uuid, decide: F) -> Result<TransitionOutcome, DbError>
    where
        F: FnOnce(&StageSet, DateTime<Utc>) -> Result<WriteSet, WorkflowError>,
    {
        let now = now();
        let mut tx = self.begin().await?;

        let header = project_repository::fetch_header(&mut tx, id)
            .await?
            .ok_or(DbError::ProjectNotFound(id))?;
        let stages = stage_repository::load_complete(&mut tx, id, now).await?;

        let write_set = match decide(&stages, now) {
            Ok(write_set) => write_set,
            Err(err) => {
                debug!(project_id = %id, error = %err, "transition rejected");
                return Err(err.into());
            }
        };
        stage_repository::write_records(&mut tx, &write_set.stages).await?;
        project_repository::write_header(&mut tx, id, &write_set.header).await?;
        tx.commit().await?;

        let snapshot = ProjectSnapshot {
            header: header.apply(&write_set.header),
            stages: StageWorkflowEngine::apply(&stages, &write_set),
        };
        Ok(TransitionOutcome {
            write_set,
            snapshot,
        })
    }

    async fn begin(&self) -> Result<Transaction<'static, Sqlite>, DbError> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }
}

/// Stored timestamps have second precision.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_support::setup_test_db;
    use bac_core::{ProjectStatus, User};
    use chrono::{Duration, TimeZone};

    struct Fixture {
        store: WorkflowStore,
        admin: Actor,
        member: Actor,
        _dir: tempfile::TempDir,
    }

    async fn fixture() -> Fixture {
        let (pool, dir) = setup_test_db().await;
        let users = UserRepository::new(pool.clone());
        let admin = users
            .create(&User::new("admin", "Ana Reyes Santos", true))
            .await
            .unwrap();
        let member = users
            .create(&User::new("member", "Ben Cruz", false))
            .await
            .unwrap();

        Fixture {
            store: WorkflowStore::new(pool),
            admin: admin.actor(),
            member: member.actor(),
            _dir: dir,
        }
    }

    fn request(remark: &str) -> SubmitStageRequest {
        SubmitStageRequest {
            approved_at: Some(Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap()),
            office: "BAC Secretariat".to_string(),
            remark: remark.to_string(),
            created_at: None,
        }
    }

    fn admin_request(remark: &str) -> SubmitStageRequest {
        SubmitStageRequest {
            created_at: Some(Utc.with_ymd_and_hms(2024, 3, 28, 8, 0, 0).unwrap()),
            ..request(remark)
        }
    }

    async fn create(f: &Fixture, pr_number: &str, details: &str) -> Uuid {
        f.store
            .create_project(
                &f.member,
                &CreateProjectRequest {
                    pr_number: pr_number.to_string(),
                    details: details.to_string(),
                },
            )
            .await
            .unwrap()
            .header
            .id
    }

    #[tokio::test]
    async fn test_submit_persists_and_stamps_next_stage() {
        let f = fixture().await;
        let id = create(&f, "PR-1", "Office chairs").await;

        let outcome = f
            .store
            .submit_stage(id, Stage::PurchaseRequest, &f.member, &request("ok"))
            .await
            .unwrap();
        assert_eq!(outcome.write_set.stages.len(), 2);
        assert_eq!(outcome.snapshot.header.edited_by, Some(f.member.user_id));

        let opened = f.store.open_project(id, &f.member).await.unwrap();
        assert_eq!(opened.stages, outcome.snapshot.stages);
        assert!(opened.stages.get(Stage::PurchaseRequest).is_submitted);
        assert!(opened.stages.get(Stage::Rfq1).created_at.is_some());
        assert_eq!(
            StageWorkflowEngine::compute_first_unsubmitted(&opened.stages),
            Some(Stage::Rfq1)
        );
    }

    #[tokio::test]
    async fn test_submit_snapshot_matches_stored_rows_for_fractional_seconds() {
        let f = fixture().await;
        let id = create(&f, "PR-1", "Office chairs").await;
        f.store
            .submit_stage(id, Stage::PurchaseRequest, &f.member, &request("ok"))
            .await
            .unwrap();

        let approved =
            Utc.with_ymd_and_hms(2024, 4, 1, 9, 0, 0).unwrap() + Duration::milliseconds(750);
        let created =
            Utc.with_ymd_and_hms(2024, 3, 28, 8, 0, 0).unwrap() + Duration::milliseconds(250);
        let input = SubmitStageRequest {
            approved_at: Some(approved),
            created_at: Some(created),
            ..request("ok")
        };
        let outcome = f
            .store
            .submit_stage(id, Stage::Rfq1, &f.admin, &input)
            .await
            .unwrap();

        let rfq1 = outcome.snapshot.stages.get(Stage::Rfq1);
        assert_eq!(rfq1.approved_at, Some(approved.trunc_subsecs(0)));
        assert_eq!(rfq1.created_at, Some(created.trunc_subsecs(0)));

        let reread = f.store.open_project(id, &f.member).await.unwrap();
        assert_eq!(reread.stages, outcome.snapshot.stages);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submits_of_one_stage_accept_exactly_one() {
        let f = fixture().await;
        let id = create(&f, "PR-1", "Office chairs").await;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = f.store.clone();
                let actor = f.member;
                let input = request(&format!("try {i}"));
                tokio::spawn(async move {
                    store
                        .submit_stage(id, Stage::PurchaseRequest, &actor, &input)
                        .await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(DbError::Rejected(WorkflowError::StageNotEligible { stage, active })) => {
                    assert_eq!(stage, Stage::PurchaseRequest);
                    assert_eq!(active, Some(Stage::Rfq1));
                }
                Err(err) => panic!("unexpected error: {err:?}"),
            }
        }
        assert_eq!(accepted, 1);

        let stages = f.store.open_project(id, &f.member).await.unwrap().stages;
        assert!(stages.get(Stage::PurchaseRequest).is_submitted);
        assert!(!stages.get(Stage::Rfq1).is_submitted);
    }

    #[tokio::test]
    async fn test_rejected_transition_leaves_rows_unchanged() {
        let f = fixture().await;
        let id = create(&f, "PR-1", "Office chairs").await;
        let before = f.store.open_project(id, &f.member).await.unwrap();

        let err = f
            .store
            .submit_stage(id, Stage::Rfq2, &f.member, &request("skip"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(WorkflowError::StageNotEligible { .. })
        ));

        let err = f
            .store
            .submit_stage(id, Stage::PurchaseRequest, &f.member, &request("  "))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(WorkflowError::MissingRequiredFields { .. })
        ));

        let after = f.store.open_project(id, &f.member).await.unwrap();
        assert_eq!(after.stages, before.stages);
        assert_eq!(after.header.edited_at, None);
    }

    #[tokio::test]
    async fn test_unsubmit_requires_admin_and_last_stage() {
        let f = fixture().await;
        let id = create(&f, "PR-1", "Office chairs").await;
        f.store
            .submit_stage(id, Stage::PurchaseRequest, &f.member, &request("pr"))
            .await
            .unwrap();
        f.store
            .submit_stage(id, Stage::Rfq1, &f.admin, &admin_request("rfq"))
            .await
            .unwrap();

        let err = f
            .store
            .unsubmit_stage(id, Stage::Rfq1, &f.member)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(WorkflowError::PermissionDenied(_))
        ));

        let err = f
            .store
            .unsubmit_stage(id, Stage::PurchaseRequest, &f.admin)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rejected(WorkflowError::NotLastSubmittedStage { .. })
        ));

        let outcome = f
            .store
            .unsubmit_stage(id, Stage::Rfq1, &f.admin)
            .await
            .unwrap();
        let rfq1 = outcome.snapshot.stages.get(Stage::Rfq1);
        assert!(!rfq1.is_submitted);
        assert!(rfq1.office.is_empty());
        assert_eq!(
            rfq1.created_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 28, 8, 0, 0).unwrap())
        );
    }

    #[tokio::test]
    async fn test_full_run_finishes_project() {
        let f = fixture().await;
        let id = create(&f, "PR-1", "Office chairs").await;

        for stage in Stage::ALL {
            f.store
                .submit_stage(id, stage, &f.admin, &admin_request(stage.as_str()))
                .await
                .unwrap();
        }

        let (summaries, stats) = f.store.dashboard(None).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].status, ProjectStatus::Finished);
        assert_eq!(summaries[0].current_stage, None);
        assert_eq!(stats.finished, 1);
        assert_eq!(stats.percent_finished, 100.0);
    }

    #[tokio::test]
    async fn test_missing_project() {
        let f = fixture().await;
        let id = Uuid::new_v4();

        assert!(matches!(
            f.store.open_project(id, &f.member).await.unwrap_err(),
            DbError::ProjectNotFound(_)
        ));
        assert!(matches!(
            f.store
                .submit_stage(id, Stage::PurchaseRequest, &f.member, &request("x"))
                .await
                .unwrap_err(),
            DbError::ProjectNotFound(_)
        ));
        assert!(matches!(
            f.store.delete_project(id, &f.admin).await.unwrap_err(),
            DbError::ProjectNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_header_update_and_delete_are_admin_only() {
        let f = fixture().await;
        let id = create(&f, "PR-1", "Office chairs").await;
        let input = UpdateProjectRequest {
            pr_number: "PR-1A".to_string(),
            details: "Ergonomic office chairs".to_string(),
        };

        assert!(matches!(
            f.store.update_header(id, &f.member, &input).await.unwrap_err(),
            DbError::Rejected(WorkflowError::PermissionDenied(_))
        ));
        assert!(matches!(
            f.store.delete_project(id, &f.member).await.unwrap_err(),
            DbError::Rejected(WorkflowError::PermissionDenied(_))
        ));

        let updated = f.store.update_header(id, &f.admin, &input).await.unwrap();
        assert_eq!(updated.header.pr_number, "PR-1A");
        assert_eq!(updated.header.edited_by, Some(f.admin.user_id));

        f.store.delete_project(id, &f.admin).await.unwrap();
        let (summaries, _) = f.store.dashboard(None).await.unwrap();
        assert!(summaries.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_creator_names_and_search() {
        let f = fixture().await;
        create(&f, "PR-2024-001", "Printer ink").await;
        let laptops = create(&f, "PR-2024-002", "Laptops").await;
        f.store
            .submit_stage(laptops, Stage::PurchaseRequest, &f.member, &request("ok"))
            .await
            .unwrap();

        let (summaries, stats) = f.store.dashboard(None).await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.ongoing, 2);
        let row = summaries.iter().find(|s| s.project.id == laptops).unwrap();
        assert_eq!(row.creator_name.as_deref(), Some("B. Cruz"));
        assert_eq!(row.current_stage, Some(Stage::Rfq1));

        let (found, stats) = f.store.dashboard(Some("printer")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(stats.total, 1);
        assert_eq!(found[0].current_stage, Some(Stage::PurchaseRequest));
    }

    #[tokio::test]
    async fn test_open_project_records_access_only() {
        let f = fixture().await;
        let id = create(&f, "PR-1", "Office chairs").await;

        let opened = f.store.open_project(id, &f.admin).await.unwrap();
        assert_eq!(opened.header.last_accessed_by, Some(f.admin.user_id));
        assert!(opened.header.edited_at.is_none());
        assert!(opened.header.last_accessed_at.unwrap() - opened.header.created_at < Duration::minutes(1));
    }
}
