use std::collections::HashMap;

use bac_core::{StageRecord, StageSet, StageWorkflowEngine};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbError;
use crate::models::{parse_uuid, StageRow};

const STAGE_COLUMNS: &str =
    "project_id, stage, created_at, approved_at, office, remarks, is_submitted";

#[derive(Clone)]
pub struct StageRepository {
    pool: SqlitePool,
}

impl StageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Stored rows of one project, in no particular order.
    pub async fn load_stage_records(&self, project_id: Uuid) -> Result<Vec<StageRecord>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_records(&mut conn, project_id).await
    }

    /// Complete stage set of one project, persisting any rows that were missing.
    pub async fn load_stage_set(
        &self,
        project_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<StageSet, DbError> {
        let mut conn = self.pool.acquire().await?;
        load_complete(&mut conn, project_id, now).await
    }

    pub async fn save_stage_records(&self, records: &[StageRecord]) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        write_records(&mut tx, records).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Every stored row, grouped by project.
    pub async fn find_all(&self) -> Result<HashMap<Uuid, Vec<StageRecord>>, DbError> {
        let rows: Vec<StageRow> =
            sqlx::query_as(&format!("SELECT {STAGE_COLUMNS} FROM project_stages"))
                .fetch_all(&self.pool)
                .await?;

        let mut grouped: HashMap<Uuid, Vec<StageRecord>> = HashMap::new();
        for row in rows {
            let project_id = parse_uuid(&row.project_id);
            if let Some(record) = row.into_domain() {
                grouped.entry(project_id).or_default().push(record);
            }
        }
        Ok(grouped)
    }
}

pub(crate) async fn fetch_records(
    conn: &mut SqliteConnection,
    project_id: Uuid,
) -> Result<Vec<StageRecord>, DbError> {
    let rows: Vec<StageRow> = sqlx::query_as(&format!(
        "SELECT {STAGE_COLUMNS} FROM project_stages WHERE project_id = ?"
    ))
    .bind(project_id.to_string())
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().filter_map(StageRow::into_domain).collect())
}

pub(crate) async fn load_complete(
    conn: &mut SqliteConnection,
    project_id: Uuid,
    now: DateTime<Utc>,
) -> Result<StageSet, DbError> {
    let existing = fetch_records(&mut *conn, project_id).await?;
    let backfill = StageWorkflowEngine::ensure_initialized(project_id, existing, now);

    if !backfill.is_complete() {
        debug!(
            project_id = %project_id,
            missing = backfill.inserted.len(),
            "backfilling stage rows"
        );
        insert_missing(&mut *conn, backfill.inserted_records()).await?;
    }

    Ok(backfill.stages)
}

/// Inserts rows that do not exist yet; existing rows are left untouched.
pub(crate) async fn insert_missing<'a>(
    conn: &mut SqliteConnection,
    records: impl IntoIterator<Item = &'a StageRecord>,
) -> Result<(), DbError> {
    for record in records {
        let row = StageRow::from(record);
        sqlx::query(&format!(
            "INSERT OR IGNORE INTO project_stages ({STAGE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&row.project_id)
        .bind(&row.stage)
        .bind(row.created_at)
        .bind(row.approved_at)
        .bind(&row.office)
        .bind(&row.remarks)
        .bind(row.is_submitted)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Upserts full stage rows.
pub(crate) async fn write_records(
    conn: &mut SqliteConnection,
    records: &[StageRecord],
) -> Result<(), DbError> {
    for record in records {
        let row = StageRow::from(record);
        sqlx::query(&format!(
            r#"
            INSERT INTO project_stages ({STAGE_COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(project_id, stage) DO UPDATE SET
                created_at = excluded.created_at,
                approved_at = excluded.approved_at,
                office = excluded.office,
                remarks = excluded.remarks,
                is_submitted = excluded.is_submitted
            "#
        ))
        .bind(&row.project_id)
        .bind(&row.stage)
        .bind(row.created_at)
        .bind(row.approved_at)
        .bind(&row.office)
        .bind(&row.remarks)
        .bind(row.is_submitted)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_support::setup_test_db;
    use crate::repositories::ProjectRepository;
    use bac_core::{Actor, CreateProjectRequest, ProjectHeaderManager, Stage};
    use chrono::{SubsecRound, TimeZone};

    async fn seed_project(pool: &SqlitePool) -> Uuid {
        let project = ProjectHeaderManager::create_project(
            &Actor::member(Uuid::new_v4()),
            &CreateProjectRequest {
                pr_number: "PR-1".to_string(),
                details: "Details".to_string(),
            },
            Utc::now().trunc_subsecs(0),
        )
        .unwrap();
        ProjectRepository::new(pool.clone())
            .create(&project)
            .await
            .unwrap();
        project.header.id
    }

    #[tokio::test]
    async fn test_load_stage_set_backfills_missing_rows() {
        let (pool, _dir) = setup_test_db().await;
        let project_id = seed_project(&pool).await;
        sqlx::query("DELETE FROM project_stages WHERE project_id = ? AND stage IN ('rfq_2', 'purchase_request')")
            .bind(project_id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let repo = StageRepository::new(pool);
        assert_eq!(repo.load_stage_records(project_id).await.unwrap().len(), 6);

        let now = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        let set = repo.load_stage_set(project_id, now).await.unwrap();
        assert_eq!(set.get(Stage::PurchaseRequest).created_at, Some(now));
        assert_eq!(set.get(Stage::Rfq2).created_at, None);

        assert_eq!(repo.load_stage_records(project_id).await.unwrap().len(), 8);
    }

    #[tokio::test]
    async fn test_save_stage_records_overwrites() {
        let (pool, _dir) = setup_test_db().await;
        let project_id = seed_project(&pool).await;
        let repo = StageRepository::new(pool);

        let approved = Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap();
        let mut record = StageRecord::empty(project_id, Stage::PurchaseRequest);
        record.approved_at = Some(approved);
        record.office = "Supply Office".to_string();
        record.remarks = "Approved".to_string();
        record.is_submitted = true;
        repo.save_stage_records(std::slice::from_ref(&record))
            .await
            .unwrap();

        let set = repo.load_stage_set(project_id, Utc::now()).await.unwrap();
        assert_eq!(set.get(Stage::PurchaseRequest), &record);
        assert!(!set.get(Stage::Rfq1).is_submitted);
    }

    #[tokio::test]
    async fn test_unknown_stage_rows_are_skipped() {
        let (pool, _dir) = setup_test_db().await;
        let project_id = seed_project(&pool).await;
        sqlx::query("INSERT INTO project_stages (project_id, stage) VALUES (?, 'canvass')")
            .bind(project_id.to_string())
            .execute(&pool)
            .await
            .unwrap();

        let repo = StageRepository::new(pool);
        assert_eq!(repo.load_stage_records(project_id).await.unwrap().len(), 8);
        let all = repo.find_all().await.unwrap();
        assert_eq!(all.get(&project_id).map(Vec::len), Some(8));
    }
}
