use bac_core::{HeaderUpdate, NewProject, ProjectHeader};
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use super::stage_repository;
use crate::error::DbError;
use crate::models::{datetime_to_timestamp, ProjectRow};

const PROJECT_COLUMNS: &str = "id, pr_number, details, created_at, created_by, edited_at, edited_by, last_accessed_at, last_accessed_by";

#[derive(Clone)]
pub struct ProjectRepository {
    pool: SqlitePool,
}

impl ProjectRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts the header and all of its stage rows in one transaction.
    pub async fn create(&self, project: &NewProject) -> Result<ProjectHeader, DbError> {
        let row = ProjectRow::from(&project.header);
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO projects (id, pr_number, details, created_at, created_by, edited_at, edited_by, last_accessed_at, last_accessed_by)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.pr_number)
        .bind(&row.details)
        .bind(row.created_at)
        .bind(&row.created_by)
        .bind(row.edited_at)
        .bind(&row.edited_by)
        .bind(row.last_accessed_at)
        .bind(&row.last_accessed_by)
        .execute(&mut *tx)
        .await?;

        stage_repository::insert_missing(&mut tx, project.stages.records()).await?;

        tx.commit().await?;
        Ok(project.header.clone())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<ProjectHeader>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_header(&mut conn, id).await
    }

    /// Projects ordered by most recent edit (or creation), optionally filtered by a
    /// case-insensitive substring of the PR number or details.
    pub async fn list(&self, search: Option<&str>) -> Result<Vec<ProjectHeader>, DbError> {
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let rows: Vec<ProjectRow> = match search {
            Some(term) => {
                sqlx::query_as(&format!(
                    r#"
                    SELECT {PROJECT_COLUMNS}
                    FROM projects
                    WHERE instr(lower(details), lower(?1)) > 0 OR instr(lower(pr_number), lower(?1)) > 0
                    ORDER BY COALESCE(edited_at, created_at) DESC
                    "#
                ))
                .bind(term)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(&format!(
                    r#"
                    SELECT {PROJECT_COLUMNS}
                    FROM projects
                    ORDER BY COALESCE(edited_at, created_at) DESC
                    "#
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(rows.into_iter().map(|r| r.into_domain()).collect())
    }

    pub async fn save_header(&self, id: Uuid, update: &HeaderUpdate) -> Result<bool, DbError> {
        let mut conn = self.pool.acquire().await?;
        write_header(&mut conn, id, update).await
    }

    /// Removes a project together with its stage rows.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbError> {
        let mut tx = self.pool.begin().await?;
        let deleted = delete_project(&mut tx, id).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

pub(crate) async fn fetch_header(
    conn: &mut SqliteConnection,
    id: Uuid,
) -> Result<Option<ProjectHeader>, DbError> {
    let row: Option<ProjectRow> =
        sqlx::query_as(&format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&mut *conn)
            .await?;

    Ok(row.map(|r| r.into_domain()))
}

/// Applies a header write; returns `false` when the project does not exist.
pub(crate) async fn write_header(
    conn: &mut SqliteConnection,
    id: Uuid,
    update: &HeaderUpdate,
) -> Result<bool, DbError> {
    let (pr_number, details) = match &update.fields {
        Some(fields) => (Some(fields.pr_number.as_str()), Some(fields.details.as_str())),
        None => (None, None),
    };

    let result = sqlx::query(
        r#"
        UPDATE projects
        SET pr_number = COALESCE(?, pr_number),
            details = COALESCE(?, details),
            edited_at = COALESCE(?, edited_at),
            edited_by = COALESCE(?, edited_by),
            last_accessed_at = ?,
            last_accessed_by = ?
        WHERE id = ?
        "#,
    )
    .bind(pr_number)
    .bind(details)
    .bind(update.edited.map(|s| datetime_to_timestamp(s.at)))
    .bind(update.edited.map(|s| s.by.to_string()))
    .bind(datetime_to_timestamp(update.accessed.at))
    .bind(update.accessed.by.to_string())
    .bind(id.to_string())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_project(conn: &mut SqliteConnection, id: Uuid) -> Result<bool, DbError> {
    sqlx::query("DELETE FROM project_stages WHERE project_id = ?")
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::test_support::setup_test_db;
    use crate::repositories::StageRepository;
    use bac_core::{Actor, AuditStamp, CreateProjectRequest, HeaderFields, ProjectHeaderManager};
    use chrono::{Duration, SubsecRound, Utc};

    fn new_project(pr_number: &str, details: &str) -> NewProject {
        ProjectHeaderManager::create_project(
            &Actor::member(Uuid::new_v4()),
            &CreateProjectRequest {
                pr_number: pr_number.to_string(),
                details: details.to_string(),
            },
            Utc::now().trunc_subsecs(0),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_and_find_project() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ProjectRepository::new(pool.clone());

        let project = new_project("PR-2024-001", "Office supplies");
        repo.create(&project).await.unwrap();

        let found = repo.find_by_id(project.header.id).await.unwrap();
        assert_eq!(found, Some(project.header.clone()));

        let stages = StageRepository::new(pool)
            .load_stage_records(project.header.id)
            .await
            .unwrap();
        assert_eq!(stages.len(), 8);
    }

    #[tokio::test]
    async fn test_find_missing_project() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ProjectRepository::new(pool);
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_latest_activity() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ProjectRepository::new(pool);

        let older = new_project("PR-1", "Printer ink");
        let newer = new_project("PR-2", "Laptops");
        repo.create(&older).await.unwrap();
        repo.create(&newer).await.unwrap();

        let update = HeaderUpdate::edit(AuditStamp {
            at: Utc::now().trunc_subsecs(0) + Duration::hours(1),
            by: Uuid::new_v4(),
        });
        repo.save_header(older.header.id, &update).await.unwrap();

        let listed = repo.list(None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, older.header.id);
    }

    #[tokio::test]
    async fn test_list_search() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ProjectRepository::new(pool);

        repo.create(&new_project("PR-2024-100", "Printer ink"))
            .await
            .unwrap();
        repo.create(&new_project("PR-2024-200", "Laptops for ICT"))
            .await
            .unwrap();

        let by_details = repo.list(Some("laptop")).await.unwrap();
        assert_eq!(by_details.len(), 1);
        assert_eq!(by_details[0].pr_number, "PR-2024-200");

        let by_number = repo.list(Some("2024-100")).await.unwrap();
        assert_eq!(by_number.len(), 1);
        assert_eq!(by_number[0].details, "Printer ink");

        assert_eq!(repo.list(Some("   ")).await.unwrap().len(), 2);
        assert!(repo.list(Some("chairs")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_header_fields() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ProjectRepository::new(pool);
        let project = new_project("PR-1", "Old details");
        repo.create(&project).await.unwrap();

        let now = Utc::now().trunc_subsecs(0);
        let editor = Uuid::new_v4();
        let mut update = HeaderUpdate::edit(AuditStamp { at: now, by: editor });
        update.fields = Some(HeaderFields {
            pr_number: "PR-9".to_string(),
            details: "New details".to_string(),
        });

        assert!(repo.save_header(project.header.id, &update).await.unwrap());
        let found = repo.find_by_id(project.header.id).await.unwrap().unwrap();
        assert_eq!(found, project.header.apply(&update));

        assert!(!repo.save_header(Uuid::new_v4(), &update).await.unwrap());
    }

    #[tokio::test]
    async fn test_access_stamp_keeps_edit_stamp() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ProjectRepository::new(pool);
        let project = new_project("PR-1", "Details");
        repo.create(&project).await.unwrap();

        let now = Utc::now().trunc_subsecs(0);
        let editor = Uuid::new_v4();
        repo.save_header(
            project.header.id,
            &HeaderUpdate::edit(AuditStamp { at: now, by: editor }),
        )
        .await
        .unwrap();
        repo.save_header(
            project.header.id,
            &HeaderUpdate::access(AuditStamp {
                at: now + Duration::minutes(3),
                by: Uuid::new_v4(),
            }),
        )
        .await
        .unwrap();

        let found = repo.find_by_id(project.header.id).await.unwrap().unwrap();
        assert_eq!(found.edited_by, Some(editor));
        assert_eq!(found.last_accessed_at, Some(now + Duration::minutes(3)));
    }

    #[tokio::test]
    async fn test_delete_project_cascades() {
        let (pool, _dir) = setup_test_db().await;
        let repo = ProjectRepository::new(pool.clone());
        let project = new_project("PR-1", "Details");
        repo.create(&project).await.unwrap();

        assert!(repo.delete(project.header.id).await.unwrap());
        assert!(repo.find_by_id(project.header.id).await.unwrap().is_none());

        let stages = StageRepository::new(pool)
            .load_stage_records(project.header.id)
            .await
            .unwrap();
        assert!(stages.is_empty());

        assert!(!repo.delete(project.header.id).await.unwrap());
    }
}
