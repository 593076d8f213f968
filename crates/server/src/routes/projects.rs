use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bac_core::{
    Actor, AuditStamp, CreateProjectRequest, FieldEditability, ProjectHeader, ProjectStatistics,
    ProjectStatus, ProjectSummary, Stage, StageAction, StageWorkflowEngine, UpdateProjectRequest,
};
use chrono::{DateTime, Utc};
use db::ProjectSnapshot;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct DashboardQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct DashboardResponse {
    pub organization: String,
    pub statistics: ProjectStatistics,
    pub projects: Vec<ProjectSummary>,
}

/// One stage row as the given caller sees it.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct StageView {
    pub stage: Stage,
    pub display_name: String,
    pub created_at: Option<DateTime<Utc>>,
    pub approved_at: Option<DateTime<Utc>>,
    pub office: String,
    pub remarks: String,
    pub is_submitted: bool,
    pub is_active: bool,
    pub editability: FieldEditability,
    pub action: StageAction,
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProjectDetail {
    pub project: ProjectHeader,
    pub created_by_name: Option<String>,
    /// Most recent edit or view.
    pub last_activity: Option<AuditStamp>,
    pub last_activity_by_name: Option<String>,
    pub status: ProjectStatus,
    pub current_stage: Option<Stage>,
    pub last_submitted_stage: Option<Stage>,
    pub stages: Vec<StageView>,
}

async fn short_name(state: &AppState, user_id: Uuid) -> Result<Option<String>, AppError> {
    let user = state.user_repository.find_by_id(user_id).await?;
    Ok(user.map(|u| u.short_name()))
}

pub(crate) async fn project_detail(
    state: &AppState,
    snapshot: ProjectSnapshot,
    actor: &Actor,
) -> Result<ProjectDetail, AppError> {
    let ProjectSnapshot { header, stages } = snapshot;

    let views = stages
        .iter()
        .map(|record| StageView {
            stage: record.stage,
            display_name: record.stage.display_name().to_string(),
            created_at: record.created_at,
            approved_at: record.approved_at,
            office: record.office.clone(),
            remarks: record.remarks.clone(),
            is_submitted: record.is_submitted,
            is_active: StageWorkflowEngine::is_active(record.stage, &stages),
            editability: StageWorkflowEngine::is_field_editable(record.stage, &stages, actor),
            action: StageWorkflowEngine::stage_action(record.stage, &stages, actor),
        })
        .collect();

    let last_activity = header.last_activity();
    let last_activity_by_name = match last_activity {
        Some(stamp) => short_name(state, stamp.by).await?,
        None => None,
    };

    Ok(ProjectDetail {
        created_by_name: short_name(state, header.created_by).await?,
        last_activity,
        last_activity_by_name,
        status: StageWorkflowEngine::compute_project_status(&stages),
        current_stage: StageWorkflowEngine::compute_first_unsubmitted(&stages),
        last_submitted_stage: StageWorkflowEngine::compute_last_submitted(&stages),
        stages: views,
        project: header,
    })
}

#[utoipa::path(
    get,
    path = "/api/projects",
    params(
        ("x-user-id" = String, Header, description = "Authenticated user ID"),
        ("search" = Option<String>, Query, description = "Substring of PR number or details")
    ),
    responses(
        (status = 200, description = "Dashboard rows and statistics", body = DashboardResponse),
        (status = 401, description = "Missing or unknown user", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<DashboardResponse>, AppError> {
    let (projects, statistics) = state
        .workflow_store
        .dashboard(query.search.as_deref())
        .await?;

    Ok(Json(DashboardResponse {
        organization: state.organization.clone(),
        statistics,
        projects,
    }))
}

#[utoipa::path(
    post,
    path = "/api/projects",
    params(
        ("x-user-id" = String, Header, description = "Authenticated user ID")
    ),
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = ProjectDetail),
        (status = 400, description = "PR number or details missing", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectDetail>), AppError> {
    let actor = user.actor();
    let snapshot = state
        .workflow_store
        .create_project(&actor, &payload)
        .await?;

    let detail = project_detail(&state, snapshot, &actor).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("x-user-id" = String, Header, description = "Authenticated user ID")
    ),
    responses(
        (status = 200, description = "Project with its stages", body = ProjectDetail),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectDetail>, AppError> {
    let actor = user.actor();
    let snapshot = state.workflow_store.open_project(id, &actor).await?;
    Ok(Json(project_detail(&state, snapshot, &actor).await?))
}

#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("x-user-id" = String, Header, description = "Authenticated user ID")
    ),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project details updated", body = ProjectDetail),
        (status = 400, description = "PR number or details missing", body = ErrorResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn update_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectDetail>, AppError> {
    let actor = user.actor();
    let snapshot = state
        .workflow_store
        .update_header(id, &actor, &payload)
        .await?;
    Ok(Json(project_detail(&state, snapshot, &actor).await?))
}

#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("x-user-id" = String, Header, description = "Authenticated user ID")
    ),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Project not found", body = ErrorResponse)
    ),
    tag = "projects"
)]
pub async fn delete_project(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state
        .workflow_store
        .delete_project(id, &user.actor())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
