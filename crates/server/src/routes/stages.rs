use axum::extract::{Path, State};
use axum::Json;
use bac_core::{Stage, SubmitStageRequest};
use db::TransitionOutcome;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::projects::{project_detail, ProjectDetail};
use crate::auth::CurrentUser;
use crate::error::{AppError, ErrorResponse};
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct StageTransitionResponse {
    /// Stages whose rows were written, in write order.
    pub updated_stages: Vec<Stage>,
    pub project: ProjectDetail,
}

fn parse_stage(raw: &str) -> Result<Stage, AppError> {
    Stage::parse(raw).ok_or_else(|| AppError::NotFound(format!("Unknown stage: {}", raw)))
}

async fn transition_response(
    state: &AppState,
    user: &CurrentUser,
    outcome: TransitionOutcome,
) -> Result<Json<StageTransitionResponse>, AppError> {
    let updated_stages = outcome.write_set.stages.iter().map(|r| r.stage).collect();
    let project = project_detail(state, outcome.snapshot, &user.actor()).await?;
    Ok(Json(StageTransitionResponse {
        updated_stages,
        project,
    }))
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/stages/{stage}/submit",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("stage" = String, Path, description = "Stage slug, e.g. rfq_1"),
        ("x-user-id" = String, Header, description = "Authenticated user ID")
    ),
    request_body = SubmitStageRequest,
    responses(
        (status = 200, description = "Stage submitted", body = StageTransitionResponse),
        (status = 400, description = "Required fields missing", body = ErrorResponse),
        (status = 404, description = "Project or stage not found", body = ErrorResponse),
        (status = 409, description = "Stage is not the active stage", body = ErrorResponse)
    ),
    tag = "stages"
)]
pub async fn submit_stage(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, stage)): Path<(Uuid, String)>,
    Json(payload): Json<SubmitStageRequest>,
) -> Result<Json<StageTransitionResponse>, AppError> {
    let stage = parse_stage(&stage)?;
    let outcome = state
        .workflow_store
        .submit_stage(id, stage, &user.actor(), &payload)
        .await?;

    transition_response(&state, &user, outcome).await
}

#[utoipa::path(
    post,
    path = "/api/projects/{id}/stages/{stage}/unsubmit",
    params(
        ("id" = Uuid, Path, description = "Project ID"),
        ("stage" = String, Path, description = "Stage slug, e.g. rfq_1"),
        ("x-user-id" = String, Header, description = "Authenticated user ID")
    ),
    responses(
        (status = 200, description = "Stage reverted", body = StageTransitionResponse),
        (status = 403, description = "Caller is not an administrator", body = ErrorResponse),
        (status = 404, description = "Project or stage not found", body = ErrorResponse),
        (status = 409, description = "Stage is not the last submitted stage", body = ErrorResponse)
    ),
    tag = "stages"
)]
pub async fn unsubmit_stage(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, stage)): Path<(Uuid, String)>,
) -> Result<Json<StageTransitionResponse>, AppError> {
    let stage = parse_stage(&stage)?;
    let outcome = state
        .workflow_store
        .unsubmit_stage(id, stage, &user.actor())
        .await?;

    transition_response(&state, &user, outcome).await
}
