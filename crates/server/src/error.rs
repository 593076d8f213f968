use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bac_core::WorkflowError;
use db::DbError;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    Unauthorized(String),
    Workflow(WorkflowError),
    Database(DbError),
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

fn workflow_status(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::MissingRequiredFields { .. } => StatusCode::BAD_REQUEST,
        WorkflowError::StageNotEligible { .. } | WorkflowError::NotLastSubmittedStage { .. } => {
            StatusCode::CONFLICT
        }
        WorkflowError::PermissionDenied(_) => StatusCode::FORBIDDEN,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg),
            AppError::Workflow(err) => (workflow_status(&err), err.code(), err.to_string()),
            AppError::Database(err) => match err {
                DbError::Rejected(err) => (workflow_status(&err), err.code(), err.to_string()),
                DbError::ProjectNotFound(id) => (
                    StatusCode::NOT_FOUND,
                    "not_found",
                    format!("Project not found: {}", id),
                ),
                DbError::UsernameTaken(name) => (
                    StatusCode::CONFLICT,
                    "conflict",
                    format!("Username already taken: {}", name),
                ),
                err => {
                    tracing::error!("Database error: {:?}", err);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "database_error",
                        "Database error occurred".to_string(),
                    )
                }
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<DbError> for AppError {
    fn from(err: DbError) -> Self {
        AppError::Database(err)
    }
}

impl From<WorkflowError> for AppError {
    fn from(err: WorkflowError) -> Self {
        AppError::Workflow(err)
    }
}
