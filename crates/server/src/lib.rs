pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BAC Tracker API",
        version = "0.1.0",
        description = "Stage tracking for Bids and Awards Committee procurement projects"
    ),
    paths(
        routes::health_check,
        routes::get_me,
        routes::list_projects,
        routes::create_project,
        routes::get_project,
        routes::update_project,
        routes::delete_project,
        routes::submit_stage,
        routes::unsubmit_stage,
    ),
    components(schemas(
        routes::HealthResponse,
        routes::MeResponse,
        routes::DashboardQuery,
        routes::DashboardResponse,
        routes::ProjectDetail,
        routes::StageView,
        routes::StageTransitionResponse,
        error::ErrorResponse,
        bac_core::Stage,
        bac_core::StageRecord,
        bac_core::StageAction,
        bac_core::FieldEditability,
        bac_core::ProjectHeader,
        bac_core::ProjectStatus,
        bac_core::ProjectStatistics,
        bac_core::ProjectSummary,
        bac_core::AuditStamp,
        bac_core::User,
        bac_core::CreateProjectRequest,
        bac_core::UpdateProjectRequest,
        bac_core::SubmitStageRequest,
    )),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "users", description = "Caller identity"),
        (name = "projects", description = "Procurement project endpoints"),
        (name = "stages", description = "Stage submit and unsubmit endpoints"),
    )
)]
pub struct ApiDoc;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .route("/health", get(routes::health_check))
        .route("/api/me", get(routes::get_me))
        .route(
            "/api/projects",
            get(routes::list_projects).post(routes::create_project),
        )
        .route(
            "/api/projects/{id}",
            get(routes::get_project)
                .patch(routes::update_project)
                .delete(routes::delete_project),
        )
        .route(
            "/api/projects/{id}/stages/{stage}/submit",
            post(routes::submit_stage),
        )
        .route(
            "/api/projects/{id}/stages/{stage}/unsubmit",
            post(routes::unsubmit_stage),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
