use axum::Json;
use bac_core::User;
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::CurrentUser;
use crate::error::ErrorResponse;

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct MeResponse {
    pub user: User,
    /// "J. Cruz" style name used in activity lines.
    pub short_name: String,
}

#[utoipa::path(
    get,
    path = "/api/me",
    params(
        ("x-user-id" = String, Header, description = "Authenticated user ID")
    ),
    responses(
        (status = 200, description = "Current user", body = MeResponse),
        (status = 401, description = "Missing or unknown user", body = ErrorResponse)
    ),
    tag = "users"
)]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<MeResponse> {
    let short_name = user.short_name();
    Json(MeResponse { user, short_name })
}
