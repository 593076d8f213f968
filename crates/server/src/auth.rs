//! Caller identity.
//!
//! Sign-in happens upstream; the reverse proxy forwards the resolved user id
//! in `x-user-id`. The header must name a user in the directory.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use bac_core::{Actor, User};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller of an `/api` request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl CurrentUser {
    pub fn actor(&self) -> Actor {
        self.0.actor()
    }
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<Uuid>().ok())
            .ok_or_else(|| AppError::Unauthorized(format!("Missing or invalid {} header", USER_ID_HEADER)))?;

        let user = state
            .user_repository
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized(format!("Unknown user: {}", user_id)))?;

        Ok(CurrentUser(user))
    }
}
