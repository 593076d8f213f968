use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// The caller of a workflow operation, as resolved by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct Actor {
    pub user_id: Uuid,
    pub is_admin: bool,
}

impl Actor {
    pub fn admin(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }

    pub fn member(user_id: Uuid) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }
}

/// Directory entry the identity provider resolves actors against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub full_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, full_name: impl Into<String>, is_admin: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            full_name: full_name.into(),
            is_admin,
            created_at: Utc::now(),
        }
    }

    pub fn actor(&self) -> Actor {
        Actor {
            user_id: self.id,
            is_admin: self.is_admin,
        }
    }

    /// "J. Dela Cruz" style label used in dashboard rows.
    pub fn short_name(&self) -> String {
        let mut parts = self.full_name.split_whitespace();
        match (parts.next(), parts.last()) {
            (Some(first), Some(last)) => {
                let initial: String = first.chars().take(1).collect();
                format!("{}. {}", initial, last)
            }
            (Some(only), None) => only.to_string(),
            _ => self.username.clone(),
        }
    }
}
