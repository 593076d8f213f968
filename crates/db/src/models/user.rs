use bac_core::User;

use super::{datetime_to_timestamp, parse_uuid, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub is_admin: bool,
    pub created_at: i64,
}

impl UserRow {
    pub fn into_domain(self) -> User {
        User {
            id: parse_uuid(&self.id),
            username: self.username,
            full_name: self.full_name,
            is_admin: self.is_admin,
            created_at: timestamp_to_datetime(self.created_at),
        }
    }
}

impl From<&User> for UserRow {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            is_admin: user.is_admin,
            created_at: datetime_to_timestamp(user.created_at),
        }
    }
}
