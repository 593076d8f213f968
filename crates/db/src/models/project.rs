use bac_core::ProjectHeader;

use super::{datetime_to_timestamp, parse_uuid, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: String,
    pub pr_number: String,
    pub details: String,
    pub created_at: i64,
    pub created_by: String,
    pub edited_at: Option<i64>,
    pub edited_by: Option<String>,
    pub last_accessed_at: Option<i64>,
    pub last_accessed_by: Option<String>,
}

impl ProjectRow {
    pub fn into_domain(self) -> ProjectHeader {
        ProjectHeader {
            id: parse_uuid(&self.id),
            pr_number: self.pr_number,
            details: self.details,
            created_at: timestamp_to_datetime(self.created_at),
            created_by: parse_uuid(&self.created_by),
            edited_at: self.edited_at.map(timestamp_to_datetime),
            edited_by: self.edited_by.as_deref().map(parse_uuid),
            last_accessed_at: self.last_accessed_at.map(timestamp_to_datetime),
            last_accessed_by: self.last_accessed_by.as_deref().map(parse_uuid),
        }
    }
}

impl From<&ProjectHeader> for ProjectRow {
    fn from(header: &ProjectHeader) -> Self {
        Self {
            id: header.id.to_string(),
            pr_number: header.pr_number.clone(),
            details: header.details.clone(),
            created_at: datetime_to_timestamp(header.created_at),
            created_by: header.created_by.to_string(),
            edited_at: header.edited_at.map(datetime_to_timestamp),
            edited_by: header.edited_by.map(|id| id.to_string()),
            last_accessed_at: header.last_accessed_at.map(datetime_to_timestamp),
            last_accessed_by: header.last_accessed_by.map(|id| id.to_string()),
        }
    }
}
