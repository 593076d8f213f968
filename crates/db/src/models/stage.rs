use bac_core::{Stage, StageRecord};

use super::{datetime_to_timestamp, parse_uuid, timestamp_to_datetime};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StageRow {
    pub project_id: String,
    pub stage: String,
    pub created_at: Option<i64>,
    pub approved_at: Option<i64>,
    pub office: String,
    pub remarks: String,
    pub is_submitted: bool,
}

impl StageRow {
    /// `None` when the stored stage name is not part of the workflow.
    pub fn into_domain(self) -> Option<StageRecord> {
        let stage = Stage::parse(&self.stage)?;
        Some(StageRecord {
            project_id: parse_uuid(&self.project_id),
            stage,
            created_at: self.created_at.map(timestamp_to_datetime),
            approved_at: self.approved_at.map(timestamp_to_datetime),
            office: self.office,
            remarks: self.remarks,
            is_submitted: self.is_submitted,
        })
    }
}

impl From<&StageRecord> for StageRow {
    fn from(record: &StageRecord) -> Self {
        Self {
            project_id: record.project_id.to_string(),
            stage: record.stage.as_str().to_string(),
            created_at: record.created_at.map(datetime_to_timestamp),
            approved_at: record.approved_at.map(datetime_to_timestamp),
            office: record.office.clone(),
            remarks: record.remarks.clone(),
            is_submitted: record.is_submitted,
        }
    }
}
