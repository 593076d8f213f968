use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    InProgress,
    Finished,
}

impl ProjectStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Project-level identifying fields and audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProjectHeader {
    pub id: Uuid,
    pub pr_number: String,
    pub details: String,
    pub created_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub edited_at: Option<DateTime<Utc>>,
    pub edited_by: Option<Uuid>,
    pub last_accessed_at: Option<DateTime<Utc>>,
    pub last_accessed_by: Option<Uuid>,
}

impl ProjectHeader {
    pub fn new(
        pr_number: impl Into<String>,
        details: impl Into<String>,
        created_by: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            pr_number: pr_number.into(),
            details: details.into(),
            created_at,
            created_by,
            edited_at: None,
            edited_by: None,
            last_accessed_at: None,
            last_accessed_by: None,
        }
    }

    /// The most recent of the edit and access stamps.
    ///
    /// An edit wins ties and is used when no access was recorded.
    pub fn last_activity(&self) -> Option<AuditStamp> {
        let edited = self
            .edited_at
            .zip(self.edited_by)
            .map(|(at, by)| AuditStamp { at, by });
        let accessed = self
            .last_accessed_at
            .zip(self.last_accessed_by)
            .map(|(at, by)| AuditStamp { at, by });

        match (edited, accessed) {
            (Some(e), Some(a)) if a.at > e.at => Some(a),
            (Some(e), _) => Some(e),
            (None, a) => a,
        }
    }

    pub fn apply(&self, update: &HeaderUpdate) -> Self {
        let mut next = self.clone();
        if let Some(fields) = &update.fields {
            next.pr_number = fields.pr_number.clone();
            next.details = fields.details.clone();
        }
        if let Some(stamp) = update.edited {
            next.edited_at = Some(stamp.at);
            next.edited_by = Some(stamp.by);
        }
        next.last_accessed_at = Some(update.accessed.at);
        next.last_accessed_by = Some(update.accessed.by);
        next
    }
}

/// Who did something, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct AuditStamp {
    pub at: DateTime<Utc>,
    pub by: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HeaderFields {
    pub pr_number: String,
    pub details: String,
}

/// Pending write against a project header row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderUpdate {
    pub fields: Option<HeaderFields>,
    /// `None` for a plain view, which only refreshes `accessed`.
    pub edited: Option<AuditStamp>,
    pub accessed: AuditStamp,
}

impl HeaderUpdate {
    pub fn edit(stamp: AuditStamp) -> Self {
        Self {
            fields: None,
            edited: Some(stamp),
            accessed: stamp,
        }
    }

    pub fn access(stamp: AuditStamp) -> Self {
        Self {
            fields: None,
            edited: None,
            accessed: stamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CreateProjectRequest {
    pub pr_number: String,
    pub details: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct UpdateProjectRequest {
    pub pr_number: String,
    pub details: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn header() -> ProjectHeader {
        ProjectHeader::new("PR-2024-001", "Office supplies", Uuid::new_v4(), Utc::now())
    }

    #[test]
    fn test_new_header_has_no_activity() {
        let header = header();
        assert!(header.edited_at.is_none());
        assert!(header.last_accessed_at.is_none());
        assert_eq!(header.last_activity(), None);
    }

    #[test]
    fn test_last_activity_prefers_edit_on_tie() {
        let mut header = header();
        let now = Utc::now();
        let editor = Uuid::new_v4();
        let viewer = Uuid::new_v4();
        header.edited_at = Some(now);
        header.edited_by = Some(editor);
        header.last_accessed_at = Some(now);
        header.last_accessed_by = Some(viewer);

        assert_eq!(header.last_activity().unwrap().by, editor);

        header.last_accessed_at = Some(now + Duration::minutes(5));
        assert_eq!(header.last_activity().unwrap().by, viewer);
    }

    #[test]
    fn test_last_activity_falls_back_to_access() {
        let mut header = header();
        let viewer = Uuid::new_v4();
        header.last_accessed_at = Some(Utc::now());
        header.last_accessed_by = Some(viewer);

        assert_eq!(header.last_activity().unwrap().by, viewer);
    }

    #[test]
    fn test_apply_access_keeps_edit_stamp() {
        let header = header();
        let stamp = AuditStamp {
            at: Utc::now(),
            by: Uuid::new_v4(),
        };
        let viewed = header.apply(&HeaderUpdate::access(stamp));

        assert!(viewed.edited_at.is_none());
        assert_eq!(viewed.last_accessed_by, Some(stamp.by));
        assert_eq!(viewed.pr_number, header.pr_number);
    }
}
