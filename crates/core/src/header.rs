use chrono::{DateTime, Utc};

use crate::domain::{
    Actor, AuditStamp, CreateProjectRequest, HeaderFields, HeaderUpdate, ProjectHeader, StageSet,
    UpdateProjectRequest,
};
use crate::error::WorkflowError;
use crate::workflow::StageWorkflowEngine;

/// A freshly created project, ready to be inserted as one unit.
#[derive(Debug, Clone)]
pub struct NewProject {
    pub header: ProjectHeader,
    pub stages: StageSet,
}

pub struct ProjectHeaderManager;

impl ProjectHeaderManager {
    pub fn create_project(
        actor: &Actor,
        input: &CreateProjectRequest,
        now: DateTime<Utc>,
    ) -> Result<NewProject, WorkflowError> {
        let fields = Self::required_fields(&input.pr_number, &input.details)?;
        let header = ProjectHeader::new(fields.pr_number, fields.details, actor.user_id, now);
        let stages = StageWorkflowEngine::ensure_initialized(header.id, Vec::new(), now).stages;

        Ok(NewProject { header, stages })
    }

    /// Admin-only edit of PR number and details; also refreshes the access stamp.
    pub fn update_header(
        actor: &Actor,
        input: &UpdateProjectRequest,
        now: DateTime<Utc>,
    ) -> Result<HeaderUpdate, WorkflowError> {
        if !actor.is_admin {
            return Err(WorkflowError::permission_denied(
                "You do not have permission to update project details.",
            ));
        }

        let fields = Self::required_fields(&input.pr_number, &input.details)?;
        let mut update = HeaderUpdate::edit(AuditStamp {
            at: now,
            by: actor.user_id,
        });
        update.fields = Some(fields);
        Ok(update)
    }

    pub fn authorize_delete(actor: &Actor) -> Result<(), WorkflowError> {
        if actor.is_admin {
            Ok(())
        } else {
            Err(WorkflowError::permission_denied(
                "only administrators can delete projects",
            ))
        }
    }

    pub fn touch(actor: &Actor, now: DateTime<Utc>) -> HeaderUpdate {
        HeaderUpdate::access(AuditStamp {
            at: now,
            by: actor.user_id,
        })
    }

    fn required_fields(pr_number: &str, details: &str) -> Result<HeaderFields, WorkflowError> {
        let pr_number = pr_number.trim();
        let details = details.trim();
        if pr_number.is_empty() || details.is_empty() {
            return Err(WorkflowError::MissingRequiredFields {
                stage: None,
                created_required: false,
            });
        }

        Ok(HeaderFields {
            pr_number: pr_number.to_string(),
            details: details.to_string(),
        })
    }
}
