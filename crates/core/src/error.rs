use thiserror::Error;

use crate::domain::Stage;

/// Reasons a workflow operation is rejected. All are recoverable by the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    #[error("{}", missing_fields_message(.stage, .created_required))]
    MissingRequiredFields {
        /// `None` for header fields.
        stage: Option<Stage>,
        created_required: bool,
    },

    #[error("Stage '{stage}' is not eligible for submission (active stage: {})", display_or_none(.active))]
    StageNotEligible { stage: Stage, active: Option<Stage> },

    #[error("Stage '{stage}' is not the last submitted stage (last submitted: {})", display_or_none(.last))]
    NotLastSubmittedStage { stage: Stage, last: Option<Stage> },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),
}

impl WorkflowError {
    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied(reason.into())
    }

    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingRequiredFields { .. } => "missing_required_fields",
            Self::StageNotEligible { .. } => "stage_not_eligible",
            Self::NotLastSubmittedStage { .. } => "not_last_submitted_stage",
            Self::PermissionDenied(_) => "permission_denied",
        }
    }
}

fn missing_fields_message(stage: &Option<Stage>, created_required: &bool) -> String {
    match (stage, *created_required) {
        (Some(stage), true) => format!(
            "All fields (Created, Approved, Office, and Remark) are required for stage '{}' to be submitted.",
            stage
        ),
        (Some(stage), false) => format!(
            "All fields (Approved, Office, and Remark) are required for stage '{}' to be submitted.",
            stage
        ),
        (None, _) => "PR Number and Project Details are required.".to_string(),
    }
}

fn display_or_none(stage: &Option<Stage>) -> &'static str {
    stage.map(|s| s.display_name()).unwrap_or("none")
}
