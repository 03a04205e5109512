//! Post-upload workflow: the state machine that sequences
//! select → admit → predict → branch, and the three branch flows
//! (report form, questionnaire, assistant conversation).

pub mod chat_room;
pub mod questionnaire;
pub mod report_form;
pub mod state;
pub mod upload;

use thiserror::Error;

use crate::services::ServiceError;

pub use chat_room::{ChatMessage, ChatSession, Speaker};
pub use questionnaire::{Advance, QuestionnaireSession, RecommendationDisplay, QUESTIONS};
pub use report_form::{ReportForm, ReportRequestBuilder};
pub use state::{WorkflowPhase, WorkflowSnapshot, WorkflowState};
pub use upload::{Completion, PredictionTicket, SelectionId, UploadWorkflow};

/// Shown when report generation fails for any reason.
pub const REPORT_FAILED_MESSAGE: &str = "Failed to generate/download report";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Report field '{0}' is empty")]
    MissingField(&'static str),

    #[error("No diagnosis available for the report")]
    MissingDiagnosis,

    #[error("Report generation failed: {0}")]
    Service(#[from] ServiceError),
}

impl ReportError {
    pub fn user_message(&self) -> String {
        match self {
            Self::MissingField(field) => format!("Please fill in the {field} field."),
            Self::MissingDiagnosis => "A diagnosis is required before generating a report.".into(),
            Self::Service(_) => REPORT_FAILED_MESSAGE.into(),
        }
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QuestionnaireError {
    #[error("Answer to question {} is empty", index + 1)]
    EmptyAnswer { index: usize },

    #[error("Questionnaire was already submitted")]
    AlreadySubmitted,

    #[error("No recommendation request is pending")]
    NotSubmitting,
}

impl QuestionnaireError {
    pub fn user_message(&self) -> String {
        match self {
            Self::EmptyAnswer { .. } => "Please answer the question before continuing.".into(),
            Self::AlreadySubmitted => "The questionnaire has already been submitted.".into(),
            Self::NotSubmitting => "There is no pending recommendation.".into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum WorkflowError {
    #[error("Prediction cannot be requested while {phase}")]
    SubmissionDisabled { phase: WorkflowPhase },

    #[error("'{action}' is not allowed while {phase}")]
    InvalidAction {
        action: &'static str,
        phase: WorkflowPhase,
    },

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Questionnaire(#[from] QuestionnaireError),
}

impl WorkflowError {
    pub fn user_message(&self) -> String {
        match self {
            Self::SubmissionDisabled { .. } => "Please upload a valid X-ray image first.".into(),
            Self::InvalidAction { .. } => "That action is not available right now.".into(),
            Self::Report(e) => e.user_message(),
            Self::Questionnaire(e) => e.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_service_failure_has_single_message() {
        let err = ReportError::from(ServiceError::Timeout(5));
        assert_eq!(err.user_message(), REPORT_FAILED_MESSAGE);
        let err = ReportError::from(ServiceError::Api {
            status: 500,
            body: "boom".into(),
        });
        assert_eq!(err.user_message(), REPORT_FAILED_MESSAGE);
    }

    #[test]
    fn empty_answer_is_one_based_in_display() {
        let err = QuestionnaireError::EmptyAnswer { index: 0 };
        assert_eq!(err.to_string(), "Answer to question 1 is empty");
    }

    #[test]
    fn workflow_error_names_phase() {
        let err = WorkflowError::SubmissionDisabled {
            phase: WorkflowPhase::Rejected,
        };
        assert_eq!(err.to_string(), "Prediction cannot be requested while rejected");
    }

    #[test]
    fn nested_errors_keep_their_messages() {
        let err = WorkflowError::from(ReportError::MissingField("phone"));
        assert_eq!(err.user_message(), "Please fill in the phone field.");
    }
}
