use serde::Serialize;

use super::chat_room::ChatSession;
use super::questionnaire::QuestionnaireSession;
use super::report_form::ReportForm;
use super::upload::SelectionId;
use crate::models::{AssetSummary, ImageAsset, PredictionResult, RejectionReason};

/// Discriminant of `WorkflowState`, for logging and serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowPhase {
    Idle,
    Validating,
    Admitted,
    Rejected,
    Predicting,
    PredictionReady,
    PredictionFailed,
    AwaitingReportChoice,
    CollectingReport,
    Questionnaire,
    Conversation,
}

impl WorkflowPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Admitted => "admitted",
            Self::Rejected => "rejected",
            Self::Predicting => "predicting",
            Self::PredictionReady => "prediction_ready",
            Self::PredictionFailed => "prediction_failed",
            Self::AwaitingReportChoice => "awaiting_report_choice",
            Self::CollectingReport => "collecting_report",
            Self::Questionnaire => "questionnaire",
            Self::Conversation => "conversation",
        }
    }
}

impl std::fmt::Display for WorkflowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single owned session state. Each variant carries exactly the data
/// that is meaningful in it, so an asset, verdict, prediction, form or
/// questionnaire cannot outlive the phase it belongs to.
#[derive(Debug, Clone, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Validating {
        selection: SelectionId,
        file_name: String,
    },
    Admitted {
        selection: SelectionId,
        asset: ImageAsset,
    },
    Rejected {
        reason: RejectionReason,
    },
    Predicting {
        selection: SelectionId,
        asset: ImageAsset,
    },
    PredictionReady {
        asset: ImageAsset,
        prediction: PredictionResult,
    },
    /// Terminal for the submission; `prediction` is the failure sentinel.
    PredictionFailed {
        asset: ImageAsset,
        prediction: PredictionResult,
    },
    AwaitingReportChoice {
        asset: ImageAsset,
        prediction: PredictionResult,
    },
    CollectingReport {
        asset: ImageAsset,
        prediction: PredictionResult,
        form: ReportForm,
    },
    Questionnaire {
        asset: ImageAsset,
        prediction: PredictionResult,
        session: QuestionnaireSession,
    },
    Conversation {
        asset: ImageAsset,
        prediction: PredictionResult,
        chat: ChatSession,
    },
}

impl WorkflowState {
    pub fn phase(&self) -> WorkflowPhase {
        match self {
            Self::Idle => WorkflowPhase::Idle,
            Self::Validating { .. } => WorkflowPhase::Validating,
            Self::Admitted { .. } => WorkflowPhase::Admitted,
            Self::Rejected { .. } => WorkflowPhase::Rejected,
            Self::Predicting { .. } => WorkflowPhase::Predicting,
            Self::PredictionReady { .. } => WorkflowPhase::PredictionReady,
            Self::PredictionFailed { .. } => WorkflowPhase::PredictionFailed,
            Self::AwaitingReportChoice { .. } => WorkflowPhase::AwaitingReportChoice,
            Self::CollectingReport { .. } => WorkflowPhase::CollectingReport,
            Self::Questionnaire { .. } => WorkflowPhase::Questionnaire,
            Self::Conversation { .. } => WorkflowPhase::Conversation,
        }
    }

    pub fn asset(&self) -> Option<&ImageAsset> {
        match self {
            Self::Idle | Self::Validating { .. } | Self::Rejected { .. } => None,
            Self::Admitted { asset, .. }
            | Self::Predicting { asset, .. }
            | Self::PredictionReady { asset, .. }
            | Self::PredictionFailed { asset, .. }
            | Self::AwaitingReportChoice { asset, .. }
            | Self::CollectingReport { asset, .. }
            | Self::Questionnaire { asset, .. }
            | Self::Conversation { asset, .. } => Some(asset),
        }
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        match self {
            Self::PredictionReady { prediction, .. }
            | Self::PredictionFailed { prediction, .. }
            | Self::AwaitingReportChoice { prediction, .. }
            | Self::CollectingReport { prediction, .. }
            | Self::Questionnaire { prediction, .. }
            | Self::Conversation { prediction, .. } => Some(prediction),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<RejectionReason> {
        match self {
            Self::Rejected { reason } => Some(*reason),
            _ => None,
        }
    }

    /// Prediction submission is enabled only for an admitted image.
    pub fn can_submit_prediction(&self) -> bool {
        matches!(self, Self::Admitted { .. })
    }

    /// A remote call is outstanding.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Validating { .. } | Self::Predicting { .. })
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        let prediction = self.prediction().cloned();
        WorkflowSnapshot {
            phase: self.phase(),
            asset: self.asset().map(ImageAsset::summary),
            rejection: self.rejection(),
            rejection_message: self.rejection().map(|r| r.user_message()),
            confidence_display: prediction.as_ref().and_then(PredictionResult::confidence_display),
            prediction,
            can_submit_prediction: self.can_submit_prediction(),
            busy: self.is_busy(),
        }
    }
}

/// Serializable view of the workflow for a front end.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowSnapshot {
    pub phase: WorkflowPhase,
    pub asset: Option<AssetSummary>,
    pub rejection: Option<RejectionReason>,
    pub rejection_message: Option<&'static str>,
    pub prediction: Option<PredictionResult>,
    pub confidence_display: Option<String>,
    pub can_submit_prediction: bool,
    pub busy: bool,
}
