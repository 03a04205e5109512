//! The upload workflow state machine.
//!
//! Remote work is split into begin/complete pairs so a caller may run the
//! collaborator call elsewhere and hand the result back later. Every
//! in-flight operation is keyed by a `SelectionId`; a result whose id no
//! longer matches the current state is discarded.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::chat_room::ChatSession;
use super::questionnaire::QuestionnaireSession;
use super::report_form::{ReportForm, ReportRequestBuilder};
use super::state::{WorkflowPhase, WorkflowSnapshot, WorkflowState};
use super::WorkflowError;
use crate::config::WorkflowConfig;
use crate::models::{AdmissionVerdict, ImageAsset, PredictionResult, SelectedFile};
use crate::pipeline::admission::{AdmissionGate, AdmissionOutcome};
use crate::services::{PredictionClient, ReportDocument, ServiceError};

/// Monotonic identifier of one file selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SelectionId(pub(crate) u64);

impl std::fmt::Display for SelectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a completed operation changed the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    /// The result belonged to a selection that has since been replaced.
    Stale,
}

/// Handle for one outstanding prediction request.
#[derive(Debug, Clone)]
pub struct PredictionTicket {
    selection: SelectionId,
    asset: ImageAsset,
}

impl PredictionTicket {
    pub fn selection(&self) -> SelectionId {
        self.selection
    }

    pub fn asset(&self) -> &ImageAsset {
        &self.asset
    }
}

pub struct UploadWorkflow {
    state: WorkflowState,
    config: WorkflowConfig,
    last_selection: u64,
}

impl Default for UploadWorkflow {
    fn default() -> Self {
        Self::new(WorkflowConfig::default())
    }
}

impl UploadWorkflow {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            state: WorkflowState::Idle,
            config,
            last_selection: 0,
        }
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.state.phase()
    }

    pub fn snapshot(&self) -> WorkflowSnapshot {
        self.state.snapshot()
    }

    pub fn asset(&self) -> Option<&ImageAsset> {
        self.state.asset()
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.state.prediction()
    }

    pub fn can_submit_prediction(&self) -> bool {
        self.state.can_submit_prediction()
    }

    fn next_selection(&mut self) -> SelectionId {
        self.last_selection += 1;
        SelectionId(self.last_selection)
    }

    fn transition(&mut self, next: WorkflowState) {
        let from = self.state.phase();
        let to = next.phase();
        self.state = next;
        debug!(from = %from, to = %to, "Workflow transition");
    }

    // ──────────────────────────────────────────────
    // Selection and admission
    // ──────────────────────────────────────────────

    /// Start admission of a newly selected file. Legal from every state;
    /// anything tied to the previous selection is dropped.
    pub fn select_file(&mut self, file_name: &str) -> SelectionId {
        let selection = self.next_selection();
        info!(selection = %selection, file = %file_name, "File selected");
        self.transition(WorkflowState::Validating {
            selection,
            file_name: file_name.to_string(),
        });
        selection
    }

    /// Apply the gate's outcome for `selection`.
    pub fn apply_admission(
        &mut self,
        selection: SelectionId,
        outcome: AdmissionOutcome,
    ) -> Completion {
        match &self.state {
            WorkflowState::Validating { selection: current, .. } if *current == selection => {}
            _ => {
                debug!(
                    selection = %selection,
                    phase = %self.phase(),
                    "Discarding stale admission result"
                );
                return Completion::Stale;
            }
        }

        let next = match outcome {
            AdmissionOutcome::Accepted(asset) => WorkflowState::Admitted { selection, asset },
            AdmissionOutcome::Rejected(reason) => WorkflowState::Rejected { reason },
        };
        self.transition(next);
        Completion::Applied
    }

    /// Select and admit a file synchronously.
    pub fn admit_file(&mut self, gate: &AdmissionGate, file: SelectedFile) -> AdmissionVerdict {
        let selection = self.select_file(&file.file_name);
        let outcome = gate.admit(file);
        let verdict = outcome.verdict();
        self.apply_admission(selection, outcome);
        verdict
    }

    // ──────────────────────────────────────────────
    // Prediction
    // ──────────────────────────────────────────────

    /// Move `Admitted` to `Predicting`. Refused in every other state.
    pub fn begin_prediction(&mut self) -> Result<PredictionTicket, WorkflowError> {
        let (selection, asset) = match &self.state {
            WorkflowState::Admitted { selection, asset } => (*selection, asset.clone()),
            other => {
                return Err(WorkflowError::SubmissionDisabled {
                    phase: other.phase(),
                })
            }
        };

        self.transition(WorkflowState::Predicting {
            selection,
            asset: asset.clone(),
        });
        Ok(PredictionTicket { selection, asset })
    }

    /// Apply the classifier's answer for `ticket`.
    pub fn complete_prediction(
        &mut self,
        ticket: PredictionTicket,
        result: Result<PredictionResult, ServiceError>,
    ) -> Completion {
        match &self.state {
            WorkflowState::Predicting { selection, .. } if *selection == ticket.selection => {}
            _ => {
                debug!(
                    selection = %ticket.selection,
                    phase = %self.phase(),
                    "Discarding stale prediction"
                );
                return Completion::Stale;
            }
        }

        let asset = ticket.asset;
        let prediction = match result {
            Ok(prediction) if !prediction.is_failure() => prediction,
            Ok(prediction) => {
                warn!(label = %prediction.label, "Classifier returned no usable label");
                return self.fail_prediction(asset);
            }
            Err(e) => {
                warn!(error = %e, "Prediction request failed");
                return self.fail_prediction(asset);
            }
        };

        info!(
            label = %prediction.label,
            confidence = ?prediction.confidence,
            "Prediction ready"
        );
        self.transition(WorkflowState::PredictionReady {
            asset: asset.clone(),
            prediction: prediction.clone(),
        });
        self.route_prediction(asset, prediction);
        Completion::Applied
    }

    fn fail_prediction(&mut self, asset: ImageAsset) -> Completion {
        self.transition(WorkflowState::PredictionFailed {
            asset,
            prediction: PredictionResult::failed(),
        });
        Completion::Applied
    }

    /// Healthy scans go straight to the assistant; anything else offers a report.
    fn route_prediction(&mut self, asset: ImageAsset, prediction: PredictionResult) {
        let next = if prediction.label == self.config.healthy_label {
            WorkflowState::Conversation {
                asset,
                prediction,
                chat: ChatSession::new(),
            }
        } else {
            WorkflowState::AwaitingReportChoice { asset, prediction }
        };
        self.transition(next);
    }

    /// Submit the admitted image and apply the answer synchronously.
    pub fn request_prediction(
        &mut self,
        client: &dyn PredictionClient,
    ) -> Result<WorkflowPhase, WorkflowError> {
        let ticket = self.begin_prediction()?;
        let result = client.predict(ticket.asset());
        self.complete_prediction(ticket, result);
        Ok(self.phase())
    }

    // ──────────────────────────────────────────────
    // Branches
    // ──────────────────────────────────────────────

    /// Answer the "generate a report?" prompt.
    pub fn choose_report(&mut self, wants_report: bool) -> Result<WorkflowPhase, WorkflowError> {
        let (asset, prediction) = match &self.state {
            WorkflowState::AwaitingReportChoice { asset, prediction } => {
                (asset.clone(), prediction.clone())
            }
            other => {
                return Err(WorkflowError::InvalidAction {
                    action: "choose_report",
                    phase: other.phase(),
                })
            }
        };

        let next = if wants_report {
            WorkflowState::CollectingReport {
                asset,
                prediction,
                form: ReportForm::default(),
            }
        } else {
            WorkflowState::Questionnaire {
                asset,
                prediction,
                session: QuestionnaireSession::new(),
            }
        };
        self.transition(next);
        Ok(self.phase())
    }

    pub fn report_form_mut(&mut self) -> Result<&mut ReportForm, WorkflowError> {
        let phase = self.phase();
        match &mut self.state {
            WorkflowState::CollectingReport { form, .. } => Ok(form),
            _ => Err(WorkflowError::InvalidAction {
                action: "edit_report",
                phase,
            }),
        }
    }

    /// Generate the report. Failures leave the form and prediction in place.
    pub fn submit_report(
        &mut self,
        builder: &ReportRequestBuilder,
        uid: Option<&str>,
    ) -> Result<ReportDocument, WorkflowError> {
        let phase = self.phase();
        match &mut self.state {
            WorkflowState::CollectingReport { prediction, form, .. } => {
                let document = builder.submit(form, prediction, uid)?;
                info!("Report generated, form cleared");
                Ok(document)
            }
            _ => Err(WorkflowError::InvalidAction {
                action: "submit_report",
                phase,
            }),
        }
    }

    pub fn questionnaire_mut(&mut self) -> Result<&mut QuestionnaireSession, WorkflowError> {
        let phase = self.phase();
        match &mut self.state {
            WorkflowState::Questionnaire { session, .. } => Ok(session),
            _ => Err(WorkflowError::InvalidAction {
                action: "questionnaire",
                phase,
            }),
        }
    }

    pub fn chat_mut(&mut self) -> Result<&mut ChatSession, WorkflowError> {
        let phase = self.phase();
        match &mut self.state {
            WorkflowState::Conversation { chat, .. } => Ok(chat),
            _ => Err(WorkflowError::InvalidAction {
                action: "chat",
                phase,
            }),
        }
    }

    /// External reset (e.g. leaving the upload tab). Clears everything and
    /// invalidates any in-flight result.
    pub fn reset(&mut self) {
        self.last_selection += 1;
        info!(phase = %self.phase(), "Workflow reset");
        self.transition(WorkflowState::Idle);
    }
}
