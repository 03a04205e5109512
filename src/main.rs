use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use lungscan::config::{ServiceConfig, WorkflowConfig};
use lungscan::models::SelectedFile;
use lungscan::pipeline::admission::{AdmissionGate, GeminiVisionClassifier};
use lungscan::services::Collaborators;
use lungscan::workflow::{UploadWorkflow, WorkflowPhase};

fn main() -> ExitCode {
    lungscan::init_tracing();

    let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) else {
        eprintln!("usage: lungscan <image-path>");
        return ExitCode::from(2);
    };

    match run(path) {
        Ok(WorkflowPhase::Rejected | WorkflowPhase::PredictionFailed) => ExitCode::FAILURE,
        Ok(_) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(path: PathBuf) -> Result<WorkflowPhase, String> {
    let services = ServiceConfig::from_env();
    let collaborators = Collaborators::from_config(&services).map_err(|e| e.to_string())?;
    let vision = GeminiVisionClassifier::from_config(&services).map_err(|e| e.to_string())?;
    let gate = AdmissionGate::new(Arc::new(vision));

    let file = SelectedFile::from_path(&path)
        .map_err(|e| format!("Cannot read {}: {e}", path.display()))?;

    let mut workflow = UploadWorkflow::new(WorkflowConfig::from_env());
    let verdict = workflow.admit_file(&gate, file);
    if let Some(reason) = verdict.reason() {
        println!("{}", reason.user_message());
    } else {
        workflow
            .request_prediction(collaborators.classifier.as_ref())
            .map_err(|e| e.user_message())?;
    }

    let snapshot = workflow.snapshot();
    let json = serde_json::to_string_pretty(&snapshot).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(snapshot.phase)
}
