use serde::{Deserialize, Serialize};

/// Label surfaced when the classifier could not be reached or answered badly.
pub const PREDICTION_FAILED_LABEL: &str = "Prediction Failed";

/// Confidence for one class, as reported by the classifier (percent).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassConfidence {
    pub disease: String,
    pub confidence: f64,
}

/// Disease prediction for an admitted image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: String,
    /// Percent in 0..=100. Absent when the classifier omits it.
    pub confidence: Option<f64>,
    #[serde(default)]
    pub class_confidences: Vec<ClassConfidence>,
}

impl PredictionResult {
    pub fn new(label: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            label: label.into(),
            confidence,
            class_confidences: Vec::new(),
        }
    }

    /// Sentinel result for a failed prediction request.
    pub fn failed() -> Self {
        Self::new(PREDICTION_FAILED_LABEL, None)
    }

    pub fn is_failure(&self) -> bool {
        self.label == PREDICTION_FAILED_LABEL || self.label.trim().is_empty()
    }

    /// "92.50%" style rendering, `None` when the classifier sent no confidence.
    pub fn confidence_display(&self) -> Option<String> {
        self.confidence.map(|c| format!("{c:.2}%"))
    }
}

/// Classifier metadata from `GET /model_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub class_names: Vec<String>,
    pub test_accuracy: f64,
}
