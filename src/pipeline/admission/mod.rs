//! Image admission: decides whether an uploaded file is plausibly a chest
//! radiograph before the expensive disease classifier is called.
//!
//! Stages, cheapest first, short-circuiting on the first failure:
//! 1. media type allow-list (no decoding)
//! 2. grayscale heuristic (a file that cannot be decoded fails here)
//! 3. contrast heuristic
//! 4. remote semantic check
//!
//! Stages 2 and 3 share one `PixelSample`.

pub mod gate;
pub mod heuristics;
pub mod sampler;
pub mod semantic;

use thiserror::Error;

use crate::models::RejectionReason;
use crate::services::ServiceError;

pub use gate::{AdmissionGate, AdmissionOutcome};
pub use heuristics::{ContrastHeuristic, ContrastReport, GrayscaleHeuristic, GrayscaleReport};
pub use sampler::{sample_grid, sample_image, sample_rgb, PixelSample, MAX_SAMPLES};
pub use semantic::{
    contains_true, GeminiVisionClassifier, MockSemanticClassifier, SemanticImageClassifier,
    VerdictParser,
};

#[derive(Error, Debug)]
pub enum AdmissionError {
    #[error("Unsupported media type: '{0}'")]
    UnsupportedType(String),

    #[error("Image data too small to be valid ({0} bytes)")]
    TooSmall(usize),

    #[error("Image data exceeds {limit_mb}MB limit ({size} bytes)")]
    TooLarge { size: usize, limit_mb: usize },

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Semantic check failed: {0}")]
    Classifier(#[from] ServiceError),
}

impl AdmissionError {
    /// Rejection reason this failure surfaces as.
    pub fn reason(&self) -> RejectionReason {
        match self {
            Self::UnsupportedType(_) => RejectionReason::InvalidType,
            // Unreadable pixels fail the stage that reads them.
            Self::TooSmall(_) | Self::TooLarge { .. } | Self::Decode(_) => {
                RejectionReason::NotGrayscale
            }
            Self::Classifier(_) => RejectionReason::ClassifierError,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_surface_as_not_grayscale() {
        assert_eq!(
            AdmissionError::Decode("bad".into()).reason(),
            RejectionReason::NotGrayscale
        );
        assert_eq!(AdmissionError::TooSmall(3).reason(), RejectionReason::NotGrayscale);
        let too_large = AdmissionError::TooLarge {
            size: 60 * 1024 * 1024,
            limit_mb: 50,
        };
        assert_eq!(too_large.reason(), RejectionReason::NotGrayscale);
    }

    #[test]
    fn unsupported_type_surfaces_as_invalid_type() {
        assert_eq!(
            AdmissionError::UnsupportedType("image/tiff".into()).reason(),
            RejectionReason::InvalidType
        );
    }

    #[test]
    fn classifier_failures_surface_as_classifier_error() {
        let err = AdmissionError::from(ServiceError::Timeout(30));
        assert_eq!(err.reason(), RejectionReason::ClassifierError);
    }
}
