pub mod enums;
pub mod prediction;
pub mod upload;
pub mod verdict;

pub use enums::{MediaType, RejectionReason, UnknownVariant};
pub use prediction::{ClassConfidence, ModelInfo, PredictionResult, PREDICTION_FAILED_LABEL};
pub use upload::{AssetSummary, ImageAsset, SelectedFile};
pub use verdict::AdmissionVerdict;
