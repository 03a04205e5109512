use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info, warn};

use super::heuristics::{ContrastHeuristic, GrayscaleHeuristic};
use super::sampler::sample_image;
use super::semantic::SemanticImageClassifier;
use super::AdmissionError;
use crate::models::{AdmissionVerdict, ImageAsset, MediaType, RejectionReason, SelectedFile};

/// Maximum upload size before rejecting.
/// Prevents OOM on corrupt/adversarial files.
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50 MB

/// Smallest valid PNG (1x1 pixel).
const MIN_IMAGE_BYTES: usize = 67;

/// Result of running one selected file through the gate.
#[derive(Debug, Clone)]
pub enum AdmissionOutcome {
    Accepted(ImageAsset),
    Rejected(RejectionReason),
}

impl AdmissionOutcome {
    pub fn verdict(&self) -> AdmissionVerdict {
        match self {
            Self::Accepted(_) => AdmissionVerdict::Accepted,
            Self::Rejected(reason) => AdmissionVerdict::from(*reason),
        }
    }
}

/// Ordered admission pipeline. Later stages never run once an earlier one
/// rejects; in particular the remote classifier is only called for images
/// that already passed both pixel heuristics.
pub struct AdmissionGate {
    grayscale: GrayscaleHeuristic,
    contrast: ContrastHeuristic,
    semantic: Arc<dyn SemanticImageClassifier>,
}

impl AdmissionGate {
    pub fn new(semantic: Arc<dyn SemanticImageClassifier>) -> Self {
        Self {
            grayscale: GrayscaleHeuristic::default(),
            contrast: ContrastHeuristic::default(),
            semantic,
        }
    }

    pub fn with_heuristics(
        mut self,
        grayscale: GrayscaleHeuristic,
        contrast: ContrastHeuristic,
    ) -> Self {
        self.grayscale = grayscale;
        self.contrast = contrast;
        self
    }

    pub fn admit(&self, file: SelectedFile) -> AdmissionOutcome {
        let file_name = file.file_name.clone();
        match self.run(file) {
            Ok(asset) => {
                info!(
                    file = %file_name,
                    asset_id = %asset.id(),
                    width = asset.width(),
                    height = asset.height(),
                    "Image admitted"
                );
                AdmissionOutcome::Accepted(asset)
            }
            Err(reason) => {
                info!(file = %file_name, reason = reason.as_str(), "Image rejected");
                AdmissionOutcome::Rejected(reason)
            }
        }
    }

    fn run(&self, file: SelectedFile) -> Result<ImageAsset, RejectionReason> {
        // 1. Media type allow-list, before touching the bytes
        let media_type = check_media_type(&file.declared_type).map_err(|e| {
            debug!(error = %e, "Media type check failed");
            e.reason()
        })?;

        // 2. Decoding belongs to the grayscale stage
        let image = decode(&file.bytes).map_err(|e| {
            debug!(error = %e, "Decode failed");
            e.reason()
        })?;
        let (width, height) = image.dimensions();

        // 2 + 3. One sample feeds both heuristics
        let sample = sample_image(&image);
        drop(image);

        let gray = self.grayscale.evaluate(&sample);
        debug!(
            samples = gray.total_pixels,
            gray_ratio = gray.gray_ratio,
            "Grayscale heuristic"
        );
        if !gray.is_grayscale {
            return Err(RejectionReason::NotGrayscale);
        }

        let contrast = self.contrast.evaluate(&sample);
        debug!(
            min = contrast.min,
            max = contrast.max,
            range = contrast.range,
            "Contrast heuristic"
        );
        if !contrast.sufficient {
            return Err(RejectionReason::LowContrast);
        }

        // 4. Remote semantic check
        let asset = ImageAsset::new(file, media_type, width, height);
        match self.semantic.is_radiograph(&asset) {
            Ok(true) => Ok(asset),
            Ok(false) => Err(RejectionReason::NotRadiograph),
            Err(e) => {
                let err = AdmissionError::from(e);
                warn!(error = %err, "Semantic check unavailable");
                Err(err.reason())
            }
        }
    }
}

fn check_media_type(declared: &str) -> Result<MediaType, AdmissionError> {
    MediaType::from_declared(declared)
        .ok_or_else(|| AdmissionError::UnsupportedType(declared.to_string()))
}

/// Decode by content sniffing, as a browser image element does; the declared
/// type only gates entry.
fn decode(bytes: &[u8]) -> Result<DynamicImage, AdmissionError> {
    if bytes.len() < MIN_IMAGE_BYTES {
        return Err(AdmissionError::TooSmall(bytes.len()));
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AdmissionError::TooLarge {
            size: bytes.len(),
            limit_mb: MAX_IMAGE_BYTES / (1024 * 1024),
        });
    }
    image::load_from_memory(bytes).map_err(|e| AdmissionError::Decode(e.to_string()))
}
