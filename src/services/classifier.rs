//! Remote disease classifier: multipart image upload, JSON prediction back.

use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::Deserialize;

use super::http::{ensure_success, map_send_error, trim_url};
use super::ServiceError;
use crate::models::{ClassConfidence, ImageAsset, ModelInfo, PredictionResult};

/// Multipart field name the classifier reads the image from.
const FILE_FIELD: &str = "file";

/// Disease classifier abstraction (allows mocking for tests)
pub trait PredictionClient: Send + Sync {
    /// Classify an admitted image.
    fn predict(&self, asset: &ImageAsset) -> Result<PredictionResult, ServiceError>;

    /// Class names and held-out accuracy of the deployed model.
    fn model_info(&self) -> Result<ModelInfo, ServiceError>;
}

/// Response body from `POST /predict`
#[derive(Deserialize)]
struct PredictResponse {
    predicted_class: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    disease_confidences: Vec<ClassConfidence>,
}

/// Parse a classifier response body. A missing or blank label is an error.
pub fn parse_prediction(body: &str) -> Result<PredictionResult, ServiceError> {
    let parsed: PredictResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;

    let label = parsed
        .predicted_class
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or(ServiceError::MissingField("predicted_class"))?;

    Ok(PredictionResult {
        label,
        confidence: parsed.confidence.filter(|c| c.is_finite()),
        class_confidences: parsed.disease_confidences,
    })
}

/// Classifier reached over plain HTTP.
pub struct HttpPredictionClient {
    client: Client,
    predict_url: String,
    model_info_url: String,
    timeout_secs: u64,
}

impl HttpPredictionClient {
    pub fn new(
        predict_url: &str,
        model_info_url: &str,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        let client = super::http::build_client(timeout_secs, timeout_secs.min(10))?;
        Ok(Self::with_client(client, predict_url, model_info_url, timeout_secs))
    }

    pub fn with_client(
        client: Client,
        predict_url: &str,
        model_info_url: &str,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client,
            predict_url: trim_url(predict_url),
            model_info_url: trim_url(model_info_url),
            timeout_secs,
        }
    }
}

impl PredictionClient for HttpPredictionClient {
    fn predict(&self, asset: &ImageAsset) -> Result<PredictionResult, ServiceError> {
        let _span = tracing::info_span!(
            "prediction_request",
            asset_id = %asset.id(),
            size = asset.bytes().len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let part = Part::bytes(asset.bytes().to_vec())
            .file_name(asset.file_name().to_string())
            .mime_str(asset.media_type().as_str())
            .map_err(|e| ServiceError::Http(e.to_string()))?;
        let form = Form::new().part(FILE_FIELD, part);

        let response = self
            .client
            .post(&self.predict_url)
            .multipart(form)
            .send()
            .map_err(|e| map_send_error(e, &self.predict_url, self.timeout_secs))?;
        let body = ensure_success(response)?
            .text()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;
        let result = parse_prediction(&body)?;

        tracing::info!(
            label = %result.label,
            confidence = ?result.confidence,
            elapsed_ms = %start.elapsed().as_millis(),
            "Prediction received"
        );
        Ok(result)
    }

    fn model_info(&self) -> Result<ModelInfo, ServiceError> {
        let response = self
            .client
            .get(&self.model_info_url)
            .send()
            .map_err(|e| map_send_error(e, &self.model_info_url, self.timeout_secs))?;
        ensure_success(response)?
            .json::<ModelInfo>()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))
    }
}

/// Mock classifier for testing — returns a fixed result or fails.
pub struct MockPredictionClient {
    result: Option<PredictionResult>,
    calls: AtomicUsize,
}

impl MockPredictionClient {
    pub fn new(label: &str, confidence: Option<f64>) -> Self {
        Self {
            result: Some(PredictionResult::new(label, confidence)),
            calls: AtomicUsize::new(0),
        }
    }

    /// A classifier that always answers HTTP 500.
    pub fn failing() -> Self {
        Self {
            result: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PredictionClient for MockPredictionClient {
    fn predict(&self, _asset: &ImageAsset) -> Result<PredictionResult, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone().ok_or(ServiceError::Api {
            status: 500,
            body: "mock classifier failure".into(),
        })
    }

    fn model_info(&self) -> Result<ModelInfo, ServiceError> {
        let class_names = self
            .result
            .iter()
            .map(|r| r.label.clone())
            .collect();
        Ok(ModelInfo {
            class_names,
            test_accuracy: 0.9,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_response() {
        let body = r#"{
            "predicted_class": "Pneumonia",
            "confidence": 92.5,
            "disease_confidences": [
                {"disease": "Normal", "confidence": 7.5},
                {"disease": "Pneumonia", "confidence": 92.5}
            ]
        }"#;
        let result = parse_prediction(body).unwrap();
        assert_eq!(result.label, "Pneumonia");
        assert_eq!(result.confidence, Some(92.5));
        assert_eq!(result.class_confidences.len(), 2);
        assert_eq!(result.class_confidences[0].disease, "Normal");
    }

    #[test]
    fn parse_without_confidence() {
        let result = parse_prediction(r#"{"predicted_class": "Tuberculosis"}"#).unwrap();
        assert_eq!(result.label, "Tuberculosis");
        assert!(result.confidence.is_none());
        assert!(result.class_confidences.is_empty());
    }

    #[test]
    fn parse_missing_label_is_error() {
        let err = parse_prediction(r#"{"error": "No file uploaded"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MissingField("predicted_class")));
    }

    #[test]
    fn parse_blank_label_is_error() {
        let err = parse_prediction(r#"{"predicted_class": "   "}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MissingField(_)));
    }

    #[test]
    fn parse_invalid_json_is_error() {
        let err = parse_prediction("<html>oops</html>").unwrap_err();
        assert!(matches!(err, ServiceError::ResponseParsing(_)));
    }

    #[test]
    fn http_client_trims_urls() {
        let client = HttpPredictionClient::new(
            "http://localhost:5000/predict/",
            "http://localhost:5000/model_info/",
            30,
        )
        .unwrap();
        assert_eq!(client.predict_url, "http://localhost:5000/predict");
        assert_eq!(client.model_info_url, "http://localhost:5000/model_info");
    }

    #[test]
    fn mock_counts_calls() {
        let mock = MockPredictionClient::new("Normal", Some(88.0));
        let file = crate::models::SelectedFile::new("a.png", "image/png", vec![0; 4]);
        let asset = ImageAsset::new(file, crate::models::MediaType::Png, 1, 1);
        assert_eq!(mock.predict(&asset).unwrap().label, "Normal");
        assert_eq!(mock.predict(&asset).unwrap().label, "Normal");
        assert_eq!(mock.call_count(), 2);
    }

    #[test]
    fn failing_mock_returns_api_error() {
        let mock = MockPredictionClient::failing();
        let file = crate::models::SelectedFile::new("a.png", "image/png", vec![0; 4]);
        let asset = ImageAsset::new(file, crate::models::MediaType::Png, 1, 1);
        assert!(matches!(
            mock.predict(&asset),
            Err(ServiceError::Api { status: 500, .. })
        ));
    }

    #[test]
    fn trait_is_object_safe() {
        fn _assert(_: &dyn PredictionClient) {}
    }
}
