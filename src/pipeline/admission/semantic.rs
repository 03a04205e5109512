//! Remote "is this a radiograph?" check against a vision-capable
//! text-generation API.
//!
//! Contract: one single-turn request carrying a fixed instruction plus the
//! inlined base64 image; the verdict is read from the first candidate's
//! first text part. `Ok(false)` is a clean negative (quality rejection),
//! `Err(_)` means the service could not answer (availability problem).

use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine as _;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::config::ServiceConfig;
use crate::models::ImageAsset;
use crate::services::http::{build_client, ensure_success, map_send_error, trim_url};
use crate::services::ServiceError;

/// Instruction sent alongside the image.
pub const DETECTION_PROMPT: &str =
    "Is this image a chest X-ray? Respond only with 'true' or 'false'.";

/// Parses the model's free-text answer into a verdict.
pub type VerdictParser = fn(&str) -> bool;

/// Default parsing rule: case-insensitive substring match on "true".
/// Anything else (including "false", "maybe", empty) is a negative.
pub fn contains_true(text: &str) -> bool {
    text.to_lowercase().contains("true")
}

/// Semantic image classifier abstraction (allows mocking for tests)
pub trait SemanticImageClassifier: Send + Sync {
    fn is_radiograph(&self, asset: &ImageAsset) -> Result<bool, ServiceError>;
}

// ──────────────────────────────────────────────
// Wire types
// ──────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

fn build_request(asset: &ImageAsset) -> GenerateContentRequest {
    let data = base64::engine::general_purpose::STANDARD.encode(asset.bytes());
    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![
                RequestPart::Text {
                    text: DETECTION_PROMPT.to_string(),
                },
                RequestPart::Inline {
                    inline_data: InlineData {
                        mime_type: asset.media_type().as_str().to_string(),
                        data,
                    },
                },
            ],
        }],
    }
}

/// First candidate's first text part, empty when the response has none.
fn first_candidate_text(response: &GenerateContentResponse) -> &str {
    response
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.as_deref())
        .unwrap_or("")
}

/// Parse a 2xx response body into a verdict. Malformed JSON is an error;
/// a well-formed body without candidate text is a clean negative.
pub fn parse_verdict(body: &str, parser: VerdictParser) -> Result<bool, ServiceError> {
    let response: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;
    Ok(parser(first_candidate_text(&response)))
}

// ──────────────────────────────────────────────
// GeminiVisionClassifier
// ──────────────────────────────────────────────

/// Production classifier backed by the Gemini `generateContent` API.
pub struct GeminiVisionClassifier {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    timeout_secs: u64,
    parser: VerdictParser,
}

impl GeminiVisionClassifier {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout_secs: u64,
    ) -> Result<Self, ServiceError> {
        let client = build_client(timeout_secs, timeout_secs.min(10))?;
        Ok(Self {
            client,
            endpoint: trim_url(endpoint),
            model: model.to_string(),
            api_key,
            timeout_secs,
            parser: contains_true,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = build_client(config.timeout_secs, config.connect_timeout_secs)?;
        Ok(Self {
            client,
            endpoint: trim_url(&config.vision_endpoint),
            model: config.vision_model.clone(),
            api_key: config.vision_api_key.clone(),
            timeout_secs: config.timeout_secs,
            parser: contains_true,
        })
    }

    /// Swap the answer-parsing rule.
    pub fn with_verdict_parser(mut self, parser: VerdictParser) -> Self {
        self.parser = parser;
        self
    }

    /// Request URL without credentials.
    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

impl SemanticImageClassifier for GeminiVisionClassifier {
    fn is_radiograph(&self, asset: &ImageAsset) -> Result<bool, ServiceError> {
        let _span = tracing::info_span!(
            "semantic_check",
            model = %self.model,
            asset_id = %asset.id(),
            image_size = asset.bytes().len(),
        )
        .entered();
        let start = std::time::Instant::now();

        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ServiceError::NotConfigured("GEMINI_API_KEY"))?;
        let url = self.url();

        let response = self
            .client
            .post(&url)
            .query(&[("key", api_key)])
            .json(&build_request(asset))
            .send()
            .map_err(|e| map_send_error(e, &url, self.timeout_secs))?;
        let body = ensure_success(response)?
            .text()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;
        let verdict = parse_verdict(&body, self.parser)?;

        tracing::info!(
            verdict,
            elapsed_ms = %start.elapsed().as_millis(),
            "Semantic check complete"
        );
        Ok(verdict)
    }
}

// ──────────────────────────────────────────────
// MockSemanticClassifier (testing)
// ──────────────────────────────────────────────

/// Mock classifier: fixed verdict or unavailable, counts calls.
pub struct MockSemanticClassifier {
    verdict: Option<bool>,
    calls: AtomicUsize,
}

impl MockSemanticClassifier {
    pub fn new(verdict: bool) -> Self {
        Self {
            verdict: Some(verdict),
            calls: AtomicUsize::new(0),
        }
    }

    /// A classifier whose transport always fails.
    pub fn unavailable() -> Self {
        Self {
            verdict: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SemanticImageClassifier for MockSemanticClassifier {
    fn is_radiograph(&self, _asset: &ImageAsset) -> Result<bool, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.verdict
            .ok_or_else(|| ServiceError::NotReachable("mock://vision".into()))
    }
}
