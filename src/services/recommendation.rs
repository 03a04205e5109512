//! Recommendation collaborator: questionnaire answers in, advice text out.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::http::{map_send_error, trim_url};
use super::ServiceError;

#[derive(Serialize)]
struct RecommendationRequest<'a> {
    answers: &'a [String],
}

#[derive(Deserialize, Default)]
struct RecommendationResponse {
    recommendation: Option<String>,
    error: Option<String>,
}

/// Recommendation engine abstraction (allows mocking for tests)
pub trait RecommendationClient: Send + Sync {
    fn recommend(&self, answers: &[String]) -> Result<String, ServiceError>;
}

/// Interpret a response. The collaborator's own `error` text is kept as the
/// `Api` body so it can be shown verbatim. A body that is not JSON at all is
/// a `ResponseParsing` error whatever the status.
pub fn parse_recommendation(status: u16, body: &str) -> Result<String, ServiceError> {
    let parsed: RecommendationResponse =
        serde_json::from_str(body).map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;
    let success = (200..300).contains(&status);

    match parsed.recommendation.filter(|r| !r.trim().is_empty()) {
        Some(recommendation) if success => Ok(recommendation),
        _ => Err(ServiceError::Api {
            status,
            body: parsed.error.unwrap_or_default(),
        }),
    }
}

pub struct HttpRecommendationClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl HttpRecommendationClient {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        let client = super::http::build_client(timeout_secs, timeout_secs.min(10))?;
        Ok(Self::with_client(client, url, timeout_secs))
    }

    pub fn with_client(client: Client, url: &str, timeout_secs: u64) -> Self {
        Self {
            client,
            url: trim_url(url),
            timeout_secs,
        }
    }
}

impl RecommendationClient for HttpRecommendationClient {
    fn recommend(&self, answers: &[String]) -> Result<String, ServiceError> {
        let _span =
            tracing::info_span!("recommendation_request", answers = answers.len()).entered();

        let response = self
            .client
            .post(&self.url)
            .json(&RecommendationRequest { answers })
            .send()
            .map_err(|e| map_send_error(e, &self.url, self.timeout_secs))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;

        let result = parse_recommendation(status, &body);
        if let Err(ref e) = result {
            tracing::warn!(status, error = %e, "Recommendation request failed");
        }
        result
    }
}

/// Mock recommendation engine — fixed advice, records submitted answers.
pub struct MockRecommendationClient {
    /// `Err(None)` stands for a body that is not JSON.
    reply: Result<String, Option<String>>,
    calls: AtomicUsize,
    last_answers: Mutex<Vec<String>>,
}

impl MockRecommendationClient {
    pub fn new(recommendation: &str) -> Self {
        Self {
            reply: Ok(recommendation.to_string()),
            calls: AtomicUsize::new(0),
            last_answers: Mutex::new(Vec::new()),
        }
    }

    /// Answers with a collaborator-side `{error}` message.
    pub fn rejecting(error: &str) -> Self {
        Self {
            reply: Err(Some(error.to_string())),
            calls: AtomicUsize::new(0),
            last_answers: Mutex::new(Vec::new()),
        }
    }

    /// Answers with a body that is not JSON.
    pub fn garbled() -> Self {
        Self {
            reply: Err(None),
            calls: AtomicUsize::new(0),
            last_answers: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_answers(&self) -> Vec<String> {
        self.last_answers
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }
}

impl RecommendationClient for MockRecommendationClient {
    fn recommend(&self, answers: &[String]) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_answers.lock() {
            *last = answers.to_vec();
        }
        self.reply.clone().map_err(|error| match error {
            Some(body) => ServiceError::Api { status: 400, body },
            None => ServiceError::ResponseParsing("expected value at line 1 column 1".into()),
        })
    }
}
