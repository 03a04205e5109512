//! Remote collaborators: disease classifier, report generator, recommendation
//! engine and conversational assistant.
//!
//! Each collaborator is a trait (mockable) with one blocking HTTP
//! implementation. Failures are classified into `ServiceError`; callers turn
//! them into user-visible states and never panic on them.

pub mod chat;
pub mod classifier;
pub mod http;
pub mod recommendation;
pub mod report;

use std::sync::Arc;

use thiserror::Error;

use crate::config::ServiceConfig;

pub use chat::{ChatClient, ChatReply, HttpChatClient, MockChatClient};
pub use classifier::{HttpPredictionClient, MockPredictionClient, PredictionClient};
pub use recommendation::{HttpRecommendationClient, MockRecommendationClient, RecommendationClient};
pub use report::{HttpReportClient, MockReportClient, ReportClient, ReportDocument, ReportRequest};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Service at {0} is not reachable")]
    NotReachable(String),

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error("Service returned an error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse service response: {0}")]
    ResponseParsing(String),

    #[error("Service response is missing '{0}'")]
    MissingField(&'static str),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("Service is not configured: {0}")]
    NotConfigured(&'static str),
}

impl ServiceError {
    /// Transport-level failures (as opposed to a well-formed negative answer).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::NotReachable(_) | Self::Timeout(_) | Self::Http(_) | Self::ClientBuild(_)
        )
    }
}

/// Every collaborator the workflow talks to, built from one configuration.
#[derive(Clone)]
pub struct Collaborators {
    pub classifier: Arc<dyn PredictionClient>,
    pub reports: Arc<dyn ReportClient>,
    pub recommendations: Arc<dyn RecommendationClient>,
    pub chat: Arc<dyn ChatClient>,
}

impl Collaborators {
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = http::build_client(config.timeout_secs, config.connect_timeout_secs)?;
        Ok(Self {
            classifier: Arc::new(HttpPredictionClient::with_client(
                client.clone(),
                &config.predict_url,
                &config.model_info_url,
                config.timeout_secs,
            )),
            reports: Arc::new(HttpReportClient::with_client(
                client.clone(),
                &config.report_url,
                config.timeout_secs,
            )),
            recommendations: Arc::new(HttpRecommendationClient::with_client(
                client.clone(),
                &config.recommendation_url,
                config.timeout_secs,
            )),
            chat: Arc::new(HttpChatClient::with_client(
                client,
                &config.chat_url,
                config.timeout_secs,
            )),
        })
    }
}
