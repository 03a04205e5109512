//! Report-generation collaborator: JSON patient details in, PDF bytes out.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use reqwest::blocking::Client;
use serde::Serialize;

use super::http::{ensure_success, map_send_error, trim_url};
use super::ServiceError;

/// File name the generated report is saved under.
pub const REPORT_FILE_NAME: &str = "patient_report.pdf";

/// Request body for `POST /generate_report`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRequest {
    pub name: String,
    pub address: String,
    pub phone: String,
    pub sex: String,
    pub disease: String,
    /// Caller identity; serialized as `null` for anonymous callers.
    pub uid: Option<String>,
}

/// A generated report document.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: Option<String>,
}

impl ReportDocument {
    pub fn new(bytes: Vec<u8>, content_type: Option<String>) -> Self {
        Self {
            bytes,
            file_name: REPORT_FILE_NAME.to_string(),
            content_type,
        }
    }

    /// Write the document into `dir` (created if needed) and return its path.
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), size = self.bytes.len(), "Report saved");
        Ok(path)
    }
}

/// Report generator abstraction (allows mocking for tests)
pub trait ReportClient: Send + Sync {
    fn generate(&self, request: &ReportRequest) -> Result<ReportDocument, ServiceError>;
}

pub struct HttpReportClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl HttpReportClient {
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

impl ReportClient for HttpReportClient {
    fn generate(&self, request: &ReportRequest) -> Result<ReportDocument, ServiceError> {
        let _span = tracing::info_span!("report_request", disease = %request.disease).entered();

        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| map_send_error(e, &self.url, self.timeout_secs))?;
        let response = ensure_success(response)?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;
        if bytes.is_empty() {
            return Err(ServiceError::ResponseParsing("empty report document".into()));
        }

        tracing::info!(size = bytes.len(), "Report generated");
        Ok(ReportDocument::new(bytes.to_vec(), content_type))
    }
}

/// Mock report generator — returns fixed bytes and records requests.
pub struct MockReportClient {
    document: Option<Vec<u8>>,
    calls: AtomicUsize,
    last_request: Mutex<Option<ReportRequest>>,
}

impl MockReportClient {
    pub fn new(document: &[u8]) -> Self {
        Self {
            document: Some(document.to_vec()),
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// A generator that always answers HTTP 500.
    pub fn failing() -> Self {
        Self {
            document: None,
            calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<ReportRequest> {
        self.last_request.lock().ok()?.clone()
    }
}

impl ReportClient for MockReportClient {
    fn generate(&self, request: &ReportRequest) -> Result<ReportDocument, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }
        match &self.document {
            Some(bytes) => Ok(ReportDocument::new(
                bytes.clone(),
                Some("application/pdf".into()),
            )),
            None => Err(ServiceError::Api {
                status: 500,
                body: "mock report failure".into(),
            }),
        }
    }
}
