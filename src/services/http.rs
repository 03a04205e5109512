//! Shared blocking HTTP plumbing: client construction and failure mapping.

use std::time::Duration;

use reqwest::blocking::{Client, Response};

use super::ServiceError;

/// Build a blocking client with a request timeout and a connect timeout.
pub fn build_client(timeout_secs: u64, connect_timeout_secs: u64) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs))
        .build()
        .map_err(|e| ServiceError::ClientBuild(e.to_string()))
}

/// Map a send failure. The query string of `target` is dropped.
pub(crate) fn map_send_error(err: reqwest::Error, target: &str, timeout_secs: u64) -> ServiceError {
    if err.is_connect() {
        ServiceError::NotReachable(redact_query(target).to_string())
    } else if err.is_timeout() {
        ServiceError::Timeout(timeout_secs)
    } else {
        ServiceError::Http(err.without_url().to_string())
    }
}

/// Turn a non-2xx response into `ServiceError::Api` carrying the body text.
pub(crate) fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(ServiceError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Strip the query string (API keys travel there) for logs and errors.
pub(crate) fn redact_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}

/// Normalize a configured URL (no trailing slash).
pub(crate) fn trim_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
