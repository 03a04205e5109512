//! Conversational Q&A collaborator.

use std::sync::atomic::{AtomicUsize, Ordering};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::http::{map_send_error, trim_url};
use super::ServiceError;

const SUCCESS_STATUS: &str = "success";

#[derive(Serialize)]
struct ChatRequest<'a> {
    query: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    status: String,
    answer: Option<String>,
    message: Option<String>,
}

/// What the assistant sent back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Answer(String),
    /// Non-success status, with the collaborator's message if it gave one.
    Declined { message: Option<String> },
}

/// Q&A assistant abstraction (allows mocking for tests)
pub trait ChatClient: Send + Sync {
    fn ask(&self, query: &str) -> Result<ChatReply, ServiceError>;
}

/// Interpret a response body regardless of HTTP status: the assistant
/// reports failures in-band through `status`.
pub fn parse_chat_reply(status: u16, body: &str) -> Result<ChatReply, ServiceError> {
    let parsed: ChatResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(_) if !(200..300).contains(&status) => {
            return Err(ServiceError::Api {
                status,
                body: body.to_string(),
            })
        }
        Err(e) => return Err(ServiceError::ResponseParsing(e.to_string())),
    };

    if parsed.status == SUCCESS_STATUS {
        let answer = parsed.answer.ok_or(ServiceError::MissingField("answer"))?;
        Ok(ChatReply::Answer(answer))
    } else {
        Ok(ChatReply::Declined {
            message: parsed.message.filter(|m| !m.trim().is_empty()),
        })
    }
}

pub struct HttpChatClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl HttpChatClient {
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

impl ChatClient for HttpChatClient {
    fn ask(&self, query: &str) -> Result<ChatReply, ServiceError> {
        let _span = tracing::info_span!("chat_request", query_len = query.len()).entered();

        let response = self
            .client
            .post(&self.url)
            .json(&ChatRequest { query })
            .send()
            .map_err(|e| map_send_error(e, &self.url, self.timeout_secs))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .map_err(|e| ServiceError::ResponseParsing(e.to_string()))?;
        parse_chat_reply(status, &body)
    }
}

/// Mock assistant — fixed reply, counts calls.
pub struct MockChatClient {
    reply: Option<ChatReply>,
    calls: AtomicUsize,
}

impl MockChatClient {
    pub fn answering(answer: &str) -> Self {
        Self {
            reply: Some(ChatReply::Answer(answer.to_string())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn declining(message: Option<&str>) -> Self {
        Self {
            reply: Some(ChatReply::Declined {
                message: message.map(str::to_string),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    /// An assistant that cannot be reached.
    pub fn unreachable() -> Self {
        Self {
            reply: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ChatClient for MockChatClient {
    fn ask(&self, _query: &str) -> Result<ChatReply, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply
            .clone()
            .ok_or_else(|| ServiceError::NotReachable("mock://chat".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_success_answer() {
        let reply = parse_chat_reply(200, r#"{"status":"success","answer":"Rest well."}"#).unwrap();
        assert_eq!(reply, ChatReply::Answer("Rest well.".into()));
    }

    #[test]
    fn parse_error_status_with_message() {
        let reply = parse_chat_reply(200, r#"{"status":"error","message":"No context"}"#).unwrap();
        assert_eq!(
            reply,
            ChatReply::Declined {
                message: Some("No context".into())
            }
        );
    }

    #[test]
    fn parse_error_status_without_message() {
        let reply = parse_chat_reply(500, r#"{"status":"error"}"#).unwrap();
        assert_eq!(reply, ChatReply::Declined { message: None });
    }

    #[test]
    fn parse_success_without_answer_is_error() {
        let err = parse_chat_reply(200, r#"{"status":"success"}"#).unwrap_err();
        assert!(matches!(err, ServiceError::MissingField("answer")));
    }

    #[test]
    fn parse_non_json_error_response() {
        let err = parse_chat_reply(502, "Bad gateway").unwrap_err();
        assert!(matches!(err, ServiceError::Api { status: 502, .. }));
    }

    #[test]
    fn request_serializes_query() {
        let json = serde_json::to_string(&ChatRequest { query: "Is this bad?" }).unwrap();
        assert_eq!(json, r#"{"query":"Is this bad?"}"#);
    }

    #[test]
    fn unreachable_mock_is_transport_error() {
        let mock = MockChatClient::unreachable();
        assert!(mock.ask("hi").unwrap_err().is_transport());
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn trait_is_object_safe() {
        fn _assert(_: &dyn ChatClient) {}
    }
}
