//! Assistant conversation offered when the scan is classified healthy.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::services::{ChatClient, ChatReply, ServiceError};

pub const GREETING: &str = "You can ask any medical question about your chest X-ray or health.";
pub const DECLINED_FALLBACK: &str = "Error getting answer.";
pub const CONNECT_FAILED: &str = "Failed to connect to LLM service.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub speaker: Speaker,
    pub text: String,
    pub sent_at: NaiveDateTime,
}

impl ChatMessage {
    fn new(speaker: Speaker, text: impl Into<String>) -> Self {
        Self {
            speaker,
            text: text.into(),
            sent_at: chrono::Local::now().naive_local(),
        }
    }
}

/// Transcript plus the one-request-at-a-time loading flag.
#[derive(Debug, Clone, Serialize)]
pub struct ChatSession {
    messages: Vec<ChatMessage>,
    loading: bool,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage::new(Speaker::System, GREETING)],
            loading: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Record the user's turn and mark a request pending. Returns the query
    /// to send, or `None` for blank input or while a request is in flight.
    pub fn begin(&mut self, query: &str) -> Option<String> {
        if self.loading || query.trim().is_empty() {
            return None;
        }
        self.messages.push(ChatMessage::new(Speaker::User, query));
        self.loading = true;
        Some(query.to_string())
    }

    /// Append the assistant's turn for the pending request. `None`, with the
    /// transcript unchanged, when no request is pending.
    pub fn complete(
        &mut self,
        result: Result<ChatReply, ServiceError>,
    ) -> Option<&ChatMessage> {
        if !self.loading {
            tracing::debug!("Discarding assistant reply with no pending request");
            return None;
        }
        let text = match result {
            Ok(ChatReply::Answer(answer)) => answer,
            Ok(ChatReply::Declined { message }) => {
                message.unwrap_or_else(|| DECLINED_FALLBACK.to_string())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Assistant request failed");
                CONNECT_FAILED.to_string()
            }
        };
        self.loading = false;
        self.messages.push(ChatMessage::new(Speaker::Assistant, text));
        self.messages.last()
    }

    /// Ask synchronously. `None` when the query was ignored.
    pub fn ask(&mut self, client: &dyn ChatClient, query: &str) -> Option<&ChatMessage> {
        let query = self.begin(query)?;
        let result = client.ask(&query);
        self.complete(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::MockChatClient;

    #[test]
    fn new_session_starts_with_greeting() {
        let session = ChatSession::new();
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.messages()[0].speaker, Speaker::System);
        assert_eq!(session.messages()[0].text, GREETING);
        assert!(!session.is_loading());
    }

    #[test]
    fn answer_is_appended_after_user_turn() {
        let client = MockChatClient::answering("Rest and fluids.");
        let mut session = ChatSession::new();
        let reply = session.ask(&client, "What should I do?").unwrap();
        assert_eq!(reply.text, "Rest and fluids.");
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[1].speaker, Speaker::User);
        assert_eq!(session.messages()[2].speaker, Speaker::Assistant);
        assert!(session.messages()[2].sent_at >= session.messages()[1].sent_at);
        assert!(!session.is_loading());
    }

    #[test]
    fn blank_query_is_ignored() {
        let client = MockChatClient::answering("x");
        let mut session = ChatSession::new();
        assert!(session.ask(&client, "   ").is_none());
        assert_eq!(client.call_count(), 0);
        assert_eq!(session.messages().len(), 1);
    }

    #[test]
    fn declined_uses_message_or_fallback() {
        let mut session = ChatSession::new();
        let with_message = MockChatClient::declining(Some("Model busy"));
        assert_eq!(session.ask(&with_message, "q1").unwrap().text, "Model busy");

        let without = MockChatClient::declining(None);
        assert_eq!(session.ask(&without, "q2").unwrap().text, DECLINED_FALLBACK);
    }

    #[test]
    fn transport_failure_shows_connect_message() {
        let client = MockChatClient::unreachable();
        let mut session = ChatSession::new();
        assert_eq!(session.ask(&client, "hello").unwrap().text, CONNECT_FAILED);
        assert!(!session.is_loading());
    }

    #[test]
    fn second_query_ignored_while_loading() {
        let mut session = ChatSession::new();
        assert!(session.begin("first").is_some());
        assert!(session.is_loading());
        assert!(session.begin("second").is_none());
        assert!(session.complete(Ok(ChatReply::Answer("ok".into()))).is_some());
        assert!(session.begin("third").is_some());
    }

    #[test]
    fn reply_without_pending_request_is_discarded() {
        let mut session = ChatSession::new();
        assert!(session.complete(Ok(ChatReply::Answer("stray".into()))).is_none());
        assert_eq!(session.messages().len(), 1);

        session.begin("question").unwrap();
        assert!(session.complete(Ok(ChatReply::Answer("first".into()))).is_some());
        assert!(session.complete(Ok(ChatReply::Answer("second".into()))).is_none());
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.messages()[2].text, "first");
    }

    #[test]
    fn speaker_serializes_lowercase() {
        let json = serde_json::to_string(&Speaker::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
