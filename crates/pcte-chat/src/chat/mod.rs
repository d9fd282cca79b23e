pub mod engine;
pub mod response;

pub use engine::{ChatEngine, EngineSettings};
pub use response::assemble_reply;

use serde::{Deserialize, Serialize};

use crate::error::HelpdeskError;

pub const SERVICE_NAME: &str = "Chatbot API with Gemini";

// ============================================================================
// Types
// ============================================================================

/// Inbound chat request. Both fields are optional on the wire so a missing
/// message can be reported as a validation error instead of a parse error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub timezone: Option<String>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            timezone: None,
        }
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = Some(timezone.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseSource {
    #[serde(rename = "local_intents")]
    LocalIntents,
    #[serde(rename = "gemini")]
    Gemini,
}

/// Terminal output of the routing state machine.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingOutcome {
    pub text: String,
    pub source: ResponseSource,
    /// Classifier confidence; present only for local answers.
    pub confidence: Option<f32>,
    /// Whether brochure context was attached to the generative prompt.
    pub grounded: bool,
}

impl RoutingOutcome {
    pub fn local(text: String, confidence: f32) -> Self {
        Self {
            text,
            source: ResponseSource::LocalIntents,
            confidence: Some(confidence),
            grounded: false,
        }
    }

    pub fn generative(text: String, grounded: bool) -> Self {
        Self {
            text,
            source: ResponseSource::Gemini,
            confidence: None,
            grounded,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    pub status: String,
    pub timestamp: String,
    pub user_input: String,
    pub response_source: ResponseSource,
    pub local_confidence: Option<f32>,
    pub hybrid_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            status: "error".to_string(),
        }
    }
}

impl From<&HelpdeskError> for ErrorBody {
    fn from(err: &HelpdeskError) -> Self {
        Self::new(err.public_message())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_wire_names() {
        assert_eq!(serde_json::to_value(ResponseSource::LocalIntents).unwrap(), json!("local_intents"));
        assert_eq!(serde_json::to_value(ResponseSource::Gemini).unwrap(), json!("gemini"));
    }

    #[test]
    fn request_fields_are_optional() {
        let req: ChatRequest = serde_json::from_str("{}").unwrap();
        assert!(req.message.is_none());
        assert!(req.timezone.is_none());

        let req: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","timezone":"Asia/Kolkata"}"#).unwrap();
        assert_eq!(req.message.as_deref(), Some("hi"));
        assert_eq!(req.timezone.as_deref(), Some("Asia/Kolkata"));
    }

    #[test]
    fn error_body_shape() {
        let body = ErrorBody::from(&HelpdeskError::validation("Missing message field"));
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({"error": "Missing message field", "status": "error"})
        );

        let body = ErrorBody::from(&HelpdeskError::internal("db path /var/x"));
        assert_eq!(body.error, "Internal server error");
    }
}
