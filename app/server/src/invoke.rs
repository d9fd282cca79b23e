//! On-demand adapter: one request document in, one response document out.

use serde::Serialize;

use pcte_chat::{ChatEngine, ChatReply, ChatRequest, ErrorBody, HelpdeskError};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum InvokeOutcome {
    Success(ChatReply),
    Failure(ErrorBody),
}

impl InvokeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Parse `body` as a chat request and run it through the engine.
pub async fn invoke_json(engine: &ChatEngine, body: &str) -> InvokeOutcome {
    let request = if body.trim().is_empty() {
        ChatRequest::default()
    } else {
        match serde_json::from_str::<ChatRequest>(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::debug!("Rejected request document: {}", e);
                return InvokeOutcome::Failure(ErrorBody::from(&HelpdeskError::validation(
                    "Invalid JSON body",
                )));
            }
        }
    };
    invoke(engine, request).await
}

pub async fn invoke(engine: &ChatEngine, request: ChatRequest) -> InvokeOutcome {
    match engine.handle(request, None).await {
        Ok(reply) => InvokeOutcome::Success(reply),
        Err(e) => {
            if !e.is_client_error() {
                tracing::error!("Invocation failed: {}", e);
            }
            InvokeOutcome::Failure(ErrorBody::from(&e))
        }
    }
}
