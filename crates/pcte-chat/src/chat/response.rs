use chrono::{DateTime, FixedOffset};

use super::{ChatReply, ResponseSource, RoutingOutcome};

/// Wrap a routing outcome in the outward success shape. Confidence is only
/// surfaced for local answers.
pub fn assemble_reply(
    outcome: RoutingOutcome,
    user_input: &str,
    timestamp: &DateTime<FixedOffset>,
) -> ChatReply {
    let local_confidence = match outcome.source {
        ResponseSource::LocalIntents => outcome.confidence,
        ResponseSource::Gemini => None,
    };

    ChatReply {
        message: outcome.text,
        status: "success".to_string(),
        timestamp: timestamp.to_rfc3339(),
        user_input: user_input.to_string(),
        response_source: outcome.source,
        local_confidence,
        hybrid_mode: true,
    }
}
