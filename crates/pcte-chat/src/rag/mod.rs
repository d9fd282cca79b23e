pub mod prompt;
pub mod retrieval_decision;

pub use prompt::{build_prompt, GroundingContext, FALLBACK_REPLY};
pub use retrieval_decision::{TopicDecision, TopicRouter};
