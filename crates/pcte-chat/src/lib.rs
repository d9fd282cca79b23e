pub mod chat;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod indexing;
pub mod intent;
pub mod llm;
pub mod processing;
pub mod rag;
pub mod search;

// Re-export primary types for convenience
pub use chat::{
    assemble_reply, ChatEngine, ChatReply, ChatRequest, EngineSettings, ErrorBody, HealthStatus,
    ResponseSource, RoutingOutcome,
};
pub use config::HelpdeskConfig;
pub use error::{HelpdeskError, Result};
pub use indexing::BrochureIndex;

pub use intent::{IntentClassifier, IntentPredictor, IntentResponder, Prediction};
pub use llm::{GeminiProvider, GenerationConfig, LLMProvider, ProviderInfo};
pub use rag::{TopicDecision, TopicRouter};
