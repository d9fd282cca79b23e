//! Hybrid routing engine.
//!
//! One request walks `TopicCheck -> LocalClassify -> Decide` and ends either in
//! a local answer or in a generative call, optionally grounded in brochure
//! chunks. Every path returns text; generative and retrieval failures are
//! absorbed here and never reach the caller.

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{HelpdeskConfig, TimezoneConfig};
use crate::embeddings::{EmbeddingModel, MiniLmConfig, MiniLmEmbeddings};
use crate::error::{HelpdeskError, Result};
use crate::indexing::BrochureIndex;
use crate::intent::{
    resolve_now, IntentCatalog, IntentClassifier, IntentPredictor, IntentResponder,
};
use crate::llm::{GeminiProvider, GenerationConfig, LLMProvider};
use crate::rag::{build_prompt, GroundingContext, TopicRouter, FALLBACK_REPLY};

use super::{
    assemble_reply, ChatReply, ChatRequest, HealthStatus, RoutingOutcome, SERVICE_NAME,
};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub confidence_threshold: f32,
    pub top_k: usize,
    pub generation_timeout: Duration,
    pub generation: GenerationConfig,
    pub timezone: TimezoneConfig,
}

impl EngineSettings {
    pub fn from_config(config: &HelpdeskConfig) -> Self {
        Self {
            confidence_threshold: config.classifier.confidence_threshold,
            top_k: config.retrieval.top_k,
            generation_timeout: Duration::from_secs(config.generation.timeout_secs),
            generation: GenerationConfig::from(&config.generation),
            timezone: config.timezone.clone(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: crate::config::DEFAULT_CONFIDENCE_THRESHOLD,
            top_k: crate::config::DEFAULT_TOP_K,
            generation_timeout: Duration::from_secs(30),
            generation: GenerationConfig::default(),
            timezone: TimezoneConfig::default(),
        }
    }
}

pub struct ChatEngine {
    classifier: Arc<dyn IntentPredictor>,
    responder: Arc<IntentResponder>,
    router: TopicRouter,
    brochure: Option<Arc<BrochureIndex>>,
    llm: Arc<dyn LLMProvider>,
    settings: EngineSettings,
}

impl ChatEngine {
    pub fn new(
        classifier: Arc<dyn IntentPredictor>,
        responder: Arc<IntentResponder>,
        brochure: Option<Arc<BrochureIndex>>,
        llm: Arc<dyn LLMProvider>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            classifier,
            responder,
            router: TopicRouter::default(),
            brochure,
            llm,
            settings,
        }
    }

    pub fn with_router(mut self, router: TopicRouter) -> Self {
        self.router = router;
        self
    }

    /// Wire up the production engine. A bad classifier artifact or catalog is
    /// fatal; a missing embedding model only disables retrieval.
    pub fn from_config(config: &HelpdeskConfig) -> Result<Self> {
        config.validate()?;

        let classifier = IntentClassifier::load(&config.classifier.artifact_path)?;
        let catalog = IntentCatalog::from_file(&config.classifier.intents_path)?;
        let responder = IntentResponder::new(catalog, config.classifier.reply_seed);
        tracing::info!(
            replies = responder.len(),
            "Intent catalog loaded from {}",
            config.classifier.intents_path.display()
        );

        let brochure = if config.retrieval.enabled {
            load_embedder(config).map(|embedder| {
                Arc::new(BrochureIndex::new(
                    config.retrieval.document_path.clone(),
                    config.retrieval.chunk_size,
                    embedder,
                ))
            })
        } else {
            tracing::info!("Brochure retrieval disabled by configuration");
            None
        };

        let llm = GeminiProvider::new(
            config.generation.api_key.clone(),
            config.generation.model.clone(),
            Duration::from_secs(config.generation.timeout_secs),
        )
        .map_err(|e| HelpdeskError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self::new(
            Arc::new(classifier),
            Arc::new(responder),
            brochure,
            Arc::new(llm),
            EngineSettings::from_config(config),
        ))
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn retrieval_enabled(&self) -> bool {
        self.brochure.is_some()
    }

    /// Run the routing state machine for one message. Never fails.
    pub async fn route(&self, message: &str, timezone: Option<&str>) -> RoutingOutcome {
        let now = resolve_now(timezone, &self.settings.timezone);
        self.route_at(message, &now).await
    }

    /// Validate a request, route it and build the outward reply.
    pub async fn handle(
        &self,
        request: ChatRequest,
        header_timezone: Option<&str>,
    ) -> Result<ChatReply> {
        let message = request
            .message
            .ok_or_else(|| HelpdeskError::validation("Missing message field"))?;
        let message = message.trim();
        if message.is_empty() {
            return Err(HelpdeskError::validation("Message cannot be empty"));
        }

        let timezone = request
            .timezone
            .as_deref()
            .filter(|tz| !tz.trim().is_empty())
            .or(header_timezone);
        let now = resolve_now(timezone, &self.settings.timezone);

        let outcome = self.route_at(message, &now).await;
        Ok(assemble_reply(outcome, message, &now))
    }

    pub fn health(&self) -> HealthStatus {
        HealthStatus {
            status: "healthy".to_string(),
            timestamp: resolve_now(None, &self.settings.timezone).to_rfc3339(),
            service: SERVICE_NAME.to_string(),
        }
    }

    async fn route_at(&self, message: &str, now: &DateTime<FixedOffset>) -> RoutingOutcome {
        tracing::debug!(text = message, "Routing message");

        let decision = self.router.decide(message);
        if decision.general_knowledge {
            tracing::info!(chars = message.len(), route = "general_knowledge", "Skipping local classifier");
            return self.answer_generatively(message, decision.needs_brochure).await;
        }

        if let Some(outcome) = self.answer_locally(message, now) {
            return outcome;
        }

        self.answer_generatively(message, decision.needs_brochure).await
    }

    /// `LocalClassify -> Decide`. `None` means fall through to generation.
    fn answer_locally(&self, message: &str, now: &DateTime<FixedOffset>) -> Option<RoutingOutcome> {
        let prediction = match self.classifier.predict(message) {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!("Local classification failed, using generative path: {}", e);
                return None;
            }
        };

        if prediction.confidence < self.settings.confidence_threshold {
            tracing::info!(
                chars = message.len(),
                tag = %prediction.tag,
                confidence = prediction.confidence,
                route = "low_confidence",
                "Local answer not trusted"
            );
            return None;
        }

        match self.responder.respond(&prediction.tag, now) {
            Some(text) => {
                tracing::info!(
                    chars = message.len(),
                    tag = %prediction.tag,
                    confidence = prediction.confidence,
                    route = "local",
                    "Answered from intent catalog"
                );
                Some(RoutingOutcome::local(text, prediction.confidence))
            }
            None => {
                tracing::warn!(tag = %prediction.tag, "Classified tag has no catalog entry");
                None
            }
        }
    }

    /// `RetrieveContext -> GenerativeAnswer`.
    async fn answer_generatively(&self, message: &str, needs_brochure: bool) -> RoutingOutcome {
        let context = if needs_brochure {
            self.retrieve_context(message).await
        } else {
            GroundingContext::Unavailable
        };
        let grounded = context.is_grounded();

        let prompt = build_prompt(message, &context);
        let text = self.generate(&prompt).await;

        tracing::info!(chars = message.len(), route = "generative", grounded, "Generative answer ready");
        RoutingOutcome::generative(text, grounded)
    }

    async fn retrieve_context(&self, message: &str) -> GroundingContext {
        let Some(brochure) = &self.brochure else {
            tracing::debug!("Brochure retrieval unavailable, answering without context");
            return GroundingContext::Unavailable;
        };

        match brochure.retrieve(message, self.settings.top_k).await {
            Ok(chunks) => GroundingContext::from_chunks(&chunks),
            Err(e) => {
                tracing::warn!("Degrading to contextless generation: {}", e);
                GroundingContext::Unavailable
            }
        }
    }

    async fn generate(&self, prompt: &str) -> String {
        let call = self.llm.generate(prompt, &self.settings.generation);
        let failure = match tokio::time::timeout(self.settings.generation_timeout, call).await {
            Ok(Ok(text)) if !text.trim().is_empty() => return text,
            Ok(Ok(_)) => HelpdeskError::GenerativeServiceFailure("empty completion".to_string()),
            Ok(Err(e)) => HelpdeskError::GenerativeServiceFailure(e.to_string()),
            Err(_) => HelpdeskError::GenerativeServiceFailure(format!(
                "no answer within {}s",
                self.settings.generation_timeout.as_secs_f32()
            )),
        };
        tracing::warn!("Using fallback reply: {}", failure);
        FALLBACK_REPLY.to_string()
    }
}

fn load_embedder(config: &HelpdeskConfig) -> Option<Arc<dyn EmbeddingModel>> {
    let model_dir = &config.retrieval.model_dir;
    let Some(model_config) =
        MiniLmConfig::from_model_dir(model_dir, config.retrieval.max_sequence_length)
    else {
        tracing::warn!(
            "No embedding model found in {}, brochure retrieval disabled",
            model_dir.display()
        );
        return None;
    };

    match MiniLmEmbeddings::new(model_config) {
        Ok(model) => Some(Arc::new(model)),
        Err(e) => {
            tracing::warn!("Failed to load embedding model, brochure retrieval disabled: {}", e);
            None
        }
    }
}
