use crate::search::{format_context, ScoredChunk};

pub const ASSISTANT_INSTRUCTIONS: &str = "You are a helpful college assistant chatbot for PCTE (Punjab College of Technical Education). Respond to the following question in a friendly and informative way. Keep your response concise and helpful. If you don't know something specific about the college, say so politely.";

/// Marker placed where grounding context would go when none could be attached.
pub const CONTEXT_UNAVAILABLE: &str = "[College brochure context unavailable for this question.]";

/// Reply used whenever the generative service fails or times out.
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again later.";

#[derive(Debug, Clone, PartialEq)]
pub enum GroundingContext {
    Retrieved(String),
    Unavailable,
}

impl GroundingContext {
    /// Empty retrieval results count as unavailable.
    pub fn from_chunks(chunks: &[ScoredChunk]) -> Self {
        if chunks.is_empty() {
            Self::Unavailable
        } else {
            Self::Retrieved(format_context(chunks))
        }
    }

    pub fn is_grounded(&self) -> bool {
        matches!(self, Self::Retrieved(_))
    }
}

pub fn build_prompt(message: &str, context: &GroundingContext) -> String {
    let context_block = match context {
        GroundingContext::Retrieved(blocks) => format!(
            "Use the following information from the PCTE brochure where it is relevant:\n\n{}",
            blocks
        ),
        GroundingContext::Unavailable => CONTEXT_UNAVAILABLE.to_string(),
    };

    format!(
        "{}\n\n{}\n\nUser question: {}\n\nResponse:",
        ASSISTANT_INSTRUCTIONS, context_block, message
    )
}
