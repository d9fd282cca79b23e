//! Keyword go/no-go checks run before any model is touched.
//!
//! Both checks are pure functions of the lowercased message, so the same text
//! always takes the same branch.

use serde::{Deserialize, Serialize};

/// Phrases that send a message straight to the generative model.
pub const GENERAL_KNOWLEDGE_TRIGGERS: &[&str] = &[
    "what is", "explain", "tell me about", "how does", "define",
    "artificial intelligence", "machine learning", "quantum", "physics",
    "chemistry", "biology", "history", "cooking", "recipe", "weather",
    "news", "sports", "entertainment", "technology", "programming",
    "philosophy", "psychology", "economics", "politics", "science",
    "travel", "health", "fitness", "music", "movies", "books",
];

/// Terms that make brochure context worth fetching.
pub const PCTE_TOPIC_TRIGGERS: &[&str] = &[
    "pcte", "punjab college", "admission", "course", "programme", "programs",
    "faculty", "campus", "fee", "scholarship", "hostel", "placement", "department",
    "eligibility", "brochure", "library", "bca", "mba", "b.tech", "semester",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDecision {
    /// Skip the local classifier entirely.
    pub general_knowledge: bool,
    /// Ground a generative answer in brochure chunks.
    pub needs_brochure: bool,
}

#[derive(Debug, Clone)]
pub struct TopicRouter {
    general_triggers: Vec<String>,
    pcte_triggers: Vec<String>,
}

impl Default for TopicRouter {
    fn default() -> Self {
        Self::new(GENERAL_KNOWLEDGE_TRIGGERS, PCTE_TOPIC_TRIGGERS)
    }
}

impl TopicRouter {
    pub fn new<S: AsRef<str>>(general: &[S], pcte: &[S]) -> Self {
        let normalize = |list: &[S]| {
            list.iter()
                .map(|s| s.as_ref().trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };
        Self {
            general_triggers: normalize(general),
            pcte_triggers: normalize(pcte),
        }
    }

    pub fn is_general_knowledge(&self, message: &str) -> bool {
        contains_any(&message.to_lowercase(), &self.general_triggers)
    }

    pub fn is_pcte_topic(&self, message: &str) -> bool {
        contains_any(&message.to_lowercase(), &self.pcte_triggers)
    }

    pub fn decide(&self, message: &str) -> TopicDecision {
        let lower = message.to_lowercase();
        TopicDecision {
            general_knowledge: contains_any(&lower, &self.general_triggers),
            needs_brochure: contains_any(&lower, &self.pcte_triggers),
        }
    }
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}
