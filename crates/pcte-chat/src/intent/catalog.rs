//! Canned replies per intent tag, plus the handful of tags computed from the clock.

use chrono::{DateTime, Duration, FixedOffset};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{HelpdeskError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentEntry {
    pub tag: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub responses: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentCatalog {
    pub intents: Vec<IntentEntry>,
}

impl IntentCatalog {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            HelpdeskError::ArtifactMismatch(format!(
                "cannot read intent catalog {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            HelpdeskError::ArtifactMismatch(format!("malformed intent catalog: {}", e))
        })
    }
}

/// How a tag turns into reply text.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyStrategy {
    CurrentTime,
    CurrentDate,
    DayToday,
    DayTomorrow,
    Canned(Vec<String>),
}

impl ReplyStrategy {
    fn dynamic(tag: &str) -> Option<Self> {
        match tag {
            "current_time" => Some(Self::CurrentTime),
            "current_date" => Some(Self::CurrentDate),
            "day_today" => Some(Self::DayToday),
            "day_tomorrow" => Some(Self::DayTomorrow),
            _ => None,
        }
    }

    /// Render the clock-driven replies. `None` for canned strategies.
    pub fn render_dynamic(&self, now: &DateTime<FixedOffset>) -> Option<String> {
        match self {
            Self::CurrentTime => Some(format!("The current time is {}", now.format("%I:%M %p"))),
            Self::CurrentDate => Some(format!("Today's date is {}", now.format("%d %B %Y"))),
            Self::DayToday => Some(format!("Today is {}", now.format("%A"))),
            Self::DayTomorrow => {
                let tomorrow = *now + Duration::days(1);
                Some(format!("Tomorrow is {}", tomorrow.format("%A")))
            }
            Self::Canned(_) => None,
        }
    }
}

/// Resolves a classified tag to reply text.
pub struct IntentResponder {
    strategies: HashMap<String, ReplyStrategy>,
    rng: Mutex<StdRng>,
}

impl IntentResponder {
    /// `seed` pins the reply draw for replay and tests.
    pub fn new(catalog: IntentCatalog, seed: Option<u64>) -> Self {
        let mut strategies = HashMap::new();
        for name in ["current_time", "current_date", "day_today", "day_tomorrow"] {
            if let Some(strategy) = ReplyStrategy::dynamic(name) {
                strategies.insert(name.to_string(), strategy);
            }
        }

        for intent in catalog.intents {
            if strategies.contains_key(&intent.tag) {
                continue;
            }
            if intent.responses.is_empty() {
                tracing::warn!(tag = %intent.tag, "Intent has no responses, it will fall through");
                continue;
            }
            strategies.insert(intent.tag, ReplyStrategy::Canned(intent.responses));
        }

        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };

        Self {
            strategies,
            rng: Mutex::new(rng),
        }
    }

    pub fn strategy(&self, tag: &str) -> Option<&ReplyStrategy> {
        self.strategies.get(tag)
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Reply for `tag`, or `None` when the tag has no usable entry.
    pub fn respond(&self, tag: &str, now: &DateTime<FixedOffset>) -> Option<String> {
        match self.strategies.get(tag)? {
            ReplyStrategy::Canned(responses) => {
                let mut rng = self.rng.lock();
                responses.choose(&mut *rng).cloned()
            }
            dynamic => dynamic.render_dynamic(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn catalog() -> IntentCatalog {
        serde_json::from_str(
            r#"{
                "intents": [
                    { "tag": "greeting", "patterns": ["hi", "hello"], "responses": ["Hi!", "Hello!"] },
                    { "tag": "fees", "patterns": ["fee"], "responses": ["Fees vary by course."] },
                    { "tag": "silent", "patterns": ["..."], "responses": [] }
                ]
            }"#,
        )
        .unwrap()
    }

    fn saturday_evening() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 17, 15, 45, 0)
            .unwrap()
    }

    #[test]
    fn canned_reply_comes_from_catalog() {
        let responder = IntentResponder::new(catalog(), None);
        let now = saturday_evening();
        for _ in 0..20 {
            let reply = responder.respond("greeting", &now).unwrap();
            assert!(reply == "Hi!" || reply == "Hello!");
        }
    }

    #[test]
    fn seeded_draws_repeat() {
        let now = saturday_evening();
        let a = IntentResponder::new(catalog(), Some(7));
        let b = IntentResponder::new(catalog(), Some(7));
        let seq_a: Vec<_> = (0..10).map(|_| a.respond("greeting", &now)).collect();
        let seq_b: Vec<_> = (0..10).map(|_| b.respond("greeting", &now)).collect();
        assert_eq!(seq_a, seq_b);
    }

    #[test]
    fn missing_or_empty_tags_are_inconclusive() {
        let responder = IntentResponder::new(catalog(), None);
        let now = saturday_evening();
        assert_eq!(responder.respond("unknown_tag", &now), None);
        assert_eq!(responder.respond("silent", &now), None);
    }

    #[test]
    fn dynamic_tags_render_from_clock() {
        let responder = IntentResponder::new(IntentCatalog::default(), None);
        let now = saturday_evening();
        assert_eq!(
            responder.respond("current_time", &now).as_deref(),
            Some("The current time is 03:45 PM")
        );
        assert_eq!(
            responder.respond("current_date", &now).as_deref(),
            Some("Today's date is 17 October 2026")
        );
        assert_eq!(responder.respond("day_today", &now).as_deref(), Some("Today is Saturday"));
        assert_eq!(
            responder.respond("day_tomorrow", &now).as_deref(),
            Some("Tomorrow is Sunday")
        );
    }

    #[test]
    fn dynamic_tags_ignore_catalog_entries() {
        let catalog: IntentCatalog = serde_json::from_str(
            r#"{ "intents": [ { "tag": "day_today", "responses": ["stale"] } ] }"#,
        )
        .unwrap();
        let responder = IntentResponder::new(catalog, None);
        assert_eq!(responder.strategy("day_today"), Some(&ReplyStrategy::DayToday));
    }
}
