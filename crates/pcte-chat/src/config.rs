use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{HelpdeskError, Result};

pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.8;
pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_TOP_K: usize = 3;
pub const PROJECT_TIMEZONE: &str = "Asia/Kolkata";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HelpdeskConfig {
    pub classifier: ClassifierConfig,
    pub retrieval: RetrievalConfig,
    pub generation: GenerationSettings,
    pub timezone: TimezoneConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub artifact_path: PathBuf,
    pub intents_path: PathBuf,
    /// Minimum softmax probability for a local answer to be trusted.
    pub confidence_threshold: f32,
    /// Fixes the canned-reply draw; unset means entropy-seeded.
    pub reply_seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub enabled: bool,
    pub document_path: PathBuf,
    pub model_dir: PathBuf,
    pub chunk_size: usize,
    pub top_k: usize,
    pub max_sequence_length: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: usize,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimezoneConfig {
    /// Deployment-wide zone, usually from `TIMEZONE`.
    pub default_zone: Option<String>,
    pub project_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub brochure_path: PathBuf,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("data/intent_model.json"),
            intents_path: PathBuf::from("data/intents.json"),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            reply_seed: None,
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        let model_dir = if let Ok(env_path) = std::env::var("MODEL_PATH") {
            PathBuf::from(env_path)
        } else if Path::new("models").exists() {
            PathBuf::from("models/all-MiniLM-L6-v2")
        } else {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("pcte-chat")
                .join("models")
                .join("all-MiniLM-L6-v2")
        };

        Self {
            enabled: true,
            document_path: PathBuf::from("data/PCTE-BROCHURE-2023-1.pdf"),
            model_dir,
            chunk_size: DEFAULT_CHUNK_SIZE,
            top_k: DEFAULT_TOP_K,
            max_sequence_length: 256,
        }
    }
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-flash".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_tokens: 1024,
            temperature: 0.7,
            top_p: 0.95,
            top_k: 40,
        }
    }
}

impl Default for TimezoneConfig {
    fn default() -> Self {
        Self {
            default_zone: None,
            project_zone: PROJECT_TIMEZONE.to_string(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            brochure_path: PathBuf::from("data/PCTE-BROCHURE-2023-1.pdf"),
        }
    }
}

impl Default for HelpdeskConfig {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            retrieval: RetrievalConfig::default(),
            generation: GenerationSettings::default(),
            timezone: TimezoneConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl HelpdeskConfig {
    /// Validate config values, returning errors for clearly broken configurations.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(HelpdeskError::InvalidArgument(msg.to_string()));

        if !(0.0..=1.0).contains(&self.classifier.confidence_threshold) {
            return invalid("classifier.confidence_threshold must be in [0.0, 1.0]");
        }
        if self.retrieval.chunk_size == 0 {
            return invalid("retrieval.chunk_size must be > 0");
        }
        if self.retrieval.top_k == 0 {
            return invalid("retrieval.top_k must be >= 1");
        }
        if self.retrieval.max_sequence_length == 0 {
            return invalid("retrieval.max_sequence_length must be > 0");
        }
        if self.generation.timeout_secs == 0 {
            return invalid("generation.timeout_secs must be > 0");
        }
        if self.generation.model.trim().is_empty() {
            return invalid("generation.model must not be empty");
        }
        Ok(())
    }

    /// Load config from a JSON file, falling back to defaults for missing fields.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HelpdeskError::InvalidArgument(format!("failed to read config file: {}", e))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            HelpdeskError::InvalidArgument(format!("failed to parse config: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the process configuration: explicit file, then `HELPDESK_CONFIG`,
    /// then defaults; environment overrides are applied last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("HELPDESK_CONFIG").ok().map(PathBuf::from);
        let mut config = match path.map(Path::to_path_buf).or(env_path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Overlay environment values. Takes a lookup so tests need not touch the
    /// real process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("GOOGLE_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.generation.api_key = Some(key);
        }
        if let Some(tz) = lookup("TIMEZONE").filter(|t| !t.trim().is_empty()) {
            self.timezone.default_zone = Some(tz);
        }
        if let Some(model_path) = lookup("MODEL_PATH") {
            self.retrieval.model_dir = PathBuf::from(model_path);
        }
        if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => tracing::warn!(port = %port, "Ignoring unparseable PORT"),
            }
        }
    }
}
