//! Google Gemini `generateContent` client.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use super::{GenerationConfig, LLMProvider, ProviderInfo};

const GEMINI_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiProvider {
    api_key: Option<String>,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiProvider {
    pub fn new(api_key: Option<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .build()?;

        let api_key = api_key.filter(|k| !k.trim().is_empty());
        if api_key.is_none() {
            tracing::warn!("GOOGLE_API_KEY not set; generative answers will use the fallback text");
        }

        Ok(Self {
            api_key,
            model: model.into(),
            base_url: GEMINI_BASE.to_string(),
            client,
        })
    }

    /// Point the client at a different API root (proxies, local stubs).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", self.base_url, self.model)
    }

    /// Parse a response body as JSON, returning a clear error if the server returned HTML.
    async fn parse_json_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        endpoint: &str,
    ) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| anyhow!("Failed to read response body from {}: {}", endpoint, e))?;
        let trimmed = body.trim_start();
        if trimmed.starts_with('<') {
            let preview: String = trimmed.chars().take(200).collect();
            return Err(anyhow!(
                "Endpoint {} returned HTML instead of JSON (HTTP {}). Response: {}",
                endpoint,
                status,
                preview
            ));
        }
        serde_json::from_str::<T>(&body).map_err(|e| {
            let preview: String = body.chars().take(300).collect();
            anyhow!("Failed to parse JSON from {} (HTTP {}): {}. Body: {}", endpoint, status, e, preview)
        })
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    async fn generate(&self, prompt: &str, config: &GenerationConfig) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| anyhow!("Google API key is not configured"))?;

        let request = json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": config.temperature,
                "topP": config.top_p,
                "topK": config.top_k,
                "maxOutputTokens": config.max_tokens,
            }
        });

        let endpoint = self.endpoint();
        let response = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    anyhow!("Request to {} timed out", endpoint)
                } else if e.is_connect() {
                    anyhow!("Failed to connect to {}: {}", endpoint, e)
                } else {
                    anyhow!("Request to {} failed: {}", endpoint, e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error = response.text().await.unwrap_or_default();
            return Err(anyhow!("Google API error ({}): {}", status, error));
        }

        let result: GoogleResponse = Self::parse_json_response(response, &endpoint).await?;
        extract_text(result)
    }

    fn info(&self) -> ProviderInfo {
        ProviderInfo {
            name: "Google".to_string(),
            model: self.model.clone(),
            context_window: 1_000_000,
        }
    }

    fn is_ready(&self) -> bool {
        self.api_key.is_some()
    }
}

fn extract_text(response: GoogleResponse) -> Result<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("No response from Google Gemini"));
    }
    Ok(text.to_string())
}

#[derive(Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    candidates: Vec<GoogleCandidate>,
}

#[derive(Deserialize)]
struct GoogleCandidate {
    content: Option<GoogleContent>,
}

#[derive(Deserialize)]
struct GoogleContent {
    #[serde(default)]
    parts: Vec<GooglePart>,
}

#[derive(Deserialize)]
struct GooglePart {
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Result<String> {
        extract_text(serde_json::from_str(body).unwrap())
    }

    #[test]
    fn joins_and_trims_parts() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"  PCTE is in "},{"text":"Ludhiana.\n"}]}}]}"#;
        assert_eq!(parse(body).unwrap(), "PCTE is in Ludhiana.");
    }

    #[test]
    fn blocked_or_empty_candidates_are_errors() {
        assert!(parse(r#"{"candidates":[]}"#).is_err());
        assert!(parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).is_err());
        assert!(parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).is_err());
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let provider = GeminiProvider::new(None, "gemini-2.5-flash", Duration::from_secs(1)).unwrap();
        assert!(!provider.is_ready());
        let err = provider
            .generate("hello", &GenerationConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key"));
    }

    #[test]
    fn endpoint_includes_model() {
        let provider = GeminiProvider::new(Some("k".into()), "gemini-2.5-flash", Duration::from_secs(5))
            .unwrap()
            .with_base_url("http://localhost:9999/v1beta/models/");
        assert_eq!(
            provider.endpoint(),
            "http://localhost:9999/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
