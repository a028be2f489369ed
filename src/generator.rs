// ============================================================================
// Market Generation Assistant
// ============================================================================
//
// Turns a free-text theme into a market title and options through a
// generative text service. Any failure, including a missing API key, is
// replaced by a deterministic local template flagged with `is_mock`.
// ============================================================================

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::models::MAX_OPTIONS;

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedMarket {
    pub title: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub is_mock: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeneratorError {
    MissingApiKey,
    RequestFailed(String),
    InvalidResponse(String),
}

impl std::fmt::Display for GeneratorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeneratorError::MissingApiKey => write!(f, "No generation API key configured"),
            GeneratorError::RequestFailed(msg) => write!(f, "Generation request failed: {}", msg),
            GeneratorError::InvalidResponse(msg) => write!(f, "Invalid generation response: {}", msg),
        }
    }
}

impl std::error::Error for GeneratorError {}

/// Local template used whenever the service is unavailable. The prompt is used verbatim.
pub fn mock_market(prompt: &str) -> GeneratedMarket {
    GeneratedMarket {
        title: format!("[instant] {} within 1 minute?", prompt),
        options: vec!["Yes".to_string(), "No".to_string()],
        is_mock: true,
    }
}

/// Instruction sent to the service for a theme
pub fn build_prompt(theme: &str) -> String {
    format!(
        "You are the prediction-market assistant at a live hackathon venue.\n\
         Using the theme \"{}\", create an ultra-short-term prediction market that settles instantly.\n\
         Rules:\n\
         1. Stress urgency: \"in the next minute\", \"right now\", \"on site\".\n\
         2. Options must be mutually exclusive and quick to bet on.\n\
         3. Keep every option short (at most 10 words).\n\
         Return JSON of the form {{\"title\": string, \"options\": [string]}}.",
        theme.trim()
    )
}

#[derive(Debug, Deserialize)]
struct RawMarket {
    #[serde(default)]
    title: String,
    #[serde(default)]
    options: Vec<String>,
}

static CODE_FENCE: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

fn code_fence() -> Result<&'static Regex, GeneratorError> {
    CODE_FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$"))
        .as_ref()
        .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))
}

/// Parse service text into a market, tolerating a ```json fence around it
pub fn parse_generated(text: &str) -> Result<GeneratedMarket, GeneratorError> {
    let fence = code_fence()?;
    let body = fence
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text);

    let raw: RawMarket = serde_json::from_str(body.trim())
        .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

    Ok(GeneratedMarket {
        title: raw.title,
        options: raw.options.into_iter().take(MAX_OPTIONS).collect(),
        is_mock: false,
    })
}

// ============================================================================
// SERVICE
// ============================================================================

#[async_trait]
pub trait GenerationService: Send + Sync {
    async fn complete(&self, theme: &str) -> Result<GeneratedMarket, GeneratorError>;
}

/// Gemini `generateContent` client constrained to a JSON response schema
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: Client,
}

impl GeminiClient {
    pub fn new(api_key: &str, model: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: GEMINI_API_BASE.to_string(),
            client,
        }
    }

    fn request_body(theme: &str) -> Value {
        json!({
            "contents": [{ "parts": [{ "text": build_prompt(theme) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "options": { "type": "ARRAY", "items": { "type": "STRING" } }
                    }
                }
            }
        })
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    async fn complete(&self, theme: &str) -> Result<GeneratedMarket, GeneratorError> {
        if self.api_key.is_empty() {
            return Err(GeneratorError::MissingApiKey);
        }
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self.client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::request_body(theme))
            .send()
            .await
            .map_err(|e| GeneratorError::RequestFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeneratorError::RequestFailed(
                format!("service returned status {}", response.status())
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| GeneratorError::InvalidResponse(e.to_string()))?;

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| GeneratorError::InvalidResponse("no text returned".to_string()))?;

        parse_generated(text)
    }
}

// ============================================================================
// ASSISTANT
// ============================================================================

#[derive(Clone, Default)]
pub struct Generator {
    service: Option<Arc<dyn GenerationService>>,
}

impl Generator {
    pub fn new(service: Option<Arc<dyn GenerationService>>) -> Self {
        Self { service }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let service = config
            .gemini_api_key
            .as_deref()
            .map(|key| Arc::new(GeminiClient::new(key, &config.gemini_model)) as Arc<dyn GenerationService>);
        Self::new(service)
    }

    /// Never fails: falls back to `mock_market` on any service problem
    pub async fn generate(&self, theme: &str) -> GeneratedMarket {
        let service = match &self.service {
            Some(s) => s,
            None => {
                warn!("⚠️  No generation service, using mock market");
                return mock_market(theme);
            }
        };

        match service.complete(theme).await {
            Ok(mut market) => {
                market.options.truncate(MAX_OPTIONS);
                info!("✨ Generated market: {} ({} options)", market.title, market.options.len());
                market
            }
            Err(e) => {
                error!("❌ Generation error: {}", e);
                mock_market(theme)
            }
        }
    }
}
