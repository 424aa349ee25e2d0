//! Oracle backed by the Gemini `generateContent` API.
//!
//! One request per assessment, structured JSON output requested through
//! `generationConfig.responseSchema`. The answer text is handed to
//! [`decode_assessment`](crate::decode::decode_assessment); everything
//! before that (missing key, HTTP failure, blocked or empty candidates) is
//! classified here.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use dishdose_contracts::{
    assessment::AssessmentResult,
    error::{DishDoseError, DishDoseResult, OracleError},
};
use dishdose_core::traits::Oracle;

use crate::{
    config::OracleConfig,
    decode::decode_assessment,
    prompt::{build_prompt, request_schema},
};

// ── Wire types ────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateResponse {
    /// All text parts of the first candidate, concatenated.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

// ── Client ────────────────────────────────────────────────────────────────────

/// The production oracle.
#[derive(Clone)]
pub struct GeminiOracle {
    client: Client,
    config: OracleConfig,
    /// Overrides the environment lookup when set.
    api_key: Option<String>,
}

impl GeminiOracle {
    /// Build a client for `config`. The API key is looked up per call.
    pub fn new(config: OracleConfig) -> DishDoseResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DishDoseError::Config {
                reason: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            client,
            config,
            api_key: None,
        })
    }

    /// Use `key` instead of reading `config.api_key_env`.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    fn resolve_api_key(&self) -> Result<String, OracleError> {
        let key = match &self.api_key {
            Some(key) => key.clone(),
            None => std::env::var(&self.config.api_key_env).unwrap_or_default(),
        };
        if key.trim().is_empty() {
            return Err(OracleError::NotConfigured {
                reason: format!("{} environment variable is not set", self.config.api_key_env),
            });
        }
        Ok(key)
    }

    fn request_body(&self, medications: &str, food: &str) -> GenerateRequest {
        GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: build_prompt(medications, food),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: request_schema(),
                temperature: self.config.temperature,
            },
        }
    }
}

#[async_trait]
impl Oracle for GeminiOracle {
    async fn assess(&self, medications: &str, food: &str) -> Result<AssessmentResult, OracleError> {
        let api_key = self.resolve_api_key()?;
        let url = self.config.generate_url();
        debug!(model = %self.config.model, "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&self.request_body(medications, food))
            .send()
            .await
            .map_err(|e| OracleError::Transport {
                reason: format!("request failed: {}", e),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "generateContent returned an error status");
            return Err(OracleError::Transport {
                reason: format!("API error {}: {}", status, text),
            });
        }

        let body: GenerateResponse = response.json().await.map_err(|e| OracleError::Transport {
            reason: format!("could not read response envelope: {}", e),
        })?;

        if let Some(reason) = body
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            debug!(finish_reason = %reason, "candidate finished");
        }

        decode_assessment(&body.text())
    }
}
