//! TOML configuration for the Gemini oracle.
//!
//! Every field has a default, so an empty document is a valid config:
//!
//! ```toml
//! model = "gemini-2.5-flash"
//! endpoint = "https://generativelanguage.googleapis.com/v1beta"
//! temperature = 0.2
//! api_key_env = "API_KEY"
//! timeout_secs = 30
//! ```
//!
//! The API key itself never lives in the file. It is read from the
//! environment variable named by `api_key_env` at call time.

use std::path::Path;

use serde::{Deserialize, Serialize};

use dishdose_contracts::error::{DishDoseError, DishDoseResult};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Model name appended to the endpoint as `/models/{model}:generateContent`.
    pub model: String,

    /// Base URL of the Generative Language API, without a trailing slash.
    pub endpoint: String,

    /// Sampling temperature. Low values keep answers consistent.
    pub temperature: f32,

    /// Name of the environment variable holding the API key.
    pub api_key_env: String,

    /// Whole-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            temperature: 0.2,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            timeout_secs: 30,
        }
    }
}

impl OracleConfig {
    /// Parse `s` as TOML.
    ///
    /// Returns `DishDoseError::Config` if the TOML is malformed or a field
    /// has the wrong type, or if the values make no sense.
    pub fn from_toml_str(s: &str) -> DishDoseResult<Self> {
        let config: OracleConfig = toml::from_str(s).map_err(|e| DishDoseError::Config {
            reason: format!("failed to parse oracle TOML: {}", e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read the file at `path` and parse it as TOML oracle configuration.
    pub fn from_file(path: &Path) -> DishDoseResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| DishDoseError::Config {
            reason: format!("failed to read oracle config '{}': {}", path.display(), e),
        })?;
        Self::from_toml_str(&contents)
    }

    /// The full `generateContent` URL for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }

    fn validate(&self) -> DishDoseResult<()> {
        if self.model.trim().is_empty() {
            return Err(DishDoseError::Config {
                reason: "model must not be empty".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(DishDoseError::Config {
                reason: format!("temperature {} is outside 0.0..=2.0", self.temperature),
            });
        }
        if self.timeout_secs == 0 {
            return Err(DishDoseError::Config {
                reason: "timeout_secs must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
