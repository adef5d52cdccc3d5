use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{BmoError, Result};

/// Default instruction prepended to every chat call. Never stored in history.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are BMO, an autonomous campus tour guide robot at \
Alamein International University. Respond with helpful directions, friendly tone, and actionable \
navigation steps. Always answer using compact JSON with the keys: narration (string), destination \
(string), directions (array of strings), and mode (one of: NAVIGATING, SPEAKING). If the user \
request does not require navigation, set destination to \"General\" and mode to SPEAKING.";

/// Top-level configuration for the BMO backend.
///
/// Loaded from `~/.bmo/config.toml` by default, then overlaid with
/// environment variables. Each section maps to one collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BmoConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub sessions: SessionsConfig,
}

impl BmoConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: BmoConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Overlay values from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary key lookup.
    ///
    /// Recognised keys: `OPENROUTER_API_KEY`, `OPENROUTER_MODEL`,
    /// `OPENROUTER_MODELS` (comma-separated), `OPENAI_API_KEY`,
    /// `BMO_DEFAULT_GREETING`, `BMO_HOST`, `BMO_PORT`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENROUTER_API_KEY") {
            self.openrouter.api_key = key;
        }
        if let Some(model) = lookup("OPENROUTER_MODEL") {
            self.openrouter.model = model.trim().to_string();
        }
        if let Some(models) = lookup("OPENROUTER_MODELS") {
            self.openrouter.models = models
                .split(',')
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.speech.api_key = key;
        }
        if let Some(greeting) = lookup("BMO_DEFAULT_GREETING") {
            self.conversation.greeting = greeting;
        }
        if let Some(host) = lookup("BMO_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("BMO_PORT") {
            match port.parse::<u16>() {
                Ok(p) => self.server.port = p,
                Err(_) => warn!(value = %port, "Ignoring invalid BMO_PORT"),
            }
        }
    }

    /// Check that the configuration is usable for serving turns.
    pub fn validate(&self) -> Result<()> {
        if self.openrouter.api_key.trim().is_empty() {
            return Err(BmoError::Config(
                "openrouter.api_key is required (set OPENROUTER_API_KEY)".to_string(),
            ));
        }
        if self.speech.api_key.trim().is_empty() {
            return Err(BmoError::Config(
                "speech.api_key is required (set OPENAI_API_KEY)".to_string(),
            ));
        }
        if self.openrouter.max_attempts == 0 {
            return Err(BmoError::Config(
                "openrouter.max_attempts must be at least 1".to_string(),
            ));
        }
        let has_model = !self.openrouter.model.trim().is_empty()
            || self.openrouter.models.iter().any(|m| !m.trim().is_empty());
        if !has_model {
            return Err(BmoError::Config(
                "at least one OpenRouter model must be configured".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Application name, sent to OpenRouter as `X-Title`.
    pub app_name: String,
    /// Public URL of the frontend, sent to OpenRouter as `HTTP-Referer`.
    pub app_url: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_name: "BMO Backend".to_string(),
            app_url: "http://localhost:3000".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer.
    pub cors_origins: Vec<String>,
    /// Maximum accepted request body size.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "https://localhost:3000".to_string(),
            ],
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Chat backend settings and the fallback/retry policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenRouterConfig {
    pub api_key: String,
    pub base_url: String,
    /// Preferred model; always tried first when set.
    pub model: String,
    /// Ordered fallback models.
    pub models: Vec<String>,
    pub temperature: f32,
    /// Upper bound for a single chat call.
    pub request_timeout_secs: u64,
    /// Attempts per model for transient and rate-limit failures.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub initial_backoff_ms: u64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://openrouter.ai/api/v1".to_string(),
            model: "google/gemini-2.0-flash-exp:free".to_string(),
            models: vec![
                "google/gemini-2.0-flash-exp:free".to_string(),
                "meta-llama/llama-3.3-70b-instruct:free".to_string(),
                "qwen/qwen-2.5-72b-instruct:free".to_string(),
                "mistralai/mistral-nemo:free".to_string(),
            ],
            temperature: 0.2,
            request_timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 1000,
        }
    }
}

/// Speech synthesis settings (OpenAI-compatible `/audio/speech`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub voice: String,
    pub request_timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Conversation content settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// First assistant turn of every session.
    pub greeting: String,
    /// Instruction prepended to each chat call.
    pub system_prompt: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            greeting: "Hello! I’m BMO, your tour companion.".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Session eviction settings. Both unset means sessions live until shutdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionsConfig {
    /// Cap on live sessions; the least recently active one is evicted.
    pub max_sessions: Option<usize>,
    /// Sessions idle for longer than this are purged.
    pub max_idle_minutes: Option<u32>,
}
