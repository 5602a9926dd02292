use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the Zen responder.
///
/// Loaded from `~/.zen/config.toml` by default. Each section corresponds
/// to one concern of the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZenConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
}

impl ZenConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ZenConfig = toml::from_str(&content)?;
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
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Response engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Probability (0.0 to 1.0) of prefixing a reply with a seasonal phrase.
    pub seasonal_probability: f64,
    /// Total number of generations tried before an invalid reply is accepted.
    pub max_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            seasonal_probability: 0.3,
            max_attempts: 3,
        }
    }
}

/// Pacing of the mock streaming path.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Delay before each character frame, in milliseconds.
    pub char_delay_ms: u64,
    /// Simulated thinking time before generation starts, in milliseconds.
    pub thinking_delay_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            char_delay_ms: 40,
            thinking_delay_ms: 1000,
        }
    }
}

/// External text-generation service settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Force the local template path even when a key is present.
    pub mock_mode: bool,
    /// API key for the OpenAI-compatible endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            mock_mode: false,
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 200,
            temperature: 0.8,
            timeout_secs: 60,
        }
    }
}

impl UpstreamConfig {
    /// Whether requests should skip the upstream model entirely.
    ///
    /// True when mock mode is forced or no usable key is configured.
    pub fn use_mock(&self) -> bool {
        self.mock_mode || self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
    }
}
