//! CLI argument definitions for the Zen chat server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use clap::Parser;
use std::path::PathBuf;

use zen_core::config::ZenConfig;

/// Zen, a contemplative chat server that streams short reflective replies.
#[derive(Parser, Debug, Default)]
#[command(name = "zen", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Always answer from local templates, even if an API key is set.
    #[arg(long = "mock")]
    pub mock: bool,
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > ZEN_CONFIG env var > ~/.zen/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("ZEN_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the HTTP port.
    ///
    /// Priority: --port flag > ZEN_PORT env var > config file value.
    pub fn resolve_port(&self, config_port: u16) -> u16 {
        if let Some(p) = self.port {
            return p;
        }
        if let Some(p) = env_var("ZEN_PORT").and_then(|v| v.parse::<u16>().ok()) {
            return p;
        }
        config_port
    }

    /// Resolve whether mock mode is forced.
    ///
    /// Priority: --mock flag > USE_MOCK_MODE env var > config file value.
    pub fn resolve_mock_mode(&self, config_mock: bool) -> bool {
        if self.mock {
            return true;
        }
        env_var("USE_MOCK_MODE")
            .map(|v| parse_bool(&v))
            .unwrap_or(config_mock)
    }

    /// Resolve the upstream API key.
    ///
    /// Priority: OPENAI_API_KEY env var > config file value.
    pub fn resolve_api_key(&self, config_key: Option<String>) -> Option<String> {
        env_var("OPENAI_API_KEY").or(config_key)
    }

    /// Resolve the log level.
    ///
    /// Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Fold every override into a loaded configuration.
    pub fn apply(&self, config: &mut ZenConfig) {
        config.server.port = self.resolve_port(config.server.port);
        config.upstream.mock_mode = self.resolve_mock_mode(config.upstream.mock_mode);
        config.upstream.api_key = self.resolve_api_key(config.upstream.api_key.take());
        config.general.log_level = self.resolve_log_level(&config.general.log_level);
    }
}

/// Non-empty value of an environment variable.
fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".zen").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".zen").join("config.toml");
    }
    PathBuf::from("config.toml")
}
