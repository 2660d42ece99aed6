use crate::binder;
use crate::options::{ChatOptions, EmbeddingOptions};
use crate::{QianFanError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Dotted-key namespace for the chat section
pub const CHAT_CONFIG_PREFIX: &str = "qianfan.chat";

/// Dotted-key namespace for the embedding section
pub const EMBEDDING_CONFIG_PREFIX: &str = "qianfan.embedding";

/// Default QianFan API base URL
pub const DEFAULT_BASE_URL: &str = "https://aip.baidubce.com";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// Configuration for the QianFan client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Connection settings shared by all model sections
    pub connection: ConnectionConfig,

    /// Chat model settings
    pub chat: ChatProperties,

    /// Embedding model settings
    pub embedding: EmbeddingProperties,
}

/// Connection settings shared by the chat and embedding sections
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectionConfig {
    /// API key used for the access-token exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Secret key used for the access-token exchange
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Base URL of the QianFan API
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            secret_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

/// Chat model settings, pre-seeded with usable defaults.
///
/// The held options value always exists; external configuration overrides
/// it in place or replaces it wholesale via [`ChatProperties::set_options`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatProperties {
    enabled: bool,
    options: ChatOptions,
}

impl Default for ChatProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            options: ChatOptions::default(),
        }
    }
}

impl ChatProperties {
    /// Whether the chat section is enabled
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the chat section
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Get the held chat options
    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    /// Get the held chat options for in-place mutation
    pub fn options_mut(&mut self) -> &mut ChatOptions {
        &mut self.options
    }

    /// Replace the held chat options wholesale
    pub fn set_options(&mut self, options: ChatOptions) {
        self.options = options;
    }
}

/// Embedding model settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingProperties {
    enabled: bool,
    options: EmbeddingOptions,
}

impl Default for EmbeddingProperties {
    fn default() -> Self {
        Self {
            enabled: true,
            options: EmbeddingOptions::default(),
        }
    }
}

impl EmbeddingProperties {
    /// Whether the embedding section is enabled
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable the embedding section
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Get the held embedding options
    pub fn options(&self) -> &EmbeddingOptions {
        &self.options
    }

    /// Get the held embedding options for in-place mutation
    pub fn options_mut(&mut self) -> &mut EmbeddingOptions {
        &mut self.options
    }

    /// Replace the held embedding options wholesale
    pub fn set_options(&mut self, options: EmbeddingOptions) {
        self.options = options;
    }
}

impl Config {
    /// Load configuration from well-known locations.
    ///
    /// Missing files fall back to defaults; a file that exists but fails to
    /// parse aborts startup. Environment variables are applied last.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "qianfan.toml",
            "config/qianfan.toml",
            "~/.config/qianfan/config.toml",
            "/etc/qianfan/config.toml",
        ];

        let mut config = None;
        for path in &config_paths {
            if Path::new(path).exists() {
                config = Some(Self::load_path(path)?);
                break;
            }
        }

        let mut config = match config {
            Some(config) => config,
            None => {
                tracing::info!("No configuration file found, using defaults");
                Self::default()
            }
        };

        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file.
    ///
    /// Missing keys keep their defaults, so partial files are valid.
    pub fn load_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&config_str)?;
        tracing::info!("📄 Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `QIANFAN_*` environment variables on top of the current values
    pub fn apply_env(&mut self) -> Result<()> {
        let env_keys = [
            ("QIANFAN_API_KEY", "qianfan.api_key"),
            ("QIANFAN_SECRET_KEY", "qianfan.secret_key"),
            ("QIANFAN_BASE_URL", "qianfan.base_url"),
            ("QIANFAN_TIMEOUT_SECONDS", "qianfan.timeout_seconds"),
            ("QIANFAN_CHAT_ENABLED", "qianfan.chat.enabled"),
            ("QIANFAN_CHAT_MODEL", "qianfan.chat.options.model"),
            ("QIANFAN_CHAT_TEMPERATURE", "qianfan.chat.options.temperature"),
            ("QIANFAN_EMBEDDING_MODEL", "qianfan.embedding.options.model"),
        ];

        let mut entries = Vec::new();
        for (env_key, config_key) in &env_keys {
            if let Ok(value) = std::env::var(env_key) {
                if !value.is_empty() {
                    entries.push((*config_key, value));
                }
            }
        }

        binder::bind(self, entries.iter().map(|(k, v)| (*k, v.as_str())))
    }

    /// Apply dotted-key overrides through the binder
    pub fn apply_overrides<'a>(
        &mut self,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<()> {
        binder::bind(self, entries)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let config_str = toml::to_string_pretty(self)
            .map_err(|e| QianFanError::Configuration(format!("serialize failed: {e}")))?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let temperature = self.chat.options().temperature();
        if !(0.0..=1.0).contains(&temperature) {
            return Err(QianFanError::Configuration(format!(
                "chat temperature must be within [0.0, 1.0], got {temperature}"
            )));
        }

        if let Some(top_p) = self.chat.options().top_p() {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(QianFanError::Configuration(format!(
                    "chat top_p must be within [0.0, 1.0], got {top_p}"
                )));
            }
        }

        if self.chat.options().model().is_empty() {
            return Err(QianFanError::Configuration(
                "chat model must not be empty".to_string(),
            ));
        }

        if self.embedding.options().model().is_empty() {
            return Err(QianFanError::Configuration(
                "embedding model must not be empty".to_string(),
            ));
        }

        if self.connection.timeout_seconds == 0 {
            return Err(QianFanError::Configuration(
                "timeout_seconds must be greater than 0".to_string(),
            ));
        }

        url::Url::parse(&self.connection.base_url).map_err(|e| {
            QianFanError::Configuration(format!(
                "invalid base_url {}: {e}",
                self.connection.base_url
            ))
        })?;

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "QianFan Client Configuration:\n\
            - Base URL: {}\n\
            - API Key: {}\n\
            - Timeout: {}s\n\
            - Chat Enabled: {}\n\
            - Chat Model: {}\n\
            - Chat Temperature: {}\n\
            - Embedding Enabled: {}\n\
            - Embedding Model: {}",
            self.connection.base_url,
            if self.connection.api_key.is_some() {
                "configured"
            } else {
                "not set"
            },
            self.connection.timeout_seconds,
            self.chat.enabled(),
            self.chat.options().model(),
            self.chat.options().temperature(),
            self.embedding.enabled(),
            self.embedding.options().model(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connection.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.connection.timeout_seconds, 60);
        assert!(config.chat.enabled());
        assert_eq!(config.chat.options().model(), "ERNIE_Speed_8K");
        assert_eq!(config.chat.options().temperature(), 0.7);
        assert_eq!(config.embedding.options().model(), "bge_large_zh");
    }

    #[test]
    fn test_set_options_replaces_wholesale() {
        let mut config = Config::default();
        let options = ChatOptions::new()
            .with_model("ERNIE_4.0_8K")
            .with_temperature(0.2);

        config.chat.set_options(options.clone());
        assert_eq!(config.chat.options(), &options);
    }

    #[test]
    fn test_config_validation_passes_for_defaults() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_out_of_range_temperature() {
        let mut config = Config::default();
        let options = config.chat.options().clone().with_temperature(1.5);
        config.chat.set_options(options);

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }

    #[test]
    fn test_config_validation_rejects_invalid_base_url() {
        let mut config = Config::default();
        config.connection.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_zero_timeout() {
        let mut config = Config::default();
        config.connection.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = Config::default();
        config.connection.api_key = Some("ak".to_string());
        let options = config.chat.options().clone().with_max_tokens(2048);
        config.chat.set_options(options);

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_merges_into_defaults() {
        let toml_str = r#"
            [chat.options]
            temperature = 0.9
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.chat.options().temperature(), 0.9);
        assert_eq!(config.chat.options().model(), "ERNIE_Speed_8K");
        assert_eq!(config.connection.base_url, DEFAULT_BASE_URL);
    }
}
