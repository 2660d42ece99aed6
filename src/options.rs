//! Typed invocation options for QianFan chat and embedding models

use serde::{Deserialize, Serialize};

/// Default chat model variant
pub const DEFAULT_CHAT_MODEL: &str = "ERNIE_Speed_8K";

/// Default sampling temperature for chat completions
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default embedding model variant
pub const DEFAULT_EMBEDDING_MODEL: &str = "bge_large_zh";

/// Response format requested from the model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    Text,
    JsonObject,
}

/// Chat model invocation options
///
/// Defaults are applied eagerly, so a freshly constructed value is already
/// usable without any external configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatOptions {
    model: String,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_CHAT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: None,
            max_tokens: None,
            frequency_penalty: None,
            presence_penalty: None,
            stop: None,
            response_format: None,
            user: None,
        }
    }
}

impl ChatOptions {
    /// Create new chat options with defaults applied
    pub fn new() -> Self {
        Self::default()
    }

    /// Get model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Get temperature
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Get top-p
    pub fn top_p(&self) -> Option<f32> {
        self.top_p
    }

    /// Set top-p
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    /// Get max tokens
    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Get frequency penalty
    pub fn frequency_penalty(&self) -> Option<f32> {
        self.frequency_penalty
    }

    /// Set frequency penalty
    pub fn with_frequency_penalty(mut self, penalty: f32) -> Self {
        self.frequency_penalty = Some(penalty);
        self
    }

    /// Get presence penalty
    pub fn presence_penalty(&self) -> Option<f32> {
        self.presence_penalty
    }

    /// Set presence penalty
    pub fn with_presence_penalty(mut self, penalty: f32) -> Self {
        self.presence_penalty = Some(penalty);
        self
    }

    /// Get stop sequences
    pub fn stop(&self) -> Option<&[String]> {
        self.stop.as_deref()
    }

    /// Set stop sequences
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Get response format
    pub fn response_format(&self) -> Option<ResponseFormat> {
        self.response_format
    }

    /// Set response format
    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }

    /// Get end-user identifier
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Set end-user identifier
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Merge per-request overrides into these options.
    ///
    /// Scalar fields (`model`, `temperature`) always come from the override;
    /// optional fields fall back to `self` when the override leaves them unset.
    pub fn merge(&self, overrides: &ChatOptions) -> ChatOptions {
        ChatOptions {
            model: overrides.model.clone(),
            temperature: overrides.temperature,
            top_p: overrides.top_p.or(self.top_p),
            max_tokens: overrides.max_tokens.or(self.max_tokens),
            frequency_penalty: overrides.frequency_penalty.or(self.frequency_penalty),
            presence_penalty: overrides.presence_penalty.or(self.presence_penalty),
            stop: overrides.stop.clone().or_else(|| self.stop.clone()),
            response_format: overrides.response_format.or(self.response_format),
            user: overrides.user.clone().or_else(|| self.user.clone()),
        }
    }
}

/// Embedding model invocation options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingOptions {
    model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

impl Default for EmbeddingOptions {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            user: None,
        }
    }
}

impl EmbeddingOptions {
    /// Create new embedding options with defaults applied
    pub fn new() -> Self {
        Self::default()
    }

    /// Get model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Set model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Get end-user identifier
    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Set end-user identifier
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_chat_options() {
        let options = ChatOptions::default();
        assert_eq!(options.model(), "ERNIE_Speed_8K");
        assert_eq!(options.temperature(), 0.7);
        assert_eq!(options.top_p(), None);
        assert_eq!(options.max_tokens(), None);
        assert_eq!(options.stop(), None);
    }

    #[test]
    fn test_chat_options_builder() {
        let options = ChatOptions::new()
            .with_model("ERNIE_4.0_8K")
            .with_temperature(0.2)
            .with_top_p(0.8)
            .with_max_tokens(2048);

        assert_eq!(options.model(), "ERNIE_4.0_8K");
        assert_eq!(options.temperature(), 0.2);
        assert_eq!(options.top_p(), Some(0.8));
        assert_eq!(options.max_tokens(), Some(2048));
    }

    #[test]
    fn test_merge_keeps_defaults_for_unset_fields() {
        let defaults = ChatOptions::new().with_top_p(0.9).with_max_tokens(1024);
        let overrides = ChatOptions::new().with_temperature(0.3);

        let merged = defaults.merge(&overrides);
        assert_eq!(merged.temperature(), 0.3);
        assert_eq!(merged.top_p(), Some(0.9));
        assert_eq!(merged.max_tokens(), Some(1024));
    }

    #[test]
    fn test_merge_override_wins_when_set() {
        let defaults = ChatOptions::new().with_top_p(0.9);
        let overrides = ChatOptions::new().with_top_p(0.5).with_user("req-42");

        let merged = defaults.merge(&overrides);
        assert_eq!(merged.top_p(), Some(0.5));
        assert_eq!(merged.user(), Some("req-42"));
    }

    #[test]
    fn test_unset_fields_are_omitted_from_serialization() {
        let options = ChatOptions::default();
        let json = serde_json::to_string(&options).unwrap();
        assert!(json.contains("\"model\""));
        assert!(!json.contains("top_p"));
        assert!(!json.contains("stop"));
    }

    #[test]
    fn test_response_format_wire_names() {
        let json = serde_json::to_string(&ResponseFormat::JsonObject).unwrap();
        assert_eq!(json, "\"json_object\"");
        let json = serde_json::to_string(&ResponseFormat::Text).unwrap();
        assert_eq!(json, "\"text\"");
    }

    #[test]
    fn test_default_embedding_options() {
        let options = EmbeddingOptions::default();
        assert_eq!(options.model(), "bge_large_zh");
        assert_eq!(options.user(), None);
    }
}
