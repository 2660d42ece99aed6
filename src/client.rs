//! QianFan chat client construction and dispatch
//!
//! The client is built once from finalized connection settings and chat
//! options; the access-token exchange happens eagerly at construction so a
//! misconfigured client never reaches the request path.

use crate::config::{Config, ConnectionConfig};
use crate::options::{ChatOptions, ResponseFormat};
use crate::{QianFanError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Chat message exchanged with the model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    role: String,
    content: String,
}

impl ChatMessage {
    /// Create new chat message
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }

    /// Get role
    pub fn role(&self) -> &str {
        &self.role
    }

    /// Get content
    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Chat completion result
#[derive(Debug, Clone)]
pub struct ChatResponse {
    content: String,
    tokens_used: Option<u32>,
}

impl ChatResponse {
    /// Create new chat response
    pub fn new(content: String, tokens_used: Option<u32>) -> Self {
        Self {
            content,
            tokens_used,
        }
    }

    /// Get content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get tokens used
    pub fn tokens_used(&self) -> Option<u32> {
        self.tokens_used
    }
}

/// Trait for chat model backends
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send messages using the resolved default options
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse>;

    /// Finalized options this model was constructed with
    fn default_options(&self) -> &ChatOptions;
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(rename = "max_output_tokens", skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    presence_penalty: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    #[serde(rename = "user_id", skip_serializing_if = "Option::is_none")]
    user: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    result: Option<String>,
    usage: Option<ChatApiUsage>,
    error_code: Option<i64>,
    error_msg: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatApiUsage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// QianFan chat client
#[derive(Debug)]
pub struct ChatClient {
    connection: ConnectionConfig,
    options: ChatOptions,
    access_token: String,
    client: reqwest::Client,
}

impl ChatClient {
    /// Build a client from finalized settings.
    ///
    /// Exchanges the configured key pair for an access token; fails fast on
    /// missing credentials or a rejected exchange.
    pub async fn connect(connection: ConnectionConfig, options: ChatOptions) -> Result<Self> {
        let api_key = connection.api_key.clone().ok_or_else(|| {
            QianFanError::Configuration("api_key is required to build a chat client".to_string())
        })?;
        let secret_key = connection.secret_key.clone().ok_or_else(|| {
            QianFanError::Configuration("secret_key is required to build a chat client".to_string())
        })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(connection.timeout_seconds))
            .build()?;

        let access_token =
            fetch_access_token(&client, &connection.base_url, &api_key, &secret_key).await?;

        Ok(Self {
            connection,
            options,
            access_token,
            client,
        })
    }

    /// Build a client from a loaded configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        if !config.chat.enabled() {
            return Err(QianFanError::Configuration(
                "chat section is disabled".to_string(),
            ));
        }
        Self::connect(config.connection.clone(), config.chat.options().clone()).await
    }

    /// Send messages with per-request overrides merged into the defaults
    pub async fn chat_with_options(
        &self,
        messages: Vec<ChatMessage>,
        overrides: &ChatOptions,
    ) -> Result<ChatResponse> {
        let options = self.options.merge(overrides);
        self.dispatch(messages, &options).await
    }

    async fn dispatch(
        &self,
        messages: Vec<ChatMessage>,
        options: &ChatOptions,
    ) -> Result<ChatResponse> {
        let request = build_request(messages, options);
        let endpoint = self.chat_endpoint(options.model());

        debug!("Sending chat request for model {}", options.model());

        let response = self.client.post(&endpoint).json(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(QianFanError::ResponseError(format!(
                "QianFan API error {status}: {text}"
            )));
        }

        let api_response: ChatApiResponse = response.json().await?;

        if let Some(code) = api_response.error_code {
            return Err(QianFanError::ResponseError(format!(
                "QianFan error {code}: {}",
                api_response.error_msg.unwrap_or_default()
            )));
        }

        let content = api_response
            .result
            .ok_or_else(|| QianFanError::ResponseError("empty completion result".to_string()))?;
        let tokens_used = api_response.usage.map(|u| u.total_tokens);

        Ok(ChatResponse::new(content, tokens_used))
    }

    // Model names map to lowercase path segments on the wire.
    fn chat_endpoint(&self, model: &str) -> String {
        format!(
            "{}/rpc/2.0/ai_custom/v1/wenxinworkshop/chat/{}?access_token={}",
            self.connection.base_url.trim_end_matches('/'),
            model.to_lowercase(),
            self.access_token,
        )
    }
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<ChatResponse> {
        self.dispatch(messages, &self.options).await
    }

    fn default_options(&self) -> &ChatOptions {
        &self.options
    }
}

fn build_request(messages: Vec<ChatMessage>, options: &ChatOptions) -> ChatRequest {
    ChatRequest {
        messages,
        temperature: options.temperature(),
        top_p: options.top_p(),
        max_tokens: options.max_tokens(),
        frequency_penalty: options.frequency_penalty(),
        presence_penalty: options.presence_penalty(),
        stop: options.stop().map(|s| s.to_vec()),
        response_format: options.response_format(),
        user: options.user().map(|u| u.to_string()),
    }
}

async fn fetch_access_token(
    client: &reqwest::Client,
    base_url: &str,
    api_key: &str,
    secret_key: &str,
) -> Result<String> {
    let token_url = format!("{}/oauth/2.0/token", base_url.trim_end_matches('/'));

    let response = client
        .post(&token_url)
        .query(&[
            ("grant_type", "client_credentials"),
            ("client_id", api_key),
            ("client_secret", secret_key),
        ])
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        return Err(QianFanError::Authentication(format!(
            "token exchange failed with status {status}"
        )));
    }

    let token: TokenResponse = response.json().await?;
    match token.access_token {
        Some(token) => Ok(token),
        None => Err(QianFanError::Authentication(format!(
            "token exchange rejected: {} {}",
            token.error.unwrap_or_default(),
            token.error_description.unwrap_or_default()
        ))),
    }
}

/// Mock chat model for testing downstream consumers
pub struct MockChatModel {
    options: ChatOptions,
    reply: String,
}

impl MockChatModel {
    pub fn new(options: ChatOptions) -> Self {
        Self {
            options,
            reply: "Mock response".to_string(),
        }
    }

    pub fn with_reply(mut self, reply: impl Into<String>) -> Self {
        self.reply = reply.into();
        self
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, _messages: Vec<ChatMessage>) -> Result<ChatResponse> {
        Ok(ChatResponse::new(self.reply.clone(), Some(10)))
    }

    fn default_options(&self) -> &ChatOptions {
        &self.options
    }
}
