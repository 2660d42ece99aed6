//! QianFan Client - typed configuration and client construction for Baidu QianFan (ERNIE) chat models

pub mod binder;
pub mod client;
pub mod config;
pub mod options;

pub use binder::bind;
pub use client::{ChatClient, ChatMessage, ChatModel, ChatResponse, MockChatModel};
pub use config::{ChatProperties, Config, ConnectionConfig, EmbeddingProperties};
pub use options::{ChatOptions, EmbeddingOptions, ResponseFormat};

/// Result type for QianFan operations
pub type Result<T> = std::result::Result<T, QianFanError>;

/// Error types for QianFan operations
#[derive(thiserror::Error, Debug)]
pub enum QianFanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("QianFan response error: {0}")]
    ResponseError(String),
}
