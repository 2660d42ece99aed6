//! Dotted-key binder mapping external configuration onto [`Config`]
//!
//! Replaces reflection-driven property injection with explicit field-path
//! matching. Keys live under the `qianfan.` namespace; everything outside it
//! is ignored, unrecognized keys inside it abort startup.

use crate::config::Config;
use crate::options::ResponseFormat;
use crate::{QianFanError, Result};

/// Root namespace for all recognized keys
pub const NAMESPACE: &str = "qianfan.";

/// Apply dotted-key entries onto a pre-seeded configuration.
///
/// Values merge into the current state: supplying only
/// `qianfan.chat.options.temperature` leaves every other field untouched.
pub fn bind<'a>(
    config: &mut Config,
    entries: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<()> {
    for (key, value) in entries {
        let Some(path) = key.strip_prefix(NAMESPACE) else {
            tracing::debug!("Ignoring key outside namespace: {}", key);
            continue;
        };
        apply(config, path, key, value)?;
    }
    Ok(())
}

fn apply(config: &mut Config, path: &str, key: &str, value: &str) -> Result<()> {
    match path {
        "api_key" => config.connection.api_key = Some(value.to_string()),
        "secret_key" => config.connection.secret_key = Some(value.to_string()),
        "base_url" => config.connection.base_url = value.to_string(),
        "timeout_seconds" => config.connection.timeout_seconds = parse_u64(key, value)?,

        "chat.enabled" => config.chat.set_enabled(parse_bool(key, value)?),
        "chat.options.model" => {
            let options = config.chat.options().clone().with_model(value);
            config.chat.set_options(options);
        }
        "chat.options.temperature" => {
            let options = config
                .chat
                .options()
                .clone()
                .with_temperature(parse_f32(key, value)?);
            config.chat.set_options(options);
        }
        "chat.options.top_p" => {
            let options = config
                .chat
                .options()
                .clone()
                .with_top_p(parse_f32(key, value)?);
            config.chat.set_options(options);
        }
        "chat.options.max_tokens" => {
            let options = config
                .chat
                .options()
                .clone()
                .with_max_tokens(parse_u32(key, value)?);
            config.chat.set_options(options);
        }
        "chat.options.frequency_penalty" => {
            let options = config
                .chat
                .options()
                .clone()
                .with_frequency_penalty(parse_f32(key, value)?);
            config.chat.set_options(options);
        }
        "chat.options.presence_penalty" => {
            let options = config
                .chat
                .options()
                .clone()
                .with_presence_penalty(parse_f32(key, value)?);
            config.chat.set_options(options);
        }
        "chat.options.stop" => {
            let stop = value
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            let options = config.chat.options().clone().with_stop(stop);
            config.chat.set_options(options);
        }
        "chat.options.response_format" => {
            let options = config
                .chat
                .options()
                .clone()
                .with_response_format(parse_response_format(key, value)?);
            config.chat.set_options(options);
        }
        "chat.options.user" => {
            let options = config.chat.options().clone().with_user(value);
            config.chat.set_options(options);
        }

        "embedding.enabled" => config.embedding.set_enabled(parse_bool(key, value)?),
        "embedding.options.model" => {
            let options = config.embedding.options().clone().with_model(value);
            config.embedding.set_options(options);
        }
        "embedding.options.user" => {
            let options = config.embedding.options().clone().with_user(value);
            config.embedding.set_options(options);
        }

        _ => {
            return Err(QianFanError::Configuration(format!(
                "unrecognized configuration key: {key}"
            )));
        }
    }
    Ok(())
}

fn parse_f32(key: &str, value: &str) -> Result<f32> {
    value.parse().map_err(|_| {
        QianFanError::Configuration(format!("invalid number for {key}: {value:?}"))
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| {
        QianFanError::Configuration(format!("invalid integer for {key}: {value:?}"))
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64> {
    value.parse().map_err(|_| {
        QianFanError::Configuration(format!("invalid integer for {key}: {value:?}"))
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(QianFanError::Configuration(format!(
            "invalid boolean for {key}: {value:?}"
        ))),
    }
}

fn parse_response_format(key: &str, value: &str) -> Result<ResponseFormat> {
    match value {
        "text" => Ok(ResponseFormat::Text),
        "json_object" => Ok(ResponseFormat::JsonObject),
        _ => Err(QianFanError::Configuration(format!(
            "invalid response format for {key}: {value:?} (expected text or json_object)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_empty_leaves_defaults() {
        let mut config = Config::default();
        bind(&mut config, []).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_bind_overrides_chat_options() {
        let mut config = Config::default();
        bind(
            &mut config,
            [
                ("qianfan.chat.options.model", "ERNIE_4.0"),
                ("qianfan.chat.options.temperature", "0.2"),
            ],
        )
        .unwrap();

        assert_eq!(config.chat.options().model(), "ERNIE_4.0");
        assert_eq!(config.chat.options().temperature(), 0.2);
        // untouched fields keep their defaults
        assert_eq!(config.chat.options().top_p(), None);
        assert!(config.chat.enabled());
    }

    #[test]
    fn test_bind_partial_override_keeps_default_model() {
        let mut config = Config::default();
        bind(&mut config, [("qianfan.chat.options.temperature", "0.9")]).unwrap();

        assert_eq!(config.chat.options().temperature(), 0.9);
        assert_eq!(config.chat.options().model(), "ERNIE_Speed_8K");
    }

    #[test]
    fn test_bind_ignores_keys_outside_namespace() {
        let mut config = Config::default();
        bind(
            &mut config,
            [
                ("other.chat.options.model", "ERNIE_4.0"),
                ("qianfan_extra.chat.options.temperature", "0.1"),
                ("server.port", "8080"),
            ],
        )
        .unwrap();

        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_bind_rejects_unknown_key_in_namespace() {
        let mut config = Config::default();
        let err = bind(&mut config, [("qianfan.chat.options.modle", "x")]).unwrap_err();
        assert!(err.to_string().contains("qianfan.chat.options.modle"));
    }

    #[test]
    fn test_bind_rejects_non_numeric_temperature() {
        let mut config = Config::default();
        let err = bind(&mut config, [("qianfan.chat.options.temperature", "warm")]).unwrap_err();
        assert!(err.to_string().contains("invalid number"));
    }

    #[test]
    fn test_bind_connection_keys() {
        let mut config = Config::default();
        bind(
            &mut config,
            [
                ("qianfan.api_key", "ak-123"),
                ("qianfan.secret_key", "sk-456"),
                ("qianfan.base_url", "https://example.com"),
                ("qianfan.timeout_seconds", "30"),
            ],
        )
        .unwrap();

        assert_eq!(config.connection.api_key.as_deref(), Some("ak-123"));
        assert_eq!(config.connection.secret_key.as_deref(), Some("sk-456"));
        assert_eq!(config.connection.base_url, "https://example.com");
        assert_eq!(config.connection.timeout_seconds, 30);
    }

    #[test]
    fn test_bind_boolean_variants() {
        let mut config = Config::default();
        bind(&mut config, [("qianfan.chat.enabled", "off")]).unwrap();
        assert!(!config.chat.enabled());

        bind(&mut config, [("qianfan.chat.enabled", "1")]).unwrap();
        assert!(config.chat.enabled());

        let err = bind(&mut config, [("qianfan.chat.enabled", "maybe")]).unwrap_err();
        assert!(err.to_string().contains("invalid boolean"));
    }

    #[test]
    fn test_bind_stop_list_and_response_format() {
        let mut config = Config::default();
        bind(
            &mut config,
            [
                ("qianfan.chat.options.stop", "END, STOP"),
                ("qianfan.chat.options.response_format", "json_object"),
            ],
        )
        .unwrap();

        assert_eq!(
            config.chat.options().stop(),
            Some(&["END".to_string(), "STOP".to_string()][..])
        );
        assert_eq!(
            config.chat.options().response_format(),
            Some(ResponseFormat::JsonObject)
        );
    }

    #[test]
    fn test_bind_embedding_section() {
        let mut config = Config::default();
        bind(
            &mut config,
            [
                ("qianfan.embedding.options.model", "embedding-v1"),
                ("qianfan.embedding.enabled", "false"),
            ],
        )
        .unwrap();

        assert_eq!(config.embedding.options().model(), "embedding-v1");
        assert!(!config.embedding.enabled());
        // chat section untouched
        assert_eq!(config.chat.options().model(), "ERNIE_Speed_8K");
    }
}
