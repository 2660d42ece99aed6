use anyhow::Result;
use clap::{Arg, Command};
use qianfan_client::{ChatClient, ChatMessage, ChatModel, Config};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("qianfan_client=info,warn")
        .init();

    let matches = Command::new("QianFan Client")
        .version("0.1.0")
        .about("Typed configuration and client construction for Baidu QianFan chat models")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::new("set")
                .short('s')
                .long("set")
                .value_name("KEY=VALUE")
                .help("Dotted-key override, e.g. qianfan.chat.options.temperature=0.2")
                .action(clap::ArgAction::Append),
        )
        .arg(
            Arg::new("show-config")
                .long("show-config")
                .help("Print the resolved configuration and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("prompt")
                .short('p')
                .long("prompt")
                .value_name("TEXT")
                .help("Send a single prompt through the configured chat model"),
        )
        .get_matches();

    // Load configuration
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            let mut config = Config::load_path(path)?;
            config.apply_env()?;
            config
        }
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };

    // Apply command-line overrides through the binder
    let mut overrides: Vec<(String, String)> = Vec::new();
    if let Some(entries) = matches.get_many::<String>("set") {
        for entry in entries {
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                anyhow::anyhow!("invalid override (expected KEY=VALUE): {entry}")
            })?;
            overrides.push((key.to_string(), value.to_string()));
        }
    }
    config.apply_overrides(overrides.iter().map(|(k, v)| (k.as_str(), v.as_str())))?;

    config.validate()?;

    if matches.get_flag("show-config") {
        println!("{}", config.summary());
        return Ok(());
    }

    if let Some(prompt) = matches.get_one::<String>("prompt") {
        info!("🚀 Connecting to QianFan at {}", config.connection.base_url);
        let client = ChatClient::from_config(&config).await?;

        let response = client.chat(vec![ChatMessage::user(prompt)]).await?;
        if let Some(tokens) = response.tokens_used() {
            info!("📊 Tokens used: {}", tokens);
        }
        println!("{}", response.content());
    } else {
        println!("{}", config.summary());
    }

    Ok(())
}
