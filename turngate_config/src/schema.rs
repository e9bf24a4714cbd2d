use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    /// Environment base URL, including any routing query parameters
    /// (e.g. an api-version) that must ride along on every request.
    pub environment_url: String,
    /// Bearer token for the engine, if the environment requires one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Locale sent when starting a conversation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    /// Backoff delays in seconds, one per retry after the first attempt.
    #[serde(default = "ClientConfig::default_retry_delays_secs")]
    pub retry_delays_secs: Vec<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry_delays_secs: Self::default_retry_delays_secs(),
        }
    }
}

impl ClientConfig {
    fn default_retry_delays_secs() -> Vec<u64> {
        vec![2, 4, 6, 8]
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("turngate");

        let config_path = config_dir.join("config.json");

        if !config_path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'turngate init' to create config.",
                config_path.display()
            );
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_json::from_str(&content)?;

        Ok(config)
    }

    pub fn ensure_config_dir() -> anyhow::Result<PathBuf> {
        let config_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join("turngate");

        std::fs::create_dir_all(&config_dir)?;
        Ok(config_dir)
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_dir = Self::ensure_config_dir()?;
        let config_path = config_dir.join("config.json");

        if config_path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                config_path.display()
            );
        }

        let config_template = r#"{
  "engine": {
    "environment_url": "https://engine.example.com/environments/your-environment-id/?api-version=2022-03-01-preview",
    "token": "your-engine-token-here",
    "locale": "en-US"
  },
  "client": {
    "retry_delays_secs": [2, 4, 6, 8]
  }
}"#;

        std::fs::write(&config_path, config_template)?;

        println!("Created config file at: {}", config_path.display());
        println!();
        println!("Next steps:");
        println!("   1. Edit the config file and set your environment URL and token");
        println!("   2. Run 'turngate chat' to start a conversation");
        println!();
        println!("Configuration options:");
        println!("   - engine.environment_url: base URL of your engine environment");
        println!("   - engine.locale: locale sent when a conversation starts");
        println!("   - client.retry_delays_secs: backoff schedule for retried requests");
        println!();
        Ok(())
    }
}
