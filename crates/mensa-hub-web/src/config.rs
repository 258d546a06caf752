use std::collections::HashMap;
use std::net::IpAddr;

use mensa_hub_data::SourceKind;
use tokio::fs;

pub async fn read() -> anyhow::Result<Config> {
    let config_path = "mensa_hub.toml";

    let config = if fs::try_exists(config_path).await? {
        tracing::info!("reading config file {config_path}");
        let config = toml::from_str(&fs::read_to_string(config_path).await?)?;
        tracing::info!("read config");
        config
    } else {
        tracing::info!("config does not exist, using default config");
        Config::default()
    };

    tracing::info!("using config: {config:#?}");
    Ok(config)
}

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub db: DbConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub images: ImagesConfig,
    #[serde(default)]
    pub feed: Option<FeedConfig>,
    /// which side a document query hits first, `server` or `cache`
    #[serde(default)]
    pub primary_source: SourceKind,
}

#[derive(Debug, serde::Deserialize)]
pub struct ServerConfig {
    pub address: IpAddr,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        #[cfg(not(debug_assertions))]
        tracing::warn!("using default server config in release");

        Self {
            address: IpAddr::from([0, 0, 0, 0]),
            port: 3000,
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct DbConfig {
    pub url: String,
    pub database: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: format!("mongodb://localhost:27017"),
            database: format!("mensa_hub"),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct StoreConfig {
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: format!("additives.db"),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct ImagesConfig {
    pub default_image: String,
    #[serde(default)]
    pub entries: HashMap<String, String>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            default_image: format!("images/default.png"),
            entries: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct FeedConfig {
    pub url: String,
}
