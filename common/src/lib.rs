/*!
common/src/lib.rs

Shared configuration types for the annotator service.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a default + override pair of config files
- Environment overrides for the collaborator hostnames
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Downstream collaborator endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    /// Base URL of the database service (aggregations and posts)
    pub db_host: String,
    /// Base URL of the LLM analysis service
    pub llm_host: String,
    /// Base URL of the scraper service
    pub scraper_host: String,
    /// Base URL of the recommender service
    pub recommender_host: String,
    /// Base URL of the topic-clustering service
    pub clustering_host: String,
    /// Transport timeout applied to every collaborator request
    pub timeout_seconds: Option<u64>,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            db_host: "http://localhost:8000".to_string(),
            llm_host: "http://localhost:8030".to_string(),
            scraper_host: "http://localhost:8040".to_string(),
            recommender_host: "http://localhost:8050".to_string(),
            clustering_host: "http://localhost:8060".to_string(),
            timeout_seconds: None,
        }
    }
}

impl ServicesConfig {
    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds.unwrap_or(30)
    }

    /// Check that every host parses as an absolute URL.
    pub fn validate(&self) -> Result<()> {
        for (name, host) in [
            ("db_host", &self.db_host),
            ("llm_host", &self.llm_host),
            ("scraper_host", &self.scraper_host),
            ("recommender_host", &self.recommender_host),
            ("clustering_host", &self.clustering_host),
        ] {
            url::Url::parse(host).with_context(|| format!("invalid {}: {}", name, host))?;
        }
        Ok(())
    }
}

/// Topic clustering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusteringConfig {
    pub model_name: String,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            model_name: "bert".to_string(),
        }
    }
}

/// Collage (post thumbnail) settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CollageConfig {
    /// Width in pixels of each grid tile
    pub tile_width: u32,
    /// Maximum number of member images in one collage
    pub max_images: usize,
}

impl Default for CollageConfig {
    fn default() -> Self {
        Self {
            tile_width: 500,
            max_images: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Also forward persisted post ids to the recommender
    pub notify_recommender: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            notify_recommender: true,
        }
    }
}

/// HTTP ingress bind settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8020,
        }
    }
}

/// Registration with the upstream publisher at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SubscriberConfig {
    pub enabled: bool,
    pub publisher_host: String,
    pub publisher_port: u16,
    /// Address the publisher should call back on
    pub subscriber_host: String,
    pub subscriber_port: u16,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            publisher_host: "localhost".to_string(),
            publisher_port: 8010,
            subscriber_host: "localhost".to_string(),
            subscriber_port: 8020,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub services: ServicesConfig,
    pub clustering: ClusteringConfig,
    pub collage: CollageConfig,
    pub dispatch: DispatchConfig,
    pub server: ServerConfig,
    pub subscriber: SubscriberConfig,
}

impl FromStr for Config {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        data.parse()
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Apply the process environment on top of the file configuration.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup. Unset or empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("DB_HOST") {
            self.services.db_host = v;
        }
        if let Some(v) = get("LLM_HOST") {
            self.services.llm_host = v;
        }
        if let Some(v) = get("SCRAPER_HOST") {
            self.services.scraper_host = v;
        }
        if let Some(v) = get("RECOMMENDER_HOST") {
            self.services.recommender_host = v;
        }
        if let Some(v) = get("CLUSTERING_HOST") {
            self.services.clustering_host = v;
        }
        if let Some(v) = get("MODEL_NAME") {
            self.clustering.model_name = v;
        }
        if let Some(v) = get("PUBLISHER_IP") {
            self.subscriber.publisher_host = v;
        }
        if let Some(v) = get("SUBSCRIBER_IP") {
            self.subscriber.subscriber_host = v;
        }
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
