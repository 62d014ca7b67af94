use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub listen: ListenConfig,
    #[serde(default)]
    pub appdir: Option<String>,
    #[serde(default)]
    pub tmdb: TmdbConfig,
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
    #[serde(skip)]
    pub debug_logs: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListenConfig {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default)]
    pub tlscert: Option<String>,
    #[serde(default)]
    pub tlskey: Option<String>,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: None,
            port: default_port(),
            tlscert: None,
            tlskey: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    #[serde(alias = "api_key", rename = "apikey")]
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(alias = "base_url", rename = "baseurl")]
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(alias = "image_base_url", rename = "imagebaseurl")]
    #[serde(default = "default_image_base_url")]
    pub image_base_url: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            image_base_url: default_image_base_url(),
            timeout: default_timeout(),
        }
    }
}

fn default_port() -> String {
    "8080".to_string()
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_image_base_url() -> String {
    "https://image.tmdb.org/t/p/original".to_string()
}

fn default_timeout() -> u64 {
    15
}

fn default_placeholder() -> String {
    "/assets/placeholder.svg".to_string()
}

pub const API_KEY_ENV: &str = "TMDB_API_KEY";

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(path.to_string(), e))?;

        Self::from_yaml(path, &content)
    }

    pub fn from_yaml(path: &str, content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::ParseError(path.to_string(), e))?;

        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.is_empty() {
                config.tmdb.api_key = Some(key);
            }
        }

        Ok(config)
    }

    pub fn api_key(&self) -> Result<&str, ConfigError> {
        self.tmdb
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(String, std::io::Error),
    #[error("Failed to parse config file {0}: {1}")]
    ParseError(String, serde_yaml::Error),
    #[error("No TMDB API key configured (set tmdb.apikey or {API_KEY_ENV})")]
    MissingApiKey,
}
