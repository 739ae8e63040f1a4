use std::time::Duration;

use config::ConfigError;
use serde::Deserialize;

use crate::{model::search_session::SessionSettings, utils};

const CONFIG: &str = include_str!("../../.config/config.json5");

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "ApiConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    fn default_timeout_secs() -> u64 {
        15
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:8000/api"),
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct SearchConfig {
    pub debounce_ms: u64,
    pub min_query_len: usize,
    pub page_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            min_query_len: 2,
            page_size: 50,
        }
    }
}

impl SearchConfig {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            debounce: Duration::from_millis(self.debounce_ms),
            min_query_len: self.min_query_len,
            page_size: self.page_size,
        }
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ScrollConfig {
    pub threshold: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self { threshold: 0.1 }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub user_id: i64,
}

impl Config {
    /// Layer the embedded defaults, user files and `EPICSEARCH_*` variables
    ///
    /// The result is not validated, so that command line overrides can still
    /// fill in required keys.
    pub fn load() -> Result<Self, ConfigError> {
        let config_dir = utils::get_config_dir();
        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(CONFIG, config::FileFormat::Json5));

        let config_files = [
            ("config.json5", config::FileFormat::Json5),
            ("config.json", config::FileFormat::Json),
            ("config.yaml", config::FileFormat::Yaml),
            ("config.toml", config::FileFormat::Toml),
            ("config.ini", config::FileFormat::Ini),
        ];
        for (file, format) in &config_files {
            let path = config_dir.join(file);
            if path.exists() {
                log::info!("Loading configuration from {}", path.display());
            }
            builder = builder.add_source(config::File::from(path).format(*format).required(false));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(utils::logging::PROJECT_NAME.as_str())
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Parse the embedded defaults only
    pub fn embedded() -> Result<Self, ConfigError> {
        json5::from_str(CONFIG)
            .map_err(|e| ConfigError::Message(format!("Failed to load default config: {e}")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.user_id == 0 {
            return Err(ConfigError::NotFound(String::from("user_id")));
        }
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::NotFound(String::from("api.base_url")));
        }
        if self.search.page_size == 0 {
            return Err(ConfigError::Message(String::from(
                "search.page_size must be positive",
            )));
        }
        if !(0.0..=1.0).contains(&self.scroll.threshold) {
            return Err(ConfigError::Message(format!(
                "scroll.threshold must be within [0, 1], got {}",
                self.scroll.threshold
            )));
        }
        Ok(())
    }
}
