use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Search backend configuration
    #[serde(default)]
    pub backend: BackendConfig,

    /// Query engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: LOGHIVE_)
            .add_source(
                config::Environment::with_prefix("LOGHIVE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

/// Configuration of the Elasticsearch/OpenSearch-compatible backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the search cluster
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// Request timeout for the batched multi-search call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether query strings may start with a wildcard
    #[serde(default = "default_allow_leading_wildcard")]
    pub allow_leading_wildcard: bool,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_timeout_secs(),
            allow_leading_wildcard: default_allow_leading_wildcard(),
        }
    }
}

/// Configuration of the query engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of queries of one search executed concurrently
    #[serde(default = "default_max_concurrent_queries")]
    pub max_concurrent_queries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_queries: default_max_concurrent_queries(),
        }
    }
}

fn default_backend_url() -> String {
    "http://127.0.0.1:9200".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_allow_leading_wildcard() -> bool {
    true
}

fn default_max_concurrent_queries() -> usize {
    4
}
