//! TOML-based configuration for Delve
//!
//! Providers, models, per-role agent settings and pipeline tuning are declared
//! in `delve.toml`. The file is read once at startup, validated, and shared
//! read-only behind an `Arc` for the lifetime of the process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration structure loaded from delve.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelveConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Named LLM provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Named model configurations that reference providers
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Model assignment for each research role
    pub agents: AgentsConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub charts: ChartConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        default_model: String,
    },
    OpenAI {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        default_model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

// ============= Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference to a provider name defined in [providers]
    pub provider: String,

    /// Model name/identifier to use with the provider
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_model_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_model_max_tokens() -> u32 {
    4096
}

// ============= Agent Configuration =============

/// A single research role bound to a model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleConfig {
    /// Reference to a model name defined in [models]
    pub model: String,

    /// Replaces the built-in instructions for this role
    #[serde(default)]
    pub system_prompt: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    pub planner: RoleConfig,
    pub search: RoleConfig,
    pub writer: RoleConfig,
    /// Only required when browsing is used
    #[serde(default)]
    pub browser: Option<RoleConfig>,
}

impl AgentsConfig {
    fn roles(&self) -> Vec<(&'static str, &RoleConfig)> {
        let mut roles = vec![
            ("planner", &self.planner),
            ("search", &self.search),
            ("writer", &self.writer),
        ];
        if let Some(browser) = &self.browser {
            roles.push(("browser", browser));
        }
        roles
    }
}

// ============= Pipeline Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound for every external agent call; 0 disables the limit
    #[serde(default = "default_agent_timeout")]
    pub agent_timeout_secs: u64,

    /// Run the browsing stage by default
    #[serde(default)]
    pub browse: bool,

    /// Maximum number of search intents kept from the plan
    #[serde(default = "default_max_searches")]
    pub max_searches: usize,

    /// Web results fed to the search summariser per intent
    #[serde(default = "default_search_results")]
    pub search_results_per_query: usize,

    /// Buffered events between the pipeline and a slow SSE client
    #[serde(default = "default_stream_capacity")]
    pub stream_channel_capacity: usize,
}

fn default_agent_timeout() -> u64 {
    300
}

fn default_max_searches() -> usize {
    10
}

fn default_search_results() -> usize {
    5
}

fn default_stream_capacity() -> usize {
    32
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            agent_timeout_secs: default_agent_timeout(),
            browse: false,
            max_searches: default_max_searches(),
            search_results_per_query: default_search_results(),
            stream_channel_capacity: default_stream_capacity(),
        }
    }
}

impl PipelineConfig {
    pub fn agent_timeout(&self) -> Option<Duration> {
        (self.agent_timeout_secs > 0).then(|| Duration::from_secs(self.agent_timeout_secs))
    }
}

// ============= Chart Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default = "default_chart_base")]
    pub base_url: String,

    /// Longer chart URLs are still returned, with a warning
    #[serde(default = "default_max_url_length")]
    pub max_url_length: usize,
}

fn default_chart_base() -> String {
    "https://quickchart.io".to_string()
}

fn default_max_url_length() -> usize {
    2000
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            base_url: default_chart_base(),
            max_url_length: default_max_url_length(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Provider '{0}' referenced by model '{1}' does not exist")]
    MissingProvider(String, String),

    #[error("Model '{0}' referenced by agent '{1}' does not exist")]
    MissingModel(String, String),
}

impl DelveConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: DelveConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, provider) in &self.providers {
            if let ProviderConfig::OpenAI { api_key_env, .. } = provider {
                self.validate_env_var(api_key_env).map_err(|_| {
                    ConfigError::ValidationError(format!(
                        "provider '{}' needs environment variable '{}'",
                        name, api_key_env
                    ))
                })?;
            }
        }

        for (model_name, model) in &self.models {
            if !self.providers.contains_key(&model.provider) {
                return Err(ConfigError::MissingProvider(
                    model.provider.clone(),
                    model_name.clone(),
                ));
            }
        }

        for (role, role_config) in self.agents.roles() {
            if !self.models.contains_key(&role_config.model) {
                return Err(ConfigError::MissingModel(
                    role_config.model.clone(),
                    role.to_string(),
                ));
            }
        }

        if self.pipeline.browse && self.agents.browser.is_none() {
            return Err(ConfigError::ValidationError(
                "pipeline.browse is enabled but [agents.browser] is not configured".to_string(),
            ));
        }

        if self.pipeline.stream_channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "pipeline.stream_channel_capacity must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Resolve an environment variable reference
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }
}
