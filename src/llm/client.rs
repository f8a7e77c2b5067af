//! LLM Client abstractions and provider management
//!
//! This module provides a unified interface for the language models behind
//! the research agents:
//! - **OpenAI**: OpenAI API and compatible endpoints (feature `openai`)
//! - **Ollama**: local LLM inference (feature `ollama`)

use crate::types::{AppError, Result};
use crate::utils::config::{DelveConfig, ModelConfig, ProviderConfig};
use async_trait::async_trait;

/// Generic LLM client trait for provider abstraction
///
/// All LLM providers implement this trait, allowing for easy swapping
/// between providers without changing agent code.
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Generate with system prompt
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;
}

/// Sampling parameters forwarded to the provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 4096,
        }
    }
}

impl From<&ModelConfig> for ModelParams {
    fn from(model: &ModelConfig) -> Self {
        Self {
            temperature: model.temperature,
            max_tokens: model.max_tokens,
        }
    }
}

/// Provider enum for runtime selection
#[derive(Debug, Clone)]
pub enum Provider {
    /// OpenAI API provider (including Azure OpenAI and compatible APIs)
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::OpenAI {
    ///     api_key: "sk-...".to_string(),
    ///     api_base: "https://api.openai.com/v1".to_string(),
    ///     model: "gpt-4o".to_string(),
    ///     params: Default::default(),
    /// };
    /// ```
    OpenAI {
        api_key: String,
        api_base: String,
        model: String,
        params: ModelParams,
    },

    /// Ollama local LLM provider
    ///
    /// # Example
    /// ```rust,ignore
    /// let provider = Provider::Ollama {
    ///     base_url: "http://localhost:11434".to_string(),
    ///     model: "llama3.2".to_string(),
    ///     params: Default::default(),
    /// };
    /// ```
    Ollama {
        base_url: String,
        model: String,
        params: ModelParams,
    },
}

impl Provider {
    /// Build a provider from a `[models.*]` entry and the provider it references
    pub fn from_model_config(
        model: &ModelConfig,
        provider: &ProviderConfig,
        config: &DelveConfig,
    ) -> Result<Self> {
        let params = ModelParams::from(model);
        match provider {
            ProviderConfig::Ollama { base_url, .. } => Ok(Provider::Ollama {
                base_url: base_url.clone(),
                model: model.model.clone(),
                params,
            }),
            ProviderConfig::OpenAI {
                api_key_env,
                api_base,
                ..
            } => {
                let api_key = config.resolve_env(api_key_env).ok_or_else(|| {
                    AppError::Configuration(format!(
                        "Environment variable '{}' is not set",
                        api_key_env
                    ))
                })?;
                Ok(Provider::OpenAI {
                    api_key,
                    api_base: api_base.clone(),
                    model: model.model.clone(),
                    params,
                })
            }
        }
    }

    /// Create a client instance for this provider
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's cargo feature is not compiled in.
    pub async fn create_client(&self) -> Result<Box<dyn LLMClient>> {
        match self {
            #[cfg(feature = "openai")]
            Provider::OpenAI {
                api_key,
                api_base,
                model,
                params,
            } => Ok(Box::new(super::openai::OpenAIClient::new(
                api_key.clone(),
                api_base.clone(),
                model.clone(),
                *params,
            ))),

            #[cfg(feature = "ollama")]
            Provider::Ollama {
                base_url,
                model,
                params,
            } => Ok(Box::new(super::ollama::OllamaClient::new(
                base_url.clone(),
                model.clone(),
                *params,
            ))),

            #[allow(unreachable_patterns)]
            other => Err(AppError::Configuration(format!(
                "{} provider support is not compiled in; rebuild with the '{}' feature",
                other.name(),
                other.feature()
            ))),
        }
    }

    /// Check if this provider was compiled in
    pub fn is_enabled(&self) -> bool {
        match self {
            Provider::OpenAI { .. } => cfg!(feature = "openai"),
            Provider::Ollama { .. } => cfg!(feature = "ollama"),
        }
    }

    /// Get a human-readable name for this provider
    pub fn name(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "OpenAI",
            Provider::Ollama { .. } => "Ollama",
        }
    }

    fn feature(&self) -> &'static str {
        match self {
            Provider::OpenAI { .. } => "openai",
            Provider::Ollama { .. } => "ollama",
        }
    }
}
