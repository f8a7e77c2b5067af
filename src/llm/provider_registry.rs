//! Provider Registry for managing multiple LLM providers
//!
//! Resolves the `model -> provider` chain declared in `delve.toml` and creates
//! clients for the research roles.

use crate::llm::client::{LLMClient, Provider};
use crate::types::{AppError, Result};
use crate::utils::config::{DelveConfig, ModelConfig, ProviderConfig};
use std::collections::HashMap;
use std::sync::Arc;

/// Registry for managing multiple named LLM providers
///
/// Holds the provider and model tables from configuration and creates
/// LLM clients for specific models by name.
pub struct ProviderRegistry {
    config: Arc<DelveConfig>,
}

impl ProviderRegistry {
    /// Create a provider registry from TOML configuration
    pub fn from_config(config: Arc<DelveConfig>) -> Self {
        Self { config }
    }

    /// Get a provider configuration by name
    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.config.providers.get(name)
    }

    /// Get a model configuration by name
    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.config.models.get(name)
    }

    /// Get all model names, sorted
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.config.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Model name -> provider name, for diagnostics
    pub fn model_providers(&self) -> HashMap<&str, &str> {
        self.config
            .models
            .iter()
            .map(|(name, model)| (name.as_str(), model.provider.as_str()))
            .collect()
    }

    /// Resolve a model name to a concrete provider
    pub fn provider_for_model(&self, model_name: &str) -> Result<Provider> {
        let model_config = self.get_model(model_name).ok_or_else(|| {
            AppError::Configuration(format!("Model '{}' not found in configuration", model_name))
        })?;

        let provider_config = self.get_provider(&model_config.provider).ok_or_else(|| {
            AppError::Configuration(format!(
                "Provider '{}' referenced by model '{}' not found",
                model_config.provider, model_name
            ))
        })?;

        Provider::from_model_config(model_config, provider_config, &self.config)
    }

    /// Create an LLM client for a specific model by name
    pub async fn create_client_for_model(&self, model_name: &str) -> Result<Box<dyn LLMClient>> {
        self.provider_for_model(model_name)?.create_client().await
    }

    /// Check if a model exists in the registry
    pub fn has_model(&self, name: &str) -> bool {
        self.config.models.contains_key(name)
    }
}
