//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the language models that back
//! the planner, search, browser and writer agents. Provider-specific
//! implementations sit behind the [`LLMClient`] trait.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`Provider`] - Runtime provider selection
//! - [`ProviderRegistry`] - Resolves `delve.toml` model names to clients
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `openai` - OpenAI API (GPT-4o etc.) and compatible endpoints
//! - `ollama` - Local Ollama server

/// Core LLM client trait and provider selection.
pub mod client;
/// Registry resolving configured models to clients.
pub mod provider_registry;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

pub use client::{LLMClient, ModelParams, Provider};
pub use provider_registry::ProviderRegistry;
