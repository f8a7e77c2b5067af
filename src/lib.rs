//! # Delve - Deep Research Server
//!
//! Delve turns a question into a long-form, chart-illustrated markdown
//! report. An LLM planner proposes web searches, the searches run
//! concurrently, an optional browsing pass reads the pages the planner
//! pointed at, and an LLM writer synthesizes the findings. Chart
//! placeholders in the report are then replaced with rendered images.
//!
//! Delve can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `delve-server` binary
//! 2. **As a library** - Build a [`ResearchPipeline`] from your own agents
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use delve::{AgentRegistry, DelveConfig, ResearchPipeline, types::ResearchRequest};
//! use std::sync::Arc;
//!
//! let config = Arc::new(DelveConfig::load("delve.toml")?);
//! let agents = AgentRegistry::from_config(Arc::clone(&config)).build().await?;
//! let pipeline = ResearchPipeline::new(agents, config.pipeline.clone());
//!
//! let outcome = pipeline.run(&ResearchRequest::new("Impact of solar tariffs")).await?;
//! println!("{}", outcome.report);
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `openai` | OpenAI API and compatible endpoints |
//! | `swagger-ui` | Interactive API documentation |
//!
//! ## Modules
//!
//! - [`research`] - Pipeline controller, dispatcher, synthesizer, resolver
//! - [`agents`] - Planner, searcher, browser and writer
//! - [`tools`] - Chart rendering
//! - [`llm`] - LLM client implementations
//! - [`api`] - HTTP and SSE handlers
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]

/// Research agents and the traits the pipeline calls them through.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Research orchestration.
pub mod research;
/// Chart rendering.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration loading.
pub mod utils;

pub use agents::AgentRegistry;
pub use llm::{LLMClient, Provider, ProviderRegistry};
pub use research::{PipelineEvent, ResearchAgents, ResearchPipeline};
pub use types::{AppError, Result};
pub use utils::config::DelveConfig;

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Research pipeline shared by all requests
    pub pipeline: Arc<ResearchPipeline>,
}
