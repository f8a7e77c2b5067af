//! Research agents
//!
//! The pipeline talks to its collaborators through four narrow traits:
//! [`Planner`], [`Searcher`], [`BrowserExplorer`] and [`Writer`]. Every call
//! returns `Result<T, AgentError>`; loosely structured model output is parsed
//! into strict serde types here, before it reaches the core.
//!
//! The LLM-backed implementations live in the submodules and are wired up
//! from `delve.toml` by [`registry::AgentRegistry`].

/// Deep page exploration for intents carrying a source hint.
pub mod browser;
/// Tolerant extraction of JSON payloads from model responses.
pub mod json;
/// Search planning.
pub mod planner;
/// Builds the agent set from configuration.
pub mod registry;
/// Web search and summarisation.
pub mod searcher;
/// Report writing.
pub mod writer;

use crate::types::SearchIntent;
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

pub use browser::PageExplorer;
pub use planner::LlmPlanner;
pub use registry::AgentRegistry;
pub use searcher::WebSearcher;
pub use writer::LlmWriter;

/// Failure of an external agent call.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM call failed: {0}")]
    Llm(String),

    #[error("{agent} returned malformed output: {reason}")]
    MalformedOutput { agent: &'static str, reason: String },

    #[error("Web search failed: {0}")]
    Search(String),

    #[error("Page fetch failed: {0}")]
    Fetch(String),

    #[error("{agent} did not answer within {secs}s")]
    Timeout { agent: &'static str, secs: u64 },
}

/// Turns a query into an ordered list of search intents.
#[async_trait]
pub trait Planner: Send + Sync {
    async fn plan(&self, query: &str) -> Result<Vec<SearchIntent>, AgentError>;
}

/// Runs one search intent and returns free-text findings.
#[async_trait]
pub trait Searcher: Send + Sync {
    async fn search(&self, intent: &SearchIntent) -> Result<String, AgentError>;
}

/// Browses deeper for one intent; `Ok(None)` means nothing worth keeping.
#[async_trait]
pub trait BrowserExplorer: Send + Sync {
    async fn explore(&self, intent: &SearchIntent) -> Result<Option<String>, AgentError>;
}

/// Writes the structured report from a formatted synthesis request.
#[async_trait]
pub trait Writer: Send + Sync {
    async fn write(&self, input: &str) -> Result<WriterOutput, AgentError>;
}

/// Structured output the writer must produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriterOutput {
    #[serde(alias = "summary")]
    pub short_summary: String,

    #[serde(alias = "report", alias = "body")]
    pub markdown_report: String,

    #[serde(default)]
    pub follow_up_questions: Vec<String>,

    #[serde(default, alias = "charts", alias = "chart_requests")]
    pub visualization_requests: Vec<ChartRequest>,
}

/// A chart as requested by the writer, before token normalisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartRequest {
    #[serde(alias = "type", alias = "kind")]
    pub chart_type: String,

    pub title: String,

    /// Models sometimes emit the table as a JSON value instead of a string
    #[serde(deserialize_with = "string_or_json")]
    pub data: String,

    #[serde(default)]
    pub description: String,

    /// Placeholder marker, e.g. `{{chart_1}}`
    #[serde(alias = "placeholder", alias = "placeholder_token")]
    pub position: String,
}

fn string_or_json<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}
