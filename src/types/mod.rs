use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::agents::AgentError;

// ============= API Request/Response Types =============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ResearchRequest {
    pub query: String,
    /// Overrides `pipeline.browse` for this run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse: Option<bool>,
}

impl ResearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            browse: None,
        }
    }

    /// Reject queries that carry no text.
    pub fn validate(&self) -> Result<()> {
        if self.query.trim().is_empty() {
            return Err(AppError::InvalidInput("query must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Aggregated result of one pipeline run.
///
/// Returned as the body of the synchronous endpoint and embedded in the
/// terminal `complete` stream event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ResearchResponse {
    pub trace_id: String,
    /// Markdown report with resolved chart placeholders
    pub report: String,
    pub summary: String,
    pub follow_up_questions: Vec<String>,
}

// ============= Research Domain Types =============

/// One planned sub-query and the reason for running it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SearchIntent {
    pub query: String,
    pub reason: String,
    /// Optional page the planner suggests visiting; `url` on the wire
    #[serde(
        rename = "url",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "empty_string_as_none"
    )]
    pub source_hint: Option<String>,
}

impl SearchIntent {
    pub fn new(query: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            reason: reason.into(),
            source_hint: None,
        }
    }

    pub fn with_source_hint(mut self, url: impl Into<String>) -> Self {
        self.source_hint = Some(url.into());
        self
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Result of running a single search intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Findings(String),
    Failed,
}

impl SearchOutcome {
    pub fn findings(&self) -> Option<&str> {
        match self {
            SearchOutcome::Findings(text) => Some(text),
            SearchOutcome::Failed => None,
        }
    }

    pub fn into_findings(self) -> Option<String> {
        match self {
            SearchOutcome::Findings(text) => Some(text),
            SearchOutcome::Failed => None,
        }
    }
}

/// A chart the writer wants embedded at `{{placeholder_token}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualizationRequest {
    /// Chart type requested by the writer ("bar", "line", ...)
    pub kind: String,
    pub title: String,
    /// Markdown table, JSON or delimited text
    pub data_payload: String,
    pub description: String,
    /// Token name without braces
    pub placeholder_token: String,
}

impl VisualizationRequest {
    /// The literal marker searched for in the report body.
    pub fn placeholder(&self) -> String {
        format!("{{{{{}}}}}", self.placeholder_token)
    }
}

/// Report produced by the writer; only `body` changes after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub summary: String,
    pub body: String,
    pub follow_up_questions: Vec<String>,
    pub visualization_requests: Vec<VisualizationRequest>,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Agent error: {0}")]
    Agent(#[from] AgentError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Research run cancelled")]
    Cancelled,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Agent(AgentError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Agent(_) | AppError::LLM(_) => StatusCode::BAD_GATEWAY,
            AppError::Configuration(_) | AppError::Cancelled | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_placeholder_wraps_token() {
        let request = VisualizationRequest {
            kind: "bar".to_string(),
            title: "Tariffs".to_string(),
            data_payload: String::new(),
            description: String::new(),
            placeholder_token: "chart_1".to_string(),
        };
        assert_eq!(request.placeholder(), "{{chart_1}}");
    }

    #[test]
    fn test_search_intent_wire_format() {
        let intent: SearchIntent = serde_json::from_str(
            r#"{"query": "solar tariffs 2024", "reason": "baseline", "url": ""}"#,
        )
        .unwrap();
        assert_eq!(intent.source_hint, None);

        let intent = SearchIntent::new("q", "r").with_source_hint("https://example.com");
        let value = serde_json::to_value(&intent).unwrap();
        assert_eq!(value["url"], "https://example.com");
    }

    #[test]
    fn test_request_validation() {
        assert!(ResearchRequest::new("   ").validate().is_err());
        assert!(ResearchRequest::new("impact of solar tariffs").validate().is_ok());
    }

    #[test]
    fn test_error_status_mapping() {
        let response = AppError::InvalidInput("bad".into()).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);

        let response = AppError::Agent(AgentError::Llm("down".into())).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_GATEWAY);

        let timeout = AgentError::Timeout {
            agent: "writer",
            secs: 5,
        };
        let response = AppError::Agent(timeout).into_response();
        assert_eq!(response.status(), axum::http::StatusCode::GATEWAY_TIMEOUT);

        let response = AppError::Internal("panicked".into()).into_response();
        assert_eq!(
            response.status(),
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
