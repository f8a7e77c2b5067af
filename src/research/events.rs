//! Streaming event vocabulary
//!
//! One JSON object per SSE frame, tagged by `type`. The sequence for a run is
//! append-only and always ends with either `complete` or `error`.

use crate::types::{ResearchResponse, SearchIntent};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Maximum characters of findings echoed in `search_complete`
const RESULT_PREVIEW_CHARS: usize = 200;

/// Pipeline stage, as reported by `status_update`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Planning,
    Searching,
    Browsing,
    Writing,
    ResolvingPlaceholders,
    Complete,
    Failed,
}

impl Stage {
    pub fn message(&self) -> &'static str {
        match self {
            Stage::Planning => "Planning searches...",
            Stage::Searching => "Performing searches...",
            Stage::Browsing => "Browsing source pages...",
            Stage::Writing => "Writing report...",
            Stage::ResolvingPlaceholders => "Rendering charts...",
            Stage::Complete => "Research complete",
            Stage::Failed => "Research failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PipelineEvent {
    Start {
        trace_id: String,
        query: String,
        message: String,
    },
    StatusUpdate {
        trace_id: String,
        stage: Stage,
        message: String,
    },
    PlanComplete {
        trace_id: String,
        searches: Vec<SearchIntent>,
        message: String,
    },
    SearchStarted {
        trace_id: String,
        search_index: usize,
        query: String,
        message: String,
    },
    SearchComplete {
        trace_id: String,
        search_index: usize,
        query: String,
        /// Leading slice of the findings; `null` when the search failed
        result_summary: Option<String>,
        message: String,
    },
    Complete {
        trace_id: String,
        report: String,
        summary: String,
        follow_up_questions: Vec<String>,
        message: String,
    },
    Error {
        trace_id: String,
        message: String,
    },
}

impl PipelineEvent {
    pub fn start(trace_id: &str, query: &str) -> Self {
        PipelineEvent::Start {
            trace_id: trace_id.to_string(),
            query: query.to_string(),
            message: format!("Starting research for: {}", query),
        }
    }

    pub fn status(trace_id: &str, stage: Stage) -> Self {
        PipelineEvent::StatusUpdate {
            trace_id: trace_id.to_string(),
            stage,
            message: stage.message().to_string(),
        }
    }

    pub fn plan_complete(trace_id: &str, searches: Vec<SearchIntent>) -> Self {
        let message = format!("Planned {} searches", searches.len());
        PipelineEvent::PlanComplete {
            trace_id: trace_id.to_string(),
            searches,
            message,
        }
    }

    pub fn search_started(trace_id: &str, search_index: usize, query: &str) -> Self {
        PipelineEvent::SearchStarted {
            trace_id: trace_id.to_string(),
            search_index,
            query: query.to_string(),
            message: format!("Searching: {}", query),
        }
    }

    pub fn search_complete(
        trace_id: &str,
        search_index: usize,
        query: &str,
        findings: Option<&str>,
    ) -> Self {
        let message = match findings {
            Some(_) => format!("Completed search: {}", query),
            None => format!("Search failed: {}", query),
        };
        PipelineEvent::SearchComplete {
            trace_id: trace_id.to_string(),
            search_index,
            query: query.to_string(),
            result_summary: findings.map(preview),
            message,
        }
    }

    pub fn complete(response: ResearchResponse) -> Self {
        PipelineEvent::Complete {
            trace_id: response.trace_id,
            report: response.report,
            summary: response.summary,
            follow_up_questions: response.follow_up_questions,
            message: Stage::Complete.message().to_string(),
        }
    }

    pub fn error(trace_id: &str, message: impl Into<String>) -> Self {
        PipelineEvent::Error {
            trace_id: trace_id.to_string(),
            message: message.into(),
        }
    }

    /// The wire name of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineEvent::Start { .. } => "start",
            PipelineEvent::StatusUpdate { .. } => "status_update",
            PipelineEvent::PlanComplete { .. } => "plan_complete",
            PipelineEvent::SearchStarted { .. } => "search_started",
            PipelineEvent::SearchComplete { .. } => "search_complete",
            PipelineEvent::Complete { .. } => "complete",
            PipelineEvent::Error { .. } => "error",
        }
    }

    /// `complete` and `error` end the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineEvent::Complete { .. } | PipelineEvent::Error { .. }
        )
    }

    /// Encode as a raw SSE frame: `data: <json>\n\n`.
    pub fn to_sse_frame(&self) -> serde_json::Result<String> {
        Ok(format!("data: {}\n\n", serde_json::to_string(self)?))
    }
}

fn preview(findings: &str) -> String {
    match findings.char_indices().nth(RESULT_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}...", &findings[..idx]),
        None => findings.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_wire_format() {
        let event = PipelineEvent::status("trace_1", Stage::Planning);
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "type": "status_update",
                "trace_id": "trace_1",
                "stage": "planning",
                "message": "Planning searches..."
            })
        );

        let event = PipelineEvent::search_complete("trace_1", 3, "q", None);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "search_complete");
        assert_eq!(value["search_index"], 3);
        assert!(value["result_summary"].is_null());
    }

    #[test]
    fn test_result_summary_is_truncated() {
        let long = "x".repeat(500);
        let PipelineEvent::SearchComplete { result_summary, .. } =
            PipelineEvent::search_complete("t", 0, "q", Some(&long))
        else {
            panic!("wrong variant");
        };
        let summary = result_summary.unwrap();
        assert_eq!(summary.len(), RESULT_PREVIEW_CHARS + 3);
        assert!(summary.ends_with("..."));
    }

    #[test]
    fn test_sse_frame() {
        let frame = PipelineEvent::error("t", "writer failed").to_sse_frame().unwrap();
        assert!(frame.starts_with("data: {\"type\":\"error\""));
        assert!(frame.ends_with("}\n\n"));
    }

    #[test]
    fn test_terminal_events() {
        assert!(PipelineEvent::error("t", "x").is_terminal());
        assert!(!PipelineEvent::status("t", Stage::Writing).is_terminal());
        assert_eq!(PipelineEvent::start("t", "q").kind(), "start");
    }
}
