use crate::{
    AppState,
    research::PipelineEvent,
    types::{ResearchRequest, ResearchResponse, Result},
};
use axum::{
    Json,
    extract::State,
    response::sse::{Event, Sse},
};
use futures::{Stream, StreamExt};
use std::sync::Arc;

/// Run a deep research query to completion
#[utoipa::path(
    post,
    path = "/api/deep_research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Research completed", body = ResearchResponse),
        (status = 400, description = "Empty query"),
        (status = 502, description = "Planner or writer failed"),
        (status = 504, description = "Planner or writer timed out")
    ),
    tag = "research"
)]
pub async fn deep_research(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>> {
    let response = state.pipeline.run(&payload).await?;
    Ok(Json(response))
}

/// Run a deep research query, streaming progress as server-sent events
///
/// Each frame is `data: <json>` tagged by `type`. The stream closes after a
/// `complete` or `error` event. Disconnecting cancels the run.
#[utoipa::path(
    post,
    path = "/api/deep_research/stream",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Event stream", body = PipelineEvent, content_type = "text/event-stream"),
        (status = 400, description = "Empty query")
    ),
    tag = "research"
)]
pub async fn deep_research_stream(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, axum::Error>>>> {
    let events = Arc::clone(&state.pipeline).stream(payload)?;
    tracing::debug!(trace_id = events.trace_id(), "Opened research event stream");

    Ok(Sse::new(
        events.map(|event| Event::default().json_data(event)),
    ))
}
