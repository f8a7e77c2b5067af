//! HTTP API Handlers and Routes
//!
//! The REST and SSE layer for Delve, built on axum.
//!
//! # API Endpoints
//!
//! - `POST /api/deep_research` - Run a query and return the finished report
//! - `POST /api/deep_research/stream` - Run a query as a server-sent event stream
//! - `GET /api/health` - Health check endpoint
//!
//! # OpenAPI Documentation
//!
//! [`ApiDoc`] describes every endpoint. When the `swagger-ui` feature is
//! enabled, interactive documentation is served at `/swagger-ui/`.

/// Request handlers.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::research::{PipelineEvent, Stage};
use crate::types::{ResearchRequest, ResearchResponse, SearchIntent};
use handlers::health::HealthResponse;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::research::deep_research,
        handlers::research::deep_research_stream,
        handlers::health::health,
    ),
    components(schemas(
        ResearchRequest,
        ResearchResponse,
        SearchIntent,
        PipelineEvent,
        Stage,
        HealthResponse,
    )),
    tags(
        (name = "research", description = "Deep research pipeline"),
        (name = "health", description = "Liveness"),
    ),
    info(title = "Delve", description = "Deep research server")
)]
pub struct ApiDoc;
