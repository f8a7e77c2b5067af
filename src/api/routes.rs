use crate::AppState;
use crate::api::handlers::{health, research};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Research requests are a single query string
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Routes served under `/api`.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/deep_research", post(research::deep_research))
        .route("/deep_research/stream", post(research::deep_research_stream))
}

/// The full application: API routes, docs, and the CORS, trace and body
/// limit layers.
pub fn create_app(state: AppState) -> Router {
    let app = Router::new().nest("/api", create_router());

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", crate::api::ApiDoc::openapi()),
        )
    };

    app.layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
