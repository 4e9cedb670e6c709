//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...` (runs, questions, results, catalog, tutor chat)
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers), adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        // Runs
        .route("/api/v1/runs", post(http::http_start_run))
        .route("/api/v1/runs/:id", get(http::http_get_run).delete(http::http_delete_run))
        .route("/api/v1/runs/:id/answer", post(http::http_post_run_answer))
        .route("/api/v1/runs/:id/skip", post(http::http_post_run_skip))
        .route("/api/v1/runs/:id/next", post(http::http_post_run_next))
        .route("/api/v1/runs/:id/previous", post(http::http_post_run_previous))
        .route("/api/v1/runs/:id/report", get(http::http_get_run_report))
        // Questions and results
        .route("/api/v1/questions", get(http::http_get_questions))
        .route("/api/v1/leaderboard", get(http::http_leaderboard))
        .route("/api/v1/explanation", post(http::http_post_explanation))
        // Catalog and profile
        .route("/api/v1/subjects", get(http::http_subjects))
        .route("/api/v1/student", get(http::http_student))
        .route("/api/v1/assessment-history", get(http::http_assessment_history))
        .route("/api/v1/achievements", get(http::http_achievements))
        // Tutor
        .route("/api/v1/ai/chat", post(http::http_post_chat))
        .route("/api/v1/health", get(http::http_health))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                        .on_request(DefaultOnRequest::new().level(Level::INFO))
                        .on_response(DefaultOnResponse::new().level(Level::INFO)),
                )
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
