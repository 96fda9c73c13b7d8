pub mod communities;
pub mod cyphers;
pub mod posts;
pub mod users;

use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::{Json, Router};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub const API_PREFIX: &str = "/api/v1";

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(communities::router())
        .merge(cyphers::router())
        .merge(users::router())
        .merge(posts::router())
}

/// The complete service: versioned API, explicit 404 for anything else,
/// request tracing and CORS.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(API_PREFIX, api_router())
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn not_found(uri: Uri) -> impl IntoResponse {
    tracing::debug!(%uri, "No route matched");
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("no route for {}", uri.path()) })),
    )
}
