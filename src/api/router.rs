use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::health;
use super::knowledge;
use super::state::AppState;
use super::widget;

/// Create the full router with application state.
///
/// CORS is permissive: the widget endpoint is called from arbitrary customer
/// sites.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/knowledge/upload", post(knowledge::upload_document))
        .route("/knowledge/train", post(knowledge::train))
        .route("/knowledge/query", post(knowledge::query))
        .route("/knowledge/qa", post(knowledge::create_qa))
        .route(
            "/knowledge/qa/{id}",
            get(knowledge::list_qa).delete(knowledge::delete_qa),
        )
        .route(
            "/knowledge/documents/{id}",
            get(knowledge::list_documents).delete(knowledge::delete_document),
        )
        .route("/widget/query", post(widget::query))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
