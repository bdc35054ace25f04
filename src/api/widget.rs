//! Widget endpoint - the chat surface embedded in customer sites

use axum::extract::State;
use tracing::debug;

use crate::api::knowledge::{QueryRequest, QueryResponse};
use crate::api::state::AppState;
use crate::api::types::Json;

/// POST /widget/query
///
/// Same contract as the management query endpoint. The widget always gets a
/// displayable answer string back, whatever happened downstream.
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    debug!(tenant_id = %request.tenant_id, "widget query received");

    let resolved = state.resolver.answer(&request.tenant_id, &request.query).await;

    Json(QueryResponse::new(request.query, resolved))
}
