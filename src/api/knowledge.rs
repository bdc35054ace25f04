//! Knowledge management endpoints - uploads, training, curation, queries

use axum::extract::{Multipart, Path, Query, State};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::{DocumentSummary, ManualQa, Provenance, ResolvedAnswer, TenantId};

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    pub tenant_id: String,
}

/// Response for a processed upload
#[derive(Debug, Clone, Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub file_name: String,
    pub text_chars: usize,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TrainRequest {
    pub tenant_id: TenantId,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainResponse {
    pub chunks_indexed: usize,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub tenant_id: TenantId,
    pub query: String,
}

/// Flat query result: the answer plus which stage produced it
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    pub query: String,
    pub answer: String,
    pub provenance: Provenance,
}

impl QueryResponse {
    pub fn new(query: impl Into<String>, resolved: ResolvedAnswer) -> Self {
        Self {
            query: query.into(),
            answer: resolved.answer,
            provenance: resolved.provenance,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateQaRequest {
    pub tenant_id: TenantId,
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QaCreatedResponse {
    pub id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QaResponse {
    pub id: Uuid,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ManualQa> for QaResponse {
    fn from(qa: &ManualQa) -> Self {
        Self {
            id: qa.id,
            question: qa.question.clone(),
            answer: qa.answer.clone(),
            created_at: qa.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListQaResponse {
    pub entries: Vec<QaResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentResponse {
    pub id: Uuid,
    pub file_name: String,
    pub text_chars: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&DocumentSummary> for DocumentResponse {
    fn from(summary: &DocumentSummary) -> Self {
        Self {
            id: summary.id,
            file_name: summary.file_name.clone(),
            text_chars: summary.text_chars,
            created_at: summary.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListDocumentsResponse {
    pub documents: Vec<DocumentResponse>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// POST /knowledge/upload?tenant_id=...
/// Accepts one file per call as multipart form data.
pub async fn upload_document(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let tenant_id = TenantId::new(&params.tenant_id).map_err(ApiError::from)?;
    debug!(tenant_id = %tenant_id, "uploading knowledge file");

    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read multipart field: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file '{}': {}", file_name, e)))?;

        file = Some((file_name, bytes.to_vec()));
        break;
    }

    let Some((file_name, bytes)) = file else {
        return Err(ApiError::bad_request("No file provided"));
    };

    let document = state
        .knowledge_service
        .upload_document(tenant_id, &file_name, &bytes)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(UploadResponse {
        id: document.id,
        file_name: document.file_name,
        text_chars: document.raw_text.chars().count(),
        message: "File uploaded & processed successfully".to_string(),
    }))
}

/// POST /knowledge/train
/// Rebuilds the tenant's vector index from everything it has stored.
pub async fn train(
    State(state): State<AppState>,
    Json(request): Json<TrainRequest>,
) -> Result<Json<TrainResponse>, ApiError> {
    debug!(tenant_id = %request.tenant_id, "training requested");

    let outcome = state
        .training_service
        .train(&request.tenant_id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(TrainResponse {
        chunks_indexed: outcome.chunks_indexed,
        message: outcome.message,
    }))
}

/// POST /knowledge/query
pub async fn query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Json<QueryResponse> {
    debug!(tenant_id = %request.tenant_id, "query received");

    let resolved = state.resolver.answer(&request.tenant_id, &request.query).await;

    Json(QueryResponse::new(request.query, resolved))
}

/// POST /knowledge/qa
pub async fn create_qa(
    State(state): State<AppState>,
    Json(request): Json<CreateQaRequest>,
) -> Result<Json<QaCreatedResponse>, ApiError> {
    debug!(tenant_id = %request.tenant_id, "adding manual QA");

    let qa = state
        .knowledge_service
        .add_manual_qa(request.tenant_id, &request.question, &request.answer)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(QaCreatedResponse {
        id: qa.id,
        message: "Manual Q/A saved successfully".to_string(),
    }))
}

/// GET /knowledge/qa/{tenant_id}
pub async fn list_qa(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<ListQaResponse>, ApiError> {
    let tenant_id = TenantId::new(&tenant_id).map_err(ApiError::from)?;

    let pairs = state
        .knowledge_service
        .list_manual_qa(&tenant_id)
        .await
        .map_err(ApiError::from)?;

    let entries: Vec<QaResponse> = pairs.iter().map(QaResponse::from).collect();
    let total = entries.len();

    Ok(Json(ListQaResponse { entries, total }))
}

/// GET /knowledge/documents/{tenant_id}
pub async fn list_documents(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<ListDocumentsResponse>, ApiError> {
    let tenant_id = TenantId::new(&tenant_id).map_err(ApiError::from)?;

    let summaries = state
        .knowledge_service
        .list_documents(&tenant_id)
        .await
        .map_err(ApiError::from)?;

    let documents: Vec<DocumentResponse> = summaries.iter().map(DocumentResponse::from).collect();
    let total = documents.len();

    Ok(Json(ListDocumentsResponse { documents, total }))
}

/// DELETE /knowledge/documents/{id}
pub async fn delete_document(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    debug!(document_id = %id, "deleting knowledge file");

    let outcome = state
        .knowledge_service
        .delete_document(id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(DeleteResponse {
        message: outcome.message,
    }))
}

/// DELETE /knowledge/qa/{id}
pub async fn delete_qa(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, ApiError> {
    debug!(qa_id = %id, "deleting manual QA");

    let outcome = state
        .knowledge_service
        .delete_manual_qa(id)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(DeleteResponse {
        message: outcome.message,
    }))
}
