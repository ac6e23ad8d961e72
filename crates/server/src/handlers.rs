//! REST handlers for document provisioning.
//!
//! Realtime traffic goes over the WebSocket route; these endpoints only
//! create documents and serve point-in-time reads.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use coedit_protocol::Document;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::AppState;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct CreateDocumentInput {
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateDocumentResponse {
    pub id: String,
    pub url: String,
}

/// POST /api/docs - provision a new document and hand back its editor URL.
/// The body is optional; a missing or empty title becomes "Untitled".
pub async fn create_document(
    State(state): State<AppState>,
    input: Option<Json<CreateDocumentInput>>,
) -> ApiResult<(StatusCode, Json<CreateDocumentResponse>)> {
    let title = input
        .and_then(|Json(input)| input.title)
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| "Untitled".to_string());

    let doc = state.store.create(&title).await?;
    info!(doc_id = %doc.id, title = %doc.title, "document created");

    let url = format!("/doc.html?id={}", doc.id);
    Ok((StatusCode::CREATED, Json(CreateDocumentResponse { id: doc.id, url })))
}

/// GET /api/docs/{id} - fetch the current document row.
pub async fn get_document(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> ApiResult<Json<Document>> {
    let doc = state
        .store
        .load(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))?;

    Ok(Json(doc))
}
