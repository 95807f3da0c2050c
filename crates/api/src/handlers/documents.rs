//! Handlers for listing documents.
//!
//! Uploads and listings are nested under listings
//! (`/listings/{id}/documents`); a single document is addressed directly
//! (`/documents/{id}`). File bytes never pass back through the API:
//! `GET /documents/{id}` answers with a signed, time-limited URL.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use dealroom_core::access::DocumentListing;
use dealroom_core::documents::{DocumentSummary, DocumentType};
use dealroom_core::services::{DownloadCredential, UploadDocument};
use dealroom_core::types::DbId;
use dealroom_events::types::{DOCUMENT_DELETED, DOCUMENT_UPLOADED};
use dealroom_events::DomainEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSeller;
use crate::response::{DataResponse, MessageResponse};
use crate::state::AppState;

/// Content type assumed when the multipart part carries none.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Parse the `requires_nda` form field. Absent means gated.
fn parse_requires_nda(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(AppError::BadRequest(format!(
            "Invalid requires_nda value '{other}'. Expected true or false"
        ))),
    }
}

// ---------------------------------------------------------------------------
// POST /listings/{id}/documents
// ---------------------------------------------------------------------------

/// Multipart form fields:
///
/// - `file` (required) -- the document bytes; its part content type is the MIME type
/// - `document_type` (required) -- one of the [`DocumentType`] names
/// - `requires_nda` (optional, default `true`)
pub async fn upload_document(
    RequireSeller(auth): RequireSeller,
    State(state): State<AppState>,
    Path(listing_id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<DocumentSummary>>)> {
    let mut file: Option<(String, String, Vec<u8>)> = None;
    let mut document_type: Option<DocumentType> = None;
    let mut requires_nda = true;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("document").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let data = field.bytes().await?;
                file = Some((filename, content_type, data.to_vec()));
            }
            "document_type" => {
                document_type = Some(field.text().await?.trim().parse()?);
            }
            "requires_nda" => {
                requires_nda = parse_requires_nda(&field.text().await?)?;
            }
            _ => {} // ignore unknown fields
        }
    }

    let (filename, content_type, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing required 'file' field".into()))?;
    let document_type = document_type
        .ok_or_else(|| AppError::BadRequest("Missing required 'document_type' field".into()))?;

    let document = state
        .documents
        .upload(
            listing_id,
            &auth.principal(),
            UploadDocument {
                filename,
                content_type,
                document_type,
                requires_nda,
                bytes,
            },
        )
        .await?;

    state.event_bus.publish(DomainEvent::for_document(
        DOCUMENT_UPLOADED,
        &document,
        auth.user_id,
    ));

    Ok((
        StatusCode::CREATED,
        Json(DataResponse {
            data: DocumentSummary::from(&document),
        }),
    ))
}

// ---------------------------------------------------------------------------
// GET /listings/{id}/documents
// ---------------------------------------------------------------------------

/// Every document of the listing, each flagged with whether the caller may
/// open it.
pub async fn list_documents(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(listing_id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocumentListing>>> {
    let listing = state
        .documents
        .list_documents(listing_id, &auth.principal())
        .await?;
    Ok(Json(DataResponse { data: listing }))
}

// ---------------------------------------------------------------------------
// GET /documents/{id}
// ---------------------------------------------------------------------------

pub async fn download_document(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DownloadCredential>>> {
    let credential = state
        .documents
        .issue_download_credential(id, &auth.principal())
        .await?;
    Ok(Json(DataResponse { data: credential }))
}

// ---------------------------------------------------------------------------
// DELETE /documents/{id}
// ---------------------------------------------------------------------------

pub async fn delete_document(
    RequireSeller(auth): RequireSeller,
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MessageResponse>>> {
    let document = state.documents.delete(id, &auth.principal()).await?;

    state.event_bus.publish(DomainEvent::for_document(
        DOCUMENT_DELETED,
        &document,
        auth.user_id,
    ));

    Ok(Json(DataResponse {
        data: MessageResponse {
            message: "Document deleted successfully",
        },
    }))
}
