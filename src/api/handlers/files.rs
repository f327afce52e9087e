use axum::extract::{Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::response::{ApiError, AppQuery};
use crate::auth::AuthSession;
use crate::notify::PushEvent;
use crate::object_store::{checksum_sha256, ObjectStoreError};
use crate::storage::models::FileRecord;
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub file_id: String,
    pub owner_user_id: String,
    pub original_name: String,
    pub size_bytes: u64,
    pub mime_type: String,
    pub checksum_sha256: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    #[serde(default = "default_list_size")]
    pub list_size: u32,
    #[serde(default = "default_page")]
    pub page: u32,
}

#[derive(Debug, Serialize)]
pub struct ListFilesResponse {
    pub files: Vec<FileResponse>,
    pub page: u32,
    pub list_size: u32,
}

fn default_list_size() -> u32 {
    10
}

fn default_page() -> u32 {
    1
}

/// The one multipart part the file endpoints accept.
struct UploadedFile {
    name: String,
    mime_type: String,
    data: Bytes,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let upload = read_file_field(&state, multipart).await?;

    // Cheap rejection before any bytes land on disk; the authoritative
    // uniqueness check re-runs inside the insert transaction below.
    if state
        .db
        .file_name_exists(&session.owner_id, &upload.name)
        .map_err(|e| ApiError::internal(e.to_string()))?
    {
        return Err(ApiError::duplicate_filename(format!(
            "'{}' already exists",
            upload.name
        )));
    }

    let storage_key = uuid::Uuid::new_v4().to_string();
    let checksum = checksum_sha256(&upload.data);
    let size_bytes = upload.data.len() as u64;

    // Phase 1: the blob. The metadata row is only written once these bytes
    // are durable, so no record can ever point at a half-written key.
    state
        .blob_store
        .put(&session.owner_id, &storage_key, upload.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store file: {e}")))?;

    // Phase 2: metadata.
    let now = Utc::now();
    let record = FileRecord {
        file_id: uuid::Uuid::new_v4().to_string(),
        owner_user_id: session.owner_id.clone(),
        original_name: upload.name.clone(),
        size_bytes,
        mime_type: upload.mime_type,
        checksum_sha256: checksum,
        storage_key: storage_key.clone(),
        created_at: now,
        updated_at: now,
        deleted_at: None,
    };

    let created = state
        .db
        .create_file(&record)
        .map_err(|e| ApiError::internal(e.to_string()))?;
    if !created {
        // Lost a duplicate-name race; best-effort cleanup of the blob.
        let _ = state.blob_store.delete(&session.owner_id, &storage_key).await;
        return Err(ApiError::duplicate_filename(format!(
            "'{}' already exists",
            upload.name
        )));
    }

    // Re-read to confirm durability before acknowledging.
    let record = state
        .db
        .get_file(&session.owner_id, &record.file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::internal("File not found after upload"))?;

    tracing::debug!(file_id = %record.file_id, name = %record.original_name, "Uploaded file");

    broadcast_file_list(&state, &session).await;
    Ok((StatusCode::CREATED, Json(file_to_response(&record))))
}

pub async fn get_file(
    State(state): State<Arc<AppState>>,
    _session: AuthSession,
    Path((owner_id, file_id)): Path<(String, String)>,
) -> Result<Json<FileResponse>, ApiError> {
    let record = state
        .db
        .get_file(&owner_id, &file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    Ok(Json(file_to_response(&record)))
}

pub async fn replace_file(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Path(file_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<FileResponse>, ApiError> {
    let upload = read_file_field(&state, multipart).await?;

    state
        .db
        .get_file(&session.owner_id, &file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    // New content goes to a fresh key; the metadata pointer swap below is
    // what makes the replacement visible. A crash in between leaves an
    // orphan blob, never a corrupt record.
    let storage_key = uuid::Uuid::new_v4().to_string();
    let checksum = checksum_sha256(&upload.data);
    let size_bytes = upload.data.len() as u64;

    state
        .blob_store
        .put(&session.owner_id, &storage_key, upload.data)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store file: {e}")))?;

    let previous_key = state
        .db
        .update_file_content(
            &session.owner_id,
            &file_id,
            size_bytes,
            &upload.mime_type,
            &checksum,
            &storage_key,
        )
        .map_err(|e| ApiError::internal(e.to_string()))?;

    let previous_key = match previous_key {
        Some(key) => key,
        None => {
            // Record vanished between the lookup and the swap.
            let _ = state.blob_store.delete(&session.owner_id, &storage_key).await;
            return Err(ApiError::not_found("File not found"));
        }
    };

    // Old bytes are unreachable now; reclaim them best-effort.
    if let Err(e) = state.blob_store.delete(&session.owner_id, &previous_key).await {
        tracing::warn!(file_id = %file_id, error = %e, "Failed to delete superseded blob");
    }

    let record = state
        .db
        .get_file(&session.owner_id, &file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::internal("File not found after replace"))?;

    tracing::debug!(file_id = %file_id, "Replaced file content");

    broadcast_file_list(&state, &session).await;
    Ok(Json(file_to_response(&record)))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    Path(file_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    // Metadata removal is the authoritative step; once it commits the file
    // is gone for the user no matter what the blob store says.
    let storage_key = state
        .db
        .delete_file(&session.owner_id, &file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    if let Err(e) = state.blob_store.delete(&session.owner_id, &storage_key).await {
        tracing::warn!(file_id = %file_id, error = %e, "Failed to delete blob");
    }

    tracing::debug!(file_id = %file_id, "Deleted file");

    broadcast_file_list(&state, &session).await;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn download_file(
    State(state): State<Arc<AppState>>,
    _session: AuthSession,
    Path((owner_id, file_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let record = state
        .db
        .get_file(&owner_id, &file_id)
        .map_err(|e| ApiError::internal(e.to_string()))?
        .ok_or_else(|| ApiError::not_found("File not found"))?;

    let data = state
        .blob_store
        .get(&owner_id, &record.storage_key)
        .await
        .map_err(|e| match e {
            ObjectStoreError::NotFound(_) => {
                // Metadata says live, storage says gone: an integrity fault,
                // not an ordinary miss.
                tracing::error!(
                    file_id = %record.file_id,
                    storage_key = %record.storage_key,
                    "Blob missing for live file record"
                );
                ApiError::not_found("File not found")
            }
            _ => ApiError::internal(format!("Failed to retrieve file: {e}")),
        })?;

    // Build response with appropriate headers
    let mut response = (StatusCode::OK, data).into_response();
    let headers = response.headers_mut();

    headers.insert(
        header::CONTENT_TYPE,
        record
            .mime_type
            .parse()
            .unwrap_or(header::HeaderValue::from_static("application/octet-stream")),
    );

    headers.insert(
        header::CONTENT_LENGTH,
        header::HeaderValue::from(record.size_bytes),
    );

    if let Ok(value) = format!("attachment; filename=\"{}\"", record.original_name).parse() {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}

pub async fn list_files(
    State(state): State<Arc<AppState>>,
    session: AuthSession,
    AppQuery(params): AppQuery<ListFilesParams>,
) -> Result<Json<ListFilesResponse>, ApiError> {
    let list_size = params.list_size.clamp(1, 100);
    let page = params.page.max(1);
    let offset = (page as usize - 1) * list_size as usize;

    let files = state
        .db
        .list_files(&session.owner_id, list_size as usize, offset)
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(ListFilesResponse {
        files: files.iter().map(file_to_response).collect(),
        page,
        list_size,
    }))
}

// ============================================================================
// Helpers
// ============================================================================

/// Pull the `file` part out of a multipart body, enforcing the upload size
/// limit and resolving a usable MIME type.
async fn read_file_field(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<UploadedFile, ApiError> {
    let mut uploaded: Option<UploadedFile> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some("file") {
            // Ignore unknown fields
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ApiError::bad_request("file part must carry a filename"))?;
        let content_type = field.content_type().map(|s| s.to_string());

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

        if data.len() as u64 > state.config.storage.max_upload_size {
            return Err(ApiError::payload_too_large(format!(
                "File exceeds maximum upload size of {} bytes",
                state.config.storage.max_upload_size
            )));
        }

        // Prefer the declared Content-Type, fall back to a filename guess.
        let mime_type = content_type
            .filter(|ct| ct != "application/octet-stream")
            .or_else(|| {
                mime_guess::from_path(&file_name)
                    .first()
                    .map(|m| m.to_string())
            })
            .unwrap_or_else(|| "application/octet-stream".to_string());

        uploaded = Some(UploadedFile {
            name: file_name,
            mime_type,
            data,
        });
    }

    uploaded.ok_or_else(|| ApiError::bad_request("file field is required"))
}

/// Push the owner's current live file list to every socket of the acting
/// session. Failures are logged, never surfaced: the mutation that
/// triggered this already committed.
async fn broadcast_file_list(state: &AppState, session: &AuthSession) {
    let files = match state.db.list_files(&session.owner_id, usize::MAX, 0) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load file list for broadcast");
            return;
        }
    };

    let files_list = files
        .iter()
        .map(|f| {
            serde_json::to_value(file_to_response(f)).expect("file response serializes to JSON")
        })
        .collect();

    state
        .hub
        .broadcast(&session.session_id, &PushEvent::FileList { files_list });
}

fn file_to_response(file: &FileRecord) -> FileResponse {
    FileResponse {
        file_id: file.file_id.clone(),
        owner_user_id: file.owner_user_id.clone(),
        original_name: file.original_name.clone(),
        size_bytes: file.size_bytes,
        mime_type: file.mime_type.clone(),
        checksum_sha256: file.checksum_sha256.clone(),
        created_at: file.created_at.to_rfc3339(),
        updated_at: file.updated_at.to_rfc3339(),
    }
}
