//! File upload API endpoints
//!
//! - POST /api/uploads - Upload a file (multipart field "file")
//! - GET /api/uploads - List the caller's uploads
//!
//! Uploads are limited to markdown, plain-text, and docx files of at most
//! 1 MiB. Bytes go to object storage; the text content of .md/.txt files
//! is extracted and stored alongside the metadata row.

use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;

use crate::core::auth::session::CurrentUser;
use crate::core::db::models::{CreateStoredFile, StoredFileResponse};
use crate::core::db::repositories::{UploadRepository, UploadRepositoryError};
use crate::core::uploads::storage::{ObjectStorage, StorageError};

/// Maximum accepted file size (1 MiB)
const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

/// Allowed file extensions, lowercase
const ALLOWED_EXTENSIONS: [&str; 3] = ["md", "txt", "docx"];

/// Extensions whose content is extracted as text
const TEXT_EXTENSIONS: [&str; 2] = ["md", "txt"];

/// Upload API state
#[derive(Clone)]
pub struct UploadApiState {
    pub uploads: UploadRepository,
    pub storage: ObjectStorage,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

/// Upload API error types
#[derive(Debug, thiserror::Error)]
pub enum UploadApiError {
    #[error("No file uploaded!")]
    NoFile,

    #[error("Only Markdown (.md), (.docx) or Text (.txt) files are allowed!")]
    DisallowedType,

    #[error("File exceeds the 1 MB upload limit.")]
    TooLarge,

    #[error("File contains invalid encoding or cannot be processed as text.")]
    InvalidEncoding,

    #[error("Invalid upload request: {0}")]
    Malformed(String),

    #[error("An error occurred during the file upload process.")]
    UploadFailed(String),
}

impl From<StorageError> for UploadApiError {
    fn from(err: StorageError) -> Self {
        UploadApiError::UploadFailed(err.to_string())
    }
}

impl From<UploadRepositoryError> for UploadApiError {
    fn from(err: UploadRepositoryError) -> Self {
        UploadApiError::UploadFailed(err.to_string())
    }
}

impl IntoResponse for UploadApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            UploadApiError::NoFile
            | UploadApiError::DisallowedType
            | UploadApiError::TooLarge
            | UploadApiError::InvalidEncoding
            | UploadApiError::Malformed(_) => StatusCode::BAD_REQUEST,
            UploadApiError::UploadFailed(detail) => {
                tracing::error!("file upload failure: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiError {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Response for a successful upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub file: StoredFileResponse,
}

/// Response for upload list
#[derive(Debug, Serialize)]
pub struct UploadListResponse {
    pub files: Vec<StoredFileResponse>,
    pub count: usize,
}

/// Create the upload API router; the caller layers the session middleware
/// on top
pub fn upload_api_router(state: UploadApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/uploads", post(upload_file_handler))
        .route("/api/uploads", get(list_uploads_handler))
        .with_state(state)
}

/// Lowercased extension of a file name, if any
fn file_extension(name: &str) -> Option<String> {
    std::path::Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

/// POST /api/uploads
async fn upload_file_handler(
    State(state): State<Arc<UploadApiState>>,
    user: CurrentUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), UploadApiError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadApiError::Malformed(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| UploadApiError::Malformed(e.to_string()))?;

        file = Some((name, data.to_vec()));
    }

    let (name, data) = file.ok_or(UploadApiError::NoFile)?;

    let ext = file_extension(&name).ok_or(UploadApiError::DisallowedType)?;
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(UploadApiError::DisallowedType);
    }

    if data.len() > MAX_UPLOAD_BYTES {
        return Err(UploadApiError::TooLarge);
    }

    tracing::info!(
        "Upload '{}' ({} bytes) from user {}",
        name,
        data.len(),
        user.id
    );

    // Text-based files also keep their content in the database
    let content = if TEXT_EXTENSIONS.contains(&ext.as_str()) {
        Some(String::from_utf8(data.clone()).map_err(|_| UploadApiError::InvalidEncoding)?)
    } else {
        None
    };

    let size_bytes = data.len() as i64;
    let url = state.storage.upload(&name, data).await?;

    let stored = state
        .uploads
        .create(&CreateStoredFile {
            owner_id: user.id,
            name,
            url,
            size_bytes,
            content,
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully!".to_string(),
            file: stored.into(),
        }),
    ))
}

/// GET /api/uploads
async fn list_uploads_handler(
    State(state): State<Arc<UploadApiState>>,
    user: CurrentUser,
) -> Result<Json<UploadListResponse>, UploadApiError> {
    tracing::debug!("Listing uploads for user {}", user.id);

    let files: Vec<StoredFileResponse> = state
        .uploads
        .list_by_owner(user.id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let count = files.len();

    Ok(Json(UploadListResponse { files, count }))
}
