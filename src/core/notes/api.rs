//! Note API endpoints
//!
//! REST API for markdown notes (session required on every route):
//! - POST /api/notes - Create a note
//! - GET /api/notes - List the caller's notes
//! - GET /api/notes/{id} - Get a note by ID
//! - PUT /api/notes/{id} - Update a note
//! - DELETE /api/notes/{id} - Delete a note
//! - GET /api/notes/{id}/render - Render a note's markdown to HTML
//! - POST /api/notes/grammar - Grammar-check a piece of text

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::session::CurrentUser;
use crate::core::db::models::{CreateNote, Note, UpdateNote};
use crate::core::db::repositories::{NoteRepository, NoteRepositoryError};
use crate::core::grammar::{GrammarClient, GrammarError, GrammarReport};
use crate::core::notes::render::render_markdown;
use crate::core::validation::validate_title;

/// Note API state
#[derive(Clone)]
pub struct NoteApiState {
    pub notes: NoteRepository,
    pub grammar: GrammarClient,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub message: String,
}

/// Note API error types
#[derive(Debug, thiserror::Error)]
pub enum NoteApiError {
    #[error("Note not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error("Grammar check failed")]
    GrammarUpstream(String),

    #[error("Internal server error")]
    Internal(String),
}

impl From<NoteRepositoryError> for NoteApiError {
    fn from(err: NoteRepositoryError) -> Self {
        match err {
            NoteRepositoryError::NotFound => NoteApiError::NotFound,
            NoteRepositoryError::DatabaseError(e) => NoteApiError::Internal(e.to_string()),
        }
    }
}

impl From<GrammarError> for NoteApiError {
    fn from(err: GrammarError) -> Self {
        NoteApiError::GrammarUpstream(err.to_string())
    }
}

impl IntoResponse for NoteApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            NoteApiError::NotFound => StatusCode::NOT_FOUND,
            NoteApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            NoteApiError::GrammarUpstream(detail) => {
                tracing::warn!("grammar upstream failure: {}", detail);
                StatusCode::BAD_GATEWAY
            }
            NoteApiError::Internal(detail) => {
                tracing::error!("note API failure: {}", detail);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ApiError {
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// Request/Response DTOs
// ============================================================================

/// Request for creating a note
#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub title: String,
    #[serde(default)]
    pub body: String,
}

/// Request for updating a note
#[derive(Debug, Deserialize, Default)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub body: Option<String>,
}

/// Response for note list
#[derive(Debug, Serialize)]
pub struct NoteListResponse {
    pub notes: Vec<Note>,
    pub count: usize,
}

/// Response for a rendered note
#[derive(Debug, Serialize)]
pub struct RenderResponse {
    pub id: Uuid,
    pub html: String,
}

/// Response for delete operation
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: Uuid,
}

/// Request for a grammar check
#[derive(Debug, Deserialize)]
pub struct GrammarCheckRequest {
    pub text: String,
}

// ============================================================================
// Router
// ============================================================================

/// Create the note API router; the caller layers the session middleware on
/// top
pub fn note_api_router(state: NoteApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/notes", post(create_note_handler))
        .route("/api/notes", get(list_notes_handler))
        .route("/api/notes/grammar", post(grammar_check_handler))
        .route("/api/notes/{id}", get(get_note_handler))
        .route("/api/notes/{id}", axum::routing::put(update_note_handler))
        .route(
            "/api/notes/{id}",
            axum::routing::delete(delete_note_handler),
        )
        .route("/api/notes/{id}/render", get(render_note_handler))
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/notes
async fn create_note_handler(
    State(state): State<Arc<NoteApiState>>,
    user: CurrentUser,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), NoteApiError> {
    validate_title(&request.title).map_err(|e| NoteApiError::BadRequest(e.0))?;

    tracing::info!("Creating note '{}' for user {}", request.title, user.id);

    let note = state
        .notes
        .create(&CreateNote {
            owner_id: user.id,
            title: request.title.trim().to_string(),
            body: request.body,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/notes
async fn list_notes_handler(
    State(state): State<Arc<NoteApiState>>,
    user: CurrentUser,
) -> Result<Json<NoteListResponse>, NoteApiError> {
    tracing::debug!("Listing notes for user {}", user.id);

    let notes = state.notes.list_by_owner(user.id).await?;
    let count = notes.len();

    Ok(Json(NoteListResponse { notes, count }))
}

/// GET /api/notes/{id}
async fn get_note_handler(
    State(state): State<Arc<NoteApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, NoteApiError> {
    let note = state
        .notes
        .find_for_owner(id, user.id)
        .await?
        .ok_or(NoteApiError::NotFound)?;

    Ok(Json(note))
}

/// PUT /api/notes/{id}
async fn update_note_handler(
    State(state): State<Arc<NoteApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateNoteRequest>,
) -> Result<Json<Note>, NoteApiError> {
    if let Some(ref title) = request.title {
        validate_title(title).map_err(|e| NoteApiError::BadRequest(e.0))?;
    }

    tracing::info!("Updating note {} for user {}", id, user.id);

    let note = state
        .notes
        .update_for_owner(
            id,
            user.id,
            &UpdateNote {
                title: request.title.map(|t| t.trim().to_string()),
                body: request.body,
            },
        )
        .await?;

    Ok(Json(note))
}

/// DELETE /api/notes/{id}
async fn delete_note_handler(
    State(state): State<Arc<NoteApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteResponse>, NoteApiError> {
    tracing::info!("Deleting note {} for user {}", id, user.id);

    let deleted = state.notes.delete_for_owner(id, user.id).await?;
    if !deleted {
        return Err(NoteApiError::NotFound);
    }

    Ok(Json(DeleteResponse { deleted: true, id }))
}

/// GET /api/notes/{id}/render
/// Render the note's markdown body to an HTML fragment
async fn render_note_handler(
    State(state): State<Arc<NoteApiState>>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<RenderResponse>, NoteApiError> {
    let note = state
        .notes
        .find_for_owner(id, user.id)
        .await?
        .ok_or(NoteApiError::NotFound)?;

    let html = render_markdown(&note.body);

    Ok(Json(RenderResponse { id: note.id, html }))
}

/// POST /api/notes/grammar
/// Forward text to the grammar-check API and return its findings
async fn grammar_check_handler(
    State(state): State<Arc<NoteApiState>>,
    user: CurrentUser,
    Json(request): Json<GrammarCheckRequest>,
) -> Result<Json<GrammarReport>, NoteApiError> {
    if request.text.trim().is_empty() {
        return Err(NoteApiError::BadRequest(
            "Text cannot be empty.".to_string(),
        ));
    }

    tracing::debug!("Grammar check requested by user {}", user.id);

    let report = state.grammar.check(&request.text).await?;

    Ok(Json(report))
}
