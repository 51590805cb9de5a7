// Note handlers: /api/notes and /api/notes/:id
//
// Every route here sits behind jwt_auth_middleware, so AuthUser is always present.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Extension, Json,
};
use serde::Serialize;

use crate::database::models::{Note, NoteId};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::{parse_note_id, CreateNoteRequest, UpdateNoteRequest};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct NoteRemoved {
    pub id: NoteId,
    pub msg: &'static str,
}

/// POST /api/notes - Create a note owned by the caller
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    payload: Result<Json<CreateNoteRequest>, JsonRejection>,
) -> ApiResult<Note> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let note = state.notes.create(auth.user_id, request).await?;
    Ok(ApiResponse::created(note))
}

/// GET /api/notes - The caller's notes, newest first
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<Vec<Note>> {
    let notes = state.notes.list(auth.user_id).await?;
    Ok(ApiResponse::success(notes))
}

/// PUT /api/notes/:id - Update title and/or content of an owned note
pub async fn update(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateNoteRequest>, JsonRejection>,
) -> ApiResult<Note> {
    let Json(request) = payload.map_err(ApiError::from)?;
    let note_id = parse_note_id(&id)?;
    let note = state.notes.update(auth.user_id, note_id, request).await?;
    Ok(ApiResponse::success(note))
}

/// DELETE /api/notes/:id - Remove an owned note
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<NoteRemoved> {
    let note_id = parse_note_id(&id)?;
    state.notes.delete(auth.user_id, note_id).await?;
    Ok(ApiResponse::success(NoteRemoved {
        id: note_id,
        msg: "Note removed",
    }))
}
