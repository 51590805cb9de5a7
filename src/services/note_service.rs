use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::database::models::{NewNote, Note, NoteChanges, NoteId, UserId};
use crate::database::NoteStore;
use crate::error::ServiceError;

const NOTE_NOT_FOUND: &str = "Note not found";

/// Body of `POST /api/notes`. Any owner-like field a client sends is ignored.
#[derive(Debug, Default, Deserialize)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Body of `PUT /api/notes/:id`. Omitted fields stay as they are.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Note operations on behalf of an authenticated caller
#[derive(Clone)]
pub struct NoteService {
    store: Arc<dyn NoteStore>,
    conceal_foreign_notes: bool,
}

impl NoteService {
    pub fn new(store: Arc<dyn NoteStore>) -> Self {
        Self {
            store,
            conceal_foreign_notes: false,
        }
    }

    /// Report notes owned by someone else as missing rather than forbidden
    pub fn conceal_foreign_notes(mut self, conceal: bool) -> Self {
        self.conceal_foreign_notes = conceal;
        self
    }

    pub async fn create(&self, caller: UserId, request: CreateNoteRequest) -> Result<Note, ServiceError> {
        let mut field_errors = HashMap::new();
        let title = required_field("title", request.title, &mut field_errors);
        let content = required_field("content", request.content, &mut field_errors);

        let (Some(title), Some(content)) = (title, content) else {
            return Err(ServiceError::validation(field_errors));
        };

        let note = self.store.create(caller, NewNote { title, content }).await?;
        info!("Created note {} for user {}", note.id, caller);
        Ok(note)
    }

    /// Only ever returns the caller's own notes, newest first
    pub async fn list(&self, caller: UserId) -> Result<Vec<Note>, ServiceError> {
        let notes = self.store.list_by_owner(caller).await?;
        debug!("Listed {} notes for user {}", notes.len(), caller);
        Ok(notes)
    }

    pub async fn update(
        &self,
        caller: UserId,
        note_id: NoteId,
        request: UpdateNoteRequest,
    ) -> Result<Note, ServiceError> {
        let changes = validate_changes(request)?;
        self.load_owned(caller, note_id).await?;

        // The note may have been deleted since the ownership check
        let note = self
            .store
            .update(note_id, changes)
            .await?
            .ok_or(ServiceError::NotFound(NOTE_NOT_FOUND))?;
        info!("Updated note {} for user {}", note_id, caller);
        Ok(note)
    }

    pub async fn delete(&self, caller: UserId, note_id: NoteId) -> Result<(), ServiceError> {
        self.load_owned(caller, note_id).await?;

        if !self.store.delete(note_id).await? {
            return Err(ServiceError::NotFound(NOTE_NOT_FOUND));
        }
        info!("Deleted note {} for user {}", note_id, caller);
        Ok(())
    }

    /// Fetch a note and confirm `caller` owns it. Every mutation goes through here.
    pub async fn load_owned(&self, caller: UserId, note_id: NoteId) -> Result<Note, ServiceError> {
        let note = self
            .store
            .find_by_id(note_id)
            .await?
            .ok_or(ServiceError::NotFound(NOTE_NOT_FOUND))?;

        if note.owner_id != caller {
            warn!("User {} attempted to modify note {} owned by another user", caller, note_id);
            return Err(if self.conceal_foreign_notes {
                ServiceError::NotFound(NOTE_NOT_FOUND)
            } else {
                ServiceError::Forbidden
            });
        }

        Ok(note)
    }
}

/// Path ids that are not UUIDs cannot name an existing note
pub fn parse_note_id(raw: &str) -> Result<NoteId, ServiceError> {
    raw.parse().map_err(|_| ServiceError::NotFound(NOTE_NOT_FOUND))
}

fn required_field(
    name: &str,
    value: Option<String>,
    field_errors: &mut HashMap<String, String>,
) -> Option<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Some(v),
        Some(_) => {
            field_errors.insert(name.to_string(), format!("{} must not be empty", name));
            None
        }
        None => {
            field_errors.insert(name.to_string(), format!("{} is required", name));
            None
        }
    }
}

fn validate_changes(request: UpdateNoteRequest) -> Result<NoteChanges, ServiceError> {
    if request.title.is_none() && request.content.is_none() {
        return Err(ServiceError::Validation {
            message: "Provide a title or content to update".to_string(),
            field_errors: HashMap::new(),
        });
    }

    let mut field_errors = HashMap::new();
    for (name, value) in [("title", &request.title), ("content", &request.content)] {
        if matches!(value, Some(v) if v.trim().is_empty()) {
            field_errors.insert(name.to_string(), format!("{} must not be empty", name));
        }
    }
    if !field_errors.is_empty() {
        return Err(ServiceError::validation(field_errors));
    }

    Ok(NoteChanges {
        title: request.title,
        content: request.content,
    })
}
