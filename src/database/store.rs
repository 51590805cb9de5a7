use async_trait::async_trait;
use thiserror::Error;

use super::models::{NewNote, Note, NoteChanges, NoteId, User, UserId};

/// Errors surfaced by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// A write referenced a user row that does not exist
    #[error("Unknown user: {0}")]
    UnknownUser(String),

    #[error("Storage failure: {0}")]
    Storage(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence operations for notes.
///
/// Lookups by id are not owner-scoped; the note service checks ownership
/// before any mutation reaches the store.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Inserts a note owned by `owner_id`. Rejects empty title or content.
    async fn create(&self, owner_id: UserId, note: NewNote) -> Result<Note, StoreError>;

    /// All notes owned by `owner_id`, newest first.
    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Note>, StoreError>;

    async fn find_by_id(&self, note_id: NoteId) -> Result<Option<Note>, StoreError>;

    /// Applies title/content changes. `None` if the note no longer exists.
    async fn update(&self, note_id: NoteId, changes: NoteChanges) -> Result<Option<Note>, StoreError>;

    /// Returns `false` if there was nothing to delete.
    async fn delete(&self, note_id: NoteId) -> Result<bool, StoreError>;
}

/// Persistence operations for user identity records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError>;

    /// Registers a user. Emails are unique regardless of case.
    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError>;

    /// Replaces the email address. `None` if the user no longer exists.
    async fn update_email(&self, user_id: UserId, email: &str) -> Result<Option<User>, StoreError>;
}

/// Shared guard for the non-empty title/content invariant.
pub(crate) fn ensure_note_fields(title: &str, content: &str) -> Result<(), StoreError> {
    ensure_not_blank("title", title)?;
    ensure_not_blank("content", content)
}

pub(crate) fn ensure_not_blank(field: &str, value: &str) -> Result<(), StoreError> {
    if value.trim().is_empty() {
        return Err(StoreError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
