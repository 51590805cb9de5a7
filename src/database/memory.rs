use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::models::{NewNote, Note, NoteChanges, NoteId, User, UserId};
use super::store::{ensure_note_fields, NoteStore, StoreError, UserStore};

#[derive(Debug, Clone)]
struct StoredNote {
    seq: u64,
    note: Note,
}

#[derive(Debug, Default)]
struct Inner {
    notes: HashMap<NoteId, StoredNote>,
    users: HashMap<UserId, User>,
    next_seq: u64,
}

impl Inner {
    /// Case-insensitive, matching the `lower(email)` index on Postgres
    fn email_taken(&self, email: &str, except: Option<UserId>) -> bool {
        self.users
            .values()
            .any(|user| Some(user.id) != except && user.email.eq_ignore_ascii_case(email))
    }
}

fn email_conflict(email: &str) -> StoreError {
    StoreError::Conflict(format!("email '{}' is already in use", email))
}

/// Process-local store backed by hash maps. Used when no database is configured and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user record directly. Registration itself happens outside this service.
    pub async fn insert_user(&self, email: impl Into<String>, password_hash: impl Into<String>) -> User {
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: email.into(),
            password_hash: password_hash.into(),
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.users.insert(user.id, user.clone());
        user
    }

    pub async fn remove_user(&self, user_id: UserId) -> bool {
        self.inner.write().await.users.remove(&user_id).is_some()
    }

    pub async fn note_count(&self) -> usize {
        self.inner.read().await.notes.len()
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn create(&self, owner_id: UserId, note: NewNote) -> Result<Note, StoreError> {
        ensure_note_fields(&note.title, &note.content)?;

        let now = Utc::now();
        let note = Note {
            id: NoteId::new(),
            title: note.title,
            content: note.content,
            owner_id,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.inner.write().await;
        inner.next_seq += 1;
        let seq = inner.next_seq;
        inner.notes.insert(note.id, StoredNote { seq, note: note.clone() });
        Ok(note)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Note>, StoreError> {
        let inner = self.inner.read().await;
        let mut owned: Vec<&StoredNote> = inner
            .notes
            .values()
            .filter(|stored| stored.note.owner_id == owner_id)
            .collect();
        // Equal timestamps fall back to insertion order
        owned.sort_by(|a, b| {
            b.note
                .created_at
                .cmp(&a.note.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(owned.into_iter().map(|stored| stored.note.clone()).collect())
    }

    async fn find_by_id(&self, note_id: NoteId) -> Result<Option<Note>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .notes
            .get(&note_id)
            .map(|stored| stored.note.clone()))
    }

    async fn update(&self, note_id: NoteId, changes: NoteChanges) -> Result<Option<Note>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.notes.get_mut(&note_id) else {
            return Ok(None);
        };

        let title = changes.title.as_deref().unwrap_or(&stored.note.title);
        let content = changes.content.as_deref().unwrap_or(&stored.note.content);
        ensure_note_fields(title, content)?;

        changes.apply_to(&mut stored.note, Utc::now());
        Ok(Some(stored.note.clone()))
    }

    async fn delete(&self, note_id: NoteId) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.notes.remove(&note_id).is_some())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&user_id).cloned())
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let mut inner = self.inner.write().await;
        if inner.email_taken(email, None) {
            return Err(email_conflict(email));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_email(&self, user_id: UserId, email: &str) -> Result<Option<User>, StoreError> {
        let mut inner = self.inner.write().await;
        if !inner.users.contains_key(&user_id) {
            return Ok(None);
        }
        if inner.email_taken(email, Some(user_id)) {
            return Err(email_conflict(email));
        }

        let Some(user) = inner.users.get_mut(&user_id) else {
            return Ok(None);
        };
        user.email = email.to_string();
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_note(title: &str, content: &str) -> NewNote {
        NewNote {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn lists_newest_first_and_scoped_to_owner() {
        let store = MemoryStore::new();
        let alice = UserId::new();
        let bob = UserId::new();

        let first = store.create(alice, new_note("one", "1")).await.unwrap();
        let second = store.create(alice, new_note("two", "2")).await.unwrap();
        store.create(bob, new_note("bob", "b")).await.unwrap();

        let notes = store.list_by_owner(alice).await.unwrap();
        let ids: Vec<NoteId> = notes.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(notes.iter().all(|n| n.owner_id == alice));

        assert!(store.list_by_owner(UserId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_blank_fields() {
        let store = MemoryStore::new();
        let owner = UserId::new();

        let err = store.create(owner, new_note("  ", "body")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        let err = store.create(owner, new_note("title", "")).await.unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(store.note_count().await, 0);
    }

    #[tokio::test]
    async fn update_missing_note_returns_none() {
        let store = MemoryStore::new();
        let changes = NoteChanges {
            title: Some("x".to_string()),
            content: None,
        };
        assert!(store.update(NoteId::new(), changes).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_rejects_blank_title_and_keeps_note() {
        let store = MemoryStore::new();
        let note = store.create(UserId::new(), new_note("keep", "me")).await.unwrap();
        let changes = NoteChanges {
            title: Some(String::new()),
            content: None,
        };
        assert!(matches!(
            store.update(note.id, changes).await,
            Err(StoreError::Validation(_))
        ));
        let stored = NoteStore::find_by_id(&store, note.id).await.unwrap().unwrap();
        assert_eq!(stored.title, "keep");
    }

    #[tokio::test]
    async fn delete_reports_whether_anything_was_removed() {
        let store = MemoryStore::new();
        let note = store.create(UserId::new(), new_note("t", "c")).await.unwrap();
        assert!(store.delete(note.id).await.unwrap());
        assert!(!store.delete(note.id).await.unwrap());
    }

    #[tokio::test]
    async fn update_email_detects_conflicts() {
        let store = MemoryStore::new();
        let alice = store.insert_user("alice@example.com", "hash").await;
        store.insert_user("bob@example.com", "hash").await;

        let err = store.update_email(alice.id, "BOB@example.com").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let updated = store.update_email(alice.id, "alice@new.example").await.unwrap().unwrap();
        assert_eq!(updated.email, "alice@new.example");
        assert!(store.update_email(UserId::new(), "x@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_user_rejects_duplicate_email_in_any_case() {
        let store = MemoryStore::new();
        let alice = store.create_user("alice@example.com", "").await.unwrap();
        let found = UserStore::find_by_id(&store, alice.id).await.unwrap();
        assert_eq!(found.map(|user| user.email), Some("alice@example.com".to_string()));

        let err = store.create_user("ALICE@example.com", "").await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Re-saving your own address in another case is not a conflict
        let updated = store.update_email(alice.id, "Alice@Example.com").await.unwrap().unwrap();
        assert_eq!(updated.email, "Alice@Example.com");
    }
}
