use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::models::{NewNote, Note, NoteChanges, NoteId, User, UserId};
use super::store::{ensure_not_blank, ensure_note_fields, NoteStore, StoreError, UserStore};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        email TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE UNIQUE INDEX IF NOT EXISTS users_email_lower_idx ON users (lower(email))",
    r#"
    CREATE TABLE IF NOT EXISTS notes (
        id UUID PRIMARY KEY,
        title TEXT NOT NULL CHECK (length(btrim(title)) > 0),
        content TEXT NOT NULL CHECK (length(btrim(content)) > 0),
        owner_id UUID NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS notes_owner_created_idx ON notes (owner_id, created_at DESC)",
];

const NOTE_COLUMNS: &str = "id, title, content, owner_id, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, password_hash, created_at, updated_at";

/// Postgres-backed note and user store
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("Database schema is up to date");
        Ok(())
    }
}

/// Constraint violations become domain errors; everything else stays a storage error.
///
/// Notes carry no foreign key to users, but databases created by older
/// releases still have one.
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::Conflict(db.message().to_string());
        }
        if db.is_foreign_key_violation() {
            return StoreError::UnknownUser(db.message().to_string());
        }
    }
    StoreError::Sqlx(err)
}

#[async_trait]
impl NoteStore for PgStore {
    async fn create(&self, owner_id: UserId, note: NewNote) -> Result<Note, StoreError> {
        ensure_note_fields(&note.title, &note.content)?;

        let sql = format!(
            "INSERT INTO notes (id, title, content, owner_id) VALUES ($1, $2, $3, $4) RETURNING {}",
            NOTE_COLUMNS
        );
        let row = sqlx::query_as::<_, Note>(&sql)
            .bind(NoteId::new())
            .bind(&note.title)
            .bind(&note.content)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row)
    }

    async fn list_by_owner(&self, owner_id: UserId) -> Result<Vec<Note>, StoreError> {
        let sql = format!(
            "SELECT {} FROM notes WHERE owner_id = $1 ORDER BY created_at DESC, id DESC",
            NOTE_COLUMNS
        );
        let rows = sqlx::query_as::<_, Note>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_id(&self, note_id: NoteId) -> Result<Option<Note>, StoreError> {
        let sql = format!("SELECT {} FROM notes WHERE id = $1", NOTE_COLUMNS);
        let row = sqlx::query_as::<_, Note>(&sql)
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn update(&self, note_id: NoteId, changes: NoteChanges) -> Result<Option<Note>, StoreError> {
        if let Some(title) = &changes.title {
            ensure_not_blank("title", title)?;
        }
        if let Some(content) = &changes.content {
            ensure_not_blank("content", content)?;
        }

        let sql = format!(
            r#"
            UPDATE notes
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            NOTE_COLUMNS
        );
        let row = sqlx::query_as::<_, Note>(&sql)
            .bind(note_id)
            .bind(changes.title)
            .bind(changes.content)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row)
    }

    async fn delete(&self, note_id: NoteId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash) VALUES ($1, $2, $3) RETURNING {}",
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(UserId::new())
            .bind(email)
            .bind(password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row)
    }

    async fn update_email(&self, user_id: UserId, email: &str) -> Result<Option<User>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
            SET email = $2, updated_at = now()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let row = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(row)
    }
}
