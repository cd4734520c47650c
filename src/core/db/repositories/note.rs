//! Note repository for database operations
//!
//! All operations are scoped to the owning user: a note that exists but
//! belongs to someone else is indistinguishable from a missing note.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateNote, Note, UpdateNote};

/// Note repository error types
#[derive(Debug, thiserror::Error)]
pub enum NoteRepositoryError {
    #[error("Note not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Note repository for database operations
#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    /// Create a new note repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new note
    pub async fn create(&self, dto: &CreateNote) -> Result<Note, NoteRepositoryError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (owner_id, title, body)
            VALUES ($1, $2, $3)
            RETURNING id, owner_id, title, body, created_at, updated_at
            "#,
        )
        .bind(dto.owner_id)
        .bind(&dto.title)
        .bind(&dto.body)
        .fetch_one(&self.pool)
        .await?;

        Ok(note)
    }

    /// List a user's notes, newest first
    pub async fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Note>, NoteRepositoryError> {
        let notes = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, owner_id, title, body, created_at, updated_at
            FROM notes
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(notes)
    }

    /// Fetch a single note owned by the given user
    pub async fn find_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Note>, NoteRepositoryError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            SELECT id, owner_id, title, body, created_at, updated_at
            FROM notes
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(note)
    }

    /// Update a note owned by the given user
    pub async fn update_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
        updates: &UpdateNote,
    ) -> Result<Note, NoteRepositoryError> {
        let note = sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
            SET
                title = COALESCE($3, title),
                body = COALESCE($4, body),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, body, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&updates.title)
        .bind(&updates.body)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(NoteRepositoryError::NotFound)?;

        Ok(note)
    }

    /// Delete a note owned by the given user
    pub async fn delete_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, NoteRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM notes
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::repositories::UserRepository;

    // ========================================================================
    // Error Type Tests
    // ========================================================================

    #[test]
    fn test_note_repository_error_display() {
        let err = NoteRepositoryError::NotFound;
        assert_eq!(format!("{}", err), "Note not found");
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    async fn create_test_pool() -> PgPool {
        use crate::core::db::pool::{DbConfig, create_pool};

        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for tests");
        create_pool(&DbConfig::new(url))
            .await
            .expect("Failed to create test pool")
    }

    async fn create_test_user(pool: &PgPool, tag: &str) -> Uuid {
        let users = UserRepository::new(pool.clone());
        users
            .create(
                &format!("note_test_{}", tag),
                &format!("note_test_{}@example.com", tag),
                "Password123",
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_list_notes() {
        let pool = create_test_pool().await;
        let repo = NoteRepository::new(pool.clone());
        let owner_id = create_test_user(&pool, "create_list").await;

        let note = repo
            .create(&CreateNote {
                owner_id,
                title: "Shopping".to_string(),
                body: "- milk\n- eggs".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(note.title, "Shopping");
        assert_eq!(note.owner_id, owner_id);

        let notes = repo.list_by_owner(owner_id).await.unwrap();
        assert!(notes.iter().any(|n| n.id == note.id));

        // Cleanup (cascades to notes)
        UserRepository::new(pool).delete(owner_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_note_invisible_to_other_owner() {
        let pool = create_test_pool().await;
        let repo = NoteRepository::new(pool.clone());
        let owner_id = create_test_user(&pool, "owner_a").await;
        let other_id = create_test_user(&pool, "owner_b").await;

        let note = repo
            .create(&CreateNote {
                owner_id,
                title: "Private".to_string(),
                body: "secret".to_string(),
            })
            .await
            .unwrap();

        let found = repo.find_for_owner(note.id, other_id).await.unwrap();
        assert!(found.is_none());

        let deleted = repo.delete_for_owner(note.id, other_id).await.unwrap();
        assert!(!deleted);

        let users = UserRepository::new(pool);
        users.delete(owner_id).await.unwrap();
        users.delete(other_id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_update_note_partial() {
        let pool = create_test_pool().await;
        let repo = NoteRepository::new(pool.clone());
        let owner_id = create_test_user(&pool, "update").await;

        let note = repo
            .create(&CreateNote {
                owner_id,
                title: "Draft".to_string(),
                body: "original".to_string(),
            })
            .await
            .unwrap();

        let updated = repo
            .update_for_owner(
                note.id,
                owner_id,
                &UpdateNote {
                    title: Some("Final".to_string()),
                    body: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "Final");
        assert_eq!(updated.body, "original");

        let result = repo
            .update_for_owner(Uuid::new_v4(), owner_id, &UpdateNote::default())
            .await;
        assert!(matches!(result, Err(NoteRepositoryError::NotFound)));

        UserRepository::new(pool).delete(owner_id).await.unwrap();
    }
}
