//! Stored-file repository
//!
//! Persists metadata for files pushed to object storage. The bytes
//! themselves never touch the database; only the extracted text content of
//! markdown/plain-text uploads is kept for search.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateStoredFile, StoredFile};

/// Upload repository error types
#[derive(Debug, thiserror::Error)]
pub enum UploadRepositoryError {
    #[error("File not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Repository for stored-file metadata
#[derive(Clone)]
pub struct UploadRepository {
    pool: PgPool,
}

impl UploadRepository {
    /// Create a new upload repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record an uploaded file
    pub async fn create(
        &self,
        dto: &CreateStoredFile,
    ) -> Result<StoredFile, UploadRepositoryError> {
        let file = sqlx::query_as::<_, StoredFile>(
            r#"
            INSERT INTO upload_files (owner_id, name, url, size_bytes, content, uploaded_at)
            VALUES ($1, $2, $3, $4, $5, NOW())
            RETURNING id, owner_id, name, url, size_bytes, content, uploaded_at
            "#,
        )
        .bind(dto.owner_id)
        .bind(&dto.name)
        .bind(&dto.url)
        .bind(dto.size_bytes)
        .bind(&dto.content)
        .fetch_one(&self.pool)
        .await?;

        Ok(file)
    }

    /// List a user's uploads, newest first
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<StoredFile>, UploadRepositoryError> {
        let files = sqlx::query_as::<_, StoredFile>(
            r#"
            SELECT id, owner_id, name, url, size_bytes, content, uploaded_at
            FROM upload_files
            WHERE owner_id = $1
            ORDER BY uploaded_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::db::repositories::UserRepository;

    #[test]
    fn test_upload_repository_error_display() {
        let err = UploadRepositoryError::NotFound;
        assert_eq!(format!("{}", err), "File not found");
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

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_list_uploads() {
        let pool = create_test_pool().await;
        let users = UserRepository::new(pool.clone());
        let repo = UploadRepository::new(pool.clone());

        let owner_id = users
            .create("upload_test", "upload_test@example.com", "Password123")
            .await
            .unwrap()
            .id;

        let file = repo
            .create(&CreateStoredFile {
                owner_id,
                name: "readme.md".to_string(),
                url: "https://storage.example.com/markdown/readme.md".to_string(),
                size_bytes: 128,
                content: Some("# Readme".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(file.name, "readme.md");
        assert_eq!(file.content.as_deref(), Some("# Readme"));

        let files = repo.list_by_owner(owner_id).await.unwrap();
        assert!(files.iter().any(|f| f.id == file.id));

        users.delete(owner_id).await.unwrap();
    }
}
