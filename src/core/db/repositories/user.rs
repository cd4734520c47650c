//! User account persistence.
//!
//! Passwords never leave this module in plain text: `create` hashes before
//! the INSERT, and callers compare candidates through `verify_password`.
//! Duplicate emails are detected by the unique constraint on the table
//! rather than a read-then-write check, so concurrent signups with the
//! same address cannot race past each other.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::User;

/// bcrypt cost factor
const BCRYPT_COST: u32 = 12;

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Repository over the users table
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// bcrypt-hash a plain-text password (salt is generated per call)
    pub fn hash_password(password: &str) -> Result<String, UserRepositoryError> {
        bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Compare a plain-text candidate against a stored bcrypt hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserRepositoryError> {
        bcrypt::verify(password, hash).map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Insert a new account, hashing the given plain-text password
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserRepositoryError> {
        let password_hash = Self::hash_password(password)?;

        sqlx::query_as::<_, User>(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING id, username, email, password_hash, created_at, updated_at",
        )
        .bind(username)
        .bind(email)
        .bind(&password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|err| match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                UserRepositoryError::EmailAlreadyExists
            }
            _ => UserRepositoryError::DatabaseError(err),
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at, updated_at \
             FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, password_hash, created_at, updated_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Remove an account; owned notes, uploads, and expenses cascade
    pub async fn delete(&self, id: Uuid) -> Result<bool, UserRepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Password Hashing Tests (don't require database)
    // ========================================================================

    #[test]
    fn test_hash_looks_like_bcrypt() {
        let hash = UserRepository::hash_password("hunter22hunter22").unwrap();

        assert!(hash.starts_with("$2"));
        assert_eq!(hash.len(), 60);
    }

    #[test]
    fn test_hash_is_salted() {
        let a = UserRepository::hash_password("same input").unwrap();
        let b = UserRepository::hash_password("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_accepts_matching_password() {
        let hash = UserRepository::hash_password("correct horse").unwrap();
        assert!(UserRepository::verify_password("correct horse", &hash).unwrap());
    }

    #[test]
    fn test_verify_rejects_wrong_password() {
        let hash = UserRepository::hash_password("correct horse").unwrap();
        assert!(!UserRepository::verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_verify_errors_on_malformed_hash() {
        assert!(UserRepository::verify_password("anything", "not-a-bcrypt-hash").is_err());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", UserRepositoryError::EmailAlreadyExists),
            "Email already exists"
        );
        assert_eq!(format!("{}", UserRepositoryError::NotFound), "User not found");
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
    async fn test_create_stores_hash_not_password() {
        let repo = UserRepository::new(create_test_pool().await);

        let user = repo
            .create("test_create_user", "test_create@example.com", "Password123")
            .await
            .unwrap();

        assert_eq!(user.username, "test_create_user");
        assert_ne!(user.password_hash, "Password123");
        assert!(user.password_hash.starts_with("$2"));

        repo.delete(user.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_duplicate_email_hits_unique_constraint() {
        let repo = UserRepository::new(create_test_pool().await);

        let first = repo
            .create("unique_user1", "duplicate@example.com", "Password123")
            .await
            .unwrap();

        let second = repo
            .create("unique_user2", "duplicate@example.com", "Password123")
            .await;
        assert!(matches!(
            second,
            Err(UserRepositoryError::EmailAlreadyExists)
        ));

        repo.delete(first.id).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_find_by_id_missing_is_none() {
        let repo = UserRepository::new(create_test_pool().await);
        assert!(repo.find_by_id(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_find_by_email_roundtrip() {
        let repo = UserRepository::new(create_test_pool().await);

        let created = repo
            .create("lookup_user", "lookup@example.com", "Password123")
            .await
            .unwrap();

        let found = repo.find_by_email("lookup@example.com").await.unwrap();
        assert_eq!(found.map(|u| u.id), Some(created.id));

        repo.delete(created.id).await.unwrap();
    }
}
