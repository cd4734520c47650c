//! Expense repository for database operations
//!
//! Owner-scoped CRUD over expense rows; category validity is enforced at
//! the API layer before anything reaches this module.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateExpense, Expense, UpdateExpense};

/// Expense repository error types
#[derive(Debug, thiserror::Error)]
pub enum ExpenseRepositoryError {
    #[error("Expense not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Expense repository for database operations
#[derive(Clone)]
pub struct ExpenseRepository {
    pool: PgPool,
}

impl ExpenseRepository {
    /// Create a new expense repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new expense
    pub async fn create(&self, dto: &CreateExpense) -> Result<Expense, ExpenseRepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (owner_id, title, description, category, amount)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, owner_id, title, description, category, amount, created_at, updated_at
            "#,
        )
        .bind(dto.owner_id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.category)
        .bind(dto.amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(expense)
    }

    /// List a user's expenses, newest first
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Expense>, ExpenseRepositoryError> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, owner_id, title, description, category, amount, created_at, updated_at
            FROM expenses
            WHERE owner_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }

    /// Fetch a single expense owned by the given user
    pub async fn find_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<Expense>, ExpenseRepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, owner_id, title, description, category, amount, created_at, updated_at
            FROM expenses
            WHERE id = $1 AND owner_id = $2
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Update an expense owned by the given user
    pub async fn update_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
        updates: &UpdateExpense,
    ) -> Result<Expense, ExpenseRepositoryError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses
            SET
                title = COALESCE($3, title),
                description = COALESCE($4, description),
                category = COALESCE($5, category),
                amount = COALESCE($6, amount),
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2
            RETURNING id, owner_id, title, description, category, amount, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(&updates.title)
        .bind(&updates.description)
        .bind(updates.category)
        .bind(updates.amount)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(ExpenseRepositoryError::NotFound)?;

        Ok(expense)
    }

    /// Delete an expense owned by the given user
    pub async fn delete_for_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<bool, ExpenseRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM expenses
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
    use crate::core::db::models::Category;
    use crate::core::db::repositories::UserRepository;

    #[test]
    fn test_expense_repository_error_display() {
        let err = ExpenseRepositoryError::NotFound;
        assert_eq!(format!("{}", err), "Expense not found");
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
    async fn test_expense_crud_cycle() {
        let pool = create_test_pool().await;
        let users = UserRepository::new(pool.clone());
        let repo = ExpenseRepository::new(pool.clone());

        let owner_id = users
            .create("expense_test", "expense_test@example.com", "Password123")
            .await
            .unwrap()
            .id;

        let expense = repo
            .create(&CreateExpense {
                owner_id,
                title: "Weekly shop".to_string(),
                description: "Supermarket run".to_string(),
                category: Category::Groceries,
                amount: 54.20,
            })
            .await
            .unwrap();

        assert_eq!(expense.category, Category::Groceries);

        let updated = repo
            .update_for_owner(
                expense.id,
                owner_id,
                &UpdateExpense {
                    amount: Some(60.00),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.amount, 60.00);
        assert_eq!(updated.title, "Weekly shop");

        let deleted = repo.delete_for_owner(expense.id, owner_id).await.unwrap();
        assert!(deleted);

        users.delete(owner_id).await.unwrap();
    }
}
