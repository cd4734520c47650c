//! Budget repository for database operations
//!
//! One budget row per (owner, category); setting an existing category's
//! budget overwrites the previous amount.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{Budget, Category};

/// Budget repository error types
#[derive(Debug, thiserror::Error)]
pub enum BudgetRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Budget repository for database operations
#[derive(Clone)]
pub struct BudgetRepository {
    pool: PgPool,
}

impl BudgetRepository {
    /// Create a new budget repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Set the budget for a category, replacing any existing amount
    pub async fn upsert(
        &self,
        owner_id: Uuid,
        category: Category,
        amount: f64,
    ) -> Result<Budget, BudgetRepositoryError> {
        let budget = sqlx::query_as::<_, Budget>(
            r#"
            INSERT INTO budgets (owner_id, category, amount)
            VALUES ($1, $2, $3)
            ON CONFLICT (owner_id, category)
            DO UPDATE SET amount = EXCLUDED.amount, updated_at = NOW()
            RETURNING id, owner_id, category, amount, created_at, updated_at
            "#,
        )
        .bind(owner_id)
        .bind(category)
        .bind(amount)
        .fetch_one(&self.pool)
        .await?;

        Ok(budget)
    }

    /// List a user's budgets
    pub async fn list_by_owner(
        &self,
        owner_id: Uuid,
    ) -> Result<Vec<Budget>, BudgetRepositoryError> {
        let budgets = sqlx::query_as::<_, Budget>(
            r#"
            SELECT id, owner_id, category, amount, created_at, updated_at
            FROM budgets
            WHERE owner_id = $1
            ORDER BY category
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(budgets)
    }
}
