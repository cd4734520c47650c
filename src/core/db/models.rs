//! Database models for Notemark
//!
//! Entity structs that map to PostgreSQL tables, plus the create/update
//! DTOs the repositories accept and the public projections the API returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user, safe to return from the API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

// ============================================================================
// Note Model
// ============================================================================

/// Markdown note owned by a user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    /// Raw markdown source
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Note data for creation
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNote {
    pub owner_id: Uuid,
    pub title: String,
    pub body: String,
}

/// Note data for updates
#[derive(Debug, Clone, Deserialize, Default)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub body: Option<String>,
}

// ============================================================================
// Stored File Model
// ============================================================================

/// Metadata row for a file pushed to object storage
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StoredFile {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// Original file name as uploaded
    pub name: String,
    /// Public URL in object storage
    pub url: String,
    pub size_bytes: i64,
    /// Extracted text content, only for .md/.txt uploads
    pub content: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Stored-file data for creation
#[derive(Debug, Clone)]
pub struct CreateStoredFile {
    pub owner_id: Uuid,
    pub name: String,
    pub url: String,
    pub size_bytes: i64,
    pub content: Option<String>,
}

/// Stored-file metadata for API responses (omits the extracted content)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFileResponse {
    pub id: Uuid,
    pub name: String,
    pub url: String,
    pub size_bytes: i64,
    pub uploaded_at: DateTime<Utc>,
}

impl From<StoredFile> for StoredFileResponse {
    fn from(file: StoredFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            url: file.url,
            size_bytes: file.size_bytes,
            uploaded_at: file.uploaded_at,
        }
    }
}

// ============================================================================
// Expense Model
// ============================================================================

/// Spending categories for expenses and budgets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR")]
pub enum Category {
    Groceries,
    Leisure,
    Electronics,
    Utilities,
    Clothing,
    Health,
    Others,
}

impl Category {
    /// All valid categories, in the order they are reported to clients
    pub const ALL: [Category; 7] = [
        Category::Groceries,
        Category::Leisure,
        Category::Electronics,
        Category::Utilities,
        Category::Clothing,
        Category::Health,
        Category::Others,
    ];
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Category::Groceries => "Groceries",
            Category::Leisure => "Leisure",
            Category::Electronics => "Electronics",
            Category::Utilities => "Utilities",
            Category::Clothing => "Clothing",
            Category::Health => "Health",
            Category::Others => "Others",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Groceries" => Ok(Category::Groceries),
            "Leisure" => Ok(Category::Leisure),
            "Electronics" => Ok(Category::Electronics),
            "Utilities" => Ok(Category::Utilities),
            "Clothing" => Ok(Category::Clothing),
            "Health" => Ok(Category::Health),
            "Others" => Ok(Category::Others),
            _ => Err(format!("Invalid category: {}", s)),
        }
    }
}

/// Expense entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Expense {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Expense data for creation
#[derive(Debug, Clone)]
pub struct CreateExpense {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub amount: f64,
}

/// Expense data for updates
#[derive(Debug, Clone, Default)]
pub struct UpdateExpense {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub amount: Option<f64>,
}

// ============================================================================
// Budget Model
// ============================================================================

/// Per-category spending budget; one row per (owner, category)
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Budget {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub category: Category,
    pub amount: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
