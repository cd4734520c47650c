//! Database repositories for Notemark
//!
//! Repositories encapsulate data access logic and provide a clean API for
//! business logic to interact with the database.

pub mod budget;
pub mod expense;
pub mod note;
pub mod upload;
pub mod user;

pub use budget::{BudgetRepository, BudgetRepositoryError};
pub use expense::{ExpenseRepository, ExpenseRepositoryError};
pub use note::{NoteRepository, NoteRepositoryError};
pub use upload::{UploadRepository, UploadRepositoryError};
pub use user::{UserRepository, UserRepositoryError};
