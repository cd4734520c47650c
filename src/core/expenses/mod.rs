//! Expense and budget tracking

pub mod api;

pub use api::{ExpenseApiState, expense_api_router};
