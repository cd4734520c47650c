//! Markdown notes: CRUD, rendering, and grammar checking

pub mod api;
pub mod render;

pub use api::{NoteApiState, note_api_router};
pub use render::render_markdown;
