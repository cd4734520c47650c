//! Notemark - Markdown Notes Backend
//!
//! A web backend for user accounts, markdown notes, file uploads, and
//! expense tracking, with cookie-based session renewal on top of a
//! dual-token (access + refresh) credential scheme.

pub mod core;
