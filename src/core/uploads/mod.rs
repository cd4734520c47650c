//! File uploads: object storage push plus local metadata

pub mod api;
pub mod storage;

pub use api::{UploadApiState, upload_api_router};
pub use storage::{ObjectStorage, StorageConfig, StorageError};
