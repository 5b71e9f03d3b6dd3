pub mod persistence;
pub mod storage;

pub use persistence::PostgresUserRepository;
pub use storage::{S3StorageService, StorageError, UploadedFile};
