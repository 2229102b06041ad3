mod index;
mod library;
pub mod models;
mod optimize;
pub mod paths;
mod tables;
mod trash;

pub use index::{DatabaseError, PurgeStats, TrashIndex};
pub use library::MediaLibrary;
pub use models::{Dimensions, FileType, MediaEntry, TrashEntry, UploadOptions};
pub use optimize::{ImageOptimizer, ResizingOptimizer};
pub use paths::MediaPath;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    Validation(String),
    #[error("File of {size} bytes exceeds maximum upload size of {max} bytes")]
    TooLarge { size: u64, max: u64 },
    #[error("File type '{0}' is not allowed")]
    UnsupportedType(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Path escapes the media root: {0}")]
    PathTraversal(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Trash index error: {0}")]
    Index(#[from] DatabaseError),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Resize error: {0}")]
    Resize(#[from] fast_image_resize::ResizeError),
    #[error("Background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
