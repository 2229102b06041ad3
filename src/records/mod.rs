pub mod cache;
mod store;
pub mod value;

pub use cache::RecordCache;
pub use store::RecordStore;
pub use value::PathError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordStoreError {
    #[error("Invalid record name: {0}")]
    InvalidName(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Path error: {0}")]
    Path(#[from] PathError),
}
