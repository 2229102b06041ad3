mod admin;
mod config;
mod content;
mod media;
mod static_files;
mod trash;

use crate::api::response::ApiError;
use crate::content::ContentError;
use crate::media::MediaError;
use crate::records::RecordStoreError;

pub use admin::{admin_purge, clear_cache, health};
pub use config::{get_config, update_config};
pub use content::{
    delete_content_item, get_content_item, list_content_items, update_content_field,
    update_content_item,
};
pub use media::{copy_entry, create_directory, list_media, move_entry, rename_entry, trash_entry, upload};
pub use static_files::serve_media;
pub use trash::{delete_from_trash, empty_trash, list_trash, restore_from_trash};

/// Map a MediaError to an ApiError
fn media_error(e: MediaError) -> ApiError {
    match e {
        MediaError::NotFound(what) => ApiError::not_found(format!("Not found: {what}")),
        MediaError::Validation(msg) => ApiError::bad_request(msg),
        MediaError::UnsupportedType(_) => ApiError::bad_request(e.to_string()),
        MediaError::TooLarge { .. } => ApiError::payload_too_large(e.to_string()),
        MediaError::Conflict(msg) => ApiError::conflict(msg),
        MediaError::PathTraversal(_) => ApiError::forbidden("Path is outside the media library"),
        _ => {
            tracing::error!(error = %e, "Media operation failed");
            ApiError::internal(e.to_string())
        }
    }
}

/// Map a ContentError to an ApiError
fn content_error(e: ContentError) -> ApiError {
    match e {
        ContentError::UnknownKind(kind) => ApiError::not_found(format!("Unknown config '{kind}'")),
        ContentError::NotAnObject | ContentError::Path(_) => ApiError::bad_request(e.to_string()),
        ContentError::Store(RecordStoreError::InvalidName(name)) => {
            ApiError::bad_request(format!("Invalid record name: {name}"))
        }
        ContentError::Store(RecordStoreError::Path(err)) => ApiError::bad_request(err.to_string()),
        ContentError::Store(err) => {
            tracing::error!(error = %err, "Record operation failed");
            ApiError::internal(err.to_string())
        }
    }
}
