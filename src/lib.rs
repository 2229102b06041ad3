//! content-manager - A file-backed content store and media library for site administration
//!
//! This crate provides the storage core of an admin dashboard:
//! - Config and content records kept as human-editable JSON files, with an in-process read cache
//! - Typed config accessors with documented defaults
//! - A media library with uploads, tree edits and a soft-delete trash
//! - REST API with multipart upload support

pub mod api;
pub mod config;
pub mod content;
pub mod media;
pub mod notify;
pub mod records;
#[cfg(test)]
pub mod testutil;

use std::sync::Arc;

use config::Config;
use content::ContentService;
use media::MediaLibrary;
use notify::NotificationSink;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub content: ContentService,
    pub media: MediaLibrary,
    pub notifier: Arc<dyn NotificationSink>,
}
