//! Shared test helpers for content-manager unit tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::{Config, MediaConfig, ServerConfig, StorageConfig};
use crate::content::ContentService;
use crate::media::MediaLibrary;
use crate::notify::{Notification, NotificationSink};
use crate::records::{RecordCache, RecordStore};
use crate::AppState;

/// Create a test AppState rooted in a temporary directory.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    test_state_with_notifier(temp_dir).0
}

/// Like [`test_state`], also returning the sink that captures notifications.
pub fn test_state_with_notifier(
    temp_dir: &tempfile::TempDir,
) -> (Arc<AppState>, Arc<MemoryNotifier>) {
    let data_dir = temp_dir.path().join("data");
    let media = MediaConfig {
        max_upload_size: 1024 * 1024, // 1MB for tests
        ..MediaConfig::rooted_at(temp_dir.path().join("media"))
    };

    let config = Config {
        server: ServerConfig {
            bind_address: "127.0.0.1:0".to_string(),
        },
        storage: StorageConfig {
            data_dir: data_dir.clone(),
        },
        media,
        test_mode: true,
    };

    let store = Arc::new(RecordStore::new(&data_dir, RecordCache::new()));
    let media = MediaLibrary::open(&config.media).expect("Failed to open test media library");
    let notifier = Arc::new(MemoryNotifier::new());

    let state = Arc::new(AppState {
        config,
        content: ContentService::new(store),
        media,
        notifier: Arc::clone(&notifier) as Arc<dyn NotificationSink>,
    });
    (state, notifier)
}

/// Keeps notifications in memory, newest last.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
    notifications: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().clone()
    }
}

#[async_trait]
impl NotificationSink for MemoryNotifier {
    async fn notify(&self, notification: Notification) {
        self.notifications.lock().push(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Severity;

    #[tokio::test]
    async fn test_memory_notifier_records_in_order() {
        let sink = MemoryNotifier::new();
        sink.notify(Notification::new("Upload", "a.png", Severity::Success))
            .await;
        sink.notify(Notification::new("Trash", "b.png", Severity::Warning))
            .await;

        let seen = sink.notifications();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].title, "Upload");
        assert_eq!(seen[1].severity, Severity::Warning);
    }
}
