use std::io::ErrorKind;

use chrono::Utc;

use super::library::{remove_any, MediaLibrary};
use super::models::{MediaEntry, TrashEntry};
use super::paths::MediaPath;
use super::MediaError;

/// Trash operations.
impl MediaLibrary {
    /// Soft-delete an entry by moving it into the trash under a fresh name.
    pub async fn move_to_trash(&self, path: &str) -> Result<TrashEntry, MediaError> {
        let path = self.resolve(path)?;
        if path.is_root() {
            return Err(MediaError::Validation(
                "cannot trash the media root".to_string(),
            ));
        }
        let entry = self.describe(path.clone()).await?;

        let trash_name = trash_name_for(&entry.name, entry.is_directory);
        let source = self.fs_path(&path);
        let payload = self.trash_items.join(&trash_name);
        tokio::fs::rename(&source, &payload).await?;

        let trash_entry = TrashEntry {
            trash_name,
            original_path: path.to_string(),
            name: entry.name,
            deleted_at: Utc::now(),
            size: entry.size,
            is_directory: entry.is_directory,
        };

        if let Err(e) = self.index.put_entry(&trash_entry) {
            // Put the payload back so nothing is left untracked in the trash
            if let Err(restore_err) = tokio::fs::rename(&payload, &source).await {
                tracing::error!(
                    path = %path,
                    trash_name = %trash_entry.trash_name,
                    error = %restore_err,
                    "Failed to return payload after trash index write failed"
                );
            }
            return Err(e.into());
        }

        tracing::debug!(path = %path, trash_name = %trash_entry.trash_name, "Moved entry to trash");
        Ok(trash_entry)
    }

    pub async fn list_trash(&self) -> Result<Vec<TrashEntry>, MediaError> {
        Ok(self.index.list_entries()?)
    }

    /// Move a trashed entry back to its original path.
    ///
    /// Fails with a conflict if that path has been reused in the meantime.
    /// Missing parent directories are recreated.
    pub async fn restore_from_trash(&self, trash_name: &str) -> Result<MediaEntry, MediaError> {
        let entry = self.trash_entry(trash_name)?;
        let payload = self.trash_items.join(&entry.trash_name);

        if !tokio::fs::try_exists(&payload).await? {
            self.index.remove_entry(&entry.trash_name)?;
            tracing::warn!(trash_name = %entry.trash_name, "Dropped trash entry with missing payload");
            return Err(MediaError::NotFound(format!(
                "trash payload '{}'",
                entry.trash_name
            )));
        }

        let original = self.resolve(&entry.original_path)?;
        if original.is_root() {
            return Err(MediaError::Validation(format!(
                "trash entry '{}' has no original path",
                entry.trash_name
            )));
        }
        self.require_vacant(&original).await?;

        let target = self.fs_path(&original);
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&payload, &target).await?;
        self.index.remove_entry(&entry.trash_name)?;

        tracing::debug!(path = %original, trash_name = %entry.trash_name, "Restored entry from trash");
        self.describe(original).await
    }

    /// Permanently delete one trashed entry.
    pub async fn delete_from_trash(&self, trash_name: &str) -> Result<TrashEntry, MediaError> {
        let entry = self.trash_entry(trash_name)?;
        let payload = self.trash_items.join(&entry.trash_name);

        tokio::task::spawn_blocking(move || remove_any(&payload)).await??;
        self.index.remove_entry(&entry.trash_name)?;

        tracing::debug!(trash_name = %entry.trash_name, "Deleted entry from trash");
        Ok(entry)
    }

    /// Permanently delete everything in the trash, including payloads that have
    /// no index entry. Returns the number of indexed entries removed.
    pub async fn empty_trash(&self) -> Result<u64, MediaError> {
        let items = self.trash_items.clone();
        tokio::task::spawn_blocking(move || {
            match std::fs::remove_dir_all(&items) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
            std::fs::create_dir_all(&items)
        })
        .await??;

        let stats = self.index.purge_all()?;
        tracing::debug!(entries = stats.entries, "Emptied trash");
        Ok(stats.entries)
    }

    fn trash_entry(&self, trash_name: &str) -> Result<TrashEntry, MediaError> {
        // Trash names are single segments; anything else cannot be indexed
        let valid = MediaPath::parse(trash_name)
            .ok()
            .and_then(|p| p.name().map(|n| n == trash_name))
            .unwrap_or(false);
        if !valid {
            return Err(MediaError::NotFound(format!("trash entry '{trash_name}'")));
        }

        self.index
            .get_entry(trash_name)?
            .ok_or_else(|| MediaError::NotFound(format!("trash entry '{trash_name}'")))
    }
}

/// A unique payload name that keeps the file extension for content sniffing.
fn trash_name_for(name: &str, is_directory: bool) -> String {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let extension = if is_directory {
        None
    } else {
        name.rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
    };
    match extension {
        Some(ext) => format!("{id}.{}", ext.to_lowercase()),
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trash_name_keeps_extension() {
        let name = trash_name_for("Logo.PNG", false);
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 32 + 4);
    }

    #[test]
    fn test_trash_names_are_unique() {
        assert_ne!(
            trash_name_for("same.txt", false),
            trash_name_for("same.txt", false)
        );
    }

    #[test]
    fn test_directory_trash_name_has_no_extension() {
        let name = trash_name_for("photos.2024", true);
        assert!(!name.contains('.'));
    }
}
