use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use super::index::TrashIndex;
use super::models::{Dimensions, FileType, MediaEntry, UploadOptions};
use super::optimize::{ImageOptimizer, ResizingOptimizer};
use super::paths::{numbered_name, sanitize_file_name, MediaPath};
use super::MediaError;
use crate::config::MediaConfig;

/// Upper bound on `name-N.ext` candidates tried before an upload gives up.
const MAX_NAME_ATTEMPTS: u32 = 10_000;

const OCTET_STREAM: &str = "application/octet-stream";

/// CRUD over the media tree, with soft delete into a trash directory.
pub struct MediaLibrary {
    pub(super) root: PathBuf,
    pub(super) trash_items: PathBuf,
    /// Location of the trash when it lives inside the media root
    hidden: Option<MediaPath>,
    pub(super) index: TrashIndex,
    limits: MediaConfig,
    optimizer: Arc<dyn ImageOptimizer>,
}

impl MediaLibrary {
    /// Open the library, creating the media root and trash directories.
    pub fn open(config: &MediaConfig) -> Result<Self, MediaError> {
        std::fs::create_dir_all(&config.media_root)?;
        std::fs::create_dir_all(config.trash_root.join("items"))?;

        // Compare resolved locations so `./uploads` and `uploads/.trash` line up
        let root = std::fs::canonicalize(&config.media_root)?;
        let trash_root = std::fs::canonicalize(&config.trash_root)?;
        if root.starts_with(&trash_root) {
            return Err(MediaError::Validation(format!(
                "media root {} lies inside the trash {}",
                root.display(),
                trash_root.display()
            )));
        }
        let trash_items = trash_root.join("items");
        let index = TrashIndex::open(&trash_root)?;

        let hidden = match trash_root.strip_prefix(&root) {
            Ok(rel) => Some(MediaPath::parse(&rel.to_string_lossy())?),
            Err(_) => None,
        };

        Ok(Self {
            root,
            trash_items,
            hidden,
            index,
            limits: config.clone(),
            optimizer: Arc::new(ResizingOptimizer),
        })
    }

    /// Replace the image optimizer used by uploads.
    pub fn with_optimizer(mut self, optimizer: Arc<dyn ImageOptimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Normalize a caller path, refusing anything outside the visible tree.
    pub fn resolve(&self, raw: &str) -> Result<MediaPath, MediaError> {
        let path = MediaPath::parse(raw)?;
        self.check_visible(&path)?;
        Ok(path)
    }

    pub(super) fn check_visible(&self, path: &MediaPath) -> Result<(), MediaError> {
        match &self.hidden {
            Some(hidden) if path.starts_with(hidden) => {
                Err(MediaError::PathTraversal(path.to_string()))
            }
            _ => Ok(()),
        }
    }

    pub(super) fn child(&self, parent: &MediaPath, name: &str) -> Result<MediaPath, MediaError> {
        let path = parent.join(name)?;
        self.check_visible(&path)?;
        Ok(path)
    }

    pub(super) fn fs_path(&self, path: &MediaPath) -> PathBuf {
        path.to_fs_path(&self.root)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Direct children of a directory, directories first.
    pub async fn list(&self, dir: &str) -> Result<Vec<MediaEntry>, MediaError> {
        let dir = self.resolve(dir)?;
        self.require_directory(&dir).await?;

        let root = self.root.clone();
        let hidden = self.hidden.clone();

        tokio::task::spawn_blocking(move || {
            let mut entries = Vec::new();
            for item in std::fs::read_dir(dir.to_fs_path(&root))? {
                let item = item?;
                let Some(name) = item.file_name().to_str().map(str::to_string) else {
                    continue;
                };
                let child = match dir.join(&name) {
                    Ok(child) => child,
                    // Dotfiles and other names the library would never create
                    Err(_) => continue,
                };
                if hidden.as_ref() == Some(&child) {
                    continue;
                }
                entries.push(describe(&root, &child)?);
            }
            entries.sort_by(|a, b| {
                b.is_directory
                    .cmp(&a.is_directory)
                    .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            });
            Ok::<_, MediaError>(entries)
        })
        .await?
    }

    /// Metadata for a single entry.
    pub async fn entry(&self, path: &str) -> Result<MediaEntry, MediaError> {
        let path = self.resolve(path)?;
        self.describe(path).await
    }

    /// Filesystem path of a regular file, for streaming its content.
    pub async fn file_path(&self, path: &str) -> Result<PathBuf, MediaError> {
        let path = self.resolve(path)?;
        let fs_path = self.fs_path(&path);
        match tokio::fs::metadata(&fs_path).await {
            Ok(meta) if meta.is_file() => Ok(fs_path),
            Ok(_) => Err(MediaError::Validation(format!("'{path}' is not a file"))),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(MediaError::NotFound(path.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    pub(super) async fn describe(&self, path: MediaPath) -> Result<MediaEntry, MediaError> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || describe(&root, &path)).await?
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub async fn create_directory(&self, parent: &str, name: &str) -> Result<MediaEntry, MediaError> {
        let parent = self.resolve(parent)?;
        let path = self.child(&parent, name)?;
        self.require_directory(&parent).await?;

        match tokio::fs::create_dir(self.fs_path(&path)).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(MediaError::Conflict(format!("'{path}' already exists")));
            }
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(path = %path, "Created directory");
        self.describe(path).await
    }

    /// Store an uploaded file under `parent`.
    ///
    /// Size and type are checked before anything touches the disk. A name that
    /// is already taken gets a numeric suffix instead of overwriting.
    pub async fn upload(
        &self,
        parent: &str,
        data: Bytes,
        original_name: &str,
        mime_type: &str,
        options: UploadOptions,
    ) -> Result<MediaEntry, MediaError> {
        let size = data.len() as u64;
        if size > self.limits.max_upload_size {
            return Err(MediaError::TooLarge {
                size,
                max: self.limits.max_upload_size,
            });
        }

        let mime_type = normalize_mime(mime_type, original_name);
        if !self.limits.is_allowed(&mime_type) {
            return Err(MediaError::UnsupportedType(mime_type));
        }

        let file_name = sanitize_file_name(original_name);
        self.check_stored_type(&file_name, Some(&mime_type))?;

        let parent = self.resolve(parent)?;
        self.require_directory(&parent).await?;

        let data = if options.optimize {
            let optimizer = Arc::clone(&self.optimizer);
            let input = data.clone();
            let mime = mime_type.clone();
            let optimized =
                tokio::task::spawn_blocking(move || optimizer.optimize(&input, &mime, &options))
                    .await?
                    .map_err(|e| match e {
                        MediaError::Image(err) => MediaError::Validation(format!(
                            "'{file_name}' is not a valid image: {err}"
                        )),
                        other => other,
                    })?;
            optimized.map(Bytes::from).unwrap_or(data)
        } else {
            data
        };

        let path = self.write_new_file(&parent, &file_name, &data).await?;
        tracing::debug!(path = %path, mime_type = %mime_type, bytes = data.len(), "Uploaded file");
        self.describe(path).await
    }

    /// Create `name` (or the first free numbered variant) and write `data` to it.
    async fn write_new_file(
        &self,
        parent: &MediaPath,
        name: &str,
        data: &[u8],
    ) -> Result<MediaPath, MediaError> {
        for attempt in 0..MAX_NAME_ATTEMPTS {
            let path = self.child(parent, &numbered_name(name, attempt))?;
            let fs_path = self.fs_path(&path);

            let mut file = match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&fs_path)
                .await
            {
                Ok(file) => file,
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.into()),
            };

            let written = async {
                file.write_all(data).await?;
                file.flush().await
            }
            .await;
            if let Err(e) = written {
                drop(file);
                let _ = tokio::fs::remove_file(&fs_path).await;
                return Err(e.into());
            }
            return Ok(path);
        }

        Err(MediaError::Conflict(format!(
            "no free name for '{name}' in '{parent}'"
        )))
    }

    pub async fn rename(&self, path: &str, new_name: &str) -> Result<MediaEntry, MediaError> {
        let path = self.resolve(path)?;
        let parent = path
            .parent()
            .ok_or_else(|| MediaError::Validation("cannot rename the media root".to_string()))?;
        self.require_exists(&path).await?;

        if path.name() == Some(new_name) {
            return self.describe(path).await;
        }

        let target = self.child(&parent, new_name)?;
        if tokio::fs::metadata(self.fs_path(&path)).await?.is_file() {
            self.check_stored_type(new_name, None)?;
        }
        self.require_vacant(&target).await?;

        tokio::fs::rename(self.fs_path(&path), self.fs_path(&target)).await?;
        tracing::debug!(from = %path, to = %target, "Renamed entry");
        self.describe(target).await
    }

    /// Move `source` into `destination_dir`, keeping its name.
    pub async fn move_entry(
        &self,
        source: &str,
        destination_dir: &str,
    ) -> Result<MediaEntry, MediaError> {
        let (source, target) = self.plan_transfer(source, destination_dir).await?;

        tokio::fs::rename(self.fs_path(&source), self.fs_path(&target)).await?;
        tracing::debug!(from = %source, to = %target, "Moved entry");
        self.describe(target).await
    }

    /// Copy `source` into `destination_dir`, recursively for directories.
    pub async fn copy_entry(
        &self,
        source: &str,
        destination_dir: &str,
    ) -> Result<MediaEntry, MediaError> {
        let (source, target) = self.plan_transfer(source, destination_dir).await?;

        let from = self.fs_path(&source);
        let to = self.fs_path(&target);
        tokio::task::spawn_blocking(move || {
            let result = copy_tree(&from, &to);
            if result.is_err() {
                let _ = remove_any(&to);
            }
            result
        })
        .await??;

        tracing::debug!(from = %source, to = %target, "Copied entry");
        self.describe(target).await
    }

    /// Validate a move or copy and return `(source, target)`.
    async fn plan_transfer(
        &self,
        source: &str,
        destination_dir: &str,
    ) -> Result<(MediaPath, MediaPath), MediaError> {
        let source = self.resolve(source)?;
        let name = source
            .name()
            .ok_or_else(|| MediaError::Validation("cannot move or copy the media root".to_string()))?
            .to_string();
        let destination = self.resolve(destination_dir)?;

        self.require_exists(&source).await?;
        self.require_directory(&destination).await?;

        if destination.starts_with(&source) {
            return Err(MediaError::Conflict(format!(
                "cannot place '{source}' inside itself"
            )));
        }

        let target = self.child(&destination, &name)?;
        self.require_vacant(&target).await?;
        Ok((source, target))
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// Files are described and served by the type their extension implies, so
    /// that type must be allowed and, for uploads, agree with the content type.
    fn check_stored_type(
        &self,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<(), MediaError> {
        let guesses = mime_guess::from_path(file_name);
        let stored = guesses
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_string());
        if !self.limits.is_allowed(&stored) {
            return Err(MediaError::UnsupportedType(stored));
        }
        if let Some(content_type) = content_type {
            if !guesses.iter().any(|m| m.essence_str() == content_type) {
                return Err(MediaError::UnsupportedType(format!(
                    "{content_type} stored as '{file_name}'"
                )));
            }
        }
        Ok(())
    }

    async fn require_directory(&self, path: &MediaPath) -> Result<(), MediaError> {
        match tokio::fs::metadata(self.fs_path(path)).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(MediaError::Validation(format!("'{path}' is not a directory"))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(MediaError::NotFound(format!("directory '{path}'")))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(super) async fn require_exists(&self, path: &MediaPath) -> Result<(), MediaError> {
        if tokio::fs::try_exists(self.fs_path(path)).await? {
            Ok(())
        } else {
            Err(MediaError::NotFound(path.to_string()))
        }
    }

    pub(super) async fn require_vacant(&self, path: &MediaPath) -> Result<(), MediaError> {
        if tokio::fs::try_exists(self.fs_path(path)).await? {
            Err(MediaError::Conflict(format!("'{path}' already exists")))
        } else {
            Ok(())
        }
    }
}

/// MIME type with parameters stripped, guessed from the name when missing or generic.
fn normalize_mime(mime_type: &str, file_name: &str) -> String {
    let essence = mime_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    if essence.is_empty() || essence == OCTET_STREAM {
        mime_guess::from_path(file_name)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| OCTET_STREAM.to_string())
    } else {
        essence
    }
}

fn to_utc(time: std::io::Result<std::time::SystemTime>) -> Option<DateTime<Utc>> {
    time.ok().map(DateTime::<Utc>::from)
}

/// Stat an entry, summing contents for directories.
pub(super) fn describe(root: &Path, path: &MediaPath) -> Result<MediaEntry, MediaError> {
    let fs_path = path.to_fs_path(root);
    let meta = match std::fs::metadata(&fs_path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(MediaError::NotFound(path.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    let modified_at = to_utc(meta.modified()).unwrap_or_else(Utc::now);
    let created_at = to_utc(meta.created()).unwrap_or(modified_at);
    let name = path.name().unwrap_or_default().to_string();

    if meta.is_dir() {
        return Ok(MediaEntry {
            path: path.to_string(),
            name,
            is_directory: true,
            size: tree_size(&fs_path),
            mime_type: None,
            file_type: None,
            created_at,
            modified_at,
            dimensions: None,
        });
    }

    let mime_type = mime_guess::from_path(&fs_path)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string());
    let file_type = FileType::from_mime(&mime_type);
    let dimensions = if file_type == FileType::Image && mime_type != "image/svg+xml" {
        image::image_dimensions(&fs_path)
            .ok()
            .map(|(width, height)| Dimensions { width, height })
    } else {
        None
    };

    Ok(MediaEntry {
        path: path.to_string(),
        name,
        is_directory: false,
        size: meta.len(),
        mime_type: Some(mime_type),
        file_type: Some(file_type),
        created_at,
        modified_at,
        dimensions,
    })
}

/// Recursive sum of regular file sizes below `path`.
pub(super) fn tree_size(path: &Path) -> u64 {
    WalkDir::new(path)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), MediaError> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| std::io::Error::new(ErrorKind::Other, e))?;
        let dest = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest)?;
        } else if entry.file_type().is_file() {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}

pub(super) fn remove_any(path: &Path) -> std::io::Result<()> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => std::fs::remove_dir_all(path),
        Ok(_) => std::fs::remove_file(path),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mime() {
        assert_eq!(normalize_mime("image/PNG", "a.png"), "image/png");
        assert_eq!(normalize_mime("text/plain; charset=utf-8", "a.txt"), "text/plain");
        assert_eq!(normalize_mime("application/octet-stream", "a.jpg"), "image/jpeg");
        assert_eq!(normalize_mime("", "a.pdf"), "application/pdf");
        assert_eq!(normalize_mime("", "noext"), "application/octet-stream");
    }

    #[test]
    fn test_tree_size_sums_nested_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("one.txt"), b"12345").unwrap();
        std::fs::write(dir.path().join("a/two.txt"), b"123").unwrap();
        std::fs::write(dir.path().join("a/b/three.txt"), b"12").unwrap();

        assert_eq!(tree_size(dir.path()), 10);
    }

    #[test]
    fn test_copy_tree() {
        let dir = tempfile::tempdir().unwrap();
        let from = dir.path().join("src");
        std::fs::create_dir_all(from.join("nested")).unwrap();
        std::fs::write(from.join("nested/file.txt"), b"data").unwrap();

        let to = dir.path().join("dst");
        copy_tree(&from, &to).unwrap();

        assert_eq!(std::fs::read(to.join("nested/file.txt")).unwrap(), b"data");
        assert!(from.join("nested/file.txt").exists());
    }
}
